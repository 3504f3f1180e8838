//! Collections of rule trees, assembled from rules listed in file order.

use sniff_core::prelude::*;
use snafu::prelude::*;

use crate::entry::{RuleBuilder, RuleNode};
use crate::error::{MissingParentSnafu, Result};

/// Assembles rule trees from a flat, ordered list of rules, the way they appear in a magic file.
///
/// A level-0 rule starts a new tree. Any deeper rule becomes the last child of the closest
/// preceding rule one level up, so a rule can't be more than one level deeper than the rule
/// before it.
#[derive(Debug, Default)]
pub struct RuleSetBuilder {
    roots: Vec<RuleNode>,
    /// The chain of rules still accepting children, indexed by level.
    open: Vec<RuleBuilder>,
}

impl RuleSetBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the next rule in file order.
    ///
    /// # Errors
    /// Returns [`MissingParent`](crate::Error::MissingParent) if there is no open rule one level
    /// up, and [`InvalidTemplate`](crate::Error::InvalidTemplate) if closing a finished tree fails.
    pub fn push(&mut self, rule: RuleBuilder) -> Result<&mut Self> {
        let level = rule.level();
        ensure!(level as usize <= self.open.len(), MissingParentSnafu { level });
        self.close_to(level as usize)?;
        self.open.push(rule);
        Ok(self)
    }

    /// Freezes every tree pushed so far.
    ///
    /// # Errors
    /// Returns [`InvalidTemplate`](crate::Error::InvalidTemplate) if any rule has a bad template.
    pub fn finish(mut self) -> Result<MagicSet> {
        self.close_to(0)?;
        log::debug!("Finished rule set with {} trees", self.roots.len());
        Ok(MagicSet::new(self.roots))
    }

    /// Attaches every open rule deeper than `depth` to its parent, building finished roots.
    fn close_to(&mut self, depth: usize) -> Result<()> {
        while self.open.len() > depth {
            let Some(rule) = self.open.pop() else {
                break;
            };
            match self.open.last_mut() {
                Some(parent) => parent.push_child(rule),
                None => self.roots.push(rule.build()?),
            }
        }
        Ok(())
    }
}

/// An ordered set of rule trees. Each tree is evaluated independently of the others.
#[derive(Debug, Default)]
pub struct MagicSet {
    rules: Vec<RuleNode>,
}

impl MagicSet {
    #[must_use]
    pub fn new(rules: Vec<RuleNode>) -> Self {
        Self { rules }
    }

    #[inline]
    #[must_use]
    pub fn rules(&self) -> &[RuleNode] {
        &self.rules
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Visits every rule in every tree, along with its parent.
    pub fn walk<'a, F>(&'a self, mut visit: F)
    where
        F: FnMut(Option<&'a RuleNode>, &'a RuleNode),
    {
        for rule in &self.rules {
            rule.walk(&mut visit);
        }
    }
}

impl Identifier for MagicSet {
    /// Returns the result of the first tree that matches, in insertion order.
    fn identify(&self, data: &[u8]) -> Option<ContentType> {
        self.rules.iter().find_map(|rule| rule.evaluate(data))
    }

    /// Returns every tree's match, in insertion order. Ranking them is left to the caller.
    fn identify_all(&self, data: &[u8]) -> Vec<ContentType> {
        self.rules.iter().filter_map(|rule| rule.evaluate(data)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::Operand;
    use crate::types::NumberMatcher;
    use pretty_assertions::assert_eq;

    fn byte(level: u32, value: i64) -> RuleBuilder {
        RuleBuilder::new(level, NumberMatcher::new(1, Endian::Big, false).unwrap()).test(Operand::equal(value))
    }

    #[test]
    fn nests_rules_by_level() {
        let mut builder = RuleSetBuilder::new();
        builder
            .push(byte(0, 1).name("first"))
            .unwrap()
            .push(byte(1, 1))
            .unwrap()
            .push(byte(2, 1))
            .unwrap()
            .push(byte(1, 1))
            .unwrap()
            .push(byte(0, 2).name("second"))
            .unwrap();
        let set = builder.finish().unwrap();

        assert_eq!(set.len(), 2);
        let first = &set.rules()[0];
        assert_eq!(first.children().len(), 2);
        assert_eq!(first.children()[0].children().len(), 1);
        assert!(set.rules()[1].children().is_empty());

        let mut levels = Vec::new();
        set.walk(|parent, rule| levels.push((parent.map(RuleNode::level), rule.level())));
        assert_eq!(levels, [(None, 0), (Some(0), 1), (Some(1), 2), (Some(0), 1), (None, 0)]);
    }

    #[test]
    fn rejects_skipped_levels() {
        let mut builder = RuleSetBuilder::new();
        let error = builder.push(byte(1, 0)).unwrap_err();
        assert!(matches!(error, crate::Error::MissingParent { level: 1 }));

        builder.push(byte(0, 0)).unwrap();
        let error = builder.push(byte(2, 0)).unwrap_err();
        assert!(matches!(error, crate::Error::MissingParent { level: 2 }));
    }

    #[test]
    fn identifies_with_the_first_matching_tree() {
        let mut builder = RuleSetBuilder::new();
        builder.push(byte(0, 1).name("one")).unwrap();
        builder.push(byte(0, 2).name("two").strength(10)).unwrap();
        builder.push(byte(0, 2).name("also two").strength(20)).unwrap();
        let set = builder.finish().unwrap();

        assert_eq!(set.identify(&[1]).map(|found| found.name), Some("one".to_string()));
        assert_eq!(set.identify(&[2]).map(|found| found.name), Some("two".to_string()));
        assert_eq!(set.identify(&[3]), None);

        let names: Vec<_> = set.identify_all(&[2]).into_iter().map(|found| found.name).collect();
        assert_eq!(names, ["two", "also two"]);
    }

    #[test]
    fn empty_sets_identify_nothing() {
        let set = RuleSetBuilder::new().finish().unwrap();
        assert!(set.is_empty());
        assert!(set.identify_all(&[0]).is_empty());
    }
}
