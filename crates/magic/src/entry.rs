//! Rule nodes and the recursive evaluation of a rule tree against a buffer.
//!
//! # Evaluation
//! A rule resolves its offset, extracts a value there, and tests it against its operand. On a
//! match it appends its rendered template to the description, then evaluates its children in
//! declaration order against the same match state. A rule with children only matches if at least
//! one child matches, but text it already appended is kept even when none do.
//!
//! # Names
//! The first matching rule seeds the name, level and media type of the result. After that a
//! matching child replaces the name when none is set yet, or when it carries a name and sits at a
//! shallower level than the rule that set the current one.

use core::fmt;

use hashbrown::HashMap;
use sniff_core::prelude::*;

use crate::error::Result;
use crate::format::Template;
use crate::matcher::{MagicMatcher, Operand};
use crate::offset::OffsetResolver;

/// Per-evaluation state, shared by every rule that takes part in one top-level match.
#[derive(Debug, Default)]
struct MatchState {
    name: Option<String>,
    name_level: u32,
    mime_type: Option<String>,
    text: String,
}

impl MatchState {
    fn seeded(rule: &RuleNode) -> Self {
        Self {
            name: rule.name.clone(),
            name_level: rule.level,
            mime_type: rule.mime_type.clone(),
            text: String::new(),
        }
    }

    fn offer_name(&mut self, child: &RuleNode) {
        let Some(name) = &child.name else {
            return;
        };
        if self.name.is_none() || child.level < self.name_level {
            self.name = Some(name.clone());
            self.name_level = child.level;
        }
    }
}

/// A single rule in a magic rule tree. Built with [`RuleBuilder`], immutable afterwards.
#[derive(Debug)]
pub struct RuleNode {
    name: Option<String>,
    level: u32,
    parent_relative: bool,
    offset: i32,
    offset_resolver: Option<OffsetResolver>,
    matcher: Box<dyn MagicMatcher>,
    test: Option<Operand>,
    mask: Option<u64>,
    unsigned: bool,
    template: Option<Template>,
    space_prefix: bool,
    strength: i32,
    mime_type: Option<String>,
    extensions: HashMap<String, String>,
    children: Vec<RuleNode>,
}

impl RuleNode {
    /// Evaluates this rule and its children against `data`.
    ///
    /// Returns `None` if the tree doesn't match, or if it matched without any rule contributing a
    /// name.
    #[must_use]
    pub fn evaluate(&self, data: &[u8]) -> Option<ContentType> {
        let mut state = None;
        if !self.evaluate_at(data, 0, &mut state) {
            return None;
        }
        let state = state?;
        Some(ContentType::new(state.name?, state.mime_type, state.text))
    }

    fn evaluate_at(&self, data: &[u8], parent_offset: i32, state: &mut Option<MatchState>) -> bool {
        let Some(offset) = self.resolve_offset(data, parent_offset) else {
            log::trace!("{self}: indirect offset could not be read");
            return false;
        };
        let Ok(position) = usize::try_from(offset) else {
            log::trace!("{self}: negative offset {offset}");
            return false;
        };
        let Some(value) = self.matcher.extract(position, data) else {
            log::trace!("{self}: nothing to extract at {position:#X}");
            return false;
        };
        let value = match &self.test {
            Some(test) => match self.matcher.is_match(test, self.mask, self.unsigned, value, position, data) {
                Some(value) => value,
                None => return false,
            },
            None => value,
        };
        log::trace!("{self}: matched at {position:#X}");

        let current = state.get_or_insert_with(|| MatchState::seeded(self));
        if let Some(template) = &self.template {
            if self.space_prefix && !current.text.is_empty() {
                current.text.push(' ');
            }
            self.matcher.render(&mut current.text, &value, template);
        }

        if self.children.is_empty() {
            return true;
        }

        let mut matched = false;
        for child in &self.children {
            if !child.evaluate_at(data, offset, state) {
                continue;
            }
            matched = true;
            if let Some(current) = state.as_mut() {
                current.offer_name(child);
                if current.mime_type.is_none() {
                    current.mime_type.clone_from(&child.mime_type);
                }
            }
        }
        matched
    }

    /// Computes the offset this rule reads from, given the offset its parent resolved to.
    pub(crate) fn resolve_offset(&self, data: &[u8], parent_offset: i32) -> Option<i32> {
        let offset = match &self.offset_resolver {
            Some(resolver) => resolver.resolve(data)?,
            None => self.offset,
        };
        Some(match self.parent_relative {
            true => offset.wrapping_add(parent_offset),
            false => offset,
        })
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Level-0 rules start the matching process, deeper rules are only evaluated when their parent
    /// matches.
    #[inline]
    #[must_use]
    pub fn level(&self) -> u32 {
        self.level
    }

    /// How specific this rule is, for callers ranking matches from different roots. Evaluation
    /// itself ignores it.
    #[inline]
    #[must_use]
    pub fn strength(&self) -> i32 {
        self.strength
    }

    #[inline]
    #[must_use]
    pub fn mime_type(&self) -> Option<&str> {
        self.mime_type.as_deref()
    }

    #[inline]
    #[must_use]
    pub fn extension(&self, key: &str) -> Option<&str> {
        self.extensions.get(key).map(String::as_str)
    }

    #[inline]
    #[must_use]
    pub fn extensions(&self) -> &HashMap<String, String> {
        &self.extensions
    }

    #[inline]
    #[must_use]
    pub fn test(&self) -> Option<&Operand> {
        self.test.as_ref()
    }

    #[inline]
    #[must_use]
    pub fn template(&self) -> Option<&Template> {
        self.template.as_ref()
    }

    #[inline]
    #[must_use]
    pub fn children(&self) -> &[RuleNode] {
        &self.children
    }

    /// Finds the rule that directly contains `rule`, searching the tree below `self`.
    #[must_use]
    pub fn parent_of(&self, rule: &RuleNode) -> Option<&RuleNode> {
        if self.children.iter().any(|child| core::ptr::eq(child, rule)) {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.parent_of(rule))
    }

    /// Visits this rule and every descendant depth first, along with its parent.
    pub fn walk<'a, F>(&'a self, visit: &mut F)
    where
        F: FnMut(Option<&'a RuleNode>, &'a RuleNode),
    {
        fn inner<'a, F>(parent: Option<&'a RuleNode>, rule: &'a RuleNode, visit: &mut F)
        where
            F: FnMut(Option<&'a RuleNode>, &'a RuleNode),
        {
            visit(parent, rule);
            for child in &rule.children {
                inner(Some(rule), child, visit);
            }
        }
        inner(None, self, visit);
    }
}

impl Identifier for RuleNode {
    fn identify(&self, data: &[u8]) -> Option<ContentType> {
        self.evaluate(data)
    }
}

impl fmt::Display for RuleNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "level {}", self.level)?;
        if let Some(name) = &self.name {
            write!(f, ",name '{name}'")?;
        }
        if let Some(mime_type) = &self.mime_type {
            write!(f, ",mime '{mime_type}'")?;
        }
        if let Some(test) = &self.test {
            write!(f, ",test '{test}'")?;
        }
        if let Some(template) = &self.template {
            write!(f, ",format '{template}'")?;
        }
        Ok(())
    }
}

/// Collects the parameters of a [`RuleNode`] before freezing it.
///
/// Rules print a leading space before their text by default, matching magic(5) where only a `\b`
/// prefix suppresses it.
#[derive(Debug)]
pub struct RuleBuilder {
    name: Option<String>,
    level: u32,
    parent_relative: bool,
    offset: i32,
    offset_resolver: Option<OffsetResolver>,
    matcher: Box<dyn MagicMatcher>,
    test: Option<Operand>,
    mask: Option<u64>,
    unsigned: bool,
    template: Option<String>,
    space_prefix: bool,
    strength: i32,
    mime_type: Option<String>,
    extensions: HashMap<String, String>,
    children: Vec<RuleBuilder>,
}

impl RuleBuilder {
    /// Starts a rule at `level` that reads its value with `matcher`.
    #[must_use]
    pub fn new<M: MagicMatcher + 'static>(level: u32, matcher: M) -> Self {
        Self {
            name: None,
            level,
            parent_relative: false,
            offset: 0,
            offset_resolver: None,
            matcher: Box::new(matcher),
            test: None,
            mask: None,
            unsigned: false,
            template: None,
            space_prefix: true,
            strength: 1,
            mime_type: None,
            extensions: HashMap::new(),
            children: Vec::new(),
        }
    }

    #[must_use]
    pub fn name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn offset(mut self, offset: i32) -> Self {
        self.offset = offset;
        self
    }

    /// Adds the parent's resolved offset to this rule's offset.
    #[must_use]
    pub fn parent_relative(mut self) -> Self {
        self.parent_relative = true;
        self
    }

    /// Reads the offset out of the buffer instead of using the static one.
    #[must_use]
    pub fn indirect(mut self, resolver: OffsetResolver) -> Self {
        self.offset_resolver = Some(resolver);
        self
    }

    /// Without a test the rule always matches once its value can be extracted.
    #[must_use]
    pub fn test(mut self, test: Operand) -> Self {
        self.test = Some(test);
        self
    }

    #[must_use]
    pub fn mask(mut self, mask: u64) -> Self {
        self.mask = Some(mask);
        self
    }

    #[must_use]
    pub fn unsigned(mut self, unsigned: bool) -> Self {
        self.unsigned = unsigned;
        self
    }

    #[must_use]
    pub fn template<S: Into<String>>(mut self, template: S) -> Self {
        self.template = Some(template.into());
        self
    }

    #[must_use]
    pub fn space_prefix(mut self, space_prefix: bool) -> Self {
        self.space_prefix = space_prefix;
        self
    }

    #[must_use]
    pub fn strength(mut self, strength: i32) -> Self {
        self.strength = strength;
        self
    }

    #[must_use]
    pub fn mime_type<S: Into<String>>(mut self, mime_type: S) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    #[must_use]
    pub fn extension<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.extensions.insert(key.into(), value.into());
        self
    }

    /// Appends a child rule, evaluated after all previously added children.
    #[must_use]
    pub fn child(mut self, child: RuleBuilder) -> Self {
        self.push_child(child);
        self
    }

    pub(crate) fn push_child(&mut self, child: RuleBuilder) {
        self.children.push(child);
    }

    #[inline]
    #[must_use]
    pub fn level(&self) -> u32 {
        self.level
    }

    /// Freezes this rule and all of its children.
    ///
    /// # Errors
    /// Returns [`InvalidTemplate`](crate::Error::InvalidTemplate) if this rule or any child has a
    /// template that can't be parsed.
    pub fn build(self) -> Result<RuleNode> {
        let template = self.template.map(Template::new).transpose()?;
        let children = self.children.into_iter().map(RuleBuilder::build).collect::<Result<Vec<_>>>()?;
        let rule = RuleNode {
            name: self.name,
            level: self.level,
            parent_relative: self.parent_relative,
            offset: self.offset,
            offset_resolver: self.offset_resolver,
            matcher: self.matcher,
            test: self.test,
            mask: self.mask,
            unsigned: self.unsigned,
            template,
            space_prefix: self.space_prefix,
            strength: self.strength,
            mime_type: self.mime_type,
            extensions: self.extensions,
            children,
        };
        log::debug!("Built rule {rule} with {} children", rule.children.len());
        Ok(rule)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::Comparison;
    use crate::types::{NumberMatcher, StringMatcher};
    use pretty_assertions::assert_eq;

    fn belong() -> NumberMatcher {
        NumberMatcher::new(4, Endian::Big, false).unwrap()
    }

    fn byte() -> NumberMatcher {
        NumberMatcher::new(1, Endian::Big, false).unwrap()
    }

    fn png() -> RuleNode {
        RuleBuilder::new(0, belong())
            .name("png")
            .test(Operand::equal(0x8950_4E47))
            .template("PNG image data")
            .space_prefix(true)
            .build()
            .unwrap()
    }

    #[test]
    fn matches_a_single_rule() {
        let result = png().evaluate(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A]).unwrap();
        assert_eq!(result.name, "png");
        assert_eq!(result.description, "PNG image data");
        assert_eq!(result.mime_type, None);
    }

    #[test]
    fn failed_test_is_no_match() {
        assert_eq!(png().evaluate(&[0, 0, 0, 0]), None);
    }

    #[test]
    fn failed_extraction_is_no_match() {
        assert_eq!(png().evaluate(&[0x89, 0x50]), None);
        assert_eq!(png().evaluate(&[]), None);
    }

    #[test]
    fn untested_rule_renders_the_extracted_value() {
        let rule = RuleBuilder::new(0, byte()).name("any").offset(1).template("value %d").build().unwrap();
        for (data, expected) in [([0u8, 7], "value 7"), ([9, 255], "value 255")] {
            assert_eq!(rule.evaluate(&data).unwrap().description, expected);
        }
    }

    #[test]
    fn space_prefix_only_applies_after_existing_text() {
        let rule = |space_prefix| {
            RuleBuilder::new(0, byte())
                .name("root")
                .template("first")
                .space_prefix(true)
                .child(RuleBuilder::new(1, byte()).template("second").space_prefix(space_prefix))
                .build()
                .unwrap()
        };
        assert_eq!(rule(true).evaluate(&[1]).unwrap().description, "first second");
        assert_eq!(rule(false).evaluate(&[1]).unwrap().description, "firstsecond");
    }

    #[test]
    fn parent_relative_offsets_add_the_parent_offset() {
        let child = RuleBuilder::new(1, byte()).offset(4).parent_relative().build().unwrap();
        assert_eq!(child.resolve_offset(&[], 10), Some(14));
        let absolute = RuleBuilder::new(1, byte()).offset(4).build().unwrap();
        assert_eq!(absolute.resolve_offset(&[], 10), Some(4));
    }

    #[test]
    fn children_read_relative_to_the_resolved_parent_offset() {
        let data = [0x00, 0x00, 0x03, 0x00, 0x00, 0xAB];
        let rule = RuleBuilder::new(0, byte())
            .name("relative")
            .offset(2)
            .child(
                RuleBuilder::new(1, byte())
                    .offset(3)
                    .parent_relative()
                    .test(Operand::equal(0xAB))
                    .template("found"),
            )
            .build()
            .unwrap();
        assert_eq!(rule.evaluate(&data).unwrap().description, "found");
    }

    #[test]
    fn indirect_offsets_replace_the_static_offset() {
        // The ID3 size at 0 is 257, plus 10 lands on the marker byte
        let mut data = vec![0u8; 268];
        data[..4].copy_from_slice(&[0x00, 0x00, 0x02, 0x01]);
        data[267] = 0x42;
        let rule = RuleBuilder::new(0, byte())
            .name("indirect")
            .offset(1000)
            .indirect(OffsetResolver::id3(0, Endian::Big, 4, 10))
            .test(Operand::equal(0x42))
            .build()
            .unwrap();
        assert!(rule.evaluate(&data).is_some());
        assert_eq!(rule.evaluate(&data[..267]), None);
    }

    #[test]
    fn negative_offsets_never_match() {
        let rule = RuleBuilder::new(0, byte()).name("negative").offset(-1).build().unwrap();
        assert_eq!(rule.evaluate(&[1, 2, 3]), None);
    }

    #[test]
    fn a_parent_needs_one_matching_child() {
        let rule = RuleBuilder::new(0, byte())
            .name("parent")
            .template("parent text")
            .child(RuleBuilder::new(1, byte()).test(Operand::equal(1)).template("one"))
            .child(RuleBuilder::new(1, byte()).test(Operand::equal(2)).template("two"))
            .build()
            .unwrap();
        assert_eq!(rule.evaluate(&[2]).unwrap().description, "parent text two");
        assert_eq!(rule.evaluate(&[3]), None);
    }

    #[test]
    fn text_from_a_failed_subtree_is_kept() {
        let rule = RuleBuilder::new(0, byte())
            .name("root")
            .template("root")
            .child(
                RuleBuilder::new(1, byte())
                    .template("partial")
                    .child(RuleBuilder::new(2, byte()).test(Operand::equal(0xFF))),
            )
            .child(RuleBuilder::new(1, byte()).template("sibling"))
            .build()
            .unwrap();
        assert_eq!(rule.evaluate(&[0]).unwrap().description, "root partial sibling");
    }

    #[test]
    fn unnamed_trees_are_not_reported() {
        let rule = RuleBuilder::new(0, byte()).template("anonymous").build().unwrap();
        assert_eq!(rule.evaluate(&[0]), None);
    }

    #[test]
    fn shallower_child_names_win_in_any_order() {
        let build = |first: (u32, &str), second: (u32, &str)| {
            RuleBuilder::new(0, byte())
                .child(RuleBuilder::new(first.0, byte()).name(first.1))
                .child(RuleBuilder::new(second.0, byte()).name(second.1))
                .build()
                .unwrap()
        };
        assert_eq!(build((2, "deep"), (1, "shallow")).evaluate(&[0]).unwrap().name, "shallow");
        assert_eq!(build((1, "shallow"), (2, "deep")).evaluate(&[0]).unwrap().name, "shallow");
    }

    #[test]
    fn shallower_child_overrides_a_name_set_deeper_in_an_earlier_sibling() {
        let rule = RuleBuilder::new(0, byte())
            .child(
                RuleBuilder::new(1, byte())
                    .child(RuleBuilder::new(2, byte()).child(RuleBuilder::new(3, byte()).name("deepest"))),
            )
            .child(
                RuleBuilder::new(1, byte())
                    .child(RuleBuilder::new(2, byte()).name("level two")),
            )
            .build()
            .unwrap();
        assert_eq!(rule.evaluate(&[0]).unwrap().name, "level two");
    }

    #[test]
    fn named_root_keeps_its_name() {
        let rule = RuleBuilder::new(0, byte())
            .name("root")
            .child(RuleBuilder::new(1, byte()).name("child").mime_type("application/x-child"))
            .build()
            .unwrap();
        let result = rule.evaluate(&[0]).unwrap();
        assert_eq!(result.name, "root");
        assert_eq!(result.mime_type.as_deref(), Some("application/x-child"));
    }

    #[test]
    fn root_media_type_is_not_replaced() {
        let rule = RuleBuilder::new(0, byte())
            .name("root")
            .mime_type("application/x-root")
            .child(RuleBuilder::new(1, byte()).mime_type("application/x-child"))
            .build()
            .unwrap();
        assert_eq!(rule.evaluate(&[0]).unwrap().mime_type.as_deref(), Some("application/x-root"));
    }

    #[test]
    fn evaluation_is_repeatable() {
        let rule = RuleBuilder::new(0, StringMatcher::default())
            .name("gif")
            .test(Operand::text("GIF8"))
            .template("GIF image data")
            .child(
                RuleBuilder::new(1, StringMatcher::default())
                    .offset(4)
                    .test(Operand::string(Comparison::Equal, "9a"))
                    .template(", version 8%s")
                    .space_prefix(false),
            )
            .build()
            .unwrap();
        let data = b"GIF89a\x01\x00";
        let first = rule.evaluate(data);
        assert_eq!(first.as_ref().map(|c| c.description.as_str()), Some("GIF image data, version 89a"));
        for _ in 0..10 {
            assert_eq!(rule.evaluate(data), first);
        }
    }

    #[test]
    fn debug_representation() {
        let rule = RuleBuilder::new(0, belong())
            .name("png")
            .mime_type("image/png")
            .test(Operand::equal(0x8950_4E47))
            .template("PNG image data")
            .build()
            .unwrap();
        assert_eq!(rule.to_string(), "level 0,name 'png',mime 'image/png',test '0x89504e47',format 'PNG image data'");
        assert_eq!(RuleBuilder::new(2, byte()).build().unwrap().to_string(), "level 2");
    }

    #[test]
    fn metadata_is_kept() {
        let rule = RuleBuilder::new(0, byte()).strength(70).extension("ext", "png").build().unwrap();
        assert_eq!(rule.strength(), 70);
        assert_eq!(rule.extension("ext"), Some("png"));
        assert_eq!(rule.extension("missing"), None);
        assert_eq!(RuleBuilder::new(0, byte()).build().unwrap().strength(), 1);
    }

    #[test]
    fn oversized_template_fields_fail_the_build() {
        let result = RuleBuilder::new(0, byte()).name("x").template("%99999999999999999999d").build();
        assert!(matches!(result, Err(crate::Error::InvalidTemplate { .. })));
    }

    #[test]
    fn invalid_child_templates_fail_the_build() {
        let result = RuleBuilder::new(0, byte()).child(RuleBuilder::new(1, byte()).template("%y")).build();
        assert!(matches!(result, Err(crate::Error::InvalidTemplate { .. })));
    }

    #[test]
    fn parents_are_found_by_lookup() {
        let rule = RuleBuilder::new(0, byte())
            .child(RuleBuilder::new(1, byte()).child(RuleBuilder::new(2, byte())))
            .build()
            .unwrap();
        let middle = &rule.children()[0];
        let leaf = &middle.children()[0];
        assert!(core::ptr::eq(rule.parent_of(leaf).unwrap(), middle));
        assert!(core::ptr::eq(rule.parent_of(middle).unwrap(), &rule));
        assert!(rule.parent_of(&rule).is_none());

        let mut visited = Vec::new();
        rule.walk(&mut |parent, node| visited.push((parent.map(RuleNode::level), node.level())));
        assert_eq!(visited, [(None, 0), (Some(0), 1), (Some(1), 2)]);
    }
}
