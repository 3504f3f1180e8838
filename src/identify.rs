// Output mirrors file(1): the input path, then what it was identified as
use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use sniff_core::prelude::util::format_size;
use sniff_core::prelude::*;
use sniff_magic::prelude::*;

pub(crate) fn identify_file(rules: &MagicSet, input: &str, all: bool) -> Result<()> {
    let data = std::fs::read(input).with_context(|| format!("Unable to open {input} for identification"))?;
    log::info!("Read {} bytes from {input}", data.len());

    let identified_types = match all {
        true => rules.identify_all(&data),
        false => rules.identify(&data).into_iter().collect(),
    };

    let header = format!("{} ({})", input.bold(), format_size(data.len()));
    match identified_types.as_slice() {
        [] => println!("{header}: data"),
        [found] => println!("{header}: {}", describe(found)),
        found => {
            println!("{header}: Multiple possible filetypes identified:");
            for info in found {
                println!("- {}", describe(info));
            }
        }
    }
    Ok(())
}

fn describe(info: &ContentType) -> String {
    match &info.mime_type {
        Some(mime_type) => format!("{info} [{}]", mime_type.cyan()),
        None => info.to_string(),
    }
}

pub(crate) fn print_rules(rules: &MagicSet) {
    rules.walk(|_, rule| {
        let indentation = "    ".repeat(rule.level() as usize);
        match rule.level() {
            0 => println!("{indentation}{}", rule.green()),
            _ => println!("{indentation}{rule}"),
        }
    });
}
