//! A small set of compiled-in rules for common formats.

use sniff_core::prelude::*;

use crate::entry::RuleBuilder;
use crate::error::Result;
use crate::matcher::{Comparison, Operand};
use crate::offset::OffsetResolver;
use crate::set::{MagicSet, RuleSetBuilder};
use crate::types::{DateMatcher, NumberMatcher, StringMatcher};

fn byte(level: u32) -> Result<RuleBuilder> {
    Ok(RuleBuilder::new(level, NumberMatcher::new(1, Endian::Big, false)?))
}

fn short(level: u32, endian: Endian) -> Result<RuleBuilder> {
    Ok(RuleBuilder::new(level, NumberMatcher::new(2, endian, true)?))
}

fn long(level: u32, endian: Endian) -> Result<RuleBuilder> {
    Ok(RuleBuilder::new(level, NumberMatcher::new(4, endian, true)?))
}

fn string(level: u32) -> RuleBuilder {
    RuleBuilder::new(level, StringMatcher::default())
}

/// Matches whenever the byte at `offset` exists, without adding text. Lets a root match on its
/// signature when none of its conditional details apply.
fn present(level: u32, offset: i32) -> Result<RuleBuilder> {
    Ok(byte(level)?.offset(offset))
}

fn png(set: &mut RuleSetBuilder) -> Result<()> {
    set.push(
        long(0, Endian::Big)?
            .name("png")
            .test(Operand::equal(0x8950_4E47))
            .template("PNG image data")
            .mime_type("image/png")
            .extension("ext", "png")
            .strength(70),
    )?;
    set.push(string(1).offset(12).test(Operand::text("IHDR")))?;
    set.push(long(2, Endian::Big)?.offset(16).template(", %d x").space_prefix(false))?;
    set.push(long(2, Endian::Big)?.offset(20).template("%d"))?;
    Ok(())
}

fn gif(set: &mut RuleSetBuilder) -> Result<()> {
    set.push(
        string(0)
            .name("gif")
            .test(Operand::text("GIF8"))
            .template("GIF image data")
            .mime_type("image/gif")
            .extension("ext", "gif")
            .strength(70),
    )?;
    for version in ["7a", "9a"] {
        set.push(
            string(1)
                .offset(4)
                .test(Operand::text(version))
                .template(", version 8%s")
                .space_prefix(false),
        )?;
    }
    set.push(short(1, Endian::Little)?.offset(6).template(", %d x").space_prefix(false))?;
    set.push(short(1, Endian::Little)?.offset(8).template("%d"))?;
    Ok(())
}

fn jpeg(set: &mut RuleSetBuilder) -> Result<()> {
    set.push(
        long(0, Endian::Big)?
            .name("jpeg")
            .mask(0xFFFF_FF00)
            .unsigned(true)
            .test(Operand::equal(0xFFD8_FF00))
            .template("JPEG image data")
            .mime_type("image/jpeg")
            .extension("ext", "jpg,jpeg")
            .strength(60),
    )?;
    set.push(present(1, 3)?)?;
    set.push(
        string(1)
            .offset(6)
            .test(Operand::text("JFIF"))
            .template(", JFIF standard")
            .space_prefix(false),
    )?;
    set.push(
        string(1)
            .offset(6)
            .test(Operand::text("Exif"))
            .template(", Exif standard")
            .space_prefix(false),
    )?;
    Ok(())
}

fn zip(set: &mut RuleSetBuilder) -> Result<()> {
    set.push(
        string(0)
            .name("zip")
            .test(Operand::text(&b"PK\x03\x04"[..]))
            .template("Zip archive data")
            .mime_type("application/zip")
            .extension("ext", "zip")
            .strength(60),
    )?;
    set.push(byte(1)?.offset(4).template(", at least v%d to extract").space_prefix(false))?;
    Ok(())
}

fn pdf(set: &mut RuleSetBuilder) -> Result<()> {
    set.push(
        string(0)
            .name("pdf")
            .test(Operand::text("%PDF-"))
            .template("PDF document")
            .mime_type("application/pdf")
            .extension("ext", "pdf")
            .strength(60),
    )?;
    set.push(string(1).offset(5).parent_relative().template(", version %.3s").space_prefix(false))?;
    Ok(())
}

fn elf(set: &mut RuleSetBuilder) -> Result<()> {
    set.push(
        string(0)
            .name("elf")
            .test(Operand::text(&b"\x7fELF"[..]))
            .template("ELF")
            .mime_type("application/x-executable")
            .strength(60),
    )?;
    set.push(byte(1)?.offset(4).test(Operand::equal(1)).template("32-bit"))?;
    set.push(byte(1)?.offset(4).test(Operand::equal(2)).template("64-bit"))?;
    for (order, endian) in [(1, Endian::Little), (2, Endian::Big)] {
        let label = match endian {
            Endian::Big => "MSB",
            _ => "LSB",
        };
        set.push(byte(1)?.offset(5).test(Operand::equal(order)).template(label))?;
        for (kind, text) in [(1, "relocatable"), (2, "executable"), (3, "shared object"), (4, "core file")] {
            set.push(short(2, endian)?.offset(16).test(Operand::equal(kind)).template(text))?;
        }
    }
    Ok(())
}

fn gzip(set: &mut RuleSetBuilder) -> Result<()> {
    set.push(
        string(0)
            .name("gzip")
            .test(Operand::text(&b"\x1f\x8b"[..]))
            .template("gzip compressed data")
            .mime_type("application/gzip")
            .extension("ext", "gz,tgz")
            .strength(60),
    )?;
    set.push(present(1, 2)?)?;
    set.push(
        byte(1)?
            .offset(2)
            .test(Operand::number(Comparison::LessThan, 8))
            .template(", reserved method")
            .space_prefix(false),
    )?;
    set.push(
        byte(1)?
            .offset(3)
            .test(Operand::number(Comparison::AllSet, 0x08))
            .template(", was")
            .space_prefix(false),
    )?;
    set.push(string(2).offset(10).template("\"%s\""))?;
    set.push(
        RuleBuilder::new(1, DateMatcher::new(4, Endian::Little)?)
            .offset(4)
            .test(Operand::number(Comparison::GreaterThan, 0))
            .template(", last modified: %s")
            .space_prefix(false),
    )?;
    set.push(byte(1)?.offset(9).test(Operand::equal(3)).template(", from Unix").space_prefix(false))?;
    Ok(())
}

fn bmp(set: &mut RuleSetBuilder) -> Result<()> {
    set.push(
        string(0)
            .name("bmp")
            .test(Operand::text("BM"))
            .template("PC bitmap")
            .mime_type("image/bmp")
            .extension("ext", "bmp")
            .strength(50),
    )?;
    // Any DIB header size, so newer headers still identify as a bitmap
    set.push(long(1, Endian::Little)?.offset(14))?;
    set.push(
        long(1, Endian::Little)?
            .offset(14)
            .test(Operand::equal(40))
            .template(", Windows 3.x format")
            .space_prefix(false),
    )?;
    set.push(long(2, Endian::Little)?.offset(18).template(", %d x").space_prefix(false))?;
    set.push(long(2, Endian::Little)?.offset(22).template("%d"))?;
    set.push(
        long(1, Endian::Little)?
            .offset(14)
            .test(Operand::equal(12))
            .template(", OS/2 1.x format")
            .space_prefix(false),
    )?;
    Ok(())
}

fn mp3(set: &mut RuleSetBuilder) -> Result<()> {
    set.push(
        string(0)
            .name("mp3")
            .test(Operand::text("ID3"))
            .template("Audio file with ID3 version 2")
            .mime_type("audio/mpeg")
            .extension("ext", "mp3")
            .strength(60),
    )?;
    set.push(byte(1)?.offset(3).template(".%d").space_prefix(false))?;
    set.push(byte(1)?.offset(4).template(".%d").space_prefix(false))?;
    set.push(
        short(1, Endian::Big)?
            .indirect(OffsetResolver::id3(6, Endian::Big, 4, 10))
            .mask(0xFFE0)
            .test(Operand::equal(0xFFE0))
            .template(", contains: MPEG ADTS")
            .space_prefix(false),
    )?;
    Ok(())
}

/// Builds the compiled-in rule set, in evaluation order.
///
/// # Errors
/// Only fails if one of the compiled-in rules is malformed.
pub fn rules() -> Result<MagicSet> {
    let formats: [fn(&mut RuleSetBuilder) -> Result<()>; 9] = [png, gif, jpeg, zip, pdf, elf, gzip, bmp, mp3];
    let mut set = RuleSetBuilder::new();
    for add in formats {
        add(&mut set)?;
    }
    set.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_rule_builds() {
        let set = rules().unwrap();
        assert_eq!(set.len(), 9);
        let mut names = Vec::new();
        set.walk(|_, rule| names.extend(rule.name()));
        assert_eq!(names, ["png", "gif", "jpeg", "zip", "pdf", "elf", "gzip", "bmp", "mp3"]);
    }

    #[test]
    fn every_root_declares_a_media_type() {
        let set = rules().unwrap();
        assert!(set.rules().iter().all(|rule| rule.mime_type().is_some()));
    }
}
