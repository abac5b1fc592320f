//! Section metadata taken from a `readelf --headers` dump, for toolchains
//! where only the vendor's binutils understand the executable.

use std::path::Path;
use std::process::Command;

use regex::Regex;

use crate::elf::{ExecutableImage, Section};
use crate::Error;

// Entry point address:               0x40100004
const ENTRY_RE: &str = r"Entry point address:\s+0x([0-9a-fA-F]+)";
// [Nr] Name              Type            Addr     Off    Size   ES Flg Lk Inf Al
// [ 4] .irom0.text       PROGBITS        40281010 006930 0302a8 00  AX  0   0 16
const SECTION_RE: &str =
    r"(?m)\[\s*\d+\]\s+(\.\S+)\s+\S+\s+([0-9a-fA-F]+)\s+([0-9a-fA-F]+)\s+([0-9a-fA-F]+)";

fn regex(re: &str) -> Result<Regex, Error> {
    Regex::new(re).map_err(|e| Error::Parse(e.to_string()))
}

fn hex(field: &str) -> Result<u32, Error> {
    u32::from_str_radix(field, 16).map_err(|_| Error::Parse(format!("bad hex value {:?}", field)))
}

pub fn parse_headers(headers: &str) -> Result<ExecutableImage, Error> {
    let entry = regex(ENTRY_RE)?
        .captures(headers)
        .ok_or_else(|| Error::Parse("entry point address not found".to_string()))?;
    let entry_point = hex(&entry[1])?;

    let sections = regex(SECTION_RE)?
        .captures_iter(headers)
        .map(|cap| {
            Ok(Section {
                name: cap[1].to_string(),
                address: hex(&cap[2])?,
                offset: hex(&cap[3])?,
                size: hex(&cap[4])?,
            })
        })
        .collect::<Result<Vec<_>, Error>>()?;
    if sections.is_empty() {
        return Err(Error::Parse("section table not found".to_string()));
    }

    ExecutableImage::from_sections(entry_point, sections)
}

/// Run `readelf --headers` on `elf` and parse its output
pub fn inspect(readelf: &Path, elf: &Path) -> Result<ExecutableImage, Error> {
    log::debug!("{} --headers {}", readelf.display(), elf.display());
    let output = Command::new(readelf).arg("--headers").arg(elf).output()?;
    if !output.status.success() {
        return Err(Error::Parse(format!(
            "{} exited with {}: {}",
            readelf.display(),
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }
    parse_headers(&String::from_utf8_lossy(&output.stdout))
}
