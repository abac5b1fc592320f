use std::collections::BTreeMap;

use xmas_elf::header::Class;
use xmas_elf::sections::{SectionHeader, ShType};
use xmas_elf::ElfFile;

use crate::Error;

pub const IROM_SECTION: &str = ".irom0.text";
/// Sections stored in the partition map, in the order they are written
pub const PARTITION_SECTIONS: &[&str] = &[".text", ".data", ".rodata"];

#[derive(Debug, Clone, PartialEq, Eq)]
/// A named region of the linked executable
pub struct Section {
    pub name: String,
    pub address: u32,
    pub offset: u32,
    pub size: u32,
}

impl Section {
    /// Raw bytes of this section inside `source`, the executable it came from
    pub fn data<'a>(&self, source: &'a [u8]) -> Result<&'a [u8], Error> {
        let start = self.offset as usize;
        start
            .checked_add(self.size as usize)
            .and_then(|end| source.get(start..end))
            .ok_or_else(|| Error::SectionOutOfBounds {
                name: self.name.clone(),
            })
    }
}

/// xmas-elf indexes the section header table without bounds checks
fn check_section_table(elf: &ElfFile, len: usize) -> Result<(), Error> {
    let pt2 = &elf.header.pt2;
    let entry_size: u64 = match elf.header.pt1.class() {
        Class::ThirtyTwo => 40,
        Class::SixtyFour => 64,
        _ => return Err(Error::InvalidElf("unknown elf class")),
    };
    if u64::from(pt2.sh_entry_size()) != entry_size {
        return Err(Error::InvalidElf("unexpected section header size"));
    }
    let end = pt2
        .sh_offset()
        .checked_add(u64::from(pt2.sh_count()) * entry_size);
    if !matches!(end, Some(end) if end <= len as u64) {
        return Err(Error::InvalidElf("section header table lies outside of the file"));
    }
    if pt2.sh_str_index() >= pt2.sh_count() {
        return Err(Error::InvalidElf("section name table index out of range"));
    }
    Ok(())
}

fn section_name<'a>(data: &'a [u8], strtab: &SectionHeader, index: u32) -> Result<&'a str, Error> {
    let table = strtab
        .offset()
        .checked_add(strtab.size())
        .and_then(|end| data.get(strtab.offset() as usize..end as usize))
        .ok_or(Error::InvalidElf("section name table lies outside of the file"))?;
    let name = table
        .get(index as usize..)
        .and_then(|rest| rest.split(|b| *b == 0).next())
        .ok_or(Error::InvalidElf("section name out of range"))?;
    std::str::from_utf8(name).map_err(|_| Error::InvalidElf("section name is not utf-8"))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutableImage {
    pub entry_point: u32,
    pub sections: BTreeMap<String, Section>,
}

impl ExecutableImage {
    /// Collect `sections` and make sure every section a user bin needs is
    /// present exactly once.
    pub fn from_sections(
        entry_point: u32,
        sections: impl IntoIterator<Item = Section>,
    ) -> Result<Self, Error> {
        let required = || std::iter::once(IROM_SECTION).chain(PARTITION_SECTIONS.iter().copied());
        let mut map: BTreeMap<String, Section> = BTreeMap::new();
        for section in sections {
            log::trace!(
                "section {} addr: {:#x} offset: {:#x} size: {:#x}",
                section.name,
                section.address,
                section.offset,
                section.size
            );
            if let Some(name) = required().find(|name| *name == section.name) {
                if map.contains_key(name) {
                    return Err(Error::DuplicateSection(name));
                }
            }
            map.insert(section.name.clone(), section);
        }
        if let Some(name) = required().find(|name| !map.contains_key(*name)) {
            return Err(Error::MissingSection(name));
        }

        Ok(ExecutableImage {
            entry_point,
            sections: map,
        })
    }

    /// Parse section headers straight out of an ELF file
    pub fn from_elf_data(data: &[u8]) -> Result<Self, Error> {
        let header_len = match data.get(4) {
            Some(2) => 64,
            _ => 52,
        };
        if data.len() < header_len {
            return Err(Error::InvalidElf("file is shorter than the elf header"));
        }
        let elf = ElfFile::new(data).map_err(Error::InvalidElf)?;
        let entry_point = elf.header.pt2.entry_point() as u32;

        check_section_table(&elf, data.len())?;
        let strtab = elf
            .section_header(elf.header.pt2.sh_str_index())
            .map_err(Error::InvalidElf)?;

        let mut sections = Vec::new();
        for header in elf.section_iter() {
            if matches!(header.get_type(), Ok(ShType::Null)) {
                continue;
            }
            let name = section_name(data, &strtab, header.name())?;
            if name.is_empty() {
                continue;
            }
            sections.push(Section {
                name: name.to_string(),
                address: header.address() as u32,
                offset: header.offset() as u32,
                size: header.size() as u32,
            });
        }

        Self::from_sections(entry_point, sections)
    }

    fn get(&self, name: &'static str) -> Result<&Section, Error> {
        self.sections.get(name).ok_or(Error::MissingSection(name))
    }

    pub fn irom(&self) -> Result<&Section, Error> {
        self.get(IROM_SECTION)
    }

    pub fn partitions(&self) -> Result<Vec<&Section>, Error> {
        PARTITION_SECTIONS.iter().map(|name| self.get(*name)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn section(name: &str, address: u32, offset: u32, size: u32) -> Section {
        Section {
            name: name.to_string(),
            address,
            offset,
            size,
        }
    }

    fn complete() -> Vec<Section> {
        vec![
            section(".text", 0x40100000, 0x100, 4),
            section(".data", 0x3ffe8000, 0x104, 2),
            section(".rodata", 0x3ffe8010, 0x106, 0),
            section(".irom0.text", 0x40201010, 0x200, 10),
            section(".comment", 0, 0x300, 8),
        ]
    }

    #[test]
    fn keeps_every_section() {
        let image = ExecutableImage::from_sections(0x40100004, complete()).unwrap();
        assert_eq!(image.sections.len(), 5);
        assert_eq!(image.irom().unwrap().size, 10);
        let names: Vec<_> = image
            .partitions()
            .unwrap()
            .into_iter()
            .map(|s| s.name.as_str())
            .collect();
        assert_eq!(names, [".text", ".data", ".rodata"]);
    }

    #[test]
    fn missing_partition() {
        let sections = complete().into_iter().filter(|s| s.name != ".data");
        match ExecutableImage::from_sections(0, sections) {
            Err(Error::MissingSection(name)) => assert_eq!(name, ".data"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn missing_irom() {
        let sections = complete().into_iter().filter(|s| s.name != IROM_SECTION);
        assert!(matches!(
            ExecutableImage::from_sections(0, sections),
            Err(Error::MissingSection(IROM_SECTION))
        ));
    }

    #[test]
    fn duplicate_irom() {
        let mut sections = complete();
        sections.push(section(".irom0.text", 0x40201010, 0x400, 4));
        assert!(matches!(
            ExecutableImage::from_sections(0, sections),
            Err(Error::DuplicateSection(IROM_SECTION))
        ));
    }

    #[test]
    fn section_data_bounds() {
        let source = [0u8; 16];
        assert_eq!(section(".text", 0, 12, 4).data(&source).unwrap().len(), 4);
        assert!(matches!(
            section(".text", 0, 12, 5).data(&source),
            Err(Error::SectionOutOfBounds { .. })
        ));
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(
            ExecutableImage::from_elf_data(b"not an elf file at all, really not"),
            Err(Error::InvalidElf(_))
        ));
    }

    #[test]
    fn rejects_short_header() {
        let mut data = vec![0x7f, b'E', b'L', b'F', 1, 1, 1, 0];
        data.resize(51, 0);
        assert!(matches!(
            ExecutableImage::from_elf_data(&data),
            Err(Error::InvalidElf(_))
        ));
    }
}
