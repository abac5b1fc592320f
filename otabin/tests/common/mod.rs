#![allow(dead_code)]

use byteorder::{LittleEndian, WriteBytesExt};

pub const ENTRY: u32 = 0x40100004;
pub const USER1_IROM: u32 = 0x40201010;
pub const USER2_IROM: u32 = 0x40281010;

const SHT_PROGBITS: u32 = 1;
const SHT_STRTAB: u32 = 3;
const SHF_ALLOC: u32 = 2;

pub struct TestSection {
    pub name: &'static str,
    pub address: u32,
    pub data: Vec<u8>,
}

pub fn section(name: &'static str, address: u32, data: &[u8]) -> TestSection {
    TestSection {
        name,
        address,
        data: data.to_vec(),
    }
}

/// The usual four sections with the given payloads, irom linked at `irom_address`
pub fn firmware(irom_address: u32, irom: &[u8], text: &[u8], data: &[u8], rodata: &[u8]) -> Vec<u8> {
    build_elf(
        ENTRY,
        &[
            section(".text", 0x40100000, text),
            section(".data", 0x3ffe8000, data),
            section(".rodata", 0x3ffe8100, rodata),
            section(".irom0.text", irom_address, irom),
        ],
    )
}

fn align4(len: usize) -> usize {
    (len + 3) & !3
}

const EHSIZE: usize = 52;
const SHENTSIZE: u16 = 40;

/// (name, type, flags, addr, offset, size) of every section header, the null
/// one first and `.shstrtab` last, plus the name table itself
fn layout(sections: &[TestSection]) -> (Vec<(u32, u32, u32, u32, u32, u32)>, Vec<u8>) {
    let mut offset = EHSIZE;
    let mut shstrtab = vec![0u8];
    let mut headers = vec![(0u32, 0u32, 0u32, 0u32, 0u32, 0u32)];

    for s in sections {
        offset = align4(offset);
        let name = shstrtab.len() as u32;
        shstrtab.extend_from_slice(s.name.as_bytes());
        shstrtab.push(0);
        headers.push((
            name,
            SHT_PROGBITS,
            SHF_ALLOC,
            s.address,
            offset as u32,
            s.data.len() as u32,
        ));
        offset += s.data.len();
    }

    let shstrtab_name = shstrtab.len() as u32;
    shstrtab.extend_from_slice(b".shstrtab\0");
    headers.push((
        shstrtab_name,
        SHT_STRTAB,
        0,
        0,
        offset as u32,
        shstrtab.len() as u32,
    ));
    (headers, shstrtab)
}

/// Minimal little endian ELF32 with section headers only
pub fn build_elf(entry: u32, sections: &[TestSection]) -> Vec<u8> {
    let (headers, shstrtab) = layout(sections);

    let mut body = vec![0u8; EHSIZE];
    for (s, (_, _, _, _, offset, _)) in sections.iter().zip(&headers[1..]) {
        body.resize(*offset as usize, 0);
        body.extend_from_slice(&s.data);
    }
    body.extend_from_slice(&shstrtab);
    body.resize(align4(body.len()), 0);

    let shoff = body.len() as u32;
    for (name, ty, flags, addr, offset, size) in &headers {
        for field in &[*name, *ty, *flags, *addr, *offset, *size, 0, 0, 1, 0] {
            body.write_u32::<LittleEndian>(*field).unwrap();
        }
    }

    let mut ehdr = vec![0x7f, b'E', b'L', b'F', 1, 1, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0];
    ehdr.write_u16::<LittleEndian>(2).unwrap(); // ET_EXEC
    ehdr.write_u16::<LittleEndian>(94).unwrap(); // EM_XTENSA
    ehdr.write_u32::<LittleEndian>(1).unwrap();
    ehdr.write_u32::<LittleEndian>(entry).unwrap();
    ehdr.write_u32::<LittleEndian>(0).unwrap(); // phoff
    ehdr.write_u32::<LittleEndian>(shoff).unwrap();
    ehdr.write_u32::<LittleEndian>(0).unwrap(); // flags
    ehdr.write_u16::<LittleEndian>(EHSIZE as u16).unwrap();
    ehdr.write_u16::<LittleEndian>(32).unwrap(); // phentsize
    ehdr.write_u16::<LittleEndian>(0).unwrap(); // phnum
    ehdr.write_u16::<LittleEndian>(SHENTSIZE).unwrap();
    ehdr.write_u16::<LittleEndian>(headers.len() as u16).unwrap();
    ehdr.write_u16::<LittleEndian>(headers.len() as u16 - 1).unwrap();
    assert_eq!(ehdr.len(), EHSIZE);

    body[..EHSIZE].copy_from_slice(&ehdr);
    body
}

/// What `readelf --headers` prints for `build_elf(entry, sections)`
pub fn readelf_dump(entry: u32, sections: &[TestSection]) -> String {
    let (headers, shstrtab) = layout(sections);
    let name = |index: u32| {
        let rest = &shstrtab[index as usize..];
        let end = rest.iter().position(|b| *b == 0).unwrap();
        String::from_utf8(rest[..end].to_vec()).unwrap()
    };

    let mut dump = format!(
        "ELF Header:\n  Class:                             ELF32\n  Entry point address:               {:#x}\n\nSection Headers:\n  [Nr] Name              Type            Addr     Off    Size   ES Flg Lk Inf Al\n",
        entry
    );
    for (i, (index, ty, _, addr, offset, size)) in headers.iter().enumerate() {
        let ty = match *ty {
            SHT_PROGBITS => "PROGBITS",
            SHT_STRTAB => "STRTAB",
            _ => "NULL",
        };
        dump.push_str(&format!(
            "  [{:2}] {:<17} {:<15} {:08x} {:06x} {:06x} 00   A  0   0  1\n",
            i,
            name(*index),
            ty,
            addr,
            offset,
            size
        ));
    }
    dump
}
