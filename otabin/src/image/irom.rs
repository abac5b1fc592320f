use super::FirmwareImage;
use crate::{params::Slot, Error};
use deku::prelude::*;
use std::convert::TryFrom;

/// Header in front of the memory mapped `.irom0.text` block
#[derive(Debug, PartialEq, Eq, Clone, DekuRead, DekuWrite)]
#[deku(magic = b"\xea\x04", endian = "little")]
pub struct IromHeader {
    pub reserved: u8,
    pub slot: u8,
    pub entry_point: u32,
    pub unused: u32,
    /// irom size rounded up to 16 bytes
    pub section_length: u32,
}

pub const IROM_HEADER_LEN: usize = 16;

impl IromHeader {
    pub fn new(slot: Slot, entry_point: u32, irom_size: usize) -> Result<Self, Error> {
        let section_length = irom_size
            .checked_add(15)
            .map(|len| len & !0xf)
            .and_then(|len| u32::try_from(len).ok())
            .ok_or(Error::InvalidImage("irom section too large"))?;
        Ok(IromHeader {
            reserved: 0,
            slot: slot.number(),
            entry_point,
            unused: 0,
            section_length,
        })
    }
}

impl FirmwareImage {
    /// Header plus irom payload, zero padded to `section_length`. None of it
    /// goes into the checksum.
    pub fn write_irom(&mut self, slot: Slot, entry_point: u32, irom: &[u8]) -> Result<(), Error> {
        let header = IromHeader::new(slot, entry_point, irom.len())?;
        log::debug!(
            "irom size: {:#x} section length: {:#x}",
            irom.len(),
            header.section_length
        );
        self.data.extend_from_slice(&header.to_bytes()?);
        self.data.extend_from_slice(irom);
        let padded = self.data.len() + (header.section_length as usize - irom.len());
        self.data.resize(padded, 0);
        Ok(())
    }
}
