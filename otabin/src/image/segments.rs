use super::FirmwareImage;
use crate::{params::BuildParams, Error};
use deku::prelude::*;
use std::convert::TryFrom;

/// Partition map header, followed by `segment_count` segments
#[derive(Debug, PartialEq, Eq, Clone, DekuRead, DekuWrite)]
#[deku(magic = b"\xe9", endian = "little")]
pub struct SegmentMapHeader {
    pub segment_count: u8,
    pub flash_mode: u8,
    pub flash_freq: u8,
    pub entry_point: u32,
}

#[derive(Debug, PartialEq, Eq, Clone, DekuRead, DekuWrite)]
#[deku(endian = "little")]
pub struct SegmentHeader {
    pub address: u32,
    pub length: u32,
}

pub const CHECKSUM_SEED: u8 = 0xef;

pub fn xor_fold(seed: u8, data: &[u8]) -> u8 {
    data.iter().fold(seed, |acc, b| acc ^ b)
}

impl FirmwareImage {
    pub fn write_segment_map(
        &mut self,
        params: &BuildParams,
        entry_point: u32,
        segment_count: usize,
    ) -> Result<(), Error> {
        let header = SegmentMapHeader {
            segment_count: u8::try_from(segment_count)
                .map_err(|_| Error::InvalidImage("too many segments"))?,
            flash_mode: params.flash_mode as u8,
            flash_freq: params.flash_freq.0,
            entry_point,
        };
        self.data.extend_from_slice(&header.to_bytes()?);
        Ok(())
    }

    /// Append one segment. Its payload, and only its payload, is folded
    /// into the running checksum.
    pub fn write_segment(&mut self, address: u32, data: &[u8]) -> Result<(), Error> {
        let header = SegmentHeader {
            address,
            length: u32::try_from(data.len())
                .map_err(|_| Error::InvalidImage("segment too large"))?,
        };
        log::debug!("segment addr: {:#x} size: {:#x}", address, header.length);
        self.data.extend_from_slice(&header.to_bytes()?);
        self.data.extend_from_slice(data);
        self.checksum = xor_fold(self.checksum, data);
        Ok(())
    }
}
