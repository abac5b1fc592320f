use super::{
    checksum_padding, sdk_crc32, xor_fold, IromHeader, SegmentHeader, SegmentMapHeader,
    CHECKSUM_SEED, IROM_HEADER_LEN,
};
use crate::Error;
use byteorder::{ByteOrder, LittleEndian};
use deku::prelude::*;
use sha2::{Digest, Sha256};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentInfo {
    pub address: u32,
    pub length: u32,
    /// Offset of the payload inside the user bin
    pub offset: usize,
}

/// Decoded layout of a finished user bin
#[derive(Debug, Clone)]
pub struct ImageInfo {
    pub irom: IromHeader,
    pub segment_map: SegmentMapHeader,
    pub segments: Vec<SegmentInfo>,
    pub checksum_offset: usize,
    pub checksum: u8,
    pub expected_checksum: u8,
    pub crc: u32,
    pub expected_crc: u32,
    pub sha256: String,
}

fn split(data: &[u8], len: usize) -> Result<(&[u8], &[u8]), Error> {
    if data.len() < len {
        return Err(Error::InvalidImage("unexpected end of file"));
    }
    Ok(data.split_at(len))
}

impl ImageInfo {
    pub fn parse(bin: &[u8]) -> Result<Self, Error> {
        let (header, rest) = split(bin, IROM_HEADER_LEN)?;
        let (_, irom) = IromHeader::from_bytes((header, 0))?;
        let (_, mut rest) = split(rest, irom.section_length as usize)?;

        let ((tail, _), segment_map) = SegmentMapHeader::from_bytes((rest, 0))?;
        rest = tail;

        let mut segments = Vec::with_capacity(segment_map.segment_count as usize);
        let mut expected_checksum = CHECKSUM_SEED;
        for _ in 0..segment_map.segment_count {
            let ((tail, _), header) = SegmentHeader::from_bytes((rest, 0))?;
            let offset = bin.len() - tail.len();
            let (payload, tail) = split(tail, header.length as usize)?;
            expected_checksum = xor_fold(expected_checksum, payload);
            segments.push(SegmentInfo {
                address: header.address,
                length: header.length,
                offset,
            });
            rest = tail;
        }

        let end = bin.len() - rest.len();
        let checksum_offset = end + checksum_padding(end);
        if bin.len() != checksum_offset + 1 + 4 {
            return Err(Error::InvalidImage("trailer has the wrong size"));
        }

        Ok(ImageInfo {
            irom,
            segment_map,
            segments,
            checksum_offset,
            checksum: bin[checksum_offset],
            expected_checksum,
            crc: LittleEndian::read_u32(&bin[checksum_offset + 1..]),
            expected_crc: sdk_crc32(&bin[..=checksum_offset]),
            sha256: format!("{:x}", Sha256::digest(bin)),
        })
    }

    pub fn is_valid(&self) -> bool {
        self.checksum == self.expected_checksum && self.crc == self.expected_crc
    }
}
