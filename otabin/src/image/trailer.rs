use super::FirmwareImage;
use crate::Error;
use byteorder::{LittleEndian, WriteBytesExt};

/// Zero bytes needed so that the checksum byte ends a 16 byte block
pub fn checksum_padding(len: usize) -> usize {
    16 - (len % 16) - 1
}

/// CRC32 the way the SDK's upgrade code checks it: the IEEE CRC is read as
/// a signed value, then nudged one step away from zero on the positive side
/// and one step towards it on the negative side.
pub fn sdk_crc32(data: &[u8]) -> u32 {
    let crc = crc::crc32::checksum_ieee(data) as i32;
    if crc < 0 {
        crc.unsigned_abs() - 1
    } else {
        crc as u32 + 1
    }
}

impl FirmwareImage {
    /// Pad, append the checksum byte and the CRC trailer
    pub fn finalize(mut self) -> Result<Vec<u8>, Error> {
        let padded = self.data.len() + checksum_padding(self.data.len());
        self.data.resize(padded, 0);
        self.data.push(self.checksum);

        let crc = sdk_crc32(&self.data);
        log::debug!("checksum: {:#04x} crc: {:#010x}", self.checksum, crc);
        self.data.write_u32::<LittleEndian>(crc)?;

        Ok(self.data)
    }
}
