mod info;
mod irom;
mod segments;
mod trailer;

pub use info::{ImageInfo, SegmentInfo};
pub use irom::{IromHeader, IROM_HEADER_LEN};
pub use segments::{xor_fold, SegmentHeader, SegmentMapHeader, CHECKSUM_SEED};
pub use trailer::{checksum_padding, sdk_crc32};

use crate::{elf::ExecutableImage, params::BuildParams, Error};

/// A user bin under construction
pub struct FirmwareImage {
    data: Vec<u8>,
    checksum: u8,
}

impl FirmwareImage {
    pub fn new() -> Self {
        FirmwareImage {
            data: Vec::new(),
            checksum: CHECKSUM_SEED,
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl Default for FirmwareImage {
    fn default() -> Self {
        Self::new()
    }
}

/// Build the complete user bin for `exe`, whose file contents are `source`.
///
/// This does not check the irom load address against `params.slot`; see
/// [`crate::ota::check_load_address`].
pub fn pack(exe: &ExecutableImage, source: &[u8], params: &BuildParams) -> Result<Vec<u8>, Error> {
    let irom = exe.irom()?;
    let partitions = exe.partitions()?;

    let mut image = FirmwareImage::new();
    image.write_irom(params.slot, exe.entry_point, irom.data(source)?)?;

    image.write_segment_map(params, exe.entry_point, partitions.len())?;
    for section in partitions {
        image.write_segment(section.address, section.data(source)?)?;
    }

    image.finalize()
}
