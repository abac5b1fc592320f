use thiserror::Error;

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("IO error: {0}")]
    IO(#[from] std::io::Error),
    #[error("elf image is not valid: {0}")]
    InvalidElf(&'static str),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("required section {0} not found")]
    MissingSection(&'static str),
    #[error("section {0} appears more than once")]
    DuplicateSection(&'static str),
    #[error("section {name} lies outside of the executable")]
    SectionOutOfBounds { name: String },
    #[error(
        "irom0 at unexpected address {found:#x} (expected {expected:#x}) for user{slot}, wrong linker script?"
    )]
    LoadAddressMismatch { slot: u8, expected: u32, found: u32 },
    #[error("slot must be 1 or 2, got {0}")]
    InvalidSlot(u8),
    #[error("unknown flash mode {0:?}, expected one of qio, qout, dio, dout")]
    UnknownFlashMode(String),
    #[error("flash size map {0} out of range 0..=6")]
    InvalidFlashSizeMap(u8),
    #[error("flash clock divider code {0:#x} not supported")]
    InvalidClkDiv(u8),
    #[error("user bin is not valid: {0}")]
    InvalidImage(&'static str),
    #[error("Layout error")]
    Layout(#[from] deku::error::DekuError),
    #[error("Parse toml error")]
    Toml(#[from] toml::de::Error),
}
