pub mod chip;
pub mod config;
pub mod elf;
mod error;
pub mod image;
pub mod ota;
pub mod params;
pub mod readelf;

pub use config::Config;
pub use error::Error;
pub use ota::{build_all, build_slot, Inspector, SlotBuild};
pub use params::{BuildParams, FlashFreq, FlashMode, Slot};
