pub mod esp8266;
pub use esp8266::Esp8266;

use crate::params::Slot;

pub trait Chip {
    /// Rust target triple the firmware is built for
    fn target(&self) -> &'static str;
    /// Address `.irom0.text` must be linked at for `slot`
    fn irom_address(&self, slot: Slot) -> u32;
    /// Linker script placing the image into `slot`
    fn linker_script(&self, slot: Slot) -> &'static str;
}
