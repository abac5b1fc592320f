use super::Chip;
use crate::params::Slot;

// 1024 KB + 1024 KB layout: user1 sits at flash 0x1000, user2 at 0x81000,
// and irom code follows the 0x10 byte irom header of each.
const USER1_IROM_ADDR: u32 = 0x40201010;
const USER2_IROM_ADDR: u32 = 0x40281010;

#[derive(Copy, Clone)]
pub struct Esp8266;

impl Chip for Esp8266 {
    fn target(&self) -> &'static str {
        "xtensa-esp8266-none-elf"
    }

    fn irom_address(&self, slot: Slot) -> u32 {
        match slot {
            Slot::User1 => USER1_IROM_ADDR,
            Slot::User2 => USER2_IROM_ADDR,
        }
    }

    fn linker_script(&self, slot: Slot) -> &'static str {
        match slot {
            Slot::User1 => "ld/eagle.app.v6.new.1024.app1.ld",
            Slot::User2 => "ld/eagle.app.v6.new.1024.app2.ld",
        }
    }
}
