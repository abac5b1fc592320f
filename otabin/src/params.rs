use crate::Error;
use serde::Deserialize;
use std::convert::TryFrom;
use std::fmt;
use std::str::FromStr;

/// SPI flash access mode, stored as-is in the partition map header
#[derive(Debug, Deserialize, Copy, Clone, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FlashMode {
    Qio = 0,
    Qout = 1,
    Dio = 2,
    Dout = 3,
}

impl Default for FlashMode {
    fn default() -> Self {
        FlashMode::Dio
    }
}

impl FromStr for FlashMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_ascii_lowercase().as_str() {
            "qio" => FlashMode::Qio,
            "qout" => FlashMode::Qout,
            "dio" => FlashMode::Dio,
            "dout" => FlashMode::Dout,
            _ => return Err(Error::UnknownFlashMode(s.to_string())),
        })
    }
}

/// SPI clock divider applied to the 80MHz flash clock
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FlashClkDiv {
    Div2 = 0x0,
    Div3 = 0x1,
    Div4 = 0x2,
    Div1 = 0xf,
}

impl TryFrom<u8> for FlashClkDiv {
    type Error = Error;

    fn try_from(raw: u8) -> Result<Self, Self::Error> {
        Ok(match raw {
            0x0 => FlashClkDiv::Div2,
            0x1 => FlashClkDiv::Div3,
            0x2 => FlashClkDiv::Div4,
            0xf => FlashClkDiv::Div1,
            _ => return Err(Error::InvalidClkDiv(raw)),
        })
    }
}

/// The "flash size / frequency" byte of the partition map header.
///
/// The high nibble is the flash size map:
///
/// | map | layout                  |
/// |-----|-------------------------|
/// | 0   | 512 KB (256 KB + 256 KB)  |
/// | 1   | 256 KB                  |
/// | 2   | 1024 KB (512 KB + 512 KB) |
/// | 3   | 2048 KB (512 KB + 512 KB) |
/// | 4   | 4096 KB (512 KB + 512 KB) |
/// | 5   | 2048 KB (1024 KB + 1024 KB) |
/// | 6   | 4096 KB (1024 KB + 1024 KB) |
///
/// and the low nibble is a [`FlashClkDiv`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct FlashFreq(pub u8);

impl FlashFreq {
    pub fn compose(size_map: u8, clk_div: FlashClkDiv) -> Result<Self, Error> {
        if size_map > 6 {
            return Err(Error::InvalidFlashSizeMap(size_map));
        }
        Ok(FlashFreq(((size_map << 4) | clk_div as u8) & 0xff))
    }
}

impl Default for FlashFreq {
    fn default() -> Self {
        FlashFreq(0x40)
    }
}

/// One of the two OTA user partitions
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum Slot {
    User1 = 1,
    User2 = 2,
}

impl Slot {
    pub const ALL: [Slot; 2] = [Slot::User1, Slot::User2];

    pub fn number(self) -> u8 {
        self as u8
    }
}

impl Default for Slot {
    fn default() -> Self {
        Slot::User1
    }
}

impl TryFrom<u8> for Slot {
    type Error = Error;

    fn try_from(raw: u8) -> Result<Self, Self::Error> {
        match raw {
            1 => Ok(Slot::User1),
            2 => Ok(Slot::User2),
            _ => Err(Error::InvalidSlot(raw)),
        }
    }
}

impl FromStr for Slot {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw: u8 = s.trim().parse().map_err(|_| Error::Parse(format!("bad slot {:?}", s)))?;
        Slot::try_from(raw)
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "user{}", self.number())
    }
}

/// Everything besides the executable that shapes one user bin
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct BuildParams {
    pub flash_mode: FlashMode,
    pub flash_freq: FlashFreq,
    pub slot: Slot,
}

impl BuildParams {
    pub fn with_slot(self, slot: Slot) -> Self {
        BuildParams { slot, ..self }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flash_mode_codes() {
        assert_eq!("qio".parse::<FlashMode>().unwrap() as u8, 0);
        assert_eq!("QOUT".parse::<FlashMode>().unwrap() as u8, 1);
        assert_eq!("dio".parse::<FlashMode>().unwrap() as u8, 2);
        assert_eq!("dout".parse::<FlashMode>().unwrap() as u8, 3);
        assert!(matches!(
            "spi".parse::<FlashMode>(),
            Err(Error::UnknownFlashMode(_))
        ));
    }

    #[test]
    fn flash_freq_default_is_4m_80m_div2() {
        assert_eq!(
            FlashFreq::compose(4, FlashClkDiv::Div2).unwrap(),
            FlashFreq::default()
        );
        assert_eq!(FlashFreq::compose(6, FlashClkDiv::Div1).unwrap().0, 0x6f);
        assert!(matches!(
            FlashFreq::compose(7, FlashClkDiv::Div2),
            Err(Error::InvalidFlashSizeMap(7))
        ));
        assert!(matches!(
            FlashClkDiv::try_from(3),
            Err(Error::InvalidClkDiv(3))
        ));
    }

    #[test]
    fn slot_numbers() {
        assert_eq!("2".parse::<Slot>().unwrap(), Slot::User2);
        assert_eq!(Slot::User1.to_string(), "user1");
        assert!(matches!(Slot::try_from(3), Err(Error::InvalidSlot(3))));
    }
}
