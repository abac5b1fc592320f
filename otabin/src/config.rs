use crate::{
    chip::Chip,
    params::{BuildParams, FlashClkDiv, FlashFreq, FlashMode, Slot},
    Error,
};
use serde::Deserialize;
use std::{
    convert::TryFrom,
    fs::read,
    io,
    path::{Path, PathBuf},
};

pub const CONFIG_FILE: &str = "otabin.toml";

#[derive(Debug, Deserialize, Default, Clone, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct FlashCfg {
    pub mode: FlashMode,
    /// Raw size/frequency byte, takes precedence over `size_map`/`clk_div`
    pub freq: Option<u8>,
    pub size_map: Option<u8>,
    pub clk_div: Option<u8>,
}

#[derive(Debug, Deserialize, Default, Clone, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct SlotCfg {
    pub linker_script: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Default, Clone, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub flash: FlashCfg,
    pub slot1: SlotCfg,
    pub slot2: SlotCfg,
}

impl FlashCfg {
    pub fn flash_freq(&self) -> Result<FlashFreq, Error> {
        if let Some(freq) = self.freq {
            return Ok(FlashFreq(freq));
        }
        let default = FlashFreq::default().0;
        let size_map = self.size_map.unwrap_or(default >> 4);
        let clk_div = FlashClkDiv::try_from(self.clk_div.unwrap_or(default & 0xf))?;
        FlashFreq::compose(size_map, clk_div)
    }
}

impl Config {
    /// `otabin.toml` from the working directory, or the defaults if there is none
    pub fn load() -> Result<Self, Error> {
        Self::load_from(CONFIG_FILE)
    }

    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        match read(path.as_ref()) {
            Ok(content) => {
                log::debug!("Using config {}", path.as_ref().display());
                Ok(toml::from_slice(&content)?)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Config::default()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn build_params(&self) -> Result<BuildParams, Error> {
        Ok(BuildParams {
            flash_mode: self.flash.mode,
            flash_freq: self.flash.flash_freq()?,
            slot: Slot::default(),
        })
    }

    pub fn linker_script(&self, chip: &dyn Chip, slot: Slot) -> PathBuf {
        let slot_cfg = match slot {
            Slot::User1 => &self.slot1,
            Slot::User2 => &self.slot2,
        };
        slot_cfg
            .linker_script
            .clone()
            .unwrap_or_else(|| PathBuf::from(chip.linker_script(slot)))
    }
}
