use env_logger::Env;
use main_error::MainError;
use otabin::{
    chip::Esp8266, image::ImageInfo, BuildParams, Config, Error, FlashFreq, FlashMode, Inspector,
    Slot, SlotBuild,
};
use std::{fs::read, path::PathBuf};
use structopt::StructOpt;

#[derive(StructOpt)]
struct FlashArgs {
    /// Flash mode: qio, qout, dio or dout
    #[structopt(long)]
    flash_mode: Option<FlashMode>,
    /// Flash size/frequency byte, e.g. 0x40 for 4MB at 40MHz
    #[structopt(long, parse(try_from_str = parse_int::parse))]
    flash_freq: Option<u8>,
    /// Read section headers with this readelf instead of parsing the elf
    #[structopt(long, parse(from_os_str))]
    readelf: Option<PathBuf>,
}

#[derive(StructOpt)]
struct PackOpt {
    /// Elf linked for the slot
    #[structopt(parse(from_os_str))]
    elf: PathBuf,
    /// User partition, 1 or 2
    #[structopt(short, long)]
    slot: Slot,
    /// Output file, default to the elf path with a .bin extension
    #[structopt(short, long, parse(from_os_str))]
    output: Option<PathBuf>,
    #[structopt(flatten)]
    flash: FlashArgs,
}

#[derive(StructOpt)]
struct OtaOpt {
    /// Elf linked for user1
    #[structopt(parse(from_os_str))]
    user1: PathBuf,
    /// Elf linked for user2
    #[structopt(parse(from_os_str))]
    user2: PathBuf,
    /// Write user1.bin and user2.bin here instead of next to the elf files
    #[structopt(long, parse(from_os_str))]
    out_dir: Option<PathBuf>,
    #[structopt(flatten)]
    flash: FlashArgs,
}

#[derive(StructOpt)]
struct InfoOpt {
    /// User bin file
    #[structopt(parse(from_os_str))]
    image: PathBuf,
}

#[derive(StructOpt)]
enum Opt {
    /// Pack an elf into the user bin of one slot
    Pack(PackOpt),
    /// Pack the user1 and user2 bins of one build
    Ota(OtaOpt),
    /// Show the layout of a user bin and check its checksums
    Info(InfoOpt),
}

impl FlashArgs {
    fn build_params(&self, config: &Config) -> Result<BuildParams, Error> {
        let mut params = config.build_params()?;
        if let Some(mode) = self.flash_mode {
            params.flash_mode = mode;
        }
        if let Some(freq) = self.flash_freq {
            params.flash_freq = FlashFreq(freq);
        }
        Ok(params)
    }

    fn inspector(&self) -> Inspector {
        match &self.readelf {
            Some(readelf) => Inspector::Readelf(readelf.clone()),
            None => Inspector::Elf,
        }
    }
}

fn pack(opt: PackOpt, config: &Config) -> Result<(), Error> {
    let params = opt.flash.build_params(config)?;
    let mut build = SlotBuild::beside(opt.slot, opt.elf);
    if let Some(output) = opt.output {
        build.output = output;
    }

    otabin::build_slot(&Esp8266, &opt.flash.inspector(), &params, &build)
}

fn ota(opt: OtaOpt, config: &Config) -> Result<(), Error> {
    let params = opt.flash.build_params(config)?;
    let out_dir = opt.out_dir;
    let builds = Slot::ALL
        .iter()
        .zip(vec![opt.user1, opt.user2])
        .map(|(&slot, elf)| match &out_dir {
            Some(dir) => SlotBuild {
                slot,
                elf,
                output: dir.join(format!("{}.bin", slot)),
            },
            None => SlotBuild::beside(slot, elf),
        })
        .collect::<Vec<_>>();

    otabin::build_all(&Esp8266, &opt.flash.inspector(), &params, &builds)
}

fn info(opt: InfoOpt) -> Result<(), Error> {
    let bin = read(&opt.image)?;
    let info = ImageInfo::parse(&bin)?;

    log::info!("Entry point: {:#010x}", info.irom.entry_point);
    log::info!("Slot: user{}", info.irom.slot);
    log::info!("Irom length: {:#x}", info.irom.section_length);
    log::info!(
        "Flash mode: {} freq: {:#04x}",
        info.segment_map.flash_mode,
        info.segment_map.flash_freq
    );
    for segment in &info.segments {
        log::info!(
            "Segment addr: {:#010x} size: {:#x} at {:#x}",
            segment.address,
            segment.length,
            segment.offset
        );
    }
    log::info!(
        "Checksum: {:#04x} (expected {:#04x})",
        info.checksum,
        info.expected_checksum
    );
    log::info!("Crc: {:#010x} (expected {:#010x})", info.crc, info.expected_crc);
    log::info!("Sha256: {}", info.sha256);

    if !info.is_valid() {
        return Err(Error::InvalidImage("checksum mismatch"));
    }
    Ok(())
}

#[paw::main]
fn main(args: Opt) -> Result<(), MainError> {
    env_logger::Builder::from_env(Env::default().default_filter_or("otabin=info"))
        .format_timestamp(None)
        .init();
    let config = Config::load()?;

    match args {
        Opt::Pack(opt) => pack(opt, &config)?,
        Opt::Ota(opt) => ota(opt, &config)?,
        Opt::Info(opt) => info(opt)?,
    };

    Ok(())
}
