use crate::{
    chip::Chip,
    elf::ExecutableImage,
    image::pack,
    params::{BuildParams, Slot},
    readelf, Error,
};
use std::{
    fs::{read, remove_file, File},
    io::Write,
    path::{Path, PathBuf},
};

/// Where section metadata comes from
#[derive(Debug, Clone)]
pub enum Inspector {
    /// Parse the ELF file directly
    Elf,
    /// Run the given `readelf` and parse its `--headers` dump
    Readelf(PathBuf),
}

impl Default for Inspector {
    fn default() -> Self {
        Inspector::Elf
    }
}

impl Inspector {
    pub fn inspect(&self, path: &Path, data: &[u8]) -> Result<ExecutableImage, Error> {
        match self {
            Inspector::Elf => ExecutableImage::from_elf_data(data),
            Inspector::Readelf(readelf) => readelf::inspect(readelf, path),
        }
    }
}

/// One executable linked for `slot`, and where its user bin goes
#[derive(Debug, Clone)]
pub struct SlotBuild {
    pub slot: Slot,
    pub elf: PathBuf,
    pub output: PathBuf,
}

impl SlotBuild {
    /// `user1.elf` -> `user1.bin`, in the same directory
    pub fn beside(slot: Slot, elf: PathBuf) -> Self {
        let output = elf.with_extension("bin");
        SlotBuild { slot, elf, output }
    }
}

pub fn check_load_address(chip: &dyn Chip, exe: &ExecutableImage, slot: Slot) -> Result<(), Error> {
    let expected = chip.irom_address(slot);
    let found = exe.irom()?.address;
    if found != expected {
        return Err(Error::LoadAddressMismatch {
            slot: slot.number(),
            expected,
            found,
        });
    }
    Ok(())
}

fn write_output(path: &Path, bin: &[u8]) -> Result<(), Error> {
    let mut file = File::create(path)?;
    file.write_all(bin)?;
    file.sync_all()?;
    Ok(())
}

/// Pack one slot. Nothing is written unless the whole image was built, and
/// on failure no user bin is left at `build.output`, not even one from an
/// earlier run.
pub fn build_slot(
    chip: &dyn Chip,
    inspector: &Inspector,
    params: &BuildParams,
    build: &SlotBuild,
) -> Result<(), Error> {
    let result = pack_slot(chip, inspector, params, build);
    if result.is_err() {
        let _ = remove_file(&build.output);
    }
    result
}

fn pack_slot(
    chip: &dyn Chip,
    inspector: &Inspector,
    params: &BuildParams,
    build: &SlotBuild,
) -> Result<(), Error> {
    let params = params.with_slot(build.slot);
    let source = read(&build.elf)?;
    let exe = inspector.inspect(&build.elf, &source)?;
    log::debug!(
        "{} entry: {:#x} sections: {}",
        build.elf.display(),
        exe.entry_point,
        exe.sections.len()
    );
    check_load_address(chip, &exe, build.slot)?;

    let bin = pack(&exe, &source, &params)?;
    write_output(&build.output, &bin)?;
    log::info!(
        "{}: {} -> {} ({} bytes)",
        build.slot,
        build.elf.display(),
        build.output.display(),
        bin.len()
    );
    Ok(())
}

/// Pack every slot in order, stopping at the first failure
pub fn build_all(
    chip: &dyn Chip,
    inspector: &Inspector,
    params: &BuildParams,
    builds: &[SlotBuild],
) -> Result<(), Error> {
    for build in builds {
        build_slot(chip, inspector, params, build)?;
    }
    Ok(())
}
