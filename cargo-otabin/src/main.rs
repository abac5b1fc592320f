use std::io;
use std::path::{Path, PathBuf};
use std::process::{exit, Command, ExitStatus, Stdio};

use cargo_project::{Artifact, Profile, Project};
use color_eyre::{Report, Result};
use env_logger::Env;
use otabin::{
    chip::{Chip, Esp8266},
    BuildParams, Config, FlashFreq, FlashMode, Inspector, Slot, SlotBuild,
};
use structopt::StructOpt;

#[derive(StructOpt)]
struct OtabinOpt {
    #[structopt(long)]
    release: bool,
    #[structopt(long)]
    example: Option<String>,
    #[structopt(long)]
    features: Option<String>,
    /// Flash mode: qio, qout, dio or dout
    #[structopt(long)]
    flash_mode: Option<FlashMode>,
    /// Flash size/frequency byte
    #[structopt(long, parse(try_from_str = parse_int::parse))]
    flash_freq: Option<u8>,
}

#[derive(StructOpt)]
enum Opt {
    Otabin(OtabinOpt),
}

fn otabin_main(args: OtabinOpt) -> Result<()> {
    let chip = Esp8266;
    let target = chip.target();
    let config = Config::load()?;
    let project = Project::query(".").map_err(|e| Report::msg(e.to_string()))?;

    let mut params: BuildParams = config.build_params()?;
    if let Some(mode) = args.flash_mode {
        params.flash_mode = mode;
    }
    if let Some(freq) = args.flash_freq {
        params.flash_freq = FlashFreq(freq);
    }

    // Both slots link to the same artifact path, so pack each one before
    // relinking for the next.
    for &slot in Slot::ALL.iter() {
        let script = config.linker_script(&chip, slot);
        log::info!("Linking {} with {}", slot, script.display());

        let status = build(
            args.release,
            artifact(&project, &args.example),
            &args.features,
            target,
            &script,
        )?;
        if !status.success() {
            exit_with_process_status(status)
        }

        let elf = get_artifact_path(&project, target, args.release, &args.example)?;
        let build = SlotBuild {
            slot,
            output: elf.with_file_name(format!("{}.bin", slot)),
            elf,
        };
        otabin::build_slot(&chip, &Inspector::Elf, &params, &build)?;
    }

    Ok(())
}

#[paw::main]
fn main(args: Opt) -> Result<()> {
    color_eyre::install()?;
    env_logger::Builder::from_env(Env::default().default_filter_or("otabin=info"))
        .format_timestamp(None)
        .init();

    match args {
        Opt::Otabin(opt) => otabin_main(opt),
    }
}

fn artifact<'a>(project: &'a Project, example: &'a Option<String>) -> Artifact<'a> {
    match example {
        Some(example) => Artifact::Example(example.as_str()),
        None => Artifact::Bin(project.name()),
    }
}

fn get_artifact_path(
    project: &Project,
    target: &str,
    release: bool,
    example: &Option<String>,
) -> Result<PathBuf> {
    let profile = if release {
        Profile::Release
    } else {
        Profile::Dev
    };

    let host = "x86_64-unknown-linux-gnu";
    project
        .path(artifact(project, example), profile, Some(target), host)
        .map_err(|e| Report::msg(e.to_string()))
}

/// Arguments for `cargo rustc`, used instead of `RUSTFLAGS` so that rustflags
/// from `.cargo/config.toml` still apply. The linker script only reaches the
/// final link of the artifact.
fn rustc_args(
    release: bool,
    artifact: Artifact,
    features: &Option<String>,
    target: &str,
    linker_script: &Path,
) -> Vec<String> {
    let mut args: Vec<String> = vec!["rustc".to_string()];

    if release {
        args.push("--release".to_string());
    }

    match artifact {
        Artifact::Example(example) => {
            args.push("--example".to_string());
            args.push(example.to_string());
        }
        Artifact::Bin(bin) => {
            args.push("--bin".to_string());
            args.push(bin.to_string());
        }
        _ => {}
    }

    if let Some(features) = features {
        args.push("--features".to_string());
        args.push(features.to_string());
    }

    args.push("--target".to_string());
    args.push(target.to_string());

    args.push("--".to_string());
    args.push(format!("-Clink-arg=-T{}", linker_script.display()));
    args
}

fn build(
    release: bool,
    artifact: Artifact,
    features: &Option<String>,
    target: &str,
    linker_script: &Path,
) -> io::Result<ExitStatus> {
    Command::new("cargo")
        .args(rustc_args(release, artifact, features, target, linker_script))
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()?
        .wait()
}

#[cfg(unix)]
fn exit_with_process_status(status: ExitStatus) -> ! {
    use std::os::unix::process::ExitStatusExt;
    let code = status.code().or_else(|| status.signal()).unwrap_or(1);

    exit(code)
}

#[cfg(not(unix))]
fn exit_with_process_status(status: ExitStatus) -> ! {
    let code = status.code().unwrap_or(1);

    exit(code)
}
