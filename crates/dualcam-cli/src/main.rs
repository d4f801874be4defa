#![warn(missing_docs)]
//! # dualcam binary
//!
//! Composites one raw front frame into one raw back frame using a JSON
//! configuration, then writes the back frame.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context as _, ensure};
use clap::{Parser, ValueEnum};
use dualcam_core::{MirrorFlip, PlacementPoint, SynthesisConfig};
use dualcam_engine::SynthesisEngine;
use dualcam_scale::SoftwareScaler;
use sha2::{Digest as _, Sha256};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "dualcam", version, about = "Picture-in-picture YUV 4:2:0 compositor")]
struct Cli {
    /// Synthesis configuration JSON.
    #[arg(long)]
    config: PathBuf,

    /// Raw packed front frame.
    #[arg(long)]
    front: PathBuf,

    /// Raw packed back frame.
    #[arg(long)]
    back: PathBuf,

    /// Output path for the composited back frame.
    #[arg(long)]
    out: PathBuf,

    /// Override the placement column.
    #[arg(long)]
    x: Option<u32>,

    /// Override the placement row.
    #[arg(long)]
    y: Option<u32>,

    /// Geometric variant applied to the front frame.
    #[arg(long, value_enum, default_value_t = MirrorArg::None)]
    mirror: MirrorArg,

    /// Print the SHA-256 of the output frame.
    #[arg(long, default_value_t = false)]
    digest: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum MirrorArg {
    None,
    Horizontal,
    Vertical,
    Both,
}

impl From<MirrorArg> for MirrorFlip {
    fn from(arg: MirrorArg) -> Self {
        match arg {
            MirrorArg::None => MirrorFlip::NoTransform,
            MirrorArg::Horizontal => MirrorFlip::HorizontalMirror,
            MirrorArg::Vertical => MirrorFlip::VerticalFlip,
            MirrorArg::Both => MirrorFlip::Rotate180,
        }
    }
}

/// CLI entry point.
fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    run(Cli::parse())
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let raw = fs::read(&cli.config)
        .with_context(|| format!("read config '{}'", cli.config.display()))?;
    let mut config = SynthesisConfig::from_json_bytes(&raw)
        .with_context(|| format!("parse config '{}'", cli.config.display()))?;
    if cli.x.is_some() || cli.y.is_some() {
        config.placement = PlacementPoint::new(
            cli.x.unwrap_or(config.placement.x()),
            cli.y.unwrap_or(config.placement.y()),
        );
    }

    let mut front = read_frame(&cli.front, config.front.packed_len(), "front")?;
    let mut back = read_frame(&cli.back, config.back.packed_len(), "back")?;

    let mut engine = SynthesisEngine::configured(Arc::new(SoftwareScaler::new()), config)
        .context("initialize engine")?;
    engine.set_mirror_flip(cli.mirror.into());

    let state = engine.validate().context("validate configuration")?;
    if state.is_over_range() {
        warn!(?state, "placement exceeds the back frame and will be corrected");
    }

    engine
        .downscale_packed(&mut front)
        .context("downscale front frame")?;
    let stats = engine
        .composite_packed(&front, &mut back)
        .context("composite front into back")?;
    if let Some(placement) = engine.placement() {
        info!(
            x = placement.x(),
            y = placement.y(),
            luma_bytes = stats.luma_bytes,
            chroma_bytes = stats.chroma_bytes,
            "composited"
        );
    }

    if let Some(parent) = cli.out.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    fs::write(&cli.out, &back).with_context(|| format!("write '{}'", cli.out.display()))?;

    if cli.digest {
        println!("{}", hex::encode(Sha256::digest(&back)));
    }
    eprintln!("wrote {}", cli.out.display());
    Ok(())
}

fn read_frame(path: &Path, required: usize, label: &str) -> anyhow::Result<Vec<u8>> {
    let bytes =
        fs::read(path).with_context(|| format!("read {label} frame '{}'", path.display()))?;
    ensure!(
        bytes.len() >= required,
        "{label} frame '{}' has {} bytes, configuration needs {required}",
        path.display(),
        bytes.len()
    );
    Ok(bytes)
}
