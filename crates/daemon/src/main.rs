use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::Parser;
use fuser::MountOption;

use common::{BasenameTags, JsonDatabase};
use podfuse_daemon::config::Config;
use podfuse_daemon::fuse::PodFs;
use podfuse_daemon::state::AppState;
use podfuse_daemon::vfs::ViewBuilder;

/// Projects a portable media player's track database as a browsable
/// filesystem.
#[derive(Parser, Debug)]
#[command(name = "podfuse", version, about)]
struct Cli {
    /// Where to mount the projected filesystem.
    mountpoint: PathBuf,

    /// Device mount point. Defaults to $PODFUSE_DEVICE, then a scan of the
    /// system mounts table.
    #[arg(long)]
    device: Option<PathBuf>,

    /// Config file path. Defaults to ~/.config/podfuse/config.toml.
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    let device = match cli.device.or_else(common::discover::discover_device) {
        Some(device) => device,
        None => bail!(
            "no device found; pass --device or set PODFUSE_DEVICE to the device mount point"
        ),
    };
    tracing::info!(device = %device.display(), "using device");

    let config_path = match cli.config {
        Some(path) => path,
        None => Config::default_path().context("cannot locate config directory")?,
    };
    let config = Config::load_or_init(&config_path)
        .with_context(|| format!("cannot load config from {}", config_path.display()))?;
    let views = ViewBuilder::new(config.templates()?)?;

    let db = JsonDatabase::open(&device)
        .with_context(|| format!("cannot open database on {}", device.display()))?;
    common::StorageAllocator::new(&device)
        .create_layout()
        .context("cannot initialize device layout")?;

    let state = AppState::new(
        Box::new(db),
        views,
        Box::new(BasenameTags),
        device,
        &cli.mountpoint,
    )
    .context("cannot build filesystem state")?;
    tracing::info!(
        tracks = state.db.lock().track_count(),
        mountpoint = %cli.mountpoint.display(),
        "mounting"
    );

    let options = [MountOption::FSName("podfuse".to_owned())];
    fuser::mount2(PodFs::new(Arc::new(state)), &cli.mountpoint, &options)
        .context("mount failed")?;
    Ok(())
}
