//! Locating a mounted device.
//!
//! Resolution order: the `PODFUSE_DEVICE` environment variable (legacy
//! `IPOD_DIR` is honored too), then a scan of the system mounts table for
//! mount points that carry a device control directory. Devices already
//! projected by a running podfuse instance are skipped, recognized by
//! reading the mounted statistics file.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Statistics line prefix naming the projected device; also what the mount
/// scan greps for to detect an already-running instance.
pub const REAL_MOUNTPOINT_PREFIX: &str = "Real Mountpoint: ";

/// Name of the statistics file inside a podfuse mount.
const STATISTICS_FILE: &str = "statistics";

const ENV_VARS: [&str; 2] = ["PODFUSE_DEVICE", "IPOD_DIR"];
const MOUNTS_TABLES: [&str; 2] = ["/proc/mounts", "/etc/mtab"];

/// Returns a device mount point, or `None` when nothing plausible is found.
pub fn discover_device() -> Option<PathBuf> {
    for var in ENV_VARS {
        if let Ok(dir) = std::env::var(var) {
            if !dir.is_empty() {
                return Some(PathBuf::from(dir));
            }
        }
    }

    let table = MOUNTS_TABLES
        .iter()
        .map(Path::new)
        .find(|p| p.exists())?;
    let contents = fs::read_to_string(table).ok()?;

    let mut candidates: Vec<PathBuf> = Vec::new();
    let mut already_projected: HashSet<PathBuf> = HashSet::new();

    for line in contents.lines() {
        let mut fields = line.split_whitespace();
        let (Some(device), Some(dir)) = (fields.next(), fields.next()) else {
            continue;
        };
        let dir = PathBuf::from(dir);

        if dir.join("iPod_Control/iTunes").is_dir() {
            candidates.push(dir.clone());
        }

        if device == "podfuse" {
            if let Some(real) = read_projected_mountpoint(&dir) {
                already_projected.insert(real);
            }
        }
    }

    if let Some(free) = candidates
        .iter()
        .find(|c| !already_projected.contains(*c))
    {
        return Some(free.clone());
    }

    if let Some(first) = candidates.first() {
        tracing::warn!(
            device = %first.display(),
            "device is already projected by another podfuse instance"
        );
        return Some(first.clone());
    }

    None
}

/// Reads the `Real Mountpoint:` line out of a mounted statistics file.
fn read_projected_mountpoint(fuse_mount: &Path) -> Option<PathBuf> {
    let stats = fs::read_to_string(fuse_mount.join(STATISTICS_FILE)).ok()?;
    stats
        .lines()
        .find_map(|line| line.strip_prefix(REAL_MOUNTPOINT_PREFIX))
        .map(PathBuf::from)
}
