// Daemon modules (projection engine + kernel surface)
pub mod config;
pub mod error;
pub mod fuse;
pub mod scripts;
pub mod staging;
pub mod state;
pub mod stats;
pub mod sync;
pub mod vfs;

// Re-exports for consumers
pub use config::Config;
pub use error::{FsError, FsResult};
pub use state::AppState;
pub use sync::{SyncController, SyncStatus};
