// Domain model and device-side collaborators shared by the daemon.
pub mod database;
pub mod discover;
pub mod storage;
pub mod tags;
pub mod track;

// Re-exports for consumers
pub use database::{Database, DatabaseError, JsonDatabase};
pub use storage::{StorageAllocator, StorageError, TransferMode};
pub use tags::{BasenameTags, ExtractedTags, TagError, TagExtractor};
pub use track::{file_type_for_extension, Playlist, Track, TrackId, RATING_STEP};
