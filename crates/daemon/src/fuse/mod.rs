//! Kernel-facing surface.
//!
//! - [`classify`]: names the reserved namespace and sorts paths into the
//!   handler branches.
//! - [`inode_table`]: inode ↔ path bridge between the kernel's addressing
//!   and the path-keyed projection tree.
//! - [`xattr`]: the `tag.*` metadata table on track files.
//! - `podfs`: the `fuser::Filesystem` implementation tying it together.

pub mod classify;
pub mod inode_table;
mod podfs;
pub mod xattr;

pub use inode_table::InodeTable;
pub use podfs::PodFs;
