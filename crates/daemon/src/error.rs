//! Outcome taxonomy for the kernel-facing operation surface.
//!
//! Every operation reports one of these; the FUSE layer turns them into
//! errno values at the last moment. Real-filesystem failures on backing
//! paths are carried through [`FsError::Io`] so the original OS code
//! survives the translation.

use std::io;

pub type FsResult<T> = Result<T, FsError>;

#[derive(Debug, thiserror::Error)]
pub enum FsError {
    #[error("no such path")]
    NotFound,

    #[error("path already exists")]
    AlreadyExists,

    #[error("not a directory")]
    NotADirectory,

    #[error("is a directory")]
    IsADirectory,

    #[error("directory not empty")]
    NotEmpty,

    #[error("access denied")]
    AccessDenied,

    #[error("operation not permitted")]
    NotPermitted,

    #[error("invalid argument")]
    InvalidArgument,

    #[error("buffer too small")]
    Range,

    #[error("read-only filesystem")]
    ReadOnly,

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl FsError {
    /// The errno the kernel sees.
    pub fn errno(&self) -> libc::c_int {
        match self {
            FsError::NotFound => libc::ENOENT,
            FsError::AlreadyExists => libc::EEXIST,
            FsError::NotADirectory => libc::ENOTDIR,
            FsError::IsADirectory => libc::EISDIR,
            FsError::NotEmpty => libc::ENOTEMPTY,
            FsError::AccessDenied => libc::EACCES,
            FsError::NotPermitted => libc::EPERM,
            FsError::InvalidArgument => libc::EINVAL,
            FsError::Range => libc::ERANGE,
            FsError::ReadOnly => libc::EROFS,
            FsError::Io(err) => err.raw_os_error().unwrap_or(libc::EIO),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_errno_mapping() {
        assert_eq!(FsError::NotFound.errno(), libc::ENOENT);
        assert_eq!(FsError::Range.errno(), libc::ERANGE);
        assert_eq!(FsError::ReadOnly.errno(), libc::EROFS);
    }

    #[test]
    fn test_io_error_keeps_os_code() {
        let err = FsError::Io(io::Error::from_raw_os_error(libc::ENOSPC));
        assert_eq!(err.errno(), libc::ENOSPC);

        let opaque = FsError::Io(io::Error::new(io::ErrorKind::Other, "opaque"));
        assert_eq!(opaque.errno(), libc::EIO);
    }
}
