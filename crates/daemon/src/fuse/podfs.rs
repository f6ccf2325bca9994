//! The FUSE filesystem.
//!
//! Kernel requests arrive inode-addressed; each handler resolves the
//! inode back to a path, classifies it once, and dispatches. The real
//! work happens in `FsResult`-returning methods so the semantics are
//! testable without a kernel mount; the trait impl only translates
//! outcomes into replies.
//!
//! Attribute TTLs are zero because the statistics file and the upload
//! queue change size behind the kernel's back.

use std::ffi::{CString, OsStr};
use std::fs::{self, File, OpenOptions};
use std::io;
use std::os::unix::ffi::OsStrExt;
use std::os::unix::fs::FileExt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use fuser::{
    FileAttr, FileType, Filesystem, ReplyAttr, ReplyData, ReplyDirectory, ReplyEmpty, ReplyEntry,
    ReplyOpen, ReplyStatfs, ReplyWrite, ReplyXattr, Request, TimeOrNow,
};

use common::{Track, TransferMode};

use crate::error::{FsError, FsResult};
use crate::fuse::classify::{classify, PathClass, ReservedFile, SYNC_TRIGGER_FILE};
use crate::fuse::inode_table::{join, InodeTable};
use crate::fuse::xattr::{self, XattrOut};
use crate::state::AppState;
use crate::stats;
use crate::sync;
use crate::vfs::tree::NodeKind;

const TTL: Duration = Duration::ZERO;
const BLOCK_SIZE: u32 = 512;
/// Directories report a fixed nominal size.
const DIR_SIZE: u64 = 4096;

pub struct PodFs {
    state: Arc<AppState>,
    inodes: InodeTable,
    started: SystemTime,
    uid: u32,
    gid: u32,
}

/// Everything getattr needs about one node.
struct NodeView {
    kind: NodeKind,
    perm: u16,
    size: u64,
    nlink: u32,
    track: Option<Track>,
}

impl PodFs {
    pub fn new(state: Arc<AppState>) -> Self {
        Self {
            state,
            inodes: InodeTable::new(),
            started: SystemTime::now(),
            uid: unsafe { libc::getuid() },
            gid: unsafe { libc::getgid() },
        }
    }

    fn path_of(&self, ino: u64) -> FsResult<String> {
        self.inodes
            .get_path(ino)
            .map(str::to_owned)
            .ok_or(FsError::NotFound)
    }

    fn child_path(&self, parent: u64, name: &OsStr) -> FsResult<String> {
        let parent_path = self.path_of(parent)?;
        let name = name.to_str().ok_or(FsError::NotFound)?;
        Ok(join(&parent_path, name))
    }

    /// Snapshot of a node with its live size. The upload queue and staged
    /// files are stat'd, the statistics file is re-rendered.
    fn view(&self, path: &str) -> FsResult<NodeView> {
        let tree = self.state.tree.lock();
        let id = tree.lookup(path).ok_or(FsError::NotFound)?;
        let node = tree.get(id).ok_or(FsError::NotFound)?;

        let mut view = NodeView {
            kind: node.kind,
            perm: node.perm,
            size: node.size,
            nlink: 1,
            track: None,
        };
        if node.is_dir() {
            view.nlink = node.size as u32 + 2;
            view.size = DIR_SIZE;
        }
        let track_id = node.track;
        drop(tree);

        match classify(path) {
            PathClass::Reserved(ReservedFile::UploadList) => {
                view.size = self.state.upload_list_size();
            }
            PathClass::Reserved(ReservedFile::Statistics) => {
                let db = self.state.db.lock();
                view.size = stats::render(db.as_ref(), &self.state.sync.status()).len() as u64;
            }
            PathClass::Staging(rel) if !rel.is_empty() && view.kind == NodeKind::RegularFile => {
                if let Ok(meta) = fs::metadata(self.state.staging.real_path(&rel)) {
                    view.size = meta.len();
                }
            }
            _ => {}
        }

        if let Some(id) = track_id {
            view.track = self.state.db.lock().track(id);
        }
        Ok(view)
    }

    fn attr(&self, ino: u64, view: &NodeView) -> FileAttr {
        let kind = match view.kind {
            NodeKind::Directory => FileType::Directory,
            NodeKind::RegularFile => FileType::RegularFile,
        };
        FileAttr {
            ino,
            size: view.size,
            blocks: view.size.div_ceil(u64::from(BLOCK_SIZE)),
            atime: self.started,
            mtime: self.started,
            ctime: self.started,
            crtime: self.started,
            kind,
            perm: view.perm,
            nlink: view.nlink,
            uid: self.uid,
            gid: self.gid,
            rdev: 0,
            blksize: BLOCK_SIZE,
            flags: 0,
        }
    }

    fn do_lookup(&mut self, parent: u64, name: &OsStr) -> FsResult<FileAttr> {
        let path = self.child_path(parent, name)?;
        let view = self.view(&path)?;
        let ino = self.inodes.get_or_create(&path);
        Ok(self.attr(ino, &view))
    }

    fn do_getattr(&self, ino: u64) -> FsResult<FileAttr> {
        let path = self.path_of(ino)?;
        let view = self.view(&path)?;
        Ok(self.attr(ino, &view))
    }

    /// `.`/`..` first, then the children in listing order.
    fn do_readdir(&mut self, ino: u64) -> FsResult<Vec<(u64, FileType, String)>> {
        let path = self.path_of(ino)?;
        let children: Vec<(String, NodeKind)> = {
            let tree = self.state.tree.lock();
            let id = tree.lookup(&path).ok_or(FsError::NotFound)?;
            let node = tree.get(id).ok_or(FsError::NotFound)?;
            if !node.is_dir() {
                return Err(FsError::NotFound);
            }
            tree.children(id)
                .filter_map(|(name, child)| {
                    tree.get(child).map(|n| (name.to_string(), n.kind))
                })
                .collect()
        };

        let parent_ino = self
            .inodes
            .get_inode(&crate::fuse::inode_table::parent_path(&path))
            .unwrap_or(InodeTable::ROOT_INODE);
        let mut entries = vec![
            (ino, FileType::Directory, ".".to_owned()),
            (parent_ino, FileType::Directory, "..".to_owned()),
        ];
        for (name, kind) in children {
            let child_ino = self.inodes.get_or_create(&join(&path, &name));
            let file_type = match kind {
                NodeKind::Directory => FileType::Directory,
                NodeKind::RegularFile => FileType::RegularFile,
            };
            entries.push((child_ino, file_type, name));
        }
        Ok(entries)
    }

    /// Backing file for pass-through reads, if the path has one.
    fn backing_path(&self, path: &str, track: Option<&Track>) -> Option<PathBuf> {
        match classify(path) {
            PathClass::Reserved(ReservedFile::UploadList) => {
                Some(self.state.upload_list_path().to_path_buf())
            }
            PathClass::Staging(rel) if !rel.is_empty() => {
                Some(self.state.staging.real_path(&rel))
            }
            _ => track.map(|t| self.state.device_root.join(&t.device_path)),
        }
    }

    fn do_read(&self, path: &str, offset: i64, size: u32) -> FsResult<Vec<u8>> {
        let view = self.view(path)?;
        if view.kind != NodeKind::RegularFile {
            return Err(FsError::AccessDenied);
        }

        match classify(path) {
            PathClass::Reserved(ReservedFile::SyncScript) => {
                return read_string(&self.state.sync_script, offset, size);
            }
            PathClass::Reserved(ReservedFile::AddFilesScript) => {
                return read_string(&self.state.add_files_script, offset, size);
            }
            PathClass::Reserved(ReservedFile::Statistics) => {
                let rendered = {
                    let db = self.state.db.lock();
                    stats::render(db.as_ref(), &self.state.sync.status())
                };
                return read_string(&rendered, offset, size);
            }
            _ => {}
        }

        let backing = self
            .backing_path(path, view.track.as_ref())
            .ok_or(FsError::AccessDenied)?;
        let file = File::open(backing)?;
        let mut buf = vec![0u8; size as usize];
        let n = file.read_at(&mut buf, offset as u64)?;
        buf.truncate(n);
        Ok(buf)
    }

    fn do_write(&self, path: &str, offset: i64, data: &[u8]) -> FsResult<u32> {
        let target = match classify(path) {
            PathClass::Reserved(ReservedFile::UploadList) => {
                self.state.upload_list_path().to_path_buf()
            }
            PathClass::Staging(rel) if !rel.is_empty() => self.state.staging.real_path(&rel),
            _ => return Err(FsError::AccessDenied),
        };

        let file = OpenOptions::new().write(true).open(target)?;
        file.write_at(data, offset as u64)?;
        Ok(data.len() as u32)
    }

    fn do_truncate(&self, path: &str, size: u64) -> FsResult<()> {
        let target = match classify(path) {
            PathClass::Reserved(ReservedFile::UploadList) => {
                self.state.upload_list_path().to_path_buf()
            }
            PathClass::Staging(rel) if !rel.is_empty() => self.state.staging.real_path(&rel),
            _ => return Err(FsError::AccessDenied),
        };
        let file = OpenOptions::new().write(true).open(target)?;
        file.set_len(size)?;
        Ok(())
    }

    fn do_open(&self, path: &str, flags: i32) -> FsResult<()> {
        self.view(path)?;
        if flags & libc::O_ACCMODE == libc::O_RDONLY {
            return Ok(());
        }
        // Only the upload queue and staged files take writes.
        match classify(path) {
            PathClass::Reserved(ReservedFile::UploadList) => Ok(()),
            PathClass::Staging(rel) if !rel.is_empty() => Ok(()),
            _ => Err(FsError::AccessDenied),
        }
    }

    fn do_access(&self, path: &str, mask: i32) -> FsResult<()> {
        let view = self.view(path)?;
        let other = i32::from(view.perm) & 0o7;
        if mask & !other != 0 {
            return Err(FsError::ReadOnly);
        }
        Ok(())
    }

    fn do_mknod(&mut self, parent: u64, name: &OsStr, mode: u32) -> FsResult<FileAttr> {
        let path = self.child_path(parent, name)?;

        if parent == InodeTable::ROOT_INODE
            && name.to_str() == Some(SYNC_TRIGGER_FILE)
        {
            // The trigger file itself never comes into existence; creating
            // it starts a batch sync. Runs on its own thread so readers of
            // the statistics file can watch the progress.
            let state = Arc::clone(&self.state);
            std::thread::spawn(move || sync::run_batch(&state));
            let view = NodeView {
                kind: NodeKind::RegularFile,
                perm: 0o444,
                size: 0,
                nlink: 1,
                track: None,
            };
            let ino = self.inodes.get_or_create(&path);
            let attr = self.attr(ino, &view);
            self.inodes.remove_by_path(&path);
            return Ok(attr);
        }

        let rel = match classify(&path) {
            PathClass::Staging(rel) if !rel.is_empty() => rel,
            _ => return Err(FsError::AccessDenied),
        };
        if mode & libc::S_IFMT != libc::S_IFREG {
            return Err(FsError::NotPermitted);
        }
        if self.state.tree.lock().lookup(&path).is_some() {
            return Err(FsError::AlreadyExists);
        }

        let real = self.state.staging.real_path(&rel);
        OpenOptions::new().write(true).create_new(true).open(real)?;

        let name = name.to_str().ok_or(FsError::NotFound)?;
        let mut tree = self.state.tree.lock();
        let parent_path = self.path_of(parent)?;
        let parent_id = tree.lookup(&parent_path).ok_or(FsError::NotFound)?;
        tree.insert_file(parent_id, name, 0o666, 0, None);
        drop(tree);

        let view = self.view(&path)?;
        let ino = self.inodes.get_or_create(&path);
        Ok(self.attr(ino, &view))
    }

    fn do_mkdir(&mut self, parent: u64, name: &OsStr) -> FsResult<FileAttr> {
        let path = self.child_path(parent, name)?;
        if self.state.tree.lock().lookup(&path).is_some() {
            return Err(FsError::AlreadyExists);
        }
        let rel = match classify(&path) {
            PathClass::Staging(rel) if !rel.is_empty() => rel,
            _ => return Err(FsError::AccessDenied),
        };

        fs::create_dir(self.state.staging.real_path(&rel))?;

        let name = name.to_str().ok_or(FsError::NotFound)?;
        let parent_path = self.path_of(parent)?;
        let mut tree = self.state.tree.lock();
        let parent_id = tree.lookup(&parent_path).ok_or(FsError::NotFound)?;
        tree.insert_dir(parent_id, name, 0o777);
        drop(tree);

        let view = self.view(&path)?;
        let ino = self.inodes.get_or_create(&path);
        Ok(self.attr(ino, &view))
    }

    fn do_rmdir(&mut self, parent: u64, name: &OsStr) -> FsResult<()> {
        let path = self.child_path(parent, name)?;
        let exists = self.state.tree.lock().lookup(&path).is_some();
        if !exists {
            return Err(FsError::NotFound);
        }

        match classify(&path) {
            PathClass::PlaylistDir(dir_name) => self.remove_playlist(&path, &dir_name),
            PathClass::Staging(rel) if !rel.is_empty() => {
                {
                    let tree = self.state.tree.lock();
                    let id = tree.lookup(&path).ok_or(FsError::NotFound)?;
                    let node = tree.get(id).ok_or(FsError::NotFound)?;
                    if !node.is_dir() {
                        return Err(FsError::NotADirectory);
                    }
                    if node.child_count() > 0 {
                        return Err(FsError::NotEmpty);
                    }
                }
                fs::remove_dir(self.state.staging.real_path(&rel))?;
                let mut tree = self.state.tree.lock();
                if let Some(id) = tree.lookup(&path) {
                    tree.remove(id);
                }
                drop(tree);
                self.inodes.remove_by_path(&path);
                Ok(())
            }
            _ => Err(FsError::AccessDenied),
        }
    }

    /// Deletes a playlist. The directory name is the sanitized form of the
    /// playlist name, so the match runs over sanitized names too.
    fn remove_playlist(&mut self, path: &str, dir_name: &str) -> FsResult<()> {
        let mut db = self.state.db.lock();
        let target = db
            .playlists()
            .into_iter()
            .find(|p| !p.master && crate::vfs::template::sanitize(&p.name) == dir_name)
            .ok_or(FsError::NotFound)?;
        db.remove_playlist(&target.name);
        if let Err(err) = db.persist() {
            tracing::warn!(error = %err, "cannot persist after playlist removal");
        }
        drop(db);

        let mut tree = self.state.tree.lock();
        if let Some(id) = tree.lookup(path) {
            tree.remove_subtree(id);
        }
        drop(tree);
        self.inodes.remove_subtree(path);
        self.inodes.remove_by_path(path);
        tracing::info!(playlist = %target.name, "playlist removed");
        Ok(())
    }

    fn do_unlink(&mut self, parent: u64, name: &OsStr) -> FsResult<()> {
        let path = self.child_path(parent, name)?;
        let (is_dir, track_id) = {
            let tree = self.state.tree.lock();
            let id = tree.lookup(&path).ok_or(FsError::NotFound)?;
            let node = tree.get(id).ok_or(FsError::NotFound)?;
            (node.is_dir(), node.track)
        };
        if is_dir {
            return Err(FsError::IsADirectory);
        }

        if let PathClass::Staging(rel) = classify(&path) {
            // Deleting a staged file cancels the pending upload.
            fs::remove_file(self.state.staging.real_path(&rel))?;
            let mut tree = self.state.tree.lock();
            if let Some(id) = tree.lookup(&path) {
                tree.remove(id);
            }
            drop(tree);
            self.inodes.remove_by_path(&path);
            return Ok(());
        }

        let track_id = track_id.ok_or(FsError::AccessDenied)?;
        self.remove_track(track_id)
    }

    /// Removes a track everywhere: the device file, the database record,
    /// every view path, and its playlist entries.
    fn remove_track(&mut self, track_id: u64) -> FsResult<()> {
        let track = self
            .state
            .db
            .lock()
            .track(track_id)
            .ok_or(FsError::AccessDenied)?;

        let device_file = self.state.device_root.join(&track.device_path);
        if let Err(err) = fs::remove_file(&device_file) {
            tracing::warn!(path = %device_file.display(), error = %err, "cannot delete device file");
            return Err(FsError::AccessDenied);
        }

        let mut db = self.state.db.lock();
        db.remove_track(track_id)
            .map_err(|_| FsError::AccessDenied)?;
        if let Err(err) = db.persist() {
            tracing::warn!(error = %err, "cannot persist after track removal");
        }

        let mut tree = self.state.tree.lock();
        self.state.views.unproject(&mut tree, &track);
        self.state.views.rebuild_playlists(&mut tree, db.as_ref());
        drop(tree);
        drop(db);

        for template in self.state.views.templates() {
            let path = format!("/{}", template.expand(&track).join("/"));
            self.inodes.remove_by_path(&path);
        }
        tracing::info!(id = track_id, "track removed");
        Ok(())
    }

    /// Closing a staged file hands it to the ingestion pipeline; the file
    /// leaves `Transfer` whether or not ingestion succeeded.
    fn do_release(&mut self, path: &str) -> FsResult<()> {
        let rel = match classify(path) {
            PathClass::Staging(rel) if !rel.is_empty() => rel,
            _ => return Ok(()),
        };
        {
            let mut tree = self.state.tree.lock();
            let Some(id) = tree.lookup(path) else {
                return Ok(());
            };
            let Some(node) = tree.get_mut(id) else {
                return Ok(());
            };
            if node.is_dir() {
                return Ok(());
            }
            node.perm = 0o444;
        }

        let real = self.state.staging.real_path(&rel);
        self.state
            .sync
            .set_uploading(real.display().to_string());
        let guard = self.state.sync.ingest_guard();
        let outcome = sync::ingest_file(&self.state, &real, TransferMode::Move);
        drop(guard);
        self.state.sync.set_idle();

        let mut tree = self.state.tree.lock();
        if let Some(id) = tree.lookup(path) {
            tree.remove(id);
        }
        drop(tree);
        self.inodes.remove_by_path(path);
        if real.exists() {
            let _ = fs::remove_file(&real);
        }

        match outcome {
            Ok(_) => Ok(()),
            Err(err) => {
                tracing::warn!(path, error = %err, "staged upload failed");
                Err(FsError::Io(io::Error::other(err)))
            }
        }
    }
}

/// Serves a byte range out of an in-memory rendition.
fn read_string(contents: &str, offset: i64, size: u32) -> FsResult<Vec<u8>> {
    let bytes = contents.as_bytes();
    let offset = offset as usize;
    if offset >= bytes.len() {
        return Err(FsError::InvalidArgument);
    }
    let end = (offset + size as usize).min(bytes.len());
    Ok(bytes[offset..end].to_vec())
}

impl Filesystem for PodFs {
    fn lookup(&mut self, _req: &Request, parent: u64, name: &OsStr, reply: ReplyEntry) {
        match self.do_lookup(parent, name) {
            Ok(attr) => reply.entry(&TTL, &attr, 0),
            Err(err) => reply.error(err.errno()),
        }
    }

    fn getattr(&mut self, _req: &Request, ino: u64, _fh: Option<u64>, reply: ReplyAttr) {
        match self.do_getattr(ino) {
            Ok(attr) => reply.attr(&TTL, &attr),
            Err(err) => reply.error(err.errno()),
        }
    }

    fn setattr(
        &mut self,
        _req: &Request,
        ino: u64,
        _mode: Option<u32>,
        _uid: Option<u32>,
        _gid: Option<u32>,
        size: Option<u64>,
        _atime: Option<TimeOrNow>,
        _mtime: Option<TimeOrNow>,
        _ctime: Option<SystemTime>,
        _fh: Option<u64>,
        _crtime: Option<SystemTime>,
        _chgtime: Option<SystemTime>,
        _bkuptime: Option<SystemTime>,
        _flags: Option<u32>,
        reply: ReplyAttr,
    ) {
        let result = self.path_of(ino).and_then(|path| {
            if let Some(size) = size {
                self.do_truncate(&path, size)?;
            }
            self.do_getattr(ino)
        });
        match result {
            Ok(attr) => reply.attr(&TTL, &attr),
            Err(err) => reply.error(err.errno()),
        }
    }

    fn mknod(
        &mut self,
        _req: &Request,
        parent: u64,
        name: &OsStr,
        mode: u32,
        _umask: u32,
        _rdev: u32,
        reply: ReplyEntry,
    ) {
        match self.do_mknod(parent, name, mode) {
            Ok(attr) => reply.entry(&TTL, &attr, 0),
            Err(err) => reply.error(err.errno()),
        }
    }

    fn mkdir(
        &mut self,
        _req: &Request,
        parent: u64,
        name: &OsStr,
        _mode: u32,
        _umask: u32,
        reply: ReplyEntry,
    ) {
        match self.do_mkdir(parent, name) {
            Ok(attr) => reply.entry(&TTL, &attr, 0),
            Err(err) => reply.error(err.errno()),
        }
    }

    fn unlink(&mut self, _req: &Request, parent: u64, name: &OsStr, reply: ReplyEmpty) {
        match self.do_unlink(parent, name) {
            Ok(()) => reply.ok(),
            Err(err) => reply.error(err.errno()),
        }
    }

    fn rmdir(&mut self, _req: &Request, parent: u64, name: &OsStr, reply: ReplyEmpty) {
        match self.do_rmdir(parent, name) {
            Ok(()) => reply.ok(),
            Err(err) => reply.error(err.errno()),
        }
    }

    fn open(&mut self, _req: &Request, ino: u64, flags: i32, reply: ReplyOpen) {
        let result = self.path_of(ino).and_then(|path| self.do_open(&path, flags));
        match result {
            Ok(()) => reply.opened(0, 0),
            Err(err) => reply.error(err.errno()),
        }
    }

    fn read(
        &mut self,
        _req: &Request,
        ino: u64,
        _fh: u64,
        offset: i64,
        size: u32,
        _flags: i32,
        _lock_owner: Option<u64>,
        reply: ReplyData,
    ) {
        let result = self
            .path_of(ino)
            .and_then(|path| self.do_read(&path, offset, size));
        match result {
            Ok(data) => reply.data(&data),
            Err(err) => reply.error(err.errno()),
        }
    }

    fn write(
        &mut self,
        _req: &Request,
        ino: u64,
        _fh: u64,
        offset: i64,
        data: &[u8],
        _write_flags: u32,
        _flags: i32,
        _lock_owner: Option<u64>,
        reply: ReplyWrite,
    ) {
        let result = self
            .path_of(ino)
            .and_then(|path| self.do_write(&path, offset, data));
        match result {
            Ok(written) => reply.written(written),
            Err(err) => reply.error(err.errno()),
        }
    }

    fn release(
        &mut self,
        _req: &Request,
        ino: u64,
        _fh: u64,
        _flags: i32,
        _lock_owner: Option<u64>,
        _flush: bool,
        reply: ReplyEmpty,
    ) {
        let result = self.path_of(ino).and_then(|path| self.do_release(&path));
        match result {
            Ok(()) => reply.ok(),
            Err(err) => reply.error(err.errno()),
        }
    }

    fn readdir(
        &mut self,
        _req: &Request,
        ino: u64,
        _fh: u64,
        offset: i64,
        mut reply: ReplyDirectory,
    ) {
        match self.do_readdir(ino) {
            Ok(entries) => {
                for (idx, (child_ino, file_type, name)) in entries.into_iter().enumerate() {
                    if (idx as i64) < offset {
                        continue;
                    }
                    if reply.add(child_ino, (idx + 1) as i64, file_type, &name) {
                        break;
                    }
                }
                reply.ok();
            }
            Err(err) => reply.error(err.errno()),
        }
    }

    fn access(&mut self, _req: &Request, ino: u64, mask: i32, reply: ReplyEmpty) {
        let result = self.path_of(ino).and_then(|path| self.do_access(&path, mask));
        match result {
            Ok(()) => reply.ok(),
            Err(err) => reply.error(err.errno()),
        }
    }

    fn statfs(&mut self, _req: &Request, _ino: u64, reply: ReplyStatfs) {
        let Ok(device) = CString::new(self.state.device_root.as_os_str().as_bytes()) else {
            reply.error(libc::EIO);
            return;
        };
        let mut vfs: libc::statvfs = unsafe { std::mem::zeroed() };
        let ret = unsafe { libc::statvfs(device.as_ptr(), &mut vfs) };
        if ret != 0 {
            reply.error(io::Error::last_os_error().raw_os_error().unwrap_or(libc::EIO));
            return;
        }
        reply.statfs(
            vfs.f_blocks as u64,
            vfs.f_bfree as u64,
            vfs.f_bavail as u64,
            vfs.f_files as u64,
            vfs.f_ffree as u64,
            vfs.f_bsize as u32,
            vfs.f_namemax as u32,
            vfs.f_frsize as u32,
        );
    }

    fn getxattr(&mut self, _req: &Request, ino: u64, name: &OsStr, size: u32, reply: ReplyXattr) {
        let result = self.path_of(ino).and_then(|path| {
            let view = self.view(&path)?;
            let name = name.to_str().ok_or(FsError::AccessDenied)?;
            xattr::get(view.track.as_ref(), name, size)
        });
        reply_xattr(result, reply);
    }

    fn listxattr(&mut self, _req: &Request, ino: u64, size: u32, reply: ReplyXattr) {
        let result = self.path_of(ino).and_then(|path| {
            let view = self.view(&path)?;
            xattr::list(view.track.as_ref(), size)
        });
        reply_xattr(result, reply);
    }

    fn destroy(&mut self) {
        if let Err(err) = self.state.db.lock().persist() {
            tracing::error!(error = %err, "cannot persist database at unmount");
        }
    }
}

fn reply_xattr(result: FsResult<XattrOut>, reply: ReplyXattr) {
    match result {
        Ok(XattrOut::Size(size)) => reply.size(size),
        Ok(XattrOut::Data(data)) => reply.data(&data),
        Err(err) => reply.error(err.errno()),
    }
}
