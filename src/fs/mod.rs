//! File descriptor layer
//!
//! Guest file descriptors are small indices into a per-task [`FdTable`].
//! Each entry pairs a host descriptor with an operations table; the
//! socket layer installs its own ops so socket descriptors can be told
//! apart from plain files. The default [`RealFs`] ops delegate straight
//! to the host.

use std::sync::Arc;

use spin::Mutex;

use crate::errno::{errno_map, Errno};
use crate::sock::restart::SockRestart;

/// Guest file descriptor index.
pub type Fd = i32;

/// Socket bit in the stat mode word.
pub const S_IFSOCK: u32 = 0o140000;
/// Character-device bit in the stat mode word.
pub const S_IFCHR: u32 = 0o020000;

/// Guest open flags (i386 Linux values).
pub const O_NONBLOCK: u32 = 0o4000;
pub const O_APPEND: u32 = 0o2000;
pub const O_CLOEXEC: u32 = 0o2000000;

/// Highest number of descriptors one task may hold.
const FD_MAX: usize = 1024;

/// Operations table for one kind of file descriptor.
///
/// Implementations are singletons; per-descriptor state lives in
/// [`FileDesc`], which every method borrows.
pub trait FileOps: Sync {
    fn read(&self, fd: &FileDesc, buf: &mut [u8]) -> Result<usize, Errno>;
    fn write(&self, fd: &FileDesc, buf: &[u8]) -> Result<usize, Errno>;
    fn close(&self, fd: &FileDesc) -> Result<(), Errno>;
    /// Poll for readiness; `events` and the returned revents use the
    /// host's poll bits.
    fn poll(&self, fd: &FileDesc, events: i16) -> Result<i16, Errno>;
    fn getflags(&self, fd: &FileDesc) -> Result<u32, Errno>;
    fn setflags(&self, fd: &FileDesc, flags: u32) -> Result<(), Errno>;
    /// Whether this ops table is the socket one. The socket layer keys
    /// off this to reject non-socket descriptors with `EBADF`.
    fn is_socket(&self) -> bool {
        false
    }
}

/// One open file description.
pub struct FileDesc {
    /// The operations singleton for this descriptor's kind.
    pub ops: &'static dyn FileOps,
    /// Backing host descriptor.
    pub real_fd: libc::c_int,
    /// Guest stat mode (file type bits and permissions).
    pub stat_mode: u32,
    /// Guest open flags recorded at install time.
    pub flags: Mutex<u32>,
    /// State used by the socket restart helper.
    pub restart: Mutex<SockRestart>,
}

impl FileDesc {
    pub fn new(ops: &'static dyn FileOps, real_fd: libc::c_int, stat_mode: u32) -> Self {
        FileDesc {
            ops,
            real_fd,
            stat_mode,
            flags: Mutex::new(0),
            restart: Mutex::new(SockRestart::default()),
        }
    }

    pub fn is_socket(&self) -> bool {
        self.ops.is_socket()
    }
}

/// A task's descriptor table. Slot index is the guest-visible fd number;
/// the table exclusively owns its entries and handlers borrow them by
/// index.
pub struct FdTable {
    slots: Mutex<Vec<Option<Arc<FileDesc>>>>,
}

impl FdTable {
    /// An empty table.
    pub fn new() -> Self {
        FdTable {
            slots: Mutex::new(Vec::new()),
        }
    }

    /// A table with guest fds 0..2 wired to the host's stdio.
    pub fn with_stdio() -> Self {
        let table = Self::new();
        for host_fd in 0..3 {
            let desc = FileDesc::new(&REALFS, host_fd, S_IFCHR | 0o666);
            // Cannot fail on an empty table.
            let _ = table.install(desc, 0);
        }
        table
    }

    /// Install a descriptor in the lowest free slot and return its index.
    ///
    /// `flags` are guest open flags; `O_NONBLOCK` is pushed down to the
    /// host descriptor immediately.
    pub fn install(&self, desc: FileDesc, flags: u32) -> Result<Fd, Errno> {
        if flags & O_NONBLOCK != 0 {
            set_host_nonblock(desc.real_fd)?;
        }
        *desc.flags.lock() = flags;

        let mut slots = self.slots.lock();
        let entry = Arc::new(desc);
        for (i, slot) in slots.iter_mut().enumerate() {
            if slot.is_none() {
                *slot = Some(entry);
                return Ok(i as Fd);
            }
        }
        if slots.len() >= FD_MAX {
            return Err(Errno::EMFILE);
        }
        slots.push(Some(entry));
        Ok((slots.len() - 1) as Fd)
    }

    /// Borrow the descriptor at `fd`, if any.
    pub fn get(&self, fd: Fd) -> Option<Arc<FileDesc>> {
        if fd < 0 {
            return None;
        }
        self.slots.lock().get(fd as usize)?.clone()
    }

    /// Remove the descriptor at `fd` and run its close op.
    pub fn close(&self, fd: Fd) -> Result<(), Errno> {
        let desc = {
            let mut slots = self.slots.lock();
            if fd < 0 || fd as usize >= slots.len() {
                return Err(Errno::EBADF);
            }
            slots[fd as usize].take().ok_or(Errno::EBADF)?
        };
        desc.ops.close(&desc)
    }
}

impl Default for FdTable {
    fn default() -> Self {
        Self::new()
    }
}

fn set_host_nonblock(fd: libc::c_int) -> Result<(), Errno> {
    let flags = unsafe { libc::fcntl(fd, libc::F_GETFL) };
    if flags < 0 {
        return Err(errno_map());
    }
    if unsafe { libc::fcntl(fd, libc::F_SETFL, flags | libc::O_NONBLOCK) } < 0 {
        return Err(errno_map());
    }
    Ok(())
}

/// Host-backed default ops: every method is a thin wrapper around the
/// matching host call on `real_fd`.
pub struct RealFs;

/// The ops singleton for plain host-backed descriptors.
pub static REALFS: RealFs = RealFs;

impl FileOps for RealFs {
    fn read(&self, fd: &FileDesc, buf: &mut [u8]) -> Result<usize, Errno> {
        let n = unsafe { libc::read(fd.real_fd, buf.as_mut_ptr() as *mut libc::c_void, buf.len()) };
        if n < 0 {
            return Err(errno_map());
        }
        Ok(n as usize)
    }

    fn write(&self, fd: &FileDesc, buf: &[u8]) -> Result<usize, Errno> {
        let n = unsafe { libc::write(fd.real_fd, buf.as_ptr() as *const libc::c_void, buf.len()) };
        if n < 0 {
            return Err(errno_map());
        }
        Ok(n as usize)
    }

    fn close(&self, fd: &FileDesc) -> Result<(), Errno> {
        if unsafe { libc::close(fd.real_fd) } < 0 {
            return Err(errno_map());
        }
        Ok(())
    }

    fn poll(&self, fd: &FileDesc, events: i16) -> Result<i16, Errno> {
        let mut pfd = libc::pollfd {
            fd: fd.real_fd,
            events,
            revents: 0,
        };
        if unsafe { libc::poll(&mut pfd, 1, 0) } < 0 {
            return Err(errno_map());
        }
        Ok(pfd.revents)
    }

    fn getflags(&self, fd: &FileDesc) -> Result<u32, Errno> {
        let host = unsafe { libc::fcntl(fd.real_fd, libc::F_GETFL) };
        if host < 0 {
            return Err(errno_map());
        }
        let mut guest = 0;
        if host & libc::O_NONBLOCK != 0 {
            guest |= O_NONBLOCK;
        }
        if host & libc::O_APPEND != 0 {
            guest |= O_APPEND;
        }
        Ok(guest)
    }

    fn setflags(&self, fd: &FileDesc, flags: u32) -> Result<(), Errno> {
        let mut host = 0;
        if flags & O_NONBLOCK != 0 {
            host |= libc::O_NONBLOCK;
        }
        if flags & O_APPEND != 0 {
            host |= libc::O_APPEND;
        }
        if unsafe { libc::fcntl(fd.real_fd, libc::F_SETFL, host) } < 0 {
            return Err(errno_map());
        }
        Ok(())
    }
}
