//! Guest error numbers
//!
//! The guest ABI uses the i386 Linux errno values, which differ from the
//! host's on non-Linux platforms. Handlers return [`SysResult`]; the
//! syscall dispatcher encodes failures as negated guest errno words.

use crate::memory::MemFault;

/// Guest (i386 Linux) error numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum Errno {
    /// Operation not permitted
    EPERM = 1,
    /// No such file or directory
    ENOENT = 2,
    /// No such process
    ESRCH = 3,
    /// Interrupted system call
    EINTR = 4,
    /// I/O error
    EIO = 5,
    /// No such device or address
    ENXIO = 6,
    /// Exec format error
    ENOEXEC = 8,
    /// Bad file number
    EBADF = 9,
    /// Try again
    EAGAIN = 11,
    /// Out of memory
    ENOMEM = 12,
    /// Permission denied
    EACCES = 13,
    /// Bad address
    EFAULT = 14,
    /// Device or resource busy
    EBUSY = 16,
    /// File exists
    EEXIST = 17,
    /// Not a directory
    ENOTDIR = 20,
    /// Is a directory
    EISDIR = 21,
    /// Invalid argument
    EINVAL = 22,
    /// File table overflow
    ENFILE = 23,
    /// Too many open files
    EMFILE = 24,
    /// Not a typewriter
    ENOTTY = 25,
    /// No space left on device
    ENOSPC = 28,
    /// Illegal seek
    ESPIPE = 29,
    /// Broken pipe
    EPIPE = 32,
    /// Function not implemented
    ENOSYS = 38,
    /// Message too long
    EMSGSIZE = 90,
    /// Protocol not available
    ENOPROTOOPT = 92,
    /// Protocol not supported
    EPROTONOSUPPORT = 93,
    /// Operation not supported on transport endpoint
    EOPNOTSUPP = 95,
    /// Address family not supported by protocol
    EAFNOSUPPORT = 97,
    /// Address already in use
    EADDRINUSE = 98,
    /// Cannot assign requested address
    EADDRNOTAVAIL = 99,
    /// Network is down
    ENETDOWN = 100,
    /// Network is unreachable
    ENETUNREACH = 101,
    /// Software caused connection abort
    ECONNABORTED = 103,
    /// Connection reset by peer
    ECONNRESET = 104,
    /// No buffer space available
    ENOBUFS = 105,
    /// Transport endpoint is already connected
    EISCONN = 106,
    /// Transport endpoint is not connected
    ENOTCONN = 107,
    /// Connection timed out
    ETIMEDOUT = 110,
    /// Connection refused
    ECONNREFUSED = 111,
    /// No route to host
    EHOSTUNREACH = 113,
    /// Operation already in progress
    EALREADY = 114,
    /// Operation now in progress
    EINPROGRESS = 115,
}

/// Result of a syscall handler: a non-negative return word, or a guest
/// errno to be negated at the dispatch boundary.
pub type SysResult = Result<u32, Errno>;

impl From<MemFault> for Errno {
    fn from(_: MemFault) -> Errno {
        Errno::EFAULT
    }
}

/// Translate a host errno value into the guest's numbering.
pub fn host_to_guest(host: i32) -> Errno {
    match host {
        e if e == libc::EPERM => Errno::EPERM,
        e if e == libc::ENOENT => Errno::ENOENT,
        e if e == libc::ESRCH => Errno::ESRCH,
        e if e == libc::EINTR => Errno::EINTR,
        e if e == libc::EIO => Errno::EIO,
        e if e == libc::ENXIO => Errno::ENXIO,
        e if e == libc::ENOEXEC => Errno::ENOEXEC,
        e if e == libc::EBADF => Errno::EBADF,
        e if e == libc::EAGAIN || e == libc::EWOULDBLOCK => Errno::EAGAIN,
        e if e == libc::ENOMEM => Errno::ENOMEM,
        e if e == libc::EACCES => Errno::EACCES,
        e if e == libc::EFAULT => Errno::EFAULT,
        e if e == libc::EBUSY => Errno::EBUSY,
        e if e == libc::EEXIST => Errno::EEXIST,
        e if e == libc::ENOTDIR => Errno::ENOTDIR,
        e if e == libc::EISDIR => Errno::EISDIR,
        e if e == libc::EINVAL => Errno::EINVAL,
        e if e == libc::ENFILE => Errno::ENFILE,
        e if e == libc::EMFILE => Errno::EMFILE,
        e if e == libc::ENOTTY => Errno::ENOTTY,
        e if e == libc::ENOSPC => Errno::ENOSPC,
        e if e == libc::ESPIPE => Errno::ESPIPE,
        e if e == libc::EPIPE => Errno::EPIPE,
        e if e == libc::ENOSYS => Errno::ENOSYS,
        e if e == libc::EMSGSIZE => Errno::EMSGSIZE,
        e if e == libc::ENOPROTOOPT => Errno::ENOPROTOOPT,
        e if e == libc::EPROTONOSUPPORT => Errno::EPROTONOSUPPORT,
        e if e == libc::EOPNOTSUPP => Errno::EOPNOTSUPP,
        e if e == libc::EAFNOSUPPORT => Errno::EAFNOSUPPORT,
        e if e == libc::EADDRINUSE => Errno::EADDRINUSE,
        e if e == libc::EADDRNOTAVAIL => Errno::EADDRNOTAVAIL,
        e if e == libc::ENETDOWN => Errno::ENETDOWN,
        e if e == libc::ENETUNREACH => Errno::ENETUNREACH,
        e if e == libc::ECONNABORTED => Errno::ECONNABORTED,
        e if e == libc::ECONNRESET => Errno::ECONNRESET,
        e if e == libc::ENOBUFS => Errno::ENOBUFS,
        e if e == libc::EISCONN => Errno::EISCONN,
        e if e == libc::ENOTCONN => Errno::ENOTCONN,
        e if e == libc::ETIMEDOUT => Errno::ETIMEDOUT,
        e if e == libc::ECONNREFUSED => Errno::ECONNREFUSED,
        e if e == libc::EHOSTUNREACH => Errno::EHOSTUNREACH,
        e if e == libc::EALREADY => Errno::EALREADY,
        e if e == libc::EINPROGRESS => Errno::EINPROGRESS,
        _ => Errno::EIO,
    }
}

/// Capture the host's last error and translate it into the guest's
/// numbering. Call immediately after a failed host syscall.
pub fn errno_map() -> Errno {
    let host = std::io::Error::last_os_error()
        .raw_os_error()
        .unwrap_or(libc::EIO);
    host_to_guest(host)
}

/// Encode a handler result as the guest-visible 32-bit return word.
pub fn encode(result: SysResult) -> u32 {
    match result {
        Ok(val) => val,
        Err(err) => (-(err as i32)) as u32,
    }
}
