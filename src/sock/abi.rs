//! Guest socket ABI constants and translation tables
//!
//! The guest speaks the frozen i386 Linux socket ABI; the host speaks
//! whatever its libc speaks. Everything crossing that boundary goes
//! through the bidirectional maps here. The tables are immutable; an
//! untranslatable constant is a caller error (`EINVAL`), never a guess.

use bitflags::bitflags;

// Address families (guest numbering).
pub const PF_LOCAL: u16 = 1;
pub const PF_INET: u16 = 2;
pub const PF_INET6: u16 = 10;

// Socket types. The low nibble is the type; the rest are open-style
// flag bits accepted at socket creation.
pub const SOCK_STREAM: u32 = 1;
pub const SOCK_DGRAM: u32 = 2;
pub const SOCK_RAW: u32 = 3;
pub const SOCK_TYPE_MASK: u32 = 0xF;
pub const SOCK_NONBLOCK: u32 = 0o4000;
pub const SOCK_CLOEXEC: u32 = 0o2000000;

// Protocol numbers are IANA-assigned and identical on both sides; these
// two appear in the raw-socket compatibility shim.
pub const IPPROTO_ICMP_NUM: i32 = 1;
pub const IPPROTO_RAW_NUM: i32 = 255;

// Option levels (guest numbering).
pub const SOL_SOCKET: u32 = 1;
pub const IPPROTO_IP: u32 = 0;
pub const IPPROTO_TCP: u32 = 6;
pub const IPPROTO_IPV6: u32 = 41;
pub const IPPROTO_ICMPV6: u32 = 58;

// SOL_SOCKET options.
pub const SO_REUSEADDR: u32 = 2;
pub const SO_TYPE: u32 = 3;
pub const SO_ERROR: u32 = 4;
pub const SO_BROADCAST: u32 = 6;
pub const SO_SNDBUF: u32 = 7;
pub const SO_RCVBUF: u32 = 8;
pub const SO_KEEPALIVE: u32 = 9;
pub const SO_LINGER: u32 = 13;

// IPPROTO_IP options.
pub const IP_TOS: u32 = 1;
pub const IP_TTL: u32 = 2;
pub const IP_HDRINCL: u32 = 3;
pub const IP_MTU_DISCOVER: u32 = 10;

// IPPROTO_TCP options.
pub const TCP_NODELAY: u32 = 1;

// IPPROTO_IPV6 options.
pub const IPV6_UNICAST_HOPS: u32 = 16;
pub const IPV6_V6ONLY: u32 = 26;

// IPPROTO_ICMPV6 options.
pub const ICMP6_FILTER: u32 = 1;

bitflags! {
    /// Guest message flags for send/recv and `msghdr.msg_flags`.
    pub struct MsgFlags: u32 {
        const OOB = 0x1;
        const PEEK = 0x2;
        const DONTROUTE = 0x4;
        const CTRUNC = 0x8;
        const TRUNC = 0x20;
        const DONTWAIT = 0x40;
        const EOR = 0x80;
        const WAITALL = 0x100;
        const NOSIGNAL = 0x4000;
    }
}

#[cfg(target_os = "linux")]
const MSG_NOSIGNAL_REAL: libc::c_int = libc::MSG_NOSIGNAL;
// No host equivalent; the bit is accepted and dropped.
#[cfg(not(target_os = "linux"))]
const MSG_NOSIGNAL_REAL: libc::c_int = 0;

const FLAG_PAIRS: &[(MsgFlags, libc::c_int)] = &[
    (MsgFlags::OOB, libc::MSG_OOB),
    (MsgFlags::PEEK, libc::MSG_PEEK),
    (MsgFlags::DONTROUTE, libc::MSG_DONTROUTE),
    (MsgFlags::CTRUNC, libc::MSG_CTRUNC),
    (MsgFlags::TRUNC, libc::MSG_TRUNC),
    (MsgFlags::DONTWAIT, libc::MSG_DONTWAIT),
    (MsgFlags::EOR, libc::MSG_EOR),
    (MsgFlags::WAITALL, libc::MSG_WAITALL),
    (MsgFlags::NOSIGNAL, MSG_NOSIGNAL_REAL),
];

/// Guest address family to host.
pub fn family_to_real(family: u16) -> Option<libc::c_int> {
    match family {
        PF_LOCAL => Some(libc::AF_UNIX),
        PF_INET => Some(libc::AF_INET),
        PF_INET6 => Some(libc::AF_INET6),
        _ => None,
    }
}

/// Host address family to guest.
pub fn family_from_real(family: libc::c_int) -> Option<u16> {
    match family {
        f if f == libc::AF_UNIX => Some(PF_LOCAL),
        f if f == libc::AF_INET => Some(PF_INET),
        f if f == libc::AF_INET6 => Some(PF_INET6),
        _ => None,
    }
}

/// Guest socket type to host, ignoring the flag bits.
pub fn type_to_real(ty: u32) -> Option<libc::c_int> {
    match ty & SOCK_TYPE_MASK {
        SOCK_STREAM => Some(libc::SOCK_STREAM),
        SOCK_DGRAM => Some(libc::SOCK_DGRAM),
        SOCK_RAW => Some(libc::SOCK_RAW),
        _ => None,
    }
}

/// Host socket type to guest (for the `SO_TYPE` result).
pub fn type_from_real(ty: i32) -> Option<u32> {
    match ty {
        t if t == libc::SOCK_STREAM => Some(SOCK_STREAM),
        t if t == libc::SOCK_DGRAM => Some(SOCK_DGRAM),
        t if t == libc::SOCK_RAW => Some(SOCK_RAW),
        _ => None,
    }
}

/// Guest message flags to host. Unknown bits are an error, not a guess.
pub fn flags_to_real(flags: u32) -> Option<libc::c_int> {
    let flags = MsgFlags::from_bits(flags)?;
    let mut real = 0;
    for &(guest, host) in FLAG_PAIRS {
        if flags.contains(guest) {
            real |= host;
        }
    }
    Some(real)
}

/// Host message flags to guest. Host bits with no guest equivalent are
/// dropped; the kernel reports flags, so there is nothing to reject.
pub fn flags_from_real(real: libc::c_int) -> u32 {
    let mut flags = MsgFlags::empty();
    for &(guest, host) in FLAG_PAIRS {
        if host != 0 && real & host == host {
            flags |= guest;
        }
    }
    flags.bits()
}

/// Guest option level to host.
pub fn level_to_real(level: u32) -> Option<libc::c_int> {
    match level {
        SOL_SOCKET => Some(libc::SOL_SOCKET),
        IPPROTO_IP => Some(libc::IPPROTO_IP),
        IPPROTO_TCP => Some(libc::IPPROTO_TCP),
        IPPROTO_IPV6 => Some(libc::IPPROTO_IPV6),
        IPPROTO_ICMPV6 => Some(libc::IPPROTO_ICMPV6),
        _ => None,
    }
}

/// Guest option name to host. Option numbering is level-scoped, so the
/// level picks the sub-table.
pub fn opt_to_real(level: u32, opt: u32) -> Option<libc::c_int> {
    match level {
        SOL_SOCKET => match opt {
            SO_REUSEADDR => Some(libc::SO_REUSEADDR),
            SO_TYPE => Some(libc::SO_TYPE),
            SO_ERROR => Some(libc::SO_ERROR),
            SO_BROADCAST => Some(libc::SO_BROADCAST),
            SO_SNDBUF => Some(libc::SO_SNDBUF),
            SO_RCVBUF => Some(libc::SO_RCVBUF),
            SO_KEEPALIVE => Some(libc::SO_KEEPALIVE),
            SO_LINGER => Some(libc::SO_LINGER),
            _ => None,
        },
        IPPROTO_IP => match opt {
            IP_TOS => Some(libc::IP_TOS),
            IP_TTL => Some(libc::IP_TTL),
            IP_HDRINCL => Some(libc::IP_HDRINCL),
            #[cfg(target_os = "linux")]
            IP_MTU_DISCOVER => Some(libc::IP_MTU_DISCOVER),
            _ => None,
        },
        IPPROTO_TCP => match opt {
            TCP_NODELAY => Some(libc::TCP_NODELAY),
            _ => None,
        },
        IPPROTO_IPV6 => match opt {
            IPV6_UNICAST_HOPS => Some(libc::IPV6_UNICAST_HOPS),
            IPV6_V6ONLY => Some(libc::IPV6_V6ONLY),
            _ => None,
        },
        _ => None,
    }
}
