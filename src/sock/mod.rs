//! Socket syscall translation
//!
//! One handler per guest socket operation, each following the same
//! pattern: validate the descriptor is a socket, translate constants
//! through [`abi`], marshal guest buffers through [`marshal`], issue the
//! host call, translate the error, and marshal outputs back. The legacy
//! `socketcall` multiplexer at the bottom routes the single i386 socket
//! syscall to these handlers.

pub mod abi;
pub mod marshal;
pub mod restart;

use std::sync::Arc;

use log::{trace, warn};

use crate::errno::{errno_map, Errno, SysResult};
use crate::fs::{Fd, FileDesc, FileOps, REALFS, S_IFSOCK};
use crate::Task;

/// Socket descriptor operations: host-backed I/O with the sleep-kill
/// error rewrite, plus restart-helper bookkeeping on close.
pub struct SocketOps;

/// The ops singleton for socket descriptors. Descriptor identity against
/// this table is what makes an fd a socket.
pub static SOCKET_OPS: SocketOps = SocketOps;

impl FileOps for SocketOps {
    fn read(&self, fd: &FileDesc, buf: &mut [u8]) -> Result<usize, Errno> {
        REALFS.read(fd, buf).map_err(|err| translate_sleep_err(fd, err))
    }

    fn write(&self, fd: &FileDesc, buf: &[u8]) -> Result<usize, Errno> {
        REALFS.write(fd, buf).map_err(|err| translate_sleep_err(fd, err))
    }

    fn close(&self, fd: &FileDesc) -> Result<(), Errno> {
        restart::end_listen(fd);
        REALFS.close(fd)
    }

    fn poll(&self, fd: &FileDesc, events: i16) -> Result<i16, Errno> {
        REALFS.poll(fd, events)
    }

    fn getflags(&self, fd: &FileDesc) -> Result<u32, Errno> {
        REALFS.getflags(fd)
    }

    fn setflags(&self, fd: &FileDesc, flags: u32) -> Result<(), Errno> {
        REALFS.setflags(fd, flags)
    }

    fn is_socket(&self) -> bool {
        true
    }
}

/// Some hosts force-close connected sockets when the device sleeps, after
/// which reads and writes fail with a non-POSIX `ENOTCONN`. A
/// `getpeername` probe failing with `EINVAL` tells that apart from a
/// never-connected socket; the error is rewritten to `ECONNRESET`.
fn translate_sleep_err(fd: &FileDesc, err: Errno) -> Errno {
    if err != Errno::ENOTCONN {
        return err;
    }
    let mut addr: libc::sockaddr_storage = unsafe { std::mem::zeroed() };
    let mut len = std::mem::size_of::<libc::sockaddr_storage>() as libc::socklen_t;
    let rc = unsafe {
        libc::getpeername(
            fd.real_fd,
            &mut addr as *mut _ as *mut libc::sockaddr,
            &mut len,
        )
    };
    if rc < 0 && std::io::Error::last_os_error().raw_os_error() == Some(libc::EINVAL) {
        return Errno::ECONNRESET;
    }
    err
}

/// Wrap a host socket in the descriptor table.
fn sock_fd_create(task: &Task, sock: libc::c_int, flags: u32) -> Result<Fd, Errno> {
    let desc = FileDesc::new(&SOCKET_OPS, sock, S_IFSOCK | 0o666);
    task.files.install(desc, flags)
}

/// Look up a descriptor and insist it is a socket.
fn sock_getfd(task: &Task, fd: u32) -> Result<Arc<FileDesc>, Errno> {
    let desc = task.files.get(fd as Fd).ok_or(Errno::EBADF)?;
    if !desc.is_socket() {
        return Err(Errno::EBADF);
    }
    Ok(desc)
}

pub fn sys_socket(task: &mut Task, domain: u32, ty: u32, protocol: u32) -> SysResult {
    trace!("socket({}, {}, {})", domain, ty, protocol);
    let real_domain = abi::family_to_real(domain as u16).ok_or(Errno::EINVAL)?;
    let real_type = abi::type_to_real(ty).ok_or(Errno::EINVAL)?;

    // this hack makes mtr work: hosts that refuse unprivileged raw
    // sockets still allow datagram ICMP
    let mut protocol = protocol as i32;
    if ty & abi::SOCK_TYPE_MASK == abi::SOCK_RAW && protocol == abi::IPPROTO_RAW_NUM {
        protocol = abi::IPPROTO_ICMP_NUM;
    }

    let sock = unsafe { libc::socket(real_domain, real_type, protocol) };
    if sock < 0 {
        return Err(errno_map());
    }

    #[cfg(any(target_os = "macos", target_os = "ios"))]
    if real_domain == libc::AF_INET && real_type == libc::SOCK_DGRAM {
        // in some cases, such as ICMP, datagram sockets here deliver the
        // IP header like raw sockets; ask the host to strip it
        const IP_STRIPHDR: libc::c_int = 23;
        let one: libc::c_int = 1;
        unsafe {
            libc::setsockopt(
                sock,
                libc::IPPROTO_IP,
                IP_STRIPHDR,
                &one as *const _ as *const libc::c_void,
                std::mem::size_of::<libc::c_int>() as libc::socklen_t,
            );
        }
    }

    let fd = match sock_fd_create(task, sock, ty & (abi::SOCK_NONBLOCK | abi::SOCK_CLOEXEC)) {
        Ok(fd) => fd,
        Err(err) => {
            unsafe { libc::close(sock) };
            return Err(err);
        }
    };
    if let Some(desc) = task.files.get(fd) {
        desc.restart.lock().proto = protocol;
    }
    Ok(fd as u32)
}

pub fn sys_bind(task: &mut Task, fd: u32, sockaddr_addr: u32, sockaddr_len: u32) -> SysResult {
    trace!("bind({}, {:#x}, {})", fd, sockaddr_addr, sockaddr_len);
    let sock = sock_getfd(task, fd)?;
    let addr = marshal::sockaddr_read(&task.cpu.mem, sockaddr_addr, sockaddr_len)?;
    let rc = unsafe {
        libc::bind(
            sock.real_fd,
            addr.as_ptr() as *const libc::sockaddr,
            addr.len() as libc::socklen_t,
        )
    };
    if rc < 0 {
        return Err(errno_map());
    }
    Ok(0)
}

pub fn sys_connect(task: &mut Task, fd: u32, sockaddr_addr: u32, sockaddr_len: u32) -> SysResult {
    trace!("connect({}, {:#x}, {})", fd, sockaddr_addr, sockaddr_len);
    let sock = sock_getfd(task, fd)?;
    let addr = marshal::sockaddr_read(&task.cpu.mem, sockaddr_addr, sockaddr_len)?;
    let rc = unsafe {
        libc::connect(
            sock.real_fd,
            addr.as_ptr() as *const libc::sockaddr,
            addr.len() as libc::socklen_t,
        )
    };
    if rc < 0 {
        return Err(errno_map());
    }
    Ok(0)
}

pub fn sys_listen(task: &mut Task, fd: u32, backlog: u32) -> SysResult {
    trace!("listen({}, {})", fd, backlog);
    let sock = sock_getfd(task, fd)?;
    if unsafe { libc::listen(sock.real_fd, backlog as libc::c_int) } < 0 {
        return Err(errno_map());
    }
    restart::begin_listen(&sock);
    Ok(0)
}

pub fn sys_accept(task: &mut Task, fd: u32, sockaddr_addr: u32, len_addr: u32) -> SysResult {
    trace!("accept({}, {:#x}, {:#x})", fd, sockaddr_addr, len_addr);
    let sock = sock_getfd(task, fd)?;
    let mut addrlen = task.cpu.mem.read_u32(len_addr)?;
    let mut buf = vec![0u8; addrlen.min(marshal::SOCKADDR_MAX) as usize];

    let client = loop {
        restart::begin_listen_wait(&sock);
        let mut socklen = buf.len() as libc::socklen_t;
        let rc = unsafe {
            libc::accept(
                sock.real_fd,
                buf.as_mut_ptr() as *mut libc::sockaddr,
                &mut socklen,
            )
        };
        restart::end_listen_wait(&sock);
        if rc >= 0 {
            addrlen = socklen as u32;
            break rc;
        }
        let err = errno_map();
        if restart::should_restart_listen_wait() && err == Errno::EINTR {
            continue;
        }
        return Err(err);
    };

    let wlen = (addrlen as usize).min(buf.len());
    if let Err(err) = marshal::sockaddr_write(&mut task.cpu.mem, sockaddr_addr, &mut buf[..wlen]) {
        unsafe { libc::close(client) };
        return Err(err);
    }
    if task.cpu.mem.write_u32(len_addr, addrlen).is_err() {
        unsafe { libc::close(client) };
        return Err(Errno::EFAULT);
    }

    match sock_fd_create(task, client, 0) {
        Ok(client_fd) => Ok(client_fd as u32),
        Err(err) => {
            unsafe { libc::close(client) };
            Err(err)
        }
    }
}

fn sock_name_common(
    task: &mut Task,
    fd: u32,
    sockaddr_addr: u32,
    len_addr: u32,
    host_call: unsafe extern "C" fn(
        libc::c_int,
        *mut libc::sockaddr,
        *mut libc::socklen_t,
    ) -> libc::c_int,
) -> SysResult {
    let sock = sock_getfd(task, fd)?;
    let addrlen = task.cpu.mem.read_u32(len_addr)?;
    let mut buf = vec![0u8; addrlen.min(marshal::SOCKADDR_MAX) as usize];
    let mut socklen = buf.len() as libc::socklen_t;
    let rc = unsafe { host_call(sock.real_fd, buf.as_mut_ptr() as *mut libc::sockaddr, &mut socklen) };
    if rc < 0 {
        return Err(errno_map());
    }
    let wlen = (socklen as usize).min(buf.len());
    marshal::sockaddr_write(&mut task.cpu.mem, sockaddr_addr, &mut buf[..wlen])?;
    task.cpu.mem.write_u32(len_addr, socklen as u32)?;
    Ok(rc as u32)
}

pub fn sys_getsockname(task: &mut Task, fd: u32, sockaddr_addr: u32, len_addr: u32) -> SysResult {
    trace!("getsockname({}, {:#x}, {:#x})", fd, sockaddr_addr, len_addr);
    sock_name_common(task, fd, sockaddr_addr, len_addr, libc::getsockname)
}

pub fn sys_getpeername(task: &mut Task, fd: u32, sockaddr_addr: u32, len_addr: u32) -> SysResult {
    trace!("getpeername({}, {:#x}, {:#x})", fd, sockaddr_addr, len_addr);
    sock_name_common(task, fd, sockaddr_addr, len_addr, libc::getpeername)
}

pub fn sys_socketpair(
    task: &mut Task,
    domain: u32,
    ty: u32,
    protocol: u32,
    sockets_addr: u32,
) -> SysResult {
    trace!("socketpair({}, {}, {}, {:#x})", domain, ty, protocol, sockets_addr);
    let real_domain = abi::family_to_real(domain as u16).ok_or(Errno::EINVAL)?;
    let real_type = abi::type_to_real(ty).ok_or(Errno::EINVAL)?;

    let mut sv = [0 as libc::c_int; 2];
    if unsafe { libc::socketpair(real_domain, real_type, protocol as libc::c_int, sv.as_mut_ptr()) }
        < 0
    {
        return Err(errno_map());
    }

    let flags = ty & (abi::SOCK_NONBLOCK | abi::SOCK_CLOEXEC);
    let fd0 = match sock_fd_create(task, sv[0], flags) {
        Ok(fd) => fd,
        Err(err) => {
            unsafe {
                libc::close(sv[0]);
                libc::close(sv[1]);
            }
            return Err(err);
        }
    };
    let fd1 = match sock_fd_create(task, sv[1], flags) {
        Ok(fd) => fd,
        Err(err) => {
            let _ = task.files.close(fd0);
            unsafe { libc::close(sv[1]) };
            return Err(err);
        }
    };

    let mut out = [0u8; 8];
    out[0..4].copy_from_slice(&(fd0 as u32).to_le_bytes());
    out[4..8].copy_from_slice(&(fd1 as u32).to_le_bytes());
    if task.cpu.mem.write_bytes(sockets_addr, &out).is_err() {
        let _ = task.files.close(fd1);
        let _ = task.files.close(fd0);
        return Err(Errno::EFAULT);
    }

    trace!(" [{}, {}]", fd0, fd1);
    Ok(0)
}

pub fn sys_sendto(
    task: &mut Task,
    fd: u32,
    buffer_addr: u32,
    len: u32,
    flags: u32,
    sockaddr_addr: u32,
    sockaddr_len: u32,
) -> SysResult {
    trace!(
        "sendto({}, {:#x}, {}, {}, {:#x}, {})",
        fd, buffer_addr, len, flags, sockaddr_addr, sockaddr_len
    );
    let sock = sock_getfd(task, fd)?;
    let buffer = task.cpu.mem.read_vec(buffer_addr, len)?;
    let real_flags = abi::flags_to_real(flags).ok_or(Errno::EINVAL)?;
    let dest = if sockaddr_addr != 0 {
        Some(marshal::sockaddr_read(&task.cpu.mem, sockaddr_addr, sockaddr_len)?)
    } else {
        None
    };

    let (dest_ptr, dest_len) = match &dest {
        Some(d) => (d.as_ptr() as *const libc::sockaddr, d.len() as libc::socklen_t),
        None => (std::ptr::null(), 0),
    };
    let res = unsafe {
        libc::sendto(
            sock.real_fd,
            buffer.as_ptr() as *const libc::c_void,
            buffer.len(),
            real_flags,
            dest_ptr,
            dest_len,
        )
    };
    if res < 0 {
        return Err(errno_map());
    }
    Ok(res as u32)
}

pub fn sys_recvfrom(
    task: &mut Task,
    fd: u32,
    buffer_addr: u32,
    len: u32,
    flags: u32,
    sockaddr_addr: u32,
    len_addr: u32,
) -> SysResult {
    trace!(
        "recvfrom({}, {:#x}, {}, {}, {:#x}, {:#x})",
        fd, buffer_addr, len, flags, sockaddr_addr, len_addr
    );
    let sock = sock_getfd(task, fd)?;
    let real_flags = abi::flags_to_real(flags).ok_or(Errno::EINVAL)?;
    let addrlen = if len_addr != 0 {
        task.cpu.mem.read_u32(len_addr)?
    } else {
        0
    };
    if !task.cpu.mem.is_mapped(buffer_addr, len) {
        return Err(Errno::EFAULT);
    }

    let mut buffer = vec![0u8; len as usize];
    let mut sockaddr = vec![0u8; addrlen.min(marshal::SOCKADDR_MAX) as usize];
    let mut socklen = sockaddr.len() as libc::socklen_t;
    let res = unsafe {
        libc::recvfrom(
            sock.real_fd,
            buffer.as_mut_ptr() as *mut libc::c_void,
            buffer.len(),
            real_flags,
            if sockaddr_addr != 0 {
                sockaddr.as_mut_ptr() as *mut libc::sockaddr
            } else {
                std::ptr::null_mut()
            },
            if len_addr != 0 {
                &mut socklen
            } else {
                std::ptr::null_mut()
            },
        )
    };
    if res < 0 {
        return Err(errno_map());
    }

    task.cpu.mem.write_bytes(buffer_addr, &buffer[..res as usize])?;
    if sockaddr_addr != 0 {
        let wlen = (socklen as usize).min(sockaddr.len());
        marshal::sockaddr_write(&mut task.cpu.mem, sockaddr_addr, &mut sockaddr[..wlen])?;
    }
    if len_addr != 0 {
        task.cpu.mem.write_u32(len_addr, socklen as u32)?;
    }
    Ok(res as u32)
}

pub fn sys_shutdown(task: &mut Task, fd: u32, how: u32) -> SysResult {
    trace!("shutdown({}, {})", fd, how);
    let sock = sock_getfd(task, fd)?;
    if unsafe { libc::shutdown(sock.real_fd, how as libc::c_int) } < 0 {
        return Err(errno_map());
    }
    Ok(0)
}

pub fn sys_setsockopt(
    task: &mut Task,
    fd: u32,
    level: u32,
    option: u32,
    value_addr: u32,
    value_len: u32,
) -> SysResult {
    trace!(
        "setsockopt({}, {}, {}, {:#x}, {})",
        fd, level, option, value_addr, value_len
    );
    let sock = sock_getfd(task, fd)?;
    let value = task.cpu.mem.read_vec(value_addr, value_len)?;

    // ICMP6_FILTER can only be set on a real raw socket, and ours got
    // promoted off raw
    if level == abi::IPPROTO_ICMPV6 && option == abi::ICMP6_FILTER {
        return Ok(0);
    }
    // no host equivalent off Linux
    #[cfg(not(target_os = "linux"))]
    if level == abi::IPPROTO_IP && option == abi::IP_MTU_DISCOVER {
        return Ok(0);
    }

    let real_opt = abi::opt_to_real(level, option).ok_or(Errno::EINVAL)?;
    let real_level = abi::level_to_real(level).ok_or(Errno::EINVAL)?;

    let rc = unsafe {
        libc::setsockopt(
            sock.real_fd,
            real_level,
            real_opt,
            value.as_ptr() as *const libc::c_void,
            value.len() as libc::socklen_t,
        )
    };
    if rc < 0 {
        return Err(errno_map());
    }
    Ok(0)
}

pub fn sys_getsockopt(
    task: &mut Task,
    fd: u32,
    level: u32,
    option: u32,
    value_addr: u32,
    len_addr: u32,
) -> SysResult {
    trace!(
        "getsockopt({}, {}, {}, {:#x}, {:#x})",
        fd, level, option, value_addr, len_addr
    );
    let sock = sock_getfd(task, fd)?;
    let value_len = task.cpu.mem.read_u32(len_addr)?;
    let mut value = task.cpu.mem.read_vec(value_addr, value_len)?;
    let real_opt = abi::opt_to_real(level, option).ok_or(Errno::EINVAL)?;
    let real_level = abi::level_to_real(level).ok_or(Errno::EINVAL)?;

    let mut socklen = value.len() as libc::socklen_t;
    let rc = unsafe {
        libc::getsockopt(
            sock.real_fd,
            real_level,
            real_opt,
            value.as_mut_ptr() as *mut libc::c_void,
            &mut socklen,
        )
    };
    if rc < 0 {
        return Err(errno_map());
    }

    if level == abi::SOL_SOCKET && option == abi::SO_TYPE && value.len() >= 4 {
        // the host reports its own type numbering; hand back the guest's
        let host_type = libc::c_int::from_ne_bytes([value[0], value[1], value[2], value[3]]);
        if let Some(guest_type) = abi::type_from_real(host_type) {
            value[0..4].copy_from_slice(&guest_type.to_le_bytes());
        }
    }

    task.cpu.mem.write_u32(len_addr, socklen as u32)?;
    let wlen = (socklen as usize).min(value.len());
    task.cpu.mem.write_bytes(value_addr, &value[..wlen])?;
    Ok(0)
}

pub fn sys_sendmsg(task: &mut Task, fd: u32, msghdr_addr: u32, flags: u32) -> SysResult {
    trace!("sendmsg({}, {:#x}, {})", fd, msghdr_addr, flags);
    let sock = sock_getfd(task, fd)?;
    let hdr = marshal::GuestMsghdr::read(&task.cpu.mem, msghdr_addr)?;

    let name = if hdr.name != 0 {
        Some(marshal::sockaddr_read(&task.cpu.mem, hdr.name, hdr.namelen)?)
    } else {
        None
    };

    let iovs = marshal::read_iovecs(&task.cpu.mem, hdr.iov, hdr.iovlen)?;
    let mut iov_bufs = Vec::with_capacity(iovs.len());
    for iov in &iovs {
        iov_bufs.push(task.cpu.mem.read_vec(iov.base, iov.len)?);
    }

    let control = if hdr.control != 0 {
        Some(task.cpu.mem.read_vec(hdr.control, hdr.controllen)?)
    } else {
        None
    };

    let msg_flags = abi::flags_to_real(hdr.flags).ok_or(Errno::EINVAL)?;
    let real_flags = abi::flags_to_real(flags).ok_or(Errno::EINVAL)?;

    let mut host_iovs: Vec<libc::iovec> = iov_bufs
        .iter()
        .map(|buf| libc::iovec {
            iov_base: buf.as_ptr() as *mut libc::c_void,
            iov_len: buf.len(),
        })
        .collect();

    let mut msg: libc::msghdr = unsafe { std::mem::zeroed() };
    if let Some(ref name) = name {
        msg.msg_name = name.as_ptr() as *mut libc::c_void;
        msg.msg_namelen = name.len() as libc::socklen_t;
    }
    msg.msg_iov = host_iovs.as_mut_ptr();
    msg.msg_iovlen = host_iovs.len() as _;
    if let Some(ref control) = control {
        msg.msg_control = control.as_ptr() as *mut libc::c_void;
        msg.msg_controllen = control.len() as _;
    }
    msg.msg_flags = msg_flags;

    let res = unsafe { libc::sendmsg(sock.real_fd, &msg, real_flags) };
    if res < 0 {
        return Err(errno_map());
    }
    Ok(res as u32)
}

pub fn sys_recvmsg(task: &mut Task, fd: u32, msghdr_addr: u32, flags: u32) -> SysResult {
    trace!("recvmsg({}, {:#x}, {})", fd, msghdr_addr, flags);
    let sock = sock_getfd(task, fd)?;
    let mut hdr = marshal::GuestMsghdr::read(&task.cpu.mem, msghdr_addr)?;
    let real_flags = abi::flags_to_real(flags).ok_or(Errno::EINVAL)?;

    let iovs = marshal::read_iovecs(&task.cpu.mem, hdr.iov, hdr.iovlen)?;
    for iov in &iovs {
        if !task.cpu.mem.is_mapped(iov.base, iov.len) {
            return Err(Errno::EFAULT);
        }
    }
    if hdr.name != 0 && !task.cpu.mem.is_mapped(hdr.name, hdr.namelen) {
        return Err(Errno::EFAULT);
    }
    if hdr.control != 0 && !task.cpu.mem.is_mapped(hdr.control, hdr.controllen) {
        return Err(Errno::EFAULT);
    }
    let mut iov_bufs: Vec<Vec<u8>> = iovs.iter().map(|iov| vec![0u8; iov.len as usize]).collect();
    let mut name = vec![0u8; hdr.namelen as usize];
    let mut control = vec![0u8; hdr.controllen as usize];

    let mut host_iovs: Vec<libc::iovec> = iov_bufs
        .iter_mut()
        .map(|buf| libc::iovec {
            iov_base: buf.as_mut_ptr() as *mut libc::c_void,
            iov_len: buf.len(),
        })
        .collect();

    let mut msg: libc::msghdr = unsafe { std::mem::zeroed() };
    if hdr.name != 0 {
        msg.msg_name = name.as_mut_ptr() as *mut libc::c_void;
        msg.msg_namelen = name.len() as libc::socklen_t;
    }
    msg.msg_iov = host_iovs.as_mut_ptr();
    msg.msg_iovlen = host_iovs.len() as _;
    if hdr.control != 0 {
        msg.msg_control = control.as_mut_ptr() as *mut libc::c_void;
        msg.msg_controllen = control.len() as _;
    }

    let res = unsafe { libc::recvmsg(sock.real_fd, &mut msg, real_flags) };
    if res < 0 {
        // all scratch is owned by Vecs and released right here
        return Err(errno_map());
    }

    // distribute the payload across the guest iovecs in order
    let mut remaining = res as usize;
    for (iov, buf) in iovs.iter().zip(&iov_bufs) {
        let chunk = buf.len().min(remaining);
        if chunk > 0 {
            task.cpu.mem.write_bytes(iov.base, &buf[..chunk])?;
        }
        remaining -= chunk;
    }

    if hdr.name != 0 && msg.msg_namelen > 0 {
        let wlen = (msg.msg_namelen as usize).min(name.len());
        marshal::sockaddr_write(&mut task.cpu.mem, hdr.name, &mut name[..wlen])?;
    }
    hdr.namelen = msg.msg_namelen as u32;

    if hdr.control != 0 {
        let clen = (msg.msg_controllen as usize).min(control.len());
        task.cpu.mem.write_bytes(hdr.control, &control[..clen])?;
    }
    // TODO: translate host cmsghdr records into the guest's 32-bit layout
    hdr.controllen = msg.msg_controllen as u32;

    hdr.flags = abi::flags_from_real(msg.msg_flags);
    hdr.write(&mut task.cpu.mem, msghdr_addr)?;
    Ok(res as u32)
}

/// One `socketcall` table entry: the handler plus how many 32-bit words
/// to pull from the guest argument block.
pub struct SocketCall {
    func: fn(&mut Task, &[u32; 6]) -> SysResult,
    args: u8,
}

static SOCKET_CALLS: [Option<SocketCall>; 21] = [
    None,
    Some(SocketCall { func: |t, a| sys_socket(t, a[0], a[1], a[2]), args: 3 }),
    Some(SocketCall { func: |t, a| sys_bind(t, a[0], a[1], a[2]), args: 3 }),
    Some(SocketCall { func: |t, a| sys_connect(t, a[0], a[1], a[2]), args: 3 }),
    Some(SocketCall { func: |t, a| sys_listen(t, a[0], a[1]), args: 2 }),
    Some(SocketCall { func: |t, a| sys_accept(t, a[0], a[1], a[2]), args: 3 }),
    Some(SocketCall { func: |t, a| sys_getsockname(t, a[0], a[1], a[2]), args: 3 }),
    Some(SocketCall { func: |t, a| sys_getpeername(t, a[0], a[1], a[2]), args: 3 }),
    Some(SocketCall { func: |t, a| sys_socketpair(t, a[0], a[1], a[2], a[3]), args: 4 }),
    None, // send
    None, // recv
    Some(SocketCall { func: |t, a| sys_sendto(t, a[0], a[1], a[2], a[3], a[4], a[5]), args: 6 }),
    Some(SocketCall { func: |t, a| sys_recvfrom(t, a[0], a[1], a[2], a[3], a[4], a[5]), args: 6 }),
    Some(SocketCall { func: |t, a| sys_shutdown(t, a[0], a[1]), args: 2 }),
    Some(SocketCall { func: |t, a| sys_setsockopt(t, a[0], a[1], a[2], a[3], a[4]), args: 5 }),
    Some(SocketCall { func: |t, a| sys_getsockopt(t, a[0], a[1], a[2], a[3], a[4]), args: 5 }),
    Some(SocketCall { func: |t, a| sys_sendmsg(t, a[0], a[1], a[2]), args: 3 }),
    Some(SocketCall { func: |t, a| sys_recvmsg(t, a[0], a[1], a[2]), args: 3 }),
    None, // accept4
    None, // recvmmsg
    None, // sendmmsg
];

/// The legacy i386 `socketcall` multiplexer: `call_num` picks the
/// subfunction, `args_addr` points at its 32-bit argument words.
pub fn sys_socketcall(task: &mut Task, call_num: u32, args_addr: u32) -> SysResult {
    trace!("socketcall({}, {:#x})", call_num, args_addr);
    if call_num < 1 || call_num as usize >= SOCKET_CALLS.len() {
        return Err(Errno::EINVAL);
    }
    let call = match &SOCKET_CALLS[call_num as usize] {
        Some(call) => call,
        None => {
            warn!("unsupported socketcall {}", call_num);
            return Err(Errno::ENOSYS);
        }
    };

    let mut args = [0u32; 6];
    for (i, arg) in args.iter_mut().take(call.args as usize).enumerate() {
        *arg = task.cpu.mem.read_u32(args_addr.wrapping_add(4 * i as u32))?;
    }
    (call.func)(task, &args)
}
