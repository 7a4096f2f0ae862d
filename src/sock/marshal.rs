//! Guest structure marshalling
//!
//! Copies guest-format `sockaddr` and `msghdr` structures in and out of
//! guest memory. A sockaddr is handled as a raw byte buffer with the
//! 16-bit family field translated in place; everything after the family
//! is address data the host understands as-is.

use crate::errno::Errno;
use crate::memory::{GuestMem, MemFault};
use crate::sock::abi;

/// Size of the guest `msghdr` (seven 32-bit fields).
pub const MSGHDR_SIZE: u32 = 28;

/// Largest accepted iovec count, as on Linux.
pub const UIO_MAXIOV: u32 = 1024;

/// Largest host sockaddr that can come back from the host
/// (`sockaddr_storage`); receive buffers are sized to at most this, no
/// matter what length the guest claims.
pub const SOCKADDR_MAX: u32 = 128;

/// Read a guest sockaddr and rewrite its family field into host form.
///
/// `AF_LOCAL` is rejected with `ENOENT` (path translation is deliberately
/// unimplemented); families other than `AF_INET`/`AF_INET6`/`AF_LOCAL`
/// are `EINVAL`.
pub fn sockaddr_read(mem: &GuestMem, addr: u32, len: u32) -> Result<Vec<u8>, Errno> {
    let mut buf = mem.read_vec(addr, len)?;
    if buf.len() < 2 {
        return Err(Errno::EINVAL);
    }
    let family = u16::from_le_bytes([buf[0], buf[1]]);
    match family {
        abi::PF_INET | abi::PF_INET6 => {}
        abi::PF_LOCAL => return Err(Errno::ENOENT),
        _ => return Err(Errno::EINVAL),
    }
    let real = abi::family_to_real(family).ok_or(Errno::EINVAL)?;
    set_host_family(&mut buf, real);
    Ok(buf)
}

/// Rewrite a host sockaddr's family into guest form and copy it out to
/// guest memory. Family filtering matches [`sockaddr_read`].
pub fn sockaddr_write(mem: &mut GuestMem, addr: u32, buf: &mut [u8]) -> Result<(), Errno> {
    if buf.len() < 2 {
        return Err(Errno::EINVAL);
    }
    let family = abi::family_from_real(host_family(buf)).ok_or(Errno::EINVAL)?;
    match family {
        abi::PF_INET | abi::PF_INET6 => {}
        abi::PF_LOCAL => return Err(Errno::ENOENT),
        _ => return Err(Errno::EINVAL),
    }
    buf[0..2].copy_from_slice(&family.to_le_bytes());
    mem.write_bytes(addr, buf)?;
    Ok(())
}

// BSD-derived hosts put a length byte before a one-byte family; Linux
// has a two-byte family at offset zero.
#[cfg(any(
    target_os = "macos",
    target_os = "ios",
    target_os = "freebsd",
    target_os = "openbsd",
    target_os = "netbsd"
))]
fn set_host_family(buf: &mut [u8], family: libc::c_int) {
    buf[0] = buf.len() as u8;
    buf[1] = family as u8;
}

#[cfg(any(
    target_os = "macos",
    target_os = "ios",
    target_os = "freebsd",
    target_os = "openbsd",
    target_os = "netbsd"
))]
fn host_family(buf: &[u8]) -> libc::c_int {
    buf[1] as libc::c_int
}

#[cfg(not(any(
    target_os = "macos",
    target_os = "ios",
    target_os = "freebsd",
    target_os = "openbsd",
    target_os = "netbsd"
)))]
fn set_host_family(buf: &mut [u8], family: libc::c_int) {
    buf[0..2].copy_from_slice(&(family as u16).to_ne_bytes());
}

#[cfg(not(any(
    target_os = "macos",
    target_os = "ios",
    target_os = "freebsd",
    target_os = "openbsd",
    target_os = "netbsd"
)))]
fn host_family(buf: &[u8]) -> libc::c_int {
    u16::from_ne_bytes([buf[0], buf[1]]) as libc::c_int
}

/// The guest `msghdr`: all pointer fields are guest addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GuestMsghdr {
    pub name: u32,
    pub namelen: u32,
    pub iov: u32,
    pub iovlen: u32,
    pub control: u32,
    pub controllen: u32,
    pub flags: u32,
}

impl GuestMsghdr {
    /// Read the structure from guest memory.
    pub fn read(mem: &GuestMem, addr: u32) -> Result<Self, MemFault> {
        Ok(GuestMsghdr {
            name: mem.read_u32(addr)?,
            namelen: mem.read_u32(addr.wrapping_add(4))?,
            iov: mem.read_u32(addr.wrapping_add(8))?,
            iovlen: mem.read_u32(addr.wrapping_add(12))?,
            control: mem.read_u32(addr.wrapping_add(16))?,
            controllen: mem.read_u32(addr.wrapping_add(20))?,
            flags: mem.read_u32(addr.wrapping_add(24))?,
        })
    }

    /// Write the structure back to guest memory (recvmsg updates the
    /// length and flag fields in place).
    pub fn write(&self, mem: &mut GuestMem, addr: u32) -> Result<(), MemFault> {
        mem.write_u32(addr, self.name)?;
        mem.write_u32(addr.wrapping_add(4), self.namelen)?;
        mem.write_u32(addr.wrapping_add(8), self.iov)?;
        mem.write_u32(addr.wrapping_add(12), self.iovlen)?;
        mem.write_u32(addr.wrapping_add(16), self.control)?;
        mem.write_u32(addr.wrapping_add(20), self.controllen)?;
        mem.write_u32(addr.wrapping_add(24), self.flags)?;
        Ok(())
    }
}

/// One guest iovec entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GuestIovec {
    pub base: u32,
    pub len: u32,
}

/// Read an iovec array from guest memory, rejecting oversized arrays and
/// totals that overflow the 32-bit byte counter.
pub fn read_iovecs(mem: &GuestMem, addr: u32, count: u32) -> Result<Vec<GuestIovec>, Errno> {
    if count > UIO_MAXIOV {
        return Err(Errno::EMSGSIZE);
    }
    let mut iovs = Vec::with_capacity(count as usize);
    let mut total: u64 = 0;
    for i in 0..count {
        let entry = addr.wrapping_add(i * 8);
        let iov = GuestIovec {
            base: mem.read_u32(entry)?,
            len: mem.read_u32(entry.wrapping_add(4))?,
        };
        total += iov.len as u64;
        if total > u32::MAX as u64 {
            return Err(Errno::EINVAL);
        }
        iovs.push(iov);
    }
    Ok(iovs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::PAGE_SIZE;

    fn mem() -> GuestMem {
        let mut mem = GuestMem::new();
        mem.map(0, 4 * PAGE_SIZE);
        mem
    }

    fn inet_sockaddr(port: u16, ip: [u8; 4]) -> [u8; 16] {
        let mut buf = [0u8; 16];
        buf[0..2].copy_from_slice(&abi::PF_INET.to_le_bytes());
        buf[2..4].copy_from_slice(&port.to_be_bytes());
        buf[4..8].copy_from_slice(&ip);
        buf
    }

    #[test]
    fn test_sockaddr_read_translates_family() {
        let mut m = mem();
        m.write_bytes(0x100, &inet_sockaddr(8080, [127, 0, 0, 1])).unwrap();
        let buf = sockaddr_read(&m, 0x100, 16).unwrap();
        assert_eq!(host_family(&buf), libc::AF_INET);
        // Port and address bytes are untouched.
        assert_eq!(&buf[2..8], &[0x1F, 0x90, 127, 0, 0, 1]);
    }

    #[test]
    fn test_sockaddr_family_filter() {
        let mut m = mem();
        let mut local = [0u8; 16];
        local[0..2].copy_from_slice(&abi::PF_LOCAL.to_le_bytes());
        m.write_bytes(0x100, &local).unwrap();
        assert_eq!(sockaddr_read(&m, 0x100, 16), Err(Errno::ENOENT));

        let mut bogus = [0u8; 16];
        bogus[0] = 99;
        m.write_bytes(0x100, &bogus).unwrap();
        assert_eq!(sockaddr_read(&m, 0x100, 16), Err(Errno::EINVAL));
    }

    #[test]
    fn test_sockaddr_round_trip() {
        let mut m = mem();
        let original = inet_sockaddr(443, [10, 1, 2, 3]);
        m.write_bytes(0x100, &original).unwrap();
        let mut host = sockaddr_read(&m, 0x100, 16).unwrap();
        sockaddr_write(&mut m, 0x200, &mut host).unwrap();
        let mut back = [0u8; 16];
        m.read_bytes(0x200, &mut back).unwrap();
        // Byte-identical modulo the family round trip.
        assert_eq!(back[2..], original[2..]);
        assert_eq!(u16::from_le_bytes([back[0], back[1]]), abi::PF_INET);
    }

    #[test]
    fn test_sockaddr_read_faults_on_unmapped() {
        let m = GuestMem::new();
        assert_eq!(sockaddr_read(&m, 0x100, 16), Err(Errno::EFAULT));
    }

    #[test]
    fn test_msghdr_round_trip() {
        let mut m = mem();
        let hdr = GuestMsghdr {
            name: 0x1000,
            namelen: 16,
            iov: 0x2000,
            iovlen: 2,
            control: 0,
            controllen: 0,
            flags: abi::MsgFlags::PEEK.bits(),
        };
        hdr.write(&mut m, 0x500).unwrap();
        assert_eq!(GuestMsghdr::read(&m, 0x500), Ok(hdr));
    }

    #[test]
    fn test_iovec_array_read() {
        let mut m = mem();
        for (i, (base, len)) in [(0x1000u32, 4u32), (0x1100, 8)].iter().enumerate() {
            let at = 0x600 + (i as u32) * 8;
            m.write_u32(at, *base).unwrap();
            m.write_u32(at + 4, *len).unwrap();
        }
        let iovs = read_iovecs(&m, 0x600, 2).unwrap();
        assert_eq!(iovs.len(), 2);
        assert_eq!(iovs[1], GuestIovec { base: 0x1100, len: 8 });
    }

    #[test]
    fn test_iovec_total_overflow_rejected() {
        let mut m = mem();
        for i in 0..2u32 {
            let at = 0x600 + i * 8;
            m.write_u32(at, 0x1000).unwrap();
            m.write_u32(at + 4, u32::MAX).unwrap();
        }
        assert_eq!(read_iovecs(&m, 0x600, 2), Err(Errno::EINVAL));
        assert_eq!(
            read_iovecs(&m, 0x600, UIO_MAXIOV + 1),
            Err(Errno::EMSGSIZE)
        );
    }
}
