//! Guest syscall dispatch
//!
//! The run loop lands here for every `int 0x80`. The i386 convention:
//! `eax` carries the syscall number, arguments ride in
//! `ebx, ecx, edx, esi, edi, ebp`, and the result (or a negated guest
//! errno) is written back to `eax`.

use log::{trace, warn};

use crate::cpu::{EAX, EBP, EBX, ECX, EDX, EDI, ESI};
use crate::errno::{encode, Errno, SysResult};
use crate::sock;
use crate::Task;

// i386 syscall numbers.
pub const SYS_EXIT: u32 = 1;
pub const SYS_READ: u32 = 3;
pub const SYS_WRITE: u32 = 4;
pub const SYS_CLOSE: u32 = 6;
pub const SYS_SOCKETCALL: u32 = 102;

/// Dispatch the syscall currently encoded in the task's registers.
///
/// Returns `Some(status)` when the guest asked to exit; otherwise the
/// result is written to `eax` and execution continues.
pub fn dispatch(task: &mut Task) -> Option<i32> {
    let num = task.cpu.reg32(EAX);
    let args = [
        task.cpu.reg32(EBX),
        task.cpu.reg32(ECX),
        task.cpu.reg32(EDX),
        task.cpu.reg32(ESI),
        task.cpu.reg32(EDI),
        task.cpu.reg32(EBP),
    ];

    let result = match num {
        SYS_EXIT => {
            trace!("exit({})", args[0] as i32);
            return Some(args[0] as i32);
        }
        SYS_READ => sys_read(task, args[0], args[1], args[2]),
        SYS_WRITE => sys_write(task, args[0], args[1], args[2]),
        SYS_CLOSE => {
            trace!("close({})", args[0]);
            task.files.close(args[0] as i32).map(|_| 0)
        }
        SYS_SOCKETCALL => sock::sys_socketcall(task, args[0], args[1]),
        _ => {
            warn!("unimplemented syscall {}", num);
            Err(Errno::ENOSYS)
        }
    };

    task.cpu.set_reg32(EAX, encode(result));
    None
}

fn sys_read(task: &mut Task, fd: u32, buf_addr: u32, count: u32) -> SysResult {
    trace!("read({}, {:#x}, {})", fd, buf_addr, count);
    let desc = task.files.get(fd as i32).ok_or(Errno::EBADF)?;
    if !task.cpu.mem.is_mapped(buf_addr, count) {
        return Err(Errno::EFAULT);
    }
    let mut buf = vec![0u8; count as usize];
    let n = desc.ops.read(&desc, &mut buf)?;
    task.cpu.mem.write_bytes(buf_addr, &buf[..n])?;
    Ok(n as u32)
}

fn sys_write(task: &mut Task, fd: u32, buf_addr: u32, count: u32) -> SysResult {
    trace!("write({}, {:#x}, {})", fd, buf_addr, count);
    let desc = task.files.get(fd as i32).ok_or(Errno::EBADF)?;
    let buf = task.cpu.mem.read_vec(buf_addr, count)?;
    let n = desc.ops.write(&desc, &buf)?;
    Ok(n as u32)
}
