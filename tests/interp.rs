//! End-to-end interpreter scenarios over the public API.

use emu86::cpu::{self, step32, Cpu, ExitReason, Step, EAX, ESP};
use emu86::memory::{GuestMem, PAGE_SIZE};
use emu86::Task;

fn cpu_with_code(code: &[u8]) -> Cpu {
    let mut mem = GuestMem::new();
    mem.map(0, 4 * PAGE_SIZE);
    mem.write_bytes(0, code).unwrap();
    Cpu::new(mem)
}

#[test]
fn immediate_move() {
    // B8 78 56 34 12 at eip=0
    let mut cpu = cpu_with_code(&[0xB8, 0x78, 0x56, 0x34, 0x12]);
    assert_eq!(step32(&mut cpu), Step::None);
    assert_eq!(cpu.reg32(EAX), 0x1234_5678);
    assert_eq!(cpu.eip, 5);
}

#[test]
fn sixteen_bit_override() {
    // 66 B8 CD AB at eip=0
    let mut cpu = cpu_with_code(&[0x66, 0xB8, 0xCD, 0xAB]);
    cpu.set_reg32(EAX, 0x1111_0000);
    assert_eq!(step32(&mut cpu), Step::None);
    assert_eq!(cpu.reg32(EAX), 0x1111_ABCD);
    assert_eq!(cpu.eip, 4);
}

#[test]
fn push_esp() {
    let mut cpu = cpu_with_code(&[0x54]);
    cpu.set_reg32(ESP, 0x1000);
    assert_eq!(step32(&mut cpu), Step::None);
    assert_eq!(cpu.reg32(ESP), 0x0FFC);
    assert_eq!(cpu.mem.read_u32(0x0FFC), Ok(0x1000));
}

#[test]
fn sign_extended_sub() {
    // 83 E8 FF = sub eax, -1
    let mut cpu = cpu_with_code(&[0x83, 0xE8, 0xFF]);
    cpu.set_reg32(EAX, 0x10);
    assert_eq!(step32(&mut cpu), Step::None);
    assert_eq!(cpu.reg32(EAX), 0x11);
}

#[test]
fn interrupt() {
    let mut cpu = cpu_with_code(&[0xCD, 0x80]);
    assert_eq!(step32(&mut cpu), Step::Interrupt(0x80));
    assert_eq!(cpu.eip, 2);
}

#[test]
fn socketcall_dispatch_from_guest_code() {
    // A guest program that creates a socket and exits with the fd:
    //   mov eax, 102        ; socketcall
    //   mov ebx, 1          ; SYS_SOCKET
    //   mov ecx, 0x800      ; args block
    //   int 0x80
    //   mov ebx, eax        ; 89 C3
    //   mov eax, 1          ; exit
    //   int 0x80
    let mut mem = GuestMem::new();
    mem.map(0, 4 * PAGE_SIZE);
    mem.write_bytes(
        0,
        &[
            0xB8, 0x66, 0x00, 0x00, 0x00, //
            0xBB, 0x01, 0x00, 0x00, 0x00, //
            0xB9, 0x00, 0x08, 0x00, 0x00, //
            0xCD, 0x80, //
            0x89, 0xC3, //
            0xB8, 0x01, 0x00, 0x00, 0x00, //
            0xCD, 0x80,
        ],
    )
    .unwrap();
    // args: {PF_INET, SOCK_STREAM, 0}
    mem.write_u32(0x800, 2).unwrap();
    mem.write_u32(0x804, 1).unwrap();
    mem.write_u32(0x808, 0).unwrap();

    let mut task = Task::new(mem);
    let status = match task.run() {
        ExitReason::Exited(status) => status,
        other => panic!("guest did not exit cleanly: {:?}", other),
    };
    // stdio occupies 0..2, so the socket lands at 3
    assert_eq!(status, 3);
    let desc = task.files.get(status).unwrap();
    assert!(desc.is_socket());
}

#[test]
fn fetch_width_invariant() {
    // Each (code, expected eip delta) pair: opcode + modrm/disp + imm.
    let cases: &[(&[u8], u32)] = &[
        (&[0x50], 1),                                     // push eax
        (&[0x83, 0xE8, 0x01], 3),                         // sub eax, 1
        (&[0x89, 0x48, 0x04], 3),                         // mov [eax+4], ecx
        (&[0x8B, 0x04, 0x8D, 0x00, 0x20, 0x00, 0x00], 7), // mov eax, [ecx*4+0x2000]
        (&[0xB9, 0xAA, 0xBB, 0xCC, 0xDD], 5),             // mov ecx, imm32
        (&[0xC7, 0x00, 0x01, 0x02, 0x03, 0x04], 6),       // mov [eax], imm32
        (&[0x66, 0xB8, 0x01, 0x02], 4),                   // mov ax, imm16
    ];
    for (code, want) in cases {
        let mut cpu = cpu_with_code(code);
        cpu.set_reg32(EAX, 0x3000);
        cpu.set_reg32(ESP, 0x3000);
        assert_eq!(step32(&mut cpu), Step::None, "code {:02x?}", code);
        assert_eq!(cpu.eip, *want, "code {:02x?}", code);
    }
}

#[test]
fn double_override_runs_at_original_width() {
    let mut cpu = cpu_with_code(&[0x66, 0x66, 0xB8, 0x78, 0x56, 0x34, 0x12]);
    assert_eq!(step32(&mut cpu), Step::None);
    assert_eq!(cpu.reg32(EAX), 0x1234_5678);
}

#[test]
fn lea_register_form_is_undefined() {
    let mut cpu = cpu_with_code(&[0x8D, 0xC1]);
    let regs_before = cpu.regs;
    assert_eq!(step32(&mut cpu), Step::Undefined);
    assert_eq!(cpu.regs, regs_before);
}

#[test]
fn sixteen_bit_step_is_symmetric() {
    // Entering via step16 with a 0x66 prefix lands back in 32-bit mode.
    let mut cpu = cpu_with_code(&[0x66, 0xB9, 0x44, 0x33, 0x22, 0x11]);
    assert_eq!(cpu::step16(&mut cpu), Step::None);
    assert_eq!(cpu.reg32(cpu::ECX), 0x1122_3344);
    assert_eq!(cpu.eip, 6);
}
