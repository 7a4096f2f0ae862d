//! emu86 — run a flat 32-bit x86 image as a Linux-ish guest
//!
//! Loads a raw binary at guest address 0, gives it a stack, and runs it
//! until it exits, faults, or hits an opcode the core does not know.

use std::env;
use std::fs;
use std::process;

use log::LevelFilter;

use emu86::cpu::{ExitReason, ESP};
use emu86::memory::{GuestMem, PAGE_SIZE};
use emu86::{logging, Task};

const STACK_TOP: u32 = 0x0100_0000;
const STACK_PAGES: u32 = 16;

fn usage() -> ! {
    eprintln!("usage: emu86 [--trace|--debug] IMAGE");
    process::exit(2);
}

fn main() {
    let mut level = LevelFilter::Warn;
    let mut image_path = None;
    for arg in env::args().skip(1) {
        match arg.as_str() {
            "--trace" => level = LevelFilter::Trace,
            "--debug" => level = LevelFilter::Debug,
            _ if image_path.is_none() => image_path = Some(arg),
            _ => usage(),
        }
    }
    let image_path = match image_path {
        Some(path) => path,
        None => usage(),
    };
    logging::init(level);

    let image = match fs::read(&image_path) {
        Ok(image) => image,
        Err(err) => {
            eprintln!("emu86: {}: {}", image_path, err);
            process::exit(2);
        }
    };

    let mut mem = GuestMem::new();
    mem.map(0, image.len() as u32);
    if mem.write_bytes(0, &image).is_err() {
        eprintln!("emu86: image does not fit in guest memory");
        process::exit(2);
    }
    mem.map(STACK_TOP - STACK_PAGES * PAGE_SIZE, STACK_PAGES * PAGE_SIZE);

    let mut task = Task::new(mem);
    task.cpu.set_reg32(ESP, STACK_TOP);

    match task.run() {
        ExitReason::Exited(status) => process::exit(status & 0xFF),
        ExitReason::IllegalInstruction { eip } => {
            eprintln!("emu86: illegal instruction at {:#010x}", eip);
            process::exit(132);
        }
        ExitReason::Fault { vector, eip } => {
            eprintln!("emu86: unhandled interrupt {:#04x} at {:#010x}", vector, eip);
            process::exit(139);
        }
    }
}
