//! Fetch-decode-execute at both operand widths
//!
//! The interpreter body is written once and instantiated twice through
//! [`define_step!`], at 32-bit and 16-bit operand width. The two
//! instantiations are mutually recursive: the operand-size prefix (0x66)
//! tail-calls the sibling for exactly one instruction. Address size and
//! ModR/M decoding stay 32-bit in both.

use crate::cpu::modrm::{self, Operand};
use crate::cpu::{Cpu, Step, Width, EAX, ESP, INT_GPF};
use crate::memory::MemFault;

macro_rules! define_step {
    ($width:literal, $other:literal, $word:ty) => {
        paste::paste! {
            #[doc = concat!(
                "Execute exactly one instruction at ", stringify!($width),
                "-bit operand width, advancing `eip` past the opcode, any \
                 ModR/M bytes, and any immediate."
            )]
            ///
            /// A guest memory fault during fetch or execute surfaces as
            /// `Step::Interrupt(INT_GPF)`.
            pub fn [<step $width>](cpu: &mut Cpu) -> Step {
                match [<exec $width>](cpu) {
                    Ok(step) => step,
                    Err(MemFault { addr }) => {
                        log::warn!("guest fault at {:#x}, eip={:#x}", addr, cpu.eip);
                        Step::Interrupt(INT_GPF)
                    }
                }
            }

            fn [<exec $width>](cpu: &mut Cpu) -> Result<Step, MemFault> {
                let opcode = cpu.fetch8()?;
                log::trace!("{:#04x}", opcode);
                match opcode {
                    // push register
                    0x50..=0x57 => {
                        let val: $word = <$word>::reg(cpu, opcode & 7);
                        // val is read before the decrement, so `push esp`
                        // stores the old stack pointer.
                        let sp = cpu.reg32(ESP).wrapping_sub(<$word>::BITS / 8);
                        val.store(&mut cpu.mem, sp)?;
                        cpu.set_reg32(ESP, sp);
                    }

                    // operand-size prefix: the next instruction runs at
                    // the other width
                    0x66 => return Ok([<step $other>](cpu)),

                    // sub r/m, imm8 (sign-extended); the /digit extension
                    // is not dispatched, sub is the only implemented form
                    0x83 => {
                        let m = modrm::decode(cpu)?;
                        let imm8 = cpu.fetch8()?;
                        let val: $word = cpu.operand_read(m.rm)?;
                        cpu.operand_write(m.rm, val.wrapping_sub(<$word>::sext8(imm8)))?;
                    }

                    // mov r/m8, r8
                    0x88 => {
                        let m = modrm::decode(cpu)?;
                        let val = cpu.reg8(m.reg);
                        cpu.operand_write8(m.rm, val)?;
                    }

                    // mov r/m, r
                    0x89 => {
                        let m = modrm::decode(cpu)?;
                        let val: $word = <$word>::reg(cpu, m.reg);
                        cpu.operand_write(m.rm, val)?;
                    }

                    // mov r8, r/m8
                    0x8A => {
                        let m = modrm::decode(cpu)?;
                        let val = cpu.operand_read8(m.rm)?;
                        cpu.set_reg8(m.reg, val);
                    }

                    // mov r, r/m
                    0x8B => {
                        let m = modrm::decode(cpu)?;
                        let val: $word = cpu.operand_read(m.rm)?;
                        <$word>::set_reg(cpu, m.reg, val);
                    }

                    // lea r, m: store the computed address, not the
                    // contents; a register operand is not encodable
                    0x8D => {
                        let m = modrm::decode(cpu)?;
                        match m.rm {
                            Operand::Mem(addr) => {
                                <$word>::set_reg(cpu, m.reg, <$word>::trunc(addr))
                            }
                            Operand::Reg(_) => return Ok(Step::Undefined),
                        }
                    }

                    // mov eax, [imm32]; the address is always 32-bit
                    0xA1 => {
                        let addr = cpu.fetch::<u32>()?;
                        let val: $word = <$word>::load(&cpu.mem, addr)?;
                        <$word>::set_reg(cpu, EAX, val);
                    }

                    // mov r, imm
                    0xB8..=0xBF => {
                        let imm: $word = cpu.fetch()?;
                        <$word>::set_reg(cpu, opcode & 7, imm);
                    }

                    // mov r/m8, imm8
                    0xC6 => {
                        let m = modrm::decode(cpu)?;
                        let imm = cpu.fetch8()?;
                        cpu.operand_write8(m.rm, imm)?;
                    }

                    // mov r/m, imm
                    0xC7 => {
                        let m = modrm::decode(cpu)?;
                        let imm: $word = cpu.fetch()?;
                        cpu.operand_write(m.rm, imm)?;
                    }

                    // int imm8
                    0xCD => {
                        let vector = cpu.fetch8()?;
                        return Ok(Step::Interrupt(vector));
                    }

                    _ => {
                        log::debug!(
                            "undefined opcode {:#04x} at eip {:#x}",
                            opcode,
                            cpu.eip.wrapping_sub(1)
                        );
                        return Ok(Step::Undefined);
                    }
                }
                cpu.trace_state();
                Ok(Step::None)
            }
        }
    };
}

define_step!(32, 16, u32);
define_step!(16, 32, u16);
