use crate::{EmulatorState, ExecError, ExecRet};

use common::asm::{AddrMode, Arg, Reg};

use std::fmt;

use log::{debug, info, trace};

// Where an operand's value lives, once any registers, SP adjustment, and
// extra words have been applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    Reg(Reg),
    Mem(u16),
    // PUSH, POP and PEEK; behaves like Mem.
    Stack(u16),
    Sp,
    Pc,
    Ex,
    Lit(u16),
}

// A decoded operand. Lives only as long as the instruction it belongs to.
#[derive(Debug, Clone, Copy)]
pub struct Operand {
    pub loc: Location,
    pub arg: Arg,
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(&self.arg, f)
    }
}

impl EmulatorState {
    // Resolving is side-effecting (extra word fetches, SP adjustment), so "a"
    // has to be resolved before "b", matching the order of the extra words.
    pub fn decode_operand(&mut self, code: u16, is_a: bool) -> Result<Operand, ExecError> {
        let Some(mode) = AddrMode::decode(code, is_a) else {
            return Err(ExecError::InvalidOperand { code, is_a });
        };
        let extra = mode.needs_extra().then(|| self.fetch_word());
        let next = extra.unwrap_or(0);

        let loc = match mode {
            AddrMode::Reg(r) => Location::Reg(r),
            AddrMode::RegDef(r) => Location::Mem(self.reg(r)),
            AddrMode::RegIndex(r) => Location::Mem(self.reg(r).wrapping_add(next)),
            AddrMode::PushPop if is_a => {
                // POP
                let addr = self.sp();
                self.set_sp(addr.wrapping_add(1));
                Location::Stack(addr)
            }
            AddrMode::PushPop => {
                // PUSH
                let addr = self.sp().wrapping_sub(1);
                self.set_sp(addr);
                Location::Stack(addr)
            }
            AddrMode::Peek => Location::Stack(self.sp()),
            AddrMode::Pick => Location::Mem(self.sp().wrapping_add(next)),
            AddrMode::Sp => Location::Sp,
            AddrMode::Pc => Location::Pc,
            AddrMode::Ex => Location::Ex,
            AddrMode::Abs => Location::Mem(next),
            AddrMode::NextLit => Location::Lit(next),
            AddrMode::InlineLit(val) => Location::Lit(val),
        };

        let op = Operand{loc, arg: Arg::new(mode, is_a, extra)};
        trace!("Operand {code:#04x} ({}) resolved to {:?}", op, op.loc);
        Ok(op)
    }

    pub fn load(&self, op: &Operand) -> u16 {
        match op.loc {
            Location::Reg(r) => self.reg(r),
            Location::Mem(addr) | Location::Stack(addr) => self.mem_read(addr),
            Location::Sp => self.sp(),
            Location::Pc => self.pc(),
            Location::Ex => self.ex(),
            Location::Lit(val) => val,
        }
    }

    // Writing the address of the current instruction to PC can never make
    // progress, so it halts instead.
    pub fn store(&mut self, op: &Operand, val: u16) -> ExecRet {
        match op.loc {
            Location::Reg(r) => self.set_reg(r, val),
            Location::Mem(addr) | Location::Stack(addr) => self.mem_write(addr, val),
            Location::Sp => self.set_sp(val),
            Location::Pc => {
                if val == self.last_pc() {
                    info!("Crash loop detected at {val:#06x}; halting");
                    return ExecRet::Halt;
                }
                self.set_pc(val);
            }
            Location::Ex => self.set_ex(val),
            Location::Lit(_) => debug!("Ignoring assignment of {val:#06x} to literal {op}"),
        }
        ExecRet::Ok
    }
}
