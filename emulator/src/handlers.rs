use crate::{Emulator, ExecError, ExecRet, Operand};

use common::asm::{BasicOpcode, Reg, SpecialOpcode};

use log::{debug, warn};

pub(crate) type BasicHandler = fn(&mut Emulator, &Operand, &Operand) -> Result<ExecRet, ExecError>;
pub(crate) type SpecialHandler = fn(&mut Emulator, &Operand) -> Result<ExecRet, ExecError>;

// Indexed by the 5-bit opcode field. None is unmapped and fatal if dispatched.
pub(crate) const BASIC_HANDLERS: [Option<BasicHandler>; 32] = {
    let mut t: [Option<BasicHandler>; 32] = [None; 32];
    t[BasicOpcode::Set as usize] = Some(set);
    t[BasicOpcode::Add as usize] = Some(add);
    t[BasicOpcode::Sub as usize] = Some(sub);
    t[BasicOpcode::Mul as usize] = Some(mul);
    t[BasicOpcode::Mli as usize] = Some(mli);
    t[BasicOpcode::Div as usize] = Some(div);
    t[BasicOpcode::Dvi as usize] = Some(dvi);
    t[BasicOpcode::Mod as usize] = Some(mod_);
    t[BasicOpcode::Mdi as usize] = Some(mdi);
    t[BasicOpcode::And as usize] = Some(and);
    t[BasicOpcode::Bor as usize] = Some(bor);
    t[BasicOpcode::Xor as usize] = Some(xor);
    t[BasicOpcode::Shr as usize] = Some(shr);
    t[BasicOpcode::Asr as usize] = Some(asr);
    t[BasicOpcode::Shl as usize] = Some(shl);
    t[BasicOpcode::Ifb as usize] = Some(ifb);
    t[BasicOpcode::Ifc as usize] = Some(ifc);
    t[BasicOpcode::Ife as usize] = Some(ife);
    t[BasicOpcode::Ifn as usize] = Some(ifn);
    t[BasicOpcode::Ifg as usize] = Some(ifg);
    t[BasicOpcode::Ifa as usize] = Some(ifa);
    t[BasicOpcode::Ifl as usize] = Some(ifl);
    t[BasicOpcode::Ifu as usize] = Some(ifu);
    t[BasicOpcode::Adx as usize] = Some(adx);
    t[BasicOpcode::Sbx as usize] = Some(sbx);
    t[BasicOpcode::Sti as usize] = Some(sti);
    t[BasicOpcode::Std as usize] = Some(std_);
    t
};

// Indexed by the "b" field of a special instruction.
pub(crate) const SPECIAL_HANDLERS: [Option<SpecialHandler>; 32] = {
    let mut t: [Option<SpecialHandler>; 32] = [None; 32];
    t[SpecialOpcode::Jsr as usize] = Some(jsr);
    t[SpecialOpcode::Int as usize] = Some(int);
    t[SpecialOpcode::Iag as usize] = Some(iag);
    t[SpecialOpcode::Ias as usize] = Some(ias);
    t[SpecialOpcode::Rfi as usize] = Some(rfi);
    t[SpecialOpcode::Iaq as usize] = Some(iaq);
    t[SpecialOpcode::Hwn as usize] = Some(hwn);
    t[SpecialOpcode::Hwq as usize] = Some(hwq);
    t[SpecialOpcode::Hwi as usize] = Some(hwi);
    t
};


////////////////////////////////////////////////////////////////////////////////
// Helpers
////////////////////////////////////////////////////////////////////////////////

// The low half of op's result goes to b, the high half to EX.
fn do_wide(emu: &mut Emulator, b: &Operand, a: &Operand, op: fn(u16, u16, u16) -> u32) -> Result<ExecRet, ExecError> {
    let a_val = emu.state.load(a);
    let b_val = emu.state.load(b);
    let res = op(b_val, a_val, emu.state.ex());
    debug!("{b_val:#06x}, {a_val:#06x} -> {res:#010x}");
    let ret = emu.state.store(b, res as u16);
    // A halting store leaves the rest of the machine as it was.
    if ret.is_halt() {
        return Ok(ret);
    }
    emu.state.set_ex((res >> 16) as u16);
    Ok(ret)
}

fn do_bitwise(emu: &mut Emulator, b: &Operand, a: &Operand, op: fn(u16, u16) -> u16) -> Result<ExecRet, ExecError> {
    let a_val = emu.state.load(a);
    let b_val = emu.state.load(b);
    let res = op(b_val, a_val);
    debug!("{b_val:#06x}, {a_val:#06x} -> {res:#06x}");
    Ok(emu.state.store(b, res))
}

// A failed test skips the next instruction; a passing one leaves the flag alone.
fn do_cond(emu: &mut Emulator, b: &Operand, a: &Operand, test: fn(u16, u16) -> bool) -> Result<ExecRet, ExecError> {
    let a_val = emu.state.load(a);
    let b_val = emu.state.load(b);
    let pass = test(b_val, a_val);
    debug!("{b_val:#06x}, {a_val:#06x} -> {pass}");
    if !pass {
        emu.state.set_skip(true);
    }
    Ok(ExecRet::Ok)
}

fn do_transfer(emu: &mut Emulator, b: &Operand, a: &Operand, delta: u16) -> Result<ExecRet, ExecError> {
    let val = emu.state.load(a);
    let ret = emu.state.store(b, val);
    if ret.is_halt() {
        return Ok(ret);
    }
    for reg in [Reg::I, Reg::J] {
        let next = emu.state.reg(reg).wrapping_add(delta);
        emu.state.set_reg(reg, next);
    }
    Ok(ret)
}

fn pack(res: u16, ex: u16) -> u32 {
    ((ex as u32) << 16) | res as u32
}

fn signed(val: u16) -> i32 {
    val as i16 as i32
}

fn device_index(emu: &Emulator, op: &Operand) -> Result<usize, ExecError> {
    let index = emu.state.load(op);
    if index as usize >= emu.devices.len() {
        return Err(ExecError::InvalidHardwareIndex(index));
    }
    Ok(index as usize)
}


////////////////////////////////////////////////////////////////////////////////
// Basic
////////////////////////////////////////////////////////////////////////////////

fn set(emu: &mut Emulator, b: &Operand, a: &Operand) -> Result<ExecRet, ExecError> {
    let val = emu.state.load(a);
    Ok(emu.state.store(b, val))
}

fn add(emu: &mut Emulator, b: &Operand, a: &Operand) -> Result<ExecRet, ExecError> {
    do_wide(emu, b, a, |b, a, _| b as u32 + a as u32)
}

fn sub(emu: &mut Emulator, b: &Operand, a: &Operand) -> Result<ExecRet, ExecError> {
    // Underflow leaves 0xffff in EX.
    do_wide(emu, b, a, |b, a, _| (b as u32).wrapping_sub(a as u32))
}

fn mul(emu: &mut Emulator, b: &Operand, a: &Operand) -> Result<ExecRet, ExecError> {
    do_wide(emu, b, a, |b, a, _| b as u32 * a as u32)
}

fn mli(emu: &mut Emulator, b: &Operand, a: &Operand) -> Result<ExecRet, ExecError> {
    do_wide(emu, b, a, |b, a, _| (signed(b) * signed(a)) as u32)
}

fn div(emu: &mut Emulator, b: &Operand, a: &Operand) -> Result<ExecRet, ExecError> {
    do_wide(emu, b, a, |b, a, _| {
        if a == 0 {
            return 0;
        }
        let ex = ((b as u32) << 16) / a as u32;
        pack(b / a, ex as u16)
    })
}

fn dvi(emu: &mut Emulator, b: &Operand, a: &Operand) -> Result<ExecRet, ExecError> {
    do_wide(emu, b, a, |b, a, _| {
        if a == 0 {
            return 0;
        }
        // i64 so that -0x8000 / -1 can't overflow.
        let (b, a) = (signed(b) as i64, signed(a) as i64);
        pack((b / a) as u16, ((b << 16) / a) as u16)
    })
}

fn mod_(emu: &mut Emulator, b: &Operand, a: &Operand) -> Result<ExecRet, ExecError> {
    do_bitwise(emu, b, a, |b, a| b.checked_rem(a).unwrap_or(0))
}

fn mdi(emu: &mut Emulator, b: &Operand, a: &Operand) -> Result<ExecRet, ExecError> {
    do_bitwise(emu, b, a, |b, a| signed(b).checked_rem(signed(a)).unwrap_or(0) as u16)
}

fn and(emu: &mut Emulator, b: &Operand, a: &Operand) -> Result<ExecRet, ExecError> {
    do_bitwise(emu, b, a, |b, a| b & a)
}

fn bor(emu: &mut Emulator, b: &Operand, a: &Operand) -> Result<ExecRet, ExecError> {
    do_bitwise(emu, b, a, |b, a| b | a)
}

fn xor(emu: &mut Emulator, b: &Operand, a: &Operand) -> Result<ExecRet, ExecError> {
    do_bitwise(emu, b, a, |b, a| b ^ a)
}

fn shr(emu: &mut Emulator, b: &Operand, a: &Operand) -> Result<ExecRet, ExecError> {
    do_wide(emu, b, a, |b, a, _| {
        let res = (b as u32).checked_shr(a as u32).unwrap_or(0);
        let ex = ((b as u32) << 16).checked_shr(a as u32).unwrap_or(0);
        pack(res as u16, ex as u16)
    })
}

fn asr(emu: &mut Emulator, b: &Operand, a: &Operand) -> Result<ExecRet, ExecError> {
    do_wide(emu, b, a, |b, a, _| {
        // Shifting an i32 by 31 already yields all sign bits.
        let shift = (a as u32).min(31);
        let res = signed(b) >> shift;
        let ex = (signed(b) << 16) >> shift;
        pack(res as u16, ex as u16)
    })
}

fn shl(emu: &mut Emulator, b: &Operand, a: &Operand) -> Result<ExecRet, ExecError> {
    do_wide(emu, b, a, |b, a, _| {
        let wide = (b as u64).checked_shl(a as u32).unwrap_or(0);
        pack(wide as u16, (wide >> 16) as u16)
    })
}

fn ifb(emu: &mut Emulator, b: &Operand, a: &Operand) -> Result<ExecRet, ExecError> {
    do_cond(emu, b, a, |b, a| b & a != 0)
}

fn ifc(emu: &mut Emulator, b: &Operand, a: &Operand) -> Result<ExecRet, ExecError> {
    do_cond(emu, b, a, |b, a| b & a == 0)
}

fn ife(emu: &mut Emulator, b: &Operand, a: &Operand) -> Result<ExecRet, ExecError> {
    do_cond(emu, b, a, |b, a| b == a)
}

fn ifn(emu: &mut Emulator, b: &Operand, a: &Operand) -> Result<ExecRet, ExecError> {
    do_cond(emu, b, a, |b, a| b != a)
}

fn ifg(emu: &mut Emulator, b: &Operand, a: &Operand) -> Result<ExecRet, ExecError> {
    do_cond(emu, b, a, |b, a| b > a)
}

fn ifa(emu: &mut Emulator, b: &Operand, a: &Operand) -> Result<ExecRet, ExecError> {
    do_cond(emu, b, a, |b, a| signed(b) > signed(a))
}

fn ifl(emu: &mut Emulator, b: &Operand, a: &Operand) -> Result<ExecRet, ExecError> {
    do_cond(emu, b, a, |b, a| b < a)
}

fn ifu(emu: &mut Emulator, b: &Operand, a: &Operand) -> Result<ExecRet, ExecError> {
    do_cond(emu, b, a, |b, a| signed(b) < signed(a))
}

fn adx(emu: &mut Emulator, b: &Operand, a: &Operand) -> Result<ExecRet, ExecError> {
    do_wide(emu, b, a, |b, a, ex| b as u32 + a as u32 + ex as u32)
}

fn sbx(emu: &mut Emulator, b: &Operand, a: &Operand) -> Result<ExecRet, ExecError> {
    // Signed so that a borrow shifts down to 0xffff in EX.
    do_wide(emu, b, a, |b, a, ex| (b as i32 - a as i32 + ex as i32) as u32)
}

fn sti(emu: &mut Emulator, b: &Operand, a: &Operand) -> Result<ExecRet, ExecError> {
    do_transfer(emu, b, a, 1)
}

fn std_(emu: &mut Emulator, b: &Operand, a: &Operand) -> Result<ExecRet, ExecError> {
    do_transfer(emu, b, a, 0xffff)
}


////////////////////////////////////////////////////////////////////////////////
// Special
////////////////////////////////////////////////////////////////////////////////

fn jsr(emu: &mut Emulator, a: &Operand) -> Result<ExecRet, ExecError> {
    let target = emu.state.load(a);
    let ret = emu.state.pc();
    debug!("JSR {a}; destination = {target:#06x}, return = {ret:#06x}");
    emu.state.push(ret);
    emu.state.set_pc(target);
    Ok(ExecRet::Ok)
}

fn int(emu: &mut Emulator, a: &Operand) -> Result<ExecRet, ExecError> {
    let message = emu.state.load(a);
    debug!("INT {a}; message = {message:#06x}");
    emu.state.interrupt(message);
    Ok(ExecRet::Ok)
}

fn iag(emu: &mut Emulator, a: &Operand) -> Result<ExecRet, ExecError> {
    let ia = emu.state.ia();
    debug!("IAG {a}; IA = {ia:#06x}");
    Ok(emu.state.store(a, ia))
}

fn ias(emu: &mut Emulator, a: &Operand) -> Result<ExecRet, ExecError> {
    let ia = emu.state.load(a);
    debug!("IAS {a}; IA = {ia:#06x}");
    emu.state.set_ia(ia);
    Ok(ExecRet::Ok)
}

fn rfi(emu: &mut Emulator, _a: &Operand) -> Result<ExecRet, ExecError> {
    emu.state.set_queueing(false);
    let saved_a = emu.state.pop();
    emu.state.set_reg(Reg::A, saved_a);
    let saved_pc = emu.state.pop();
    debug!("RFI; A = {saved_a:#06x}, PC = {saved_pc:#06x}");
    emu.state.set_pc(saved_pc);
    Ok(ExecRet::Ok)
}

fn iaq(emu: &mut Emulator, a: &Operand) -> Result<ExecRet, ExecError> {
    let queueing = emu.state.load(a) != 0;
    debug!("IAQ {a}; queueing = {queueing}");
    emu.state.set_queueing(queueing);
    Ok(ExecRet::Ok)
}

fn hwn(emu: &mut Emulator, a: &Operand) -> Result<ExecRet, ExecError> {
    let count = emu.devices.len() as u16;
    debug!("HWN {a}; count = {count}");
    Ok(emu.state.store(a, count))
}

fn hwq(emu: &mut Emulator, a: &Operand) -> Result<ExecRet, ExecError> {
    let index = device_index(emu, a)?;
    let info = emu.devices.identify(index);
    debug!("Device {index}: {info:?}");
    emu.state.set_reg(Reg::A, info.id as u16);
    emu.state.set_reg(Reg::B, (info.id >> 16) as u16);
    emu.state.set_reg(Reg::C, info.version);
    emu.state.set_reg(Reg::X, info.manufacturer as u16);
    emu.state.set_reg(Reg::Y, (info.manufacturer >> 16) as u16);
    Ok(ExecRet::Ok)
}

fn hwi(emu: &mut Emulator, a: &Operand) -> Result<ExecRet, ExecError> {
    let index = device_index(emu, a)?;
    debug!("HWI {index}, A = {:#06x}", emu.state.reg(Reg::A));
    emu.devices.interrupt_device(index, &mut emu.state).map_err(|source| {
        warn!("Device {index} failed to handle interrupt: {source}");
        ExecError::Device{ index: index as u16, source }
    })?;
    Ok(ExecRet::Ok)
}
