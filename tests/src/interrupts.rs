use crate::helpers::{Op, addr_after, basic, halt, load, run, set, special};
use common::asm::{BasicOpcode, Reg, SpecialOpcode};
use emu_lib::{Emulator, ExecError, ExecRet};

const HANDLER: u16 = 0x0100;
const LOG: u16 = 0x0200;

// Appends each message to LOG, using I as the cursor, then returns.
fn recording_handler() -> Vec<u16> {
    [
        set(Op::Def(Reg::I), Op::Reg(Reg::A)),
        basic(BasicOpcode::Add, Op::Reg(Reg::I), Op::Lit(1)),
        special(SpecialOpcode::Rfi, Op::Lit(0)),
    ].concat()
}

fn load_with_handler(prog: &[Vec<u16>]) -> Emulator {
    let mut emu = load(prog);
    emu.load_program(&recording_handler(), HANDLER).unwrap();
    emu.get_state_mut().set_reg(Reg::I, LOG);
    emu
}

fn logged(emu: &Emulator) -> Vec<u16> {
    (LOG..emu.reg(Reg::I)).map(|addr| emu.mem_read(addr)).collect()
}

#[test]
fn dropped_without_ia() {
    let emu = run(&[
        set(Op::Reg(Reg::A), Op::Lit(7)),
        special(SpecialOpcode::Int, Op::Lit(5)),
        set(Op::Reg(Reg::B), Op::Lit(1)),
        halt(),
    ]);
    assert_eq!(emu.reg(Reg::A), 7);
    assert_eq!(emu.reg(Reg::B), 1);
    assert_eq!(emu.sp(), 0);
    assert!(emu.interrupter().is_empty());
    assert!(!emu.get_state().queueing());
}

#[test]
fn delivery() {
    let mut emu = load(&[halt()]);
    emu.load_program(&set(Op::Reg(Reg::B), Op::Reg(Reg::A)), HANDLER).unwrap();
    emu.get_state_mut().set_ia(HANDLER);
    emu.set_reg(Reg::A, 0x0abc);
    emu.interrupt(9);

    // Delivery happens at the start of the slot; the handler's first
    // instruction runs in it.
    assert_eq!(emu.run_ins().unwrap(), ExecRet::Ok);
    assert_eq!(emu.reg(Reg::B), 9);
    assert_eq!(emu.reg(Reg::A), 9);
    assert_eq!(emu.pc(), HANDLER + 1);
    assert_eq!(emu.sp(), 0xfffe);
    // Return address, then the interrupted A.
    assert_eq!(emu.mem_read(0xffff), 0);
    assert_eq!(emu.mem_read(0xfffe), 0x0abc);
    assert!(emu.get_state().queueing());
}

#[test]
fn software_interrupt_and_return() {
    let prog = [
        special(SpecialOpcode::Ias, Op::Word(HANDLER)),
        set(Op::Reg(Reg::A), Op::Word(0x0077)),
        special(SpecialOpcode::Int, Op::Word(0x0042)),
        set(Op::Reg(Reg::B), Op::Reg(Reg::A)),
        halt(),
    ];
    let mut emu = load_with_handler(&prog);
    emu.run_at(0).unwrap();
    assert_eq!(logged(&emu), vec![0x0042]);
    // RFI restored A and PC.
    assert_eq!(emu.reg(Reg::B), 0x0077);
    assert_eq!(emu.pc(), addr_after(&prog));
    assert_eq!(emu.sp(), 0);
    assert!(!emu.get_state().queueing());
}

#[test]
fn queueing_holds_interrupts() {
    let prog = [
        special(SpecialOpcode::Ias, Op::Word(HANDLER)),
        special(SpecialOpcode::Iaq, Op::Lit(1)),
        special(SpecialOpcode::Int, Op::Lit(1)),
        special(SpecialOpcode::Int, Op::Lit(2)),
        special(SpecialOpcode::Int, Op::Lit(3)),
        special(SpecialOpcode::Iaq, Op::Lit(0)),
        set(Op::Reg(Reg::X), Op::Lit(1)),
        halt(),
    ];
    let mut emu = load_with_handler(&prog);
    for _ in 0..5 {
        emu.run_ins().unwrap();
    }
    assert_eq!(emu.interrupter().pending(), vec![1, 2, 3]);
    assert_eq!(emu.reg(Reg::I), LOG);

    emu.run().unwrap();
    // One at a time, in order; RFI lets the next one through.
    assert_eq!(logged(&emu), vec![1, 2, 3]);
    assert_eq!(emu.reg(Reg::X), 1);
    assert!(emu.interrupter().is_empty());
}

#[test]
fn iag_ias() {
    let emu = run(&[
        special(SpecialOpcode::Ias, Op::Word(0x1234)),
        special(SpecialOpcode::Iag, Op::Reg(Reg::A)),
        halt(),
    ]);
    assert_eq!(emu.ia(), 0x1234);
    assert_eq!(emu.reg(Reg::A), 0x1234);
}

#[test]
fn jsr_from_handler() {
    // The handler calls a subroutine and still returns to the right place.
    let sub = 0x0300;
    let handler = [
        special(SpecialOpcode::Jsr, Op::Word(sub)),
        special(SpecialOpcode::Rfi, Op::Lit(0)),
    ].concat();
    let body = [
        set(Op::Reg(Reg::C), Op::Reg(Reg::A)),
        set(Op::Pc, Op::Pop),
    ].concat();

    let prog = [
        special(SpecialOpcode::Ias, Op::Word(HANDLER)),
        special(SpecialOpcode::Int, Op::Lit(0x1e)),
        set(Op::Reg(Reg::X), Op::Lit(2)),
        halt(),
    ];
    let mut emu = load(&prog);
    emu.load_program(&handler, HANDLER).unwrap();
    emu.load_program(&body, sub).unwrap();
    emu.run_at(0).unwrap();
    assert_eq!(emu.reg(Reg::C), 0x1e);
    assert_eq!(emu.reg(Reg::X), 2);
    assert_eq!(emu.sp(), 0);
}

#[test]
fn overflow() {
    let mut emu = load(&[halt()]);
    emu.set_interrupt_queue_limit(Some(2));
    for i in 0..3 {
        emu.interrupt(i);
    }
    assert_eq!(emu.interrupter().len(), 2);
    assert!(matches!(emu.run_ins(), Err(ExecError::InterruptQueueOverflow { depth: 2 })));
}

#[test]
fn default_depth() {
    let mut emu = load(&[halt()]);
    for i in 0..256 {
        emu.interrupt(i);
    }
    assert_eq!(emu.run_ins().unwrap(), ExecRet::Halt);

    let mut emu = load(&[halt()]);
    for i in 0..257 {
        emu.interrupt(i);
    }
    assert!(matches!(emu.run_ins(), Err(ExecError::InterruptQueueOverflow { depth: 256 })));
}

#[test]
fn unbounded() {
    let mut emu = load(&[halt()]);
    emu.set_interrupt_queue_limit(None);
    for i in 0..1000 {
        emu.interrupt(i);
    }
    assert_eq!(emu.run_ins().unwrap(), ExecRet::Halt);
    // IA is 0, so only the one serviced has gone.
    assert_eq!(emu.interrupter().len(), 999);
}

#[test]
fn reset_clears_pending() {
    let mut emu = load(&[halt()]);
    emu.set_interrupt_queue_limit(Some(1));
    emu.interrupt(1);
    emu.interrupt(2);
    emu.get_state_mut().set_queueing(true);
    emu.reset();
    assert!(emu.interrupter().is_empty());
    assert!(!emu.get_state().queueing());
    assert_eq!(emu.run_ins().unwrap(), ExecRet::Halt);
}
