use crate::constants::{IF_FIRST, IF_LAST};

use std::fmt;

use num_derive::{FromPrimitive, ToPrimitive};
use num_traits::FromPrimitive;
use derive_more::IsVariant;


#[derive(Debug, Clone, Copy, FromPrimitive, ToPrimitive, PartialEq, Eq)]
pub enum Reg {
    A = 0,
    B,
    C,
    X,
    Y,
    Z,
    I,
    J,
}

impl fmt::Display for Reg {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

pub const NUM_REGS: usize = 8;

impl Reg {
    pub const NUM_BITS: usize = 3;
    pub const MASK: u16 = (1u16 << Self::NUM_BITS) - 1;

    // Masked to three bits, so every value maps.
    pub fn from_code(code: u16) -> Option<Reg> {
        Reg::from_u16(code & Self::MASK)
    }

    pub fn index(self) -> usize {
        self as usize
    }
}


////////////////////////////////////////////////////////////////////////////////

// Two-operand instructions, "b" is the destination.
#[derive(Debug, Clone, Copy, FromPrimitive, ToPrimitive, PartialEq, Eq)]
pub enum BasicOpcode {
    Set = 0x01,
    Add,
    Sub,
    Mul,
    Mli,
    Div,
    Dvi,
    Mod,
    Mdi,
    And,
    Bor,
    Xor,
    Shr,
    Asr,
    Shl,

    Ifb = 0x10,
    Ifc,
    Ife,
    Ifn,
    Ifg,
    Ifa,
    Ifl,
    Ifu,

    Adx = 0x1a,
    Sbx,

    Sti = 0x1e,
    Std,
}

impl BasicOpcode {
    pub fn decode(op: u16) -> Option<BasicOpcode> {
        BasicOpcode::from_u16(op)
    }

    pub fn code(self) -> u16 {
        self as u16
    }

    pub fn is_conditional(self) -> bool {
        is_conditional_code(self as u16)
    }
}

impl fmt::Display for BasicOpcode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", format!("{:?}", self).to_uppercase())
    }
}

pub fn is_conditional_code(op: u16) -> bool {
    (IF_FIRST..=IF_LAST).contains(&op)
}

// One-operand instructions, selected by the "b" field when the opcode field is 0.
#[derive(Debug, Clone, Copy, FromPrimitive, ToPrimitive, PartialEq, Eq)]
pub enum SpecialOpcode {
    Jsr = 0x01,

    Int = 0x08,
    Iag,
    Ias,
    Rfi,
    Iaq,

    Hwn = 0x10,
    Hwq,
    Hwi,
}

impl SpecialOpcode {
    pub fn decode(op: u16) -> Option<SpecialOpcode> {
        SpecialOpcode::from_u16(op)
    }

    pub fn code(self) -> u16 {
        self as u16
    }
}

impl fmt::Display for SpecialOpcode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", format!("{:?}", self).to_uppercase())
    }
}


////////////////////////////////////////////////////////////////////////////////

// The three fields of an instruction word: aaaaaabbbbbooooo
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsWord {
    pub op: u16,
    pub b: u16,
    pub a: u16,
}

impl InsWord {
    pub const OP_BITS: usize = 5;
    pub const B_BITS: usize = 5;
    pub const A_BITS: usize = 6;

    pub const OP_MASK: u16 = (1u16 << Self::OP_BITS) - 1;
    pub const B_MASK: u16 = (1u16 << Self::B_BITS) - 1;
    pub const A_MASK: u16 = (1u16 << Self::A_BITS) - 1;

    const B_SHIFT: usize = Self::OP_BITS;
    const A_SHIFT: usize = Self::OP_BITS + Self::B_BITS;

    pub fn split(word: u16) -> InsWord {
        InsWord {
            op: word & Self::OP_MASK,
            b: (word >> Self::B_SHIFT) & Self::B_MASK,
            a: (word >> Self::A_SHIFT) & Self::A_MASK,
        }
    }

    pub fn join(&self) -> u16 {
        (self.op & Self::OP_MASK)
            | ((self.b & Self::B_MASK) << Self::B_SHIFT)
            | ((self.a & Self::A_MASK) << Self::A_SHIFT)
    }

    pub fn basic(op: BasicOpcode, b: u16, a: u16) -> u16 {
        InsWord{op: op.code(), b, a}.join()
    }

    pub fn special(op: SpecialOpcode, a: u16) -> u16 {
        InsWord{op: 0, b: op.code(), a}.join()
    }

    pub fn is_special(&self) -> bool {
        self.op == 0
    }

    pub fn is_conditional(&self) -> bool {
        is_conditional_code(self.op)
    }
}


////////////////////////////////////////////////////////////////////////////////

// The syntactic form of an operand field, before any register or memory is consulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, IsVariant)]
pub enum AddrMode {
    Reg(Reg),
    RegDef(Reg),
    RegIndex(Reg),
    PushPop,
    Peek,
    Pick,
    Sp,
    Pc,
    Ex,
    Abs,
    NextLit,
    InlineLit(u16),
}

impl AddrMode {
    pub const REG: u16 = 0x00;
    pub const REG_DEF: u16 = 0x08;
    pub const REG_INDEX: u16 = 0x10;
    pub const PUSH_POP: u16 = 0x18;
    pub const PEEK: u16 = 0x19;
    pub const PICK: u16 = 0x1a;
    pub const SP: u16 = 0x1b;
    pub const PC: u16 = 0x1c;
    pub const EX: u16 = 0x1d;
    pub const ABS: u16 = 0x1e;
    pub const NEXT_LIT: u16 = 0x1f;
    pub const INLINE_LIT: u16 = 0x20;

    // Inline literals encode -1..=30.
    pub const INLINE_LIT_MIN: i16 = -1;
    pub const INLINE_LIT_MAX: i16 = 30;

    const GROUP_MASK: u16 = 0x38;

    pub fn decode(code: u16, is_a: bool) -> Option<AddrMode> {
        let reg = Reg::from_code(code)?;
        let mode = match code {
            _ if code & Self::GROUP_MASK == Self::REG => AddrMode::Reg(reg),
            _ if code & Self::GROUP_MASK == Self::REG_DEF => AddrMode::RegDef(reg),
            _ if code & Self::GROUP_MASK == Self::REG_INDEX => AddrMode::RegIndex(reg),
            Self::PUSH_POP => AddrMode::PushPop,
            Self::PEEK => AddrMode::Peek,
            Self::PICK => AddrMode::Pick,
            Self::SP => AddrMode::Sp,
            Self::PC => AddrMode::Pc,
            Self::EX => AddrMode::Ex,
            Self::ABS => AddrMode::Abs,
            Self::NEXT_LIT => AddrMode::NextLit,
            0x20..=0x3f if is_a => AddrMode::InlineLit((code - Self::INLINE_LIT).wrapping_sub(1)),
            _ => return None,
        };
        Some(mode)
    }

    // Inverse of decode(); used when building program images by hand.
    pub fn encode(&self) -> u16 {
        match *self {
            AddrMode::Reg(r) => Self::REG | r as u16,
            AddrMode::RegDef(r) => Self::REG_DEF | r as u16,
            AddrMode::RegIndex(r) => Self::REG_INDEX | r as u16,
            AddrMode::PushPop => Self::PUSH_POP,
            AddrMode::Peek => Self::PEEK,
            AddrMode::Pick => Self::PICK,
            AddrMode::Sp => Self::SP,
            AddrMode::Pc => Self::PC,
            AddrMode::Ex => Self::EX,
            AddrMode::Abs => Self::ABS,
            AddrMode::NextLit => Self::NEXT_LIT,
            AddrMode::InlineLit(val) => Self::INLINE_LIT + val.wrapping_add(1),
        }
    }

    // Whether decoding consumes the word following the instruction.
    pub fn needs_extra(&self) -> bool {
        matches!(self, AddrMode::RegIndex(_) | AddrMode::Pick | AddrMode::Abs | AddrMode::NextLit)
    }

    pub fn inline_lit(val: i16) -> Option<AddrMode> {
        if (Self::INLINE_LIT_MIN..=Self::INLINE_LIT_MAX).contains(&val) {
            Some(AddrMode::InlineLit(val as u16))
        } else {
            None
        }
    }
}


// An operand field together with its extra word, if it has one. Only used for
// display; the emulator resolves the location separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Arg {
    pub mode: AddrMode,
    pub is_a: bool,
    pub extra: Option<u16>,
}

impl Arg {
    pub fn new(mode: AddrMode, is_a: bool, extra: Option<u16>) -> Arg {
        debug_assert_eq!(mode.needs_extra(), extra.is_some());
        Arg{mode, is_a, extra}
    }
}

impl fmt::Display for Arg {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let extra = self.extra.unwrap_or(0);
        match self.mode {
            AddrMode::Reg(r) => write!(f, "{r}"),
            AddrMode::RegDef(r) => write!(f, "[{r}]"),
            AddrMode::RegIndex(r) => write!(f, "[{r}+{extra:#06x}]"),
            AddrMode::PushPop if self.is_a => write!(f, "POP"),
            AddrMode::PushPop => write!(f, "PUSH"),
            AddrMode::Peek => write!(f, "PEEK"),
            AddrMode::Pick => write!(f, "[SP+{extra:#06x}]"),
            AddrMode::Sp => write!(f, "SP"),
            AddrMode::Pc => write!(f, "PC"),
            AddrMode::Ex => write!(f, "EX"),
            AddrMode::Abs => write!(f, "[{extra:#06x}]"),
            AddrMode::NextLit => write!(f, "{extra:#06x}"),
            AddrMode::InlineLit(val) => write!(f, "{val:#06x}"),
        }
    }
}
