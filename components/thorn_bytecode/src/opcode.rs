//! Thorn opcodes and the raw opcode table
//!
//! The bytecode stream carries raw opcode bytes. Most instructions that take
//! an operand exist in two encodings: a narrow one with an 8-bit operand and a
//! wide one with a 16-bit operand. [`OPCODE_TABLE`] maps every raw byte to a
//! canonical [`Opcode`] plus the [`Operands`] shape that follows it, so the
//! interpreter only ever dispatches on the canonical set.

use std::fmt;

/// Number of results requested by a call that keeps every returned value.
pub const MULT_RET: usize = 255;

/// Number of list items flushed by a single `SetList`.
pub const FIELDS_PER_FLUSH: usize = 64;

/// Parameter descriptors at or above this value mark a variadic function.
pub const ZERO_VARARG: u8 = 64;

/// Canonical opcode identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    /// End of function body; returns nil
    EndCode,
    /// Return the values above the given stack base
    RetCode,
    /// Call a function: results requested, argument count
    Call,
    /// Call a function and return its result directly
    TailCall,
    /// Push `n + 1` nils
    PushNil,
    /// Pop `n` values
    Pop,
    /// Push a small literal number
    PushNumber,
    /// Push a small negated literal number
    PushNumberNeg,
    /// Push a constant from the constant pool
    PushConstant,
    /// Push a captured upvalue
    PushUpValue,
    /// Push a local slot
    PushLocal,
    /// Push a global (Env first, then Globals)
    GetGlobal,
    /// Index a table with the value on top of the stack
    GetTable,
    /// Index a table with a constant string key
    GetDotted,
    /// Method lookup: pushes `t[k]` then the receiver `t`
    PushSelf,
    /// Create an empty table
    CreateArray,
    /// Pop into a local slot
    SetLocal,
    /// Pop into the Globals namespace
    SetGlobal,
    /// Pop value, key and table; assign
    SetTablePop,
    /// Assign into a table found below the top of the stack
    SetTable,
    /// Install a run of list items into the table under them
    SetList,
    /// Install key/value pairs into the table under them
    SetMap,
    /// `~=`
    NeqOp,
    /// `==`
    EqOp,
    /// `<`
    LtOp,
    /// `<=`
    LeOp,
    /// `>`
    GtOp,
    /// `>=`
    GeOp,
    /// `+`
    AddOp,
    /// `-`
    SubOp,
    /// `*`
    MultOp,
    /// `/`
    DivOp,
    /// `^`
    PowOp,
    /// `..`
    ConcOp,
    /// Unary minus
    MinusOp,
    /// `not`
    NotOp,
    /// Jump forward if top is non-nil (keep it), else pop
    OntJmp,
    /// Jump forward if top is nil (keep it), else pop
    OnfJmp,
    /// Unconditional forward jump
    Jmp,
    /// Pop; jump forward if nil
    IffJmp,
    /// Pop; jump backward if non-nil
    IftUpJmp,
    /// Pop; jump backward if nil
    IffUpJmp,
    /// Build a closure from a nested prototype and popped upvalues
    Closure,
    /// Record the current source line
    SetLine,
    /// Operand prefix for the following instruction
    LongArg,
    /// Stack check hint, no runtime effect
    CheckStack,
}

/// Operand shape following a raw opcode byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operands {
    /// No operands
    None,
    /// One 8-bit operand
    Byte,
    /// Two 8-bit operands
    ByteByte,
    /// One big-endian 16-bit operand
    Word,
    /// A big-endian 16-bit operand followed by an 8-bit operand
    WordByte,
}

impl Operands {
    /// Number of operand bytes following the opcode byte
    pub fn width(self) -> usize {
        match self {
            Operands::None => 0,
            Operands::Byte => 1,
            Operands::ByteByte | Operands::Word => 2,
            Operands::WordByte => 3,
        }
    }

    /// Whether the first operand is 16 bits wide
    pub fn is_wide(self) -> bool {
        matches!(self, Operands::Word | Operands::WordByte)
    }
}

/// One entry of the raw opcode table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpInfo {
    /// Canonical opcode
    pub opcode: Opcode,
    /// Operand shape
    pub operands: Operands,
}

const fn op(opcode: Opcode, operands: Operands) -> OpInfo {
    OpInfo { opcode, operands }
}

/// Raw opcode byte -> canonical opcode and operand shape.
///
/// The index into this table is the raw opcode byte.
pub static OPCODE_TABLE: [OpInfo; 64] = [
    op(Opcode::EndCode, Operands::None),
    op(Opcode::RetCode, Operands::Byte),
    op(Opcode::Call, Operands::ByteByte),
    op(Opcode::TailCall, Operands::ByteByte),
    op(Opcode::PushNil, Operands::Byte),
    op(Opcode::Pop, Operands::Byte),
    op(Opcode::PushNumber, Operands::Word),
    op(Opcode::PushNumber, Operands::Byte),
    op(Opcode::PushNumberNeg, Operands::Word),
    op(Opcode::PushNumberNeg, Operands::Byte),
    op(Opcode::PushConstant, Operands::Word),
    op(Opcode::PushConstant, Operands::Byte),
    op(Opcode::PushUpValue, Operands::Byte),
    op(Opcode::PushLocal, Operands::Byte),
    op(Opcode::GetGlobal, Operands::Word),
    op(Opcode::GetGlobal, Operands::Byte),
    op(Opcode::GetTable, Operands::None),
    op(Opcode::GetDotted, Operands::Word),
    op(Opcode::GetDotted, Operands::Byte),
    op(Opcode::PushSelf, Operands::Word),
    op(Opcode::PushSelf, Operands::Byte),
    op(Opcode::CreateArray, Operands::Word),
    op(Opcode::CreateArray, Operands::Byte),
    op(Opcode::SetLocal, Operands::Byte),
    op(Opcode::SetGlobal, Operands::Word),
    op(Opcode::SetGlobal, Operands::Byte),
    op(Opcode::SetTablePop, Operands::None),
    op(Opcode::SetTable, Operands::Byte),
    op(Opcode::SetList, Operands::WordByte),
    op(Opcode::SetList, Operands::ByteByte),
    op(Opcode::SetMap, Operands::Byte),
    op(Opcode::NeqOp, Operands::None),
    op(Opcode::EqOp, Operands::None),
    op(Opcode::LtOp, Operands::None),
    op(Opcode::LeOp, Operands::None),
    op(Opcode::GtOp, Operands::None),
    op(Opcode::GeOp, Operands::None),
    op(Opcode::AddOp, Operands::None),
    op(Opcode::SubOp, Operands::None),
    op(Opcode::MultOp, Operands::None),
    op(Opcode::DivOp, Operands::None),
    op(Opcode::PowOp, Operands::None),
    op(Opcode::ConcOp, Operands::None),
    op(Opcode::MinusOp, Operands::None),
    op(Opcode::NotOp, Operands::None),
    op(Opcode::OntJmp, Operands::Word),
    op(Opcode::OntJmp, Operands::Byte),
    op(Opcode::OnfJmp, Operands::Word),
    op(Opcode::OnfJmp, Operands::Byte),
    op(Opcode::Jmp, Operands::Word),
    op(Opcode::Jmp, Operands::Byte),
    op(Opcode::IffJmp, Operands::Word),
    op(Opcode::IffJmp, Operands::Byte),
    op(Opcode::IftUpJmp, Operands::Word),
    op(Opcode::IftUpJmp, Operands::Byte),
    op(Opcode::IffUpJmp, Operands::Word),
    op(Opcode::IffUpJmp, Operands::Byte),
    op(Opcode::Closure, Operands::WordByte),
    op(Opcode::Closure, Operands::ByteByte),
    op(Opcode::SetLine, Operands::Word),
    op(Opcode::SetLine, Operands::Byte),
    op(Opcode::LongArg, Operands::Word),
    op(Opcode::LongArg, Operands::Byte),
    op(Opcode::CheckStack, Operands::Byte),
];

/// Look up a raw opcode byte
pub fn lookup(raw: u8) -> Option<&'static OpInfo> {
    OPCODE_TABLE.get(raw as usize)
}

/// Raw encodings available for a canonical opcode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Encodings {
    /// Raw byte of the narrow (or only) form
    pub narrow: Option<u8>,
    /// Raw byte of the wide form
    pub wide: Option<u8>,
}

impl Opcode {
    /// Find the raw bytes encoding this opcode
    pub fn encodings(self) -> Encodings {
        let mut encodings = Encodings {
            narrow: None,
            wide: None,
        };
        for (raw, info) in OPCODE_TABLE.iter().enumerate() {
            if info.opcode != self {
                continue;
            }
            if info.operands.is_wide() {
                encodings.wide = Some(raw as u8);
            } else {
                encodings.narrow = Some(raw as u8);
            }
        }
        encodings
    }

    /// Forward jumps (offset added to the program counter)
    pub fn is_forward_jump(self) -> bool {
        matches!(
            self,
            Opcode::OntJmp | Opcode::OnfJmp | Opcode::Jmp | Opcode::IffJmp
        )
    }

    /// Backward jumps (offset subtracted from the program counter)
    pub fn is_backward_jump(self) -> bool {
        matches!(self, Opcode::IftUpJmp | Opcode::IffUpJmp)
    }

    /// Whether the first operand indexes the constant pool
    pub fn uses_constant(self) -> bool {
        matches!(
            self,
            Opcode::PushConstant
                | Opcode::GetGlobal
                | Opcode::GetDotted
                | Opcode::PushSelf
                | Opcode::SetGlobal
                | Opcode::Closure
        )
    }

    /// Whether the opcode ends the current frame
    pub fn is_terminator(self) -> bool {
        matches!(self, Opcode::EndCode | Opcode::RetCode | Opcode::TailCall)
    }

    /// Upper-case mnemonic used by the disassembler
    pub fn mnemonic(self) -> &'static str {
        match self {
            Opcode::EndCode => "ENDCODE",
            Opcode::RetCode => "RETCODE",
            Opcode::Call => "CALL",
            Opcode::TailCall => "TAILCALL",
            Opcode::PushNil => "PUSHNIL",
            Opcode::Pop => "POP",
            Opcode::PushNumber => "PUSHNUMBER",
            Opcode::PushNumberNeg => "PUSHNUMBERNEG",
            Opcode::PushConstant => "PUSHCONSTANT",
            Opcode::PushUpValue => "PUSHUPVALUE",
            Opcode::PushLocal => "PUSHLOCAL",
            Opcode::GetGlobal => "GETGLOBAL",
            Opcode::GetTable => "GETTABLE",
            Opcode::GetDotted => "GETDOTTED",
            Opcode::PushSelf => "PUSHSELF",
            Opcode::CreateArray => "CREATEARRAY",
            Opcode::SetLocal => "SETLOCAL",
            Opcode::SetGlobal => "SETGLOBAL",
            Opcode::SetTablePop => "SETTABLEPOP",
            Opcode::SetTable => "SETTABLE",
            Opcode::SetList => "SETLIST",
            Opcode::SetMap => "SETMAP",
            Opcode::NeqOp => "NEQOP",
            Opcode::EqOp => "EQOP",
            Opcode::LtOp => "LTOP",
            Opcode::LeOp => "LEOP",
            Opcode::GtOp => "GTOP",
            Opcode::GeOp => "GEOP",
            Opcode::AddOp => "ADDOP",
            Opcode::SubOp => "SUBOP",
            Opcode::MultOp => "MULTOP",
            Opcode::DivOp => "DIVOP",
            Opcode::PowOp => "POWOP",
            Opcode::ConcOp => "CONCOP",
            Opcode::MinusOp => "MINUSOP",
            Opcode::NotOp => "NOTOP",
            Opcode::OntJmp => "ONTJMP",
            Opcode::OnfJmp => "ONFJMP",
            Opcode::Jmp => "JMP",
            Opcode::IffJmp => "IFFJMP",
            Opcode::IftUpJmp => "IFTUPJMP",
            Opcode::IffUpJmp => "IFFUPJMP",
            Opcode::Closure => "CLOSURE",
            Opcode::SetLine => "SETLINE",
            Opcode::LongArg => "LONGARG",
            Opcode::CheckStack => "CHECKSTACK",
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}
