//! Instruction model
//!
//! Only the opcode classes the alias analysis distinguishes are modelled.
//! Everything else is `Other` and carries its operands for completeness.

use super::ids::{FunctionId, ValueId};
use super::types::Signature;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Position of an instruction inside a module
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InstRef {
    pub function: FunctionId,
    pub block: u32,
    pub index: u32,
}

impl fmt::Display for InstRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:bb{}:{}", self.function, self.block, self.index)
    }
}

/// One step of an address computation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GepStep {
    /// Statically known struct field index
    Field(i64),
    /// Constant byte offset
    Offset(i64),
    /// Index only known at run time
    Dynamic,
}

/// Instruction opcode classes with their typed operands
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InstKind {
    /// Stack allocation; the result is the address of a fresh object
    Alloca,
    Load {
        ptr: ValueId,
    },
    Store {
        value: ValueId,
        ptr: ValueId,
    },
    /// bitcast / ptrtoint / inttoptr / addrspacecast
    Cast {
        operand: ValueId,
    },
    Phi {
        incoming: Vec<ValueId>,
    },
    Select {
        if_true: ValueId,
        if_false: ValueId,
    },
    /// Address computation relative to `base`
    Gep {
        base: ValueId,
        steps: Vec<GepStep>,
    },
    ExtractValue {
        aggregate: ValueId,
        index: i64,
    },
    InsertValue {
        aggregate: ValueId,
        value: ValueId,
        index: i64,
    },
    AtomicRmw {
        ptr: ValueId,
        value: ValueId,
    },
    CmpXchg {
        ptr: ValueId,
        expected: ValueId,
        replacement: ValueId,
    },
    VaArg {
        list: ValueId,
    },
    Call {
        callee: ValueId,
        args: Vec<ValueId>,
        signature: Signature,
    },
    /// Call with an unwind edge; not lowered, rejected by the analysis
    Invoke {
        callee: ValueId,
        args: Vec<ValueId>,
        signature: Signature,
    },
    /// Exception landing pad; rejected by the analysis
    LandingPad,
    Resume {
        value: ValueId,
    },
    Return {
        value: Option<ValueId>,
    },
    Other {
        operands: Vec<ValueId>,
    },
}

impl InstKind {
    /// Short opcode mnemonic used in diagnostics
    pub fn opcode_name(&self) -> &'static str {
        match self {
            InstKind::Alloca => "alloca",
            InstKind::Load { .. } => "load",
            InstKind::Store { .. } => "store",
            InstKind::Cast { .. } => "cast",
            InstKind::Phi { .. } => "phi",
            InstKind::Select { .. } => "select",
            InstKind::Gep { .. } => "getelementptr",
            InstKind::ExtractValue { .. } => "extractvalue",
            InstKind::InsertValue { .. } => "insertvalue",
            InstKind::AtomicRmw { .. } => "atomicrmw",
            InstKind::CmpXchg { .. } => "cmpxchg",
            InstKind::VaArg { .. } => "va_arg",
            InstKind::Call { .. } => "call",
            InstKind::Invoke { .. } => "invoke",
            InstKind::LandingPad => "landingpad",
            InstKind::Resume { .. } => "resume",
            InstKind::Return { .. } => "ret",
            InstKind::Other { .. } => "other",
        }
    }

    /// Whether this is an unlowered exception-dispatch construct
    #[inline]
    pub fn is_exception_dispatch(&self) -> bool {
        matches!(self, InstKind::Invoke { .. } | InstKind::LandingPad)
    }
}

/// An instruction and the SSA value it defines, if any
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instruction {
    pub result: Option<ValueId>,
    pub kind: InstKind,
}

/// Straight-line sequence of instructions
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasicBlock {
    pub label: Option<String>,
    pub instructions: Vec<Instruction>,
}
