//! Program representation consumed by the alias analysis
//!
//! A `Module` owns three handle-addressed tables: values, functions and
//! globals. Instruction results remember where they are defined so the
//! analysis can walk from a value back to its defining instruction.

use super::ids::{FunctionId, GlobalId, ValueId};
use super::instruction::{BasicBlock, InstKind, InstRef, Instruction};
use super::types::{Signature, Type};
use crate::errors::{AliasError, Result};
use serde::{Deserialize, Serialize};

/// Symbol visibility
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Linkage {
    #[default]
    External,
    Internal,
    Private,
}

impl Linkage {
    /// Visible only inside the defining module
    #[inline]
    pub fn is_local(self) -> bool {
        matches!(self, Linkage::Internal | Linkage::Private)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConstantKind {
    Null,
    Undef,
    Int(i64),
}

/// What a value is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueKind {
    Function(FunctionId),
    Global(GlobalId),
    Argument {
        function: FunctionId,
        index: usize,
    },
    Instruction {
        function: FunctionId,
        block: u32,
        index: u32,
    },
    Constant(ConstantKind),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Value {
    pub id: ValueId,
    pub kind: ValueKind,
    pub ty: Type,
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Function {
    pub id: FunctionId,
    pub name: String,
    pub signature: Signature,
    pub linkage: Linkage,
    /// The value naming this function (its address)
    pub value: ValueId,
    pub params: Vec<ValueId>,
    pub blocks: Vec<BasicBlock>,
}

impl Function {
    /// Functions without a body are external declarations
    #[inline]
    pub fn is_declaration(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn instructions(&self) -> impl Iterator<Item = &Instruction> + '_ {
        self.blocks.iter().flat_map(|b| b.instructions.iter())
    }

    /// Instructions paired with their position
    pub fn located_instructions(&self) -> impl Iterator<Item = (InstRef, &Instruction)> + '_ {
        let function = self.id;
        self.blocks.iter().enumerate().flat_map(move |(b, block)| {
            block.instructions.iter().enumerate().map(move |(i, inst)| {
                (
                    InstRef {
                        function,
                        block: b as u32,
                        index: i as u32,
                    },
                    inst,
                )
            })
        })
    }
}

/// Initial content stored into a global, optionally into one of its fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalInit {
    pub field: Option<i64>,
    pub value: ValueId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Global {
    pub id: GlobalId,
    pub name: String,
    pub linkage: Linkage,
    /// The value naming this global (its address)
    pub value: ValueId,
    pub initializers: Vec<GlobalInit>,
}

/// Whole program
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Module {
    pub name: String,
    pub(crate) values: Vec<Value>,
    pub(crate) functions: Vec<Function>,
    pub(crate) globals: Vec<Global>,
}

impl Module {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Load a serialized module
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Table access
    // ═══════════════════════════════════════════════════════════════════════

    #[inline]
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    #[inline]
    pub fn functions(&self) -> &[Function] {
        &self.functions
    }

    #[inline]
    pub fn globals(&self) -> &[Global] {
        &self.globals
    }

    #[inline]
    pub fn value(&self, id: ValueId) -> Option<&Value> {
        self.values.get(id.index())
    }

    #[inline]
    pub fn function(&self, id: FunctionId) -> Option<&Function> {
        self.functions.get(id.index())
    }

    #[inline]
    pub fn global(&self, id: GlobalId) -> Option<&Global> {
        self.globals.get(id.index())
    }

    pub fn function_by_name(&self, name: &str) -> Option<&Function> {
        self.functions.iter().find(|f| f.name == name)
    }

    pub fn global_by_name(&self, name: &str) -> Option<&Global> {
        self.globals.iter().find(|g| g.name == name)
    }

    /// Like `value`, but a dangling handle is an error
    pub fn expect_value(&self, id: ValueId) -> Result<&Value> {
        self.value(id)
            .ok_or_else(|| AliasError::malformed(format!("dangling value handle {}", id)))
    }

    pub fn expect_function(&self, id: FunctionId) -> Result<&Function> {
        self.function(id)
            .ok_or_else(|| AliasError::malformed(format!("dangling function handle {}", id)))
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Value classification
    // ═══════════════════════════════════════════════════════════════════════

    /// The function a value names, if it is syntactically a function
    #[inline]
    pub fn as_function(&self, id: ValueId) -> Option<FunctionId> {
        match self.value(id)?.kind {
            ValueKind::Function(f) => Some(f),
            _ => None,
        }
    }

    #[inline]
    pub fn as_global(&self, id: ValueId) -> Option<GlobalId> {
        match self.value(id)?.kind {
            ValueKind::Global(g) => Some(g),
            _ => None,
        }
    }

    /// Where the instruction defining `id` lives, if `id` is an instruction result
    pub fn defining_location(&self, id: ValueId) -> Option<InstRef> {
        match self.value(id)?.kind {
            ValueKind::Instruction {
                function,
                block,
                index,
            } => Some(InstRef {
                function,
                block,
                index,
            }),
            _ => None,
        }
    }

    pub fn instruction(&self, at: InstRef) -> Option<&Instruction> {
        self.function(at.function)?
            .blocks
            .get(at.block as usize)?
            .instructions
            .get(at.index as usize)
    }

    pub fn defining_instruction(&self, id: ValueId) -> Option<&Instruction> {
        self.instruction(self.defining_location(id)?)
    }

    /// Follow cast chains back to the first non-cast value
    pub fn strip_casts(&self, id: ValueId) -> ValueId {
        let mut current = id;
        // SSA forbids cast cycles; the bound keeps malformed input finite
        for _ in 0..self.values.len() {
            match self.defining_instruction(current).map(|i| &i.kind) {
                Some(InstKind::Cast { operand }) => current = *operand,
                _ => break,
            }
        }
        current
    }

    pub fn is_alloca(&self, id: ValueId) -> bool {
        matches!(
            self.defining_instruction(id).map(|i| &i.kind),
            Some(InstKind::Alloca)
        )
    }

    /// Printable name of a value
    pub fn display_name(&self, id: ValueId) -> String {
        match self.value(id) {
            Some(Value {
                name: Some(name), ..
            }) => name.clone(),
            Some(Value {
                kind: ValueKind::Constant(c),
                ..
            }) => match c {
                ConstantKind::Null => "null".to_string(),
                ConstantKind::Undef => "undef".to_string(),
                ConstantKind::Int(v) => v.to_string(),
            },
            _ => id.to_string(),
        }
    }

    /// Name of the function whose body defines `id`, or `<global>`
    pub fn owner_name(&self, id: ValueId) -> &str {
        let owner = match self.value(id).map(|v| v.kind) {
            Some(ValueKind::Argument { function, .. })
            | Some(ValueKind::Instruction { function, .. }) => self.function(function),
            _ => None,
        };
        owner.map(|f| f.name.as_str()).unwrap_or("<global>")
    }
}
