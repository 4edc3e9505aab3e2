//! Host program representation
//!
//! Minimal typed IR the alias analysis reads: functions with basic blocks of
//! instructions, globals with linkage and initializers, and handle-addressed
//! values. Front ends lower their own IR into this model (or load it from
//! JSON) before running the analysis.

mod builder;
mod ids;
mod instruction;
mod module;
mod types;

pub use builder::{FunctionBuilder, ModuleBuilder};
pub use ids::{FunctionId, GlobalId, ValueId};
pub use instruction::{BasicBlock, GepStep, InstKind, InstRef, Instruction};
pub use module::{
    ConstantKind, Function, Global, GlobalInit, Linkage, Module, Value, ValueKind,
};
pub use types::{Signature, Type};
