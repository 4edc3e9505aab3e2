//! Builders for constructing modules in code
//!
//! ```
//! use dyck_alias::shared::models::{ModuleBuilder, Signature, Type};
//!
//! let mut mb = ModuleBuilder::new("demo");
//! let main = mb.declare_function("main", Signature::new(vec![], Type::Void));
//! {
//!     let mut body = mb.body(main);
//!     let x = body.alloca("x");
//!     let p = body.alloca("p");
//!     body.store(x, p);
//!     body.ret(None);
//! }
//! let module = mb.build();
//! assert_eq!(module.functions().len(), 1);
//! ```

use super::ids::{FunctionId, GlobalId, ValueId};
use super::instruction::{BasicBlock, GepStep, InstKind, Instruction};
use super::module::{ConstantKind, Function, Global, GlobalInit, Linkage, Module, Value, ValueKind};
use super::types::{Signature, Type};

/// Incrementally builds a [`Module`]
#[derive(Debug, Default)]
pub struct ModuleBuilder {
    module: Module,
}

impl ModuleBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            module: Module::new(name),
        }
    }

    fn push_value(&mut self, kind: ValueKind, ty: Type, name: Option<String>) -> ValueId {
        let id = ValueId::from_index(self.module.values.len());
        self.module.values.push(Value { id, kind, ty, name });
        id
    }

    /// Declare a function (body may be added later with [`Self::body`])
    pub fn declare_function(&mut self, name: &str, signature: Signature) -> FunctionId {
        let id = FunctionId::from_index(self.module.functions.len());
        let value = self.push_value(
            ValueKind::Function(id),
            Type::Function(Box::new(signature.clone())),
            Some(name.to_string()),
        );
        let params = signature
            .params
            .iter()
            .enumerate()
            .map(|(index, ty)| {
                self.push_value(
                    ValueKind::Argument {
                        function: id,
                        index,
                    },
                    ty.clone(),
                    Some(format!("{}.arg{}", name, index)),
                )
            })
            .collect();
        self.module.functions.push(Function {
            id,
            name: name.to_string(),
            signature,
            linkage: Linkage::External,
            value,
            params,
            blocks: Vec::new(),
        });
        id
    }

    pub fn set_linkage(&mut self, function: FunctionId, linkage: Linkage) {
        if let Some(f) = self.module.functions.get_mut(function.index()) {
            f.linkage = linkage;
        }
    }

    /// Add a global variable; returns the value naming its address
    pub fn add_global(&mut self, name: &str, linkage: Linkage) -> ValueId {
        let id = GlobalId::from_index(self.module.globals.len());
        let value = self.push_value(ValueKind::Global(id), Type::Pointer, Some(name.to_string()));
        self.module.globals.push(Global {
            id,
            name: name.to_string(),
            linkage,
            value,
            initializers: Vec::new(),
        });
        value
    }

    /// Record `value` as part of the initial content of `global`
    pub fn global_initializer(&mut self, global: ValueId, field: Option<i64>, value: ValueId) {
        if let Some(gid) = self.module.as_global(global) {
            self.module.globals[gid.index()]
                .initializers
                .push(GlobalInit { field, value });
        }
    }

    pub fn constant(&mut self, kind: ConstantKind, ty: Type) -> ValueId {
        self.push_value(ValueKind::Constant(kind), ty, None)
    }

    pub fn null(&mut self) -> ValueId {
        self.constant(ConstantKind::Null, Type::Pointer)
    }

    pub fn function_value(&self, function: FunctionId) -> ValueId {
        self.module.functions[function.index()].value
    }

    pub fn param(&self, function: FunctionId, index: usize) -> ValueId {
        self.module.functions[function.index()].params[index]
    }

    /// Start (or continue) the body of `function`
    pub fn body(&mut self, function: FunctionId) -> FunctionBuilder<'_> {
        let f = &mut self.module.functions[function.index()];
        if f.blocks.is_empty() {
            f.blocks.push(BasicBlock::default());
        }
        let block = f.blocks.len() - 1;
        FunctionBuilder {
            builder: self,
            function,
            block,
        }
    }

    pub fn build(self) -> Module {
        self.module
    }
}

/// Appends instructions to one function
pub struct FunctionBuilder<'a> {
    builder: &'a mut ModuleBuilder,
    function: FunctionId,
    block: usize,
}

impl<'a> FunctionBuilder<'a> {
    /// Allocate the SSA value for the instruction about to be emitted
    fn result_value(&mut self, name: &str, ty: Type) -> ValueId {
        let index = self.builder.module.functions[self.function.index()].blocks[self.block]
            .instructions
            .len() as u32;
        self.builder.push_value(
            ValueKind::Instruction {
                function: self.function,
                block: self.block as u32,
                index,
            },
            ty,
            Some(name.to_string()),
        )
    }

    fn emit(&mut self, result: Option<ValueId>, kind: InstKind) {
        self.builder.module.functions[self.function.index()].blocks[self.block]
            .instructions
            .push(Instruction { result, kind });
    }

    fn push_value(&mut self, name: &str, ty: Type, kind: InstKind) -> ValueId {
        let id = self.result_value(name, ty);
        self.emit(Some(id), kind);
        id
    }

    fn call_result(&mut self, name: &str, signature: &Signature) -> Option<ValueId> {
        if signature.ret.is_void() {
            None
        } else {
            Some(self.result_value(name, signature.ret.clone()))
        }
    }

    /// Open a new basic block; subsequent instructions go there
    pub fn new_block(&mut self, label: &str) {
        let f = &mut self.builder.module.functions[self.function.index()];
        f.blocks.push(BasicBlock {
            label: Some(label.to_string()),
            instructions: Vec::new(),
        });
        self.block = f.blocks.len() - 1;
    }

    pub fn param(&self, index: usize) -> ValueId {
        self.builder.param(self.function, index)
    }

    pub fn alloca(&mut self, name: &str) -> ValueId {
        self.push_value(name, Type::Pointer, InstKind::Alloca)
    }

    pub fn load(&mut self, name: &str, ptr: ValueId, ty: Type) -> ValueId {
        self.push_value(name, ty, InstKind::Load { ptr })
    }

    pub fn store(&mut self, value: ValueId, ptr: ValueId) {
        self.emit(None, InstKind::Store { value, ptr });
    }

    pub fn cast(&mut self, name: &str, operand: ValueId, ty: Type) -> ValueId {
        self.push_value(name, ty, InstKind::Cast { operand })
    }

    pub fn phi(&mut self, name: &str, incoming: &[ValueId], ty: Type) -> ValueId {
        self.push_value(
            name,
            ty,
            InstKind::Phi {
                incoming: incoming.to_vec(),
            },
        )
    }

    pub fn select(&mut self, name: &str, if_true: ValueId, if_false: ValueId, ty: Type) -> ValueId {
        self.push_value(name, ty, InstKind::Select { if_true, if_false })
    }

    pub fn gep(&mut self, name: &str, base: ValueId, steps: &[GepStep]) -> ValueId {
        self.push_value(
            name,
            Type::Pointer,
            InstKind::Gep {
                base,
                steps: steps.to_vec(),
            },
        )
    }

    /// `&base->field`
    pub fn field(&mut self, name: &str, base: ValueId, field: i64) -> ValueId {
        self.gep(name, base, &[GepStep::Field(field)])
    }

    /// `(char *)base + offset`
    pub fn offset(&mut self, name: &str, base: ValueId, offset: i64) -> ValueId {
        self.gep(name, base, &[GepStep::Offset(offset)])
    }

    /// `&base[i]` with a run-time `i`
    pub fn dynamic_index(&mut self, name: &str, base: ValueId) -> ValueId {
        self.gep(name, base, &[GepStep::Dynamic])
    }

    pub fn extract_value(
        &mut self,
        name: &str,
        aggregate: ValueId,
        index: i64,
        ty: Type,
    ) -> ValueId {
        self.push_value(name, ty, InstKind::ExtractValue { aggregate, index })
    }

    pub fn insert_value(
        &mut self,
        name: &str,
        aggregate: ValueId,
        value: ValueId,
        index: i64,
        ty: Type,
    ) -> ValueId {
        self.push_value(
            name,
            ty,
            InstKind::InsertValue {
                aggregate,
                value,
                index,
            },
        )
    }

    pub fn atomic_rmw(&mut self, name: &str, ptr: ValueId, value: ValueId, ty: Type) -> ValueId {
        self.push_value(name, ty, InstKind::AtomicRmw { ptr, value })
    }

    pub fn cmpxchg(
        &mut self,
        name: &str,
        ptr: ValueId,
        expected: ValueId,
        replacement: ValueId,
        ty: Type,
    ) -> ValueId {
        self.push_value(
            name,
            ty,
            InstKind::CmpXchg {
                ptr,
                expected,
                replacement,
            },
        )
    }

    pub fn va_arg(&mut self, name: &str, list: ValueId, ty: Type) -> ValueId {
        self.push_value(name, ty, InstKind::VaArg { list })
    }

    /// Emit a call; returns the result value unless the signature returns void
    pub fn call(
        &mut self,
        name: &str,
        callee: ValueId,
        args: &[ValueId],
        signature: Signature,
    ) -> Option<ValueId> {
        let result = self.call_result(name, &signature);
        self.emit(
            result,
            InstKind::Call {
                callee,
                args: args.to_vec(),
                signature,
            },
        );
        result
    }

    pub fn invoke(
        &mut self,
        name: &str,
        callee: ValueId,
        args: &[ValueId],
        signature: Signature,
    ) -> Option<ValueId> {
        let result = self.call_result(name, &signature);
        self.emit(
            result,
            InstKind::Invoke {
                callee,
                args: args.to_vec(),
                signature,
            },
        );
        result
    }

    pub fn landing_pad(&mut self, name: &str) -> ValueId {
        self.push_value(name, Type::Pointer, InstKind::LandingPad)
    }

    pub fn resume(&mut self, value: ValueId) {
        self.emit(None, InstKind::Resume { value });
    }

    pub fn ret(&mut self, value: Option<ValueId>) {
        self.emit(None, InstKind::Return { value });
    }

    pub fn other(&mut self, name: &str, operands: &[ValueId], ty: Type) -> ValueId {
        self.push_value(
            name,
            ty,
            InstKind::Other {
                operands: operands.to_vec(),
            },
        )
    }
}
