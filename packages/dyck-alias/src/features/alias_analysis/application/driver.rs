//! Analysis driver
//!
//! Translates a module into the alias graph and runs the inter-procedural
//! fixpoint:
//!
//! ```text
//! translate globals and every function body
//! bind every direct call (deferred, so callee order is irrelevant)
//! repeat:
//!     unified  = graph.unify()
//!     resolved = resolve pointer calls against the current classes
//! until !(unified || resolved)
//! ```
//!
//! Both halves only grow the analysis facts (classes merge, callee sets
//! grow), so the loop terminates.

use crate::config::{AliasConfig, SpawnSignature, Validatable};
use crate::errors::{AliasError, Result};
use crate::features::alias_analysis::domain::{
    CallGraph, CallGraphNode, CallId, CallKind, CallOrigin, EdgeLabel, FunctionTypeIndex, LabelId,
    NewCall, SignatureKey, VertexId,
};
use crate::features::alias_analysis::infrastructure::DyckGraph;
use crate::shared::models::{
    Function, FunctionId, GepStep, InstKind, InstRef, Instruction, Module, Signature, ValueId,
    ValueKind,
};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{debug, warn};

/// Driver counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixpointStats {
    pub functions_translated: usize,
    pub instructions_translated: usize,
    /// Argument/return bindings performed (direct and resolved)
    pub bindings: usize,
    pub rounds: usize,
    pub resolved_callees: usize,
    pub skipped_spawns: usize,
}

/// Everything the driver hands over to the query façade
pub(crate) struct DriverOutput {
    pub graph: DyckGraph,
    pub call_graph: CallGraph,
    pub types: FunctionTypeIndex,
    pub stats: FixpointStats,
}

/// Builds the alias graph and call graph for one module
///
/// [`AliasAnalysis`](super::AliasAnalysis) runs the driver to completion;
/// use the driver directly to observe individual fixpoint rounds.
pub struct AliasDriver<'m> {
    module: &'m Module,
    config: AliasConfig,
    graph: DyckGraph,
    call_graph: CallGraph,
    types: FunctionTypeIndex,
    /// Functions each pointer call may reach by signature; spawn calls
    /// have no entry
    reachable: FxHashMap<CallId, BTreeSet<FunctionId>>,
    exception_slot: Option<VertexId>,
    translated: bool,
    converged: bool,
    stats: FixpointStats,
}

impl<'m> AliasDriver<'m> {
    pub fn new(module: &'m Module, config: AliasConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            module,
            config,
            graph: DyckGraph::new(),
            call_graph: CallGraph::new(),
            types: FunctionTypeIndex::build(module),
            reachable: FxHashMap::default(),
            exception_slot: None,
            translated: false,
            converged: false,
            stats: FixpointStats::default(),
        })
    }

    #[inline]
    pub fn module(&self) -> &'m Module {
        self.module
    }

    #[inline]
    pub fn config(&self) -> &AliasConfig {
        &self.config
    }

    #[inline]
    pub fn graph(&self) -> &DyckGraph {
        &self.graph
    }

    #[inline]
    pub fn call_graph(&self) -> &CallGraph {
        &self.call_graph
    }

    #[inline]
    pub fn stats(&self) -> &FixpointStats {
        &self.stats
    }

    #[inline]
    pub fn is_converged(&self) -> bool {
        self.converged
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Phases
    // ═══════════════════════════════════════════════════════════════════════

    /// Intra-procedural construction plus direct-call binding; idempotent
    pub fn translate(&mut self) -> Result<()> {
        if self.translated {
            return Ok(());
        }
        let module = self.module;

        // reject before touching the graph so a failure leaves nothing half-built
        for function in module.functions() {
            if let Some(inst) = function.instructions().find(|i| i.kind.is_exception_dispatch()) {
                return Err(AliasError::unsupported(
                    function.name.as_str(),
                    inst.kind.opcode_name(),
                ));
            }
        }

        for function in module.functions() {
            self.bind(function.value)?;
            for &param in &function.params {
                self.bind(param)?;
            }
            self.call_graph.node_or_insert(function.id, &function.params);
        }
        self.translate_globals()?;
        for function in module.functions().iter().filter(|f| !f.is_declaration()) {
            self.translate_function(function)?;
        }

        let direct: Vec<(CallId, FunctionId)> = self
            .call_graph
            .calls()
            .iter()
            .filter_map(|call| call.callee().map(|callee| (call.id, callee)))
            .collect();
        for (id, callee) in direct {
            self.bind_call(id, callee)?;
        }

        self.translated = true;
        debug!(
            functions = self.stats.functions_translated,
            instructions = self.stats.instructions_translated,
            vertices = self.graph.vertex_count(),
            calls = self.call_graph.calls().len(),
            "translated module"
        );
        Ok(())
    }

    /// One fixpoint round; returns whether anything changed
    pub fn round(&mut self) -> Result<bool> {
        self.translate()?;
        self.stats.rounds += 1;

        let unified = self.graph.unify();
        let resolved = self.resolve_pointer_calls()?;
        debug!(
            round = self.stats.rounds,
            unified,
            resolved,
            classes = self.graph.live_count(),
            "fixpoint round"
        );

        self.converged = !(unified || resolved);
        Ok(!self.converged)
    }

    /// Rounds until nothing changes
    pub fn run(&mut self) -> Result<()> {
        while !self.converged {
            self.round()?;
        }
        Ok(())
    }

    pub(crate) fn finish(mut self) -> Result<(AliasConfig, DriverOutput)> {
        self.run()?;
        Ok((
            self.config,
            DriverOutput {
                graph: self.graph,
                call_graph: self.call_graph,
                types: self.types,
                stats: self.stats,
            },
        ))
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Vertex helpers
    // ═══════════════════════════════════════════════════════════════════════

    fn name_of(&self, value: ValueId) -> Option<String> {
        self.config
            .record_vertex_names
            .then(|| self.module.display_name(value))
    }

    /// Vertex of any value
    fn bind(&mut self, value: ValueId) -> Result<VertexId> {
        if let Some(vertex) = self.graph.vertex_of(value) {
            return Ok(vertex);
        }
        self.module.expect_value(value)?;
        let name = self.name_of(value);
        Ok(self.graph.retrieve(Some(value), name.as_deref()).0)
    }

    /// Vertex of an operand; constants do not denote locations
    fn operand(&mut self, value: ValueId) -> Result<Option<VertexId>> {
        let kind = self.module.expect_value(value)?.kind;
        if matches!(kind, ValueKind::Constant(_)) {
            return Ok(None);
        }
        self.bind(value).map(Some)
    }

    fn alias(&mut self, a: ValueId, b: ValueId) -> Result<()> {
        if let (Some(x), Some(y)) = (self.operand(a)?, self.operand(b)?) {
            self.graph.make_alias(x, y);
        }
        Ok(())
    }

    fn alias_result(&mut self, result: Option<VertexId>, other: ValueId) -> Result<()> {
        if let (Some(r), Some(o)) = (result, self.operand(other)?) {
            self.graph.make_alias(r, o);
        }
        Ok(())
    }

    /// `*ptr = value`, also used for loads: both are `ptr -*-> value`
    fn points_to(&mut self, ptr: ValueId, value: Option<VertexId>) -> Result<()> {
        if let (Some(p), Some(v)) = (self.operand(ptr)?, value) {
            self.graph.add_edge(p, v, LabelId::DEREF);
        }
        Ok(())
    }

    fn store(&mut self, ptr: ValueId, value: ValueId) -> Result<()> {
        let value = self.operand(value)?;
        self.points_to(ptr, value)
    }

    /// Fresh object `o` with `address -*-> o`
    fn allocate(&mut self, address: VertexId, owner: ValueId) {
        let name = self.name_of(owner).map(|n| format!("{}.obj", n));
        let object = self.graph.fresh(name.as_deref());
        self.graph.add_edge(address, object, LabelId::DEREF);
    }

    fn node_mut(&mut self, function: FunctionId) -> Result<&mut CallGraphNode> {
        self.call_graph
            .node_mut(function)
            .ok_or_else(|| AliasError::malformed(format!("no call graph node for {}", function)))
    }

    /// The vertex standing for every variadic argument of `function`
    fn vararg_vertex(&mut self, function: FunctionId) -> Result<VertexId> {
        if let Some(&existing) = self.call_graph.node(function).and_then(|n| n.varargs.first()) {
            return Ok(self.graph.find(existing));
        }
        let module = self.module;
        let name = self.config.record_vertex_names.then(|| {
            let owner = module.expect_function(function).map_or("?", |f| f.name.as_str());
            format!("{}.varargs", owner)
        });
        let vertex = self.graph.fresh(name.as_deref());
        self.node_mut(function)?.varargs.push(vertex);
        Ok(vertex)
    }

    fn exception_slot(&mut self) -> VertexId {
        match self.exception_slot {
            Some(slot) => self.graph.find(slot),
            None => {
                let name = self.config.record_vertex_names.then_some("exception");
                let slot = self.graph.fresh(name);
                self.exception_slot = Some(slot);
                slot
            }
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Intra-procedural construction
    // ═══════════════════════════════════════════════════════════════════════

    fn translate_globals(&mut self) -> Result<()> {
        let module = self.module;
        for global in module.globals() {
            let address = self.bind(global.value)?;
            self.allocate(address, global.value);

            for init in &global.initializers {
                let Some(content) = self.operand(init.value)? else {
                    continue;
                };
                let slot = match init.field {
                    Some(index) => {
                        let label = self.graph.label(EdgeLabel::FieldIndex(index));
                        self.graph.target_or_insert(address, label)
                    }
                    None => address,
                };
                self.graph.add_edge(slot, content, LabelId::DEREF);
            }
        }
        Ok(())
    }

    fn translate_function(&mut self, function: &'m Function) -> Result<()> {
        for (site, inst) in function.located_instructions() {
            self.translate_instruction(function, site, inst)?;
            self.stats.instructions_translated += 1;
        }
        self.stats.functions_translated += 1;
        Ok(())
    }

    fn translate_instruction(
        &mut self,
        function: &'m Function,
        site: InstRef,
        inst: &'m Instruction,
    ) -> Result<()> {
        let result = match inst.result {
            Some(value) => Some(self.bind(value)?),
            None => None,
        };

        match &inst.kind {
            InstKind::Alloca => {
                if let (Some(address), Some(owner)) = (result, inst.result) {
                    self.allocate(address, owner);
                }
            }
            InstKind::Load { ptr } => self.points_to(*ptr, result)?,
            InstKind::Store { value, ptr } => self.store(*ptr, *value)?,
            InstKind::Cast { operand } => self.alias_result(result, *operand)?,
            InstKind::Phi { incoming } => {
                for &value in incoming {
                    self.alias_result(result, value)?;
                }
            }
            InstKind::Select { if_true, if_false } => {
                self.alias_result(result, *if_true)?;
                self.alias_result(result, *if_false)?;
            }
            InstKind::Gep { base, steps } => self.translate_gep(result, *base, steps)?,
            InstKind::ExtractValue { aggregate, index } => {
                if let (Some(agg), Some(r)) = (self.operand(*aggregate)?, result) {
                    let label = self.graph.label(EdgeLabel::FieldIndex(*index));
                    self.graph.add_edge(agg, r, label);
                }
            }
            InstKind::InsertValue {
                aggregate,
                value,
                index,
            } => {
                self.alias_result(result, *aggregate)?;
                if let (Some(r), Some(v)) = (result, self.operand(*value)?) {
                    let label = self.graph.label(EdgeLabel::FieldIndex(*index));
                    self.graph.add_edge(r, v, label);
                }
            }
            InstKind::AtomicRmw { ptr, value } => {
                self.points_to(*ptr, result)?;
                self.store(*ptr, *value)?;
            }
            InstKind::CmpXchg {
                ptr,
                expected,
                replacement,
            } => {
                // the result is `{ old, success }`; field 0 is the loaded value
                if let (Some(p), Some(r)) = (self.operand(*ptr)?, result) {
                    let old = self.graph.target_or_insert(p, LabelId::DEREF);
                    let label = self.graph.label(EdgeLabel::FieldIndex(0));
                    self.graph.add_edge(r, old, label);
                }
                self.store(*ptr, *expected)?;
                self.store(*ptr, *replacement)?;
            }
            InstKind::VaArg { list } => {
                self.operand(*list)?;
                if let Some(r) = result {
                    let varargs = self.vararg_vertex(function.id)?;
                    self.graph.make_alias(r, varargs);
                }
            }
            InstKind::Call {
                callee,
                args,
                signature,
            } => self.translate_call(function, site, inst.result, *callee, args, signature)?,
            // rejected by `translate` before any body is visited
            InstKind::Invoke { .. } | InstKind::LandingPad => {}
            InstKind::Resume { value } => {
                self.node_mut(function.id)?.resumes.insert(*value);
                if let Some(v) = self.operand(*value)? {
                    let slot = self.exception_slot();
                    self.graph.make_alias(v, slot);
                }
            }
            InstKind::Return { value: Some(value) } => {
                if self.operand(*value)?.is_some() {
                    self.node_mut(function.id)?.returns.insert(*value);
                }
            }
            InstKind::Return { value: None } => {}
            InstKind::Other { operands } => {
                for &operand in operands {
                    self.operand(operand)?;
                }
            }
        }
        Ok(())
    }

    /// One labeled edge per step; intermediate addresses get their own vertex
    fn translate_gep(
        &mut self,
        result: Option<VertexId>,
        base: ValueId,
        steps: &[GepStep],
    ) -> Result<()> {
        let (Some(result), Some(mut current)) = (result, self.operand(base)?) else {
            return Ok(());
        };
        let Some((last, leading)) = steps.split_last() else {
            self.graph.make_alias(result, current);
            return Ok(());
        };

        for step in leading {
            let label = self.gep_label(*step);
            current = self.graph.target_or_insert(current, label);
        }
        let label = self.gep_label(*last);
        self.graph.add_edge(current, result, label);
        Ok(())
    }

    fn gep_label(&mut self, step: GepStep) -> LabelId {
        let label = match step {
            GepStep::Field(index) => EdgeLabel::FieldIndex(index),
            GepStep::Offset(bytes) => EdgeLabel::ByteOffset(bytes),
            // every run-time index shares one bucket
            GepStep::Dynamic => EdgeLabel::ByteOffset(0),
        };
        self.graph.label(label)
    }

    fn translate_call(
        &mut self,
        caller: &'m Function,
        site: InstRef,
        result: Option<ValueId>,
        callee: ValueId,
        args: &[ValueId],
        signature: &Signature,
    ) -> Result<()> {
        let module = self.module;
        self.operand(callee)?;
        for &arg in args {
            self.operand(arg)?;
        }

        let stripped = module.as_function(module.strip_casts(callee));
        let kind = match module.as_function(callee) {
            Some(function) => CallKind::Common { callee: function },
            None => CallKind::Pointer {
                may_callees: BTreeSet::new(),
                must_alias: stripped.is_some(),
            },
        };
        let pointer = matches!(kind, CallKind::Pointer { .. });
        let id = self.call_graph.add_call(NewCall {
            site,
            caller: caller.id,
            called_value: callee,
            args: args.to_vec(),
            result,
            origin: CallOrigin::Direct,
            kind,
        });
        if pointer {
            let reachable = self.types.reachable_by(&SignatureKey::of(signature));
            self.reachable.insert(id, reachable);
        }

        if let Some(target) = stripped {
            let name = &module.expect_function(target)?.name;
            if let Some(spawn) = self.config.spawn_signature(name).cloned() {
                self.translate_spawn(caller, site, args, &spawn);
            }
        }
        Ok(())
    }

    /// `spawn(.., routine, payload)` becomes a synthetic call `routine(payload)`
    fn translate_spawn(
        &mut self,
        caller: &Function,
        site: InstRef,
        args: &[ValueId],
        spawn: &SpawnSignature,
    ) {
        let module = self.module;
        let routine = args.get(spawn.routine_arg);
        let payload = args.get(spawn.payload_arg);
        let (Some(&routine), Some(&payload)) = (routine, payload) else {
            warn!(
                function = %caller.name,
                site = %site,
                spawn = %spawn.name,
                args = args.len(),
                "spawn call has too few arguments, skipped"
            );
            self.stats.skipped_spawns += 1;
            return;
        };

        let kind = match module.as_function(routine) {
            Some(function) => CallKind::Common { callee: function },
            None => CallKind::Pointer {
                may_callees: BTreeSet::new(),
                must_alias: module.as_function(module.strip_casts(routine)).is_some(),
            },
        };
        self.call_graph.add_call(NewCall {
            site,
            caller: caller.id,
            called_value: routine,
            args: vec![payload],
            result: None,
            origin: CallOrigin::Spawn,
            kind,
        });
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Inter-procedural construction
    // ═══════════════════════════════════════════════════════════════════════

    /// Bind a call's actuals to `callee`'s formals and its result to
    /// `callee`'s returns
    ///
    /// Declarations keep their formals unbound; only their external model
    /// applies.
    fn bind_call(&mut self, id: CallId, callee: FunctionId) -> Result<()> {
        let module = self.module;
        let function = module.expect_function(callee)?;
        let call = self
            .call_graph
            .call(id)
            .ok_or_else(|| AliasError::malformed(format!("dangling call handle {}", id)))?;
        let (args, result, origin) = (call.args.clone(), call.result, call.origin);

        if origin == CallOrigin::Direct {
            self.apply_external_model(function, &args, result)?;
        }
        if function.is_declaration() {
            return Ok(());
        }

        for (index, &arg) in args.iter().enumerate() {
            match function.params.get(index) {
                Some(&param) => self.alias(arg, param)?,
                None if function.signature.variadic => {
                    if let Some(actual) = self.operand(arg)? {
                        let varargs = self.vararg_vertex(callee)?;
                        self.graph.make_alias(actual, varargs);
                    }
                }
                None => break,
            }
        }

        if let Some(result) = result {
            let returns: Vec<ValueId> = self
                .call_graph
                .node(callee)
                .map(|node| node.returns.iter().copied().collect())
                .unwrap_or_default();
            for ret in returns {
                self.alias(result, ret)?;
            }
        }
        self.stats.bindings += 1;
        Ok(())
    }

    /// Allocator and memory-copy semantics of bodiless library functions
    fn apply_external_model(
        &mut self,
        function: &Function,
        args: &[ValueId],
        result: Option<ValueId>,
    ) -> Result<()> {
        if self.config.is_allocator(&function.name) {
            if let Some(result) = result {
                let address = self.bind(result)?;
                self.allocate(address, result);
            }
        } else if self.config.is_copy_function(&function.name) {
            let (Some(&dst), Some(&src)) = (args.first(), args.get(1)) else {
                return Ok(());
            };
            let content = self.graph.fresh(None);
            if let Some(d) = self.operand(dst)? {
                self.graph.add_edge(d, content, LabelId::DEREF);
            }
            if let Some(s) = self.operand(src)? {
                self.graph.add_edge(s, content, LabelId::DEREF);
            }
            if let Some(result) = result {
                self.alias(result, dst)?;
            }
        }
        Ok(())
    }

    /// A spawned routine only needs somewhere to receive the payload
    fn takes_payload(&self, function: FunctionId) -> bool {
        self.module
            .function(function)
            .is_some_and(|f| !f.params.is_empty() || f.signature.variadic)
    }

    /// Extend every pointer call with the functions of its called value's
    /// class that its signature clusters admit; returns whether any callee
    /// was new
    fn resolve_pointer_calls(&mut self) -> Result<bool> {
        let module = self.module;
        let mut changed = false;

        for id in self.call_graph.pointer_call_ids() {
            let Some(call) = self.call_graph.call(id) else {
                continue;
            };
            let called = call.called_value;
            let must_alias = matches!(call.kind, CallKind::Pointer { must_alias: true, .. });

            let reachable = self.reachable.get(&id);
            let mut candidates: BTreeSet<FunctionId> = match self.graph.vertex_of(called) {
                Some(class) => self
                    .graph
                    .values(class)
                    .iter()
                    .filter_map(|&value| module.as_function(value))
                    .filter(|function| match reachable {
                        Some(cluster) => cluster.contains(function),
                        None => self.takes_payload(*function),
                    })
                    .collect(),
                None => BTreeSet::new(),
            };
            if must_alias {
                if let Some(function) = module.as_function(module.strip_casts(called)) {
                    candidates.insert(function);
                }
            }

            let newly = match self.call_graph.call_mut(id) {
                Some(call) => call.add_callees(candidates),
                None => Vec::new(),
            };
            for callee in newly {
                debug!(
                    call = %id,
                    callee = %module.expect_function(callee)?.name,
                    "resolved indirect callee"
                );
                self.bind_call(id, callee)?;
                self.stats.resolved_callees += 1;
                changed = true;
            }
        }
        Ok(changed)
    }
}
