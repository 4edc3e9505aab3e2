//! Alias analysis session and query façade
//!
//! # Usage
//! ```
//! use dyck_alias::{AliasAnalysis, ModuleBuilder, Signature, Type};
//!
//! let mut mb = ModuleBuilder::new("demo");
//! let main = mb.declare_function("main", Signature::new(vec![], Type::Void));
//! let (x, p, q) = {
//!     let mut b = mb.body(main);
//!     let x = b.alloca("x");
//!     let p = b.alloca("p");
//!     b.store(x, p);
//!     let q = b.load("q", p, Type::ptr());
//!     b.ret(None);
//!     (x, p, q)
//! };
//! let module = mb.build();
//!
//! let analysis = AliasAnalysis::new(&module).unwrap();
//! assert!(analysis.may_alias(x, q).unwrap());
//! assert!(analysis.points_to(p).unwrap().unwrap().contains(&x));
//! ```

use super::driver::{AliasDriver, FixpointStats};
use crate::config::AliasConfig;
use crate::errors::{AliasError, Result};
use crate::features::alias_analysis::domain::{
    Call, CallGraph, CallGraphStats, CallOrigin, ClassId, FunctionTypeIndex, VertexId,
};
use crate::features::alias_analysis::infrastructure::{DyckGraph, UnifyStats};
use crate::shared::models::{FunctionId, InstKind, InstRef, Module, ValueId};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::time::Instant;
use tracing::info;

/// Session statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisStats {
    pub module: String,
    pub functions: usize,
    pub globals: usize,
    pub vertices: usize,
    /// Live equivalence classes
    pub classes: usize,
    pub edges: usize,
    pub labels: usize,
    pub fixpoint: FixpointStats,
    pub unify: UnifyStats,
    pub call_graph: CallGraphStats,
    pub duration_ms: f64,
}

impl AnalysisStats {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Finished analysis of one module
///
/// Owns the alias graph and the call graph; queries never change analysis
/// facts, only the allocation-site memo.
pub struct AliasAnalysis<'m> {
    module: &'m Module,
    config: AliasConfig,
    graph: DyckGraph,
    call_graph: CallGraph,
    types: FunctionTypeIndex,
    stats: AnalysisStats,
    allocation_cache: FxHashMap<ClassId, Vec<ValueId>>,
}

impl<'m> AliasAnalysis<'m> {
    /// Analyze `module` with the default configuration
    pub fn new(module: &'m Module) -> Result<Self> {
        Self::with_config(module, AliasConfig::default())
    }

    pub fn with_config(module: &'m Module, config: AliasConfig) -> Result<Self> {
        Self::from_driver(AliasDriver::new(module, config)?)
    }

    /// Run a (possibly partially advanced) driver to its fixpoint
    pub fn from_driver(driver: AliasDriver<'m>) -> Result<Self> {
        let start = Instant::now();
        let module = driver.module();
        info!(
            module = %module.name,
            functions = module.functions().len(),
            globals = module.globals().len(),
            "alias analysis started"
        );

        let (config, output) = driver.finish()?;
        let stats = AnalysisStats {
            module: module.name.clone(),
            functions: module.functions().len(),
            globals: module.globals().len(),
            vertices: output.graph.vertex_count(),
            classes: output.graph.live_count(),
            edges: output.graph.edges().count(),
            labels: output.graph.labels().len(),
            fixpoint: output.stats,
            unify: output.graph.stats(),
            call_graph: output.call_graph.stats(),
            duration_ms: start.elapsed().as_secs_f64() * 1000.0,
        };
        info!(
            module = %stats.module,
            classes = stats.classes,
            rounds = stats.fixpoint.rounds,
            merges = stats.unify.merges,
            pointer_calls = stats.call_graph.pointer_calls,
            resolved = stats.call_graph.resolved_targets,
            duration_ms = stats.duration_ms,
            "alias analysis finished"
        );

        Ok(Self {
            module,
            config,
            graph: output.graph,
            call_graph: output.call_graph,
            types: output.types,
            stats,
            allocation_cache: FxHashMap::default(),
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
    pub fn function_types(&self) -> &FunctionTypeIndex {
        &self.types
    }

    #[inline]
    pub fn stats(&self) -> &AnalysisStats {
        &self.stats
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Classes
    // ═══════════════════════════════════════════════════════════════════════

    /// Equivalence class of a registered value
    pub fn class_of(&self, value: ValueId) -> Result<ClassId> {
        self.graph
            .vertex_of(value)
            .ok_or_else(|| AliasError::not_found(format!("value {}", value)))
    }

    /// Members of a class; absorbed handles resolve to their representative
    pub fn class_values(&self, class: ClassId) -> Result<&BTreeSet<ValueId>> {
        if class.index() >= self.graph.vertex_count() {
            return Err(AliasError::not_found(format!("class {}", class)));
        }
        Ok(self.graph.values(class))
    }

    /// Every live class in ascending id order
    pub fn classes(&self) -> impl Iterator<Item = ClassId> + '_ {
        self.graph.representatives()
    }

    fn function_value(&self, function: FunctionId) -> Result<ValueId> {
        self.module
            .function(function)
            .map(|f| f.value)
            .ok_or_else(|| AliasError::not_found(format!("function {}", function)))
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Alias queries
    // ═══════════════════════════════════════════════════════════════════════

    pub fn alias_set(&self, value: ValueId) -> Result<BTreeSet<ValueId>> {
        let class = self.class_of(value)?;
        Ok(self.graph.values(class).clone())
    }

    /// Both values must be registered
    pub fn may_alias(&self, a: ValueId, b: ValueId) -> Result<bool> {
        Ok(self.class_of(a)? == self.class_of(b)?)
    }

    /// Values stored in the memory `pointer` points to; `None` when the
    /// pointer is never dereferenced
    pub fn points_to(&self, pointer: ValueId) -> Result<Option<BTreeSet<ValueId>>> {
        let class = self.class_of(pointer)?;
        Ok(self
            .graph
            .deref_target(class)
            .map(|target| self.graph.values(target).clone()))
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Escape queries
    // ═══════════════════════════════════════════════════════════════════════

    /// Classes reachable (over out-edges) from `seeds`
    fn reachable(&self, seeds: impl IntoIterator<Item = VertexId>) -> BTreeSet<ClassId> {
        let mut visited: FxHashSet<VertexId> = FxHashSet::default();
        let mut stack: Vec<VertexId> = seeds.into_iter().map(|v| self.graph.rep(v)).collect();

        while let Some(vertex) = stack.pop() {
            if !visited.insert(vertex) {
                continue;
            }
            for targets in self.graph.vertex(vertex).outs().values() {
                stack.extend(targets.iter().filter(|t| !visited.contains(*t)));
            }
        }
        visited.into_iter().collect()
    }

    /// Classes reachable from outside `function`: non-local globals and
    /// the arguments of every call that may invoke `function`
    ///
    /// Spawn calls contribute their payload only.
    pub fn escapes_to(&self, function: FunctionId) -> Result<BTreeSet<ClassId>> {
        let target = self.class_of(self.function_value(function)?)?;

        let globals = self
            .module
            .globals()
            .iter()
            .filter(|g| !g.linkage.is_local())
            .filter_map(|g| self.graph.vertex_of(g.value));
        let arguments = self
            .call_graph
            .calls()
            .iter()
            .filter(|call| self.graph.vertex_of(call.called_value) == Some(target))
            .flat_map(|call| call.args.iter())
            .filter_map(|&arg| self.graph.vertex_of(arg));

        Ok(self.reachable(globals.chain(arguments)))
    }

    /// Classes reachable from `value`, including its own
    pub fn escapes_from(&self, value: ValueId) -> Result<BTreeSet<ClassId>> {
        let class = self.class_of(value)?;
        Ok(self.reachable([class]))
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Allocation sites
    // ═══════════════════════════════════════════════════════════════════════

    /// Members of `pointer`'s class that allocate memory: globals, stack
    /// slots and calls to an allocator; memoized per class
    pub fn default_allocation_sites(&mut self, pointer: ValueId) -> Result<Vec<ValueId>> {
        let class = self.class_of(pointer)?;
        if let Some(cached) = self.allocation_cache.get(&class) {
            return Ok(cached.clone());
        }

        let sites: Vec<ValueId> = self
            .graph
            .values(class)
            .iter()
            .copied()
            .filter(|&member| {
                self.module.as_global(member).is_some()
                    || self.module.is_alloca(member)
                    || self.is_allocator_call(member)
            })
            .collect();
        self.allocation_cache.insert(class, sites.clone());
        Ok(sites)
    }

    /// Whether `value` is the result of calling something alias-equivalent
    /// to a configured allocator
    fn is_allocator_call(&self, value: ValueId) -> bool {
        let defining = self.module.defining_instruction(value).map(|i| &i.kind);
        let Some(InstKind::Call { callee, .. }) = defining else {
            return false;
        };
        let is_allocator = |v: &ValueId| {
            self.module
                .as_function(*v)
                .and_then(|f| self.module.function(f))
                .is_some_and(|f| self.config.is_allocator(&f.name))
        };
        match self.graph.vertex_of(*callee) {
            Some(class) => self.graph.values(class).iter().any(is_allocator),
            None => is_allocator(&self.module.strip_casts(*callee)),
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Call graph
    // ═══════════════════════════════════════════════════════════════════════

    /// The call recorded for an instruction
    pub fn call_at(&self, site: InstRef, origin: CallOrigin) -> Result<&Call> {
        self.call_graph
            .node(site.function)
            .and_then(|node| node.call_at(site, origin))
            .and_then(|id| self.call_graph.call(id))
            .ok_or_else(|| AliasError::not_found(format!("call at {}", site)))
    }

    /// Functions the call defining `result` may invoke
    pub fn callees_of(&self, result: ValueId) -> Result<Vec<FunctionId>> {
        let site = self
            .module
            .defining_location(result)
            .ok_or_else(|| AliasError::not_found(format!("call defining {}", result)))?;
        Ok(self.call_at(site, CallOrigin::Direct)?.targets())
    }

    /// Every function `function`'s body may call, directly or indirectly
    pub fn callees_from(&self, function: FunctionId) -> Result<BTreeSet<FunctionId>> {
        let node = self
            .call_graph
            .node(function)
            .ok_or_else(|| AliasError::not_found(format!("function {}", function)))?;
        Ok(node
            .common_calls()
            .iter()
            .chain(node.pointer_calls())
            .filter_map(|&id| self.call_graph.call(id))
            .flat_map(|call| call.targets())
            .collect())
    }
}
