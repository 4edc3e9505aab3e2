//! Ports (interfaces) for alias analysis consumers
//!
//! Consumers such as race detectors or instrumentation passes depend on
//! [`AliasQuery`] rather than on the concrete session type.

use crate::errors::Result;
use crate::features::alias_analysis::application::AliasAnalysis;
use crate::features::alias_analysis::domain::{Call, ClassId};
use crate::shared::models::{FunctionId, ValueId};
use std::collections::BTreeSet;

/// Read-mostly alias queries
///
/// # Example
/// ```ignore
/// fn shares_memory<Q: AliasQuery>(q: &Q, a: ValueId, b: ValueId) -> bool {
///     q.may_alias(a, b).unwrap_or(false)
/// }
/// ```
pub trait AliasQuery {
    fn alias_set(&self, value: ValueId) -> Result<BTreeSet<ValueId>>;

    fn may_alias(&self, a: ValueId, b: ValueId) -> Result<bool>;

    fn points_to(&self, pointer: ValueId) -> Result<Option<BTreeSet<ValueId>>>;

    fn escapes_to(&self, function: FunctionId) -> Result<BTreeSet<ClassId>>;

    fn escapes_from(&self, value: ValueId) -> Result<BTreeSet<ClassId>>;

    /// Memoized, hence `&mut self`
    fn default_allocation_sites(&mut self, pointer: ValueId) -> Result<Vec<ValueId>>;

    /// Every call site known to the analysis
    fn calls(&self) -> &[Call];
}

impl AliasQuery for AliasAnalysis<'_> {
    fn alias_set(&self, value: ValueId) -> Result<BTreeSet<ValueId>> {
        AliasAnalysis::alias_set(self, value)
    }

    fn may_alias(&self, a: ValueId, b: ValueId) -> Result<bool> {
        AliasAnalysis::may_alias(self, a, b)
    }

    fn points_to(&self, pointer: ValueId) -> Result<Option<BTreeSet<ValueId>>> {
        AliasAnalysis::points_to(self, pointer)
    }

    fn escapes_to(&self, function: FunctionId) -> Result<BTreeSet<ClassId>> {
        AliasAnalysis::escapes_to(self, function)
    }

    fn escapes_from(&self, value: ValueId) -> Result<BTreeSet<ClassId>> {
        AliasAnalysis::escapes_from(self, value)
    }

    fn default_allocation_sites(&mut self, pointer: ValueId) -> Result<Vec<ValueId>> {
        AliasAnalysis::default_allocation_sites(self, pointer)
    }

    fn calls(&self) -> &[Call] {
        self.call_graph().calls()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::models::{ModuleBuilder, Signature, Type};

    fn shares_memory<Q: AliasQuery>(q: &Q, a: ValueId, b: ValueId) -> bool {
        q.may_alias(a, b).unwrap_or(false)
    }

    #[test]
    fn test_session_usable_through_trait() {
        let mut mb = ModuleBuilder::new("m");
        let main = mb.declare_function("main", Signature::new(vec![], Type::Void));
        let (x, y, z) = {
            let mut b = mb.body(main);
            let x = b.alloca("x");
            let y = b.cast("y", x, Type::ptr());
            let z = b.alloca("z");
            b.ret(None);
            (x, y, z)
        };
        let module = mb.build();

        let mut analysis = AliasAnalysis::new(&module).unwrap();
        assert!(shares_memory(&analysis, x, y));
        assert!(!shares_memory(&analysis, x, z));

        let query: &mut dyn AliasQuery = &mut analysis;
        assert_eq!(query.default_allocation_sites(y).unwrap(), vec![x]);
        assert!(query.calls().is_empty());
    }
}
