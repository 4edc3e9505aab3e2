//! Function type compatibility clusters
//!
//! Functions are grouped by a structural signature key so indirect-call
//! resolution only has to consider functions a call site could legally
//! reach. Compatibility rules:
//! - return classes must be equal;
//! - a non-variadic function needs exactly the call's parameter classes;
//! - a variadic function accepts any call whose leading parameter classes
//!   match its fixed parameters.

use crate::shared::models::{FunctionId, Module, Signature, Type};
use std::collections::{BTreeMap, BTreeSet};

/// Calling-convention view of a type
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TypeClass {
    Void,
    Int(u32),
    Float(u32),
    Pointer,
    Aggregate(Vec<TypeClass>),
}

impl TypeClass {
    pub fn of(ty: &Type) -> Self {
        match ty {
            Type::Void => TypeClass::Void,
            Type::Integer(bits) => TypeClass::Int(*bits),
            Type::Float(bits) => TypeClass::Float(*bits),
            // function-typed operands are passed as code addresses
            Type::Pointer | Type::Function(_) => TypeClass::Pointer,
            Type::Struct(fields) => {
                TypeClass::Aggregate(fields.iter().map(TypeClass::of).collect())
            }
            Type::Array(len, elem) => {
                TypeClass::Aggregate(vec![TypeClass::of(elem); (*len).min(64) as usize])
            }
        }
    }
}

/// Structural signature key
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SignatureKey {
    pub ret: TypeClass,
    pub params: Vec<TypeClass>,
    pub variadic: bool,
}

impl SignatureKey {
    pub fn of(sig: &Signature) -> Self {
        Self {
            ret: TypeClass::of(&sig.ret),
            params: sig.params.iter().map(TypeClass::of).collect(),
            variadic: sig.variadic,
        }
    }

    /// Whether a function with signature `self` may be invoked by a call
    /// site typed `call`
    pub fn accepts(&self, call: &SignatureKey) -> bool {
        if self.ret != call.ret {
            return false;
        }
        if self.variadic {
            call.params.len() >= self.params.len()
                && call.params[..self.params.len()] == self.params[..]
        } else {
            !call.variadic && call.params == self.params
        }
    }
}

/// One compatibility cluster
#[derive(Debug, Clone)]
pub struct FunctionTypeNode {
    pub key: SignatureKey,
    pub(crate) members: BTreeSet<FunctionId>,
}

impl FunctionTypeNode {
    #[inline]
    pub fn members(&self) -> &BTreeSet<FunctionId> {
        &self.members
    }
}

/// All clusters of a module
#[derive(Debug, Clone, Default)]
pub struct FunctionTypeIndex {
    clusters: BTreeMap<SignatureKey, FunctionTypeNode>,
}

impl FunctionTypeIndex {
    pub fn build(module: &Module) -> Self {
        let mut index = Self::default();
        for function in module.functions() {
            let key = SignatureKey::of(&function.signature);
            index
                .clusters
                .entry(key.clone())
                .or_insert_with(|| FunctionTypeNode {
                    key: key.clone(),
                    members: BTreeSet::new(),
                })
                .members
                .insert(function.id);
        }
        index
    }

    pub fn clusters(&self) -> impl Iterator<Item = &FunctionTypeNode> + '_ {
        self.clusters.values()
    }

    /// Clusters whose members a call typed `call` may reach
    pub fn compatible_clusters<'a>(
        &'a self,
        call: &'a SignatureKey,
    ) -> impl Iterator<Item = &'a FunctionTypeNode> + 'a {
        self.clusters.values().filter(move |c| c.key.accepts(call))
    }

    /// Every function a call typed `call` may reach
    pub fn reachable_by(&self, call: &SignatureKey) -> BTreeSet<FunctionId> {
        self.compatible_clusters(call)
            .flat_map(|cluster| cluster.members.iter().copied())
            .collect()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::models::ModuleBuilder;

    #[test]
    fn test_exact_signature_match() {
        let a = SignatureKey::of(&Signature::new(vec![Type::ptr()], Type::Void));
        let b = SignatureKey::of(&Signature::new(vec![Type::ptr()], Type::Void));
        let c = SignatureKey::of(&Signature::new(vec![Type::i32()], Type::Void));
        assert!(a.accepts(&b));
        assert!(!a.accepts(&c));
    }

    #[test]
    fn test_arity_mismatch_excluded() {
        let f = SignatureKey::of(&Signature::new(vec![Type::ptr()], Type::Void));
        let call = SignatureKey::of(&Signature::new(vec![Type::ptr(), Type::ptr()], Type::Void));
        assert!(!f.accepts(&call));
    }

    #[test]
    fn test_variadic_prefix_match() {
        let printf = SignatureKey::of(&Signature::variadic(vec![Type::ptr()], Type::i32()));
        let call = SignatureKey::of(&Signature::new(vec![Type::ptr(), Type::i64()], Type::i32()));
        let bad = SignatureKey::of(&Signature::new(vec![Type::i64()], Type::i32()));
        assert!(printf.accepts(&call));
        assert!(!printf.accepts(&bad));
    }

    #[test]
    fn test_function_typed_params_are_pointers() {
        let inner = Signature::new(vec![], Type::Void);
        let ty = Type::Function(Box::new(inner));
        assert_eq!(TypeClass::of(&ty), TypeClass::Pointer);
    }

    #[test]
    fn test_index_groups_functions() {
        let mut mb = ModuleBuilder::new("m");
        let sig = Signature::new(vec![Type::ptr()], Type::Void);
        let f = mb.declare_function("f", sig.clone());
        let g = mb.declare_function("g", sig.clone());
        let h = mb.declare_function("h", Signature::new(vec![], Type::i32()));
        let module = mb.build();

        let index = FunctionTypeIndex::build(&module);
        assert_eq!(index.len(), 2);

        let key = SignatureKey::of(&sig);
        let members: Vec<_> = index
            .compatible_clusters(&key)
            .flat_map(|c| c.members().iter().copied())
            .collect();
        assert_eq!(members, vec![f, g]);
        assert_eq!(index.reachable_by(&key), BTreeSet::from([f, g]));
        assert!(!index.reachable_by(&key).contains(&h));
    }

    #[test]
    fn test_variadic_cluster_is_reachable_from_longer_calls() {
        let mut mb = ModuleBuilder::new("m");
        let log = mb.declare_function("log", Signature::variadic(vec![Type::ptr()], Type::Void));
        let sink = mb.declare_function("sink", Signature::new(vec![Type::ptr()], Type::Void));
        let module = mb.build();

        let index = FunctionTypeIndex::build(&module);
        let two = SignatureKey::of(&Signature::new(vec![Type::ptr(), Type::i64()], Type::Void));
        let one = SignatureKey::of(&Signature::new(vec![Type::ptr()], Type::Void));
        assert_eq!(index.reachable_by(&two), BTreeSet::from([log]));
        assert_eq!(index.reachable_by(&one), BTreeSet::from([log, sink]));
    }
}
