//! Module fixtures
//!
//! Each fixture builds a small program and returns the handles the tests
//! query.

use dyck_alias::shared::models::{
    ConstantKind, FunctionId, Linkage, Module, ModuleBuilder, Signature, Type, ValueId,
};

pub fn void_sig() -> Signature {
    Signature::new(vec![], Type::Void)
}

/// `void (ptr)`
pub fn sink_sig() -> Signature {
    Signature::new(vec![Type::ptr()], Type::Void)
}

/// `ptr (ptr)`
pub fn thread_routine_sig() -> Signature {
    Signature::new(vec![Type::ptr()], Type::ptr())
}

/// `i32 (ptr, ptr, ptr, ptr)`
pub fn pthread_create_sig() -> Signature {
    Signature::new(vec![Type::ptr(); 4], Type::i32())
}

/// `void *memcpy(void *, const void *, size_t)`
pub fn memcpy_sig() -> Signature {
    Signature::new(vec![Type::ptr(), Type::ptr(), Type::i64()], Type::ptr())
}

// ═══════════════════════════════════════════════════════════════════════════
// Scenario A: p = &x; q = p
// ═══════════════════════════════════════════════════════════════════════════

pub struct CopyChain {
    pub module: Module,
    pub x: ValueId,
    pub p: ValueId,
    pub q: ValueId,
    /// `q` read back through memory: `*ps = p; *qs = *ps; u = *qs`
    pub u: ValueId,
}

pub fn copy_chain() -> CopyChain {
    let mut mb = ModuleBuilder::new("scenario_a");
    let main = mb.declare_function("main", void_sig());
    let mut b = mb.body(main);
    let x = b.alloca("x");
    let p = b.cast("p", x, Type::ptr());
    let q = b.cast("q", p, Type::ptr());
    let ps = b.alloca("ps");
    let qs = b.alloca("qs");
    b.store(p, ps);
    let t = b.load("t", ps, Type::ptr());
    b.store(t, qs);
    let u = b.load("u", qs, Type::ptr());
    b.ret(None);
    CopyChain {
        module: mb.build(),
        x,
        p,
        q,
        u,
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Scenarios B and C: field and array accesses
// ═══════════════════════════════════════════════════════════════════════════

pub struct TwoAccesses {
    pub module: Module,
    pub base: ValueId,
    pub p: ValueId,
    pub q: ValueId,
}

/// `p = &s.f0; q = &s.f1`
pub fn distinct_fields() -> TwoAccesses {
    let mut mb = ModuleBuilder::new("scenario_b");
    let main = mb.declare_function("main", void_sig());
    let mut b = mb.body(main);
    let s = b.alloca("s");
    let p = b.field("p", s, 0);
    let q = b.field("q", s, 1);
    b.ret(None);
    TwoAccesses {
        module: mb.build(),
        base: s,
        p,
        q,
    }
}

/// `p = &arr[i]; q = &arr[j]` with run-time `i`, `j`
pub fn dynamic_indices() -> TwoAccesses {
    let mut mb = ModuleBuilder::new("scenario_c");
    let main = mb.declare_function("main", void_sig());
    let mut b = mb.body(main);
    let arr = b.alloca("arr");
    let p = b.dynamic_index("p", arr);
    let q = b.dynamic_index("q", arr);
    b.ret(None);
    TwoAccesses {
        module: mb.build(),
        base: arr,
        p,
        q,
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Scenario D: fp = cond ? f : g; fp(a)
// ═══════════════════════════════════════════════════════════════════════════

pub struct IndirectCall {
    pub module: Module,
    pub f: FunctionId,
    pub g: FunctionId,
    /// Same arity as `f`/`g` but an incompatible parameter type
    pub h: FunctionId,
    pub main: FunctionId,
    pub a: ValueId,
    pub fp: ValueId,
}

pub fn indirect_call() -> IndirectCall {
    let mut mb = ModuleBuilder::new("scenario_d");
    let f = mb.declare_function("f", sink_sig());
    let g = mb.declare_function("g", sink_sig());
    let h = mb.declare_function("h", Signature::new(vec![Type::i64()], Type::Void));
    let main = mb.declare_function("main", void_sig());
    let (fv, gv, hv) = (mb.function_value(f), mb.function_value(g), mb.function_value(h));

    for function in [f, g, h] {
        let mut b = mb.body(function);
        b.ret(None);
    }

    let mut b = mb.body(main);
    let a = b.alloca("a");
    let fg = b.select("fg", fv, gv, Type::ptr());
    let fp = b.phi("fp", &[fg, hv], Type::ptr());
    b.call("", fp, &[a], sink_sig());
    b.ret(None);

    IndirectCall {
        module: mb.build(),
        f,
        g,
        h,
        main,
        a,
        fp,
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Scenario E: pthread_create(&t, NULL, worker, payload)
// ═══════════════════════════════════════════════════════════════════════════

pub struct ThreadSpawn {
    pub module: Module,
    pub worker: FunctionId,
    pub main: FunctionId,
    pub payload: ValueId,
    pub local: ValueId,
    /// What the worker loads through its argument
    pub seen: ValueId,
    /// Pointer stored into the payload before spawning
    pub shared: ValueId,
}

/// `worker` is called through a pointer when `through_pointer` is set
pub fn thread_spawn(through_pointer: bool) -> ThreadSpawn {
    let mut mb = ModuleBuilder::new("scenario_e");
    let spawn = mb.declare_function("pthread_create", pthread_create_sig());
    let worker = mb.declare_function("worker", thread_routine_sig());
    let main = mb.declare_function("main", void_sig());
    let spawn_value = mb.function_value(spawn);
    let worker_value = mb.function_value(worker);
    let null = mb.null();

    let seen = {
        let mut b = mb.body(worker);
        let arg = b.param(0);
        let seen = b.load("seen", arg, Type::ptr());
        b.ret(Some(seen));
        seen
    };

    let mut b = mb.body(main);
    let t = b.alloca("t");
    let payload = b.alloca("payload");
    let shared = b.alloca("shared");
    let local = b.alloca("local");
    b.store(shared, payload);
    let routine = if through_pointer {
        let slot = b.alloca("slot");
        b.store(worker_value, slot);
        b.load("routine", slot, Type::ptr())
    } else {
        worker_value
    };
    b.call("rc", spawn_value, &[t, null, routine, payload], pthread_create_sig());
    b.ret(None);

    ThreadSpawn {
        module: mb.build(),
        worker,
        main,
        payload,
        local,
        seen,
        shared,
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Supplementary fixtures
// ═══════════════════════════════════════════════════════════════════════════

pub struct Varargs {
    pub module: Module,
    pub read: ValueId,
    pub first: ValueId,
    pub extra: Vec<ValueId>,
}

/// `sum(first, extra...)` reading its variadic arguments with `va_arg`
pub fn varargs() -> Varargs {
    let mut mb = ModuleBuilder::new("varargs");
    let sum_sig = Signature::variadic(vec![Type::ptr()], Type::Void);
    let sum = mb.declare_function("sum", sum_sig);
    let main = mb.declare_function("main", void_sig());
    let sum_value = mb.function_value(sum);

    let read = {
        let mut b = mb.body(sum);
        let list = b.alloca("ap");
        let read = b.va_arg("next", list, Type::ptr());
        b.ret(None);
        read
    };

    let mut b = mb.body(main);
    let first = b.alloca("first");
    let e1 = b.alloca("e1");
    let e2 = b.alloca("e2");
    b.call(
        "",
        sum_value,
        &[first, e1, e2],
        Signature::new(vec![Type::ptr(); 3], Type::Void),
    );
    b.ret(None);

    Varargs {
        module: mb.build(),
        read,
        first,
        extra: vec![e1, e2],
    }
}

pub struct MemCopy {
    pub module: Module,
    pub x: ValueId,
    pub y: ValueId,
    pub dst: ValueId,
    pub copied: ValueId,
}

/// `*src = x; memcpy(dst, src, 8); y = *dst`
pub fn mem_copy() -> MemCopy {
    let mut mb = ModuleBuilder::new("memcpy");
    let memcpy = mb.declare_function("memcpy", memcpy_sig());
    let main = mb.declare_function("main", void_sig());
    let memcpy_value = mb.function_value(memcpy);
    let eight = mb.constant(ConstantKind::Int(8), Type::i64());

    let mut b = mb.body(main);
    let x = b.alloca("x");
    let src = b.alloca("src");
    let dst = b.alloca("dst");
    b.store(x, src);
    let copied = b
        .call("copied", memcpy_value, &[dst, src, eight], memcpy_sig())
        .expect("memcpy returns a pointer");
    let y = b.load("y", dst, Type::ptr());
    b.ret(None);

    MemCopy {
        module: mb.build(),
        x,
        y,
        dst,
        copied,
    }
}

pub struct GlobalTable {
    pub module: Module,
    pub handler: FunctionId,
    pub table: ValueId,
    pub hidden: ValueId,
    pub secret: ValueId,
    pub arg: ValueId,
}

/// An exported global holding a function pointer in field 1, plus an
/// internal global nobody outside can see
pub fn global_table() -> GlobalTable {
    let mut mb = ModuleBuilder::new("globals");
    let handler = mb.declare_function("handler", sink_sig());
    let main = mb.declare_function("main", void_sig());
    let handler_value = mb.function_value(handler);
    let table = mb.add_global("table", Linkage::External);
    let hidden = mb.add_global("hidden", Linkage::Internal);
    mb.global_initializer(table, Some(1), handler_value);

    mb.body(handler).ret(None);

    let mut b = mb.body(main);
    let secret = b.alloca("secret");
    b.store(secret, hidden);
    let slot = b.field("slot", table, 1);
    let fp = b.load("fp", slot, Type::ptr());
    let arg = b.alloca("arg");
    b.call("", fp, &[arg], sink_sig());
    b.ret(None);

    GlobalTable {
        module: mb.build(),
        handler,
        table,
        hidden,
        secret,
        arg,
    }
}

pub struct ReturnFlow {
    pub module: Module,
    pub a: ValueId,
    pub r: ValueId,
}

/// `r = id(a)` where `id` is defined after its caller
pub fn return_flow() -> ReturnFlow {
    let mut mb = ModuleBuilder::new("returns");
    let main = mb.declare_function("main", void_sig());
    let id = mb.declare_function("id", thread_routine_sig());
    let id_value = mb.function_value(id);

    let (a, r) = {
        let mut b = mb.body(main);
        let a = b.alloca("a");
        let r = b
            .call("r", id_value, &[a], thread_routine_sig())
            .expect("id returns a pointer");
        b.ret(None);
        (a, r)
    };

    {
        let mut b = mb.body(id);
        let arg = b.param(0);
        b.ret(Some(arg));
    }

    ReturnFlow {
        module: mb.build(),
        a,
        r,
    }
}
