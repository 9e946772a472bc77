use criterion::{black_box, criterion_group, criterion_main, Criterion};
use hotclass::classfile;
use hotclass::prelude::*;
use hotclass::TriggerCoordinator;

struct NullRuntime;

impl Runtime for NullRuntime {
    type Class = ();
    type Method = (&'static str, &'static str);

    fn subscribe(&self, _kind: EventKind) -> Result<(), RuntimeError> {
        Ok(())
    }

    fn request_retransform(&self, _class: &()) -> Result<(), RuntimeError> {
        Ok(())
    }

    fn resolve_method_metadata(&self, method: &Self::Method) -> Result<MethodMetadata<()>, RuntimeError> {
        Ok(MethodMetadata {
            class: (),
            class_name: ClassName::from_signature(method.0),
            method_name: MethodName::new(method.1),
            signature: "()V".to_string(),
        })
    }

    fn system_property(&self, _key: &str) -> Option<String> {
        None
    }
}

struct PassEngine;

impl RewriteEngine for PassEngine {
    fn rewrite(&self, _class_bytes: &[u8], _hint: &CorrelationHint) -> Result<RewriteResult, RewriteError> {
        Ok(RewriteResult::Unchanged)
    }
}

fn build_min_class() -> Vec<u8> {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&0xCAFEBABE_u32.to_be_bytes());
    bytes.extend_from_slice(&0_u16.to_be_bytes());
    bytes.extend_from_slice(&61_u16.to_be_bytes());
    bytes.extend_from_slice(&5_u16.to_be_bytes());

    bytes.push(1);
    bytes.extend_from_slice(&15_u16.to_be_bytes());
    bytes.extend_from_slice(b"com/acme/Solver");
    bytes.push(1);
    bytes.extend_from_slice(&16_u16.to_be_bytes());
    bytes.extend_from_slice(b"java/lang/Object");
    bytes.push(7);
    bytes.extend_from_slice(&1_u16.to_be_bytes());
    bytes.push(7);
    bytes.extend_from_slice(&2_u16.to_be_bytes());

    bytes.extend_from_slice(&0x0021_u16.to_be_bytes());
    bytes.extend_from_slice(&3_u16.to_be_bytes());
    bytes.extend_from_slice(&4_u16.to_be_bytes());
    for _ in 0..4 {
        bytes.extend_from_slice(&0_u16.to_be_bytes());
    }
    bytes
}

fn bench_compile_events(c: &mut Criterion) {
    let coord = TriggerCoordinator::new(AgentConfig::default(), NullRuntime, PassEngine)
        .expect("default config is valid");
    coord
        .on_method_compiled(&("Lcom/acme/Solver;", "solve"))
        .expect("first selection");

    c.bench_function("compile_already_seen", |b| {
        b.iter(|| coord.on_method_compiled(black_box(&("Lcom/acme/Solver;", "solve"))))
    });
    c.bench_function("compile_filtered", |b| {
        b.iter(|| coord.on_method_compiled(black_box(&("Ljava/util/HashMap;", "get"))))
    });
}

fn bench_validate(c: &mut Criterion) {
    let bytes = build_min_class();
    c.bench_function("classfile_validate_min", |b| {
        b.iter(|| classfile::validate(black_box(&bytes)).expect("valid class"))
    });
}

criterion_group!(benches, bench_compile_events, bench_validate);
criterion_main!(benches);
