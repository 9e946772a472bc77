#![allow(dead_code)]

use std::collections::{HashMap, HashSet};

use hotclass::prelude::*;
use parking_lot::Mutex;

/// A compiled method as the mock runtime knows it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MockMethod {
    pub class_signature: String,
    pub name: String,
}

pub fn method(class_signature: &str, name: &str) -> MockMethod {
    MockMethod { class_signature: class_signature.to_string(), name: name.to_string() }
}

#[derive(Default)]
pub struct MockRuntime {
    pub properties: HashMap<String, String>,
    pub unresolvable: HashSet<String>,
    pub refuse_subscription: Option<EventKind>,
    pub refuse_retransform: bool,
    pub subscribed: Mutex<Vec<EventKind>>,
    pub retransforms: Mutex<Vec<String>>,
}

impl MockRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_property(mut self, key: &str, value: &str) -> Self {
        self.properties.insert(key.to_string(), value.to_string());
        self
    }

    pub fn retransform_count(&self) -> usize {
        self.retransforms.lock().len()
    }
}

impl Runtime for MockRuntime {
    type Class = String;
    type Method = MockMethod;

    fn subscribe(&self, kind: EventKind) -> Result<(), RuntimeError> {
        if self.refuse_subscription == Some(kind) {
            return Err(RuntimeError::new("JVMTI_ERROR_MUST_POSSESS_CAPABILITY"));
        }
        self.subscribed.lock().push(kind);
        Ok(())
    }

    fn request_retransform(&self, class: &String) -> Result<(), RuntimeError> {
        if self.refuse_retransform {
            return Err(RuntimeError::new("JVMTI_ERROR_UNMODIFIABLE_CLASS"));
        }
        self.retransforms.lock().push(class.clone());
        Ok(())
    }

    fn resolve_method_metadata(&self, method: &MockMethod) -> Result<MethodMetadata<String>, RuntimeError> {
        if self.unresolvable.contains(&method.name) {
            return Err(RuntimeError::new("JVMTI_ERROR_INVALID_METHODID"));
        }
        Ok(MethodMetadata {
            class: method.class_signature.clone(),
            class_name: ClassName::new(&method.class_signature),
            method_name: MethodName::new(&method.name),
            signature: "()V".to_string(),
        })
    }

    fn system_property(&self, key: &str) -> Option<String> {
        self.properties.get(key).cloned()
    }
}

#[derive(Debug, Clone)]
pub enum Behavior {
    /// Appends `MARKER` and reports the given workers.
    Instrument(Vec<String>),
    Unchanged,
    Fail,
}

pub const MARKER: &[u8] = b"<instrumented>";

pub struct MockEngine {
    pub behavior: Mutex<Behavior>,
    pub accept_all: bool,
    pub calls: Mutex<Vec<CorrelationHint>>,
}

impl MockEngine {
    pub fn new(behavior: Behavior) -> Self {
        MockEngine { behavior: Mutex::new(behavior), accept_all: false, calls: Mutex::new(Vec::new()) }
    }

    pub fn instrumenting() -> Self {
        Self::new(Behavior::Instrument(Vec::new()))
    }

    pub fn accepting_anything(mut self) -> Self {
        self.accept_all = true;
        self
    }

    pub fn set_behavior(&self, behavior: Behavior) {
        *self.behavior.lock() = behavior;
    }

    pub fn hints(&self) -> Vec<CorrelationHint> {
        self.calls.lock().clone()
    }
}

impl RewriteEngine for MockEngine {
    fn rewrite(&self, class_bytes: &[u8], hint: &CorrelationHint) -> Result<RewriteResult, RewriteError> {
        self.calls.lock().push(hint.clone());
        match &*self.behavior.lock() {
            Behavior::Instrument(workers) => {
                let mut bytes = class_bytes.to_vec();
                bytes.extend_from_slice(MARKER);
                Ok(RewriteResult::Instrumented {
                    bytes,
                    workers: workers.iter().map(|w| ClassName::new(w)).collect(),
                })
            }
            Behavior::Unchanged => Ok(RewriteResult::Unchanged),
            Behavior::Fail => Err(RewriteError("javab: unsupported bytecode".to_string())),
        }
    }

    fn accepts(&self, class_bytes: &[u8]) -> bool {
        self.accept_all || hotclass::classfile::is_structurally_valid(class_bytes)
    }
}

/// Smallest class file the structural check accepts, named `name`.
pub fn class_bytes(name: &str) -> Vec<u8> {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&0xCAFEBABE_u32.to_be_bytes());
    bytes.extend_from_slice(&0_u16.to_be_bytes());
    bytes.extend_from_slice(&61_u16.to_be_bytes());
    bytes.extend_from_slice(&5_u16.to_be_bytes());

    // 1: Utf8 name
    bytes.push(1);
    bytes.extend_from_slice(&(name.len() as u16).to_be_bytes());
    bytes.extend_from_slice(name.as_bytes());
    // 2: Utf8 "java/lang/Object"
    bytes.push(1);
    bytes.extend_from_slice(&16_u16.to_be_bytes());
    bytes.extend_from_slice(b"java/lang/Object");
    // 3: Class #1
    bytes.push(7);
    bytes.extend_from_slice(&1_u16.to_be_bytes());
    // 4: Class #2
    bytes.push(7);
    bytes.extend_from_slice(&2_u16.to_be_bytes());

    // access_flags, this_class, super_class
    bytes.extend_from_slice(&0x0021_u16.to_be_bytes());
    bytes.extend_from_slice(&3_u16.to_be_bytes());
    bytes.extend_from_slice(&4_u16.to_be_bytes());

    // interfaces, fields, methods, attributes
    for _ in 0..4 {
        bytes.extend_from_slice(&0_u16.to_be_bytes());
    }
    bytes
}

pub fn instrumented(bytes: &[u8]) -> Vec<u8> {
    let mut out = bytes.to_vec();
    out.extend_from_slice(MARKER);
    out
}
