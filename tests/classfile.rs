use hotclass::classfile::{validate, ClassFileError};

struct CpBuilder {
    entries: Vec<Vec<u8>>,
    slots: u16,
}

impl CpBuilder {
    fn new() -> Self {
        Self { entries: Vec::new(), slots: 0 }
    }

    fn push(&mut self, entry: Vec<u8>, width: u16) -> u16 {
        self.entries.push(entry);
        let index = self.slots + 1;
        self.slots += width;
        index
    }

    fn utf8(&mut self, s: &str) -> u16 {
        let mut entry = vec![1];
        entry.extend_from_slice(&(s.len() as u16).to_be_bytes());
        entry.extend_from_slice(s.as_bytes());
        self.push(entry, 1)
    }

    fn tagged_u2(&mut self, tag: u8, index: u16) -> u16 {
        let mut entry = vec![tag];
        entry.extend_from_slice(&index.to_be_bytes());
        self.push(entry, 1)
    }

    fn tagged_u2_u2(&mut self, tag: u8, a: u16, b: u16) -> u16 {
        let mut entry = vec![tag];
        entry.extend_from_slice(&a.to_be_bytes());
        entry.extend_from_slice(&b.to_be_bytes());
        self.push(entry, 1)
    }

    fn class(&mut self, name_index: u16) -> u16 {
        self.tagged_u2(7, name_index)
    }

    fn name_and_type(&mut self, name_index: u16, descriptor_index: u16) -> u16 {
        self.tagged_u2_u2(12, name_index, descriptor_index)
    }

    fn methodref(&mut self, class_index: u16, name_and_type_index: u16) -> u16 {
        self.tagged_u2_u2(10, class_index, name_and_type_index)
    }

    fn long(&mut self, value: i64) -> u16 {
        let mut entry = vec![5];
        entry.extend_from_slice(&value.to_be_bytes());
        self.push(entry, 2)
    }

    fn method_handle(&mut self, kind: u8, reference_index: u16) -> u16 {
        let mut entry = vec![15, kind];
        entry.extend_from_slice(&reference_index.to_be_bytes());
        self.push(entry, 1)
    }

    /// Header, constant pool and the class header fields; no members.
    fn finish(self, this_class: u16, super_class: u16) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&0xCAFEBABE_u32.to_be_bytes());
        bytes.extend_from_slice(&0_u16.to_be_bytes());
        bytes.extend_from_slice(&65_u16.to_be_bytes());
        bytes.extend_from_slice(&(self.slots + 1).to_be_bytes());
        for entry in &self.entries {
            bytes.extend_from_slice(entry);
        }
        bytes.extend_from_slice(&0x0021_u16.to_be_bytes());
        bytes.extend_from_slice(&this_class.to_be_bytes());
        bytes.extend_from_slice(&super_class.to_be_bytes());
        bytes
    }
}

fn rich_class() -> Vec<u8> {
    let mut cp = CpBuilder::new();
    let utf_this = cp.utf8("com/acme/Solver");
    let utf_object = cp.utf8("java/lang/Object");
    let class_this = cp.class(utf_this);
    let class_object = cp.class(utf_object);

    let utf_init = cp.utf8("<init>");
    let utf_void = cp.utf8("()V");
    let nat_init = cp.name_and_type(utf_init, utf_void);
    let mref_init = cp.methodref(class_object, nat_init);

    cp.long(i64::MAX);
    cp.tagged_u2(8, utf_init); // String
    cp.tagged_u2(16, utf_void); // MethodType
    cp.method_handle(7, mref_init);
    cp.tagged_u2_u2(18, 0, nat_init); // InvokeDynamic
    let utf_module = cp.utf8("acme.core");
    cp.tagged_u2(19, utf_module); // Module
    cp.tagged_u2(20, utf_this); // Package

    cp.finish(class_this, class_object)
}

#[test]
fn accepts_full_constant_pool() {
    let summary = validate(&rich_class()).expect("valid class");
    assert_eq!(summary.this_class, "com/acme/Solver");
    assert_eq!(summary.major_version, 65);
    assert_eq!(summary.access_flags, 0x0021);
}

#[test]
fn long_takes_two_slots() {
    let mut cp = CpBuilder::new();
    cp.long(7);
    let utf_this = cp.utf8("Wide");
    let class_this = cp.class(utf_this);
    assert_eq!(utf_this, 3);

    let summary = validate(&cp.finish(class_this, 0)).unwrap();
    assert_eq!(summary.this_class, "Wide");
    assert_eq!(summary.constant_pool_count, 5);
}

#[test]
fn reference_into_long_gap_is_rejected() {
    let mut cp = CpBuilder::new();
    cp.long(7);
    let class_this = cp.class(2);

    let err = validate(&cp.finish(class_this, 0)).unwrap_err();
    assert_eq!(err, ClassFileError::InvalidConstantPoolIndex(2));
}

#[test]
fn class_must_name_a_utf8() {
    let mut cp = CpBuilder::new();
    let utf = cp.utf8("Bad");
    let class_a = cp.class(utf);
    let class_b = cp.class(class_a);

    let err = validate(&cp.finish(class_b, 0)).unwrap_err();
    assert!(matches!(err, ClassFileError::WrongEntryKind { expected: "Utf8", .. }));
}

#[test]
fn methodref_must_point_at_class() {
    let mut cp = CpBuilder::new();
    let utf_this = cp.utf8("App");
    let class_this = cp.class(utf_this);
    let nat = cp.name_and_type(utf_this, utf_this);
    cp.methodref(utf_this, nat);

    let err = validate(&cp.finish(class_this, 0)).unwrap_err();
    assert!(matches!(err, ClassFileError::WrongEntryKind { expected: "Class", .. }));
}

#[test]
fn this_class_out_of_range() {
    let mut cp = CpBuilder::new();
    cp.utf8("App");

    let err = validate(&cp.finish(9, 0)).unwrap_err();
    assert_eq!(err, ClassFileError::InvalidConstantPoolIndex(9));
}

#[test]
fn this_class_must_be_a_class_entry() {
    let mut cp = CpBuilder::new();
    let utf_this = cp.utf8("App");
    cp.class(utf_this);

    let err = validate(&cp.finish(utf_this, 0)).unwrap_err();
    assert_eq!(err, ClassFileError::InvalidThisClass(utf_this));
}

#[test]
fn unknown_tag_is_rejected() {
    let mut cp = CpBuilder::new();
    let utf_this = cp.utf8("App");
    let class_this = cp.class(utf_this);
    cp.push(vec![2, 0, 0], 1);

    let err = validate(&cp.finish(class_this, 0)).unwrap_err();
    assert_eq!(err, ClassFileError::InvalidConstantPoolTag { index: 3, tag: 2 });
}

#[test]
fn truncated_constant_pool_is_rejected() {
    let bytes = rich_class();
    // Cut inside the constant pool.
    let err = validate(&bytes[..40]).unwrap_err();
    assert_eq!(err, ClassFileError::UnexpectedEof);
}
