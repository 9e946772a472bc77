//! Structural pre-check for class bytes handed to the load hook.
//!
//! Rewriting a class whose constant pool cannot be walked would hand the
//! engine garbage, so the load hook validates first. This is not a full
//! class-file parser: it reads the header and every constant-pool entry
//! (tags through Java 27), checks that cross-references land on entries of
//! the right kind, and resolves `this_class` to its name.

use thiserror::Error;

const MAGIC: u32 = 0xCAFE_BABE;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClassFileError {
    #[error("unexpected end of class data")]
    UnexpectedEof,
    #[error("invalid magic: {0:#x}")]
    InvalidMagic(u32),
    #[error("empty constant pool")]
    EmptyConstantPool,
    #[error("invalid constant pool index: {0}")]
    InvalidConstantPoolIndex(u16),
    #[error("invalid constant pool tag {tag} at index {index}")]
    InvalidConstantPoolTag { index: u16, tag: u8 },
    #[error("constant pool entry {index} refers to {target}, expected {expected}")]
    WrongEntryKind { index: u16, target: u16, expected: &'static str },
    #[error("this_class {0} is not a Class entry")]
    InvalidThisClass(u16),
}

/// Constant-pool entry kinds, with only the references the check follows.
#[derive(Debug, Clone, PartialEq, Eq)]
enum CpEntry {
    Utf8(String),
    Class { name_index: u16 },
    NameAndType { name_index: u16, descriptor_index: u16 },
    MemberRef { class_index: u16, name_and_type_index: u16 },
    /// Strings, method types, modules and packages: one Utf8 reference.
    Named(u16),
    /// Numeric constants and bootstrap-based entries.
    Opaque,
    /// Second slot of a `Long` or `Double`.
    Gap,
}

/// What the check learned about a class that passed it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassSummary {
    pub minor_version: u16,
    pub major_version: u16,
    pub constant_pool_count: u16,
    pub access_flags: u16,
    pub this_class: String,
}

struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], ClassFileError> {
        let end = self.pos.checked_add(len).ok_or(ClassFileError::UnexpectedEof)?;
        let slice = self.data.get(self.pos..end).ok_or(ClassFileError::UnexpectedEof)?;
        self.pos = end;
        Ok(slice)
    }

    fn u1(&mut self) -> Result<u8, ClassFileError> {
        Ok(self.take(1)?[0])
    }

    fn u2(&mut self) -> Result<u16, ClassFileError> {
        let b = self.take(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    fn u4(&mut self) -> Result<u32, ClassFileError> {
        let b = self.take(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }
}

/// Validates `bytes` and summarizes the class.
pub fn validate(bytes: &[u8]) -> Result<ClassSummary, ClassFileError> {
    let mut r = Reader::new(bytes);
    let magic = r.u4()?;
    if magic != MAGIC {
        return Err(ClassFileError::InvalidMagic(magic));
    }
    let minor_version = r.u2()?;
    let major_version = r.u2()?;

    let constant_pool_count = r.u2()?;
    if constant_pool_count == 0 {
        return Err(ClassFileError::EmptyConstantPool);
    }
    let pool = read_constant_pool(&mut r, constant_pool_count)?;
    check_references(&pool)?;

    let access_flags = r.u2()?;
    let this_index = r.u2()?;
    let this_class = match lookup(&pool, this_index)? {
        CpEntry::Class { name_index } => utf8_at(&pool, this_index, *name_index)?.to_owned(),
        _ => return Err(ClassFileError::InvalidThisClass(this_index)),
    };
    // super_class is 0 only for java/lang/Object.
    r.u2()?;

    Ok(ClassSummary { minor_version, major_version, constant_pool_count, access_flags, this_class })
}

/// `true` if [`validate`] accepts `bytes`.
pub fn is_structurally_valid(bytes: &[u8]) -> bool {
    validate(bytes).is_ok()
}

fn read_constant_pool(r: &mut Reader, count: u16) -> Result<Vec<CpEntry>, ClassFileError> {
    let mut entries = Vec::with_capacity(count as usize);
    entries.push(CpEntry::Gap); // index 0 is unused

    let mut index: u16 = 1;
    while index < count {
        let tag = r.u1()?;
        let entry = match tag {
            1 => {
                let len = r.u2()? as usize;
                CpEntry::Utf8(String::from_utf8_lossy(r.take(len)?).into_owned())
            }
            3 | 4 => {
                r.u4()?;
                CpEntry::Opaque
            }
            5 | 6 => {
                r.take(8)?;
                if index + 1 >= count {
                    return Err(ClassFileError::InvalidConstantPoolIndex(index + 1));
                }
                entries.push(CpEntry::Opaque);
                entries.push(CpEntry::Gap);
                index += 2;
                continue;
            }
            7 => CpEntry::Class { name_index: r.u2()? },
            8 | 16 | 19 | 20 => CpEntry::Named(r.u2()?),
            9..=11 => CpEntry::MemberRef { class_index: r.u2()?, name_and_type_index: r.u2()? },
            12 => CpEntry::NameAndType { name_index: r.u2()?, descriptor_index: r.u2()? },
            15 => {
                r.u1()?;
                r.u2()?;
                CpEntry::Opaque
            }
            17 | 18 => {
                r.u2()?;
                r.u2()?;
                CpEntry::Opaque
            }
            _ => return Err(ClassFileError::InvalidConstantPoolTag { index, tag }),
        };
        entries.push(entry);
        index += 1;
    }
    Ok(entries)
}

fn check_references(pool: &[CpEntry]) -> Result<(), ClassFileError> {
    for (i, entry) in pool.iter().enumerate() {
        let index = i as u16;
        match entry {
            CpEntry::Class { name_index } | CpEntry::Named(name_index) => {
                utf8_at(pool, index, *name_index)?;
            }
            CpEntry::NameAndType { name_index, descriptor_index } => {
                utf8_at(pool, index, *name_index)?;
                utf8_at(pool, index, *descriptor_index)?;
            }
            CpEntry::MemberRef { class_index, name_and_type_index } => {
                if !matches!(lookup(pool, *class_index)?, CpEntry::Class { .. }) {
                    return Err(ClassFileError::WrongEntryKind { index, target: *class_index, expected: "Class" });
                }
                if !matches!(lookup(pool, *name_and_type_index)?, CpEntry::NameAndType { .. }) {
                    return Err(ClassFileError::WrongEntryKind {
                        index,
                        target: *name_and_type_index,
                        expected: "NameAndType",
                    });
                }
            }
            CpEntry::Utf8(_) | CpEntry::Opaque | CpEntry::Gap => {}
        }
    }
    Ok(())
}

fn lookup(pool: &[CpEntry], index: u16) -> Result<&CpEntry, ClassFileError> {
    match pool.get(index as usize) {
        Some(CpEntry::Gap) | None => Err(ClassFileError::InvalidConstantPoolIndex(index)),
        Some(entry) => Ok(entry),
    }
}

fn utf8_at(pool: &[CpEntry], from: u16, target: u16) -> Result<&str, ClassFileError> {
    match lookup(pool, target)? {
        CpEntry::Utf8(s) => Ok(s),
        _ => Err(ClassFileError::WrongEntryKind { index: from, target, expected: "Utf8" }),
    }
}
