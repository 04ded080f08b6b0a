use crate::jvm::class_file::{
    ClassConstantIndex, ClassFile, Constant, ConstantIndex, HandleKind, NameAndTypeConstantIndex,
    Utf8ConstantIndex,
};
use crate::jvm::Error;
use crate::util::{Offset, OffsetVec, Width};
use std::collections::HashMap;

/// Constant pool entry, with all references to other entries resolved
///
/// Only method handles keep a raw index: they point at a field or method reference entry, whose
/// slot never moves.
#[derive(Debug, Clone, PartialEq)]
pub enum PoolEntry {
    Utf8(String),

    /// Utf8 entry that is not valid UTF-16, kept as its raw modified UTF-8 bytes
    RawUtf8(Vec<u8>),
    Integer(i32),
    Float(f32),
    Long(i64),
    Double(f64),

    /// Internal name of a class, or descriptor of an array class
    Class(String),

    /// String literal (never remapped)
    String(String),

    /// String literal whose contents are a [`PoolEntry::RawUtf8`] entry, which never moves
    RawString(Utf8ConstantIndex),
    FieldRef(MemberRef),
    MethodRef {
        member: MemberRef,
        is_interface: bool,
    },
    NameAndType {
        name: String,
        descriptor: String,
    },
    MethodHandle {
        handle_kind: HandleKind,
        member: ConstantIndex,
    },
    MethodType(String),
    Dynamic {
        bootstrap_method: u16,
        name: String,
        descriptor: String,
    },
    InvokeDynamic {
        bootstrap_method: u16,
        name: String,
        descriptor: String,
    },
    Module(String),
    Package(String),
}

/// Symbolic reference to a field or method
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MemberRef {
    pub owner: String,
    pub name: String,
    pub descriptor: String,
}

impl Width for PoolEntry {
    fn width(&self) -> usize {
        match self {
            PoolEntry::Long(_) | PoolEntry::Double(_) => 2,
            _ => 1,
        }
    }
}

/// Resolved constant pool of a class
///
/// Entries keep the exact slot they had in the class file they were decoded from. Method bodies
/// (and any attribute we don't pick apart) refer to the pool by slot, so keeping slots stable is
/// what lets them be carried through untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstantPool {
    entries: OffsetVec<PoolEntry>,
}

impl Default for ConstantPool {
    fn default() -> Self {
        ConstantPool::new()
    }
}

impl ConstantPool {
    pub fn new() -> ConstantPool {
        ConstantPool {
            entries: OffsetVec::new_starting_at(Offset(1)),
        }
    }

    /// Resolve every entry of a raw constant pool
    pub fn from_class_file(class_file: &ClassFile) -> Result<ConstantPool, Error> {
        let member_ref = |class: ClassConstantIndex, name_and_type: NameAndTypeConstantIndex| {
            let (name, descriptor) = class_file.name_and_type(name_and_type)?;
            Ok::<_, Error>(MemberRef {
                owner: class_file.class_name(class)?.to_owned(),
                name: name.to_owned(),
                descriptor: descriptor.to_owned(),
            })
        };

        let mut entries = OffsetVec::new_starting_at(Offset(1));
        for (_, constant) in class_file.constants.iter() {
            let entry = match constant {
                Constant::Utf8(string) => PoolEntry::Utf8(string.clone()),
                Constant::RawUtf8(bytes) => PoolEntry::RawUtf8(bytes.clone()),
                Constant::Integer(integer) => PoolEntry::Integer(*integer),
                Constant::Float(float) => PoolEntry::Float(*float),
                Constant::Long(long) => PoolEntry::Long(*long),
                Constant::Double(double) => PoolEntry::Double(*double),
                Constant::Class(name) => PoolEntry::Class(class_file.utf8(*name)?.to_owned()),
                Constant::String(string) => match class_file.constant(*string)? {
                    Constant::RawUtf8(_) => PoolEntry::RawString(*string),
                    _ => PoolEntry::String(class_file.utf8(*string)?.to_owned()),
                },
                Constant::FieldRef(class, name_and_type) => {
                    PoolEntry::FieldRef(member_ref(*class, *name_and_type)?)
                }
                Constant::MethodRef {
                    class,
                    name_and_type,
                    is_interface,
                } => PoolEntry::MethodRef {
                    member: member_ref(*class, *name_and_type)?,
                    is_interface: *is_interface,
                },
                Constant::NameAndType { name, descriptor } => PoolEntry::NameAndType {
                    name: class_file.utf8(*name)?.to_owned(),
                    descriptor: class_file.utf8(*descriptor)?.to_owned(),
                },
                Constant::MethodHandle {
                    handle_kind,
                    member,
                } => {
                    match class_file.constant(*member)? {
                        Constant::FieldRef(..) | Constant::MethodRef { .. } => (),
                        other => {
                            return Err(Error::malformed(format!(
                                "method handle points at {:?}",
                                other
                            )))
                        }
                    }
                    PoolEntry::MethodHandle {
                        handle_kind: *handle_kind,
                        member: *member,
                    }
                }
                Constant::MethodType { descriptor } => {
                    PoolEntry::MethodType(class_file.utf8(*descriptor)?.to_owned())
                }
                Constant::Dynamic {
                    bootstrap_method,
                    name_and_type,
                } => {
                    let (name, descriptor) = class_file.name_and_type(*name_and_type)?;
                    PoolEntry::Dynamic {
                        bootstrap_method: *bootstrap_method,
                        name: name.to_owned(),
                        descriptor: descriptor.to_owned(),
                    }
                }
                Constant::InvokeDynamic {
                    bootstrap_method,
                    name_and_type,
                } => {
                    let (name, descriptor) = class_file.name_and_type(*name_and_type)?;
                    PoolEntry::InvokeDynamic {
                        bootstrap_method: *bootstrap_method,
                        name: name.to_owned(),
                        descriptor: descriptor.to_owned(),
                    }
                }
                Constant::Module(name) => PoolEntry::Module(class_file.utf8(*name)?.to_owned()),
                Constant::Package(name) => PoolEntry::Package(class_file.utf8(*name)?.to_owned()),
            };
            entries.push(entry);
        }

        Ok(ConstantPool { entries })
    }

    /// Number of entries (not slots)
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Add an entry to the end of the pool, returning its slot
    pub fn push(&mut self, entry: PoolEntry) -> ConstantIndex {
        ConstantIndex(self.entries.push(entry).0 as u16)
    }

    pub fn get(&self, index: ConstantIndex) -> Option<&PoolEntry> {
        self.entries.get_offset(Offset(index.0 as usize))
    }

    pub fn iter(&self) -> impl Iterator<Item = (ConstantIndex, &PoolEntry)> + '_ {
        self.entries
            .iter()
            .map(|(offset, entry)| (ConstantIndex(offset.0 as u16), entry))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (ConstantIndex, &mut PoolEntry)> + '_ {
        self.entries
            .iter_mut()
            .map(|(offset, entry)| (ConstantIndex(offset.0 as u16), entry))
    }
}

/// Class file constants pool builder
///
/// The pool starts out as a copy of a [`ConstantPool`] (every entry in its original slot) and is
/// append only from there on. Strings, classes, and name & type pairs get deduplicated so that
/// re-encoding an unchanged class does not grow its pool.
pub struct ConstantsPool {
    constants: OffsetVec<Constant>,
    utf8s: HashMap<String, Utf8ConstantIndex>,
    classes: HashMap<Utf8ConstantIndex, ClassConstantIndex>,
    name_and_types: HashMap<(Utf8ConstantIndex, Utf8ConstantIndex), NameAndTypeConstantIndex>,
}

impl ConstantsPool {
    /// Build up a pool whose first slots line up exactly with `pool`
    pub fn seeded_from(pool: &ConstantPool) -> Result<ConstantsPool, Error> {
        let mut constants = ConstantsPool {
            constants: OffsetVec::new_starting_at(Offset(1)),
            utf8s: HashMap::new(),
            classes: HashMap::new(),
            name_and_types: HashMap::new(),
        };

        // Reserve every slot first, so that anything appended lands after the seeded entries
        for (index, entry) in pool.iter() {
            let constant = match entry {
                PoolEntry::Utf8(string) => {
                    constants
                        .utf8s
                        .entry(string.clone())
                        .or_insert(Utf8ConstantIndex(index));
                    Constant::Utf8(string.clone())
                }
                PoolEntry::RawUtf8(bytes) => Constant::RawUtf8(bytes.clone()),
                PoolEntry::Integer(integer) => Constant::Integer(*integer),
                PoolEntry::Float(float) => Constant::Float(*float),
                PoolEntry::Long(long) => Constant::Long(*long),
                PoolEntry::Double(double) => Constant::Double(*double),
                _ => Constant::Integer(0),
            };
            constants.push_constant(constant)?;
        }

        // Classes and name & types before the rest, so references to them can be deduplicated
        for (index, entry) in pool.iter() {
            let constant = match entry {
                PoolEntry::Class(name) => {
                    let name = constants.get_utf8(name)?;
                    constants
                        .classes
                        .entry(name)
                        .or_insert(ClassConstantIndex(index));
                    Constant::Class(name)
                }
                PoolEntry::NameAndType { name, descriptor } => {
                    let name = constants.get_utf8(name)?;
                    let descriptor = constants.get_utf8(descriptor)?;
                    constants
                        .name_and_types
                        .entry((name, descriptor))
                        .or_insert(NameAndTypeConstantIndex(index));
                    Constant::NameAndType { name, descriptor }
                }
                _ => continue,
            };
            constants.set_constant(index, constant);
        }

        for (index, entry) in pool.iter() {
            let constant = match entry {
                PoolEntry::String(string) => Constant::String(constants.get_utf8(string)?),
                PoolEntry::RawString(string) => Constant::String(*string),
                PoolEntry::FieldRef(member) => {
                    let class = constants.get_class(&member.owner)?;
                    let name_and_type =
                        constants.get_name_and_type(&member.name, &member.descriptor)?;
                    Constant::FieldRef(class, name_and_type)
                }
                PoolEntry::MethodRef {
                    member,
                    is_interface,
                } => Constant::MethodRef {
                    class: constants.get_class(&member.owner)?,
                    name_and_type: constants.get_name_and_type(&member.name, &member.descriptor)?,
                    is_interface: *is_interface,
                },
                PoolEntry::MethodHandle {
                    handle_kind,
                    member,
                } => Constant::MethodHandle {
                    handle_kind: *handle_kind,
                    member: *member,
                },
                PoolEntry::MethodType(descriptor) => Constant::MethodType {
                    descriptor: constants.get_utf8(descriptor)?,
                },
                PoolEntry::Dynamic {
                    bootstrap_method,
                    name,
                    descriptor,
                } => Constant::Dynamic {
                    bootstrap_method: *bootstrap_method,
                    name_and_type: constants.get_name_and_type(name, descriptor)?,
                },
                PoolEntry::InvokeDynamic {
                    bootstrap_method,
                    name,
                    descriptor,
                } => Constant::InvokeDynamic {
                    bootstrap_method: *bootstrap_method,
                    name_and_type: constants.get_name_and_type(name, descriptor)?,
                },
                PoolEntry::Module(name) => Constant::Module(constants.get_utf8(name)?),
                PoolEntry::Package(name) => Constant::Package(constants.get_utf8(name)?),
                _ => continue,
            };
            constants.set_constant(index, constant);
        }

        Ok(constants)
    }

    /// Push a constant into the constant pool, provided there is space for it
    ///
    /// Note: the largest valid index is 65535, indexing starts at 1, and some constants take two
    /// spaces.
    fn push_constant(&mut self, constant: Constant) -> Result<ConstantIndex, Error> {
        let Offset(offset) = self.constants.offset_len();

        if offset + constant.width() <= u16::MAX.into() {
            let _ = self.constants.push(constant);
            Ok(ConstantIndex(offset as u16))
        } else {
            Err(Error::ConstantPoolOverflow { constant, offset })
        }
    }

    fn set_constant(&mut self, index: ConstantIndex, constant: Constant) {
        if let Some(slot) = self.constants.get_offset_mut(Offset(index.0 as usize)) {
            *slot = constant;
        }
    }

    /// Consume the pool and return the final vector of constants
    pub fn into_offset_vec(self) -> OffsetVec<Constant> {
        self.constants
    }

    /// Get or insert a utf8 constant from the constant pool
    pub fn get_utf8(&mut self, utf8: &str) -> Result<Utf8ConstantIndex, Error> {
        if let Some(idx) = self.utf8s.get(utf8) {
            Ok(*idx)
        } else {
            let idx = Utf8ConstantIndex(self.push_constant(Constant::Utf8(utf8.to_owned()))?);
            self.utf8s.insert(utf8.to_owned(), idx);
            Ok(idx)
        }
    }

    /// Get or insert a class constant from the constant pool
    pub fn get_class(&mut self, name: &str) -> Result<ClassConstantIndex, Error> {
        let name = self.get_utf8(name)?;
        if let Some(idx) = self.classes.get(&name) {
            Ok(*idx)
        } else {
            let idx = ClassConstantIndex(self.push_constant(Constant::Class(name))?);
            self.classes.insert(name, idx);
            Ok(idx)
        }
    }

    /// Get or insert a name & type constant from the constant pool
    pub fn get_name_and_type(
        &mut self,
        name: &str,
        descriptor: &str,
    ) -> Result<NameAndTypeConstantIndex, Error> {
        let name = self.get_utf8(name)?;
        let descriptor = self.get_utf8(descriptor)?;
        if let Some(idx) = self.name_and_types.get(&(name, descriptor)) {
            Ok(*idx)
        } else {
            let constant = Constant::NameAndType { name, descriptor };
            let idx = NameAndTypeConstantIndex(self.push_constant(constant)?);
            self.name_and_types.insert((name, descriptor), idx);
            Ok(idx)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_pool() -> ConstantPool {
        let mut pool = ConstantPool::new();
        pool.push(PoolEntry::Utf8(String::from("a")));
        pool.push(PoolEntry::Class(String::from("a")));
        pool.push(PoolEntry::Long(7));
        pool.push(PoolEntry::FieldRef(MemberRef {
            owner: String::from("a"),
            name: String::from("b"),
            descriptor: String::from("I"),
        }));
        pool
    }

    #[test]
    fn seeded_slots_stay_put() {
        let pool = sample_pool();
        let constants = ConstantsPool::seeded_from(&pool).unwrap().into_offset_vec();

        assert_eq!(
            constants.get_offset(Offset(1)),
            Some(&Constant::Utf8(String::from("a")))
        );
        assert_eq!(
            constants.get_offset(Offset(2)),
            Some(&Constant::Class(Utf8ConstantIndex(ConstantIndex(1))))
        );
        assert_eq!(constants.get_offset(Offset(3)), Some(&Constant::Long(7)));

        // The field ref reuses the class, but needs a fresh name & type appended
        match constants.get_offset(Offset(5)) {
            Some(Constant::FieldRef(class, _)) => assert_eq!(*class, ClassConstantIndex(ConstantIndex(2))),
            other => panic!("unexpected constant {:?}", other),
        }
        assert_eq!(constants.offset_len(), Offset(9));
    }

    #[test]
    fn renamed_classes_get_new_names() {
        let mut pool = sample_pool();
        for (_, entry) in pool.iter_mut() {
            if let PoolEntry::Class(name) = entry {
                *name = String::from("net/minecraft/Foo");
            }
        }
        let constants = ConstantsPool::seeded_from(&pool).unwrap().into_offset_vec();

        // Original utf8 stays where it was, the new name is appended
        assert_eq!(
            constants.get_offset(Offset(1)),
            Some(&Constant::Utf8(String::from("a")))
        );
        let new_name = match constants.get_offset(Offset(2)) {
            Some(Constant::Class(name)) => *name,
            other => panic!("unexpected constant {:?}", other),
        };
        assert_eq!(
            constants.get_offset(Offset((new_name.0).0 as usize)),
            Some(&Constant::Utf8(String::from("net/minecraft/Foo")))
        );
    }
}
