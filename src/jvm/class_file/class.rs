use crate::jvm::class_file::{
    Attribute, ClassConstantIndex, Constant, ConstantIndex, Field, Method,
    NameAndTypeConstantIndex, Utf8ConstantIndex, Version,
};
use crate::jvm::{ClassAccessFlags, Deserialize, Error, Serialize};
use crate::util::{Offset, OffsetVec};
use byteorder::{ReadBytesExt, WriteBytesExt};
use std::io::{Cursor, ErrorKind};

/// Representation of the [`class` file format of the JVM][0]
///
/// [0]: https://docs.oracle.com/javase/specs/jvms/se15/html/jvms-4.html
#[derive(Debug, Clone, PartialEq)]
pub struct ClassFile {
    pub version: Version,
    pub constants: OffsetVec<Constant>,
    pub access_flags: ClassAccessFlags,
    pub this_class: ClassConstantIndex,

    /// `ConstantIndex::NONE` only for `java/lang/Object` and `module-info`
    pub super_class: ClassConstantIndex,
    pub interfaces: Vec<ClassConstantIndex>,
    pub fields: Vec<Field>,
    pub methods: Vec<Method>,
    pub attributes: Vec<Attribute>,
}

impl ClassFile {
    /// Magic header bytes that go at the front of the serialized class file
    const MAGIC: [u8; 4] = [0xCA, 0xFE, 0xBA, 0xBE];

    /// Parse a class file, rejecting trailing bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<ClassFile, Error> {
        let mut cursor = Cursor::new(bytes);
        let class_file = ClassFile::deserialize(&mut cursor).map_err(|err| {
            if err.kind() == ErrorKind::UnexpectedEof {
                Error::malformed("truncated class file")
            } else {
                Error::malformed(err.to_string())
            }
        })?;
        if cursor.position() as usize != bytes.len() {
            return Err(Error::malformed(format!(
                "{} unexpected trailing bytes",
                bytes.len() - cursor.position() as usize
            )));
        }
        Ok(class_file)
    }

    /// Serialize the class file into a fresh buffer
    pub fn to_bytes(&self) -> Result<Vec<u8>, Error> {
        let mut bytes = vec![];
        self.serialize(&mut bytes).map_err(Error::IoError)?;
        Ok(bytes)
    }

    /// Look up a constant, failing if the index does not point at the start of an entry
    pub fn constant(&self, index: impl Into<ConstantIndex>) -> Result<&Constant, Error> {
        let index: ConstantIndex = index.into();
        self.constants
            .get_offset(Offset(index.0 as usize))
            .ok_or_else(|| Error::malformed(format!("invalid constant pool index {}", index.0)))
    }

    /// Look up a `CONSTANT_Utf8_info`
    pub fn utf8(&self, index: Utf8ConstantIndex) -> Result<&str, Error> {
        match self.constant(index)? {
            Constant::Utf8(string) => Ok(string),
            Constant::RawUtf8(_) => Err(Error::malformed(format!(
                "constant {} is not valid UTF-16",
                (index.0).0
            ))),
            other => Err(Error::malformed(format!(
                "constant {} should be Utf8, but is {:?}",
                (index.0).0,
                other
            ))),
        }
    }

    /// Look up the name in a `CONSTANT_Class_info`
    pub fn class_name(&self, index: ClassConstantIndex) -> Result<&str, Error> {
        match self.constant(index)? {
            Constant::Class(name) => self.utf8(*name),
            other => Err(Error::malformed(format!(
                "constant {} should be Class, but is {:?}",
                (index.0).0,
                other
            ))),
        }
    }

    /// Look up a `CONSTANT_NameAndType_info`, returning the name and descriptor
    pub fn name_and_type(&self, index: NameAndTypeConstantIndex) -> Result<(&str, &str), Error> {
        match self.constant(index)? {
            Constant::NameAndType { name, descriptor } => {
                Ok((self.utf8(*name)?, self.utf8(*descriptor)?))
            }
            other => Err(Error::malformed(format!(
                "constant {} should be NameAndType, but is {:?}",
                (index.0).0,
                other
            ))),
        }
    }
}

impl Serialize for ClassFile {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> std::io::Result<()> {
        writer.write_all(&ClassFile::MAGIC)?;
        self.version.serialize(writer)?;
        (self.constants.offset_len().0 as u16).serialize(writer)?;
        for (_, constant) in self.constants.iter() {
            constant.serialize(writer)?;
        }
        self.access_flags.serialize(writer)?;
        self.this_class.serialize(writer)?;
        self.super_class.serialize(writer)?;
        self.interfaces.serialize(writer)?;
        self.fields.serialize(writer)?;
        self.methods.serialize(writer)?;
        self.attributes.serialize(writer)?;
        Ok(())
    }
}

impl Deserialize for ClassFile {
    fn deserialize<R: ReadBytesExt>(reader: &mut R) -> std::io::Result<Self> {
        use std::io::Error as IoError;

        let mut magic = [0; 4];
        reader.read_exact(&mut magic)?;
        if magic != ClassFile::MAGIC {
            let msg = format!("Bad magic header {:02X?}", magic);
            return Err(IoError::new(ErrorKind::InvalidData, msg));
        }

        let version = Version::deserialize(reader)?;
        if !version.is_supported() {
            let msg = format!(
                "Unsupported class file version {}.{}",
                version.major_version, version.minor_version
            );
            return Err(IoError::new(ErrorKind::InvalidData, msg));
        }

        // The count is one more than the number of slots, since slot 0 is unused
        let constants_count = u16::deserialize(reader)? as usize;
        let mut constants = OffsetVec::new_starting_at(Offset(1));
        while constants.offset_len().0 < constants_count {
            constants.push(Constant::deserialize(reader)?);
        }
        if constants.offset_len().0 != constants_count.max(1) {
            let msg = "Wide constant overruns the end of the constant pool";
            return Err(IoError::new(ErrorKind::InvalidData, msg));
        }

        Ok(ClassFile {
            version,
            constants,
            access_flags: ClassAccessFlags::deserialize(reader)?,
            this_class: ClassConstantIndex::deserialize(reader)?,
            super_class: ClassConstantIndex::deserialize(reader)?,
            interfaces: Vec::deserialize(reader)?,
            fields: Vec::deserialize(reader)?,
            methods: Vec::deserialize(reader)?,
            attributes: Vec::deserialize(reader)?,
        })
    }
}
