use crate::jvm::class_file::{
    ClassConstantIndex, ClassFile, ConstantIndex, Utf8ConstantIndex,
};
use crate::jvm::{read_bytes, Deserialize, Error};
use std::io::{Cursor, ErrorKind};

/// Cursor over the body of an attribute, which resolves constant pool references as it goes
///
/// Every failure (running out of bytes, dangling or mistyped pool references) is reported as
/// malformed class data.
pub(crate) struct AttributeReader<'a> {
    class_file: &'a ClassFile,
    attribute: &'a str,
    cursor: Cursor<&'a [u8]>,
}

impl<'a> AttributeReader<'a> {
    pub fn new(class_file: &'a ClassFile, attribute: &'a str, info: &'a [u8]) -> Self {
        AttributeReader {
            class_file,
            attribute,
            cursor: Cursor::new(info),
        }
    }

    fn read<T: Deserialize>(&mut self) -> Result<T, Error> {
        T::deserialize(&mut self.cursor).map_err(|err| {
            if err.kind() == ErrorKind::UnexpectedEof {
                Error::malformed(format!("truncated {} attribute", self.attribute))
            } else {
                Error::malformed(format!("{} attribute: {}", self.attribute, err))
            }
        })
    }

    pub fn u8(&mut self) -> Result<u8, Error> {
        self.read()
    }

    pub fn u16(&mut self) -> Result<u16, Error> {
        self.read()
    }

    pub fn u32(&mut self) -> Result<u32, Error> {
        self.read()
    }

    pub fn index(&mut self) -> Result<ConstantIndex, Error> {
        self.read()
    }

    pub fn bytes(&mut self, len: usize) -> Result<Vec<u8>, Error> {
        let attribute = self.attribute;
        read_bytes(&mut self.cursor, len)
            .map_err(|_| Error::malformed(format!("truncated {} attribute", attribute)))
    }

    /// Read an index and resolve it as a utf8 constant
    pub fn utf8(&mut self) -> Result<String, Error> {
        let index = Utf8ConstantIndex(self.index()?);
        Ok(self.class_file.utf8(index)?.to_owned())
    }

    /// Read an index and resolve it as a class constant
    pub fn class_name(&mut self) -> Result<String, Error> {
        let index = ClassConstantIndex(self.index()?);
        Ok(self.class_file.class_name(index)?.to_owned())
    }

    /// Check that the whole attribute has been consumed
    pub fn finish(self) -> Result<(), Error> {
        let consumed = self.cursor.position() as usize;
        let len = self.cursor.get_ref().len();
        if consumed != len {
            return Err(Error::malformed(format!(
                "{} attribute has {} unexpected trailing bytes",
                self.attribute,
                len - consumed
            )));
        }
        Ok(())
    }
}
