use super::Constant;
use std::fmt::{Display, Formatter, Result as FmtResult};

#[derive(Debug)]
pub enum Error {
    /// Bytes handed to the decoder are not a well-formed class file
    ///
    /// This covers a bad magic header, structures cut short by the end of the input, and
    /// references into the constant pool which point at nothing (or at the wrong kind of entry).
    MalformedClassData(String),

    /// Encoding needed more constant pool slots than a class file can hold
    ConstantPoolOverflow {
        constant: Constant,
        offset: usize,
    },

    IoError(std::io::Error),
}

impl Error {
    pub(crate) fn malformed(message: impl Into<String>) -> Error {
        Error::MalformedClassData(message.into())
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Error::MalformedClassData(msg) => write!(f, "malformed class data: {}", msg),
            Error::ConstantPoolOverflow { offset, .. } => {
                write!(f, "constant pool overflow at offset {}", offset)
            }
            Error::IoError(err) => write!(f, "i/o error: {}", err),
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Error {
        Error::IoError(err)
    }
}
