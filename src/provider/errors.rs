use crate::jvm;
use crate::mappings::MappingError;
use std::fmt::{Display, Formatter, Result as FmtResult};

#[derive(Debug)]
pub enum Error {
    /// Reading from the mod or writing a materialized resource failed
    Io(std::io::Error),

    /// Class bytes were read but do not decode
    MalformedClass { name: String, error: jvm::Error },

    /// Transformed class could not be encoded
    Encode { name: String, error: jvm::Error },

    Mappings(MappingError),
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Error::Io(err) => write!(f, "i/o error: {}", err),
            Error::MalformedClass { name, error } => write!(f, "class {}: {}", name, error),
            Error::Encode { name, error } => write!(f, "cannot encode class {}: {}", name, error),
            Error::Mappings(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            Error::MalformedClass { error, .. } | Error::Encode { error, .. } => Some(error),
            Error::Mappings(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}

impl From<MappingError> for Error {
    fn from(err: MappingError) -> Error {
        Error::Mappings(err)
    }
}
