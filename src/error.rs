use cookie_factory::GenError;
use std::io;
use thiserror::Error;

/// Fatal errors, aborting an import
///
/// Recoverable conditions (inconsistent offsets, unparseable timestamps, invalid data characters,
/// regex matches without data) are not errors: they are logged and counted in
/// [`ImportStats`](crate::ImportStats).
#[derive(Debug, Error)]
pub enum ImportError {
    /// A token that must be a number could not be parsed
    #[error("line {line}: unable to parse number from '{token}'")]
    InvalidNumericLiteral { token: String, line: usize },

    /// Reading the text input failed
    #[error("read error: {0}")]
    Read(#[from] io::Error),

    /// Writing the capture file failed. The OS error is preserved.
    #[error("write error: {0}")]
    Write(#[source] io::Error),

    /// Block serialization failed
    #[error("serialization error: {0}")]
    Serialize(String),

    #[error("invalid regular expression: {0}")]
    InvalidPattern(#[from] regex::Error),

    /// The import pattern has no `data` named group
    #[error("the import pattern must contain a named group 'data'")]
    MissingDataGroup,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl From<GenError> for ImportError {
    fn from(e: GenError) -> Self {
        match e {
            GenError::IoError(e) => ImportError::Write(e),
            e => ImportError::Serialize(format!("{:?}", e)),
        }
    }
}

impl ImportError {
    /// Return the OS error code of an I/O failure, if any
    pub fn raw_os_error(&self) -> Option<i32> {
        match self {
            ImportError::Read(e) | ImportError::Write(e) => e.raw_os_error(),
            _ => None,
        }
    }
}
