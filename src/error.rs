use std::io;

/// Compiler error types
#[derive(Debug)]
pub enum Error {
    /// IO error occurred
    Io(io::Error),

    /// Malformed map source at a specific byte offset
    Parse { position: usize, message: String },

    /// Required entity or key missing, or a cross reference out of range
    Schema(String),

    /// A sector's walls do not form exactly one simple closed loop
    Geometry { sector: usize, message: String },

    /// A name or image breaks a hard format limit (8-byte names, palette
    /// membership, power-of-two dimensions)
    Constraint(String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Io(e) => write!(f, "IO error: {}", e),
            Error::Parse { position, message } => {
                write!(f, "Parse error at offset {}: {}", position, message)
            }
            Error::Schema(msg) => write!(f, "Schema error: {}", msg),
            Error::Geometry { sector, message } => {
                write!(f, "Geometry error in sector {}: {}", sector, message)
            }
            Error::Constraint(msg) => write!(f, "Constraint error: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Io(err)
    }
}

/// Result type for compiler operations
pub type Result<T> = std::result::Result<T, Error>;
