use thiserror::Error;

pub(crate) type Result<T> = std::result::Result<T, SplatError>;

#[derive(Debug, Error)]
pub enum SplatError {
    #[error("Attribute file is missing required field '{0}'")]
    MissingField(String),

    #[error("Row {row} has {found} values but the file declares {expected} fields")]
    RowWidth {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("Splat {index} has {found} higher-order SH coefficients, expected {expected}")]
    ShCountMismatch {
        index: usize,
        expected: usize,
        found: usize,
    },

    #[error("Found {0} f_rest_* fields, which is not a multiple of 3")]
    RestFieldCount(usize),

    #[error("Splat {index} has a zero-norm rotation quaternion")]
    ZeroNormRotation { index: usize },

    #[error("Invalid PLY header (line {line}): {reason}")]
    Header { line: usize, reason: String },

    #[error("Attribute file ends inside row {row} (byte offset {offset})")]
    Truncated { row: usize, offset: usize },

    #[error("Compact stream of {len} bytes is not a whole number of {stride} byte records")]
    Stride { len: usize, stride: usize },

    #[error("File IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SplatError {
    pub(crate) fn header(line: usize, reason: impl Into<String>) -> Self {
        SplatError::Header {
            line,
            reason: reason.into(),
        }
    }
}
