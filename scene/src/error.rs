use std::fmt;
use thiserror::Error;

pub(crate) type Result<T> = std::result::Result<T, SceneError>;

/// One of the three tables of a sparse reconstruction bundle.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Table {
    Cameras,
    Images,
    Points3D,
}

impl Table {
    pub fn file_name(&self) -> &'static str {
        match self {
            Table::Cameras => "cameras.bin",
            Table::Images => "images.bin",
            Table::Points3D => "points3D.bin",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_name())
    }
}

#[derive(Debug, Error)]
pub enum ParseErrorKind {
    #[error("unexpected end of input")]
    Truncated,

    #[error("image name is not valid UTF-8: {0}")]
    InvalidName(#[from] std::str::Utf8Error),

    #[error("read failed: {0}")]
    Io(std::io::Error),
}

/// Malformed binary input. `record` is `None` while reading the table's count header.
#[derive(Debug, Error)]
#[error("{table}: {kind} ({}, byte offset {offset})", describe_record(.record))]
pub struct ParseError {
    pub table: Table,
    pub record: Option<u64>,
    pub offset: u64,
    pub kind: ParseErrorKind,
}

fn describe_record(record: &Option<u64>) -> String {
    match record {
        Some(index) => format!("record {index}"),
        None => String::from("table header"),
    }
}

#[derive(Debug, Error)]
pub enum SceneError {
    #[error("Failed to parse reconstruction: {0}")]
    Parse(#[from] ParseError),

    #[error("Reconstruction file {0} could not be found")]
    MissingFile(Table),

    #[error("Cannot normalize an empty point cloud")]
    EmptyPointCloud,

    #[error("Cannot normalize scene: all {points} points coincide, scale is zero")]
    DegenerateScale { points: usize },

    #[error("Image {image_id} has a zero-norm rotation quaternion")]
    ZeroNormRotation { image_id: u32 },

    #[error("Reconstruction has {found} registered images, at least {required} are required")]
    NotEnoughViews { found: usize, required: usize },

    #[error("File IO error: {0}")]
    File(#[from] std::io::Error),
}
