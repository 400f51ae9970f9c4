mod parser;
mod reader;

use std::path::{Path, PathBuf};
use tokio::io::BufReader;
use walkdir::WalkDir;
use crate::error::{Result, SceneError, Table};

pub use parser::{parse_cameras, parse_images, parse_points};

/// Directory holding a binary sparse reconstruction, usually `<dataset>/sparse/0`.
#[derive(Debug, Clone)]
pub struct ColmapDir {
    cameras: PathBuf,
    images: PathBuf,
    points: PathBuf,
}

impl ColmapDir {
    /// Searches `root` recursively for the three tables. File names match case-insensitively.
    pub fn locate(root: &Path) -> Result<Self> {
        let find = |table: Table| {
            file_ending_in(root, table.file_name()).ok_or(SceneError::MissingFile(table))
        };

        Ok(Self {
            cameras: find(Table::Cameras)?,
            images: find(Table::Images)?,
            points: find(Table::Points3D)?,
        })
    }

    pub fn path(&self, table: Table) -> &Path {
        match table {
            Table::Cameras => &self.cameras,
            Table::Images => &self.images,
            Table::Points3D => &self.points,
        }
    }

    /// Opens `table` for buffered reading. The handle lives only as long as the returned reader.
    pub async fn open(&self, table: Table) -> Result<BufReader<tokio::fs::File>> {
        let file = tokio::fs::File::open(self.path(table)).await?;
        Ok(BufReader::new(file))
    }
}

fn file_ending_in(root: &Path, target_filename: &str) -> Option<PathBuf> {
    let target = target_filename.to_lowercase();
    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(std::result::Result::ok)
        .find_map(|entry| {
            let path = entry.path();
            let filename = path.file_name()?.to_str()?.to_lowercase();
            (entry.file_type().is_file() && filename == target).then(|| path.to_path_buf())
        })
}
