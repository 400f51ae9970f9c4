use glam::DVec3;
use serde::Serialize;

/// Sparse point. The observation track stored next to it in the binary table is dropped at
/// parse time.
#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct SparsePoint {
    pub xyz: DVec3,
    pub rgb: [u8; 3],
}
