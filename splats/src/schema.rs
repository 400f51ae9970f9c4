use glam::{Quat, Vec3};
use crate::error::{Result, SplatError};
use crate::ply::AttributeFile;
use crate::record::SplatRecord;

/// Fields an attribute file needs before it can be read as splats.
pub const REQUIRED_FIELDS: [&str; 14] = [
    "x", "y", "z", "f_dc_0", "f_dc_1", "f_dc_2", "opacity", "scale_0", "scale_1", "scale_2",
    "rot_0", "rot_1", "rot_2", "rot_3",
];

/// Random access to the splat parameters the compact encoding consumes.
pub trait SplatSource: Sync {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn position(&self, index: usize) -> Vec3;
    fn log_scale(&self, index: usize) -> Vec3;
    /// As stored, possibly not unit length.
    fn rotation(&self, index: usize) -> Quat;
    fn raw_opacity(&self, index: usize) -> f32;
    fn sh_dc(&self, index: usize) -> Vec3;
}

impl SplatSource for [SplatRecord] {
    fn len(&self) -> usize {
        <[SplatRecord]>::len(self)
    }

    fn position(&self, index: usize) -> Vec3 {
        self[index].position
    }

    fn log_scale(&self, index: usize) -> Vec3 {
        self[index].log_scale
    }

    fn rotation(&self, index: usize) -> Quat {
        self[index].rotation
    }

    fn raw_opacity(&self, index: usize) -> f32 {
        self[index].raw_opacity
    }

    fn sh_dc(&self, index: usize) -> Vec3 {
        self[index].sh_dc
    }
}

/// Column indices of the splat fields in an [`AttributeFile`], resolved once up front.
pub struct SplatColumns<'a> {
    file: &'a AttributeFile,
    position: [usize; 3],
    sh_dc: [usize; 3],
    opacity: usize,
    log_scale: [usize; 3],
    rotation: [usize; 4],
    /// `f_rest_0..`, in index order.
    sh_rest: Vec<usize>,
}

impl<'a> SplatColumns<'a> {
    /// Fails with the name of the first required field the file lacks. Higher-order fields are
    /// collected but not validated until records are built from them.
    pub fn resolve(file: &'a AttributeFile) -> Result<Self> {
        let mut indices = [0usize; REQUIRED_FIELDS.len()];
        for (slot, name) in indices.iter_mut().zip(REQUIRED_FIELDS) {
            *slot = file
                .field_index(name)
                .ok_or_else(|| SplatError::MissingField(name.to_string()))?;
        }

        let sh_rest: Vec<usize> = (0..)
            .map_while(|i| file.field_index(&format!("f_rest_{i}")))
            .collect();

        let [x, y, z, dc0, dc1, dc2, opacity, s0, s1, s2, r0, r1, r2, r3] = indices;
        Ok(Self {
            file,
            position: [x, y, z],
            sh_dc: [dc0, dc1, dc2],
            opacity,
            log_scale: [s0, s1, s2],
            rotation: [r0, r1, r2, r3],
            sh_rest,
        })
    }

    /// Number of higher-order coefficient triples per splat. Fails if the `f_rest_*` fields
    /// don't form whole RGB triples.
    pub fn sh_rest_count(&self) -> Result<usize> {
        if self.sh_rest.len() % 3 != 0 {
            return Err(SplatError::RestFieldCount(self.sh_rest.len()));
        }
        Ok(self.sh_rest.len() / 3)
    }

    fn vec3(&self, row: usize, fields: [usize; 3]) -> Vec3 {
        Vec3::from_array(fields.map(|f| self.file.value(row, f)))
    }

    pub fn record(&self, row: usize) -> Result<SplatRecord> {
        self.sh_rest_count()?;
        Ok(self.build_record(row))
    }

    pub fn records(&self) -> Result<Vec<SplatRecord>> {
        self.sh_rest_count()?;
        Ok((0..self.len()).map(|row| self.build_record(row)).collect())
    }

    fn build_record(&self, row: usize) -> SplatRecord {
        let sh_rest = self
            .sh_rest
            .chunks_exact(3)
            .map(|c| self.vec3(row, [c[0], c[1], c[2]]))
            .collect();
        SplatRecord {
            position: self.position(row),
            log_scale: self.log_scale(row),
            rotation: self.rotation(row),
            raw_opacity: self.raw_opacity(row),
            sh_dc: self.sh_dc(row),
            sh_rest,
        }
    }
}

impl SplatSource for SplatColumns<'_> {
    fn len(&self) -> usize {
        self.file.row_count()
    }

    fn position(&self, index: usize) -> Vec3 {
        self.vec3(index, self.position)
    }

    fn log_scale(&self, index: usize) -> Vec3 {
        self.vec3(index, self.log_scale)
    }

    fn rotation(&self, index: usize) -> Quat {
        let [w, x, y, z] = self.rotation.map(|f| self.file.value(index, f));
        Quat::from_xyzw(x, y, z, w)
    }

    fn raw_opacity(&self, index: usize) -> f32 {
        self.file.value(index, self.opacity)
    }

    fn sh_dc(&self, index: usize) -> Vec3 {
        self.vec3(index, self.sh_dc)
    }
}
