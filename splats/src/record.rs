use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

pub fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

pub fn inverse_sigmoid(x: f32) -> f32 {
    (x / (1.0 - x)).ln()
}

/// One Gaussian in its optimisation parameterisation: log-space scale, logit-space opacity and
/// SH colour coefficients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplatRecord {
    pub position: Vec3,
    pub log_scale: Vec3,
    /// Not necessarily normalized.
    pub rotation: Quat,
    pub raw_opacity: f32,
    pub sh_dc: Vec3,
    /// Higher-order coefficients, one RGB triple per basis function.
    pub sh_rest: Vec<Vec3>,
}

impl SplatRecord {
    pub fn scale(&self) -> Vec3 {
        self.log_scale.exp()
    }

    pub fn opacity(&self) -> f32 {
        sigmoid(self.raw_opacity)
    }

    /// The rotation scaled to unit length, `None` when it has no length to scale.
    pub fn unit_rotation(&self) -> Option<Quat> {
        let len = self.rotation.length();
        (len > 0.0 && len.is_finite()).then(|| self.rotation / len)
    }

    /// Sum of the natural-domain scales. Larger splats come first in the compact stream.
    pub fn render_priority(&self) -> f32 {
        self.scale().element_sum()
    }
}
