use glam::{DMat3, DVec2};
use serde::Serialize;

/// Intrinsics layout of a camera. The binary format knows many more models, only the two
/// pinhole shapes are distinguished here: id 0 carries one focal length, every other id is
/// read as a four parameter pinhole.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize)]
pub enum CameraModel {
    /// `f, cx, cy`
    SimplePinhole,
    /// `fx, fy, cx, cy`
    Pinhole,
}

impl CameraModel {
    pub fn from_id(id: i32) -> Self {
        match id {
            0 => Self::SimplePinhole,
            _ => Self::Pinhole,
        }
    }

    pub fn num_params(&self) -> usize {
        match self {
            Self::SimplePinhole => 3,
            Self::Pinhole => 4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Camera {
    pub id: u32,
    /// Model identifier as stored in the file. Unknown ids map to [`CameraModel::Pinhole`].
    pub model_id: i32,
    pub model: CameraModel,
    pub width: u64,
    pub height: u64,
    pub params: Vec<f64>,
}

impl Camera {
    pub fn focal(&self) -> (f64, f64) {
        match self.model {
            CameraModel::SimplePinhole => (self.params[0], self.params[0]),
            CameraModel::Pinhole => (self.params[0], self.params[1]),
        }
    }

    pub fn principal_point(&self) -> DVec2 {
        match self.model {
            CameraModel::SimplePinhole => DVec2::new(self.params[1], self.params[2]),
            CameraModel::Pinhole => DVec2::new(self.params[2], self.params[3]),
        }
    }

    /// The 3x3 pinhole projection matrix `K`.
    pub fn intrinsics(&self) -> DMat3 {
        let (fx, fy) = self.focal();
        let c = self.principal_point();
        DMat3::from_cols_array(&[fx, 0.0, 0.0, 0.0, fy, 0.0, c.x, c.y, 1.0])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera(model_id: i32, params: Vec<f64>) -> Camera {
        Camera {
            id: 1,
            model_id,
            model: CameraModel::from_id(model_id),
            width: 640,
            height: 480,
            params,
        }
    }

    #[test]
    fn simple_pinhole_shares_focal() {
        let cam = camera(0, vec![500.0, 320.0, 240.0]);
        assert_eq!(cam.focal(), (500.0, 500.0));
        assert_eq!(cam.principal_point(), DVec2::new(320.0, 240.0));
    }

    #[test]
    fn unknown_model_reads_as_pinhole() {
        let cam = camera(4, vec![500.0, 510.0, 320.0, 240.0]);
        assert_eq!(cam.model, CameraModel::Pinhole);
        assert_eq!(cam.focal(), (500.0, 510.0));

        let k = cam.intrinsics();
        assert_eq!(k.x_axis.x, 500.0);
        assert_eq!(k.y_axis.y, 510.0);
        assert_eq!(k.z_axis.x, 320.0);
        assert_eq!(k.z_axis.y, 240.0);
        assert_eq!(k.z_axis.z, 1.0);
    }
}
