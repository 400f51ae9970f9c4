use glam::{DAffine3, DMat3, DQuat, DVec3};
use serde::Serialize;
use crate::error::{Result, SceneError};

/// Registered image: world-to-camera rotation and translation plus the camera it was shot with.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CameraPose {
    pub image_id: u32,
    pub camera_id: u32,
    /// Stored as read, not normalized.
    pub rotation: DQuat,
    pub translation: DVec3,
    pub name: String,
}

impl CameraPose {
    /// The rotation scaled to unit length. A zero (or non finite) quaternion has no orientation.
    pub fn unit_rotation(&self) -> Result<DQuat> {
        let len = self.rotation.length();
        if len == 0.0 || !len.is_finite() {
            return Err(SceneError::ZeroNormRotation {
                image_id: self.image_id,
            });
        }
        Ok(self.rotation / len)
    }

    pub fn rotation_matrix(&self) -> Result<DMat3> {
        Ok(DMat3::from_quat(self.unit_rotation()?))
    }

    pub fn world_to_camera(&self) -> Result<DAffine3> {
        Ok(DAffine3::from_rotation_translation(
            self.unit_rotation()?,
            self.translation,
        ))
    }

    /// Inverse of [`Self::world_to_camera`]: `R^T | -R^T t`.
    pub fn camera_to_world(&self) -> Result<DAffine3> {
        let rot = self.unit_rotation()?.conjugate();
        Ok(DAffine3::from_rotation_translation(
            rot,
            -(rot * self.translation),
        ))
    }

    /// Camera position in world space.
    pub fn camera_center(&self) -> Result<DVec3> {
        let rot = self.unit_rotation()?;
        Ok(-(rot.conjugate() * self.translation))
    }

    /// Moves the camera to `center` keeping its orientation.
    pub fn set_camera_center(&mut self, center: DVec3) -> Result<()> {
        let rot = self.unit_rotation()?;
        self.translation = -(rot * center);
        Ok(())
    }
}
