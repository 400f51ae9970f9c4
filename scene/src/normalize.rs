use std::collections::HashMap;
use glam::DVec3;
use log::info;
use serde::Serialize;
use crate::error::{Result, SceneError};
use crate::point::SparsePoint;
use crate::pose::CameraPose;

/// Affine map `p' = (p - center) / scale` into the canonical frame.
#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct SceneTransform {
    pub center: DVec3,
    pub scale: f64,
}

impl SceneTransform {
    /// `center` is the mean of the points, `scale` the largest distance from it.
    pub fn from_points(points: &[SparsePoint]) -> Result<Self> {
        if points.is_empty() {
            return Err(SceneError::EmptyPointCloud);
        }

        let center = points.iter().map(|p| p.xyz).sum::<DVec3>() / points.len() as f64;
        let scale = points
            .iter()
            .map(|p| p.xyz.distance(center))
            .fold(0.0, f64::max);

        if scale == 0.0 || !scale.is_finite() {
            return Err(SceneError::DegenerateScale {
                points: points.len(),
            });
        }

        Ok(Self { center, scale })
    }

    pub fn apply(&self, point: DVec3) -> DVec3 {
        (point - self.center) / self.scale
    }
}

/// Moves points and camera centres into the canonical frame. Camera orientations are kept.
///
/// Every pose is validated before anything is written, so on error neither `points` nor
/// `poses` have changed.
pub fn normalize(
    points: &mut [SparsePoint],
    poses: &mut HashMap<u32, CameraPose>,
) -> Result<SceneTransform> {
    let transform = SceneTransform::from_points(points)?;

    let centers = poses
        .iter()
        .map(|(id, pose)| Ok((*id, transform.apply(pose.camera_center()?))))
        .collect::<Result<Vec<_>>>()?;

    for point in points.iter_mut() {
        point.xyz = transform.apply(point.xyz);
    }
    for (id, center) in centers {
        if let Some(pose) = poses.get_mut(&id) {
            pose.set_camera_center(center)?;
        }
    }

    info!(
        "Normalized {} points and {} poses (center {:?}, scale {})",
        points.len(),
        poses.len(),
        transform.center,
        transform.scale
    );

    Ok(transform)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use glam::DQuat;

    fn points(xyz: &[[f64; 3]]) -> Vec<SparsePoint> {
        xyz.iter()
            .map(|p| SparsePoint {
                xyz: DVec3::from_array(*p),
                rgb: [0, 0, 0],
            })
            .collect()
    }

    fn pose(image_id: u32, rotation: DQuat, center: DVec3) -> CameraPose {
        let mut pose = CameraPose {
            image_id,
            camera_id: 1,
            rotation,
            translation: DVec3::ZERO,
            name: format!("{image_id}.jpg"),
        };
        pose.set_camera_center(center).unwrap();
        pose
    }

    #[test]
    fn corner_points_fill_unit_sphere() {
        let mut pts = points(&[
            [0.0, 0.0, 0.0],
            [2.0, 0.0, 0.0],
            [0.0, 2.0, 0.0],
            [0.0, 0.0, 2.0],
        ]);
        let mut poses = HashMap::new();

        let transform = normalize(&mut pts, &mut poses).unwrap();
        assert_relative_eq!(transform.center.x, 0.5);
        assert_relative_eq!(transform.center.y, 0.5);
        assert_relative_eq!(transform.center.z, 0.5);
        // Farthest point is (2, 0, 0).
        assert_relative_eq!(transform.scale, 2.75f64.sqrt(), epsilon = 1e-12);

        let radii: Vec<f64> = pts.iter().map(|p| p.xyz.length()).collect();
        assert!(radii.iter().all(|r| *r <= 1.0 + 1e-12));
        assert!(radii.iter().any(|r| (r - 1.0).abs() < 1e-12));
    }

    #[test]
    fn normalized_cloud_is_centered_and_bounded() {
        let mut pts = points(&[
            [10.0, -3.0, 7.5],
            [11.0, 4.0, -2.0],
            [-6.0, 0.5, 3.0],
            [2.0, 2.0, 2.0],
            [9.0, -8.0, 1.0],
        ]);
        normalize(&mut pts, &mut HashMap::new()).unwrap();

        let mean = pts.iter().map(|p| p.xyz).sum::<DVec3>() / pts.len() as f64;
        assert!(mean.length() < 1e-12);
        let max = pts.iter().map(|p| p.xyz.length()).fold(0.0, f64::max);
        assert_relative_eq!(max, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn coincident_points_are_degenerate() {
        let mut pts = points(&[[1.0, 1.0, 1.0], [1.0, 1.0, 1.0]]);
        let err = normalize(&mut pts, &mut HashMap::new()).unwrap_err();
        assert!(matches!(err, SceneError::DegenerateScale { points: 2 }));
        assert_eq!(pts[0].xyz, DVec3::ONE);
    }

    #[test]
    fn empty_cloud_is_rejected() {
        let err = normalize(&mut [], &mut HashMap::new()).unwrap_err();
        assert!(matches!(err, SceneError::EmptyPointCloud));
    }

    #[test]
    fn camera_centers_follow_points() {
        let mut pts = points(&[[0.0, 0.0, 0.0], [4.0, 0.0, 0.0]]);
        let rotation = DQuat::from_rotation_y(0.8);
        let mut poses = HashMap::from([(1, pose(1, rotation, DVec3::new(2.0, 0.0, 6.0)))]);

        normalize(&mut pts, &mut poses).unwrap();

        let moved = &poses[&1];
        assert_eq!(moved.rotation, rotation);
        let center = moved.camera_center().unwrap();
        assert!((center - DVec3::new(0.0, 0.0, 3.0)).length() < 1e-12);
    }

    #[test]
    fn zero_norm_pose_leaves_scene_untouched() {
        let mut pts = points(&[[0.0, 0.0, 0.0], [4.0, 0.0, 0.0]]);
        let broken = CameraPose {
            image_id: 9,
            camera_id: 1,
            rotation: DQuat::from_xyzw(0.0, 0.0, 0.0, 0.0),
            translation: DVec3::ONE,
            name: "9.jpg".into(),
        };
        let mut poses = HashMap::from([(9, broken)]);

        let err = normalize(&mut pts, &mut poses).unwrap_err();
        assert!(matches!(err, SceneError::ZeroNormRotation { image_id: 9 }));
        assert_eq!(pts[1].xyz, DVec3::new(4.0, 0.0, 0.0));
        assert_eq!(poses[&9].translation, DVec3::ONE);
    }
}
