mod camera;
mod colmap;
mod config;
mod error;
mod normalize;
mod point;
mod pose;

use std::collections::HashMap;
use std::path::Path;
use log::info;
use serde::Serialize;
use tokio::io::AsyncBufRead;

pub use camera::{Camera, CameraModel};
pub use colmap::{ColmapDir, parse_cameras, parse_images, parse_points};
pub use config::LoadConfig;
pub use error::{ParseError, ParseErrorKind, SceneError, Table};
pub use normalize::{SceneTransform, normalize};
pub use point::SparsePoint;
pub use pose::CameraPose;

use crate::error::Result;

/// A parsed sparse reconstruction.
#[derive(Debug, Clone, Serialize)]
pub struct Scene {
    pub cameras: HashMap<u32, Camera>,
    /// Keyed by image id.
    pub poses: HashMap<u32, CameraPose>,
    pub points: Vec<SparsePoint>,
}

impl Scene {
    /// Parses the three tables from arbitrary buffered sources.
    pub async fn from_readers<C, I, P>(cameras: C, images: I, points: P) -> Result<Scene>
    where
        C: AsyncBufRead + Unpin,
        I: AsyncBufRead + Unpin,
        P: AsyncBufRead + Unpin,
    {
        Ok(Scene {
            cameras: parse_cameras(cameras).await?,
            poses: parse_images(images).await?,
            points: parse_points(points).await?,
        })
    }

    /// Loads the reconstruction found under `dir`, applying `config`.
    pub async fn load(dir: &Path, config: &LoadConfig) -> Result<Scene> {
        let colmap = ColmapDir::locate(dir)?;
        info!("Located cameras file at: {}", colmap.path(Table::Cameras).display());
        info!("Located images file at: {}", colmap.path(Table::Images).display());
        info!("Located points file at: {}", colmap.path(Table::Points3D).display());

        let mut scene = Scene::from_readers(
            colmap.open(Table::Cameras).await?,
            colmap.open(Table::Images).await?,
            colmap.open(Table::Points3D).await?,
        )
        .await?;
        info!(
            "Loaded {} cameras, {} images, {} points",
            scene.cameras.len(),
            scene.poses.len(),
            scene.points.len()
        );

        if let Some(step) = config.subsample_points.filter(|s| *s > 1) {
            scene.points = scene
                .points
                .into_iter()
                .step_by(step as usize)
                .collect();
            info!("Subsampled to {} points", scene.points.len());
        }

        if config.normalize {
            scene.normalize()?;
        }

        Ok(scene)
    }

    /// Recenters and rescales points and camera centres in place.
    pub fn normalize(&mut self) -> Result<SceneTransform> {
        normalize(&mut self.points, &mut self.poses)
    }

    /// Fails unless at least `min` images are registered.
    pub fn require_views(&self, min: usize) -> Result<()> {
        if self.poses.len() < min {
            return Err(SceneError::NotEnoughViews {
                found: self.poses.len(),
                required: min,
            });
        }
        Ok(())
    }

    /// Poses ordered by image file name, each with the camera it refers to. Poses whose camera
    /// is missing from the camera table are skipped.
    pub fn views_sorted_by_name(&self) -> Vec<(&CameraPose, &Camera)> {
        let mut views: Vec<_> = self
            .poses
            .values()
            .filter_map(|pose| match self.cameras.get(&pose.camera_id) {
                Some(camera) => Some((pose, camera)),
                None => {
                    log::warn!("Image {} refers to unknown camera {}", pose.name, pose.camera_id);
                    None
                }
            })
            .collect();
        views.sort_by(|a, b| a.0.name.cmp(&b.0.name));
        views
    }

    /// Point colours in the same order as [`Scene::points`].
    pub fn colors(&self) -> Vec<[u8; 3]> {
        self.points.iter().map(|p| p.rgb).collect()
    }
}
