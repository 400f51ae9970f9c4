use ball_tree::BallTree;
use glam::{Quat, Vec3};
use tracing::info;
use crate::config::InitConfig;
use crate::record::{SplatRecord, inverse_sigmoid};
use crate::sh::{rgb_to_sh, sh_rest_for_degree};

/// Seeds one splat per sparse point: the point colour as DC term, an isotropic extent from the
/// nearest neighbours, identity rotation and uniform opacity.
pub fn splats_from_points(points: &[(Vec3, [u8; 3])], config: &InitConfig) -> Vec<SplatRecord> {
    let tree_pos: Vec<[f64; 3]> = points
        .iter()
        .map(|(p, _)| [p.x as f64, p.y as f64, p.z as f64])
        .collect();
    let tree = BallTree::new(tree_pos.clone(), vec![(); tree_pos.len()]);

    let raw_opacity = inverse_sigmoid(config.initial_opacity);
    let sh_rest = vec![Vec3::ZERO; sh_rest_for_degree(config.sh_degree) as usize];

    let splats: Vec<SplatRecord> = points
        .iter()
        .zip(&tree_pos)
        .map(|((position, rgb), tree_p)| {
            // The first hit is the point itself.
            let dists: Vec<f64> = tree
                .query()
                .nn(tree_p)
                .skip(1)
                .take(config.neighbours)
                .map(|x| x.1)
                .collect();
            let extent = if dists.is_empty() {
                config.min_extent
            } else {
                (dists.iter().sum::<f64>() / dists.len() as f64).max(config.min_extent)
            };

            SplatRecord {
                position: *position,
                log_scale: Vec3::splat(extent.ln() as f32),
                rotation: Quat::IDENTITY,
                raw_opacity,
                sh_dc: rgb_to_sh(Vec3::from_array(rgb.map(|c| c as f32 / 255.0))),
                sh_rest: sh_rest.clone(),
            }
        })
        .collect();

    info!(
        "Initialized {} splats at SH degree {}",
        splats.len(),
        config.sh_degree
    );
    splats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::sigmoid;
    use crate::sh::sh_to_channel;
    use approx::assert_relative_eq;

    #[test]
    fn extent_is_mean_neighbour_distance() {
        let points = [
            (Vec3::new(0.0, 0.0, 0.0), [255, 0, 0]),
            (Vec3::new(1.0, 0.0, 0.0), [0, 255, 0]),
            (Vec3::new(0.0, 2.0, 0.0), [0, 0, 255]),
            (Vec3::new(0.0, 0.0, 3.0), [128, 128, 128]),
        ];
        let splats = splats_from_points(&points, &InitConfig::new());
        assert_eq!(splats.len(), 4);

        // Neighbours of the origin are at 1, 2 and 3.
        assert_relative_eq!(splats[0].scale().x, 2.0, epsilon = 1e-5);
        assert_eq!(splats[0].sh_rest.len(), 15);
        assert_relative_eq!(splats[0].opacity(), 0.1, epsilon = 1e-6);
        assert_relative_eq!(sh_to_channel(splats[0].sh_dc.x), 1.0, epsilon = 1e-6);
        assert_relative_eq!(sh_to_channel(splats[0].sh_dc.y), 0.0, epsilon = 1e-6);
        assert_eq!(splats[3].rotation, Quat::IDENTITY);
        assert!(sigmoid(splats[3].raw_opacity) < 0.11);
    }

    #[test]
    fn lone_point_uses_minimum_extent() {
        let config = InitConfig::new().with_sh_degree(0).with_min_extent(0.01);
        let splats = splats_from_points(&[(Vec3::ONE, [0, 0, 0])], &config);
        assert_relative_eq!(splats[0].scale().x, 0.01, epsilon = 1e-6);
        assert!(splats[0].sh_rest.is_empty());
    }
}
