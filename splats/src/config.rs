use burn::prelude::Config;

#[derive(Config, Debug)]
pub struct InitConfig {
    /// Spherical harmonics degree of the initial splats. Higher orders start at zero.
    #[config(default = 3)]
    pub sh_degree: u32,
    /// Opacity every splat starts with, in the natural domain.
    #[config(default = 0.1)]
    pub initial_opacity: f32,
    /// Number of nearest neighbours averaged for the initial extent.
    #[config(default = 3)]
    pub neighbours: usize,
    /// Lower bound on the initial extent, so isolated duplicates don't produce `ln(0)`.
    #[config(default = 1e-6)]
    pub min_extent: f64,
}

#[derive(Config, Debug)]
pub struct EncodeConfig {
    /// Quantize records on the rayon pool once the render order is known.
    #[config(default = true)]
    pub parallel: bool,
}
