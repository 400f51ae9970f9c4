use burn::prelude::Config;

#[derive(Config, Debug)]
pub struct LoadConfig {
    /// Keep only every nth point of the sparse cloud.
    pub subsample_points: Option<u32>,
    /// Minimum number of registered images a multi-view consumer needs.
    #[config(default = 3)]
    pub min_views: usize,
    /// Recenter and rescale the scene into the unit sphere after loading.
    #[config(default = true)]
    pub normalize: bool,
}
