use glam::Vec3;

/// Degree 0 spherical harmonics basis constant, `1 / (2 * sqrt(pi))`.
pub const SH_C0: f32 = 0.2820947917738781;

pub const fn sh_coeffs_for_degree(degree: u32) -> u32 {
    (degree + 1).pow(2)
}

/// Number of higher-order coefficient triples for `degree`, i.e. everything but the DC term.
pub const fn sh_rest_for_degree(degree: u32) -> u32 {
    sh_coeffs_for_degree(degree) - 1
}

pub fn channel_to_sh(rgb: f32) -> f32 {
    (rgb - 0.5) / SH_C0
}

pub fn rgb_to_sh(rgb: Vec3) -> Vec3 {
    glam::vec3(
        channel_to_sh(rgb.x),
        channel_to_sh(rgb.y),
        channel_to_sh(rgb.z),
    )
}

/// Base colour of a DC coefficient, clamped to `[0, 1]`.
pub fn sh_to_channel(dc: f32) -> f32 {
    (dc * SH_C0 + 0.5).clamp(0.0, 1.0)
}
