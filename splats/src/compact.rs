//! Compact `.splat` stream: headerless, fixed 32 byte records sorted largest splat first.
//!
//! The encoding is lossy. Only the DC colour term is kept, higher-order SH coefficients are
//! dropped, and colour, opacity and rotation are quantized to bytes by truncation.

use std::io::Write;
use bytemuck::{Pod, Zeroable};
use glam::{Quat, Vec3, Vec4};
use rayon::prelude::*;
use tracing::info;
use crate::config::EncodeConfig;
use crate::error::{Result, SplatError};
use crate::record::sigmoid;
use crate::schema::SplatSource;
use crate::sh::sh_to_channel;

#[cfg(target_endian = "big")]
compile_error!("the compact stream is written in native byte order, which must be little-endian");

pub const PACKED_SPLAT_BYTES: usize = 32;

/// One record of the compact stream. Layout matches the byte stream exactly.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct PackedSplat {
    pub position: [f32; 3],
    /// Natural domain.
    pub scale: [f32; 3],
    /// RGB from the DC term, A from opacity.
    pub color: [u8; 4],
    /// `w, x, y, z`, each mapped from `[-1, 1]` to `[0, 255]`.
    pub rotation: [u8; 4],
}

const _: () = assert!(size_of::<PackedSplat>() == PACKED_SPLAT_BYTES);

impl PackedSplat {
    pub fn rgba(&self) -> Vec4 {
        Vec4::from_array(self.color.map(|c| c as f32 / 255.0))
    }

    /// Dequantized rotation, renormalized.
    pub fn rotation(&self) -> Quat {
        let [w, x, y, z] = self.rotation.map(|c| c as f32 / 255.0 * 2.0 - 1.0);
        Quat::from_xyzw(x, y, z, w).normalize()
    }
}

/// Maps `[0, 1]` to a byte, clamping first and truncating toward zero.
pub fn unit_to_byte(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0) as u8
}

/// Indices of `source` sorted by descending `sum(exp(log_scale))`. Ties keep input order.
pub fn render_order<S: SplatSource + ?Sized>(source: &S) -> Vec<usize> {
    let keys: Vec<f32> = (0..source.len())
        .map(|i| source.log_scale(i).exp().element_sum())
        .collect();
    let mut order: Vec<usize> = (0..keys.len()).collect();
    order.sort_by(|&a, &b| keys[b].total_cmp(&keys[a]));
    order
}

/// Quantizes splat `index` of `source`.
pub fn pack<S: SplatSource + ?Sized>(source: &S, index: usize) -> Result<PackedSplat> {
    let rotation = source.rotation(index);
    let len = rotation.length();
    if len == 0.0 || !len.is_finite() {
        return Err(SplatError::ZeroNormRotation { index });
    }
    let rotation = rotation / len;

    let dc = source.sh_dc(index);
    let color = [
        unit_to_byte(sh_to_channel(dc.x)),
        unit_to_byte(sh_to_channel(dc.y)),
        unit_to_byte(sh_to_channel(dc.z)),
        unit_to_byte(sigmoid(source.raw_opacity(index))),
    ];

    let rotation = [rotation.w, rotation.x, rotation.y, rotation.z]
        .map(|c| unit_to_byte(c * 0.5 + 0.5));

    Ok(PackedSplat {
        position: source.position(index).to_array(),
        scale: source.log_scale(index).exp().to_array(),
        color,
        rotation,
    })
}

/// Sorts, then quantizes every splat. Nothing is returned if any record fails.
pub fn encode<S: SplatSource + ?Sized>(source: &S, config: &EncodeConfig) -> Result<Vec<PackedSplat>> {
    let order = render_order(source);
    let packed = if config.parallel {
        order.par_iter().map(|&i| pack(source, i)).collect::<Result<Vec<_>>>()?
    } else {
        order.iter().map(|&i| pack(source, i)).collect::<Result<Vec<_>>>()?
    };
    info!("Encoded {} splats into compact records", packed.len());
    Ok(packed)
}

pub fn write_compact<W: Write + ?Sized>(packed: &[PackedSplat], writer: &mut W) -> Result<()> {
    writer.write_all(bytemuck::cast_slice(packed))?;
    Ok(())
}

/// Splits a compact stream back into records.
pub fn decode(bytes: &[u8]) -> Result<Vec<PackedSplat>> {
    if bytes.len() % PACKED_SPLAT_BYTES != 0 {
        return Err(SplatError::Stride {
            len: bytes.len(),
            stride: PACKED_SPLAT_BYTES,
        });
    }
    Ok(bytes
        .chunks_exact(PACKED_SPLAT_BYTES)
        .map(bytemuck::pod_read_unaligned)
        .collect())
}

/// Natural-domain scale sum of a packed record, the key it was sorted by.
pub fn packed_priority(splat: &PackedSplat) -> f32 {
    Vec3::from_array(splat.scale).element_sum()
}
