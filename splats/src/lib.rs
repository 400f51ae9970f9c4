mod compact;
mod config;
mod error;
mod init;
mod ply;
mod publish;
mod record;
mod schema;
pub mod sh;

pub use compact::{
    PACKED_SPLAT_BYTES, PackedSplat, decode, encode, pack, packed_priority, render_order,
    unit_to_byte, write_compact,
};
pub use config::{EncodeConfig, InitConfig};
pub use error::SplatError;
pub use init::splats_from_points;
pub use ply::{AttributeFile, splat_fields, write_splats};
pub use publish::write_atomic;
pub use record::{SplatRecord, inverse_sigmoid, sigmoid};
pub use schema::{REQUIRED_FIELDS, SplatColumns, SplatSource};

/// Reads an attribute file and encodes it as a compact stream.
pub fn encode_attribute_file(
    file: &AttributeFile,
    config: &EncodeConfig,
) -> Result<Vec<PackedSplat>, SplatError> {
    let columns = SplatColumns::resolve(file)?;
    encode(&columns, config)
}
