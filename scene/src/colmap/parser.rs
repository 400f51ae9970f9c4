use std::collections::HashMap;
use glam::{DQuat, DVec3};
use tokio::io::AsyncBufRead;
use crate::camera::{Camera, CameraModel};
use crate::colmap::reader::{BinReader, ReadResult};
use crate::error::Table;
use crate::point::SparsePoint;
use crate::pose::CameraPose;

/// Bytes of one 2D observation in the images table: `x: f64, y: f64, point3d_id: i64`.
const POINT2D_BYTES: u64 = 24;
/// Bytes of one track entry in the points table: `image_id: u32, point2d_idx: u32`.
const TRACK_ENTRY_BYTES: u64 = 8;

/// Parses `cameras.bin`. Later records overwrite earlier ones with the same id.
pub async fn parse_cameras<R: AsyncBufRead + Unpin>(reader: R) -> ReadResult<HashMap<u32, Camera>> {
    let mut reader = BinReader::new(reader, Table::Cameras);
    let num_cameras = reader.u64().await?;
    let mut cameras = HashMap::new();

    for index in 0..num_cameras {
        reader.begin_record(index);
        let id = reader.u32().await?;
        let model_id = reader.i32().await?;
        let width = reader.u64().await?;
        let height = reader.u64().await?;

        let model = CameraModel::from_id(model_id);
        let mut params = Vec::with_capacity(model.num_params());
        for _ in 0..model.num_params() {
            params.push(reader.f64().await?);
        }

        cameras.insert(
            id,
            Camera {
                id,
                model_id,
                model,
                width,
                height,
                params,
            },
        );
    }

    Ok(cameras)
}

/// Parses `images.bin`. The per-image 2D observations are skipped.
pub async fn parse_images<R: AsyncBufRead + Unpin>(reader: R) -> ReadResult<HashMap<u32, CameraPose>> {
    let mut reader = BinReader::new(reader, Table::Images);
    let num_images = reader.u64().await?;
    let mut poses = HashMap::new();

    for index in 0..num_images {
        reader.begin_record(index);
        let image_id = reader.u32().await?;

        let [w, x, y, z] = [
            reader.f64().await?,
            reader.f64().await?,
            reader.f64().await?,
            reader.f64().await?,
        ];
        let rotation = DQuat::from_xyzw(x, y, z, w);

        let translation = DVec3::new(
            reader.f64().await?,
            reader.f64().await?,
            reader.f64().await?,
        );

        let camera_id = reader.u32().await?;
        let name = reader.c_string().await?;

        let num_points2d = reader.u64().await?;
        reader.skip(num_points2d.saturating_mul(POINT2D_BYTES)).await?;

        poses.insert(
            image_id,
            CameraPose {
                image_id,
                camera_id,
                rotation,
                translation,
                name,
            },
        );
    }

    Ok(poses)
}

/// Parses `points3D.bin` in file order. Point ids, reprojection errors and tracks are skipped.
pub async fn parse_points<R: AsyncBufRead + Unpin>(reader: R) -> ReadResult<Vec<SparsePoint>> {
    let mut reader = BinReader::new(reader, Table::Points3D);
    let num_points = reader.u64().await?;
    // The count comes from the file, don't trust it for the allocation.
    let mut points = Vec::with_capacity(num_points.min(1 << 20) as usize);

    for index in 0..num_points {
        reader.begin_record(index);
        let _point_id = reader.u64().await?;
        let xyz = DVec3::new(
            reader.f64().await?,
            reader.f64().await?,
            reader.f64().await?,
        );
        let rgb = [
            reader.u8().await?,
            reader.u8().await?,
            reader.u8().await?,
        ];
        let _error = reader.f64().await?;

        let track_length = reader.u64().await?;
        reader.skip(track_length.saturating_mul(TRACK_ENTRY_BYTES)).await?;

        points.push(SparsePoint { xyz, rgb });
    }

    Ok(points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ParseErrorKind;

    fn camera_bytes(id: u32, model_id: i32, params: &[f64]) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend(id.to_le_bytes());
        bytes.extend(model_id.to_le_bytes());
        bytes.extend(640u64.to_le_bytes());
        bytes.extend(480u64.to_le_bytes());
        for p in params {
            bytes.extend(p.to_le_bytes());
        }
        bytes
    }

    #[tokio::test]
    async fn later_camera_overwrites_earlier() {
        let mut bytes = 2u64.to_le_bytes().to_vec();
        bytes.extend(camera_bytes(3, 0, &[100.0, 1.0, 2.0]));
        bytes.extend(camera_bytes(3, 1, &[200.0, 201.0, 1.0, 2.0]));

        let cameras = parse_cameras(bytes.as_slice()).await.unwrap();
        assert_eq!(cameras.len(), 1);
        assert_eq!(cameras[&3].params, vec![200.0, 201.0, 1.0, 2.0]);
    }

    #[tokio::test]
    async fn truncated_camera_reports_record_and_offset() {
        let mut bytes = 1u64.to_le_bytes().to_vec();
        let record = camera_bytes(1, 1, &[1.0, 2.0, 3.0, 4.0]);
        bytes.extend(&record[..record.len() - 4]);

        let err = parse_cameras(bytes.as_slice()).await.unwrap_err();
        assert_eq!(err.table, Table::Cameras);
        assert_eq!(err.record, Some(0));
        // Header, ids, dims and three full params were consumed.
        assert_eq!(err.offset, 8 + 4 + 4 + 8 + 8 + 3 * 8);
        assert!(matches!(err.kind, ParseErrorKind::Truncated));
    }

    #[tokio::test]
    async fn image_name_without_terminator_is_truncated() {
        let mut bytes = 1u64.to_le_bytes().to_vec();
        bytes.extend(1u32.to_le_bytes());
        for v in [1.0f64, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0] {
            bytes.extend(v.to_le_bytes());
        }
        bytes.extend(1u32.to_le_bytes());
        bytes.extend(b"frame.jpg");

        let err = parse_images(bytes.as_slice()).await.unwrap_err();
        assert!(matches!(err.kind, ParseErrorKind::Truncated));
        assert_eq!(err.record, Some(0));
    }

    #[tokio::test]
    async fn short_track_is_truncated() {
        let mut bytes = 1u64.to_le_bytes().to_vec();
        bytes.extend(9u64.to_le_bytes());
        for v in [1.0f64, 2.0, 3.0] {
            bytes.extend(v.to_le_bytes());
        }
        bytes.extend([10u8, 20, 30]);
        bytes.extend(0.5f64.to_le_bytes());
        bytes.extend(2u64.to_le_bytes());
        bytes.extend([0u8; 12]);

        let err = parse_points(bytes.as_slice()).await.unwrap_err();
        assert!(matches!(err.kind, ParseErrorKind::Truncated));
        assert_eq!(err.table, Table::Points3D);
    }

    #[tokio::test]
    async fn empty_header_is_truncated() {
        let err = parse_points(&[0u8; 3][..]).await.unwrap_err();
        assert_eq!(err.record, None);
        assert_eq!(err.offset, 0);
    }
}
