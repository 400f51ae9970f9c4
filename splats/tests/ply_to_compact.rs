use std::fs::File;
use std::io::BufReader;
use glam::{Quat, Vec3};
use splats::{
    AttributeFile, EncodeConfig, SplatColumns, SplatError, SplatRecord, decode,
    encode_attribute_file, splat_fields, write_atomic, write_compact, write_splats,
};

fn records() -> Vec<SplatRecord> {
    (0..6)
        .map(|i| SplatRecord {
            position: Vec3::new(i as f32, 0.0, -(i as f32)),
            log_scale: Vec3::new((i % 3) as f32 * 0.5 - 1.0, -1.0, -1.0),
            rotation: Quat::from_xyzw(0.1 * i as f32, 0.0, 0.0, 2.0),
            raw_opacity: i as f32 - 3.0,
            sh_dc: Vec3::new(0.5, -0.5, 0.0),
            sh_rest: vec![Vec3::splat(i as f32); 3],
        })
        .collect()
}

fn read_ply(path: &std::path::Path) -> AttributeFile {
    let mut reader = BufReader::new(File::open(path).unwrap());
    AttributeFile::read(&mut reader).unwrap()
}

#[test]
fn attribute_file_encodes_to_sorted_stream() {
    let dir = tempfile::tempdir().unwrap();
    let ply_path = dir.path().join("point_cloud.ply");
    let splat_path = dir.path().join("scene.splat");
    let records = records();

    write_atomic(&ply_path, |w| write_splats(&records, 3, w)).unwrap();
    let file = read_ply(&ply_path);
    assert_eq!(file.fields(), splat_fields(3));
    assert_eq!(file.row_count(), 6);

    let columns = SplatColumns::resolve(&file).unwrap();
    let read_back = columns.records().unwrap();
    assert_eq!(read_back[4].sh_rest, records[4].sh_rest);
    assert_eq!(read_back[4].position, records[4].position);
    let rot = read_back[4].rotation;
    assert!((rot.length() - 1.0).abs() < 1e-5);

    let packed = encode_attribute_file(&file, &EncodeConfig::new()).unwrap();
    write_atomic(&splat_path, |w| write_compact(&packed, w)).unwrap();

    let bytes = std::fs::read(&splat_path).unwrap();
    assert_eq!(bytes.len(), 6 * 32);
    let decoded = decode(&bytes).unwrap();

    // Scale x cycles through -1.0, -0.5, 0.0, so indices 2 and 5 lead, in input order.
    let xs: Vec<f32> = decoded.iter().map(|p| p.position[0]).collect();
    assert_eq!(xs, [2.0, 5.0, 1.0, 4.0, 0.0, 3.0]);
    for p in &decoded {
        assert_eq!(&p.color[..3], [163, 91, 127]);
    }
}

#[test]
fn missing_opacity_fails_naming_the_field() {
    let dir = tempfile::tempdir().unwrap();
    let ply_path = dir.path().join("no_opacity.ply");

    let fields: Vec<String> = splat_fields(0)
        .into_iter()
        .filter(|f| f != "opacity")
        .collect();
    let mut file = AttributeFile::new(fields);
    file.push_row(&[0.0; 16]).unwrap();
    write_atomic(&ply_path, |w| file.write(w)).unwrap();

    let file = read_ply(&ply_path);
    let err = encode_attribute_file(&file, &EncodeConfig::new()).unwrap_err();
    assert!(matches!(&err, SplatError::MissingField(name) if name == "opacity"));
    assert!(err.to_string().contains("opacity"));
}

#[test]
fn partial_rest_fields_do_not_block_encoding() {
    let dir = tempfile::tempdir().unwrap();
    let ply_path = dir.path().join("partial_rest.ply");

    let mut fields = splat_fields(0);
    fields.push("f_rest_0".into());
    fields.push("f_rest_1".into());
    let width = fields.len();
    let mut file = AttributeFile::new(fields);
    let mut row = vec![0.0; width];
    row[file.field_index("rot_0").unwrap()] = 1.0;
    row[file.field_index("f_rest_1").unwrap()] = 42.0;
    file.push_row(&row).unwrap();
    write_atomic(&ply_path, |w| file.write(w)).unwrap();

    let file = read_ply(&ply_path);
    let packed = encode_attribute_file(&file, &EncodeConfig::new()).unwrap();
    assert_eq!(packed.len(), 1);
    assert_eq!(packed[0].rotation, [255, 127, 127, 127]);
    assert_eq!(packed[0].scale, [1.0, 1.0, 1.0]);

    let columns = SplatColumns::resolve(&file).unwrap();
    assert!(matches!(columns.records(), Err(SplatError::RestFieldCount(2))));
}
