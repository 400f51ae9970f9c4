use std::io::{BufRead, Read, Write};
use tracing::debug;
use crate::error::{Result, SplatError};
use crate::record::SplatRecord;

/// Row-aligned table of named `f32` fields, stored as the `vertex` element of a binary PLY file.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeFile {
    fields: Vec<String>,
    rows: usize,
    /// Row major, `rows * fields.len()` values.
    data: Vec<f32>,
}

impl AttributeFile {
    pub fn new(fields: Vec<String>) -> Self {
        Self {
            fields,
            rows: 0,
            data: Vec::new(),
        }
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn row_count(&self) -> usize {
        self.rows
    }

    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f == name)
    }

    pub fn push_row(&mut self, row: &[f32]) -> Result<()> {
        if row.len() != self.fields.len() {
            return Err(SplatError::RowWidth {
                row: self.rows,
                expected: self.fields.len(),
                found: row.len(),
            });
        }
        self.data.extend_from_slice(row);
        self.rows += 1;
        Ok(())
    }

    pub fn row(&self, index: usize) -> &[f32] {
        let width = self.fields.len();
        &self.data[index * width..(index + 1) * width]
    }

    /// Value of field number `field` in row `row`.
    pub fn value(&self, row: usize, field: usize) -> f32 {
        self.data[row * self.fields.len() + field]
    }

    pub fn column(&self, name: &str) -> Option<impl Iterator<Item = f32> + '_> {
        let field = self.field_index(name)?;
        Some((0..self.rows).map(move |row| self.value(row, field)))
    }

    /// Builds the splat layout (see [`splat_fields`]) from `records`. Every record must carry
    /// exactly `sh_rest_count` higher-order triples. Rotations are stored normalized.
    pub fn from_splats(records: &[SplatRecord], sh_rest_count: usize) -> Result<Self> {
        validate_splats(records, sh_rest_count)?;
        let mut file = AttributeFile::new(splat_fields(sh_rest_count));
        file.data.reserve(records.len() * file.fields.len());
        let mut row = Vec::with_capacity(file.fields.len());
        for (index, record) in records.iter().enumerate() {
            splat_row(index, record, &mut row)?;
            file.push_row(&row)?;
        }
        Ok(file)
    }

    pub fn write<W: Write + ?Sized>(&self, writer: &mut W) -> Result<()> {
        write_header(writer, &self.fields, self.rows)?;
        for row in 0..self.rows {
            write_row(writer, self.row(row))?;
        }
        Ok(())
    }

    /// Reads the first element of a binary little-endian PLY file, which must be `vertex`.
    /// Scalar properties of any numeric type are widened or narrowed to `f32`.
    pub fn read<R: BufRead>(reader: &mut R) -> Result<Self> {
        let header = Header::read(reader)?;
        debug!(
            "PLY header: {} rows, {} fields",
            header.rows,
            header.properties.len()
        );

        let row_bytes: usize = header.properties.iter().map(|(_, ty)| ty.size()).sum();
        let fields = header.properties.iter().map(|(name, _)| name.clone()).collect();
        let mut file = AttributeFile::new(fields);
        // Row count comes from the file, cap the up-front allocation.
        file.data
            .reserve(header.rows.min(1 << 20) * header.properties.len());

        let mut buf = vec![0u8; row_bytes];
        let mut row = Vec::with_capacity(header.properties.len());
        for index in 0..header.rows {
            reader.read_exact(&mut buf).map_err(|e| match e.kind() {
                std::io::ErrorKind::UnexpectedEof => SplatError::Truncated {
                    row: index,
                    offset: header.len + index * row_bytes,
                },
                _ => SplatError::Io(e),
            })?;
            row.clear();
            let mut offset = 0;
            for (_, ty) in &header.properties {
                row.push(ty.decode(&buf[offset..offset + ty.size()]));
                offset += ty.size();
            }
            file.push_row(&row)?;
        }
        Ok(file)
    }
}

/// Field names of the splat layout, in file order.
pub fn splat_fields(sh_rest_count: usize) -> Vec<String> {
    let mut fields: Vec<String> = ["x", "y", "z", "nx", "ny", "nz", "f_dc_0", "f_dc_1", "f_dc_2"]
        .into_iter()
        .map(String::from)
        .collect();
    fields.extend((0..sh_rest_count * 3).map(|i| format!("f_rest_{i}")));
    fields.extend(
        [
            "opacity", "scale_0", "scale_1", "scale_2", "rot_0", "rot_1", "rot_2", "rot_3",
        ]
        .into_iter()
        .map(String::from),
    );
    fields
}

/// Streams `records` as a splat attribute file without materialising the table. All records
/// are validated before the first byte is written.
pub fn write_splats<W: Write + ?Sized>(
    records: &[SplatRecord],
    sh_rest_count: usize,
    writer: &mut W,
) -> Result<()> {
    validate_splats(records, sh_rest_count)?;
    let fields = splat_fields(sh_rest_count);
    write_header(writer, &fields, records.len())?;

    let mut row = Vec::with_capacity(fields.len());
    for (index, record) in records.iter().enumerate() {
        splat_row(index, record, &mut row)?;
        write_row(writer, &row)?;
    }
    Ok(())
}

fn validate_splats(records: &[SplatRecord], sh_rest_count: usize) -> Result<()> {
    for (index, record) in records.iter().enumerate() {
        if record.sh_rest.len() != sh_rest_count {
            return Err(SplatError::ShCountMismatch {
                index,
                expected: sh_rest_count,
                found: record.sh_rest.len(),
            });
        }
        if record.unit_rotation().is_none() {
            return Err(SplatError::ZeroNormRotation { index });
        }
    }
    Ok(())
}

fn splat_row(index: usize, record: &SplatRecord, row: &mut Vec<f32>) -> Result<()> {
    let rot = record
        .unit_rotation()
        .ok_or(SplatError::ZeroNormRotation { index })?;

    row.clear();
    row.extend(record.position.to_array());
    row.extend([0.0; 3]);
    row.extend(record.sh_dc.to_array());
    // Coefficient-major, then channel.
    row.extend(record.sh_rest.iter().flat_map(|c| c.to_array()));
    row.push(record.raw_opacity);
    row.extend(record.log_scale.to_array());
    row.extend([rot.w, rot.x, rot.y, rot.z]);
    Ok(())
}

fn write_header<W: Write + ?Sized>(writer: &mut W, fields: &[String], rows: usize) -> Result<()> {
    writeln!(writer, "ply")?;
    writeln!(writer, "format binary_little_endian 1.0")?;
    writeln!(writer, "element vertex {rows}")?;
    for field in fields {
        writeln!(writer, "property float {field}")?;
    }
    writeln!(writer, "end_header")?;
    Ok(())
}

fn write_row<W: Write + ?Sized>(writer: &mut W, row: &[f32]) -> Result<()> {
    for value in row {
        writer.write_all(&value.to_le_bytes())?;
    }
    Ok(())
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum ScalarType {
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    F32,
    F64,
}

impl ScalarType {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "char" | "int8" => Some(Self::I8),
            "uchar" | "uint8" => Some(Self::U8),
            "short" | "int16" => Some(Self::I16),
            "ushort" | "uint16" => Some(Self::U16),
            "int" | "int32" => Some(Self::I32),
            "uint" | "uint32" => Some(Self::U32),
            "float" | "float32" => Some(Self::F32),
            "double" | "float64" => Some(Self::F64),
            _ => None,
        }
    }

    fn size(&self) -> usize {
        match self {
            Self::I8 | Self::U8 => 1,
            Self::I16 | Self::U16 => 2,
            Self::I32 | Self::U32 | Self::F32 => 4,
            Self::F64 => 8,
        }
    }

    /// `bytes` is exactly `self.size()` long.
    fn decode(&self, bytes: &[u8]) -> f32 {
        let mut b = [0u8; 8];
        b[..bytes.len()].copy_from_slice(bytes);
        match self {
            Self::I8 => i8::from_le_bytes([b[0]]) as f32,
            Self::U8 => b[0] as f32,
            Self::I16 => i16::from_le_bytes([b[0], b[1]]) as f32,
            Self::U16 => u16::from_le_bytes([b[0], b[1]]) as f32,
            Self::I32 => i32::from_le_bytes([b[0], b[1], b[2], b[3]]) as f32,
            Self::U32 => u32::from_le_bytes([b[0], b[1], b[2], b[3]]) as f32,
            Self::F32 => f32::from_le_bytes([b[0], b[1], b[2], b[3]]),
            Self::F64 => f64::from_le_bytes(b) as f32,
        }
    }
}

struct Header {
    rows: usize,
    properties: Vec<(String, ScalarType)>,
    /// Bytes up to and including `end_header\n`.
    len: usize,
}

impl Header {
    fn read<R: BufRead>(reader: &mut R) -> Result<Self> {
        let mut line = String::new();
        let mut line_no = 0;
        let mut rows = None;
        let mut properties = Vec::new();
        // Only the first element is read, everything declared after it is ignored.
        let mut in_first_element = false;
        let mut len = 0;

        loop {
            line.clear();
            line_no += 1;
            let read = reader.read_line(&mut line)?;
            if read == 0 {
                return Err(SplatError::header(line_no, "missing end_header"));
            }
            len += read;
            let parts: Vec<&str> = line.split_whitespace().collect();

            if line_no == 1 {
                if parts != ["ply"] {
                    return Err(SplatError::header(line_no, "not a PLY file"));
                }
                continue;
            }

            match parts.as_slice() {
                ["format", "binary_little_endian", _] => {}
                ["format", format, _] => {
                    return Err(SplatError::header(
                        line_no,
                        format!("unsupported format '{format}'"),
                    ));
                }
                ["comment", ..] | ["obj_info", ..] | [] => {}
                ["element", name, count] => {
                    if rows.is_none() {
                        if *name != "vertex" {
                            return Err(SplatError::header(
                                line_no,
                                format!("first element is '{name}', expected 'vertex'"),
                            ));
                        }
                        let count = count.parse::<usize>().map_err(|_| {
                            SplatError::header(line_no, format!("invalid vertex count '{count}'"))
                        })?;
                        rows = Some(count);
                        in_first_element = true;
                    } else {
                        in_first_element = false;
                    }
                }
                ["property", "list", ..] if in_first_element => {
                    return Err(SplatError::header(line_no, "list properties are not supported"));
                }
                ["property", ty, name] if in_first_element => {
                    let ty = ScalarType::from_name(ty).ok_or_else(|| {
                        SplatError::header(line_no, format!("unknown property type '{ty}'"))
                    })?;
                    properties.push((name.to_string(), ty));
                }
                ["property", ..] if !in_first_element && rows.is_some() => {}
                ["end_header"] => break,
                _ => {
                    return Err(SplatError::header(
                        line_no,
                        format!("unexpected line '{}'", line.trim_end()),
                    ));
                }
            }
        }

        let rows = rows.ok_or_else(|| SplatError::header(line_no, "no vertex element"))?;
        if rows > 0 && properties.is_empty() {
            return Err(SplatError::header(
                line_no,
                format!("vertex element declares {rows} rows but no properties"),
            ));
        }
        Ok(Self {
            rows,
            properties,
            len,
        })
    }
}
