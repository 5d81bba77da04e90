//! Polygon geometry (`.shp`) and record index (`.shx`) streams.
//!
//! Both files start with the same 100 byte header. The header is reserved up front and
//! backfilled once all records are laid out, since it holds the file length and the bounding box
//! of every record.

use geo::Coord;

use crate::geometry::ring::close_ring;

pub const SHAPE_TYPE_POLYGON: i32 = 5;

const FILE_CODE: i32 = 9994;
const VERSION: i32 = 1000;
const HEADER_BYTES: usize = 100;
/// Record number and content length, both big endian.
const RECORD_HEADER_BYTES: usize = 8;
const SHX_RECORD_BYTES: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub x_min: f64,
    pub y_min: f64,
    pub x_max: f64,
    pub y_max: f64,
}

impl BoundingBox {
    fn around(coord: Coord) -> Self {
        Self {
            x_min: coord.x,
            y_min: coord.y,
            x_max: coord.x,
            y_max: coord.y,
        }
    }

    fn extend(&mut self, coord: Coord) {
        self.x_min = self.x_min.min(coord.x);
        self.y_min = self.y_min.min(coord.y);
        self.x_max = self.x_max.max(coord.x);
        self.y_max = self.y_max.max(coord.y);
    }

    fn union(self, other: Self) -> Self {
        Self {
            x_min: self.x_min.min(other.x_min),
            y_min: self.y_min.min(other.y_min),
            x_max: self.x_max.max(other.x_max),
            y_max: self.y_max.max(other.y_max),
        }
    }

    fn write_le(&self, out: &mut Vec<u8>) {
        for value in [self.x_min, self.y_min, self.x_max, self.y_max] {
            out.extend_from_slice(&value.to_le_bytes());
        }
    }
}

/// One polygon record: every ring is a part, written in the order received.
#[derive(Debug, Clone, PartialEq)]
pub struct PolygonShape {
    parts: Vec<Vec<Coord>>,
}

impl PolygonShape {
    /// Open rings are closed by repeating their first point; winding is left as supplied.
    /// Empty rings are skipped.
    pub fn new<'a>(rings: impl IntoIterator<Item = &'a [Coord]>) -> Self {
        Self {
            parts: rings
                .into_iter()
                .filter(|ring| !ring.is_empty())
                .map(close_ring)
                .collect(),
        }
    }

    fn point_count(&self) -> usize {
        self.parts.iter().map(Vec::len).sum()
    }

    pub fn bbox(&self) -> Option<BoundingBox> {
        let mut coords = self.parts.iter().flatten().copied();
        let first = coords.next()?;
        let mut bbox = BoundingBox::around(first);
        coords.for_each(|coord| bbox.extend(coord));
        Some(bbox)
    }

    /// Record content size: shape type, box, part and point counts, part starts, points.
    fn content_bytes(&self) -> usize {
        4 + 32 + 4 + 4 + 4 * self.parts.len() + 16 * self.point_count()
    }

    fn write_content(&self, out: &mut Vec<u8>) {
        let start = out.len();
        out.extend_from_slice(&SHAPE_TYPE_POLYGON.to_le_bytes());
        self.bbox()
            .unwrap_or(BoundingBox::around(Coord { x: 0.0, y: 0.0 }))
            .write_le(out);
        out.extend_from_slice(&(self.parts.len() as i32).to_le_bytes());
        out.extend_from_slice(&(self.point_count() as i32).to_le_bytes());
        let mut part_start = 0;
        for part in &self.parts {
            out.extend_from_slice(&(part_start as i32).to_le_bytes());
            part_start += part.len();
        }
        for coord in self.parts.iter().flatten() {
            out.extend_from_slice(&coord.x.to_le_bytes());
            out.extend_from_slice(&coord.y.to_le_bytes());
        }
        debug_assert_eq!(self.content_bytes(), out.len() - start);
    }
}

/// Encoded `.shp` and `.shx` streams.
#[derive(Debug, Clone, PartialEq)]
pub struct ShpOutput {
    pub shp: Vec<u8>,
    pub shx: Vec<u8>,
}

/// Lengths and offsets in the shapefile format are counted in 16 bit words.
fn words(bytes: usize) -> i32 {
    (bytes / 2) as i32
}

pub fn encode_polygons(shapes: &[PolygonShape]) -> ShpOutput {
    let shp_len = HEADER_BYTES
        + shapes
            .iter()
            .map(|shape| RECORD_HEADER_BYTES + shape.content_bytes())
            .sum::<usize>();
    let shx_len = HEADER_BYTES + SHX_RECORD_BYTES * shapes.len();

    let mut shp = Vec::with_capacity(shp_len);
    let mut shx = Vec::with_capacity(shx_len);
    shp.resize(HEADER_BYTES, 0);
    shx.resize(HEADER_BYTES, 0);

    for (index, shape) in shapes.iter().enumerate() {
        let offset = shp.len();
        let content_words = words(shape.content_bytes());
        shp.extend_from_slice(&(index as i32 + 1).to_be_bytes());
        shp.extend_from_slice(&content_words.to_be_bytes());
        shape.write_content(&mut shp);

        shx.extend_from_slice(&words(offset).to_be_bytes());
        shx.extend_from_slice(&content_words.to_be_bytes());
    }
    debug_assert_eq!(shp_len, shp.len());
    debug_assert_eq!(shx_len, shx.len());

    let bbox = shapes
        .iter()
        .filter_map(PolygonShape::bbox)
        .reduce(BoundingBox::union);
    write_header(&mut shp, bbox);
    write_header(&mut shx, bbox);
    ShpOutput { shp, shx }
}

/// Fill in the reserved header of a finished `.shp` or `.shx` buffer.
fn write_header(buffer: &mut Vec<u8>, bbox: Option<BoundingBox>) {
    let mut header = Vec::with_capacity(HEADER_BYTES);
    header.extend_from_slice(&FILE_CODE.to_be_bytes());
    header.extend_from_slice(&[0; 20]);
    header.extend_from_slice(&words(buffer.len()).to_be_bytes());
    header.extend_from_slice(&VERSION.to_le_bytes());
    header.extend_from_slice(&SHAPE_TYPE_POLYGON.to_le_bytes());
    bbox.unwrap_or(BoundingBox::around(Coord { x: 0.0, y: 0.0 }))
        .write_le(&mut header);
    // Z and M ranges are unused for plain polygons.
    header.extend_from_slice(&[0; 32]);
    buffer[..HEADER_BYTES].copy_from_slice(&header);
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn ring(points: &[(f64, f64)]) -> Vec<Coord> {
        points.iter().map(|&(x, y)| Coord { x, y }).collect()
    }

    fn be_i32(bytes: &[u8], at: usize) -> i32 {
        i32::from_be_bytes(bytes[at..at + 4].try_into().unwrap())
    }

    fn le_i32(bytes: &[u8], at: usize) -> i32 {
        i32::from_le_bytes(bytes[at..at + 4].try_into().unwrap())
    }

    fn le_f64(bytes: &[u8], at: usize) -> f64 {
        f64::from_le_bytes(bytes[at..at + 8].try_into().unwrap())
    }

    #[test]
    fn test_polygon_shape_closes_rings() {
        let open = ring(&[(0.0, 0.0), (0.0, 1.0), (1.0, 1.0)]);
        let shape = PolygonShape::new([open.as_slice()]);
        assert_eq!(4, shape.parts[0].len());
        assert_eq!(shape.parts[0].first(), shape.parts[0].last());
    }

    #[test]
    fn test_encode_polygons_layout() {
        let exterior = ring(&[(0.0, 0.0), (0.0, 3.0), (4.0, 3.0), (4.0, 0.0), (0.0, 0.0)]);
        let hole = ring(&[(1.0, 1.0), (2.0, 1.0), (2.0, 2.0), (1.0, 1.0)]);
        let far = ring(&[(10.0, -5.0), (10.0, -4.0), (11.0, -4.0)]);
        let shapes = vec![
            PolygonShape::new([exterior.as_slice(), hole.as_slice()]),
            PolygonShape::new([far.as_slice()]),
        ];
        let output = encode_polygons(&shapes);
        let shp = &output.shp;
        let shx = &output.shx;

        // File headers.
        for file in [shp, shx] {
            assert_eq!(9994, be_i32(file, 0));
            assert_eq!(file.len() as i32, 2 * be_i32(file, 24));
            assert_eq!(1000, le_i32(file, 28));
            assert_eq!(5, le_i32(file, 32));
            assert_eq!(
                [0.0, -5.0, 11.0, 3.0],
                [le_f64(file, 36), le_f64(file, 44), le_f64(file, 52), le_f64(file, 60)]
            );
        }
        assert_eq!(100 + 2 * 8, shx.len());

        // First record: two parts, nine points.
        assert_eq!(1, be_i32(shp, 100));
        let content_words = be_i32(shp, 104);
        assert_eq!(4 + 32 + 4 + 4 + 2 * 4 + 9 * 16, 2 * content_words as usize);
        assert_eq!(5, le_i32(shp, 108));
        assert_eq!(2, le_i32(shp, 144));
        assert_eq!(9, le_i32(shp, 148));
        assert_eq!(0, le_i32(shp, 152));
        assert_eq!(5, le_i32(shp, 156));
        // Points keep their input order.
        assert_eq!((0.0, 3.0), (le_f64(shp, 176), le_f64(shp, 184)));

        // Index points at each record header.
        assert_eq!(50, be_i32(shx, 100));
        assert_eq!(content_words, be_i32(shx, 104));
        let second_offset = 2 * be_i32(shx, 108) as usize;
        assert_eq!(2, be_i32(shp, second_offset));
        assert_eq!(be_i32(shx, 112), be_i32(shp, second_offset + 4));
    }

    #[test]
    fn test_encode_polygons_keeps_counter_clockwise_winding() {
        let ccw = ring(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)]);
        let output = encode_polygons(&[PolygonShape::new([ccw.as_slice()])]);
        let shp = &output.shp;

        assert_eq!(5, le_i32(shp, 148));
        // Points start after the record header, shape type, box, counts and one part index.
        let points: Vec<(f64, f64)> = (0..5)
            .map(|point| {
                let at = 160 + 16 * point;
                (le_f64(shp, at), le_f64(shp, at + 8))
            })
            .collect();
        assert_eq!(
            vec![(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0), (0.0, 0.0)],
            points
        );
    }

    #[test]
    fn test_encode_polygons_readable_by_shapefile_crate() {
        let square = ring(&[(0.0, 0.0), (0.0, 1.0), (1.0, 1.0), (1.0, 0.0), (0.0, 0.0)]);
        let output = encode_polygons(&[PolygonShape::new([square.as_slice()])]);

        let reader = shapefile::ShapeReader::new(Cursor::new(output.shp)).unwrap();
        let polygons = reader.read_as::<shapefile::Polygon>().unwrap();
        assert_eq!(1, polygons.len());
        assert_eq!(1, polygons[0].rings().len());
        assert_eq!(5, polygons[0].rings()[0].points().len());
    }
}
