use geo::{Coord, LineString};
use thiserror::Error;

use crate::error::GeometryError;

/// Fewest points a closed ring may have: three distinct vertices plus the closing point.
pub const MIN_CLOSED_RING_POINTS: usize = 4;

/// Why a ring could not be read as a list of coordinate pairs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RingDefect {
    #[error("ring {ring} has no points")]
    Empty { ring: usize },

    #[error("point {point} of ring {ring} has {dimension} ordinate(s), at least 2 are required")]
    ShortPosition {
        ring: usize,
        point: usize,
        dimension: usize,
    },

    #[error("coordinates are not nested lists of numbers ({0})")]
    Unparsable(String),
}

/// Read a GeoJSON ring into coordinates, keeping x and y and ignoring any further ordinates.
///
/// `ring` is the index of the ring within its geometry and is only used for error reporting.
pub fn ring_coords(positions: &[geojson::Position], ring: usize) -> Result<Vec<Coord>, RingDefect> {
    if positions.is_empty() {
        return Err(RingDefect::Empty { ring });
    }
    positions
        .iter()
        .enumerate()
        .map(|(point, position)| match position.as_slice() {
            [x, y, ..] => Ok(Coord { x: *x, y: *y }),
            _ => Err(RingDefect::ShortPosition {
                ring,
                point,
                dimension: position.len(),
            }),
        })
        .collect()
}

/// Append the first point when the ring is open. Rings are never reordered.
pub fn close_ring(ring: &[Coord]) -> Vec<Coord> {
    let mut closed = ring.to_vec();
    if let (Some(first), Some(last)) = (ring.first(), ring.last()) {
        if first != last {
            closed.push(*first);
        }
    }
    closed
}

/// Close the ring and check it still describes an area.
pub fn to_closed_ring(ring: &[Coord]) -> Result<LineString, GeometryError> {
    let closed = close_ring(ring);
    if closed.len() < MIN_CLOSED_RING_POINTS {
        return Err(GeometryError::InsufficientVertices(closed.len()));
    }
    Ok(LineString::new(closed))
}
