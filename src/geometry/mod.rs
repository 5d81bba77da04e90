pub mod area;
pub mod ring;
pub mod wkt;
