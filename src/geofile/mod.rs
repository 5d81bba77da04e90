pub mod csv;
pub mod feature;
pub mod geojson;
pub mod shapefile;
