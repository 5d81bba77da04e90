pub mod bundle;
pub mod dbf;
pub mod prj;
pub mod shp;
