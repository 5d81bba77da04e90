extern crate log;
pub mod attributes;
pub mod config;
pub mod error;
pub mod export;
pub mod geofile;
pub mod geometry;
pub mod soil;
use crate::config::Config;
use crate::error::{EncodingError, HydroError};
use crate::export::{export_csv, export_shapefile, ExportArtifact};
use crate::geofile::geojson::{read_features_from_str, read_query_geometry};
use crate::soil::client::{resolve_polygon_hsg, SdaClient};
use crate::soil::response::HsgReport;
use anyhow::anyhow;
use clap::{Parser, Subcommand};
use serde_json::Value;
use std::fs::read_to_string;
use std::path::{Path, PathBuf};

/// Prepare HydroCAD subcatchment data: CSV and Shapefile exports, soil group lookups.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the YAML config file.
    #[arg(short, long)]
    config_filepath: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Export subcatchment attributes to subcatchments.csv.
    ExportCsv {
        /// JSON list of attribute bags, `{"subcatchments": [...]}` or a FeatureCollection.
        #[arg(short, long)]
        input: PathBuf,
    },
    /// Export drawn polygons to a zipped Shapefile, hydrocad_gis.zip.
    ExportShp {
        /// GeoJSON FeatureCollection.
        #[arg(short, long)]
        input: PathBuf,
    },
    /// Look up the hydrologic soil groups under a polygon.
    SoilQuery {
        /// GeoJSON Polygon geometry or a Feature holding one.
        #[arg(short, long)]
        input: PathBuf,
    },
}

fn read_input(input_filepath: &Path) -> anyhow::Result<String> {
    if !input_filepath.exists() {
        return Err(anyhow!("Input file {:?} not found", input_filepath));
    }
    Ok(read_to_string(input_filepath)?)
}

fn read_json_input(input_filepath: &Path) -> anyhow::Result<Value> {
    let input = serde_json::from_str(&read_input(input_filepath)?)
        .map_err(|err| HydroError::from(EncodingError::from(err)))?;
    Ok(input)
}

fn write_artifact(artifact: &ExportArtifact, config: &Config) -> anyhow::Result<()> {
    std::fs::create_dir_all(&config.output_dir)?;
    let output_filepath = artifact.write_to_dir(&config.output_dir)?;
    log::info!(
        "Wrote {} bytes of {} to {:?}",
        artifact.bytes.len(),
        artifact.media_type,
        output_filepath
    );
    Ok(())
}

fn try_main() -> anyhow::Result<()> {
    let args = Args::try_parse()?;
    let config = match &args.config_filepath {
        Some(config_filepath) => Config::from_yaml_file(config_filepath)?,
        None => Config::default(),
    };

    match args.command {
        Command::ExportCsv { input } => {
            write_artifact(&export_csv(&read_json_input(&input)?)?, &config)?;
        }
        Command::ExportShp { input } => {
            let features =
                read_features_from_str(&read_input(&input)?).map_err(HydroError::from)?;
            log::info!("Read {} feature(s)", features.len());
            write_artifact(&export_shapefile(&features)?, &config)?;
        }
        Command::SoilQuery { input } => {
            let input = read_json_input(&input)?;
            let geometry = read_query_geometry(&input).map_err(HydroError::from)?;
            let client = SdaClient::new(config.sda_endpoint().map_err(HydroError::from)?)
                .map_err(HydroError::from)?;
            let groups = resolve_polygon_hsg(&client, &geometry)?;
            println!("{}", serde_json::to_string(&HsgReport::from(groups))?);
        }
    }
    Ok(())
}

fn main() {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info")
    }
    env_logger::init();
    if let Err(e) = try_main() {
        match e.downcast_ref::<HydroError>() {
            Some(hydro_error) => eprintln!(
                "Error [{} {}]: {}",
                hydro_error.status_code(),
                hydro_error.kind(),
                hydro_error.user_message()
            ),
            None => eprintln!("Error: {:?}", e),
        }
        log::debug!("{:?}", e);
        std::process::exit(1)
    }
}
