//! Utilities for working with public crime data.
//!
//! Converts crime-incident CSV exports, which carry planar State Plane
//! coordinates, into GeoJSON FeatureCollections in WGS84.

use std::fs::File;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub mod converter;
pub mod reproject;

pub use converter::{Converter, Summary, X_COLUMN, Y_COLUMN};
pub use reproject::{InvalidCoordinate, Reprojector, SOURCE_CRS, TARGET_CRS};

/// Fatal conditions that abort a conversion run.
#[derive(Debug, Error)]
pub enum ConvertError {
    /// The input cannot be read, or its header is unusable.
    #[error("malformed input: {0}")]
    MalformedInput(String),

    /// The destination could not be created or written.
    #[error("failed to write output: {0}")]
    OutputWrite(#[from] std::io::Error),

    /// The source projection could not be initialized.
    #[error("projection setup failed: {0}")]
    Projection(#[from] proj::ProjCreateError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// A GeoJSON FeatureCollection.
    GeoJson,
    /// The input CSV with coordinate columns rewritten as WGS84.
    Csv,
}

impl OutputFormat {
    /// The default output path for an input file: same name, with the
    /// extension swapped for one matching the format.
    pub fn default_output_path(self, input: &Path) -> PathBuf {
        match self {
            Self::GeoJson => input.with_extension("json"),
            Self::Csv => input.with_extension("wgs84.csv"),
        }
    }
}

/// Converts `input` to `output` in the requested format.
///
/// The input is read and converted in full before the output file is
/// created, so a fatal input error never leaves a partial file behind.
///
/// # Errors
///
/// [`ConvertError::MalformedInput`] if the input cannot be opened or its
/// header is unusable; [`ConvertError::OutputWrite`] if the output cannot
/// be created or written.
pub fn convert_file(
    input: &Path,
    output: &Path,
    format: OutputFormat,
) -> Result<Summary, ConvertError> {
    let converter = Converter::new()?;
    let source = File::open(input).map_err(|e| {
        ConvertError::MalformedInput(format!("cannot read {}: {e}", input.display()))
    })?;

    match format {
        OutputFormat::GeoJson => {
            let (collection, summary) = converter.collect_features(source)?;
            let sink = File::create(output)?;
            converter::write_geojson(&collection, sink)?;
            Ok(summary)
        }
        OutputFormat::Csv => {
            let mut buffer = Vec::new();
            let summary = converter.to_csv(source, &mut buffer)?;
            std::fs::write(output, buffer)?;
            Ok(summary)
        }
    }
}
