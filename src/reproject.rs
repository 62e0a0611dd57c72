//! Planar-to-geographic coordinate reprojection.
//!
//! The source datasets use the Oregon North State Plane system (NAD83,
//! international feet). Web maps want WGS84 longitude/latitude, so every
//! incident coordinate goes through one projection transform.

use proj::Proj;
use thiserror::Error;

/// The planar coordinate reference system of the source data
/// (NAD83 / Oregon North, EPSG:2269).
pub const SOURCE_CRS: &str = "EPSG:2269";

/// The geographic coordinate reference system of the output (WGS84).
pub const TARGET_CRS: &str = "EPSG:4326";

/// A coordinate value that cannot be turned into a WGS84 point.
///
/// These are per-row conditions: the pipeline skips the offending row and
/// keeps going.
#[derive(Debug, Error)]
pub enum InvalidCoordinate {
    #[error("missing coordinate value")]
    Missing,
    #[error("non-numeric coordinate value: {0:?}")]
    NotNumeric(String),
    #[error("non-finite coordinate value: {0}")]
    NotFinite(f64),
    #[error("reprojected point ({0}, {1}) is outside WGS84 bounds")]
    OutOfBounds(f64, f64),
    #[error("projection failed: {0}")]
    Projection(#[from] proj::ProjError),
}

/// Transforms planar (x, y) pairs in [`SOURCE_CRS`] into WGS84
/// (longitude, latitude) pairs.
///
/// Holds the underlying `proj` transformation, which is set up once per run.
pub struct Reprojector {
    transform: Proj,
}

impl Reprojector {
    /// Builds the [`SOURCE_CRS`] -> [`TARGET_CRS`] transformation.
    pub fn new() -> Result<Self, proj::ProjCreateError> {
        let transform = Proj::new_known_crs(SOURCE_CRS, TARGET_CRS, None)?;
        Ok(Self { transform })
    }

    /// Reprojects a planar (x, y) pair to WGS84 (longitude, latitude).
    ///
    /// Rejects non-finite inputs up front, and rejects any result that falls
    /// outside [-180, 180] x [-90, 90] rather than clamping it: an
    /// out-of-bounds result means the input was garbage, and clamping would
    /// quietly pin bad records to the edge of the map.
    pub fn reproject(&self, x: f64, y: f64) -> Result<(f64, f64), InvalidCoordinate> {
        if !x.is_finite() {
            return Err(InvalidCoordinate::NotFinite(x));
        }
        if !y.is_finite() {
            return Err(InvalidCoordinate::NotFinite(y));
        }

        let (lng, lat) = self.transform.convert((x, y))?;
        validate_wgs84(lng, lat)
    }
}

/// Checks a reprojected point against valid WGS84 bounds.
fn validate_wgs84(lng: f64, lat: f64) -> Result<(f64, f64), InvalidCoordinate> {
    if !(-180.0..=180.0).contains(&lng) || !(-90.0..=90.0).contains(&lat) {
        return Err(InvalidCoordinate::OutOfBounds(lng, lat));
    }
    Ok((lng, lat))
}

/// Parses one CSV field as a planar coordinate.
pub fn parse_coordinate(value: Option<&str>) -> Result<f64, InvalidCoordinate> {
    let value = value.ok_or(InvalidCoordinate::Missing)?;
    value
        .trim()
        .parse::<f64>()
        .map_err(|_| InvalidCoordinate::NotNumeric(value.to_string()))
}
