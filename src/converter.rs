//! CSV-to-GeoJSON conversion pipeline.
//!
//! Reads crime-incident rows from a CSV source, reprojects each row's
//! planar coordinates to WGS84, and emits either a GeoJSON
//! FeatureCollection or the original CSV with normalized coordinates.
//! Rows with unusable coordinates are skipped and counted; structural
//! problems (unreadable input, bad header) abort the run before any
//! output is produced.

use std::collections::HashSet;
use std::io::{Read, Write};

use geojson::{Feature, FeatureCollection, Geometry};
use serde_json::{Map, Value as JsonValue};

use crate::reproject::{parse_coordinate, InvalidCoordinate, Reprojector};
use crate::ConvertError;

/// Header name of the planar easting column in the source schema.
pub const X_COLUMN: &str = "X Coordinate";

/// Header name of the planar northing column in the source schema.
pub const Y_COLUMN: &str = "Y Coordinate";

/// Counts reported after a conversion run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    /// Data rows read from the input (header excluded).
    pub rows_read: usize,
    /// Rows successfully converted and written.
    pub features_written: usize,
    /// Rows dropped because of bad coordinates or malformed fields.
    pub rows_skipped: usize,
}

/// Positions of the coordinate columns within the header.
struct CoordinateColumns {
    x: usize,
    y: usize,
}

/// Converts crime-incident CSV data into GeoJSON or coordinate-normalized
/// CSV output.
pub struct Converter {
    reprojector: Reprojector,
}

impl Converter {
    pub fn new() -> Result<Self, ConvertError> {
        Ok(Self {
            reprojector: Reprojector::new()?,
        })
    }

    /// Runs the full CSV -> GeoJSON pipeline against in-memory or file
    /// sources.
    pub fn to_geojson<R: Read, W: Write>(
        &self,
        input: R,
        output: W,
    ) -> Result<Summary, ConvertError> {
        let (collection, summary) = self.collect_features(input)?;
        write_geojson(&collection, output)?;
        Ok(summary)
    }

    /// Runs the full CSV -> CSV pipeline, replacing the coordinate columns
    /// with WGS84 longitude/latitude.
    pub fn to_csv<R: Read, W: Write>(&self, input: R, output: W) -> Result<Summary, ConvertError> {
        let (header, rows, summary) = self.collect_wgs84_rows(input)?;
        write_csv(&header, &rows, output)?;
        Ok(summary)
    }

    /// Reads all rows from `input` and converts them into GeoJSON Features,
    /// in input order.
    ///
    /// Fails with [`ConvertError::MalformedInput`] if the header cannot be
    /// read, lacks a coordinate column, or repeats a column name. Individual
    /// bad rows are logged, skipped, and counted in the summary.
    pub fn collect_features<R: Read>(
        &self,
        input: R,
    ) -> Result<(FeatureCollection, Summary), ConvertError> {
        let mut reader = csv_reader(input);
        let header = read_header(&mut reader)?;
        let columns = coordinate_columns(&header)?;

        let mut features = Vec::new();
        let mut summary = Summary::default();

        for (index, result) in reader.records().enumerate() {
            summary.rows_read += 1;
            let record = match result {
                Ok(record) => record,
                Err(err) => {
                    log::warn!("skipping row {}: {err}", index + 2);
                    summary.rows_skipped += 1;
                    continue;
                }
            };

            match self.feature_from_record(&header, &columns, &record) {
                Ok(feature) => features.push(feature),
                Err(err) => {
                    log::warn!("skipping row {}: {err}", index + 2);
                    summary.rows_skipped += 1;
                }
            }
        }

        summary.features_written = features.len();
        if features.is_empty() {
            log::warn!("no valid features found in input");
        }

        let collection = FeatureCollection {
            bbox: None,
            features,
            foreign_members: None,
        };
        Ok((collection, summary))
    }

    /// Reads all rows from `input` and rewrites their coordinate columns as
    /// WGS84 longitude/latitude, keeping every other field verbatim.
    fn collect_wgs84_rows<R: Read>(
        &self,
        input: R,
    ) -> Result<(csv::StringRecord, Vec<Vec<String>>, Summary), ConvertError> {
        let mut reader = csv_reader(input);
        let header = read_header(&mut reader)?;
        let columns = coordinate_columns(&header)?;

        let mut rows = Vec::new();
        let mut summary = Summary::default();

        for (index, result) in reader.records().enumerate() {
            summary.rows_read += 1;
            let record = match result {
                Ok(record) => record,
                Err(err) => {
                    log::warn!("skipping row {}: {err}", index + 2);
                    summary.rows_skipped += 1;
                    continue;
                }
            };

            match self.wgs84_point(&columns, &record) {
                Ok((lng, lat)) => {
                    let mut row: Vec<String> = record.iter().map(str::to_string).collect();
                    row[columns.x] = lng.to_string();
                    row[columns.y] = lat.to_string();
                    rows.push(row);
                }
                Err(err) => {
                    log::warn!("skipping row {}: {err}", index + 2);
                    summary.rows_skipped += 1;
                }
            }
        }

        summary.features_written = rows.len();
        if rows.is_empty() {
            log::warn!("no valid rows found in input");
        }
        Ok((header, rows, summary))
    }

    /// Extracts and reprojects the coordinate pair from one record.
    fn wgs84_point(
        &self,
        columns: &CoordinateColumns,
        record: &csv::StringRecord,
    ) -> Result<(f64, f64), InvalidCoordinate> {
        let x = parse_coordinate(record.get(columns.x))?;
        let y = parse_coordinate(record.get(columns.y))?;
        self.reprojector.reproject(x, y)
    }

    /// Converts one CSV record into a GeoJSON Feature.
    ///
    /// The coordinate columns become the Point geometry; every other column
    /// passes through into properties under its header name, in header
    /// order. Empty fields become JSON null.
    fn feature_from_record(
        &self,
        header: &csv::StringRecord,
        columns: &CoordinateColumns,
        record: &csv::StringRecord,
    ) -> Result<Feature, InvalidCoordinate> {
        let (lng, lat) = self.wgs84_point(columns, record)?;

        let mut properties = Map::new();
        for (index, name) in header.iter().enumerate() {
            if index == columns.x || index == columns.y {
                continue;
            }
            let value = match record.get(index) {
                None | Some("") => JsonValue::Null,
                Some(field) => JsonValue::String(field.to_string()),
            };
            properties.insert(name.to_string(), value);
        }

        Ok(Feature {
            bbox: None,
            geometry: Some(Geometry::new(geojson::Value::Point(vec![lng, lat]))),
            id: None,
            properties: Some(properties),
            foreign_members: None,
        })
    }
}

/// Serializes a FeatureCollection to the output sink.
pub fn write_geojson<W: Write>(
    collection: &FeatureCollection,
    output: W,
) -> Result<(), ConvertError> {
    serde_json::to_writer(output, collection).map_err(|e| ConvertError::OutputWrite(e.into()))
}

/// Writes the header and normalized rows as CSV to the output sink.
fn write_csv<W: Write>(
    header: &csv::StringRecord,
    rows: &[Vec<String>],
    output: W,
) -> Result<(), ConvertError> {
    let mut writer = csv::WriterBuilder::new().flexible(true).from_writer(output);
    writer.write_record(header).map_err(csv_write_err)?;
    for row in rows {
        writer.write_record(row).map_err(csv_write_err)?;
    }
    writer.flush().map_err(ConvertError::OutputWrite)
}

fn csv_write_err(err: csv::Error) -> ConvertError {
    ConvertError::OutputWrite(std::io::Error::other(err))
}

fn csv_reader<R: Read>(input: R) -> csv::Reader<R> {
    // flexible: a short row is a per-row skip, not a fatal parse error
    csv::ReaderBuilder::new().flexible(true).from_reader(input)
}

fn read_header<R: Read>(reader: &mut csv::Reader<R>) -> Result<csv::StringRecord, ConvertError> {
    reader
        .headers()
        .map(Clone::clone)
        .map_err(|e| ConvertError::MalformedInput(format!("cannot read header: {e}")))
}

/// Locates the coordinate columns in the header.
///
/// A header that repeats any column name is rejected: a duplicated
/// coordinate column makes the geometry source ambiguous, and a duplicated
/// property column would drop data in the JSON object.
fn coordinate_columns(header: &csv::StringRecord) -> Result<CoordinateColumns, ConvertError> {
    let mut seen = HashSet::new();
    for name in header.iter() {
        if !seen.insert(name) {
            return Err(ConvertError::MalformedInput(format!(
                "duplicate column name: {name:?}"
            )));
        }
    }

    let position = |name: &str| {
        header.iter().position(|field| field == name).ok_or_else(|| {
            ConvertError::MalformedInput(format!("missing required column: {name:?}"))
        })
    };

    Ok(CoordinateColumns {
        x: position(X_COLUMN)?,
        y: position(Y_COLUMN)?,
    })
}
