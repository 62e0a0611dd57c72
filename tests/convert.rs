//! End-to-end file conversion tests.

use std::fs;
use std::path::PathBuf;

use crimetools::{convert_file, ConvertError, OutputFormat};
use serde_json::Value;
use tempfile::TempDir;

const HEADER: &str = "Record ID,Report Date,Report Time,Major Offense Type,Address,\
                      Neighborhood,Police Precinct,Police District,X Coordinate,Y Coordinate";

fn write_input(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).unwrap();
    path
}

#[test]
fn converts_csv_file_to_geojson() {
    let dir = TempDir::new().unwrap();
    let input = write_input(
        &dir,
        "crimes.csv",
        &format!(
            "{HEADER}\n\
             13807517,12/01/2011,01:00:00,Liquor Laws,NE WEIDLER ST,LLOYD,PORTLAND PREC NO,690,\
             7647471.01608,688344.45013\n\
             13716403,07/07/2011,18:30:00,Liquor Laws,NE SCHUYLER ST,ELIOT,PORTLAND PREC NO,590,\
             7647488.15584,688869.34843\n"
        ),
    );
    let output = dir.path().join("crimes.json");

    let summary = convert_file(&input, &output, OutputFormat::GeoJson).unwrap();
    assert_eq!(summary.rows_read, 2);
    assert_eq!(summary.features_written, 2);
    assert_eq!(summary.rows_skipped, 0);

    let parsed: Value = serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(parsed["type"], "FeatureCollection");

    let features = parsed["features"].as_array().unwrap();
    assert_eq!(features.len(), 2);

    // input row order is preserved
    assert_eq!(features[0]["properties"]["Record ID"], "13807517");
    assert_eq!(features[1]["properties"]["Record ID"], "13716403");

    let coords = features[0]["geometry"]["coordinates"].as_array().unwrap();
    assert!((coords[0].as_f64().unwrap() - -122.664_695_107).abs() < 1e-4);
    assert!((coords[1].as_f64().unwrap() - 45.534_356_991).abs() < 1e-4);

    // coordinate columns are consumed by the geometry
    let properties = features[0]["properties"].as_object().unwrap();
    assert!(!properties.contains_key("X Coordinate"));
    assert!(!properties.contains_key("Y Coordinate"));
    assert_eq!(properties["Major Offense Type"], "Liquor Laws");
}

#[test]
fn skipped_rows_do_not_fail_the_run() {
    let dir = TempDir::new().unwrap();
    let input = write_input(
        &dir,
        "crimes.csv",
        &format!(
            "{HEADER}\n\
             1,12/01/2011,01:00:00,Theft,a,LLOYD,PREC,690,7647471.01608,688344.45013\n\
             2,07/07/2011,18:30:00,Theft,b,ELIOT,PREC,590,Bad X Coordinate,688869.34843\n"
        ),
    );
    let output = dir.path().join("crimes.json");

    let summary = convert_file(&input, &output, OutputFormat::GeoJson).unwrap();
    assert_eq!(summary.rows_read, 2);
    assert_eq!(summary.features_written, 1);
    assert_eq!(summary.rows_skipped, 1);

    let parsed: Value = serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(parsed["features"].as_array().unwrap().len(), 1);
}

#[test]
fn missing_schema_is_fatal_and_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "crimes.csv", "Record ID,Report Date\n1,12/01/2011\n");
    let output = dir.path().join("crimes.json");

    let err = convert_file(&input, &output, OutputFormat::GeoJson).unwrap_err();
    assert!(matches!(err, ConvertError::MalformedInput(_)));
    assert!(!output.exists());
}

#[test]
fn unreadable_input_is_malformed() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("does-not-exist.csv");
    let output = dir.path().join("crimes.json");

    let err = convert_file(&input, &output, OutputFormat::GeoJson).unwrap_err();
    assert!(matches!(err, ConvertError::MalformedInput(_)));
    assert!(!output.exists());
}

#[test]
fn unwritable_output_is_fatal() {
    let dir = TempDir::new().unwrap();
    let input = write_input(
        &dir,
        "crimes.csv",
        &format!(
            "{HEADER}\n1,12/01/2011,01:00:00,Theft,a,LLOYD,PREC,690,7647471.01608,688344.45013\n"
        ),
    );
    let output = dir.path().join("missing-subdir").join("crimes.json");

    let err = convert_file(&input, &output, OutputFormat::GeoJson).unwrap_err();
    assert!(matches!(err, ConvertError::OutputWrite(_)));
    assert!(!output.exists());
}

#[test]
fn unwritable_csv_output_is_fatal() {
    let dir = TempDir::new().unwrap();
    let input = write_input(
        &dir,
        "crimes.csv",
        &format!(
            "{HEADER}\n1,12/01/2011,01:00:00,Theft,a,LLOYD,PREC,690,7647471.01608,688344.45013\n"
        ),
    );
    let output = dir.path().join("missing-subdir").join("crimes.wgs84.csv");

    let err = convert_file(&input, &output, OutputFormat::Csv).unwrap_err();
    assert!(matches!(err, ConvertError::OutputWrite(_)));
}

#[test]
fn normalizes_csv_coordinates_in_place() {
    let dir = TempDir::new().unwrap();
    let input = write_input(
        &dir,
        "crimes.csv",
        &format!(
            "{HEADER}\n13807517,12/01/2011,01:00:00,Liquor Laws,NE WEIDLER ST,LLOYD,PREC,690,\
             7647471.01608,688344.45013\n"
        ),
    );
    let output = dir.path().join("crimes.wgs84.csv");

    let summary = convert_file(&input, &output, OutputFormat::Csv).unwrap();
    assert_eq!(summary.features_written, 1);

    let text = fs::read_to_string(&output).unwrap();
    let mut lines = text.lines();
    assert_eq!(lines.next().unwrap(), HEADER);

    let fields: Vec<&str> = lines.next().unwrap().split(',').collect();
    assert_eq!(fields[0], "13807517");
    assert!((fields[8].parse::<f64>().unwrap() - -122.664_695).abs() < 1e-4);
    assert!((fields[9].parse::<f64>().unwrap() - 45.534_357).abs() < 1e-4);
}
