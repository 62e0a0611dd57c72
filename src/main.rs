use clap::{Arg, Command};
use std::path::PathBuf;

use crimetools::OutputFormat;

fn main() {
    pretty_env_logger::init();

    let matches = Command::new("crimetools")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Converts crime-incident CSV records into GeoJSON with WGS84 coordinates")
        .arg(
            Arg::new("input")
                .required(true)
                .help("The CSV file to read crime records from"),
        )
        .arg(
            Arg::new("output")
                .help("The file to write converted records to (defaults to the input name with the extension swapped)"),
        )
        .arg(
            Arg::new("format")
                .short('f')
                .long("format")
                .value_parser(["geojson", "csv"])
                .default_value("geojson")
                .help("Output format: a GeoJSON FeatureCollection, or the input CSV with WGS84 coordinates"),
        )
        .get_matches();

    let input = PathBuf::from(matches.get_one::<String>("input").unwrap());

    let format = match matches.get_one::<String>("format").unwrap().as_str() {
        "csv" => OutputFormat::Csv,
        _ => OutputFormat::GeoJson,
    };

    let output = matches
        .get_one::<String>("output")
        .map(PathBuf::from)
        .unwrap_or_else(|| format.default_output_path(&input));

    if !input.exists() {
        eprintln!("Error: File not found: {}", input.display());
        std::process::exit(1);
    }

    match crimetools::convert_file(&input, &output, format) {
        Ok(summary) => {
            println!("{} rows read", summary.rows_read);
            println!("{} records converted", summary.features_written);
            println!("{} records skipped due to bad data", summary.rows_skipped);
            println!("Output written to: {}", output.display());
        }
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}
