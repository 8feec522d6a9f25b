//! `wssa getval`: sample a tile layer at sky positions.

use std::io::Write;
use std::str::FromStr;

use clap::Args;
use serde_json::{json, Value};
use tracing::info;
use wssa::config::ConfigFile;
use wssa::release::ExtensionSelector;
use wssa::service::{QueryError, Unit, ValueQuery, ValueResponse, Values};

use super::common::{create_service, CoordinateArgs};
use crate::error::CliError;

#[derive(Debug, Args)]
pub struct GetvalArgs {
    #[command(flatten)]
    pub coords: CoordinateArgs,

    /// Layer to sample, by name (clean, amsk, ...) or ordinal
    #[arg(long, short, default_value = "0", value_parser = ExtensionSelector::from_str)]
    pub exten: ExtensionSelector,

    /// Scale intensity layers to MJy/sr
    #[arg(long)]
    pub calibrated: bool,

    /// Print a JSON document instead of text columns
    #[arg(long)]
    pub json: bool,
}

impl GetvalArgs {
    fn query(&self) -> ValueQuery {
        let unit = if self.calibrated {
            Unit::Calibrated
        } else {
            Unit::Native
        };
        ValueQuery::new()
            .with_extension(self.exten.clone())
            .with_unit(unit)
    }
}

/// Run the getval command.
pub fn run(args: GetvalArgs, config: &ConfigFile) -> Result<(), CliError> {
    let (ra, dec) = args.coords.read()?;
    let service = create_service(config)?;
    let query = args.query();

    let response = service.get_values(&ra, &dec, &query)?;
    info!(
        samples = ra.len(),
        failed = response.failures.len(),
        "Sampled {}",
        query.extension
    );

    let mut stdout = std::io::stdout().lock();
    if args.json {
        let document = json_document(&ra, &dec, &query, &response);
        serde_json::to_writer_pretty(&mut stdout, &document)?;
        writeln!(stdout)?;
    } else {
        for line in text_lines(&ra, &dec, &response.values) {
            writeln!(stdout, "{}", line)?;
        }
    }

    if response.is_complete() {
        Ok(())
    } else {
        Err(QueryError::RasterIo {
            failures: response.failures,
        }
        .into())
    }
}

fn value_strings(values: &Values) -> Vec<String> {
    match values {
        Values::Continuous(v) => v.iter().map(|x| x.to_string()).collect(),
        Values::Categorical(v) => v.iter().map(|x| x.to_string()).collect(),
    }
}

/// One "ra dec value" line per position.
fn text_lines(ra: &[f64], dec: &[f64], values: &Values) -> Vec<String> {
    ra.iter()
        .zip(dec)
        .zip(value_strings(values))
        .map(|((ra, dec), value)| format!("{} {} {}", ra, dec, value))
        .collect()
}

/// Failed samples are `null`.
fn json_document(ra: &[f64], dec: &[f64], query: &ValueQuery, response: &ValueResponse) -> Value {
    let values: Vec<Value> = match &response.values {
        Values::Continuous(v) => v.iter().map(|&x| Value::from(f64::from(x))).collect(),
        Values::Categorical(v) => v.iter().map(|&x| Value::from(x)).collect(),
    };
    let values: Vec<Value> = values
        .into_iter()
        .zip(response.failed.iter())
        .map(|(value, &failed)| if failed { Value::Null } else { value })
        .collect();
    let failures: Vec<Value> = response
        .failures
        .iter()
        .map(|f| {
            json!({
                "tile": f.tile.get(),
                "indices": f.indices,
                "error": f.error.to_string(),
            })
        })
        .collect();

    json!({
        "extension": query.extension.to_string(),
        "unit": query.unit.to_string(),
        "kind": response.values.kind().to_string(),
        "ra": ra,
        "dec": dec,
        "values": values,
        "failures": failures,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{arr1, ArrayD};

    fn response(values: Values, failed: Vec<bool>) -> ValueResponse {
        ValueResponse {
            values,
            failed: arr1(&failed).into_dyn(),
            failures: Vec::new(),
        }
    }

    #[test]
    fn test_query_from_args() {
        let args = GetvalArgs {
            coords: CoordinateArgs::default(),
            exten: "amsk".parse().unwrap(),
            calibrated: true,
            json: false,
        };
        let query = args.query();
        assert_eq!(query.extension, ExtensionSelector::Name("amsk".to_string()));
        assert_eq!(query.unit, Unit::Calibrated);
    }

    #[test]
    fn test_text_lines() {
        let values = Values::Categorical(ArrayD::from_shape_vec(vec![2], vec![3, 64]).unwrap());
        let lines = text_lines(&[10.0, 20.5], &[-5.0, 0.25], &values);
        assert_eq!(lines, vec!["10 -5 3", "20.5 0.25 64"]);
    }

    #[test]
    fn test_json_failed_values_are_null() {
        let values =
            Values::Continuous(ArrayD::from_shape_vec(vec![2], vec![1.5, f32::NAN]).unwrap());
        let document = json_document(
            &[1.0, 2.0],
            &[3.0, 4.0],
            &ValueQuery::new(),
            &response(values, vec![false, true]),
        );

        assert_eq!(document["values"], json!([1.5, null]));
        assert_eq!(document["kind"], "continuous");
        assert_eq!(document["unit"], "native");
        assert_eq!(document["extension"], "0");
    }
}
