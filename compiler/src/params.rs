//! Process parameters: physical fabrication constants bounding valid
//! geometry.
//!
//! Loaded either from a JSON file or from one command-line flag per
//! constant. All five values are required and must be finite; anything
//! else is rejected before translation begins.

use clap::Args;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

const MINIMUM_NODE_DISTANCE: &str = "minimumNodeDistance";
const MINIMUM_CHANNEL_LENGTH: &str = "minimumChannelLength";
const MAXIMUM_CHIP_SIZE_X: &str = "maximumChipSizeX";
const MAXIMUM_CHIP_SIZE_Y: &str = "maximumChipSizeY";
const CRITICAL_CROSSING_ANGLE: &str = "criticalCrossingAngle";

#[derive(Debug, Error)]
pub enum ProcessParameterError {
    #[error("missing process parameter '{0}'")]
    Missing(&'static str),

    #[error("process parameter '{field}' is not a number: '{value}'")]
    NotANumber { field: &'static str, value: String },

    #[error("process parameter '{field}' must be finite, got {value}")]
    NonFinite { field: &'static str, value: f64 },

    #[error("process parameter '{field}' is out of range: {value}")]
    OutOfRange { field: &'static str, value: f64 },

    #[error("IO error reading process file: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error in process file: {0}")]
    Json(#[from] serde_json::Error),
}

/// Validated process constants. Lengths are in metres, angles in radians.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProcessParameters {
    minimum_node_distance: f64,
    minimum_channel_length: f64,
    maximum_chip_size_x: f64,
    maximum_chip_size_y: f64,
    critical_crossing_angle: f64,
}

impl ProcessParameters {
    pub fn new(
        minimum_node_distance: f64,
        minimum_channel_length: f64,
        maximum_chip_size_x: f64,
        maximum_chip_size_y: f64,
        critical_crossing_angle: f64,
    ) -> Result<Self, ProcessParameterError> {
        let params = Self {
            minimum_node_distance: finite(MINIMUM_NODE_DISTANCE, minimum_node_distance)?,
            minimum_channel_length: finite(MINIMUM_CHANNEL_LENGTH, minimum_channel_length)?,
            maximum_chip_size_x: finite(MAXIMUM_CHIP_SIZE_X, maximum_chip_size_x)?,
            maximum_chip_size_y: finite(MAXIMUM_CHIP_SIZE_Y, maximum_chip_size_y)?,
            critical_crossing_angle: finite(CRITICAL_CROSSING_ANGLE, critical_crossing_angle)?,
        };
        // node spacing is constrained in squared form
        if !params.minimum_node_distance_squared().is_finite() {
            return Err(ProcessParameterError::OutOfRange {
                field: MINIMUM_NODE_DISTANCE,
                value: minimum_node_distance,
            });
        }
        params.warn_on_implausible_values();
        Ok(params)
    }

    /// Load process parameters from a JSON file.
    ///
    /// Values may be JSON numbers or numeric strings.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ProcessParameterError> {
        let bytes = std::fs::read(path.as_ref())?;
        let raw: RawProcessParameters = serde_json::from_slice(&bytes)?;
        debug!(path = %path.as_ref().display(), "process parameters read from file");
        Self::from_values([
            raw.minimum_node_distance,
            raw.minimum_channel_length,
            raw.maximum_chip_size_x,
            raw.maximum_chip_size_y,
            raw.critical_crossing_angle,
        ])
    }

    fn from_values(values: [Option<RawValue>; 5]) -> Result<Self, ProcessParameterError> {
        let [node_distance, channel_length, size_x, size_y, angle] = values;
        Self::new(
            required(MINIMUM_NODE_DISTANCE, node_distance)?,
            required(MINIMUM_CHANNEL_LENGTH, channel_length)?,
            required(MAXIMUM_CHIP_SIZE_X, size_x)?,
            required(MAXIMUM_CHIP_SIZE_Y, size_y)?,
            required(CRITICAL_CROSSING_ANGLE, angle)?,
        )
    }

    pub fn minimum_node_distance(&self) -> f64 {
        self.minimum_node_distance
    }

    pub fn minimum_node_distance_squared(&self) -> f64 {
        self.minimum_node_distance * self.minimum_node_distance
    }

    pub fn minimum_channel_length(&self) -> f64 {
        self.minimum_channel_length
    }

    pub fn maximum_chip_size_x(&self) -> f64 {
        self.maximum_chip_size_x
    }

    pub fn maximum_chip_size_y(&self) -> f64 {
        self.maximum_chip_size_y
    }

    pub fn critical_crossing_angle(&self) -> f64 {
        self.critical_crossing_angle
    }

    fn warn_on_implausible_values(&self) {
        for (field, value) in [
            (MINIMUM_NODE_DISTANCE, self.minimum_node_distance),
            (MINIMUM_CHANNEL_LENGTH, self.minimum_channel_length),
            (MAXIMUM_CHIP_SIZE_X, self.maximum_chip_size_x),
            (MAXIMUM_CHIP_SIZE_Y, self.maximum_chip_size_y),
        ] {
            if value <= 0.0 {
                warn!(field, value, "non-positive length makes the placement infeasible");
            }
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawValue {
    Number(f64),
    Text(String),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct RawProcessParameters {
    minimum_node_distance: Option<RawValue>,
    minimum_channel_length: Option<RawValue>,
    maximum_chip_size_x: Option<RawValue>,
    maximum_chip_size_y: Option<RawValue>,
    critical_crossing_angle: Option<RawValue>,
}

fn required(field: &'static str, value: Option<RawValue>) -> Result<f64, ProcessParameterError> {
    match value {
        None => Err(ProcessParameterError::Missing(field)),
        Some(RawValue::Number(v)) => Ok(v),
        Some(RawValue::Text(text)) => {
            text.trim()
                .parse::<f64>()
                .map_err(|_| ProcessParameterError::NotANumber {
                    field,
                    value: text.clone(),
                })
        }
    }
}

fn finite(field: &'static str, value: f64) -> Result<f64, ProcessParameterError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ProcessParameterError::NonFinite { field, value })
    }
}

/// Command-line source for process parameters: either a file or the full
/// family of per-constant flags.
#[derive(Debug, Clone, Default, Args)]
pub struct ProcessParameterArgs {
    /// Load process parameters from the given JSON file
    #[arg(
        long = "process-file",
        value_name = "FILE",
        conflicts_with_all = [
            "minimum_node_distance",
            "minimum_channel_length",
            "maximum_chip_size_x",
            "maximum_chip_size_y",
            "critical_crossing_angle",
        ]
    )]
    pub process_file: Option<PathBuf>,

    /// Minimum distance between any two nodes (m)
    #[arg(long = "process-minimum-node-distance", value_name = "VALUE")]
    pub minimum_node_distance: Option<String>,

    /// Minimum length of any channel (m)
    #[arg(long = "process-minimum-channel-length", value_name = "VALUE")]
    pub minimum_channel_length: Option<String>,

    /// Maximum chip extent along x (m)
    #[arg(long = "process-maximum-chip-size-x", value_name = "VALUE")]
    pub maximum_chip_size_x: Option<String>,

    /// Maximum chip extent along y (m)
    #[arg(long = "process-maximum-chip-size-y", value_name = "VALUE")]
    pub maximum_chip_size_y: Option<String>,

    /// Critical angle below which channel crossings are disallowed (rad)
    #[arg(long = "process-critical-crossing-angle", value_name = "VALUE")]
    pub critical_crossing_angle: Option<String>,
}

impl ProcessParameterArgs {
    pub fn load(&self) -> Result<ProcessParameters, ProcessParameterError> {
        if let Some(path) = &self.process_file {
            return ProcessParameters::load(path);
        }
        debug!("no process file specified, reading process parameters from command line");
        let flag = |value: &Option<String>| value.clone().map(RawValue::Text);
        ProcessParameters::from_values([
            flag(&self.minimum_node_distance),
            flag(&self.minimum_channel_length),
            flag(&self.maximum_chip_size_x),
            flag(&self.maximum_chip_size_y),
            flag(&self.critical_crossing_angle),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        process: ProcessParameterArgs,
    }

    fn parse(args: &[&str]) -> Result<ProcessParameters, ProcessParameterError> {
        let cli = TestCli::try_parse_from(std::iter::once("mfc").chain(args.iter().copied()))
            .expect("arguments should parse");
        cli.process.load()
    }

    #[test]
    fn test_from_command_line() {
        let params = parse(&[
            "--process-minimum-node-distance",
            "0.0001",
            "--process-minimum-channel-length",
            "0.0001",
            "--process-maximum-chip-size-x",
            "0.04",
            "--process-maximum-chip-size-y",
            "0.04",
            "--process-critical-crossing-angle",
            "0.0872664626",
        ])
        .unwrap();
        assert_eq!(params.minimum_channel_length(), 0.0001);
        assert_eq!(params.maximum_chip_size_x(), 0.04);
        assert_eq!(params.critical_crossing_angle(), 0.0872664626);
    }

    #[test]
    fn test_from_command_line_missing_option() {
        let err = parse(&[
            "--process-minimum-node-distance",
            "0.0001",
            "--process-minimum-channel-length",
            "0.0001",
            "--process-maximum-chip-size-x",
            "0.04",
            "--process-maximum-chip-size-y",
            "0.04",
        ])
        .unwrap_err();
        assert!(matches!(
            err,
            ProcessParameterError::Missing(CRITICAL_CROSSING_ANGLE)
        ));
    }

    #[test]
    fn test_from_command_line_not_a_number() {
        let err = parse(&[
            "--process-minimum-node-distance",
            "foo",
            "--process-minimum-channel-length",
            "bar",
            "--process-maximum-chip-size-x",
            "baz",
            "--process-maximum-chip-size-y",
            "doge",
            "--process-critical-crossing-angle",
            "wow",
        ])
        .unwrap_err();
        assert!(err.to_string().contains("minimumNodeDistance"));
        assert!(err.to_string().contains("foo"));
    }

    #[test]
    fn test_non_finite_rejected() {
        let err = ProcessParameters::new(1.0, f64::NAN, 1.0, 1.0, 1.0).unwrap_err();
        assert!(matches!(
            err,
            ProcessParameterError::NonFinite {
                field: MINIMUM_CHANNEL_LENGTH,
                ..
            }
        ));
        assert!(parse(&[
            "--process-minimum-node-distance",
            "inf",
            "--process-minimum-channel-length",
            "1",
            "--process-maximum-chip-size-x",
            "1",
            "--process-maximum-chip-size-y",
            "1",
            "--process-critical-crossing-angle",
            "1",
        ])
        .is_err());
    }

    #[test]
    fn test_node_distance_must_square_finitely() {
        let err = ProcessParameters::new(1e200, 1e-4, 0.04, 0.04, 0.087).unwrap_err();
        assert!(matches!(
            err,
            ProcessParameterError::OutOfRange {
                field: MINIMUM_NODE_DISTANCE,
                ..
            }
        ));

        let params = ProcessParameters::new(1e-4, 1e-4, 0.04, 0.04, 0.087).unwrap();
        assert!(params.minimum_node_distance_squared().is_finite());
    }

    #[test]
    fn test_file_conflicts_with_flags() {
        let result = TestCli::try_parse_from([
            "mfc",
            "--process-file",
            "params.json",
            "--process-maximum-chip-size-x",
            "0.04",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_from_file() {
        let json_content = r#"{
            "minimumNodeDistance": 0.0001,
            "minimumChannelLength": "0.0001",
            "maximumChipSizeX": 0.04,
            "maximumChipSizeY": 0.04,
            "criticalCrossingAngle": 0.0872664626
        }"#;
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(json_content.as_bytes()).unwrap();

        let path = temp_file.path().to_str().unwrap().to_string();
        let params = parse(&["--process-file", &path]).unwrap();
        assert_eq!(params.minimum_channel_length(), 0.0001);
        assert_eq!(params.maximum_chip_size_y(), 0.04);
    }

    #[test]
    fn test_from_file_missing_field() {
        let json_content = r#"{
            "minimumNodeDistance": 0.0001,
            "minimumChannelLength": 0.0001,
            "maximumChipSizeX": 0.04,
            "maximumChipSizeY": 0.04
        }"#;
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(json_content.as_bytes()).unwrap();

        let err = ProcessParameters::load(temp_file.path()).unwrap_err();
        assert!(err.to_string().contains("criticalCrossingAngle"));
    }

    #[test]
    fn test_from_missing_file() {
        let err = ProcessParameters::load("/nonexistent/process.json").unwrap_err();
        assert!(matches!(err, ProcessParameterError::Io(_)));
    }
}
