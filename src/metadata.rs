use exiftool::ExifTool;
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::config::ColorStandard;

const PRIMARIES_TAG: &str = "ColorPrimaries";
const TRANSFER_TAG: &str = "TransferCharacteristics";
const MATRIX_TAG: &str = "MatrixCoefficients";

#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("exiftool unavailable: {0}")]
    Unavailable(String),

    #[error("failed to read metadata: {0}")]
    Probe(String),

    #[error("path contains invalid UTF-8: {0:?}")]
    InvalidPath(PathBuf),

    #[error("{tag} is {found}, expected {expected} ({standard})")]
    Mismatch {
        tag: &'static str,
        found: String,
        expected: u64,
        standard: ColorStandard,
    },
}

/// Color tag code points as reported by `exiftool -n`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColorTags {
    pub primaries: Option<u64>,
    pub transfer: Option<u64>,
    pub matrix: Option<u64>,
}

impl ColorTags {
    /// Fails on the first tag that is missing or differs from `standard`
    pub fn check(&self, standard: ColorStandard) -> Result<(), VerifyError> {
        let (primaries, transfer, matrix) = standard.code_points();
        let checks = [
            (PRIMARIES_TAG, self.primaries, primaries),
            (TRANSFER_TAG, self.transfer, transfer),
            (MATRIX_TAG, self.matrix, matrix),
        ];

        for (tag, found, expected) in checks {
            if found != Some(expected) {
                return Err(VerifyError::Mismatch {
                    tag,
                    found: found.map_or_else(|| "missing".to_string(), |v| v.to_string()),
                    expected,
                    standard,
                });
            }
        }

        Ok(())
    }
}

/// Pull the color tags out of one exiftool JSON record.
/// Group prefixes (`QuickTime:`, `-G` output) are ignored.
pub fn color_tags_from_metadata(metadata: &HashMap<String, Value>) -> ColorTags {
    ColorTags {
        primaries: find_code(metadata, PRIMARIES_TAG),
        transfer: find_code(metadata, TRANSFER_TAG),
        matrix: find_code(metadata, MATRIX_TAG),
    }
}

fn find_code(metadata: &HashMap<String, Value>, tag: &str) -> Option<u64> {
    metadata
        .iter()
        .filter(|(key, _)| key.rsplit(':').next() == Some(tag))
        .find_map(|(_, value)| match value {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        })
}

/// Post-conversion check of an output file
pub trait Verifier {
    fn verify(&mut self, file_path: &Path) -> Result<(), VerifyError>;
}

/// Starts one [`Verifier`] per worker thread
pub trait VerifierFactory: Send + Sync {
    fn create(&self) -> Result<Box<dyn Verifier>, VerifyError>;
}

/// Reads back the color tags of converted files through a long-lived exiftool process
pub struct ColorVerifier {
    exiftool: ExifTool,
    standard: ColorStandard,
}

impl ColorVerifier {
    pub fn new(standard: ColorStandard) -> Result<Self, VerifyError> {
        let exiftool = ExifTool::new().map_err(|e| VerifyError::Unavailable(e.to_string()))?;
        Ok(ColorVerifier { exiftool, standard })
    }

    pub fn read_tags(&mut self, file_path: &Path) -> Result<ColorTags, VerifyError> {
        let file_path_str = file_path
            .to_str()
            .ok_or_else(|| VerifyError::InvalidPath(file_path.to_path_buf()))?;

        // Numeric values so the code points can be compared directly
        let args = vec!["-n", "-G", file_path_str];
        let output = self
            .exiftool
            .json_execute(&args)
            .map_err(|e| VerifyError::Probe(e.to_string()))?;

        let data: Vec<HashMap<String, Value>> =
            serde_json::from_value(output).map_err(|e| VerifyError::Probe(e.to_string()))?;

        let metadata = data
            .into_iter()
            .next()
            .ok_or_else(|| VerifyError::Probe("no metadata returned".to_string()))?;

        Ok(color_tags_from_metadata(&metadata))
    }
}

impl Verifier for ColorVerifier {
    fn verify(&mut self, file_path: &Path) -> Result<(), VerifyError> {
        let standard = self.standard;
        self.read_tags(file_path)?.check(standard)
    }
}

/// Hands out exiftool-backed verifiers for one color standard
pub struct ExifToolVerifiers {
    standard: ColorStandard,
}

impl ExifToolVerifiers {
    pub fn new(standard: ColorStandard) -> Self {
        ExifToolVerifiers { standard }
    }
}

impl VerifierFactory for ExifToolVerifiers {
    fn create(&self) -> Result<Box<dyn Verifier>, VerifyError> {
        Ok(Box::new(ColorVerifier::new(self.standard)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn metadata(value: Value) -> HashMap<String, Value> {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_tags_from_grouped_keys() {
        let record = metadata(json!({
            "SourceFile": "fixed/a.mp4",
            "QuickTime:ColorPrimaries": 1,
            "QuickTime:TransferCharacteristics": 1,
            "QuickTime:MatrixCoefficients": "1",
        }));
        let tags = color_tags_from_metadata(&record);
        assert_eq!(
            tags,
            ColorTags {
                primaries: Some(1),
                transfer: Some(1),
                matrix: Some(1)
            }
        );
        assert!(tags.check(ColorStandard::Bt709).is_ok());
    }

    #[test]
    fn test_missing_tags_fail_check() {
        let record = metadata(json!({ "File:FileType": "AVI" }));
        let tags = color_tags_from_metadata(&record);
        assert_eq!(tags, ColorTags::default());

        match tags.check(ColorStandard::Bt709) {
            Err(VerifyError::Mismatch { tag, found, .. }) => {
                assert_eq!(tag, "ColorPrimaries");
                assert_eq!(found, "missing");
            }
            other => panic!("Unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_wrong_transfer_fails_check() {
        let tags = ColorTags {
            primaries: Some(1),
            transfer: Some(6),
            matrix: Some(1),
        };
        let err = tags.check(ColorStandard::Bt709).unwrap_err();
        assert_eq!(
            err.to_string(),
            "TransferCharacteristics is 6, expected 1 (BT.709)"
        );
    }

    #[test]
    fn test_bt2020_code_points() {
        let tags = ColorTags {
            primaries: Some(9),
            transfer: Some(14),
            matrix: Some(9),
        };
        assert!(tags.check(ColorStandard::Bt2020).is_ok());
        assert!(tags.check(ColorStandard::Bt709).is_err());
    }
}
