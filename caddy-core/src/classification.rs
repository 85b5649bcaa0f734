//! The result object handed over by the classification collaborator

use crate::error::Result;
use crate::point_cloud::SharedPointCloud;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// One ranked class prediction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prediction {
    pub class_name: String,
    /// Percentage in `[0, 100]`
    pub probability: f64,
}

/// A classification result.
///
/// Only `point_cloud` is consumed by the viewer; the other fields are
/// carried for the result panels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationResult {
    pub predicted_class: String,
    /// Percentage in `[0, 100]`
    pub confidence: f64,
    #[serde(default)]
    pub top_predictions: Vec<Prediction>,
    /// `None` when the field is missing or `null`
    #[serde(default)]
    pub point_cloud: Option<SharedPointCloud>,
}

impl ClassificationResult {
    /// Parse a result from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Parse a result from a JSON reader
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        Ok(serde_json::from_reader(reader)?)
    }

    /// Read a result from a JSON file
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    /// Shared handle to the point cloud, if one was delivered
    pub fn point_cloud(&self) -> Option<SharedPointCloud> {
        self.point_cloud.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    const SAMPLE: &str = r#"{
        "predictedClass": "chair",
        "confidence": 91.25,
        "topPredictions": [
            {"className": "chair", "probability": 91.25},
            {"className": "stool", "probability": 6.5},
            {"className": "table", "probability": 1.0}
        ],
        "pointCloud": [[0, 0, 0], [1, 0, 0], [0, 1, 0]]
    }"#;

    #[test]
    fn test_parse_full_result() {
        let result = ClassificationResult::from_json(SAMPLE).unwrap();
        assert_eq!(result.predicted_class, "chair");
        assert_eq!(result.top_predictions.len(), 3);
        assert_eq!(result.top_predictions[1].class_name, "stool");

        let cloud = result.point_cloud().unwrap();
        assert_eq!(cloud.len(), 3);
        assert_eq!(cloud[1], vec![1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_point_cloud_handle_is_shared_not_copied() {
        let result = ClassificationResult::from_json(SAMPLE).unwrap();
        let a = result.point_cloud().unwrap();
        let b = result.point_cloud().unwrap();
        assert!(std::sync::Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_missing_or_null_point_cloud_is_absent() {
        let missing = r#"{"predictedClass": "lamp", "confidence": 50}"#;
        assert!(ClassificationResult::from_json(missing).unwrap().point_cloud.is_none());

        let null = r#"{"predictedClass": "lamp", "confidence": 50, "pointCloud": null}"#;
        assert!(ClassificationResult::from_json(null).unwrap().point_cloud.is_none());
    }

    #[test]
    fn test_empty_point_cloud_is_present_but_empty() {
        let json = r#"{"predictedClass": "lamp", "confidence": 50, "pointCloud": []}"#;
        let cloud = ClassificationResult::from_json(json).unwrap().point_cloud.unwrap();
        assert!(cloud.is_empty());
    }

    #[test]
    fn test_non_numeric_component_is_a_json_error() {
        let json = r#"{"predictedClass": "x", "confidence": 1, "pointCloud": [["a", 0, 0]]}"#;
        assert!(matches!(ClassificationResult::from_json(json), Err(Error::Json(_))));
    }

    #[test]
    fn test_missing_file_is_an_io_error() {
        let path = std::env::temp_dir().join("caddy-no-such-result.json");
        let err = ClassificationResult::from_path(&path).unwrap_err();
        assert!(matches!(err, Error::Io(ref e) if e.kind() == std::io::ErrorKind::NotFound));
    }

    #[test]
    fn test_from_reader() {
        let result = ClassificationResult::from_reader(SAMPLE.as_bytes()).unwrap();
        assert_eq!(result.confidence, 91.25);
    }
}
