//! 検出器出力のJSONリクエスト
//!
//! ```json
//! {
//!   "image": { "width": 640, "height": 480 },
//!   "coordinates": "normalized",
//!   "keypoints": [{ "name": "nose", "x": 0.5, "y": 0.2, "confidence": 0.9 }],
//!   "hands": [],
//!   "detections": [{ "x1": 300, "y1": 200, "x2": 345, "y2": 400, "confidence": 0.8, "class_label": "chair" }]
//! }
//! ```

use std::fs;
use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

use crate::analysis::Observation;
use crate::error::{AnalysisError, Result};
use crate::pose::{BoundingBox, CoordinateSpace, Hand, ImageFrame, Keypoint, Pose};

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ImageSize {
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisRequest {
    pub image: ImageSize,
    /// キーポイントの座標系（BBoxは常にピクセル）
    #[serde(default = "default_coordinates")]
    pub coordinates: CoordinateSpace,
    /// 体のキーポイント。null は検出なし
    #[serde(default)]
    pub keypoints: Option<Vec<Keypoint>>,
    #[serde(default)]
    pub hands: Vec<Vec<Keypoint>>,
    #[serde(default)]
    pub detections: Vec<BoundingBox>,
}

fn default_coordinates() -> CoordinateSpace { CoordinateSpace::Normalized }

impl AnalysisRequest {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| AnalysisError::InvalidInput(format!("malformed request: {}", e)))
    }

    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read request file {}", path.display()))?;
        Self::from_json(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn frame(&self) -> ImageFrame {
        ImageFrame {
            width: self.image.width,
            height: self.image.height,
            space: self.coordinates,
        }
    }

    /// 検証済みの Observation に変換
    pub fn into_observation(self) -> Result<Observation> {
        let frame = self.frame();
        let pose = self
            .keypoints
            .map(|kps| Pose::from_keypoints(kps, frame))
            .transpose()?;
        let hands = self
            .hands
            .into_iter()
            .map(|kps| Hand::from_keypoints(kps, frame))
            .collect::<Result<Vec<_>>>()?;

        tracing::debug!(
            keypoints = pose.as_ref().map_or(0, |p| p.len()),
            hands = hands.len(),
            detections = self.detections.len(),
            "Request parsed"
        );

        Ok(Observation {
            pose,
            hands,
            detections: self.detections,
        })
    }
}
