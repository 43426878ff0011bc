use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, Result};

/// 物体検出のBBox（ピクセル座標、左上原点）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
    pub confidence: f64,
    pub class_label: String,
}

impl BoundingBox {
    pub fn new(
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
        confidence: f64,
        class_label: impl Into<String>,
    ) -> Self {
        Self {
            x1,
            y1,
            x2,
            y2,
            confidence,
            class_label: class_label.into(),
        }
    }

    pub fn width(&self) -> f64 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> f64 {
        self.y2 - self.y1
    }

    pub fn center(&self) -> Point2<f64> {
        Point2::new((self.x1 + self.x2) / 2.0, (self.y1 + self.y2) / 2.0)
    }

    /// 座標の有限性・向き・信頼度範囲を検査
    pub fn validate(&self) -> Result<()> {
        let coords = [self.x1, self.y1, self.x2, self.y2];
        if coords.iter().any(|v| !v.is_finite()) {
            return Err(AnalysisError::InvalidInput(format!(
                "bbox {} has non-finite coordinates",
                self.class_label
            )));
        }
        if self.x2 < self.x1 || self.y2 < self.y1 {
            return Err(AnalysisError::InvalidInput(format!(
                "bbox {} has inverted corners ({}, {})-({}, {})",
                self.class_label, self.x1, self.y1, self.x2, self.y2
            )));
        }
        if !(0.0..=1.0).contains(&self.confidence) {
            return Err(AnalysisError::InvalidInput(format!(
                "bbox {} confidence {} outside [0, 1]",
                self.class_label, self.confidence
            )));
        }
        Ok(())
    }
}

/// 対象クラスのうち最も信頼度の高いBBoxを選ぶ
///
/// `min_confidence` 以下の検出は無視する（0.0なら全件対象）。
/// 該当なしは NoDetection。
pub fn select_best<'a, S: AsRef<str>>(
    detections: &'a [BoundingBox],
    classes: &[S],
    min_confidence: f64,
) -> Result<&'a BoundingBox> {
    for det in detections {
        det.validate()?;
    }

    let mut best: Option<&BoundingBox> = None;
    for det in detections {
        if !classes.iter().any(|c| c.as_ref() == det.class_label) {
            continue;
        }
        if min_confidence > 0.0 && det.confidence <= min_confidence {
            continue;
        }
        // 同点は先勝ち
        if best.map_or(true, |b| det.confidence > b.confidence) {
            best = Some(det);
        }
    }

    best.ok_or_else(|| {
        let names: Vec<&str> = classes.iter().map(|c| c.as_ref()).collect();
        AnalysisError::NoDetection(format!("no {} detected", names.join("/")))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bbox_geometry() {
        let b = BoundingBox::new(300.0, 100.0, 345.0, 200.0, 0.9, "chair");
        assert_eq!(b.width(), 45.0);
        assert_eq!(b.height(), 100.0);
        assert_eq!(b.center(), Point2::new(322.5, 150.0));
    }

    #[test]
    fn test_select_best_by_confidence() {
        let dets = vec![
            BoundingBox::new(0.0, 0.0, 10.0, 10.0, 0.4, "chair"),
            BoundingBox::new(0.0, 0.0, 20.0, 20.0, 0.95, "person"),
            BoundingBox::new(0.0, 0.0, 30.0, 30.0, 0.8, "chair"),
        ];
        let best = select_best(&dets, &["chair"], 0.0).unwrap();
        assert_eq!(best.x2, 30.0);
    }

    #[test]
    fn test_select_best_multiple_classes_and_min_confidence() {
        let dets = vec![
            BoundingBox::new(0.0, 0.0, 10.0, 10.0, 0.25, "tv"),
            BoundingBox::new(0.0, 0.0, 20.0, 20.0, 0.6, "laptop"),
            BoundingBox::new(0.0, 0.0, 30.0, 30.0, 0.5, "monitor"),
        ];
        let best = select_best(&dets, &["laptop", "monitor", "tv"], 0.3).unwrap();
        assert_eq!(best.class_label, "laptop");

        let only_weak = vec![BoundingBox::new(0.0, 0.0, 10.0, 10.0, 0.25, "tv")];
        let err = select_best(&only_weak, &["laptop", "monitor", "tv"], 0.3).unwrap_err();
        assert!(matches!(err, AnalysisError::NoDetection(_)));
    }

    #[test]
    fn test_select_best_none() {
        let err = select_best::<&str>(&[], &["chair"], 0.0).unwrap_err();
        assert_eq!(err, AnalysisError::NoDetection("no chair detected".to_string()));
    }

    #[test]
    fn test_invalid_bbox_rejected() {
        let dets = vec![BoundingBox::new(50.0, 0.0, 10.0, 10.0, 0.9, "chair")];
        assert!(matches!(
            select_best(&dets, &["chair"], 0.0),
            Err(AnalysisError::InvalidInput(_))
        ));
        let dets = vec![BoundingBox::new(0.0, 0.0, 10.0, 10.0, 1.5, "chair")];
        assert!(select_best(&dets, &["chair"], 0.0).is_err());
    }
}
