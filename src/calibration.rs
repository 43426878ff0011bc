use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, Result};
use crate::pose::BoundingBox;

/// ピクセル→物理単位の換算係数
///
/// 1回の解析につき1つの基準から作り、その解析中の全距離に使い回す。
/// 係数は常に正の有限値。
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Calibration {
    pixels_per_unit: f64,
}

impl Calibration {
    /// 既知の物理長とそのピクセル長から作成
    pub fn from_reference(pixel_length: f64, physical_length: f64) -> Result<Self> {
        if !(physical_length.is_finite() && physical_length > 0.0) {
            return Err(AnalysisError::InvalidCalibration(format!(
                "reference physical length must be positive, got {}",
                physical_length
            )));
        }
        Self::new(pixel_length / physical_length)
    }

    pub fn new(pixels_per_unit: f64) -> Result<Self> {
        if !(pixels_per_unit.is_finite() && pixels_per_unit > 0.0) {
            return Err(AnalysisError::InvalidCalibration(format!(
                "pixels_per_unit must be positive and finite, got {}",
                pixels_per_unit
            )));
        }
        Ok(Self { pixels_per_unit })
    }

    /// 物体の既知の横幅から作成（例: 椅子 45cm）
    pub fn from_object_width(bbox: &BoundingBox, known_width: f64) -> Result<Self> {
        let width = bbox.width();
        if width <= 0.0 {
            return Err(AnalysisError::InvalidCalibration(format!(
                "reference {} has zero measured width",
                bbox.class_label
            )));
        }
        Self::from_reference(width, known_width)
    }

    /// 腕の経路長（ピクセル）の平均と平均的な腕の長さから作成
    pub fn from_arm_span(arm_lengths_px: &[f64], average_arm_length: f64) -> Result<Self> {
        if arm_lengths_px.is_empty() {
            return Err(AnalysisError::InvalidCalibration(
                "no arm length measured".to_string(),
            ));
        }
        let mean = arm_lengths_px.iter().sum::<f64>() / arm_lengths_px.len() as f64;
        Self::from_reference(mean, average_arm_length)
    }

    pub fn pixels_per_unit(&self) -> f64 {
        self.pixels_per_unit
    }

    /// ピクセル → 物理単位
    pub fn to_physical(&self, pixels: f64) -> f64 {
        pixels / self.pixels_per_unit
    }

    /// 物理単位 → ピクセル
    pub fn to_pixels(&self, units: f64) -> f64 {
        units * self.pixels_per_unit
    }
}

/// 換算後の距離に掛けるクランプ範囲
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClampRange {
    pub min: f64,
    pub max: f64,
}

impl ClampRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn apply(&self, value: f64) -> f64 {
        value.max(self.min).min(self.max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_object_width() {
        let chair = BoundingBox::new(300.0, 100.0, 345.0, 300.0, 0.9, "chair");
        let cal = Calibration::from_object_width(&chair, 45.0).unwrap();
        assert_eq!(cal.pixels_per_unit(), 1.0);
        assert_eq!(cal.to_physical(55.0), 55.0);
    }

    #[test]
    fn test_zero_width_object_rejected() {
        let chair = BoundingBox::new(300.0, 100.0, 300.0, 300.0, 0.9, "chair");
        let err = Calibration::from_object_width(&chair, 45.0).unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidCalibration(_)));
    }

    #[test]
    fn test_non_positive_factor_rejected() {
        assert!(Calibration::new(0.0).is_err());
        assert!(Calibration::new(-2.0).is_err());
        assert!(Calibration::new(f64::NAN).is_err());
        assert!(Calibration::new(f64::INFINITY).is_err());
        assert!(Calibration::from_reference(100.0, 0.0).is_err());
    }

    #[test]
    fn test_from_arm_span() {
        // 左右とも148px → 2px/cm
        let cal = Calibration::from_arm_span(&[148.0, 148.0], 74.0).unwrap();
        assert!((cal.pixels_per_unit() - 2.0).abs() < 1e-12);
        assert!((cal.to_physical(148.0) - 74.0).abs() < 1e-12);
        assert!(Calibration::from_arm_span(&[], 74.0).is_err());
        assert!(Calibration::from_arm_span(&[0.0, 0.0], 74.0).is_err());
    }

    #[test]
    fn test_round_trip() {
        let cal = Calibration::from_reference(123.4, 45.0).unwrap();
        for px in [0.0, 1.0, 17.25, 55.0, 999.9] {
            let back = cal.to_pixels(cal.to_physical(px));
            assert!((back - px).abs() < 1e-9, "{} -> {}", px, back);
        }
    }

    #[test]
    fn test_clamp_range() {
        let range = ClampRange::new(0.0, 50.0);
        assert_eq!(range.apply(55.0), 50.0);
        assert_eq!(range.apply(-3.0), 0.0);
        assert_eq!(range.apply(12.5), 12.5);
    }
}
