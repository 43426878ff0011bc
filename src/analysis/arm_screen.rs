//! 腕の長さと画面までの距離
//!
//! 左右の腕の経路長（px）の平均を平均的な腕の長さに合わせて校正し、
//! 肩中点から画面BBox中心までの距離をcmに換算する。

use crate::calibration::Calibration;
use crate::classify::{names, ThresholdTable};
use crate::config::ArmScreenConfig;
use crate::error::{AnalysisError, Result};
use crate::facing::{determine_view, try_determine_facing};
use crate::geometry::{distance, midpoint, path_length};
use crate::pose::{select_best, BodyLandmark, BodySide, BoundingBox, Pose};
use crate::result::{AnalysisResult, Domain, MetricUnit, ResultBuilder};

use super::ensure_detected;

const RELEVANT: [BodyLandmark; 12] = [
    BodyLandmark::LeftShoulder,
    BodyLandmark::RightShoulder,
    BodyLandmark::LeftElbow,
    BodyLandmark::RightElbow,
    BodyLandmark::LeftWrist,
    BodyLandmark::RightWrist,
    BodyLandmark::LeftPinky,
    BodyLandmark::RightPinky,
    BodyLandmark::LeftIndex,
    BodyLandmark::RightIndex,
    BodyLandmark::LeftThumb,
    BodyLandmark::RightThumb,
];

/// 肩→肘→手首→小指→人差し指→親指 の経路
pub fn arm_path(side: BodySide) -> [BodyLandmark; 6] {
    use BodyLandmark::*;
    match side {
        BodySide::Left => [LeftShoulder, LeftElbow, LeftWrist, LeftPinky, LeftIndex, LeftThumb],
        BodySide::Right => [RightShoulder, RightElbow, RightWrist, RightPinky, RightIndex, RightThumb],
    }
}

/// 腕の経路長（px）
pub fn arm_path_length_px(pose: &Pose, side: BodySide) -> Result<f64> {
    let points = arm_path(side)
        .iter()
        .map(|&lm| pose.pixel(lm))
        .collect::<Result<Vec<_>>>()?;
    Ok(path_length(&points))
}

/// 腕と画面の計測値
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArmScreenMeasurement {
    pub left_arm_px: f64,
    pub right_arm_px: f64,
    pub calibration: Calibration,
    /// 画面が見つからなければ None
    pub screen_distance_px: Option<f64>,
}

impl ArmScreenMeasurement {
    pub fn left_arm_cm(&self) -> f64 {
        self.calibration.to_physical(self.left_arm_px)
    }

    pub fn right_arm_cm(&self) -> f64 {
        self.calibration.to_physical(self.right_arm_px)
    }

    pub fn screen_distance_cm(&self) -> Option<f64> {
        self.screen_distance_px.map(|px| self.calibration.to_physical(px))
    }
}

pub fn measure(
    pose: &Pose,
    detections: &[BoundingBox],
    config: &ArmScreenConfig,
) -> Result<ArmScreenMeasurement> {
    let left_arm_px = arm_path_length_px(pose, BodySide::Left)?;
    let right_arm_px = arm_path_length_px(pose, BodySide::Right)?;
    let calibration = Calibration::from_arm_span(&[left_arm_px, right_arm_px], config.arm_length_cm)?;

    let screen_distance_px =
        match select_best(detections, &config.screen_classes, config.screen_min_confidence) {
            Ok(screen) => {
                let mid_shoulder = midpoint(
                    &pose.pixel(BodyLandmark::LeftShoulder)?,
                    &pose.pixel(BodyLandmark::RightShoulder)?,
                );
                Some(distance(&mid_shoulder, &screen.center()))
            }
            Err(AnalysisError::NoDetection(reason)) => {
                tracing::debug!(%reason, "Screen distance not measured");
                None
            }
            Err(e) => return Err(e),
        };

    tracing::debug!(
        left_arm_px,
        right_arm_px,
        pixels_per_cm = calibration.pixels_per_unit(),
        ?screen_distance_px,
        "Arm span calibration"
    );

    Ok(ArmScreenMeasurement {
        left_arm_px,
        right_arm_px,
        calibration,
        screen_distance_px,
    })
}

pub fn analyze(
    pose: &Pose,
    detections: &[BoundingBox],
    config: &ArmScreenConfig,
    table: &ThresholdTable,
) -> Result<AnalysisResult> {
    let domain = Domain::ArmScreen;
    ensure_detected(pose, domain)?;
    pose.ensure_confident(
        domain,
        &RELEVANT,
        config.guard.threshold,
        config.guard.max_low_ratio,
    )?;

    let facing = try_determine_facing(pose);
    let (view, _) = determine_view(pose, config.side_view_threshold_px)?;
    let m = measure(pose, detections, config)?;

    let mut builder = ResultBuilder::new(domain).view(view);
    if let Some(facing) = facing {
        builder = builder.facing(facing);
    }
    builder.metric(names::LEFT_ARM_LENGTH, m.left_arm_cm(), MetricUnit::Centimeter)?;
    builder.metric(names::RIGHT_ARM_LENGTH, m.right_arm_cm(), MetricUnit::Centimeter)?;
    if let Some(cm) = m.screen_distance_cm() {
        builder.metric(names::SCREEN_DISTANCE, cm, MetricUnit::Centimeter)?;
        builder.classify(names::SCREEN_DISTANCE, table.classify(names::SCREEN_DISTANCE, cm)?)?;
    }

    Ok(builder.build())
}
