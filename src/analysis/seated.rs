//! 座位姿勢: 背骨の傾きと背もたれまでの距離

use nalgebra::{Point2, Vector2};

use crate::calibration::Calibration;
use crate::classify::{names, ThresholdTable};
use crate::config::SeatedConfig;
use crate::error::Result;
use crate::facing::{chair_reference_x, determine_view, try_determine_facing, ViewOrientation};
use crate::geometry::{midpoint, vector_angle};
use crate::pose::{select_best, BodyLandmark, BoundingBox, Pose};
use crate::result::{AnalysisResult, Domain, MetricUnit, ResultBuilder};

use super::ensure_detected;

/// 信頼度ガードの対象
const RELEVANT: [BodyLandmark; 7] = [
    BodyLandmark::Nose,
    BodyLandmark::LeftEar,
    BodyLandmark::RightEar,
    BodyLandmark::LeftShoulder,
    BodyLandmark::RightShoulder,
    BodyLandmark::LeftHip,
    BodyLandmark::RightHip,
];

/// 座位姿勢の計測値（ピクセル座標ベース）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeatedMeasurement {
    pub spine_angle: f64,
    pub view: ViewOrientation,
    pub shoulder_width_px: f64,
    /// 基準点までの平均水平距離（px）
    pub chair_distance_px: f64,
    /// クランプ済みの距離（cm）
    pub chair_distance_cm: f64,
}

/// 背骨（腰中点→肩中点）と上向き鉛直のなす角
pub fn spine_angle(mid_shoulder: &Point2<f64>, mid_hip: &Point2<f64>) -> f64 {
    let spine = mid_shoulder - mid_hip;
    vector_angle(&spine, &Vector2::new(0.0, -1.0))
}

pub fn measure(pose: &Pose, chair: &BoundingBox, config: &SeatedConfig) -> Result<SeatedMeasurement> {
    let mid_shoulder = midpoint(
        &pose.pixel(BodyLandmark::LeftShoulder)?,
        &pose.pixel(BodyLandmark::RightShoulder)?,
    );
    let mid_hip = midpoint(
        &pose.pixel(BodyLandmark::LeftHip)?,
        &pose.pixel(BodyLandmark::RightHip)?,
    );

    let (view, shoulder_width_px) = determine_view(pose, config.side_view_threshold_px)?;
    let reference_x = chair_reference_x(chair, view, config.side_view_inset);

    let chair_distance_px =
        ((mid_shoulder.x - reference_x).abs() + (mid_hip.x - reference_x).abs()) / 2.0;
    let calibration = Calibration::from_object_width(chair, config.chair_width_cm)?;
    let chair_distance_cm = config
        .chair_distance_range
        .apply(calibration.to_physical(chair_distance_px));

    tracing::debug!(
        reference_x,
        pixels_per_cm = calibration.pixels_per_unit(),
        chair_distance_px,
        chair_distance_cm,
        "Chair support distance"
    );

    Ok(SeatedMeasurement {
        spine_angle: spine_angle(&mid_shoulder, &mid_hip),
        view,
        shoulder_width_px,
        chair_distance_px,
        chair_distance_cm,
    })
}

pub fn analyze(
    pose: &Pose,
    detections: &[BoundingBox],
    config: &SeatedConfig,
    table: &ThresholdTable,
) -> Result<AnalysisResult> {
    let domain = Domain::SeatedPosture;
    ensure_detected(pose, domain)?;
    pose.ensure_confident(
        domain,
        &RELEVANT,
        config.guard.threshold,
        config.guard.max_low_ratio,
    )?;

    // 向きはどのメトリクスにも使わないので、顔が無くても続行
    let facing = try_determine_facing(pose);
    let chair = select_best(detections, &config.chair_classes, config.chair_min_confidence)?;
    let m = measure(pose, chair, config)?;

    let mut builder = ResultBuilder::new(domain).view(m.view);
    if let Some(facing) = facing {
        builder = builder.facing(facing);
    }
    builder.metric(names::SPINE_ANGLE, m.spine_angle, MetricUnit::Degree)?;
    builder.classify(names::SPINE_ANGLE, table.classify(names::SPINE_ANGLE, m.spine_angle)?)?;
    builder.metric(names::CHAIR_DISTANCE, m.chair_distance_cm, MetricUnit::Centimeter)?;
    builder.classify(
        names::CHAIR_DISTANCE,
        table.classify(names::CHAIR_DISTANCE, m.chair_distance_cm)?,
    )?;
    builder.metric(names::SHOULDER_WIDTH, m.shoulder_width_px, MetricUnit::Pixel)?;

    Ok(builder.build())
}
