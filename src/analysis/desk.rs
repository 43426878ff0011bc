//! デスク作業姿勢: 肘・目線・肘位置・手首の高さ
//!
//! すべてカメラ側の片側チェーンを正規化座標で計測する。

use nalgebra::Point2;

use crate::classify::{names, ThresholdTable};
use crate::config::DeskConfig;
use crate::error::{AnalysisError, Result};
use crate::facing::{determine_facing, try_determine_view, SideChain};
use crate::geometry::{angle, horizontal_angle, line_side_test, ElbowPosition, HorizontalAngle};
use crate::pose::{BodyLandmark, Pose};
use crate::result::{
    AnalysisResult, Category, Domain, MetricUnit, Outcome, ResultBuilder, RiskLevel, SkipReason,
};

use super::ensure_detected;

const RELEVANT: [BodyLandmark; 13] = [
    BodyLandmark::Nose,
    BodyLandmark::LeftEye,
    BodyLandmark::RightEye,
    BodyLandmark::LeftEar,
    BodyLandmark::RightEar,
    BodyLandmark::LeftShoulder,
    BodyLandmark::RightShoulder,
    BodyLandmark::LeftElbow,
    BodyLandmark::RightElbow,
    BodyLandmark::LeftWrist,
    BodyLandmark::RightWrist,
    BodyLandmark::LeftHip,
    BodyLandmark::RightHip,
];

/// 手首の肩からの相対的な下がり具合 `(wrist.y - shoulder.y) / shoulder.y`
pub fn wrist_height_ratio(wrist: &Point2<f64>, shoulder: &Point2<f64>) -> Result<f64> {
    if shoulder.y == 0.0 {
        return Err(AnalysisError::InvalidInput(
            "shoulder lies on the top image edge; wrist height ratio is undefined".to_string(),
        ));
    }
    Ok((wrist.y - shoulder.y) / shoulder.y)
}

/// 肘位置コードの分類（固定のリスク）
pub fn elbow_position_outcome(position: ElbowPosition) -> Outcome {
    match position {
        ElbowPosition::Neutral => Outcome::new(Category::Neutral, RiskLevel::Low, "elbow beside torso"),
        ElbowPosition::OverRotated => {
            Outcome::new(Category::Positive, RiskLevel::High, "elbow behind torso line")
        }
        ElbowPosition::UnderRotated => {
            Outcome::new(Category::Negative, RiskLevel::Medium, "elbow in front of torso line")
        }
    }
}

fn inverted_eye_tilt_outcome() -> Outcome {
    Outcome::new(Category::Neutral, RiskLevel::Low, "eye below ear line")
}

pub fn analyze(pose: &Pose, config: &DeskConfig, table: &ThresholdTable) -> Result<AnalysisResult> {
    let domain = Domain::DeskPosture;
    ensure_detected(pose, domain)?;
    pose.ensure_confident(
        domain,
        &RELEVANT,
        config.guard.threshold,
        config.guard.max_low_ratio,
    )?;

    let facing = determine_facing(pose)?;
    let mut builder = ResultBuilder::new(domain).facing(facing);
    if let Some((view, _)) = try_determine_view(pose, config.side_view_threshold_px)? {
        builder = builder.view(view);
    }

    let chain = match SideChain::select(facing) {
        Ok(chain) => chain,
        Err(AnalysisError::AmbiguousFacing) => {
            tracing::warn!("Facing side is ambiguous, skipping facing-dependent metrics");
            builder.skip(SkipReason::FacingDependentMetricsSkipped);
            return Ok(builder.build());
        }
        Err(e) => return Err(e),
    };

    let shoulder = pose.normalized(chain.shoulder)?;
    let elbow = pose.normalized(chain.elbow)?;
    let wrist = pose.normalized(chain.wrist)?;
    let hip = pose.normalized(chain.hip)?;
    let eye = pose.normalized(chain.eye)?;
    let ear = pose.normalized(chain.ear)?;

    // --- 肘の角度 ---
    let elbow_angle = angle(&shoulder, &elbow, &wrist);
    builder.metric(names::ELBOW_ANGLE, elbow_angle, MetricUnit::Degree)?;
    builder.classify(names::ELBOW_ANGLE, table.classify(names::ELBOW_ANGLE, elbow_angle)?)?;

    // --- 目線の傾き ---
    let tilt = horizontal_angle(&eye, &ear);
    builder.metric(names::EYE_TILT, tilt.reported(), MetricUnit::Degree)?;
    let tilt_outcome = match tilt {
        HorizontalAngle::Degrees(deg) => table.classify(names::EYE_TILT, deg)?,
        HorizontalAngle::Inverted => inverted_eye_tilt_outcome(),
    };
    builder.classify(names::EYE_TILT, tilt_outcome)?;

    // --- 肩-腰ラインに対する肘位置 ---
    let position = line_side_test(chain.side, &shoulder, &hip, &elbow, &wrist, &config.line_side);
    builder.metric(names::ELBOW_POSITION, f64::from(position.code()), MetricUnit::Count)?;
    builder.classify(names::ELBOW_POSITION, elbow_position_outcome(position))?;

    // --- 手首の高さ ---
    match wrist_height_ratio(&wrist, &shoulder) {
        Ok(ratio) => {
            builder.metric(names::WRIST_HEIGHT, ratio, MetricUnit::Ratio)?;
            builder.classify(names::WRIST_HEIGHT, table.classify(names::WRIST_HEIGHT, ratio)?)?;
        }
        Err(AnalysisError::InvalidInput(reason)) => {
            tracing::warn!(%reason, "Wrist height not measured");
        }
        Err(e) => return Err(e),
    }

    Ok(builder.build())
}
