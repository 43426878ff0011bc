//! 座面の高さ: 股関節と膝の角度

use crate::classify::{names, ThresholdTable};
use crate::config::LowerBodyConfig;
use crate::error::{AnalysisError, Result};
use crate::facing::{determine_facing, try_determine_view, SideChain};
use crate::geometry::angle;
use crate::pose::{BodyLandmark, Pose};
use crate::result::{AnalysisResult, Domain, MetricUnit, ResultBuilder, SkipReason};

use super::ensure_detected;

const RELEVANT: [BodyLandmark; 11] = [
    BodyLandmark::Nose,
    BodyLandmark::LeftEar,
    BodyLandmark::RightEar,
    BodyLandmark::LeftShoulder,
    BodyLandmark::RightShoulder,
    BodyLandmark::LeftHip,
    BodyLandmark::RightHip,
    BodyLandmark::LeftKnee,
    BodyLandmark::RightKnee,
    BodyLandmark::LeftAnkle,
    BodyLandmark::RightAnkle,
];

pub fn analyze(pose: &Pose, config: &LowerBodyConfig, table: &ThresholdTable) -> Result<AnalysisResult> {
    let domain = Domain::LowerBody;
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
    let hip = pose.normalized(chain.hip)?;
    let knee = pose.normalized(chain.knee)?;
    let ankle = pose.normalized(chain.ankle)?;

    let hip_angle = angle(&shoulder, &hip, &knee);
    let knee_angle = angle(&hip, &knee, &ankle);
    tracing::info!(side = %chain.side, hip_angle, knee_angle, "Lower body angles");

    builder.metric(names::SHOULDER_HIP_KNEE_ANGLE, hip_angle, MetricUnit::Degree)?;
    builder.classify(
        names::SHOULDER_HIP_KNEE_ANGLE,
        table.classify(names::SHOULDER_HIP_KNEE_ANGLE, hip_angle)?,
    )?;
    builder.metric(names::HIP_KNEE_ANKLE_ANGLE, knee_angle, MetricUnit::Degree)?;
    builder.classify(
        names::HIP_KNEE_ANKLE_ANGLE,
        table.classify(names::HIP_KNEE_ANKLE_ANGLE, knee_angle)?,
    )?;

    Ok(builder.build())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::testutil::normalized_pose;
    use crate::facing::FacingSide;
    use crate::pose::BodyLandmark::*;
    use crate::result::{Category, RiskLevel};

    fn seated(right_shoulder: (f64, f64), right_ankle: (f64, f64)) -> Pose {
        normalized_pose(&[
            (Nose, 0.55, 0.2),
            (LeftEar, 0.53, 0.2),
            (RightEar, 0.6, 0.2),
            (LeftShoulder, 0.47, 0.3),
            (RightShoulder, right_shoulder.0, right_shoulder.1),
            (LeftHip, 0.47, 0.6),
            (RightHip, 0.5, 0.6),
            (LeftKnee, 0.72, 0.6),
            (RightKnee, 0.75, 0.6),
            (LeftAnkle, 0.72, 0.85),
            (RightAnkle, right_ankle.0, right_ankle.1),
        ])
    }

    fn run(pose: &Pose) -> AnalysisResult {
        analyze(pose, &LowerBodyConfig::default(), &ThresholdTable::default()).unwrap()
    }

    #[test]
    fn test_right_angles_are_neutral() {
        let result = run(&seated((0.5, 0.3), (0.75, 0.85)));
        assert_eq!(result.facing, Some(FacingSide::Right));
        let hip = result.metric(names::SHOULDER_HIP_KNEE_ANGLE).unwrap().value;
        let knee = result.metric(names::HIP_KNEE_ANKLE_ANGLE).unwrap().value;
        assert!((hip - 90.0).abs() < 1e-9);
        assert!((knee - 90.0).abs() < 1e-9);
        assert_eq!(
            result.classification(names::SHOULDER_HIP_KNEE_ANGLE).unwrap().category,
            Category::Neutral
        );
        assert_eq!(
            result.classification(names::HIP_KNEE_ANKLE_ANGLE).unwrap().category,
            Category::Neutral
        );
    }

    #[test]
    fn test_reclined_with_extended_knee() {
        let result = run(&seated((0.3, 0.35), (0.95, 0.75)));
        let hip = result.classification(names::SHOULDER_HIP_KNEE_ANGLE).unwrap();
        assert_eq!(hip.category, Category::Negative);
        assert_eq!(hip.risk, RiskLevel::High);
        let knee = result.metric(names::HIP_KNEE_ANKLE_ANGLE).unwrap().value;
        assert!((knee - 143.13).abs() < 0.01, "{}", knee);
        assert_eq!(
            result.classification(names::HIP_KNEE_ANKLE_ANGLE).unwrap().category,
            Category::Negative
        );
    }

    #[test]
    fn test_ambiguous_facing_without_shoulders_is_skipped() {
        let pose = normalized_pose(&[
            (Nose, 0.5, 0.2),
            (LeftEar, 0.25, 0.2),
            (RightEar, 0.75, 0.2),
            (RightHip, 0.6, 0.6),
        ]);
        let result = run(&pose);
        assert_eq!(result.view, None);
        assert_eq!(result.skipped, Some(SkipReason::FacingDependentMetricsSkipped));
        assert!(result.metrics.is_empty());
    }

    #[test]
    fn test_ambiguous_facing_is_skipped() {
        let pose = normalized_pose(&[
            (Nose, 0.5, 0.2),
            (LeftEar, 0.25, 0.2),
            (RightEar, 0.75, 0.2),
            (LeftShoulder, 0.4, 0.3),
            (RightShoulder, 0.6, 0.3),
            (LeftHip, 0.4, 0.6),
            (RightHip, 0.6, 0.6),
        ]);
        let result = run(&pose);
        assert_eq!(result.skipped, Some(SkipReason::FacingDependentMetricsSkipped));
        assert!(result.metric(names::SHOULDER_HIP_KNEE_ANGLE).is_none());
        assert!(result.metric(names::HIP_KNEE_ANKLE_ANGLE).is_none());
    }
}
