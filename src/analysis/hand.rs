//! 手の姿勢: 指の曲がり・手首の屈曲・クローグリップ
//!
//! 手ごとに正規化座標で判定する。メトリクス名は `hand_<n>.` を前置（1始まり）。

use nalgebra::Point2;

use crate::classify::names;
use crate::config::HandConfig;
use crate::error::{AnalysisError, Result};
use crate::geometry::distance;
use crate::pose::{Hand, HandLandmark, Landmark};
use crate::result::{AnalysisResult, Category, Domain, MetricUnit, Outcome, ResultBuilder, RiskLevel};

/// 中指の曲がり
///
/// 指先が MCP と手首の両方より buffer 以上上 → Positive（反り）、
/// 両方より下 → Negative（曲げ込み）、それ以外 Neutral。
pub fn finger_bend(
    wrist: &Point2<f64>,
    middle_mcp: &Point2<f64>,
    middle_tip: &Point2<f64>,
    buffer: f64,
) -> Category {
    if middle_tip.y < middle_mcp.y - buffer && middle_tip.y < wrist.y - buffer {
        Category::Positive
    } else if middle_tip.y > middle_mcp.y + buffer && middle_tip.y > wrist.y + buffer {
        Category::Negative
    } else {
        Category::Neutral
    }
}

/// 手首の屈曲
///
/// 人差し指・小指の MCP が両方とも手首より buffer 以上上 → Positive、
/// 両方下 → Negative、それ以外 Neutral。
pub fn wrist_flexion(
    wrist: &Point2<f64>,
    index_mcp: &Point2<f64>,
    pinky_mcp: &Point2<f64>,
    buffer: f64,
) -> Category {
    if index_mcp.y < wrist.y - buffer && pinky_mcp.y < wrist.y - buffer {
        Category::Positive
    } else if index_mcp.y > wrist.y + buffer && pinky_mcp.y > wrist.y + buffer {
        Category::Negative
    } else {
        Category::Neutral
    }
}

/// 指先-PIP 間距離が threshold 未満の指の数
pub fn count_bent_fingers(tip_to_pip: &[f64], threshold: f64) -> usize {
    tip_to_pip.iter().filter(|&&d| d < threshold).count()
}

/// 曲がった指が min_bent 本以上なら Negative（クローグリップ）、それ以外 Positive
pub fn claw_grip(tip_to_pip: &[f64], threshold: f64, min_bent: usize) -> Category {
    if count_bent_fingers(tip_to_pip, threshold) >= min_bent {
        Category::Negative
    } else {
        Category::Positive
    }
}

fn finger_bend_outcome(category: Category) -> Outcome {
    match category {
        Category::Positive => Outcome::new(category, RiskLevel::Medium, "fingers bent upward"),
        Category::Negative => Outcome::new(category, RiskLevel::Medium, "fingers curled downward"),
        Category::Neutral => Outcome::new(category, RiskLevel::Low, "fingers straight"),
    }
}

fn wrist_flexion_outcome(category: Category) -> Outcome {
    match category {
        Category::Positive => Outcome::new(category, RiskLevel::Medium, "wrist extended upward"),
        Category::Negative => Outcome::new(category, RiskLevel::Medium, "wrist flexed downward"),
        Category::Neutral => Outcome::new(category, RiskLevel::Low, "wrist neutral"),
    }
}

fn claw_grip_outcome(category: Category) -> Outcome {
    match category {
        Category::Negative => Outcome::new(category, RiskLevel::Medium, "claw grip"),
        _ => Outcome::new(Category::Positive, RiskLevel::Low, "relaxed grip"),
    }
}

/// 片手分のメトリクスを追加
fn analyze_one(builder: &mut ResultBuilder, prefix: &str, hand: &Hand, config: &HandConfig) -> Result<()> {
    hand.ensure_confident(
        Domain::HandPosture,
        HandLandmark::ALL,
        config.guard.threshold,
        config.guard.max_low_ratio,
    )?;

    let wrist = hand.normalized(HandLandmark::Wrist)?;
    let index_mcp = hand.normalized(HandLandmark::IndexMcp)?;
    let middle_mcp = hand.normalized(HandLandmark::MiddleMcp)?;
    let middle_tip = hand.normalized(HandLandmark::MiddleTip)?;
    let pinky_mcp = hand.normalized(HandLandmark::PinkyMcp)?;

    let bend = finger_bend(&wrist, &middle_mcp, &middle_tip, config.bend_buffer);
    let name = format!("{}.{}", prefix, names::FINGER_BEND);
    builder.metric(name.as_str(), middle_mcp.y - middle_tip.y, MetricUnit::Ratio)?;
    builder.classify(&name, finger_bend_outcome(bend))?;

    let flexion = wrist_flexion(&wrist, &index_mcp, &pinky_mcp, config.bend_buffer);
    let name = format!("{}.{}", prefix, names::WRIST_FLEXION);
    let knuckle_rise = wrist.y - (index_mcp.y + pinky_mcp.y) / 2.0;
    builder.metric(name.as_str(), knuckle_rise, MetricUnit::Ratio)?;
    builder.classify(&name, wrist_flexion_outcome(flexion))?;

    let mut tip_to_pip = Vec::with_capacity(HandLandmark::FINGER_TIPS.len());
    for (tip, pip) in HandLandmark::FINGER_TIPS {
        tip_to_pip.push(distance(&hand.normalized(tip)?, &hand.normalized(pip)?));
    }
    let bent = count_bent_fingers(&tip_to_pip, config.claw_distance);
    let grip = claw_grip(&tip_to_pip, config.claw_distance, config.claw_min_fingers);
    let name = format!("{}.{}", prefix, names::BENT_FINGERS);
    builder.metric(name.as_str(), bent as f64, MetricUnit::Count)?;
    builder.classify(&name, claw_grip_outcome(grip))?;

    tracing::info!(hand = prefix, ?bend, ?flexion, bent_fingers = bent, ?grip, "Hand posture classified");
    Ok(())
}

pub fn analyze(hands: &[Hand], config: &HandConfig) -> Result<AnalysisResult> {
    let detected: Vec<&Hand> = hands.iter().filter(|h| !h.is_empty()).collect();
    if detected.is_empty() {
        tracing::warn!("No hands detected");
        return Err(AnalysisError::NoDetection("no hands detected".to_string()));
    }

    // 信頼度の低い手だけを除外し、番号は検出順のまま
    let mut builder = ResultBuilder::new(Domain::HandPosture);
    let mut low_confidence = None;
    let mut analyzed = 0;
    for (i, hand) in detected.iter().enumerate() {
        let prefix = format!("hand_{}", i + 1);
        match analyze_one(&mut builder, &prefix, hand, config) {
            Ok(()) => analyzed += 1,
            Err(e @ AnalysisError::LowConfidence { .. }) => {
                tracing::warn!(hand = %prefix, error = %e, "Skipping low-confidence hand");
                low_confidence = Some(e);
            }
            Err(e) => return Err(e),
        }
    }
    match low_confidence {
        Some(e) if analyzed == 0 => Err(e),
        _ => Ok(builder.build()),
    }
}
