//! 閾値テーブルによるメトリクス分類
//!
//! 純粋な表引き。メトリクス間の順序依存や内部状態は持たない。

use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, Result};
use crate::result::{Category, Outcome, RiskLevel};

/// メトリクス名
pub mod names {
    pub const SPINE_ANGLE: &str = "spine_angle";
    pub const CHAIR_DISTANCE: &str = "chair_distance";
    pub const ELBOW_ANGLE: &str = "elbow_angle";
    pub const EYE_TILT: &str = "eye_tilt";
    pub const ELBOW_POSITION: &str = "elbow_position";
    pub const WRIST_HEIGHT: &str = "wrist_height";
    pub const SHOULDER_HIP_KNEE_ANGLE: &str = "shoulder_hip_knee_angle";
    pub const HIP_KNEE_ANKLE_ANGLE: &str = "hip_knee_ankle_angle";
    pub const LEFT_ARM_LENGTH: &str = "left_arm_length";
    pub const RIGHT_ARM_LENGTH: &str = "right_arm_length";
    pub const SCREEN_DISTANCE: &str = "screen_distance";
    pub const SHOULDER_WIDTH: &str = "shoulder_width";
    pub const FINGER_BEND: &str = "finger_bend";
    pub const WRIST_FLEXION: &str = "wrist_flexion";
    pub const BENT_FINGERS: &str = "bent_fingers";
}

fn default_true() -> bool {
    true
}

/// 1メトリクス分の閾値規則
///
/// `[low, high]` を中立帯とし、下側・帯内・上側の3結果を持つ。
/// 境界の包含は `low_inclusive` / `high_inclusive` で指定。帯に含まれない
/// 境界値ちょうどは `on_open_bound` があればそれ、なければ近い側の結果。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdRule {
    pub metric: String,
    pub low: f64,
    pub high: f64,
    #[serde(default = "default_true")]
    pub low_inclusive: bool,
    #[serde(default = "default_true")]
    pub high_inclusive: bool,
    pub below: Outcome,
    pub within: Outcome,
    pub above: Outcome,
    #[serde(default)]
    pub on_open_bound: Option<Outcome>,
}

impl ThresholdRule {
    /// 両端を含む帯の規則
    pub fn closed(metric: &str, low: f64, high: f64, below: Outcome, within: Outcome, above: Outcome) -> Self {
        Self {
            metric: metric.to_string(),
            low,
            high,
            low_inclusive: true,
            high_inclusive: true,
            below,
            within,
            above,
            on_open_bound: None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.low.is_nan() || self.high.is_nan() || self.low > self.high {
            return Err(AnalysisError::InvalidInput(format!(
                "threshold rule {} has invalid band [{}, {}]",
                self.metric, self.low, self.high
            )));
        }
        Ok(())
    }

    pub fn classify(&self, value: f64) -> Result<&Outcome> {
        if value.is_nan() {
            return Err(AnalysisError::InvalidInput(format!(
                "metric {} is NaN",
                self.metric
            )));
        }
        if value < self.low {
            return Ok(&self.below);
        }
        if value > self.high {
            return Ok(&self.above);
        }
        if value == self.low && !self.low_inclusive {
            return Ok(self.on_open_bound.as_ref().unwrap_or(&self.below));
        }
        if value == self.high && !self.high_inclusive {
            return Ok(self.on_open_bound.as_ref().unwrap_or(&self.above));
        }
        Ok(&self.within)
    }
}

/// メトリクス名 → 規則 の表
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdTable {
    rules: Vec<ThresholdRule>,
}

impl ThresholdTable {
    pub fn new(rules: Vec<ThresholdRule>) -> Result<Self> {
        for rule in &rules {
            rule.validate()?;
        }
        Ok(Self { rules })
    }

    pub fn rules(&self) -> &[ThresholdRule] {
        &self.rules
    }

    pub fn rule(&self, metric: &str) -> Option<&ThresholdRule> {
        self.rules.iter().find(|r| r.metric == metric)
    }

    /// 同名の規則を置き換え、無ければ追加
    pub fn with_overrides(mut self, overrides: &[ThresholdRule]) -> Result<Self> {
        for rule in overrides {
            rule.validate()?;
            match self.rules.iter_mut().find(|r| r.metric == rule.metric) {
                Some(existing) => *existing = rule.clone(),
                None => self.rules.push(rule.clone()),
            }
        }
        Ok(self)
    }

    pub fn classify(&self, metric: &str, value: f64) -> Result<Outcome> {
        let rule = self.rule(metric).ok_or_else(|| {
            AnalysisError::InvalidInput(format!("no threshold rule for metric {}", metric))
        })?;
        rule.classify(value).cloned()
    }
}

impl Default for ThresholdTable {
    fn default() -> Self {
        use Category::*;
        use RiskLevel::*;

        let o = Outcome::new;
        let rules = vec![
            ThresholdRule::closed(
                names::SPINE_ANGLE,
                5.0,
                20.0,
                o(Positive, Medium, "too straight"),
                o(Neutral, Low, "good back alignment"),
                o(Negative, High, "excessive forward lean"),
            ),
            // ≤15 良好 / ≤25 中程度 / それ以上は背もたれ未使用
            ThresholdRule {
                low_inclusive: false,
                ..ThresholdRule::closed(
                    names::CHAIR_DISTANCE,
                    15.0,
                    25.0,
                    o(Neutral, Low, "good use of chair support"),
                    o(Negative, Medium, "moderate distance from chair support"),
                    o(Positive, High, "not using chair support"),
                )
            },
            ThresholdRule::closed(
                names::ELBOW_ANGLE,
                45.0,
                135.0,
                o(Positive, High, "elbow sharply flexed"),
                o(Neutral, Low, "elbow angle neutral"),
                o(Negative, High, "elbow over-extended"),
            ),
            // (10, 35) のみ傾きあり。35ちょうどは中立
            ThresholdRule {
                low_inclusive: false,
                high_inclusive: false,
                on_open_bound: Some(o(Neutral, Low, "eye line level")),
                ..ThresholdRule::closed(
                    names::EYE_TILT,
                    10.0,
                    35.0,
                    o(Neutral, Low, "eye line level"),
                    o(Positive, Medium, "head tilted"),
                    o(Negative, High, "head strongly tilted"),
                )
            },
            ThresholdRule::closed(
                names::WRIST_HEIGHT,
                0.15,
                f64::INFINITY,
                o(Negative, High, "wrist raised toward shoulder"),
                o(Neutral, Low, "wrist below shoulder"),
                o(Neutral, Low, "wrist below shoulder"),
            ),
            ThresholdRule::closed(
                names::SHOULDER_HIP_KNEE_ANGLE,
                80.0,
                120.0,
                o(Positive, Medium, "hip angle closed"),
                o(Neutral, Low, "hip angle neutral"),
                o(Negative, High, "hip angle open"),
            ),
            ThresholdRule::closed(
                names::HIP_KNEE_ANKLE_ANGLE,
                85.0,
                115.0,
                o(Positive, Medium, "knee angle closed"),
                o(Neutral, Low, "knee angle neutral"),
                o(Negative, High, "knee angle open"),
            ),
            ThresholdRule::closed(
                names::SCREEN_DISTANCE,
                50.0,
                75.0,
                o(Negative, Low, "screen too close"),
                o(Neutral, Low, "optimal viewing distance"),
                o(Positive, High, "screen too far"),
            ),
        ];
        Self { rules }
    }
}
