use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, Result};
use crate::facing::{FacingSide, ViewOrientation};

/// 解析ドメイン
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    SeatedPosture,
    DeskPosture,
    HandPosture,
    ArmScreen,
    LowerBody,
}

impl Domain {
    pub const ALL: [Domain; 5] = [
        Self::SeatedPosture,
        Self::DeskPosture,
        Self::HandPosture,
        Self::ArmScreen,
        Self::LowerBody,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::SeatedPosture => "seated_posture",
            Self::DeskPosture => "desk_posture",
            Self::HandPosture => "hand_posture",
            Self::ArmScreen => "arm_screen",
            Self::LowerBody => "lower_body",
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Domain {
    type Err = AnalysisError;

    /// "seated_posture" / "seated-posture" / "seated" のいずれも受け付ける
    fn from_str(s: &str) -> Result<Self> {
        let key = s.trim().to_ascii_lowercase().replace('-', "_");
        match key.as_str() {
            "seated_posture" | "seated" => Ok(Self::SeatedPosture),
            "desk_posture" | "desk" => Ok(Self::DeskPosture),
            "hand_posture" | "hand" => Ok(Self::HandPosture),
            "arm_screen" => Ok(Self::ArmScreen),
            "lower_body" => Ok(Self::LowerBody),
            _ => Err(AnalysisError::InvalidInput(format!("unknown domain: {}", s))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricUnit {
    Degree,
    Centimeter,
    Pixel,
    Ratio,
    Count,
}

/// 名前付きスカラー計測値
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metric {
    pub name: String,
    pub value: f64,
    pub unit: MetricUnit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Positive,
    Negative,
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

/// 分類の結果（カテゴリ・リスク・帯のラベル）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outcome {
    pub category: Category,
    pub risk: RiskLevel,
    pub label: String,
}

impl Outcome {
    pub fn new(category: Category, risk: RiskLevel, label: impl Into<String>) -> Self {
        Self {
            category,
            risk,
            label: label.into(),
        }
    }
}

/// メトリクスに対する分類
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Classification {
    pub metric_name: String,
    pub category: Category,
    pub risk: RiskLevel,
    pub label: String,
}

/// 一部のメトリクスを計算しなかった理由
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// 向きが判定できず、向きに依存するメトリクスを計算していない
    FacingDependentMetricsSkipped,
}

/// 1回の解析結果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResult {
    pub domain: Domain,
    pub metrics: Vec<Metric>,
    pub classifications: Vec<Classification>,
    pub facing: Option<FacingSide>,
    pub view: Option<ViewOrientation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skipped: Option<SkipReason>,
}

impl AnalysisResult {
    pub fn metric(&self, name: &str) -> Option<&Metric> {
        self.metrics.iter().find(|m| m.name == name)
    }

    pub fn classification(&self, metric_name: &str) -> Option<&Classification> {
        self.classifications.iter().find(|c| c.metric_name == metric_name)
    }
}

/// AnalysisResult の組み立て
///
/// 分類は同じ結果内に存在するメトリクスにしか付けられない。
#[derive(Debug)]
pub struct ResultBuilder {
    result: AnalysisResult,
}

impl ResultBuilder {
    pub fn new(domain: Domain) -> Self {
        Self {
            result: AnalysisResult {
                domain,
                metrics: Vec::new(),
                classifications: Vec::new(),
                facing: None,
                view: None,
                skipped: None,
            },
        }
    }

    pub fn facing(mut self, facing: FacingSide) -> Self {
        self.result.facing = Some(facing);
        self
    }

    pub fn view(mut self, view: ViewOrientation) -> Self {
        self.result.view = Some(view);
        self
    }

    pub fn skip(&mut self, reason: SkipReason) {
        self.result.skipped = Some(reason);
    }

    /// メトリクスを追加（同名は InvalidInput）
    pub fn metric(&mut self, name: impl Into<String>, value: f64, unit: MetricUnit) -> Result<()> {
        let name = name.into();
        if self.result.metric(&name).is_some() {
            return Err(AnalysisError::InvalidInput(format!("duplicate metric: {}", name)));
        }
        tracing::debug!(domain = %self.result.domain, metric = %name, value, "Metric computed");
        self.result.metrics.push(Metric { name, value, unit });
        Ok(())
    }

    /// 既存メトリクスに分類を付ける
    pub fn classify(&mut self, metric_name: &str, outcome: Outcome) -> Result<()> {
        if self.result.metric(metric_name).is_none() {
            return Err(AnalysisError::InvalidInput(format!(
                "classification for unknown metric: {}",
                metric_name
            )));
        }
        tracing::debug!(
            domain = %self.result.domain,
            metric = metric_name,
            category = ?outcome.category,
            risk = ?outcome.risk,
            label = %outcome.label,
            "Metric classified"
        );
        self.result.classifications.push(Classification {
            metric_name: metric_name.to_string(),
            category: outcome.category,
            risk: outcome.risk,
            label: outcome.label,
        });
        Ok(())
    }

    pub fn build(self) -> AnalysisResult {
        self.result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_requires_metric() {
        let mut b = ResultBuilder::new(Domain::SeatedPosture);
        let outcome = Outcome::new(Category::Neutral, RiskLevel::Low, "ok");
        assert!(b.classify("spine_angle", outcome.clone()).is_err());

        b.metric("spine_angle", 12.0, MetricUnit::Degree).unwrap();
        b.classify("spine_angle", outcome).unwrap();
        let result = b.build();
        assert_eq!(result.classification("spine_angle").unwrap().label, "ok");
        assert_eq!(result.metric("spine_angle").unwrap().value, 12.0);
    }

    #[test]
    fn test_duplicate_metric_rejected() {
        let mut b = ResultBuilder::new(Domain::DeskPosture);
        b.metric("elbow_angle", 90.0, MetricUnit::Degree).unwrap();
        assert!(b.metric("elbow_angle", 91.0, MetricUnit::Degree).is_err());
    }

    #[test]
    fn test_domain_from_str() {
        assert_eq!("seated".parse::<Domain>().unwrap(), Domain::SeatedPosture);
        assert_eq!("arm-screen".parse::<Domain>().unwrap(), Domain::ArmScreen);
        assert_eq!("LOWER_BODY".parse::<Domain>().unwrap(), Domain::LowerBody);
        assert!("knees".parse::<Domain>().is_err());
        for d in Domain::ALL {
            assert_eq!(d.as_str().parse::<Domain>().unwrap(), d);
        }
    }

    #[test]
    fn test_result_serializes_snake_case() {
        let mut b = ResultBuilder::new(Domain::HandPosture);
        b.metric("hand_1.bent_fingers", 4.0, MetricUnit::Count).unwrap();
        b.classify(
            "hand_1.bent_fingers",
            Outcome::new(Category::Negative, RiskLevel::Medium, "claw grip"),
        )
        .unwrap();
        let json = serde_json::to_value(b.build()).unwrap();
        assert_eq!(json["domain"], "hand_posture");
        assert_eq!(json["metrics"][0]["unit"], "count");
        assert_eq!(json["classifications"][0]["category"], "negative");
        assert_eq!(json["classifications"][0]["risk"], "medium");
        assert!(json.get("skipped").is_none());
    }
}
