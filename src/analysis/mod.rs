//! ドメインごとのメトリクス抽出
//!
//! どの抽出も入力だけから決まる純関数で、呼び出し間で状態を共有しない。

pub mod arm_screen;
pub mod desk;
pub mod hand;
pub mod lower_body;
pub mod seated;

use crate::classify::ThresholdTable;
use crate::config::Config;
use crate::error::{AnalysisError, Result};
use crate::pose::{BoundingBox, Hand, Pose};
use crate::result::{AnalysisResult, Domain};

/// 1枚の画像に対する検出器の出力一式
#[derive(Debug, Clone, Default)]
pub struct Observation {
    /// 体のキーポイント（検出なしは None）
    pub pose: Option<Pose>,
    pub hands: Vec<Hand>,
    pub detections: Vec<BoundingBox>,
}

/// キーポイントが1つも無ければ NoDetection
fn ensure_detected(pose: &Pose, domain: Domain) -> Result<()> {
    if pose.is_empty() {
        tracing::warn!(%domain, "No pose landmarks detected");
        return Err(AnalysisError::NoDetection("no body landmarks detected".to_string()));
    }
    Ok(())
}

/// 設定と閾値表をまとめた解析器
///
/// 保持するのは読み取り専用の設定だけなので、スレッド間で共有してよい。
#[derive(Debug, Clone)]
pub struct Analyzer {
    config: Config,
    table: ThresholdTable,
}

impl Analyzer {
    pub fn new(config: Config) -> Result<Self> {
        let table = ThresholdTable::default().with_overrides(&config.thresholds)?;
        Ok(Self { config, table })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn table(&self) -> &ThresholdTable {
        &self.table
    }

    pub fn seated_posture(&self, pose: &Pose, detections: &[BoundingBox]) -> Result<AnalysisResult> {
        seated::analyze(pose, detections, &self.config.seated, &self.table)
    }

    pub fn desk_posture(&self, pose: &Pose) -> Result<AnalysisResult> {
        desk::analyze(pose, &self.config.desk, &self.table)
    }

    pub fn hand_posture(&self, hands: &[Hand]) -> Result<AnalysisResult> {
        hand::analyze(hands, &self.config.hand)
    }

    pub fn arm_screen(&self, pose: &Pose, detections: &[BoundingBox]) -> Result<AnalysisResult> {
        arm_screen::analyze(pose, detections, &self.config.arm_screen, &self.table)
    }

    pub fn lower_body(&self, pose: &Pose) -> Result<AnalysisResult> {
        lower_body::analyze(pose, &self.config.lower_body, &self.table)
    }

    /// ドメインを指定して解析
    pub fn analyze(&self, domain: Domain, observation: &Observation) -> Result<AnalysisResult> {
        let span = tracing::info_span!("analyze", %domain);
        let _enter = span.enter();

        match domain {
            Domain::HandPosture => self.hand_posture(&observation.hands),
            Domain::SeatedPosture => {
                self.seated_posture(require_pose(observation)?, &observation.detections)
            }
            Domain::DeskPosture => self.desk_posture(require_pose(observation)?),
            Domain::ArmScreen => self.arm_screen(require_pose(observation)?, &observation.detections),
            Domain::LowerBody => self.lower_body(require_pose(observation)?),
        }
    }
}

fn require_pose(observation: &Observation) -> Result<&Pose> {
    observation.pose.as_ref().ok_or_else(|| {
        tracing::warn!("No pose landmarks detected");
        AnalysisError::NoDetection("no body landmarks detected".to_string())
    })
}

impl Default for Analyzer {
    fn default() -> Self {
        Self {
            config: Config::default(),
            table: ThresholdTable::default(),
        }
    }
}

#[cfg(test)]
pub(crate) mod testutil {
    use crate::pose::{BodyLandmark, ImageFrame, Keypoint, Landmark, Pose};

    /// ピクセル座標のポーズ（信頼度0.9）
    pub fn pixel_pose(points: &[(BodyLandmark, f64, f64)]) -> Pose {
        let kps = points
            .iter()
            .map(|&(lm, x, y)| Keypoint::new(lm.name(), x, y, 0.9))
            .collect();
        Pose::from_keypoints(kps, ImageFrame::pixel(640.0, 480.0)).unwrap()
    }

    /// 正規化座標のポーズ（信頼度0.9、画像は 1000x1000）
    pub fn normalized_pose(points: &[(BodyLandmark, f64, f64)]) -> Pose {
        let kps = points
            .iter()
            .map(|&(lm, x, y)| Keypoint::new(lm.name(), x, y, 0.9))
            .collect();
        Pose::from_keypoints(kps, ImageFrame::normalized(1000.0, 1000.0)).unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::testutil::pixel_pose;
    use super::*;
    use crate::facing::{FacingSide, ViewOrientation};
    use crate::pose::{BodyLandmark::*, ImageFrame};

    fn seated_scene() -> Observation {
        let pose = pixel_pose(&[
            (Nose, 150.0, 20.0),
            (LeftEar, 140.0, 20.0),
            (RightEar, 170.0, 20.0),
            (LeftShoulder, 100.0, 50.0),
            (RightShoulder, 200.0, 50.0),
            (LeftHip, 100.0, 150.0),
            (RightHip, 200.0, 150.0),
        ]);
        Observation {
            pose: Some(pose),
            hands: vec![],
            detections: vec![BoundingBox::new(220.0, 60.0, 310.0, 200.0, 0.8, "chair")],
        }
    }

    #[test]
    fn test_analyze_dispatch_seated() {
        let analyzer = Analyzer::default();
        let result = analyzer.analyze(Domain::SeatedPosture, &seated_scene()).unwrap();
        assert_eq!(result.domain, Domain::SeatedPosture);
        assert_eq!(result.facing, Some(FacingSide::Right));
        assert_eq!(result.view, Some(ViewOrientation::FrontOrBack));
        assert_eq!(result.classification("spine_angle").unwrap().label, "too straight");
    }

    #[test]
    fn test_analyze_without_pose_is_no_detection() {
        let analyzer = Analyzer::default();
        let err = analyzer
            .analyze(Domain::DeskPosture, &Observation::default())
            .unwrap_err();
        assert!(matches!(err, AnalysisError::NoDetection(_)));

        let empty = Observation {
            pose: Some(Pose::from_keypoints(vec![], ImageFrame::pixel(640.0, 480.0)).unwrap()),
            ..Default::default()
        };
        let err = analyzer.analyze(Domain::LowerBody, &empty).unwrap_err();
        assert!(matches!(err, AnalysisError::NoDetection(_)));
    }

    #[test]
    fn test_analyze_hand_without_hands() {
        let err = Analyzer::default()
            .analyze(Domain::HandPosture, &Observation::default())
            .unwrap_err();
        assert!(matches!(err, AnalysisError::NoDetection(_)));
    }

    #[test]
    fn test_idempotent() {
        let analyzer = Analyzer::default();
        let scene = seated_scene();
        let a = analyzer.analyze(Domain::SeatedPosture, &scene).unwrap();
        let b = analyzer.analyze(Domain::SeatedPosture, &scene).unwrap();
        assert_eq!(a, b);
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }

    #[test]
    fn test_every_classification_references_a_metric() {
        let analyzer = Analyzer::default();
        let result = analyzer.analyze(Domain::SeatedPosture, &seated_scene()).unwrap();
        for c in &result.classifications {
            assert!(result.metric(&c.metric_name).is_some(), "{}", c.metric_name);
        }
    }

    #[test]
    fn test_threshold_overrides_apply() {
        use crate::classify::ThresholdRule;
        use crate::result::{Category, Outcome, RiskLevel};

        let mut config = Config::default();
        config.thresholds.push(ThresholdRule::closed(
            "spine_angle",
            -1.0,
            20.0,
            Outcome::new(Category::Positive, RiskLevel::Medium, "too straight"),
            Outcome::new(Category::Neutral, RiskLevel::Low, "good back alignment"),
            Outcome::new(Category::Negative, RiskLevel::High, "excessive forward lean"),
        ));
        let analyzer = Analyzer::new(config).unwrap();
        let result = analyzer.analyze(Domain::SeatedPosture, &seated_scene()).unwrap();
        assert_eq!(result.classification("spine_angle").unwrap().label, "good back alignment");
    }

    #[test]
    fn test_analyzer_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Analyzer>();
        assert_send_sync::<AnalysisResult>();
        assert_send_sync::<Observation>();
    }
}
