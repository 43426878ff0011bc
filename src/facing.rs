use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, Result};
use crate::geometry::distance;
use crate::pose::{BodyLandmark, BodySide, BoundingBox, Pose};

/// カメラ側を向いている体の側
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FacingSide {
    Left,
    Right,
    Ambiguous,
}

impl FacingSide {
    pub fn side(self) -> Option<BodySide> {
        match self {
            Self::Left => Some(BodySide::Left),
            Self::Right => Some(BodySide::Right),
            Self::Ambiguous => None,
        }
    }
}

/// 撮影方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewOrientation {
    Side,
    FrontOrBack,
}

/// 鼻と左右の耳の水平距離から向きを判定
///
/// 左耳の方が近い → 右側がカメラ側。完全一致は Ambiguous。
pub fn facing_from_points(nose: &Point2<f64>, left_ear: &Point2<f64>, right_ear: &Point2<f64>) -> FacingSide {
    let to_left = (nose.x - left_ear.x).abs();
    let to_right = (nose.x - right_ear.x).abs();
    if to_left < to_right {
        FacingSide::Right
    } else if to_left > to_right {
        FacingSide::Left
    } else {
        FacingSide::Ambiguous
    }
}

pub fn determine_facing(pose: &Pose) -> Result<FacingSide> {
    let nose = pose.require(BodyLandmark::Nose)?.point();
    let left_ear = pose.require(BodyLandmark::LeftEar)?.point();
    let right_ear = pose.require(BodyLandmark::RightEar)?.point();
    let facing = facing_from_points(&nose, &left_ear, &right_ear);
    tracing::info!(?facing, "Facing side determined");
    Ok(facing)
}

/// 鼻と両耳が揃っていれば向きを判定、欠けていれば None
pub fn try_determine_facing(pose: &Pose) -> Option<FacingSide> {
    let face = [BodyLandmark::Nose, BodyLandmark::LeftEar, BodyLandmark::RightEar];
    if face.iter().any(|&lm| pose.get(lm).is_none()) {
        tracing::debug!("Nose or ears missing, facing side not determined");
        return None;
    }
    determine_facing(pose).ok()
}

/// カメラ側の片側ランドマーク列
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SideChain {
    pub side: BodySide,
    pub eye: BodyLandmark,
    pub ear: BodyLandmark,
    pub shoulder: BodyLandmark,
    pub elbow: BodyLandmark,
    pub wrist: BodyLandmark,
    pub hip: BodyLandmark,
    pub knee: BodyLandmark,
    pub ankle: BodyLandmark,
}

impl SideChain {
    pub fn for_side(side: BodySide) -> Self {
        use BodyLandmark::*;
        match side {
            BodySide::Left => Self {
                side,
                eye: LeftEye,
                ear: LeftEar,
                shoulder: LeftShoulder,
                elbow: LeftElbow,
                wrist: LeftWrist,
                hip: LeftHip,
                knee: LeftKnee,
                ankle: LeftAnkle,
            },
            BodySide::Right => Self {
                side,
                eye: RightEye,
                ear: RightEar,
                shoulder: RightShoulder,
                elbow: RightElbow,
                wrist: RightWrist,
                hip: RightHip,
                knee: RightKnee,
                ankle: RightAnkle,
            },
        }
    }

    /// 向きに対応する片側。Ambiguous は AmbiguousFacing。
    pub fn select(facing: FacingSide) -> Result<Self> {
        facing
            .side()
            .map(Self::for_side)
            .ok_or(AnalysisError::AmbiguousFacing)
    }
}

/// 肩幅（ピクセル）から撮影方向を判定
pub fn view_from_shoulder_width(shoulder_width_px: f64, threshold_px: f64) -> ViewOrientation {
    if shoulder_width_px < threshold_px {
        ViewOrientation::Side
    } else {
        ViewOrientation::FrontOrBack
    }
}

pub fn determine_view(pose: &Pose, threshold_px: f64) -> Result<(ViewOrientation, f64)> {
    let left = pose.pixel(BodyLandmark::LeftShoulder)?;
    let right = pose.pixel(BodyLandmark::RightShoulder)?;
    let width = distance(&left, &right);
    let view = view_from_shoulder_width(width, threshold_px);
    tracing::info!(?view, shoulder_width_px = width, "View orientation determined");
    Ok((view, width))
}

/// 両肩が揃っていれば撮影方向を判定、欠けていれば None
pub fn try_determine_view(pose: &Pose, threshold_px: f64) -> Result<Option<(ViewOrientation, f64)>> {
    if pose.get(BodyLandmark::LeftShoulder).is_none() || pose.get(BodyLandmark::RightShoulder).is_none() {
        tracing::debug!("Shoulder missing, view orientation not determined");
        return Ok(None);
    }
    determine_view(pose, threshold_px).map(Some)
}

/// 椅子の背もたれ基準のX座標
///
/// 側面: 奥側の端から幅の `side_inset` だけ内側。正面/背面: 奥側の端そのもの。
pub fn chair_reference_x(chair: &BoundingBox, view: ViewOrientation, side_inset: f64) -> f64 {
    match view {
        ViewOrientation::Side => chair.x2 - chair.width() * side_inset,
        ViewOrientation::FrontOrBack => chair.x2,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::{ImageFrame, Keypoint};

    fn p(x: f64, y: f64) -> Point2<f64> {
        Point2::new(x, y)
    }

    #[test]
    fn test_left_ear_closer_selects_right_chain() {
        let facing = facing_from_points(&p(0.50, 0.2), &p(0.52, 0.2), &p(0.60, 0.2));
        assert_eq!(facing, FacingSide::Right);
        let chain = SideChain::select(facing).unwrap();
        assert_eq!(chain.shoulder, BodyLandmark::RightShoulder);
        assert_eq!(chain.hip, BodyLandmark::RightHip);
        assert_eq!(chain.knee, BodyLandmark::RightKnee);
        assert_eq!(chain.ankle, BodyLandmark::RightAnkle);
    }

    #[test]
    fn test_right_ear_closer_selects_left_chain() {
        let facing = facing_from_points(&p(0.50, 0.2), &p(0.40, 0.2), &p(0.49, 0.2));
        assert_eq!(facing, FacingSide::Left);
        assert_eq!(SideChain::select(facing).unwrap().elbow, BodyLandmark::LeftElbow);
    }

    #[test]
    fn test_equal_distances_are_ambiguous() {
        let facing = facing_from_points(&p(0.5, 0.2), &p(0.25, 0.2), &p(0.75, 0.2));
        assert_eq!(facing, FacingSide::Ambiguous);
        assert_eq!(SideChain::select(facing), Err(AnalysisError::AmbiguousFacing));
    }

    #[test]
    fn test_view_from_shoulder_width() {
        assert_eq!(view_from_shoulder_width(80.0, 100.0), ViewOrientation::Side);
        assert_eq!(view_from_shoulder_width(100.0, 100.0), ViewOrientation::FrontOrBack);
        assert_eq!(view_from_shoulder_width(140.0, 100.0), ViewOrientation::FrontOrBack);
    }

    #[test]
    fn test_determine_view_uses_pixels() {
        // 正規化座標で 0.125 × 640px = 80px
        let kps = vec![
            Keypoint::new("left_shoulder", 0.5, 0.3, 0.9),
            Keypoint::new("right_shoulder", 0.625, 0.3, 0.9),
        ];
        let pose = Pose::from_keypoints(kps, ImageFrame::normalized(640.0, 480.0)).unwrap();
        let (view, width) = determine_view(&pose, 100.0).unwrap();
        assert_eq!(view, ViewOrientation::Side);
        assert!((width - 80.0).abs() < 1e-9);
    }

    #[test]
    fn test_optional_facing_and_view_without_landmarks() {
        let kps = vec![Keypoint::new("left_shoulder", 100.0, 50.0, 0.9)];
        let pose = Pose::from_keypoints(kps, ImageFrame::pixel(640.0, 480.0)).unwrap();
        assert_eq!(try_determine_facing(&pose), None);
        assert_eq!(try_determine_view(&pose, 100.0).unwrap(), None);

        let kps = vec![
            Keypoint::new("nose", 0.5, 0.2, 0.9),
            Keypoint::new("left_ear", 0.52, 0.2, 0.9),
            Keypoint::new("right_ear", 0.6, 0.2, 0.9),
        ];
        let pose = Pose::from_keypoints(kps, ImageFrame::normalized(640.0, 480.0)).unwrap();
        assert_eq!(try_determine_facing(&pose), Some(FacingSide::Right));
    }

    #[test]
    fn test_chair_reference_x() {
        let chair = BoundingBox::new(300.0, 0.0, 400.0, 100.0, 0.9, "chair");
        assert_eq!(chair_reference_x(&chair, ViewOrientation::FrontOrBack, 0.2), 400.0);
        assert_eq!(chair_reference_x(&chair, ViewOrientation::Side, 0.2), 380.0);
    }
}
