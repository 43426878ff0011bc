/// 名前付きランドマーク語彙
///
/// 体（姿勢推定）と手（ハンドランドマーカー）で同じキーポイント集合型を
/// 使い回すための境界。
pub trait Landmark: Copy + Eq + std::fmt::Debug + 'static {
    const COUNT: usize;
    const ALL: &'static [Self];

    fn index(self) -> usize;

    /// 検出器が出力する snake_case 名
    fn name(self) -> &'static str;

    fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|l| l.name() == name)
    }

    fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }
}

/// 体の左右
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BodySide {
    Left,
    Right,
}

impl BodySide {
    pub fn opposite(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }
}

impl std::fmt::Display for BodySide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Left => f.write_str("left"),
            Self::Right => f.write_str("right"),
        }
    }
}

/// 体ランドマーク
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum BodyLandmark {
    Nose = 0,
    LeftEye = 1,
    RightEye = 2,
    LeftEar = 3,
    RightEar = 4,
    LeftShoulder = 5,
    RightShoulder = 6,
    LeftElbow = 7,
    RightElbow = 8,
    LeftWrist = 9,
    RightWrist = 10,
    LeftPinky = 11,
    RightPinky = 12,
    LeftIndex = 13,
    RightIndex = 14,
    LeftThumb = 15,
    RightThumb = 16,
    LeftHip = 17,
    RightHip = 18,
    LeftKnee = 19,
    RightKnee = 20,
    LeftAnkle = 21,
    RightAnkle = 22,
}

impl Landmark for BodyLandmark {
    const COUNT: usize = 23;
    const ALL: &'static [Self] = &[
        Self::Nose,
        Self::LeftEye,
        Self::RightEye,
        Self::LeftEar,
        Self::RightEar,
        Self::LeftShoulder,
        Self::RightShoulder,
        Self::LeftElbow,
        Self::RightElbow,
        Self::LeftWrist,
        Self::RightWrist,
        Self::LeftPinky,
        Self::RightPinky,
        Self::LeftIndex,
        Self::RightIndex,
        Self::LeftThumb,
        Self::RightThumb,
        Self::LeftHip,
        Self::RightHip,
        Self::LeftKnee,
        Self::RightKnee,
        Self::LeftAnkle,
        Self::RightAnkle,
    ];

    fn index(self) -> usize {
        self as usize
    }

    fn name(self) -> &'static str {
        match self {
            Self::Nose => "nose",
            Self::LeftEye => "left_eye",
            Self::RightEye => "right_eye",
            Self::LeftEar => "left_ear",
            Self::RightEar => "right_ear",
            Self::LeftShoulder => "left_shoulder",
            Self::RightShoulder => "right_shoulder",
            Self::LeftElbow => "left_elbow",
            Self::RightElbow => "right_elbow",
            Self::LeftWrist => "left_wrist",
            Self::RightWrist => "right_wrist",
            Self::LeftPinky => "left_pinky",
            Self::RightPinky => "right_pinky",
            Self::LeftIndex => "left_index",
            Self::RightIndex => "right_index",
            Self::LeftThumb => "left_thumb",
            Self::RightThumb => "right_thumb",
            Self::LeftHip => "left_hip",
            Self::RightHip => "right_hip",
            Self::LeftKnee => "left_knee",
            Self::RightKnee => "right_knee",
            Self::LeftAnkle => "left_ankle",
            Self::RightAnkle => "right_ankle",
        }
    }
}

/// 手ランドマーク（21点）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum HandLandmark {
    Wrist = 0,
    ThumbCmc = 1,
    ThumbMcp = 2,
    ThumbIp = 3,
    ThumbTip = 4,
    IndexMcp = 5,
    IndexPip = 6,
    IndexDip = 7,
    IndexTip = 8,
    MiddleMcp = 9,
    MiddlePip = 10,
    MiddleDip = 11,
    MiddleTip = 12,
    RingMcp = 13,
    RingPip = 14,
    RingDip = 15,
    RingTip = 16,
    PinkyMcp = 17,
    PinkyPip = 18,
    PinkyDip = 19,
    PinkyTip = 20,
}

impl HandLandmark {
    /// 親指以外の指先と、それぞれの近位指節間関節（PIP）
    pub const FINGER_TIPS: [(HandLandmark, HandLandmark); 4] = [
        (Self::IndexTip, Self::IndexPip),
        (Self::MiddleTip, Self::MiddlePip),
        (Self::RingTip, Self::RingPip),
        (Self::PinkyTip, Self::PinkyPip),
    ];
}

impl Landmark for HandLandmark {
    const COUNT: usize = 21;
    const ALL: &'static [Self] = &[
        Self::Wrist,
        Self::ThumbCmc,
        Self::ThumbMcp,
        Self::ThumbIp,
        Self::ThumbTip,
        Self::IndexMcp,
        Self::IndexPip,
        Self::IndexDip,
        Self::IndexTip,
        Self::MiddleMcp,
        Self::MiddlePip,
        Self::MiddleDip,
        Self::MiddleTip,
        Self::RingMcp,
        Self::RingPip,
        Self::RingDip,
        Self::RingTip,
        Self::PinkyMcp,
        Self::PinkyPip,
        Self::PinkyDip,
        Self::PinkyTip,
    ];

    fn index(self) -> usize {
        self as usize
    }

    fn name(self) -> &'static str {
        match self {
            Self::Wrist => "wrist",
            Self::ThumbCmc => "thumb_cmc",
            Self::ThumbMcp => "thumb_mcp",
            Self::ThumbIp => "thumb_ip",
            Self::ThumbTip => "thumb_tip",
            Self::IndexMcp => "index_finger_mcp",
            Self::IndexPip => "index_finger_pip",
            Self::IndexDip => "index_finger_dip",
            Self::IndexTip => "index_finger_tip",
            Self::MiddleMcp => "middle_finger_mcp",
            Self::MiddlePip => "middle_finger_pip",
            Self::MiddleDip => "middle_finger_dip",
            Self::MiddleTip => "middle_finger_tip",
            Self::RingMcp => "ring_finger_mcp",
            Self::RingPip => "ring_finger_pip",
            Self::RingDip => "ring_finger_dip",
            Self::RingTip => "ring_finger_tip",
            Self::PinkyMcp => "pinky_mcp",
            Self::PinkyPip => "pinky_pip",
            Self::PinkyDip => "pinky_dip",
            Self::PinkyTip => "pinky_tip",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_landmark_count() {
        assert_eq!(BodyLandmark::ALL.len(), BodyLandmark::COUNT);
        for (i, lm) in BodyLandmark::ALL.iter().enumerate() {
            assert_eq!(lm.index(), i);
        }
    }

    #[test]
    fn test_hand_landmark_count() {
        assert_eq!(HandLandmark::ALL.len(), HandLandmark::COUNT);
        for (i, lm) in HandLandmark::ALL.iter().enumerate() {
            assert_eq!(lm.index(), i);
        }
    }

    #[test]
    fn test_from_name() {
        assert_eq!(BodyLandmark::from_name("left_shoulder"), Some(BodyLandmark::LeftShoulder));
        assert_eq!(HandLandmark::from_name("pinky_tip"), Some(HandLandmark::PinkyTip));
        assert_eq!(BodyLandmark::from_name("tail"), None);
    }

    #[test]
    fn test_from_index() {
        assert_eq!(BodyLandmark::from_index(0), Some(BodyLandmark::Nose));
        assert_eq!(BodyLandmark::from_index(22), Some(BodyLandmark::RightAnkle));
        assert_eq!(BodyLandmark::from_index(23), None);
    }
}
