use std::marker::PhantomData;

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use super::landmark::{BodyLandmark, HandLandmark, Landmark};
use crate::error::{AnalysisError, Result};
use crate::result::Domain;

/// 単一キーポイント
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Keypoint {
    /// ランドマーク名 (e.g. "left_shoulder")
    pub name: String,
    /// X座標（正規化 0.0〜1.0 またはピクセル）
    pub x: f64,
    /// Y座標（正規化 0.0〜1.0 またはピクセル、下向きが正）
    pub y: f64,
    /// 信頼度スコア (0.0〜1.0)
    pub confidence: f64,
}

impl Keypoint {
    pub fn new(name: impl Into<String>, x: f64, y: f64, confidence: f64) -> Self {
        Self {
            name: name.into(),
            x,
            y,
            confidence,
        }
    }

    /// 信頼度が閾値以上か
    pub fn is_valid(&self, threshold: f64) -> bool {
        self.confidence >= threshold
    }

    pub fn point(&self) -> Point2<f64> {
        Point2::new(self.x, self.y)
    }

    fn validate(&self) -> Result<()> {
        if !self.x.is_finite() || !self.y.is_finite() {
            return Err(AnalysisError::InvalidInput(format!(
                "keypoint {} has non-finite coordinates ({}, {})",
                self.name, self.x, self.y
            )));
        }
        if !(0.0..=1.0).contains(&self.confidence) {
            return Err(AnalysisError::InvalidInput(format!(
                "keypoint {} confidence {} outside [0, 1]",
                self.name, self.confidence
            )));
        }
        Ok(())
    }
}

/// 座標系
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoordinateSpace {
    /// 画像サイズで割った 0.0〜1.0
    Normalized,
    /// ピクセル
    Pixel,
}

/// キーポイントが属する画像の情報
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImageFrame {
    pub width: f64,
    pub height: f64,
    pub space: CoordinateSpace,
}

impl ImageFrame {
    pub fn normalized(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            space: CoordinateSpace::Normalized,
        }
    }

    pub fn pixel(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            space: CoordinateSpace::Pixel,
        }
    }

    fn validate(&self) -> Result<()> {
        if !(self.width.is_finite() && self.width > 0.0)
            || !(self.height.is_finite() && self.height > 0.0)
        {
            return Err(AnalysisError::InvalidInput(format!(
                "image size must be positive, got {}x{}",
                self.width, self.height
            )));
        }
        Ok(())
    }

    /// 入力座標 → ピクセル座標
    pub fn to_pixel(&self, p: Point2<f64>) -> Point2<f64> {
        match self.space {
            CoordinateSpace::Pixel => p,
            CoordinateSpace::Normalized => Point2::new(p.x * self.width, p.y * self.height),
        }
    }

    /// 入力座標 → 正規化座標
    pub fn to_normalized(&self, p: Point2<f64>) -> Point2<f64> {
        match self.space {
            CoordinateSpace::Normalized => p,
            CoordinateSpace::Pixel => Point2::new(p.x / self.width, p.y / self.height),
        }
    }
}

/// 語彙 `L` の名前付きキーポイント集合
///
/// 検出器との境界で一度だけ構築し、以降は読み取り専用。
#[derive(Debug, Clone, PartialEq)]
pub struct KeypointSet<L: Landmark> {
    keypoints: Vec<Option<Keypoint>>,
    frame: ImageFrame,
    _vocabulary: PhantomData<L>,
}

/// 体のキーポイント集合
pub type Pose = KeypointSet<BodyLandmark>;

/// 片手分のキーポイント集合
pub type Hand = KeypointSet<HandLandmark>;

impl<L: Landmark> KeypointSet<L> {
    /// 検出器の出力から構築
    ///
    /// 未知の名前・重複・範囲外の信頼度は InvalidInput。
    pub fn from_keypoints(keypoints: Vec<Keypoint>, frame: ImageFrame) -> Result<Self> {
        frame.validate()?;
        let mut slots: Vec<Option<Keypoint>> = vec![None; L::COUNT];
        for kp in keypoints {
            kp.validate()?;
            let landmark = L::from_name(&kp.name).ok_or_else(|| {
                AnalysisError::InvalidInput(format!("unknown landmark name: {}", kp.name))
            })?;
            let slot = &mut slots[landmark.index()];
            if slot.is_some() {
                return Err(AnalysisError::InvalidInput(format!(
                    "duplicate landmark: {}",
                    kp.name
                )));
            }
            *slot = Some(kp);
        }
        Ok(Self {
            keypoints: slots,
            frame,
            _vocabulary: PhantomData,
        })
    }

    pub fn frame(&self) -> &ImageFrame {
        &self.frame
    }

    /// 検出されたキーポイント数
    pub fn len(&self) -> usize {
        self.keypoints.iter().filter(|k| k.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, landmark: L) -> Option<&Keypoint> {
        self.keypoints[landmark.index()].as_ref()
    }

    /// 必須キーポイントを取得（欠損は InvalidInput）
    pub fn require(&self, landmark: L) -> Result<&Keypoint> {
        self.get(landmark).ok_or_else(|| {
            AnalysisError::InvalidInput(format!("missing landmark: {}", landmark.name()))
        })
    }

    /// ピクセル座標で取得
    pub fn pixel(&self, landmark: L) -> Result<Point2<f64>> {
        Ok(self.frame.to_pixel(self.require(landmark)?.point()))
    }

    /// 正規化座標で取得
    pub fn normalized(&self, landmark: L) -> Result<Point2<f64>> {
        Ok(self.frame.to_normalized(self.require(landmark)?.point()))
    }

    /// 対象キーポイントのうち閾値未満の数（欠損も閾値未満として数える）
    pub fn low_confidence_count(&self, relevant: &[L], threshold: f64) -> usize {
        relevant
            .iter()
            .filter(|&&lm| !self.get(lm).is_some_and(|kp| kp.is_valid(threshold)))
            .count()
    }

    /// 低信頼度ガード
    ///
    /// 対象の `max_low_ratio` を超える割合が `threshold` 未満なら LowConfidence。
    pub fn ensure_confident(
        &self,
        domain: Domain,
        relevant: &[L],
        threshold: f64,
        max_low_ratio: f64,
    ) -> Result<()> {
        if relevant.is_empty() {
            return Ok(());
        }
        let low = self.low_confidence_count(relevant, threshold);
        let ratio = low as f64 / relevant.len() as f64;
        if ratio > max_low_ratio {
            tracing::warn!(%domain, low, total = relevant.len(), threshold, "Low keypoint confidence");
            return Err(AnalysisError::LowConfidence {
                domain,
                low,
                total: relevant.len(),
                threshold,
            });
        }
        Ok(())
    }

    /// 全キーポイントの平均信頼度（欠損は0として扱う）
    pub fn average_confidence(&self) -> f64 {
        let sum: f64 = self.keypoints.iter().flatten().map(|k| k.confidence).sum();
        sum / L::COUNT as f64
    }
}
