use thiserror::Error;

use crate::result::Domain;

/// 解析の失敗種別
///
/// どの失敗も分類結果に丸めず、そのまま呼び出し側へ返す。
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    /// ランドマーク検出器・物体検出器が何も返さなかった
    #[error("no detection: {0}")]
    NoDetection(String),

    /// 対象キーポイントの大半が信頼度閾値未満
    #[error(
        "low confidence in {domain}: {low} of {total} keypoints below {threshold}"
    )]
    LowConfidence {
        domain: Domain,
        low: usize,
        total: usize,
        threshold: f64,
    },

    /// 鼻から左右の耳までの距離が完全に一致
    #[error("facing side is ambiguous (nose-to-ear distances are equal)")]
    AmbiguousFacing,

    /// pixels_per_unit が正の有限値にならない
    #[error("invalid calibration: {0}")]
    InvalidCalibration(String),

    /// キーポイント・BBoxのデータ不正
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
