//! 2Dキーポイントに対する幾何計算
//!
//! 画像座標（左上原点、Yは下向きが正）を前提とする。

use nalgebra::{Point2, Vector2};
use serde::{Deserialize, Serialize};

use crate::pose::BodySide;

/// 2点間のユークリッド距離
pub fn distance(p: &Point2<f64>, q: &Point2<f64>) -> f64 {
    nalgebra::distance(p, q)
}

pub fn midpoint(p: &Point2<f64>, q: &Point2<f64>) -> Point2<f64> {
    nalgebra::center(p, q)
}

/// 2Dクロス積（z成分）
pub fn cross(a: &Vector2<f64>, b: &Vector2<f64>) -> f64 {
    a.x * b.y - a.y * b.x
}

/// 2ベクトルのなす角（度, 0〜180）
///
/// どちらかの長さが0なら0を返す。
pub fn vector_angle(a: &Vector2<f64>, b: &Vector2<f64>) -> f64 {
    let na = a.norm();
    let nb = b.norm();
    if na == 0.0 || nb == 0.0 {
        return 0.0;
    }
    // 丸め誤差で |cos| > 1 になるとacosがNaNを返す
    let cos = (a.dot(b) / (na * nb)).clamp(-1.0, 1.0);
    cos.acos().to_degrees()
}

/// p2を頂点とする p1-p2-p3 の角度（度, 0〜180）
///
/// 退化（p1==p2 または p3==p2）は0。
pub fn angle(p1: &Point2<f64>, p2: &Point2<f64>, p3: &Point2<f64>) -> f64 {
    let a = p1 - p2;
    let b = p3 - p2;
    let deg = vector_angle(&a, &b);
    tracing::trace!(angle = deg, "Calculated joint angle");
    deg
}

/// 水平線に対する角度
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "degrees")]
pub enum HorizontalAngle {
    /// -90〜+90 に折り返した角度
    Degrees(f64),
    /// p1がp2より下にある（角度として扱わない）
    Inverted,
}

impl HorizontalAngle {
    /// Inverted を数値で報告する場合の値
    pub const INVERTED_SENTINEL: f64 = -100.0;

    pub fn degrees(self) -> Option<f64> {
        match self {
            Self::Degrees(d) => Some(d),
            Self::Inverted => None,
        }
    }

    /// 報告用の数値（Inverted は INVERTED_SENTINEL）
    pub fn reported(self) -> f64 {
        self.degrees().unwrap_or(Self::INVERTED_SENTINEL)
    }
}

/// p2→p1 の向きの水平線に対する符号付き角度
///
/// p1がp2より下（Yが大きい）なら Inverted。
pub fn horizontal_angle(p1: &Point2<f64>, p2: &Point2<f64>) -> HorizontalAngle {
    if p1.y > p2.y {
        return HorizontalAngle::Inverted;
    }
    let v = p1 - p2;
    let mut deg = v.y.atan2(v.x).to_degrees();
    if deg > 90.0 {
        deg -= 180.0;
    } else if deg < -90.0 {
        deg += 180.0;
    }
    HorizontalAngle::Degrees(deg)
}

/// 点と直線ABの距離
///
/// A==B の場合は点Aとの距離。
pub fn point_to_line_distance(p: &Point2<f64>, a: &Point2<f64>, b: &Point2<f64>) -> f64 {
    let line = b - a;
    let len = line.norm();
    if len == 0.0 {
        return distance(p, a);
    }
    cross(&line, &(p - a)).abs() / len
}

/// 折れ線の長さ
pub fn path_length(points: &[Point2<f64>]) -> f64 {
    points.windows(2).map(|w| distance(&w[0], &w[1])).sum()
}

/// 肘と肩-腰ラインの位置関係
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ElbowPosition {
    UnderRotated = -1,
    Neutral = 0,
    OverRotated = 1,
}

impl ElbowPosition {
    pub fn code(self) -> i32 {
        self as i32
    }
}

/// 肩-腰ライン判定のパラメータ（正規化座標）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LineSideParams {
    /// ライン近傍とみなす距離
    #[serde(default = "default_near_distance")]
    pub near_distance: f64,
    /// ラインから十分離れているとみなす距離
    #[serde(default = "default_far_distance")]
    pub far_distance: f64,
    /// 中立とする肘の屈曲角の下限（度）
    #[serde(default = "default_neutral_angle_min")]
    pub neutral_angle_min: f64,
    /// 中立とする肘の屈曲角の上限（度）
    #[serde(default = "default_neutral_angle_max")]
    pub neutral_angle_max: f64,
}

fn default_near_distance() -> f64 { 0.035 }
fn default_far_distance() -> f64 { 0.03 }
fn default_neutral_angle_min() -> f64 { 80.0 }
fn default_neutral_angle_max() -> f64 { 130.0 }

impl Default for LineSideParams {
    fn default() -> Self {
        Self {
            near_distance: default_near_distance(),
            far_distance: default_far_distance(),
            neutral_angle_min: default_neutral_angle_min(),
            neutral_angle_max: default_neutral_angle_max(),
        }
    }
}

/// 肩-腰ラインに対する肘の計測値
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineSideMeasurement {
    /// (hip - shoulder) × (elbow - shoulder)
    pub cross: f64,
    /// 肘からラインまでの距離
    pub distance: f64,
    /// 肩→肘 と 肘→手首 のなす角（度）
    pub bend_angle: f64,
}

pub fn measure_line_side(
    shoulder: &Point2<f64>,
    hip: &Point2<f64>,
    elbow: &Point2<f64>,
    wrist: &Point2<f64>,
) -> LineSideMeasurement {
    let shoulder_to_hip = hip - shoulder;
    let shoulder_to_elbow = elbow - shoulder;
    let elbow_to_wrist = wrist - elbow;

    LineSideMeasurement {
        cross: cross(&shoulder_to_hip, &shoulder_to_elbow),
        distance: point_to_line_distance(elbow, shoulder, hip),
        bend_angle: vector_angle(&shoulder_to_elbow, &elbow_to_wrist),
    }
}

/// 肘が肩-腰ラインの前後どちらにあるかを判定
///
/// `side` はカメラ側を向いている体の側。期待するクロス積の符号は
/// 右側で負、左側で正（左右で鏡像）。
///
/// - 期待側かつ near_distance 未満: 屈曲角が中立帯なら Neutral、
///   上限超えなら OverRotated、それ以外は UnderRotated
/// - それ以外: 期待側かつ far_distance 超えなら OverRotated、他は UnderRotated
pub fn line_side_test(
    side: BodySide,
    shoulder: &Point2<f64>,
    hip: &Point2<f64>,
    elbow: &Point2<f64>,
    wrist: &Point2<f64>,
    params: &LineSideParams,
) -> ElbowPosition {
    let m = measure_line_side(shoulder, hip, elbow, wrist);
    let expected_side = match side {
        BodySide::Right => m.cross < 0.0,
        BodySide::Left => m.cross > 0.0,
    };

    let position = if expected_side && m.distance < params.near_distance {
        if (params.neutral_angle_min..=params.neutral_angle_max).contains(&m.bend_angle) {
            ElbowPosition::Neutral
        } else if m.bend_angle > params.neutral_angle_max {
            ElbowPosition::OverRotated
        } else {
            ElbowPosition::UnderRotated
        }
    } else if expected_side && m.distance > params.far_distance {
        ElbowPosition::OverRotated
    } else {
        ElbowPosition::UnderRotated
    };

    tracing::debug!(
        %side,
        cross = m.cross,
        distance = m.distance,
        bend_angle = m.bend_angle,
        ?position,
        "Elbow position against shoulder-hip line"
    );
    position
}
