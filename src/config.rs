use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::calibration::ClampRange;
use crate::classify::{ThresholdRule, ThresholdTable};
use crate::geometry::LineSideParams;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub log: LogConfig,
    #[serde(default)]
    pub seated: SeatedConfig,
    #[serde(default)]
    pub desk: DeskConfig,
    #[serde(default)]
    pub hand: HandConfig,
    #[serde(default)]
    pub arm_screen: ArmScreenConfig,
    #[serde(default)]
    pub lower_body: LowerBodyConfig,
    /// メトリクスごとの閾値上書き
    #[serde(default)]
    pub thresholds: Vec<ThresholdRule>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// RUST_LOG 未設定時のフィルタ
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String { "info".to_string() }

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// 低信頼度ガード（ドメイン共通の形）
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ConfidenceGuard {
    /// キーポイント信頼度の閾値
    #[serde(default = "default_confidence_threshold")]
    pub threshold: f64,
    /// 閾値未満のキーポイントがこの割合を超えたら LowConfidence
    #[serde(default = "default_max_low_ratio")]
    pub max_low_ratio: f64,
}

fn default_confidence_threshold() -> f64 { 0.2 }
fn default_max_low_ratio() -> f64 { 0.75 }

impl Default for ConfidenceGuard {
    fn default() -> Self {
        Self {
            threshold: default_confidence_threshold(),
            max_low_ratio: default_max_low_ratio(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeatedConfig {
    #[serde(default)]
    pub guard: ConfidenceGuard,
    /// 肩幅（px）がこれ未満なら側面
    #[serde(default = "default_side_view_threshold_px")]
    pub side_view_threshold_px: f64,
    /// 側面時に椅子の奥側の端から内側へずらす割合
    #[serde(default = "default_side_view_inset")]
    pub side_view_inset: f64,
    /// 椅子の標準的な横幅（cm）
    #[serde(default = "default_chair_width_cm")]
    pub chair_width_cm: f64,
    /// 背もたれまでの距離のクランプ範囲（cm）
    #[serde(default = "default_chair_distance_range")]
    pub chair_distance_range: ClampRange,
    #[serde(default = "default_chair_classes")]
    pub chair_classes: Vec<String>,
    #[serde(default)]
    pub chair_min_confidence: f64,
}

fn default_side_view_threshold_px() -> f64 { 100.0 }
fn default_side_view_inset() -> f64 { 0.2 }
fn default_chair_width_cm() -> f64 { 45.0 }
fn default_chair_distance_range() -> ClampRange { ClampRange::new(0.0, 50.0) }
fn default_chair_classes() -> Vec<String> { vec!["chair".to_string()] }

impl Default for SeatedConfig {
    fn default() -> Self {
        Self {
            guard: ConfidenceGuard::default(),
            side_view_threshold_px: default_side_view_threshold_px(),
            side_view_inset: default_side_view_inset(),
            chair_width_cm: default_chair_width_cm(),
            chair_distance_range: default_chair_distance_range(),
            chair_classes: default_chair_classes(),
            chair_min_confidence: 0.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeskConfig {
    #[serde(default)]
    pub guard: ConfidenceGuard,
    #[serde(default)]
    pub line_side: LineSideParams,
    /// 撮影方向の判定に使う肩幅閾値（px）
    #[serde(default = "default_side_view_threshold_px")]
    pub side_view_threshold_px: f64,
}

impl Default for DeskConfig {
    fn default() -> Self {
        Self {
            guard: ConfidenceGuard::default(),
            line_side: LineSideParams::default(),
            side_view_threshold_px: default_side_view_threshold_px(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct HandConfig {
    #[serde(default)]
    pub guard: ConfidenceGuard,
    /// 指の曲がり・手首の屈曲の不感帯（正規化座標）
    #[serde(default = "default_bend_buffer")]
    pub bend_buffer: f64,
    /// 指先-PIP間がこれ未満なら曲がっている（正規化座標）
    #[serde(default = "default_claw_distance")]
    pub claw_distance: f64,
    /// クローグリップとみなす曲がった指の本数
    #[serde(default = "default_claw_min_fingers")]
    pub claw_min_fingers: usize,
}

fn default_bend_buffer() -> f64 { 0.05 }
fn default_claw_distance() -> f64 { 0.15 }
fn default_claw_min_fingers() -> usize { 3 }

impl Default for HandConfig {
    fn default() -> Self {
        Self {
            guard: ConfidenceGuard::default(),
            bend_buffer: default_bend_buffer(),
            claw_distance: default_claw_distance(),
            claw_min_fingers: default_claw_min_fingers(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ArmScreenConfig {
    #[serde(default)]
    pub guard: ConfidenceGuard,
    /// 肩から指先までの平均的な腕の長さ（cm）
    #[serde(default = "default_arm_length_cm")]
    pub arm_length_cm: f64,
    #[serde(default = "default_screen_classes")]
    pub screen_classes: Vec<String>,
    #[serde(default = "default_screen_min_confidence")]
    pub screen_min_confidence: f64,
    #[serde(default = "default_side_view_threshold_px")]
    pub side_view_threshold_px: f64,
}

fn default_arm_length_cm() -> f64 { 74.0 }
fn default_screen_classes() -> Vec<String> {
    vec!["laptop".to_string(), "monitor".to_string(), "tv".to_string()]
}
fn default_screen_min_confidence() -> f64 { 0.3 }

impl Default for ArmScreenConfig {
    fn default() -> Self {
        Self {
            guard: ConfidenceGuard::default(),
            arm_length_cm: default_arm_length_cm(),
            screen_classes: default_screen_classes(),
            screen_min_confidence: default_screen_min_confidence(),
            side_view_threshold_px: default_side_view_threshold_px(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LowerBodyConfig {
    #[serde(default)]
    pub guard: ConfidenceGuard,
    #[serde(default = "default_side_view_threshold_px")]
    pub side_view_threshold_px: f64,
}

impl Default for LowerBodyConfig {
    fn default() -> Self {
        Self {
            guard: ConfidenceGuard::default(),
            side_view_threshold_px: default_side_view_threshold_px(),
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Config = toml::from_str(&content).context("Failed to parse config")?;
        config.threshold_table()?;
        Ok(config)
    }

    /// ファイルが無ければデフォルト
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// デフォルト表に `[[thresholds]]` の上書きを適用した表
    pub fn threshold_table(&self) -> Result<ThresholdTable> {
        ThresholdTable::default()
            .with_overrides(&self.thresholds)
            .context("Invalid threshold override")
    }
}
