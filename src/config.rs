// 该文件是 Lvye （绿野） 项目的一部分。
// src/config.rs - 进程级配置
//
// 本文件根据 Apache 许可证第 2.0 版（以下简称“许可证”）授权使用；
// 除非遵守该许可证条款，否则您不得使用本文件。
// 您可通过以下网址获取许可证副本：
// http://www.apache.org/licenses/LICENSE-2.0
// 除非适用法律要求或书面同意，根据本许可协议分发的软件均按“原样”提供，
// 不附带任何形式的明示或暗示的保证或条件。
// 有关许可权限与限制的具体条款，请参阅本许可协议。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, Wareless Group

//! 所有可调阈值集中于此。配置在启动时构建一次，之后只读共享。

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::model::color::HsvBand;

#[derive(Error, Debug)]
pub enum ConfigError {
  #[error("读取配置文件失败: {0}")]
  IoError(#[from] std::io::Error),
  #[error("解析配置文件失败: {0}")]
  ParseError(#[from] serde_json::Error),
  #[error("配置无效: {0}")]
  Invalid(String),
}

/// 屏幕检测参数
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenConfig {
  /// 自适应阈值的邻域大小（奇数）
  pub block_size: u32,
  /// 自适应阈值的偏移量
  pub offset: f32,
  /// 参与多边形拟合的最大轮廓数
  pub max_candidates: usize,
  /// 多边形近似容差，占轮廓周长的比例
  pub approx_tolerance: f64,
  pub min_area_ratio: f64,
  pub max_area_ratio: f64,
  /// 拉普拉斯响应均值阈值
  pub texture_threshold: f32,
  /// 灰度不低于该值视为近白（反光）
  pub glare_level: u8,
  pub glare_min_ratio: f32,
  pub glare_max_ratio: f32,
}

impl Default for ScreenConfig {
  fn default() -> Self {
    Self {
      block_size: 11,
      offset: 2.0,
      max_candidates: 10,
      approx_tolerance: 0.02,
      min_area_ratio: 0.1,
      max_area_ratio: 0.95,
      texture_threshold: 5.0,
      glare_level: 240,
      glare_min_ratio: 0.001,
      glare_max_ratio: 0.1,
    }
  }
}

/// 屏幕区域光度校正参数
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizeConfig {
  pub clahe_clip_limit: f32,
  pub clahe_tiles: u32,
  /// 饱和度低于该值且亮度高于 `reflection_min_value` 视为反光
  pub reflection_max_saturation: u8,
  pub reflection_min_value: u8,
  pub dilate_radius: u8,
  pub inpaint_radius: u32,
}

impl Default for NormalizeConfig {
  fn default() -> Self {
    Self {
      clahe_clip_limit: 3.0,
      clahe_tiles: 8,
      reflection_max_saturation: 30,
      reflection_min_value: 220,
      dilate_radius: 1,
      inpaint_radius: 3,
    }
  }
}

/// 置信度组合权重
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Weights {
  pub plant: f32,
  pub edge: f32,
  /// 组合后整体乘上的系数
  pub penalty: f32,
}

/// 植物/花朵特征评分参数
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
  pub plant_bands: Vec<HsvBand>,
  /// 仅对屏幕校正图追加的宽绿色带，补偿显示器色偏
  pub screen_plant_bands: Vec<HsvBand>,
  pub flower_bands: Vec<HsvBand>,
  pub canny_low: f32,
  pub canny_high: f32,
  pub weights: Weights,
  pub screen_weights: Weights,
  pub flower_threshold: f32,
}

impl Default for FeatureConfig {
  fn default() -> Self {
    Self {
      plant_bands: vec![
        // 绿色
        HsvBand::new([25, 40, 40], [85, 255, 255]),
        // 棕色与黄绿色
        HsvBand::new([10, 30, 20], [30, 255, 180]),
      ],
      screen_plant_bands: vec![HsvBand::new([20, 20, 30], [95, 255, 255])],
      flower_bands: vec![
        // 红色跨越色相环两端
        HsvBand::new([0, 100, 100], [10, 255, 255]),
        HsvBand::new([160, 100, 100], [180, 255, 255]),
        // 粉色/紫色
        HsvBand::new([130, 50, 50], [170, 255, 255]),
        // 黄色
        HsvBand::new([20, 100, 100], [30, 255, 255]),
        // 白色
        HsvBand::new([0, 0, 200], [180, 30, 255]),
      ],
      canny_low: 100.0,
      canny_high: 200.0,
      weights: Weights {
        plant: 0.7,
        edge: 0.3,
        penalty: 1.0,
      },
      screen_weights: Weights {
        plant: 0.8,
        edge: 0.2,
        penalty: 0.9,
      },
      flower_threshold: 0.1,
    }
  }
}

/// 检测流水线的全部参数
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
  pub screen: ScreenConfig,
  pub normalize: NormalizeConfig,
  pub feature: FeatureConfig,
  /// 最终置信度放大系数，放大后截断到 [0, 1]
  pub confidence_boost: f32,
}

impl Default for DetectionConfig {
  fn default() -> Self {
    Self {
      screen: ScreenConfig::default(),
      normalize: NormalizeConfig::default(),
      feature: FeatureConfig::default(),
      confidence_boost: 1.5,
    }
  }
}

/// 识别服务参数
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
  /// 低于该置信度判定为非植物
  pub plant_threshold: f32,
  /// 平均亮度低于该值视为过暗
  pub min_brightness: f32,
  pub plant_id_endpoint: String,
  #[serde(skip_serializing)]
  pub plant_id_api_key: Option<String>,
}

impl Default for ServiceConfig {
  fn default() -> Self {
    Self {
      plant_threshold: 0.08,
      min_brightness: 10.0,
      plant_id_endpoint: "https://api.plant.id/v2/identify".to_string(),
      plant_id_api_key: None,
    }
  }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
  pub detection: DetectionConfig,
  pub service: ServiceConfig,
}

impl AppConfig {
  pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
    let path = path.as_ref();
    info!("加载配置文件: {}", path.display());
    let text = std::fs::read_to_string(path)?;
    let config: AppConfig = serde_json::from_str(&text)?;
    config.validate()?;
    Ok(config)
  }

  pub fn validate(&self) -> Result<(), ConfigError> {
    let screen = &self.detection.screen;
    if screen.block_size < 3 || screen.block_size % 2 == 0 {
      return Err(ConfigError::Invalid(format!(
        "自适应阈值邻域必须为不小于 3 的奇数, 实际为 {}",
        screen.block_size
      )));
    }
    if !(0.0..=1.0).contains(&self.service.plant_threshold) {
      return Err(ConfigError::Invalid(format!(
        "植物置信度阈值必须在 [0, 1] 内, 实际为 {}",
        self.service.plant_threshold
      )));
    }
    if self.detection.confidence_boost < 0.0 {
      return Err(ConfigError::Invalid("置信度放大系数不能为负".to_string()));
    }
    Ok(())
  }
}
