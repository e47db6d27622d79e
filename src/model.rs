// 该文件是 Lvye （绿野） 项目的一部分。
// src/model.rs - 启发式植物检测模型
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

use imageproc::point::Point;
use serde::Serialize;

pub trait Model {
  type Input;
  type Output;
  type Error;

  fn infer(&self, input: &Self::Input) -> Result<Self::Output, Self::Error>;
}

/// 单个步骤的结果。
///
/// `Degraded` 表示步骤内部失败并回退到了保守的默认值，
/// 调用方据此区分“算出来是 0”和“失败后默认为 0”。
#[derive(Debug, Clone, PartialEq)]
pub enum Scored<T> {
  Computed(T),
  Degraded { value: T, reason: String },
}

impl<T> Scored<T> {
  pub fn degraded(value: T, reason: impl Into<String>) -> Self {
    Scored::Degraded {
      value,
      reason: reason.into(),
    }
  }

  pub fn value(&self) -> &T {
    match self {
      Scored::Computed(value) | Scored::Degraded { value, .. } => value,
    }
  }

  pub fn into_value(self) -> T {
    match self {
      Scored::Computed(value) | Scored::Degraded { value, .. } => value,
    }
  }

  pub fn is_degraded(&self) -> bool {
    matches!(self, Scored::Degraded { .. })
  }

  pub fn reason(&self) -> Option<&str> {
    match self {
      Scored::Computed(_) => None,
      Scored::Degraded { reason, .. } => Some(reason),
    }
  }

  pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Scored<U> {
    match self {
      Scored::Computed(value) => Scored::Computed(f(value)),
      Scored::Degraded { value, reason } => Scored::Degraded {
        value: f(value),
        reason,
      },
    }
  }
}

/// 颜色与边缘特征，均为像素占比
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct FeatureScore {
  pub plant_ratio: f32,
  pub edge_ratio: f32,
  pub flower_ratio: f32,
}

/// 屏幕检测结果。检测到屏幕时 `corners` 为四边形角点，
/// 仅凭纹理/反光判定时为整幅图像的四角。
#[derive(Debug, Clone, PartialEq)]
pub struct ScreenDetection {
  pub is_screen: bool,
  pub corners: Option<[Point<i32>; 4]>,
}

impl ScreenDetection {
  pub fn none() -> Self {
    Self {
      is_screen: false,
      corners: None,
    }
  }

  pub fn with_corners(corners: [Point<i32>; 4]) -> Self {
    Self {
      is_screen: true,
      corners: Some(corners),
    }
  }

  pub fn corners_xy(&self) -> Option<[[i32; 2]; 4]> {
    self.corners.map(|c| c.map(|p| [p.x, p.y]))
  }
}

/// 最终检测结论
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct DetectionOutcome {
  pub confidence: f32,
  pub has_flower: bool,
  pub is_on_screen: bool,
  /// 任一步骤回退到默认值
  pub degraded: bool,
}

pub mod clahe;
pub mod color;
pub mod geometry;
pub mod inpaint;

mod detection;
mod feature;
mod normalize;
mod screen;

pub use self::detection::{
  Inspection, Inspector, OriginalPass, PassReport, PlantDetector, ScoringPass, ScreenPass,
};
pub use self::feature::{FeatureMasks, PlantFeatureScorer, ScoreVariant};
pub use self::normalize::ScreenNormalizer;
pub use self::screen::ScreenDetector;
