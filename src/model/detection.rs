// 该文件是 Lvye （绿野） 项目的一部分。
// src/model/detection.rs - 检测流程编排
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

use std::{borrow::Cow, convert::Infallible};

use image::RgbImage;
use tracing::{debug, info, warn};

use crate::{
  config::DetectionConfig,
  model::{
    DetectionOutcome, FeatureScore, Model, ScreenDetection, Scored,
    feature::{FeatureMasks, PlantFeatureScorer, ScoreVariant},
    normalize::ScreenNormalizer,
    screen::ScreenDetector,
  },
};

/// 一轮评分：先准备要评分的图像，再交给特征评分器。
pub trait ScoringPass: Send + Sync {
  fn name(&self) -> &'static str;

  /// 返回 `None` 表示本轮不适用于当前图像
  fn prepare<'a>(
    &self,
    image: &'a RgbImage,
    screen: &ScreenDetection,
  ) -> Option<Scored<Cow<'a, RgbImage>>>;

  fn scorer(&self) -> &PlantFeatureScorer;
}

/// 直接对原图评分
pub struct OriginalPass {
  scorer: PlantFeatureScorer,
}

impl OriginalPass {
  pub fn new(config: &DetectionConfig) -> Self {
    Self {
      scorer: PlantFeatureScorer::new(&config.feature, ScoreVariant::Original),
    }
  }
}

impl ScoringPass for OriginalPass {
  fn name(&self) -> &'static str {
    "original"
  }

  fn prepare<'a>(
    &self,
    image: &'a RgbImage,
    _screen: &ScreenDetection,
  ) -> Option<Scored<Cow<'a, RgbImage>>> {
    Some(Scored::Computed(Cow::Borrowed(image)))
  }

  fn scorer(&self) -> &PlantFeatureScorer {
    &self.scorer
  }
}

/// 检测到屏幕时，对校正后的屏幕区域评分
pub struct ScreenPass {
  normalizer: ScreenNormalizer,
  scorer: PlantFeatureScorer,
}

impl ScreenPass {
  pub fn new(config: &DetectionConfig) -> Self {
    Self {
      normalizer: ScreenNormalizer::new(config.normalize.clone()),
      scorer: PlantFeatureScorer::new(&config.feature, ScoreVariant::Screen),
    }
  }
}

impl ScoringPass for ScreenPass {
  fn name(&self) -> &'static str {
    "screen"
  }

  fn prepare<'a>(
    &self,
    image: &'a RgbImage,
    screen: &ScreenDetection,
  ) -> Option<Scored<Cow<'a, RgbImage>>> {
    if !screen.is_screen {
      return None;
    }
    let corners = screen.corners?;
    Some(self.normalizer.normalize(image, &corners).map(Cow::Owned))
  }

  fn scorer(&self) -> &PlantFeatureScorer {
    &self.scorer
  }
}

/// 单轮评分的完整记录
#[derive(Debug, Clone)]
pub struct PassReport {
  pub name: &'static str,
  /// 与原图不同时保存本轮实际评分的图像
  pub prepared: Option<RgbImage>,
  pub masks: FeatureMasks,
  pub features: FeatureScore,
  pub confidence: f32,
  pub has_flower: bool,
  pub degraded: bool,
}

/// 一次检测的全部中间结果
#[derive(Debug, Clone)]
pub struct Inspection {
  pub screen: Scored<ScreenDetection>,
  pub passes: Vec<PassReport>,
  pub outcome: DetectionOutcome,
}

/// 植物检测器：屏幕检测后依次执行各轮评分，取最大置信度，花朵标记取或。
pub struct PlantDetector {
  screen: ScreenDetector,
  passes: Vec<Box<dyn ScoringPass>>,
  confidence_boost: f32,
}

impl PlantDetector {
  pub fn new(config: &DetectionConfig) -> Self {
    Self::with_passes(
      config,
      vec![Box::new(ScreenPass::new(config)), Box::new(OriginalPass::new(config))],
    )
  }

  pub fn with_passes(config: &DetectionConfig, passes: Vec<Box<dyn ScoringPass>>) -> Self {
    Self {
      screen: ScreenDetector::new(config.screen.clone()),
      passes,
      confidence_boost: config.confidence_boost,
    }
  }

  pub fn inspect(&self, image: &RgbImage) -> Inspection {
    let screen = self.screen.detect(image);
    if let Some(reason) = screen.reason() {
      warn!("屏幕检测回退: {}", reason);
    }

    let mut passes = Vec::with_capacity(self.passes.len());
    for pass in &self.passes {
      let Some(prepared) = pass.prepare(image, screen.value()) else {
        debug!("跳过评分轮次: {}", pass.name());
        continue;
      };
      let mut degraded = prepared.is_degraded();
      if let Some(reason) = prepared.reason() {
        warn!("评分轮次 {} 预处理回退: {}", pass.name(), reason);
      }
      let prepared = prepared.into_value();

      let masks = pass.scorer().masks(&prepared);
      degraded |= masks.is_degraded();
      let masks = masks.into_value();
      let features = masks.score();
      let confidence = pass.scorer().confidence(&features);
      let has_flower = pass.scorer().has_flower(&features);

      passes.push(PassReport {
        name: pass.name(),
        prepared: match prepared {
          Cow::Owned(image) => Some(image),
          Cow::Borrowed(_) => None,
        },
        masks,
        features,
        confidence,
        has_flower,
        degraded,
      });
    }

    let outcome = self.combine(screen.value(), screen.is_degraded(), &passes);
    info!(
      "检测完成: 置信度 {:.4}, 花朵 {}, 屏幕 {}, 回退 {}",
      outcome.confidence, outcome.has_flower, outcome.is_on_screen, outcome.degraded
    );

    Inspection {
      screen,
      passes,
      outcome,
    }
  }

  fn combine(
    &self,
    screen: &ScreenDetection,
    screen_degraded: bool,
    passes: &[PassReport],
  ) -> DetectionOutcome {
    let best = passes.iter().map(|p| p.confidence).fold(0.0f32, f32::max);
    let boosted = best * self.confidence_boost;
    let confidence = if boosted.is_finite() {
      boosted.clamp(0.0, 1.0)
    } else {
      0.0
    };

    DetectionOutcome {
      confidence,
      has_flower: passes.iter().any(|p| p.has_flower),
      is_on_screen: screen.is_screen,
      degraded: screen_degraded || passes.iter().any(|p| p.degraded),
    }
  }
}

impl Model for PlantDetector {
  type Input = RgbImage;
  type Output = DetectionOutcome;
  type Error = Infallible;

  fn infer(&self, input: &Self::Input) -> Result<Self::Output, Self::Error> {
    Ok(self.inspect(input).outcome)
  }
}

/// 保留全部中间结果的检测器视图，供调试输出使用
pub struct Inspector<'a>(pub &'a PlantDetector);

impl Model for Inspector<'_> {
  type Input = RgbImage;
  type Output = Inspection;
  type Error = Infallible;

  fn infer(&self, input: &Self::Input) -> Result<Self::Output, Self::Error> {
    Ok(self.0.inspect(input))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::test_utils::{LEAF_GREEN, MID_GRAY, centered_quad, noise_image, solid};
  use image::Rgb;

  fn detector() -> PlantDetector {
    PlantDetector::new(&DetectionConfig::default())
  }

  #[test]
  fn mid_gray_scores_zero() {
    let outcome = detector().infer(&solid(64, 64, MID_GRAY)).unwrap();
    assert_eq!(outcome.confidence, 0.0);
    assert!(!outcome.has_flower);
    assert!(!outcome.is_on_screen);
    assert!(!outcome.degraded);
  }

  #[test]
  fn solid_green_is_boosted_then_clamped() {
    let inspection = detector().inspect(&solid(64, 64, LEAF_GREEN));
    assert_eq!(inspection.passes.len(), 1);
    let pass = &inspection.passes[0];
    assert_eq!(pass.name, "original");
    assert!((pass.confidence - 0.7).abs() < 1e-6);
    // 0.7 * 1.5 = 1.05，截断到 1
    assert_eq!(inspection.outcome.confidence, 1.0);
  }

  #[test]
  fn boost_below_one_is_not_clamped() {
    let config = DetectionConfig {
      confidence_boost: 1.0,
      ..DetectionConfig::default()
    };
    let outcome = PlantDetector::new(&config).infer(&solid(64, 64, LEAF_GREEN)).unwrap();
    assert!((outcome.confidence - 0.7).abs() < 1e-6);
  }

  #[test]
  fn screen_runs_both_passes() {
    let (image, _) = centered_quad(200, 155, LEAF_GREEN, Rgb([30, 30, 30]));
    let inspection = detector().inspect(&image);
    assert!(inspection.outcome.is_on_screen);
    let names: Vec<_> = inspection.passes.iter().map(|p| p.name).collect();
    assert_eq!(names, vec!["screen", "original"]);
    assert!(inspection.passes[0].prepared.is_some());
    assert!(inspection.passes[1].prepared.is_none());

    let best = inspection
      .passes
      .iter()
      .map(|p| p.confidence)
      .fold(0.0f32, f32::max);
    let expected = (best * 1.5).clamp(0.0, 1.0);
    assert!((inspection.outcome.confidence - expected).abs() < 1e-6);
  }

  #[test]
  fn flower_flag_is_ored_across_passes() {
    struct FlowerPass(PlantFeatureScorer);
    impl ScoringPass for FlowerPass {
      fn name(&self) -> &'static str {
        "flower"
      }
      fn prepare<'a>(
        &self,
        _image: &'a RgbImage,
        _screen: &ScreenDetection,
      ) -> Option<Scored<Cow<'a, RgbImage>>> {
        Some(Scored::Computed(Cow::Owned(solid(16, 16, Rgb([220, 30, 40])))))
      }
      fn scorer(&self) -> &PlantFeatureScorer {
        &self.0
      }
    }

    let config = DetectionConfig::default();
    let flower = FlowerPass(PlantFeatureScorer::new(&config.feature, ScoreVariant::Original));
    let detector = PlantDetector::with_passes(
      &config,
      vec![Box::new(OriginalPass::new(&config)), Box::new(flower)],
    );
    let outcome = detector.infer(&solid(32, 32, LEAF_GREEN)).unwrap();
    assert!(outcome.has_flower);
    assert_eq!(outcome.confidence, 1.0);
  }

  #[test]
  fn empty_image_is_degraded_zero() {
    let outcome = detector().infer(&RgbImage::new(0, 0)).unwrap();
    assert_eq!(outcome.confidence, 0.0);
    assert!(!outcome.has_flower);
    assert!(!outcome.is_on_screen);
    assert!(outcome.degraded);
  }

  #[test]
  fn repeated_runs_are_identical() {
    let image = noise_image(96, 80, 0, 255, 3);
    let detector = detector();
    let first = detector.infer(&image).unwrap();
    let second = detector.infer(&image).unwrap();
    assert_eq!(first, second);
  }

  #[test]
  fn inspector_matches_plain_inference() {
    let detector = detector();
    let image = solid(32, 32, LEAF_GREEN);
    let inspection = Inspector(&detector).infer(&image).unwrap();
    assert_eq!(inspection.outcome, detector.infer(&image).unwrap());
    assert!(!inspection.screen.value().is_screen);
  }

  #[test]
  fn confidence_is_always_in_unit_range() {
    let detector = detector();
    for seed in 1..6 {
      let outcome = detector.infer(&noise_image(64, 64, 0, 255, seed)).unwrap();
      assert!((0.0..=1.0).contains(&outcome.confidence));
    }
  }
}
