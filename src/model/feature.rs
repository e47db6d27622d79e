// 该文件是 Lvye （绿野） 项目的一部分。
// src/model/feature.rs - 植物与花朵特征评分
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

use image::{GrayImage, RgbImage, imageops};
use imageproc::edges::canny;
use tracing::{debug, warn};

use crate::{
  config::{FeatureConfig, Weights},
  model::{
    FeatureScore, Scored,
    color::{HsvBand, band_mask, mask_ratio, to_hsv},
  },
};

// Canny 需要 3x3 邻域
const MIN_SIDE: u32 = 3;

/// 评分对象：原图，或经过屏幕校正的图像
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreVariant {
  Original,
  Screen,
}

/// 评分过程中的中间掩码
#[derive(Debug, Clone)]
pub struct FeatureMasks {
  pub plant: GrayImage,
  pub flower: GrayImage,
  pub edges: GrayImage,
}

impl FeatureMasks {
  fn empty(width: u32, height: u32) -> Self {
    Self {
      plant: GrayImage::new(width, height),
      flower: GrayImage::new(width, height),
      edges: GrayImage::new(width, height),
    }
  }

  pub fn score(&self) -> FeatureScore {
    FeatureScore {
      plant_ratio: mask_ratio(&self.plant),
      edge_ratio: mask_ratio(&self.edges),
      flower_ratio: mask_ratio(&self.flower),
    }
  }
}

#[derive(Debug, Clone)]
pub struct PlantFeatureScorer {
  plant_bands: Vec<HsvBand>,
  flower_bands: Vec<HsvBand>,
  canny_low: f32,
  canny_high: f32,
  weights: Weights,
  flower_threshold: f32,
  variant: ScoreVariant,
}

impl PlantFeatureScorer {
  pub fn new(config: &FeatureConfig, variant: ScoreVariant) -> Self {
    let mut plant_bands = config.plant_bands.clone();
    let weights = match variant {
      ScoreVariant::Original => config.weights,
      ScoreVariant::Screen => {
        plant_bands.extend(config.screen_plant_bands.iter().copied());
        config.screen_weights
      }
    };

    Self {
      plant_bands,
      flower_bands: config.flower_bands.clone(),
      canny_low: config.canny_low,
      canny_high: config.canny_high,
      weights,
      flower_threshold: config.flower_threshold,
      variant,
    }
  }

  pub fn masks(&self, image: &RgbImage) -> Scored<FeatureMasks> {
    let (width, height) = image.dimensions();
    if width < MIN_SIDE || height < MIN_SIDE {
      warn!("特征评分: 图像尺寸 {}x{} 过小，返回空掩码", width, height);
      return Scored::degraded(FeatureMasks::empty(width, height), "图像尺寸过小");
    }

    let hsv = to_hsv(image);
    let plant = band_mask(&hsv, &self.plant_bands);
    let flower = band_mask(&hsv, &self.flower_bands);
    let edges = canny(&imageops::grayscale(image), self.canny_low, self.canny_high);

    Scored::Computed(FeatureMasks {
      plant,
      flower,
      edges,
    })
  }

  pub fn score(&self, image: &RgbImage) -> Scored<FeatureScore> {
    self.masks(image).map(|masks| masks.score())
  }

  /// 按权重组合植物占比与边缘占比
  pub fn confidence(&self, score: &FeatureScore) -> f32 {
    let combined = score.plant_ratio * self.weights.plant + score.edge_ratio * self.weights.edge;
    let confidence = combined * self.weights.penalty;
    debug!(
      "特征评分({:?}): 植物 {:.4}, 边缘 {:.4}, 花朵 {:.4} -> {:.4}",
      self.variant, score.plant_ratio, score.edge_ratio, score.flower_ratio, confidence
    );
    if confidence.is_finite() { confidence } else { 0.0 }
  }

  pub fn has_flower(&self, score: &FeatureScore) -> bool {
    score.flower_ratio > self.flower_threshold
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::test_utils::{LEAF_GREEN, MID_GRAY, solid};
  use image::Rgb;

  fn scorer(variant: ScoreVariant) -> PlantFeatureScorer {
    PlantFeatureScorer::new(&FeatureConfig::default(), variant)
  }

  #[test]
  fn mid_gray_has_no_plant_or_flower() {
    let scorer = scorer(ScoreVariant::Original);
    let score = scorer.score(&solid(64, 64, MID_GRAY)).into_value();
    assert_eq!(score.plant_ratio, 0.0);
    assert_eq!(score.flower_ratio, 0.0);
    assert_eq!(score.edge_ratio, 0.0);
    assert!(!scorer.has_flower(&score));
    assert_eq!(scorer.confidence(&score), 0.0);
  }

  #[test]
  fn brown_falls_in_secondary_plant_band() {
    // HSV 约为 (17, 191, 120)：不在主绿色带，落在棕/黄绿色带
    let brown = solid(32, 32, Rgb([120, 80, 30]));
    let score = scorer(ScoreVariant::Original).score(&brown).into_value();
    assert!((score.plant_ratio - 1.0).abs() < 1e-6);
    assert_eq!(score.flower_ratio, 0.0);
  }

  #[test]
  fn gray_confidence_comes_only_from_edges() {
    let scorer = scorer(ScoreVariant::Original);
    let score = FeatureScore {
      plant_ratio: 0.0,
      edge_ratio: 0.5,
      flower_ratio: 0.0,
    };
    assert!((scorer.confidence(&score) - 0.15).abs() < 1e-6);
  }

  #[test]
  fn solid_green_is_all_plant() {
    let scorer = scorer(ScoreVariant::Original);
    let score = scorer.score(&solid(64, 64, LEAF_GREEN));
    assert!(!score.is_degraded());
    let score = score.into_value();
    assert!((score.plant_ratio - 1.0).abs() < 1e-6);
    assert_eq!(score.edge_ratio, 0.0);
    assert!((scorer.confidence(&score) - 0.7).abs() < 1e-6);
  }

  #[test]
  fn screen_variant_reweights_and_penalizes() {
    let scorer = scorer(ScoreVariant::Screen);
    let score = FeatureScore {
      plant_ratio: 1.0,
      edge_ratio: 0.5,
      flower_ratio: 0.0,
    };
    // (0.8 + 0.1) * 0.9
    assert!((scorer.confidence(&score) - 0.81).abs() < 1e-6);
  }

  #[test]
  fn screen_variant_accepts_shifted_greens() {
    // HSV 约为 (90, 102, 200)：超出常规绿色带，落在屏幕宽绿色带内
    let teal = solid(32, 32, Rgb([120, 200, 200]));
    let original = scorer(ScoreVariant::Original).score(&teal).into_value();
    let screen = scorer(ScoreVariant::Screen).score(&teal).into_value();
    assert_eq!(original.plant_ratio, 0.0);
    assert!((screen.plant_ratio - 1.0).abs() < 1e-6);
  }

  #[test]
  fn flower_threshold_is_strict() {
    let scorer = scorer(ScoreVariant::Original);
    let at = FeatureScore {
      flower_ratio: 0.1,
      ..FeatureScore::default()
    };
    let above = FeatureScore {
      flower_ratio: 0.11,
      ..FeatureScore::default()
    };
    assert!(!scorer.has_flower(&at));
    assert!(scorer.has_flower(&above));
  }

  #[test]
  fn red_bloom_sets_flower_mask() {
    let mut image = solid(40, 40, LEAF_GREEN);
    for y in 10..30 {
      for x in 10..30 {
        image.put_pixel(x, y, Rgb([220, 30, 40]));
      }
    }
    let scorer = scorer(ScoreVariant::Original);
    let score = scorer.score(&image).into_value();
    assert!((score.flower_ratio - 0.25).abs() < 1e-6);
    assert!(scorer.has_flower(&score));
  }

  #[test]
  fn tiny_image_degrades_to_zero() {
    let score = scorer(ScoreVariant::Original).score(&solid(2, 2, LEAF_GREEN));
    assert!(score.is_degraded());
    assert_eq!(*score.value(), FeatureScore::default());
  }
}
