// 该文件是 Lvye （绿野） 项目的一部分。
// src/model/normalize.rs - 屏幕区域光度校正
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

use image::{GrayImage, Luma, Rgb, RgbImage};
use imageproc::{distance_transform::Norm, drawing::draw_polygon_mut, morphology::dilate, point::Point};
use tracing::{debug, warn};

use crate::{
  config::NormalizeConfig,
  model::{
    Scored,
    clahe::Clahe,
    color::{from_lab, lightness, rgb_to_hsv, to_lab, with_lightness},
    geometry::is_valid_quad,
    inpaint::inpaint,
  },
};

/// 屏幕区域校正：遮罩、亮度均衡、去反光
#[derive(Debug, Clone)]
pub struct ScreenNormalizer {
  config: NormalizeConfig,
}

impl ScreenNormalizer {
  pub fn new(config: NormalizeConfig) -> Self {
    Self { config }
  }

  pub fn normalize(&self, image: &RgbImage, corners: &[Point<i32>; 4]) -> Scored<RgbImage> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
      warn!("屏幕校正: 图像为空，返回原图");
      return Scored::degraded(image.clone(), "空图像");
    }

    let mask = region_mask(width, height, corners);
    let masked = apply_mask(image, &mask);

    // 只均衡亮度通道，色度保持不变
    let lab = to_lab(&masked);
    let clahe = Clahe::new(self.config.clahe_clip_limit, self.config.clahe_tiles);
    let enhanced = from_lab(&with_lightness(&lab, &clahe.apply(&lightness(&lab))));

    let reflection = self.reflection_mask(&enhanced);
    let reflection = dilate(&reflection, Norm::LInf, self.config.dilate_radius);
    let reflective = reflection.pixels().filter(|p| p[0] > 0).count();
    debug!("屏幕校正: {} 个反光像素待修复", reflective);
    if reflective == 0 {
      return Scored::Computed(enhanced);
    }

    Scored::Computed(inpaint(&enhanced, &reflection, self.config.inpaint_radius))
  }

  /// 低饱和且高亮度的像素
  fn reflection_mask(&self, image: &RgbImage) -> GrayImage {
    let mut mask = GrayImage::new(image.width(), image.height());
    for (src, dst) in image.pixels().zip(mask.pixels_mut()) {
      let [_, s, v] = rgb_to_hsv(src.0);
      if s < self.config.reflection_max_saturation && v > self.config.reflection_min_value {
        *dst = Luma([255]);
      }
    }
    mask
  }
}

/// 四边形内部为 255 的掩码；角点退化时覆盖整幅图像
fn region_mask(width: u32, height: u32, corners: &[Point<i32>; 4]) -> GrayImage {
  if !is_valid_quad(corners) {
    debug!("屏幕校正: 角点无效 {:?}，使用整幅图像", corners);
    return GrayImage::from_pixel(width, height, Luma([255]));
  }
  let mut mask = GrayImage::new(width, height);
  draw_polygon_mut(&mut mask, corners, Luma([255]));
  mask
}

fn apply_mask(image: &RgbImage, mask: &GrayImage) -> RgbImage {
  let mut out = image.clone();
  for (dst, m) in out.pixels_mut().zip(mask.pixels()) {
    if m[0] == 0 {
      *dst = Rgb([0, 0, 0]);
    }
  }
  out
}
