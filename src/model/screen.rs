// 该文件是 Lvye （绿野） 项目的一部分。
// src/model/screen.rs - 屏幕翻拍检测
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

use image::{GrayImage, ImageBuffer, Luma, RgbImage, imageops};
use imageproc::{
  contours::{BorderType, find_contours},
  filter::{gaussian_blur_f32, laplacian_filter},
  geometry::{approximate_polygon_dp, arc_length, contour_area},
  point::Point,
};
use tracing::{debug, warn};

use crate::{
  config::ScreenConfig,
  model::{
    ScreenDetection, Scored,
    geometry::full_frame,
  },
};

type GrayF32 = ImageBuffer<Luma<f32>, Vec<f32>>;

/// 判断照片主体本身是否是一块显示屏
#[derive(Debug, Clone)]
pub struct ScreenDetector {
  config: ScreenConfig,
}

impl ScreenDetector {
  pub fn new(config: ScreenConfig) -> Self {
    Self { config }
  }

  pub fn detect(&self, image: &RgbImage) -> Scored<ScreenDetection> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
      warn!("屏幕检测: 图像为空，按非屏幕处理");
      return Scored::degraded(ScreenDetection::none(), "空图像");
    }
    if self.config.block_size < 3 {
      warn!("屏幕检测: 自适应阈值邻域过小 {}", self.config.block_size);
      return Scored::degraded(ScreenDetection::none(), "自适应阈值邻域过小");
    }

    let gray = imageops::grayscale(image);

    if let Some(corners) = self.find_quad(&gray) {
      debug!("屏幕检测: 找到四边形 {:?}", corners);
      return Scored::Computed(ScreenDetection::with_corners(corners));
    }

    let (texture, glare) = self.texture_and_glare(&gray);
    debug!("屏幕检测: 纹理均值 {:.3}, 反光占比 {:.4}", texture, glare);
    if texture > self.config.texture_threshold
      && glare > self.config.glare_min_ratio
      && glare < self.config.glare_max_ratio
    {
      debug!("屏幕检测: 纹理与反光特征命中，使用整幅图像");
      return Scored::Computed(ScreenDetection::with_corners(full_frame(width, height)));
    }

    Scored::Computed(ScreenDetection::none())
  }

  /// 高斯加权的自适应阈值，高于邻域均值减偏移的像素置 255
  fn adaptive_threshold(&self, gray: &GrayImage) -> GrayImage {
    let sigma = 0.3 * ((self.config.block_size as f32 - 1.0) * 0.5 - 1.0) + 0.8;
    let gray_f = GrayF32::from_fn(gray.width(), gray.height(), |x, y| {
      Luma([f32::from(gray.get_pixel(x, y)[0])])
    });
    let local_mean = gaussian_blur_f32(&gray_f, sigma);
    let mut binary = GrayImage::new(gray.width(), gray.height());
    for ((src, mean), dst) in gray.pixels().zip(local_mean.pixels()).zip(binary.pixels_mut()) {
      if f32::from(src[0]) > mean[0] - self.config.offset {
        *dst = Luma([255]);
      }
    }
    binary
  }

  fn find_quad(&self, gray: &GrayImage) -> Option<[Point<i32>; 4]> {
    let (width, height) = gray.dimensions();
    let image_area = f64::from(width) * f64::from(height);
    let binary = self.adaptive_threshold(gray);

    // 贴着图像边缘的轮廓是背景而不是屏幕
    let mut candidates: Vec<(f64, Vec<Point<i32>>)> = find_contours::<i32>(&binary)
      .into_iter()
      .filter(|contour| contour.border_type == BorderType::Outer)
      .filter(|contour| !touches_border(&contour.points, width, height))
      .map(|contour| (contour_area(&contour.points), contour.points))
      .collect();
    candidates.sort_by(|a, b| b.0.total_cmp(&a.0));
    candidates.truncate(self.config.max_candidates);
    debug!("屏幕检测: {} 个候选轮廓", candidates.len());

    for (area, points) in candidates {
      let epsilon = self.config.approx_tolerance * arc_length(&points, true);
      // 容差为 0 时 `approximate_polygon_dp` 会 panic
      if points.len() < 3 || epsilon <= 0.0 {
        continue;
      }
      let polygon = approximate_polygon_dp(&points, epsilon, true);
      let ratio = area / image_area;
      if polygon.len() == 4 && ratio > self.config.min_area_ratio && ratio < self.config.max_area_ratio {
        return Some([polygon[0], polygon[1], polygon[2], polygon[3]]);
      }
    }
    None
  }

  /// 拉普拉斯绝对响应均值与近白像素占比
  fn texture_and_glare(&self, gray: &GrayImage) -> (f32, f32) {
    let total = gray.width() as usize * gray.height() as usize;
    if total == 0 {
      return (0.0, 0.0);
    }
    let laplacian = laplacian_filter(gray);
    let texture =
      laplacian.pixels().map(|p| f64::from(p[0]).abs()).sum::<f64>() / total as f64;
    let glare = gray.pixels().filter(|p| p[0] >= self.config.glare_level).count();
    (texture as f32, glare as f32 / total as f32)
  }
}

fn touches_border(points: &[Point<i32>], width: u32, height: u32) -> bool {
  let right = width as i32 - 1;
  let bottom = height as i32 - 1;
  points
    .iter()
    .any(|p| p.x <= 0 || p.y <= 0 || p.x >= right || p.y >= bottom)
}
