// 该文件是 Lvye （绿野） 项目的一部分。
// src/model/color.rs - 色彩空间转换与色带掩码
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
use palette::{FromColor, Hsv, Lab, Srgb};
use serde::{Deserialize, Serialize};

/// 以 `Rgb<u8>` 缓冲区存放的 HSV 图像，通道依次为 H、S、V。
/// H 取值 [0, 180)，S 与 V 取值 [0, 255]。
pub type HsvImage = RgbImage;

/// 以 `Rgb<u8>` 缓冲区存放的 Lab 图像，通道依次为 L、a、b。
/// L 缩放到 [0, 255]，a 与 b 偏移 128。
pub type LabImage = RgbImage;

// OpenCV 8 位约定：H 减半，L 缩放到 [0, 255]，a/b 偏移 128
const HUE_SCALE: f32 = 0.5;
const L_SCALE: f32 = 255.0 / 100.0;
const AB_OFFSET: f32 = 128.0;

fn to_u8(value: f32) -> u8 {
  value.round().clamp(0.0, 255.0) as u8
}

fn srgb(pixel: [u8; 3]) -> Srgb {
  Srgb::new(pixel[0], pixel[1], pixel[2]).into_format()
}

pub fn rgb_to_hsv(pixel: [u8; 3]) -> [u8; 3] {
  let hsv: Hsv = Hsv::from_color(srgb(pixel));
  let h = (hsv.hue.into_positive_degrees() * HUE_SCALE).round() as u16 % 180;
  [h as u8, to_u8(hsv.saturation * 255.0), to_u8(hsv.value * 255.0)]
}

pub fn to_hsv(image: &RgbImage) -> HsvImage {
  let mut hsv = RgbImage::new(image.width(), image.height());
  for (src, dst) in image.pixels().zip(hsv.pixels_mut()) {
    *dst = Rgb(rgb_to_hsv(src.0));
  }
  hsv
}

pub fn rgb_to_lab(pixel: [u8; 3]) -> [u8; 3] {
  let lab: Lab = Lab::from_color(srgb(pixel));
  [
    to_u8(lab.l * L_SCALE),
    to_u8(lab.a + AB_OFFSET),
    to_u8(lab.b + AB_OFFSET),
  ]
}

pub fn lab_to_rgb(pixel: [u8; 3]) -> [u8; 3] {
  let lab: Lab = Lab::new(
    f32::from(pixel[0]) / L_SCALE,
    f32::from(pixel[1]) - AB_OFFSET,
    f32::from(pixel[2]) - AB_OFFSET,
  );
  let rgb: Srgb = Srgb::from_color(lab);
  [rgb.red, rgb.green, rgb.blue].map(|c| to_u8(c.clamp(0.0, 1.0) * 255.0))
}

pub fn to_lab(image: &RgbImage) -> LabImage {
  let mut lab = RgbImage::new(image.width(), image.height());
  for (src, dst) in image.pixels().zip(lab.pixels_mut()) {
    *dst = Rgb(rgb_to_lab(src.0));
  }
  lab
}

pub fn from_lab(lab: &LabImage) -> RgbImage {
  let mut rgb = RgbImage::new(lab.width(), lab.height());
  for (src, dst) in lab.pixels().zip(rgb.pixels_mut()) {
    *dst = Rgb(lab_to_rgb(src.0));
  }
  rgb
}

/// 取出 Lab 图像的亮度通道
pub fn lightness(lab: &LabImage) -> GrayImage {
  GrayImage::from_fn(lab.width(), lab.height(), |x, y| Luma([lab.get_pixel(x, y)[0]]))
}

/// 用新的亮度通道替换 Lab 图像的 L 分量，色度保持不变
pub fn with_lightness(lab: &LabImage, l: &GrayImage) -> LabImage {
  let mut out = lab.clone();
  for (dst, src) in out.pixels_mut().zip(l.pixels()) {
    dst[0] = src[0];
  }
  out
}

/// HSV 色带，闭区间 `[lower, upper]`，与 OpenCV `inRange` 语义一致
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HsvBand {
  pub lower: [u8; 3],
  pub upper: [u8; 3],
}

impl HsvBand {
  pub const fn new(lower: [u8; 3], upper: [u8; 3]) -> Self {
    Self { lower, upper }
  }

  pub fn contains(&self, hsv: [u8; 3]) -> bool {
    (0..3).all(|c| self.lower[c] <= hsv[c] && hsv[c] <= self.upper[c])
  }
}

/// 构建所有色带的并集掩码，命中像素为 255
pub fn band_mask(hsv: &HsvImage, bands: &[HsvBand]) -> GrayImage {
  let mut mask = GrayImage::new(hsv.width(), hsv.height());
  for (src, dst) in hsv.pixels().zip(mask.pixels_mut()) {
    if bands.iter().any(|band| band.contains(src.0)) {
      *dst = Luma([255]);
    }
  }
  mask
}

/// 掩码中非零像素所占比例，空图像返回 0
pub fn mask_ratio(mask: &GrayImage) -> f32 {
  let total = mask.width() as usize * mask.height() as usize;
  if total == 0 {
    return 0.0;
  }
  let set = mask.pixels().filter(|p| p[0] > 0).count();
  set as f32 / total as f32
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn hsv_follows_opencv_scale() {
    assert_eq!(rgb_to_hsv([255, 0, 0]), [0, 255, 255]);
    assert_eq!(rgb_to_hsv([0, 255, 0]), [60, 255, 255]);
    assert_eq!(rgb_to_hsv([0, 0, 255]), [120, 255, 255]);
    assert_eq!(rgb_to_hsv([128, 128, 128]), [0, 0, 128]);
    assert_eq!(rgb_to_hsv([0, 0, 0]), [0, 0, 0]);
    // 棕色：约 33°，落在次级植物色带
    assert_eq!(rgb_to_hsv([120, 80, 30]), [17, 191, 120]);
  }

  #[test]
  fn hsv_hue_wraps_below_180() {
    // 接近纯红的洋红色，色相约 359°
    let [h, _, _] = rgb_to_hsv([255, 0, 4]);
    assert!(h < 180);
  }

  #[test]
  fn lab_keeps_gray_neutral() {
    let [l, a, b] = rgb_to_lab([128, 128, 128]);
    assert!((i32::from(a) - 128).abs() <= 1);
    assert!((i32::from(b) - 128).abs() <= 1);
    assert!(l > 120 && l < 145);
    assert_eq!(rgb_to_lab([255, 255, 255])[0], 255);
    assert_eq!(rgb_to_lab([0, 0, 0])[0], 0);
  }

  #[test]
  fn lab_conversion_is_close_to_lossless() {
    for pixel in [[40u8, 160, 40], [200, 30, 60], [250, 250, 250], [12, 80, 190]] {
      let back = lab_to_rgb(rgb_to_lab(pixel));
      for c in 0..3 {
        assert!(
          (i32::from(back[c]) - i32::from(pixel[c])).abs() <= 4,
          "{:?} -> {:?}",
          pixel,
          back
        );
      }
    }
  }

  #[test]
  fn band_mask_is_union_of_bands() {
    let mut hsv = HsvImage::new(3, 1);
    hsv.put_pixel(0, 0, Rgb([60, 200, 200]));
    hsv.put_pixel(1, 0, Rgb([5, 200, 200]));
    hsv.put_pixel(2, 0, Rgb([100, 10, 10]));
    let bands = [
      HsvBand::new([25, 40, 40], [85, 255, 255]),
      HsvBand::new([0, 100, 100], [10, 255, 255]),
    ];
    let mask = band_mask(&hsv, &bands);
    assert_eq!(mask.get_pixel(0, 0)[0], 255);
    assert_eq!(mask.get_pixel(1, 0)[0], 255);
    assert_eq!(mask.get_pixel(2, 0)[0], 0);
    assert!((mask_ratio(&mask) - 2.0 / 3.0).abs() < 1e-6);
  }

  #[test]
  fn mask_ratio_of_empty_image_is_zero() {
    assert_eq!(mask_ratio(&GrayImage::new(0, 0)), 0.0);
  }
}
