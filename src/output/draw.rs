// 该文件是 Lvye （绿野） 项目的一部分。
// src/output/draw.rs - 检测结果可视化
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

use image::{GrayImage, Rgb, RgbImage};
use imageproc::{drawing::draw_line_segment_mut, point::Point};

const OUTLINE_COLOR: [u8; 3] = [255, 0, 255]; // 品红，和植物/花朵的颜色都不冲突
const OUTLINE_WIDTH: i32 = 2;

/// 在图像上描出屏幕四边形
pub fn draw_screen_outline(image: &RgbImage, corners: &[Point<i32>; 4]) -> RgbImage {
  let mut out = image.clone();
  for i in 0..corners.len() {
    let a = corners[i];
    let b = corners[(i + 1) % corners.len()];
    for d in 0..OUTLINE_WIDTH {
      draw_line_segment_mut(
        &mut out,
        ((a.x + d) as f32, (a.y + d) as f32),
        ((b.x + d) as f32, (b.y + d) as f32),
        Rgb(OUTLINE_COLOR),
      );
    }
  }
  out
}

/// 把掩码叠加到原图上，掩码内像素替换为 `color`
pub fn overlay_mask(image: &RgbImage, mask: &GrayImage, color: [u8; 3]) -> RgbImage {
  let mut out = image.clone();
  if mask.dimensions() != image.dimensions() {
    return out;
  }
  for (dst, m) in out.pixels_mut().zip(mask.pixels()) {
    if m[0] > 0 {
      *dst = Rgb(color);
    }
  }
  out
}
