// 该文件是 Lvye （绿野） 项目的一部分。
// src/test_utils.rs - 单元测试共用的合成图像
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

use image::{Rgb, RgbImage};
use imageproc::point::Point;

pub(crate) const MID_GRAY: Rgb<u8> = Rgb([128, 128, 128]);
/// HSV 约为 (60, 191, 160)，位于绿色带中
pub(crate) const LEAF_GREEN: Rgb<u8> = Rgb([40, 160, 40]);

pub(crate) fn solid(width: u32, height: u32, color: Rgb<u8>) -> RgbImage {
  RgbImage::from_pixel(width, height, color)
}

/// xorshift 生成的确定性噪声，取值 `[low, high)`
pub(crate) fn noise_image(width: u32, height: u32, low: u8, high: u8, seed: u32) -> RgbImage {
  let mut state = seed.max(1);
  let span = u32::from(high - low);
  let mut next = move || {
    state ^= state << 13;
    state ^= state >> 17;
    state ^= state << 5;
    low + (state % span) as u8
  };
  RgbImage::from_fn(width, height, |_, _| Rgb([next(), next(), next()]))
}

/// 居中的实心正方形及其四个角点
pub(crate) fn centered_quad(
  size: u32,
  side: u32,
  inside: Rgb<u8>,
  outside: Rgb<u8>,
) -> (RgbImage, [Point<i32>; 4]) {
  let x0 = (size - side) / 2;
  let x1 = x0 + side - 1;
  let image = RgbImage::from_fn(size, size, |x, y| {
    if (x0..=x1).contains(&x) && (x0..=x1).contains(&y) {
      inside
    } else {
      outside
    }
  });
  let (a, b) = (x0 as i32, x1 as i32);
  (
    image,
    [Point::new(a, a), Point::new(b, a), Point::new(b, b), Point::new(a, b)],
  )
}
