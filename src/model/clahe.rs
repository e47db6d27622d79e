// 该文件是 Lvye （绿野） 项目的一部分。
// src/model/clahe.rs - 限制对比度自适应直方图均衡
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

use image::{GrayImage, Luma};

const BINS: usize = 256;

/// CLAHE 参数
#[derive(Debug, Clone, Copy)]
pub struct Clahe {
  clip_limit: f32,
  tiles: u32,
}

impl Clahe {
  pub fn new(clip_limit: f32, tiles: u32) -> Self {
    Self {
      clip_limit,
      tiles: tiles.max(1),
    }
  }

  pub fn apply(&self, image: &GrayImage) -> GrayImage {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
      return image.clone();
    }

    // 图像比网格小时缩减网格，保证每块至少一个像素
    let tile_w = width.div_ceil(self.tiles.min(width));
    let tile_h = height.div_ceil(self.tiles.min(height));
    let grid_x = width.div_ceil(tile_w);
    let grid_y = height.div_ceil(tile_h);

    let mut luts = Vec::with_capacity((grid_x * grid_y) as usize);
    for ty in 0..grid_y {
      for tx in 0..grid_x {
        let x0 = tx * tile_w;
        let y0 = ty * tile_h;
        let x1 = (x0 + tile_w).min(width);
        let y1 = (y0 + tile_h).min(height);
        luts.push(self.tile_lut(image, x0, y0, x1, y1));
      }
    }

    let lut_at = |tx: u32, ty: u32| &luts[(ty * grid_x + tx) as usize];
    let axis = |pos: u32, tile: u32, grid: u32| -> (u32, u32, f32) {
      let f = (pos as f32 + 0.5) / tile as f32 - 0.5;
      let lo = f.floor().clamp(0.0, (grid - 1) as f32) as u32;
      let hi = (lo + 1).min(grid - 1);
      let weight = (f - lo as f32).clamp(0.0, 1.0);
      (lo, hi, weight)
    };

    GrayImage::from_fn(width, height, |x, y| {
      let v = image.get_pixel(x, y)[0] as usize;
      let (x_lo, x_hi, wx) = axis(x, tile_w, grid_x);
      let (y_lo, y_hi, wy) = axis(y, tile_h, grid_y);

      let top = lut_at(x_lo, y_lo)[v] * (1.0 - wx) + lut_at(x_hi, y_lo)[v] * wx;
      let bottom = lut_at(x_lo, y_hi)[v] * (1.0 - wx) + lut_at(x_hi, y_hi)[v] * wx;
      let value = top * (1.0 - wy) + bottom * wy;
      Luma([value.round().clamp(0.0, 255.0) as u8])
    })
  }

  fn tile_lut(&self, image: &GrayImage, x0: u32, y0: u32, x1: u32, y1: u32) -> [f32; BINS] {
    let mut hist = [0u32; BINS];
    for y in y0..y1 {
      for x in x0..x1 {
        hist[image.get_pixel(x, y)[0] as usize] += 1;
      }
    }
    let area = (x1 - x0) * (y1 - y0);

    // 截断超出上限的部分并均匀分摊回所有灰度级
    if self.clip_limit > 0.0 {
      let limit = ((self.clip_limit * area as f32 / BINS as f32) as u32).max(1);
      let mut excess = 0u32;
      for count in hist.iter_mut() {
        if *count > limit {
          excess += *count - limit;
          *count = limit;
        }
      }
      let share = excess / BINS as u32;
      let remainder = (excess % BINS as u32) as usize;
      for (i, count) in hist.iter_mut().enumerate() {
        *count += share;
        if i < remainder {
          *count += 1;
        }
      }
    }

    let scale = 255.0 / area as f32;
    let mut lut = [0f32; BINS];
    let mut cdf = 0u32;
    for (i, count) in hist.iter().enumerate() {
      cdf += count;
      lut[i] = cdf as f32 * scale;
    }
    lut
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn low_contrast_ramp_gets_stretched() {
    // 每个 32x32 块内有 16 个灰度级
    let image = GrayImage::from_fn(256, 256, |x, _| Luma([100 + ((x % 32) / 2) as u8]));
    let out = Clahe::new(3.0, 8).apply(&image);
    let spread = |img: &GrayImage| {
      let min = img.pixels().map(|p| p[0]).min().unwrap_or(0);
      let max = img.pixels().map(|p| p[0]).max().unwrap_or(0);
      max - min
    };
    assert!(spread(&out) > spread(&image));
  }

  #[test]
  fn tiny_and_empty_images_are_handled() {
    let tiny = GrayImage::from_pixel(3, 2, Luma([42]));
    assert_eq!(Clahe::new(3.0, 8).apply(&tiny).dimensions(), (3, 2));
    let empty = GrayImage::new(0, 0);
    assert_eq!(Clahe::new(3.0, 8).apply(&empty).dimensions(), (0, 0));
  }
}
