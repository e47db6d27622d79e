// 该文件是 Lvye （绿野） 项目的一部分。
// src/model/inpaint.rs - 快速行进修复
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

use std::collections::VecDeque;

use image::{GrayImage, Rgb, RgbImage};

const NEIGHBORS: [(i32, i32); 8] = [
  (-1, -1),
  (0, -1),
  (1, -1),
  (-1, 0),
  (1, 0),
  (-1, 1),
  (0, 1),
  (1, 1),
];

/// 按掩码修复图像。
///
/// 从已知区域边界向内逐层推进，每个待修复像素取半径 `radius` 内已知像素的
/// 加权平均，权重随距离平方衰减。掩码非零处视为待修复。
/// 没有任何已知像素时原样返回。
pub fn inpaint(image: &RgbImage, mask: &GrayImage, radius: u32) -> RgbImage {
  let (width, height) = image.dimensions();
  if mask.dimensions() != (width, height) {
    return image.clone();
  }

  let index = |x: u32, y: u32| (y * width + x) as usize;
  let mut known: Vec<bool> = mask.pixels().map(|p| p[0] == 0).collect();
  if !known.iter().any(|&k| k) {
    return image.clone();
  }

  let in_bounds = |x: i32, y: i32| x >= 0 && y >= 0 && (x as u32) < width && (y as u32) < height;

  // 初始前沿：与已知像素相邻的待修复像素
  let mut queued = vec![false; known.len()];
  let mut front = VecDeque::new();
  for y in 0..height {
    for x in 0..width {
      if known[index(x, y)] {
        continue;
      }
      let touches_known = NEIGHBORS.iter().any(|&(dx, dy)| {
        let (nx, ny) = (x as i32 + dx, y as i32 + dy);
        in_bounds(nx, ny) && known[index(nx as u32, ny as u32)]
      });
      if touches_known {
        queued[index(x, y)] = true;
        front.push_back((x, y));
      }
    }
  }

  let mut out = image.clone();
  let r = radius.max(1) as i32;
  while let Some((x, y)) = front.pop_front() {
    let mut sum = [0f32; 3];
    let mut total = 0f32;
    for dy in -r..=r {
      for dx in -r..=r {
        let (nx, ny) = (x as i32 + dx, y as i32 + dy);
        if (dx == 0 && dy == 0) || !in_bounds(nx, ny) {
          continue;
        }
        let (nx, ny) = (nx as u32, ny as u32);
        if !known[index(nx, ny)] {
          continue;
        }
        let d2 = (dx * dx + dy * dy) as f32;
        if d2 > (r * r) as f32 {
          continue;
        }
        let weight = 1.0 / d2;
        let pixel = out.get_pixel(nx, ny);
        for c in 0..3 {
          sum[c] += weight * f32::from(pixel[c]);
        }
        total += weight;
      }
    }

    if total > 0.0 {
      let value = sum.map(|s| (s / total).round().clamp(0.0, 255.0) as u8);
      out.put_pixel(x, y, Rgb(value));
    }
    known[index(x, y)] = true;

    for &(dx, dy) in NEIGHBORS.iter() {
      let (nx, ny) = (x as i32 + dx, y as i32 + dy);
      if !in_bounds(nx, ny) {
        continue;
      }
      let i = index(nx as u32, ny as u32);
      if !known[i] && !queued[i] {
        queued[i] = true;
        front.push_back((nx as u32, ny as u32));
      }
    }
  }

  out
}
