// 该文件是 Lvye （绿野） 项目的一部分。
// src/model/geometry.rs - 四边形角点工具
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

use imageproc::{geometry::contour_area, point::Point};

/// 四个角点互不相同且围成非零面积
pub fn is_valid_quad(corners: &[Point<i32>; 4]) -> bool {
  for i in 0..4 {
    for j in (i + 1)..4 {
      if corners[i] == corners[j] {
        return false;
      }
    }
  }
  contour_area(corners) > 0.0
}

/// 覆盖整幅图像的四个角点，顺时针排列
pub fn full_frame(width: u32, height: u32) -> [Point<i32>; 4] {
  let right = width.saturating_sub(1) as i32;
  let bottom = height.saturating_sub(1) as i32;
  [
    Point::new(0, 0),
    Point::new(right, 0),
    Point::new(right, bottom),
    Point::new(0, bottom),
  ]
}
