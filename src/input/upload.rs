// 该文件是 Lvye （绿野） 项目的一部分。
// src/input/upload.rs - 上传图像解码与检查
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

use image::RgbImage;
use thiserror::Error;
use tracing::{debug, warn};

/// 错误信息会原样返回给客户端
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UploadError {
  #[error("Invalid image data. Please try again with a different photo.")]
  InvalidImage,
  #[error("Image is too dark or empty. Please take a photo with better lighting.")]
  TooDarkOrEmpty,
}

pub fn decode_upload(bytes: &[u8]) -> Result<RgbImage, UploadError> {
  let image = image::load_from_memory(bytes).map_err(|err| {
    warn!("上传图像解码失败: {}", err);
    UploadError::InvalidImage
  })?;
  Ok(image.to_rgb8())
}

/// 所有像素所有通道的平均值；空图像为 `None`
pub fn mean_brightness(image: &RgbImage) -> Option<f32> {
  let raw = image.as_raw();
  if raw.is_empty() {
    return None;
  }
  let sum: u64 = raw.iter().map(|&v| u64::from(v)).sum();
  Some((sum as f64 / raw.len() as f64) as f32)
}

pub fn check_sanity(image: &RgbImage, min_brightness: f32) -> Result<(), UploadError> {
  match mean_brightness(image) {
    Some(mean) if mean >= min_brightness => {
      debug!("上传图像平均亮度 {:.2}", mean);
      Ok(())
    }
    Some(mean) => {
      warn!("上传图像过暗: 平均亮度 {:.2} < {:.2}", mean, min_brightness);
      Err(UploadError::TooDarkOrEmpty)
    }
    None => {
      warn!("上传图像为空");
      Err(UploadError::TooDarkOrEmpty)
    }
  }
}

/// 解码并检查，返回可直接送入检测器的图像
pub fn load_upload(bytes: &[u8], min_brightness: f32) -> Result<RgbImage, UploadError> {
  let image = decode_upload(bytes)?;
  check_sanity(&image, min_brightness)?;
  Ok(image)
}

#[cfg(test)]
mod tests {
  use super::*;
  use image::{ImageFormat, Rgb};
  use std::io::Cursor;

  fn png_bytes(image: &RgbImage) -> Vec<u8> {
    let mut bytes = Vec::new();
    image.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png).unwrap();
    bytes
  }

  #[test]
  fn garbage_bytes_are_invalid() {
    assert_eq!(decode_upload(b"not an image"), Err(UploadError::InvalidImage));
    assert_eq!(decode_upload(&[]), Err(UploadError::InvalidImage));
  }

  #[test]
  fn png_round_trips_through_decode() {
    let image = RgbImage::from_pixel(8, 6, Rgb([40, 160, 40]));
    let decoded = load_upload(&png_bytes(&image), 10.0).unwrap();
    assert_eq!(decoded, image);
  }

  #[test]
  fn dark_image_is_rejected() {
    let image = RgbImage::from_pixel(8, 8, Rgb([5, 5, 5]));
    assert_eq!(check_sanity(&image, 10.0), Err(UploadError::TooDarkOrEmpty));
    assert_eq!(
      load_upload(&png_bytes(&image), 10.0),
      Err(UploadError::TooDarkOrEmpty)
    );
  }

  #[test]
  fn brightness_threshold_is_inclusive() {
    let image = RgbImage::from_pixel(4, 4, Rgb([10, 10, 10]));
    assert_eq!(check_sanity(&image, 10.0), Ok(()));
  }

  #[test]
  fn empty_image_is_rejected() {
    assert_eq!(mean_brightness(&RgbImage::new(0, 0)), None);
    assert_eq!(
      check_sanity(&RgbImage::new(0, 0), 10.0),
      Err(UploadError::TooDarkOrEmpty)
    );
  }

  #[test]
  fn error_messages_are_user_facing() {
    assert_eq!(
      UploadError::InvalidImage.to_string(),
      "Invalid image data. Please try again with a different photo."
    );
    assert_eq!(
      UploadError::TooDarkOrEmpty.to_string(),
      "Image is too dark or empty. Please take a photo with better lighting."
    );
  }
}
