// 该文件是 Lvye （绿野） 项目的一部分。
// src/service.rs - 植物识别服务
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

//! 上传图像 → 检查 → 启发式检测 → 识别（Plant.id 或示例数据）。

use std::sync::Arc;

use thiserror::Error;
use tracing::{error, info, warn};

use crate::{
  config::AppConfig,
  input::{UploadError, load_upload},
  model::{DetectionOutcome, PlantDetector},
};

mod mock;
mod plant_id;
pub mod response;

pub use self::mock::mock_response;
pub use self::plant_id::{IdentifyResponse, PlantIdClient, shape_response};
pub use self::response::PredictResponse;
use self::response::NO_PLANT_DETECTED;

#[derive(Error, Debug)]
pub enum ServiceError {
  #[error("{0}")]
  Upload(#[from] UploadError),
  #[error("detection task failed: {0}")]
  Join(#[from] tokio::task::JoinError),
  #[error("{0}")]
  Request(#[from] reqwest::Error),
  #[error("{0}")]
  Multipart(#[from] axum::extract::multipart::MultipartError),
  #[error("missing multipart field `file`")]
  MissingFile,
}

impl ServiceError {
  /// 转成对客户端可见的响应
  pub fn into_response(self) -> PredictResponse {
    match self {
      ServiceError::Upload(err) => PredictResponse::rejected(err.to_string()),
      other => PredictResponse::rejected(format!("Error processing image: {}", other)),
    }
  }
}

/// 植物识别的来源
#[derive(Debug, Clone)]
pub enum Identifier {
  PlantId(PlantIdClient),
  Mock,
}

impl Identifier {
  pub fn from_config(config: &AppConfig) -> Result<Self, ServiceError> {
    match config.service.plant_id_api_key.as_deref() {
      Some(key) if !key.is_empty() => {
        info!("使用 Plant.id 识别: {}", config.service.plant_id_endpoint);
        let client = PlantIdClient::new(&config.service.plant_id_endpoint, key)?;
        Ok(Identifier::PlantId(client))
      }
      _ => {
        warn!("未配置 Plant.id API Key，返回示例数据");
        Ok(Identifier::Mock)
      }
    }
  }
}

pub struct PlantService {
  config: Arc<AppConfig>,
  detector: Arc<PlantDetector>,
  identifier: Identifier,
}

impl PlantService {
  pub fn new(config: Arc<AppConfig>) -> Result<Self, ServiceError> {
    let identifier = Identifier::from_config(&config)?;
    Ok(Self::with_identifier(config, identifier))
  }

  pub fn with_identifier(config: Arc<AppConfig>, identifier: Identifier) -> Self {
    let detector = Arc::new(PlantDetector::new(&config.detection));
    Self {
      config,
      detector,
      identifier,
    }
  }

  /// 解码与检测在阻塞线程池中执行
  pub async fn detect(&self, bytes: Arc<[u8]>) -> Result<DetectionOutcome, ServiceError> {
    let detector = self.detector.clone();
    let min_brightness = self.config.service.min_brightness;
    let outcome = tokio::task::spawn_blocking(move || {
      let image = load_upload(&bytes, min_brightness)?;
      Ok::<_, UploadError>(detector.inspect(&image).outcome)
    })
    .await??;
    Ok(outcome)
  }

  /// 完整处理一次上传，任何错误都折叠进响应里
  pub async fn predict(&self, bytes: Vec<u8>) -> PredictResponse {
    let bytes: Arc<[u8]> = bytes.into();
    match self.try_predict(bytes).await {
      Ok(response) => response,
      Err(err) => {
        error!("处理上传图像失败: {}", err);
        err.into_response()
      }
    }
  }

  async fn try_predict(&self, bytes: Arc<[u8]>) -> Result<PredictResponse, ServiceError> {
    let outcome = self.detect(bytes.clone()).await?;
    info!(
      "植物置信度 {:.4}, 花朵 {}, 屏幕 {}",
      outcome.confidence, outcome.has_flower, outcome.is_on_screen
    );

    if outcome.confidence < self.config.service.plant_threshold {
      return Ok(PredictResponse::rejected(NO_PLANT_DETECTED));
    }

    match &self.identifier {
      Identifier::PlantId(client) => {
        let mut response = client.identify(&bytes).await?;
        response.detected_from_screen = Some(outcome.is_on_screen);
        Ok(response)
      }
      Identifier::Mock => Ok(mock_response(&outcome)),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::test_utils::{LEAF_GREEN, MID_GRAY, solid};
  use image::{ImageFormat, RgbImage};
  use std::io::Cursor;

  fn png(image: &RgbImage) -> Vec<u8> {
    let mut bytes = Vec::new();
    image.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png).unwrap();
    bytes
  }

  fn mock_service() -> PlantService {
    PlantService::with_identifier(Arc::new(AppConfig::default()), Identifier::Mock)
  }

  #[test]
  fn missing_or_empty_key_uses_mock() {
    let mut config = AppConfig::default();
    assert!(matches!(Identifier::from_config(&config), Ok(Identifier::Mock)));
    config.service.plant_id_api_key = Some(String::new());
    assert!(matches!(Identifier::from_config(&config), Ok(Identifier::Mock)));
    config.service.plant_id_api_key = Some("secret".into());
    assert!(matches!(Identifier::from_config(&config), Ok(Identifier::PlantId(_))));
  }

  #[test]
  fn service_builds_its_client_from_config() {
    let mut config = AppConfig::default();
    config.service.plant_id_api_key = Some("secret".into());
    let service = PlantService::new(Arc::new(config)).unwrap();
    assert!(matches!(service.identifier, Identifier::PlantId(_)));
  }

  #[tokio::test]
  async fn invalid_bytes_are_reported_in_band() {
    let response = mock_service().predict(b"garbage".to_vec()).await;
    assert!(!response.is_plant);
    assert_eq!(
      response.error.as_deref(),
      Some("Invalid image data. Please try again with a different photo.")
    );
  }

  #[tokio::test]
  async fn dark_image_is_reported_in_band() {
    let response = mock_service().predict(png(&solid(16, 16, image::Rgb([2, 2, 2])))).await;
    assert_eq!(
      response.error.as_deref(),
      Some("Image is too dark or empty. Please take a photo with better lighting.")
    );
  }

  #[tokio::test]
  async fn gray_image_is_not_a_plant() {
    let response = mock_service().predict(png(&solid(64, 64, MID_GRAY))).await;
    assert!(!response.is_plant);
    assert_eq!(response.error.as_deref(), Some(NO_PLANT_DETECTED));
  }

  #[tokio::test]
  async fn green_image_gets_mock_foliage() {
    let response = mock_service().predict(png(&solid(64, 64, LEAF_GREEN))).await;
    assert!(response.is_plant);
    assert_eq!(response.confidence, Some(1.0));
    assert_eq!(response.has_flower, Some(false));
    assert_eq!(response.detected_from_screen, Some(false));
    assert_eq!(response.suggestions[0].plant_name, "Monstera deliciosa");
  }

  #[tokio::test]
  async fn unreachable_upstream_is_reported_in_band() {
    let config = Arc::new(AppConfig::default());
    // 端口 9 (discard) 在测试环境里不会有 HTTP 服务
    let client = PlantIdClient::new("http://127.0.0.1:9/identify", "secret").unwrap();
    let service = PlantService::with_identifier(config, Identifier::PlantId(client));
    let response = service.predict(png(&solid(32, 32, LEAF_GREEN))).await;
    assert!(!response.is_plant);
    assert!(
      response
        .error
        .as_deref()
        .is_some_and(|e| e.starts_with("Error processing image: ")),
      "{:?}",
      response.error
    );
  }
}
