// 该文件是 Lvye （绿野） 项目的一部分。
// src/server/routes.rs - HTTP 处理函数
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

use axum::{
  Json,
  extract::{Multipart, State},
};
use serde_json::{Value, json};
use tracing::{debug, error};

use crate::{
  server::state::HttpState,
  service::{PredictResponse, ServiceError},
};

const UPLOAD_FIELD: &str = "file";

pub async fn health() -> Json<Value> {
  Json(json!({ "status": "ok" }))
}

/// 错误同样以 200 返回，内容在 `error` 字段里
pub async fn predict(State(st): State<HttpState>, multipart: Multipart) -> Json<PredictResponse> {
  match read_upload(multipart).await {
    Ok(bytes) => Json(st.service.predict(bytes).await),
    Err(err) => {
      error!("读取上传内容失败: {}", err);
      Json(err.into_response())
    }
  }
}

async fn read_upload(mut multipart: Multipart) -> Result<Vec<u8>, ServiceError> {
  while let Some(field) = multipart.next_field().await? {
    if field.name() == Some(UPLOAD_FIELD) {
      let bytes = field.bytes().await?;
      debug!("收到上传文件 {} 字节", bytes.len());
      return Ok(bytes.to_vec());
    }
  }
  Err(ServiceError::MissingFile)
}
