// 该文件是 Lvye （绿野） 项目的一部分。
// src/server.rs - HTTP 服务
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

pub mod routes;
pub mod state;

use std::net::SocketAddr;

use axum::{
  Router,
  extract::DefaultBodyLimit,
  routing::{get, post},
};
use thiserror::Error;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

pub use self::state::HttpState;

/// 单次上传的大小上限
pub const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

#[derive(Error, Debug)]
pub enum ServerError {
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
}

pub fn router(state: HttpState) -> Router {
  Router::new()
    .route("/health", get(routes::health))
    .route("/predict", post(routes::predict))
    .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
    .layer(CorsLayer::permissive())
    .with_state(state)
}

pub async fn serve(bind: SocketAddr, state: HttpState) -> Result<(), ServerError> {
  let listener = tokio::net::TcpListener::bind(bind).await?;
  info!("HTTP 服务监听于 {}", listener.local_addr()?);
  axum::serve(listener, router(state))
    .with_graceful_shutdown(shutdown_signal())
    .await?;
  info!("HTTP 服务已退出");
  Ok(())
}

async fn shutdown_signal() {
  if let Err(err) = tokio::signal::ctrl_c().await {
    warn!("无法监听中断信号: {}", err);
    std::future::pending::<()>().await;
  }
  info!("收到中断信号，准备退出...");
}
