// 该文件是 Lvye （绿野） 项目的一部分。
// src/bin/lvye_server.rs - 植物识别 HTTP 服务
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

use std::{net::SocketAddr, path::PathBuf, sync::Arc};

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use lvye::{
  config::AppConfig,
  server::{self, HttpState},
};

/// Lvye 服务参数配置
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 监听地址
  #[arg(long, env = "LVYE_BIND", default_value = "0.0.0.0:8000")]
  pub bind: SocketAddr,
  /// JSON 配置文件，未指定时使用内置参数
  #[arg(long, env = "LVYE_CONFIG", value_name = "FILE")]
  pub config: Option<PathBuf>,
  /// Plant.id API Key，为空时返回示例数据
  #[arg(long, env = "PLANT_ID_API_KEY", hide_env_values = true)]
  pub plant_id_api_key: Option<String>,
  /// 覆盖植物置信度阈值
  #[arg(long)]
  pub plant_threshold: Option<f32>,
  /// 覆盖花朵占比阈值
  #[arg(long)]
  pub flower_threshold: Option<f32>,
}

impl Args {
  fn app_config(&self) -> Result<AppConfig> {
    let mut config = match &self.config {
      Some(path) => AppConfig::from_file(path)?,
      None => AppConfig::default(),
    };
    if let Some(key) = &self.plant_id_api_key {
      config.service.plant_id_api_key = Some(key.clone());
    }
    if let Some(threshold) = self.plant_threshold {
      config.service.plant_threshold = threshold;
    }
    if let Some(threshold) = self.flower_threshold {
      config.detection.feature.flower_threshold = threshold;
    }
    config.validate()?;
    Ok(config)
  }
}

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::registry()
    .with(tracing_subscriber::fmt::layer())
    .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .init();

  let args = Args::parse();
  let config = Arc::new(args.app_config()?);
  info!("监听地址: {}", args.bind);
  info!(
    "植物阈值: {}, 花朵阈值: {}",
    config.service.plant_threshold, config.detection.feature.flower_threshold
  );

  let state = HttpState::new(config)?;
  server::serve(args.bind, state).await?;
  Ok(())
}
