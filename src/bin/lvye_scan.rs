// 该文件是 Lvye （绿野） 项目的一部分。
// src/bin/lvye_scan.rs - 单张图像检测
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

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use image::RgbImage;
use thiserror::Error;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use url::Url;

use lvye::{
  FromUrl,
  config::AppConfig,
  input::InputWrapper,
  model::{Inspection, Inspector, PlantDetector},
  output::{JsonOutput, OutputError, OutputWrapper, Render},
  task::{OneShotTask, RepeatShotTask, Task},
};

/// Lvye 单张图像检测参数
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 输入来源，例如 image:///path/to/photo.jpg
  #[arg(long, value_name = "SOURCE")]
  pub input: Url,
  /// 调试输出，例如 dump:///tmp/lvye?flat
  #[arg(long, value_name = "OUTPUT")]
  pub dump: Option<Url>,
  /// JSON 配置文件
  #[arg(long, env = "LVYE_CONFIG", value_name = "FILE")]
  pub config: Option<PathBuf>,
  /// 重复检测次数，用于测量耗时
  #[arg(long, value_name = "TIMES")]
  pub repeat: Option<usize>,
}

#[derive(Error, Debug)]
enum ScanOutputError {
  #[error("JSON 输出错误: {0}")]
  Json(#[from] serde_json::Error),
  #[error("{0}")]
  Output(#[from] OutputError),
}

/// 标准输出打印结论，可选地同时转储中间结果
struct ScanOutput {
  dump: Option<OutputWrapper>,
}

impl Render<RgbImage, Inspection> for ScanOutput {
  type Error = ScanOutputError;

  fn render_result(&self, frame: &RgbImage, result: &Inspection) -> Result<(), Self::Error> {
    JsonOutput.render_result(frame, result)?;
    if let Some(dump) = &self.dump {
      dump.render_result(frame, result)?;
    }
    Ok(())
  }
}

fn main() -> Result<()> {
  tracing_subscriber::registry()
    .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
    .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .init();

  let args = Args::parse();

  info!("输入来源: {}", args.input);
  if let Some(dump) = &args.dump {
    info!("调试输出: {}", dump);
  }

  let config = match &args.config {
    Some(path) => AppConfig::from_file(path)?,
    None => AppConfig::default(),
  };
  let detector = PlantDetector::new(&config.detection);

  let input = InputWrapper::from_url(&args.input)?;
  let output = ScanOutput {
    dump: args.dump.as_ref().map(OutputWrapper::from_url).transpose()?,
  };

  match args.repeat {
    Some(times) => {
      RepeatShotTask::default()
        .with_times(times)
        .run_task(input, Inspector(&detector), output)?
    }
    None => OneShotTask.run_task(input, Inspector(&detector), output)?,
  }

  Ok(())
}
