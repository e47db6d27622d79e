// 该文件是 Lvye （绿野） 项目的一部分。
// src/output.rs - 输出定义
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
use url::Url;

use crate::FromUrl;
#[cfg(feature = "debug_dump")]
use crate::FromUrlWithScheme;
use crate::model::Inspection;

pub trait Render<Frame, Output>: Sized {
  type Error;
  fn render_result(&self, frame: &Frame, result: &Output) -> Result<(), Self::Error>;
}

pub mod draw;

#[cfg(feature = "debug_dump")]
mod debug_dump;
#[cfg(feature = "debug_dump")]
pub use self::debug_dump::{DebugDumpOutput, DebugDumpOutputError};

#[derive(Error, Debug)]
pub enum OutputError {
  #[cfg(feature = "debug_dump")]
  #[error("调试输出错误: {0}")]
  DebugDumpOutputError(#[from] DebugDumpOutputError),
  #[error("URI 方案不匹配")]
  SchemeMismatch,
}

pub enum OutputWrapper {
  #[cfg(feature = "debug_dump")]
  DebugDumpOutput(DebugDumpOutput),
}

impl FromUrl for OutputWrapper {
  type Error = OutputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    match url.scheme() {
      #[cfg(feature = "debug_dump")]
      DebugDumpOutput::SCHEME => {
        let output = DebugDumpOutput::from_url(url)?;
        Ok(OutputWrapper::DebugDumpOutput(output))
      }
      _ => Err(OutputError::SchemeMismatch),
    }
  }
}

impl Render<RgbImage, Inspection> for OutputWrapper {
  type Error = OutputError;

  fn render_result(&self, frame: &RgbImage, result: &Inspection) -> Result<(), Self::Error> {
    match self {
      #[cfg(feature = "debug_dump")]
      OutputWrapper::DebugDumpOutput(output) => output
        .render_result(frame, result)
        .map_err(OutputError::from),
    }
  }
}

/// 每帧一行 JSON 结论，写到标准输出
pub struct JsonOutput;

impl Render<RgbImage, Inspection> for JsonOutput {
  type Error = serde_json::Error;

  fn render_result(&self, frame: &RgbImage, result: &Inspection) -> Result<(), Self::Error> {
    tracing::debug!("输出 {}x{} 帧的检测结论", frame.width(), frame.height());
    println!("{}", serde_json::to_string(&result.outcome)?);
    Ok(())
  }
}
