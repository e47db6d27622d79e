// 该文件是 Lvye （绿野） 项目的一部分。
// src/output/debug_dump.rs - 中间结果转储
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

use std::{
  fs::File,
  io::BufWriter,
  path::{Path, PathBuf},
  sync::atomic::{AtomicU16, Ordering},
};

use chrono::{Datelike, Utc};
use image::RgbImage;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::{
  FromUrl, FromUrlWithScheme,
  model::{DetectionOutcome, FeatureScore, Inspection},
  output::{
    Render,
    draw::{draw_screen_outline, overlay_mask},
  },
};

const PLANT_COLOR: [u8; 3] = [0, 255, 0];
const FLOWER_COLOR: [u8; 3] = [255, 0, 0];

#[derive(Error, Debug)]
pub enum DebugDumpOutputError {
  #[error("URI 方案不匹配")]
  SchemeMismatch,
  #[error("图像错误: {0}")]
  ImageError(#[from] image::ImageError),
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("JSON 错误: {0}")]
  JsonError(#[from] serde_json::Error),
}

#[derive(Serialize)]
struct PassRecord<'a> {
  name: &'a str,
  features: FeatureScore,
  confidence: f32,
  has_flower: bool,
  degraded: bool,
}

#[derive(Serialize)]
struct DumpRecord<'a> {
  outcome: DetectionOutcome,
  screen_corners: Option<[[i32; 2]; 4]>,
  screen_degraded: Option<&'a str>,
  passes: Vec<PassRecord<'a>>,
}

/// `dump:///some/dir`：每次检测写出输入、校正图、掩码叠加图和 JSON 记录。
///
/// 默认按 `年/月/日` 分目录，加 `?flat` 直接写入目标目录；
/// 加 `?plant` 时只转储置信度大于 0 的结果。
pub struct DebugDumpOutput {
  directory: PathBuf,
  frame_counter: AtomicU16,
  flat: bool,
  only_plant: bool,
}

impl FromUrlWithScheme for DebugDumpOutput {
  const SCHEME: &'static str = "dump";
}

impl FromUrl for DebugDumpOutput {
  type Error = DebugDumpOutputError;

  fn from_url(uri: &url::Url) -> Result<Self, Self::Error> {
    if uri.scheme() != Self::SCHEME {
      return Err(DebugDumpOutputError::SchemeMismatch);
    }

    let flat = uri.query_pairs().any(|(k, _)| k == "flat");
    let only_plant = uri.query_pairs().any(|(k, _)| k == "plant");

    Ok(DebugDumpOutput {
      directory: PathBuf::from(uri.path()),
      frame_counter: AtomicU16::new(0),
      flat,
      only_plant,
    })
  }
}

impl DebugDumpOutput {
  fn frame_id(&self) -> u16 {
    self.frame_counter.fetch_add(1, Ordering::Relaxed).wrapping_add(1)
  }

  /// 本帧所有文件共用的路径前缀
  fn frame_prefix(&self) -> Result<PathBuf, DebugDumpOutputError> {
    let now = Utc::now();
    let directory = if self.flat {
      self.directory.clone()
    } else {
      self
        .directory
        .join(now.year().to_string())
        .join(format!("{:02}", now.month()))
        .join(format!("{:02}", now.day()))
    };
    if !directory.exists() {
      std::fs::create_dir_all(&directory)?;
    }

    Ok(directory.join(format!(
      "{}-{:04X}",
      now.format("%H-%M-%S"),
      self.frame_id()
    )))
  }

  fn write_json(path: &Path, inspection: &Inspection) -> Result<(), DebugDumpOutputError> {
    let record = DumpRecord {
      outcome: inspection.outcome,
      screen_corners: inspection.screen.value().corners_xy(),
      screen_degraded: inspection.screen.reason(),
      passes: inspection
        .passes
        .iter()
        .map(|pass| PassRecord {
          name: pass.name,
          features: pass.features,
          confidence: pass.confidence,
          has_flower: pass.has_flower,
          degraded: pass.degraded,
        })
        .collect(),
    };
    serde_json::to_writer_pretty(BufWriter::new(File::create(path)?), &record)?;
    Ok(())
  }
}

fn with_suffix(prefix: &Path, suffix: &str) -> PathBuf {
  let mut name = prefix.as_os_str().to_owned();
  name.push(suffix);
  PathBuf::from(name)
}

impl Render<RgbImage, Inspection> for DebugDumpOutput {
  type Error = DebugDumpOutputError;

  fn render_result(&self, frame: &RgbImage, result: &Inspection) -> Result<(), Self::Error> {
    if self.only_plant && result.outcome.confidence <= 0.0 {
      debug!("置信度为 0，跳过转储");
      return Ok(());
    }
    if frame.width() == 0 || frame.height() == 0 {
      debug!("空图像，跳过图像转储");
      return Self::write_json(&with_suffix(&self.frame_prefix()?, ".json"), result);
    }

    let prefix = self.frame_prefix()?;
    let input = match result.screen.value().corners.as_ref() {
      Some(corners) => draw_screen_outline(frame, corners),
      None => frame.clone(),
    };
    input.save(with_suffix(&prefix, "-input.png"))?;

    for pass in &result.passes {
      let base = pass.prepared.as_ref().unwrap_or(frame);
      if let Some(prepared) = pass.prepared.as_ref() {
        prepared.save(with_suffix(&prefix, &format!("-{}.png", pass.name)))?;
      }
      let plant = overlay_mask(base, &pass.masks.plant, PLANT_COLOR);
      let flower = overlay_mask(&plant, &pass.masks.flower, FLOWER_COLOR);
      flower.save(with_suffix(&prefix, &format!("-{}-masks.png", pass.name)))?;
      pass
        .masks
        .edges
        .save(with_suffix(&prefix, &format!("-{}-edges.png", pass.name)))?;
    }

    let json = with_suffix(&prefix, ".json");
    Self::write_json(&json, result)?;
    info!("调试转储写入 {}", json.display());
    Ok(())
  }
}
