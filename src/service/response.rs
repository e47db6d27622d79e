// 该文件是 Lvye （绿野） 项目的一部分。
// src/service/response.rs - 识别接口的响应结构
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

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub const NO_PLANT_DETECTED: &str = "No plant detected in the image. Please take a photo of a plant.";
pub const NO_PLANT_MATCHES: &str = "No plant matches found. Please try a clearer photo.";
pub const UNKNOWN: &str = "Unknown";
pub const NO_DESCRIPTION: &str = "No description available";

/// `/predict` 的响应体。错误同样以 200 返回，放在 `error` 字段里。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictResponse {
  pub is_plant: bool,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub error: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub has_flower: Option<bool>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub confidence: Option<f32>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub detected_from_screen: Option<bool>,
  #[serde(default)]
  pub suggestions: Vec<Suggestion>,
}

impl PredictResponse {
  pub fn rejected(message: impl Into<String>) -> Self {
    Self {
      is_plant: false,
      error: Some(message.into()),
      has_flower: None,
      confidence: None,
      detected_from_screen: None,
      suggestions: Vec::new(),
    }
  }

  pub fn identified(suggestions: Vec<Suggestion>) -> Self {
    Self {
      is_plant: true,
      error: None,
      has_flower: None,
      confidence: None,
      detected_from_screen: None,
      suggestions,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
  pub id: u64,
  pub plant_name: String,
  pub probability: f32,
  pub plant_details: PlantDetails,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlantDetails {
  pub common_names: Vec<String>,
  pub wiki_description: WikiDescription,
  pub taxonomy: Taxonomy,
  pub url: String,
  pub images: Vec<ReferenceImage>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub flower_details: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WikiDescription {
  pub value: String,
}

impl Default for WikiDescription {
  fn default() -> Self {
    Self {
      value: NO_DESCRIPTION.to_string(),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Taxonomy {
  pub family: String,
  pub genus: String,
  pub species: String,
}

impl Default for Taxonomy {
  fn default() -> Self {
    Self {
      family: UNKNOWN.to_string(),
      genus: UNKNOWN.to_string(),
      species: UNKNOWN.to_string(),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceImage {
  pub url: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub caption: Option<String>,
}
