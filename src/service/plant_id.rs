// 该文件是 Lvye （绿野） 项目的一部分。
// src/service/plant_id.rs - Plant.id 识别接口客户端
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

use std::time::Duration;

use base64::{Engine, prelude::BASE64_STANDARD};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::service::{
  ServiceError,
  response::{
    NO_PLANT_MATCHES, PlantDetails, PredictResponse, ReferenceImage, Suggestion, Taxonomy, UNKNOWN,
    WikiDescription,
  },
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const MODIFIERS: [&str; 2] = ["crops_fast", "similar_images"];
const PLANT_DETAILS: [&str; 5] = ["common_names", "url", "wiki_description", "taxonomy", "images"];

#[derive(Debug, Serialize)]
struct IdentifyRequest<'a> {
  images: Vec<String>,
  modifiers: &'a [&'a str],
  plant_language: &'a str,
  plant_details: &'a [&'a str],
}

/// 上游返回的原始结构，字段都可能缺失或为 null
#[derive(Debug, Default, Deserialize)]
pub struct IdentifyResponse {
  #[serde(default)]
  pub suggestions: Option<Vec<RawSuggestion>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawSuggestion {
  pub id: Option<u64>,
  pub plant_name: Option<String>,
  pub probability: Option<f32>,
  pub plant_details: Option<RawPlantDetails>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawPlantDetails {
  pub common_names: Option<Vec<String>>,
  pub wiki_description: Option<RawWikiDescription>,
  pub taxonomy: Option<RawTaxonomy>,
  pub url: Option<String>,
  pub images: Option<Vec<ReferenceImage>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawWikiDescription {
  pub value: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawTaxonomy {
  pub family: Option<String>,
  pub genus: Option<String>,
  pub species: Option<String>,
}

impl From<RawPlantDetails> for PlantDetails {
  fn from(raw: RawPlantDetails) -> Self {
    let unknown = || UNKNOWN.to_string();
    PlantDetails {
      common_names: raw.common_names.unwrap_or_default(),
      wiki_description: raw
        .wiki_description
        .and_then(|w| w.value)
        .map(|value| WikiDescription { value })
        .unwrap_or_default(),
      taxonomy: raw
        .taxonomy
        .map(|t| Taxonomy {
          family: t.family.unwrap_or_else(unknown),
          genus: t.genus.unwrap_or_else(unknown),
          species: t.species.unwrap_or_else(unknown),
        })
        .unwrap_or_default(),
      url: raw.url.unwrap_or_default(),
      images: raw.images.unwrap_or_default(),
      flower_details: None,
    }
  }
}

impl From<RawSuggestion> for Suggestion {
  fn from(raw: RawSuggestion) -> Self {
    Suggestion {
      id: raw.id.unwrap_or(0),
      plant_name: raw.plant_name.unwrap_or_else(|| UNKNOWN.to_string()),
      probability: raw.probability.unwrap_or(0.0),
      plant_details: raw.plant_details.unwrap_or_default().into(),
    }
  }
}

/// 把上游响应整理成对外的响应，缺失字段补默认值
pub fn shape_response(raw: IdentifyResponse) -> PredictResponse {
  match raw.suggestions {
    Some(suggestions) if !suggestions.is_empty() => {
      PredictResponse::identified(suggestions.into_iter().map(Suggestion::from).collect())
    }
    _ => {
      warn!("Plant.id 没有返回候选");
      PredictResponse::rejected(NO_PLANT_MATCHES)
    }
  }
}

#[derive(Debug, Clone)]
pub struct PlantIdClient {
  client: reqwest::Client,
  endpoint: String,
  api_key: String,
}

impl PlantIdClient {
  pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Result<Self, ServiceError> {
    let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;

    Ok(Self {
      client,
      endpoint: endpoint.into(),
      api_key: api_key.into(),
    })
  }

  /// 上传原始图像字节，返回整理后的识别结果
  pub async fn identify(&self, image_bytes: &[u8]) -> Result<PredictResponse, ServiceError> {
    let body = IdentifyRequest {
      images: vec![BASE64_STANDARD.encode(image_bytes)],
      modifiers: &MODIFIERS,
      plant_language: "en",
      plant_details: &PLANT_DETAILS,
    };

    debug!("请求 Plant.id: {} ({} 字节)", self.endpoint, image_bytes.len());
    let raw: IdentifyResponse = self
      .client
      .post(&self.endpoint)
      .header("Api-Key", &self.api_key)
      .json(&body)
      .send()
      .await?
      .error_for_status()?
      .json()
      .await?;
    info!(
      "Plant.id 返回 {} 个候选",
      raw.suggestions.as_ref().map_or(0, Vec::len)
    );

    Ok(shape_response(raw))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn parse(value: serde_json::Value) -> IdentifyResponse {
    serde_json::from_value(value).unwrap()
  }

  #[test]
  fn missing_or_empty_suggestions_are_no_match() {
    for raw in [json!({}), json!({ "suggestions": [] }), json!({ "suggestions": null })] {
      let response = shape_response(parse(raw));
      assert!(!response.is_plant);
      assert_eq!(response.error.as_deref(), Some(NO_PLANT_MATCHES));
      assert!(response.suggestions.is_empty());
    }
  }

  #[test]
  fn sparse_suggestion_gets_defaults() {
    let response = shape_response(parse(json!({ "suggestions": [{}] })));
    assert!(response.is_plant);
    let suggestion = &response.suggestions[0];
    assert_eq!(suggestion.id, 0);
    assert_eq!(suggestion.plant_name, "Unknown");
    assert_eq!(suggestion.probability, 0.0);
    assert!(suggestion.plant_details.common_names.is_empty());
    assert_eq!(suggestion.plant_details.wiki_description.value, "No description available");
    assert_eq!(suggestion.plant_details.taxonomy, Taxonomy::default());
    assert_eq!(suggestion.plant_details.url, "");
    assert!(suggestion.plant_details.images.is_empty());
  }

  #[test]
  fn full_suggestion_is_kept() {
    let response = shape_response(parse(json!({
      "id": 99,
      "suggestions": [{
        "id": 7,
        "plant_name": "Ficus lyrata",
        "probability": 0.93,
        "plant_details": {
          "common_names": ["Fiddle-leaf fig"],
          "wiki_description": { "value": "A flowering plant.", "citation": "wiki" },
          "taxonomy": { "family": "Moraceae", "genus": "Ficus", "kingdom": "Plantae" },
          "url": "https://en.wikipedia.org/wiki/Ficus_lyrata",
          "images": [{ "url": "https://example.org/a.jpg" }]
        }
      }]
    })));
    let suggestion = &response.suggestions[0];
    assert_eq!(suggestion.id, 7);
    assert_eq!(suggestion.plant_name, "Ficus lyrata");
    assert!((suggestion.probability - 0.93).abs() < 1e-6);
    let details = &suggestion.plant_details;
    assert_eq!(details.common_names, vec!["Fiddle-leaf fig".to_string()]);
    assert_eq!(details.wiki_description.value, "A flowering plant.");
    assert_eq!(details.taxonomy.family, "Moraceae");
    assert_eq!(details.taxonomy.species, "Unknown");
    assert_eq!(details.images[0].caption, None);
  }

  #[test]
  fn request_body_has_expected_shape() {
    let body = IdentifyRequest {
      images: vec![BASE64_STANDARD.encode(b"abc")],
      modifiers: &MODIFIERS,
      plant_language: "en",
      plant_details: &PLANT_DETAILS,
    };
    assert_eq!(
      serde_json::to_value(&body).unwrap(),
      json!({
        "images": ["YWJj"],
        "modifiers": ["crops_fast", "similar_images"],
        "plant_language": "en",
        "plant_details": ["common_names", "url", "wiki_description", "taxonomy", "images"],
      })
    );
  }
}
