// 该文件是 Lvye （绿野） 项目的一部分。
// src/service/mock.rs - 未配置识别接口时的示例数据
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

use crate::{
  model::DetectionOutcome,
  service::response::{
    PlantDetails, PredictResponse, ReferenceImage, Suggestion, Taxonomy, WikiDescription,
  },
};

// 次选候选的概率系数
const RUNNER_UP_FACTOR: f32 = 0.8;
// 屏幕翻拍的整体置信度系数
const SCREEN_FACTOR: f32 = 0.9;

struct Entry {
  id: u64,
  plant_name: &'static str,
  common_names: [&'static str; 2],
  description: &'static str,
  taxonomy: [&'static str; 3],
  url: &'static str,
  images: &'static [(&'static str, &'static str)],
  flower_details: &'static [(&'static str, &'static str)],
}

static FLOWERING: [Entry; 2] = [
  Entry {
    id: 12345,
    plant_name: "Rosa hybrid",
    common_names: ["Garden Rose", "Hybrid Tea Rose"],
    description: "Hybrid tea roses are the world's most popular type of rose. They were created by cross-breeding two types of roses, initially the Tea roses with Hybrid Perpetual roses. Hybrid teas exhibit traits midway between both parents.",
    taxonomy: ["Rosaceae", "Rosa", "hybrid"],
    url: "https://en.wikipedia.org/wiki/Hybrid_tea_rose",
    images: &[
      (
        "https://upload.wikimedia.org/wikipedia/commons/e/e6/Red_rose.jpg",
        "Hybrid Tea Rose in bloom",
      ),
      (
        "https://upload.wikimedia.org/wikipedia/commons/8/83/Rose_flower.jpg",
        "Close-up of rose petals",
      ),
    ],
    flower_details: &[
      ("color", "Red/Pink"),
      ("blooming_season", "Spring to Fall"),
      ("petal_count", "30-35"),
      ("fragrance", "Strong, sweet"),
    ],
  },
  Entry {
    id: 67890,
    plant_name: "Orchidaceae Phalaenopsis",
    common_names: ["Moth Orchid", "Phalaenopsis Orchid"],
    description: "Phalaenopsis, also known as moth orchids, is a genus of about seventy species of orchids. Phalaenopsis is one of the most popular orchids in the trade, through the development of many artificial hybrids.",
    taxonomy: ["Orchidaceae", "Phalaenopsis", "hybrid"],
    url: "https://en.wikipedia.org/wiki/Phalaenopsis",
    images: &[(
      "https://upload.wikimedia.org/wikipedia/commons/6/61/Moth_Orchid.jpg",
      "Moth Orchid in full bloom",
    )],
    flower_details: &[
      ("color", "White/Pink"),
      ("blooming_season", "Year-round"),
      ("flower_size", "2-3 inches"),
      ("care_level", "Moderate"),
    ],
  },
];

static FOLIAGE: [Entry; 2] = [
  Entry {
    id: 12345,
    plant_name: "Monstera deliciosa",
    common_names: ["Swiss Cheese Plant", "Split-leaf Philodendron"],
    description: "Monstera deliciosa is a species of flowering plant native to tropical forests of southern Mexico, south to Panama. It has been introduced to many tropical areas, and has become a mildly invasive species in Hawaii, Seychelles, Ascension Island and the Society Islands.",
    taxonomy: ["Araceae", "Monstera", "deliciosa"],
    url: "https://en.wikipedia.org/wiki/Monstera_deliciosa",
    images: &[
      (
        "https://upload.wikimedia.org/wikipedia/commons/0/04/Monstera_deliciosa_1.jpg",
        "Mature Monstera deliciosa plant",
      ),
      (
        "https://upload.wikimedia.org/wikipedia/commons/6/60/Monstera_deliciosa_leaf.jpg",
        "Characteristic split leaf",
      ),
    ],
    flower_details: &[],
  },
  Entry {
    id: 67890,
    plant_name: "Philodendron bipinnatifidum",
    common_names: ["Tree Philodendron", "Split-leaf Philodendron"],
    description: "Philodendron bipinnatifidum is a species of flowering plant in the family Araceae, native to South America. It is commonly known as the lacy tree philodendron or selloum.",
    taxonomy: ["Araceae", "Philodendron", "bipinnatifidum"],
    url: "https://en.wikipedia.org/wiki/Philodendron_bipinnatifidum",
    images: &[(
      "https://upload.wikimedia.org/wikipedia/commons/8/8f/Philodendron_bipinnatifidum_28zz.jpg",
      "Full plant view",
    )],
    flower_details: &[],
  },
];

impl Entry {
  fn to_suggestion(&self, probability: f32) -> Suggestion {
    let [family, genus, species] = self.taxonomy;
    Suggestion {
      id: self.id,
      plant_name: self.plant_name.to_string(),
      probability,
      plant_details: PlantDetails {
        common_names: self.common_names.iter().map(|s| s.to_string()).collect(),
        wiki_description: WikiDescription {
          value: self.description.to_string(),
        },
        taxonomy: Taxonomy {
          family: family.to_string(),
          genus: genus.to_string(),
          species: species.to_string(),
        },
        url: self.url.to_string(),
        images: self
          .images
          .iter()
          .map(|(url, caption)| ReferenceImage {
            url: url.to_string(),
            caption: Some(caption.to_string()),
          })
          .collect(),
        flower_details: (!self.flower_details.is_empty()).then(|| {
          self
            .flower_details
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<BTreeMap<_, _>>()
        }),
      },
    }
  }
}

/// 按检测结论挑选示例候选：有花给出花卉，否则给出观叶植物
pub fn mock_response(outcome: &DetectionOutcome) -> PredictResponse {
  let entries = if outcome.has_flower {
    &FLOWERING
  } else {
    &FOLIAGE
  };
  let confidence = outcome.confidence;
  let suggestions = vec![
    entries[0].to_suggestion(confidence),
    entries[1].to_suggestion(confidence * RUNNER_UP_FACTOR),
  ];

  PredictResponse {
    is_plant: true,
    error: None,
    has_flower: Some(outcome.has_flower),
    confidence: Some(if outcome.is_on_screen {
      confidence * SCREEN_FACTOR
    } else {
      confidence
    }),
    detected_from_screen: Some(outcome.is_on_screen),
    suggestions,
  }
}
