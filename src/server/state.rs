// 该文件是 Lvye （绿野） 项目的一部分。
// src/server/state.rs - 处理函数共享状态
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

use std::sync::Arc;

use crate::{
  config::AppConfig,
  service::{PlantService, ServiceError},
};

/// 只读共享，请求之间没有可变状态
#[derive(Clone)]
pub struct HttpState {
  pub service: Arc<PlantService>,
}

impl HttpState {
  pub fn new(config: Arc<AppConfig>) -> Result<Self, ServiceError> {
    Ok(Self {
      service: Arc::new(PlantService::new(config)?),
    })
  }

  pub fn with_service(service: PlantService) -> Self {
    Self {
      service: Arc::new(service),
    }
  }
}
