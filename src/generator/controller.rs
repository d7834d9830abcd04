//! # 请求状态机
//!
//! ## 设计思路
//!
//! `RequestController` 持有唯一的 [`RequestState`]，只能经由下列转换修改：
//!
//! ```text
//! Idle    --generate()--> Loading --on_load_success--> Ready
//! Loading --on_load_failure--> Error
//! Error   --generate()/retry()--> Loading
//! Ready   --generate()--> Loading
//! Loading --generate()--> Loading（旧请求作废）
//! ```
//!
//! ## 实现思路
//!
//! - 每次 `generate` 分配新的 [`RequestId`]，并同步清空旧的 URL / 错误。
//! - 加载回调必须携带请求号；与当前请求不一致（或当前已不在 Loading）的回调被丢弃，
//!   避免慢速的旧请求覆盖新状态。
//! - 失败详情只写诊断日志，用户看到的是固定文案。

use super::Dimension;
use super::request::{
    ImageRequest, LOAD_FAILURE_MESSAGE, RequestId, RequestState, TokenClock, build_image_url,
};

/// 图片请求控制器。
#[derive(Debug)]
pub struct RequestController {
    base_url: String,
    clock: TokenClock,
    next_id: u64,
    state: RequestState,
    current: Option<ImageRequest>,
    last_dimension: Option<Dimension>,
}

impl RequestController {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            clock: TokenClock::new(),
            next_id: 1,
            state: RequestState::Idle,
            current: None,
            last_dimension: None,
        }
    }

    pub fn state(&self) -> &RequestState {
        &self.state
    }

    /// 最近一次发起的请求（无论是否完成）。
    pub fn current_request(&self) -> Option<&ImageRequest> {
        self.current.as_ref()
    }

    /// 已加载完成的请求；仅在 `Ready` 时可用。
    pub fn ready_request(&self) -> Option<&ImageRequest> {
        match self.state {
            RequestState::Ready(_) => self.current.as_ref(),
            _ => None,
        }
    }

    pub fn last_dimension(&self) -> Option<Dimension> {
        self.last_dimension
    }

    /// 发起新请求并立即进入 `Loading`。
    pub fn generate(&mut self, dimension: Dimension) -> ImageRequest {
        let id = RequestId(self.next_id);
        self.next_id = self.next_id.saturating_add(1);

        let token = self.clock.next_token();
        let url = build_image_url(&self.base_url, dimension, token);

        if let Some(previous) = &self.current {
            if self.state.is_loading() {
                log::debug!("⏭️ 请求 {} 尚未完成即被 {} 取代", previous.id, id);
            }
        }

        let request = ImageRequest { id, url, dimension };
        log::info!("🖼️ 生成图片请求 {} - {} URL: {}", id, dimension, request.url);

        self.state = RequestState::Loading;
        self.current = Some(request.clone());
        self.last_dimension = Some(dimension);
        request
    }

    /// 以上一次的尺寸重新发起请求（错误状态下的“Try Again”）。
    pub fn retry(&mut self) -> Option<ImageRequest> {
        let dimension = self.last_dimension?;
        Some(self.generate(dimension))
    }

    /// 加载成功回调。返回是否被采纳。
    pub fn on_load_success(&mut self, id: RequestId) -> bool {
        let Some(url) = self.pending_url(id) else {
            log::debug!("🗑️ 丢弃过期的加载成功回调 {}", id);
            return false;
        };
        log::info!("✅ 图片加载成功 {} - URL: {}", id, url);
        self.state = RequestState::Ready(url);
        true
    }

    /// 加载失败回调。`details` 只用于诊断日志。
    pub fn on_load_failure(&mut self, id: RequestId, details: &str) -> bool {
        let Some(url) = self.pending_url(id) else {
            log::debug!("🗑️ 丢弃过期的加载失败回调 {}：{}", id, details);
            return false;
        };
        log::error!("❌ 图片加载失败 {} - URL: {} 详情: {}", id, url, details);
        self.state = RequestState::Error(LOAD_FAILURE_MESSAGE.to_string());
        true
    }

    fn pending_url(&self, id: RequestId) -> Option<String> {
        if !self.state.is_loading() {
            return None;
        }
        self.current
            .as_ref()
            .filter(|request| request.id == id)
            .map(|request| request.url.clone())
    }
}
