//! # 请求模型与 URL 构造
//!
//! ## 设计思路
//!
//! 一次“生成”对应一个 [`ImageRequest`]：单调递增的请求号 + 完整 URL + 使用的尺寸。
//! 请求号让加载回调可以识别“已被新请求取代”的过期结果。
//!
//! URL 形如 `<base>/<width>/<height>?random=<token>`，token 取毫秒级时间戳，
//! 仅用于绕过缓存。同一进程内 token 严格递增：时钟未前进时取上一个 token + 1。

use std::fmt;

use serde::Serialize;

use super::Dimension;

/// 加载失败时展示给用户的固定文案。
pub const LOAD_FAILURE_MESSAGE: &str = "Failed to load image. Please try again.";

/// 单调递增的请求编号。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct RequestId(pub u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// 一次图片请求。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageRequest {
    pub id: RequestId,
    pub url: String,
    pub dimension: Dimension,
}

/// 当前请求所处阶段。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "detail", rename_all = "lowercase")]
pub enum RequestState {
    Idle,
    Loading,
    Ready(String),
    Error(String),
}

impl RequestState {
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    /// 仅在 `Ready` 时返回图片地址。
    pub fn ready_url(&self) -> Option<&str> {
        match self {
            Self::Ready(url) => Some(url),
            _ => None,
        }
    }
}

/// 基于墙钟毫秒的防缓存 token 生成器。
#[derive(Debug, Default)]
pub struct TokenClock {
    last: u64,
}

impl TokenClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_token(&mut self) -> u64 {
        let now = chrono::Utc::now().timestamp_millis().max(0) as u64;
        self.next_token_at(now)
    }

    /// 给定当前毫秒时间，返回严格大于上一次的 token。
    pub fn next_token_at(&mut self, now_ms: u64) -> u64 {
        let token = if now_ms > self.last {
            now_ms
        } else {
            self.last.saturating_add(1)
        };
        self.last = token;
        token
    }
}

/// 拼接图片地址。`base_url` 不应带末尾 `/`。
pub fn build_image_url(base_url: &str, dimension: Dimension, token: u64) -> String {
    format!(
        "{}/{}/{}?random={}",
        base_url, dimension.width, dimension.height, token
    )
}
