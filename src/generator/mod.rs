//! # 图片生成模块（generator）
//!
//! ## 设计思路
//!
//! 该模块把“尺寸选择 → URL 构造 → 异步加载 → 就绪/错误 → 下载/复制”
//! 按职责拆分为多个子模块，状态机本身与网络、剪贴板完全解耦。
//!
//! - `dimension`：预设列表、自定义输入解析、选择状态（纯逻辑）
//! - `request`：请求号、请求状态、防缓存 token 与 URL 构造
//! - `controller`：请求状态机（Loading → Ready / Error，过期回调丢弃）
//! - `loader`：图片加载协作者（trait + reqwest 实现）
//! - `clipboard_writer`：剪贴板协作者（trait + arboard 实现）
//! - `actions`：下载保存与复制地址
//! - `service`：组件边界，持有状态并编排异步任务
//! - `config/error`：配置与错误
//!
//! ## 新同事快速上手
//!
//! ```text
//! 终端命令 (shell.rs)
//!    ↓
//! service.rs（状态持有 + 任务编排）
//!    ├─ dimension.rs（解析有效尺寸）
//!    ├─ controller.rs（生成请求 / 处理回调）
//!    │     └─ request.rs（URL + token）
//!    ├─ loader.rs（加载并确认是图片）
//!    └─ actions.rs（下载 / 复制）
//!          └─ clipboard_writer.rs（写剪贴板 + 重试）
//! ```

pub mod actions;
mod clipboard_writer;
mod config;
mod controller;
mod dimension;
mod error;
mod loader;
mod request;
mod service;

pub use clipboard_writer::{ClipboardSink, SystemClipboard};
pub use config::{DEFAULT_BASE_URL, GeneratorConfig};
pub use controller::RequestController;
pub use dimension::{
    CustomDimension, DEFAULT_PRESET_INDEX, Dimension, DimensionSelector, PRESETS, Preset,
    SelectionMode, parse_dimension_field, resolve_dimension,
};
pub use error::GeneratorError;
pub use loader::{HttpImageLoader, ImageLoader, LoadedImage};
pub use request::{
    ImageRequest, LOAD_FAILURE_MESSAGE, RequestId, RequestState, TokenClock, build_image_url,
};
pub use service::{GeneratorService, ImageDetails, PendingLoad, WidgetSnapshot};

/// 默认组合：HTTP 加载器 + 系统剪贴板。
pub type DefaultGeneratorService = GeneratorService<HttpImageLoader, SystemClipboard>;
