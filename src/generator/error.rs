//! # 错误模型模块
//!
//! ## 设计思路
//!
//! 使用单一错误枚举承载“尺寸选择 → 请求加载 → 下载/复制”链路中的所有错误来源。
//! 通过 `thiserror` 保持人类可读错误，同时让调用侧可按分支匹配。
//!
//! 注意：这里的错误信息仅用于诊断日志，面向用户的加载失败提示是固定文案，
//! 见 [`super::request::LOAD_FAILURE_MESSAGE`]。

/// 图片生成链路统一错误类型。
#[derive(Debug, thiserror::Error)]
pub enum GeneratorError {
    #[error("网络错误：{0}")]
    Network(String),

    #[error("格式错误：{0}")]
    InvalidFormat(String),

    #[error("解码错误：{0}")]
    Decode(String),

    #[error("剪贴板错误：{0}")]
    Clipboard(String),

    #[error("文件错误：{0}")]
    FileSystem(String),

    #[error("超时错误：{0}")]
    Timeout(String),

    #[error("资源限制：{0}")]
    ResourceLimit(String),

    #[error("无效选择：{0}")]
    InvalidSelection(String),

    #[error("状态锁已中毒：{0}")]
    StatePoisoned(&'static str),
}

impl GeneratorError {
    /// 稳定错误码，便于日志检索与聚合。
    pub fn code(&self) -> &'static str {
        match self {
            Self::Network(_) => "E_NETWORK",
            Self::InvalidFormat(_) => "E_INVALID_FORMAT",
            Self::Decode(_) => "E_DECODE",
            Self::Clipboard(_) => "E_CLIPBOARD",
            Self::FileSystem(_) => "E_FILESYSTEM",
            Self::Timeout(_) => "E_TIMEOUT",
            Self::ResourceLimit(_) => "E_RESOURCE_LIMIT",
            Self::InvalidSelection(_) => "E_INVALID_SELECTION",
            Self::StatePoisoned(_) => "E_STATE_POISONED",
        }
    }

    /// 错误发生的阶段。
    pub fn stage(&self) -> &'static str {
        match self {
            Self::Network(_) | Self::Timeout(_) | Self::ResourceLimit(_) => "fetch",
            Self::InvalidFormat(_) | Self::Decode(_) => "inspect",
            Self::Clipboard(_) => "clipboard",
            Self::FileSystem(_) => "save",
            Self::InvalidSelection(_) => "select",
            Self::StatePoisoned(_) => "state",
        }
    }
}
