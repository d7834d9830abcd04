//! 统一错误类型模块
//!
//! # 设计思路
//!
//! 定义应用级统一的 `AppError` 枚举，替代各模块中分散的
//! `.map_err(|e| e.to_string())`、`format!(...)`、`expect()` 等不一致模式。
//!
//! 设置加载、存储目录、终端命令解析与图片生成链路的错误都汇总到这里，
//! 终端层只需处理一种错误类型。
//!
//! # 实现思路
//!
//! - 使用 `thiserror` 派生可读错误消息。
//! - 为 `GeneratorError` 与 `std::io::Error` 提供 `From` 转换，无需手动 map。

use crate::generator::GeneratorError;

/// 应用级统一错误类型
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// 图片生成链路错误（选择 / 加载 / 下载 / 复制）
    #[error("{0}")]
    Generator(#[from] GeneratorError),

    /// 文件系统 I/O 错误
    #[error("文件系统错误: {0}")]
    Io(#[from] std::io::Error),

    /// 下载目录不可用
    #[error("存储目录不可用: {0}")]
    Storage(String),

    /// 设置文件读取或解析失败
    #[error("设置错误: {0}")]
    Settings(String),

    /// 终端命令无法解析
    #[error("命令错误: {0}")]
    Command(String),
}
