//! # 下载 / 复制动作
//!
//! 两个动作都只读取当前已就绪的 URL，本身不修改请求状态。
//! 失败只返回错误，是否向用户展示由服务层决定（当前仅写诊断日志）。

use std::path::{Path, PathBuf};

use super::clipboard_writer::ClipboardSink;
use super::loader::{ImageLoader, redact_url_for_log};
use super::{Dimension, GeneratorError};

/// 下载文件名：`generated-image-<width>x<height>.jpg`。
pub fn download_file_name(dimension: Dimension) -> String {
    format!("generated-image-{}x{}.jpg", dimension.width, dimension.height)
}

/// 获取图片字节并保存到 `dir` 下，返回文件路径。
///
/// 同名文件会被覆盖。
pub async fn download_image<L: ImageLoader>(
    loader: &L,
    url: &str,
    dimension: Dimension,
    dir: &Path,
) -> Result<PathBuf, GeneratorError> {
    log::info!("⬇️ 开始下载图片 - URL: {}", redact_url_for_log(url));

    let bytes = loader.fetch_bytes(url).await?;
    let path = dir.join(download_file_name(dimension));

    tokio::fs::write(&path, &bytes)
        .await
        .map_err(|e| GeneratorError::FileSystem(format!("写入 '{}' 失败：{}", path.display(), e)))?;

    log::info!(
        "💾 图片已保存 - 路径: {} 体积: {}KB",
        path.display(),
        bytes.len() / 1024
    );
    Ok(path)
}

/// 将 URL 原样写入剪贴板。
pub async fn copy_url<C: ClipboardSink>(clipboard: &C, url: &str) -> Result<(), GeneratorError> {
    log::debug!("📋 复制图片地址 - URL: {}", redact_url_for_log(url));
    clipboard.write_text(url).await
}
