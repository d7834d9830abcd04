//! 下载目录管理模块
//!
//! # 设计思路
//!
//! 统一管理下载图片的保存路径，支持用户自定义目录，
//! 并在目录不存在时自动创建。
//!
//! # 实现思路
//!
//! - 优先使用命令行或设置文件中配置的自定义目录。
//! - 未设置时回退到当前工作目录下的 `downloads` 子目录。
//! - 目录不存在时自动 `create_dir_all`，避免上层判断。
//! - 所有可能失败的操作均返回 `Result`，不使用 `expect()` / `unwrap()`。

use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::AppError;

/// 默认下载子目录名
pub const DEFAULT_DOWNLOADS_DIR: &str = "downloads";

/// 下载目录信息
#[derive(Debug, Clone, Serialize)]
pub struct StorageInfo {
    pub path: String,
    pub total_size: u64,
    pub file_count: u64,
}

/// 获取下载目录
///
/// # 参数
/// * `custom_dir` - 用户自定义目录（可选，空串视为未设置）
///
/// # 返回
/// - `Ok(PathBuf)`：可用的下载目录
/// - `Err(AppError::Storage)`：无法获取或创建目录
pub fn get_downloads_dir(custom_dir: Option<&str>) -> Result<PathBuf, AppError> {
    // 优先使用用户自定义目录
    if let Some(dir) = custom_dir.filter(|dir| !dir.is_empty()) {
        let path = PathBuf::from(dir);
        ensure_dir(&path)
            .map_err(|e| AppError::Storage(format!("创建自定义目录 '{}' 失败: {}", dir, e)))?;
        return Ok(path);
    }

    let cwd = std::env::current_dir()
        .map_err(|e| AppError::Storage(format!("获取当前工作目录失败: {}", e)))?;
    let downloads_dir = cwd.join(DEFAULT_DOWNLOADS_DIR);
    ensure_dir(&downloads_dir)
        .map_err(|e| AppError::Storage(format!("创建下载目录失败: {}", e)))?;
    Ok(downloads_dir)
}

fn ensure_dir(path: &Path) -> std::io::Result<()> {
    if path.is_dir() {
        return Ok(());
    }
    fs::create_dir_all(path)
}

/// 获取下载目录信息（路径 + 占用大小 + 文件数）
pub fn get_downloads_dir_info(dir: &Path) -> Result<StorageInfo, AppError> {
    let mut total_size: u64 = 0;
    let mut file_count: u64 = 0;

    for entry in fs::read_dir(dir)?.flatten() {
        if let Ok(metadata) = entry.metadata() {
            if metadata.is_file() {
                total_size += metadata.len();
                file_count += 1;
            }
        }
    }

    Ok(StorageInfo {
        path: dir.to_string_lossy().to_string(),
        total_size,
        file_count,
    })
}
