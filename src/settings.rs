//! 应用设置模块
//!
//! # 设计思路
//!
//! 设置文件是可选的 JSON，只写需要覆盖的字段即可，其余保持 `GeneratorConfig` 默认值。
//! 设置文件路径来自命令行 `--settings`，其次是环境变量 `IMAGE_GENERATOR_SETTINGS`；
//! 两者都没有时直接使用默认配置。
//!
//! ```json
//! {
//!   "base_url": "https://picsum.photos",
//!   "copied_indicator_ms": 2000,
//!   "download_dir": "./downloads"
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::generator::GeneratorConfig;

/// 设置文件路径环境变量。
pub const SETTINGS_ENV_VAR: &str = "IMAGE_GENERATOR_SETTINGS";

/// 设置文件内容（所有字段可选）。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppSettings {
    pub base_url: Option<String>,
    pub copied_indicator_ms: Option<u64>,
    pub max_file_size: Option<u64>,
    pub download_timeout: Option<u64>,
    pub connect_timeout: Option<u64>,
    pub stream_chunk_timeout_ms: Option<u64>,
    pub clipboard_retries: Option<u32>,
    pub clipboard_retry_delay: Option<u64>,
    pub clipboard_retry_max_total_ms: Option<u64>,
    pub download_dir: Option<String>,
}

impl AppSettings {
    /// 将出现的字段覆盖到配置上。
    pub fn apply_to(&self, config: &mut GeneratorConfig) {
        if let Some(value) = &self.base_url {
            config.base_url = value.clone();
        }
        if let Some(value) = self.copied_indicator_ms {
            config.copied_indicator_ms = value;
        }
        if let Some(value) = self.max_file_size {
            config.max_file_size = value;
        }
        if let Some(value) = self.download_timeout {
            config.download_timeout = value;
        }
        if let Some(value) = self.connect_timeout {
            config.connect_timeout = value;
        }
        if let Some(value) = self.stream_chunk_timeout_ms {
            config.stream_chunk_timeout_ms = value;
        }
        if let Some(value) = self.clipboard_retries {
            config.clipboard_retries = value;
        }
        if let Some(value) = self.clipboard_retry_delay {
            config.clipboard_retry_delay = value;
        }
        if let Some(value) = self.clipboard_retry_max_total_ms {
            config.clipboard_retry_max_total_ms = value;
        }
    }
}

/// 解析设置文件路径：显式参数优先，其次环境变量。
pub fn settings_file_path(explicit: Option<PathBuf>) -> Option<PathBuf> {
    explicit.or_else(|| {
        std::env::var_os(SETTINGS_ENV_VAR)
            .filter(|value| !value.is_empty())
            .map(PathBuf::from)
    })
}

/// 读取设置文件；文件不存在视为错误（路径是用户显式给出的）。
pub fn load_settings(path: &Path) -> Result<AppSettings, AppError> {
    let content = fs::read_to_string(path).map_err(|e| {
        AppError::Settings(format!("读取设置文件 '{}' 失败: {}", path.display(), e))
    })?;

    serde_json::from_str::<AppSettings>(&content)
        .map_err(|e| AppError::Settings(format!("解析设置文件 '{}' 失败: {}", path.display(), e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_settings_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "image-generator-settings-{}-{}.json",
            std::process::id(),
            name
        ))
    }

    #[test]
    fn partial_settings_override_only_present_fields() {
        let settings: AppSettings = serde_json::from_str(
            r#"{ "base_url": "http://127.0.0.1:9000", "copied_indicator_ms": 500 }"#,
        )
        .expect("valid settings json");

        let mut config = GeneratorConfig::default();
        settings.apply_to(&mut config);

        assert_eq!(config.base_url, "http://127.0.0.1:9000");
        assert_eq!(config.copied_indicator_ms, 500);
        assert_eq!(config.download_timeout, GeneratorConfig::default().download_timeout);
    }

    #[test]
    fn empty_object_keeps_defaults() {
        let settings: AppSettings = serde_json::from_str("{}").expect("valid settings json");
        assert_eq!(settings, AppSettings::default());
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let result = serde_json::from_str::<AppSettings>(r#"{ "bas_url": "typo" }"#);
        assert!(result.is_err());
    }

    #[test]
    fn load_settings_reads_file() {
        let path = temp_settings_path("read");
        fs::write(&path, r#"{ "download_dir": "/tmp/pics", "clipboard_retries": 5 }"#)
            .expect("write temp settings");

        let settings = load_settings(&path).expect("settings should load");
        let _ = fs::remove_file(&path);

        assert_eq!(settings.download_dir.as_deref(), Some("/tmp/pics"));
        assert_eq!(settings.clipboard_retries, Some(5));
    }

    #[test]
    fn load_settings_reports_missing_and_malformed_files() {
        let missing = temp_settings_path("missing");
        assert!(matches!(load_settings(&missing), Err(AppError::Settings(_))));

        let malformed = temp_settings_path("malformed");
        fs::write(&malformed, "{ not json").expect("write temp settings");
        let result = load_settings(&malformed);
        let _ = fs::remove_file(&malformed);
        assert!(matches!(result, Err(AppError::Settings(_))));
    }

    #[test]
    fn explicit_path_wins() {
        let explicit = PathBuf::from("/etc/image-generator.json");
        assert_eq!(settings_file_path(Some(explicit.clone())), Some(explicit));
    }
}
