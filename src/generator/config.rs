//! # 配置模块
//!
//! ## 设计思路
//!
//! 将所有“可调策略”集中到 `GeneratorConfig`，保证运行时行为可观测、可调整、可测试。
//! 字段覆盖了 URL 构造、图片加载、下载保存与剪贴板写入四个阶段。
//!
//! ## 实现思路
//!
//! - `Default` 提供生产可用配置（Lorem Picsum + 2 秒“已复制”提示）。
//! - 上层 `settings` 模块只覆盖设置文件中出现的字段，其余保持默认值。
//! - `validate` 在服务创建前拒绝明显无效的组合，避免运行中才暴露问题。

use std::time::Duration;

use super::GeneratorError;

/// 默认图片服务地址。
pub const DEFAULT_BASE_URL: &str = "https://picsum.photos";

/// 图片生成配置。
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// 图片服务基础地址（不含末尾 `/`）。
    pub base_url: String,
    /// “已复制”提示自动清除的延迟（毫秒）。
    pub copied_indicator_ms: u64,
    /// 加载/下载时允许的最大响应体积（字节）。
    pub max_file_size: u64,
    /// 单次请求总超时（秒）。
    pub download_timeout: u64,
    /// 建立连接（TCP/TLS）超时时间（秒）。
    pub connect_timeout: u64,
    /// 分块读取超时时间（毫秒）。
    pub stream_chunk_timeout_ms: u64,
    /// 写入剪贴板失败时最大尝试次数。
    pub clipboard_retries: u32,
    /// 重试基础间隔（毫秒）。
    pub clipboard_retry_delay: u64,
    /// 单次写入流程允许的总重试预算（毫秒）。
    pub clipboard_retry_max_total_ms: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            copied_indicator_ms: 2_000,
            max_file_size: 50 * 1024 * 1024,
            download_timeout: 30,
            connect_timeout: 8,
            stream_chunk_timeout_ms: 15_000,
            clipboard_retries: 3,
            clipboard_retry_delay: 100,
            clipboard_retry_max_total_ms: 1_800,
        }
    }
}

impl GeneratorConfig {
    pub fn copied_indicator_duration(&self) -> Duration {
        Duration::from_millis(self.copied_indicator_ms)
    }

    /// 去掉末尾 `/` 后的基础地址。
    pub fn normalized_base_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    /// 校验配置组合是否可用。
    pub fn validate(&self) -> Result<(), GeneratorError> {
        let base = self.normalized_base_url();
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(GeneratorError::InvalidFormat(format!(
                "base_url 必须以 http:// 或 https:// 开头：{}",
                self.base_url
            )));
        }
        if base.contains('?') || base.contains('#') {
            return Err(GeneratorError::InvalidFormat(format!(
                "base_url 不能包含查询串或片段：{}",
                self.base_url
            )));
        }
        if self.max_file_size == 0 {
            return Err(GeneratorError::InvalidFormat("max_file_size 不能为 0".to_string()));
        }
        if !(1..=600).contains(&self.download_timeout) {
            return Err(GeneratorError::InvalidFormat(
                "download_timeout 必须在 1~600 秒之间".to_string(),
            ));
        }
        if !(1..=120).contains(&self.connect_timeout) {
            return Err(GeneratorError::InvalidFormat(
                "connect_timeout 必须在 1~120 秒之间".to_string(),
            ));
        }
        if !(500..=120_000).contains(&self.stream_chunk_timeout_ms) {
            return Err(GeneratorError::InvalidFormat(
                "stream_chunk_timeout_ms 必须在 500~120000 毫秒之间".to_string(),
            ));
        }
        if self.clipboard_retries == 0 {
            return Err(GeneratorError::InvalidFormat(
                "clipboard_retries 至少为 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = GeneratorConfig::default();
        config.validate().expect("default config should be valid");
        assert_eq!(config.copied_indicator_duration(), Duration::from_millis(2_000));
        assert_eq!(config.normalized_base_url(), "https://picsum.photos");
    }

    #[test]
    fn trailing_slash_is_trimmed() {
        let config = GeneratorConfig {
            base_url: "https://picsum.photos///".to_string(),
            ..GeneratorConfig::default()
        };
        assert_eq!(config.normalized_base_url(), "https://picsum.photos");
    }

    #[test]
    fn rejects_non_http_base_url() {
        let config = GeneratorConfig {
            base_url: "ftp://picsum.photos".to_string(),
            ..GeneratorConfig::default()
        };
        assert!(matches!(config.validate(), Err(GeneratorError::InvalidFormat(_))));
    }

    #[test]
    fn rejects_base_url_with_query() {
        let config = GeneratorConfig {
            base_url: "https://picsum.photos?x=1".to_string(),
            ..GeneratorConfig::default()
        };
        assert!(matches!(config.validate(), Err(GeneratorError::InvalidFormat(_))));
    }

    #[test]
    fn rejects_out_of_range_timeouts() {
        let config = GeneratorConfig {
            connect_timeout: 0,
            ..GeneratorConfig::default()
        };
        assert!(matches!(config.validate(), Err(GeneratorError::InvalidFormat(_))));

        let config = GeneratorConfig {
            stream_chunk_timeout_ms: 100,
            ..GeneratorConfig::default()
        };
        assert!(matches!(config.validate(), Err(GeneratorError::InvalidFormat(_))));
    }
}
