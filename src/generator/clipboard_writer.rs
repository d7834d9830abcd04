//! # 剪贴板写入模块
//!
//! ## 设计思路
//!
//! 与操作系统剪贴板交互的逻辑独立出来，便于隔离平台不稳定因素，
//! 同时让服务层只依赖 [`ClipboardSink`] trait，测试可注入内存实现。
//!
//! ## 实现思路
//!
//! - `arboard` 是阻塞 API，写入放到 `spawn_blocking` 中执行，避免阻塞 async 运行时。
//! - 其他进程短暂占用剪贴板时会失败，采用“指数退避 + 抖动”的有限重试，
//!   并受总预算约束，超出预算直接放弃。

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use super::{GeneratorConfig, GeneratorError};

/// 文本剪贴板写入能力。
pub trait ClipboardSink: Send + Sync + 'static {
    fn write_text(&self, text: &str) -> impl Future<Output = Result<(), GeneratorError>> + Send;
}

/// 基于 `arboard` 的系统剪贴板。
#[derive(Debug, Clone)]
pub struct SystemClipboard {
    retries: u32,
    retry_delay_ms: u64,
    retry_max_total_ms: u64,
}

impl SystemClipboard {
    pub fn new(config: &GeneratorConfig) -> Self {
        Self {
            retries: config.clipboard_retries.max(1),
            retry_delay_ms: config.clipboard_retry_delay.max(1),
            retry_max_total_ms: config.clipboard_retry_max_total_ms,
        }
    }

    /// 在阻塞线程中执行写入 + 重试。
    fn write_text_with_retry(
        text: &str,
        retries: u32,
        retry_delay_ms: u64,
        retry_max_total_ms: u64,
    ) -> Result<(), GeneratorError> {
        let started = Instant::now();
        let mut last_error = None;

        for attempt in 1..=retries {
            if attempt > 1 {
                let elapsed_ms = started.elapsed().as_millis() as u64;
                let wait_ms = compute_backoff_delay_with_jitter(retry_delay_ms, attempt - 1);
                if elapsed_ms.saturating_add(wait_ms) > retry_max_total_ms {
                    log::warn!(
                        "⏱️ 跳过第 {} 次重试：等待 {}ms 会超过预算 {}ms",
                        attempt,
                        wait_ms,
                        retry_max_total_ms
                    );
                    break;
                }
                log::debug!("🔄 重试 {}/{}，等待 {}ms", attempt, retries, wait_ms);
                std::thread::sleep(Duration::from_millis(wait_ms));
            }

            let result =
                arboard::Clipboard::new().and_then(|mut clipboard| clipboard.set_text(text));
            match result {
                Ok(()) => {
                    log::info!("✅ 已复制到剪贴板 (尝试 {})", attempt);
                    return Ok(());
                }
                Err(err) => {
                    log::warn!("❌ 剪贴板写入尝试 {} 失败: {}", attempt, err);
                    last_error = Some(err.to_string());
                }
            }
        }

        Err(GeneratorError::Clipboard(
            last_error.unwrap_or_else(|| "未知错误".to_string()),
        ))
    }
}

impl ClipboardSink for SystemClipboard {
    async fn write_text(&self, text: &str) -> Result<(), GeneratorError> {
        let text = text.to_string();
        let retries = self.retries;
        let retry_delay_ms = self.retry_delay_ms;
        let retry_max_total_ms = self.retry_max_total_ms;

        tokio::task::spawn_blocking(move || {
            Self::write_text_with_retry(&text, retries, retry_delay_ms, retry_max_total_ms)
        })
        .await
        .map_err(|e| GeneratorError::Clipboard(format!("线程执行失败：{}", e)))?
    }
}

static JITTER_STATE: AtomicU64 = AtomicU64::new(0);

fn next_jitter_u64() -> u64 {
    let mut current = JITTER_STATE.load(Ordering::Relaxed);

    loop {
        let seeded = if current == 0 {
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_nanos() as u64)
                .unwrap_or(0)
                ^ 0x9E37_79B9_7F4A_7C15
        } else {
            current
        };

        // xorshift64
        let mut next = seeded;
        next ^= next << 13;
        next ^= next >> 7;
        next ^= next << 17;

        match JITTER_STATE.compare_exchange_weak(
            current,
            next,
            Ordering::Relaxed,
            Ordering::Relaxed,
        ) {
            Ok(_) => return next,
            Err(observed) => current = observed,
        }
    }
}

fn compute_backoff_delay_with_jitter(base_delay_ms: u64, attempt: u32) -> u64 {
    let exp = base_delay_ms.saturating_mul(1_u64 << attempt.saturating_sub(1).min(8));
    let jitter_bound = (exp / 3).max(1);
    exp.saturating_add(next_jitter_u64() % (jitter_bound + 1))
}
