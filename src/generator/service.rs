//! # 服务层（组件边界）
//!
//! ## 设计思路
//!
//! `GeneratorService` 是整个组件的边界：尺寸选择、请求状态、“已复制”提示
//! 都收拢在一个显式的状态结构里，由服务持有，外部只能通过下列操作修改：
//!
//! - 选择：`select_preset` / `toggle_custom` / `set_custom_width` / `set_custom_height`
//! - 请求：`mount` / `generate` / `retry`
//! - 动作：`download` / `copy_url`
//!
//! ## 实现思路
//!
//! - 状态放在 `Arc<Mutex<WidgetState>>` 中，每次转换只短暂持锁，绝不跨 `.await` 持锁。
//! - `generate` 同步进入 Loading，随后把加载交给 tokio 任务；任务结束时带着请求号回调，
//!   过期结果由状态机丢弃。
//! - 下载与复制失败只写诊断日志，不改变请求状态。
//! - “已复制”提示由一个可取消的定时任务清除；重复复制会中止旧定时器并重新计时，
//!   并用代次号防止已越过 sleep 的旧任务误清新提示。
//!
//! 注意：`mount` / `generate` / `retry` / `copy_url` 需要在 tokio 运行时内调用。

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use serde::Serialize;
use tokio::task::JoinHandle;

use super::actions;
use super::clipboard_writer::{ClipboardSink, SystemClipboard};
use super::controller::RequestController;
use super::dimension::{CustomDimension, DimensionSelector, Preset, SelectionMode};
use super::loader::{HttpImageLoader, ImageLoader};
use super::request::{ImageRequest, RequestId, RequestState};
use super::{Dimension, GeneratorConfig, GeneratorError};

/// 图片格式固定为 JPEG（由图片服务决定）。
const IMAGE_FORMAT_LABEL: &str = "JPEG";

struct WidgetState {
    selector: DimensionSelector,
    controller: RequestController,
    copied: bool,
    copied_generation: u64,
    copied_timer: Option<JoinHandle<()>>,
}

/// 就绪图片的详情面板。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageDetails {
    pub dimensions: Dimension,
    pub format: &'static str,
    pub source: String,
}

/// 组件状态快照，供展示层渲染。
#[derive(Debug, Clone, Serialize)]
pub struct WidgetSnapshot {
    pub mode: SelectionMode,
    pub selected_index: usize,
    pub selected_preset: &'static str,
    pub custom: CustomDimension,
    /// 按当前选择立即生成时会使用的尺寸。
    pub effective_dimension: Dimension,
    pub state: RequestState,
    pub request: Option<ImageRequest>,
    pub copied: bool,
    pub details: Option<ImageDetails>,
}

/// 已发起、尚在加载中的请求。
pub struct PendingLoad {
    pub request: ImageRequest,
    handle: JoinHandle<()>,
}

impl PendingLoad {
    /// 等待加载回调执行完毕（无论成功、失败或被判定过期）。
    pub async fn settled(self) -> Result<(), GeneratorError> {
        self.handle
            .await
            .map_err(|e| GeneratorError::Network(format!("加载任务异常结束：{}", e)))
    }
}

/// 图片生成服务。
pub struct GeneratorService<L: ImageLoader, C: ClipboardSink> {
    state: Arc<Mutex<WidgetState>>,
    loader: Arc<L>,
    clipboard: Arc<C>,
    config: GeneratorConfig,
    download_dir: PathBuf,
}

impl GeneratorService<HttpImageLoader, SystemClipboard> {
    /// 使用 HTTP 加载器与系统剪贴板创建服务。
    pub fn new(config: GeneratorConfig, download_dir: PathBuf) -> Result<Self, GeneratorError> {
        let loader = HttpImageLoader::new(&config)?;
        let clipboard = SystemClipboard::new(&config);
        Self::with_parts(config, loader, clipboard, download_dir)
    }
}

impl<L: ImageLoader, C: ClipboardSink> GeneratorService<L, C> {
    /// 注入自定义加载器与剪贴板，主要用于测试。
    pub fn with_parts(
        config: GeneratorConfig,
        loader: L,
        clipboard: C,
        download_dir: PathBuf,
    ) -> Result<Self, GeneratorError> {
        config.validate()?;

        let state = WidgetState {
            selector: DimensionSelector::new(),
            controller: RequestController::new(config.normalized_base_url()),
            copied: false,
            copied_generation: 0,
            copied_timer: None,
        };

        Ok(Self {
            state: Arc::new(Mutex::new(state)),
            loader: Arc::new(loader),
            clipboard: Arc::new(clipboard),
            config,
            download_dir,
        })
    }

    pub fn download_dir(&self) -> &Path {
        &self.download_dir
    }

    fn lock(&self) -> Result<MutexGuard<'_, WidgetState>, GeneratorError> {
        self.state
            .lock()
            .map_err(|_| GeneratorError::StatePoisoned("widget"))
    }

    /// 组件启动：自动生成第一张图片。
    pub fn mount(&self) -> Result<PendingLoad, GeneratorError> {
        log::info!("🚀 组件启动，自动生成初始图片");
        self.generate()
    }

    /// 按当前选择生成新图片。
    pub fn generate(&self) -> Result<PendingLoad, GeneratorError> {
        let request = {
            let mut guard = self.lock()?;
            let dimension = guard.selector.resolve();
            guard.controller.generate(dimension)
        };
        Ok(self.spawn_load(request))
    }

    /// 以上一次的尺寸重新生成；从未生成过时返回 `None`。
    pub fn retry(&self) -> Result<Option<PendingLoad>, GeneratorError> {
        let request = self.lock()?.controller.retry();
        Ok(request.map(|request| self.spawn_load(request)))
    }

    fn spawn_load(&self, request: ImageRequest) -> PendingLoad {
        let loader = Arc::clone(&self.loader);
        let state = Arc::clone(&self.state);
        let task_request = request.clone();

        let handle = tokio::spawn(async move {
            let outcome = loader.load(&task_request.url).await;

            let Ok(mut guard) = state.lock() else {
                log::error!("🛑 状态锁已中毒，丢弃请求 {} 的加载结果", task_request.id);
                return;
            };

            match outcome {
                Ok(image) => {
                    if guard.controller.on_load_success(task_request.id) {
                        log::debug!(
                            "🧾 请求 {} 响应 {} {}x{}",
                            task_request.id,
                            image.mime_type,
                            image.width,
                            image.height
                        );
                    }
                }
                Err(err) => {
                    let details = format!("[{}:{}] {}", err.stage(), err.code(), err);
                    guard.controller.on_load_failure(task_request.id, &details);
                }
            }
        });

        PendingLoad { request, handle }
    }

    pub fn select_preset(&self, index: usize) -> Result<&'static Preset, GeneratorError> {
        self.lock()?.selector.select_preset(index)
    }

    pub fn select_preset_by_label(&self, label: &str) -> Result<&'static Preset, GeneratorError> {
        self.lock()?.selector.select_preset_by_label(label)
    }

    pub fn toggle_custom(&self) -> Result<SelectionMode, GeneratorError> {
        Ok(self.lock()?.selector.toggle_custom())
    }

    pub fn set_custom_width(&self, text: &str) -> Result<(), GeneratorError> {
        self.lock()?.selector.set_custom_width(text);
        Ok(())
    }

    pub fn set_custom_height(&self, text: &str) -> Result<(), GeneratorError> {
        self.lock()?.selector.set_custom_height(text);
        Ok(())
    }

    pub fn state(&self) -> Result<RequestState, GeneratorError> {
        Ok(self.lock()?.controller.state().clone())
    }

    pub fn is_copied(&self) -> Result<bool, GeneratorError> {
        Ok(self.lock()?.copied)
    }

    pub fn snapshot(&self) -> Result<WidgetSnapshot, GeneratorError> {
        let guard = self.lock()?;
        let selector = &guard.selector;
        let controller = &guard.controller;

        let details = controller.ready_request().map(|request| ImageDetails {
            dimensions: request.dimension,
            format: IMAGE_FORMAT_LABEL,
            source: source_label(self.config.normalized_base_url()),
        });

        Ok(WidgetSnapshot {
            mode: selector.mode(),
            selected_index: selector.selected_index(),
            selected_preset: selector.selected_preset().label,
            custom: selector.custom().clone(),
            effective_dimension: selector.resolve(),
            state: controller.state().clone(),
            request: controller.current_request().cloned(),
            copied: guard.copied,
            details,
        })
    }

    /// 下载当前就绪图片。没有就绪图片或下载失败时返回 `None`（失败仅记录日志）。
    pub async fn download(&self) -> Option<PathBuf> {
        let ready = match self.lock() {
            Ok(guard) => guard.controller.ready_request().cloned(),
            Err(err) => {
                log::error!("Download failed: {}", err);
                return None;
            }
        };
        let Some(request) = ready else {
            log::debug!("⏸️ 没有就绪图片，忽略下载");
            return None;
        };

        match actions::download_image(
            self.loader.as_ref(),
            &request.url,
            request.dimension,
            &self.download_dir,
        )
        .await
        {
            Ok(path) => Some(path),
            Err(err) => {
                log::error!("Download failed: [{}] {}", err.code(), err);
                None
            }
        }
    }

    /// 复制当前就绪图片地址。成功时点亮“已复制”提示并返回 `true`。
    ///
    /// 写入期间若就绪图片已被新请求取代，不点亮提示并返回 `false`。
    pub async fn copy_url(&self) -> bool {
        let ready = match self.lock() {
            Ok(guard) => guard.controller.ready_request().cloned(),
            Err(err) => {
                log::error!("Copy failed: {}", err);
                return false;
            }
        };
        let Some(request) = ready else {
            log::debug!("⏸️ 没有就绪图片，忽略复制");
            return false;
        };

        if let Err(err) = actions::copy_url(self.clipboard.as_ref(), &request.url).await {
            log::error!("Copy failed: [{}] {}", err.code(), err);
            return false;
        }

        match self.arm_copied_indicator(request.id) {
            Ok(armed) => armed,
            Err(err) => {
                log::error!("Copy failed: {}", err);
                false
            }
        }
    }

    /// 仅当 `copied_id` 仍是当前就绪请求时点亮提示。
    fn arm_copied_indicator(&self, copied_id: RequestId) -> Result<bool, GeneratorError> {
        let mut guard = self.lock()?;
        if guard.controller.ready_request().map(|request| request.id) != Some(copied_id) {
            log::debug!("🗑️ 请求 {} 已不是当前就绪图片，不点亮已复制提示", copied_id);
            return Ok(false);
        }

        if let Some(previous) = guard.copied_timer.take() {
            previous.abort();
        }

        guard.copied = true;
        guard.copied_generation = guard.copied_generation.wrapping_add(1);
        let generation = guard.copied_generation;

        let state = Arc::clone(&self.state);
        let delay = self.config.copied_indicator_duration();
        guard.copied_timer = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Ok(mut guard) = state.lock() {
                if guard.copied_generation == generation {
                    guard.copied = false;
                    guard.copied_timer = None;
                }
            }
        }));
        Ok(true)
    }
}

/// 详情面板中的来源名称。
fn source_label(base_url: &str) -> String {
    let host = reqwest::Url::parse(base_url)
        .ok()
        .and_then(|url| url.host_str().map(str::to_string));

    match host.as_deref() {
        Some("picsum.photos") => "Lorem Picsum".to_string(),
        Some(host) => host.to_string(),
        None => base_url.to_string(),
    }
}
