//! # 占位图生成器：库入口
//!
//! ## 架构总览
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                 终端 (shell，逐行命令)                     │
//! │  presets / preset / custom / width / height              │
//! │  generate / retry / download / copy / status / storage   │
//! └───────┼──────────────────────────────────────────────────┘
//!         ↕ Result<String, AppError>
//! ┌───────┼──────────────────────────────────────────────────┐
//! │       ↕            组件 (Rust)                            │
//! │                                                          │
//! │  ┌─ error ────── AppError (统一错误类型)                  │
//! │  │                                                       │
//! │  ├─ generator ── 尺寸选择 + 请求状态机 + 加载 + 动作       │
//! │  │   ├─ dimension   预设 / 自定义解析                      │
//! │  │   ├─ controller  Loading → Ready / Error               │
//! │  │   ├─ loader      reqwest 拉取 + 格式校验                │
//! │  │   └─ service     状态持有 + tokio 任务编排              │
//! │  │                                                       │
//! │  ├─ settings       JSON 设置文件                          │
//! │  └─ storage        下载目录 (返回 Result)                 │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## 模块职责
//!
//! | 模块 | 职责 |
//! |------|------|
//! | [`error`] | 统一错误类型 `AppError`，终端命令的返回类型 |
//! | [`generator`] | 尺寸选择、图片地址构造、异步加载、下载与复制 |
//! | [`settings`] | 可选 JSON 设置文件的定位与解析 |
//! | [`shell`] | 命令解析、状态渲染、交互主循环 |
//! | [`storage`] | 下载目录的获取与自动创建 |

pub mod error;
pub mod generator;
pub mod settings;
pub mod shell;
pub mod storage;
