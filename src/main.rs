//! # 占位图生成器：应用入口
//!
//! 本文件仅负责日志、设置、服务初始化与终端循环启动。
//! 业务逻辑分布在各子模块中，详见 `lib.rs` 架构文档。

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use image_generator::error::AppError;
use image_generator::generator::{DefaultGeneratorService, GeneratorConfig};
use image_generator::{settings, shell, storage};
use tokio::io::{AsyncWriteExt, BufReader};

#[derive(Parser, Debug)]
#[command(name = "image-generator", version, about = "Placeholder image generator")]
struct Args {
    /// JSON settings file (falls back to IMAGE_GENERATOR_SETTINGS)
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Image service base URL
    #[arg(long)]
    base_url: Option<String>,

    /// Directory for downloaded images
    #[arg(long)]
    download_dir: Option<String>,

    /// Do not generate an image on startup
    #[arg(long)]
    no_auto_generate: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("启动失败: {err}");
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<(), AppError> {
    let mut config = GeneratorConfig::default();
    let mut download_dir = None;

    if let Some(path) = settings::settings_file_path(args.settings) {
        let loaded = settings::load_settings(&path)?;
        log::info!("setup: settings loaded from {}", path.display());
        loaded.apply_to(&mut config);
        download_dir = loaded.download_dir;
    }

    // 命令行参数优先于设置文件
    if let Some(base_url) = args.base_url {
        config.base_url = base_url;
    }
    if args.download_dir.is_some() {
        download_dir = args.download_dir;
    }

    let download_dir = storage::get_downloads_dir(download_dir.as_deref())?;
    log::info!("setup: download dir {}", download_dir.display());

    let service = DefaultGeneratorService::new(config, download_dir)?;
    let mut stdout = tokio::io::stdout();

    if !args.no_auto_generate {
        service.mount()?.settled().await?;
        let snapshot = service.snapshot()?;
        stdout
            .write_all(shell::render_snapshot(&snapshot).as_bytes())
            .await?;
    }

    stdout.write_all(b"Type \"help\" for commands\n").await?;
    shell::run(&service, BufReader::new(tokio::io::stdin()), &mut stdout).await?;

    log::info!("👋 退出");
    Ok(())
}
