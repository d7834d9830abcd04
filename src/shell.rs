//! 终端交互模块
//!
//! # 设计思路
//!
//! 终端是组件的展示层：每行一条命令，解析后调用 `GeneratorService` 的对应操作，
//! 再把状态快照渲染成文本。命令层只做参数适配，不承载业务逻辑。
//!
//! # 实现思路
//!
//! - `parse_command` 为纯函数，便于单测。
//! - `generate` / `retry` 会等待本次加载结束再接受下一条命令
//!   （相当于加载中禁用“生成”按钮）。
//! - 下载、复制失败时保持静默，诊断信息只进日志。
//! - 输入输出都是泛型的 tokio 异步读写端，测试可直接传入内存缓冲。

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::AppError;
use crate::generator::{
    ClipboardSink, GeneratorService, ImageLoader, PRESETS, RequestState, SelectionMode,
    WidgetSnapshot,
};
use crate::storage;

pub const PROMPT: &str = "> ";

pub const HELP: &str = "\
Commands:
  presets              list predefined sizes
  preset <n|label>     select a predefined size (n starts at 1)
  custom               toggle custom size
  width <value>        set custom width
  height <value>       set custom height
  generate             generate a new image
  retry                try again with the last size
  download             save the ready image to the download directory
  copy                 copy the image URL to the clipboard
  status               show the current state
  storage              show download directory usage
  help                 show this help
  quit                 exit
";

/// 预设引用方式：序号（从 1 开始）或名称。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresetRef {
    Number(usize),
    Label(String),
}

/// 终端命令。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Presets,
    Preset(PresetRef),
    Custom,
    Width(String),
    Height(String),
    Generate,
    Retry,
    Download,
    Copy,
    Status,
    Storage,
    Help,
    Quit,
}

/// 解析一行输入。空行返回 `Ok(None)`。
pub fn parse_command(line: &str) -> Result<Option<Command>, AppError> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let (name, rest) = match trimmed.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, rest.trim()),
        None => (trimmed, ""),
    };

    let command = match name.to_ascii_lowercase().as_str() {
        "presets" | "list" => Command::Presets,
        "preset" | "select" => {
            if rest.is_empty() {
                return Err(AppError::Command("preset 需要序号或名称".to_string()));
            }
            match rest.parse::<usize>() {
                Ok(number) => Command::Preset(PresetRef::Number(number)),
                Err(_) => Command::Preset(PresetRef::Label(rest.to_string())),
            }
        }
        "custom" => Command::Custom,
        "width" | "w" => Command::Width(rest.to_string()),
        "height" | "h" => Command::Height(rest.to_string()),
        "generate" | "gen" | "g" => Command::Generate,
        "retry" | "again" => Command::Retry,
        "download" | "save" => Command::Download,
        "copy" => Command::Copy,
        "status" | "s" => Command::Status,
        "storage" => Command::Storage,
        "help" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        other => {
            return Err(AppError::Command(format!(
                "未知命令：{}（输入 help 查看帮助）",
                other
            )));
        }
    };

    Ok(Some(command))
}

/// 终端序号（从 1 开始）转为预设下标。
fn preset_index(number: usize) -> Result<usize, AppError> {
    if number == 0 || number > PRESETS.len() {
        return Err(AppError::Command(format!(
            "预设序号超出范围：{}（可选 1~{}）",
            number,
            PRESETS.len()
        )));
    }
    Ok(number - 1)
}

/// 渲染预设列表，当前高亮项以 `*` 标记。
pub fn render_presets(snapshot: &WidgetSnapshot) -> String {
    let mut out = String::from("Predefined Sizes\n");
    for (index, preset) in PRESETS.iter().enumerate() {
        let active = snapshot.mode == SelectionMode::Preset && snapshot.selected_index == index;
        out.push_str(&format!(
            "{} {:>2}. {:<17} {} × {}\n",
            if active { "*" } else { " " },
            index + 1,
            preset.label,
            preset.width,
            preset.height
        ));
    }
    out
}

/// 渲染状态快照。
pub fn render_snapshot(snapshot: &WidgetSnapshot) -> String {
    let mut out = String::new();

    match snapshot.mode {
        SelectionMode::Preset => {
            out.push_str(&format!(
                "Size: {} ({})\n",
                snapshot.effective_dimension.label(),
                snapshot.selected_preset
            ));
        }
        SelectionMode::Custom => {
            out.push_str(&format!(
                "Size: {} (custom: width \"{}\", height \"{}\")\n",
                snapshot.effective_dimension.label(),
                snapshot.custom.width,
                snapshot.custom.height
            ));
        }
    }

    match &snapshot.state {
        RequestState::Idle => {
            out.push_str("Type \"generate\" to create an image\n");
        }
        RequestState::Loading => out.push_str("Generating image...\n"),
        RequestState::Ready(url) => {
            out.push_str(&format!("Image URL: {}\n", url));
            if snapshot.copied {
                out.push_str("Copied!\n");
            }
        }
        RequestState::Error(message) => {
            out.push_str(&format!("⚠️ Error: {}\n", message));
            out.push_str("Type \"retry\" to Try Again\n");
        }
    }

    if let Some(details) = &snapshot.details {
        out.push_str(&format!(
            "Image Details: Dimensions {} | Format {} | Source {}\n",
            details.dimensions, details.format, details.source
        ));
    }

    out
}

/// 执行单条命令，返回要输出的文本。
pub async fn execute<L: ImageLoader, C: ClipboardSink>(
    service: &GeneratorService<L, C>,
    command: Command,
) -> Result<String, AppError> {
    let output = match command {
        Command::Presets => render_presets(&service.snapshot()?),
        Command::Preset(reference) => {
            let preset = match reference {
                PresetRef::Number(number) => service.select_preset(preset_index(number)?)?,
                PresetRef::Label(label) => service.select_preset_by_label(&label)?,
            };
            format!("Selected {} ({} × {})\n", preset.label, preset.width, preset.height)
        }
        Command::Custom => {
            let mode = service.toggle_custom()?;
            let snapshot = service.snapshot()?;
            match mode {
                SelectionMode::Custom => format!(
                    "Custom size on: width \"{}\", height \"{}\"\n",
                    snapshot.custom.width, snapshot.custom.height
                ),
                SelectionMode::Preset => format!("Custom size off: {}\n", snapshot.selected_preset),
            }
        }
        Command::Width(text) => {
            service.set_custom_width(&text)?;
            render_size_line(service)?
        }
        Command::Height(text) => {
            service.set_custom_height(&text)?;
            render_size_line(service)?
        }
        Command::Generate => {
            service.generate()?.settled().await?;
            render_snapshot(&service.snapshot()?)
        }
        Command::Retry => match service.retry()? {
            Some(pending) => {
                pending.settled().await?;
                render_snapshot(&service.snapshot()?)
            }
            None => "Nothing to retry yet\n".to_string(),
        },
        Command::Download => {
            if service.state()?.ready_url().is_none() {
                "No image ready\n".to_string()
            } else {
                match service.download().await {
                    Some(path) => format!("Saved to {}\n", path.display()),
                    None => String::new(),
                }
            }
        }
        Command::Copy => {
            if service.state()?.ready_url().is_none() {
                "No image ready\n".to_string()
            } else if service.copy_url().await {
                "Copied!\n".to_string()
            } else {
                String::new()
            }
        }
        Command::Status => render_snapshot(&service.snapshot()?),
        Command::Storage => {
            let info = storage::get_downloads_dir_info(service.download_dir())?;
            format!(
                "Downloads: {} ({} files, {:.1} KB)\n",
                info.path,
                info.file_count,
                info.total_size as f64 / 1024.0
            )
        }
        Command::Help => HELP.to_string(),
        Command::Quit => String::new(),
    };
    Ok(output)
}

fn render_size_line<L: ImageLoader, C: ClipboardSink>(
    service: &GeneratorService<L, C>,
) -> Result<String, AppError> {
    let snapshot = service.snapshot()?;
    let mut line = format!("Size: {}", snapshot.effective_dimension.label());
    if snapshot.mode == SelectionMode::Preset {
        line.push_str(" (custom size is off, type \"custom\" to use it)");
    }
    line.push('\n');
    Ok(line)
}

/// 交互主循环：读到 `quit` 或输入结束为止。
pub async fn run<L, C, R, W>(
    service: &GeneratorService<L, C>,
    input: R,
    output: &mut W,
) -> Result<(), AppError>
where
    L: ImageLoader,
    C: ClipboardSink,
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();

    output.write_all(PROMPT.as_bytes()).await?;
    output.flush().await?;

    while let Some(line) = lines.next_line().await? {
        let text = match parse_command(&line) {
            Ok(None) => String::new(),
            Ok(Some(Command::Quit)) => break,
            Ok(Some(command)) => match execute(service, command).await {
                Ok(text) => text,
                Err(err) => format!("{}\n", err),
            },
            Err(err) => format!("{}\n", err),
        };

        output.write_all(text.as_bytes()).await?;
        output.write_all(PROMPT.as_bytes()).await?;
        output.flush().await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands_and_aliases() {
        assert_eq!(parse_command("generate").expect("parse"), Some(Command::Generate));
        assert_eq!(parse_command("  G ").expect("parse"), Some(Command::Generate));
        assert_eq!(parse_command("exit").expect("parse"), Some(Command::Quit));
        assert_eq!(parse_command("").expect("parse"), None);
        assert_eq!(parse_command("   ").expect("parse"), None);
    }

    #[test]
    fn parses_preset_by_number_or_label() {
        assert_eq!(
            parse_command("preset 1").expect("parse"),
            Some(Command::Preset(PresetRef::Number(1)))
        );
        assert_eq!(
            parse_command("preset Square Small").expect("parse"),
            Some(Command::Preset(PresetRef::Label("Square Small".to_string())))
        );
        assert!(matches!(parse_command("preset"), Err(AppError::Command(_))));
    }

    #[test]
    fn width_and_height_keep_raw_text() {
        assert_eq!(
            parse_command("width abc").expect("parse"),
            Some(Command::Width("abc".to_string()))
        );
        assert_eq!(
            parse_command("height").expect("parse"),
            Some(Command::Height(String::new()))
        );
    }

    #[test]
    fn preset_numbers_are_one_based() {
        assert_eq!(preset_index(1).expect("first preset"), 0);
        assert_eq!(preset_index(PRESETS.len()).expect("last preset"), PRESETS.len() - 1);

        for number in [0, PRESETS.len() + 1] {
            match preset_index(number) {
                Err(AppError::Command(message)) => assert!(message.contains("1~11"), "{message}"),
                other => panic!("expected command error for {number}, got {:?}", other),
            }
        }
    }

    #[test]
    fn unknown_command_is_error() {
        assert!(matches!(parse_command("resize 10"), Err(AppError::Command(_))));
    }
}
