//! # 尺寸选择模块
//!
//! ## 设计思路
//!
//! 把“预设尺寸 / 自定义尺寸”两种来源统一解析为一个有效的 [`Dimension`]。
//! 解析是纯函数，不产生副作用；选择状态由 [`DimensionSelector`] 持有，
//! 只通过明确的操作函数修改。
//!
//! ## 实现思路
//!
//! - 预设列表为编译期常量，进程生命周期内不变。
//! - 自定义输入保留原始文本，在请求时才按“前导整数”规则解析：
//!   允许前导空白与符号，忽略数字后的多余字符（`"640px"` → 640）。
//! - 空串、非数字、0、负数或超出 `u32` 的值回退到该字段的默认值（800 / 600）。
//! - 输入框上的 50~2000 只是提示，不做钳制。

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use super::GeneratorError;

/// 自定义输入的前导整数部分。
static LEADING_INTEGER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*([+-]?\d+)").expect("leading integer pattern is a valid regex")
});

/// 图片像素尺寸。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Dimension {
    pub width: u32,
    pub height: u32,
}

impl Dimension {
    /// 自定义输入无效时的回退尺寸。
    pub const DEFAULT: Dimension = Dimension {
        width: 800,
        height: 600,
    };

    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// 带单位的展示文本，例如 `800×600 px`。
    pub fn label(&self) -> String {
        format!("{} px", self)
    }
}

impl Default for Dimension {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}×{}", self.width, self.height)
    }
}

/// 命名预设尺寸。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Preset {
    pub label: &'static str,
    pub width: u32,
    pub height: u32,
}

impl Preset {
    pub const fn dimension(&self) -> Dimension {
        Dimension::new(self.width, self.height)
    }
}

/// 固定顺序的预设列表。
pub static PRESETS: [Preset; 11] = [
    Preset {
        label: "Square Small",
        width: 300,
        height: 300,
    },
    Preset {
        label: "Square Medium",
        width: 500,
        height: 500,
    },
    Preset {
        label: "Square Large",
        width: 800,
        height: 800,
    },
    Preset {
        label: "Landscape Small",
        width: 640,
        height: 480,
    },
    Preset {
        label: "Landscape Medium",
        width: 800,
        height: 600,
    },
    Preset {
        label: "Landscape Large",
        width: 1200,
        height: 800,
    },
    Preset {
        label: "Portrait Small",
        width: 480,
        height: 640,
    },
    Preset {
        label: "Portrait Medium",
        width: 600,
        height: 800,
    },
    Preset {
        label: "Portrait Large",
        width: 800,
        height: 1200,
    },
    Preset {
        label: "Wide Banner",
        width: 1200,
        height: 400,
    },
    Preset {
        label: "Social Media",
        width: 1080,
        height: 1080,
    },
];

/// 启动时默认选中的预设（Landscape Medium，800×600）。
pub const DEFAULT_PRESET_INDEX: usize = 4;

/// 用户输入的原始自定义宽高文本。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CustomDimension {
    pub width: String,
    pub height: String,
}

/// 当前生效的尺寸来源。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionMode {
    Preset,
    Custom,
}

/// 按前导整数规则解析单个字段，无效时返回 `fallback`。
pub fn parse_dimension_field(text: &str, fallback: u32) -> u32 {
    LEADING_INTEGER
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<i64>().ok())
        .filter(|value| *value > 0)
        .and_then(|value| u32::try_from(value).ok())
        .unwrap_or(fallback)
}

/// 根据选择模式解析出本次请求使用的尺寸。
pub fn resolve_dimension(
    mode: SelectionMode,
    selected: &Preset,
    custom: &CustomDimension,
) -> Dimension {
    match mode {
        SelectionMode::Preset => selected.dimension(),
        SelectionMode::Custom => Dimension::new(
            parse_dimension_field(&custom.width, Dimension::DEFAULT.width),
            parse_dimension_field(&custom.height, Dimension::DEFAULT.height),
        ),
    }
}

/// 尺寸选择状态。
#[derive(Debug, Clone)]
pub struct DimensionSelector {
    selected: usize,
    custom: CustomDimension,
    mode: SelectionMode,
}

impl Default for DimensionSelector {
    fn default() -> Self {
        Self {
            selected: DEFAULT_PRESET_INDEX,
            custom: CustomDimension::default(),
            mode: SelectionMode::Preset,
        }
    }
}

impl DimensionSelector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> SelectionMode {
        self.mode
    }

    pub fn custom(&self) -> &CustomDimension {
        &self.custom
    }

    pub fn selected_index(&self) -> usize {
        self.selected
    }

    pub fn selected_preset(&self) -> &'static Preset {
        PRESETS.get(self.selected).unwrap_or(&PRESETS[DEFAULT_PRESET_INDEX])
    }

    /// 预设是否处于高亮（被选中且当前为预设模式）。
    pub fn is_preset_active(&self, index: usize) -> bool {
        self.mode == SelectionMode::Preset && self.selected == index
    }

    /// 按下标选择预设，并切回预设模式。
    pub fn select_preset(&mut self, index: usize) -> Result<&'static Preset, GeneratorError> {
        let preset = PRESETS.get(index).ok_or_else(|| {
            GeneratorError::InvalidSelection(format!(
                "预设下标越界：{}（可选 0~{}）",
                index,
                PRESETS.len() - 1
            ))
        })?;
        self.selected = index;
        self.mode = SelectionMode::Preset;
        Ok(preset)
    }

    /// 按名称（忽略大小写与首尾空白）选择预设。
    pub fn select_preset_by_label(
        &mut self,
        label: &str,
    ) -> Result<&'static Preset, GeneratorError> {
        let wanted = label.trim();
        let index = PRESETS
            .iter()
            .position(|preset| preset.label.eq_ignore_ascii_case(wanted))
            .ok_or_else(|| GeneratorError::InvalidSelection(format!("未知预设：{}", wanted)))?;
        self.select_preset(index)
    }

    /// 切换自定义模式。
    ///
    /// 进入自定义模式时，用当前预设的宽高预填输入框。
    pub fn toggle_custom(&mut self) -> SelectionMode {
        self.mode = match self.mode {
            SelectionMode::Preset => {
                let preset = self.selected_preset();
                self.custom = CustomDimension {
                    width: preset.width.to_string(),
                    height: preset.height.to_string(),
                };
                SelectionMode::Custom
            }
            SelectionMode::Custom => SelectionMode::Preset,
        };
        self.mode
    }

    pub fn set_custom_width(&mut self, text: impl Into<String>) {
        self.custom.width = text.into();
    }

    pub fn set_custom_height(&mut self, text: impl Into<String>) {
        self.custom.height = text.into();
    }

    pub fn resolve(&self) -> Dimension {
        resolve_dimension(self.mode, self.selected_preset(), &self.custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn default_selection_is_landscape_medium() {
        let selector = DimensionSelector::new();
        assert_eq!(selector.mode(), SelectionMode::Preset);
        assert_eq!(selector.selected_preset().label, "Landscape Medium");
        assert_eq!(selector.resolve(), Dimension::new(800, 600));
        assert!(selector.is_preset_active(DEFAULT_PRESET_INDEX));
    }

    #[test]
    fn parse_field_follows_leading_integer_rules() {
        assert_eq!(parse_dimension_field("640", 800), 640);
        assert_eq!(parse_dimension_field("  640", 800), 640);
        assert_eq!(parse_dimension_field("640px", 800), 640);
        assert_eq!(parse_dimension_field("12.9", 800), 12);
        assert_eq!(parse_dimension_field("+75", 800), 75);
        assert_eq!(parse_dimension_field("", 800), 800);
        assert_eq!(parse_dimension_field("abc", 800), 800);
        assert_eq!(parse_dimension_field("px640", 800), 800);
        assert_eq!(parse_dimension_field("0", 600), 600);
        assert_eq!(parse_dimension_field("-5", 600), 600);
        assert_eq!(parse_dimension_field("99999999999", 600), 600);
    }

    #[test]
    fn no_clamping_outside_hint_range() {
        assert_eq!(parse_dimension_field("10", 800), 10);
        assert_eq!(parse_dimension_field("5000", 800), 5000);
    }

    #[test]
    fn custom_fallback_is_per_field() {
        let custom = CustomDimension {
            width: "abc".to_string(),
            height: "400".to_string(),
        };
        let dim = resolve_dimension(SelectionMode::Custom, &PRESETS[0], &custom);
        assert_eq!(dim, Dimension::new(800, 400));

        let custom = CustomDimension {
            width: "320".to_string(),
            height: String::new(),
        };
        let dim = resolve_dimension(SelectionMode::Custom, &PRESETS[0], &custom);
        assert_eq!(dim, Dimension::new(320, 600));
    }

    #[test]
    fn preset_mode_ignores_custom_fields() {
        let custom = CustomDimension {
            width: "123".to_string(),
            height: "456".to_string(),
        };
        let dim = resolve_dimension(SelectionMode::Preset, &PRESETS[9], &custom);
        assert_eq!(dim, Dimension::new(1200, 400));
    }

    #[test]
    fn toggle_into_custom_prefills_from_preset() {
        let mut selector = DimensionSelector::new();
        selector.select_preset(0).expect("preset 0 exists");
        assert_eq!(selector.toggle_custom(), SelectionMode::Custom);
        assert_eq!(selector.custom().width, "300");
        assert_eq!(selector.custom().height, "300");
        assert!(!selector.is_preset_active(0));

        selector.set_custom_width("700");
        assert_eq!(selector.resolve(), Dimension::new(700, 300));

        assert_eq!(selector.toggle_custom(), SelectionMode::Preset);
        assert_eq!(selector.resolve(), Dimension::new(300, 300));
        // 回到预设模式后输入框内容保留
        assert_eq!(selector.custom().width, "700");
    }

    #[test]
    fn select_preset_leaves_custom_mode() {
        let mut selector = DimensionSelector::new();
        selector.toggle_custom();
        selector.set_custom_width("999");
        let preset = selector.select_preset_by_label("square small").expect("label exists");
        assert_eq!(preset.dimension(), Dimension::new(300, 300));
        assert_eq!(selector.mode(), SelectionMode::Preset);
        assert_eq!(selector.resolve(), Dimension::new(300, 300));
    }

    #[test]
    fn invalid_selection_keeps_state() {
        let mut selector = DimensionSelector::new();
        selector.select_preset(2).expect("preset 2 exists");

        assert!(matches!(
            selector.select_preset(PRESETS.len()),
            Err(GeneratorError::InvalidSelection(_))
        ));
        assert!(matches!(
            selector.select_preset_by_label("Huge Poster"),
            Err(GeneratorError::InvalidSelection(_))
        ));
        assert_eq!(selector.selected_index(), 2);
    }

    #[test]
    fn dimension_label_uses_multiplication_sign() {
        assert_eq!(Dimension::new(1080, 1080).to_string(), "1080×1080");
        assert_eq!(Dimension::new(800, 600).label(), "800×600 px");
    }

    proptest! {
        #[test]
        fn positive_custom_pairs_resolve_exactly(width in 1u32..=100_000, height in 1u32..=100_000) {
            let custom = CustomDimension {
                width: width.to_string(),
                height: height.to_string(),
            };
            let dim = resolve_dimension(SelectionMode::Custom, &PRESETS[0], &custom);
            prop_assert_eq!(dim, Dimension::new(width, height));
        }

        #[test]
        fn non_numeric_input_falls_back(text in "[a-zA-Z ]{0,12}") {
            prop_assert_eq!(parse_dimension_field(&text, 800), 800);
        }

        #[test]
        fn every_preset_resolves_verbatim(index in 0usize..PRESETS.len()) {
            let mut selector = DimensionSelector::new();
            selector.toggle_custom();
            selector.set_custom_width("1");
            selector.set_custom_height("1");
            let preset = selector.select_preset(index).expect("index in range");
            prop_assert_eq!(selector.mode(), SelectionMode::Preset);
            prop_assert_eq!(selector.resolve(), preset.dimension());
        }
    }
}
