//! CSS Property Values
//!
//! Typed values for the properties that decide whether content renders.
//! Uses enums for fixed values to save memory vs strings.

/// `display` outer/inner type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Display {
    #[default]
    Inline,
    Block,
    InlineBlock,
    ListItem,
    Flex,
    InlineFlex,
    Grid,
    InlineGrid,
    Table,
    InlineTable,
    TableRow,
    TableCell,
    Contents,
    None,
    /// Any other valid value (ruby, flow-root, table parts...)
    Other,
}

impl Display {
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim().to_ascii_lowercase();
        Some(match value.as_str() {
            "inline" => Self::Inline,
            "block" => Self::Block,
            "inline-block" => Self::InlineBlock,
            "list-item" => Self::ListItem,
            "flex" => Self::Flex,
            "inline-flex" => Self::InlineFlex,
            "grid" => Self::Grid,
            "inline-grid" => Self::InlineGrid,
            "table" => Self::Table,
            "inline-table" => Self::InlineTable,
            "table-row" => Self::TableRow,
            "table-cell" => Self::TableCell,
            "contents" => Self::Contents,
            "none" => Self::None,
            // Two-value syntax: "inline flow-root", "block flex", ...
            v if v.split_ascii_whitespace().count() > 1 => {
                match v.split_ascii_whitespace().next() {
                    Some("inline") if v.ends_with("flow") => Self::Inline,
                    Some("inline") => Self::InlineBlock,
                    _ => Self::Block,
                }
            }
            "flow-root" | "ruby" | "table-caption" | "table-column" | "table-column-group"
            | "table-header-group" | "table-footer-group" | "table-row-group" => Self::Other,
            _ => return None,
        })
    }

    /// `inline` or `inline-block`: boxes sized by their content
    pub fn is_inline_level(&self) -> bool {
        matches!(self, Self::Inline | Self::InlineBlock)
    }
}

/// `visibility`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    #[default]
    Visible,
    Hidden,
    Collapse,
}

impl Visibility {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "visible" => Some(Self::Visible),
            "hidden" => Some(Self::Hidden),
            "collapse" => Some(Self::Collapse),
            _ => None,
        }
    }
}

/// Length unit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthUnit {
    Px,
    Em,
    Rem,
    Percent,
    Vw,
    Vh,
    Pt,
    Ch,
}

/// Length value
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Length {
    pub value: f32,
    pub unit: LengthUnit,
}

impl Length {
    pub fn px(value: f32) -> Self {
        Self {
            value,
            unit: LengthUnit::Px,
        }
    }

    /// Parse `10px`, `2.5em`, `50%`, `0`; keywords such as `auto` yield `None`
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim().to_ascii_lowercase();
        let split = value
            .find(|c: char| !(c.is_ascii_digit() || c == '.' || c == '-' || c == '+'))
            .unwrap_or(value.len());
        let (number, unit) = value.split_at(split);
        let number: f32 = number.parse().ok()?;
        let unit = match unit {
            "px" => LengthUnit::Px,
            // Unitless numbers are only valid for zero
            "" if number == 0.0 => LengthUnit::Px,
            "em" => LengthUnit::Em,
            "rem" => LengthUnit::Rem,
            "%" => LengthUnit::Percent,
            "vw" => LengthUnit::Vw,
            "vh" => LengthUnit::Vh,
            "pt" => LengthUnit::Pt,
            "ch" => LengthUnit::Ch,
            _ => return None,
        };
        Some(Self { value: number, unit })
    }

    pub fn is_zero(&self) -> bool {
        self.value == 0.0
    }
}

/// Parse `opacity` as a number or percentage, clamped to `[0, 1]`
pub fn parse_opacity(value: &str) -> Option<f32> {
    let value = value.trim();
    let opacity = match value.strip_suffix('%') {
        Some(percent) => percent.trim().parse::<f32>().ok()? / 100.0,
        None => value.parse::<f32>().ok()?,
    };
    Some(opacity.clamp(0.0, 1.0))
}
