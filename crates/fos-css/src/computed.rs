//! Computed style
//!
//! The resolved values of the properties that affect visibility.

use crate::Declaration;
use crate::properties::{Display, Length, Visibility, parse_opacity};

/// Computed values for one element
#[derive(Debug, Clone, PartialEq)]
pub struct ComputedStyle {
    pub display: Display,
    /// Inherited
    pub visibility: Visibility,
    pub opacity: f32,
    /// Raw `clip-path` value, `None` for `none`
    pub clip_path: Option<String>,
    /// Raw legacy `clip` value, `None` for `auto`
    pub clip: Option<String>,
    /// Explicit width, `None` for `auto`
    pub width: Option<Length>,
    /// Explicit height, `None` for `auto`
    pub height: Option<Length>,
}

impl Default for ComputedStyle {
    fn default() -> Self {
        Self {
            display: Display::Inline,
            visibility: Visibility::Visible,
            opacity: 1.0,
            clip_path: None,
            clip: None,
            width: None,
            height: None,
        }
    }
}

impl ComputedStyle {
    /// Initial style for a child of an element with `parent` style
    pub fn inherit_from(parent: &ComputedStyle) -> Self {
        Self {
            visibility: parent.visibility,
            ..Self::default()
        }
    }

    /// Apply one cascaded declaration; invalid values are ignored
    pub fn apply_declaration(&mut self, decl: &Declaration) {
        let value = decl.value.trim();
        // `inherit`/`unset` on `visibility` keep the inherited value
        if matches!(value, "inherit" | "unset" | "revert") {
            return;
        }
        let initial = value == "initial";

        match decl.property.as_str() {
            "display" => {
                if initial {
                    self.display = Display::Inline;
                } else if let Some(display) = Display::parse(value) {
                    self.display = display;
                }
            }
            "visibility" => {
                if initial {
                    self.visibility = Visibility::Visible;
                } else if let Some(visibility) = Visibility::parse(value) {
                    self.visibility = visibility;
                }
            }
            "opacity" => {
                if initial {
                    self.opacity = 1.0;
                } else if let Some(opacity) = parse_opacity(value) {
                    self.opacity = opacity;
                }
            }
            "clip-path" => {
                self.clip_path = (!initial && !value.eq_ignore_ascii_case("none")).then(|| value.to_string());
            }
            "clip" => {
                self.clip = (!initial && !value.eq_ignore_ascii_case("auto")).then(|| value.to_string());
            }
            "width" => self.width = if initial { None } else { Length::parse(value) },
            "height" => self.height = if initial { None } else { Length::parse(value) },
            _ => {}
        }
    }

    /// `display: none`
    pub fn is_display_none(&self) -> bool {
        self.display == Display::None
    }

    /// `visibility: hidden | collapse`
    pub fn is_visibility_hidden(&self) -> bool {
        self.visibility != Visibility::Visible
    }
}
