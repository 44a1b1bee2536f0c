//! Theme color scheme and font scheme.

use std::collections::HashMap;

use slideview_core::Color;

use crate::model::{ColorKind, ColorSpec};
use crate::xml::RawNode;

/// Resolved theme data shared by every slide of a presentation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ThemeContext {
    /// Scheme slot (`dk1`, `lt1`, `accent1`, ...) to color.
    colors: HashMap<String, Color>,
    /// `a:majorFont a:latin typeface`.
    pub major_font: Option<String>,
    /// `a:minorFont a:latin typeface`.
    pub minor_font: Option<String>,
}

impl ThemeContext {
    /// Decode from the root of a theme part (`a:theme`).
    pub fn from_node(theme: &RawNode) -> Self {
        let elements = theme.child("themeElements");

        let mut colors = HashMap::new();
        if let Some(scheme) = elements.and_then(|e| e.child("clrScheme")) {
            for slot in &scheme.children {
                // An explicit RGB value wins over the system color's last value.
                let color = slot
                    .child("srgbClr")
                    .and_then(|c| c.attr("val"))
                    .and_then(Color::from_hex)
                    .or_else(|| {
                        slot.child("sysClr")
                            .and_then(|c| c.attr("lastClr"))
                            .and_then(Color::from_hex)
                    });
                match color {
                    Some(color) => {
                        colors.insert(slot.local_name().to_string(), color);
                    }
                    None => log::debug!("Theme color slot {} has no usable value", slot.tag),
                }
            }
        }

        let typeface = |name: &str| {
            elements
                .and_then(|e| e.path(&["fontScheme", name, "latin"]))
                .and_then(|l| l.attr("typeface"))
                .filter(|t| !t.is_empty())
                .map(str::to_string)
        };

        Self {
            colors,
            major_font: typeface("majorFont"),
            minor_font: typeface("minorFont"),
        }
    }

    /// Look up a scheme color by name, mapping `tx1/tx2/bg1/bg2` to their slots.
    pub fn scheme_color(&self, name: &str) -> Option<Color> {
        let slot = match name {
            "tx1" => "dk1",
            "tx2" => "dk2",
            "bg1" => "lt1",
            "bg2" => "lt2",
            other => other,
        };
        self.colors.get(slot).copied()
    }

    /// Resolve a color element to a concrete color.
    ///
    /// Direct colors come back as written. Scheme colors take their `lumOff`
    /// (lightness scaled by `1 + lumOff`) and `alpha`; `lumMod` is read but
    /// not applied and `shade` is left to [`ThemeContext::resolve_shaded`].
    pub fn resolve(&self, spec: &ColorSpec) -> Option<Color> {
        match &spec.kind {
            ColorKind::Rgb(color) => Some(*color),
            ColorKind::System { last, .. } => *last,
            ColorKind::Preset(name) => {
                log::debug!("Preset color '{}' is not resolved", name);
                None
            }
            ColorKind::Scheme(name) => {
                let mut color = self.scheme_color(name)?;
                if let Some(offset) = spec.mods.lum_off {
                    color = color.offset_luminance(offset);
                }
                if let Some(alpha) = spec.mods.alpha {
                    color = color.with_alpha(alpha);
                }
                Some(color)
            }
        }
    }

    /// Like [`ThemeContext::resolve`], then darken by the element's `shade`.
    /// Used for line style references.
    pub fn resolve_shaded(&self, spec: &ColorSpec) -> Option<Color> {
        let color = self.resolve(spec)?;
        Some(match spec.mods.shade {
            Some(shade) => color.scale_luminance(shade),
            None => color,
        })
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }
}
