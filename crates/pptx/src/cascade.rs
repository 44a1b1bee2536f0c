//! Property cascade.
//!
//! One function per property family. Each walks slide -> layout -> master and
//! then theme or fixed defaults, stopping at the first tier that yields a usable
//! value. Tiers are never merged and no lookup fails: every chain ends in a
//! documented fallback.

use slideview_core::units::{
    centipoints_to_pt, emu_to_px, line_width_to_pt, BULLET_BASE_MARGIN_EMU,
};
use slideview_core::{
    Border, BorderStyle, BulletMarker, Color, Fill, FontFamily, FontSize, Frame, HorizontalAlign,
    VerticalAnchor,
};

use crate::model::{
    BackgroundSpec, ColorSpec, FillProperties, ListStyle, ParagraphProperties, RunProperties,
    Shape, TextStyles, Transform,
};
use crate::theme::ThemeContext;

/// Fixed size of a bullet glyph that carries its own font.
pub const BULLET_FONT_SIZE_PT: f64 = 20.0;

/// Fixed size of date and slide-number placeholders.
pub const DATE_AND_NUMBER_SIZE_PT: f64 = 12.0;

/// Amount subtracted from the size of a raised or lowered run, in points.
pub const BASELINE_SIZE_REDUCTION_PT: f64 = 10.0;

/// Line dash names and their outline style and SVG dash pattern.
const DASH_PATTERNS: &[(&str, BorderStyle, &str)] = &[
    ("solid", BorderStyle::Solid, "0"),
    ("dash", BorderStyle::Dashed, "5"),
    ("dashDot", BorderStyle::Dashed, "5, 5, 1, 5"),
    ("dot", BorderStyle::Dotted, "1, 5"),
    ("lgDash", BorderStyle::Dashed, "10, 5"),
    ("lgDashDotDot", BorderStyle::Dashed, "10, 5, 1, 5, 1, 5"),
    ("sysDash", BorderStyle::Dashed, "5, 2"),
    ("sysDashDot", BorderStyle::Dashed, "5, 2, 1, 5"),
    ("sysDashDotDot", BorderStyle::Dashed, "5, 2, 1, 5, 1, 5"),
    ("sysDot", BorderStyle::Dotted, "2, 5"),
];

/// A slide shape together with its matched layout and master shapes.
#[derive(Debug, Clone, Copy)]
pub struct ShapeTiers<'a> {
    pub slide: &'a Shape,
    pub layout: Option<&'a Shape>,
    pub master: Option<&'a Shape>,
}

impl<'a> ShapeTiers<'a> {
    /// A shape with no ancestors.
    pub fn standalone(slide: &'a Shape) -> Self {
        Self {
            slide,
            layout: None,
            master: None,
        }
    }

    /// Tiers from most to least specific.
    pub fn iter(&self) -> impl Iterator<Item = &'a Shape> {
        std::iter::once(self.slide)
            .chain(self.layout)
            .chain(self.master)
    }
}

/// Which master text style a placeholder draws its defaults from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextRole {
    /// `title`, `subTitle` and `ctrTitle`.
    Title,
    Body,
    Date,
    SlideNumber,
    /// Any other type, or no placeholder at all.
    Other,
}

impl TextRole {
    pub fn from_kind(kind: Option<&str>) -> Self {
        match kind {
            Some("title") | Some("subTitle") | Some("ctrTitle") => Self::Title,
            Some("body") => Self::Body,
            Some("dt") => Self::Date,
            Some("sldNum") => Self::SlideNumber,
            _ => Self::Other,
        }
    }

    fn master_style<'s>(&self, styles: &'s TextStyles) -> Option<&'s ListStyle> {
        match self {
            Self::Title => styles.title.as_ref(),
            Self::Body => styles.body.as_ref(),
            _ => styles.other.as_ref(),
        }
    }
}

/// Position and size from the first tier with an offset and extent.
pub fn resolve_frame(tiers: &ShapeTiers<'_>, z_index: u32) -> Frame {
    let xfrms: Vec<&Transform> = tiers.iter().filter_map(|s| s.props.xfrm.as_ref()).collect();
    let off = xfrms.iter().find_map(|x| x.off).unwrap_or_default();
    let ext = xfrms.iter().find_map(|x| x.ext).unwrap_or_default();

    Frame {
        top: emu_to_px(off.y),
        left: emu_to_px(off.x),
        width: emu_to_px(ext.cx),
        height: emu_to_px(ext.cy),
        z_index,
    }
}

/// Frame of an element that has no placeholder ancestors.
pub fn frame_from_transform(xfrm: Option<&Transform>, z_index: u32) -> Frame {
    let off = xfrm.and_then(|x| x.off).unwrap_or_default();
    let ext = xfrm.and_then(|x| x.ext).unwrap_or_default();
    Frame {
        top: emu_to_px(off.y),
        left: emu_to_px(off.x),
        width: emu_to_px(ext.cx),
        height: emu_to_px(ext.cy),
        z_index,
    }
}

/// Fill of a shape.
///
/// Within a tier: `noFill`, then a solid color (RGB or scheme), then the style
/// `fillRef` color. The first tier with any of these wins; none gives
/// [`Fill::Unspecified`].
pub fn resolve_fill(tiers: &ShapeTiers<'_>, theme: &ThemeContext) -> Fill {
    tiers
        .iter()
        .find_map(|shape| tier_fill(shape, theme))
        .unwrap_or(Fill::Unspecified)
}

fn tier_fill(shape: &Shape, theme: &ThemeContext) -> Option<Fill> {
    match &shape.props.fill {
        Some(FillProperties::NoFill) => return Some(Fill::None),
        Some(FillProperties::Solid(Some(spec))) => {
            if let Some(color) = theme.resolve(spec) {
                return Some(Fill::Solid(color));
            }
        }
        _ => {}
    }

    shape
        .style
        .as_ref()
        .and_then(|s| s.fill_ref.as_ref())
        .and_then(|spec| theme.resolve(spec))
        .map(Fill::Solid)
}

/// Outline of a shape from the first tier that defines a line.
pub fn resolve_border(tiers: &ShapeTiers<'_>, theme: &ThemeContext) -> Border {
    let line = tiers.iter().find_map(|s| s.props.line.as_ref());
    let width_pt = line_width_to_pt(line.and_then(|l| l.width));

    if matches!(line.and_then(|l| l.fill.as_ref()), Some(FillProperties::NoFill)) {
        return Border {
            width_pt,
            color: None,
            style: BorderStyle::None,
            dash_array: "0".to_string(),
        };
    }

    let color = line
        .and_then(|l| l.color())
        .and_then(|spec| theme.resolve(spec))
        .or_else(|| {
            tiers
                .iter()
                .find_map(|s| s.style.as_ref().and_then(|st| st.line_ref.as_ref()))
                .and_then(|spec| theme.resolve_shaded(spec))
        });
    let (style, dash_array) = dash_pattern(line.and_then(|l| l.dash.as_deref()));

    Border {
        width_pt,
        color,
        style,
        dash_array: dash_array.to_string(),
    }
}

/// Map a `prstDash` name; unknown or absent names are solid.
pub fn dash_pattern(name: Option<&str>) -> (BorderStyle, &'static str) {
    name.and_then(|name| DASH_PATTERNS.iter().find(|(n, _, _)| *n == name))
        .map(|(_, style, dash)| (*style, *dash))
        .unwrap_or((BorderStyle::Solid, "0"))
}

/// Whether a line end draws an arrow head.
pub fn is_arrow_end(end: Option<&str>) -> bool {
    matches!(end, Some("triangle") | Some("arrow"))
}

/// Font size of a run.
///
/// Run size, then the layout placeholder's level-1 default, then the master
/// text style for the placeholder role. A run with a baseline shift is reduced
/// by ten points.
pub fn resolve_font_size(
    run: Option<&RunProperties>,
    layout: Option<&Shape>,
    role: TextRole,
    styles: Option<&TextStyles>,
) -> FontSize {
    let size = run
        .and_then(|r| r.size)
        .map(centipoints_to_pt)
        .or_else(|| {
            layout
                .and_then(|s| s.text.as_ref())
                .and_then(|t| t.list_style.as_ref())
                .and_then(default_run_size)
        })
        .or_else(|| match role {
            TextRole::Date | TextRole::SlideNumber => Some(DATE_AND_NUMBER_SIZE_PT),
            _ => styles
                .and_then(|st| role.master_style(st))
                .and_then(default_run_size),
        });

    match size {
        Some(mut pt) => {
            if run.and_then(|r| r.baseline).is_some() {
                pt -= BASELINE_SIZE_REDUCTION_PT;
            }
            FontSize::Points(pt)
        }
        None => FontSize::Inherit,
    }
}

fn default_run_size(style: &ListStyle) -> Option<f64> {
    style
        .level1()
        .and_then(|p| p.default_run.as_ref())
        .and_then(|r| r.size)
        .map(centipoints_to_pt)
}

/// Typeface of a run: explicit latin font, else the theme's major font for
/// titles or minor font for everything else.
pub fn resolve_font_family(
    run: Option<&RunProperties>,
    role: TextRole,
    theme: &ThemeContext,
) -> FontFamily {
    let theme_font = |major: bool| {
        if major {
            theme.major_font.clone()
        } else {
            theme.minor_font.clone()
        }
    };

    let family = match run.and_then(|r| r.latin.as_deref()) {
        // Theme font references
        Some(face) if face.starts_with("+mj-") => theme_font(true),
        Some(face) if face.starts_with("+mn-") => theme_font(false),
        Some(face) if !face.is_empty() => Some(face.to_string()),
        _ => theme_font(role == TextRole::Title),
    };

    match family {
        Some(name) => FontFamily::Named(name),
        None => FontFamily::Inherit,
    }
}

/// Color of a run: its own solid fill, then the shape's `fontRef` color.
/// `None` inherits.
pub fn resolve_font_color(
    run: Option<&RunProperties>,
    font_ref: Option<&ColorSpec>,
    theme: &ThemeContext,
) -> Option<Color> {
    run.and_then(|r| r.color.as_ref())
        .and_then(|spec| theme.resolve(spec))
        .or_else(|| font_ref.and_then(|spec| theme.resolve(spec)))
}

/// Horizontal alignment of a paragraph.
pub fn resolve_align(
    para: Option<&ParagraphProperties>,
    layout: Option<&Shape>,
    master: Option<&Shape>,
    role: TextRole,
    styles: Option<&TextStyles>,
) -> HorizontalAlign {
    let algn = para
        .and_then(|p| p.align.as_deref())
        .or_else(|| layout.and_then(shape_default_align))
        .or_else(|| master.and_then(shape_default_align))
        .or_else(|| {
            styles
                .and_then(|st| role.master_style(st))
                .and_then(|l| l.level1())
                .and_then(|p| p.align.as_deref())
        });

    match algn {
        Some("ctr") => HorizontalAlign::Center,
        Some("r") => HorizontalAlign::Right,
        Some(_) => HorizontalAlign::Left,
        None => match role {
            TextRole::Title => HorizontalAlign::Center,
            TextRole::SlideNumber => HorizontalAlign::Right,
            _ => HorizontalAlign::Left,
        },
    }
}

fn shape_default_align(shape: &Shape) -> Option<&str> {
    let text = shape.text.as_ref()?;
    text.first_align().or_else(|| {
        text.list_style
            .as_ref()
            .and_then(|l| l.level1())
            .and_then(|p| p.align.as_deref())
    })
}

/// Vertical anchor of a text body.
pub fn resolve_anchor(tiers: &ShapeTiers<'_>) -> VerticalAnchor {
    anchor_from_name(
        tiers
            .iter()
            .find_map(|s| s.text.as_ref().and_then(|t| t.anchor.as_deref())),
    )
}

/// Map a `bodyPr anchor` value.
pub fn anchor_from_name(anchor: Option<&str>) -> VerticalAnchor {
    match anchor {
        Some("ctr") => VerticalAnchor::Middle,
        Some("b") => VerticalAnchor::Bottom,
        _ => VerticalAnchor::Top,
    }
}

/// Leading marker of a paragraph.
///
/// The indentation is the level times the margin: the paragraph's own left
/// margin when its bullet carries a font, else the fixed base margin. Without
/// a bullet character the marker has no glyph and only keeps the indentation.
pub fn resolve_bullet(para: Option<&ParagraphProperties>) -> BulletMarker {
    let level = para.and_then(|p| p.level).unwrap_or(0) as i64;
    let base = emu_to_px(BULLET_BASE_MARGIN_EMU);

    let Some(glyph) = para.and_then(|p| p.bullet_char.clone()) else {
        return BulletMarker {
            margin_left: base * level,
            ..BulletMarker::default()
        };
    };

    match para.and_then(|p| p.bullet_font.as_ref()) {
        Some(font) => {
            let margin = para
                .and_then(|p| p.margin_left)
                .map(emu_to_px)
                .unwrap_or(base);
            BulletMarker {
                glyph: Some(glyph),
                margin_left: margin * level,
                margin_right: font.pitch_family.unwrap_or(0),
                font_family: font.typeface.clone(),
                font_size_pt: Some(BULLET_FONT_SIZE_PT),
            }
        }
        None => BulletMarker {
            glyph: Some(glyph),
            margin_left: base * level,
            ..BulletMarker::default()
        },
    }
}

/// Background color from slide, layout and master backgrounds, else white.
pub fn resolve_background_color(
    backgrounds: [Option<&BackgroundSpec>; 3],
    theme: &ThemeContext,
) -> Color {
    backgrounds
        .into_iter()
        .flatten()
        .find_map(|bg| {
            let from_fill = match &bg.fill {
                Some(FillProperties::Solid(Some(spec))) => theme.resolve(spec),
                _ => None,
            };
            from_fill.or_else(|| bg.style_ref.as_ref().and_then(|spec| theme.resolve(spec)))
        })
        .unwrap_or(Color::WHITE)
}
