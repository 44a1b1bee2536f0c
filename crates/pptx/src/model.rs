//! Typed view of the presentation parts.
//!
//! Each element kind the resolver reads is decoded once from its [`RawNode`]
//! into a struct with named optional fields. Repeated elements are always
//! vectors. Lengths stay in EMU; conversion happens in the cascade.

use std::collections::BTreeMap;

use slideview_core::Color;

use crate::xml::RawNode;

/// Graphic-data URIs of the graphic frame payloads we understand.
pub const TABLE_URI: &str = "http://schemas.openxmlformats.org/drawingml/2006/table";
pub const CHART_URI: &str = "http://schemas.openxmlformats.org/drawingml/2006/chart";
pub const DIAGRAM_URI: &str = "http://schemas.openxmlformats.org/drawingml/2006/diagram";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Point {
    pub x: i64,
    pub y: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Extent {
    pub cx: i64,
    pub cy: i64,
}

/// `a:xfrm` / `p:xfrm`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Transform {
    pub off: Option<Point>,
    pub ext: Option<Extent>,
    /// Child coordinate space of a group.
    pub ch_off: Option<Point>,
    pub ch_ext: Option<Extent>,
    pub flip_h: bool,
    pub flip_v: bool,
}

impl Transform {
    pub fn decode(node: &RawNode) -> Self {
        let point = |name: &str| {
            node.child(name).map(|n| Point {
                x: n.attr_i64("x").unwrap_or(0),
                y: n.attr_i64("y").unwrap_or(0),
            })
        };
        let extent = |name: &str| {
            node.child(name).map(|n| Extent {
                cx: n.attr_i64("cx").unwrap_or(0),
                cy: n.attr_i64("cy").unwrap_or(0),
            })
        };

        Self {
            off: point("off"),
            ext: extent("ext"),
            ch_off: point("chOff"),
            ch_ext: extent("chExt"),
            flip_h: node.attr_flag("flipH"),
            flip_v: node.attr_flag("flipV"),
        }
    }

    pub fn flipped(&self) -> bool {
        self.flip_h || self.flip_v
    }
}

/// Color transforms carried as children of a color element, as fractions.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ColorMods {
    pub lum_mod: Option<f64>,
    pub lum_off: Option<f64>,
    pub alpha: Option<f64>,
    pub shade: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ColorKind {
    Rgb(Color),
    /// Theme slot name as written (`accent1`, `tx1`, ...).
    Scheme(String),
    System { name: String, last: Option<Color> },
    /// Preset color names are not resolved.
    Preset(String),
}

/// A color element: `a:srgbClr`, `a:schemeClr`, `a:sysClr` or `a:prstClr`.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorSpec {
    pub kind: ColorKind,
    pub mods: ColorMods,
}

impl ColorSpec {
    /// Decode the first color element among `parent`'s children.
    pub fn decode_choice(parent: &RawNode) -> Option<Self> {
        parent.children.iter().find_map(Self::decode)
    }

    pub fn decode(node: &RawNode) -> Option<Self> {
        let kind = match node.local_name() {
            "srgbClr" => ColorKind::Rgb(Color::from_hex(node.attr("val")?)?),
            "schemeClr" => ColorKind::Scheme(node.attr("val")?.to_string()),
            "sysClr" => ColorKind::System {
                name: node.attr("val").unwrap_or_default().to_string(),
                last: node.attr("lastClr").and_then(Color::from_hex),
            },
            "prstClr" => ColorKind::Preset(node.attr("val").unwrap_or_default().to_string()),
            _ => return None,
        };

        let fraction = |name: &str| {
            node.child(name)
                .and_then(|n| n.attr_i64("val"))
                .map(slideview_core::units::per_100k)
        };
        let mods = ColorMods {
            lum_mod: fraction("lumMod"),
            lum_off: fraction("lumOff"),
            alpha: fraction("alpha"),
            shade: fraction("shade"),
        };

        Some(Self { kind, mods })
    }

    pub fn rgb(color: Color) -> Self {
        Self {
            kind: ColorKind::Rgb(color),
            mods: ColorMods::default(),
        }
    }

    pub fn scheme(name: &str) -> Self {
        Self {
            kind: ColorKind::Scheme(name.to_string()),
            mods: ColorMods::default(),
        }
    }
}

/// The fill choice of a properties element.
#[derive(Debug, Clone, PartialEq)]
pub enum FillProperties {
    NoFill,
    /// A solid fill whose color element may be missing or unsupported.
    Solid(Option<ColorSpec>),
    /// Picture fill referencing an image relationship.
    Picture { embed: Option<String> },
    /// Gradient, pattern or group fill.
    Other(String),
}

impl FillProperties {
    /// Decode the first fill element among `parent`'s children.
    pub fn decode_choice(parent: &RawNode) -> Option<Self> {
        parent.children.iter().find_map(|node| match node.local_name() {
            "noFill" => Some(Self::NoFill),
            "solidFill" => Some(Self::Solid(ColorSpec::decode_choice(node))),
            "blipFill" => Some(Self::Picture {
                embed: blip_embed(node),
            }),
            "gradFill" | "pattFill" | "grpFill" => Some(Self::Other(node.local_name().to_string())),
            _ => None,
        })
    }
}

/// `r:embed` of the `a:blip` inside a blip fill.
pub fn blip_embed(blip_fill: &RawNode) -> Option<String> {
    blip_fill
        .child("blip")
        .and_then(|b| b.attr("r:embed"))
        .map(str::to_string)
}

/// `a:ln`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LineProperties {
    pub width: Option<i64>,
    pub fill: Option<FillProperties>,
    pub dash: Option<String>,
    pub head_end: Option<String>,
    pub tail_end: Option<String>,
}

impl LineProperties {
    pub fn decode(node: &RawNode) -> Self {
        Self {
            width: node.attr_i64("w"),
            fill: FillProperties::decode_choice(node),
            dash: node
                .child("prstDash")
                .and_then(|n| n.attr("val"))
                .map(str::to_string),
            head_end: node
                .child("headEnd")
                .and_then(|n| n.attr("type"))
                .map(str::to_string),
            tail_end: node
                .child("tailEnd")
                .and_then(|n| n.attr("type"))
                .map(str::to_string),
        }
    }

    /// Color of a solid line fill.
    pub fn color(&self) -> Option<&ColorSpec> {
        match &self.fill {
            Some(FillProperties::Solid(color)) => color.as_ref(),
            _ => None,
        }
    }
}

/// `p:spPr` / `p:grpSpPr`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShapeProperties {
    pub xfrm: Option<Transform>,
    /// `a:prstGeom prst`.
    pub preset: Option<String>,
    pub fill: Option<FillProperties>,
    pub line: Option<LineProperties>,
}

impl ShapeProperties {
    pub fn decode(node: &RawNode) -> Self {
        Self {
            xfrm: node.child("xfrm").map(Transform::decode),
            preset: node
                .child("prstGeom")
                .and_then(|n| n.attr("prst"))
                .map(str::to_string),
            fill: FillProperties::decode_choice(node),
            line: node.child("ln").map(LineProperties::decode),
        }
    }
}

/// `p:style`: references into the theme's style matrix, reduced to their colors.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShapeStyle {
    pub line_ref: Option<ColorSpec>,
    pub fill_ref: Option<ColorSpec>,
    pub font_ref: Option<ColorSpec>,
}

impl ShapeStyle {
    pub fn decode(node: &RawNode) -> Self {
        let color = |name: &str| node.child(name).and_then(ColorSpec::decode_choice);
        Self {
            line_ref: color("lnRef"),
            fill_ref: color("fillRef"),
            font_ref: color("fontRef"),
        }
    }
}

/// `p:ph`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Placeholder {
    pub kind: Option<String>,
    pub idx: Option<String>,
}

/// Shared non-visual properties (`p:nvSpPr`, `p:nvPicPr`, ...).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NonVisual {
    pub id: Option<String>,
    pub name: Option<String>,
    pub placeholder: Option<Placeholder>,
}

impl NonVisual {
    pub fn decode(node: &RawNode) -> Self {
        let c_nv_pr = node.child("cNvPr");
        let placeholder = node.path(&["nvPr", "ph"]).map(|ph| Placeholder {
            kind: ph.attr("type").map(str::to_string),
            idx: ph.attr("idx").map(str::to_string),
        });

        Self {
            id: c_nv_pr.and_then(|n| n.attr("id")).map(str::to_string),
            name: c_nv_pr.and_then(|n| n.attr("name")).map(str::to_string),
            placeholder,
        }
    }
}

/// Run properties: `a:rPr`, `a:defRPr` or `a:endParaRPr`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunProperties {
    /// Hundredths of a point.
    pub size: Option<i64>,
    pub bold: bool,
    pub italic: bool,
    pub underline: Option<String>,
    /// Thousandths of a percent.
    pub baseline: Option<i64>,
    pub latin: Option<String>,
    pub color: Option<ColorSpec>,
    /// Relationship id of `a:hlinkClick`.
    pub hyperlink: Option<String>,
}

impl RunProperties {
    pub fn decode(node: &RawNode) -> Self {
        let color = match FillProperties::decode_choice(node) {
            Some(FillProperties::Solid(color)) => color,
            _ => None,
        };

        Self {
            size: node.attr_i64("sz"),
            bold: node.attr_flag("b"),
            italic: node.attr_flag("i"),
            underline: node.attr("u").map(str::to_string),
            baseline: node.attr_i64("baseline"),
            latin: node
                .child("latin")
                .and_then(|n| n.attr("typeface"))
                .map(str::to_string),
            color,
            hyperlink: node
                .child("hlinkClick")
                .and_then(|n| n.attr("r:id"))
                .filter(|id| !id.is_empty())
                .map(str::to_string),
        }
    }
}

/// `a:buFont`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulletFont {
    pub typeface: Option<String>,
    pub pitch_family: Option<i64>,
}

/// Paragraph properties: `a:pPr` or a list-style level (`a:lvl1pPr` ...).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParagraphProperties {
    pub level: Option<u32>,
    pub align: Option<String>,
    /// EMU.
    pub margin_left: Option<i64>,
    pub bullet_char: Option<String>,
    pub bullet_font: Option<BulletFont>,
    pub default_run: Option<RunProperties>,
}

impl ParagraphProperties {
    pub fn decode(node: &RawNode) -> Self {
        Self {
            level: node.attr_i64("lvl").and_then(|v| u32::try_from(v).ok()),
            align: node.attr("algn").map(str::to_string),
            margin_left: node.attr_i64("marL"),
            bullet_char: node
                .child("buChar")
                .and_then(|n| n.attr("char"))
                .map(str::to_string),
            bullet_font: node.child("buFont").map(|n| BulletFont {
                typeface: n.attr("typeface").map(str::to_string),
                pitch_family: n.attr_i64("pitchFamily"),
            }),
            default_run: node.child("defRPr").map(RunProperties::decode),
        }
    }
}

/// `a:lstStyle` or one of the master text styles: properties per level 1..=9.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListStyle {
    pub levels: BTreeMap<u8, ParagraphProperties>,
}

impl ListStyle {
    pub fn decode(node: &RawNode) -> Self {
        let mut levels = BTreeMap::new();
        for child in &node.children {
            let level = child
                .local_name()
                .strip_prefix("lvl")
                .and_then(|rest| rest.strip_suffix("pPr"))
                .and_then(|n| n.parse::<u8>().ok());
            if let Some(level) = level {
                levels.insert(level, ParagraphProperties::decode(child));
            }
        }
        Self { levels }
    }

    pub fn level(&self, level: u8) -> Option<&ParagraphProperties> {
        self.levels.get(&level)
    }

    pub fn level1(&self) -> Option<&ParagraphProperties> {
        self.level(1)
    }
}

/// One run of a paragraph: `a:r` or a field `a:fld`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextRun {
    pub text: Option<String>,
    pub props: Option<RunProperties>,
    pub field: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextParagraph {
    pub props: Option<ParagraphProperties>,
    pub runs: Vec<TextRun>,
}

impl TextParagraph {
    pub fn decode(node: &RawNode) -> Self {
        let runs = node
            .children
            .iter()
            .filter(|c| c.is("r") || c.is("fld"))
            .map(|run| TextRun {
                text: run.child("t").and_then(|t| t.text()).map(str::to_string),
                props: run.child("rPr").map(RunProperties::decode),
                field: run.is("fld"),
            })
            .collect();

        Self {
            props: node.child("pPr").map(ParagraphProperties::decode),
            runs,
        }
    }
}

/// `p:txBody` / `a:txBody`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextBody {
    /// `a:bodyPr anchor`.
    pub anchor: Option<String>,
    pub list_style: Option<ListStyle>,
    pub paragraphs: Vec<TextParagraph>,
}

impl TextBody {
    pub fn decode(node: &RawNode) -> Self {
        Self {
            anchor: node
                .child("bodyPr")
                .and_then(|n| n.attr("anchor"))
                .map(str::to_string),
            list_style: node.child("lstStyle").map(ListStyle::decode),
            paragraphs: node.children_named("p").map(TextParagraph::decode).collect(),
        }
    }

    /// Alignment of the first paragraph that sets one.
    pub fn first_align(&self) -> Option<&str> {
        self.paragraphs
            .iter()
            .filter_map(|p| p.props.as_ref())
            .find_map(|p| p.align.as_deref())
    }
}

/// `p:sp` or `p:cxnSp`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Shape {
    pub connector: bool,
    pub nv: NonVisual,
    pub props: ShapeProperties,
    pub style: Option<ShapeStyle>,
    pub text: Option<TextBody>,
    pub order: u32,
}

impl Shape {
    pub fn decode(node: &RawNode) -> Self {
        let connector = node.is("cxnSp");
        let nv_name = if connector { "nvCxnSpPr" } else { "nvSpPr" };
        let mut nv = node.child(nv_name).map(NonVisual::decode).unwrap_or_default();
        if connector {
            // Connectors never take part in placeholder matching.
            nv.placeholder = None;
        }

        Self {
            connector,
            nv,
            props: node.child("spPr").map(ShapeProperties::decode).unwrap_or_default(),
            style: node.child("style").map(ShapeStyle::decode),
            text: node.child("txBody").map(TextBody::decode),
            order: node.order,
        }
    }

    pub fn placeholder(&self) -> Option<&Placeholder> {
        self.nv.placeholder.as_ref()
    }
}

/// `p:pic`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Picture {
    pub nv: NonVisual,
    pub blip_embed: Option<String>,
    pub props: ShapeProperties,
    pub order: u32,
}

impl Picture {
    pub fn decode(node: &RawNode) -> Self {
        Self {
            nv: node.child("nvPicPr").map(NonVisual::decode).unwrap_or_default(),
            blip_embed: node.child("blipFill").and_then(blip_embed),
            props: node.child("spPr").map(ShapeProperties::decode).unwrap_or_default(),
            order: node.order,
        }
    }
}

/// `a:tc`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableCellSpec {
    pub text: Option<TextBody>,
    pub row_span: Option<u32>,
    pub grid_span: Option<u32>,
    pub v_merge: bool,
    pub h_merge: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableSpec {
    pub rows: Vec<Vec<TableCellSpec>>,
}

impl TableSpec {
    pub fn decode(tbl: &RawNode) -> Self {
        let span = |n: &RawNode, name: &str| n.attr_i64(name).and_then(|v| u32::try_from(v).ok());
        let rows = tbl
            .children_named("tr")
            .map(|tr| {
                tr.children_named("tc")
                    .map(|tc| TableCellSpec {
                        text: tc.child("txBody").map(TextBody::decode),
                        row_span: span(tc, "rowSpan"),
                        grid_span: span(tc, "gridSpan"),
                        v_merge: tc.attr_flag("vMerge"),
                        h_merge: tc.attr_flag("hMerge"),
                    })
                    .collect()
            })
            .collect();
        Self { rows }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum GraphicContent {
    Table(TableSpec),
    /// Chart part relationship id.
    Chart { rel_id: Option<String> },
    Diagram,
    Unknown(String),
}

/// `p:graphicFrame`.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphicFrame {
    pub nv: NonVisual,
    pub xfrm: Option<Transform>,
    pub content: GraphicContent,
    pub order: u32,
}

impl GraphicFrame {
    pub fn decode(node: &RawNode) -> Self {
        let data = node.path(&["graphic", "graphicData"]);
        let uri = data.and_then(|d| d.attr("uri")).unwrap_or_default();
        let content = match uri {
            TABLE_URI => GraphicContent::Table(
                data.and_then(|d| d.child("tbl"))
                    .map(TableSpec::decode)
                    .unwrap_or_default(),
            ),
            CHART_URI => GraphicContent::Chart {
                rel_id: data
                    .and_then(|d| d.child("chart"))
                    .and_then(|c| c.attr("r:id"))
                    .map(str::to_string),
            },
            DIAGRAM_URI => GraphicContent::Diagram,
            other => GraphicContent::Unknown(other.to_string()),
        };

        Self {
            nv: node
                .child("nvGraphicFramePr")
                .map(NonVisual::decode)
                .unwrap_or_default(),
            xfrm: node.child("xfrm").map(Transform::decode),
            content,
            order: node.order,
        }
    }
}

/// `p:grpSp`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Group {
    pub nv: NonVisual,
    pub xfrm: Option<Transform>,
    pub children: Vec<TreeNode>,
    pub order: u32,
}

/// One element of a shape tree.
#[derive(Debug, Clone, PartialEq)]
pub enum TreeNode {
    Shape(Shape),
    Picture(Picture),
    GraphicFrame(GraphicFrame),
    Group(Group),
}

impl TreeNode {
    /// Decode a shape-tree child; `None` for elements we do not model.
    pub fn decode(node: &RawNode) -> Option<Self> {
        match node.local_name() {
            "sp" | "cxnSp" => Some(Self::Shape(Shape::decode(node))),
            "pic" => Some(Self::Picture(Picture::decode(node))),
            "graphicFrame" => Some(Self::GraphicFrame(GraphicFrame::decode(node))),
            "grpSp" => Some(Self::Group(Group {
                nv: node.child("nvGrpSpPr").map(NonVisual::decode).unwrap_or_default(),
                xfrm: node.path(&["grpSpPr", "xfrm"]).map(Transform::decode),
                children: decode_children(node),
                order: node.order,
            })),
            _ => None,
        }
    }

    pub fn order(&self) -> u32 {
        match self {
            TreeNode::Shape(n) => n.order,
            TreeNode::Picture(n) => n.order,
            TreeNode::GraphicFrame(n) => n.order,
            TreeNode::Group(n) => n.order,
        }
    }
}

fn decode_children(node: &RawNode) -> Vec<TreeNode> {
    node.children
        .iter()
        .filter(|c| !c.is("nvGrpSpPr") && !c.is("grpSpPr"))
        .filter_map(|c| {
            let decoded = TreeNode::decode(c);
            if decoded.is_none() {
                log::debug!("Skipping unsupported shape tree element <{}>", c.tag);
            }
            decoded
        })
        .collect()
}

/// `p:spTree`: the visual elements in document order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShapeTree {
    pub nodes: Vec<TreeNode>,
}

impl ShapeTree {
    pub fn decode(sp_tree: &RawNode) -> Self {
        Self {
            nodes: decode_children(sp_tree),
        }
    }
}

/// `p:bg`: either explicit properties or a theme style reference.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BackgroundSpec {
    pub fill: Option<FillProperties>,
    pub style_ref: Option<ColorSpec>,
}

impl BackgroundSpec {
    pub fn decode(bg: &RawNode) -> Self {
        Self {
            fill: bg.child("bgPr").and_then(FillProperties::decode_choice),
            style_ref: bg.child("bgRef").and_then(ColorSpec::decode_choice),
        }
    }

    pub fn image_embed(&self) -> Option<&str> {
        match &self.fill {
            Some(FillProperties::Picture { embed }) => embed.as_deref(),
            _ => None,
        }
    }
}

/// Master text styles (`p:txStyles`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextStyles {
    pub title: Option<ListStyle>,
    pub body: Option<ListStyle>,
    pub other: Option<ListStyle>,
}

impl TextStyles {
    pub fn decode(node: &RawNode) -> Self {
        Self {
            title: node.child("titleStyle").map(ListStyle::decode),
            body: node.child("bodyStyle").map(ListStyle::decode),
            other: node.child("otherStyle").map(ListStyle::decode),
        }
    }
}

/// The common part of a slide, layout or master: background and shape tree.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SlideData {
    pub background: Option<BackgroundSpec>,
    pub tree: ShapeTree,
    /// Only masters carry text styles.
    pub text_styles: Option<TextStyles>,
}

impl SlideData {
    /// Decode from a part root (`p:sld`, `p:sldLayout` or `p:sldMaster`).
    pub fn decode(root: &RawNode) -> Self {
        let c_sld = root.child("cSld");
        Self {
            background: c_sld.and_then(|c| c.child("bg")).map(BackgroundSpec::decode),
            tree: c_sld
                .and_then(|c| c.child("spTree"))
                .map(ShapeTree::decode)
                .unwrap_or_default(),
            text_styles: root.child("txStyles").map(TextStyles::decode),
        }
    }
}
