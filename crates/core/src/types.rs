//! Render-ready slide model handed to a drawer.
//!
//! All lengths are whole CSS pixels unless a field name says otherwise.
//! Array order of every node list is paint order.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::color::Color;
use crate::geometry::Geometry;

/// One slide, fully resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlideView {
    /// 1-based slide number in presentation order.
    pub number: usize,

    /// Package path of the slide part.
    pub path: String,

    pub width: i64,
    pub height: i64,

    pub background: Background,

    /// Decorative nodes inherited from the slide layout.
    pub layout_nodes: Vec<NodeElement>,

    /// Nodes defined by the slide itself.
    pub slide_nodes: Vec<NodeElement>,
}

impl SlideView {
    /// Create an empty slide view with a white background.
    pub fn new(number: usize, path: impl Into<String>, width: i64, height: i64) -> Self {
        Self {
            number,
            path: path.into(),
            width,
            height,
            background: Background::default(),
            layout_nodes: Vec::new(),
            slide_nodes: Vec::new(),
        }
    }

    pub fn add_layout_node(&mut self, node: NodeElement) {
        self.layout_nodes.push(node);
    }

    pub fn add_slide_node(&mut self, node: NodeElement) {
        self.slide_nodes.push(node);
    }

    /// All nodes in paint order, layout nodes first.
    pub fn nodes(&self) -> impl Iterator<Item = &NodeElement> {
        self.layout_nodes.iter().chain(self.slide_nodes.iter())
    }
}

/// Slide background.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Background {
    pub color: Color,
    pub image: Option<EmbeddedImage>,
}

impl Default for Background {
    fn default() -> Self {
        Self {
            color: Color::WHITE,
            image: None,
        }
    }
}

/// Image bytes encoded for inline embedding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddedImage {
    /// Package path the bytes were read from.
    pub path: String,
    pub mime: ImageMime,
    /// `data:<mime>;base64,<payload>`; `None` until the bytes are embedded.
    pub data_uri: Option<String>,
}

impl EmbeddedImage {
    /// Reference an image by path; its bytes are embedded later.
    pub fn pending(path: impl Into<String>) -> Self {
        let path = path.into();
        let mime = ImageMime::from_path(&path);
        Self {
            path,
            mime,
            data_uri: None,
        }
    }

    pub fn is_embedded(&self) -> bool {
        self.data_uri.is_some()
    }
}

/// MIME type of an embedded image, derived from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageMime {
    Jpeg,
    Png,
    Gif,
    Emf,
    Wmf,
    Tiff,
    Unknown,
}

impl ImageMime {
    /// Map a file extension (case-insensitive) to a MIME type.
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "jpg" | "jpeg" => Self::Jpeg,
            "png" => Self::Png,
            "gif" => Self::Gif,
            "emf" => Self::Emf,
            "wmf" => Self::Wmf,
            "tif" | "tiff" => Self::Tiff,
            _ => Self::Unknown,
        }
    }

    /// Map a package path to a MIME type by its extension.
    pub fn from_path(path: &str) -> Self {
        match path.rsplit_once('.') {
            Some((_, ext)) => Self::from_extension(ext),
            None => Self::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Gif => "image/gif",
            // Browsers do not render these two natively.
            Self::Emf => "image/x-emf",
            Self::Wmf => "image/x-wmf",
            Self::Tiff => "image/tiff",
            Self::Unknown => "image/*",
        }
    }
}

/// Position, size and paint order shared by every node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frame {
    pub top: i64,
    pub left: i64,
    pub width: i64,
    pub height: i64,
    /// Document order of the source element.
    pub z_index: u32,
}

/// A resolved slide element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NodeElement {
    Text(TextNode),
    Shape(ShapeNode),
    Picture(PictureNode),
    Table(TableNode),
    Chart(ChartNode),
    Diagram(DiagramNode),
    Group(GroupNode),
}

impl NodeElement {
    pub fn frame(&self) -> &Frame {
        match self {
            NodeElement::Text(n) => &n.frame,
            NodeElement::Shape(n) => &n.frame,
            NodeElement::Picture(n) => &n.frame,
            NodeElement::Table(n) => &n.frame,
            NodeElement::Chart(n) => &n.frame,
            NodeElement::Diagram(n) => &n.frame,
            NodeElement::Group(n) => &n.frame,
        }
    }

    pub fn z_index(&self) -> u32 {
        self.frame().z_index
    }

    /// Short lowercase name of the variant.
    pub fn kind(&self) -> &'static str {
        match self {
            NodeElement::Text(_) => "text",
            NodeElement::Shape(_) => "shape",
            NodeElement::Picture(_) => "picture",
            NodeElement::Table(_) => "table",
            NodeElement::Chart(_) => "chart",
            NodeElement::Diagram(_) => "diagram",
            NodeElement::Group(_) => "group",
        }
    }
}

/// Placeholder role of a shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceholderRef {
    pub idx: Option<String>,
    /// Resolved type; inherited from the layout or master when the slide omits it.
    pub kind: Option<String>,
}

/// A shape with no preset geometry: a plain text/content container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextNode {
    pub id: Option<String>,
    pub name: Option<String>,
    pub frame: Frame,
    pub placeholder: Option<PlaceholderRef>,
    pub fill: Fill,
    pub border: Border,
    pub background_image: Option<EmbeddedImage>,
    pub text: Option<TextBlock>,
}

/// A shape drawn from a preset geometry, or a connector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeNode {
    pub id: Option<String>,
    pub name: Option<String>,
    pub frame: Frame,
    pub connector: bool,
    pub placeholder: Option<PlaceholderRef>,
    /// Preset geometry name as written in the source.
    pub preset: String,
    pub geometry: Geometry,
    pub flipped: bool,
    pub fill: Fill,
    pub border: Border,
    pub markers: LineMarkers,
    pub font_color: Option<Color>,
    pub background_image: Option<EmbeddedImage>,
    pub text: Option<TextBlock>,
}

/// Arrow heads drawn at the ends of a line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineMarkers {
    pub start: bool,
    pub end: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PictureNode {
    pub id: Option<String>,
    pub name: Option<String>,
    pub frame: Frame,
    /// `None` when the image relationship or bytes cannot be found.
    pub image: Option<EmbeddedImage>,
    pub border_radius: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableNode {
    pub frame: Frame,
    pub rows: Vec<TableRow>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableRow {
    pub cells: Vec<TableCell>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableCell {
    /// `None` when the cell resolves to no text at all.
    pub text: Option<TextBlock>,
    pub row_span: Option<u32>,
    pub col_span: Option<u32>,
    pub v_merge: bool,
    pub h_merge: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartNode {
    pub frame: Frame,
    pub chart: Option<ChartData>,
}

/// Plot data pulled from a chart part's caches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartData {
    pub kind: ChartKind,
    pub series: Vec<ChartSeries>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChartKind {
    LineChart,
    BarChart,
    PieChart,
    Pie3DChart,
    AreaChart,
    ScatterChart,
}

impl ChartKind {
    /// Map a plot-area element local name to a chart kind.
    pub fn from_local_name(name: &str) -> Option<Self> {
        match name {
            "lineChart" => Some(Self::LineChart),
            "barChart" => Some(Self::BarChart),
            "pieChart" => Some(Self::PieChart),
            "pie3DChart" => Some(Self::Pie3DChart),
            "areaChart" => Some(Self::AreaChart),
            "scatterChart" => Some(Self::ScatterChart),
            _ => None,
        }
    }
}

/// One column of the chart matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum ChartSeries {
    /// A named series of `(category index, value)` points with category labels.
    Category {
        name: String,
        values: Vec<(u32, f64)>,
        labels: BTreeMap<u32, String>,
    },
    /// A plain row of numbers (scatter x or y values).
    Row { values: Vec<f64> },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagramNode {
    pub frame: Frame,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupNode {
    pub frame: Frame,
    pub nodes: Vec<NodeElement>,
}

/// Resolved fill of a shape.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Fill {
    /// Explicitly transparent.
    None,
    Solid(Color),
    /// No tier defines a fill.
    Unspecified,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Border {
    pub width_pt: f64,
    /// `None` leaves the color to the drawer's default.
    pub color: Option<Color>,
    pub style: BorderStyle,
    /// SVG `stroke-dasharray` value.
    pub dash_array: String,
}

impl Default for Border {
    fn default() -> Self {
        Self {
            width_pt: 1.0,
            color: None,
            style: BorderStyle::Solid,
            dash_array: "0".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BorderStyle {
    Solid,
    Dashed,
    Dotted,
    /// The outline is explicitly unfilled.
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HorizontalAlign {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerticalAnchor {
    Top,
    Middle,
    Bottom,
}

/// A resolved text body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextBlock {
    pub anchor: VerticalAnchor,
    pub paragraphs: Vec<Paragraph>,
}

impl TextBlock {
    /// Concatenated span text, paragraphs joined by newlines.
    pub fn plain_text(&self) -> String {
        self.paragraphs
            .iter()
            .map(|p| p.spans.iter().map(|s| s.text.as_str()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// True when no span carries visible characters.
    pub fn is_blank(&self) -> bool {
        self.paragraphs
            .iter()
            .flat_map(|p| p.spans.iter())
            .all(|s| s.text.trim_matches(|c: char| c.is_whitespace() || c == '\u{a0}').is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paragraph {
    pub align: HorizontalAlign,
    pub bullet: BulletMarker,
    pub spans: Vec<Span>,
}

/// Leading marker of a paragraph. Without a glyph it only carries indentation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BulletMarker {
    pub glyph: Option<String>,
    pub margin_left: i64,
    pub margin_right: i64,
    pub font_family: Option<String>,
    pub font_size_pt: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Span {
    pub text: String,
    pub style: SpanStyle,
    /// Deduplicated style class name.
    pub class_name: String,
    pub link: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FontSize {
    Points(f64),
    Inherit,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FontFamily {
    Named(String),
    Inherit,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpanStyle {
    pub color: Option<Color>,
    pub font_size: FontSize,
    pub font_family: FontFamily,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    /// Baseline shift in percent; `None` is the normal baseline.
    pub baseline: Option<f64>,
}

impl SpanStyle {
    /// CSS declaration text; identical styles produce identical signatures.
    pub fn signature(&self) -> String {
        let color = self.color.map(|c| c.css()).unwrap_or_else(|| "inherit".to_string());
        let size = match &self.font_size {
            FontSize::Points(pt) => format!("{}pt", pt),
            FontSize::Inherit => "inherit".to_string(),
        };
        let family = match &self.font_family {
            FontFamily::Named(name) => name.as_str(),
            FontFamily::Inherit => "inherit",
        };
        let baseline = match self.baseline {
            Some(pct) => format!("{}%", pct),
            None => "baseline".to_string(),
        };

        format!(
            "color:{};font-size:{};font-family:{};font-weight:{};font-style:{};text-decoration:{};vertical-align:{};",
            color,
            size,
            family,
            if self.bold { "bold" } else { "initial" },
            if self.italic { "italic" } else { "normal" },
            if self.underline { "underline" } else { "initial" },
            baseline,
        )
    }
}
