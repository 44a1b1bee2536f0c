//! Preset geometry table.
//!
//! Maps a preset shape name to a descriptor that a single generic drawer can
//! turn into an outline. Names missing from the table are [`Geometry::Unsupported`].

use std::collections::HashMap;
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

/// Corner radius used for `roundRect`, in pixels.
pub const ROUND_RECT_RADIUS: f64 = 7.0;

/// Length reserved at the end of a block arrow for its head, in pixels.
pub const ARROW_HEAD_LENGTH: f64 = 15.0;

/// How a preset shape is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Geometry {
    Rect,
    RoundRect,
    Ellipse,
    /// Right-angle connector drawn as an open path.
    BentConnector,
    /// Straight line from one corner of the frame to the other.
    Line,
    /// Block arrow drawn as a thick line with a head marker.
    Arrow(ArrowDirection),
    Unsupported,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArrowDirection {
    Right,
    Down,
}

/// Drawable outline of a shape inside its own frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Outline {
    Rect { width: f64, height: f64, radius: f64 },
    Ellipse { cx: f64, cy: f64, rx: f64, ry: f64 },
    Path { d: String },
    Line { x1: f64, y1: f64, x2: f64, y2: f64 },
    /// A line whose stroke width is derived from the frame, always ending in a head.
    ArrowLine {
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
        stroke_width: f64,
    },
}

/// Presets drawn as their bounding rectangle.
const RECT_PRESETS: &[&str] = &[
    "accentBorderCallout1", "accentBorderCallout2", "accentBorderCallout3",
    "accentCallout1", "accentCallout2", "accentCallout3",
    "actionButtonBackPrevious", "actionButtonBeginning", "actionButtonBlank",
    "actionButtonDocument", "actionButtonEnd", "actionButtonForwardNext",
    "actionButtonHelp", "actionButtonHome", "actionButtonInformation",
    "actionButtonMovie", "actionButtonReturn", "actionButtonSound",
    "arc", "bevel", "blockArc",
    "borderCallout1", "borderCallout2", "borderCallout3",
    "bracePair", "bracketPair",
    "callout1", "callout2", "callout3",
    "can", "chartPlus", "chartStar", "chartX", "chevron", "chord",
    "cloud", "cloudCallout", "corner", "cornerTabs", "cube",
    "decagon", "diagStripe", "diamond", "dodecagon", "donut", "doubleWave",
    "downArrowCallout", "ellipseRibbon", "ellipseRibbon2",
    "flowChartAlternateProcess", "flowChartCollate", "flowChartConnector",
    "flowChartDecision", "flowChartDelay", "flowChartDisplay",
    "flowChartDocument", "flowChartExtract", "flowChartInputOutput",
    "flowChartInternalStorage", "flowChartMagneticDisk", "flowChartMagneticDrum",
    "flowChartMagneticTape", "flowChartManualInput", "flowChartManualOperation",
    "flowChartMerge", "flowChartMultidocument", "flowChartOfflineStorage",
    "flowChartOffpageConnector", "flowChartOnlineStorage", "flowChartOr",
    "flowChartPredefinedProcess", "flowChartPreparation", "flowChartProcess",
    "flowChartPunchedCard", "flowChartPunchedTape", "flowChartSort",
    "flowChartSummingJunction", "flowChartTerminator",
    "folderCorner", "frame", "funnel", "gear6", "gear9", "halfFrame",
    "heart", "heptagon", "hexagon", "homePlate", "horizontalScroll",
    "irregularSeal1", "irregularSeal2",
    "leftArrow", "leftArrowCallout", "leftBrace", "leftBracket",
    "leftRightArrowCallout", "leftRightRibbon", "lightningBolt", "lineInv",
    "mathDivide", "mathEqual", "mathMinus", "mathMultiply", "mathNotEqual", "mathPlus",
    "moon", "nonIsoscelesTrapezoid", "noSmoking", "octagon", "parallelogram",
    "pentagon", "pie", "pieWedge", "plaque", "plaqueTabs", "plus",
    "quadArrowCallout", "ribbon", "ribbon2",
    "rightArrowCallout", "rightBrace", "rightBracket",
    "round1Rect", "round2DiagRect", "round2SameRect", "rtTriangle", "smileyFace",
    "snip1Rect", "snip2DiagRect", "snip2SameRect", "snipRoundRect", "squareTabs",
    "star10", "star12", "star16", "star24", "star32",
    "star4", "star5", "star6", "star7", "star8",
    "sun", "teardrop", "trapezoid", "upArrowCallout", "upDownArrowCallout",
    "verticalScroll", "wave", "wedgeEllipseCallout", "wedgeRectCallout",
    "wedgeRoundRectCallout", "rect",
];

/// Presets drawn as a straight line.
const LINE_PRESETS: &[&str] = &[
    "line",
    "straightConnector1",
    "bentConnector3",
    "bentConnector4",
    "bentConnector5",
    "curvedConnector2",
    "curvedConnector3",
    "curvedConnector4",
    "curvedConnector5",
];

static GEOMETRY_TABLE: LazyLock<HashMap<&'static str, Geometry>> = LazyLock::new(|| {
    let mut table = HashMap::new();
    for name in RECT_PRESETS {
        table.insert(*name, Geometry::Rect);
    }
    for name in LINE_PRESETS {
        table.insert(*name, Geometry::Line);
    }
    table.insert("roundRect", Geometry::RoundRect);
    table.insert("ellipse", Geometry::Ellipse);
    table.insert("bentConnector2", Geometry::BentConnector);
    table.insert("rightArrow", Geometry::Arrow(ArrowDirection::Right));
    table.insert("downArrow", Geometry::Arrow(ArrowDirection::Down));
    table
});

impl Geometry {
    /// Look up a preset name.
    pub fn from_preset(prst: &str) -> Self {
        GEOMETRY_TABLE
            .get(prst)
            .copied()
            .unwrap_or(Geometry::Unsupported)
    }

    /// Whether the outline is an open stroke that can carry end markers.
    pub fn accepts_markers(&self) -> bool {
        matches!(self, Geometry::Line | Geometry::BentConnector)
    }

    /// Compute the outline for a frame of `width` x `height` pixels.
    ///
    /// `flipped` mirrors lines and bent connectors. Unsupported presets have
    /// no outline.
    pub fn outline(&self, width: f64, height: f64, flipped: bool) -> Option<Outline> {
        match self {
            Geometry::Rect => Some(Outline::Rect {
                width,
                height,
                radius: 0.0,
            }),
            Geometry::RoundRect => Some(Outline::Rect {
                width,
                height,
                radius: ROUND_RECT_RADIUS,
            }),
            Geometry::Ellipse => Some(Outline::Ellipse {
                cx: width / 2.0,
                cy: height / 2.0,
                rx: width / 2.0,
                ry: height / 2.0,
            }),
            Geometry::BentConnector => {
                let d = if flipped {
                    format!("M 0 {w} L {h} {w} L {h} 0", w = width, h = height)
                } else {
                    format!("M {w} 0 L {w} {h} L 0 {h}", w = width, h = height)
                };
                Some(Outline::Path { d })
            }
            Geometry::Line => Some(if flipped {
                Outline::Line {
                    x1: width,
                    y1: 0.0,
                    x2: 0.0,
                    y2: height,
                }
            } else {
                Outline::Line {
                    x1: 0.0,
                    y1: 0.0,
                    x2: width,
                    y2: height,
                }
            }),
            Geometry::Arrow(ArrowDirection::Right) => Some(Outline::ArrowLine {
                x1: 0.0,
                y1: height / 2.0,
                x2: width - ARROW_HEAD_LENGTH,
                y2: height / 2.0,
                stroke_width: height / 2.0,
            }),
            Geometry::Arrow(ArrowDirection::Down) => Some(Outline::ArrowLine {
                x1: width / 2.0,
                y1: 0.0,
                x2: width / 2.0,
                y2: height - ARROW_HEAD_LENGTH,
                stroke_width: width / 2.0,
            }),
            Geometry::Unsupported => None,
        }
    }
}
