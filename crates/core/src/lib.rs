//! Core domain types for resolving presentation slides into render-ready views.
//!
//! Format-specific parsing lives in `slideview-pptx`; this crate holds the
//! output model, units, colors and the shared style cache.

pub mod color;
pub mod error;
pub mod geometry;
pub mod style_cache;
pub mod types;
pub mod units;

pub use color::Color;
pub use error::{ChainLink, Error, Result};
pub use geometry::{ArrowDirection, Geometry, Outline};
pub use style_cache::{render_css, StyleCache, StyleRule};
pub use types::{
    Background, Border, BorderStyle, BulletMarker, ChartData, ChartKind, ChartNode, ChartSeries,
    DiagramNode, EmbeddedImage, Fill, FontFamily, FontSize, Frame, GroupNode, HorizontalAlign,
    ImageMime, LineMarkers, NodeElement, Paragraph, PictureNode, PlaceholderRef, ShapeNode,
    SlideView, Span, SpanStyle, TableCell, TableNode, TableRow, TextBlock, TextNode,
    VerticalAnchor,
};
