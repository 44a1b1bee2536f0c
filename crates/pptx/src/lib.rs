//! PPTX (Office Open XML) document-model resolver.
//!
//! Reads a `.pptx` package and resolves every slide against its layout, master
//! and theme into render-ready [`SlideView`](slideview_core::SlideView)s.

pub mod builder;
pub mod cascade;
pub mod chart;
pub mod converter;
pub mod images;
pub mod model;
pub mod package;
pub mod placeholder;
pub mod relationships;
pub mod slide;
pub mod theme;
pub mod xml;

#[cfg(test)]
mod fixtures;

pub use converter::{Conversion, ConvertOptions, PptxConverter, SlideDiagnostic};
pub use package::{MemoryPackage, Package, PackageProvider, ZipPackage};
pub use slide::{SlideContext, TemplateCache};
pub use theme::ThemeContext;
