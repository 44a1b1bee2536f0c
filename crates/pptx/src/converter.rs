//! Presentation-level conversion.
//!
//! Discovers the slides of a package, resolves each one against its layout,
//! master and the presentation theme, and collects the results in
//! presentation order.

use std::io::{Read, Seek};
use std::sync::Arc;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use slideview_core::units::{emu_to_px, DEFAULT_SLIDE_HEIGHT_EMU, DEFAULT_SLIDE_WIDTH_EMU};
use slideview_core::{render_css, Error, Result, SlideView, StyleCache, StyleRule};

use crate::images::ImageEmbedder;
use crate::package::Package;
use crate::relationships::rel_types;
use crate::slide::{assemble, load_rels, SlideContext, TemplateCache};
use crate::theme::ThemeContext;
use crate::xml::RawNode;

const PRESENTATION_PART: &str = "ppt/presentation.xml";
const CONTENT_TYPES_PART: &str = "[Content_Types].xml";
const SLIDE_CONTENT_TYPE: &str = "application/vnd.openxmlformats-officedocument.presentationml.slide+xml";

/// Conversion options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertOptions {
    /// Resolve slides on the rayon thread pool.
    pub parallel: bool,
    /// Size of the image embedding pool; 0 or 1 embeds inline.
    pub image_workers: usize,
    /// Replace image references with data URIs.
    pub embed_images: bool,
    /// Convert only this 1-based slide.
    pub slide_filter: Option<usize>,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            parallel: true,
            image_workers: 4,
            embed_images: true,
            slide_filter: None,
        }
    }
}

impl ConvertOptions {
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_image_workers(mut self, workers: usize) -> Self {
        self.image_workers = workers;
        self
    }

    pub fn with_embed_images(mut self, embed: bool) -> Self {
        self.embed_images = embed;
        self
    }

    pub fn with_slide_filter(mut self, slide: Option<usize>) -> Self {
        self.slide_filter = slide;
        self
    }
}

/// A slide that was skipped, and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlideDiagnostic {
    /// 1-based position in presentation order.
    pub index: usize,
    pub path: String,
    pub message: String,
}

/// The result of converting one presentation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversion {
    /// Slide size in pixels.
    pub width: i64,
    pub height: i64,
    pub slides: Vec<SlideView>,
    /// Span style classes referenced by the slides.
    pub styles: Vec<StyleRule>,
    pub diagnostics: Vec<SlideDiagnostic>,
}

impl Conversion {
    /// The style classes as a stylesheet.
    pub fn css(&self, scope: &str) -> String {
        render_css(&self.styles, scope)
    }
}

/// Converts `.pptx` packages into slide views.
#[derive(Debug, Default)]
pub struct PptxConverter {
    options: ConvertOptions,
}

impl PptxConverter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ConvertOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ConvertOptions {
        &self.options
    }

    /// Convert a `.pptx` read from `reader`.
    pub fn convert<R: Read + Seek>(&self, reader: R) -> Result<Conversion> {
        let package = Package::from_reader(reader)?;
        self.convert_package(&package)
    }

    /// Convert an opened package.
    ///
    /// Fails as a whole when the presentation part or the theme is missing;
    /// any other slide failure skips that slide with a diagnostic.
    pub fn convert_package(&self, package: &Package) -> Result<Conversion> {
        let presentation = package.xml(PRESENTATION_PART)?.ok_or_else(|| {
            Error::InvalidPresentation(format!("{} not found", PRESENTATION_PART))
        })?;
        let rels = load_rels(package, PRESENTATION_PART)?;

        let theme_path = rels
            .first_of_type(rel_types::THEME)
            .filter(|r| !r.external)
            .map(|r| r.target.clone())
            .ok_or(Error::MissingTheme)?;
        let theme_root = package.xml(&theme_path)?.ok_or(Error::MissingTheme)?;
        let theme = Arc::new(ThemeContext::from_node(&theme_root));
        log::debug!("Theme {} with {} scheme colors", theme_path, theme.len());

        let (width, height) = slide_size(&presentation);

        let mut slide_paths = presentation_slides(&presentation, &rels);
        if slide_paths.is_empty() {
            log::debug!("No slide list in presentation part, using content types");
            slide_paths = content_type_slides(package)?;
        }

        let jobs: Vec<(usize, String)> = slide_paths
            .into_iter()
            .enumerate()
            .map(|(i, path)| (i + 1, path))
            .filter(|(number, _)| self.options.slide_filter.map_or(true, |n| n == *number))
            .collect();
        if let Some(n) = self.options.slide_filter {
            if jobs.is_empty() {
                log::warn!("Slide {} does not exist", n);
            }
        }

        let templates = TemplateCache::new();
        let styles = StyleCache::new();
        let embedder = self
            .options
            .embed_images
            .then(|| ImageEmbedder::new(self.options.image_workers));

        let convert_one = |(number, path): &(usize, String)| -> Result<SlideView> {
            let ctx = SlideContext::load(package, path, &templates, Arc::clone(&theme))?;
            let mut view = assemble(&ctx, *number, width, height, &styles, package);
            if let Some(embedder) = &embedder {
                embedder.embed(&mut view, package);
            }
            Ok(view)
        };

        let results: Vec<Result<SlideView>> = if self.options.parallel {
            jobs.par_iter().map(convert_one).collect()
        } else {
            jobs.iter().map(convert_one).collect()
        };

        let mut slides = Vec::with_capacity(results.len());
        let mut diagnostics = Vec::new();
        for ((number, path), result) in jobs.into_iter().zip(results) {
            match result {
                Ok(view) => slides.push(view),
                Err(e) if e.is_fatal_for_document() => return Err(e),
                Err(e) => {
                    log::warn!("Skipping slide {} ({}): {}", number, path, e);
                    diagnostics.push(SlideDiagnostic {
                        index: number,
                        path,
                        message: e.to_string(),
                    });
                }
            }
        }

        log::debug!(
            "Converted {} slides, {} skipped, {} style classes, {} parts parsed",
            slides.len(),
            diagnostics.len(),
            styles.len(),
            package.cache().parsed_parts()
        );

        Ok(Conversion {
            width,
            height,
            slides,
            styles: styles.rules(),
            diagnostics,
        })
    }
}

/// `p:sldSz` in pixels.
fn slide_size(presentation: &RawNode) -> (i64, i64) {
    let size = presentation.child("sldSz");
    let cx = size
        .and_then(|s| s.attr_i64("cx"))
        .unwrap_or(DEFAULT_SLIDE_WIDTH_EMU);
    let cy = size
        .and_then(|s| s.attr_i64("cy"))
        .unwrap_or(DEFAULT_SLIDE_HEIGHT_EMU);
    (emu_to_px(cx), emu_to_px(cy))
}

/// Slide paths in `p:sldIdLst` order.
fn presentation_slides(
    presentation: &RawNode,
    rels: &crate::relationships::RelationshipMap,
) -> Vec<String> {
    presentation
        .child("sldIdLst")
        .into_iter()
        .flat_map(|list| list.children_named("sldId"))
        .filter_map(|id| {
            let rel_id = id.attr("r:id")?;
            match rels.get(rel_id) {
                Some(rel) if rel.rel_type == rel_types::SLIDE && !rel.external => {
                    Some(rel.target.clone())
                }
                _ => {
                    log::warn!("Slide relationship {} not found", rel_id);
                    None
                }
            }
        })
        .collect()
}

/// Slide overrides of the content-types part, ordered by slide number.
fn content_type_slides(package: &Package) -> Result<Vec<String>> {
    let Some(types) = package.xml(CONTENT_TYPES_PART)? else {
        return Ok(Vec::new());
    };

    let mut slides: Vec<(String, Option<usize>)> = types
        .children_named("Override")
        .filter(|o| o.attr("ContentType") == Some(SLIDE_CONTENT_TYPE))
        .filter_map(|o| o.attr("PartName"))
        .map(|name| {
            let path = name.trim_start_matches('/').to_string();
            let number = extract_slide_number(&path);
            (path, number)
        })
        .collect();

    slides.sort_by(|a, b| match (a.1, b.1) {
        (Some(na), Some(nb)) => na.cmp(&nb),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => a.0.cmp(&b.0),
    });

    Ok(slides.into_iter().map(|(path, _)| path).collect())
}

/// Extract the trailing number from a string like "rId1" or "slide1.xml".
fn extract_slide_number(s: &str) -> Option<usize> {
    let s = s.trim_end_matches(".rels").trim_end_matches(".xml");
    let digits: String = s.chars().rev().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    let digits: String = digits.chars().rev().collect();
    digits.parse().ok()
}
