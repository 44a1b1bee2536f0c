//! Slide loading and assembly.
//!
//! A slide is resolved against exactly one layout and one master. Layouts and
//! masters are shared by many slides, so they are decoded once and kept in a
//! [`TemplateCache`] for the whole conversion.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use slideview_core::{ChainLink, EmbeddedImage, Error, Result, SlideView, StyleCache};

use crate::builder::NodeBuilder;
use crate::cascade::resolve_background_color;
use crate::model::{SlideData, TreeNode};
use crate::package::Package;
use crate::placeholder::PlaceholderIndex;
use crate::relationships::{rel_types, rels_path_for, RelationshipMap};
use crate::theme::ThemeContext;

/// A decoded layout or master with its relationships and placeholder index.
#[derive(Debug)]
pub struct TemplatePart {
    pub path: String,
    pub data: SlideData,
    pub rels: RelationshipMap,
    pub index: PlaceholderIndex,
}

impl TemplatePart {
    pub fn load(package: &Package, path: &str, link: ChainLink) -> Result<Self> {
        let root = package
            .xml(path)?
            .ok_or_else(|| Error::missing(link, path))?;
        let data = SlideData::decode(&root);
        let index = PlaceholderIndex::index(&data.tree);

        Ok(Self {
            path: path.to_string(),
            data,
            rels: load_rels(package, path)?,
            index,
        })
    }
}

/// Relationships of a part. A part without a `.rels` companion has none.
pub fn load_rels(package: &Package, part: &str) -> Result<RelationshipMap> {
    let path = rels_path_for(part);
    Ok(match package.xml(&path)? {
        Some(rels) => RelationshipMap::resolve(&rels, part),
        None => RelationshipMap::new(),
    })
}

/// Layouts and masters by package path, loaded at most once.
#[derive(Debug, Default)]
pub struct TemplateCache {
    parts: RwLock<HashMap<String, Arc<TemplatePart>>>,
}

impl TemplateCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached part, loading it on first use. Failures are not cached.
    pub fn get_or_load(
        &self,
        package: &Package,
        path: &str,
        link: ChainLink,
    ) -> Result<Arc<TemplatePart>> {
        if let Some(part) = self.parts.read().get(path) {
            return Ok(Arc::clone(part));
        }

        let loaded = Arc::new(TemplatePart::load(package, path, link)?);
        log::debug!("Loaded {} {}", link, path);

        let mut parts = self.parts.write();
        Ok(Arc::clone(
            parts.entry(path.to_string()).or_insert(loaded),
        ))
    }

    pub fn len(&self) -> usize {
        self.parts.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.read().is_empty()
    }
}

/// Everything one slide is resolved against.
#[derive(Debug)]
pub struct SlideContext {
    pub path: String,
    pub slide: SlideData,
    pub rels: RelationshipMap,
    pub layout: Arc<TemplatePart>,
    pub master: Arc<TemplatePart>,
    pub theme: Arc<ThemeContext>,
}

impl SlideContext {
    /// Load a slide and follow its chain: slide -> layout -> master.
    pub fn load(
        package: &Package,
        path: &str,
        templates: &TemplateCache,
        theme: Arc<ThemeContext>,
    ) -> Result<Self> {
        let root = package
            .xml(path)?
            .ok_or_else(|| Error::missing(ChainLink::Slide, path))?;
        let slide = SlideData::decode(&root);
        let rels = load_rels(package, path)?;

        let layout_path = rels
            .first_of_type(rel_types::SLIDE_LAYOUT)
            .filter(|r| !r.external)
            .map(|r| r.target.clone())
            .ok_or_else(|| Error::missing(ChainLink::Layout, rels_path_for(path)))?;
        let layout = templates.get_or_load(package, &layout_path, ChainLink::Layout)?;

        let master_path = layout
            .rels
            .first_of_type(rel_types::SLIDE_MASTER)
            .filter(|r| !r.external)
            .map(|r| r.target.clone())
            .ok_or_else(|| Error::missing(ChainLink::Master, rels_path_for(&layout.path)))?;
        let master = templates.get_or_load(package, &master_path, ChainLink::Master)?;

        Ok(Self {
            path: path.to_string(),
            slide,
            rels,
            layout,
            master,
            theme,
        })
    }

    /// The slide, layout and master data with the relationships of each.
    fn tiers(&self) -> [(&SlideData, &RelationshipMap); 3] {
        [
            (&self.slide, &self.rels),
            (&self.layout.data, &self.layout.rels),
            (&self.master.data, &self.master.rels),
        ]
    }
}

/// Resolve a loaded slide into its view model.
///
/// Images are left as pending references; see [`crate::images`].
pub fn assemble(
    ctx: &SlideContext,
    number: usize,
    width: i64,
    height: i64,
    styles: &StyleCache,
    package: &Package,
) -> SlideView {
    let mut view = SlideView::new(number, ctx.path.clone(), width, height);

    let tiers = ctx.tiers();
    view.background.color = resolve_background_color(
        tiers.map(|(data, _)| data.background.as_ref()),
        &ctx.theme,
    );
    view.background.image = background_image(&tiers);

    // Only pictures carry over from the layout; its placeholders and text are
    // prompts for the slide author.
    let layout_builder = NodeBuilder::new(ctx, &ctx.layout.rels, styles, package);
    for node in &ctx.layout.data.tree.nodes {
        if let TreeNode::Picture(pic) = node {
            view.add_layout_node(layout_builder.build_picture(pic));
        }
    }

    let slide_builder = NodeBuilder::new(ctx, &ctx.rels, styles, package);
    for node in &ctx.slide.tree.nodes {
        if let Some(element) = slide_builder.build(node) {
            view.add_slide_node(element);
        }
    }

    log::debug!(
        "Assembled slide {} ({}): {} layout nodes, {} slide nodes",
        number,
        ctx.path,
        view.layout_nodes.len(),
        view.slide_nodes.len()
    );
    view
}

/// First picture background along the chain, resolved with the relationships
/// of the part that declares it.
fn background_image(tiers: &[(&SlideData, &RelationshipMap); 3]) -> Option<EmbeddedImage> {
    tiers.iter().find_map(|(data, rels)| {
        let id = data.background.as_ref()?.image_embed()?;
        match rels.part_target(id) {
            Some(target) => Some(EmbeddedImage::pending(target)),
            None => {
                log::debug!("Background image relationship {} not found", id);
                None
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use crate::package::MemoryPackage;
    use slideview_core::{Color, NodeElement};

    fn load(package: &Package, path: &str, templates: &TemplateCache) -> Result<SlideContext> {
        SlideContext::load(package, path, templates, Arc::new(fixtures::theme()))
    }

    fn assembled(package: &Package, path: &str) -> SlideView {
        let templates = TemplateCache::new();
        let ctx = load(package, path, &templates).unwrap();
        assemble(&ctx, 1, 960, 720, &StyleCache::new(), package)
    }

    #[test]
    fn test_assemble_first_slide() {
        let package = fixtures::package();
        let view = assembled(&package, fixtures::SLIDE1);

        assert_eq!(view.path, fixtures::SLIDE1);
        assert_eq!((view.width, view.height), (960, 720));
        // Master bgRef bg2 resolves through lt2.
        assert_eq!(view.background.color, Color::rgb(0xEE, 0xEE, 0xEE));
        assert!(view.background.image.is_none());

        assert_eq!(view.layout_nodes.len(), 1);
        match &view.layout_nodes[0] {
            NodeElement::Picture(pic) => {
                assert_eq!(pic.border_radius, 40);
                assert_eq!(pic.image.as_ref().unwrap().path, fixtures::IMAGE);
            }
            other => panic!("unexpected layout node {:?}", other),
        }

        let kinds: Vec<&str> = view.slide_nodes.iter().map(|n| n.kind()).collect();
        assert_eq!(kinds.len(), 5);
    }

    #[test]
    fn test_slide_background_overrides_master() {
        let package = fixtures::package();
        let view = assembled(&package, fixtures::SLIDE2);
        assert_eq!(view.background.color, Color::rgb(0x11, 0x22, 0x33));
    }

    #[test]
    fn test_background_image_uses_slide_relationships() {
        let mut parts = fixtures::presentation();
        parts.insert(
            fixtures::SLIDE1,
            fixtures::slide_xml(
                r#"<p:bg><p:bgPr><a:blipFill><a:blip r:embed="rId9"/></a:blipFill></p:bgPr></p:bg>"#,
                "",
            ),
        );
        parts.insert(
            "ppt/slides/_rels/slide1.xml.rels",
            fixtures::rels(&[
                ("rId1", "slideLayout", "../slideLayouts/slideLayout1.xml"),
                ("rId9", "image", "../media/image1.png"),
            ]),
        );
        let package = Package::new(parts);

        let view = assembled(&package, fixtures::SLIDE1);
        let image = view.background.image.unwrap();
        assert_eq!(image.path, fixtures::IMAGE);
        assert!(!image.is_embedded());
        // No color on the slide's own background; the master's still applies.
        assert_eq!(view.background.color, Color::rgb(0xEE, 0xEE, 0xEE));
        assert!(view.slide_nodes.is_empty());
    }

    #[test]
    fn test_templates_are_shared() {
        let package = fixtures::package();
        let templates = TemplateCache::new();
        let first = load(&package, fixtures::SLIDE1, &templates).unwrap();
        let second = load(&package, fixtures::SLIDE2, &templates).unwrap();

        assert_eq!(templates.len(), 2);
        assert!(Arc::ptr_eq(&first.layout, &second.layout));
        assert!(Arc::ptr_eq(&first.master, &second.master));
        assert_eq!(first.master.path, fixtures::MASTER);
        assert_eq!(first.layout.index.type_count(), 1);
    }

    #[test]
    fn test_assemble_is_repeatable() {
        let package = fixtures::package();
        let templates = TemplateCache::new();
        let styles = StyleCache::new();
        let ctx = load(&package, fixtures::SLIDE1, &templates).unwrap();

        let first = assemble(&ctx, 1, 960, 720, &styles, &package);
        let second = assemble(&ctx, 1, 960, 720, &styles, &package);
        assert_eq!(first, second);
    }

    #[test]
    fn test_missing_slide() {
        let package = fixtures::package();
        let err = load(&package, "ppt/slides/slide9.xml", &TemplateCache::new()).unwrap_err();
        assert!(matches!(
            err,
            Error::MissingRequiredPart {
                link: ChainLink::Slide,
                ..
            }
        ));
        assert!(!err.is_fatal_for_document());
    }

    #[test]
    fn test_missing_layout() {
        let mut parts = fixtures::presentation();
        parts.insert(
            "ppt/slides/_rels/slide1.xml.rels",
            fixtures::rels(&[("rId2", "image", "../media/image1.png")]),
        );
        let package = Package::new(parts);

        match load(&package, fixtures::SLIDE1, &TemplateCache::new()).unwrap_err() {
            Error::MissingRequiredPart { link, path } => {
                assert_eq!(link, ChainLink::Layout);
                assert_eq!(path, "ppt/slides/_rels/slide1.xml.rels");
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_missing_master() {
        let mut parts = MemoryPackage::new();
        parts.insert(fixtures::SLIDE1, fixtures::slide_xml("", ""));
        parts.insert(
            "ppt/slides/_rels/slide1.xml.rels",
            fixtures::rels(&[("rId1", "slideLayout", "../slideLayouts/slideLayout1.xml")]),
        );
        parts.insert(
            fixtures::LAYOUT,
            format!(r#"<p:sldLayout {}><p:cSld><p:spTree/></p:cSld></p:sldLayout>"#, fixtures::NS),
        );
        parts.insert(
            "ppt/slideLayouts/_rels/slideLayout1.xml.rels",
            fixtures::rels(&[("rId1", "slideMaster", "../slideMasters/slideMaster1.xml")]),
        );
        let package = Package::new(parts);

        match load(&package, fixtures::SLIDE1, &TemplateCache::new()).unwrap_err() {
            Error::MissingRequiredPart { link, path } => {
                assert_eq!(link, ChainLink::Master);
                assert_eq!(path, fixtures::MASTER);
            }
            other => panic!("unexpected error {:?}", other),
        }
    }
}
