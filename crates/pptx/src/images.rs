//! Inline image embedding.
//!
//! Nodes reference images by package path while the slide is assembled. This
//! pass reads the bytes and turns every reference into a base64 data URI, on a
//! dedicated worker pool when one is configured.

use std::collections::HashMap;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use parking_lot::RwLock;
use rayon::prelude::*;
use slideview_core::{EmbeddedImage, ImageMime, NodeElement, SlideView};

use crate::package::Package;

/// Format image bytes as a `data:` URI.
pub fn data_uri(mime: ImageMime, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime.as_str(), STANDARD.encode(bytes))
}

/// Embeds image bytes into resolved slides.
///
/// Encoded URIs are remembered per path, so an image shared by many slides
/// (a layout logo, a master background) is encoded once.
#[derive(Debug)]
pub struct ImageEmbedder {
    pool: Option<rayon::ThreadPool>,
    encoded: RwLock<HashMap<String, String>>,
}

impl ImageEmbedder {
    /// `workers` of 0 or 1 embeds on the calling thread.
    pub fn new(workers: usize) -> Self {
        let pool = if workers > 1 {
            match rayon::ThreadPoolBuilder::new()
                .num_threads(workers)
                .thread_name(|i| format!("image-embed-{}", i))
                .build()
            {
                Ok(pool) => Some(pool),
                Err(e) => {
                    log::warn!("Failed to start image workers, embedding sequentially: {}", e);
                    None
                }
            }
        } else {
            None
        };

        Self {
            pool,
            encoded: RwLock::new(HashMap::new()),
        }
    }

    pub fn is_parallel(&self) -> bool {
        self.pool.is_some()
    }

    /// Fill every pending image of a slide. References whose bytes are missing
    /// are cleared. Returns the number of images embedded.
    pub fn embed(&self, view: &mut SlideView, package: &Package) -> usize {
        let mut slots = image_slots(view);
        if slots.is_empty() {
            return 0;
        }

        match &self.pool {
            Some(pool) => pool.install(|| {
                slots
                    .par_iter_mut()
                    .map(|slot| self.embed_slot(slot, package) as usize)
                    .sum::<usize>()
            }),
            None => slots
                .iter_mut()
                .map(|slot| self.embed_slot(slot, package) as usize)
                .sum(),
        }
    }

    fn embed_slot(&self, slot: &mut Option<EmbeddedImage>, package: &Package) -> bool {
        let Some(image) = slot.as_mut() else {
            return false;
        };
        if image.is_embedded() {
            return true;
        }

        if let Some(uri) = self.encoded.read().get(&image.path) {
            image.data_uri = Some(uri.clone());
            return true;
        }

        match package.bytes(&image.path) {
            Some(bytes) => {
                let uri = data_uri(image.mime, &bytes);
                self.encoded.write().insert(image.path.clone(), uri.clone());
                image.data_uri = Some(uri);
                true
            }
            None => {
                log::warn!("Image part {} not found in package", image.path);
                *slot = None;
                false
            }
        }
    }
}

/// Every image reference of a slide: background, shape fills and pictures,
/// including those nested in groups.
pub fn image_slots(view: &mut SlideView) -> Vec<&mut Option<EmbeddedImage>> {
    let mut slots = vec![&mut view.background.image];
    for node in view
        .layout_nodes
        .iter_mut()
        .chain(view.slide_nodes.iter_mut())
    {
        collect_node_slots(node, &mut slots);
    }
    slots
}

fn collect_node_slots<'v>(node: &'v mut NodeElement, slots: &mut Vec<&'v mut Option<EmbeddedImage>>) {
    match node {
        NodeElement::Text(n) => slots.push(&mut n.background_image),
        NodeElement::Shape(n) => slots.push(&mut n.background_image),
        NodeElement::Picture(n) => slots.push(&mut n.image),
        NodeElement::Group(g) => {
            for child in g.nodes.iter_mut() {
                collect_node_slots(child, slots);
            }
        }
        NodeElement::Table(_) | NodeElement::Chart(_) | NodeElement::Diagram(_) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::MemoryPackage;
    use slideview_core::{Frame, GroupNode, PictureNode};

    fn picture(path: &str) -> NodeElement {
        NodeElement::Picture(PictureNode {
            id: None,
            name: None,
            frame: Frame::default(),
            image: Some(EmbeddedImage::pending(path)),
            border_radius: 0,
        })
    }

    fn package() -> Package {
        Package::new(
            MemoryPackage::new()
                .with_part("ppt/media/image1.png", vec![1u8, 2, 3])
                .with_part("ppt/media/bg.jpeg", vec![0xFFu8, 0xD8]),
        )
    }

    fn view() -> SlideView {
        let mut view = SlideView::new(1, "ppt/slides/slide1.xml", 960, 720);
        view.background.image = Some(EmbeddedImage::pending("ppt/media/bg.jpeg"));
        view.add_layout_node(picture("ppt/media/image1.png"));
        view.add_slide_node(NodeElement::Group(GroupNode {
            frame: Frame::default(),
            nodes: vec![picture("ppt/media/image1.png"), picture("ppt/media/gone.png")],
        }));
        view
    }

    fn picture_image(node: &NodeElement) -> Option<&EmbeddedImage> {
        match node {
            NodeElement::Picture(p) => p.image.as_ref(),
            _ => None,
        }
    }

    #[test]
    fn test_data_uri() {
        assert_eq!(data_uri(ImageMime::Png, &[1, 2, 3]), "data:image/png;base64,AQID");
        assert_eq!(data_uri(ImageMime::Unknown, b""), "data:image/*;base64,");
    }

    #[test]
    fn test_collects_nested_slots() {
        let mut view = view();
        assert_eq!(image_slots(&mut view).len(), 4);
    }

    #[test]
    fn test_embed_sequential() {
        let package = package();
        let embedder = ImageEmbedder::new(1);
        assert!(!embedder.is_parallel());

        let mut view = view();
        assert_eq!(embedder.embed(&mut view, &package), 3);

        let bg = view.background.image.as_ref().unwrap();
        assert_eq!(bg.data_uri.as_deref(), Some("data:image/jpeg;base64,/9g="));

        let layout_pic = picture_image(&view.layout_nodes[0]).unwrap();
        assert_eq!(layout_pic.data_uri.as_deref(), Some("data:image/png;base64,AQID"));

        match &view.slide_nodes[0] {
            NodeElement::Group(g) => {
                assert!(picture_image(&g.nodes[0]).unwrap().is_embedded());
                assert!(picture_image(&g.nodes[1]).is_none());
            }
            other => panic!("unexpected node {:?}", other),
        }
    }

    #[test]
    fn test_embed_parallel_matches_sequential() {
        let package = package();
        let mut sequential = view();
        let mut parallel = view();

        ImageEmbedder::new(0).embed(&mut sequential, &package);
        let embedder = ImageEmbedder::new(4);
        assert!(embedder.is_parallel());
        embedder.embed(&mut parallel, &package);

        assert_eq!(sequential, parallel);
    }
}
