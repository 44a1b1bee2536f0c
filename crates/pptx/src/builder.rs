//! Node model builder.
//!
//! Turns decoded shape-tree elements into resolved [`NodeElement`]s. Shapes and
//! connectors share one path: placeholder matching, then the cascade for every
//! property family.

use slideview_core::units::emu_to_px;
use slideview_core::{
    ChartData, ChartNode, DiagramNode, EmbeddedImage, Frame, Geometry, GroupNode, LineMarkers,
    NodeElement, Paragraph, PictureNode, PlaceholderRef, ShapeNode, Span, SpanStyle, StyleCache,
    TableCell, TableNode, TableRow, TextBlock, TextNode,
};

use crate::cascade::{
    anchor_from_name, frame_from_transform, is_arrow_end, resolve_align, resolve_anchor,
    resolve_border, resolve_bullet, resolve_fill, resolve_font_color, resolve_font_family,
    resolve_font_size, resolve_frame, ShapeTiers, TextRole,
};
use crate::chart::extract_chart;
use crate::model::{
    ColorSpec, FillProperties, GraphicContent, GraphicFrame, Group, Picture, RunProperties,
    Shape, TableSpec, TextBody, TreeNode,
};
use crate::package::Package;
use crate::relationships::RelationshipMap;
use crate::slide::SlideContext;

/// Text of an empty run or an empty paragraph.
pub const NBSP: &str = "\u{a0}";

/// Corner radius given to pictures clipped to a rounded rectangle, in pixels.
pub const PICTURE_ROUND_RADIUS: u32 = 40;

/// Inputs shared by every run of one text body.
#[derive(Clone, Copy)]
struct TextScope<'s> {
    layout: Option<&'s Shape>,
    master: Option<&'s Shape>,
    role: TextRole,
    font_ref: Option<&'s ColorSpec>,
}

impl TextScope<'_> {
    fn plain() -> Self {
        Self {
            layout: None,
            master: None,
            role: TextRole::Other,
            font_ref: None,
        }
    }
}

/// Builds nodes for one part of a slide's chain.
///
/// `rels` belongs to the part whose tree is being built: the slide for slide
/// nodes, the layout for inherited layout nodes.
pub struct NodeBuilder<'a> {
    ctx: &'a SlideContext,
    rels: &'a RelationshipMap,
    styles: &'a StyleCache,
    package: &'a Package,
}

impl<'a> NodeBuilder<'a> {
    pub fn new(
        ctx: &'a SlideContext,
        rels: &'a RelationshipMap,
        styles: &'a StyleCache,
        package: &'a Package,
    ) -> Self {
        Self {
            ctx,
            rels,
            styles,
            package,
        }
    }

    /// Build one element; `None` for graphic frames with unknown content.
    pub fn build(&self, node: &TreeNode) -> Option<NodeElement> {
        match node {
            TreeNode::Shape(shape) => Some(self.build_shape(shape)),
            TreeNode::Picture(pic) => Some(self.build_picture(pic)),
            TreeNode::GraphicFrame(frame) => self.build_graphic_frame(frame),
            TreeNode::Group(group) => Some(self.build_group(group)),
        }
    }

    /// Matched layout and master shapes of a slide shape, plus its placeholder
    /// with the type inherited when the slide leaves it out.
    fn match_placeholder(
        &self,
        shape: &Shape,
    ) -> (Option<&'a Shape>, Option<&'a Shape>, Option<PlaceholderRef>) {
        let Some(ph) = shape.placeholder() else {
            return (None, None, None);
        };
        let (kind, idx) = (ph.kind.as_deref(), ph.idx.as_deref());

        let layout = &self.ctx.layout;
        let master = &self.ctx.master;
        let layout_shape = layout.index.lookup(&layout.data.tree, kind, idx);
        let master_shape = master.index.lookup(&master.data.tree, kind, idx);

        let inherited_kind = ph.kind.clone().or_else(|| {
            [layout_shape, master_shape]
                .into_iter()
                .flatten()
                .find_map(|s| s.placeholder().and_then(|p| p.kind.clone()))
        });

        log::debug!(
            "Placeholder {:?}/{:?} matched layout={} master={}",
            kind,
            idx,
            layout_shape.is_some(),
            master_shape.is_some()
        );

        (
            layout_shape,
            master_shape,
            Some(PlaceholderRef {
                idx: ph.idx.clone(),
                kind: inherited_kind,
            }),
        )
    }

    pub fn build_shape(&self, shape: &Shape) -> NodeElement {
        let (layout, master, placeholder) = self.match_placeholder(shape);
        let tiers = ShapeTiers {
            slide: shape,
            layout,
            master,
        };
        let theme = self.ctx.theme.as_ref();

        let frame = resolve_frame(&tiers, shape.order);
        let fill = resolve_fill(&tiers, theme);
        let border = resolve_border(&tiers, theme);
        let font_ref = shape.style.as_ref().and_then(|s| s.font_ref.as_ref());

        let scope = TextScope {
            layout,
            master,
            role: TextRole::from_kind(placeholder.as_ref().and_then(|p| p.kind.as_deref())),
            font_ref,
        };
        let text = shape.text.as_ref().map(|body| TextBlock {
            anchor: resolve_anchor(&tiers),
            paragraphs: self.paragraphs(body, scope),
        });

        let background_image = match &shape.props.fill {
            Some(FillProperties::Picture { embed: Some(id) }) => self.image_ref(id),
            _ => None,
        };

        let Some(preset) = shape.props.preset.clone() else {
            return NodeElement::Text(TextNode {
                id: shape.nv.id.clone(),
                name: shape.nv.name.clone(),
                frame,
                placeholder,
                fill,
                border,
                background_image,
                text,
            });
        };

        let geometry = Geometry::from_preset(&preset);
        if geometry == Geometry::Unsupported {
            log::debug!("Preset geometry '{}' has no outline", preset);
        }
        let line = shape.props.line.as_ref();
        let markers = if geometry.accepts_markers() {
            LineMarkers {
                start: is_arrow_end(line.and_then(|l| l.head_end.as_deref())),
                end: is_arrow_end(line.and_then(|l| l.tail_end.as_deref())),
            }
        } else {
            LineMarkers::default()
        };

        NodeElement::Shape(ShapeNode {
            id: shape.nv.id.clone(),
            name: shape.nv.name.clone(),
            frame,
            connector: shape.connector,
            placeholder,
            preset,
            geometry,
            flipped: shape.props.xfrm.as_ref().is_some_and(|x| x.flipped()),
            fill,
            border,
            markers,
            font_color: font_ref.and_then(|spec| theme.resolve(spec)),
            background_image,
            text,
        })
    }

    pub fn build_picture(&self, pic: &Picture) -> NodeElement {
        let image = match pic.blip_embed.as_deref() {
            Some(id) => self.image_ref(id),
            None => {
                log::debug!("Picture {:?} has no image reference", pic.nv.name);
                None
            }
        };
        let border_radius = match pic.props.preset.as_deref() {
            Some("roundRect") => PICTURE_ROUND_RADIUS,
            _ => 0,
        };

        NodeElement::Picture(PictureNode {
            id: pic.nv.id.clone(),
            name: pic.nv.name.clone(),
            frame: frame_from_transform(pic.props.xfrm.as_ref(), pic.order),
            image,
            border_radius,
        })
    }

    pub fn build_graphic_frame(&self, frame: &GraphicFrame) -> Option<NodeElement> {
        let bounds = frame_from_transform(frame.xfrm.as_ref(), frame.order);
        match &frame.content {
            GraphicContent::Table(table) => Some(NodeElement::Table(TableNode {
                frame: bounds,
                rows: self.table_rows(table),
            })),
            GraphicContent::Chart { rel_id } => Some(NodeElement::Chart(ChartNode {
                frame: bounds,
                chart: rel_id.as_deref().and_then(|id| self.load_chart(id)),
            })),
            GraphicContent::Diagram => Some(NodeElement::Diagram(DiagramNode { frame: bounds })),
            GraphicContent::Unknown(uri) => {
                log::debug!("Skipping graphic frame with unsupported content '{}'", uri);
                None
            }
        }
    }

    /// A group is placed at its offset minus its child offset; children keep
    /// their own frames in the child coordinate space.
    pub fn build_group(&self, group: &Group) -> NodeElement {
        let xfrm = group.xfrm.as_ref();
        let off = xfrm.and_then(|x| x.off).unwrap_or_default();
        let ext = xfrm.and_then(|x| x.ext).unwrap_or_default();
        let ch_off = xfrm.and_then(|x| x.ch_off).unwrap_or_default();
        let ch_ext = xfrm.and_then(|x| x.ch_ext).unwrap_or_default();

        NodeElement::Group(GroupNode {
            frame: Frame {
                top: emu_to_px(off.y - ch_off.y),
                left: emu_to_px(off.x - ch_off.x),
                width: emu_to_px(ext.cx - ch_ext.cx),
                height: emu_to_px(ext.cy - ch_ext.cy),
                z_index: group.order,
            },
            nodes: group.children.iter().filter_map(|c| self.build(c)).collect(),
        })
    }

    fn table_rows(&self, table: &TableSpec) -> Vec<TableRow> {
        table
            .rows
            .iter()
            .map(|row| TableRow {
                cells: row
                    .iter()
                    .map(|cell| TableCell {
                        text: cell
                            .text
                            .as_ref()
                            .map(|body| TextBlock {
                                anchor: anchor_from_name(body.anchor.as_deref()),
                                paragraphs: self.paragraphs(body, TextScope::plain()),
                            })
                            .filter(|block| !block.is_blank()),
                        row_span: cell.row_span,
                        col_span: cell.grid_span,
                        v_merge: cell.v_merge,
                        h_merge: cell.h_merge,
                    })
                    .collect(),
            })
            .collect()
    }

    fn paragraphs(&self, body: &TextBody, scope: TextScope<'_>) -> Vec<Paragraph> {
        let styles = self.ctx.master.data.text_styles.as_ref();

        body.paragraphs
            .iter()
            .map(|para| {
                let props = para.props.as_ref();
                let spans = if para.runs.is_empty() {
                    vec![self.span(None, NBSP, scope)]
                } else {
                    para.runs
                        .iter()
                        .map(|run| {
                            let text = run.text.as_deref().filter(|t| !t.is_empty()).unwrap_or(NBSP);
                            self.span(run.props.as_ref(), text, scope)
                        })
                        .collect()
                };

                Paragraph {
                    align: resolve_align(props, scope.layout, scope.master, scope.role, styles),
                    bullet: resolve_bullet(props),
                    spans,
                }
            })
            .collect()
    }

    fn span(&self, run: Option<&RunProperties>, text: &str, scope: TextScope<'_>) -> Span {
        let theme = self.ctx.theme.as_ref();
        let styles = self.ctx.master.data.text_styles.as_ref();

        let style = SpanStyle {
            color: resolve_font_color(run, scope.font_ref, theme),
            font_size: resolve_font_size(run, scope.layout, scope.role, styles),
            font_family: resolve_font_family(run, scope.role, theme),
            bold: run.is_some_and(|r| r.bold),
            italic: run.is_some_and(|r| r.italic),
            underline: run.and_then(|r| r.underline.as_deref()) == Some("sng"),
            baseline: run.and_then(|r| r.baseline).map(|b| b as f64 / 1000.0),
        };
        let class_name = self.styles.register(&style.signature());

        let link = run.and_then(|r| r.hyperlink.as_deref()).and_then(|id| {
            let target = self.rels.target(id);
            if target.is_none() {
                log::debug!("Hyperlink {} not found in {}", id, self.ctx.path);
            }
            target.map(str::to_string)
        });

        Span {
            text: text.to_string(),
            style,
            class_name,
            link,
        }
    }

    fn image_ref(&self, rel_id: &str) -> Option<EmbeddedImage> {
        match self.rels.part_target(rel_id) {
            Some(target) => Some(EmbeddedImage::pending(target)),
            None => {
                log::debug!("Image relationship {} not found", rel_id);
                None
            }
        }
    }

    fn load_chart(&self, rel_id: &str) -> Option<ChartData> {
        let target = self.rels.part_target(rel_id)?;
        match self.package.xml(target) {
            Ok(Some(part)) => extract_chart(&part),
            Ok(None) => {
                log::warn!("Chart part {} not found", target);
                None
            }
            Err(e) => {
                log::warn!("Skipping chart data: {}", e);
                None
            }
        }
    }
}
