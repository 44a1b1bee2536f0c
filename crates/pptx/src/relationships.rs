//! Relationship maps built from `_rels/*.rels` parts.

use std::collections::HashMap;

use crate::xml::RawNode;

/// Relationship type suffixes (the part after `.../relationships/`).
pub mod rel_types {
    pub const SLIDE: &str = "slide";
    pub const SLIDE_LAYOUT: &str = "slideLayout";
    pub const SLIDE_MASTER: &str = "slideMaster";
    pub const THEME: &str = "theme";
    pub const IMAGE: &str = "image";
    pub const HYPERLINK: &str = "hyperlink";
}

/// One resolved relationship.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    pub id: String,
    /// Type suffix, e.g. `slideLayout`.
    pub rel_type: String,
    /// Package path for internal targets; the raw URI for external ones.
    pub target: String,
    pub external: bool,
}

/// Relationship id to target for one source part.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RelationshipMap {
    /// Ids in document order.
    order: Vec<String>,
    map: HashMap<String, Relationship>,
}

impl RelationshipMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the map from a parsed `.rels` part belonging to `source_part`.
    ///
    /// Relative targets are resolved against the source part's directory.
    pub fn resolve(rels: &RawNode, source_part: &str) -> Self {
        let base = source_dir(source_part);
        let mut out = Self::new();

        for node in rels.children_named("Relationship") {
            let (Some(id), Some(target)) = (node.attr("Id"), node.attr("Target")) else {
                log::debug!("Skipping relationship without Id or Target in {}", source_part);
                continue;
            };
            let rel_type = node
                .attr("Type")
                .map(type_suffix)
                .unwrap_or_default()
                .to_string();
            let external = node.attr("TargetMode") == Some("External");
            let target = if external {
                target.to_string()
            } else {
                resolve_target(base, target)
            };

            out.insert(Relationship {
                id: id.to_string(),
                rel_type,
                target,
                external,
            });
        }

        out
    }

    pub fn insert(&mut self, rel: Relationship) {
        if !self.map.contains_key(&rel.id) {
            self.order.push(rel.id.clone());
        }
        self.map.insert(rel.id.clone(), rel);
    }

    /// Look up an id; absent ids are `None`, never an error.
    pub fn get(&self, id: &str) -> Option<&Relationship> {
        self.map.get(id)
    }

    pub fn target(&self, id: &str) -> Option<&str> {
        self.get(id).map(|r| r.target.as_str())
    }

    /// Target of an internal relationship, for loading a part.
    pub fn part_target(&self, id: &str) -> Option<&str> {
        self.get(id).filter(|r| !r.external).map(|r| r.target.as_str())
    }

    /// First relationship of a type, in document order.
    pub fn first_of_type(&self, rel_type: &str) -> Option<&Relationship> {
        self.iter().find(|r| r.rel_type == rel_type)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Relationship> {
        self.order.iter().filter_map(|id| self.map.get(id))
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// Path of the `.rels` companion of a part:
/// `ppt/slides/slide1.xml` -> `ppt/slides/_rels/slide1.xml.rels`.
pub fn rels_path_for(part: &str) -> String {
    let part = part.trim_start_matches('/');
    match part.rsplit_once('/') {
        Some((dir, file)) => format!("{}/_rels/{}.rels", dir, file),
        None => format!("_rels/{}.rels", part),
    }
}

fn type_suffix(uri: &str) -> &str {
    uri.rsplit('/').next().unwrap_or(uri)
}

fn source_dir(part: &str) -> &str {
    let part = part.trim_start_matches('/');
    part.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("")
}

/// Resolve a relative target against a directory, collapsing `.` and `..`.
/// Absolute targets (leading `/`) are package-root relative.
pub fn resolve_target(base_dir: &str, target: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    let joined;
    let path = if let Some(absolute) = target.strip_prefix('/') {
        absolute
    } else {
        joined = if base_dir.is_empty() {
            target.to_string()
        } else {
            format!("{}/{}", base_dir, target)
        };
        joined.as_str()
    };

    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}
