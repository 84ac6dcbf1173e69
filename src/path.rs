//! Positional addressing of elements.
//!
//! A [`Path`] lists element-child indices walking down from the editing
//! root, so `0.2.1` is the root's first element child's third element
//! child's second element child. Paths are only meaningful against the
//! document they were computed from; any structural change at or before a
//! position shifts everything after it.

use std::fmt;
use std::str::FromStr;

use kurbo::{Point, Rect};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::dom::{Document, NodeId};

/// Child-index address of an element relative to the editing root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Path(Vec<u32>);

impl Path {
    pub fn root() -> Self {
        Path(Vec::new())
    }

    pub fn new(indices: Vec<u32>) -> Self {
        Path(indices)
    }

    pub fn indices(&self) -> &[u32] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The path with the last index dropped, `None` for the root.
    pub fn parent(&self) -> Option<Path> {
        if self.0.is_empty() {
            return None;
        }
        Some(Path(self.0[..self.0.len() - 1].to_vec()))
    }

    pub fn child(&self, index: u32) -> Path {
        let mut indices = self.0.clone();
        indices.push(index);
        Path(indices)
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, index) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{index}")?;
        }
        Ok(())
    }
}

/// Error returned when a dot-joined path contains a non-integer segment.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid path segment {segment:?} in {input:?}")]
pub struct ParsePathError {
    pub input: String,
    pub segment: String,
}

impl FromStr for Path {
    type Err = ParsePathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Ok(Path::root());
        }
        s.split('.')
            .map(|segment| {
                segment.parse::<u32>().map_err(|_| ParsePathError {
                    input: s.to_string(),
                    segment: segment.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Path)
    }
}

impl Serialize for Path {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Path {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Compute the path of `node` relative to `root`.
///
/// Returns `None` when `node` is not an element inside `root`'s subtree.
pub fn compute_path(doc: &Document, root: NodeId, node: NodeId) -> Option<Path> {
    if !doc.is_element(node) {
        return None;
    }
    let mut indices = Vec::new();
    let mut current = node;
    while current != root {
        let index = doc.index_in_parent(current)?;
        indices.push(index as u32);
        current = doc.parent(current)?;
    }
    indices.reverse();
    Some(Path(indices))
}

/// Resolve `path` against `root`.
///
/// `None` means the addressed element no longer exists; callers skip the
/// operation.
pub fn resolve_path(doc: &Document, root: NodeId, path: &Path) -> Option<NodeId> {
    let mut current = root;
    for &index in &path.0 {
        current = doc.element_child(current, index as usize)?;
    }
    Some(current)
}

/// Element bounding boxes, in the same coordinate space as pointer events.
///
/// The core has no layout engine; the host measures the rendered page.
pub trait Geometry {
    fn bounds(&self, node: NodeId) -> Option<Rect>;
}

impl<F> Geometry for F
where
    F: Fn(NodeId) -> Option<Rect>,
{
    fn bounds(&self, node: NodeId) -> Option<Rect> {
        self(node)
    }
}

/// Whether `point` lies within `margin` of the edge of `rect` (inside it).
pub fn near_edge(rect: Rect, point: Point, margin: f64) -> bool {
    if !rect.contains(point) {
        return false;
    }
    point.x - rect.x0 <= margin
        || rect.x1 - point.x <= margin
        || point.y - rect.y0 <= margin
        || rect.y1 - point.y <= margin
}

/// Apply edge promotion to a pointer hit.
///
/// When `point` is within `margin` pixels of `hit`'s boundary, the nearest
/// ancestor whose box still contains the pointer is selected instead. The
/// walk stops below `root`; the root itself is never selected this way.
pub fn promote_at_edge(
    doc: &Document,
    root: NodeId,
    hit: NodeId,
    point: Point,
    margin: f64,
    geometry: &dyn Geometry,
) -> NodeId {
    let Some(rect) = geometry.bounds(hit) else {
        return hit;
    };
    if !near_edge(rect, point, margin) {
        return hit;
    }

    let mut current = doc.parent(hit);
    while let Some(ancestor) = current {
        if ancestor == root || !doc.contains(root, ancestor) {
            break;
        }
        if geometry.bounds(ancestor).is_some_and(|r| r.contains(point)) {
            return ancestor;
        }
        current = doc.parent(ancestor);
    }
    hit
}
