//! Diagnostic cursor into a nested object graph.
//!
//! A [`Path`] is an immutable linked list of segments. Appending returns a
//! new path that shares its parent through an `Arc`, so descending into a
//! deeply nested structure never copies the prefix. Paths are only used to
//! label errors; nothing in the translation pipeline branches on them.

use std::fmt;
use std::sync::Arc;

/// One step of a [`Path`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Segment {
    /// A named field or map entry.
    Field(String),
    /// A position in a list.
    Index(usize),
}

#[derive(Debug)]
struct Node {
    segment: Segment,
    parent: Path,
    depth: usize,
}

/// Immutable, appendable position within an object graph.
#[derive(Clone, Default)]
pub struct Path(Option<Arc<Node>>);

impl Path {
    /// The empty path.
    pub fn root() -> Self {
        Self(None)
    }

    /// Shorthand for `Path::root().field(name)`.
    pub fn of(name: impl Into<String>) -> Self {
        Self::root().field(name)
    }

    /// Extend with a named field.
    pub fn field(&self, name: impl Into<String>) -> Self {
        self.push(Segment::Field(name.into()))
    }

    /// Extend with a list index.
    pub fn index(&self, index: usize) -> Self {
        self.push(Segment::Index(index))
    }

    fn push(&self, segment: Segment) -> Self {
        Self(Some(Arc::new(Node {
            segment,
            parent: self.clone(),
            depth: self.depth() + 1,
        })))
    }

    /// Number of segments.
    pub fn depth(&self) -> usize {
        self.0.as_ref().map_or(0, |node| node.depth)
    }

    pub fn is_root(&self) -> bool {
        self.0.is_none()
    }

    /// The last segment, if any.
    pub fn last(&self) -> Option<&Segment> {
        self.0.as_ref().map(|node| &node.segment)
    }

    /// The path without its last segment.
    pub fn parent(&self) -> Option<&Path> {
        self.0.as_ref().map(|node| &node.parent)
    }

    /// Segments from the root outward.
    pub fn segments(&self) -> Vec<Segment> {
        let mut out = Vec::with_capacity(self.depth());
        let mut cursor = self;
        while let Some(node) = &cursor.0 {
            out.push(node.segment.clone());
            cursor = &node.parent;
        }
        out.reverse();
        out
    }
}

impl PartialEq for Path {
    fn eq(&self, other: &Self) -> bool {
        match (&self.0, &other.0) {
            (None, None) => true,
            (Some(a), Some(b)) => {
                Arc::ptr_eq(a, b)
                    || (a.depth == b.depth && a.segment == b.segment && a.parent == b.parent)
            }
            _ => false,
        }
    }
}

impl Eq for Path {}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            return f.write_str("<root>");
        }
        for (i, segment) in self.segments().iter().enumerate() {
            match segment {
                Segment::Field(name) if i == 0 => f.write_str(name)?,
                Segment::Field(name) => write!(f, ".{name}")?,
                Segment::Index(index) => write!(f, "[{index}]")?,
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Path({self})")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn root_display() {
        assert_eq!(Path::root().to_string(), "<root>");
        assert!(Path::root().is_root());
        assert_eq!(Path::root().depth(), 0);
    }

    #[test]
    fn nested_display() {
        let path = Path::of("addr").index(2);
        assert_eq!(path.to_string(), "addr[2]");

        let path = Path::of("owner").field("addr").field("street");
        assert_eq!(path.to_string(), "owner.addr.street");

        let path = Path::of("rows").index(0).field("cells").index(3);
        assert_eq!(path.to_string(), "rows[0].cells[3]");
    }

    #[test]
    fn append_does_not_mutate_parent() {
        let base = Path::of("addr");
        let a = base.index(0);
        let b = base.field("zip");
        assert_eq!(base.to_string(), "addr");
        assert_eq!(a.to_string(), "addr[0]");
        assert_eq!(b.to_string(), "addr.zip");
        assert_eq!(a.parent(), Some(&base));
    }

    #[test]
    fn structural_equality() {
        assert_eq!(Path::of("a").index(1), Path::of("a").index(1));
        assert_ne!(Path::of("a").index(1), Path::of("a").index(2));
        assert_ne!(Path::of("a"), Path::root());
    }

    #[test]
    fn segments_in_order() {
        let path = Path::of("a").index(4).field("b");
        assert_eq!(
            path.segments(),
            vec![
                Segment::Field("a".into()),
                Segment::Index(4),
                Segment::Field("b".into())
            ]
        );
        assert_eq!(path.last(), Some(&Segment::Field("b".into())));
    }

    proptest! {
        #[test]
        fn depth_counts_every_append(indices in proptest::collection::vec(0usize..100, 0..20)) {
            let mut path = Path::of("root");
            for i in &indices {
                path = path.index(*i);
            }
            prop_assert_eq!(path.depth(), indices.len() + 1);
            prop_assert_eq!(path.segments().len(), indices.len() + 1);
        }
    }
}
