//! face handles

use std::fmt;
use std::sync::{Arc, OnceLock};

use crate::blob::Blob;
use crate::tables::TableSource;
use crate::tag::Tag;

struct Shared {
    source: TableSource,
    index: u32,
}

/// An immutable, reference-counted identity for one font resource.
///
/// A face pairs a [`TableSource`] with an index selecting among the
/// logical fonts carried by one physical resource. The index is stored
/// and returned but never interpreted here. Faces expose no mutation, so
/// a handle is always safe to share.
///
/// Constructing a face over the [empty source](TableSource::empty)
/// yields the canonical [`Face::empty`] by identity, and the empty face
/// resolves every table lookup to [`Blob::empty`].
#[derive(Clone)]
pub struct Face {
    inner: Arc<Shared>,
}

impl Face {
    /// Create a face for the logical font at `index` within `source`.
    ///
    /// An empty `source` yields [`Face::empty`], regardless of `index`.
    pub fn new(source: &TableSource, index: u32) -> Face {
        if source.is_empty() {
            return Face::empty();
        }
        Face::wrap(source.clone(), index)
    }

    /// Create a face over a callback source built and owned internally.
    ///
    /// `get` is consulted per table lookup; `teardown` runs exactly once
    /// when the last face handle is dropped, even if no lookup ever
    /// occurred.
    pub fn for_tables<F, D>(get: F, teardown: D) -> Face
    where
        F: Fn(Tag) -> Option<Blob> + Send + Sync + 'static,
        D: FnOnce() + Send + Sync + 'static,
    {
        Face::wrap(TableSource::from_fn(get, teardown), 0)
    }

    /// The canonical empty face.
    ///
    /// Created once per process and never torn down; every call returns
    /// a handle to the identical instance.
    pub fn empty() -> Face {
        static EMPTY: OnceLock<Face> = OnceLock::new();
        EMPTY
            .get_or_init(|| Face::wrap(TableSource::empty(), 0))
            .clone()
    }

    fn wrap(source: TableSource, index: u32) -> Face {
        Face {
            inner: Arc::new(Shared { source, index }),
        }
    }

    /// Look up the table for `tag` in this face's source.
    ///
    /// Returns [`Blob::empty`] when there is no such table; the empty
    /// face returns it for every tag.
    pub fn table(&self, tag: Tag) -> Blob {
        self.inner.source.table(tag)
    }

    /// The index of this face within its physical resource.
    pub fn index(&self) -> u32 {
        self.inner.index
    }

    /// `true` if this handle is the canonical empty face.
    pub fn is_empty(&self) -> bool {
        self.ptr_eq(&Face::empty())
    }

    /// `true` if both handles refer to the identical face.
    pub fn ptr_eq(&self, other: &Face) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Face {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            f.write_str("Face(empty)")
        } else {
            write!(f, "Face(index {})", self.index())
        }
    }
}
