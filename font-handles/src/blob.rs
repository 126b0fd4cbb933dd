//! shared byte ranges

use std::fmt;
use std::io;
use std::ops::{Bound, RangeBounds};
use std::path::Path;
use std::sync::{Arc, OnceLock};

use crate::notify::Teardown;

/// How a blob holds its bytes.
///
/// A `View` always points at a non-view root, so chains of sub-blobs
/// stay one hop deep.
enum Data {
    Owned(Box<[u8]>),
    Static(&'static [u8]),
    View {
        root: Arc<Shared>,
        start: usize,
        len: usize,
    },
}

struct Shared {
    data: Data,
    _release: Teardown,
}

impl Shared {
    fn bytes(&self) -> &[u8] {
        match &self.data {
            Data::Owned(bytes) => bytes,
            Data::Static(bytes) => bytes,
            Data::View { root, start, len } => &root.bytes()[*start..*start + *len],
        }
    }
}

/// An atomically reference-counted, immutable range of bytes.
///
/// Cloning a `Blob` is cheap and shares the underlying storage; the
/// bytes never change for the lifetime of any handle. A release
/// notification attached with [`Blob::with_release`] runs exactly once,
/// when the last handle (including any views created with
/// [`Blob::slice`]) is dropped.
///
/// Constructions over zero-length input return the canonical
/// [empty blob](Blob::empty) rather than allocating, so identity
/// comparison against the singleton is a reliable absence test.
#[derive(Clone)]
pub struct Blob {
    inner: Arc<Shared>,
}

impl Blob {
    /// Create a blob over owned bytes.
    ///
    /// Zero-length input yields [`Blob::empty`].
    pub fn new(data: impl Into<Box<[u8]>>) -> Blob {
        let data = data.into();
        if data.is_empty() {
            return Blob::empty();
        }
        Blob::wrap(Data::Owned(data), Teardown::none())
    }

    /// Create a blob borrowing bytes with static lifetime.
    ///
    /// Zero-length input yields [`Blob::empty`].
    pub fn from_static(bytes: &'static [u8]) -> Blob {
        if bytes.is_empty() {
            return Blob::empty();
        }
        Blob::wrap(Data::Static(bytes), Teardown::none())
    }

    /// Create a blob whose `release` notification runs when the last
    /// handle is dropped.
    ///
    /// Zero-length input yields [`Blob::empty`] and runs `release`
    /// immediately, since no object exists to carry it.
    pub fn with_release<F>(data: impl Into<Box<[u8]>>, release: F) -> Blob
    where
        F: FnOnce() + Send + Sync + 'static,
    {
        let data = data.into();
        if data.is_empty() {
            Teardown::new(release).fire_now();
            return Blob::empty();
        }
        Blob::wrap(Data::Owned(data), Teardown::new(release))
    }

    /// Read `path` into an owned blob.
    pub fn from_file(path: impl AsRef<Path>) -> io::Result<Blob> {
        std::fs::read(path).map(Blob::new)
    }

    /// The canonical zero-length blob.
    ///
    /// Created once per process and never torn down; every call returns
    /// a handle to the identical instance.
    pub fn empty() -> Blob {
        static EMPTY: OnceLock<Blob> = OnceLock::new();
        EMPTY
            .get_or_init(|| Blob::wrap(Data::Static(&[]), Teardown::none()))
            .clone()
    }

    fn wrap(data: Data, release: Teardown) -> Blob {
        Blob {
            inner: Arc::new(Shared {
                data,
                _release: release,
            }),
        }
    }

    /// The length of the blob, in bytes.
    pub fn len(&self) -> usize {
        self.inner.bytes().len()
    }

    /// `true` if this blob has no bytes.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The blob's bytes.
    pub fn as_bytes(&self) -> &[u8] {
        self.inner.bytes()
    }

    /// Create a view over a sub-range of this blob.
    ///
    /// The view keeps the parent storage alive, so a release
    /// notification on the parent is deferred until every view is also
    /// dropped. The range is clamped to the blob's bounds; an empty
    /// result yields [`Blob::empty`].
    pub fn slice(&self, range: impl RangeBounds<usize>) -> Blob {
        let start = match range.start_bound() {
            Bound::Unbounded => 0,
            Bound::Included(&pos) => pos,
            Bound::Excluded(&pos) => pos.saturating_add(1),
        };
        let end = match range.end_bound() {
            Bound::Unbounded => self.len(),
            Bound::Included(&pos) => pos.saturating_add(1),
            Bound::Excluded(&pos) => pos,
        };
        let end = end.min(self.len());
        if start >= end {
            return Blob::empty();
        }
        let (root, base) = match &self.inner.data {
            Data::View { root, start, .. } => (root.clone(), *start),
            _ => (self.inner.clone(), 0),
        };
        Blob::wrap(
            Data::View {
                root,
                start: base + start,
                len: end - start,
            },
            Teardown::none(),
        )
    }

    /// `true` if both handles refer to the identical blob.
    pub fn ptr_eq(&self, other: &Blob) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl AsRef<[u8]> for Blob {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl fmt::Debug for Blob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Blob({} bytes)", self.len())
    }
}
