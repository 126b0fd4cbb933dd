//! tag-to-blob providers backing faces

use std::fmt;
use std::sync::{Arc, OnceLock};

use crate::blob::Blob;
use crate::notify::Teardown;
use crate::tag::Tag;

type GetTable = Box<dyn Fn(Tag) -> Option<Blob> + Send + Sync>;

enum Provider {
    /// Sorted by tag; looked up by binary search.
    Entries(Vec<(Tag, Blob)>),
    /// Consulted lazily, once per lookup.
    Callback(GetTable),
}

struct Shared {
    provider: Provider,
    _teardown: Teardown,
}

/// A provider of named byte ranges: the tables behind a [`Face`].
///
/// A source is either a concrete set of `(tag, blob)` entries or a
/// callback invoked per lookup. Lookup never fails: an unknown tag (or a
/// callback that returns nothing) resolves to [`Blob::empty`].
///
/// A callback source's teardown notification runs exactly once, when the
/// last handle is dropped, whether or not any lookup ever happened. The
/// callback itself is never invoked after teardown begins, since a
/// lookup requires a live handle.
///
/// [`Face`]: crate::Face
#[derive(Clone)]
pub struct TableSource {
    inner: Arc<Shared>,
}

impl TableSource {
    /// Create a source over a concrete set of tables.
    ///
    /// Entries are sorted at construction; when a tag appears more than
    /// once, the first entry wins. Zero entries yield
    /// [`TableSource::empty`].
    pub fn new(tables: impl IntoIterator<Item = (Tag, Blob)>) -> TableSource {
        let mut entries: Vec<_> = tables.into_iter().collect();
        if entries.is_empty() {
            return TableSource::empty();
        }
        entries.sort_by_key(|(tag, _)| *tag);
        entries.dedup_by_key(|(tag, _)| *tag);
        TableSource::wrap(Provider::Entries(entries), Teardown::none())
    }

    /// Create a source that asks `get` for each lookup.
    ///
    /// `get` is called synchronously, any number of times. `teardown`
    /// runs exactly once when the last handle is dropped, even if no
    /// lookup ever occurred.
    pub fn from_fn<F, D>(get: F, teardown: D) -> TableSource
    where
        F: Fn(Tag) -> Option<Blob> + Send + Sync + 'static,
        D: FnOnce() + Send + Sync + 'static,
    {
        TableSource::wrap(Provider::Callback(Box::new(get)), Teardown::new(teardown))
    }

    /// The canonical source with no tables.
    ///
    /// Created once per process and never torn down; every call returns
    /// a handle to the identical instance.
    pub fn empty() -> TableSource {
        static EMPTY: OnceLock<TableSource> = OnceLock::new();
        EMPTY
            .get_or_init(|| TableSource::wrap(Provider::Entries(Vec::new()), Teardown::none()))
            .clone()
    }

    fn wrap(provider: Provider, teardown: Teardown) -> TableSource {
        TableSource {
            inner: Arc::new(Shared {
                provider,
                _teardown: teardown,
            }),
        }
    }

    /// Look up the table for `tag`.
    ///
    /// Returns [`Blob::empty`] when the source has no such table.
    pub fn table(&self, tag: Tag) -> Blob {
        match &self.inner.provider {
            Provider::Entries(entries) => {
                match entries.binary_search_by_key(&tag, |(tag, _)| *tag) {
                    Ok(pos) => entries[pos].1.clone(),
                    Err(_) => Blob::empty(),
                }
            }
            Provider::Callback(get) => get(tag).unwrap_or_else(|| {
                log::trace!("no table for '{tag}', substituting the empty blob");
                Blob::empty()
            }),
        }
    }

    /// `true` if this handle is the canonical empty source.
    pub fn is_empty(&self) -> bool {
        self.ptr_eq(&TableSource::empty())
    }

    /// `true` if both handles refer to the identical source.
    pub fn ptr_eq(&self, other: &TableSource) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for TableSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.inner.provider {
            Provider::Entries(entries) => write!(f, "TableSource({} tables)", entries.len()),
            Provider::Callback(_) => f.write_str("TableSource(callback)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn zero_entries_is_the_singleton() {
        let source = TableSource::new(Vec::new());
        assert!(source.ptr_eq(&TableSource::empty()));
        assert!(source.is_empty());
    }

    #[test]
    fn unknown_tags_resolve_to_the_empty_blob() {
        let source = TableSource::new([(Tag::new(b"head"), Blob::new(b"bytes".to_vec()))]);
        assert_eq!(source.table(Tag::new(b"head")).as_bytes(), b"bytes");
        assert!(source.table(Tag::new(b"glyf")).ptr_eq(&Blob::empty()));
        assert!(TableSource::empty()
            .table(Tag::new(b"head"))
            .ptr_eq(&Blob::empty()));
    }

    #[test]
    fn first_entry_wins_for_duplicate_tags() {
        let tag = Tag::new(b"cmap");
        let source = TableSource::new([
            (tag, Blob::new(b"first".to_vec())),
            (tag, Blob::new(b"second".to_vec())),
        ]);
        assert_eq!(source.table(tag).as_bytes(), b"first");
    }

    #[test]
    fn callback_is_consulted_per_lookup() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let source = TableSource::from_fn(
            move |tag| {
                counter.fetch_add(1, Ordering::SeqCst);
                (tag == Tag::new(b"maxp")).then(|| Blob::new(b"\0\0\x50\0".to_vec()))
            },
            || {},
        );
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(!source.table(Tag::new(b"maxp")).is_empty());
        assert!(source.table(Tag::new(b"loca")).is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn teardown_fires_once_even_without_lookups() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let source = TableSource::from_fn(
            |_| None,
            move || {
                counter.fetch_add(1, Ordering::SeqCst);
            },
        );
        let extra = source.clone();
        drop(source);
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        drop(extra);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}
