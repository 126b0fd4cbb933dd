//! Reference-counted handles for font and face resources.
//!
//! This crate provides the object model that sits underneath a shaping
//! engine: cheap-to-clone handles for byte ranges ([`Blob`]), table
//! providers ([`TableSource`]), faces ([`Face`]) and fonts ([`Font`]),
//! with atomic reference counting so handles can cross thread boundaries.
//!
//! It is unopinionated about where table bytes come from: a source may be
//! a concrete set of tables, or a callback consulted lazily per lookup
//! with a teardown notification that runs exactly once when the last
//! handle is dropped.
//!
//! Two conventions run through the whole API:
//!
//! - There are no recoverable errors. Constructions over empty input
//!   return the canonical empty singleton for their kind, lookups that
//!   find nothing return [`Blob::empty`], and disallowed mutation is a
//!   silent no-op. Callers that care test identity against the empty
//!   singletons instead of branching on failure.
//! - Fonts are mutable until frozen. [`Font::make_immutable`] is
//!   irreversible, and a frozen font never changes observable state, so
//!   it is safe to publish to other threads.
//!
//! # Example
//!
//! ```
//! use font_handles::{Blob, Face, Font, TableSource, Tag};
//!
//! let head = Blob::new(vec![0u8; 54]);
//! let source = TableSource::new([(Tag::new(b"head"), head)]);
//! let face = Face::new(&source, 0);
//!
//! let font = Font::new(&face);
//! font.set_scale(2048, 2048);
//! font.make_immutable();
//!
//! assert_eq!(font.scale(), (2048, 2048));
//! assert!(!face.table(Tag::new(b"head")).is_empty());
//! assert!(face.table(Tag::new(b"glyf")).is_empty());
//! ```

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

mod blob;
mod face;
mod font;
mod funcs;
mod notify;
mod tables;
mod tag;

pub use blob::Blob;
pub use face::Face;
pub use font::Font;
pub use funcs::FontFuncs;
pub use tables::TableSource;
pub use tag::{InvalidTag, Tag};
