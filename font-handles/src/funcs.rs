//! per-glyph callback tables

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;

use crate::font::Font;

type AdvanceFn = Arc<dyn Fn(&Font, u32) -> i32 + Send + Sync>;

#[derive(Default)]
struct Slots {
    h_advance: Option<AdvanceFn>,
    v_advance: Option<AdvanceFn>,
}

struct Shared {
    slots: RwLock<Slots>,
    frozen: AtomicBool,
}

/// A reference-counted set of per-glyph metric callbacks for a [`Font`].
///
/// Callback slots are settable until the funcs are frozen; after
/// [`make_immutable`](FontFuncs::make_immutable) a set is a silent
/// no-op, the same contract a frozen font follows. Dispatch through an
/// unset slot returns 0 rather than failing.
#[derive(Clone)]
pub struct FontFuncs {
    inner: Arc<Shared>,
}

impl FontFuncs {
    /// Create an empty, mutable callback set.
    pub fn new() -> FontFuncs {
        FontFuncs::wrap(false)
    }

    /// The canonical funcs with no callbacks, immutable from
    /// construction.
    ///
    /// Created once per process and never torn down; every call returns
    /// a handle to the identical instance.
    pub fn empty() -> FontFuncs {
        static EMPTY: OnceLock<FontFuncs> = OnceLock::new();
        EMPTY.get_or_init(|| FontFuncs::wrap(true)).clone()
    }

    fn wrap(frozen: bool) -> FontFuncs {
        FontFuncs {
            inner: Arc::new(Shared {
                slots: RwLock::new(Slots::default()),
                frozen: AtomicBool::new(frozen),
            }),
        }
    }

    /// Install the horizontal-advance callback. A no-op once frozen.
    pub fn set_glyph_h_advance_fn<F>(&self, advance: F)
    where
        F: Fn(&Font, u32) -> i32 + Send + Sync + 'static,
    {
        if self.is_immutable() {
            log::trace!("set_glyph_h_advance_fn ignored on immutable funcs");
            return;
        }
        self.inner.slots.write().h_advance = Some(Arc::new(advance));
    }

    /// Install the vertical-advance callback. A no-op once frozen.
    pub fn set_glyph_v_advance_fn<F>(&self, advance: F)
    where
        F: Fn(&Font, u32) -> i32 + Send + Sync + 'static,
    {
        if self.is_immutable() {
            log::trace!("set_glyph_v_advance_fn ignored on immutable funcs");
            return;
        }
        self.inner.slots.write().v_advance = Some(Arc::new(advance));
    }

    pub(crate) fn h_advance(&self, font: &Font, glyph: u32) -> i32 {
        let advance = self.inner.slots.read().h_advance.clone();
        advance.map(|advance| advance(font, glyph)).unwrap_or(0)
    }

    pub(crate) fn v_advance(&self, font: &Font, glyph: u32) -> i32 {
        let advance = self.inner.slots.read().v_advance.clone();
        advance.map(|advance| advance(font, glyph)).unwrap_or(0)
    }

    /// `true` once these funcs have been frozen.
    pub fn is_immutable(&self) -> bool {
        self.inner.frozen.load(Ordering::Acquire)
    }

    /// Freeze these funcs. Irreversible; subsequent sets are no-ops.
    pub fn make_immutable(&self) {
        self.inner.frozen.store(true, Ordering::Release);
    }

    /// `true` if both handles refer to the identical funcs.
    pub fn ptr_eq(&self, other: &FontFuncs) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Default for FontFuncs {
    fn default() -> FontFuncs {
        FontFuncs::new()
    }
}

impl fmt::Debug for FontFuncs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FontFuncs(immutable: {})", self.is_immutable())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_funcs_are_immutable_from_construction() {
        assert!(FontFuncs::empty().is_immutable());
        assert!(FontFuncs::empty().ptr_eq(&FontFuncs::empty()));
    }

    #[test]
    fn sets_on_frozen_funcs_are_ignored() {
        let funcs = FontFuncs::new();
        assert!(!funcs.is_immutable());
        funcs.make_immutable();
        funcs.set_glyph_h_advance_fn(|_, _| 42);
        assert_eq!(funcs.h_advance(&Font::empty(), 1), 0);
    }

    #[test]
    fn installed_callbacks_dispatch() {
        let funcs = FontFuncs::new();
        funcs.set_glyph_h_advance_fn(|_, glyph| glyph as i32 * 2);
        funcs.set_glyph_v_advance_fn(|_, _| -7);
        let font = Font::empty();
        assert_eq!(funcs.h_advance(&font, 21), 42);
        assert_eq!(funcs.v_advance(&font, 21), -7);
    }
}
