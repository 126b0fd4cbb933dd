//! font handles and sub-fonts

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;

use crate::face::Face;
use crate::funcs::FontFuncs;

/// Scale and pixel-density state, mutated as a unit under one lock.
#[derive(Clone, Copy, Default)]
struct Metrics {
    x_scale: i32,
    y_scale: i32,
    x_ppem: u32,
    y_ppem: u32,
}

struct Shared {
    face: Face,
    parent: Option<Font>,
    metrics: RwLock<Metrics>,
    funcs: RwLock<FontFuncs>,
    frozen: AtomicBool,
}

/// A mutable-until-frozen metrics handle bound to a [`Face`].
///
/// A font carries x/y scale and x/y pixel-density ("ppem") values, all
/// defaulting to 0, plus an installed [`FontFuncs`]. Handles are
/// atomically reference counted and cheap to clone.
///
/// # Sub-fonts
///
/// [`Font::sub_font`] derives a font whose face is the parent's face and
/// whose [`parent`](Font::parent) is the parent handle. The sub-font
/// *snapshots* the parent's current metrics and funcs at creation; there
/// is no later read-through, so a change to the parent is visible only
/// to sub-fonts created after that change.
///
/// # Freezing
///
/// [`Font::make_immutable`] is irreversible. Setters on a frozen font
/// are silent no-ops, never errors, so a frozen font's observable state
/// never changes and the handle can be shared freely across threads.
/// Before freezing, concurrent mutation of one font is the caller's to
/// serialize; the model only guarantees that one setter's value pair is
/// never observed torn.
#[derive(Clone)]
pub struct Font {
    inner: Arc<Shared>,
}

impl Font {
    /// Create a root font bound to `face`.
    ///
    /// The empty face propagates upward: the result is then the
    /// identical [`Font::empty`].
    pub fn new(face: &Face) -> Font {
        if face.is_empty() {
            return Font::empty();
        }
        Font::wrap(
            face.clone(),
            None,
            Metrics::default(),
            FontFuncs::empty(),
            false,
        )
    }

    /// Create a sub-font of this font.
    ///
    /// The sub-font shares this font's face, records this font as its
    /// parent, and starts from a snapshot of this font's current metrics
    /// and funcs. A sub-font of the empty font is the empty font.
    pub fn sub_font(&self) -> Font {
        if self.is_empty() {
            return Font::empty();
        }
        let metrics = *self.inner.metrics.read();
        let funcs = self.inner.funcs.read().clone();
        Font::wrap(
            self.inner.face.clone(),
            Some(self.clone()),
            metrics,
            funcs,
            false,
        )
    }

    /// The canonical empty font, immutable from construction.
    ///
    /// Created once per process and never torn down; every call returns
    /// a handle to the identical instance.
    pub fn empty() -> Font {
        static EMPTY: OnceLock<Font> = OnceLock::new();
        EMPTY
            .get_or_init(|| {
                Font::wrap(
                    Face::empty(),
                    None,
                    Metrics::default(),
                    FontFuncs::empty(),
                    true,
                )
            })
            .clone()
    }

    fn wrap(
        face: Face,
        parent: Option<Font>,
        metrics: Metrics,
        funcs: FontFuncs,
        frozen: bool,
    ) -> Font {
        Font {
            inner: Arc::new(Shared {
                face,
                parent,
                metrics: RwLock::new(metrics),
                funcs: RwLock::new(funcs),
                frozen: AtomicBool::new(frozen),
            }),
        }
    }

    /// The face this font is bound to, constant for the font's lifetime.
    pub fn face(&self) -> &Face {
        &self.inner.face
    }

    /// The parent font, or `None` for a root font.
    pub fn parent(&self) -> Option<&Font> {
        self.inner.parent.as_ref()
    }

    /// The current (x, y) scale.
    pub fn scale(&self) -> (i32, i32) {
        let metrics = self.inner.metrics.read();
        (metrics.x_scale, metrics.y_scale)
    }

    /// Set the (x, y) scale. A no-op on a frozen font.
    pub fn set_scale(&self, x_scale: i32, y_scale: i32) {
        if self.is_immutable() {
            log::trace!("set_scale ignored on immutable font");
            return;
        }
        let mut metrics = self.inner.metrics.write();
        metrics.x_scale = x_scale;
        metrics.y_scale = y_scale;
    }

    /// The current (x, y) pixels per em.
    pub fn ppem(&self) -> (u32, u32) {
        let metrics = self.inner.metrics.read();
        (metrics.x_ppem, metrics.y_ppem)
    }

    /// Set the (x, y) pixels per em. A no-op on a frozen font.
    pub fn set_ppem(&self, x_ppem: u32, y_ppem: u32) {
        if self.is_immutable() {
            log::trace!("set_ppem ignored on immutable font");
            return;
        }
        let mut metrics = self.inner.metrics.write();
        metrics.x_ppem = x_ppem;
        metrics.y_ppem = y_ppem;
    }

    /// The funcs currently installed on this font.
    pub fn funcs(&self) -> FontFuncs {
        self.inner.funcs.read().clone()
    }

    /// Install `funcs` on this font. A no-op on a frozen font.
    pub fn set_funcs(&self, funcs: &FontFuncs) {
        if self.is_immutable() {
            log::trace!("set_funcs ignored on immutable font");
            return;
        }
        *self.inner.funcs.write() = funcs.clone();
    }

    /// The horizontal advance of `glyph` per the installed funcs, or 0
    /// when no callback is installed.
    pub fn glyph_h_advance(&self, glyph: u32) -> i32 {
        let funcs = self.funcs();
        funcs.h_advance(self, glyph)
    }

    /// The vertical advance of `glyph` per the installed funcs, or 0
    /// when no callback is installed.
    pub fn glyph_v_advance(&self, glyph: u32) -> i32 {
        let funcs = self.funcs();
        funcs.v_advance(self, glyph)
    }

    /// `true` once this font has been frozen.
    pub fn is_immutable(&self) -> bool {
        self.inner.frozen.load(Ordering::Acquire)
    }

    /// Freeze this font. Irreversible; subsequent setters are no-ops.
    pub fn make_immutable(&self) {
        self.inner.frozen.store(true, Ordering::Release);
    }

    /// `true` if this handle is the canonical empty font.
    pub fn is_empty(&self) -> bool {
        self.ptr_eq(&Font::empty())
    }

    /// `true` if both handles refer to the identical font.
    pub fn ptr_eq(&self, other: &Font) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Font {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (x_scale, y_scale) = self.scale();
        let (x_ppem, y_ppem) = self.ppem();
        f.debug_struct("Font")
            .field("scale", &(x_scale, y_scale))
            .field("ppem", &(x_ppem, y_ppem))
            .field("immutable", &self.is_immutable())
            .field("sub_font", &self.parent().is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blob::Blob;
    use crate::tables::TableSource;
    use crate::tag::Tag;

    fn test_face() -> Face {
        let blob = Blob::new(b"test\0data".to_vec());
        let source = TableSource::new([(Tag::new(b"head"), blob)]);
        Face::new(&source, 0)
    }

    #[test]
    fn empty_font_identities() {
        assert!(Font::new(&Face::empty()).ptr_eq(&Font::empty()));
        assert!(Font::empty().sub_font().ptr_eq(&Font::empty()));
        assert!(Font::empty().is_immutable());
        assert!(Font::empty().face().ptr_eq(&Face::empty()));
        assert!(Font::empty().parent().is_none());
    }

    #[test]
    fn setters_are_no_ops_on_the_empty_font() {
        let empty = Font::empty();
        empty.set_scale(5, 5);
        empty.set_ppem(5, 5);
        assert_eq!(empty.scale(), (0, 0));
        assert_eq!(empty.ppem(), (0, 0));
    }

    #[test]
    fn metric_defaults_and_setters() {
        let font = Font::new(&test_face());
        assert_eq!(font.scale(), (0, 0));
        assert_eq!(font.ppem(), (0, 0));

        font.set_scale(17, 19);
        assert_eq!(font.scale(), (17, 19));
        font.set_ppem(17, 19);
        assert_eq!(font.ppem(), (17, 19));
    }

    #[test]
    fn freezing_is_irreversible_and_silences_setters() {
        let _ = env_logger::builder().is_test(true).try_init();
        let font = Font::new(&test_face());
        font.set_scale(17, 19);
        font.set_ppem(17, 19);

        assert!(!font.is_immutable());
        font.make_immutable();
        assert!(font.is_immutable());

        font.set_scale(10, 12);
        assert_eq!(font.scale(), (17, 19));
        font.set_ppem(10, 12);
        assert_eq!(font.ppem(), (17, 19));

        font.set_funcs(&FontFuncs::new());
        assert!(font.funcs().ptr_eq(&FontFuncs::empty()));
    }

    #[test]
    fn sub_font_snapshots_parent_metrics() {
        let face = test_face();
        let font = Font::new(&face);
        font.set_scale(17, 19);
        font.set_ppem(17, 19);

        let sub = font.sub_font();
        assert!(sub.parent().unwrap().ptr_eq(&font));
        assert!(sub.face().ptr_eq(&face));
        assert_eq!(sub.scale(), (17, 19));
        assert_eq!(sub.ppem(), (17, 19));

        sub.set_scale(10, 12);
        sub.set_ppem(10, 12);
        assert_eq!(sub.scale(), (10, 12));
        assert_eq!(sub.ppem(), (10, 12));
        // the parent is unaffected by the sub-font's overrides
        assert_eq!(font.scale(), (17, 19));
        assert_eq!(font.ppem(), (17, 19));
    }

    #[test]
    fn snapshot_is_taken_at_creation_not_read_through() {
        let font = Font::new(&test_face());
        font.set_scale(1, 2);

        let early = font.sub_font();
        font.set_scale(5, 6);
        let late = font.sub_font();

        assert_eq!(early.scale(), (1, 2));
        assert_eq!(late.scale(), (5, 6));
    }

    #[test]
    fn face_is_shared_down_any_chain_depth() {
        let face = test_face();
        let mut font = Font::new(&face);
        for _ in 0..4 {
            font = font.sub_font();
        }
        assert!(font.face().ptr_eq(&face));
        assert!(font
            .parent()
            .unwrap()
            .parent()
            .unwrap()
            .face()
            .ptr_eq(&face));
    }

    #[test]
    fn sub_font_keeps_its_parent_alive() {
        let font = Font::new(&test_face());
        font.set_scale(17, 19);
        let sub = font.sub_font();
        drop(font);
        assert_eq!(sub.parent().unwrap().scale(), (17, 19));
    }

    #[test]
    fn advance_dispatch_defaults_to_zero() {
        let font = Font::new(&test_face());
        assert_eq!(font.glyph_h_advance(1), 0);
        assert_eq!(font.glyph_v_advance(1), 0);

        let funcs = FontFuncs::new();
        funcs.set_glyph_h_advance_fn(|font, glyph| font.scale().0 * glyph as i32);
        font.set_funcs(&funcs);
        font.set_scale(10, 10);
        assert_eq!(font.glyph_h_advance(3), 30);
        assert_eq!(font.glyph_v_advance(3), 0);
    }

    #[test]
    fn frozen_font_is_safe_to_share_across_threads() {
        let font = Font::new(&test_face());
        font.set_scale(17, 19);
        font.make_immutable();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let font = font.clone();
                std::thread::spawn(move || {
                    font.set_scale(1, 1);
                    assert_eq!(font.scale(), (17, 19));
                    font.sub_font().scale()
                })
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), (17, 19));
        }
    }
}
