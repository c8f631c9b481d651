//! Typed ownership wrappers for native engine resources
//!
//! Every resource PDFium hands out (document, page, form environment, text
//! page, search cursor, render job) is an opaque descriptor that must be
//! released through its own close function, exactly once, and never touched
//! again. [`NativeHandle`] encodes that contract in the type system: one
//! owner, move-only, release idempotent, use-after-release fails fast instead
//! of re-entering native code.
//!
//! Handles hold a raw pointer and are therefore `!Send`: the compiler itself
//! stops a handle from migrating to a thread other than the one that opened
//! it, which is the engine's hardest requirement.

use crate::engine::bindings::{EngineBindings, RawHandle};
use crate::error::{Error, Result};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::trace;

/// Tag identifying which native resource a handle owns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandleKind {
    Document,
    Page,
    FormEnvironment,
    TextPage,
    Search,
    RenderJob,
}

impl fmt::Display for HandleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HandleKind::Document => "document",
            HandleKind::Page => "page",
            HandleKind::FormEnvironment => "form environment",
            HandleKind::TextPage => "text page",
            HandleKind::Search => "search",
            HandleKind::RenderJob => "render job",
        };
        f.write_str(name)
    }
}

/// A native resource kind: its tag plus the one close function that releases
/// descriptors of this kind.
pub trait Resource {
    const KIND: HandleKind;

    /// Invoke the engine's matching close function for this kind
    fn release(bindings: &dyn EngineBindings, raw: RawHandle);
}

/// Marker types for the resource kinds, one `Resource` impl per native close
/// function.
pub mod kind {
    use super::{HandleKind, Resource};
    use crate::engine::bindings::{EngineBindings, RawHandle};

    macro_rules! resource_kind {
        ($name:ident, $kind:expr, $close:ident) => {
            #[derive(Debug)]
            pub struct $name;

            impl Resource for $name {
                const KIND: HandleKind = $kind;

                fn release(bindings: &dyn EngineBindings, raw: RawHandle) {
                    bindings.$close(raw);
                }
            }
        };
    }

    resource_kind!(Document, HandleKind::Document, close_document);
    resource_kind!(Page, HandleKind::Page, close_page);
    resource_kind!(
        FormEnvironment,
        HandleKind::FormEnvironment,
        exit_form_environment
    );
    resource_kind!(TextPage, HandleKind::TextPage, close_text_page);
    resource_kind!(Search, HandleKind::Search, find_close);
    resource_kind!(RenderJob, HandleKind::RenderJob, close_render_job);
}

/// Exclusive owner of one native descriptor of kind `R`.
///
/// Created by wrapping the result of a native open/create call; a null
/// sentinel produces a handle that is born invalid and whose release is a
/// no-op. The descriptor is released at most once, either explicitly through
/// [`release`](NativeHandle::release) or implicitly on drop, whichever comes
/// first.
pub struct NativeHandle<R: Resource> {
    raw: RawHandle,
    valid: bool,
    bindings: Arc<dyn EngineBindings>,
    _kind: PhantomData<R>,
}

/// Owned document descriptor (closed with the document close function)
pub type DocumentHandle = NativeHandle<kind::Document>;
/// Owned page descriptor
pub type PageHandle = NativeHandle<kind::Page>;
/// Owned form environment descriptor
pub type FormEnvHandle = NativeHandle<kind::FormEnvironment>;
/// Owned text page descriptor
pub type TextPageHandle = NativeHandle<kind::TextPage>;
/// Owned search cursor descriptor
pub type SearchHandle = NativeHandle<kind::Search>;
/// Owned render job descriptor
pub type JobHandle = NativeHandle<kind::RenderJob>;

impl<R: Resource> NativeHandle<R> {
    /// Take ownership of a raw descriptor returned by a native open call.
    ///
    /// A null descriptor yields a handle with `is_valid() == false`; callers
    /// then consult the engine's last error for the reason.
    pub fn wrap(bindings: Arc<dyn EngineBindings>, raw: RawHandle) -> Self {
        Self {
            valid: !raw.is_null(),
            raw,
            bindings,
            _kind: PhantomData,
        }
    }

    /// Whether this handle still owns a live native descriptor
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// The resource kind this handle owns
    pub fn kind(&self) -> HandleKind {
        R::KIND
    }

    /// The raw descriptor, for forwarding into a native call.
    ///
    /// This is the only way to read the descriptor, and it refuses once the
    /// handle is released or if it was born invalid, so a sentinel value can
    /// never reach native code through this type.
    pub fn raw(&self) -> Result<RawHandle> {
        if self.valid {
            Ok(self.raw)
        } else {
            Err(Error::InvalidHandle { kind: R::KIND })
        }
    }

    /// Release the native descriptor through its kind's close function.
    ///
    /// Idempotent: the first call releases, every later call (including the
    /// implicit one on drop) is a no-op.
    pub fn release(&mut self) {
        if !self.valid {
            return;
        }
        trace!(kind = %R::KIND, raw = ?self.raw, "releasing native handle");
        R::release(self.bindings.as_ref(), self.raw);
        self.valid = false;
        self.raw = std::ptr::null_mut();
    }
}

impl<R: Resource> Drop for NativeHandle<R> {
    fn drop(&mut self) {
        self.release();
    }
}

impl<R: Resource> fmt::Debug for NativeHandle<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeHandle")
            .field("kind", &R::KIND)
            .field("valid", &self.valid)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::bindings::fake::FakeEngine;
    use pretty_assertions::assert_eq;

    fn engine() -> Arc<FakeEngine> {
        let engine = Arc::new(FakeEngine::new());
        engine.initialize();
        engine
    }

    #[test]
    fn test_release_is_idempotent() {
        let engine = engine();
        let raw = engine.open_document("a.pdf", None);
        let mut handle =
            DocumentHandle::wrap(Arc::clone(&engine) as Arc<dyn EngineBindings>, raw);

        assert!(handle.is_valid());
        handle.release();
        handle.release();
        handle.release();

        assert!(!handle.is_valid());
        assert_eq!(engine.close_count(HandleKind::Document), 1);
    }

    #[test]
    fn test_drop_releases_once() {
        let engine = engine();
        {
            let raw = engine.load_page(std::ptr::null_mut(), 0);
            let _handle = PageHandle::wrap(Arc::clone(&engine) as Arc<dyn EngineBindings>, raw);
        }
        assert_eq!(engine.close_count(HandleKind::Page), 1);
    }

    #[test]
    fn test_release_then_drop_does_not_double_free() {
        let engine = engine();
        {
            let raw = engine.load_text_page(std::ptr::null_mut());
            let mut handle =
                TextPageHandle::wrap(Arc::clone(&engine) as Arc<dyn EngineBindings>, raw);
            handle.release();
        }
        assert_eq!(engine.close_count(HandleKind::TextPage), 1);
    }

    #[test]
    fn test_sentinel_handle_is_born_invalid() {
        let engine = engine();
        let mut handle = DocumentHandle::wrap(
            Arc::clone(&engine) as Arc<dyn EngineBindings>,
            std::ptr::null_mut(),
        );

        assert!(!handle.is_valid());
        assert!(matches!(
            handle.raw(),
            Err(Error::InvalidHandle {
                kind: HandleKind::Document
            })
        ));

        // Releasing a born-invalid handle never reaches native code.
        handle.release();
        drop(handle);
        assert_eq!(engine.total_closes(), 0);
    }

    #[test]
    fn test_raw_fails_after_release() {
        let engine = engine();
        let raw = engine.open_document("a.pdf", None);
        let mut handle =
            DocumentHandle::wrap(Arc::clone(&engine) as Arc<dyn EngineBindings>, raw);

        assert_eq!(handle.raw().unwrap(), raw);
        handle.release();
        assert!(matches!(handle.raw(), Err(Error::InvalidHandle { .. })));
    }

    #[test]
    fn test_each_kind_dispatches_its_own_close() {
        let engine = engine();
        let shared = Arc::clone(&engine) as Arc<dyn EngineBindings>;

        drop(DocumentHandle::wrap(Arc::clone(&shared), engine.open_document("a.pdf", None)));
        drop(PageHandle::wrap(Arc::clone(&shared), engine.load_page(std::ptr::null_mut(), 0)));
        drop(FormEnvHandle::wrap(
            Arc::clone(&shared),
            engine.init_form_environment(std::ptr::null_mut()),
        ));
        drop(TextPageHandle::wrap(
            Arc::clone(&shared),
            engine.load_text_page(std::ptr::null_mut()),
        ));
        drop(SearchHandle::wrap(
            Arc::clone(&shared),
            engine.find_start(std::ptr::null_mut(), &[0], Default::default(), 0),
        ));
        drop(JobHandle::wrap(
            Arc::clone(&shared),
            engine.begin_render_job(std::ptr::null_mut(), 100, 100),
        ));

        for kind in [
            HandleKind::Document,
            HandleKind::Page,
            HandleKind::FormEnvironment,
            HandleKind::TextPage,
            HandleKind::Search,
            HandleKind::RenderJob,
        ] {
            assert_eq!(engine.close_count(kind), 1, "kind {kind} closed once");
        }
    }
}
