//! The C-ABI seam between this crate and the PDFium engine
//!
//! [`EngineBindings`] names the subset of engine operations the host core
//! calls. It exists so the handle layer, the session layer, and the tests can
//! all speak one vocabulary: the production implementation
//! ([`PdfiumEngine`](crate::engine::library::PdfiumEngine)) forwards to the
//! dynamically bound library, while tests substitute a counting fake and
//! never touch native code at all.
//!
//! PDFium is not thread-safe. Nothing in this trait is safe to call from a
//! thread other than the one that opened the session; see
//! [`run_affine`](crate::affinity::run_affine) for the sanctioned way to
//! reach these methods from async code.

use std::ffi::c_void;

/// Opaque pointer-sized descriptor for a native engine resource.
///
/// Null is the engine's invalid sentinel for every resource kind.
pub type RawHandle = *mut c_void;

// PDFium error codes (from fpdfview.h - FPDF_GetLastError return values).
// These are returned when document loading fails.
/// Error code 0: No error
pub const FPDF_ERR_SUCCESS: u32 = 0;
/// Error code 1: Unknown error occurred
pub const FPDF_ERR_UNKNOWN: u32 = 1;
/// Error code 2: File not found or could not be opened
pub const FPDF_ERR_FILE: u32 = 2;
/// Error code 3: File not in PDF format or corrupted
pub const FPDF_ERR_FORMAT: u32 = 3;
/// Error code 4: Password required or incorrect password provided
pub const FPDF_ERR_PASSWORD: u32 = 4;
/// Error code 5: Unsupported security scheme
pub const FPDF_ERR_SECURITY: u32 = 5;
/// Error code 6: Page not found or content error
pub const FPDF_ERR_PAGE: u32 = 6;

/// Text search options (FPDFText_FindStart flag bits)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchFlags {
    /// Match letter case exactly
    pub match_case: bool,
    /// Match whole words only
    pub match_whole_word: bool,
}

impl SearchFlags {
    /// Encode as the engine's flag bits (FPDF_MATCHCASE | FPDF_MATCHWHOLEWORD)
    pub fn bits(self) -> u32 {
        let mut bits = 0;
        if self.match_case {
            bits |= 0x1;
        }
        if self.match_whole_word {
            bits |= 0x2;
        }
        bits
    }
}

/// The engine operations the host core calls, expressed over [`RawHandle`]s.
///
/// Implementations return the engine's null sentinel on failed opens rather
/// than panicking; callers wrap the result in a
/// [`NativeHandle`](crate::engine::handle::NativeHandle), which turns the
/// sentinel into a born-invalid handle. Each `close_*`/`exit_*` method is the
/// matching deallocation path for exactly one resource kind and must only be
/// reached through [`NativeHandle::release`](crate::engine::handle::NativeHandle::release).
pub trait EngineBindings {
    /// Idempotent process-wide engine initialization
    fn initialize(&self);

    /// Idempotent process-wide engine teardown
    fn shutdown(&self);

    /// Whether the engine is currently initialized; a precondition for every
    /// method below that opens native resources
    fn is_initialized(&self) -> bool;

    /// Last engine error code (FPDF_ERR_*) after a failed open
    fn last_error(&self) -> u32;

    /// Open a document from a file path; null on failure
    fn open_document(&self, path: &str, password: Option<&str>) -> RawHandle;

    /// Close a document descriptor
    fn close_document(&self, document: RawHandle);

    /// Page count of an open document
    fn page_count(&self, document: RawHandle) -> i32;

    /// Load a page (0-based index); null on failure
    fn load_page(&self, document: RawHandle, index: i32) -> RawHandle;

    /// Close a page descriptor
    fn close_page(&self, page: RawHandle);

    /// Page width in points
    fn page_width(&self, page: RawHandle) -> f32;

    /// Page height in points
    fn page_height(&self, page: RawHandle) -> f32;

    /// Load the text layer of a page; null on failure
    fn load_text_page(&self, page: RawHandle) -> RawHandle;

    /// Close a text page descriptor
    fn close_text_page(&self, text_page: RawHandle);

    /// Initialize the interactive form environment of a document; null when
    /// the document carries no form data
    fn init_form_environment(&self, document: RawHandle) -> RawHandle;

    /// Tear down a form environment descriptor
    fn exit_form_environment(&self, form: RawHandle);

    /// Start a text search over a text page. `needle` is UTF-16 with a
    /// terminating NUL. Null on failure.
    fn find_start(
        &self,
        text_page: RawHandle,
        needle: &[u16],
        flags: SearchFlags,
        start_index: i32,
    ) -> RawHandle;

    /// Advance the search cursor; false when no further match exists
    fn find_next(&self, search: RawHandle) -> bool;

    /// Close a search cursor descriptor
    fn find_close(&self, search: RawHandle);

    /// Render a page into a fresh engine-owned bitmap at the given pixel
    /// size and hand back the job descriptor; null on failure
    fn begin_render_job(&self, page: RawHandle, width: i32, height: i32) -> RawHandle;

    /// Release the scratch resources of a finished render job
    fn close_render_job(&self, job: RawHandle);
}
