//! Dynamic PDFium binding and process-wide lifecycle
//!
//! [`PdfiumEngine`] locates and binds the PDFium dynamic library, owns the
//! one legal initialization/teardown sequence (`FPDF_InitLibrary` /
//! `FPDF_DestroyLibrary` are themselves not thread-safe and must run at most
//! once each per init cycle), and implements [`EngineBindings`] by forwarding
//! to the bound library.

use crate::engine::bindings::{EngineBindings, RawHandle, SearchFlags};
use crate::error::{Error, Result};
use parking_lot::Mutex;
use pdfium_render::prelude::*;
use std::os::raw::{c_int, c_ulong};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

/// ARGB color value for opaque white (alpha=0xFF, R=0xFF, G=0xFF, B=0xFF).
/// Bitmaps are filled white before rendering; PDF pages have no intrinsic
/// background color.
const ARGB_WHITE: u64 = 0xFFFF_FFFF;

/// FPDF_RenderPageBitmap flag: render annotation content as well
const FPDF_ANNOT: c_int = 0x01;

/// Configuration for locating the PDFium dynamic library
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    /// Explicit directory containing the PDFium library. When unset, the
    /// working directory, `/opt/pdfium/lib`, and the system library path are
    /// tried in that order.
    pub library_dir: Option<PathBuf>,
}

/// The production engine: PDFium bound at runtime.
///
/// Binding does not initialize the library; call
/// [`initialize`](EngineBindings::initialize) before opening anything, and
/// [`shutdown`](EngineBindings::shutdown) when the process is done with PDF
/// work. Both are idempotent.
pub struct PdfiumEngine {
    bindings: Box<dyn PdfiumLibraryBindings>,
    initialized: Mutex<bool>,
    // FPDFDOC_InitFormFillEnvironment keeps the info struct's address for the
    // lifetime of the form environment, so the boxes must stay pinned here
    // until the matching exit call.
    form_infos: Mutex<Vec<(usize, Box<FPDF_FORMFILLINFO>)>>,
}

impl PdfiumEngine {
    /// Locate and bind the PDFium dynamic library.
    ///
    /// Search order: the configured directory (if any), the current working
    /// directory, `/opt/pdfium/lib`, then the system library path.
    pub fn bind(config: &EngineConfig) -> Result<Arc<Self>> {
        let bindings = match &config.library_dir {
            Some(dir) => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(dir))
                .map_err(|e| Error::Pdfium {
                    reason: format!("Failed to bind PDFium at {}: {}", dir.display(), e),
                })?,
            None => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
                .or_else(|_| {
                    Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(
                        "/opt/pdfium/lib",
                    ))
                })
                .or_else(|_| Pdfium::bind_to_system_library())
                .map_err(|e| Error::Pdfium {
                    reason: format!("Failed to bind PDFium: {}", e),
                })?,
        };

        info!("bound PDFium dynamic library");

        Ok(Arc::new(Self {
            bindings,
            initialized: Mutex::new(false),
            form_infos: Mutex::new(Vec::new()),
        }))
    }
}

impl EngineBindings for PdfiumEngine {
    fn initialize(&self) {
        let mut initialized = self.initialized.lock();
        if !*initialized {
            self.bindings.FPDF_InitLibrary();
            *initialized = true;
            info!("PDFium library initialized");
        }
    }

    fn shutdown(&self) {
        let mut initialized = self.initialized.lock();
        if *initialized {
            self.bindings.FPDF_DestroyLibrary();
            *initialized = false;
            info!("PDFium library shut down");
        }
    }

    fn is_initialized(&self) -> bool {
        *self.initialized.lock()
    }

    fn last_error(&self) -> u32 {
        self.bindings.FPDF_GetLastError() as u32
    }

    fn open_document(&self, path: &str, password: Option<&str>) -> RawHandle {
        self.bindings.FPDF_LoadDocument(path, password).cast()
    }

    fn close_document(&self, document: RawHandle) {
        self.bindings.FPDF_CloseDocument(document.cast());
    }

    fn page_count(&self, document: RawHandle) -> i32 {
        self.bindings.FPDF_GetPageCount(document.cast())
    }

    fn load_page(&self, document: RawHandle, index: i32) -> RawHandle {
        self.bindings.FPDF_LoadPage(document.cast(), index).cast()
    }

    fn close_page(&self, page: RawHandle) {
        self.bindings.FPDF_ClosePage(page.cast());
    }

    fn page_width(&self, page: RawHandle) -> f32 {
        self.bindings.FPDF_GetPageWidth(page.cast()) as f32
    }

    fn page_height(&self, page: RawHandle) -> f32 {
        self.bindings.FPDF_GetPageHeight(page.cast()) as f32
    }

    fn load_text_page(&self, page: RawHandle) -> RawHandle {
        self.bindings.FPDFText_LoadPage(page.cast()).cast()
    }

    fn close_text_page(&self, text_page: RawHandle) {
        self.bindings.FPDFText_ClosePage(text_page.cast());
    }

    fn init_form_environment(&self, document: RawHandle) -> RawHandle {
        let mut info: Box<FPDF_FORMFILLINFO> = Box::new(unsafe { std::mem::zeroed() });
        info.version = 2;

        let form = self
            .bindings
            .FPDFDOC_InitFormFillEnvironment(document.cast(), info.as_mut());

        if form.is_null() {
            debug!("document has no form environment");
        } else {
            self.form_infos.lock().push((form as usize, info));
        }

        form.cast()
    }

    fn exit_form_environment(&self, form: RawHandle) {
        self.bindings.FPDFDOC_ExitFormFillEnvironment(form.cast());
        self.form_infos.lock().retain(|(f, _)| *f != form as usize);
    }

    fn find_start(
        &self,
        text_page: RawHandle,
        needle: &[u16],
        flags: SearchFlags,
        start_index: i32,
    ) -> RawHandle {
        self.bindings
            .FPDFText_FindStart(
                text_page.cast(),
                needle.as_ptr(),
                flags.bits() as c_ulong,
                start_index,
            )
            .cast()
    }

    fn find_next(&self, search: RawHandle) -> bool {
        self.bindings.FPDFText_FindNext(search.cast()) != 0
    }

    fn find_close(&self, search: RawHandle) {
        self.bindings.FPDFText_FindClose(search.cast());
    }

    fn begin_render_job(&self, page: RawHandle, width: i32, height: i32) -> RawHandle {
        let bitmap = self.bindings.FPDFBitmap_Create(width, height, 0);
        if bitmap.is_null() {
            return std::ptr::null_mut();
        }

        self.bindings
            .FPDFBitmap_FillRect(bitmap, 0, 0, width, height, ARGB_WHITE as c_ulong);
        self.bindings.FPDF_RenderPageBitmap(
            bitmap,
            page.cast(),
            0,
            0,
            width,
            height,
            0,
            FPDF_ANNOT,
        );

        bitmap.cast()
    }

    fn close_render_job(&self, job: RawHandle) {
        self.bindings.FPDFBitmap_Destroy(job.cast());
    }
}
