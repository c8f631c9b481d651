//! Document sessions: one open document, its page cache, and its thread
//!
//! A [`DocumentSession`] owns the document handle, the lazily useful form
//! environment, and a bounded cache of rendered page artifacts keyed by
//! [`PageFingerprint`]. The session captures its [`ThreadAffinity`] at open
//! time; every native call it makes afterwards goes through
//! [`run_affine`], so async callers never move engine work off the opening
//! thread.

use crate::affinity::{run_affine, ThreadAffinity};
use crate::cache::{BoundedCache, Disposable};
use crate::engine::bindings::{
    EngineBindings, RawHandle, SearchFlags, FPDF_ERR_FILE, FPDF_ERR_FORMAT, FPDF_ERR_PASSWORD,
    FPDF_ERR_SECURITY,
};
use crate::engine::handle::{
    DocumentHandle, FormEnvHandle, JobHandle, PageHandle, SearchHandle, TextPageHandle,
};
use crate::error::{Error, Result};
use crate::range::PageRange;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, trace};

/// Process-unique ids for open documents, so fingerprints from different
/// sessions never collide in a shared cache.
static NEXT_DOCUMENT_ID: AtomicU64 = AtomicU64::new(1);

/// Value-equality key identifying one rendered page artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageFingerprint {
    /// Owning document's session id
    pub document: u64,
    /// Page number (1-based)
    pub page: u32,
    /// Render resolution in dots per inch
    pub dpi: u32,
}

/// Metadata describing a rendered page, returned to callers while the
/// artifact itself stays cache-owned
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageInfo {
    /// Page number (1-based)
    pub page: u32,
    /// Page width in points
    pub width_pts: f32,
    /// Page height in points
    pub height_pts: f32,
    /// Rendered width in pixels
    pub width_px: u32,
    /// Rendered height in pixels
    pub height_px: u32,
    /// Render resolution in dots per inch
    pub dpi: u32,
}

/// Cached artifact for one rendered page: the page handle, its text layer,
/// and the finished render job, released together on disposal
pub struct RenderedPage {
    page: PageHandle,
    text: TextPageHandle,
    job: JobHandle,
    info: PageInfo,
}

impl RenderedPage {
    /// Copy of the page metadata
    pub fn info(&self) -> PageInfo {
        self.info
    }
}

impl Disposable for RenderedPage {
    fn dispose(&mut self) {
        // Reverse acquisition order: job, text layer, page.
        self.job.release();
        self.text.release();
        self.page.release();
    }
}

/// Session configuration
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Maximum number of rendered pages kept per session (default: 32)
    pub page_cache_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            page_cache_capacity: 32,
        }
    }
}

/// An open document bound to the thread that opened it
pub struct DocumentSession {
    engine: Arc<dyn EngineBindings>,
    document: DocumentHandle,
    form_env: FormEnvHandle,
    pages: BoundedCache<PageFingerprint, RenderedPage>,
    affinity: ThreadAffinity,
    id: u64,
    page_count: u32,
}

impl DocumentSession {
    /// Open a document and bind the session to the current thread.
    ///
    /// Requires the engine to be initialized; refuses before touching native
    /// code otherwise. Open failures are mapped from the engine's last error
    /// code (missing file, bad format, password).
    pub fn open(
        engine: Arc<dyn EngineBindings>,
        path: impl AsRef<Path>,
        password: Option<&str>,
        config: SessionConfig,
    ) -> Result<Self> {
        if !engine.is_initialized() {
            return Err(Error::NotInitialized);
        }

        let path = path.as_ref();
        match std::fs::metadata(path) {
            Ok(_) => {}
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::PdfNotFound {
                    path: path.display().to_string(),
                });
            }
            // Unreadable entry (permissions, broken mount): report the OS
            // error rather than a misleading "not found".
            Err(err) => return Err(err.into()),
        }

        let raw = engine.open_document(&path.to_string_lossy(), password);
        let document = DocumentHandle::wrap(Arc::clone(&engine), raw);
        if !document.is_valid() {
            return Err(open_error(engine.as_ref(), path, password));
        }

        let page_count = engine.page_count(document.raw()?).max(0) as u32;
        let form_env =
            FormEnvHandle::wrap(Arc::clone(&engine), engine.init_form_environment(document.raw()?));
        let pages = BoundedCache::new(config.page_cache_capacity)?;
        let id = NEXT_DOCUMENT_ID.fetch_add(1, Ordering::Relaxed);

        info!(
            document = id,
            path = %path.display(),
            pages = page_count,
            has_forms = form_env.is_valid(),
            "opened document session"
        );

        Ok(Self {
            engine,
            document,
            form_env,
            pages,
            affinity: ThreadAffinity::capture(),
            id,
            page_count,
        })
    }

    /// Session id used in this session's fingerprints
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Number of pages in the document
    pub fn page_count(&self) -> u32 {
        self.page_count
    }

    /// Whether the document carries an interactive form environment
    pub fn has_forms(&self) -> bool {
        self.form_env.is_valid()
    }

    /// Number of rendered pages currently cached
    pub fn cached_pages(&self) -> Result<usize> {
        self.pages.len()
    }

    /// Fetch page `page` (1-based) rendered at `dpi`, from cache when
    /// fingerprinted identically, rendering through the affinity thread on a
    /// miss. The inserted artifact may evict the least-recently-used page,
    /// releasing its native resources.
    pub async fn page(&self, page: u32, dpi: u32) -> Result<PageInfo> {
        if page < 1 || page > self.page_count {
            return Err(Error::PageOutOfBounds {
                page,
                total: self.page_count,
            });
        }

        let key = PageFingerprint {
            document: self.id,
            page,
            dpi,
        };

        if let Some(info) = self.pages.with_get(&key, RenderedPage::info)? {
            trace!(document = self.id, page, dpi, "page cache hit");
            return Ok(info);
        }

        let engine = Arc::clone(&self.engine);
        let document = self.document.raw()?;
        let artifact =
            run_affine(self.affinity, move || render_page(engine, document, page, dpi)).await?;

        let info = artifact.info();
        self.pages.insert(key, artifact)?;
        debug!(document = self.id, page, dpi, "page rendered and cached");

        Ok(info)
    }

    /// Count occurrences of `needle` on page `page` using a transient search
    /// cursor; the page, text layer, and cursor are released on every exit
    /// path of the operation.
    pub async fn search_page(&self, page: u32, needle: &str, flags: SearchFlags) -> Result<usize> {
        if page < 1 || page > self.page_count {
            return Err(Error::PageOutOfBounds {
                page,
                total: self.page_count,
            });
        }

        let engine = Arc::clone(&self.engine);
        let document = self.document.raw()?;
        // UTF-16 with terminating NUL, as the engine's search API expects.
        let needle: Vec<u16> = needle.encode_utf16().chain(std::iter::once(0)).collect();

        run_affine(self.affinity, move || {
            let page_handle =
                PageHandle::wrap(Arc::clone(&engine), engine.load_page(document, page as i32 - 1));
            let raw_page = page_handle.raw().map_err(|_| Error::Pdfium {
                reason: format!("failed to load page {}", page),
            })?;

            let text = TextPageHandle::wrap(Arc::clone(&engine), engine.load_text_page(raw_page));
            let raw_text = text.raw().map_err(|_| Error::Pdfium {
                reason: format!("failed to load text layer of page {}", page),
            })?;

            let search = SearchHandle::wrap(
                Arc::clone(&engine),
                engine.find_start(raw_text, &needle, flags, 0),
            );
            let raw_search = search.raw().map_err(|_| Error::Pdfium {
                reason: "failed to start text search".to_string(),
            })?;

            let mut hits = 0;
            while engine.find_next(raw_search) {
                hits += 1;
            }
            Ok(hits)
        })
        .await
    }

    /// Drop every cached artifact whose page falls inside one of `ranges`,
    /// releasing its native resources. Returns how many artifacts were
    /// invalidated.
    pub fn invalidate_range(&self, ranges: &[PageRange]) -> Result<usize> {
        let removed = self
            .pages
            .remove_where(|key| ranges.iter().any(|r| r.contains(key.page)))?;
        debug!(document = self.id, removed, "invalidated cached pages");
        Ok(removed)
    }

    /// Drop every cached artifact for this session
    pub fn invalidate_all(&self) -> Result<()> {
        self.pages.clear()
    }
}

impl Drop for DocumentSession {
    fn drop(&mut self) {
        // Artifacts borrow nothing from the document in the Rust sense, but
        // the engine requires pages to be closed before their document.
        self.pages.dispose();
        self.form_env.release();
        self.document.release();
        debug!(document = self.id, "closed document session");
    }
}

fn render_page(
    engine: Arc<dyn EngineBindings>,
    document: RawHandle,
    page: u32,
    dpi: u32,
) -> Result<RenderedPage> {
    let page_handle =
        PageHandle::wrap(Arc::clone(&engine), engine.load_page(document, page as i32 - 1));
    let raw_page = page_handle.raw().map_err(|_| Error::Pdfium {
        reason: format!("failed to load page {}", page),
    })?;

    let width_pts = engine.page_width(raw_page);
    let height_pts = engine.page_height(raw_page);
    let width_px = ((width_pts * dpi as f32 / 72.0).round() as u32).max(1);
    let height_px = ((height_pts * dpi as f32 / 72.0).round() as u32).max(1);

    let text = TextPageHandle::wrap(Arc::clone(&engine), engine.load_text_page(raw_page));
    if !text.is_valid() {
        return Err(Error::Pdfium {
            reason: format!("failed to load text layer of page {}", page),
        });
    }

    let job = JobHandle::wrap(
        Arc::clone(&engine),
        engine.begin_render_job(raw_page, width_px as i32, height_px as i32),
    );
    if !job.is_valid() {
        return Err(Error::Pdfium {
            reason: format!("failed to render page {}", page),
        });
    }

    Ok(RenderedPage {
        page: page_handle,
        text,
        job,
        info: PageInfo {
            page,
            width_pts,
            height_pts,
            width_px,
            height_px,
            dpi,
        },
    })
}

fn open_error(engine: &dyn EngineBindings, path: &Path, password: Option<&str>) -> Error {
    match engine.last_error() {
        FPDF_ERR_PASSWORD => {
            if password.is_some() {
                Error::IncorrectPassword
            } else {
                Error::PasswordRequired
            }
        }
        FPDF_ERR_FORMAT => Error::InvalidPdf {
            reason: "not in PDF format or corrupted".to_string(),
        },
        FPDF_ERR_SECURITY => Error::InvalidPdf {
            reason: "unsupported security scheme".to_string(),
        },
        FPDF_ERR_FILE => Error::PdfNotFound {
            path: path.display().to_string(),
        },
        code => Error::Pdfium {
            reason: format!("failed to open document (engine error {})", code),
        },
    }
}
