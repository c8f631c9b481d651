//! PDFium Host Core
//!
//! Safe, leak-free interop core for embedding the PDFium engine behind its C
//! ABI:
//! - `engine`: typed native handles with an exactly-once release contract,
//!   plus the dynamic library binding and its process-wide init guard
//! - `affinity`: await-compatible execution of native calls without ever
//!   hopping threads (the engine is not thread-safe; violations crash the
//!   process, they do not error)
//! - `cache`: bounded LRU cache whose eviction path releases the native
//!   resources of whatever it evicts
//! - `range`: parsing and validation of human-entered page-range text
//! - `session`: one open document, its page cache, and the thread it is
//!   bound to

pub mod affinity;
pub mod cache;
pub mod engine;
pub mod error;
pub mod range;
pub mod session;

pub use affinity::{run_affine, ThreadAffinity};
pub use cache::{BoundedCache, Disposable};
pub use engine::{
    DocumentHandle, EngineBindings, EngineConfig, FormEnvHandle, HandleKind, JobHandle,
    NativeHandle, PageHandle, PdfiumEngine, RawHandle, SearchFlags, SearchHandle, TextPageHandle,
};
pub use error::{Error, Result};
pub use range::{parse, parse_expanded, PageRange, RangeError};
pub use session::{DocumentSession, PageFingerprint, PageInfo, RenderedPage, SessionConfig};
