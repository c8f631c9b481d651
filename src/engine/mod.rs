//! Native engine layer
//!
//! Everything that touches the PDFium C ABI lives under this module: the
//! [`EngineBindings`] seam, the dynamic-library binding with its process-wide
//! init guard, and the typed handle family that owns native descriptors.

pub mod bindings;
pub mod handle;
pub mod library;

pub use bindings::{EngineBindings, RawHandle, SearchFlags};
pub use handle::{
    DocumentHandle, FormEnvHandle, HandleKind, JobHandle, NativeHandle, PageHandle, Resource,
    SearchHandle, TextPageHandle,
};
pub use library::{EngineConfig, PdfiumEngine};
