//! DXF decoding into the engine's drawing model
//!
//! Parsing is delegated to the `dxf` crate; this crate only maps its entity
//! and block tables onto [`shared_types::Drawing`].

pub mod convert;
pub mod error;

pub use error::DxfLoadError;

use std::io::Cursor;
use std::path::Path;

use shared_types::Drawing;
use tracing::debug;

/// Load and convert a DXF file
pub fn load_file<P: AsRef<Path>>(path: P) -> Result<Drawing, DxfLoadError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)?;
    debug!(path = %path.display(), size = bytes.len(), "Loading DXF");
    load_bytes(&bytes)
}

/// Convert DXF content held in memory (ASCII or binary DXF)
pub fn load_bytes(bytes: &[u8]) -> Result<Drawing, DxfLoadError> {
    let parsed = dxf::Drawing::load(&mut Cursor::new(bytes))
        .map_err(|e| DxfLoadError::Parse(e.to_string()))?;
    Ok(convert::to_drawing(&parsed))
}
