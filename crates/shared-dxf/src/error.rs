use thiserror::Error;

#[derive(Error, Debug)]
pub enum DxfLoadError {
    #[error("Failed to read DXF file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse DXF: {0}")]
    Parse(String),
}
