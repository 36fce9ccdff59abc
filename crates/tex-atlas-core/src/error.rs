use thiserror::Error;

#[derive(Debug, Error)]
pub enum AtlasError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Invalid page dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },
    #[error(
        "Input {id} ({width}x{height}) does not fit within max page size {max_width}x{max_height}"
    )]
    OversizedInput {
        id: usize,
        width: u32,
        height: u32,
        max_width: u32,
        max_height: u32,
    },
    #[error("Duplicate name in assembly: {0}")]
    DuplicateName(String),
    #[error("No source for frame {id} ({name}) in the assembly")]
    MissingSource { id: usize, name: String },
    #[error("Unknown composite target: {0}")]
    UnknownTarget(usize),
    #[error("Out of space: placed {placed} of {total} rectangles")]
    OutOfSpace { placed: usize, total: usize },
}

pub type Result<T> = std::result::Result<T, AtlasError>;
