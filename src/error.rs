use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for the simulator
#[derive(Error, Debug)]
pub enum SimulatorError {
    #[error("Failed to load memory image: {0}")]
    ImageLoadError(#[from] ImageError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),
}

/// Errors related to memory image files
#[derive(Error, Debug)]
pub enum ImageError {
    #[error("Failed to read image file '{}': {}", .0.display(), .1)]
    FileReadError(PathBuf, #[source] std::io::Error),

    #[error("Invalid digit '{0}' in instruction {1} of the instruction image")]
    BadInstructionDigit(char, usize),

    #[error("Truncated instruction at the end of the image: {0} trailing bits")]
    TruncatedInstruction(usize),

    #[error("Invalid data word '{0}' at line {1}: expected up to 8 hex digits")]
    BadDataWord(String, usize),

    #[error("Image holds {0} words but the memory depth is {1}")]
    ImageTooLarge(usize, usize),
}

/// Type alias for Result with SimulatorError
pub type SimulatorResult<T> = Result<T, SimulatorError>;
