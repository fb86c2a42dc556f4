//! Memory-image loading
//!
//! Instruction images are ASCII binary: 32 digits per instruction, MSB
//! first, whitespace insignificant. Data images are whitespace-separated
//! words of up to 8 hex digits. Word N of each image loads into entry N
//! of the corresponding memory.

use std::path::Path;

use crate::error::{ImageError, SimulatorResult};

/// Parses an instruction image
pub fn parse_imem(text: &str, depth: usize) -> Result<Vec<u32>, ImageError> {
    let mut words = Vec::new();
    let mut word: u32 = 0;
    let mut nbits = 0;

    for c in text.chars() {
        let bit = match c {
            '0' => 0,
            '1' => 1,
            c if c.is_whitespace() => continue,
            _ => return Err(ImageError::BadInstructionDigit(c, words.len())),
        };
        word = (word << 1) | bit;
        nbits += 1;
        if nbits == 32 {
            words.push(word);
            word = 0;
            nbits = 0;
        }
    }

    if nbits != 0 {
        return Err(ImageError::TruncatedInstruction(nbits));
    }
    if words.len() > depth {
        return Err(ImageError::ImageTooLarge(words.len(), depth));
    }
    Ok(words)
}

/// Parses a data image
pub fn parse_dmem(text: &str, depth: usize) -> Result<Vec<u32>, ImageError> {
    let mut words = Vec::new();

    for (line_index, line) in text.lines().enumerate() {
        for token in line.split_whitespace() {
            if token.len() > 8 || !token.chars().all(|c| c.is_ascii_hexdigit()) {
                return Err(ImageError::BadDataWord(token.into(), line_index + 1));
            }
            // the digit check above makes this infallible
            let word = u32::from_str_radix(token, 16)
                .map_err(|_| ImageError::BadDataWord(token.into(), line_index + 1))?;
            words.push(word);
        }
    }

    if words.len() > depth {
        return Err(ImageError::ImageTooLarge(words.len(), depth));
    }
    Ok(words)
}

/// Reads and parses an instruction image file
pub fn load_imem_file(path: &Path, depth: usize) -> SimulatorResult<Vec<u32>> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| ImageError::FileReadError(path.to_owned(), e))?;
    Ok(parse_imem(&text, depth)?)
}

/// Reads and parses a data image file
pub fn load_dmem_file(path: &Path, depth: usize) -> SimulatorResult<Vec<u32>> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| ImageError::FileReadError(path.to_owned(), e))?;
    Ok(parse_dmem(&text, depth)?)
}
