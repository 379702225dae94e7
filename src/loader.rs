//! Reads `.ls8` program text into a [`Chunk`].
//!
//! One byte per line, written as an 8-bit binary literal. Anything after a
//! `#` is a comment, and lines that are empty once the comment and
//! surrounding whitespace are stripped are skipped.
//!
//! ```text
//! # print 8
//! 10000010 # LDI R0,8
//! 00000000
//! 00001000
//! 01000111 # PRN R0
//! 00000000
//! 00000001 # HLT
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::region::Chunk;
use crate::vm::MEMORY_SIZE;

#[derive(thiserror::Error, Debug)]
pub enum LoadError {
  #[error("could not read program `{}`", path.display())]
  Io {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("line {line}: `{text}` is not an 8-bit binary literal")]
  InvalidByte { line: usize, text: String },

  #[error("program is {len} bytes, memory only holds {}", MEMORY_SIZE)]
  TooLarge { len: usize },
}

/// Parse program text into an image
pub fn parse(source: &str) -> Result<Chunk, LoadError> {
  let mut bytes = Vec::new();
  for (index, line) in source.lines().enumerate() {
    let text = match line.split_once('#') {
      Some((code, _comment)) => code,
      None => line,
    }
    .trim();
    if text.is_empty() {
      continue;
    }
    bytes.push(parse_byte(text).ok_or_else(|| LoadError::InvalidByte {
      line: index + 1,
      text: text.to_owned(),
    })?);
  }
  if bytes.len() > MEMORY_SIZE {
    return Err(LoadError::TooLarge { len: bytes.len() });
  }
  log::debug!("parsed {} program bytes", bytes.len());
  Ok(bytes.into())
}

/// Read and parse a program file
pub fn load_file(path: impl AsRef<Path>) -> Result<Chunk, LoadError> {
  let path = path.as_ref();
  let source = fs::read_to_string(path).map_err(|source| LoadError::Io {
    path: path.to_owned(),
    source,
  })?;
  log::info!("loading program from {}", path.display());
  parse(&source)
}

// `from_str_radix` alone would also take a leading sign
fn parse_byte(text: &str) -> Option<u8> {
  if text.len() > 8 || !text.bytes().all(|b| b == b'0' || b == b'1') {
    return None;
  }
  u8::from_str_radix(text, 2).ok()
}
