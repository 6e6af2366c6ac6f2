//! ZIP archive parsing, extraction and writing.
//!
//! ## Architecture
//!
//! - [`structures`]: Data structures representing ZIP format elements (EOCD, file headers, etc.)
//! - [`parser`]: Low-level parsing of ZIP structures from raw bytes
//! - [`extractor`]: Reading entry data, raw or decompressed
//! - [`writer`]: Building a new archive from copied and fresh entries
//!
//! ## ZIP Format Overview
//!
//! A ZIP file consists of:
//! 1. Local file headers and compressed data for each file
//! 2. Central Directory with metadata for all files
//! 3. End of Central Directory (EOCD) record at the end
//!
//! Reading starts from the EOCD and the Central Directory; writing
//! produces the same layout front to back.
//!
//! ## Supported Features
//!
//! - Reading standard ZIP and ZIP64 archives
//! - STORED and DEFLATE compression, CRC-32 verification
//! - Raw copy of entries of any method, including encrypted ones
//!
//! ## Limitations
//!
//! - No decryption
//! - No multi-disk archive support
//! - No ZIP64 output

mod extractor;
mod parser;
mod structures;
mod writer;

pub use extractor::{RawEntryData, ZipExtractor};
pub use parser::{CentralDirectory, LocalHeader, ZipParser};
pub use structures::*;
pub use writer::ZipWriter;
