use flate2::Crc;
use flate2::read::DeflateDecoder;
use std::io::Read;
use std::sync::Arc;

use crate::io::ReadAt;
use anyhow::{Context, Result, bail};

use super::parser::{CentralDirectory, ZipParser};
use super::structures::{CompressionMethod, ZipFileEntry};

/// Entry data exactly as stored in the archive.
#[derive(Debug, Clone)]
pub struct RawEntryData {
    /// Extra field of the local header
    pub local_extra: Vec<u8>,
    /// Compressed bytes, not inflated
    pub data: Vec<u8>,
}

/// ZIP file extractor
pub struct ZipExtractor<R: ReadAt> {
    parser: ZipParser<R>,
}

impl<R: ReadAt> ZipExtractor<R> {
    pub fn new(reader: Arc<R>) -> Self {
        Self {
            parser: ZipParser::new(reader),
        }
    }

    /// Read the central directory: all entries plus the archive comment
    pub async fn central_directory(&self) -> Result<CentralDirectory> {
        self.parser.read_central_directory().await
    }

    /// Read an entry's stored bytes without decompressing them
    pub async fn read_raw(&self, entry: &ZipFileEntry) -> Result<RawEntryData> {
        let local = self.parser.read_local_header(entry).await?;

        let mut data = vec![0u8; entry.compressed_size as usize];
        self.parser
            .reader()
            .read_exact_at(local.data_offset, &mut data)
            .await
            .with_context(|| format!("data of {}", entry.file_name))?;

        Ok(RawEntryData {
            local_extra: local.extra_field,
            data,
        })
    }

    /// Extract file data to memory, checking size and CRC-32
    pub async fn extract_to_memory(&self, entry: &ZipFileEntry) -> Result<Vec<u8>> {
        if entry.is_encrypted() {
            bail!("Entry {} is encrypted", entry.file_name);
        }

        let raw = self.read_raw(entry).await?;
        let data = decompress(entry, &raw.data)?;

        if data.len() as u64 != entry.uncompressed_size {
            bail!(
                "Size mismatch for {}: expected {} bytes, got {}",
                entry.file_name,
                entry.uncompressed_size,
                data.len()
            );
        }

        let mut crc = Crc::new();
        crc.update(&data);
        if crc.sum() != entry.crc32 {
            bail!(
                "CRC mismatch for {}: expected {:08x}, got {:08x}",
                entry.file_name,
                entry.crc32,
                crc.sum()
            );
        }

        Ok(data)
    }
}

fn decompress(entry: &ZipFileEntry, raw: &[u8]) -> Result<Vec<u8>> {
    match entry.compression_method {
        CompressionMethod::Stored => Ok(raw.to_vec()),
        CompressionMethod::Deflate => {
            // Header sizes are untrusted, so cap the preallocation
            let hint = (entry.uncompressed_size as usize).min(raw.len().saturating_mul(8));
            let mut out = Vec::with_capacity(hint);
            DeflateDecoder::new(raw)
                .read_to_end(&mut out)
                .with_context(|| format!("inflating {}", entry.file_name))?;
            Ok(out)
        }
        CompressionMethod::Unknown(method) => bail!(
            "Unsupported compression method {} for {} (only STORED and DEFLATE are supported)",
            method,
            entry.file_name
        ),
    }
}
