//! Sequential ZIP archive writer.
//!
//! Entries are written one after another as Local File Header + data,
//! and [`ZipWriter::finish`] appends the Central Directory and the EOCD
//! record. Two ways to add an entry:
//!
//! - [`ZipWriter::copy_raw`] copies an entry from another archive without
//!   recompressing it, so its stored bytes stay identical
//! - [`ZipWriter::add_entry`] compresses fresh content, taking name,
//!   timestamps and attributes from a template entry
//!
//! Sizes and CRC always go into the local header; no data descriptors and
//! no ZIP64 records are produced.

use flate2::Compression;
use flate2::Crc;
use flate2::write::DeflateEncoder;
use std::io::Write;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use anyhow::{Context, Result, bail};

use super::extractor::RawEntryData;
use super::structures::*;

/// Version made by: UNIX host, spec 3.0
const VERSION_MADE_BY_UNIX: u16 = (3 << 8) | 30;

/// Regular file, rw-r--r--
const DEFAULT_FILE_ATTRS: u32 = 0o100644 << 16;

/// 1980-01-01 00:00, the earliest DOS date
const DOS_EPOCH_DATE: u16 = (1 << 5) | 1;

/// ZIP archive writer over an async byte sink
pub struct ZipWriter<W: AsyncWrite + Unpin> {
    sink: W,
    /// Bytes written so far, i.e. the offset of the next record
    offset: u64,
    /// Central directory entries, with output offsets
    entries: Vec<ZipFileEntry>,
}

impl<W: AsyncWrite + Unpin> ZipWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            sink,
            offset: 0,
            entries: Vec::new(),
        }
    }

    /// Number of entries written so far
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Copy an entry as stored, without touching its compressed bytes.
    ///
    /// Method, CRC, sizes, timestamps, attributes and comment are kept.
    pub async fn copy_raw(&mut self, entry: &ZipFileEntry, raw: &RawEntryData) -> Result<()> {
        if raw.data.len() as u64 != entry.compressed_size {
            bail!(
                "Raw data of {} is {} bytes, central directory says {}",
                entry.file_name,
                raw.data.len(),
                entry.compressed_size
            );
        }

        let mut out = entry.clone();
        out.lfh_offset = self.offset;
        out.extra_field = strip_zip64_extra(&entry.extra_field);

        self.write_entry(out, &strip_zip64_extra(&raw.local_extra), &raw.data)
            .await
    }

    /// Write fresh content under the name and metadata of `template`.
    ///
    /// Compression method, CRC and sizes are recomputed; name, timestamps,
    /// attributes, comment and central extra field come from the template.
    pub async fn add_entry(
        &mut self,
        template: &ZipFileEntry,
        content: &[u8],
        method: CompressionMethod,
    ) -> Result<()> {
        let data = compress(content, method)
            .with_context(|| format!("compressing {}", template.file_name))?;

        let mut crc = Crc::new();
        crc.update(content);

        let mut out = template.clone();
        out.compression_method = method;
        out.crc32 = crc.sum();
        out.compressed_size = data.len() as u64;
        out.uncompressed_size = content.len() as u64;
        out.version_needed = template.version_needed.max(VERSION_DEFLATE);
        // Keep only the UTF-8 name flag; compression options and encryption no longer apply
        out.flags = template.flags & (1 << 11);
        out.lfh_offset = self.offset;
        out.extra_field = strip_zip64_extra(&template.extra_field);

        self.write_entry(out, &[], &data).await
    }

    /// Add a file entry with default metadata
    pub async fn add_file(
        &mut self,
        name: &str,
        content: &[u8],
        method: CompressionMethod,
    ) -> Result<()> {
        let template = ZipFileEntry {
            file_name: name.to_string(),
            file_name_raw: name.as_bytes().to_vec(),
            version_made_by: VERSION_MADE_BY_UNIX,
            version_needed: VERSION_DEFLATE,
            flags: 1 << 11,
            compression_method: method,
            compressed_size: 0,
            uncompressed_size: 0,
            crc32: 0,
            lfh_offset: 0,
            last_mod_time: 0,
            last_mod_date: DOS_EPOCH_DATE,
            internal_attrs: 0,
            external_attrs: DEFAULT_FILE_ATTRS,
            extra_field: Vec::new(),
            comment: Vec::new(),
            is_directory: name.ends_with('/'),
        };
        self.add_entry(&template, content, method).await
    }

    /// Write the Central Directory and EOCD, flush, and hand back the sink.
    ///
    /// `comment` becomes the archive comment.
    pub async fn finish(mut self, comment: &[u8]) -> Result<W> {
        let total_entries = u16::try_from(self.entries.len())
            .ok()
            .filter(|n| *n != u16::MAX)
            .context("Too many entries: ZIP64 output is not supported")?;
        let comment_len = u16::try_from(comment.len()).context("Archive comment too long")?;

        let mut cd = Vec::new();
        for entry in &self.entries {
            entry.write_central_header(&mut cd)?;
        }

        let cd_offset = u32::try_from(self.offset)
            .ok()
            .filter(|v| *v != u32::MAX)
            .context("Archive too large: ZIP64 output is not supported")?;
        let cd_size = u32::try_from(cd.len()).context("Central directory too large")?;

        let eocd = EndOfCentralDirectory {
            disk_number: 0,
            disk_with_cd: 0,
            disk_entries: total_entries,
            total_entries,
            cd_size,
            cd_offset,
            comment_len,
        };
        eocd.write_to(&mut cd, comment)?;

        self.sink.write_all(&cd).await?;
        self.sink.flush().await?;
        Ok(self.sink)
    }

    async fn write_entry(
        &mut self,
        entry: ZipFileEntry,
        local_extra: &[u8],
        data: &[u8],
    ) -> Result<()> {
        let mut header = Vec::with_capacity(LFH_SIZE + entry.file_name_raw.len());
        entry.write_local_header(&mut header, local_extra)?;

        self.sink.write_all(&header).await?;
        self.sink.write_all(data).await?;
        self.offset += (header.len() + data.len()) as u64;
        self.entries.push(entry);
        Ok(())
    }
}

fn compress(content: &[u8], method: CompressionMethod) -> Result<Vec<u8>> {
    match method {
        CompressionMethod::Stored => Ok(content.to_vec()),
        CompressionMethod::Deflate => {
            let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(content)?;
            Ok(encoder.finish()?)
        }
        CompressionMethod::Unknown(method) => {
            bail!("Unsupported compression method {} for writing", method)
        }
    }
}
