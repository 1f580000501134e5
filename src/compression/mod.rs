// src/compression/mod.rs
//! Compression formats for package archives
//!
//! A recipe's `pack=` option selects one of these. Packaging wraps a tar
//! stream in the matching [`Encoder`]; [`create_decoder`] reads one back.

use std::fmt;
use std::io::{self, Read, Write};

/// Supported package compression formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompressionFormat {
    /// Gzip compression (.tar.gz), used for any unrecognized `pack=` value
    Gzip,
    /// XZ/LZMA compression (.tar.xz)
    Xz,
    /// Zstandard compression (.tar.zst)
    #[default]
    Zstd,
}

impl CompressionFormat {
    /// Parse a recipe `pack=` value
    ///
    /// `zst` and `xz` select their formats; anything else falls back to gzip.
    pub fn from_pack_option(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "zst" | "zstd" => Self::Zstd,
            "xz" => Self::Xz,
            _ => Self::Gzip,
        }
    }

    /// The value written back as a `pack=` option
    pub fn pack_option(&self) -> &'static str {
        match self {
            Self::Gzip => "gz",
            Self::Xz => "xz",
            Self::Zstd => "zst",
        }
    }

    /// File extension for a tarball in this format (without leading dot)
    pub fn archive_extension(&self) -> &'static str {
        match self {
            Self::Gzip => "tar.gz",
            Self::Xz => "tar.xz",
            Self::Zstd => "tar.zst",
        }
    }

    /// Detect compression format from magic bytes
    ///
    /// Magic bytes:
    /// - Gzip: `1f 8b`
    /// - XZ: `fd 37 7a 58 5a 00`
    /// - Zstd: `28 b5 2f fd`
    pub fn from_magic_bytes(data: &[u8]) -> Option<Self> {
        if data.starts_with(&[0x1f, 0x8b]) {
            Some(Self::Gzip)
        } else if data.starts_with(&[0xfd, 0x37, 0x7a, 0x58, 0x5a, 0x00]) {
            Some(Self::Xz)
        } else if data.starts_with(&[0x28, 0xb5, 0x2f, 0xfd]) {
            Some(Self::Zstd)
        } else {
            None
        }
    }

    /// Human-readable name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Gzip => "gzip",
            Self::Xz => "xz",
            Self::Zstd => "zstd",
        }
    }
}

impl fmt::Display for CompressionFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A compressing writer that must be finished explicitly
pub enum Encoder<W: Write> {
    Gzip(flate2::write::GzEncoder<W>),
    Xz(xz2::write::XzEncoder<W>),
    Zstd(zstd::Encoder<'static, W>),
}

impl<W: Write> Encoder<W> {
    /// Wrap a writer with the encoder for `format`
    pub fn new(writer: W, format: CompressionFormat) -> io::Result<Self> {
        Ok(match format {
            CompressionFormat::Gzip => Self::Gzip(flate2::write::GzEncoder::new(
                writer,
                flate2::Compression::default(),
            )),
            CompressionFormat::Xz => Self::Xz(xz2::write::XzEncoder::new(writer, 6)),
            CompressionFormat::Zstd => Self::Zstd(zstd::Encoder::new(writer, 19)?),
        })
    }

    /// Flush the compressed trailer and return the inner writer
    pub fn finish(self) -> io::Result<W> {
        match self {
            Self::Gzip(e) => e.finish(),
            Self::Xz(e) => e.finish(),
            Self::Zstd(e) => e.finish(),
        }
    }
}

impl<W: Write> Write for Encoder<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Self::Gzip(e) => e.write(buf),
            Self::Xz(e) => e.write(buf),
            Self::Zstd(e) => e.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::Gzip(e) => e.flush(),
            Self::Xz(e) => e.flush(),
            Self::Zstd(e) => e.flush(),
        }
    }
}

/// Create a decompressing reader for the given format
pub fn create_decoder<'a, R: Read + 'a>(
    reader: R,
    format: CompressionFormat,
) -> io::Result<Box<dyn Read + 'a>> {
    Ok(match format {
        CompressionFormat::Gzip => Box::new(flate2::read::GzDecoder::new(reader)),
        CompressionFormat::Xz => Box::new(xz2::read::XzDecoder::new(reader)),
        CompressionFormat::Zstd => Box::new(zstd::Decoder::new(reader)?),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pack_option_parsing() {
        assert_eq!(CompressionFormat::from_pack_option("zst"), CompressionFormat::Zstd);
        assert_eq!(CompressionFormat::from_pack_option("xz"), CompressionFormat::Xz);
        assert_eq!(CompressionFormat::from_pack_option("gz"), CompressionFormat::Gzip);
        // Unknown values fall back to gzip
        assert_eq!(CompressionFormat::from_pack_option("lz4"), CompressionFormat::Gzip);
        assert_eq!(CompressionFormat::from_pack_option(""), CompressionFormat::Gzip);
    }

    #[test]
    fn test_archive_extension() {
        assert_eq!(CompressionFormat::Zstd.archive_extension(), "tar.zst");
        assert_eq!(CompressionFormat::Xz.archive_extension(), "tar.xz");
        assert_eq!(CompressionFormat::Gzip.archive_extension(), "tar.gz");
    }

    #[test]
    fn test_encoders_write_their_magic() {
        for format in [CompressionFormat::Gzip, CompressionFormat::Xz, CompressionFormat::Zstd] {
            let mut encoder = Encoder::new(Vec::new(), format).unwrap();
            encoder.write_all(b"hello kiln").unwrap();
            let compressed = encoder.finish().unwrap();

            assert_eq!(CompressionFormat::from_magic_bytes(&compressed), Some(format));

            let mut decoder = create_decoder(compressed.as_slice(), format).unwrap();
            let mut output = Vec::new();
            decoder.read_to_end(&mut output).unwrap();
            assert_eq!(output, b"hello kiln");
        }
    }

    #[test]
    fn test_unknown_magic() {
        assert_eq!(CompressionFormat::from_magic_bytes(&[0, 0, 0, 0]), None);
        assert_eq!(CompressionFormat::from_magic_bytes(&[0x1f]), None);
    }
}
