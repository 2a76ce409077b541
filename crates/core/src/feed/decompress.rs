//! Archive decompression for the downloaded catalog file.
//!
//! The feed is usually served xz-compressed, occasionally gzip. The format
//! is detected from magic bytes rather than the file extension, and the
//! decoded stream is exposed as a plain chunked `Read` so callers never hold
//! the decompressed document in memory at once.

use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use flate2::read::GzDecoder;
use xz2::read::XzDecoder;

use super::FeedError;

const XZ_MAGIC: [u8; 6] = [0xfd, 0x37, 0x7a, 0x58, 0x5a, 0x00];
const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Compression format of a catalog archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    Xz,
    Gzip,
    Plain,
}

/// Detect the archive format from the first bytes of the file.
pub fn detect_format(header: &[u8]) -> ArchiveFormat {
    if header.len() >= XZ_MAGIC.len() && header[..XZ_MAGIC.len()] == XZ_MAGIC {
        ArchiveFormat::Xz
    } else if header.len() >= GZIP_MAGIC.len() && header[..GZIP_MAGIC.len()] == GZIP_MAGIC {
        ArchiveFormat::Gzip
    } else {
        ArchiveFormat::Plain
    }
}

/// Open a downloaded catalog archive as a decompressed byte stream.
pub fn open_catalog(path: &Path) -> Result<Box<dyn Read + Send>, FeedError> {
    let mut file = File::open(path)?;

    let mut header = [0u8; 6];
    let read = file.read(&mut header)?;
    file.seek(SeekFrom::Start(0))?;

    let reader = BufReader::new(file);
    let stream: Box<dyn Read + Send> = match detect_format(&header[..read]) {
        ArchiveFormat::Xz => Box::new(XzDecoder::new(reader)),
        ArchiveFormat::Gzip => Box::new(GzDecoder::new(reader)),
        ArchiveFormat::Plain => Box::new(reader),
    };
    Ok(stream)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;
    use tempfile::TempDir;
    use xz2::write::XzEncoder;

    fn write_temp(dir: &TempDir, name: &str, bytes: &[u8]) -> std::path::PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, bytes).unwrap();
        path
    }

    #[test]
    fn test_detect_plain() {
        assert_eq!(detect_format(b"{\"Filmliste\""), ArchiveFormat::Plain);
        assert_eq!(detect_format(b""), ArchiveFormat::Plain);
    }

    #[test]
    fn test_detect_xz() {
        assert_eq!(
            detect_format(&[0xfd, 0x37, 0x7a, 0x58, 0x5a, 0x00, 0x00]),
            ArchiveFormat::Xz
        );
    }

    #[test]
    fn test_detect_gzip() {
        assert_eq!(detect_format(&[0x1f, 0x8b, 0x08]), ArchiveFormat::Gzip);
    }

    #[test]
    fn test_open_plain_catalog() {
        let dir = TempDir::new().unwrap();
        let path = write_temp(&dir, "plain.json", b"{\"X\":[]}");

        let mut stream = open_catalog(&path).unwrap();
        let mut out = String::new();
        stream.read_to_string(&mut out).unwrap();
        assert_eq!(out, "{\"X\":[]}");
    }

    #[test]
    fn test_open_gzip_catalog() {
        let dir = TempDir::new().unwrap();
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(b"{\"X\":[\"a\"]}").unwrap();
        let path = write_temp(&dir, "catalog.gz", &encoder.finish().unwrap());

        let mut stream = open_catalog(&path).unwrap();
        let mut out = String::new();
        stream.read_to_string(&mut out).unwrap();
        assert_eq!(out, "{\"X\":[\"a\"]}");
    }

    #[test]
    fn test_open_xz_catalog() {
        let dir = TempDir::new().unwrap();
        let mut encoder = XzEncoder::new(Vec::new(), 6);
        encoder.write_all(b"{\"X\":[\"a\"]}").unwrap();
        let path = write_temp(&dir, "catalog.xz", &encoder.finish().unwrap());

        let mut stream = open_catalog(&path).unwrap();
        let mut out = String::new();
        stream.read_to_string(&mut out).unwrap();
        assert_eq!(out, "{\"X\":[\"a\"]}");
    }

    #[test]
    fn test_truncated_xz_fails_on_read() {
        let dir = TempDir::new().unwrap();
        let mut encoder = XzEncoder::new(Vec::new(), 6);
        encoder.write_all(b"{\"X\":[\"abcdefgh\"]}").unwrap();
        let mut bytes = encoder.finish().unwrap();
        bytes.truncate(bytes.len() / 2);
        let path = write_temp(&dir, "broken.xz", &bytes);

        let mut stream = open_catalog(&path).unwrap();
        let mut out = Vec::new();
        assert!(stream.read_to_end(&mut out).is_err());
    }
}
