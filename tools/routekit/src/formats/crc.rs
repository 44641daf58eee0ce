//! CRC-64 checksums for binary files

use crc::{Crc, CRC_64_GO_ISO};
use std::io::{self, Write};

pub static CRC64: Crc<u64> = Crc::<u64>::new(&CRC_64_GO_ISO);

pub fn checksum(data: &[u8]) -> u64 {
    CRC64.checksum(data)
}

/// Writer that checksums everything passing through it
pub struct ChecksumWriter<W: Write> {
    inner: W,
    digest: crc::Digest<'static, u64>,
}

impl<W: Write> ChecksumWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            digest: CRC64.digest(),
        }
    }

    /// Append the little-endian checksum of the body and return the inner writer.
    pub fn finish(mut self) -> io::Result<W> {
        let sum = self.digest.finalize();
        self.inner.write_all(&sum.to_le_bytes())?;
        Ok(self.inner)
    }
}

impl<W: Write> Write for ChecksumWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.digest.update(&buf[..n]);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writer_appends_checksum() {
        let mut writer = ChecksumWriter::new(Vec::new());
        writer.write_all(b"hello ").unwrap();
        writer.write_all(b"world").unwrap();
        let bytes = writer.finish().unwrap();

        let (body, footer) = bytes.split_at(bytes.len() - 8);
        assert_eq!(body, b"hello world");
        assert_eq!(u64::from_le_bytes(footer.try_into().unwrap()), checksum(b"hello world"));
    }
}
