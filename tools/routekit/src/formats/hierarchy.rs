//! `.ch` format - persisted contraction hierarchy
//!
//! Little-endian layout:
//!
//! ```text
//! magic u32 | version u16 | metric u8 | reserved u8 | n_nodes u32 | n_up u32 | n_down u32
//! coords   n_nodes * (lon f64, lat f64)
//! rank     n_nodes * u32
//! up       first_out (n_nodes + 1) * u32, head / weight / middle n_up * u32
//! down     first_out (n_nodes + 1) * u32, head / weight / middle n_down * u32
//! crc64    u64 over everything above
//! ```

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use thiserror::Error;

use super::crc::{self, ChecksumWriter};
use crate::engine::contraction::Hierarchy;
use crate::engine::graph::{Csr, NO_MIDDLE};
use crate::profile::Metric;

const MAGIC: u32 = 0x524B_4348; // "RKCH"
const VERSION: u16 = 1;
const HEADER_LEN: usize = 20;
const FOOTER_LEN: usize = 8;

#[derive(Debug, Error)]
pub enum FormatError {
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("not a hierarchy file (magic {0:#010x})")]
    BadMagic(u32),

    #[error("unsupported hierarchy version {0}")]
    UnsupportedVersion(u16),

    #[error("checksum mismatch: stored {stored:016x}, computed {computed:016x}")]
    Checksum { stored: u64, computed: u64 },

    #[error("file truncated")]
    Truncated,

    #[error("inconsistent {0}")]
    Inconsistent(&'static str),
}

fn metric_code(metric: Metric) -> u8 {
    match metric {
        Metric::Distance => 0,
        Metric::Duration => 1,
    }
}

fn write_u32s<W: Write>(writer: &mut W, values: &[u32]) -> io::Result<()> {
    for v in values {
        writer.write_all(&v.to_le_bytes())?;
    }
    Ok(())
}

fn write_csr<W: Write>(writer: &mut W, csr: &Csr) -> io::Result<()> {
    write_u32s(writer, &csr.first_out)?;
    write_u32s(writer, &csr.head)?;
    write_u32s(writer, &csr.weight)?;
    write_u32s(writer, &csr.middle)
}

/// Write `hierarchy` to `path`, replacing any existing file.
pub fn write(path: &Path, hierarchy: &Hierarchy) -> io::Result<()> {
    let mut writer = ChecksumWriter::new(BufWriter::new(File::create(path)?));

    writer.write_all(&MAGIC.to_le_bytes())?;
    writer.write_all(&VERSION.to_le_bytes())?;
    writer.write_all(&[metric_code(hierarchy.metric), 0])?;
    writer.write_all(&(hierarchy.node_count() as u32).to_le_bytes())?;
    writer.write_all(&(hierarchy.up.arc_count() as u32).to_le_bytes())?;
    writer.write_all(&(hierarchy.down.arc_count() as u32).to_le_bytes())?;

    for [lon, lat] in &hierarchy.coords {
        writer.write_all(&lon.to_le_bytes())?;
        writer.write_all(&lat.to_le_bytes())?;
    }
    write_u32s(&mut writer, &hierarchy.rank)?;
    write_csr(&mut writer, &hierarchy.up)?;
    write_csr(&mut writer, &hierarchy.down)?;

    writer.finish()?.flush()
}

struct Reader<'a> {
    bytes: &'a [u8],
}

impl<'a> Reader<'a> {
    fn take(&mut self, n: usize) -> Result<&'a [u8], FormatError> {
        if self.bytes.len() < n {
            return Err(FormatError::Truncated);
        }
        let (head, rest) = self.bytes.split_at(n);
        self.bytes = rest;
        Ok(head)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N], FormatError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    fn u32(&mut self) -> Result<u32, FormatError> {
        self.array().map(u32::from_le_bytes)
    }

    fn f64(&mut self) -> Result<f64, FormatError> {
        self.array().map(f64::from_le_bytes)
    }

    fn u32s(&mut self, len: usize) -> Result<Vec<u32>, FormatError> {
        (0..len).map(|_| self.u32()).collect()
    }

    fn csr(&mut self, nodes: usize, arcs: usize) -> Result<Csr, FormatError> {
        let csr = Csr {
            first_out: self.u32s(nodes + 1)?,
            head: self.u32s(arcs)?,
            weight: self.u32s(arcs)?,
            middle: self.u32s(arcs)?,
        };
        if csr.first_out.first() != Some(&0)
            || csr.first_out.last().map(|&l| l as usize) != Some(arcs)
            || csr.first_out.windows(2).any(|w| w[0] > w[1])
        {
            return Err(FormatError::Inconsistent("arc offsets"));
        }
        if csr.head.iter().any(|&h| h as usize >= nodes)
            || csr.middle.iter().any(|&m| m != NO_MIDDLE && m as usize >= nodes)
        {
            return Err(FormatError::Inconsistent("arc endpoints"));
        }
        Ok(csr)
    }
}

/// Read and verify a hierarchy file.
pub fn read(path: &Path) -> Result<Hierarchy, FormatError> {
    let bytes = std::fs::read(path)?;
    if bytes.len() < HEADER_LEN + FOOTER_LEN {
        return Err(FormatError::Truncated);
    }
    let (body, footer) = bytes.split_at(bytes.len() - FOOTER_LEN);

    let mut reader = Reader { bytes: body };
    let magic = reader.u32()?;
    if magic != MAGIC {
        return Err(FormatError::BadMagic(magic));
    }
    let version = u16::from_le_bytes(reader.array()?);
    if version != VERSION {
        return Err(FormatError::UnsupportedVersion(version));
    }

    let mut stored = [0u8; FOOTER_LEN];
    stored.copy_from_slice(footer);
    let stored = u64::from_le_bytes(stored);
    let computed = crc::checksum(body);
    if stored != computed {
        return Err(FormatError::Checksum { stored, computed });
    }

    let [metric, _reserved] = reader.array::<2>()?;
    let metric = match metric {
        0 => Metric::Distance,
        1 => Metric::Duration,
        _ => return Err(FormatError::Inconsistent("metric")),
    };
    let nodes = reader.u32()? as usize;
    let n_up = reader.u32()? as usize;
    let n_down = reader.u32()? as usize;

    let mut coords = Vec::with_capacity(nodes);
    for _ in 0..nodes {
        coords.push([reader.f64()?, reader.f64()?]);
    }
    let rank = reader.u32s(nodes)?;
    let up = reader.csr(nodes, n_up)?;
    let down = reader.csr(nodes, n_down)?;

    if !reader.bytes.is_empty() {
        return Err(FormatError::Inconsistent("trailing bytes"));
    }

    Ok(Hierarchy {
        metric,
        coords,
        rank,
        up,
        down,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::contraction::contract;
    use crate::engine::graph::{Arc, RoadGraph};

    fn sample() -> Hierarchy {
        let arcs = vec![
            Arc { tail: 0, head: 1, weight: 7, middle: NO_MIDDLE },
            Arc { tail: 1, head: 0, weight: 7, middle: NO_MIDDLE },
            Arc { tail: 1, head: 2, weight: 9, middle: NO_MIDDLE },
        ];
        let graph = RoadGraph {
            coords: vec![[13.4, 52.5], [13.41, 52.5], [13.42, 52.51]],
            arcs,
        };
        contract(graph, Metric::Duration)
    }

    #[test]
    fn test_write_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.ch");
        let hierarchy = sample();

        write(&path, &hierarchy).unwrap();
        assert_eq!(read(&path).unwrap(), hierarchy);
    }

    #[test]
    fn test_corruption_detected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.ch");
        write(&path, &sample()).unwrap();

        let mut bytes = std::fs::read(&path).unwrap();
        let mid = bytes.len() / 2;
        bytes[mid] ^= 0xFF;
        std::fs::write(&path, &bytes).unwrap();
        assert!(matches!(read(&path), Err(FormatError::Checksum { .. })));

        std::fs::write(&path, b"RKCH").unwrap();
        assert!(matches!(read(&path), Err(FormatError::Truncated)));

        std::fs::write(&path, [0u8; 64]).unwrap();
        assert!(matches!(read(&path), Err(FormatError::BadMagic(0))));
    }
}
