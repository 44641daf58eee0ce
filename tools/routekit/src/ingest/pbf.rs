//! `.osm.pbf` map source backed by osmpbf

use osmpbf::{BlobDecode, BlobReader, Element, ElementReader};
use std::path::{Path, PathBuf};

use super::{Node, OsmSource, SourceError, Way};

/// A PBF file on disk; every pass reopens the file.
#[derive(Debug, Clone)]
pub struct PbfSource {
    path: PathBuf,
}

impl PbfSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn reader(&self) -> Result<ElementReader<std::io::BufReader<std::fs::File>>, SourceError> {
        ElementReader::from_path(&self.path).map_err(|source| SourceError::Open {
            path: self.path.clone(),
            source,
        })
    }

    fn decode_error(&self, source: osmpbf::Error) -> SourceError {
        SourceError::Decode {
            path: self.path.clone(),
            source,
        }
    }
}

impl OsmSource for PbfSource {
    fn path(&self) -> &Path {
        &self.path
    }

    fn for_each_way(&self, f: &mut dyn FnMut(&Way)) -> Result<(), SourceError> {
        let blobs = BlobReader::from_path(&self.path).map_err(|source| SourceError::Open {
            path: self.path.clone(),
            source,
        })?;
        // only way groups are decoded, node and relation groups are skipped
        for blob in blobs {
            let blob = blob.map_err(|err| self.decode_error(err))?;
            let BlobDecode::OsmData(block) = blob.decode().map_err(|err| self.decode_error(err))?
            else {
                continue;
            };
            for group in block.groups() {
                for way in group.ways() {
                    let way = Way {
                        id: way.id(),
                        refs: way.refs().collect(),
                        tags: way
                            .tags()
                            .map(|(k, v)| (k.to_string(), v.to_string()))
                            .collect(),
                    };
                    f(&way);
                }
            }
        }
        Ok(())
    }

    fn for_each_node(&self, f: &mut dyn FnMut(Node)) -> Result<(), SourceError> {
        self.reader()?
            .for_each(|element| match element {
                Element::Node(node) => f(Node {
                    id: node.id(),
                    lon: node.lon(),
                    lat: node.lat(),
                }),
                Element::DenseNode(node) => f(Node {
                    id: node.id(),
                    lon: node.lon(),
                    lat: node.lat(),
                }),
                _ => {}
            })
            .map_err(|err| self.decode_error(err))
    }
}
