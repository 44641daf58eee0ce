//! Map sources - single-pass streams of OSM nodes and ways

mod pbf;

use std::path::{Path, PathBuf};
use thiserror::Error;

pub use pbf::PbfSource;

/// An OSM way as handed to profile rules
#[derive(Debug, Clone, PartialEq)]
pub struct Way {
    pub id: i64,
    pub refs: Vec<i64>,
    pub tags: Vec<(String, String)>,
}

impl Way {
    /// Borrowed `(key, value)` pairs for a [`crate::profiles::TagLookup`]
    pub fn tag_pairs(&self) -> Vec<(&str, &str)> {
        self.tags
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect()
    }

    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// An OSM node position
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Node {
    pub id: i64,
    pub lon: f64,
    pub lat: f64,
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        source: osmpbf::Error,
    },

    #[error("failed to decode {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        source: osmpbf::Error,
    },
}

impl SourceError {
    pub fn path(&self) -> &Path {
        match self {
            SourceError::Open { path, .. } | SourceError::Decode { path, .. } => path,
        }
    }
}

impl From<SourceError> for routekit_common::Error {
    fn from(err: SourceError) -> Self {
        routekit_common::Error::Source {
            path: err.path().to_path_buf(),
            source: Box::new(err),
        }
    }
}

/// A map that can be streamed from the start any number of times.
///
/// Each call is one complete pass; a failed pass is not resumable.
pub trait OsmSource: Send + Sync {
    /// Map location, also the prefix of hierarchy cache file names
    fn path(&self) -> &Path;

    fn for_each_way(&self, f: &mut dyn FnMut(&Way)) -> Result<(), SourceError>;

    fn for_each_node(&self, f: &mut dyn FnMut(Node)) -> Result<(), SourceError>;
}

/// A map held in memory, used for fixtures and small generated networks
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    path: PathBuf,
    nodes: Vec<Node>,
    ways: Vec<Way>,
}

impl MemorySource {
    /// `name` stands in for the file path in cache names
    pub fn new(name: impl Into<PathBuf>) -> Self {
        Self {
            path: name.into(),
            ..Self::default()
        }
    }

    pub fn add_node(&mut self, id: i64, lon: f64, lat: f64) -> &mut Self {
        self.nodes.push(Node { id, lon, lat });
        self
    }

    pub fn add_way(&mut self, id: i64, refs: &[i64], tags: &[(&str, &str)]) -> &mut Self {
        self.ways.push(Way {
            id,
            refs: refs.to_vec(),
            tags: tags
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
        });
        self
    }

    pub fn way_count(&self) -> usize {
        self.ways.len()
    }
}

impl OsmSource for MemorySource {
    fn path(&self) -> &Path {
        &self.path
    }

    fn for_each_way(&self, f: &mut dyn FnMut(&Way)) -> Result<(), SourceError> {
        self.ways.iter().for_each(f);
        Ok(())
    }

    fn for_each_node(&self, f: &mut dyn FnMut(Node)) -> Result<(), SourceError> {
        self.nodes.iter().copied().for_each(f);
        Ok(())
    }
}
