//! Serializable description of a PRT file
//!
//! Captures what a reader learns from the header, for tools that want to
//! print or ship it as JSON.

use std::collections::BTreeMap;
use std::io::{Read, Seek};

use prt_core::Channel;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::reader::ParticleReader;

/// Header contents of a file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileSummary {
    pub version: i32,
    pub particle_count: u64,
    pub record_size: usize,
    pub channels: Vec<Channel>,
    /// Metadata values rendered as text
    pub metadata: BTreeMap<String, String>,
}

impl FileSummary {
    /// Summarize an open reader
    pub fn from_reader<R: Read + Seek>(reader: &ParticleReader<R>) -> Self {
        Self {
            version: reader.version(),
            particle_count: reader.particle_count(),
            record_size: reader.layout().record_size(),
            channels: reader.layout().channels().to_vec(),
            metadata: reader
                .metadata()
                .iter()
                .map(|(name, value)| (name.clone(), value.to_string()))
                .collect(),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
