//! Channel layout of a particle record
//!
//! A [`Layout`] is the ordered set of named channels that make up one
//! particle. Writers build it channel by channel, each new channel packed
//! directly after the previous one. Readers fill it from the channel table,
//! where the file supplies the offsets.

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;
use core::ops::Range;

use hashbrown::HashMap;

use crate::format::{PrimitiveType, TransformKind};
use crate::validation::validate_name;
use crate::{PrtError, Result};

/// A named, typed, fixed-arity field of a particle record
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Channel {
    /// Channel name
    pub name: String,
    /// Element type stored in the file
    #[cfg_attr(feature = "serde", serde(rename = "type"))]
    pub ty: PrimitiveType,
    /// Number of elements
    pub arity: usize,
    /// Byte offset within the record
    pub offset: usize,
    /// Transform classification
    pub transform: TransformKind,
}

impl Channel {
    /// Byte span of the channel's values
    pub fn span(&self) -> usize {
        self.ty.size_bytes() * self.arity
    }

    /// Byte range of the channel within a record
    pub fn range(&self) -> Range<usize> {
        self.offset..self.offset + self.span()
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}[{}]", self.name, self.ty, self.arity)
    }
}

/// Ordered channel set with name lookup and the derived record size
#[derive(Debug, Clone, Default)]
pub struct Layout {
    channels: Vec<Channel>,
    index: HashMap<String, usize>,
    record_size: usize,
}

impl Layout {
    /// Create an empty layout
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a channel at the end of the record
    ///
    /// The name must be a valid identifier that is not already present. An
    /// unspecified transform resolves to the per-name default, and the
    /// result must suit the channel's type and arity.
    pub fn add_channel(
        &mut self,
        name: &str,
        ty: PrimitiveType,
        arity: usize,
        transform: TransformKind,
    ) -> Result<&Channel> {
        validate_name(name)?;
        let offset = self.record_size;
        self.push(name, ty, arity, offset, transform)
    }

    /// Add a channel at an offset taken from a channel table
    ///
    /// Name syntax is not checked here; files in the wild carry names the
    /// writer side would reject.
    pub fn insert_channel(
        &mut self,
        name: &str,
        ty: PrimitiveType,
        arity: usize,
        offset: usize,
        transform: TransformKind,
    ) -> Result<&Channel> {
        if name.is_empty() {
            return Err(PrtError::InvalidName);
        }
        self.push(name, ty, arity, offset, transform)
    }

    fn push(
        &mut self,
        name: &str,
        ty: PrimitiveType,
        arity: usize,
        offset: usize,
        transform: TransformKind,
    ) -> Result<&Channel> {
        if self.index.contains_key(name) {
            return Err(PrtError::DuplicateChannel);
        }

        let transform = match transform {
            TransformKind::Unspecified => TransformKind::default_for(name),
            explicit => explicit,
        };
        if !transform.is_compatible(ty, arity) {
            return Err(PrtError::IncompatibleTransform);
        }

        let span = ty.span(arity).ok_or(PrtError::ValueTooLarge)?;
        let record_size = self
            .record_size
            .checked_add(span)
            .ok_or(PrtError::ValueTooLarge)?;
        offset.checked_add(span).ok_or(PrtError::ValueTooLarge)?;

        let position = self.channels.len();
        self.index.insert(String::from(name), position);
        self.channels.push(Channel {
            name: String::from(name),
            ty,
            arity,
            offset,
            transform,
        });
        self.record_size = record_size;
        Ok(&self.channels[position])
    }

    /// Look up a channel by name
    pub fn get_channel(&self, name: &str) -> Result<&Channel> {
        self.index
            .get(name)
            .map(|&i| &self.channels[i])
            .ok_or(PrtError::ChannelNotFound)
    }

    pub fn has_channel(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Channels in insertion order
    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    /// Channel at `index` in insertion order
    pub fn channel_at(&self, index: usize) -> Option<&Channel> {
        self.channels.get(index)
    }

    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Bytes per particle record
    pub fn record_size(&self) -> usize {
        self.record_size
    }

    /// Check that every channel lies inside the record
    ///
    /// Offsets read from a file are not guaranteed to pack; this catches a
    /// channel table that would index past the end of a record.
    pub fn check_bounds(&self) -> Result<()> {
        for channel in &self.channels {
            if channel.offset + channel.span() > self.record_size {
                return Err(PrtError::CorruptChannel);
            }
        }
        Ok(())
    }

    /// Remove every channel
    pub fn clear(&mut self) {
        self.channels.clear();
        self.index.clear();
        self.record_size = 0;
    }
}
