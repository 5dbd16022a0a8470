//! Header codec
//!
//! Reads and writes everything in front of the compressed particle stream:
//! the fixed header, the metadata table, the reserved value and the channel
//! table. Entry strides are honored on read so that files from newer
//! writers, whose entries carry extra trailing fields, still open.

use std::collections::BTreeMap;
use std::io::{self, Read, Seek, SeekFrom, Write};

use prt_core::format::constants::{
    CURRENT_VERSION, MAGIC, METADATA_VERSION, NAME_FIELD_SIZE, RESERVED_VALUE,
};
use prt_core::format::header::encode_name;
use prt_core::{
    is_valid_name, ChannelEntry, FileHeader, Layout, MetaValue, MetadataEntryHeader, PrtError,
    TableHeader,
};
use tracing::warn;

use crate::error::{Error, Result};

/// Metadata entries keyed by name
pub type Metadata = BTreeMap<String, MetaValue>;

/// Everything a reader learns from the header
#[derive(Debug)]
pub(crate) struct HeaderInfo {
    pub version: i32,
    pub particle_count: u64,
    pub layout: Layout,
    pub metadata: Metadata,
}

/// Absolute positions of the fields patched when a writer closes
#[derive(Debug, Clone, Copy)]
pub(crate) struct Placeholders {
    pub particle_count: u64,
    pub bound_box: Option<u64>,
}

fn read_i32<R: Read>(source: &mut R, error: PrtError) -> Result<i32> {
    let mut raw = [0u8; 4];
    read_exact_or(source, &mut raw, error)?;
    Ok(i32::from_le_bytes(raw))
}

/// `read_exact`, reporting a short read as `error`
fn read_exact_or<R: Read>(source: &mut R, buf: &mut [u8], error: PrtError) -> Result<()> {
    source.read_exact(buf).map_err(|err| match err.kind() {
        io::ErrorKind::UnexpectedEof => Error::Prt(error),
        _ => Error::Io(err),
    })
}

fn skip<R: Seek>(source: &mut R, len: usize) -> Result<()> {
    if len > 0 {
        let len = i64::try_from(len).map_err(|_| PrtError::ValueTooLarge)?;
        source.seek(SeekFrom::Current(len))?;
    }
    Ok(())
}

fn read_file_header<R: Read>(source: &mut R) -> Result<FileHeader> {
    let mut bytes = [0u8; FileHeader::SIZE];
    let mut filled = 0;
    while filled < bytes.len() {
        match source.read(&mut bytes[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
            Err(err) => return Err(err.into()),
        }
    }

    if filled < FileHeader::SIZE {
        let kind = if filled < MAGIC.len() || bytes[..MAGIC.len()] != MAGIC {
            PrtError::NotAPrtFile
        } else {
            PrtError::CorruptHeader
        };
        return Err(kind.into());
    }

    Ok(FileHeader::from_bytes(&bytes)?)
}

fn read_metadata_table<R: Read + Seek>(source: &mut R) -> Result<(Metadata, usize)> {
    let mut raw = [0u8; TableHeader::SIZE];
    read_exact_or(source, &mut raw, PrtError::CorruptHeader)?;
    let table = TableHeader::from_bytes(&raw, MetadataEntryHeader::SIZE, PrtError::CorruptHeader)?;
    let trailer = table.trailer_len(MetadataEntryHeader::SIZE);

    let mut metadata = Metadata::new();
    let mut consumed = TableHeader::SIZE;

    for _ in 0..table.count {
        let mut raw = [0u8; MetadataEntryHeader::SIZE];
        read_exact_or(source, &mut raw, PrtError::CorruptMetadata)?;
        let entry = MetadataEntryHeader::from_bytes(&raw)?;
        skip(source, trailer)?;

        let name = entry.name_str().into_owned();
        let len = MetaValue::payload_len(entry.type_tag, entry.count)
            .map_err(|kind| Error::named(&name, kind))?;

        let mut payload = Vec::new();
        source.by_ref().take(len as u64).read_to_end(&mut payload)?;
        if payload.len() != len {
            return Err(Error::named(&name, PrtError::CorruptMetadata));
        }
        consumed = consumed
            .checked_add(table.stride as usize + len)
            .ok_or(PrtError::CorruptHeader)?;

        if !is_valid_name(&name) {
            warn!(name = %name, "Skipping metadata entry with an invalid name");
            continue;
        }
        let value = MetaValue::decode_payload(entry.type_tag, entry.count, &payload)
            .map_err(|kind| Error::named(&name, kind))?;
        if metadata.insert(name.clone(), value).is_some() {
            return Err(Error::named(&name, PrtError::CorruptMetadata));
        }
    }

    Ok((metadata, consumed))
}

fn read_channel_table<R: Read + Seek>(source: &mut R, version: i32) -> Result<Layout> {
    let with_transform = version >= METADATA_VERSION;
    let known = if with_transform {
        ChannelEntry::SIZE
    } else {
        ChannelEntry::SIZE_V1
    };

    let mut raw = [0u8; TableHeader::SIZE];
    read_exact_or(source, &mut raw, PrtError::CorruptChannel)?;
    let table = TableHeader::from_bytes(&raw, known, PrtError::CorruptChannel)?;
    let trailer = table.trailer_len(known);

    let mut layout = Layout::new();
    let mut raw = [0u8; ChannelEntry::SIZE];
    for _ in 0..table.count {
        read_exact_or(source, &mut raw[..known], PrtError::CorruptChannel)?;
        let entry = ChannelEntry::from_bytes(&raw[..known], with_transform)?;
        skip(source, trailer)?;

        let name = entry.name_str();
        let name = name.as_ref();
        let (ty, arity, offset, transform) =
            entry.decode().map_err(|kind| Error::named(name, kind))?;
        if !is_valid_name(name) {
            warn!(name = %name, "Invalid channel name in file");
        }
        layout
            .insert_channel(name, ty, arity, offset, transform)
            .map_err(|_| Error::named(name, PrtError::CorruptChannel))?;
    }

    layout.check_bounds()?;
    Ok(layout)
}

/// Parse the header, leaving `source` at the first compressed byte
pub(crate) fn read_header<R: Read + Seek>(source: &mut R) -> Result<HeaderInfo> {
    let header = read_file_header(source)?;
    let mut consumed = FileHeader::SIZE;

    let metadata = if header.version >= METADATA_VERSION {
        let (metadata, table_len) = read_metadata_table(source)?;
        consumed = consumed.checked_add(table_len).ok_or(PrtError::CorruptHeader)?;
        metadata
    } else {
        Metadata::new()
    };

    // Everything up to the reserved value is covered by the header length
    let header_length = header.header_length as usize;
    if header_length < consumed {
        return Err(PrtError::CorruptHeader.into());
    }
    skip(source, header_length - consumed)?;

    if read_i32(source, PrtError::CorruptHeader)? != RESERVED_VALUE {
        return Err(PrtError::BadReservedValue.into());
    }

    let layout = read_channel_table(source, header.version)?;

    Ok(HeaderInfo {
        version: header.version,
        particle_count: header.particle_count as u64,
        layout,
        metadata,
    })
}

fn to_i32(value: usize) -> Result<i32> {
    i32::try_from(value).map_err(|_| Error::Prt(PrtError::ValueTooLarge))
}

/// Write the header at the sink's current position
///
/// The particle count goes out as -1. Returns where the count and the
/// payload of the `bound_box` metadata entry ended up so they can be
/// rewritten once the stream is finished.
pub(crate) fn write_header<W: Write + Seek>(
    sink: &mut W,
    layout: &Layout,
    metadata: &Metadata,
    bound_box: Option<&str>,
) -> Result<Placeholders> {
    let base = sink.stream_position()?;

    let mut table = Vec::new();
    table.extend_from_slice(&TableHeader::new(to_i32(metadata.len())?, MetadataEntryHeader::SIZE as i32).to_bytes());

    let mut bound_box_at = None;
    for (name, value) in metadata {
        let (count, payload) = value.encode_payload().map_err(|kind| Error::named(name, kind))?;
        let type_tag = value
            .type_tag()
            .ok_or_else(|| Error::named(name, PrtError::TypeMismatch))?;
        let entry = MetadataEntryHeader {
            name: encode_name(name),
            type_tag,
            count,
        };
        table.extend_from_slice(&entry.to_bytes());
        if bound_box == Some(name.as_str()) {
            bound_box_at = Some(FileHeader::SIZE + table.len());
        }
        table.extend_from_slice(&payload);
    }

    let header_length = to_i32(FileHeader::SIZE + table.len())?;

    let mut bytes = Vec::with_capacity(header_length as usize + 12 + layout.num_channels() * ChannelEntry::SIZE);
    bytes.extend_from_slice(&FileHeader::new(CURRENT_VERSION, header_length).to_bytes());
    bytes.extend_from_slice(&table);
    bytes.extend_from_slice(&RESERVED_VALUE.to_le_bytes());
    bytes.extend_from_slice(
        &TableHeader::new(to_i32(layout.num_channels())?, ChannelEntry::SIZE as i32).to_bytes(),
    );

    for channel in layout.channels() {
        debug_assert!(channel.name.len() < NAME_FIELD_SIZE);
        let entry = ChannelEntry {
            name: encode_name(&channel.name),
            type_ordinal: channel.ty.ordinal(),
            arity: to_i32(channel.arity)?,
            offset: to_i32(channel.offset)?,
            transform: channel.transform.ordinal(),
        };
        bytes.extend_from_slice(&entry.to_bytes());
    }

    sink.write_all(&bytes)?;

    Ok(Placeholders {
        particle_count: base + FileHeader::PARTICLE_COUNT_OFFSET,
        bound_box: bound_box_at.map(|at| base + at as u64),
    })
}

/// Overwrite the particle count and bounding box placeholders, then return
/// the sink to the end of the file
pub(crate) fn patch_header<W: Write + Seek>(
    sink: &mut W,
    placeholders: &Placeholders,
    particle_count: u64,
    bound_box: Option<&[f32; 6]>,
) -> Result<()> {
    let end = sink.stream_position()?;
    let count = i64::try_from(particle_count).map_err(|_| PrtError::ValueTooLarge)?;

    sink.seek(SeekFrom::Start(placeholders.particle_count))?;
    sink.write_all(&count.to_le_bytes())?;

    if let (Some(at), Some(bounds)) = (placeholders.bound_box, bound_box) {
        sink.seek(SeekFrom::Start(at))?;
        sink.write_all(bytemuck::bytes_of(bounds))?;
    }

    sink.seek(SeekFrom::Start(end))?;
    sink.flush()?;
    Ok(())
}
