//! End-to-end tests: write files, read them back, and open handcrafted or
//! damaged headers.

use std::io::{Cursor, Write};

use flate2::write::ZlibEncoder;
use flate2::Compression;
use half::f16;
use prt::{
    ErrorCategory, MetaValue, ParticleReader, ParticleWriter, PrimitiveType, PrtError,
    StreamConfig, TransformKind,
};
use prt_core::format::header::encode_name;
use prt_core::{ChannelEntry, FileHeader, MetadataEntryHeader, TableHeader};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[derive(Debug, Clone, Copy, PartialEq)]
struct Particle {
    position: [f32; 3],
    color: [f32; 3],
    density: f64,
    id: u16,
}

fn generate(count: usize) -> Vec<Particle> {
    let mut rng = StdRng::seed_from_u64(0x5052_5431);
    (0..count)
        .map(|i| Particle {
            position: [
                rng.gen_range(-100.0..100.0),
                rng.gen_range(0.0..100.0),
                rng.gen_range(-5.0..5.0),
            ],
            color: [
                (i % 23) as f32 / 22.0,
                ((i + 43) % 7) as f32 / 6.0,
                ((i + 7) % 91) as f32 / 90.0,
            ],
            density: rng.gen::<f64>() + 0.5,
            id: i as u16,
        })
        .collect()
}

fn write_particles(particles: &[Particle], config: StreamConfig) -> Vec<u8> {
    let mut builder = ParticleWriter::builder().with_config(config);
    let position = builder.bind::<f32>("Position", 3).unwrap();
    let color = builder
        .bind_as::<f32>("Color", 3, PrimitiveType::Float16)
        .unwrap();
    let density = builder.bind::<f64>("Density", 1).unwrap();
    let id = builder.bind::<u16>("ID", 1).unwrap();
    builder.add_metadata_string("Source", "roundtrip").unwrap();

    let mut writer = builder.open(Cursor::new(Vec::new())).unwrap();
    for particle in particles {
        writer.set(&position, &particle.position);
        writer.set(&color, &particle.color);
        writer.set(&density, &[particle.density]);
        writer.set(&id, &[particle.id]);
        writer.write_next_particle().unwrap();
    }
    assert_eq!(writer.particle_count(), particles.len() as u64);
    writer.close().unwrap().into_inner()
}

fn read_particles<R: std::io::Read + std::io::Seek>(reader: &mut ParticleReader<R>) -> Vec<Particle> {
    let position = reader.bind::<f32>("Position", 3).unwrap();
    let color = reader.bind::<f32>("Color", 3).unwrap();
    let density = reader.bind::<f64>("Density", 1).unwrap();
    let id = reader.bind::<u16>("ID", 1).unwrap();

    let mut particles = Vec::new();
    while reader.read_next_particle().unwrap() {
        particles.push(Particle {
            position: reader.value(&position).try_into().unwrap(),
            color: reader.value(&color).try_into().unwrap(),
            density: reader.value(&density)[0],
            id: reader.value(&id)[0],
        });
    }
    particles
}

fn assert_same_particles(read: &[Particle], written: &[Particle]) {
    assert_eq!(read.len(), written.len());
    for (got, want) in read.iter().zip(written) {
        assert_eq!(got.position, want.position);
        assert_eq!(got.density, want.density);
        assert_eq!(got.id, want.id);
        for (a, b) in got.color.iter().zip(&want.color) {
            assert!((a - b).abs() <= 1e-3, "color {a} too far from {b}");
        }
    }
}

#[test]
fn test_round_trip_counts() {
    for count in [0, 1, 791] {
        let written = generate(count);
        let bytes = write_particles(&written, StreamConfig::default());

        let mut reader = ParticleReader::open(Cursor::new(bytes)).unwrap();
        assert_eq!(reader.version(), 2);
        assert_eq!(reader.particle_count(), count as u64);
        assert_eq!(reader.layout().record_size(), 12 + 6 + 8 + 2);
        assert_eq!(reader.metadata_string("Source"), Some("roundtrip"));

        let read = read_particles(&mut reader);
        assert_same_particles(&read, &written);
        assert_eq!(reader.particles_remaining(), 0);
        assert!(!reader.read_next_particle().unwrap());
    }
}

#[test]
fn test_small_staging_buffer() {
    let written = generate(791);
    let config = StreamConfig::default()
        .with_buffer_size(1024)
        .with_compression(Compression::fast());
    let bytes = write_particles(&written, config);

    let mut reader = ParticleReader::open_with_config(Cursor::new(bytes), config).unwrap();
    assert_same_particles(&read_particles(&mut reader), &written);
}

#[test]
fn test_channel_layout_on_disk() {
    let bytes = write_particles(&generate(3), StreamConfig::default());
    let reader = ParticleReader::open(Cursor::new(bytes)).unwrap();

    let described: Vec<(String, PrimitiveType, usize, usize, TransformKind)> = reader
        .layout()
        .channels()
        .iter()
        .map(|c| (c.name.clone(), c.ty, c.arity, c.offset, c.transform))
        .collect();
    assert_eq!(
        described,
        [
            ("Position".to_string(), PrimitiveType::Float32, 3, 0, TransformKind::Point),
            ("Color".to_string(), PrimitiveType::Float16, 3, 12, TransformKind::Unspecified),
            ("Density".to_string(), PrimitiveType::Float64, 1, 18, TransformKind::Unspecified),
            ("ID".to_string(), PrimitiveType::UInt16, 1, 26, TransformKind::Unspecified),
        ]
    );
}

#[test]
fn test_bound_box_tracks_positions() {
    let written = generate(791);
    let bytes = write_particles(&written, StreamConfig::default());
    let reader = ParticleReader::open(Cursor::new(bytes)).unwrap();

    let mut min = [f32::INFINITY; 3];
    let mut max = [f32::NEG_INFINITY; 3];
    for particle in &written {
        for axis in 0..3 {
            min[axis] = min[axis].min(particle.position[axis]);
            max[axis] = max[axis].max(particle.position[axis]);
        }
    }

    let bounds = reader.bound_box().unwrap();
    assert_eq!(bounds.min, min);
    assert_eq!(bounds.max, max);

    let stored = reader.metadata_values::<f32>("BoundBox").unwrap();
    assert_eq!(stored, [min[0], min[1], min[2], max[0], max[1], max[2]]);
}

#[test]
fn test_empty_file_has_no_usable_bound_box() {
    let bytes = write_particles(&[], StreamConfig::default());
    let reader = ParticleReader::open(Cursor::new(bytes)).unwrap();
    assert_eq!(reader.bound_box(), None);
    let stored = reader.metadata_values::<f32>("BoundBox").unwrap();
    assert!(stored.iter().all(|v| v.is_nan()));
}

#[test]
fn test_bound_box_requires_float32_position() {
    // Position stored as float64 is not tracked, and a user box survives
    let mut builder = ParticleWriter::builder();
    let position = builder.bind::<f64>("Position", 3).unwrap();
    builder
        .add_metadata::<f32>("BoundBox", &[0.0, 0.0, 0.0, 1.0, 1.0, 1.0])
        .unwrap();
    let mut writer = builder.open(Cursor::new(Vec::new())).unwrap();
    writer.set(&position, &[50.0, 50.0, 50.0]);
    writer.write_next_particle().unwrap();
    let bytes = writer.close().unwrap().into_inner();

    let reader = ParticleReader::open(Cursor::new(bytes)).unwrap();
    let bounds = reader.bound_box().unwrap();
    assert_eq!(bounds.max, [1.0, 1.0, 1.0]);

    // With a float32 Position the user box is replaced
    let mut builder = ParticleWriter::builder();
    let position = builder.bind::<f32>("Position", 3).unwrap();
    builder
        .add_metadata::<f32>("BoundBox", &[0.0, 0.0, 0.0, 1.0, 1.0, 1.0])
        .unwrap();
    let mut writer = builder.open(Cursor::new(Vec::new())).unwrap();
    writer.set(&position, &[50.0, -2.0, 7.0]);
    writer.write_next_particle().unwrap();
    let bytes = writer.close().unwrap().into_inner();

    let reader = ParticleReader::open(Cursor::new(bytes)).unwrap();
    let bounds = reader.bound_box().unwrap();
    assert_eq!(bounds.min, [50.0, -2.0, 7.0]);
    assert_eq!(bounds.max, [50.0, -2.0, 7.0]);
}

#[test]
fn test_read_bind_rejections_leave_stream_usable() {
    let written = generate(5);
    let bytes = write_particles(&written, StreamConfig::default());
    let mut reader = ParticleReader::open(Cursor::new(bytes)).unwrap();

    let err = reader.bind::<f32>("Position", 2).unwrap_err();
    assert_eq!(err.kind(), Some(PrtError::ArityMismatch));
    assert_eq!(err.category(), ErrorCategory::Configuration);

    let err = reader.bind::<u32>("Density", 1).unwrap_err();
    assert_eq!(err.kind(), Some(PrtError::IncompatibleType));

    let err = reader.bind::<i16>("ID", 1).unwrap_err();
    assert_eq!(err.kind(), Some(PrtError::IncompatibleType));

    let err = reader.bind::<f32>("Velocity", 3).unwrap_err();
    assert_eq!(err.kind(), Some(PrtError::ChannelNotFound));

    // Widening binds are accepted, and only bound channels are filled
    let id = reader.bind::<i32>("ID", 1).unwrap();
    let err = reader.bind::<u64>("ID", 1).unwrap_err();
    assert_eq!(err.kind(), Some(PrtError::AlreadyBound));
    assert_eq!(reader.layout().num_channels(), 4);

    let mut ids = Vec::new();
    while reader.read_next_particle().unwrap() {
        ids.push(reader.value(&id)[0]);
    }
    assert_eq!(ids, [0, 1, 2, 3, 4]);
}

#[test]
fn test_write_bind_rejects_duplicates() {
    let mut builder = ParticleWriter::builder();
    builder.bind::<f32>("Velocity", 3).unwrap();
    let err = builder.bind::<f64>("Velocity", 3).unwrap_err();
    assert_eq!(err.kind(), Some(PrtError::AlreadyBound));
    assert_eq!(err.category(), ErrorCategory::Configuration);
}

#[test]
fn test_corrupted_magic_is_format_error() {
    let mut bytes = write_particles(&generate(2), StreamConfig::default());
    bytes[1] = b'Q';
    let err = ParticleReader::open(Cursor::new(bytes)).err().unwrap();
    assert_eq!(err.kind(), Some(PrtError::NotAPrtFile));
    assert_eq!(err.category(), ErrorCategory::Format);
}

#[test]
fn test_negative_particle_count_is_corrupt() {
    let mut bytes = write_particles(&generate(2), StreamConfig::default());
    bytes[48..56].copy_from_slice(&(-5i64).to_le_bytes());
    let err = ParticleReader::open(Cursor::new(bytes)).err().unwrap();
    assert_eq!(err.kind(), Some(PrtError::CorruptHeader));
    assert_eq!(err.category(), ErrorCategory::CorruptData);
}

#[test]
fn test_bad_reserved_value() {
    let mut bytes = write_particles(&generate(2), StreamConfig::default());
    let header_length = i32::from_le_bytes(bytes[8..12].try_into().unwrap()) as usize;
    bytes[header_length..header_length + 4].copy_from_slice(&5i32.to_le_bytes());
    let err = ParticleReader::open(Cursor::new(bytes)).err().unwrap();
    assert_eq!(err.kind(), Some(PrtError::BadReservedValue));
    assert_eq!(err.category(), ErrorCategory::Format);
}

#[test]
fn test_stream_shorter_than_declared_count() {
    let mut bytes = write_particles(&generate(10), StreamConfig::default());
    bytes[48..56].copy_from_slice(&20i64.to_le_bytes());

    let mut reader = ParticleReader::open(Cursor::new(bytes)).unwrap();
    for _ in 0..10 {
        assert!(reader.read_next_particle().unwrap());
    }
    let err = reader.read_next_particle().unwrap_err();
    assert_eq!(err.kind(), Some(PrtError::CorruptStream));
    assert_eq!(err.category(), ErrorCategory::CorruptData);

    // Only close is left
    let err = reader.read_next_particle().unwrap_err();
    assert_eq!(err.kind(), Some(PrtError::Poisoned));
    reader.close();
}

#[test]
fn test_stream_longer_than_declared_count() {
    let written = generate(10);
    let mut bytes = write_particles(&written, StreamConfig::default());
    bytes[48..56].copy_from_slice(&7i64.to_le_bytes());

    let mut reader = ParticleReader::open(Cursor::new(bytes)).unwrap();
    let id = reader.bind::<u16>("ID", 1).unwrap();
    for expected in 0..7u16 {
        assert!(reader.read_next_particle().unwrap());
        assert_eq!(reader.value(&id), [expected]);
    }
    assert_eq!(reader.particles_remaining(), 0);

    let err = reader.read_next_particle().unwrap_err();
    assert_eq!(err.kind(), Some(PrtError::CorruptStream));
    assert_eq!(err.category(), ErrorCategory::CorruptData);

    let err = reader.read_next_particle().unwrap_err();
    assert_eq!(err.kind(), Some(PrtError::Poisoned));
}

#[test]
fn test_end_of_stream_is_checked_once() {
    let bytes = write_particles(&generate(4), StreamConfig::default());
    let mut reader = ParticleReader::open(Cursor::new(bytes)).unwrap();
    for _ in 0..4 {
        assert!(reader.read_next_particle().unwrap());
    }
    for _ in 0..3 {
        assert!(!reader.read_next_particle().unwrap());
    }
}

#[test]
fn test_truncated_stream_fails() {
    let bytes = write_particles(&generate(791), StreamConfig::default());
    let truncated = bytes[..bytes.len() - bytes.len() / 4].to_vec();

    let mut reader = ParticleReader::open(Cursor::new(truncated)).unwrap();
    let err = loop {
        match reader.read_next_particle() {
            Ok(true) => continue,
            Ok(false) => panic!("truncated stream reported a clean end"),
            Err(err) => break err,
        }
    };
    assert!(matches!(
        err.category(),
        ErrorCategory::CorruptData | ErrorCategory::Codec
    ));
    assert!(reader.particles_remaining() > 0);
}

/// Assemble a version 2 file by hand with padded table entries
///
/// `meta_trailer` and `channel_trailer` extend every entry's stride,
/// `header_padding` adds unknown bytes before the reserved value.
fn handcrafted(meta_trailer: usize, channel_trailer: usize, header_padding: usize) -> Vec<u8> {
    let metadata = [
        ("Author", MetaValue::from_text("Thinkbox")),
        ("Scale", MetaValue::from_values(&[2.5f32, 4.0])),
    ];

    let mut table = Vec::new();
    let meta_stride = MetadataEntryHeader::SIZE + meta_trailer;
    table.extend_from_slice(&TableHeader::new(metadata.len() as i32, meta_stride as i32).to_bytes());
    for (name, value) in &metadata {
        let (count, payload) = value.encode_payload().unwrap();
        let entry = MetadataEntryHeader {
            name: encode_name(name),
            type_tag: value.type_tag().unwrap(),
            count,
        };
        table.extend_from_slice(&entry.to_bytes());
        table.extend(std::iter::repeat(0xAB).take(meta_trailer));
        table.extend_from_slice(&payload);
    }
    table.extend(std::iter::repeat(0xCD).take(header_padding));

    let mut header = FileHeader::new(2, (FileHeader::SIZE + table.len()) as i32);
    header.particle_count = 2;

    let mut bytes = header.to_bytes().to_vec();
    bytes.extend_from_slice(&table);
    bytes.extend_from_slice(&4i32.to_le_bytes());

    let channels = [
        ("Position", PrimitiveType::Float32, 3, 0, TransformKind::Point),
        ("Age", PrimitiveType::Float16, 1, 12, TransformKind::Scalar),
    ];
    let channel_stride = ChannelEntry::SIZE + channel_trailer;
    bytes.extend_from_slice(&TableHeader::new(2, channel_stride as i32).to_bytes());
    for (name, ty, arity, offset, transform) in channels {
        let entry = ChannelEntry {
            name: encode_name(name),
            type_ordinal: ty.ordinal(),
            arity,
            offset,
            transform: transform.ordinal(),
        };
        bytes.extend_from_slice(&entry.to_bytes());
        bytes.extend(std::iter::repeat(0xEF).take(channel_trailer));
    }

    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    for (position, age) in [([1.0f32, 2.0, 3.0], 0.5f32), ([-4.0, 5.0, -6.0], 1.5)] {
        encoder.write_all(bytemuck::bytes_of(&position)).unwrap();
        encoder.write_all(bytemuck::bytes_of(&f16::from_f32(age))).unwrap();
    }
    bytes.extend_from_slice(&encoder.finish().unwrap());
    bytes
}

fn describe(bytes: Vec<u8>) -> (Vec<prt::Channel>, Vec<(String, MetaValue)>, Vec<[f32; 4]>) {
    let mut reader = ParticleReader::open(Cursor::new(bytes)).unwrap();
    let channels = reader.layout().channels().to_vec();
    let metadata = reader
        .metadata()
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    let position = reader.bind::<f32>("Position", 3).unwrap();
    let age = reader.bind::<f32>("Age", 1).unwrap();
    let mut values = Vec::new();
    while reader.read_next_particle().unwrap() {
        let p = reader.value(&position);
        values.push([p[0], p[1], p[2], reader.value(&age)[0]]);
    }
    (channels, metadata, values)
}

#[test]
fn test_unknown_trailing_fields_are_skipped() {
    let plain = describe(handcrafted(0, 0, 0));
    let padded = describe(handcrafted(12, 8, 20));
    assert_eq!(plain, padded);

    let (channels, metadata, values) = plain;
    assert_eq!(channels.len(), 2);
    assert_eq!(channels[1].transform, TransformKind::Scalar);
    assert_eq!(metadata[0].1.get_string(), Ok("Thinkbox"));
    assert_eq!(metadata[1].1.get::<f32>(), Ok(&[2.5f32, 4.0][..]));
    assert_eq!(values, [[1.0, 2.0, 3.0, 0.5], [-4.0, 5.0, -6.0, 1.5]]);
}

#[test]
fn test_invalid_channel_records() {
    // Rewrite the second channel's type ordinal, then its arity
    let base = handcrafted(0, 0, 0);
    let header_length = i32::from_le_bytes(base[8..12].try_into().unwrap()) as usize;
    let second = header_length + 4 + TableHeader::SIZE + ChannelEntry::SIZE;

    let mut bytes = base.clone();
    bytes[second + 32..second + 36].copy_from_slice(&42i32.to_le_bytes());
    let err = ParticleReader::open(Cursor::new(bytes)).err().unwrap();
    assert_eq!(err.kind(), Some(PrtError::CorruptChannel));

    let mut bytes = base.clone();
    bytes[second + 36..second + 40].copy_from_slice(&(-1i32).to_le_bytes());
    let err = ParticleReader::open(Cursor::new(bytes)).err().unwrap();
    assert_eq!(err.kind(), Some(PrtError::CorruptChannel));

    // Scalar transform on a three element channel
    let mut bytes = base;
    bytes[second + 36..second + 40].copy_from_slice(&3i32.to_le_bytes());
    let err = ParticleReader::open(Cursor::new(bytes)).err().unwrap();
    assert_eq!(err.kind(), Some(PrtError::CorruptChannel));
}

fn find(bytes: &[u8], needle: &[u8]) -> usize {
    bytes
        .windows(needle.len())
        .position(|window| window == needle)
        .unwrap()
}

#[test]
fn test_unusual_names_in_file() {
    let mut bytes = handcrafted(0, 0, 0);

    // Metadata: one name that is not UTF-8, one that is not an identifier
    let author = find(&bytes, b"Author\0");
    bytes[author] = 0xFF;
    let scale = find(&bytes, b"Scale\0");
    bytes[scale + 1] = b' ';
    // Channel name that is not UTF-8
    let age = find(&bytes, b"Age\0");
    bytes[age] = 0xFE;

    let mut reader = ParticleReader::open(Cursor::new(bytes)).unwrap();
    assert!(reader.metadata().is_empty());

    let names: Vec<&str> = reader
        .layout()
        .channels()
        .iter()
        .map(|c| c.name.as_str())
        .collect();
    assert_eq!(names, ["Position", "\u{FFFD}ge"]);

    let age = reader.bind::<f32>("\u{FFFD}ge", 1).unwrap();
    assert!(reader.read_next_particle().unwrap());
    assert_eq!(reader.value(&age), [0.5]);
}

#[test]
fn test_version_one_file() {
    let mut header = FileHeader::new(1, FileHeader::SIZE as i32);
    header.particle_count = 1;

    let mut bytes = header.to_bytes().to_vec();
    bytes.extend_from_slice(&4i32.to_le_bytes());
    bytes.extend_from_slice(&TableHeader::new(1, ChannelEntry::SIZE_V1 as i32).to_bytes());
    let entry = ChannelEntry {
        name: encode_name("Position"),
        type_ordinal: PrimitiveType::Float32.ordinal(),
        arity: 3,
        offset: 0,
        transform: 0,
    };
    bytes.extend_from_slice(&entry.to_bytes()[..ChannelEntry::SIZE_V1]);

    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(bytemuck::bytes_of(&[7.0f32, 8.0, 9.0]))
        .unwrap();
    bytes.extend_from_slice(&encoder.finish().unwrap());

    let mut reader = ParticleReader::open(Cursor::new(bytes)).unwrap();
    assert_eq!(reader.version(), 1);
    assert!(reader.metadata().is_empty());
    assert_eq!(
        reader.layout().get_channel("Position").unwrap().transform,
        TransformKind::Point
    );

    let position = reader.bind::<f64>("Position", 3).unwrap();
    assert!(reader.read_next_particle().unwrap());
    assert_eq!(reader.value(&position), [7.0, 8.0, 9.0]);
    assert!(!reader.read_next_particle().unwrap());
}

#[test]
fn test_files_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("particles_0020.prt");
    let written = generate(64);

    let mut builder = ParticleWriter::builder();
    let position = builder.bind::<f32>("Position", 3).unwrap();
    let color = builder
        .bind_as::<f32>("Color", 3, PrimitiveType::Float16)
        .unwrap();
    let density = builder.bind::<f64>("Density", 1).unwrap();
    let id = builder.bind::<u16>("ID", 1).unwrap();
    let mut writer = builder.create(&path).unwrap();
    for particle in &written {
        writer.set(&position, &particle.position);
        writer.set(&color, &particle.color);
        writer.set(&density, &[particle.density]);
        writer.set(&id, &[particle.id]);
        writer.write_next_particle().unwrap();
    }
    writer.close().unwrap();

    let mut reader = ParticleReader::open_file(&path).unwrap();
    assert_same_particles(&read_particles(&mut reader), &written);

    #[cfg(feature = "mmap")]
    {
        let mut reader = ParticleReader::open_mmap(&path).unwrap();
        assert_same_particles(&read_particles(&mut reader), &written);
    }
}

#[test]
fn test_dropped_writer_is_finalized() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dropped.prt");
    let written = generate(12);

    {
        let mut builder = ParticleWriter::builder();
        let position = builder.bind::<f32>("Position", 3).unwrap();
        let mut writer = builder.create(&path).unwrap();
        for particle in &written {
            writer.set(&position, &particle.position);
            writer.write_next_particle().unwrap();
        }
    }

    let mut reader = ParticleReader::open_file(&path).unwrap();
    assert_eq!(reader.particle_count(), 12);
    assert!(reader.bound_box().is_some());
    let position = reader.bind::<f32>("Position", 3).unwrap();
    let mut count = 0;
    while reader.read_next_particle().unwrap() {
        assert_eq!(reader.value(&position), written[count].position);
        count += 1;
    }
    assert_eq!(count, 12);
}
