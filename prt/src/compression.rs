//! Record-at-a-time compression adapters
//!
//! The particle section of a PRT file is a single zlib stream. These
//! adapters put a fixed staging buffer between the stream and storage and
//! move exactly one record per call.

use std::io::{self, BufReader, BufWriter, Read, Write};

use flate2::bufread::ZlibDecoder;
use flate2::write::ZlibEncoder;
use prt_core::PrtError;
use tracing::trace;

use crate::config::StreamConfig;
use crate::error::{Error, Result};

/// Compressing side: records in, zlib bytes out to the sink
pub(crate) struct RecordSink<W: Write> {
    encoder: ZlibEncoder<BufWriter<W>>,
}

impl<W: Write> RecordSink<W> {
    pub fn new(sink: W, config: &StreamConfig) -> Self {
        let staged = BufWriter::with_capacity(config.buffer_size, sink);
        Self {
            encoder: ZlibEncoder::new(staged, config.compression),
        }
    }

    /// Feed one record into the compressor
    pub fn push_record(&mut self, record: &[u8]) -> Result<()> {
        self.encoder.write_all(record)?;
        Ok(())
    }

    /// Drive the compressor to the end of the stream and flush every staged
    /// byte, returning the sink positioned after the stream
    pub fn finish(self) -> Result<W> {
        let mut encoder = self.encoder;
        encoder.try_finish()?;
        let (total_in, total_out) = (encoder.total_in(), encoder.total_out());
        let staged = encoder.finish()?;
        let mut sink = staged.into_inner().map_err(|e| Error::Io(e.into_error()))?;
        sink.flush()?;
        trace!(total_in, total_out, "Compressed particle stream finished");
        Ok(sink)
    }
}

/// Decompressing side: zlib bytes in from the source, records out
pub(crate) struct RecordSource<R: Read> {
    decoder: ZlibDecoder<BufReader<R>>,
}

impl<R: Read> RecordSource<R> {
    pub fn new(source: R, config: &StreamConfig) -> Self {
        let staged = BufReader::with_capacity(config.buffer_size, source);
        Self {
            decoder: ZlibDecoder::new(staged),
        }
    }

    /// Fill `record` with the next decompressed record
    ///
    /// Running out of compressed data part way is `CorruptStream`; the
    /// caller decides whether another record was due at all.
    pub fn next_record(&mut self, record: &mut [u8]) -> Result<()> {
        self.decoder.read_exact(record).map_err(read_error)
    }

    /// Check that the stream holds no further decompressed bytes
    ///
    /// Leftover data means the header declared fewer records than the
    /// stream carries, which is `CorruptStream`.
    pub fn expect_end(&mut self) -> Result<()> {
        let mut byte = [0u8; 1];
        loop {
            match self.decoder.read(&mut byte) {
                Ok(0) => return Ok(()),
                Ok(_) => return Err(PrtError::CorruptStream.into()),
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(read_error(err)),
            }
        }
    }

    /// Compressed bytes consumed so far
    pub fn total_in(&self) -> u64 {
        self.decoder.total_in()
    }

    pub fn into_inner(self) -> R {
        self.decoder.into_inner().into_inner()
    }
}

fn read_error(err: io::Error) -> Error {
    match err.kind() {
        io::ErrorKind::UnexpectedEof => Error::Prt(PrtError::CorruptStream),
        io::ErrorKind::InvalidInput | io::ErrorKind::InvalidData => Error::Codec(err),
        _ => Error::Io(err),
    }
}
