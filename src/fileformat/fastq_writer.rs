use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::Context;
use flate2::write::GzEncoder;
use flate2::Compression;
use log::debug;

use super::fastq::FastqRecord;

///////////////////////////////
/// Output FASTQ file, gzip-compressed when the file name ends with .gz
pub enum FastqSink {
    Plain(BufWriter<File>),
    Gzip(GzEncoder<BufWriter<File>>),
}

impl FastqSink {
    pub fn create(path: &Path) -> anyhow::Result<FastqSink> {
        let file = File::create(path)
            .with_context(|| format!("Could not create output file {}", path.display()))?;
        let writer = BufWriter::with_capacity(1 << 20, file);

        let gzip = path.to_string_lossy().ends_with(".gz");
        debug!("Writing reads to {} (gzip: {})", path.display(), gzip);
        if gzip {
            Ok(FastqSink::Gzip(GzEncoder::new(writer, Compression::default())))
        } else {
            Ok(FastqSink::Plain(writer))
        }
    }

    ///////////////////////////////
    /// Flush everything, complete the gzip stream, and sync the file to disk.
    /// Only after this has returned Ok is the output complete
    pub fn finish(self) -> anyhow::Result<()> {
        let writer = match self {
            FastqSink::Plain(writer) => writer,
            FastqSink::Gzip(encoder) => encoder.finish().context("Could not complete gzip stream")?,
        };
        let file = writer
            .into_inner()
            .map_err(|e| e.into_error())
            .context("Could not flush output file")?;
        file.sync_all().context("Could not sync output file")?;
        Ok(())
    }
}

impl Write for FastqSink {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match self {
            FastqSink::Plain(w) => w.write(buf),
            FastqSink::Gzip(w) => w.write(buf),
        }
    }

    fn write_all(&mut self, buf: &[u8]) -> std::io::Result<()> {
        match self {
            FastqSink::Plain(w) => w.write_all(buf),
            FastqSink::Gzip(w) => w.write_all(buf),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match self {
            FastqSink::Plain(w) => w.flush(),
            FastqSink::Gzip(w) => w.flush(),
        }
    }
}

////////// Append one FASTQ record to a buffer
pub fn append_fastq_record(out: &mut Vec<u8>, record: &FastqRecord) {
    out.reserve(record.id.len() + record.seq.len() + record.qual.len() + 6);
    out.push(b'@');
    out.extend_from_slice(&record.id);
    out.push(b'\n');
    out.extend_from_slice(&record.seq);
    out.extend_from_slice(b"\n+\n");
    out.extend_from_slice(&record.qual);
    out.push(b'\n');
}
