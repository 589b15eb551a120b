// This software is released under the MIT license.
// See file LICENSE for full license details.
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};

use anyhow::Context;
use log::{debug, trace};
use walkdir::WalkDir;

use crate::runtime::Error;

const U8_CHAR_RECORD: u8 = b'@';
const U8_CHAR_SEPARATOR: u8 = b'+';

///////////////////////////////
/// One FASTQ read. The id is the header line without the leading '@'
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FastqRecord {
    pub id: Vec<u8>,
    pub seq: Vec<u8>,
    pub qual: Vec<u8>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MalformedReason {
    MissingHeader,
    MissingSeparator,
    InvalidBase,
    LengthMismatch,
    Truncated,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParsedRecord {
    Valid(FastqRecord),
    Malformed { line: u64, reason: MalformedReason },
}

pub type FastqFileParser = FastqParser<BufReader<Box<dyn Read>>>;

///////////////////////////////
/// Check if a file name follows the FASTQ naming convention
pub fn is_fastq_filename(name: &str) -> bool {
    name.ends_with(".fastq.gz")
        | name.ends_with(".fq.gz")
        | name.ends_with(".fastq")
        | name.ends_with(".fq")
}

///////////////////////////////
/// List the FASTQ files directly inside a directory, in lexicographic order of file name
pub fn list_fastq_files(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    if !dir.exists() {
        return Err(Error::file_not_found(dir).into());
    }
    if !dir.is_dir() {
        return Err(Error::file_not_valid(dir, Some("expected a directory of FASTQ files")).into());
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name()
    {
        let entry = entry.with_context(|| format!("Could not list directory {}", dir.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        if is_fastq_filename(&entry.file_name().to_string_lossy()) {
            files.push(entry.into_path());
        } else {
            debug!("Ignoring non-FASTQ file {}", entry.path().display());
        }
    }
    Ok(files)
}

///////////////////////////////
/// Open a FASTQ file, decompressing it if needed
pub fn open_fastq(path: &Path) -> anyhow::Result<FastqFileParser> {
    let file = File::open(path).with_context(|| format!("Could not open fastq file {}", path.display()))?;
    let (reader, compression) = match niffler::get_reader(Box::new(file)) {
        Ok(opened) => opened,
        Err(niffler::Error::FileTooShort) => {
            //Too few bytes to sniff a format; at most a broken record, so read as plain text
            let file = File::open(path)
                .with_context(|| format!("Could not open fastq file {}", path.display()))?;
            (Box::new(file) as Box<dyn Read>, niffler::compression::Format::No)
        }
        Err(e) => {
            return Err(e).with_context(|| format!("Could not open fastq file {}", path.display()))
        }
    };

    debug!("Opened file {} with compression {:?}", path.display(), compression);
    Ok(FastqParser::new(BufReader::with_capacity(1 << 20, reader)))
}

///////////////////////////////
/// Four-line FASTQ parser that reports broken records instead of failing on them.
///
/// Each record consumes exactly four lines; blank lines between records are skipped. Only I/O
/// errors are returned as errors.
pub struct FastqParser<R: BufRead> {
    reader: R,
    line: u64,
    lines: [Vec<u8>; 4],
}

impl<R: BufRead> FastqParser<R> {
    pub fn new(reader: R) -> FastqParser<R> {
        FastqParser {
            reader,
            line: 0,
            lines: Default::default(),
        }
    }

    ///////////////////////////////
    /// Read one line into the given slot, without line terminator. Returns false at end of file
    fn read_line(&mut self, slot: usize) -> std::io::Result<bool> {
        let buf = &mut self.lines[slot];
        buf.clear();
        if self.reader.read_until(b'\n', buf)? == 0 {
            return Ok(false);
        }
        self.line += 1;
        if buf.last() == Some(&b'\n') {
            buf.pop();
        }
        if buf.last() == Some(&b'\r') {
            buf.pop();
        }
        Ok(true)
    }

    fn next_record(&mut self) -> std::io::Result<Option<ParsedRecord>> {
        //Header, skipping blank lines
        loop {
            if !self.read_line(0)? {
                return Ok(None);
            }
            if !self.lines[0].is_empty() {
                break;
            }
        }
        let line = self.line;

        for slot in 1..4 {
            if !self.read_line(slot)? {
                return Ok(Some(malformed(line, MalformedReason::Truncated)));
            }
        }

        let [header, seq, sep, qual] = &self.lines;
        if header.first() != Some(&U8_CHAR_RECORD) {
            return Ok(Some(malformed(line, MalformedReason::MissingHeader)));
        }
        if sep.first() != Some(&U8_CHAR_SEPARATOR) {
            return Ok(Some(malformed(line, MalformedReason::MissingSeparator)));
        }
        if seq.len() != qual.len() {
            return Ok(Some(malformed(line, MalformedReason::LengthMismatch)));
        }
        if !seq.iter().all(|c| matches!(c, b'A' | b'C' | b'G' | b'T' | b'N')) {
            return Ok(Some(malformed(line, MalformedReason::InvalidBase)));
        }

        Ok(Some(ParsedRecord::Valid(FastqRecord {
            id: header[1..].to_vec(),
            seq: seq.clone(),
            qual: qual.clone(),
        })))
    }
}

fn malformed(line: u64, reason: MalformedReason) -> ParsedRecord {
    trace!("Malformed FASTQ record at line {}: {:?}", line, reason);
    ParsedRecord::Malformed { line, reason }
}

impl<R: BufRead> Iterator for FastqParser<R> {
    type Item = std::io::Result<ParsedRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_record().transpose()
    }
}
