// This software is released under the MIT license.
// See file LICENSE for full license details.
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::Context;
use serde::Serialize;

use crate::barcode::BarcodeWhitelist;

///////////////////////////////
/// What happened to one input record
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReadOutcome {
    Matched { edit_distance: u32 },
    Unmatched,
    Ambiguous,
    TooShort,
    Malformed,
}

///////////////////////////////
/// Counters for one input file, or the total over all files
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileStats {
    pub name: String,
    pub total_reads: u64,
    pub matched: u64,
    pub unmatched: u64,
    pub ambiguous: u64,
    pub too_short: u64,
    pub malformed: u64,
    /// Matched reads per edit distance, 0..=max_dist
    pub dist_hist: Vec<u64>,
}

impl FileStats {
    pub fn new(name: impl Into<String>, max_dist: usize) -> FileStats {
        FileStats {
            name: name.into(),
            total_reads: 0,
            matched: 0,
            unmatched: 0,
            ambiguous: 0,
            too_short: 0,
            malformed: 0,
            dist_hist: vec![0; max_dist + 1],
        }
    }

    pub fn add_outcome(&mut self, outcome: ReadOutcome) {
        self.total_reads += 1;
        match outcome {
            ReadOutcome::Matched { edit_distance } => {
                self.matched += 1;
                self.dist_hist[edit_distance as usize] += 1;
            }
            ReadOutcome::Unmatched => self.unmatched += 1,
            ReadOutcome::Ambiguous => self.ambiguous += 1,
            ReadOutcome::TooShort => self.too_short += 1,
            ReadOutcome::Malformed => self.malformed += 1,
        }
    }

    ///////////////////////////////
    /// Add the counters of another file into this one
    pub fn add(&mut self, other: &FileStats) {
        self.total_reads += other.total_reads;
        self.matched += other.matched;
        self.unmatched += other.unmatched;
        self.ambiguous += other.ambiguous;
        self.too_short += other.too_short;
        self.malformed += other.malformed;
        for (a, b) in self.dist_hist.iter_mut().zip(other.dist_hist.iter()) {
            *a += b;
        }
    }

    pub fn write_block<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        writeln!(out, "=== {} ===", self.name)?;
        writeln!(out, "total_reads: {}", self.total_reads)?;
        writeln!(out, "matched: {}", self.matched)?;
        writeln!(out, "unmatched: {}", self.unmatched)?;
        writeln!(out, "ambiguous: {}", self.ambiguous)?;
        writeln!(out, "too_short: {}", self.too_short)?;
        writeln!(out, "malformed: {}", self.malformed)?;
        for (k, n) in self.dist_hist.iter().enumerate() {
            writeln!(out, "dist{}: {}", k, n)?;
        }
        Ok(())
    }
}

///////////////////////////////
/// Statistics of a complete run: one entry per input file, in processing order, plus the total
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunSummary {
    pub files: Vec<FileStats>,
    pub total: FileStats,
}

impl RunSummary {
    pub fn new(files: Vec<FileStats>, max_dist: usize) -> RunSummary {
        let mut total = FileStats::new("TOTAL", max_dist);
        for f in &files {
            total.add(f);
        }
        RunSummary { files, total }
    }

    ///////////////////////////////
    /// Write the human-readable summary, replacing any earlier file
    pub fn write_file(&self, path: &Path) -> anyhow::Result<()> {
        let file = File::create(path)
            .with_context(|| format!("Could not create stats file {}", path.display()))?;
        let mut out = BufWriter::new(file);
        for block in self.files.iter().chain(std::iter::once(&self.total)) {
            block
                .write_block(&mut out)
                .with_context(|| format!("Could not write stats file {}", path.display()))?;
        }
        let file = out
            .into_inner()
            .map_err(|e| e.into_error())
            .with_context(|| format!("Could not write stats file {}", path.display()))?;
        file.sync_all()?;
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct BarcodeCountRow<'a> {
    barcode: &'a str,
    count: u64,
}

///////////////////////////////
/// Number of emitted reads per reference barcode
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BarcodeHistogram {
    counts: Vec<u64>,
}

impl BarcodeHistogram {
    pub fn new(num_barcodes: usize) -> BarcodeHistogram {
        BarcodeHistogram {
            counts: vec![0; num_barcodes],
        }
    }

    pub fn inc(&mut self, barcode_idx: u32) {
        self.counts[barcode_idx as usize] += 1;
    }

    pub fn get(&self, barcode_idx: u32) -> u64 {
        self.counts[barcode_idx as usize]
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    ///////////////////////////////
    /// Write barcodes with at least one read as TSV, in reference order
    pub fn write(&self, path: &Path, whitelist: &BarcodeWhitelist) -> anyhow::Result<()> {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .from_path(path)
            .with_context(|| format!("Could not open barcode count file {}", path.display()))?;

        for (bc, &count) in whitelist.barcodes().iter().zip(self.counts.iter()) {
            if count == 0 {
                continue;
            }
            //Barcodes are validated as ACGT on load
            let barcode = std::str::from_utf8(bc).context("Barcode is not valid text")?;
            writer.serialize(BarcodeCountRow { barcode, count })?;
        }
        writer
            .flush()
            .with_context(|| format!("Could not write barcode count file {}", path.display()))?;
        Ok(())
    }
}
