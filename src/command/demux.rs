// This software is released under the MIT license.
// See file LICENSE for full license details.
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Args;
use crossbeam::channel::Sender;
use itertools::Itertools;
use log::{debug, info, warn};
use rayon::prelude::*;

use super::stats::{BarcodeHistogram, FileStats, ReadOutcome, RunSummary};
use super::threadcount::determine_thread_count;
use crate::barcode::{
    trimmed_record, AmbiguityPolicy, BarcodeLocator, BarcodeWhitelist, LocateContext, ReadClass,
    StrandPolicy, DEFAULT_ADAPTER_SLACK,
};
use crate::fileformat::{append_fastq_record, list_fastq_files, open_fastq, FastqSink, ParsedRecord};
use crate::runtime::Error;

pub const DEFAULT_CHUNK_SIZE: usize = 10_000;
const PROGRESS_INTERVAL: u64 = 100_000;

#[derive(Args)]
pub struct DemuxCMD {
    // Directory with the input FASTQ files (.fq, .fastq, optionally .gz)
    #[arg(value_name = "FASTQ_DIR", value_parser)]
    pub path_fastq_dir: PathBuf,

    // Summary statistics, overwritten
    #[arg(value_name = "STATS_FILE", value_parser)]
    pub path_stats: PathBuf,

    // Demultiplexed reads. Gzip-compressed if the name ends with .gz
    #[arg(value_name = "OUT_FASTQ", value_parser)]
    pub path_out_fastq: PathBuf,

    // CSV with the known barcodes in the first column
    #[arg(value_name = "REF_CSV", value_parser)]
    pub path_ref_csv: PathBuf,

    // Maximum edit distance between read and barcode
    #[arg(value_name = "MAX_DIST", value_parser = clap::value_parser!(usize))]
    pub max_dist: usize,

    // Number of UMI bases following the barcode
    #[arg(value_name = "UMI_LEN", value_parser = clap::value_parser!(usize))]
    pub umi_len: usize,

    // Optional: bases of adapter residue tolerated before the barcode
    #[arg(long = "adapter-slack", default_value_t = DEFAULT_ADAPTER_SLACK)]
    pub adapter_slack: usize,

    // Optional: also search the reverse complement of each read
    #[arg(long = "strand", value_enum, default_value_t = StrandPolicy::Forward)]
    pub strand: StrandPolicy,

    // Optional: on ties, keep the barcode listed first instead of discarding the read
    #[arg(long = "first-hit")]
    pub first_hit: bool,

    // Optional: align every barcode, without the seed prefilter
    #[arg(long = "no-seed-index")]
    pub no_seed_index: bool,

    // Optional: number of reads handed to the workers at a time
    #[arg(long = "chunk-size", default_value_t = DEFAULT_CHUNK_SIZE)]
    pub chunk_size: usize,

    // Optional: write the number of reads per barcode here, as TSV
    #[arg(long = "barcode-counts", value_parser)]
    pub path_barcode_counts: Option<PathBuf>,

    //Thread settings
    #[arg(short = '@', value_parser = clap::value_parser!(usize))]
    num_threads_total: Option<usize>,
}
impl DemuxCMD {
    /// Run the commandline option.
    /// This one finds the cell barcode and UMI of every read, and writes the trimmed reads
    pub fn try_execute(&mut self) -> anyhow::Result<()> {
        let threads = determine_thread_count(self.num_threads_total)?;
        info!("Using threads: {}", threads);

        let mut params = DemuxParams::new(
            &self.path_fastq_dir,
            &self.path_stats,
            &self.path_out_fastq,
            &self.path_ref_csv,
            self.max_dist,
            self.umi_len,
        );
        params.adapter_slack = self.adapter_slack;
        params.strand = self.strand;
        params.ambiguity = if self.first_hit {
            AmbiguityPolicy::FirstHit
        } else {
            AmbiguityPolicy::Report
        };
        params.use_seed_index = !self.no_seed_index;
        params.threads = threads;
        params.chunk_size = self.chunk_size;
        params.path_barcode_counts = self.path_barcode_counts.clone();

        let summary = demultiplex(&params)?;
        info!(
            "Demux has finished successfully: {} of {} reads assigned to a barcode",
            summary.total.matched, summary.total.total_reads
        );
        Ok(())
    }
}

///////////////////////////////
/// Settings of one demultiplexing run
#[derive(Clone, Debug)]
pub struct DemuxParams {
    pub path_fastq_dir: PathBuf,
    pub path_stats: PathBuf,
    pub path_out_fastq: PathBuf,
    pub path_ref_csv: PathBuf,
    pub max_dist: usize,
    pub umi_len: usize,

    pub adapter_slack: usize,
    pub strand: StrandPolicy,
    pub ambiguity: AmbiguityPolicy,
    pub use_seed_index: bool,
    pub threads: usize,
    pub chunk_size: usize,
    pub path_barcode_counts: Option<PathBuf>,
}

impl DemuxParams {
    pub fn new(
        path_fastq_dir: impl Into<PathBuf>,
        path_stats: impl Into<PathBuf>,
        path_out_fastq: impl Into<PathBuf>,
        path_ref_csv: impl Into<PathBuf>,
        max_dist: usize,
        umi_len: usize,
    ) -> DemuxParams {
        DemuxParams {
            path_fastq_dir: path_fastq_dir.into(),
            path_stats: path_stats.into(),
            path_out_fastq: path_out_fastq.into(),
            path_ref_csv: path_ref_csv.into(),
            max_dist,
            umi_len,
            adapter_slack: DEFAULT_ADAPTER_SLACK,
            strand: StrandPolicy::default(),
            ambiguity: AmbiguityPolicy::default(),
            use_seed_index: true,
            threads: determine_thread_count(None).unwrap_or(1),
            chunk_size: DEFAULT_CHUNK_SIZE,
            path_barcode_counts: None,
        }
    }

    ///////////////////////////////
    /// Check the settings and the input paths. Returns the input files in processing order
    pub fn validate(&self) -> anyhow::Result<Vec<PathBuf>> {
        if self.umi_len < 1 {
            return Err(Error::invalid_parameter("UMI_LEN", "must be at least 1").into());
        }
        if self.threads < 1 {
            return Err(Error::invalid_parameter("threads", "must be at least 1").into());
        }
        if self.chunk_size < 1 {
            return Err(Error::invalid_parameter("chunk size", "must be at least 1").into());
        }
        if !self.path_ref_csv.is_file() {
            return Err(Error::file_not_found(&self.path_ref_csv).into());
        }

        let files = list_fastq_files(&self.path_fastq_dir)?;
        if files.is_empty() {
            return Err(Error::file_not_valid(&self.path_fastq_dir, Some("no FASTQ files in directory")).into());
        }
        Ok(files)
    }
}

///////////////////////////////
/// Callbacks reporting the progress of a run. All methods are called from the calling thread
pub trait DemuxObserver {
    fn file_started(&mut self, _path: &Path, _file_index: usize, _num_files: usize) {}

    /// Number of reads of the current file processed so far
    fn reads_processed(&mut self, _path: &Path, _num_reads: u64) {}

    fn file_finished(&mut self, _stats: &FileStats) {}
}

///////////////////////////////
/// Reports progress through the log
#[derive(Debug, Default)]
pub struct LogObserver {
    next_report: u64,
}

impl DemuxObserver for LogObserver {
    fn file_started(&mut self, path: &Path, file_index: usize, num_files: usize) {
        info!("Processing file {}/{}: {}", file_index + 1, num_files, path.display());
        self.next_report = PROGRESS_INTERVAL;
    }

    fn reads_processed(&mut self, path: &Path, num_reads: u64) {
        if num_reads >= self.next_report {
            info!("#reads processed in {}: {}", path.display(), num_reads);
            self.next_report = (num_reads / PROGRESS_INTERVAL + 1) * PROGRESS_INTERVAL;
        }
    }

    fn file_finished(&mut self, stats: &FileStats) {
        info!(
            "Finished {}: {} reads, {} matched, {} unmatched, {} ambiguous, {} too short, {} malformed",
            stats.name,
            stats.total_reads,
            stats.matched,
            stats.unmatched,
            stats.ambiguous,
            stats.too_short,
            stats.malformed
        );
    }
}

///////////////////////////////
/// Demultiplex all FASTQ files of a directory, logging progress
pub fn demultiplex(params: &DemuxParams) -> anyhow::Result<RunSummary> {
    demultiplex_with_observer(params, &mut LogObserver::default())
}

///////////////////////////////
/// Demultiplex all FASTQ files of a directory.
///
/// Files are processed in order of file name and reads in file order; output and statistics
/// do not depend on the number of threads. The stats file is written last, only if everything
/// else succeeded
pub fn demultiplex_with_observer<O: DemuxObserver>(
    params: &DemuxParams,
    observer: &mut O,
) -> anyhow::Result<RunSummary> {
    let files = params.validate()?;
    debug!(
        "Input files: {}",
        files.iter().map(|p| p.display()).join(", ")
    );

    let mut whitelist = BarcodeWhitelist::from_csv(&params.path_ref_csv, params.max_dist)?
        .with_ambiguity(params.ambiguity);
    if !params.use_seed_index {
        whitelist = whitelist.without_seed_index();
    }
    if params.max_dist >= whitelist.bc_len() {
        warn!(
            "Edit distance {} is not smaller than the barcode length {}; most reads will be ambiguous",
            params.max_dist,
            whitelist.bc_len()
        );
    }

    let locator = BarcodeLocator::new(&whitelist, params.umi_len, params.adapter_slack, params.strand);
    debug!("Searching the first {} bases of each read", locator.window_len());

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(params.threads)
        .build()
        .context("Could not create thread pool")?;

    let mut sink = FastqSink::create(&params.path_out_fastq)?;
    let mut hist = BarcodeHistogram::new(whitelist.len());
    let mut list_stats = Vec::with_capacity(files.len());
    for (file_index, path) in files.iter().enumerate() {
        observer.file_started(path, file_index, files.len());
        let stats = process_file(path, &locator, &pool, params, &mut sink, &mut hist, observer)?;
        observer.file_finished(&stats);
        list_stats.push(stats);
    }
    sink.finish()
        .with_context(|| format!("Could not finish output file {}", params.path_out_fastq.display()))?;

    if let Some(path_counts) = &params.path_barcode_counts {
        hist.write(path_counts, &whitelist)?;
    }

    let summary = RunSummary::new(list_stats, params.max_dist);
    summary.write_file(&params.path_stats)?;
    Ok(summary)
}

//Result of processing one record on a worker
enum RecordOutcome {
    Emitted {
        barcode_idx: u32,
        edit_distance: u32,
        formatted: Vec<u8>,
    },
    Dropped(ReadOutcome),
}

fn process_file<O: DemuxObserver>(
    path: &Path,
    locator: &BarcodeLocator,
    pool: &rayon::ThreadPool,
    params: &DemuxParams,
    sink: &mut FastqSink,
    hist: &mut BarcodeHistogram,
    observer: &mut O,
) -> anyhow::Result<FileStats> {
    let name = path
        .file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
    let mut stats = FileStats::new(name, params.max_dist);

    std::thread::scope(|s| -> anyhow::Result<()> {
        //Limit how many chunks can be in the pipe
        let (tx, rx) = crossbeam::channel::bounded::<anyhow::Result<Vec<ParsedRecord>>>(4);
        let chunk_size = params.chunk_size;
        s.spawn(move || read_all_chunks(path, chunk_size, tx));

        let mut buf: Vec<u8> = Vec::new();
        for chunk in rx.iter() {
            let chunk = chunk?;

            let outcomes: Vec<RecordOutcome> = pool.install(|| {
                chunk
                    .par_iter()
                    .map_init(LocateContext::new, |ctx, rec| process_record(rec, locator, ctx))
                    .collect()
            });

            buf.clear();
            for (rec, outcome) in chunk.iter().zip(outcomes) {
                match outcome {
                    RecordOutcome::Emitted {
                        barcode_idx,
                        edit_distance,
                        formatted,
                    } => {
                        buf.extend_from_slice(&formatted);
                        hist.inc(barcode_idx);
                        stats.add_outcome(ReadOutcome::Matched { edit_distance });
                    }
                    RecordOutcome::Dropped(outcome) => {
                        if let ParsedRecord::Malformed { line, reason } = rec {
                            debug!("Skipping malformed record at {}:{}: {:?}", path.display(), line, reason);
                        }
                        stats.add_outcome(outcome);
                    }
                }
            }
            sink.write_all(&buf)
                .with_context(|| format!("Could not write to {}", params.path_out_fastq.display()))?;
            observer.reads_processed(path, stats.total_reads);
        }
        Ok(())
    })?;

    if stats.malformed > 0 {
        warn!("{} malformed records skipped in {}", stats.malformed, path.display());
    }
    Ok(stats)
}

///////////////////////////////
/// Classify one record and, if it matched, format the rewritten record
fn process_record(rec: &ParsedRecord, locator: &BarcodeLocator, ctx: &mut LocateContext) -> RecordOutcome {
    let record = match rec {
        ParsedRecord::Valid(record) => record,
        ParsedRecord::Malformed { .. } => return RecordOutcome::Dropped(ReadOutcome::Malformed),
    };

    match locator.classify(&record.seq, ctx) {
        ReadClass::Matched(m) => {
            let barcode = locator.whitelist().barcode(m.barcode_idx);
            let out = trimmed_record(record, &m, barcode);
            let mut formatted = Vec::new();
            append_fastq_record(&mut formatted, &out);
            RecordOutcome::Emitted {
                barcode_idx: m.barcode_idx,
                edit_distance: m.edit_distance,
                formatted,
            }
        }
        ReadClass::TooShort => RecordOutcome::Dropped(ReadOutcome::TooShort),
        ReadClass::NoMatch => RecordOutcome::Dropped(ReadOutcome::Unmatched),
        ReadClass::Ambiguous => RecordOutcome::Dropped(ReadOutcome::Ambiguous),
    }
}

///////////////////////////////
/// Reader thread: parse a file and send its records in chunks. Stops early if the receiver is gone
fn read_all_chunks(path: &Path, chunk_size: usize, tx: Sender<anyhow::Result<Vec<ParsedRecord>>>) {
    let parser = match open_fastq(path) {
        Ok(parser) => parser,
        Err(e) => {
            let _ = tx.send(Err(e));
            return;
        }
    };

    let mut chunk = Vec::with_capacity(chunk_size);
    for rec in parser {
        match rec {
            Ok(rec) => {
                chunk.push(rec);
                if chunk.len() == chunk_size {
                    let full = std::mem::replace(&mut chunk, Vec::with_capacity(chunk_size));
                    if tx.send(Ok(full)).is_err() {
                        return;
                    }
                }
            }
            //Records are checked by the parser, so this is the file itself failing to read or decompress
            Err(e) => {
                let err = Error::file_not_valid(path, Some(format!("could not read: {}", e)));
                let _ = tx.send(Err(err.into()));
                return;
            }
        }
    }
    if !chunk.is_empty() {
        let _ = tx.send(Ok(chunk));
    }
}
