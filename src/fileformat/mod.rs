pub mod fastq;
pub mod fastq_writer;

pub use fastq::list_fastq_files;
pub use fastq::open_fastq;
pub use fastq::FastqRecord;
pub use fastq::ParsedRecord;

pub use fastq_writer::append_fastq_record;
pub use fastq_writer::FastqSink;
