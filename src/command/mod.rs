pub mod demux;
pub mod stats;
pub mod threadcount;

pub use demux::demultiplex;
pub use demux::demultiplex_with_observer;
pub use demux::DemuxCMD;
pub use demux::DemuxObserver;
pub use demux::DemuxParams;
pub use demux::LogObserver;

pub use stats::BarcodeHistogram;
pub use stats::FileStats;
pub use stats::RunSummary;

pub use threadcount::determine_thread_count;
