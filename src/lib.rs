pub mod barcode;
pub mod command;
pub mod fileformat;
pub mod runtime;

pub use command::demultiplex;
pub use command::demultiplex_with_observer;
pub use command::DemuxObserver;
pub use command::DemuxParams;
pub use command::RunSummary;
