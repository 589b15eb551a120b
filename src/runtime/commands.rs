use std::fmt;

use clap::Subcommand;

use crate::command;

///////////////////////////////
/// Possible subcommands to parse
#[derive(Subcommand)]
pub enum Commands {
    /// Assign reads to known cell barcodes and write them with barcode and UMI in the read name
    Demux(command::DemuxCMD),
}

impl fmt::Debug for Commands {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cmd = match self {
            Commands::Demux(_) => "Demux",
        };
        write!(f, "{}", cmd)
    }
}
