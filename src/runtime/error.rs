use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("File at {:?} not found.", path)]
    FileNotFound { path: PathBuf },

    #[error("File at {:?} is invalid{}.", path, Error::format_msg_as_detail(msg))]
    FileNotValid { path: PathBuf, msg: Option<String> },

    #[error("Invalid value for parameter '{}': {}", name, msg)]
    InvalidParameter { name: String, msg: String },

    #[error("Barcode reference {:?} contains no barcodes.", path)]
    EmptyReference { path: PathBuf },

    #[error(
        "Barcode reference {:?}, line {}: '{}' is not a barcode over A, C, G, T",
        path,
        line,
        barcode
    )]
    InvalidBarcode {
        path: PathBuf,
        line: u64,
        barcode: String,
    },

    #[error(
        "Barcode reference {:?}, line {}: barcode has length {}, expected {} like the barcodes before it",
        path,
        line,
        found,
        expected
    )]
    InconsistentBarcodeLength {
        path: PathBuf,
        line: u64,
        expected: usize,
        found: usize,
    },
}

impl Error {
    #[cold]
    pub fn file_not_found<P: AsRef<Path>>(path: P) -> Self {
        Error::FileNotFound {
            path: path.as_ref().to_path_buf(),
        }
    }

    #[cold]
    pub fn file_not_valid<P: AsRef<Path>, M: Into<String>>(path: P, msg: Option<M>) -> Self {
        Error::FileNotValid {
            path: path.as_ref().to_path_buf(),
            msg: msg.map(|m| m.into()),
        }
    }

    #[cold]
    pub fn invalid_parameter<N: Into<String>, M: Into<String>>(name: N, msg: M) -> Self {
        Error::InvalidParameter {
            name: name.into(),
            msg: msg.into(),
        }
    }

    #[cold]
    pub fn empty_reference<P: AsRef<Path>>(path: P) -> Self {
        Error::EmptyReference {
            path: path.as_ref().to_path_buf(),
        }
    }

    #[cold]
    pub fn invalid_barcode<P: AsRef<Path>, B: Into<String>>(path: P, line: u64, barcode: B) -> Self {
        Error::InvalidBarcode {
            path: path.as_ref().to_path_buf(),
            line,
            barcode: barcode.into(),
        }
    }

    #[cold]
    pub fn inconsistent_barcode_length<P: AsRef<Path>>(
        path: P,
        line: u64,
        expected: usize,
        found: usize,
    ) -> Self {
        Error::InconsistentBarcodeLength {
            path: path.as_ref().to_path_buf(),
            line,
            expected,
            found,
        }
    }

    pub fn format_msg_as_detail(msg: &Option<String>) -> String {
        match msg {
            Some(m) => format!(" ({})", m),
            None => String::new(),
        }
    }
}
