use bio::alphabets::dna::revcomp;

use super::locator::{BarcodeMatch, Strand};
use crate::fileformat::FastqRecord;

///////////////////////////////
/// Name of a demultiplexed read: {barcode}#{umi}_{original id}
pub fn make_readname(barcode: &[u8], umi: &[u8], original_id: &[u8]) -> Vec<u8> {
    let mut name = Vec::with_capacity(barcode.len() + umi.len() + original_id.len() + 2);
    name.extend_from_slice(barcode);
    name.push(b'#');
    name.extend_from_slice(umi);
    name.push(b'_');
    name.extend_from_slice(original_id);
    name
}

///////////////////////////////
/// Rewrite a matched read: barcode and UMI go into the name, and everything up to the end of
/// the UMI is removed from sequence and quality.
///
/// Reverse-strand matches are emitted reverse-complemented, so the output always reads from the
/// barcode side
pub fn trimmed_record(record: &FastqRecord, m: &BarcodeMatch, barcode: &[u8]) -> FastqRecord {
    let cut = m.end + m.umi.len();
    let (seq, qual) = match m.strand {
        Strand::Forward => (record.seq[cut..].to_vec(), record.qual[cut..].to_vec()),
        Strand::Reverse => {
            let mut seq = revcomp(&record.seq);
            seq.drain(..cut);
            let qual: Vec<u8> = record.qual.iter().rev().skip(cut).copied().collect();
            (seq, qual)
        }
    };

    FastqRecord {
        id: make_readname(barcode, &m.umi, &record.id),
        seq,
        qual,
    }
}
