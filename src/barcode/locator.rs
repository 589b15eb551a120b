use bio::alphabets::dna::revcomp;

use super::whitelist::{AmbiguityPolicy, BarcodeWhitelist, LocateContext, LocateResult};

///////////////////////////////
/// Bases of residual adapter sequence tolerated before the barcode
pub const DEFAULT_ADAPTER_SLACK: usize = 8;

///////////////////////////////
/// Which read strands are searched for the barcode
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum StrandPolicy {
    /// Only the read as sequenced
    #[default]
    Forward,
    /// The read and its reverse complement; the better match is kept
    Both,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Strand {
    Forward,
    Reverse,
}

///////////////////////////////
/// A barcode located in a read. Positions refer to the read on the given strand
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BarcodeMatch {
    pub barcode_idx: u32,
    pub edit_distance: u32,
    pub start: usize,
    pub end: usize,
    pub umi: Vec<u8>,
    pub strand: Strand,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReadClass {
    Matched(BarcodeMatch),
    TooShort,
    NoMatch,
    Ambiguous,
}

//Outcome of the search on one strand
#[derive(Clone, Debug, PartialEq, Eq)]
enum StrandOutcome {
    Found(BarcodeMatch),
    TooShort,
    NoMatch,
    Ambiguous(u32),
}

///////////////////////////////
/// Finds the cell barcode near the start of a read, followed by the UMI
#[derive(Clone, Debug)]
pub struct BarcodeLocator<'a> {
    whitelist: &'a BarcodeWhitelist,
    umi_len: usize,
    adapter_slack: usize,
    strand: StrandPolicy,
}

impl<'a> BarcodeLocator<'a> {
    pub fn new(
        whitelist: &'a BarcodeWhitelist,
        umi_len: usize,
        adapter_slack: usize,
        strand: StrandPolicy,
    ) -> BarcodeLocator<'a> {
        BarcodeLocator {
            whitelist,
            umi_len,
            adapter_slack,
            strand,
        }
    }

    pub fn whitelist(&self) -> &'a BarcodeWhitelist {
        self.whitelist
    }

    ///////////////////////////////
    /// Number of bases from the start of the read that are searched
    pub fn window_len(&self) -> usize {
        self.whitelist.bc_len() + self.umi_len + self.whitelist.max_dist() + self.adapter_slack
    }

    ///////////////////////////////
    /// Classify one read
    pub fn classify(&self, seq: &[u8], ctx: &mut LocateContext) -> ReadClass {
        if seq.len() < self.window_len() {
            return ReadClass::TooShort;
        }

        let forward = self.search_strand(seq, Strand::Forward, ctx);
        let outcome = match self.strand {
            StrandPolicy::Forward => forward,
            StrandPolicy::Both => {
                let rc = revcomp(seq);
                let reverse = self.search_strand(&rc, Strand::Reverse, ctx);
                self.combine_strands(forward, reverse)
            }
        };

        match outcome {
            StrandOutcome::Found(m) => ReadClass::Matched(m),
            StrandOutcome::TooShort => ReadClass::TooShort,
            StrandOutcome::NoMatch => ReadClass::NoMatch,
            StrandOutcome::Ambiguous(_) => ReadClass::Ambiguous,
        }
    }

    fn search_strand(&self, seq: &[u8], strand: Strand, ctx: &mut LocateContext) -> StrandOutcome {
        let window = &seq[..self.window_len()];
        match self.whitelist.locate(window, ctx) {
            LocateResult::Match(m) => {
                let umi_end = m.end + self.umi_len;
                if umi_end > seq.len() {
                    return StrandOutcome::TooShort;
                }
                StrandOutcome::Found(BarcodeMatch {
                    barcode_idx: m.barcode_idx,
                    edit_distance: m.edit_distance,
                    start: m.start,
                    end: m.end,
                    umi: seq[m.end..umi_end].to_vec(),
                    strand,
                })
            }
            LocateResult::NoMatch => StrandOutcome::NoMatch,
            LocateResult::Ambiguous { edit_distance, .. } => StrandOutcome::Ambiguous(edit_distance),
        }
    }

    ///////////////////////////////
    /// Keep the better of the two strands. Equal distances to different barcodes are ambiguous,
    /// unless first-hit is requested, in which case the forward strand is kept
    fn combine_strands(&self, forward: StrandOutcome, reverse: StrandOutcome) -> StrandOutcome {
        use StrandOutcome::*;
        match (forward, reverse) {
            (Found(f), Found(r)) => {
                if r.edit_distance < f.edit_distance {
                    Found(r)
                } else if f.edit_distance < r.edit_distance
                    || f.barcode_idx == r.barcode_idx
                    || self.whitelist.ambiguity() == AmbiguityPolicy::FirstHit
                {
                    Found(f)
                } else {
                    Ambiguous(f.edit_distance)
                }
            }
            (Found(m), Ambiguous(d)) | (Ambiguous(d), Found(m)) => {
                if m.edit_distance < d {
                    Found(m)
                } else {
                    Ambiguous(d)
                }
            }
            (Found(m), _) | (_, Found(m)) => Found(m),
            (Ambiguous(d), _) | (_, Ambiguous(d)) => Ambiguous(d),
            (TooShort, _) | (_, TooShort) => TooShort,
            (NoMatch, NoMatch) => NoMatch,
        }
    }
}
