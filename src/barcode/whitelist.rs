use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use anyhow::Context;
use bio::alignment::distance::levenshtein;
use bio::pattern_matching::myers::Myers;
use itertools::Itertools;
use log::{debug, info, warn};
use rustc_hash::FxHashMap;

use super::seed_index::{CandidateRegion, SeedIndex};
use crate::runtime::Error;

///////////////////////////////
/// What to do when several reference barcodes tie for the best distance
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum AmbiguityPolicy {
    /// Classify the read as ambiguous and do not emit it
    #[default]
    Report,
    /// Keep the barcode that comes first in the reference
    FirstHit,
}

///////////////////////////////
/// A barcode found within a search window. Positions are relative to the window
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WindowMatch {
    pub barcode_idx: u32,
    pub edit_distance: u32,
    pub start: usize,
    pub end: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LocateResult {
    Match(WindowMatch),
    NoMatch,
    Ambiguous { edit_distance: u32, n_candidates: usize },
}

///////////////////////////////
/// Scratch space for `BarcodeWhitelist::locate`. One per worker thread
#[derive(Clone, Debug, Default)]
pub struct LocateContext {
    candidates: Vec<CandidateRegion>,
    exact_hits: Vec<WindowMatch>,
    ties: Vec<WindowMatch>,
}

impl LocateContext {
    pub fn new() -> LocateContext {
        LocateContext::default()
    }
}

///////////////////////////////
/// The set of known cell barcodes, indexed for exact and approximate lookup.
///
/// Built once per run and read-only afterwards, so it can be shared between threads freely.
/// The fuzzy stage keeps one bit-parallel Myers matcher per barcode, which limits barcodes to
/// 64 bases
#[derive(Clone, Debug)]
pub struct BarcodeWhitelist {
    barcodes: Vec<Vec<u8>>,
    exact: FxHashMap<Vec<u8>, u32>,
    matchers: Vec<Myers<u64>>,
    seeds: Option<SeedIndex>,
    bc_len: usize,
    max_dist: usize,
    ambiguity: AmbiguityPolicy,
}

impl BarcodeWhitelist {
    ///////////////////////////////
    /// Index a list of unique, equal-length ACGT barcodes
    pub fn new(barcodes: Vec<Vec<u8>>, max_dist: usize) -> anyhow::Result<BarcodeWhitelist> {
        let bc_len = match barcodes.first() {
            Some(bc) => bc.len(),
            None => anyhow::bail!("Cannot build a barcode index without barcodes"),
        };
        if bc_len > MAX_BARCODE_LEN {
            anyhow::bail!(
                "Barcodes of length {} are not supported, at most {} bases",
                bc_len,
                MAX_BARCODE_LEN
            );
        }

        let mut exact: FxHashMap<Vec<u8>, u32> = FxHashMap::default();
        exact.reserve(barcodes.len());
        for (i, bc) in barcodes.iter().enumerate() {
            if bc.len() != bc_len {
                anyhow::bail!(
                    "Barcode {} has length {}, expected {}",
                    String::from_utf8_lossy(bc),
                    bc.len(),
                    bc_len
                );
            }
            if !is_acgt(bc) {
                anyhow::bail!("Barcode {} contains bases other than ACGT", String::from_utf8_lossy(bc));
            }
            if exact.insert(bc.clone(), i as u32).is_some() {
                anyhow::bail!("Barcode {} is listed twice", String::from_utf8_lossy(bc));
            }
        }

        //Exact-only runs never align
        let matchers = if max_dist > 0 {
            barcodes.iter().map(|bc| Myers::<u64>::new(bc.as_slice())).collect()
        } else {
            Vec::new()
        };

        let seeds = SeedIndex::build(&barcodes, bc_len, max_dist);
        match &seeds {
            Some(s) => debug!(
                "Seed index: {} distinct seeds of length {}",
                s.num_seeds(),
                s.seed_len()
            ),
            None => debug!("Barcodes too short for a seed index; all barcodes will be aligned"),
        }

        Ok(BarcodeWhitelist {
            barcodes,
            exact,
            matchers,
            seeds,
            bc_len,
            max_dist,
            ambiguity: AmbiguityPolicy::Report,
        })
    }

    pub fn with_ambiguity(mut self, ambiguity: AmbiguityPolicy) -> BarcodeWhitelist {
        self.ambiguity = ambiguity;
        self
    }

    ///////////////////////////////
    /// Drop the seed prefilter, so that every barcode is aligned against the whole window
    pub fn without_seed_index(mut self) -> BarcodeWhitelist {
        self.seeds = None;
        self
    }

    ///////////////////////////////
    /// Load and index the barcodes of a reference CSV file
    pub fn from_csv(path: &Path, max_dist: usize) -> anyhow::Result<BarcodeWhitelist> {
        let barcodes = read_barcode_csv(path)?;
        info!(
            "Loaded {} reference barcodes of length {} from {}",
            barcodes.len(),
            barcodes[0].len(),
            path.display()
        );
        BarcodeWhitelist::new(barcodes, max_dist)
    }

    pub fn len(&self) -> usize {
        self.barcodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.barcodes.is_empty()
    }

    pub fn bc_len(&self) -> usize {
        self.bc_len
    }

    pub fn max_dist(&self) -> usize {
        self.max_dist
    }

    pub fn ambiguity(&self) -> AmbiguityPolicy {
        self.ambiguity
    }

    pub fn barcode(&self, idx: u32) -> &[u8] {
        &self.barcodes[idx as usize]
    }

    pub fn barcodes(&self) -> &[Vec<u8>] {
        &self.barcodes
    }

    ///////////////////////////////
    /// Find the reference barcode best matching some substring of `window`.
    ///
    /// Substrings of length `L ± max_dist` anywhere in the window are considered. The barcode with the
    /// smallest edit distance wins if it is the only one at that distance; several barcodes at the
    /// minimum give Ambiguous (or the first of them, under `AmbiguityPolicy::FirstHit`).
    pub fn locate(&self, window: &[u8], ctx: &mut LocateContext) -> LocateResult {
        let l = self.bc_len;

        //Exact stage: hash every L-mer
        ctx.exact_hits.clear();
        if window.len() >= l {
            for start in 0..=(window.len() - l) {
                if let Some(&idx) = self.exact.get(&window[start..start + l]) {
                    if !ctx.exact_hits.iter().any(|h| h.barcode_idx == idx) {
                        ctx.exact_hits.push(WindowMatch {
                            barcode_idx: idx,
                            edit_distance: 0,
                            start,
                            end: start + l,
                        });
                    }
                }
            }
        }
        if !ctx.exact_hits.is_empty() {
            return self.resolve(&ctx.exact_hits);
        }
        if self.max_dist == 0 {
            return LocateResult::NoMatch;
        }

        //Fuzzy stage
        match &self.seeds {
            Some(seeds) => seeds.candidates(window, &mut ctx.candidates),
            None => {
                ctx.candidates.clear();
                ctx.candidates.extend((0..self.barcodes.len() as u32).map(|barcode_idx| CandidateRegion {
                    barcode_idx,
                    from: 0,
                    to: window.len(),
                }));
            }
        }

        ctx.ties.clear();
        let mut best_dist = self.max_dist.min(self.bc_len) as u32;
        for regions in ctx.candidates.chunk_by(|a, b| a.barcode_idx == b.barcode_idx) {
            if let Some(m) = self.best_placement(window, regions, best_dist) {
                if ctx.ties.is_empty() || m.edit_distance < best_dist {
                    ctx.ties.clear();
                    best_dist = m.edit_distance;
                }
                ctx.ties.push(m);
            }
        }
        self.resolve(&ctx.ties)
    }

    ///////////////////////////////
    /// Pick among the barcodes sharing the best distance
    fn resolve(&self, hits: &[WindowMatch]) -> LocateResult {
        match hits {
            [] => LocateResult::NoMatch,
            [only] => LocateResult::Match(*only),
            _ => match self.ambiguity {
                AmbiguityPolicy::Report => LocateResult::Ambiguous {
                    edit_distance: hits[0].edit_distance,
                    n_candidates: hits.len(),
                },
                AmbiguityPolicy::FirstHit => {
                    let first = hits.iter().min_by_key(|h| h.barcode_idx).copied();
                    first.map_or(LocateResult::NoMatch, LocateResult::Match)
                }
            },
        }
    }

    ///////////////////////////////
    /// Best placement of one barcode in the given regions of the window, within `budget` edits.
    ///
    /// Placements are ranked by distance, then by how close their length is to L, then by start.
    /// Myers yields the ends of the best placements; the start at each end is then recovered by
    /// scoring the lengths `L ± distance` that end there
    fn best_placement(&self, window: &[u8], regions: &[CandidateRegion], budget: u32) -> Option<WindowMatch> {
        let barcode_idx = regions.first()?.barcode_idx;
        let matcher = &self.matchers[barcode_idx as usize];
        let bc = &self.barcodes[barcode_idx as usize];

        //(distance, length difference to L, start, length)
        let mut best: Option<(u32, usize, usize, usize)> = None;
        for region in regions {
            let budget = best.map_or(budget, |b| b.0);
            let ends = matcher
                .find_all_end(&window[region.from..region.to], budget as u8)
                .min_set_by_key(|&(_, dist)| dist);
            for (end, dist) in ends {
                let end = region.from + end + 1;
                if let Some(key) = placement_ending_at(bc, window, end, dist as u32) {
                    if best.map_or(true, |b| key < b) {
                        best = Some(key);
                    }
                }
            }
        }

        best.map(|(d, _, start, len)| WindowMatch {
            barcode_idx,
            edit_distance: d,
            start,
            end: start + len,
        })
    }
}

///////////////////////////////
/// Longest barcode the fuzzy stage can search for
pub const MAX_BARCODE_LEN: usize = 64;

///////////////////////////////
/// Among the substrings ending at `end` that are `dist` edits from `bc`, the one with length
/// closest to L, the longer first (it starts earlier)
fn placement_ending_at(bc: &[u8], window: &[u8], end: usize, dist: u32) -> Option<(u32, usize, usize, usize)> {
    let l = bc.len();
    for diff in 0..=dist as usize {
        for len in [Some(l + diff), l.checked_sub(diff)].into_iter().flatten().dedup() {
            if len == 0 || len > end {
                continue;
            }
            let start = end - len;
            if levenshtein(bc, &window[start..end]) == dist {
                return Some((dist, diff, start, len));
            }
        }
    }
    None
}

pub fn is_acgt(seq: &[u8]) -> bool {
    !seq.is_empty() && seq.iter().all(|c| matches!(c, b'A' | b'C' | b'G' | b'T'))
}

///////////////////////////////
/// Normalize one barcode field: upper case, and drop a GEM-well suffix such as "-1"
fn normalize_barcode(field: &[u8]) -> Vec<u8> {
    let mut bc = field.to_ascii_uppercase();
    if let Some(dash) = bc.iter().rposition(|&c| c == b'-') {
        let suffix = &bc[dash + 1..];
        if !suffix.is_empty() && suffix.iter().all(u8::is_ascii_digit) {
            bc.truncate(dash);
        }
    }
    bc
}

///////////////////////////////
/// Read the reference barcode list from a CSV file. The first column holds the barcode
pub fn read_barcode_csv(path: &Path) -> anyhow::Result<Vec<Vec<u8>>> {
    if !path.exists() {
        return Err(Error::file_not_found(path).into());
    }
    let file = File::open(path).with_context(|| format!("Could not open barcode file {}", path.display()))?;
    read_barcode_csv_from(BufReader::new(file), path)
}

///////////////////////////////
/// Read the reference barcode list from any reader; `path` is only used in messages
pub fn read_barcode_csv_from(src: impl Read, path: &Path) -> anyhow::Result<Vec<Vec<u8>>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(src);

    let mut barcodes: Vec<Vec<u8>> = Vec::new();
    let mut seen: FxHashMap<Vec<u8>, u64> = FxHashMap::default();
    let mut first_row = true;
    for result in reader.byte_records() {
        let record = result.map_err(|e| Error::file_not_valid(path, Some(e.to_string())))?;
        let line = record.position().map_or(0, |p| p.line());

        if record.iter().all(|f| f.is_empty()) {
            continue;
        }
        let bc = normalize_barcode(record.get(0).unwrap_or_default());

        if !is_acgt(&bc) {
            if first_row {
                debug!(
                    "Skipping header line of barcode file: {}",
                    String::from_utf8_lossy(record.as_slice())
                );
                first_row = false;
                continue;
            }
            return Err(Error::invalid_barcode(path, line, String::from_utf8_lossy(&bc)).into());
        }
        first_row = false;

        if let Some(first) = barcodes.first() {
            if first.len() != bc.len() {
                return Err(Error::inconsistent_barcode_length(path, line, first.len(), bc.len()).into());
            }
        }

        if let Some(prev_line) = seen.get(&bc) {
            warn!(
                "Barcode {} on line {} already listed on line {}; keeping the first",
                String::from_utf8_lossy(&bc),
                line,
                prev_line
            );
            continue;
        }
        seen.insert(bc.clone(), line);
        barcodes.push(bc);
    }

    if barcodes.is_empty() {
        return Err(Error::empty_reference(path).into());
    }
    Ok(barcodes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};
    use std::io::Cursor;

    fn whitelist(list: &[&str], max_dist: usize) -> BarcodeWhitelist {
        let barcodes = list.iter().map(|s| s.as_bytes().to_vec()).collect();
        BarcodeWhitelist::new(barcodes, max_dist).unwrap()
    }

    fn read(csv: &str) -> anyhow::Result<Vec<Vec<u8>>> {
        read_barcode_csv_from(Cursor::new(csv.as_bytes().to_vec()), Path::new("ref.csv"))
    }

    #[test]
    fn test_read_csv_with_header_and_extra_columns() {
        let bcs = read("barcode,count\nACGTACGT,10\nTTTTCCCC,3\n\nacgtaaaa-1,1\n").unwrap();
        assert_eq!(bcs, vec![b"ACGTACGT".to_vec(), b"TTTTCCCC".to_vec(), b"ACGTAAAA".to_vec()]);
    }

    #[test]
    fn test_read_csv_without_header() {
        let bcs = read("ACGTACGT\nTTTTCCCC\n").unwrap();
        assert_eq!(bcs.len(), 2);
    }

    #[test]
    fn test_read_csv_collapses_duplicates() {
        let bcs = read("ACGTACGT\nTTTTCCCC\nACGTACGT\n").unwrap();
        assert_eq!(bcs, vec![b"ACGTACGT".to_vec(), b"TTTTCCCC".to_vec()]);
    }

    #[test]
    fn test_read_csv_rejects_bad_input() {
        let err = read("").unwrap_err();
        assert!(matches!(err.downcast_ref::<Error>(), Some(Error::EmptyReference { .. })));

        let err = read("barcode\n").unwrap_err();
        assert!(matches!(err.downcast_ref::<Error>(), Some(Error::EmptyReference { .. })));

        let err = read("ACGTACGT\nACGTACG\n").unwrap_err();
        match err.downcast_ref::<Error>() {
            Some(Error::InconsistentBarcodeLength { line, expected, found, .. }) => {
                assert_eq!((*line, *expected, *found), (2, 8, 7));
            }
            other => panic!("unexpected error {:?}", other),
        }

        let err = read("ACGTACGT\nACGTNCGT\n").unwrap_err();
        match err.downcast_ref::<Error>() {
            Some(Error::InvalidBarcode { line, barcode, .. }) => {
                assert_eq!(*line, 2);
                assert_eq!(barcode, "ACGTNCGT");
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_new_rejects_inconsistent_input() {
        assert!(BarcodeWhitelist::new(vec![], 1).is_err());
        assert!(BarcodeWhitelist::new(vec![b"ACGT".to_vec(), b"ACG".to_vec()], 1).is_err());
        assert!(BarcodeWhitelist::new(vec![b"ACGN".to_vec()], 1).is_err());
        assert!(BarcodeWhitelist::new(vec![b"ACGT".to_vec(), b"ACGT".to_vec()], 1).is_err());

        //Longer than one machine word
        assert!(BarcodeWhitelist::new(vec![vec![b'A'; 65]], 1).is_err());
        let wl = BarcodeWhitelist::new(vec![vec![b'A'; 64]], 2).unwrap();
        let mut window = vec![b'A'; 40];
        window.push(b'C');
        window.extend_from_slice(&[b'A'; 30]);
        assert!(matches!(
            wl.locate(&window, &mut LocateContext::new()),
            LocateResult::Match(WindowMatch { edit_distance: 1, .. })
        ));
    }

    #[test]
    fn test_locate_exact() {
        let wl = whitelist(&["ACGTACGTACGTACGT"], 1);
        let mut ctx = LocateContext::new();
        let res = wl.locate(b"GGACGTACGTACGTACGTNNNNNNNNNN", &mut ctx);
        assert_eq!(
            res,
            LocateResult::Match(WindowMatch { barcode_idx: 0, edit_distance: 0, start: 2, end: 18 })
        );
    }

    #[test]
    fn test_locate_substitution() {
        let wl = whitelist(&["ACGTACGTACGTACGT"], 1);
        let mut ctx = LocateContext::new();
        let window = b"ACGAACGTACGTACGTTTTTTTTTTT";
        assert_eq!(
            wl.locate(window, &mut ctx),
            LocateResult::Match(WindowMatch { barcode_idx: 0, edit_distance: 1, start: 0, end: 16 })
        );

        let wl = whitelist(&["ACGTACGTACGTACGT"], 0);
        assert_eq!(wl.locate(window, &mut ctx), LocateResult::NoMatch);
    }

    #[test]
    fn test_locate_deletion_and_insertion() {
        let wl = whitelist(&["AAAACCCCGGGGTTTT"], 2);
        let mut ctx = LocateContext::new();

        //One C deleted from the barcode
        match wl.locate(b"AAAACCCGGGGTTTTAAAAAAAAAA", &mut ctx) {
            LocateResult::Match(m) => {
                assert_eq!(m.edit_distance, 1);
                assert_eq!((m.start, m.end), (0, 15));
            }
            other => panic!("unexpected {:?}", other),
        }

        //One A inserted into the barcode
        match wl.locate(b"AAAACCCCAGGGGTTTTCCCCCCCCC", &mut ctx) {
            LocateResult::Match(m) => {
                assert_eq!(m.edit_distance, 1);
                assert_eq!((m.start, m.end), (0, 17));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_locate_ambiguous_and_first_hit() {
        let wl = whitelist(&["AAAAAAAAAAAAAAAA", "AAAAAAAAAAAAAAAT"], 1);
        let mut ctx = LocateContext::new();
        let window = b"AAAAAAAAAAAAAAAATCGCGCGCGCGC";
        assert_eq!(
            wl.locate(window, &mut ctx),
            LocateResult::Ambiguous { edit_distance: 0, n_candidates: 2 }
        );

        //Unique best at distance 0 is not ambiguous, even if another barcode is one edit away
        assert!(matches!(
            wl.locate(b"AAAAAAAAAAAAAAAACCGCGCGCGCGC", &mut ctx),
            LocateResult::Match(WindowMatch { barcode_idx: 0, edit_distance: 0, .. })
        ));

        let wl = wl.with_ambiguity(AmbiguityPolicy::FirstHit);
        assert!(matches!(
            wl.locate(window, &mut ctx),
            LocateResult::Match(WindowMatch { barcode_idx: 0, edit_distance: 0, .. })
        ));
    }

    #[test]
    fn test_locate_ambiguous_fuzzy() {
        //Read is one substitution away from both barcodes
        let wl = whitelist(&["ACGTACGTACGTAAAA", "ACGTACGTACGTCCCC"], 1);
        let mut ctx = LocateContext::new();
        assert_eq!(
            wl.locate(b"ACGTACGTACGTGAAAGGGGGGGGGG", &mut ctx),
            LocateResult::Match(WindowMatch { barcode_idx: 0, edit_distance: 1, start: 0, end: 16 })
        );
        assert_eq!(
            wl.locate(b"ACGTACGTACGTNNNNGGGGGGGGGG", &mut ctx),
            LocateResult::NoMatch
        );
        let wl = whitelist(&["ACGTACGTACGTAAAA", "ACGTACGTACGTAAAC"], 1);
        assert_eq!(
            wl.locate(b"ACGTACGTACGTAAAGTTTTTTTTTT", &mut ctx),
            LocateResult::Ambiguous { edit_distance: 1, n_candidates: 2 }
        );
    }

    #[test]
    fn test_short_window() {
        let wl = whitelist(&["ACGTACGTACGTACGT"], 1);
        let mut ctx = LocateContext::new();
        assert_eq!(wl.locate(b"ACGTACGTACGTACG", &mut ctx), LocateResult::Match(WindowMatch {
            barcode_idx: 0,
            edit_distance: 1,
            start: 0,
            end: 15
        }));
        assert_eq!(wl.locate(b"ACGTACGT", &mut ctx), LocateResult::NoMatch);
        assert_eq!(wl.locate(b"", &mut ctx), LocateResult::NoMatch);
    }

    fn random_acgt(rng: &mut SmallRng, len: usize) -> Vec<u8> {
        (0..len).map(|_| b"ACGT"[rng.gen_range(0..4)]).collect()
    }

    fn mutate(rng: &mut SmallRng, seq: &[u8], n_edits: usize) -> Vec<u8> {
        let mut out = seq.to_vec();
        for _ in 0..n_edits {
            let pos = rng.gen_range(0..out.len());
            match rng.gen_range(0..4) {
                0 => out[pos] = b"ACGT"[rng.gen_range(0..4)],
                1 => {
                    out.remove(pos);
                }
                2 => out.insert(pos, b"ACGT"[rng.gen_range(0..4)]),
                _ => out[pos] = b'N',
            }
        }
        out
    }

    ///////////////////////////////
    /// Best placement by scoring every substring of length L ± max_dist
    fn brute_force_placement(bc: &[u8], window: &[u8], max_dist: usize) -> LocateResult {
        let l = bc.len();
        let mut best: Option<(u32, usize, usize, usize)> = None;
        for start in 0..window.len() {
            for len in l.saturating_sub(max_dist).max(1)..=(l + max_dist) {
                if start + len > window.len() {
                    break;
                }
                let d = levenshtein(bc, &window[start..start + len]);
                let key = (d, len.abs_diff(l), start, len);
                if d as usize <= max_dist && best.map_or(true, |b| key < b) {
                    best = Some(key);
                }
            }
        }
        best.map_or(LocateResult::NoMatch, |(d, _, start, len)| {
            LocateResult::Match(WindowMatch { barcode_idx: 0, edit_distance: d, start, end: start + len })
        })
    }

    #[test]
    fn test_placement_agrees_with_brute_force() {
        let mut rng = SmallRng::seed_from_u64(77);
        for max_dist in 1..=3 {
            for _ in 0..300 {
                let bc = random_acgt(&mut rng, 12);
                let seeded = BarcodeWhitelist::new(vec![bc.clone()], max_dist).unwrap();
                let exhaustive = seeded.clone().without_seed_index();

                let n_edits = rng.gen_range(0..=max_dist + 1);
                let prefix_len = rng.gen_range(0..6);
                let mut window = random_acgt(&mut rng, prefix_len);
                window.extend(mutate(&mut rng, &bc, n_edits));
                window.extend(random_acgt(&mut rng, 6));

                let expected = brute_force_placement(&bc, &window, max_dist);
                let mut ctx = LocateContext::new();
                assert_eq!(
                    exhaustive.locate(&window, &mut ctx),
                    expected,
                    "window {}",
                    String::from_utf8_lossy(&window)
                );
                assert_eq!(seeded.locate(&window, &mut ctx), expected);
            }
        }
    }

    #[test]
    fn test_seed_index_agrees_with_exhaustive_search() {
        let mut rng = SmallRng::seed_from_u64(2024);
        for max_dist in 1..=3 {
            //Short barcodes over a small reference make near-ties and ambiguity common
            let barcodes: Vec<Vec<u8>> = {
                let mut seen = std::collections::HashSet::new();
                let mut v = Vec::new();
                while v.len() < 300 {
                    let bc = random_acgt(&mut rng, 10);
                    if seen.insert(bc.clone()) {
                        v.push(bc);
                    }
                }
                v
            };
            let seeded = BarcodeWhitelist::new(barcodes.clone(), max_dist).unwrap();
            let exhaustive = BarcodeWhitelist::new(barcodes.clone(), max_dist)
                .unwrap()
                .without_seed_index();

            let mut ctx = LocateContext::new();
            for _ in 0..400 {
                let bc = &barcodes[rng.gen_range(0..barcodes.len())];
                let n_edits = rng.gen_range(0..=max_dist + 1);
                let prefix_len = rng.gen_range(0..4);
                let mut window = random_acgt(&mut rng, prefix_len);
                window.extend(mutate(&mut rng, bc, n_edits));
                window.extend(random_acgt(&mut rng, 8));

                assert_eq!(
                    seeded.locate(&window, &mut ctx),
                    exhaustive.locate(&window, &mut ctx),
                    "window {}",
                    String::from_utf8_lossy(&window)
                );
            }
        }
    }
}
