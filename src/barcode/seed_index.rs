use rustc_hash::FxHashMap;

///////////////////////////////
/// Part of a search window where one barcode may be placed. `to` is exclusive
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct CandidateRegion {
    pub barcode_idx: u32,
    pub from: usize,
    pub to: usize,
}

///////////////////////////////
/// Pigeonhole prefilter for the fuzzy barcode search.
///
/// Each reference barcode is cut into `max_dist + 1` non-overlapping segments of length
/// `L / (max_dist + 1)`. At most `max_dist` edits can touch at most `max_dist` segments, so any
/// text within the budget of a barcode contains at least one of its segments verbatim. Barcodes
/// sharing no segment with the window are never aligned.
///
/// Every seed remembers where in the barcode it was cut from. A seed hit at window position `p`
/// for segment offset `o` puts the start of the placement within `max_dist` of `p - o`, and its
/// end at most `max_dist` past `p - o + L`, so only that part of the window needs aligning.
#[derive(Clone, Debug)]
pub struct SeedIndex {
    seed_len: usize,
    bc_len: usize,
    max_dist: usize,
    //seed -> (barcode index, offset of the segment in the barcode)
    seeds: FxHashMap<Vec<u8>, Vec<(u32, u32)>>,
}

impl SeedIndex {
    ///////////////////////////////
    /// Build the index. Returns None when the barcodes are too short to be split into
    /// `max_dist + 1` non-empty segments, in which case every barcode must be aligned
    pub fn build(barcodes: &[Vec<u8>], bc_len: usize, max_dist: usize) -> Option<SeedIndex> {
        let seed_len = bc_len / (max_dist + 1);
        if seed_len == 0 {
            return None;
        }

        let mut seeds: FxHashMap<Vec<u8>, Vec<(u32, u32)>> = FxHashMap::default();
        for (bc_index, bc) in barcodes.iter().enumerate() {
            for segment in 0..=max_dist {
                let from = segment * seed_len;
                seeds
                    .entry(bc[from..from + seed_len].to_vec())
                    .or_default()
                    .push((bc_index as u32, from as u32));
            }
        }

        Some(SeedIndex {
            seed_len,
            bc_len,
            max_dist,
            seeds,
        })
    }

    pub fn seed_len(&self) -> usize {
        self.seed_len
    }

    pub fn num_seeds(&self) -> usize {
        self.seeds.len()
    }

    ///////////////////////////////
    /// Collect the regions of `window` where a barcode sharing a seed with it may be placed.
    ///
    /// The output is sorted by barcode, then by position. Overlapping regions of the same barcode
    /// are merged
    pub fn candidates(&self, window: &[u8], out: &mut Vec<CandidateRegion>) {
        out.clear();
        if window.len() < self.seed_len {
            return;
        }
        for (pos, kmer) in window.windows(self.seed_len).enumerate() {
            if let Some(list) = self.seeds.get(kmer) {
                for &(barcode_idx, offset) in list {
                    let offset = offset as usize;
                    out.push(CandidateRegion {
                        barcode_idx,
                        from: pos.saturating_sub(offset + self.max_dist),
                        to: (pos + self.bc_len + self.max_dist - offset).min(window.len()),
                    });
                }
            }
        }
        out.sort_unstable();

        let mut merged = 0;
        for i in 0..out.len() {
            let region = out[i];
            if merged > 0 {
                let last = &mut out[merged - 1];
                if last.barcode_idx == region.barcode_idx && region.from <= last.to {
                    last.to = last.to.max(region.to);
                    continue;
                }
            }
            out[merged] = region;
            merged += 1;
        }
        out.truncate(merged);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bcs(list: &[&str]) -> Vec<Vec<u8>> {
        list.iter().map(|s| s.as_bytes().to_vec()).collect()
    }

    fn region(barcode_idx: u32, from: usize, to: usize) -> CandidateRegion {
        CandidateRegion { barcode_idx, from, to }
    }

    #[test]
    fn test_seed_length() {
        let barcodes = bcs(&["ACGTACGTACGTACGT"]);
        assert_eq!(SeedIndex::build(&barcodes, 16, 0).unwrap().seed_len(), 16);
        assert_eq!(SeedIndex::build(&barcodes, 16, 1).unwrap().seed_len(), 8);
        assert_eq!(SeedIndex::build(&barcodes, 16, 2).unwrap().seed_len(), 5);
        assert!(SeedIndex::build(&barcodes, 16, 16).is_none());
    }

    #[test]
    fn test_candidates_survive_edits() {
        let barcodes = bcs(&["AAAACCCCGGGGTTTT", "TTTTGGGGCCCCAAAA", "ACACACACACACACAC"]);
        let index = SeedIndex::build(&barcodes, 16, 1).unwrap();
        let mut out = Vec::new();

        //Substitution in the first half keeps the second segment intact. The barcode sits at 2..18
        index.candidates(b"NNAAATCCCCGGGGTTTTNN", &mut out);
        assert_eq!(out, vec![region(0, 1, 19)]);

        //Insertion in the second half keeps the first segment intact
        index.candidates(b"TTTTGGGGCCACCAAAA", &mut out);
        assert_eq!(out, vec![region(1, 0, 17)]);

        index.candidates(b"GATTACAGATTACAGATTACA", &mut out);
        assert!(out.is_empty());

        //Window shorter than a seed
        index.candidates(b"ACAC", &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn test_regions_of_one_barcode_are_merged() {
        let barcodes = bcs(&["AAAACCCCGGGGTTTT"]);
        let index = SeedIndex::build(&barcodes, 16, 1).unwrap();
        let mut out = Vec::new();

        //Both segments hit and point at the same placement
        index.candidates(b"GGGGGAAAACCCCGGGGTTTTGGGGG", &mut out);
        assert_eq!(out, vec![region(0, 4, 22)]);

        //Two copies far apart stay separate
        let mut window = b"AAAACCCCGGGGTTTT".to_vec();
        window.extend_from_slice(b"ACACACACACACACACACAC");
        window.extend_from_slice(b"AAAACCCCGGGGTTTT");
        index.candidates(&window, &mut out);
        assert_eq!(out, vec![region(0, 0, 17), region(0, 35, 52)]);
    }

    #[test]
    fn test_shared_seed_lists_both_barcodes() {
        let barcodes = bcs(&["AAAAAAAACCCCCCCC", "AAAAAAAAGGGGGGGG"]);
        let index = SeedIndex::build(&barcodes, 16, 1).unwrap();
        assert_eq!(index.num_seeds(), 3);

        let mut out = Vec::new();
        index.candidates(b"TAAAAAAAAT", &mut out);
        assert_eq!(out, vec![region(0, 0, 10), region(1, 0, 10)]);
    }
}
