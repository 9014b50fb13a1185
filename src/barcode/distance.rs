//! Base-level edit distance computed directly on packed words
//!
//! Per word: `popcount((wa ^ wb) | (pa ^ pb))`, minus a third of the
//! wildcard-mask popcount, halved by the pairwise code distance.

use super::{BarcodeError, EncodedBarcode, BITS_PER_BASE};

/// Bits that differ between any two distinct determined base codes.
pub const PAIRWISE_CODE_DISTANCE: u32 = 2;

/// Number of mismatching bases between two equal-length barcodes.
///
/// `N` against `N` costs nothing; `N` against a determined base costs one
/// full mismatch, the same as two distinct determined bases.
pub fn distance(a: &EncodedBarcode, b: &EncodedBarcode) -> Result<u32, BarcodeError> {
    if a.len() != b.len() {
        return Err(BarcodeError::LengthMismatch {
            left: a.len(),
            right: b.len(),
        });
    }
    Ok(distance_unchecked(a, b))
}

/// [`distance`] without the length check. Callers guarantee equal lengths.
#[inline]
pub(crate) fn distance_unchecked(a: &EncodedBarcode, b: &EncodedBarcode) -> u32 {
    debug_assert_eq!(a.len(), b.len());

    let payload = a.words().iter().zip(b.words());
    let wildcard = a.wildcard_words().iter().zip(b.wildcard_words());

    let mut combined = 0u32;
    let mut wild = 0u32;
    for ((pa, pb), (wa, wb)) in payload.zip(wildcard) {
        let wild_xor = wa ^ wb;
        combined += (wild_xor | (pa ^ pb)).count_ones();
        wild += wild_xor.count_ones();
    }

    // a wildcard/determined pair sets all three bits in `combined`; removing
    // one of them leaves the two a normal mismatch contributes
    (combined - wild / BITS_PER_BASE as u32) / PAIRWISE_CODE_DISTANCE
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn bc(seq: &str) -> EncodedBarcode {
        seq.parse().expect("valid barcode")
    }

    #[test_case("AAAA", "AAAA" => 0; "identical")]
    #[test_case("AAAA", "AAAT" => 1; "single substitution")]
    #[test_case("AAAA", "TTTT" => 4; "all different")]
    #[test_case("ATCG", "TCGA" => 4; "rotated")]
    #[test_case("AANN", "AAAA" => 2; "wildcard against determined")]
    #[test_case("NNNN", "NNNN" => 0; "wildcard against wildcard")]
    #[test_case("NACG", "NACT" => 1; "shared wildcard ignored")]
    #[test_case("NTCG", "ANCG" => 2; "crossed wildcards")]
    fn distance_table(a: &str, b: &str) -> u32 {
        distance(&bc(a), &bc(b)).unwrap()
    }

    #[test]
    fn every_pair_of_distinct_bases_costs_one() {
        for &x in b"ATCGN" {
            for &y in b"ATCGN" {
                let d = distance(&bc(&(x as char).to_string()), &bc(&(y as char).to_string()))
                    .unwrap();
                assert_eq!(d, u32::from(x != y), "{} vs {}", x as char, y as char);
            }
        }
    }

    #[test]
    fn long_barcodes_count_across_words() {
        let a: String = "ACGTN".chars().cycle().take(64).collect();
        let b: String = a
            .chars()
            .enumerate()
            .map(|(i, c)| if i % 7 == 0 { if c == 'G' { 'T' } else { 'G' } } else { c })
            .collect();
        let expected = a.chars().zip(b.chars()).filter(|(x, y)| x != y).count() as u32;
        assert_eq!(distance(&bc(&a), &bc(&b)).unwrap(), expected);
    }

    #[test]
    fn length_mismatch_is_rejected() {
        let err = distance(&bc("ACGT"), &bc("ACG")).unwrap_err();
        assert_eq!(err, BarcodeError::LengthMismatch { left: 4, right: 3 });
    }
}
