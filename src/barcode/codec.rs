use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use bitvec::prelude::*;

use super::BarcodeError;

/// Bits used to encode a single base.
pub const BITS_PER_BASE: usize = 3;

/// Bases in canonical decode order.
pub const ALPHABET: [u8; 5] = *b"ATCGN";

/// The undetermined base; distance treats it as a wildcard.
pub const WILDCARD: u8 = b'N';

const WILDCARD_CODE: u8 = 0b100;

type Words = BitVec<u64, Lsb0>;

/// Barcode packed at three bits per base.
///
/// Determined bases use codes that pairwise differ in exactly two bits
/// (`A=000`, `T=101`, `C=110`, `G=011`), so a Hamming count over the payload
/// divided by two yields the number of mismatching bases. `N` is stored as
/// `100` and additionally flagged in a parallel wildcard mask covering all
/// three of its bits.
///
/// Base `i` occupies payload bits `[3i, 3i + 3)`; codes may straddle word
/// boundaries. Bits past the end of the barcode are always zero.
#[derive(Clone)]
pub struct EncodedBarcode {
    payload: Words,
    wildcard: Words,
    len: usize,
}

impl EncodedBarcode {
    /// Encode an ASCII nucleotide sequence (case-insensitive `A/T/C/G/N`).
    pub fn encode(sequence: &[u8]) -> Result<Self, BarcodeError> {
        let len = sequence.len();
        let mut payload = Words::repeat(false, len * BITS_PER_BASE);
        let mut wildcard = Words::repeat(false, len * BITS_PER_BASE);

        for (idx, &base) in sequence.iter().enumerate() {
            let code = encode_base(base).ok_or(BarcodeError::InvalidCharacter {
                character: base as char,
                position: idx,
            })?;

            let bits = code_range(idx);
            payload[bits.clone()].store_le(code);
            if code == WILDCARD_CODE {
                wildcard[bits].fill(true);
            }
        }

        Ok(Self {
            payload,
            wildcard,
            len,
        })
    }

    /// Number of bases.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` for the zero-length barcode.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Packed payload words (little-endian base order).
    pub fn words(&self) -> &[u64] {
        self.payload.as_raw_slice()
    }

    /// Wildcard mask words, aligned with [`words`](Self::words).
    pub fn wildcard_words(&self) -> &[u64] {
        self.wildcard.as_raw_slice()
    }

    /// Whether any base is `N`.
    pub fn has_wildcard(&self) -> bool {
        self.wildcard.any()
    }

    /// Base at `idx` as an uppercase ASCII byte.
    pub fn base_at(&self, idx: usize) -> Option<u8> {
        if idx >= self.len {
            return None;
        }
        Some(decode_base(self.payload[code_range(idx)].load_le::<u8>()))
    }

    /// Decode into a newly allocated uppercase string.
    pub fn decode(&self) -> String {
        decode(self, self.len)
    }
}

/// Encode an ASCII nucleotide sequence.
pub fn encode(sequence: &[u8]) -> Result<EncodedBarcode, BarcodeError> {
    EncodedBarcode::encode(sequence)
}

/// Decode the first `length` bases of `barcode` (clamped to its length).
pub fn decode(barcode: &EncodedBarcode, length: usize) -> String {
    (0..length.min(barcode.len))
        .map(|idx| decode_base(barcode.payload[code_range(idx)].load_le::<u8>()) as char)
        .collect()
}

impl FromStr for EncodedBarcode {
    type Err = BarcodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::encode(s.as_bytes())
    }
}

impl PartialEq for EncodedBarcode {
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len && self.words() == other.words()
    }
}

impl Eq for EncodedBarcode {}

impl Hash for EncodedBarcode {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.len.hash(state);
        self.words().hash(state);
    }
}

impl Ord for EncodedBarcode {
    fn cmp(&self, other: &Self) -> Ordering {
        self.words()
            .cmp(other.words())
            .then_with(|| self.len.cmp(&other.len))
    }
}

impl PartialOrd for EncodedBarcode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for EncodedBarcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.decode())
    }
}

impl fmt::Debug for EncodedBarcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("EncodedBarcode").field(&self.decode()).finish()
    }
}

fn code_range(idx: usize) -> std::ops::Range<usize> {
    let start = idx * BITS_PER_BASE;
    start..start + BITS_PER_BASE
}

fn encode_base(base: u8) -> Option<u8> {
    match base {
        b'A' | b'a' => Some(0b000),
        b'T' | b't' => Some(0b101),
        b'C' | b'c' => Some(0b110),
        b'G' | b'g' => Some(0b011),
        b'N' | b'n' => Some(WILDCARD_CODE),
        _ => None,
    }
}

fn decode_base(code: u8) -> u8 {
    match code {
        0b000 => b'A',
        0b101 => b'T',
        0b110 => b'C',
        0b011 => b'G',
        _ => WILDCARD,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::DefaultHasher;

    fn hash_of(barcode: &EncodedBarcode) -> u64 {
        let mut hasher = DefaultHasher::new();
        barcode.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn encode_and_decode_roundtrip() {
        let seq = "ATCGNNATCGGCTA";
        let barcode: EncodedBarcode = seq.parse().expect("valid barcode");
        assert_eq!(barcode.len(), seq.len());
        assert_eq!(barcode.decode(), seq);
        assert_eq!(barcode.to_string(), seq);
    }

    #[test]
    fn lowercase_input_decodes_uppercase() {
        let barcode = encode(b"acgtn").unwrap();
        assert_eq!(barcode.decode(), "ACGTN");
        assert_eq!(barcode, encode(b"ACGTN").unwrap());
    }

    #[test]
    fn codes_straddling_word_boundary_survive() {
        // base 21 covers bits 63..66
        let seq: String = "ACGTN".chars().cycle().take(50).collect();
        let barcode: EncodedBarcode = seq.parse().unwrap();
        assert_eq!(barcode.words().len(), 3);
        assert_eq!(barcode.decode(), seq);
        assert_eq!(barcode.base_at(21), Some(b'C'));
        assert_eq!(barcode.base_at(50), None);
    }

    #[test]
    fn invalid_character_reports_position() {
        let result = encode(b"ACXT");
        assert_eq!(
            result.unwrap_err(),
            BarcodeError::InvalidCharacter {
                character: 'X',
                position: 2
            }
        );
    }

    #[test]
    fn wildcard_mask_tracks_n_bases() {
        let barcode = encode(b"ANA").unwrap();
        assert!(barcode.has_wildcard());
        assert_eq!(barcode.wildcard_words(), &[0b111_000]);
        assert!(!encode(b"AAA").unwrap().has_wildcard());
    }

    #[test]
    fn decode_clamps_to_length() {
        let barcode = encode(b"GATTACA").unwrap();
        assert_eq!(decode(&barcode, 3), "GAT");
        assert_eq!(decode(&barcode, 100), "GATTACA");
    }

    #[test]
    fn equal_barcodes_hash_equal_and_order_is_total() {
        let a = encode(b"ACGT").unwrap();
        let b = encode(b"acgt").unwrap();
        let c = encode(b"ACGA").unwrap();
        assert_eq!(hash_of(&a), hash_of(&b));
        assert_eq!(a.cmp(&b), Ordering::Equal);
        assert_ne!(a.cmp(&c), Ordering::Equal);
        assert_eq!(a.cmp(&c), c.cmp(&a).reverse());
    }

    #[test]
    fn empty_sequence_is_empty_barcode() {
        let barcode = encode(b"").unwrap();
        assert!(barcode.is_empty());
        assert!(barcode.words().is_empty());
        assert_eq!(barcode.decode(), "");
    }
}
