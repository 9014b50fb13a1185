//! Barcode encoding and the distance metric over encoded barcodes.

mod codec;
mod distance;

pub use codec::{decode, encode, EncodedBarcode, ALPHABET, BITS_PER_BASE, WILDCARD};
pub use distance::{distance, PAIRWISE_CODE_DISTANCE};

pub(crate) use distance::distance_unchecked;

use thiserror::Error;

/// Errors raised while encoding or comparing barcodes.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BarcodeError {
    /// Encountered a byte outside `A/T/C/G/N`.
    #[error("unsupported nucleotide '{character}' at position {position}")]
    InvalidCharacter {
        /// Offending character.
        character: char,
        /// Zero-based position within the sequence.
        position: usize,
    },

    /// Barcodes of different lengths cannot be compared.
    #[error("barcode length mismatch: {left} vs {right} bases")]
    LengthMismatch {
        /// Length of the left operand.
        left: usize,
        /// Length of the right operand.
        right: usize,
    },
}
