use serde::{Deserialize, Serialize};

use crate::models::Book;

/// Aggregate counts over the whole library.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LibraryStats {
    pub total: usize,
    pub read: usize,
    pub favorites: usize,
    /// `read / total * 100`, rounded to one decimal; 0.0 for an empty library.
    pub read_percentage: f64,
}

impl LibraryStats {
    pub fn from_counts(total: usize, read: usize, favorites: usize) -> Self {
        let read_percentage = if total == 0 {
            0.0
        } else {
            round_to_tenth(read as f64 / total as f64 * 100.0)
        };

        Self {
            total,
            read,
            favorites,
            read_percentage,
        }
    }

    pub fn from_books<'a>(books: impl IntoIterator<Item = &'a Book>) -> Self {
        let (mut total, mut read, mut favorites) = (0, 0, 0);
        for book in books {
            total += 1;
            read += usize::from(book.read_status);
            favorites += usize::from(book.favorite);
        }
        Self::from_counts(total, read, favorites)
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }
}

/// Round a non-negative value to one decimal using its exact binary value,
/// ties to even. `6.25` becomes `6.2`, while `0.15` (stored just below) becomes `0.1`.
fn round_to_tenth(value: f64) -> f64 {
    if !value.is_finite() || value <= 0.0 {
        return 0.0;
    }

    let bits = value.to_bits();
    let biased = ((bits >> 52) & 0x7ff) as i32;
    let fraction = bits & ((1u64 << 52) - 1);
    let (mantissa, exp) = if biased == 0 {
        (fraction, -1074)
    } else {
        (fraction | (1u64 << 52), biased - 1075)
    };
    if exp >= 0 {
        return value;
    }

    // value * 10 == scaled / 2^shift exactly
    let scaled = u128::from(mantissa) * 10;
    let shift = exp.unsigned_abs();
    if shift >= 127 {
        return 0.0;
    }
    let quotient = scaled >> shift;
    let remainder = scaled & ((1u128 << shift) - 1);
    let half = 1u128 << (shift - 1);
    let tenths = if remainder > half || (remainder == half && quotient & 1 == 1) {
        quotient + 1
    } else {
        quotient
    };
    tenths as f64 / 10.0
}
