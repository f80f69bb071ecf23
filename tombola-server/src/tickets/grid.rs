//! Random card grid generation
//!
//! Five columns over fixed disjoint bands partitioning 1..=75, five
//! sorted values per column drawn without replacement, free center cell.

use rand::Rng;
use shared::models::{CardGrid, FREE_CELL};

/// Numeric band of each column, inclusive
pub const COLUMN_BANDS: [(u8, u8); 5] = [(1, 15), (16, 30), (31, 45), (46, 60), (61, 75)];

/// Draw one uniform-random grid
///
/// Determinism is not required; only the signature of the resulting
/// grid matters for duplicate detection. Callers pass the RNG so tests
/// can use a seeded one.
pub fn random_grid<R: Rng + ?Sized>(rng: &mut R) -> CardGrid {
    let mut cols = [[0u8; 5]; 5];
    for (ci, &(lo, hi)) in COLUMN_BANDS.iter().enumerate() {
        let span = (hi - lo + 1) as usize;
        let mut picked: Vec<u8> = rand::seq::index::sample(rng, span, 5)
            .into_iter()
            .map(|offset| lo + offset as u8)
            .collect();
        picked.sort_unstable();
        for (ri, value) in picked.into_iter().enumerate() {
            cols[ci][ri] = value;
        }
    }
    // Free center: middle column, middle row
    cols[2][2] = FREE_CELL;
    CardGrid { cols }
}
