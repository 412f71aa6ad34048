#![forbid(unsafe_code)]

//! Random fixtures with controlled shape and rank.
//!
//! A matrix of rank `r` is built as `U · P · V` with small-integer `U`
//! (n×n) and `V` (m×m) and `P` the n×m identity with every pivot past `r`
//! zeroed. The product is exact in integer arithmetic; its rank is then
//! confirmed by the oracle and the draw repeated until it matches.
//!
//! Rows come back sorted ascending, which floats zero-led rows to the top
//! and forces row swaps on any elimination-based decomposition.

use std::cmp::Ordering;
use std::ops::RangeInclusive;

use lagrade_oracle::{OracleError, matrix_rank};
use rand::Rng;
use thiserror::Error;

use crate::candidate::Matrix;

/// Largest accepted entry bound. Keeps every `U · P · V` entry exact in
/// both `i64` and `f64` for the dimensions the checker draws.
pub const MAX_ENTRY_BOUND: i64 = 1 << 20;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum GenerateError {
    #[error("rank {rank} is not attainable for a {rows}x{cols} matrix")]
    RankOutOfRange {
        rank: usize,
        rows: usize,
        cols: usize,
    },
    #[error("entry bound {max} leaves no values to draw from [-1, {max})")]
    EmptyEntryRange { max: i64 },
    #[error("entry bound {max} exceeds {MAX_ENTRY_BOUND}")]
    EntryBoundTooLarge { max: i64 },
    #[error("integer product overflowed for a {rows}x{cols} matrix")]
    ProductOverflow { rows: usize, cols: usize },
    #[error("dimension range {min}..={max} must start at 2 or above and be non-empty")]
    BadDimensions { min: usize, max: usize },
    #[error("rank verification failed: {0}")]
    Oracle(#[from] OracleError),
}

fn draw_entries<R: Rng + ?Sized>(rng: &mut R, rows: usize, cols: usize, max: i64) -> Vec<Vec<i64>> {
    (0..rows)
        .map(|_| (0..cols).map(|_| rng.gen_range(-1..max)).collect())
        .collect()
}

fn check_entry_bound(max: i64) -> Result<(), GenerateError> {
    if max <= -1 {
        return Err(GenerateError::EmptyEntryRange { max });
    }
    if max > MAX_ENTRY_BOUND {
        return Err(GenerateError::EntryBoundTooLarge { max });
    }
    Ok(())
}

fn check_dims(dims: &RangeInclusive<usize>) -> Result<(), GenerateError> {
    if *dims.start() < 2 || dims.is_empty() {
        return Err(GenerateError::BadDimensions {
            min: *dims.start(),
            max: *dims.end(),
        });
    }
    Ok(())
}

/// `n × m` matrix with entries of `U · P_r · V`, `U`, `V` drawn from
/// `[-1, max)`, rows sorted ascending, oracle rank exactly `rank`.
pub fn generate_matrix<R: Rng + ?Sized>(
    rng: &mut R,
    n: usize,
    m: usize,
    rank: usize,
    max: i64,
) -> Result<Matrix, GenerateError> {
    if rank > n.min(m) {
        return Err(GenerateError::RankOutOfRange {
            rank,
            rows: n,
            cols: m,
        });
    }
    check_entry_bound(max)?;
    loop {
        let u = draw_entries(rng, n, n, max);
        let v = draw_entries(rng, m, m, max);

        // U · P_r keeps the first `rank` columns of U, then right-multiply by V.
        let mut rows = low_rank_product(&u, &v, rank).ok_or(GenerateError::ProductOverflow {
            rows: n,
            cols: m,
        })?;
        rows.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));

        if matrix_rank(&rows)? == rank {
            return Ok(rows);
        }
    }
}

fn low_rank_product(u: &[Vec<i64>], v: &[Vec<i64>], rank: usize) -> Option<Matrix> {
    u.iter()
        .map(|u_row| {
            (0..v.first().map_or(0, Vec::len))
                .map(|j| {
                    (0..rank)
                        .try_fold(0_i64, |acc, k| acc.checked_add(u_row[k].checked_mul(v[k][j])?))
                        .map(|entry| entry as f64)
                })
                .collect()
        })
        .collect()
}

/// Square full-rank matrix with side drawn uniformly from `dims`.
pub fn generate_non_singular_matrix<R: Rng + ?Sized>(
    rng: &mut R,
    dims: RangeInclusive<usize>,
    max: i64,
) -> Result<Matrix, GenerateError> {
    check_dims(&dims)?;
    let n = rng.gen_range(dims);
    generate_matrix(rng, n, n, n, max)
}

/// Rank-deficient matrix: independent sides from `dims`, rank drawn from
/// `1..min(n, m)`.
pub fn generate_singular_matrix<R: Rng + ?Sized>(
    rng: &mut R,
    dims: RangeInclusive<usize>,
    max: i64,
) -> Result<Matrix, GenerateError> {
    check_dims(&dims)?;
    let n = rng.gen_range(dims.clone());
    let m = rng.gen_range(dims);
    let rank = rng.gen_range(1..n.min(m));
    generate_matrix(rng, n, m, rank, max)
}

/// Length-`n` vector with integer entries from `[-1, max)`.
pub fn generate_vector<R: Rng + ?Sized>(
    rng: &mut R,
    n: usize,
    max: i64,
) -> Result<Vec<f64>, GenerateError> {
    check_entry_bound(max)?;
    Ok((0..n).map(|_| rng.gen_range(-1..max) as f64).collect())
}

/// [`generate_vector`] clamped at zero, used for LP right-hand sides.
pub fn generate_nonnegative_vector<R: Rng + ?Sized>(
    rng: &mut R,
    n: usize,
    max: i64,
) -> Result<Vec<f64>, GenerateError> {
    Ok(generate_vector(rng, n, max)?
        .into_iter()
        .map(|x| x.max(0.0))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn requested_rank_and_shape_are_honoured() {
        let mut rng = StdRng::seed_from_u64(7);
        for (n, m, rank) in [(2, 2, 2), (3, 4, 2), (4, 2, 1), (4, 4, 3)] {
            let a = generate_matrix(&mut rng, n, m, rank, 3).expect("generate");
            assert_eq!(a.len(), n);
            assert!(a.iter().all(|row| row.len() == m));
            assert_eq!(matrix_rank(&a).expect("rank"), rank);
        }
    }

    #[test]
    fn rank_zero_is_the_zero_matrix() {
        let mut rng = StdRng::seed_from_u64(1);
        let a = generate_matrix(&mut rng, 3, 2, 0, 3).expect("generate");
        assert!(a.iter().flatten().all(|&x| x == 0.0));
    }

    #[test]
    fn unattainable_rank_is_rejected() {
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(
            generate_matrix(&mut rng, 2, 3, 3, 3),
            Err(GenerateError::RankOutOfRange {
                rank: 3,
                rows: 2,
                cols: 3
            })
        );
    }

    #[test]
    fn bad_bounds_are_rejected() {
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(
            generate_vector(&mut rng, 3, -1),
            Err(GenerateError::EmptyEntryRange { max: -1 })
        );
        assert!(matches!(
            generate_singular_matrix(&mut rng, 1..=4, 3),
            Err(GenerateError::BadDimensions { min: 1, max: 4 })
        ));
    }

    #[test]
    fn oversized_entry_bound_is_rejected_before_drawing() {
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(
            generate_matrix(&mut rng, 4, 4, 4, 10_000_000_000),
            Err(GenerateError::EntryBoundTooLarge {
                max: 10_000_000_000
            })
        );
        assert!(generate_vector(&mut rng, 2, MAX_ENTRY_BOUND + 1).is_err());
        let a = generate_matrix(&mut rng, 4, 4, 4, MAX_ENTRY_BOUND).expect("largest bound");
        assert_eq!(matrix_rank(&a).expect("rank"), 4);
    }

    #[test]
    fn overflowing_product_is_an_error() {
        let big = vec![vec![i64::MAX, 1], vec![1, 1]];
        assert_eq!(low_rank_product(&big, &big, 2), None);
        let small = vec![vec![2, 1], vec![1, 3]];
        assert_eq!(
            low_rank_product(&small, &small, 1),
            Some(vec![vec![4.0, 2.0], vec![2.0, 1.0]])
        );
    }

    #[test]
    fn rows_are_sorted_ascending() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..50 {
            let a = generate_non_singular_matrix(&mut rng, 2..=4, 3).expect("generate");
            assert!(a.windows(2).all(|w| w[0] <= w[1]));
        }
    }

    #[test]
    fn vectors_stay_in_range() {
        let mut rng = StdRng::seed_from_u64(11);
        let v = generate_vector(&mut rng, 200, 3).expect("vector");
        assert!(v.iter().all(|&x| (-1.0..3.0).contains(&x) && x.fract() == 0.0));
        let b = generate_nonnegative_vector(&mut rng, 200, 1000).expect("vector");
        assert!(b.iter().all(|&x| (0.0..1000.0).contains(&x)));
    }
}
