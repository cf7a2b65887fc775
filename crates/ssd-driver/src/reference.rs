//! Software SSD reference
//!
//! Golden model for the accelerator. Differences are taken in `i32` so that
//! `i16` subtraction can never wrap; squares are non-negative and are summed
//! as unsigned.
//!
//! ## Accumulator width
//!
//! A single `i16` difference squared is at most `65535² = 0xFFFE_0001`, which
//! still fits `u32`, but two such terms do not. Two entry points cover this:
//!
//! - [`compute_distance`] sums in `u64` and refuses results that the 32-bit
//!   result register cannot represent. Any input with every `|v[i] - t[i]|`
//!   at most 37 837 is accepted for three samples (`3 · 37837² < 2³²`).
//! - [`compute_distance_wrapping`] reproduces a 32-bit hardware accumulator
//!   bit for bit, wrapping on overflow. Register models use this one.

use crate::distance::Distance;
use crate::error::{Result, SsdError};

fn squared_differences<'a>(
    vector: &'a [i16],
    template: &'a [i16],
) -> impl Iterator<Item = u32> + 'a {
    vector.iter().zip(template).map(|(&v, &t)| {
        let diff = i32::from(v) - i32::from(t);
        diff.unsigned_abs().pow(2)
    })
}

fn check_lengths(vector: &[i16], template: &[i16]) -> Result<()> {
    if vector.len() == template.len() {
        Ok(())
    } else {
        Err(SsdError::length_mismatch(vector.len(), template.len()))
    }
}

/// SSD between `vector` and `template`.
///
/// # Errors
///
/// Returns error if the lengths differ or the exact sum exceeds `u32::MAX`.
pub fn compute_distance(vector: &[i16], template: &[i16]) -> Result<Distance> {
    check_lengths(vector, template)?;
    let wide: u64 = squared_differences(vector, template).map(u64::from).sum();
    u32::try_from(wide)
        .map(Distance::new)
        .map_err(|_| SsdError::DistanceOverflow { wide })
}

/// SSD as a 32-bit wrapping accumulator computes it.
///
/// # Errors
///
/// Returns error if the lengths differ.
pub fn compute_distance_wrapping(vector: &[i16], template: &[i16]) -> Result<Distance> {
    check_lengths(vector, template)?;
    let sum = squared_differences(vector, template).fold(0u32, u32::wrapping_add);
    Ok(Distance::new(sum))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ssd_chip::rom::SAMPLES_BY_ID;

    const CAPTURED: [i16; 3] = [2, 20, 10];

    #[test]
    fn bench_vector_against_z() {
        assert_eq!(compute_distance(&CAPTURED, &[1, 2, 3]).unwrap(), Distance::new(374));
    }

    #[test]
    fn bench_vector_against_h() {
        assert_eq!(
            compute_distance(&CAPTURED, &[100, 100, 100]).unwrap(),
            Distance::new(24_104)
        );
    }

    #[test]
    fn identity_is_zero() {
        for v in [[0, 0, 0], [i16::MIN, 0, i16::MAX], [-7, 3, 12_000], CAPTURED] {
            assert_eq!(compute_distance(&v, &v).unwrap(), Distance::ZERO);
        }
    }

    #[test]
    fn checked_distance_is_symmetric() {
        let mut samples = vec![CAPTURED, [100, 100, 100], [-300, 250, 0]];
        samples.extend(SAMPLES_BY_ID);
        for a in &samples {
            for b in &samples {
                let ab = compute_distance(a, b).unwrap();
                let ba = compute_distance(b, a).unwrap();
                assert_eq!(ab, ba, "{a:?} vs {b:?}");
            }
        }
    }

    #[test]
    fn wrapping_distance_is_symmetric() {
        let samples: [[i16; 3]; 5] = [
            CAPTURED,
            [100, 100, 100],
            [-300, 250, 0],
            [i16::MIN, 0, 5],
            [i16::MAX, -1, 1],
        ];
        for a in &samples {
            for b in &samples {
                let ab = compute_distance_wrapping(a, b).unwrap();
                let ba = compute_distance_wrapping(b, a).unwrap();
                assert_eq!(ab, ba, "{a:?} vs {b:?}");
            }
        }
    }

    #[test]
    fn extreme_single_difference_fits() {
        // 65535² = 4_294_836_225
        let d = compute_distance(&[i16::MAX], &[i16::MIN]).unwrap();
        assert_eq!(d.get(), 4_294_836_225);
    }

    #[test]
    fn overflow_is_reported_not_wrapped() {
        let v = [i16::MAX, i16::MAX, 0];
        let t = [i16::MIN, i16::MIN, 0];
        let err = compute_distance(&v, &t).unwrap_err();
        assert!(matches!(err, SsdError::DistanceOverflow { wide: 8_589_672_450 }));

        let wrapped = compute_distance_wrapping(&v, &t).unwrap();
        assert_eq!(u64::from(wrapped.get()), 8_589_672_450 % (1u64 << 32));
    }

    #[test]
    fn length_mismatch_fails_loudly() {
        let err = compute_distance(&[1, 2, 3], &[1, 2]).unwrap_err();
        assert!(matches!(err, SsdError::LengthMismatch { expected: 3, actual: 2 }));
        assert!(compute_distance_wrapping(&[1], &[]).is_err());
    }
}
