// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The per-row escape-time computation.
//!
//! Each column runs exactly `iterations` rounds with no early exit.
//! While `|z| < horizon`, both the iterate and the raw count advance;
//! once the magnitude crosses the horizon, *neither* is updated again,
//! so `n` freezes at the round where escape was first detected and `z`
//! freezes at its value from that same round.  The freeze is shared
//! between `z` and `n` deliberately; the smoothed color index every
//! renderer consumes depends on it, so it must not be replaced with a
//! conventional early-exit loop.

use std::f64::consts::LN_2;

use errors::FractalError;
use shm;
use task::TaskBuffers;

/// The smoothing formula applied after the round loop.  Interior
/// points and any magnitude whose iterated logarithm is undefined
/// collapse to `0.0` rather than propagating a math fault; the mask is
/// strictly per-pixel.
fn smooth(n: f64, magnitude: f64, log_horizon: f64) -> f64 {
    let value = n + 1.0 - magnitude.ln().ln() / LN_2 + log_horizon;
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// Runs the escape-time recurrence over every row the task owns,
/// reading and rewriting only those rows.  `C` is rewritten unchanged;
/// the other three buffers carry the results.
pub fn row_set_calc(
    horizon: f64,
    iterations: usize,
    rows: &TaskBuffers,
) -> Result<(), FractalError> {
    let log_horizon = horizon.ln().ln() / LN_2;
    for row in rows.rows() {
        let c = shm::unpack_complexes(&rows.c.read(row)?);
        let mut z = shm::unpack_complexes(&rows.z.read(row)?);
        let mut n = shm::unpack_reals(&rows.n.read(row)?);
        let mut q = shm::unpack_reals(&rows.q.read(row)?);

        for col in 0..c.len() {
            for round in 0..iterations {
                if z[col].norm() < horizon {
                    z[col] = z[col] * z[col] + c[col];
                    n[col] = round as f64;
                }
            }
            // iterations-1 means the point never escaped: interior sentinel.
            if n[col] == (iterations - 1) as f64 {
                n[col] = 0.0;
            }
            q[col] = smooth(n[col], z[col].norm(), log_horizon);
        }

        rows.c.write(row, &shm::pack_complexes(&c))?;
        rows.z.write(row, &shm::pack_complexes(&z))?;
        rows.n.write(row, &shm::pack_reals(&n))?;
        rows.q.write(row, &shm::pack_reals(&q))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn smoothing_masks_zero_magnitude() {
        let log_horizon = (68719476736.0_f64).ln().ln() / LN_2;
        assert_eq!(smooth(0.0, 0.0, log_horizon), 0.0);
    }

    #[test]
    fn smoothing_masks_sub_unit_magnitude() {
        let log_horizon = (68719476736.0_f64).ln().ln() / LN_2;
        assert_eq!(smooth(0.0, 0.5, log_horizon), 0.0);
        assert_eq!(smooth(0.0, 1.0, log_horizon), 0.0);
    }

    #[test]
    fn smoothing_is_finite_for_escaped_magnitudes() {
        let log_horizon = (68719476736.0_f64).ln().ln() / LN_2;
        let value = smooth(6.0, 1.2e19, log_horizon);
        assert!(value.is_finite());
        assert!(value > 0.0);
    }
}
