// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The escape-time function.  This is the inner loop of every build.

use num::Complex;

/// The orbit has escaped once |z| exceeds this radius.
pub const ESCAPE_RADIUS: f64 = 2.0;

/// Iterate `z = z * z + c` from `z = 0` and return the first `n` in
/// `1..=limit` for which `|z_n| > 2`.  Points whose orbit stays bounded
/// for `limit` iterations are reported as `limit`, which the palette
/// reserves for the in-set colour.
#[inline]
pub fn escape_time(c: Complex<f64>, limit: u32) -> u32 {
    let mut z: Complex<f64> = Complex { re: 0.0, im: 0.0 };
    for n in 1..=limit {
        z = z * z + c;
        if z.norm_sqr() > ESCAPE_RADIUS * ESCAPE_RADIUS {
            return n;
        }
    }
    limit
}
