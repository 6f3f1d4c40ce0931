// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Deriving new views from old ones.

use num::Complex;

use crate::config::ViewConfig;
use crate::error::{MandelError, Result};

/// Return a view centred on `center` whose window is `factor` times
/// smaller than `view`'s: `factor > 1` zooms in, `factor < 1` zooms out.
/// Everything but the window is carried over and `view` is untouched.
pub fn zoom(view: &ViewConfig, center: Complex<f64>, factor: f64) -> Result<ViewConfig> {
    if !(factor.is_finite() && factor > 0.0) {
        return Err(MandelError::InvalidZoom(format!(
            "factor must be positive, got {}",
            factor
        )));
    }
    if !(center.re.is_finite() && center.im.is_finite()) {
        return Err(MandelError::InvalidZoom(format!(
            "centre must be finite, got {}",
            center
        )));
    }

    let half_re = (view.max_re() - view.min_re()).abs() / (2.0 * factor);
    let half_im = (view.max_im() - view.min_im()).abs() / (2.0 * factor);
    view.with_window(
        center.re - half_re,
        center.im - half_im,
        center.re + half_re,
        center.im + half_im,
    )
}

impl ViewConfig {
    /// The centre of the window.
    pub fn center(&self) -> Complex<f64> {
        Complex::new(
            (self.min_re() + self.max_re()) / 2.0,
            (self.min_im() + self.max_im()) / 2.0,
        )
    }

    /// See [`zoom`](fn.zoom.html).
    pub fn zoomed(&self, center: Complex<f64>, factor: f64) -> Result<ViewConfig> {
        zoom(self, center, factor)
    }
}
