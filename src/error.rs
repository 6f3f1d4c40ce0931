// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Every way a view can fail to be configured, built, or written.

use failure::Fail;

/// The errors produced by this crate.  Configuration problems are
/// reported before any thread is started; everything else aborts the
/// build as a whole.
#[derive(Debug, Fail)]
pub enum MandelError {
    /// The pixel grid and the complex-plane window have different shapes.
    #[fail(
        display = "aspect ratio of the {}x{} image ({}) does not match the plane window ({})",
        width, height, image, plane
    )]
    AspectRatio {
        /// Image width in pixels.
        width: usize,
        /// Image height in pixels.
        height: usize,
        /// `width / height`
        image: f64,
        /// `|maxRe - minRe| / |maxIm - minIm|`
        plane: f64,
    },

    /// There are more gradient transitions than iteration buckets.
    #[fail(
        display = "a gradient of {} stops needs at least {} iterations, got {}",
        stops, required, max_iterations
    )]
    GradientTooLong {
        /// Number of gradient stops supplied.
        stops: usize,
        /// Smallest iteration bound that fits the gradient.
        required: u32,
        /// The iteration bound supplied.
        max_iterations: u32,
    },

    /// Some other field of the configuration is unusable.
    #[fail(display = "invalid configuration: {}", _0)]
    InvalidConfig(String),

    /// A zoom request with a non-positive or non-finite factor or centre.
    #[fail(display = "invalid zoom: {}", _0)]
    InvalidZoom(String),

    /// The escape buffer or one of its bands could not be allocated.
    #[fail(
        display = "not enough memory for {} pixels; reduce the image size and try again",
        pixels
    )]
    ResourceExhaustion {
        /// The number of cells that could not be allocated.
        pixels: usize,
    },

    /// The build was superseded by a newer one, or cancelled outright.
    #[fail(display = "build cancelled")]
    Cancelled,

    /// A worker thread died before delivering its band.
    #[fail(display = "a render worker failed: {}", _0)]
    WorkerFailed(String),

    /// The configuration file could not be read or parsed.
    #[fail(display = "could not read configuration {}: {}", path, reason)]
    Parse {
        /// Where the configuration came from.
        path: String,
        /// What went wrong.
        reason: String,
    },

    /// The image could not be encoded or written.
    #[fail(display = "could not write image to {}: {}", path, reason)]
    Sink {
        /// The requested output path.
        path: String,
        /// What went wrong.
        reason: String,
    },
}

/// Shorthand used throughout the crate.
pub type Result<T> = std::result::Result<T, MandelError>;

/// Allocate a zeroed buffer of `len` cells, reporting failure instead of
/// aborting the process.
pub(crate) fn try_alloc<T: Clone + Default>(len: usize) -> Result<Vec<T>> {
    let mut buffer = Vec::new();
    buffer
        .try_reserve_exact(len)
        .map_err(|_| MandelError::ResourceExhaustion { pixels: len })?;
    buffer.resize(len, T::default());
    Ok(buffer)
}
