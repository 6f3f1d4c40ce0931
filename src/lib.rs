#![deny(missing_docs)]
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Mandelbrot renderer
//!
//! The Mandelbrot set is the set of points `c` on the complex plane for
//! which the orbit `z = z * z + c`, started at zero, stays bounded.
//! Points outside the set escape, and the number of iterations they
//! take to pass a radius of 2 is their escape time.  Colouring every
//! pixel of a window by its escape time gives the familiar picture.
//!
//! A render goes through these steps:
//!
//! * a validated [`ViewConfig`](config/struct.ViewConfig.html) says
//!   what to compute;
//! * the [`RasterEngine`](engine/struct.RasterEngine.html) splits the
//!   image into row bands and computes them in parallel into an
//!   [`EscapeBuffer`](engine/struct.EscapeBuffer.html);
//! * a [`Palette`](palette/struct.Palette.html) derived from the
//!   view's gradient turns escape counts into colours;
//! * [`render`](render/fn.render.html) produces the final pixels,
//!   which can be written to any format the `image` crate knows.
//!
//! New views are derived from old ones with
//! [`zoom`](zoom/fn.zoom.html).

pub mod config;
pub mod engine;
pub mod error;
pub mod escape;
pub mod palette;
pub mod planes;
pub mod render;
pub mod zoom;

pub use config::ViewConfig;
pub use engine::{observer_fn, BuildObserver, BuildStats, EscapeBuffer, RasterEngine};
pub use error::MandelError;
pub use escape::escape_time;
pub use palette::Palette;
pub use render::{render, PixelBuffer};
pub use zoom::zoom;
