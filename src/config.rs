// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The description of a view: which rectangle of the complex plane to
//! compute, at what resolution, how deeply, and in what colours.  A
//! `ViewConfig` can only be obtained through validation, so everything
//! downstream may assume its invariants hold.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::{MandelError, Result};

/// Relative tolerance used when comparing the pixel aspect ratio with
/// the plane aspect ratio.  Zoomed windows are derived arithmetically
/// and rarely reproduce the ratio to the last bit.
const ASPECT_TOLERANCE: f64 = 1e-9;

/// The largest value a packed `0xRRGGBB` colour may take.
pub const MAX_RGB: u32 = 0x00FF_FFFF;

/// An immutable, validated view of the Mandelbrot set.
#[derive(Clone, Debug, PartialEq)]
pub struct ViewConfig {
    width: usize,
    height: usize,
    min_re: f64,
    min_im: f64,
    max_re: f64,
    max_im: f64,
    max_iterations: u32,
    gradient: Vec<u32>,
    in_set_color: u32,
}

/// The configuration record as it appears on disk.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawConfig {
    /// Image width in pixels.
    pub width: usize,
    /// Image height in pixels.
    pub height: usize,
    /// Left edge of the window.
    pub min_re: f64,
    /// Bottom edge of the window.
    pub min_im: f64,
    /// Right edge of the window.
    pub max_re: f64,
    /// Top edge of the window.
    pub max_im: f64,
    /// Iteration bound.
    #[serde(rename = "nMax", alias = "maxIterations")]
    pub max_iterations: u32,
    /// Gradient stops as packed RGB integers.
    pub gradient: Vec<u32>,
    /// Colour of points that never escape.
    #[serde(alias = "inSetColor")]
    pub color: u32,
}

impl ViewConfig {
    /// Validate the parameters and build a view.  The window is given
    /// as its lower-left and upper-right corners.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        width: usize,
        height: usize,
        min_re: f64,
        min_im: f64,
        max_re: f64,
        max_im: f64,
        max_iterations: u32,
        gradient: Vec<u32>,
        in_set_color: u32,
    ) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(MandelError::InvalidConfig(format!(
                "image dimensions must be positive, got {}x{}",
                width, height
            )));
        }

        if width.checked_mul(height).is_none() {
            return Err(MandelError::ResourceExhaustion {
                pixels: usize::max_value(),
            });
        }

        if [min_re, min_im, max_re, max_im].iter().any(|v| !v.is_finite()) {
            return Err(MandelError::InvalidConfig(
                "window coordinates must be finite".to_string(),
            ));
        }

        if max_re <= min_re {
            return Err(MandelError::InvalidConfig(
                "maxRe must be greater than minRe".to_string(),
            ));
        }

        if max_im <= min_im {
            return Err(MandelError::InvalidConfig(
                "maxIm must be greater than minIm".to_string(),
            ));
        }

        if max_iterations == 0 {
            return Err(MandelError::InvalidConfig(
                "the iteration bound must be positive".to_string(),
            ));
        }

        if gradient.len() < 2 {
            return Err(MandelError::InvalidConfig(format!(
                "a gradient needs at least two stops, got {}",
                gradient.len()
            )));
        }

        if let Some(bad) = gradient
            .iter()
            .chain(std::iter::once(&in_set_color))
            .find(|&&c| c > MAX_RGB)
        {
            return Err(MandelError::InvalidConfig(format!(
                "colour {:#x} is not a packed RGB value",
                bad
            )));
        }

        // Each transition between two stops needs at least one slot.
        if gradient.len() - 1 > (max_iterations - 1) as usize {
            return Err(MandelError::GradientTooLong {
                stops: gradient.len(),
                required: gradient.len() as u32,
                max_iterations,
            });
        }

        let image = width as f64 / height as f64;
        let plane = (max_re - min_re).abs() / (max_im - min_im).abs();
        if ((image - plane) / plane).abs() > ASPECT_TOLERANCE {
            return Err(MandelError::AspectRatio {
                width,
                height,
                image,
                plane,
            });
        }

        Ok(ViewConfig {
            width,
            height,
            min_re,
            min_im,
            max_re,
            max_im,
            max_iterations,
            gradient,
            in_set_color,
        })
    }

    /// Parse and validate a YAML configuration document.
    pub fn from_yaml_str(source: &str) -> Result<Self> {
        let raw: RawConfig = serde_yaml::from_str(source).map_err(|e| MandelError::Parse {
            path: "<string>".to_string(),
            reason: e.to_string(),
        })?;
        ViewConfig::from_raw(raw)
    }

    /// Read, parse and validate a YAML configuration file.
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let parse_error = |reason: String| MandelError::Parse {
            path: path.display().to_string(),
            reason,
        };
        let source = fs::read_to_string(path).map_err(|e| parse_error(e.to_string()))?;
        let raw: RawConfig =
            serde_yaml::from_str(&source).map_err(|e| parse_error(e.to_string()))?;
        ViewConfig::from_raw(raw)
    }

    /// Validate a record that has already been deserialized.
    pub fn from_raw(raw: RawConfig) -> Result<Self> {
        ViewConfig::new(
            raw.width,
            raw.height,
            raw.min_re,
            raw.min_im,
            raw.max_re,
            raw.max_im,
            raw.max_iterations,
            raw.gradient,
            raw.color,
        )
    }

    /// Image width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Image height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of pixels in the image.
    pub fn len(&self) -> usize {
        self.width * self.height
    }

    /// Always false; a validated view has at least one pixel.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Left edge of the window.
    pub fn min_re(&self) -> f64 {
        self.min_re
    }

    /// Bottom edge of the window.
    pub fn min_im(&self) -> f64 {
        self.min_im
    }

    /// Right edge of the window.
    pub fn max_re(&self) -> f64 {
        self.max_re
    }

    /// Top edge of the window.
    pub fn max_im(&self) -> f64 {
        self.max_im
    }

    /// Iteration bound.
    pub fn max_iterations(&self) -> u32 {
        self.max_iterations
    }

    /// Gradient stops.
    pub fn gradient(&self) -> &[u32] {
        &self.gradient
    }

    /// Colour of points that never escape.
    pub fn in_set_color(&self) -> u32 {
        self.in_set_color
    }

    pub(crate) fn with_window(
        &self,
        min_re: f64,
        min_im: f64,
        max_re: f64,
        max_im: f64,
    ) -> Result<Self> {
        ViewConfig::new(
            self.width,
            self.height,
            min_re,
            min_im,
            max_re,
            max_im,
            self.max_iterations,
            self.gradient.clone(),
            self.in_set_color,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn standard() -> Result<ViewConfig> {
        ViewConfig::new(
            4,
            2,
            -2.0,
            -1.0,
            2.0,
            1.0,
            50,
            vec![0x000000, 0xFFFFFF],
            0xFF0000,
        )
    }

    #[test]
    fn accepts_matching_shapes() {
        let view = standard().unwrap();
        assert_eq!(view.len(), 8);
        assert_eq!(view.max_iterations(), 50);
        assert_eq!(view.gradient(), &[0x000000, 0xFFFFFF]);
    }

    #[test]
    fn rejects_aspect_mismatch() {
        let err = ViewConfig::new(2, 2, -2.0, -1.0, 2.0, 1.0, 50, vec![0, 0xFFFFFF], 0)
            .unwrap_err();
        match err {
            MandelError::AspectRatio { image, plane, .. } => {
                assert_eq!(image, 1.0);
                assert_eq!(plane, 2.0);
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn rejects_gradient_longer_than_palette() {
        let err = ViewConfig::new(4, 2, -2.0, -1.0, 2.0, 1.0, 3, vec![0, 1, 2, 3], 0)
            .unwrap_err();
        assert!(matches!(
            err,
            MandelError::GradientTooLong {
                stops: 4,
                required: 4,
                max_iterations: 3
            }
        ));
    }

    #[test]
    fn smallest_fitting_gradient_is_accepted() {
        assert!(ViewConfig::new(4, 2, -2.0, -1.0, 2.0, 1.0, 4, vec![0, 1, 2, 3], 0).is_ok());
    }

    #[test]
    fn rejects_inverted_window() {
        let err = ViewConfig::new(4, 2, 2.0, -1.0, -2.0, 1.0, 50, vec![0, 1], 0).unwrap_err();
        assert!(matches!(err, MandelError::InvalidConfig(_)));
    }

    #[test]
    fn rejects_degenerate_input() {
        let gradient = vec![0, 0xFFFFFF];
        assert!(ViewConfig::new(0, 2, -2.0, -1.0, 2.0, 1.0, 50, gradient.clone(), 0).is_err());
        assert!(ViewConfig::new(4, 2, -2.0, -1.0, 2.0, 1.0, 0, gradient.clone(), 0).is_err());
        assert!(ViewConfig::new(4, 2, -2.0, -1.0, 2.0, 1.0, 50, vec![0], 0).is_err());
        assert!(
            ViewConfig::new(4, 2, std::f64::NAN, -1.0, 2.0, 1.0, 50, gradient.clone(), 0)
                .is_err()
        );
        assert!(ViewConfig::new(4, 2, -2.0, -1.0, 2.0, 1.0, 50, gradient, 0x1000000).is_err());
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn rejects_pixel_counts_that_overflow() {
        let side = 1usize << 33;
        let err = ViewConfig::new(side, side, -2.0, -2.0, 2.0, 2.0, 10, vec![0, 0xFFFFFF], 0)
            .unwrap_err();
        assert!(matches!(err, MandelError::ResourceExhaustion { .. }));
    }

    #[test]
    fn parses_yaml() {
        let view = ViewConfig::from_yaml_str(
            "width: 4\nheight: 2\nminRe: -2.0\nminIm: -1.0\nmaxRe: 2.0\nmaxIm: 1.0\n\
             nMax: 50\ngradient: [0, 16777215]\ncolor: 16711680\n",
        )
        .unwrap();
        assert_eq!(view, standard().unwrap());
    }

    #[test]
    fn yaml_accepts_long_names() {
        let view = ViewConfig::from_yaml_str(
            "width: 4\nheight: 2\nminRe: -2.0\nminIm: -1.0\nmaxRe: 2.0\nmaxIm: 1.0\n\
             maxIterations: 50\ngradient: [0, 16777215]\ninSetColor: 16711680\n",
        )
        .unwrap();
        assert_eq!(view.in_set_color(), 0xFF0000);
    }

    #[test]
    fn yaml_missing_field_is_a_parse_error() {
        let err = ViewConfig::from_yaml_str("width: 4\n").unwrap_err();
        assert!(matches!(err, MandelError::Parse { .. }));
    }

    #[test]
    fn missing_file_is_a_parse_error() {
        let err = ViewConfig::from_yaml_file("/definitely/not/here.yaml").unwrap_err();
        assert!(matches!(err, MandelError::Parse { .. }));
    }
}
