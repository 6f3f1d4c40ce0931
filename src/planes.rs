//! Contains the PlaneMapper struct, which describes a relationship
//! between a rectangle on the integral plane with an origin at 0,0 in
//! the upper-left corner, and a rectangle on the complex plane whose
//! upper-left corner is (minRe, maxIm).  Rows grow downward while the
//! imaginary axis grows upward, so the vertical axis is flipped.
use num::Complex;

use crate::config::ViewConfig;

/// Describes the column and row of a pixel.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Pixel(pub usize, pub usize);

/// Maps pixels of a view onto the complex plane.  A single step size
/// is used for both axes; validated views have square pixels.
#[derive(Copy, Clone, Debug)]
pub struct PlaneMapper {
    /// Width and height of the integral plane.
    pub bounds: (usize, usize),
    // The complex coordinate of pixel (0, 0).
    origin: Complex<f64>,
    // The distance between neighbouring pixels on the complex plane.
    step: f64,
}

impl PlaneMapper {
    /// Build the mapping for a view.
    pub fn new(view: &ViewConfig) -> PlaneMapper {
        PlaneMapper {
            bounds: (view.width(), view.height()),
            origin: Complex::new(view.min_re(), view.max_im()),
            step: (view.max_re() - view.min_re()).abs() / (view.width() as f64),
        }
    }

    /// The total number of points in the integral grid.
    pub fn len(&self) -> usize {
        self.bounds.0 * self.bounds.1
    }

    /// Describes that the integral plane is of a size.
    pub fn is_empty(&self) -> bool {
        self.bounds.0 == 0 || self.bounds.1 == 0
    }

    /// The distance between neighbouring pixels on the complex plane.
    pub fn step(&self) -> f64 {
        self.step
    }

    /// Given the column and row of a pixel, return the complex number
    /// at that pixel's upper-left corner.
    #[inline]
    pub fn pixel_to_point(&self, pixel: &Pixel) -> Complex<f64> {
        Complex::new(
            self.origin.re + self.step * (pixel.0 as f64),
            self.origin.im - self.step * (pixel.1 as f64),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapper(width: usize, height: usize, ll: (f64, f64), ur: (f64, f64)) -> PlaneMapper {
        let view = ViewConfig::new(width, height, ll.0, ll.1, ur.0, ur.1, 10, vec![0, 1], 0)
            .unwrap();
        PlaneMapper::new(&view)
    }

    #[test]
    fn pixel_to_point_on_positive_planes() {
        let pm = mapper(5, 5, (0.0, 0.0), (5.0, 5.0));
        assert_eq!(pm.pixel_to_point(&Pixel(0, 0)), Complex::new(0.0, 5.0));
        assert_eq!(pm.pixel_to_point(&Pixel(2, 2)), Complex::new(2.0, 3.0));
        assert_eq!(pm.pixel_to_point(&Pixel(4, 4)), Complex::new(4.0, 1.0));
    }

    #[test]
    fn pixel_to_points_on_mixed_planes() {
        let pm = mapper(4, 4, (-2.0, -2.0), (2.0, 2.0));
        assert_eq!(pm.pixel_to_point(&Pixel(2, 2)), Complex::new(0.0, 0.0));
        assert_eq!(pm.pixel_to_point(&Pixel(0, 0)), Complex::new(-2.0, 2.0));
        assert_eq!(pm.pixel_to_point(&Pixel(4, 4)), Complex::new(2.0, -2.0));
    }

    #[test]
    fn rows_descend_the_imaginary_axis() {
        let pm = mapper(4, 2, (-2.0, -1.0), (2.0, 1.0));
        assert_eq!(pm.step(), 1.0);
        let top = pm.pixel_to_point(&Pixel(1, 0));
        let below = pm.pixel_to_point(&Pixel(1, 1));
        assert_eq!(top.re, below.re);
        assert!(below.im < top.im);
    }

    #[test]
    fn len_counts_every_pixel() {
        let pm = mapper(640, 480, (-2.0, -1.5), (2.0, 1.5));
        assert_eq!(pm.len(), 640 * 480);
        assert!(!pm.is_empty());
    }
}
