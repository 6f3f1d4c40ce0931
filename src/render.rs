// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Turns a finished escape buffer into colours, and colours into an
//! image file.

use std::convert::TryFrom;
use std::path::Path;

use image::ColorType;

use crate::engine::EscapeBuffer;
use crate::error::{try_alloc, MandelError, Result};
use crate::palette::{channels, Palette};

/// Packed `0xRRGGBB` pixels of a rendered view, row-major.
#[derive(Clone, Debug, PartialEq)]
pub struct PixelBuffer {
    /// Image width in pixels.
    pub width: usize,
    /// Image height in pixels.
    pub height: usize,
    /// One packed colour per pixel.
    pub pixels: Vec<u32>,
}

impl PixelBuffer {
    /// Unpack into 8-bit RGB triples, the layout image encoders expect.
    pub fn to_rgb8(&self) -> Result<Vec<u8>> {
        let mut bytes: Vec<u8> = try_alloc(self.pixels.len() * 3)?;
        for (rgb, &pixel) in bytes.chunks_mut(3).zip(self.pixels.iter()) {
            rgb.copy_from_slice(&channels(pixel));
        }
        Ok(bytes)
    }

    /// Encode the pixels to `path`.  The format follows the file
    /// extension.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let sink_error = |reason: String| MandelError::Sink {
            path: path.display().to_string(),
            reason,
        };
        let width = u32::try_from(self.width)
            .map_err(|_| sink_error(format!("width {} is too large to encode", self.width)))?;
        let height = u32::try_from(self.height)
            .map_err(|_| sink_error(format!("height {} is too large to encode", self.height)))?;
        let bytes = self.to_rgb8()?;
        image::save_buffer(path, &bytes, width, height, ColorType::RGB(8))
            .map_err(|e| sink_error(e.to_string()))
    }
}

/// Colour every pixel of `buffer` through `palette`.
pub fn render(buffer: &EscapeBuffer, palette: &Palette) -> Result<PixelBuffer> {
    if palette.max_iterations() != buffer.max_iterations() {
        return Err(MandelError::InvalidConfig(format!(
            "palette built for {} iterations cannot colour a buffer of {}",
            palette.max_iterations(),
            buffer.max_iterations()
        )));
    }

    let mut pixels: Vec<u32> = try_alloc(buffer.len())?;
    for (pixel, &escape) in pixels.iter_mut().zip(buffer.as_slice()) {
        *pixel = palette[escape];
    }
    Ok(PixelBuffer {
        width: buffer.width(),
        height: buffer.height(),
        pixels,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ViewConfig;
    use crate::engine::RasterEngine;

    fn small_view(limit: u32) -> ViewConfig {
        ViewConfig::new(
            4,
            2,
            -2.0,
            -1.0,
            2.0,
            1.0,
            limit,
            vec![0x000000, 0xFFFFFF],
            0xFF0000,
        )
        .unwrap()
    }

    #[test]
    fn every_pixel_is_a_palette_lookup() {
        let view = small_view(50);
        let buffer = RasterEngine::with_threads(2).build(&view).unwrap();
        let palette = Palette::new(&view).unwrap();
        let image = render(&buffer, &palette).unwrap();
        assert_eq!(image.pixels.len(), 8);
        for (&pixel, &escape) in image.pixels.iter().zip(buffer.as_slice()) {
            assert_eq!(pixel, palette.as_slice()[escape as usize]);
        }
    }

    #[test]
    fn in_set_pixels_take_the_in_set_color() {
        let view = small_view(50);
        let buffer = RasterEngine::with_threads(1).build(&view).unwrap();
        let palette = Palette::new(&view).unwrap();
        let image = render(&buffer, &palette).unwrap();
        // Pixel (2, 1) is the origin.
        assert_eq!(buffer.get(2, 1), Some(50));
        assert_eq!(image.pixels[1 * 4 + 2], 0xFF0000);
    }

    #[test]
    fn mismatched_palette_is_rejected() {
        let buffer = RasterEngine::with_threads(1).build(&small_view(50)).unwrap();
        let palette = Palette::new(&small_view(20)).unwrap();
        assert!(render(&buffer, &palette).is_err());
    }

    #[test]
    fn rgb8_unpacks_channels() {
        let image = PixelBuffer {
            width: 2,
            height: 1,
            pixels: vec![0x102030, 0xFFFFFF],
        };
        assert_eq!(
            image.to_rgb8().unwrap(),
            vec![0x10, 0x20, 0x30, 0xFF, 0xFF, 0xFF]
        );
    }

    #[test]
    fn saves_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("view.png");
        let image = PixelBuffer {
            width: 2,
            height: 2,
            pixels: vec![0xFF0000, 0x00FF00, 0x0000FF, 0x000000],
        };
        image.save(&path).unwrap();
        let decoded = image::open(&path).unwrap().to_rgb();
        assert_eq!(decoded.get_pixel(0, 0).0, [0xFF, 0, 0]);
        assert_eq!(decoded.get_pixel(1, 1).0, [0, 0, 0]);
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn oversized_dimensions_are_a_sink_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wide.png");
        let image = PixelBuffer {
            width: u32::max_value() as usize + 1,
            height: 1,
            pixels: Vec::new(),
        };
        let err = image.save(&path).unwrap_err();
        assert!(matches!(err, MandelError::Sink { .. }));
        assert!(!path.exists());
    }

    #[test]
    fn unwritable_path_is_a_sink_error() {
        let image = PixelBuffer {
            width: 1,
            height: 1,
            pixels: vec![0],
        };
        let err = image.save("/definitely/not/here/view.png").unwrap_err();
        assert!(matches!(err, MandelError::Sink { .. }));
    }
}
