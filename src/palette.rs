// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Derives the colour lookup table for a view.
//!
//! The gradient is treated as a chain of linear transitions, one per
//! consecutive pair of stops.  The `maxIterations - 1` escape counts
//! below the bound are shared out evenly between the transitions, the
//! last one absorbing the remainder and ending exactly on the final
//! stop.  Channels are interpolated independently and truncated toward
//! zero, so the table is bit-for-bit reproducible.

use std::ops::Index;

use crate::config::ViewConfig;
use crate::error::{MandelError, Result};

/// Pack three 8-bit channels into `0xRRGGBB`.
#[inline]
pub fn rgb(red: u8, green: u8, blue: u8) -> u32 {
    (u32::from(red) << 16) | (u32::from(green) << 8) | u32::from(blue)
}

/// Split `0xRRGGBB` into its channels.
#[inline]
pub fn channels(color: u32) -> [u8; 3] {
    [(color >> 16) as u8, (color >> 8) as u8, color as u8]
}

/// A lookup table of `maxIterations + 1` packed colours indexed by
/// escape count.  Index `maxIterations` is the in-set colour.
#[derive(Clone, Debug, PartialEq)]
pub struct Palette {
    colors: Vec<u32>,
}

impl Palette {
    /// Build the palette for a validated view.
    pub fn new(view: &ViewConfig) -> Result<Palette> {
        Palette::build(view.gradient(), view.in_set_color(), view.max_iterations())
    }

    /// Build a palette from its parts.  Fails when the gradient has
    /// fewer than two stops or more transitions than there are escape
    /// counts to colour.
    pub fn build(gradient: &[u32], in_set_color: u32, max_iterations: u32) -> Result<Palette> {
        if gradient.len() < 2 {
            return Err(MandelError::InvalidConfig(format!(
                "a gradient needs at least two stops, got {}",
                gradient.len()
            )));
        }
        if max_iterations == 0 || gradient.len() - 1 > (max_iterations - 1) as usize {
            return Err(MandelError::GradientTooLong {
                stops: gradient.len(),
                required: gradient.len() as u32,
                max_iterations,
            });
        }

        let slots = (max_iterations - 1) as usize;
        let transitions = gradient.len() - 1;
        let length = slots / transitions;
        let remainder = slots % transitions;

        let mut colors = Vec::new();
        colors
            .try_reserve_exact(slots + 2)
            .map_err(|_| MandelError::ResourceExhaustion { pixels: slots + 2 })?;

        // Escape counts start at 1; slot 0 only pads the table so that it
        // can be indexed by the count directly.
        colors.push(gradient[0]);
        for pair in gradient[..transitions].windows(2) {
            colors.extend(transition(pair[0], pair[1], length, false));
        }
        colors.extend(transition(
            gradient[transitions - 1],
            gradient[transitions],
            length + remainder,
            true,
        ));
        colors.push(in_set_color);

        debug_assert_eq!(colors.len(), max_iterations as usize + 1);
        Ok(Palette { colors })
    }

    /// Number of entries, always `maxIterations + 1`.
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    /// Never true for a built palette.
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// The iteration bound this palette was built for.
    pub fn max_iterations(&self) -> u32 {
        (self.colors.len() - 1) as u32
    }

    /// The colour of points that never escape.
    pub fn in_set_color(&self) -> u32 {
        self.colors[self.colors.len() - 1]
    }

    /// The whole table.
    pub fn as_slice(&self) -> &[u32] {
        &self.colors
    }
}

impl Index<u32> for Palette {
    type Output = u32;

    fn index(&self, escape: u32) -> &u32 {
        &self.colors[escape as usize]
    }
}

/// `slots` colours running from `start` toward `end`.  The end colour
/// itself is only produced when `include_end` is set, in which case it
/// is the last entry.
fn transition(start: u32, end: u32, slots: usize, include_end: bool) -> impl Iterator<Item = u32> {
    let steps = if include_end { slots.saturating_sub(1) } else { slots };
    let from = channels(start);
    let to = channels(end);
    let delta: Vec<f64> = from
        .iter()
        .zip(to.iter())
        .map(|(&s, &e)| {
            if steps == 0 {
                0.0
            } else {
                (f64::from(e) - f64::from(s)) / steps as f64
            }
        })
        .collect();

    (0..slots).map(move |i| {
        let channel = |c: usize| (f64::from(from[c]) + delta[c] * i as f64) as u8;
        rgb(channel(0), channel(1), channel(2))
    })
}
