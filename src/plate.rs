//! Circular plate shading: modal superposition, circular mask, nodal lines.
//!
//! CPU reference of `shader.wgsl`. The GPU path is what the window shows;
//! this one backs the snapshot mode and the tests.

use glam::Vec2;
use image::{Rgba, RgbaImage};
use std::f32::consts::PI;

use crate::audio::ModeVector;
use crate::params::{ShadingParams, NUM_MODES, PLATE_FREQUENCY_CYCLE};

/// Spatial frequency pair (m, n) driven by mode `index`.
///
/// Fixed index → frequency assignment, not derived from circular plate
/// eigenmodes.
pub fn mode_pair(index: usize) -> (u32, u32) {
    let i = index as u32;
    let m = i % PLATE_FREQUENCY_CYCLE + 1;
    let n = (i / 4) % PLATE_FREQUENCY_CYCLE + 1;
    (m, n)
}

/// sin(mπx)·sin(nπy) for one mode
pub fn mode_shape(index: usize, p: Vec2) -> f32 {
    let (m, n) = mode_pair(index);
    (m as f32 * PI * p.x).sin() * (n as f32 * PI * p.y).sin()
}

/// Superposed plate displacement at `p` (mode 0 does not contribute)
pub fn displacement(modes: &ModeVector, p: Vec2) -> f32 {
    modes
        .amplitudes()
        .iter()
        .enumerate()
        .skip(1)
        .map(|(i, &a)| a * mode_shape(i, p))
        .sum()
}

/// Brightness from |z|: 1.0 on a nodal line, 0.0 once |z| reaches the band
pub fn sand(z: f32, params: &ShadingParams) -> f32 {
    1.0 - smoothstep(0.0, params.nodal_band, z.abs())
}

/// Grayscale shade at plate coordinates `p`, None outside the unit disc
pub fn shade(modes: &ModeVector, p: Vec2, params: &ShadingParams) -> Option<f32> {
    if p.length() > 1.0 {
        return None;
    }
    Some(sand(displacement(modes, p), params))
}

/// Pixel center → plate coordinates in [-1, 1]², y up
pub fn pixel_to_plate(x: u32, y: u32, width: u32, height: u32) -> Vec2 {
    Vec2::new(
        (x as f32 + 0.5) / width as f32 * 2.0 - 1.0,
        1.0 - (y as f32 + 0.5) / height as f32 * 2.0,
    )
}

/// Render the plate on a black background
pub fn rasterize(modes: &ModeVector, width: u32, height: u32, params: &ShadingParams) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, y| {
        match shade(modes, pixel_to_plate(x, y, width, height), params) {
            Some(level) => {
                let v = (level.clamp(0.0, 1.0) * 255.0).round() as u8;
                Rgba([v, v, v, 255])
            }
            None => Rgba([0, 0, 0, 255]),
        }
    })
}

fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

// Shader relies on this to pack the amplitudes as vec4s
const _: () = assert!(NUM_MODES % 4 == 0);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_pairs() {
        assert_eq!(mode_pair(0), (1, 1));
        assert_eq!(mode_pair(1), (2, 1));
        assert_eq!(mode_pair(5), (6, 2));
        assert_eq!(mode_pair(8), (1, 3));
        assert_eq!(mode_pair(31), (8, 8));

        for i in 0..NUM_MODES {
            let (m, n) = mode_pair(i);
            assert!((1..=8).contains(&m) && (1..=8).contains(&n));
        }
    }

    #[test]
    fn test_sand_falloff() {
        let params = ShadingParams::default();

        assert_eq!(sand(0.0, &params), 1.0);
        assert_eq!(sand(0.02, &params), 0.0);
        assert_eq!(sand(-0.5, &params), 0.0);
        assert!((sand(0.01, &params) - 0.5).abs() < 1e-6);
        assert!(sand(0.005, &params) > sand(0.015, &params));
    }

    #[test]
    fn test_silent_plate_is_bright_disc() {
        let modes = ModeVector::default();
        let params = ShadingParams::default();

        assert_eq!(shade(&modes, Vec2::ZERO, &params), Some(1.0));
        assert_eq!(shade(&modes, Vec2::new(0.6, -0.7), &params), Some(1.0));
        assert_eq!(shade(&modes, Vec2::new(0.8, 0.8), &params), None);
        assert_eq!(shade(&modes, Vec2::new(-1.0, 1.0), &params), None);
    }

    #[test]
    fn test_mode_zero_is_ignored() {
        let modes = ModeVector::single(0, 1.0);
        let params = ShadingParams::default();

        assert_eq!(displacement(&modes, Vec2::new(0.3, 0.4)), 0.0);
        assert_eq!(shade(&modes, Vec2::new(0.3, 0.4), &params), Some(1.0));
    }

    #[test]
    fn test_single_mode_nodal_lines() {
        // Mode 5 → (m, n) = (6, 2): nodes where x = k/6 or y = k/2
        let modes = ModeVector::single(5, 1.0);
        let params = ShadingParams::default();

        for &p in &[
            Vec2::new(1.0 / 6.0, 0.3),
            Vec2::new(-0.5, 0.7),
            Vec2::new(0.2, 0.0),
            Vec2::new(0.45, 0.5),
        ] {
            assert!(displacement(&modes, p).abs() < 1e-5, "{:?}", p);
            assert!(shade(&modes, p, &params).unwrap() > 0.99);
        }

        // Antinode: sin(6π/12)·sin(2π/4) = 1
        let antinode = Vec2::new(1.0 / 12.0, 0.25);
        assert!((displacement(&modes, antinode) - 1.0).abs() < 1e-5);
        assert_eq!(shade(&modes, antinode, &params), Some(0.0));
    }

    #[test]
    fn test_pixel_mapping_corners() {
        let top_left = pixel_to_plate(0, 0, 100, 100);
        assert!((top_left - Vec2::new(-0.99, 0.99)).length() < 1e-5);

        let bottom_right = pixel_to_plate(99, 99, 100, 100);
        assert!((bottom_right - Vec2::new(0.99, -0.99)).length() < 1e-5);
    }

    #[test]
    fn test_rasterize_silence() {
        let image = rasterize(&ModeVector::default(), 64, 64, &ShadingParams::default());

        assert_eq!(image.dimensions(), (64, 64));
        assert_eq!(image.get_pixel(32, 32), &Rgba([255, 255, 255, 255]));
        assert_eq!(image.get_pixel(0, 0), &Rgba([0, 0, 0, 255]));
        assert_eq!(image.get_pixel(63, 63), &Rgba([0, 0, 0, 255]));
    }
}
