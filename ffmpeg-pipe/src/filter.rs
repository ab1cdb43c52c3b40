//! Per-frame pixel primitives: luminance, Otsu binarization and the 5x5
//! mixed-derivative Sobel filter.
//!
//! All functions are pure and operate on 8-bit images; results are
//! bit-exact with the usual computer-vision library conventions (14-bit
//! fixed-point BT.601 luminance, 256-bin Otsu, reflect-101 borders and
//! saturating 8-bit output).

use image::{GrayImage, Luma, Rgb, RgbImage};

use crate::frame::Frame;

// BT.601 weights scaled by 2^14.
const LUMA_SHIFT: u32 = 14;
const LUMA_R: u32 = 4899;
const LUMA_G: u32 = 9617;
const LUMA_B: u32 = 1868;

/// First-order derivative kernel for an aperture of 5.
const SOBEL_DERIV_5: [i32; 5] = [-1, -2, 0, 2, 1];

pub fn rgb_to_luminance(image: &RgbImage) -> GrayImage {
    let mut out = GrayImage::new(image.width(), image.height());
    for (dst, src) in out.pixels_mut().zip(image.pixels()) {
        let Rgb([r, g, b]) = *src;
        let y = (LUMA_R * u32::from(r)
            + LUMA_G * u32::from(g)
            + LUMA_B * u32::from(b)
            + (1 << (LUMA_SHIFT - 1)))
            >> LUMA_SHIFT;
        *dst = Luma([y as u8]);
    }
    out
}

/// Luminance of any frame; a gray frame is returned as is.
pub fn luminance(frame: &Frame) -> GrayImage {
    match frame {
        Frame::Gray(image) => image.clone(),
        Frame::Color(image) => rgb_to_luminance(image),
    }
}

/// Replicates the single channel into R, G and B.
pub fn gray_to_rgb(image: &GrayImage) -> RgbImage {
    let mut out = RgbImage::new(image.width(), image.height());
    for (dst, src) in out.pixels_mut().zip(image.pixels()) {
        let v = src.0[0];
        *dst = Rgb([v, v, v]);
    }
    out
}

/// Otsu's threshold: the gray level that maximizes the between-class
/// variance of the image histogram. Levels where either class holds less
/// than `f32::EPSILON` of the pixels are skipped and ties keep the lowest
/// level, so a uniform image yields 0.
pub fn otsu_threshold(image: &GrayImage) -> u8 {
    let total = image.width() as usize * image.height() as usize;
    if total == 0 {
        return 0;
    }

    let mut histogram = [0u32; 256];
    for pixel in image.pixels() {
        histogram[pixel.0[0] as usize] += 1;
    }

    let scale = 1.0 / total as f64;
    let mu: f64 = histogram
        .iter()
        .enumerate()
        .map(|(i, &count)| i as f64 * f64::from(count))
        .sum::<f64>()
        * scale;

    let eps = f64::from(f32::EPSILON);
    let (mut mu1, mut q1) = (0.0f64, 0.0f64);
    let (mut max_sigma, mut max_level) = (0.0f64, 0u8);
    for (i, &count) in histogram.iter().enumerate() {
        let p_i = f64::from(count) * scale;
        mu1 *= q1;
        q1 += p_i;
        let q2 = 1.0 - q1;
        if q1.min(q2) < eps || q1.max(q2) > 1.0 - eps {
            continue;
        }
        mu1 = (mu1 + i as f64 * p_i) / q1;
        let mu2 = (mu - q1 * mu1) / q2;
        let sigma = q1 * q2 * (mu1 - mu2) * (mu1 - mu2);
        if sigma > max_sigma {
            max_sigma = sigma;
            max_level = i as u8;
        }
    }
    max_level
}

/// `max_value` where the pixel is strictly above `threshold`, 0 elsewhere.
pub fn threshold_binary(image: &GrayImage, threshold: u8, max_value: u8) -> GrayImage {
    let mut out = image.clone();
    for pixel in out.pixels_mut() {
        pixel.0[0] = if pixel.0[0] > threshold { max_value } else { 0 };
    }
    out
}

/// Binarizes with a threshold chosen per image by Otsu's method. Returns the
/// threshold together with the 0/255 mask.
pub fn otsu_binarize(image: &GrayImage) -> (u8, GrayImage) {
    let threshold = otsu_threshold(image);
    (threshold, threshold_binary(image, threshold, u8::MAX))
}

/// Reflect-101 border index: `gfedcb|abcdefgh|gfedcba`.
fn reflect_101(index: isize, len: usize) -> usize {
    let len = len as isize;
    if len == 1 {
        return 0;
    }
    let mut i = index;
    loop {
        if i < 0 {
            i = -i;
        } else if i >= len {
            i = 2 * len - 2 - i;
        } else {
            return i as usize;
        }
    }
}

/// Correlates with the separable 5x5 kernel for the mixed first derivative
/// d2/dxdy and saturates the signed response into `0..=255`.
pub fn sobel_xy(image: &GrayImage) -> GrayImage {
    let (width, height) = (image.width() as usize, image.height() as usize);
    let mut out = GrayImage::new(image.width(), image.height());
    if width == 0 || height == 0 {
        return out;
    }
    let src = image.as_raw();
    let radius = (SOBEL_DERIV_5.len() / 2) as isize;

    // Horizontal pass.
    let mut rows = vec![0i32; width * height];
    for y in 0..height {
        let line = &src[y * width..(y + 1) * width];
        for x in 0..width {
            rows[y * width + x] = SOBEL_DERIV_5
                .iter()
                .enumerate()
                .map(|(k, &w)| {
                    let sx = reflect_101(x as isize + k as isize - radius, width);
                    w * i32::from(line[sx])
                })
                .sum();
        }
    }

    // Vertical pass.
    let dst: &mut [u8] = &mut out;
    for y in 0..height {
        for x in 0..width {
            let acc: i32 = SOBEL_DERIV_5
                .iter()
                .enumerate()
                .map(|(k, &w)| {
                    let sy = reflect_101(y as isize + k as isize - radius, height);
                    w * rows[sy * width + x]
                })
                .sum();
            dst[y * width + x] = acc.clamp(0, i32::from(u8::MAX)) as u8;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gray(width: u32, height: u32, f: impl Fn(u32, u32) -> u8) -> GrayImage {
        GrayImage::from_fn(width, height, |x, y| Luma([f(x, y)]))
    }

    #[test]
    fn test_luminance_weights() {
        let image = RgbImage::from_fn(5, 1, |x, _| match x {
            0 => Rgb([255, 0, 0]),
            1 => Rgb([0, 255, 0]),
            2 => Rgb([0, 0, 255]),
            3 => Rgb([255, 255, 255]),
            _ => Rgb([0, 0, 0]),
        });
        let y = rgb_to_luminance(&image);
        assert_eq!(y.as_raw(), &vec![76, 150, 29, 255, 0]);
    }

    #[test]
    fn test_luminance_matches_float_formula() {
        let image = RgbImage::from_fn(16, 16, |x, y| {
            Rgb([(x * 16) as u8, (y * 16) as u8, ((x + y) * 8) as u8])
        });
        let y = rgb_to_luminance(&image);
        for (src, dst) in image.pixels().zip(y.pixels()) {
            let Rgb([r, g, b]) = *src;
            let expected = 0.299 * r as f64 + 0.587 * g as f64 + 0.114 * b as f64;
            assert!((dst.0[0] as f64 - expected).abs() <= 1.0);
        }
    }

    #[test]
    fn test_luminance_of_gray_frame_is_identity() {
        let image = gray(4, 4, |x, y| (x * 10 + y) as u8);
        assert_eq!(luminance(&Frame::Gray(image.clone())), image);
    }

    #[test]
    fn test_gray_to_rgb_replicates() {
        let image = gray(3, 2, |x, y| (x * 40 + y * 7) as u8);
        let rgb = gray_to_rgb(&image);
        for (g, c) in image.pixels().zip(rgb.pixels()) {
            assert_eq!(c.0, [g.0[0]; 3]);
        }
    }

    #[test]
    fn test_otsu_bimodal() {
        let image = gray(10, 10, |x, _| if x < 3 { 10 } else { 200 });
        let (threshold, mask) = otsu_binarize(&image);
        assert!((10..200).contains(&threshold), "threshold {}", threshold);
        for (src, dst) in image.pixels().zip(mask.pixels()) {
            assert_eq!(dst.0[0], if src.0[0] == 10 { 0 } else { 255 });
        }
    }

    #[test]
    fn test_otsu_separates_two_clusters() {
        // Two noisy clusters around 40 and 180.
        let image = gray(32, 32, |x, y| {
            let jitter = ((x * 7 + y * 13) % 9) as u8;
            if (x + y) % 2 == 0 { 36 + jitter } else { 176 + jitter }
        });
        let threshold = otsu_threshold(&image);
        assert!((44..176).contains(&threshold), "threshold {}", threshold);
        let (_, mask) = otsu_binarize(&image);
        let mut values: Vec<u8> = mask.pixels().map(|p| p.0[0]).collect();
        values.sort_unstable();
        values.dedup();
        assert_eq!(values, vec![0, 255]);
    }

    #[test]
    fn test_otsu_uniform_image() {
        let image = gray(8, 8, |_, _| 77);
        assert_eq!(otsu_threshold(&image), 0);
        let (_, mask) = otsu_binarize(&image);
        assert!(mask.pixels().all(|p| p.0[0] == 255));

        let black = gray(8, 8, |_, _| 0);
        let (_, mask) = otsu_binarize(&black);
        assert!(mask.pixels().all(|p| p.0[0] == 0));
    }

    #[test]
    fn test_reflect_101() {
        assert_eq!(reflect_101(-1, 5), 1);
        assert_eq!(reflect_101(-2, 5), 2);
        assert_eq!(reflect_101(5, 5), 3);
        assert_eq!(reflect_101(6, 5), 2);
        assert_eq!(reflect_101(2, 5), 2);
        assert_eq!(reflect_101(-2, 2), 0);
        assert_eq!(reflect_101(3, 2), 1);
        assert_eq!(reflect_101(-2, 1), 0);
    }

    #[test]
    fn test_sobel_constant_and_ramps_are_flat() {
        let constant = gray(9, 9, |_, _| 120);
        assert!(sobel_xy(&constant).pixels().all(|p| p.0[0] == 0));
        // A mixed derivative ignores pure horizontal or vertical ramps.
        let ramp = gray(9, 9, |x, _| (x * 20) as u8);
        assert!(sobel_xy(&ramp).pixels().all(|p| p.0[0] == 0));
        let ramp = gray(9, 9, |_, y| (y * 20) as u8);
        assert!(sobel_xy(&ramp).pixels().all(|p| p.0[0] == 0));
    }

    #[test]
    fn test_sobel_product_surface() {
        // f = 2xy has d2f/dxdy = 2; the 5-tap derivative has gain 8 per axis.
        let image = gray(9, 9, |x, y| (2 * x * y) as u8);
        let out = sobel_xy(&image);
        for y in 2..7 {
            for x in 2..7 {
                assert_eq!(out.get_pixel(x, y).0[0], 128, "at ({}, {})", x, y);
            }
        }
    }

    #[test]
    fn test_sobel_saturates() {
        let bright = gray(8, 8, |x, y| (5 * x * y) as u8);
        assert_eq!(sobel_xy(&bright).get_pixel(3, 3).0[0], 255);
        let negative = gray(8, 8, |x, y| ((7 - x) * y) as u8);
        assert_eq!(sobel_xy(&negative).get_pixel(3, 3).0[0], 0);
    }

    #[test]
    fn test_sobel_is_deterministic() {
        let image = gray(31, 17, |x, y| ((x * 37 + y * 91) % 251) as u8);
        assert_eq!(sobel_xy(&image), sobel_xy(&image));
    }
}
