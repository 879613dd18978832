use image::{DynamicImage, GrayImage, Luma};
use imageproc::distance_transform::Norm;
use imageproc::filter::{box_filter, gaussian_blur_f32};
use imageproc::morphology::{close, open};

use crate::detection::config::{DetectionConfig, Polarity, ThresholdMode};

pub const FOREGROUND: u8 = 255;

/// Convert image to grayscale
pub fn to_grayscale(img: &DynamicImage) -> GrayImage {
    img.to_luma8()
}

/// Gaussian blur; a non-positive sigma returns the input unchanged.
pub fn apply_blur(img: &GrayImage, sigma: f32) -> GrayImage {
    if sigma <= 0.0 {
        return img.clone();
    }
    gaussian_blur_f32(img, sigma)
}

/// Produce a mask with ink pixels set to [`FOREGROUND`] and everything else 0.
pub fn binarize(img: &GrayImage, mode: ThresholdMode, polarity: Polarity) -> GrayImage {
    match mode {
        ThresholdMode::Fixed { level } => {
            map_mask(img, |p| is_ink(p as i32, level as i32, polarity))
        }
        ThresholdMode::Adaptive { block_radius, offset } => {
            let mean = box_filter(img, block_radius, block_radius);
            let mut mask = GrayImage::new(img.width(), img.height());
            for (x, y, p) in img.enumerate_pixels() {
                let local = mean.get_pixel(x, y)[0] as i32;
                let cut = match polarity {
                    Polarity::DarkOnLight => local - offset as i32,
                    Polarity::LightOnDark => local + offset as i32,
                };
                if is_ink(p[0] as i32, cut, polarity) {
                    mask.put_pixel(x, y, Luma([FOREGROUND]));
                }
            }
            mask
        }
    }
}

fn is_ink(value: i32, cut: i32, polarity: Polarity) -> bool {
    match polarity {
        Polarity::DarkOnLight => value <= cut,
        Polarity::LightOnDark => value > cut,
    }
}

fn map_mask(img: &GrayImage, ink: impl Fn(u8) -> bool) -> GrayImage {
    let mut mask = GrayImage::new(img.width(), img.height());
    for (x, y, p) in img.enumerate_pixels() {
        if ink(p[0]) {
            mask.put_pixel(x, y, Luma([FOREGROUND]));
        }
    }
    mask
}

/// Close small gaps, then drop specks thinner than the structuring element.
pub fn clean_mask(mask: &GrayImage, radius: u8) -> GrayImage {
    if radius == 0 {
        return mask.clone();
    }
    open(&close(mask, Norm::LInf, radius), Norm::LInf, radius)
}

/// Full preprocessing chain for one region.
pub fn foreground_mask(region: &DynamicImage, config: &DetectionConfig) -> GrayImage {
    let gray = to_grayscale(region);
    let blurred = apply_blur(&gray, config.blur_sigma);
    let mask = binarize(&blurred, config.threshold, config.polarity);
    clean_mask(&mask, config.morphology_radius)
}
