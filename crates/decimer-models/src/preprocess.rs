//! Image preprocessing for the DECIMER predictor and the structure classifier

use decimer_core::{Error, Result};
use image::imageops::{self, FilterType};
use image::{DynamicImage, Rgb, RgbImage};
use ndarray::Array4;

/// Side length of the DECIMER encoder input
pub const DECIMER_INPUT_SIZE: u32 = 512;

/// Side length of the EfficientNet-B0 classifier input
pub const CLASSIFIER_INPUT_SIZE: u32 = 224;

/// Channel value at or above which a pixel counts as background
const BACKGROUND_LEVEL: u8 = 250;

const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Decode an encoded image and flatten any transparency onto white
pub fn load_rgb(bytes: &[u8]) -> Result<RgbImage> {
    let image = image::load_from_memory(bytes)
        .map_err(|e| Error::unsupported_image(format!("failed to decode image: {}", e)))?;
    Ok(flatten_alpha(&image))
}

/// Composite the image over a white background
pub fn flatten_alpha(image: &DynamicImage) -> RgbImage {
    if !image.color().has_alpha() {
        return image.to_rgb8();
    }

    let rgba = image.to_rgba8();
    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        let alpha = a as u32;
        let blend = |c: u8| ((c as u32 * alpha + 255 * (255 - alpha)) / 255) as u8;
        Rgb([blend(r), blend(g), blend(b)])
    })
}

/// Crop away rows and columns that only contain background pixels.
///
/// A blank image is returned unchanged.
pub fn crop_empty_borders(image: &RgbImage) -> RgbImage {
    let (width, height) = image.dimensions();
    let mut bounds: Option<(u32, u32, u32, u32)> = None;

    for (x, y, pixel) in image.enumerate_pixels() {
        if pixel.0.iter().all(|&c| c >= BACKGROUND_LEVEL) {
            continue;
        }
        bounds = Some(match bounds {
            None => (x, y, x, y),
            Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
        });
    }

    match bounds {
        Some((x0, y0, x1, y1)) if (x1 - x0 + 1, y1 - y0 + 1) != (width, height) => {
            imageops::crop_imm(image, x0, y0, x1 - x0 + 1, y1 - y0 + 1).to_image()
        }
        _ => image.clone(),
    }
}

/// Pad the image to a square with white, keeping the content centred
pub fn central_square(image: &RgbImage) -> RgbImage {
    let (width, height) = image.dimensions();
    if width == height {
        return image.clone();
    }

    let side = width.max(height);
    let mut canvas = RgbImage::from_pixel(side, side, Rgb([255, 255, 255]));
    let x = (side - width) / 2;
    let y = (side - height) / 2;
    imageops::replace(&mut canvas, image, x as i64, y as i64);
    canvas
}

/// Prepare an encoded image for the DECIMER encoder.
///
/// Returns an NHWC tensor of shape `(1, 512, 512, 3)` with values in `[0, 1]`.
pub fn decimer_input(bytes: &[u8]) -> Result<Array4<f32>> {
    let rgb = load_rgb(bytes)?;
    let square = central_square(&crop_empty_borders(&rgb));
    let resized = imageops::resize(
        &square,
        DECIMER_INPUT_SIZE,
        DECIMER_INPUT_SIZE,
        FilterType::Gaussian,
    );

    let size = DECIMER_INPUT_SIZE as usize;
    Ok(Array4::from_shape_fn((1, size, size, 3), |(_, y, x, c)| {
        resized.get_pixel(x as u32, y as u32)[c] as f32 / 255.0
    }))
}

/// Prepare an encoded image for the EfficientNet-B0 classifier.
///
/// Returns CHW data for a `(3, 224, 224)` tensor normalised with ImageNet statistics.
pub fn classifier_input(bytes: &[u8]) -> Result<Vec<f32>> {
    let rgb = load_rgb(bytes)?;
    let resized = imageops::resize(
        &rgb,
        CLASSIFIER_INPUT_SIZE,
        CLASSIFIER_INPUT_SIZE,
        FilterType::Triangle,
    );

    let plane = (CLASSIFIER_INPUT_SIZE * CLASSIFIER_INPUT_SIZE) as usize;
    let mut data = vec![0f32; 3 * plane];
    for (x, y, pixel) in resized.enumerate_pixels() {
        let offset = (y * CLASSIFIER_INPUT_SIZE + x) as usize;
        for c in 0..3 {
            let value = pixel[c] as f32 / 255.0;
            data[c * plane + offset] = (value - IMAGENET_MEAN[c]) / IMAGENET_STD[c];
        }
    }
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba, RgbaImage};
    use std::io::Cursor;

    fn png_bytes(image: DynamicImage) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        image.write_to(&mut buf, ImageFormat::Png).unwrap();
        buf.into_inner()
    }

    fn drawing(width: u32, height: u32) -> RgbImage {
        let mut img = RgbImage::from_pixel(width, height, Rgb([255, 255, 255]));
        for x in 10..20 {
            for y in 5..8 {
                img.put_pixel(x, y, Rgb([0, 0, 0]));
            }
        }
        img
    }

    #[test]
    fn test_flatten_transparent_to_white() {
        let rgba = RgbaImage::from_pixel(2, 2, Rgba([0, 0, 0, 0]));
        let flat = flatten_alpha(&DynamicImage::ImageRgba8(rgba));
        assert_eq!(flat.get_pixel(0, 0), &Rgb([255, 255, 255]));

        let opaque = RgbaImage::from_pixel(1, 1, Rgba([10, 20, 30, 255]));
        let flat = flatten_alpha(&DynamicImage::ImageRgba8(opaque));
        assert_eq!(flat.get_pixel(0, 0), &Rgb([10, 20, 30]));
    }

    #[test]
    fn test_crop_empty_borders() {
        let cropped = crop_empty_borders(&drawing(40, 30));
        assert_eq!(cropped.dimensions(), (10, 3));
    }

    #[test]
    fn test_crop_keeps_blank_image() {
        let blank = RgbImage::from_pixel(8, 6, Rgb([255, 255, 255]));
        assert_eq!(crop_empty_borders(&blank).dimensions(), (8, 6));
    }

    #[test]
    fn test_central_square_pads_short_side() {
        let square = central_square(&RgbImage::from_pixel(10, 4, Rgb([0, 0, 0])));
        assert_eq!(square.dimensions(), (10, 10));
        assert_eq!(square.get_pixel(0, 0), &Rgb([255, 255, 255]));
        assert_eq!(square.get_pixel(5, 5), &Rgb([0, 0, 0]));
    }

    #[test]
    fn test_decimer_input_shape_and_range() {
        let bytes = png_bytes(DynamicImage::ImageRgb8(drawing(64, 48)));
        let tensor = decimer_input(&bytes).unwrap();
        assert_eq!(tensor.shape(), &[1, 512, 512, 3]);
        assert!(tensor.iter().all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn test_classifier_input_len() {
        let bytes = png_bytes(DynamicImage::ImageRgb8(drawing(64, 48)));
        let data = classifier_input(&bytes).unwrap();
        assert_eq!(data.len(), 3 * 224 * 224);
    }

    #[test]
    fn test_undecodable_image() {
        let err = decimer_input(b"GIF89a-truncated").unwrap_err();
        assert!(matches!(err, Error::UnsupportedImage(_)));
    }
}
