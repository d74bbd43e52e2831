//! Image to 1-bit raster conversion
//!
//! Pipeline: base64 decode, image decode, aspect-correct fill and centre
//! crop to the requested box, grayscale over a white background, halftone,
//! then pack rows MSB first with `1` meaning a printed dot.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use bytes::Bytes;
use image::imageops::FilterType;
use image::{DynamicImage, GrayImage, Luma};
use tracing::debug;

use crate::error::{Error, Result};

/// Binarization threshold
const THRESHOLD: u8 = 128;

/// Largest box a `GS v 0` header can describe: row bytes and rows are `u16`
const MAX_WIDTH: u32 = 8 * u16::MAX as u32;
const MAX_HEIGHT: u32 = u16::MAX as u32;

/// 4x4 Bayer matrix for ordered dithering
const BAYER_4X4: [[u8; 4]; 4] = [[0, 8, 2, 10], [12, 4, 14, 6], [3, 11, 1, 9], [15, 7, 13, 5]];

/// Halftone mode used when reducing grayscale to black and white
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub enum Halftone {
    /// Ordered 4x4 Bayer dither
    #[default]
    Dither,

    /// Floyd-Steinberg error diffusion
    ErrorDiffusion,

    /// Plain threshold at 50% gray
    Threshold,
}

/// Packed 1-bit image, rows padded to whole bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raster {
    width: u32,
    height: u32,
    data: Bytes,
}

impl Raster {
    /// Decode a base64 image payload and fit it to `width x height`
    pub fn from_base64(payload: &str, width: u32, height: u32, halftone: Halftone) -> Result<Self> {
        let image = decode_base64(payload)?;
        Self::from_image(&image, width, height, halftone)
    }

    /// Fit a decoded image to `width x height`
    pub fn from_image(image: &DynamicImage, width: u32, height: u32, halftone: Halftone) -> Result<Self> {
        let fitted = fill_crop(image, width, height)?;
        let gray = flatten_on_white(&fitted);
        let bw = match halftone {
            Halftone::Dither => ordered_dither(&gray),
            Halftone::ErrorDiffusion => floyd_steinberg_dither(&gray),
            Halftone::Threshold => threshold_convert(&gray, THRESHOLD),
        };
        Ok(Self::pack(&bw))
    }

    fn pack(img: &GrayImage) -> Self {
        let (width, height) = img.dimensions();
        let row_bytes = width.div_ceil(8) as usize;
        let mut data = vec![0u8; row_bytes * height as usize];

        for (x, y, pixel) in img.enumerate_pixels() {
            if pixel.0[0] < THRESHOLD {
                data[y as usize * row_bytes + (x / 8) as usize] |= 0x80 >> (x % 8);
            }
        }

        Self {
            width,
            height,
            data: Bytes::from(data),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Bytes per packed row
    pub fn row_bytes(&self) -> usize {
        self.width.div_ceil(8) as usize
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }

    /// Whether the dot at (x, y) is printed
    pub fn is_black(&self, x: u32, y: u32) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }
        let byte = self.data[y as usize * self.row_bytes() + (x / 8) as usize];
        byte & (0x80 >> (x % 8)) != 0
    }
}

/// Decode a base64 payload (optionally a `data:` URL) into an image
pub fn decode_base64(payload: &str) -> Result<DynamicImage> {
    let encoded = match payload.split_once(";base64,") {
        Some((prefix, rest)) if prefix.starts_with("data:") => rest,
        _ => payload,
    };
    let encoded: String = encoded.chars().filter(|c| !c.is_ascii_whitespace()).collect();

    let bytes = STANDARD
        .decode(encoded.as_bytes())
        .map_err(|e| Error::InvalidImage(format!("base64: {e}")))?;
    let image = image::load_from_memory(&bytes).map_err(|e| Error::InvalidImage(e.to_string()))?;

    debug!(width = image.width(), height = image.height(), "Decoded image");
    Ok(image)
}

/// Scale to cover `width x height` keeping aspect ratio, then centre crop
pub fn fill_crop(image: &DynamicImage, width: u32, height: u32) -> Result<DynamicImage> {
    if width == 0 || height == 0 {
        return Err(Error::InvalidImage(format!("target box {width}x{height} has no area")));
    }
    if width > MAX_WIDTH || height > MAX_HEIGHT {
        return Err(Error::InvalidImage(format!(
            "target box {width}x{height} exceeds {MAX_WIDTH}x{MAX_HEIGHT}"
        )));
    }
    if image.width() == 0 || image.height() == 0 {
        return Err(Error::InvalidImage("source image has no area".into()));
    }

    let (src_w, src_h) = (u64::from(image.width()), u64::from(image.height()));
    let (dst_w, dst_h) = (u64::from(width), u64::from(height));

    // Cover the box: scale by the larger of the two ratios
    let (scaled_w, scaled_h) = if dst_w * src_h >= dst_h * src_w {
        (dst_w, (src_h * dst_w).div_ceil(src_w).max(dst_h))
    } else {
        ((src_w * dst_h).div_ceil(src_h).max(dst_w), dst_h)
    };

    let too_large = |_| Error::InvalidImage(format!("scaled image {scaled_w}x{scaled_h} is too large"));
    let scaled = image.resize_exact(
        u32::try_from(scaled_w).map_err(too_large)?,
        u32::try_from(scaled_h).map_err(too_large)?,
        FilterType::Triangle,
    );
    // Both offsets are below the scaled size, which fits in u32
    let x = ((scaled_w - dst_w) / 2) as u32;
    let y = ((scaled_h - dst_h) / 2) as u32;

    Ok(scaled.crop_imm(x, y, width, height))
}

/// Grayscale with transparent pixels composited onto white
fn flatten_on_white(image: &DynamicImage) -> GrayImage {
    let rgba = image.to_rgba8();
    let mut gray = GrayImage::new(rgba.width(), rgba.height());

    for (x, y, pixel) in rgba.enumerate_pixels() {
        let [r, g, b, a] = pixel.0;
        let luma = (u32::from(r) * 299 + u32::from(g) * 587 + u32::from(b) * 114) / 1000;
        let alpha = u32::from(a);
        let value = (luma * alpha + 255 * (255 - alpha)) / 255;
        gray.put_pixel(x, y, Luma([value as u8]));
    }

    gray
}

fn ordered_dither(img: &GrayImage) -> GrayImage {
    let mut output = GrayImage::new(img.width(), img.height());
    for (x, y, pixel) in img.enumerate_pixels() {
        let level = u16::from(BAYER_4X4[(y % 4) as usize][(x % 4) as usize]) * 16 + 8;
        let value = if u16::from(pixel.0[0]) >= level { 255 } else { 0 };
        output.put_pixel(x, y, Luma([value]));
    }
    output
}

fn floyd_steinberg_dither(img: &GrayImage) -> GrayImage {
    let (width, height) = (img.width() as usize, img.height() as usize);
    let mut buffer: Vec<i16> = img.pixels().map(|p| i16::from(p.0[0])).collect();

    for y in 0..height {
        for x in 0..width {
            let i = y * width + x;
            let old = buffer[i];
            let new = if old >= i16::from(THRESHOLD) { 255 } else { 0 };
            let error = old - new;
            buffer[i] = new;

            if x + 1 < width {
                buffer[i + 1] += error * 7 / 16;
            }
            if y + 1 < height {
                if x > 0 {
                    buffer[i + width - 1] += error * 3 / 16;
                }
                buffer[i + width] += error * 5 / 16;
                if x + 1 < width {
                    buffer[i + width + 1] += error / 16;
                }
            }
        }
    }

    let pixels = buffer.into_iter().map(|v| v.clamp(0, 255) as u8).collect();
    GrayImage::from_raw(img.width(), img.height(), pixels).unwrap_or_else(|| img.clone())
}

fn threshold_convert(img: &GrayImage, threshold: u8) -> GrayImage {
    let mut output = GrayImage::new(img.width(), img.height());
    for (x, y, pixel) in img.enumerate_pixels() {
        let value = if pixel.0[0] >= threshold { 255 } else { 0 };
        output.put_pixel(x, y, Luma([value]));
    }
    output
}
