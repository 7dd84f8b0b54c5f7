// Image <-> model tensor conversion and the preprocessing applied before
// style transfer: center crop, resize, blur.

use anyhow::{anyhow, Context, Result};
use image::imageops::{self, FilterType};
use image::{ImageReader, Rgb32FImage, RgbImage};
use std::path::Path;

/// A single RGB image as a `(1, height, width, 3)` float tensor in NHWC order.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageTensor {
    height: usize,
    width: usize,
    data: Vec<f32>,
}

impl ImageTensor {
    pub fn new(height: usize, width: usize, data: Vec<f32>) -> Result<Self> {
        if data.len() != height * width * 3 {
            return Err(anyhow!(
                "Tensor data has {} values, expected {} for {}x{}x3",
                data.len(),
                height * width * 3,
                height,
                width
            ));
        }
        Ok(Self {
            height,
            width,
            data,
        })
    }

    /// Accepts `(1, H, W, 3)` or `(H, W, 3)`.
    pub fn from_shape(shape: &[usize], data: Vec<f32>) -> Result<Self> {
        match shape {
            [1, h, w, 3] | [h, w, 3] => Self::new(*h, *w, data),
            _ => Err(anyhow!("Unsupported image tensor shape {:?}", shape)),
        }
    }

    pub fn shape(&self) -> [usize; 4] {
        [1, self.height, self.width, 3]
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Value at row `y`, column `x`, channel `c`; `None` outside the tensor.
    pub fn get(&self, y: usize, x: usize, c: usize) -> Option<f32> {
        if y >= self.height || x >= self.width || c >= 3 {
            return None;
        }
        self.data.get(self.offset(y, x, c)).copied()
    }

    fn offset(&self, y: usize, x: usize, c: usize) -> usize {
        (y * self.width + x) * 3 + c
    }

    fn from_rgb32f(image: &Rgb32FImage) -> Self {
        Self {
            height: image.height() as usize,
            width: image.width() as usize,
            data: image.as_raw().iter().map(|v| v.clamp(0.0, 1.0)).collect(),
        }
    }
}

/// Decodes `path` into a normalized `(1, H, W, 3)` tensor: values in `[0, 1]`,
/// single-channel sources replicated into RGB, center-cropped to a square and
/// resized to `size` (width, height).
pub fn load_image(path: &Path, size: (u32, u32), preserve_aspect_ratio: bool) -> Result<ImageTensor> {
    let decoded = ImageReader::open(path)
        .with_context(|| format!("Failed to open image {}", path.display()))?
        .with_guessed_format()?
        .decode()
        .with_context(|| format!("Failed to decode image {}", path.display()))?;

    // Integer formats scale into [0, 1]; grey and grey-alpha replicate their
    // luma channel.
    let rgb = decoded.to_rgb32f();
    let cropped = crop_center(&rgb);
    let resized = resize(&cropped, size, preserve_aspect_ratio);
    Ok(ImageTensor::from_rgb32f(&resized))
}

/// Crops the largest centered square.
pub fn crop_center(image: &Rgb32FImage) -> Rgb32FImage {
    let (width, height) = image.dimensions();
    let side = width.min(height);
    let offset_y = height.saturating_sub(width) / 2;
    let offset_x = width.saturating_sub(height) / 2;
    imageops::crop_imm(image, offset_x, offset_y, side, side).to_image()
}

/// Bilinear resize to `size` (width, height). With `preserve_aspect_ratio`
/// the result is the largest image of the source's aspect that fits inside
/// `size`.
pub fn resize(image: &Rgb32FImage, size: (u32, u32), preserve_aspect_ratio: bool) -> Rgb32FImage {
    let (target_w, target_h) = if preserve_aspect_ratio {
        fit_within(image.dimensions(), size)
    } else {
        size
    };

    if image.dimensions() == (target_w, target_h) {
        return image.clone();
    }
    imageops::resize(image, target_w, target_h, FilterType::Triangle)
}

fn fit_within((width, height): (u32, u32), (max_w, max_h): (u32, u32)) -> (u32, u32) {
    let scale = (max_w as f64 / width as f64).min(max_h as f64 / height as f64);
    let w = ((width as f64 * scale).round() as u32).clamp(1, max_w);
    let h = ((height as f64 * scale).round() as u32).clamp(1, max_h);
    (w, h)
}

/// 3x3 average pool, stride 1, SAME padding. Border outputs average only the
/// neighbours that fall inside the image.
pub fn avg_pool_3x3(tensor: &ImageTensor) -> ImageTensor {
    let (h, w) = (tensor.height, tensor.width);
    let mut data = vec![0.0f32; tensor.data.len()];

    for y in 0..h {
        let y0 = y.saturating_sub(1);
        let y1 = (y + 1).min(h - 1);
        for x in 0..w {
            let x0 = x.saturating_sub(1);
            let x1 = (x + 1).min(w - 1);
            let count = ((y1 - y0 + 1) * (x1 - x0 + 1)) as f32;
            for c in 0..3 {
                let mut sum = 0.0;
                for yy in y0..=y1 {
                    for xx in x0..=x1 {
                        sum += tensor.get(yy, xx, c).unwrap_or(0.0);
                    }
                }
                data[tensor.offset(y, x, c)] = sum / count;
            }
        }
    }

    ImageTensor {
        height: h,
        width: w,
        data,
    }
}

/// Converts a model output back to 8-bit RGB: shift by the minimum, divide
/// by the resulting maximum when non-zero, scale to 255.
pub fn tensor_to_image(tensor: &ImageTensor) -> Result<RgbImage> {
    let min = tensor.data.iter().copied().fold(f32::INFINITY, f32::min);
    let min = if min.is_finite() { min } else { 0.0 };
    let max = tensor
        .data
        .iter()
        .map(|v| v - min)
        .fold(0.0f32, f32::max);

    let pixels: Vec<u8> = tensor
        .data
        .iter()
        .map(|v| {
            let mut x = v - min;
            if max != 0.0 {
                x /= max;
            }
            (x * 255.0).clamp(0.0, 255.0) as u8
        })
        .collect();

    RgbImage::from_raw(tensor.width as u32, tensor.height as u32, pixels)
        .ok_or_else(|| anyhow!("Failed to build {}x{} RGB image", tensor.width, tensor.height))
}
