use crate::foundation::core::ImagePayload;
use crate::foundation::error::{AugmentError, AugmentResult};
use crate::perturb::blur::gaussian_blur_rgba8;
use image::codecs::jpeg::JpegEncoder;
use image::{ColorType, DynamicImage, ExtendedColorType, ImageEncoder, ImageFormat, RgbaImage};
use rand::Rng;
use std::io::Cursor;

/// JPEG quality used when re-encoding without an explicit quality.
pub const REENCODE_JPEG_QUALITY: u8 = 100;

/// Degradations applied to every produced image before it is stored.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct PerturbationConfig {
    /// JPEG quality in `(0, 1]`; only honoured for JPEG payloads.
    pub jpeg_quality: Option<f32>,
    /// Gaussian blur standard deviation in pixels.
    pub blur_radius: Option<f32>,
    /// Peak-to-peak amplitude of the additive per-pixel noise, `0..=255`.
    pub noise_level: Option<f32>,
}

impl PerturbationConfig {
    /// Return `true` when any degradation is configured.
    pub fn is_active(&self) -> bool {
        self.jpeg_quality.is_some_and(|q| q > 0.0)
            || self.blur() > 0.0
            || self.noise() > 0.0
    }

    /// Check value ranges.
    pub fn validate(&self) -> AugmentResult<()> {
        if let Some(q) = self.jpeg_quality
            && !(q > 0.0 && q <= 1.0)
        {
            return Err(AugmentError::validation("jpeg_quality must be in (0, 1]"));
        }
        if let Some(b) = self.blur_radius
            && !(b.is_finite() && b >= 0.0)
        {
            return Err(AugmentError::validation("blur_radius must be >= 0"));
        }
        if let Some(n) = self.noise_level
            && !(0.0..=255.0).contains(&n)
        {
            return Err(AugmentError::validation("noise_level must be in [0, 255]"));
        }
        Ok(())
    }

    fn blur(&self) -> f32 {
        self.blur_radius.unwrap_or(0.0)
    }

    fn noise(&self) -> f32 {
        self.noise_level.unwrap_or(0.0)
    }

    fn encoder_quality(&self) -> u8 {
        self.jpeg_quality
            .map(|q| (q * 100.0).round().clamp(1.0, 100.0) as u8)
            .unwrap_or(REENCODE_JPEG_QUALITY)
    }
}

/// Apply blur, then additive noise, then re-encode.
///
/// The output keeps the source encoding; `jpeg_quality` only takes effect for JPEG payloads.
/// Noise draws from `rng`, one offset per pixel shared by the R, G and B channels.
pub fn apply_perturbations(
    image: &ImagePayload,
    cfg: &PerturbationConfig,
    rng: &mut impl Rng,
) -> AugmentResult<ImagePayload> {
    let format = payload_format(image)?;
    let decoded = decode(image, format)?;
    let (width, height) = (decoded.width(), decoded.height());
    let mut rgba = decoded.to_rgba8().into_raw();

    if cfg.blur() > 0.0 {
        rgba = gaussian_blur_rgba8(&rgba, width, height, cfg.blur())?;
    }
    if cfg.noise() > 0.0 {
        add_noise(&mut rgba, cfg.noise(), rng);
    }

    let raster = RgbaImage::from_raw(width, height, rgba)
        .ok_or_else(|| AugmentError::image("perturbed buffer does not match image size"))?;
    encode(
        &restore_color(raster, decoded.color()),
        image,
        format,
        cfg.encoder_quality(),
    )
}

/// Decode and encode `image` again without any degradation.
pub fn reencode(image: &ImagePayload) -> AugmentResult<ImagePayload> {
    let format = payload_format(image)?;
    let decoded = decode(image, format)?;
    encode(&decoded, image, format, REENCODE_JPEG_QUALITY)
}

/// Convert a working RGBA8 raster back to the colour type the source was decoded with.
fn restore_color(raster: RgbaImage, color: ColorType) -> DynamicImage {
    let raster = DynamicImage::ImageRgba8(raster);
    match color {
        ColorType::L8 => DynamicImage::ImageLuma8(raster.to_luma8()),
        ColorType::La8 => DynamicImage::ImageLumaA8(raster.to_luma_alpha8()),
        ColorType::Rgb8 => DynamicImage::ImageRgb8(raster.to_rgb8()),
        ColorType::L16 => DynamicImage::ImageLuma16(raster.to_luma16()),
        ColorType::La16 => DynamicImage::ImageLumaA16(raster.to_luma_alpha16()),
        ColorType::Rgb16 => DynamicImage::ImageRgb16(raster.to_rgb16()),
        ColorType::Rgba16 => DynamicImage::ImageRgba16(raster.to_rgba16()),
        _ => raster,
    }
}

fn payload_format(image: &ImagePayload) -> AugmentResult<ImageFormat> {
    ImageFormat::from_mime_type(&image.mime_type)
        .ok_or_else(|| AugmentError::image(format!("unsupported MIME type '{}'", image.mime_type)))
}

fn decode(image: &ImagePayload, format: ImageFormat) -> AugmentResult<DynamicImage> {
    image::load_from_memory_with_format(&image.bytes, format)
        .map_err(|e| AugmentError::image(format!("decode {}: {e}", image.mime_type)))
}

fn add_noise(rgba: &mut [u8], level: f32, rng: &mut impl Rng) {
    for px in rgba.chunks_exact_mut(4) {
        let noise = rng.gen_range(-0.5f32..0.5) * level;
        for c in &mut px[..3] {
            *c = (f32::from(*c) + noise).round().clamp(0.0, 255.0) as u8;
        }
    }
}

fn encode(
    raster: &DynamicImage,
    source: &ImagePayload,
    format: ImageFormat,
    jpeg_quality: u8,
) -> AugmentResult<ImagePayload> {
    let mut bytes = Vec::new();
    if format == ImageFormat::Jpeg {
        let rgb = raster.to_rgb8();
        JpegEncoder::new_with_quality(&mut bytes, jpeg_quality)
            .write_image(
                rgb.as_raw(),
                rgb.width(),
                rgb.height(),
                ExtendedColorType::Rgb8,
            )
            .map_err(|e| AugmentError::image(format!("encode jpeg: {e}")))?;
    } else {
        raster
            .write_to(&mut Cursor::new(&mut bytes), format)
            .map_err(|e| AugmentError::image(format!("encode {}: {e}", source.mime_type)))?;
    }
    Ok(ImagePayload::new(source.mime_type.clone(), bytes))
}

#[cfg(test)]
#[path = "../../tests/unit/perturb/transform.rs"]
mod tests;
