//! Pixel-level degradations (blur, noise, JPEG compression) applied to generated images.

pub(crate) mod blur;
pub mod transform;
