use crate::foundation::error::{AugmentError, AugmentResult};

/// Gaussian blur of a straight-alpha RGBA8 buffer.
///
/// `sigma` is the standard deviation in pixels (the CSS `blur(<px>)` convention); the kernel spans
/// `ceil(3 * sigma)` pixels on each side. Edges are clamped. Weights are Q16 fixed point so the
/// result is bit-exact across platforms.
pub(crate) fn gaussian_blur_rgba8(
    src: &[u8],
    width: u32,
    height: u32,
    sigma: f32,
) -> AugmentResult<Vec<u8>> {
    let expected_len = (width as usize)
        .checked_mul(height as usize)
        .and_then(|v| v.checked_mul(4))
        .ok_or_else(|| AugmentError::image("blur buffer size overflow"))?;
    if src.len() != expected_len {
        return Err(AugmentError::image(
            "gaussian_blur_rgba8 expects src matching width*height*4",
        ));
    }
    if !sigma.is_finite() || sigma < 0.0 {
        return Err(AugmentError::validation("blur radius must be finite and >= 0"));
    }
    let radius = (3.0 * sigma).ceil() as u32;
    if radius == 0 || width == 0 || height == 0 {
        return Ok(src.to_vec());
    }

    let kernel = kernel_q16(radius, sigma)?;
    let mut tmp = vec![0u8; expected_len];
    let mut out = vec![0u8; expected_len];
    convolve(src, &mut tmp, width, height, &kernel, Axis::Horizontal);
    convolve(&tmp, &mut out, width, height, &kernel, Axis::Vertical);
    Ok(out)
}

#[derive(Clone, Copy)]
enum Axis {
    Horizontal,
    Vertical,
}

fn kernel_q16(radius: u32, sigma: f32) -> AugmentResult<Vec<u32>> {
    let r = radius as i32;
    let denom = 2.0 * f64::from(sigma) * f64::from(sigma);
    let weights: Vec<f64> = (-r..=r)
        .map(|i| (-(f64::from(i) * f64::from(i)) / denom).exp())
        .collect();
    let sum: f64 = weights.iter().sum();
    if sum <= 0.0 {
        return Err(AugmentError::image("gaussian kernel sum is zero"));
    }

    let mut q: Vec<u32> = weights
        .iter()
        .map(|w| ((w / sum) * 65536.0).round().clamp(0.0, 65536.0) as u32)
        .collect();
    // Fold the rounding error into the centre tap so the kernel sums to exactly 1.0.
    let acc: i64 = q.iter().map(|&w| i64::from(w)).sum();
    let mid = q.len() / 2;
    q[mid] = (i64::from(q[mid]) + 65536 - acc).clamp(0, 65536) as u32;
    Ok(q)
}

fn convolve(src: &[u8], dst: &mut [u8], width: u32, height: u32, kernel: &[u32], axis: Axis) {
    let radius = (kernel.len() / 2) as i64;
    let (w, h) = (i64::from(width), i64::from(height));
    for y in 0..h {
        for x in 0..w {
            let mut acc = [0u64; 4];
            for (ki, &kw) in kernel.iter().enumerate() {
                let d = ki as i64 - radius;
                let (sx, sy) = match axis {
                    Axis::Horizontal => ((x + d).clamp(0, w - 1), y),
                    Axis::Vertical => (x, (y + d).clamp(0, h - 1)),
                };
                let idx = ((sy * w + sx) as usize) * 4;
                for (c, a) in acc.iter_mut().enumerate() {
                    *a += u64::from(kw) * u64::from(src[idx + c]);
                }
            }
            let out_idx = ((y * w + x) as usize) * 4;
            for (c, a) in acc.iter().enumerate() {
                dst[out_idx + c] = ((a + 32768) >> 16).min(255) as u8;
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/perturb/blur.rs"]
mod tests;
