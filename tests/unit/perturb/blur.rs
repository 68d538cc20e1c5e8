use super::*;

#[test]
fn sigma_0_is_identity() {
    let src = vec![1u8, 2, 3, 4, 5, 6, 7, 8];
    let out = gaussian_blur_rgba8(&src, 1, 2, 0.0).unwrap();
    assert_eq!(out, src);
}

#[test]
fn constant_image_is_identity() {
    let (w, h) = (4u32, 3u32);
    let px = [10u8, 20u8, 30u8, 255u8];
    let src = px.repeat((w * h) as usize);
    let out = gaussian_blur_rgba8(&src, w, h, 1.5).unwrap();
    assert_eq!(out, src);
}

#[test]
fn blur_spreads_energy_from_single_pixel() {
    let (w, h) = (7u32, 7u32);
    let mut src = vec![0u8; (w * h * 4) as usize];
    let center = ((3 * w + 3) * 4) as usize;
    src[center..center + 4].copy_from_slice(&[255, 255, 255, 255]);

    let out = gaussian_blur_rgba8(&src, w, h, 0.8).unwrap();

    let nonzero = out.chunks_exact(4).filter(|px| px[3] != 0).count();
    assert!(nonzero > 1);
    assert!(out[center + 3] < 255);
}

#[test]
fn kernel_sums_to_one() {
    for (radius, sigma) in [(1u32, 0.3f32), (3, 1.0), (6, 2.0)] {
        let k = kernel_q16(radius, sigma).unwrap();
        assert_eq!(k.len(), (2 * radius + 1) as usize);
        assert_eq!(k.iter().map(|&w| u64::from(w)).sum::<u64>(), 65536);
    }
}

#[test]
fn rejects_mismatched_buffer_and_bad_sigma() {
    assert!(gaussian_blur_rgba8(&[0u8; 3], 1, 1, 1.0).is_err());
    assert!(gaussian_blur_rgba8(&[0u8; 4], 1, 1, f32::NAN).is_err());
    assert!(gaussian_blur_rgba8(&[0u8; 4], 1, 1, -1.0).is_err());
}
