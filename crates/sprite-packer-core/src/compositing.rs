use crate::model::Rect;
use image::RgbaImage;

/// Blit the `src_rect` region of `src` into `canvas` with its top-left at (dx, dy).
///
/// Pixels that would land outside `canvas` are dropped; `src_rect` must lie inside `src`.
pub fn blit_rgba(src: &RgbaImage, canvas: &mut RgbaImage, dx: u32, dy: u32, src_rect: &Rect) {
    let (cw, ch) = canvas.dimensions();
    for yy in 0..src_rect.h {
        let ty = dy + yy;
        if ty >= ch {
            break;
        }
        for xx in 0..src_rect.w {
            let tx = dx + xx;
            if tx >= cw {
                break;
            }
            let px = *src.get_pixel(src_rect.x + xx, src_rect.y + yy);
            canvas.put_pixel(tx, ty, px);
        }
    }
}

/// Smallest power of two that is `>= v` (1 for 0), `None` past `2^31`.
pub fn next_pow2(v: u32) -> Option<u32> {
    v.max(1).checked_next_power_of_two()
}
