use crate::shared::frame::Frame;

/// Tiles per side of the composite grid.
const GRID: u32 = 2;

/// Longest tile side; larger crops are scaled down to fit.
const MAX_TILE_SIDE: u32 = 512;

/// Lays up to four crops out in a 2x2 grid, row-major.
///
/// Every tile gets the size of the largest crop (capped) and each crop is
/// stretched to fill its tile. Missing tiles stay black. Returns `None`
/// when no crop is usable.
pub fn compose(samples: &[Frame]) -> Option<Frame> {
    let tiles: Vec<Frame> = samples
        .iter()
        .take((GRID * GRID) as usize)
        .filter(|f| !f.is_empty())
        .filter_map(Frame::to_rgb)
        .collect();
    if tiles.is_empty() {
        return None;
    }

    let tile_w = tiles.iter().map(Frame::width).max()?.min(MAX_TILE_SIDE);
    let tile_h = tiles.iter().map(Frame::height).max()?.min(MAX_TILE_SIDE);
    let out_w = (tile_w * GRID) as usize;
    let out_h = (tile_h * GRID) as usize;
    let mut data = vec![0u8; out_w * out_h * 3];

    for (i, tile) in tiles.iter().enumerate() {
        let ox = (i as u32 % GRID * tile_w) as usize;
        let oy = (i as u32 / GRID * tile_h) as usize;
        let resized = resize_nearest(tile, tile_w, tile_h);
        let row_bytes = tile_w as usize * 3;
        for y in 0..tile_h as usize {
            let src = &resized[y * row_bytes..(y + 1) * row_bytes];
            let start = ((oy + y) * out_w + ox) * 3;
            data[start..start + row_bytes].copy_from_slice(src);
        }
    }

    Some(Frame::new(data, out_w as u32, out_h as u32, 3))
}

/// Nearest-neighbour resize of an RGB frame.
fn resize_nearest(frame: &Frame, width: u32, height: u32) -> Vec<u8> {
    let src = frame.data();
    let (sw, sh) = (frame.width() as usize, frame.height() as usize);
    let (dw, dh) = (width as usize, height as usize);
    let mut out = Vec::with_capacity(dw * dh * 3);
    for y in 0..dh {
        let sy = (y * sh / dh).min(sh - 1);
        for x in 0..dw {
            let sx = (x * sw / dw).min(sw - 1);
            let offset = (sy * sw + sx) * 3;
            out.extend_from_slice(&src[offset..offset + 3]);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(width: u32, height: u32, value: u8) -> Frame {
        Frame::new(vec![value; (width * height * 3) as usize], width, height, 3)
    }

    fn pixel(frame: &Frame, x: u32, y: u32) -> u8 {
        frame.data()[((y * frame.width() + x) * 3) as usize]
    }

    #[test]
    fn test_four_tiles_fill_grid_in_row_major_order() {
        let out = compose(&[solid(4, 6, 10), solid(4, 6, 20), solid(4, 6, 30), solid(4, 6, 40)])
            .unwrap();
        assert_eq!((out.width(), out.height()), (8, 12));
        assert_eq!(pixel(&out, 0, 0), 10);
        assert_eq!(pixel(&out, 7, 0), 20);
        assert_eq!(pixel(&out, 0, 11), 30);
        assert_eq!(pixel(&out, 7, 11), 40);
    }

    #[test]
    fn test_tiles_take_largest_size() {
        let out = compose(&[solid(2, 2, 10), solid(6, 8, 20)]).unwrap();
        assert_eq!((out.width(), out.height()), (12, 16));
        // small crop is stretched over its whole tile
        assert_eq!(pixel(&out, 5, 7), 10);
    }

    #[test]
    fn test_missing_tiles_are_black() {
        let out = compose(&[solid(3, 3, 200)]).unwrap();
        assert_eq!(pixel(&out, 0, 0), 200);
        assert_eq!(pixel(&out, 4, 4), 0);
    }

    #[test]
    fn test_extra_samples_are_ignored() {
        let samples: Vec<Frame> = (1..=6).map(|v| solid(2, 2, v * 10)).collect();
        let out = compose(&samples).unwrap();
        assert_eq!((out.width(), out.height()), (4, 4));
        assert_eq!(pixel(&out, 3, 3), 40);
    }

    #[test]
    fn test_large_tiles_are_capped() {
        let out = compose(&[solid(1000, 20, 1)]).unwrap();
        assert_eq!(out.width(), MAX_TILE_SIDE * 2);
    }

    #[test]
    fn test_grayscale_input_is_converted() {
        let gray = Frame::new(vec![90; 4], 2, 2, 1);
        let out = compose(&[gray]).unwrap();
        assert_eq!(out.channels(), 3);
        assert_eq!(pixel(&out, 1, 1), 90);
    }

    #[test]
    fn test_no_usable_samples() {
        assert!(compose(&[]).is_none());
        assert!(compose(&[Frame::new(Vec::new(), 0, 0, 3)]).is_none());
    }
}
