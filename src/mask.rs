use ndarray::{s, ArrayView2};

/// Pixel diameter of the object under a vertical band centred on the mask.
///
/// The band spans columns `[w/2 - half_width, w/2 + half_width)`. Columns of
/// the band the object never touches are dropped, then the rows in which every
/// remaining column is set are counted. A mask with nothing in the band
/// measures 0.
pub fn pixel_diameter(mask: ArrayView2<'_, bool>, half_width: usize) -> u32 {
    let cols = mask.ncols();
    if cols == 0 || mask.nrows() == 0 {
        return 0;
    }

    let center = cols / 2;
    let lo = center.saturating_sub(half_width);
    let hi = (center + half_width).min(cols);
    if lo >= hi {
        return 0;
    }

    let band = mask.slice(s![.., lo..hi]);
    let occupied: Vec<usize> = (0..band.ncols())
        .filter(|&c| band.column(c).iter().any(|&v| v))
        .collect();

    if occupied.is_empty() {
        return 0;
    }

    band.rows()
        .into_iter()
        .filter(|row| occupied.iter().all(|&c| row[c]))
        .count() as u32
}
