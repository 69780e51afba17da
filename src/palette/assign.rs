//! Deterministic color assignment over a [`ColorTable`].
//!
//! Entries are visited in ascending pixel order. The first two get white and
//! black; the rest are spread evenly around the hue circle at full
//! saturation and half value.

use super::table::{ColorTable, Rgb};

/// Hue, saturation and value for the entry at sorted `index` out of `count`.
pub fn sweep_hsv(index: usize, count: usize) -> (f32, f32, f32) {
    if index >= 2 {
        let hue = (index - 2) as f32 / (count - 2) as f32;
        (hue, 1.0, 0.5)
    } else {
        (0.0, 0.0, 1.0 - index as f32)
    }
}

/// Scale a unit channel to a byte, flooring.
#[inline]
fn channel(x: f32) -> u8 {
    (f64::from(x) * 255.0).floor().clamp(0.0, 255.0) as u8
}

/// Six-sector HSV to RGB conversion.
///
/// Channels are floored, so a value of 0.5 becomes 127.
pub fn hsv_to_rgb(h: f32, s: f32, v: f32) -> Rgb {
    if v == 0.0 {
        return Rgb::BLACK;
    }
    if s == 0.0 {
        let c = channel(v);
        return Rgb::new(c, c, c);
    }

    let mut h6 = h * 6.0;
    while h6 >= 6.0 {
        h6 -= 6.0;
    }
    let sector = h6.floor();
    let f = h6 - sector;
    let p = v * (1.0 - s);
    let q = v * (1.0 - s * f);
    let t = v * (1.0 - s * (1.0 - f));

    let (r, g, b) = match sector as i32 {
        1 => (q, v, p),
        2 => (p, v, t),
        3 => (p, q, v),
        4 => (t, p, v),
        5 => (v, p, q),
        _ => (v, t, p),
    };
    Rgb::new(channel(r), channel(g), channel(b))
}

/// Give every entry in `table` its final color and rank.
///
/// Returns the number of entries colored.
pub fn assign_colors(table: &mut ColorTable) -> usize {
    let count = table.len();
    table.for_each_sorted_mut(|index, entry| {
        let (h, s, v) = sweep_hsv(index, count);
        let rgb = hsv_to_rgb(h, s, v);
        log::trace!(
            "pixel {:08x}: hsv ({h:.6}, {s:.6}, {v:.6}) -> rgb ({}, {}, {})",
            entry.pixel,
            rgb.r,
            rgb.g,
            rgb.b
        );
        entry.color = Some(rgb);
        entry.rank = Some(index);
    });
    log::debug!("Assigned {} colors", count);
    count
}
