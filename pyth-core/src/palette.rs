//! Level-based colouring.

/// Viridis sampled at nine evenly spaced points.
const VIRIDIS: [[u8; 3]; 9] = [
    [68, 1, 84],
    [72, 36, 117],
    [59, 82, 139],
    [44, 114, 142],
    [33, 145, 140],
    [40, 174, 128],
    [94, 201, 98],
    [173, 220, 48],
    [253, 231, 37],
];

/// Maps `t` in `[0, 1]` onto the viridis ramp. Out-of-range and NaN
/// inputs are clamped to the nearest end.
pub fn viridis(t: f64) -> [u8; 4] {
    let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
    let scaled = t * (VIRIDIS.len() - 1) as f64;
    let i = (scaled.floor() as usize).min(VIRIDIS.len() - 2);
    let f = scaled - i as f64;

    let (a, b) = (VIRIDIS[i], VIRIDIS[i + 1]);
    let lerp = |c: usize| (a[c] as f64 + (b[c] as f64 - a[c] as f64) * f).round() as u8;
    [lerp(0), lerp(1), lerp(2), 255]
}

/// Fill colour of a node at `level` in a tree capped at `max_level`.
pub fn level_fill(level: u32, max_level: u32) -> [u8; 4] {
    if max_level == 0 {
        return viridis(0.0);
    }
    viridis(level as f64 / max_level as f64)
}
