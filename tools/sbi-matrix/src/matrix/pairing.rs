//! Szudzik pairing of (origin, destination) index pairs into one table key

/// Map an ordered pair to a unique `u64`
#[inline]
pub fn pair(x: u32, y: u32) -> u64 {
    let (x, y) = (x as u64, y as u64);
    if x >= y {
        x * x + x + y
    } else {
        y * y + x
    }
}

/// Inverse of [`pair`] for keys it produced
pub fn unpair(z: u64) -> (u32, u32) {
    let root = isqrt(z);
    let rest = z - root * root;
    if rest < root {
        (rest as u32, root as u32)
    } else {
        (root as u32, (rest - root) as u32)
    }
}

/// Exact integer square root (largest `r` with `r * r <= z`)
fn isqrt(z: u64) -> u64 {
    let mut r = (z as f64).sqrt() as u64;
    while r.checked_mul(r).map_or(true, |sq| sq > z) {
        r -= 1;
    }
    while (r + 1).checked_mul(r + 1).is_some_and(|sq| sq <= z) {
        r += 1;
    }
    r
}
