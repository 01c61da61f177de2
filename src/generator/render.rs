//! Locale-independent ASCII rendering of generated values.
//!
//! Integers are rendered as minimal decimal. Floats are truncated to a fixed
//! four decimal places and keep their sign even when the magnitude truncates
//! to zero (`-0.00000015` renders as `-0.0000`).

use bytes::Bytes;

const FLOAT_SCALE: i64 = 10_000;

pub fn render_int(n: i64) -> Bytes {
    Bytes::from(n.to_string())
}

pub fn render_float(f: f64) -> Bytes {
    let scaled = f * FLOAT_SCALE as f64;
    // beyond the fixed-point range `as` would saturate
    if !scaled.is_finite() || scaled.abs() >= i64::MAX as f64 {
        return Bytes::from(format!("{:.4}", f));
    }

    // `as` truncates toward zero
    let magnitude = (scaled as i64).unsigned_abs();
    let sign = if f < 0.0 { "-" } else { "" };
    Bytes::from(format!(
        "{}{}.{:04}",
        sign,
        magnitude / FLOAT_SCALE as u64,
        magnitude % FLOAT_SCALE as u64
    ))
}
