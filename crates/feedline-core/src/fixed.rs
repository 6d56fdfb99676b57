use fixed::types::I32F32;

/// Q32.32 fixed-point: 32 integer bits, 32 fractional bits.
pub type Fixed64 = I32F32;

/// Simulated time in milliseconds, carried as Q32.32 so fractional tick
/// lengths (the 16.67 ms reference tick) stay exact across runs.
pub type Millis = Fixed64;

/// Build a Fixed64 from an integer in const context.
#[inline]
pub const fn fx(v: i32) -> Fixed64 {
    Fixed64::from_bits((v as i64) << 32)
}

/// The 16.67 ms reference tick all rates are calibrated against
/// (1667/100 in Q32.32, so every run divides by the same bit pattern).
pub const REF_TICK_MS: Millis = Fixed64::from_bits((1667i64 << 32) / 100);

/// Convert an f64 to Fixed64. Use only for initialization, never in sim loop.
#[inline]
pub fn f64_to_fixed64(v: f64) -> Fixed64 {
    Fixed64::from_num(v)
}

/// Convert Fixed64 to f64. Use only for display, never in sim loop.
#[inline]
pub fn fixed64_to_f64(v: Fixed64) -> f64 {
    v.to_num::<f64>()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fx_matches_from_num() {
        assert_eq!(fx(820), Fixed64::from_num(820));
        assert_eq!(fx(-11), Fixed64::from_num(-11));
        assert_eq!(fx(0), Fixed64::ZERO);
    }

    #[test]
    fn fixed64_basic_arithmetic() {
        let a = f64_to_fixed64(1.5);
        let b = f64_to_fixed64(2.0);
        assert_eq!(fixed64_to_f64(a + b), 3.5);
        assert_eq!(fixed64_to_f64(a * b), 3.0);
    }

    #[test]
    fn fixed64_determinism() {
        let a = f64_to_fixed64(16.67);
        let b = f64_to_fixed64(16.67);
        assert_eq!(a, b);
        assert_eq!(fx(3) * a / a, fx(3));
    }

    #[test]
    fn ref_tick_value() {
        let v = fixed64_to_f64(REF_TICK_MS);
        assert!((v - 16.67).abs() < 1e-9);
    }

    #[test]
    fn millis_ordering() {
        let earlier: Millis = fx(100);
        let later: Millis = fx(4700);
        assert!(earlier < later);
    }
}
