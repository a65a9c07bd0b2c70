pub fn clamp(n: f64, lo: f64, hi: f64) -> f64 {
    n.max(lo).min(hi)
}

/// Position of `n` in `[lo, hi]`, clamped to `[0, 1]`. 0.5 for an empty range.
pub fn minmax(n: f64, lo: f64, hi: f64) -> f64 {
    if hi == lo {
        return 0.5;
    }
    clamp((n - lo) / (hi - lo), 0.0, 1.0)
}

pub fn bucket_label(x: f64) -> &'static str {
    if x >= 0.67 {
        "strong"
    } else if x >= 0.33 {
        "moderate"
    } else {
        "weak"
    }
}

/// Clamp and round a blended value onto the 0..=100 score scale.
pub fn to_score(x: f64) -> u8 {
    clamp(x, 0.0, 100.0).round() as u8
}

/// Short USD amount: `950`, `12K`, `1.2M`, `345M`, `3.4B`.
pub fn compact_usd(n: f64) -> String {
    const UNITS: [(f64, &str); 4] = [(1e12, "T"), (1e9, "B"), (1e6, "M"), (1e3, "K")];

    let abs = n.abs();
    let (scaled, suffix) = UNITS
        .iter()
        .find(|(size, _)| abs >= *size)
        .map(|(size, suffix)| (n / size, *suffix))
        .unwrap_or((n, ""));

    let text = if scaled.abs() < 100.0 {
        let s = format!("{scaled:.1}");
        s.strip_suffix(".0").map(str::to_string).unwrap_or(s)
    } else {
        format!("{scaled:.0}")
    };
    format!("{text}{suffix}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minmax_bounds() {
        assert_eq!(minmax(5.0, 0.0, 10.0), 0.5);
        assert_eq!(minmax(-3.0, 0.0, 10.0), 0.0);
        assert_eq!(minmax(30.0, 0.0, 10.0), 1.0);
        assert_eq!(minmax(7.0, 2.0, 2.0), 0.5);
    }

    #[test]
    fn buckets() {
        assert_eq!(bucket_label(0.9), "strong");
        assert_eq!(bucket_label(0.67), "strong");
        assert_eq!(bucket_label(0.5), "moderate");
        assert_eq!(bucket_label(0.1), "weak");
    }

    #[test]
    fn score_rounding_and_clamp() {
        assert_eq!(to_score(64.5), 65);
        assert_eq!(to_score(-4.0), 0);
        assert_eq!(to_score(140.0), 100);
    }

    #[test]
    fn compact_amounts() {
        assert_eq!(compact_usd(950.0), "950");
        assert_eq!(compact_usd(12_000.0), "12K");
        assert_eq!(compact_usd(1_234_567.0), "1.2M");
        assert_eq!(compact_usd(345_000_000.0), "345M");
        assert_eq!(compact_usd(3_400_000_000.0), "3.4B");
    }
}
