//! Return-series statistics used by the valuation agent and backtest reports.

/// `y = alpha + beta * x`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Regression {
    pub alpha: f64,
    pub beta: f64,
}

/// Simple returns of adjacent closes. Pairs with a non-finite value or a
/// non-positive previous close are dropped.
pub fn pct_returns(closes: &[f64]) -> Vec<f64> {
    closes
        .windows(2)
        .filter_map(|w| {
            let (prev, curr) = (w[0], w[1]);
            if !prev.is_finite() || !curr.is_finite() || prev <= 0.0 {
                return None;
            }
            Some((curr - prev) / prev)
        })
        .collect()
}

pub fn mean(xs: &[f64]) -> f64 {
    if xs.is_empty() {
        return 0.0;
    }
    xs.iter().sum::<f64>() / xs.len() as f64
}

/// Sample standard deviation (n - 1). Zero for fewer than two points.
pub fn stdev(xs: &[f64]) -> f64 {
    if xs.len() < 2 {
        return 0.0;
    }
    let m = mean(xs);
    let var = xs.iter().map(|x| (x - m).powi(2)).sum::<f64>() / (xs.len() - 1) as f64;
    var.sqrt()
}

/// Largest peak-to-trough decline of a price series, as a positive fraction.
pub fn max_drawdown(closes: &[f64]) -> f64 {
    let mut peak: Option<f64> = None;
    let mut worst = 0.0_f64;
    for &p in closes.iter().filter(|p| p.is_finite()) {
        let top = match peak {
            Some(top) if top >= p => top,
            _ => {
                peak = Some(p);
                p
            }
        };
        if top > 0.0 {
            worst = worst.min((p - top) / top);
        }
    }
    worst.abs()
}

/// Mean over stdev, not annualized. Zero when the stdev is zero.
pub fn simple_sharpe(rets: &[f64]) -> f64 {
    let s = stdev(rets);
    if s == 0.0 {
        return 0.0;
    }
    mean(rets) / s
}

/// Ordinary least squares over the first `min(x.len(), y.len())` pairs.
pub fn ols(x: &[f64], y: &[f64]) -> Regression {
    let n = x.len().min(y.len());
    if n == 0 {
        return Regression::default();
    }
    let (x, y) = (&x[..n], &y[..n]);
    let mx = mean(x);
    let my = mean(y);

    let (num, den) = x.iter().zip(y).fold((0.0, 0.0), |(num, den), (xi, yi)| {
        let dx = xi - mx;
        (num + dx * (yi - my), den + dx * dx)
    });
    if den == 0.0 {
        return Regression::default();
    }
    let beta = num / den;
    Regression {
        alpha: my - beta * mx,
        beta,
    }
}

/// Compounded return of a series of simple returns.
pub fn cumulative_return(rets: &[f64]) -> f64 {
    rets.iter().fold(1.0, |eq, r| eq * (1.0 + r)) - 1.0
}

/// Max drawdown of the equity curve `1, (1+r1), (1+r1)(1+r2), ...`.
pub fn equity_drawdown(rets: &[f64]) -> f64 {
    let mut equity = Vec::with_capacity(rets.len() + 1);
    equity.push(1.0);
    let mut eq = 1.0;
    for r in rets {
        eq *= 1.0 + r;
        equity.push(eq);
    }
    max_drawdown(&equity)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn returns_skip_bad_pairs() {
        let rets = pct_returns(&[100.0, 110.0, f64::NAN, 120.0, 0.0, 5.0, 6.0]);
        // 100->110, then (110,NaN) (NaN,120) skipped, 120->0, (0,5) skipped, 5->6
        assert_eq!(rets.len(), 3);
        assert!(approx(rets[0], 0.1));
        assert!(approx(rets[1], -1.0));
        assert!(approx(rets[2], 0.2));
    }

    #[test]
    fn degenerate_inputs_are_zero() {
        assert_eq!(mean(&[]), 0.0);
        assert_eq!(stdev(&[]), 0.0);
        assert_eq!(stdev(&[3.5]), 0.0);
        assert_eq!(max_drawdown(&[]), 0.0);
        assert_eq!(simple_sharpe(&[0.01, 0.01, 0.01]), 0.0);
        assert_eq!(ols(&[], &[1.0]), Regression::default());
        assert_eq!(ols(&[2.0, 2.0], &[1.0, 5.0]), Regression::default());
    }

    #[test]
    fn sample_stdev() {
        // mean 5, squared deviations sum 32, / 7
        let s = stdev(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert!(approx(s, (32.0_f64 / 7.0).sqrt()));
    }

    #[test]
    fn drawdown_tracks_running_peak() {
        let dd = max_drawdown(&[100.0, 120.0, 90.0, 130.0, 104.0]);
        assert!(approx(dd, 0.25));
        assert!(approx(max_drawdown(&[f64::NAN, 10.0, 5.0]), 0.5));
        assert_eq!(max_drawdown(&[1.0, 2.0, 3.0]), 0.0);
    }

    #[test]
    fn ols_recovers_line() {
        let fit = ols(&[1.0, 2.0, 3.0], &[2.0, 4.0, 6.0]);
        assert!(approx(fit.beta, 2.0));
        assert!(approx(fit.alpha, 0.0));

        // extra y values are ignored
        let fit = ols(&[0.0, 1.0], &[1.0, 3.0, 100.0]);
        assert!(approx(fit.beta, 2.0));
        assert!(approx(fit.alpha, 1.0));
    }

    #[test]
    fn sharpe_sign_follows_mean() {
        assert!(simple_sharpe(&[0.02, 0.01, 0.03]) > 0.0);
        assert!(simple_sharpe(&[-0.02, -0.01, -0.03]) < 0.0);
    }

    #[test]
    fn equity_curve_stats() {
        let rets = [0.1, -0.5, 0.2];
        assert!(approx(cumulative_return(&rets), 1.1 * 0.5 * 1.2 - 1.0));
        assert!(approx(equity_drawdown(&rets), 0.5));
        assert_eq!(cumulative_return(&[]), 0.0);
        assert_eq!(equity_drawdown(&[]), 0.0);
    }
}
