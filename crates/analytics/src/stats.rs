//! Windowed statistics over optional-valued sequences.
//!
//! Conventions follow the usual dataframe semantics: a rolling window is
//! defined only when it holds enough non-missing observations, standard
//! deviations are sample (n - 1) estimates, and degenerate results are
//! reported as `None` rather than infinities.

/// Arithmetic mean, `None` for an empty slice.
#[must_use]
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (n - 1 denominator), `None` below two points.
#[must_use]
pub fn sample_std(values: &[f64]) -> Option<f64> {
    mean_and_std(values).map(|(_, std)| std)
}

/// Sample standard deviation of the defined values, skipping missing ones.
#[must_use]
pub fn nan_std(values: &[Option<f64>]) -> Option<f64> {
    let defined: Vec<f64> = values.iter().flatten().copied().collect();
    sample_std(&defined)
}

/// Sum of defined values; zero when nothing is defined.
#[must_use]
pub fn nan_sum(values: &[Option<f64>]) -> f64 {
    values.iter().flatten().sum()
}

/// Mean of defined values, `None` when nothing is defined.
#[must_use]
pub fn nan_mean<'a, I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = &'a Option<f64>>,
{
    let (sum, count) = values
        .into_iter()
        .flatten()
        .fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    (count > 0).then(|| sum / count as f64)
}

/// Two-pass mean and sample std. A spread that is pure rounding noise
/// around a constant is snapped to exactly zero.
fn mean_and_std(values: &[f64]) -> Option<(f64, f64)> {
    if values.len() < 2 {
        return None;
    }
    let n = values.len() as f64;
    let m = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (n - 1.0);
    let std = variance.sqrt();
    let noise_floor = n * f64::EPSILON * m.abs();
    Some((m, if std <= noise_floor { 0.0 } else { std }))
}

/// Collects a full window, `None` if any observation in it is missing.
fn full_window(window: &[Option<f64>]) -> Option<Vec<f64>> {
    window.iter().copied().collect()
}

/// Rolling mean; defined once `window` consecutive values are all present.
#[must_use]
pub fn rolling_mean(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    rolling_apply(values, window, mean)
}

/// Rolling sample std; defined once `window` consecutive values are all present.
#[must_use]
pub fn rolling_std(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    rolling_apply(values, window, sample_std)
}

fn rolling_apply<F>(values: &[Option<f64>], window: usize, f: F) -> Vec<Option<f64>>
where
    F: Fn(&[f64]) -> Option<f64>,
{
    let mut out = vec![None; values.len()];
    if window == 0 || values.len() < window {
        return out;
    }
    for end in window..=values.len() {
        out[end - 1] = full_window(&values[end - window..end]).and_then(|w| f(&w));
    }
    out
}

/// Pearson correlation, `None` for fewer than two points or zero variance.
#[must_use]
pub fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.len() != y.len() || x.len() < 2 {
        return None;
    }

    let n = x.len() as f64;
    let mean_x = x.iter().sum::<f64>() / n;
    let mean_y = y.iter().sum::<f64>() / n;

    let mut covariance = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;

    for (xi, yi) in x.iter().zip(y.iter()) {
        let dx = xi - mean_x;
        let dy = yi - mean_y;
        covariance += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    let denominator = (var_x * var_y).sqrt();
    if denominator < f64::EPSILON {
        return None;
    }

    Some((covariance / denominator).clamp(-1.0, 1.0))
}

/// Rolling Pearson correlation over pairwise-complete observations.
///
/// Each output bar looks back at most `window` bars and is defined when at
/// least `min_periods` of them have both values present.
#[must_use]
pub fn rolling_corr(
    x: &[Option<f64>],
    y: &[Option<f64>],
    window: usize,
    min_periods: usize,
) -> Vec<Option<f64>> {
    let n = x.len().min(y.len());
    let mut out = vec![None; n];
    if window == 0 {
        return out;
    }
    let min_periods = min_periods.max(1);

    let mut xs = Vec::with_capacity(window);
    let mut ys = Vec::with_capacity(window);
    for end in 1..=n {
        let start = end.saturating_sub(window);
        xs.clear();
        ys.clear();
        for (a, b) in x[start..end].iter().zip(&y[start..end]) {
            if let (Some(a), Some(b)) = (a, b) {
                xs.push(*a);
                ys.push(*b);
            }
        }
        if xs.len() >= min_periods {
            out[end - 1] = pearson(&xs, &ys);
        }
    }
    out
}
