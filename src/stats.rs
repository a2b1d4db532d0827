//! src/stats.rs
//!
//! The small set of statistics functions the fitness evaluators need
//! (mean, variance, Pearson r², normalized MSE). The spec this core follows
//! treats these as an external collaborator "assumed available with
//! specified signatures"; this module is that assumption made concrete so
//! `crate::fitness` has something to call.

/// Arithmetic mean. Panics on an empty slice - callers always have at
/// least one row by the time they reach here.
pub fn mean(xs: &[f64]) -> f64 {
    assert!(!xs.is_empty(), "mean of an empty slice is undefined");
    xs.iter().sum::<f64>() / xs.len() as f64
}

/// Population variance (divides by `n`, not `n - 1`): matches the NMSE
/// convention of normalizing by the target's own spread.
pub fn variance(xs: &[f64]) -> f64 {
    let m = mean(xs);
    xs.iter().map(|x| (x - m) * (x - m)).sum::<f64>() / xs.len() as f64
}

/// Pearson correlation coefficient between two equal-length series.
pub fn pearson_r(a: &[f64], b: &[f64]) -> f64 {
    assert_eq!(a.len(), b.len(), "pearson_r requires equal-length series");
    let (ma, mb) = (mean(a), mean(b));
    let mut cov = 0.0;
    let mut va = 0.0;
    let mut vb = 0.0;
    for (&x, &y) in a.iter().zip(b.iter()) {
        let dx = x - ma;
        let dy = y - mb;
        cov += dx * dy;
        va += dx * dx;
        vb += dy * dy;
    }
    cov / (va.sqrt() * vb.sqrt())
}

/// `pearson_r(a, b)^2`.
pub fn pearson_r2(a: &[f64], b: &[f64]) -> f64 {
    let r = pearson_r(a, b);
    r * r
}

/// Mean squared error between `prediction` and `target`, divided by the
/// target's own variance. A tree that merely predicts the target's mean
/// scores ~1.0; perfect prediction scores 0.
pub fn normalized_mean_squared_error(prediction: &[f64], target: &[f64]) -> f64 {
    assert_eq!(
        prediction.len(),
        target.len(),
        "normalized_mean_squared_error requires equal-length series"
    );
    let mse = prediction
        .iter()
        .zip(target.iter())
        .map(|(p, t)| (p - t) * (p - t))
        .sum::<f64>()
        / prediction.len() as f64;
    mse / variance(target)
}
