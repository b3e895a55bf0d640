//! Bucket boundaries for distribution views

/// `n` bounds starting at `base`, each ten times the previous one
pub fn buckets_n_by_10(base: f64, n: usize) -> Vec<f64> {
    let mut bounds = Vec::with_capacity(n);
    let mut bound = base;
    for _ in 0..n {
        bounds.push(bound);
        bound *= 10.0;
    }
    bounds
}

/// A 1-2-5 series (1, 2, 5, 10, 20, 50, ...) from `low` up to and including
/// the first bound that is at least `high`.
///
/// `low` is expected to be a 1, 2 or 5 times a power of ten.
pub fn buckets_125(low: f64, high: f64) -> Vec<f64> {
    let mut bounds = vec![low];
    let mut last = low;
    while last < high && last > 0.0 {
        let mantissa = (last / 10f64.powf(last.log10().floor())).round();
        last *= if mantissa == 2.0 { 2.5 } else { 2.0 };
        bounds.push(last);
    }
    bounds
}
