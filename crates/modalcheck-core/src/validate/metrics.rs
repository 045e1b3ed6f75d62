//! Global error and shape-consistency metrics
//!
//! RMSE, MAE and R² compare aligned magnitude series point by point; FRAC
//! compares the complex series themselves through a conjugate-linear inner
//! product and is therefore invariant to any common complex scale factor.
//! All functions expect series of equal, nonzero length (the alignment step
//! guarantees this).

use num_complex::Complex64;

/// Root mean squared error between two magnitude series
pub fn rmse(reference: &[f64], reconstructed: &[f64]) -> f64 {
    debug_assert_eq!(reference.len(), reconstructed.len());
    let sum: f64 = reference
        .iter()
        .zip(reconstructed)
        .map(|(r, c)| (r - c) * (r - c))
        .sum();
    (sum / reference.len() as f64).sqrt()
}

/// Mean absolute error between two magnitude series
pub fn mae(reference: &[f64], reconstructed: &[f64]) -> f64 {
    debug_assert_eq!(reference.len(), reconstructed.len());
    let sum: f64 = reference
        .iter()
        .zip(reconstructed)
        .map(|(r, c)| (r - c).abs())
        .sum();
    sum / reference.len() as f64
}

/// Coefficient of determination between two magnitude series
///
/// Returns `None` when the reference magnitude is constant: the statistic
/// divides by the reference variance and is undefined there, which callers
/// must distinguish from a legitimate zero. Constancy is judged against a
/// scale-relative floor, since a constant that is not exactly representable
/// (0.1, say) leaves a residual variance on the order of rounding noise.
pub fn r_squared(reference: &[f64], reconstructed: &[f64]) -> Option<f64> {
    debug_assert_eq!(reference.len(), reconstructed.len());
    let n = reference.len() as f64;
    let mean = reference.iter().sum::<f64>() / n;
    let ss_res: f64 = reference
        .iter()
        .zip(reconstructed)
        .map(|(r, c)| (r - c) * (r - c))
        .sum();
    let ss_tot: f64 = reference.iter().map(|r| (r - mean) * (r - mean)).sum();
    if ss_tot <= f64::EPSILON * n * mean * mean {
        return None;
    }
    Some(1.0 - ss_res / ss_tot)
}

/// Frequency Response Assurance Criterion between two complex series
///
/// `|⟨a,b⟩|² / (⟨a,a⟩·⟨b,b⟩)` with `⟨a,b⟩ = Σ conj(aᵢ)·bᵢ`. Lies in [0, 1]
/// by Cauchy-Schwarz and equals 1 exactly when the series are complex
/// scalar multiples of one another, so a zero-phase reconstruction of the
/// right shape still scores 1. Returns `None` when either series has
/// numerically zero energy.
pub fn frac(reference: &[Complex64], reconstructed: &[Complex64]) -> Option<f64> {
    debug_assert_eq!(reference.len(), reconstructed.len());
    let cross: Complex64 = reference
        .iter()
        .zip(reconstructed)
        .map(|(a, b)| a.conj() * *b)
        .sum();
    let energy_ref: f64 = reference.iter().map(|a| a.norm_sqr()).sum();
    let energy_rec: f64 = reconstructed.iter().map(|b| b.norm_sqr()).sum();
    if energy_ref <= 0.0 || energy_rec <= 0.0 {
        return None;
    }
    Some(cross.norm_sqr() / (energy_ref * energy_rec))
}
