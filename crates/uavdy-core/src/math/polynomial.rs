//! Real roots of low-degree polynomials
//!
//! Used to invert the motor force calibration. Coefficients are given in
//! ascending order: p(x) = c₀ + c₁x + c₂x² + c₃x³.

use nalgebra::{Matrix3, Normed};

/// Relative imaginary part below which an eigenvalue is a real-root candidate.
/// Clustered roots split into conjugate pairs of order √ε.
const NEAR_REAL_TOLERANCE: f64 = 1e-6;

/// Relative residual accepted for a polished real root
const RESIDUAL_TOLERANCE: f64 = 1e-9;

const MAX_NEWTON_STEPS: usize = 30;

/// Evaluate a polynomial with ascending coefficients (Horner)
pub fn evaluate(coeffs: &[f64], x: f64) -> f64 {
    coeffs.iter().rev().fold(0.0, |acc, c| acc * x + c)
}

/// Degree after dropping vanishing leading coefficients
pub fn degree(coeffs: &[f64]) -> usize {
    coeffs
        .iter()
        .rposition(|c| *c != 0.0)
        .unwrap_or(0)
}

/// All real roots of a polynomial of degree 1 to 3
///
/// Returns None for a constant or higher-degree polynomial.
pub fn real_roots(coeffs: &[f64]) -> Option<Vec<f64>> {
    let roots = match degree(coeffs) {
        1 => vec![-coeffs[0] / coeffs[1]],
        2 => quadratic_roots(coeffs[2], coeffs[1], coeffs[0]),
        3 => cubic_roots(coeffs),
        _ => return None,
    };
    Some(roots)
}

/// Smallest x ≥ 0 with p(x) = target
pub fn smallest_nonnegative_root(coeffs: &[f64], target: f64) -> Option<f64> {
    let mut shifted = coeffs.to_vec();
    shifted[0] -= target;

    real_roots(&shifted)?
        .into_iter()
        .filter(|r| *r >= 0.0)
        .min_by(|a, b| a.total_cmp(b))
}

/// Roots of a·x² + b·x + c, avoiding cancellation
fn quadratic_roots(a: f64, b: f64, c: f64) -> Vec<f64> {
    let disc = b * b - 4.0 * a * c;
    if disc < 0.0 {
        return Vec::new();
    }

    let q = -0.5 * (b + b.signum() * disc.sqrt());
    if q == 0.0 {
        // b = 0 and c = 0
        return vec![0.0];
    }
    vec![q / a, c / q]
}

/// Roots of a cubic from the eigenvalues of its companion matrix
///
/// Every nearly real eigenvalue is polished with Newton steps and kept when
/// the polynomial vanishes there to working precision.
fn cubic_roots(coeffs: &[f64]) -> Vec<f64> {
    let a0 = coeffs[0] / coeffs[3];
    let a1 = coeffs[1] / coeffs[3];
    let a2 = coeffs[2] / coeffs[3];

    #[rustfmt::skip]
    let companion = Matrix3::new(
        0.0, 0.0, -a0,
        1.0, 0.0, -a1,
        0.0, 1.0, -a2,
    );

    companion
        .complex_eigenvalues()
        .iter()
        .filter(|z| z.im.abs() <= NEAR_REAL_TOLERANCE * z.norm().max(1.0))
        .map(|z| polish(coeffs, z.re))
        .filter(|x| is_root(coeffs, *x))
        .collect()
}

/// |p(x)| small compared with the magnitude of its terms
fn is_root(coeffs: &[f64], x: f64) -> bool {
    let scale = coeffs
        .iter()
        .rev()
        .fold(0.0, |acc, c| acc * x.abs() + c.abs());
    evaluate(coeffs, x).abs() <= RESIDUAL_TOLERANCE * scale
}

fn polish(coeffs: &[f64], mut x: f64) -> f64 {
    let derivative: Vec<f64> = coeffs
        .iter()
        .enumerate()
        .skip(1)
        .map(|(k, c)| k as f64 * c)
        .collect();

    for _ in 0..MAX_NEWTON_STEPS {
        let slope = evaluate(&derivative, x);
        if slope == 0.0 {
            break;
        }
        let next = x - evaluate(coeffs, x) / slope;
        if !next.is_finite() {
            break;
        }
        let converged = (next - x).abs() <= f64::EPSILON * x.abs().max(1.0);
        x = next;
        if converged {
            break;
        }
    }
    x
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_evaluate() {
        // 1 + 2x + 3x² at x = 2
        assert_relative_eq!(evaluate(&[1.0, 2.0, 3.0], 2.0), 17.0);
    }

    #[test]
    fn test_degree_ignores_zero_leading_terms() {
        assert_eq!(degree(&[1.0, 2.0, 0.0, 0.0]), 1);
        assert_eq!(degree(&[5.0]), 0);
    }

    #[test]
    fn test_constant_has_no_roots() {
        assert!(real_roots(&[2.0]).is_none());
        assert!(real_roots(&[2.0, 0.0, 0.0]).is_none());
    }

    #[test]
    fn test_quadratic_roots() {
        // (x - 2)(x + 3) = x² + x - 6
        let mut roots = real_roots(&[-6.0, 1.0, 1.0]).unwrap();
        roots.sort_by(|a, b| a.total_cmp(b));

        assert_eq!(roots.len(), 2);
        assert_relative_eq!(roots[0], -3.0, epsilon = 1e-12);
        assert_relative_eq!(roots[1], 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_quadratic_without_real_roots() {
        assert!(real_roots(&[1.0, 0.0, 1.0]).unwrap().is_empty());
    }

    #[test]
    fn test_cubic_roots() {
        // (x - 1)(x - 2)(x + 4) = x³ + x² - 10x + 8
        let mut roots = real_roots(&[8.0, -10.0, 1.0, 1.0]).unwrap();
        roots.sort_by(|a, b| a.total_cmp(b));

        assert_eq!(roots.len(), 3);
        assert_relative_eq!(roots[0], -4.0, epsilon = 1e-9);
        assert_relative_eq!(roots[1], 1.0, epsilon = 1e-9);
        assert_relative_eq!(roots[2], 2.0, epsilon = 1e-9);
    }

    #[test]
    fn test_cubic_keeps_double_root() {
        // (x - 1)²(x + 2) = x³ - 3x + 2
        let roots = real_roots(&[2.0, -3.0, 0.0, 1.0]).unwrap();

        assert!(roots.iter().any(|r| (r + 2.0).abs() < 1e-9));
        assert!(roots.iter().any(|r| (r - 1.0).abs() < 1e-6));

        let root = smallest_nonnegative_root(&[2.0, -3.0, 0.0, 1.0], 0.0).unwrap();
        assert_relative_eq!(root, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_cubic_drops_complex_pair() {
        // (x - 2)(x² + 1) = x³ - 2x² + x - 2
        let roots = real_roots(&[-2.0, 1.0, -2.0, 1.0]).unwrap();

        assert_eq!(roots.len(), 1);
        assert_relative_eq!(roots[0], 2.0, epsilon = 1e-9);
    }

    #[test]
    fn test_smallest_nonnegative_root() {
        // x² + x - 6 = 0 shifted: p(x) = x² + x, target 6
        let root = smallest_nonnegative_root(&[0.0, 1.0, 1.0], 6.0).unwrap();
        assert_relative_eq!(root, 2.0, epsilon = 1e-12);

        // Both roots negative
        assert!(smallest_nonnegative_root(&[6.0, 5.0, 1.0], 0.0).is_none());
    }

    #[test]
    fn test_smallest_of_several_nonnegative_roots() {
        // (x - 1)(x - 3) = x² - 4x + 3
        let root = smallest_nonnegative_root(&[3.0, -4.0, 1.0], 0.0).unwrap();
        assert_relative_eq!(root, 1.0, epsilon = 1e-12);
    }
}
