//! Penalized logistic regression by iteratively reweighted least squares
//!
//! Maximizes `loglik(beta) - penalty / 2 * sum(beta_j^2)` over every
//! coefficient except the intercept (column 0 of the design matrix).
//! Each iteration takes a Newton step, halving it until the penalized
//! objective does not decrease.

use faer::prelude::SolverCore;
use faer::{Mat, Side};

/// Step halvings tried before a Newton step is accepted as-is
const MAX_HALVINGS: usize = 30;

/// Raw output of one fit
#[derive(Debug, Clone)]
pub struct IrlsFit {
    /// Intercept first, then one entry per predictor column
    pub beta: Vec<f64>,
    /// Square roots of the diagonal of the inverse penalized information
    pub std_errors: Vec<f64>,
    pub iterations: usize,
    pub converged: bool,
    /// Unpenalized deviance, `-2 * loglik`
    pub deviance: f64,
}

/// The information matrix could not be factored
#[derive(Debug, Clone, Copy)]
pub struct SingularInformation;

pub fn fit_logistic(
    x: &Mat<f64>,
    y: &[f64],
    penalty: f64,
    max_iterations: usize,
    tolerance: f64,
) -> Result<IrlsFit, SingularInformation> {
    let p = x.ncols();
    let mut beta = vec![0.0; p];
    let mut objective = penalized_loglik(x, y, &beta, penalty);
    let mut converged = false;
    let mut iterations = 0;

    while iterations < max_iterations {
        iterations += 1;

        let mu = fitted(x, &beta);
        let info = information(x, &mu, penalty);
        let inv = invert(&info)?;

        let mut grad = vec![0.0; p];
        for (i, (&yi, &mi)) in y.iter().zip(mu.iter()).enumerate() {
            let resid = yi - mi;
            for (j, g) in grad.iter_mut().enumerate() {
                *g += resid * x[(i, j)];
            }
        }
        for j in 1..p {
            grad[j] -= penalty * beta[j];
        }

        let step: Vec<f64> = (0..p)
            .map(|j| (0..p).map(|k| inv[(j, k)] * grad[k]).sum())
            .collect();

        let mut scale = 1.0;
        let mut candidate = advance(&beta, &step, scale);
        let mut candidate_objective = penalized_loglik(x, y, &candidate, penalty);
        let mut halvings = 0;
        while candidate_objective < objective && halvings < MAX_HALVINGS {
            scale *= 0.5;
            candidate = advance(&beta, &step, scale);
            candidate_objective = penalized_loglik(x, y, &candidate, penalty);
            halvings += 1;
        }

        let change = (candidate_objective - objective).abs();
        let max_step = step.iter().map(|s| (s * scale).abs()).fold(0.0, f64::max);
        beta = candidate;
        let previous = objective;
        objective = candidate_objective;

        if change < tolerance * (previous.abs() + 1.0) || max_step < tolerance {
            converged = true;
            break;
        }
    }

    let mu = fitted(x, &beta);
    let inv = invert(&information(x, &mu, penalty))?;
    let std_errors = (0..p).map(|j| inv[(j, j)].max(0.0).sqrt()).collect();

    Ok(IrlsFit {
        deviance: -2.0 * loglik(x, y, &beta),
        beta,
        std_errors,
        iterations,
        converged,
    })
}

/// Fitted probabilities for every row of `x`
pub fn fitted(x: &Mat<f64>, beta: &[f64]) -> Vec<f64> {
    (0..x.nrows()).map(|i| sigmoid(linear_predictor(x, i, beta))).collect()
}

pub fn sigmoid(eta: f64) -> f64 {
    if eta >= 0.0 {
        1.0 / (1.0 + (-eta).exp())
    } else {
        let e = eta.exp();
        e / (1.0 + e)
    }
}

fn linear_predictor(x: &Mat<f64>, row: usize, beta: &[f64]) -> f64 {
    beta.iter().enumerate().map(|(j, b)| b * x[(row, j)]).sum()
}

/// `log(1 + exp(eta))` without overflow
fn log1p_exp(eta: f64) -> f64 {
    if eta > 0.0 {
        eta + (-eta).exp().ln_1p()
    } else {
        eta.exp().ln_1p()
    }
}

fn loglik(x: &Mat<f64>, y: &[f64], beta: &[f64]) -> f64 {
    y.iter()
        .enumerate()
        .map(|(i, &yi)| {
            let eta = linear_predictor(x, i, beta);
            yi * eta - log1p_exp(eta)
        })
        .sum()
}

fn penalized_loglik(x: &Mat<f64>, y: &[f64], beta: &[f64], penalty: f64) -> f64 {
    let ridge: f64 = beta.iter().skip(1).map(|b| b * b).sum();
    loglik(x, y, beta) - 0.5 * penalty * ridge
}

/// `X' W X + penalty * D`, D the identity with a zero for the intercept
fn information(x: &Mat<f64>, mu: &[f64], penalty: f64) -> Mat<f64> {
    let p = x.ncols();
    let mut info = Mat::<f64>::zeros(p, p);
    for (i, &m) in mu.iter().enumerate() {
        let w = m * (1.0 - m);
        for j in 0..p {
            let xij = x[(i, j)];
            for k in j..p {
                info[(j, k)] += w * xij * x[(i, k)];
            }
        }
    }
    for j in 0..p {
        for k in 0..j {
            info[(j, k)] = info[(k, j)];
        }
        if j > 0 {
            info[(j, j)] += penalty;
        }
    }
    info
}

fn invert(info: &Mat<f64>) -> Result<Mat<f64>, SingularInformation> {
    let chol = info
        .as_ref()
        .cholesky(Side::Lower)
        .map_err(|_| SingularInformation)?;
    let inv = chol.inverse();
    if (0..inv.nrows()).any(|j| !inv[(j, j)].is_finite()) {
        return Err(SingularInformation);
    }
    Ok(inv)
}

fn advance(beta: &[f64], step: &[f64], scale: f64) -> Vec<f64> {
    beta.iter().zip(step).map(|(b, s)| b + scale * s).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn design(xs: &[f64]) -> Mat<f64> {
        Mat::from_fn(xs.len(), 2, |i, j| if j == 0 { 1.0 } else { xs[i] })
    }

    #[test]
    fn test_sigmoid_is_stable() {
        assert!((sigmoid(0.0) - 0.5).abs() < 1e-15);
        assert!(sigmoid(800.0) <= 1.0);
        assert!(sigmoid(-800.0) >= 0.0);
        assert!(log1p_exp(800.0).is_finite());
    }

    #[test]
    fn test_intercept_only_matches_event_rate() {
        let x = Mat::from_fn(4, 1, |_, _| 1.0);
        let y = [1.0, 0.0, 0.0, 0.0];
        let fit = fit_logistic(&x, &y, 0.0, 100, 1e-10).unwrap();
        assert!(fit.converged);
        // logit(0.25) = ln(1/3)
        assert!((fit.beta[0] - (1.0f64 / 3.0).ln()).abs() < 1e-6);
    }

    #[test]
    fn test_overlapping_classes_positive_slope() {
        let xs = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0];
        let y = [0.0, 0.0, 1.0, 0.0, 1.0, 0.0, 1.0, 1.0];
        let fit = fit_logistic(&design(&xs), &y, 0.0, 100, 1e-10).unwrap();
        assert!(fit.converged);
        assert!(fit.beta[1] > 0.0);
        assert!(fit.std_errors.iter().all(|s| s.is_finite() && *s > 0.0));
    }

    #[test]
    fn test_penalty_keeps_separable_fit_finite() {
        let xs = [-3.0, -2.0, -1.0, 1.0, 2.0, 3.0];
        let y = [0.0, 0.0, 0.0, 1.0, 1.0, 1.0];
        let fit = fit_logistic(&design(&xs), &y, 0.1, 200, 1e-10).unwrap();
        assert!(fit.converged);
        assert!(fit.beta[1].is_finite() && fit.beta[1] > 0.0);
        let mu = fitted(&design(&xs), &fit.beta);
        assert!(mu[..3].iter().all(|&m| m < 0.5));
        assert!(mu[3..].iter().all(|&m| m > 0.5));
    }

    #[test]
    fn test_invert_known_matrix() {
        let info = Mat::from_fn(2, 2, |i, j| if i == j { 4.0 } else { 2.0 });
        let inv = invert(&info).unwrap();
        // [[4, 2], [2, 4]]^-1 = [[4, -2], [-2, 4]] / 12
        assert!((inv[(0, 0)] - 1.0 / 3.0).abs() < 1e-12);
        assert!((inv[(0, 1)] + 1.0 / 6.0).abs() < 1e-12);
        assert!((inv[(1, 1)] - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_invert_rejects_indefinite_matrix() {
        let info = Mat::from_fn(2, 2, |i, j| if i == j { 1.0 } else { 3.0 });
        assert!(invert(&info).is_err());
    }

    #[test]
    fn test_penalty_shrinks_slope() {
        let xs = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0];
        let y = [0.0, 0.0, 1.0, 0.0, 1.0, 0.0, 1.0, 1.0];
        let loose = fit_logistic(&design(&xs), &y, 0.0, 100, 1e-10).unwrap();
        let tight = fit_logistic(&design(&xs), &y, 10.0, 100, 1e-10).unwrap();
        assert!(tight.beta[1].abs() < loose.beta[1].abs());
    }
}
