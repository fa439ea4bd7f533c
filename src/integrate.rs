//! Cumulative trapezoid integration with a truncation error estimate.

use crate::errors::*;
use ndarray::{Array1, ArrayView1};

/// Cumulative integral of a sampled function together with its truncation error
#[derive(Debug, Clone, PartialEq)]
pub struct Integral {
    /// `value[k]` is the trapezoid integral over `x[0..=k]`
    pub value: Array1<f64>,
    /// `truncation_error[k]` is the trapezoid error estimate for `value[k]`
    pub truncation_error: Array1<f64>,
}

impl Integral {
    /// The integral over the whole abscissa
    pub fn total(&self) -> f64 {
        self.value[self.value.len() - 1]
    }

    /// The truncation error of the integral over the whole abscissa
    pub fn total_error(&self) -> f64 {
        self.truncation_error[self.truncation_error.len() - 1]
    }
}

/// Gradient of a series sampled with unit spacing.
///
/// Interior points use central differences, the two end points one-sided first differences.
pub fn gradient(y: ArrayView1<'_, f64>) -> Result<Array1<f64>> {
    let n = y.len();
    if n < 2 {
        return Err(AnharmError::too_few("gradient", 2, n));
    }

    let mut g = Array1::<f64>::zeros(n);
    g[0] = y[1] - y[0];
    for i in 1..n - 1 {
        g[i] = (y[i + 1] - y[i - 1]) / 2.0;
    }
    g[n - 1] = y[n - 1] - y[n - 2];
    Ok(g)
}

/// Integrate `y` over `x` with the trapezoid rule, keeping every partial sum.
///
/// Alongside the integral, each step carries the standard trapezoid truncation error estimate
///
/// $$
///     \epsilon_k = \frac{(x_{n-1} - x_0)^2}{12 n^2} \left( y'_k - y'_0 \right)
/// $$
///
/// where $y'$ is the unit-spacing [`gradient`] of the prefix `y[0..=k]` and $n$ is the length of
/// the *whole* abscissa, so every step is scaled by the final integration window.
///
/// Empty and single-point input integrate to `[0]` with error `[0]`.
///
/// # Examples
///
/// ```
/// use anharm_rs::integrate::cumulative_trapezoid;
/// use ndarray::array;
///
/// let x = array![0.0, 1.0, 2.0];
/// let y = array![0.0, 2.0, 4.0];
/// let integral = cumulative_trapezoid(x.view(), y.view()).unwrap();
/// assert_eq!(integral.value, array![0.0, 1.0, 4.0]);
/// assert_eq!(integral.truncation_error, array![0.0, 0.0, 0.0]);
/// ```
pub fn cumulative_trapezoid(x: ArrayView1<'_, f64>, y: ArrayView1<'_, f64>) -> Result<Integral> {
    if x.len() != y.len() {
        return Err(AnharmError::ArrayLengthMismatch(y.len(), x.len()));
    }

    let n = x.len();
    let mut value = Array1::<f64>::zeros(n.max(1));
    let mut truncation_error = Array1::<f64>::zeros(n.max(1));
    if n < 2 {
        return Ok(Integral {
            value,
            truncation_error,
        });
    }

    let scale = (x[n - 1] - x[0]).powi(2) / (12.0 * (n * n) as f64);
    let first_slope = y[1] - y[0];
    let mut running = 0.0;
    for k in 1..n {
        running += (x[k] - x[k - 1]) * (y[k] + y[k - 1]) / 2.0;
        value[k] = running;
        // A two-point prefix has the same one-sided difference at both ends.
        if k >= 2 {
            truncation_error[k] = scale * ((y[k] - y[k - 1]) - first_slope);
        }
    }

    Ok(Integral {
        value,
        truncation_error,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::{array, Array1};

    #[test]
    fn empty_input_is_single_zero() {
        let empty = Array1::<f64>::zeros(0);
        let integral = cumulative_trapezoid(empty.view(), empty.view()).unwrap();

        assert_eq!(integral.value, array![0.0]);
        assert_eq!(integral.truncation_error, array![0.0]);
    }

    #[test]
    fn single_point_is_single_zero() {
        let x = array![3.0];
        let y = array![7.0];
        let integral = cumulative_trapezoid(x.view(), y.view()).unwrap();

        assert_eq!(integral.value, array![0.0]);
        assert_eq!(integral.truncation_error, array![0.0]);
    }

    #[test]
    fn linear_integrand_matches_closed_form() {
        let (a, b) = (1.7, -0.3);
        let x = Array1::linspace(0.5, 4.5, 17);
        let y = x.mapv(|x| a * x + b);
        let integral = cumulative_trapezoid(x.view(), y.view()).unwrap();

        for k in 0..x.len() {
            let exact = a / 2.0 * (x[k] * x[k] - x[0] * x[0]) + b * (x[k] - x[0]);
            assert_abs_diff_eq!(integral.value[k], exact, epsilon = 1e-10);
            assert_abs_diff_eq!(integral.truncation_error[k], 0.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn linear_integrand_on_uneven_grid_has_error() {
        // The unit-spacing gradient sees the uneven steps of x as curvature in y.
        let x = array![0.0, 1.0, 3.0];
        let y = x.clone();
        let integral = cumulative_trapezoid(x.view(), y.view()).unwrap();

        assert_abs_diff_eq!(integral.value[2], 4.5, epsilon = 1e-12);
        assert_abs_diff_eq!(integral.truncation_error[2], 1.0 / 12.0, epsilon = 1e-12);
    }

    #[test]
    fn zero_integrand_is_all_zero() {
        let x = array![0.0, 0.3, 1.1, 2.0, 5.0];
        let y = Array1::<f64>::zeros(5);
        let integral = cumulative_trapezoid(x.view(), y.view()).unwrap();

        assert_eq!(integral.value, Array1::<f64>::zeros(5));
        assert_eq!(integral.truncation_error, Array1::<f64>::zeros(5));
    }

    #[test]
    fn quadratic_error_uses_full_window() {
        // y = x^2 on x = 0, 1, 2, 3: prefix gradients are known exactly.
        let x = array![0.0, 1.0, 2.0, 3.0];
        let y = x.mapv(|x: f64| x * x);
        let integral = cumulative_trapezoid(x.view(), y.view()).unwrap();

        let scale = 9.0 / (12.0 * 16.0);
        // y' of [0, 1, 4] is [1, 2, 3]; of [0, 1, 4, 9] is [1, 2, 4, 5].
        let expected_value = [0.0, 0.5, 3.0, 9.5];
        let expected_error = [0.0, 0.0, scale * 2.0, scale * 4.0];
        for k in 0..4 {
            assert_abs_diff_eq!(integral.value[k], expected_value[k], epsilon = 1e-12);
            assert_abs_diff_eq!(integral.truncation_error[k], expected_error[k], epsilon = 1e-12);
        }
    }

    #[test]
    fn gradient_matches_central_differences() {
        let y = array![1.0, 2.0, 4.0, 7.0, 11.0];
        let g = gradient(y.view()).unwrap();
        assert_eq!(g, array![1.0, 1.5, 2.5, 3.5, 4.0]);
    }

    #[test]
    fn gradient_needs_two_points() {
        let y = array![1.0];
        assert!(matches!(
            gradient(y.view()),
            Err(AnharmError::TooFewSamples { needed: 2, found: 1, .. })
        ));
    }

    #[test]
    fn mismatched_lengths_are_rejected() {
        let x = array![0.0, 1.0, 2.0];
        let y = array![0.0, 1.0];
        assert!(matches!(
            cumulative_trapezoid(x.view(), y.view()),
            Err(AnharmError::ArrayLengthMismatch(2, 3))
        ));
    }
}
