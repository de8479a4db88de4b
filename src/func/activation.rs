use crate::utils::square_f64;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ActivationFn {
    /// `scale * tanh(steepness * x)`
    ScaledTanh {
        scale: f64,
        steepness: f64,
    },
    Tanh,
}

impl Default for ActivationFn {
    fn default() -> Self {
        ActivationFn::standard_scaled_tanh()
    }
}

impl ActivationFn {

    /// LeCun's scaled tanh, giving roughly unit output variance for normalised inputs.
    pub fn standard_scaled_tanh() -> Self {
        ActivationFn::ScaledTanh {
            scale: 1.7159,
            steepness: 2.0 / 3.0,
        }
    }

    pub fn get_activation(&self, x: f64) -> f64 {
        match self {
            &ActivationFn::ScaledTanh { scale, steepness } => scale * f64::tanh(steepness * x),
            ActivationFn::Tanh => f64::tanh(x),
        }
    }

    /// Derivative with respect to the pre-activation value `x`.
    pub fn get_activation_derivative(&self, x: f64) -> f64 {
        match self {
            &ActivationFn::ScaledTanh { scale, steepness } => {
                scale * steepness * square_f64(sech(steepness * x))
            },
            ActivationFn::Tanh => square_f64(sech(x)),
        }
    }

}

#[inline]
fn sech(x: f64) -> f64 {
    1.0 / f64::cosh(x)
}

#[cfg(test)]
mod test {
    use super::*;

    fn check_numerical_derivative(activation_fn: ActivationFn) {
        let h = 1e-6;
        for step in 0..=100 {
            let x = -5.0 + step as f64 * 0.1;
            let numerical = (activation_fn.get_activation(x + h) - activation_fn.get_activation(x - h)) / (2.0 * h);
            let analytic = activation_fn.get_activation_derivative(x);
            assert!(
                (numerical - analytic).abs() < 1e-6,
                "derivative mismatch at x = {}: numerical {} analytic {}", x, numerical, analytic
            );
        }
    }

    #[test]
    fn test_scaled_tanh_derivative() {
        check_numerical_derivative(ActivationFn::standard_scaled_tanh());
    }

    #[test]
    fn test_tanh_derivative() {
        check_numerical_derivative(ActivationFn::Tanh);
    }

    #[test]
    fn test_scaled_tanh_shape() {
        let f = ActivationFn::standard_scaled_tanh();
        assert_eq!(f.get_activation(0.0), 0.0);
        assert!((f.get_activation(1.5) + f.get_activation(-1.5)).abs() < 1e-12);
        assert!((f.get_activation(1.0) - 1.0).abs() < 0.01);
        assert!(f.get_activation(50.0) <= 1.7159);
        assert!(f.get_activation(2.0) > f.get_activation(1.0));
        // sech must underflow to zero rather than NaN
        assert_eq!(f.get_activation_derivative(2000.0), 0.0);
    }

}
