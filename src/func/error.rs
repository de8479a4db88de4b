use crate::utils::square_f64;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ErrorFn {
    SquaredError,
}

impl Default for ErrorFn {
    fn default() -> Self {
        ErrorFn::SquaredError
    }
}

impl ErrorFn {
    pub fn get_error(&self, expected: f64, actual: f64) -> f64 {
        match self {
            ErrorFn::SquaredError => 0.5 * square_f64(expected - actual),
        }
    }
    pub fn get_error_derivative(&self, expected: f64, actual: f64) -> f64 {
        match self {
            ErrorFn::SquaredError => actual - expected,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_squared_error() {
        let f = ErrorFn::SquaredError;
        assert_eq!(f.get_error(1.0, 0.5), 0.125);
        assert_eq!(f.get_error_derivative(1.0, 0.25), -0.75);
        assert_eq!(f.get_error_derivative(0.0, 0.25), 0.25);
    }

}
