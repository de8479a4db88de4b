//! Numeric primitives shared by every layer kind.
//!
//! The sum functions accumulate into their output rather than overwriting it, so a layer composes
//! bias, input and recurrent contributions by calling them one after another on the same buffer.
//! Dimension mismatches are programming errors and panic.

use crate::buffer::Matrix;
use crate::func::ActivationFn;
use crate::layer::NetError;

/// `outputs[o] += weights[o]`
pub fn sum(weights: &[f64], outputs: &mut [f64]) {
    assert_eq!(weights.len(), outputs.len());
    for (output, weight) in outputs.iter_mut().zip(weights) {
        *output += *weight;
    }
}

/// `outputs[o] += sum_i inputs[i] * weights[i, o]`
pub fn weighted_input_sum(inputs: &[f64], weights: &Matrix, outputs: &mut [f64]) {
    assert_eq!(weights.rows(), inputs.len());
    assert_eq!(weights.cols(), outputs.len());
    for (input_index, &input) in inputs.iter().enumerate() {
        let row = weights.row(input_index);
        for (output, weight) in outputs.iter_mut().zip(row) {
            *output += input * weight;
        }
    }
}

/// Transpose of `weighted_input_sum`: `inputs[i] += sum_o outputs[o] * weights[i, o]`
pub fn weighted_output_sum(outputs: &[f64], weights: &Matrix, inputs: &mut [f64]) {
    assert_eq!(weights.rows(), inputs.len());
    assert_eq!(weights.cols(), outputs.len());
    for (input_index, input) in inputs.iter_mut().enumerate() {
        let row = weights.row(input_index);
        let mut sum = *input;
        for (output, weight) in outputs.iter().zip(row) {
            sum += output * weight;
        }
        *input = sum;
    }
}

/// Outer product accumulation: `weights[i, o] += inputs[i] * outputs[o]`
pub fn sum_products(inputs: &[f64], outputs: &[f64], weights: &mut Matrix) {
    assert_eq!(weights.rows(), inputs.len());
    assert_eq!(weights.cols(), outputs.len());
    for (input_index, &input) in inputs.iter().enumerate() {
        for (weight, output) in weights.row_mut(input_index).iter_mut().zip(outputs) {
            *weight += input * output;
        }
    }
}

/// Gradient descent step: `weights -= errors * learning_coefficient`
pub fn apply_weight_changes(weights: &mut [f64], errors: &[f64], learning_coefficient: f64) {
    assert_eq!(weights.len(), errors.len());
    for (weight, error) in weights.iter_mut().zip(errors) {
        *weight -= error * learning_coefficient;
    }
}

pub fn apply_matrix_weight_changes(weights: &mut Matrix, errors: &Matrix, learning_coefficient: f64) {
    assert_eq!((weights.rows(), weights.cols()), (errors.rows(), errors.cols()));
    apply_weight_changes(weights.as_mut_slice(), errors.as_slice(), learning_coefficient);
}

pub fn multiply(values: &mut [f64], factor: f64) {
    for value in values.iter_mut() {
        *value *= factor;
    }
}

/// Copies `parts` back to back into `target`, which must be exactly as long as all of them.
pub fn write_parts_into(parts: &[&[f64]], target: &mut [f64]) {
    assert_eq!(target.len(), parts.iter().map(|part| part.len()).sum::<usize>());
    let mut offset = 0;
    for part in parts {
        target[offset..offset + part.len()].copy_from_slice(part);
        offset += part.len();
    }
}

pub fn sum_absolute(weights: &[f64]) -> f64 {
    weights.iter().map(|weight| weight.abs()).sum()
}

/// Applies the activation elementwise. A non-finite output aborts with `NetError::InvalidValue`.
/// An infinite weighted sum counts as non-finite even though tanh would saturate it.
pub fn output_from_activation(
    activation_fn: &ActivationFn,
    weighted_sums: &[f64],
    outputs: &mut [f64],
) -> Result<(), NetError> {
    assert_eq!(weighted_sums.len(), outputs.len());
    for (unit, (output, &weighted_sum)) in outputs.iter_mut().zip(weighted_sums).enumerate() {
        let activated = activation_fn.get_activation(weighted_sum);
        if !(weighted_sum.is_finite() && activated.is_finite()) {
            return Err(NetError::InvalidValue(unit, weighted_sum));
        }
        *output = activated;
    }
    Ok(())
}

pub fn multiply_by_activation_derivative(activation_fn: &ActivationFn, weighted_sums: &[f64], errors: &mut [f64]) {
    assert_eq!(weighted_sums.len(), errors.len());
    for (error, &weighted_sum) in errors.iter_mut().zip(weighted_sums) {
        *error *= activation_fn.get_activation_derivative(weighted_sum);
    }
}
