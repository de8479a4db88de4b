mod row;
mod matrix;

pub use self::{
    row::*,
    matrix::*,
};
