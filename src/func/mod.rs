mod activation;
mod error;

pub use self::{
    activation::*,
    error::*,
};
