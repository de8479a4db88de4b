mod state;
mod trainer;
mod evaluator;
mod executor;

pub use self::{
    state::*,
    trainer::*,
    evaluator::*,
    executor::*,
};
