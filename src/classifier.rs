//! Uniform classifier abstraction over remote intent-classification services.
//!
//! # Architecture
//!
//! - [`ClassifierAdapter`]: capability contract every backend implements
//!   (train, predict, accepted parameters, identity)
//! - [`AdapterFactory`]: builds adapters by backend name, rejecting
//!   parameters a backend does not accept before anything is constructed
//! - [`Parameters`] / [`ParamValue`]: backend tunables
//! - [`TrainingPoller`]: explicit `submitted → training → ready | failed`
//!   state machine used by backends whose training is asynchronous
//!
//! Concrete vendor adapters live in [`crate::backend`].

mod adapter;
mod factory;
mod params;
mod training;

pub use adapter::ClassifierAdapter;
pub use factory::{AdapterFactory, check_parameters};
pub use params::{ParamValue, Parameters};
pub use training::{
    PollPolicy, Sleeper, ThreadSleeper, TrainingPoller, TrainingProbe, TrainingState,
};
