//! Instantiation of generic types and methods.
//!
//! - **inst**: the three instantiation entry points and their memo tables
//! - **bind**: inferring a function's type arguments from a call site

pub mod bind;
pub mod inst;

pub use bind::bind_type;
pub use inst::{instantiate_fun, instantiate_receiver, instantiate_type};
