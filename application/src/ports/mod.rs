//! Ports - interfaces implemented by collaborators outside this crate

pub mod observer;

pub use observer::{ErrorSource, NoObserver, RoundObserver};
