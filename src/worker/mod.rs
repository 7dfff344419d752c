//! The worker controller and its lifecycle.
//!
//! A hosting runtime drives the controller by dispatching lifecycle events
//! and awaiting the returned future before moving to the next phase, the
//! explicit form of "wait until the async work completes before signaling
//! readiness". Install failures abort the version before it ever activates;
//! the previously active cache generation stays in control.

mod controller;
mod lifecycle;

pub use controller::WorkerController;
pub use lifecycle::{Handled, WorkerEvent, WorkerState};
