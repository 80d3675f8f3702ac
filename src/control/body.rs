//! # Control-loop body abstraction.
//!
//! [`ControlLoop`] is the application's main loop: it receives the inputs of
//! one attempt and runs on the control thread until it returns. [`LoopFn`]
//! wraps a closure; [`LoopRef`] is the shared handle the supervisor keeps
//! across relaunches.
//!
//! Each attempt gets fresh [`LoopInputs`]. State that must survive a relaunch
//! lives in the body itself (behind `Arc`/atomics), never in the inputs.

use std::borrow::Cow;
use std::sync::Arc;

use crate::channels::Protocol;
use crate::error::LoopError;

use super::LoopInputs;

/// Synchronous control-loop body.
///
/// # Example
/// ```
/// use hostloop::{ControlLoop, Input, LoopError, LoopInputs, Protocol};
///
/// struct App;
/// impl Protocol for App {
///     type Request = String;
///     type Event = String;
///     type Sound = ();
/// }
///
/// struct Echo;
///
/// impl ControlLoop<App> for Echo {
///     fn name(&self) -> &str { "echo" }
///
///     fn run(&self, inputs: LoopInputs<App>) -> Result<(), LoopError> {
///         loop {
///             match inputs.next()? {
///                 Input::Request(r) => inputs.events.send(r).map_err(|_| LoopError::Disconnected)?,
///                 Input::Activity(_) => {}
///             }
///         }
///     }
/// }
/// ```
pub trait ControlLoop<P: Protocol>: Send + Sync + 'static {
    /// Stable, human-readable name used in logs and thread names.
    fn name(&self) -> &str;

    /// Runs one attempt until it finishes or fails.
    ///
    /// Returning `Ok(())` is a clean exit. Panics are caught by the supervisor
    /// and treated like a returned [`LoopError::Fail`].
    fn run(&self, inputs: LoopInputs<P>) -> Result<(), LoopError>;
}

/// Shared handle to a control-loop body.
pub type LoopRef<P> = Arc<dyn ControlLoop<P>>;

/// Closure-backed control loop.
#[derive(Debug)]
pub struct LoopFn<F> {
    name: Cow<'static, str>,
    f: F,
}

impl<F> LoopFn<F> {
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }

    /// Creates the body and returns it behind an `Arc`.
    pub fn arc(name: impl Into<Cow<'static, str>>, f: F) -> Arc<Self> {
        Arc::new(Self::new(name, f))
    }
}

impl<P, F> ControlLoop<P> for LoopFn<F>
where
    P: Protocol,
    F: Fn(LoopInputs<P>) -> Result<(), LoopError> + Send + Sync + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn run(&self, inputs: LoopInputs<P>) -> Result<(), LoopError> {
        (self.f)(inputs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::TestProto;

    #[test]
    fn loop_fn_keeps_its_name() {
        let body: LoopRef<TestProto> =
            LoopFn::arc("main", |_inputs: LoopInputs<TestProto>| Ok::<_, LoopError>(()));
        assert_eq!(body.name(), "main");
    }
}
