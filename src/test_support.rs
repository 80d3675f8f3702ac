//! Shared fixtures for unit tests.

use crate::channels::Protocol;

/// Small protocol used across unit tests.
pub(crate) struct TestProto;

impl Protocol for TestProto {
    type Request = u32;
    type Event = String;
    type Sound = &'static str;
}
