//! Crate includes reusable utils shared by the Alt-DA services, such as
//! initializing the tracing framework and retrying flaky calls.

pub mod logging;
pub mod retry;
