//! Mock chain
//!
//! An in-process stand-in for both the index service and the broadcaster,
//! with failure injection for exercising error and resume paths.

mod chain;
mod failure;

pub use chain::MockChain;
pub use failure::{ChainOp, FailureConfig, FailureInjector, FailureKind};
