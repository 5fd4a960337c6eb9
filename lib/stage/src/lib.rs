//! Stages are the sequences of values that flow between the operators of a query plan.
//!
//! Operators never build stages on their own. They receive a [StageEngine] handle and use it for
//! every construction and transformation. Two engines are available:
//!
//! - [EagerEngine] materializes the complete content of every stage before the next operator
//!   runs. The order of values is deterministic.
//! - [StreamingEngine] pushes values one at a time through the plan and supports stopping the
//!   upstream work early.
//!
//! The engine is chosen once per execution and then passed to every component.

mod eager;
mod emitter;
mod engine;
mod error;
mod replay;
mod streaming;

pub use eager::{EagerEngine, EagerStage};
pub use emitter::Emitter;
pub use engine::{StageEngine, ValueStream};
pub use error::{StageError, StageResult};
pub use replay::Replayable;
pub use streaming::StreamingEngine;
