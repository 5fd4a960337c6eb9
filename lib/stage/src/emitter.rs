use crate::streaming::Terminating;
use crate::{StageError, StageResult, ValueStream};
use futures::channel::mpsc::{unbounded, UnboundedSender};
use futures::StreamExt;

/// The producer side of a stage created with [StageEngine::create](crate::StageEngine::create).
///
/// Values pushed after [Emitter::error] or [Emitter::complete] are discarded. Dropping the
/// emitter completes the stage.
pub struct Emitter<T> {
    sender: Option<UnboundedSender<StageResult<T>>>,
}

impl<T: Send + 'static> Emitter<T> {
    /// Creates a connected emitter and the stream that receives its signals.
    pub(crate) fn channel() -> (Self, ValueStream<T>) {
        let (sender, receiver) = unbounded();
        let stream = Terminating::new(receiver.boxed()).boxed();
        (
            Self {
                sender: Some(sender),
            },
            stream,
        )
    }

    /// Pushes `value` to the consumer.
    ///
    /// Returns `false` if the stage is already terminated or nobody listens anymore.
    pub fn next(&mut self, value: T) -> bool {
        match &self.sender {
            Some(sender) => sender.unbounded_send(Ok(value)).is_ok(),
            None => false,
        }
    }

    /// Terminates the stage with `error`.
    pub fn error(&mut self, error: StageError) {
        if let Some(sender) = self.sender.take() {
            if sender.unbounded_send(Err(error)).is_err() {
                tracing::trace!("Stage consumer dropped before the error was delivered");
            }
        }
    }

    /// Signals the successful end of the stage.
    pub fn complete(&mut self) {
        self.sender = None;
    }

    /// Returns whether further values would be discarded.
    pub fn is_closed(&self) -> bool {
        self.sender
            .as_ref()
            .map_or(true, UnboundedSender::is_closed)
    }
}
