use crate::error::PickError;
use futures::channel::oneshot;
use sonar_core::{DomHandle, NodeId};
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

/// Outstanding element pick. Resolves with the tracked node under the
/// pointer when the user clicks, or [`PickError::Cancelled`].
pub struct Pick {
    receiver: oneshot::Receiver<Result<NodeId, PickError>>,
}

impl Future for Pick {
    type Output = Result<NodeId, PickError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.receiver).poll(cx) {
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            Poll::Ready(Err(oneshot::Canceled)) => Poll::Ready(Err(PickError::Cancelled)),
            Poll::Pending => Poll::Pending,
        }
    }
}

/// Inspector side of a pick.
pub(crate) struct PickState {
    sender: oneshot::Sender<Result<NodeId, PickError>>,
    pub(crate) hovered: Option<DomHandle>,
}

impl PickState {
    pub(crate) fn new() -> (Self, Pick) {
        let (sender, receiver) = oneshot::channel();
        (
            Self {
                sender,
                hovered: None,
            },
            Pick { receiver },
        )
    }

    pub(crate) fn resolve(self, result: Result<NodeId, PickError>) {
        // The receiver may have been dropped; nobody is waiting then.
        let _ = self.sender.send(result);
    }
}
