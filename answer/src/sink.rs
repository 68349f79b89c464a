use async_trait::async_trait;
use quarry_protocol::AnswerEvent;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;

/// The consumer of a streamed answer has gone away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("answer sink closed")]
pub struct SinkClosed;

/// Destination for streamed answer events.
///
/// The transport that carries events to a client (SSE, websocket, terminal)
/// lives behind this trait.
#[async_trait]
pub trait AnswerSink: Send + Sync {
    async fn emit(&self, event: AnswerEvent) -> Result<(), SinkClosed>;

    /// No further events will be emitted.
    async fn close(&self) {}

    /// Resolves once the consumer has gone away. Sinks that cannot observe
    /// a disconnect never resolve.
    async fn closed(&self) {
        futures::future::pending::<()>().await
    }
}

#[async_trait]
impl<T> AnswerSink for Arc<T>
where
    T: AnswerSink + ?Sized,
{
    async fn emit(&self, event: AnswerEvent) -> Result<(), SinkClosed> {
        (**self).emit(event).await
    }

    async fn close(&self) {
        (**self).close().await
    }

    async fn closed(&self) {
        (**self).closed().await
    }
}

/// Sink backed by a bounded channel; a dropped receiver is a disconnect.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::Sender<AnswerEvent>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::Sender<AnswerEvent>) -> Self {
        Self { tx }
    }

    pub fn channel(buffer: usize) -> (Self, mpsc::Receiver<AnswerEvent>) {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        (Self::new(tx), rx)
    }
}

#[async_trait]
impl AnswerSink for ChannelSink {
    async fn emit(&self, event: AnswerEvent) -> Result<(), SinkClosed> {
        self.tx.send(event).await.map_err(|_| SinkClosed)
    }

    async fn closed(&self) {
        self.tx.closed().await
    }
}
