//! Bounded byte queues with cancellable blocking.

use crate::CancelToken;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender, TrySendError};
use std::time::Duration;

/// Queue capacity used between the link workers and the button engine
pub const DEFAULT_QUEUE_CAPACITY: usize = 10;

pub type ByteSender = SyncSender<u8>;
pub type ByteReceiver = Receiver<u8>;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum QueueError {
    #[error("cancelled")]
    Cancelled,
    #[error("queue disconnected")]
    Disconnected,
}

/// Create a bounded FIFO byte queue
pub fn byte_queue(capacity: usize) -> (ByteSender, ByteReceiver) {
    mpsc::sync_channel(capacity)
}

/// Push a byte, waiting while the queue is full.
///
/// The wait re-checks `cancel` every `poll`.
pub fn push(
    tx: &ByteSender,
    byte: u8,
    cancel: &CancelToken,
    poll: Duration,
) -> Result<(), QueueError> {
    let mut byte = byte;
    loop {
        if cancel.is_cancelled() {
            return Err(QueueError::Cancelled);
        }
        match tx.try_send(byte) {
            Ok(()) => return Ok(()),
            Err(TrySendError::Full(b)) => {
                byte = b;
                if cancel.wait_timeout(poll) {
                    return Err(QueueError::Cancelled);
                }
            }
            Err(TrySendError::Disconnected(_)) => return Err(QueueError::Disconnected),
        }
    }
}

/// Pop a byte, waiting while the queue is empty.
pub fn pop(rx: &ByteReceiver, cancel: &CancelToken, poll: Duration) -> Result<u8, QueueError> {
    loop {
        if cancel.is_cancelled() {
            return Err(QueueError::Cancelled);
        }
        match rx.recv_timeout(poll) {
            Ok(byte) => return Ok(byte),
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => return Err(QueueError::Disconnected),
        }
    }
}
