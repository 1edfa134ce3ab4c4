//! Worker threads bound to one opened link.

use crate::link::{Link, LinkError};
use crate::queue::{pop, push, ByteReceiver, ByteSender};
use crate::CancelToken;
use buttonbox_protocol::HEARTBEAT_BYTE;
use log::{debug, error, info, trace};
use std::io::{ErrorKind, Read, Write};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

const READ_BUFFER_SIZE: usize = 100;

/// Queue endpoints the session workers attach to.
///
/// These outlive every session; only the workers come and go.
#[derive(Clone)]
pub struct SessionQueues {
    /// Bytes read from the link
    pub inbound: ByteSender,
    /// Producer side of the outbound queue, used by the heartbeat
    pub outbound: ByteSender,
    /// Consumer side of the outbound queue, held by the active writer
    pub outbound_rx: Arc<Mutex<ByteReceiver>>,
}

/// Reader, writer and heartbeat running against one link.
///
/// The session owns a cancellation token that is a child of the token it
/// was started under.
pub struct Session {
    cancel: CancelToken,
    workers: Vec<JoinHandle<()>>,
}

impl Session {
    pub fn start<L: Link>(
        link: L,
        queues: &SessionQueues,
        parent: &CancelToken,
        heartbeat_period: Duration,
        poll: Duration,
    ) -> Result<Session, LinkError> {
        let (reader, writer) = link.split()?;
        let mut session = Session {
            cancel: parent.child(),
            workers: Vec::with_capacity(3),
        };

        let inbound = queues.inbound.clone();
        let cancel = session.cancel.clone();
        session.spawn("reader", move || run_reader(reader, inbound, cancel, poll))?;

        let outbound_rx = queues.outbound_rx.clone();
        let cancel = session.cancel.clone();
        session.spawn("writer", move || run_writer(writer, outbound_rx, cancel, poll))?;

        let outbound = queues.outbound.clone();
        let cancel = session.cancel.clone();
        session.spawn("heartbeat", move || {
            run_heartbeat(outbound, cancel, heartbeat_period, poll)
        })?;

        Ok(session)
    }

    fn spawn<F>(&mut self, name: &str, f: F) -> Result<(), LinkError>
    where
        F: FnOnce() + Send + 'static,
    {
        match thread::Builder::new()
            .name(format!("buttonbox-{}", name))
            .spawn(f)
        {
            Ok(handle) => {
                self.workers.push(handle);
                Ok(())
            }
            Err(e) => {
                // Unwind the workers that did start
                self.cancel();
                self.join_workers();
                Err(LinkError::Io(e))
            }
        }
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// True once every worker has exited
    pub fn is_finished(&self) -> bool {
        self.workers.iter().all(|w| w.is_finished())
    }

    /// Wait for every worker to exit. The link is closed once this returns.
    pub fn join(mut self) {
        self.join_workers();
    }

    fn join_workers(&mut self) {
        for worker in self.workers.drain(..) {
            let name = worker.thread().name().unwrap_or("worker").to_string();
            if worker.join().is_err() {
                error!("Session worker '{}' panicked", name);
            }
        }
    }
}

/// Forward bytes from the link into the inbound queue.
///
/// A zero-length read means the device is gone and cancels the session.
/// Any other read error also cancels the session; read timeouts only serve
/// as a chance to check for cancellation.
pub fn run_reader<R: Read>(mut link: R, inbound: ByteSender, cancel: CancelToken, poll: Duration) {
    let mut buf = [0u8; READ_BUFFER_SIZE];
    debug!("Reader starting");

    while !cancel.is_cancelled() {
        match link.read(&mut buf) {
            Ok(0) => {
                info!("0 bytes to read, link disconnected");
                cancel.cancel();
                break;
            }
            Ok(n) => {
                for &byte in &buf[..n] {
                    trace!("<- {:#04x}", byte);
                    if push(&inbound, byte, &cancel, poll).is_err() {
                        debug!("Reader done");
                        return;
                    }
                }
            }
            Err(ref e)
                if matches!(
                    e.kind(),
                    ErrorKind::TimedOut | ErrorKind::WouldBlock | ErrorKind::Interrupted
                ) => {}
            Err(e) => {
                debug!("Read error: {}", e);
                cancel.cancel();
                break;
            }
        }
    }
    debug!("Reader done");
}

/// Write bytes from the outbound queue to the link, one at a time.
///
/// Stops on cancellation without draining what is left in the queue.
pub fn run_writer<W: Write>(
    mut link: W,
    outbound: Arc<Mutex<ByteReceiver>>,
    cancel: CancelToken,
    poll: Duration,
) {
    let rx = outbound.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    debug!("Writer starting");

    while let Ok(byte) = pop(&rx, &cancel, poll) {
        trace!("-> {:#04x}", byte);
        if let Err(e) = link.write_all(&[byte]) {
            debug!("Write error: {}", e);
            cancel.cancel();
            break;
        }
    }
    debug!("Writer done");
}

/// Push the keep-alive byte onto the outbound queue every `period`.
pub fn run_heartbeat(outbound: ByteSender, cancel: CancelToken, period: Duration, poll: Duration) {
    debug!("Heartbeat starting");
    while !cancel.wait_timeout(period) {
        if push(&outbound, HEARTBEAT_BYTE, &cancel, poll).is_err() {
            break;
        }
    }
    debug!("Heartbeat done");
}
