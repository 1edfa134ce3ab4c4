//! Open/retry loop that keeps exactly one session alive.

use crate::link::Connector;
use crate::queue::{ByteReceiver, ByteSender};
use crate::session::{Session, SessionQueues};
use crate::CancelToken;
use log::{debug, info, warn};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Timing of the connection lifecycle
#[derive(Debug, Clone)]
pub struct SupervisorConfig {
    /// Wait between failed open attempts
    pub retry_interval: Duration,
    /// Wait after a successful open before traffic starts, so the device can
    /// finish enumerating
    pub settle_delay: Duration,
    /// Keep-alive period while a session is connected
    pub heartbeat_period: Duration,
    /// Upper bound on how long a blocked worker takes to notice cancellation
    pub poll_interval: Duration,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        SupervisorConfig {
            retry_interval: Duration::from_millis(500),
            settle_delay: Duration::from_secs(1),
            heartbeat_period: Duration::from_millis(200),
            poll_interval: Duration::from_millis(50),
        }
    }
}

pub struct Supervisor<C: Connector> {
    connector: C,
    queues: SessionQueues,
    config: SupervisorConfig,
    sessions: usize,
}

impl<C: Connector> Supervisor<C> {
    /// `inbound` receives bytes read from the link. `outbound`/`outbound_rx`
    /// are both ends of the queue the writer drains.
    pub fn new(
        connector: C,
        inbound: ByteSender,
        outbound: ByteSender,
        outbound_rx: ByteReceiver,
        config: SupervisorConfig,
    ) -> Self {
        Supervisor {
            connector,
            queues: SessionQueues {
                inbound,
                outbound,
                outbound_rx: Arc::new(Mutex::new(outbound_rx)),
            },
            config,
            sessions: 0,
        }
    }

    /// Number of sessions started so far
    pub fn sessions(&self) -> usize {
        self.sessions
    }

    /// Run until `shutdown` is cancelled.
    ///
    /// Open failures are retried forever. A session that ends on its own
    /// (device unplugged, I/O error) leads straight to a new open attempt.
    /// On shutdown the active session is cancelled and joined before this
    /// returns.
    pub fn run(&mut self, shutdown: &CancelToken) {
        let mut error_shown = false;

        loop {
            if shutdown.is_cancelled() {
                break;
            }

            let link = match self.connector.open() {
                Ok(link) => link,
                Err(e) => {
                    if !error_shown {
                        warn!("Failed opening '{}': {}", self.connector.name(), e);
                        error_shown = true;
                    }
                    if shutdown.wait_timeout(self.config.retry_interval) {
                        break;
                    }
                    continue;
                }
            };
            info!("Opened '{}'", self.connector.name());
            error_shown = false;

            if shutdown.wait_timeout(self.config.settle_delay) {
                break;
            }

            let session = match Session::start(
                link,
                &self.queues,
                shutdown,
                self.config.heartbeat_period,
                self.config.poll_interval,
            ) {
                Ok(session) => session,
                Err(e) => {
                    warn!("Failed starting session on '{}': {}", self.connector.name(), e);
                    if shutdown.wait_timeout(self.config.retry_interval) {
                        break;
                    }
                    continue;
                }
            };
            self.sessions += 1;
            debug!("Session {} started", self.sessions);

            if self.wait_session(session, shutdown) {
                info!("Supervisor done");
                return;
            }
            info!("Link '{}' lost, reopening", self.connector.name());
        }

        info!("Stopping supervisor");
    }

    /// Returns true if the session ended because of shutdown
    fn wait_session(&self, session: Session, shutdown: &CancelToken) -> bool {
        loop {
            if shutdown.wait_timeout(self.config.poll_interval) {
                info!("Cancelling session on '{}'", self.connector.name());
                session.cancel();
                session.join();
                return true;
            }
            if session.is_finished() {
                session.join();
                return false;
            }
        }
    }
}
