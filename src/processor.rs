//! Runs the button engine between the inbound and outbound queues.

use buttonbox_link::{pop, push, ByteReceiver, ByteSender, CancelToken, QueueError};
use buttonbox_protocol::ButtonEngine;
use log::{debug, info, trace};
use std::time::Duration;

/// Engine task. Lives for the whole process, across any number of link
/// sessions; only `shutdown` or a closed inbound queue stops it.
pub struct ButtonProcessor {
    engine: ButtonEngine,
    inbound: ByteReceiver,
    outbound: ByteSender,
    poll: Duration,
}

impl ButtonProcessor {
    pub fn new(
        engine: ButtonEngine,
        inbound: ByteReceiver,
        outbound: ByteSender,
        poll: Duration,
    ) -> Self {
        ButtonProcessor {
            engine,
            inbound,
            outbound,
            poll,
        }
    }

    /// Seed the LEDs once, then toggle on every press. Returns the engine so
    /// its final state can be inspected.
    pub fn run(self, shutdown: &CancelToken) -> ButtonEngine {
        let ButtonProcessor {
            mut engine,
            inbound,
            outbound,
            poll,
        } = self;
        info!("Button processor starting");

        for command in engine.seed_commands() {
            if push(&outbound, command, shutdown, poll).is_err() {
                info!("Button processor done");
                return engine;
            }
        }

        loop {
            let byte = match pop(&inbound, shutdown, poll) {
                Ok(byte) => byte,
                Err(QueueError::Cancelled) => break,
                Err(QueueError::Disconnected) => {
                    debug!("Inbound queue closed");
                    break;
                }
            };
            let Some(command) = engine.handle_byte(byte) else {
                continue;
            };
            trace!("button {:#04x} -> led {:#04x}", byte, command);
            if push(&outbound, command, shutdown, poll).is_err() {
                break;
            }
        }

        info!("Button processor done");
        engine
    }
}
