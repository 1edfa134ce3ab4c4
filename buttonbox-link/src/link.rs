//! Link abstraction over the opened hardware connection.

use serialport::SerialPort;
use std::io::{Read, Write};
use std::time::Duration;

/// Fixed line rate of the panel
pub const DEFAULT_BAUD_RATE: u32 = 9600;

/// How long a read may block before the reader re-checks cancellation
const READ_TIMEOUT: Duration = Duration::from_millis(100);

#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    #[error("serial port error: {0}")]
    Serial(#[from] serialport::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// An opened duplex byte connection.
///
/// A link is split once per session into a read half and a write half that
/// live on separate threads. The link is closed when both halves are dropped.
///
/// Reads should time out periodically (`ErrorKind::TimedOut` or
/// `ErrorKind::WouldBlock`) so the reader can notice cancellation.
pub trait Link: Send + 'static {
    type Reader: Read + Send + 'static;
    type Writer: Write + Send + 'static;

    fn split(self) -> Result<(Self::Reader, Self::Writer), LinkError>;
}

/// Something that can open a [`Link`], possibly many times over
pub trait Connector {
    type Link: Link;

    fn open(&mut self) -> Result<Self::Link, LinkError>;

    /// Human readable link identifier for log messages
    fn name(&self) -> &str;
}

/// A serial port opened through `serialport`
pub struct SerialLink {
    port: Box<dyn SerialPort>,
}

impl Link for SerialLink {
    type Reader = Box<dyn SerialPort>;
    type Writer = Box<dyn SerialPort>;

    fn split(self) -> Result<(Self::Reader, Self::Writer), LinkError> {
        let reader = self.port.try_clone()?;
        Ok((reader, self.port))
    }
}

/// Opens the panel's serial device by path
#[derive(Debug, Clone)]
pub struct SerialConnector {
    path: String,
    baud_rate: u32,
}

impl SerialConnector {
    pub fn new<S: Into<String>>(path: S) -> Self {
        SerialConnector {
            path: path.into(),
            baud_rate: DEFAULT_BAUD_RATE,
        }
    }

    pub fn baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }
}

impl Connector for SerialConnector {
    type Link = SerialLink;

    fn open(&mut self) -> Result<SerialLink, LinkError> {
        let port = serialport::new(&self.path, self.baud_rate)
            .data_bits(serialport::DataBits::Eight)
            .parity(serialport::Parity::None)
            .stop_bits(serialport::StopBits::One)
            .flow_control(serialport::FlowControl::None)
            .timeout(READ_TIMEOUT)
            .open()?;
        Ok(SerialLink { port })
    }

    fn name(&self) -> &str {
        &self.path
    }
}
