//! Trigger link to the measuring microcontroller.
//!
//! Protocol: the host discards whatever is still queued from earlier trials,
//! writes the single byte `g` and drains the output queue. The device answers
//! with up to 63 bytes of ASCII, normally ended by a newline, once it has seen
//! the triggered stimulus on its photodiode.

use std::io::{self, Read, Write};
use std::time::{Duration, Instant};

use gazelat_core::{TransportError, TriggerTransport};
use serialport::{ClearBuffer, DataBits, FlowControl, Parity, SerialPort, StopBits};
use tracing::{debug, trace};

pub const TRIGGER_BYTE: u8 = b'g';

/// Longest acknowledgement accepted; one byte of the device's 64-byte frame is
/// reserved for the terminator.
pub const ACK_CAPACITY: usize = 63;

/// Granularity at which an unbounded read re-arms the port timeout. Once part
/// of an acknowledgement has arrived, a silent slice also ends the message.
const READ_SLICE: Duration = Duration::from_millis(100);

/// Byte stream the trigger talks over.
pub trait TriggerPort: Read + Write {
    /// Drops bytes received but not yet read.
    fn discard_input(&mut self) -> io::Result<()>;
}

impl TriggerPort for Box<dyn SerialPort> {
    fn discard_input(&mut self) -> io::Result<()> {
        self.clear(ClearBuffer::Input).map_err(io::Error::from)
    }
}

pub struct SerialTrigger<P = Box<dyn SerialPort>> {
    port: P,
    ack_timeout: Option<Duration>,
}

impl SerialTrigger {
    /// Opens `device` at `baud`, 8N1, no flow control.
    pub fn open(device: &str, baud: u32, ack_timeout: Option<Duration>) -> Result<Self, TransportError> {
        let slice = ack_timeout.map_or(READ_SLICE, |t| t.min(READ_SLICE));
        let port = serialport::new(device, baud)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(slice)
            .open()
            .map_err(io::Error::from)?;
        port.clear(ClearBuffer::All).map_err(io::Error::from)?;
        debug!(device, baud, "trigger port opened");
        Ok(Self::from_port(port, ack_timeout))
    }
}

impl<P: TriggerPort> SerialTrigger<P> {
    pub fn from_port(port: P, ack_timeout: Option<Duration>) -> Self {
        Self { port, ack_timeout }
    }
}

impl<P: TriggerPort> TriggerTransport for SerialTrigger<P> {
    fn send_trigger(&mut self) -> Result<(), TransportError> {
        // a late or split acknowledgement must not be read as this trial's
        self.port.discard_input()?;
        let written = self.port.write(&[TRIGGER_BYTE])?;
        if written != 1 {
            return Err(TransportError::ShortWrite { written });
        }
        self.port.flush()?;
        trace!("trigger byte sent");
        Ok(())
    }

    /// Reads until a newline, a full buffer, end of stream, or a silent
    /// slice after the first bytes.
    fn receive_ack(&mut self) -> Result<String, TransportError> {
        let mut buf = [0u8; ACK_CAPACITY];
        let mut len = 0;
        let started = Instant::now();
        loop {
            match self.port.read(&mut buf[len..]) {
                Ok(0) => break,
                Ok(n) => {
                    len += n;
                    if len == ACK_CAPACITY || buf[len - n..len].contains(&b'\n') {
                        break;
                    }
                }
                Err(e)
                    if matches!(
                        e.kind(),
                        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
                    ) =>
                {
                    if len > 0 && e.kind() != io::ErrorKind::Interrupted {
                        break;
                    }
                    if let Some(limit) = self.ack_timeout {
                        if started.elapsed() >= limit {
                            return Err(TransportError::AckTimeout {
                                timeout_ms: limit.as_millis() as u64,
                            });
                        }
                    }
                }
                Err(e) => return Err(e.into()),
            }
        }
        let ack = String::from_utf8_lossy(&buf[..len]).into_owned();
        trace!(bytes = len, ack = %ack.escape_default(), "acknowledgement received");
        Ok(ack)
    }
}
