//! Point-to-point links between ring neighbours.
//!
//! A `Link` sends to the next neighbour and receives from the previous one.
//! Delivery is unreliable: a send may be lost, and the ring transport
//! recovers by resending.
//!
//! - `UdpLink`: one UDP socket bound to the peer's listen address, sending
//!   to the next neighbour's address.
//! - `MemoryLink`: in-process channels, for test rings.

use std::io::ErrorKind;
use std::net::{SocketAddr, UdpSocket};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::Duration;

use tracing::trace;

use crate::error::RingError;
use crate::wire::MAX_FRAME_LEN;

/// A directed datagram association with both ring neighbours.
pub trait Link {
    /// Send one datagram to the next neighbour.
    fn send(&mut self, frame: &[u8]) -> Result<(), RingError>;

    /// Wait up to `timeout` for one datagram from the previous neighbour.
    ///
    /// `Ok(None)` means the attempt timed out.
    fn recv(&mut self, timeout: Duration) -> Result<Option<Vec<u8>>, RingError>;
}

impl<L: Link + ?Sized> Link for Box<L> {
    fn send(&mut self, frame: &[u8]) -> Result<(), RingError> {
        (**self).send(frame)
    }

    fn recv(&mut self, timeout: Duration) -> Result<Option<Vec<u8>>, RingError> {
        (**self).recv(timeout)
    }
}

/// UDP link.
#[derive(Debug)]
pub struct UdpLink {
    socket: UdpSocket,
    next: SocketAddr,
    timeout: Option<Duration>,
    buf: Vec<u8>,
}

impl UdpLink {
    /// Bind `listen` and send to `next`.
    pub fn bind(listen: SocketAddr, next: SocketAddr) -> Result<Self, RingError> {
        let socket = UdpSocket::bind(listen)?;
        Ok(Self {
            socket,
            next,
            timeout: None,
            buf: vec![0; MAX_FRAME_LEN],
        })
    }

    /// Address the socket is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, RingError> {
        Ok(self.socket.local_addr()?)
    }
}

impl Link for UdpLink {
    fn send(&mut self, frame: &[u8]) -> Result<(), RingError> {
        self.socket.send_to(frame, self.next)?;
        Ok(())
    }

    fn recv(&mut self, timeout: Duration) -> Result<Option<Vec<u8>>, RingError> {
        if self.timeout != Some(timeout) {
            self.socket.set_read_timeout(Some(timeout))?;
            self.timeout = Some(timeout);
        }
        match self.socket.recv_from(&mut self.buf) {
            Ok((len, _from)) => Ok(Some(self.buf[..len].to_vec())),
            Err(err) if is_empty_attempt(err.kind()) => {
                if !matches!(err.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) {
                    trace!(error = %err, "receive failed, retrying");
                }
                Ok(None)
            }
            Err(err) => Err(err.into()),
        }
    }
}

/// Receive errors that leave the socket usable. ICMP unreachable replies
/// to an earlier send surface as reset or refused on some platforms.
fn is_empty_attempt(kind: ErrorKind) -> bool {
    matches!(
        kind,
        ErrorKind::WouldBlock
            | ErrorKind::TimedOut
            | ErrorKind::Interrupted
            | ErrorKind::ConnectionReset
            | ErrorKind::ConnectionRefused
    )
}

/// In-memory link backed by channels.
///
/// Sends to a neighbour that has gone away are dropped, like a datagram to
/// a closed port.
#[derive(Debug)]
pub struct MemoryLink {
    tx: Sender<Vec<u8>>,
    rx: Receiver<Vec<u8>>,
}

impl MemoryLink {
    /// A link from its own inbox to the next neighbour's inbox.
    #[must_use]
    pub fn new(tx: Sender<Vec<u8>>, rx: Receiver<Vec<u8>>) -> Self {
        Self { tx, rx }
    }
}

impl Link for MemoryLink {
    fn send(&mut self, frame: &[u8]) -> Result<(), RingError> {
        let _ = self.tx.send(frame.to_vec());
        Ok(())
    }

    fn recv(&mut self, timeout: Duration) -> Result<Option<Vec<u8>>, RingError> {
        match self.rx.recv_timeout(timeout) {
            Ok(frame) => Ok(Some(frame)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => {
                std::thread::sleep(timeout);
                Ok(None)
            }
        }
    }
}

/// Build the links of an `n`-member ring.
///
/// Link `i` belongs to peer `i + 1` and sends to peer `(i + 1) % n + 1`.
///
/// ```
/// use std::time::Duration;
/// use dalmuti_ring::ring::{memory_ring, Link};
///
/// let mut links = memory_ring(4);
/// links[3].send(b"hello").unwrap();
/// let got = links[0].recv(Duration::from_millis(10)).unwrap();
/// assert_eq!(got.as_deref(), Some(&b"hello"[..]));
/// ```
#[must_use]
pub fn memory_ring(n: usize) -> Vec<MemoryLink> {
    let (senders, receivers): (Vec<_>, Vec<_>) = (0..n).map(|_| mpsc::channel()).unzip();
    receivers
        .into_iter()
        .enumerate()
        .map(|(i, rx)| MemoryLink::new(senders[(i + 1) % n].clone(), rx))
        .collect()
}
