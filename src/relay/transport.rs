// Datagram transport module
// Fire-and-forget UDP send and buffered UDP receive for the relay

use socket2::{Domain, Protocol, Socket, Type};
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use tokio::net::UdpSocket;

use crate::error::{RelayError, Result};
use crate::logger;

/// One received datagram
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Datagram {
    pub payload: Vec<u8>,
    pub source: SocketAddr,
    /// Set when the datagram was longer than the listener's buffer
    pub truncated: bool,
}

/// Bound UDP socket with a fixed receive capacity
pub struct DatagramListener {
    socket: UdpSocket,
    buffer_size: usize,
}

impl DatagramListener {
    /// Bind the relay address. Must be called from within a Tokio runtime.
    pub fn bind(addr: SocketAddr, buffer_size: usize) -> Result<Self> {
        let socket = create_datagram_socket(addr, buffer_size)
            .map_err(|e| RelayError::transport(format!("binding udp://{addr}"), e))?;
        Ok(Self {
            socket,
            buffer_size,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.socket
            .local_addr()
            .map_err(|e| RelayError::transport("reading listener address", e))
    }

    pub const fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    /// Wait for the next datagram.
    ///
    /// Reads into a buffer one byte larger than the capacity so an
    /// oversized datagram can be detected; it is cut to `buffer_size`
    /// bytes and flagged rather than rejected.
    pub async fn receive(&self) -> Result<Datagram> {
        let mut buf = vec![0u8; self.buffer_size + 1];
        let (len, source) = self
            .socket
            .recv_from(&mut buf)
            .await
            .map_err(|e| RelayError::transport("receiving datagram", e))?;

        let truncated = len > self.buffer_size;
        buf.truncate(len.min(self.buffer_size));
        if truncated {
            logger::log_datagram_truncated(&source, self.buffer_size);
        }

        Ok(Datagram {
            payload: buf,
            source,
            truncated,
        })
    }
}

/// Sends relay payloads to the fixed destination
///
/// Delivery is best effort: a successful `forward` only means the kernel
/// accepted the datagram.
pub struct RelaySender {
    socket: UdpSocket,
    destination: SocketAddr,
}

impl RelaySender {
    /// Bind an ephemeral local socket of the destination's address family
    pub async fn bind(destination: SocketAddr) -> Result<Self> {
        let local: SocketAddr = if destination.is_ipv4() {
            (Ipv4Addr::UNSPECIFIED, 0).into()
        } else {
            (Ipv6Addr::UNSPECIFIED, 0).into()
        };
        let socket = UdpSocket::bind(local)
            .await
            .map_err(|e| RelayError::transport("binding relay sender", e))?;
        Ok(Self {
            socket,
            destination,
        })
    }

    /// Send `payload` verbatim as a single datagram
    pub async fn forward(&self, payload: &[u8]) -> Result<usize> {
        let sent = self
            .socket
            .send_to(payload, self.destination)
            .await
            .map_err(|e| {
                RelayError::transport(format!("sending to udp://{}", self.destination), e)
            })?;
        logger::log_datagram_relayed(&self.destination, sent);
        Ok(sent)
    }
}

/// Full-size datagrams the kernel should be able to queue for the receiver
const RECV_QUEUE_DATAGRAMS: usize = 64;

/// Create a non-blocking UDP socket bound to `addr`.
///
/// No `SO_REUSEADDR`: a second receiver on the same address must fail to
/// bind. The kernel receive buffer is raised, never lowered, to hold
/// `RECV_QUEUE_DATAGRAMS` datagrams of `buffer_size + 1` bytes.
fn create_datagram_socket(addr: SocketAddr, buffer_size: usize) -> std::io::Result<UdpSocket> {
    let socket = Socket::new(Domain::for_address(addr), Type::DGRAM, Some(Protocol::UDP))?;

    let wanted = buffer_size
        .saturating_add(1)
        .saturating_mul(RECV_QUEUE_DATAGRAMS);
    if socket.recv_buffer_size()? < wanted {
        socket.set_recv_buffer_size(wanted)?;
    }
    socket.set_nonblocking(true)?;
    socket.bind(&addr.into())?;

    let std_socket: std::net::UdpSocket = socket.into();
    UdpSocket::from_std(std_socket)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loopback() -> SocketAddr {
        (Ipv4Addr::LOCALHOST, 0).into()
    }

    #[tokio::test]
    async fn test_forward_and_receive() {
        let listener = DatagramListener::bind(loopback(), 1024).unwrap();
        let sender = RelaySender::bind(listener.local_addr().unwrap())
            .await
            .unwrap();

        let sent = sender.forward(b"name=Jane&message=Hi+there").await.unwrap();
        assert_eq!(sent, 26);

        let datagram = listener.receive().await.unwrap();
        assert_eq!(datagram.payload, b"name=Jane&message=Hi+there");
        assert!(!datagram.truncated);
    }

    #[tokio::test]
    async fn test_oversized_datagram_is_truncated() {
        let listener = DatagramListener::bind(loopback(), 8).unwrap();
        let sender = RelaySender::bind(listener.local_addr().unwrap())
            .await
            .unwrap();

        sender.forward(b"message=0123456789").await.unwrap();

        let datagram = listener.receive().await.unwrap();
        assert_eq!(datagram.payload, b"message=");
        assert!(datagram.truncated);
    }

    #[tokio::test]
    async fn test_bind_conflict_is_transport_error() {
        let taken = std::net::UdpSocket::bind(loopback()).unwrap();
        let addr = taken.local_addr().unwrap();

        let result = DatagramListener::bind(addr, 1024);
        assert!(matches!(result, Err(RelayError::Transport { .. })));
    }

    #[tokio::test]
    async fn test_second_listener_on_same_address_fails() {
        let first = DatagramListener::bind(loopback(), 1024).unwrap();
        let addr = first.local_addr().unwrap();

        let second = DatagramListener::bind(addr, 1024);
        assert!(matches!(second, Err(RelayError::Transport { .. })));

        // The first receiver keeps working
        let sender = RelaySender::bind(addr).await.unwrap();
        sender.forward(b"name=Jane").await.unwrap();
        assert_eq!(first.receive().await.unwrap().payload, b"name=Jane");
    }

    #[tokio::test]
    async fn test_receive_buffer_holds_full_datagrams() {
        let listener = DatagramListener::bind(loopback(), 1024).unwrap();
        let queued = socket2::SockRef::from(&listener.socket)
            .recv_buffer_size()
            .unwrap();
        assert!(queued > 1024);
    }
}
