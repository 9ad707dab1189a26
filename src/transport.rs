// BgpSim: BGP Network Simulator written in Rust
// Copyright 2022-2024 Tibor Schneider <sctibor@ethz.ch>
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The neighbor transport: a connected, message-preserving local channel.
//!
//! Implemented with `AF_UNIX` datagram sockets. A connected `SOCK_DGRAM`
//! socket preserves message boundaries per `recv` the same way the reference
//! transport does, so no additional length-prefix framing is needed on top
//! (§4.7, §4.8). `mio::net::UnixDatagram` is used directly so the link can be
//! registered with the Dispatcher's readiness-polling primitive.

use std::io;
use std::os::unix::net::UnixDatagram as StdUnixDatagram;
use std::path::Path;

use mio::net::UnixDatagram;
use mio::{event::Source, Interest, Registry, Token};

/// The largest single message this transport will ever hand back from
/// `recv` (§4.6: "perform one framed receive, up to 65535 bytes").
pub const MAX_MESSAGE_SIZE: usize = 65535;

/// One neighbor's connected transport socket.
pub struct NeighborLink {
    socket: UnixDatagram,
    /// Reused across `recv` calls so the per-message hot path doesn't
    /// allocate and zero-fill a fresh `MAX_MESSAGE_SIZE` buffer every time.
    scratch: Vec<u8>,
}

impl std::fmt::Debug for NeighborLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NeighborLink").finish_non_exhaustive()
    }
}

impl NeighborLink {
    /// Connect to the peer socket bound at `path` (the simulated local
    /// endpoint for this neighbor).
    pub fn connect(path: &Path) -> io::Result<Self> {
        let std_socket = StdUnixDatagram::unbound()?;
        std_socket.connect(path)?;
        std_socket.set_nonblocking(true)?;
        Ok(Self {
            socket: UnixDatagram::from_std(std_socket),
            scratch: vec![0u8; MAX_MESSAGE_SIZE],
        })
    }

    /// Build a connected pair of links with no filesystem path, for tests.
    #[cfg(test)]
    pub fn test_pair() -> io::Result<(Self, Self)> {
        let (a, b) = StdUnixDatagram::pair()?;
        a.set_nonblocking(true)?;
        b.set_nonblocking(true)?;
        Ok((
            Self {
                socket: UnixDatagram::from_std(a),
                scratch: vec![0u8; MAX_MESSAGE_SIZE],
            },
            Self {
                socket: UnixDatagram::from_std(b),
                scratch: vec![0u8; MAX_MESSAGE_SIZE],
            },
        ))
    }

    /// Receive exactly one framed message. An empty message (zero bytes) is
    /// distinguishable from a connection close at the Dispatcher level by the
    /// `Ok(0)`/error split documented in §4.6.
    pub fn recv(&mut self) -> io::Result<Vec<u8>> {
        let n = self.socket.recv(&mut self.scratch)?;
        Ok(self.scratch[..n].to_vec())
    }

    /// Send exactly one framed message.
    pub fn send(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.socket.send(bytes)?;
        Ok(())
    }
}

impl Source for NeighborLink {
    fn register(&mut self, registry: &Registry, token: Token, interests: Interest) -> io::Result<()> {
        self.socket.register(registry, token, interests)
    }

    fn reregister(&mut self, registry: &Registry, token: Token, interests: Interest) -> io::Result<()> {
        self.socket.reregister(registry, token, interests)
    }

    fn deregister(&mut self, registry: &Registry) -> io::Result<()> {
        self.socket.deregister(registry)
    }
}
