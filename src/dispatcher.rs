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

//! The Dispatcher / Event Loop (§4.6): a single-threaded, cooperative loop
//! that multiplexes every neighbor connection behind one `mio::Poll`,
//! decodes each framed message, and routes it to the forward/update/revoke/
//! dump handler.

use std::collections::HashMap;
use std::io;
use std::net::Ipv4Addr;
use std::time::Duration;

use mio::{Events, Interest, Poll, Token};

use crate::aggregator;
use crate::error::EngineError;
use crate::ip;
use crate::message::{Body, Message, TableEntry, UpdatePayload};
use crate::neighbor::NeighborTable;
use crate::policy;
use crate::rib::Rib;
use crate::selector;
use crate::types::Relation;

/// How long one `poll` call may wait for readability before looping back
/// around (§4.6, §5: "Wait up to 100 ms").
const POLL_TIMEOUT: Duration = Duration::from_millis(100);

/// What a handler asks the event loop to do next.
enum Outcome {
    Continue,
    Shutdown,
}

/// What one `recv` + dispatch cycle on a single connection produced.
enum RecvOutcome {
    Handled,
    Shutdown,
    Fatal(EngineError),
}

/// Owns every piece of mutable engine state and the `mio` readiness
/// registration that drives it.
pub struct Dispatcher {
    asn: u32,
    neighbors: NeighborTable,
    rib: Rib,
    poll: Poll,
    tokens: HashMap<Token, Ipv4Addr>,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("asn", &self.asn)
            .field("neighbors", &self.neighbors)
            .field("rib", &self.rib)
            .field("tokens", &self.tokens)
            .finish_non_exhaustive()
    }
}

impl Dispatcher {
    /// Register every neighbor's link with a fresh `Poll` instance and
    /// build an empty RIB. This is the only place neighbor links are
    /// registered; the engine never re-registers or deregisters them.
    pub fn new(asn: u32, mut neighbors: NeighborTable) -> io::Result<Self> {
        let poll = Poll::new()?;
        let mut tokens = HashMap::new();
        for (i, (&addr, info)) in neighbors.iter_mut().enumerate() {
            let token = Token(i);
            poll.registry()
                .register(&mut info.link, token, Interest::READABLE)?;
            tokens.insert(token, addr);
        }
        Ok(Self {
            asn,
            neighbors,
            rib: Rib::new(),
            poll,
            tokens,
        })
    }

    /// Run the loop until a neighbor read returns empty, a transport error
    /// occurs (both ordinary, exit-0 shutdown, §6), or a decode/protocol
    /// error makes the process abort (§7).
    pub fn run(mut self) -> Result<(), EngineError> {
        let mut events = Events::with_capacity(self.tokens.len().max(1));
        loop {
            if let Err(e) = self.poll.poll(&mut events, Some(POLL_TIMEOUT)) {
                if e.kind() == io::ErrorKind::Interrupted {
                    continue;
                }
                log::error!("poll failed, shutting down: {e}");
                return Ok(());
            }
            for event in events.iter() {
                let Some(&addr) = self.tokens.get(&event.token()) else {
                    continue;
                };
                match self.drain_ready(addr) {
                    RecvOutcome::Handled => {}
                    RecvOutcome::Shutdown => {
                        log::info!("shutting down after connection to {addr} closed");
                        return Ok(());
                    }
                    RecvOutcome::Fatal(e) => {
                        log::error!("fatal protocol error from {addr}: {e}");
                        return Err(e);
                    }
                }
            }
        }
    }

    /// `mio` is edge-triggered: one readiness event only promises "at least
    /// one datagram is available", not "exactly one". Drain the link until
    /// a `recv` would block, so a second datagram queued behind the first
    /// isn't stranded until unrelated later traffic re-arms the edge.
    fn drain_ready(&mut self, addr: Ipv4Addr) -> RecvOutcome {
        loop {
            let bytes = match self.neighbors.get_mut(&addr) {
                Some(info) => info.link.recv(),
                None => return RecvOutcome::Handled,
            };
            match bytes {
                Ok(b) if b.is_empty() => return RecvOutcome::Shutdown,
                Ok(b) => match self.handle_message(addr, &b) {
                    Ok(Outcome::Continue) => continue,
                    Ok(Outcome::Shutdown) => return RecvOutcome::Shutdown,
                    Err(e) => return RecvOutcome::Fatal(e),
                },
                // A spurious wakeup, or we've simply drained everything that
                // was buffered: neither is an error, just "nothing more yet".
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return RecvOutcome::Handled,
                Err(e) => {
                    log::error!("recv from {addr} failed: {e}");
                    return RecvOutcome::Shutdown;
                }
            }
        }
    }

    fn handle_message(&mut self, srcif: Ipv4Addr, raw: &[u8]) -> Result<Outcome, EngineError> {
        let Message { src, dst, body } = Message::decode(raw)?;
        match body {
            Body::Data(_) => self.handle_data(srcif, &src, &dst, raw),
            Body::Update(payload) => self.handle_update(srcif, payload),
            Body::Revoke(entries) => self.handle_revoke(srcif, entries),
            Body::Dump => self.handle_dump(srcif, &src),
            Body::Table(_) => Err(EngineError::UnknownType("table".to_string())),
            Body::NoRoute => Err(EngineError::UnknownType("no route".to_string())),
        }
    }

    fn handle_data(
        &mut self,
        srcif: Ipv4Addr,
        src: &str,
        dst: &str,
        raw: &[u8],
    ) -> Result<Outcome, EngineError> {
        let daddr = ip::parse_addr(dst)?;
        match selector::select(&self.rib, &self.neighbors, srcif, daddr) {
            Some(next_hop) => {
                log::debug!("data from {srcif} to {dst} forwarded via {next_hop}");
                Ok(self.send(next_hop, raw.to_vec()))
            }
            None => {
                log::debug!("no route for data from {srcif} to {dst}");
                let local = self.local_address(srcif);
                let reply = Message::no_route(local, src.to_string());
                Ok(self.send(srcif, reply.encode()))
            }
        }
    }

    fn handle_update(
        &mut self,
        srcif: Ipv4Addr,
        payload: UpdatePayload,
    ) -> Result<Outcome, EngineError> {
        let route = payload.into_route()?;
        self.rib.insert(srcif, route.clone());
        let relation = self.relation_of(srcif);

        for recipient in policy::recipients(&self.neighbors, srcif, relation) {
            let mut out_payload = UpdatePayload::from_route(&route);
            out_payload.as_path.push(self.asn);
            let out = Message {
                src: self.local_address(recipient),
                dst: recipient.to_string(),
                body: Body::Update(out_payload),
            };
            if let Outcome::Shutdown = self.send(recipient, out.encode()) {
                return Ok(Outcome::Shutdown);
            }
        }
        Ok(Outcome::Continue)
    }

    fn handle_revoke(
        &mut self,
        srcif: Ipv4Addr,
        entries: Vec<crate::message::RevokeEntry>,
    ) -> Result<Outcome, EngineError> {
        self.rib.log_revoke(
            srcif,
            entries
                .iter()
                .map(|e| (e.network.clone(), e.netmask.clone()))
                .collect(),
        );

        let mut prefixes = Vec::with_capacity(entries.len());
        for e in &entries {
            let network = ip::parse_addr(&e.network)?;
            let (netmask, _) = ip::parse_mask(&e.netmask)?;
            prefixes.push((network, netmask));
        }
        self.rib.withdraw(srcif, &prefixes);

        let relation = self.relation_of(srcif);
        for recipient in policy::recipients(&self.neighbors, srcif, relation) {
            let out = Message {
                src: self.local_address(recipient),
                dst: recipient.to_string(),
                body: Body::Revoke(entries.clone()),
            };
            if let Outcome::Shutdown = self.send(recipient, out.encode()) {
                return Ok(Outcome::Shutdown);
            }
        }
        Ok(Outcome::Continue)
    }

    fn handle_dump(&mut self, srcif: Ipv4Addr, requester: &str) -> Result<Outcome, EngineError> {
        let entries: Vec<TableEntry> = aggregator::aggregate(&self.rib)
            .into_iter()
            .map(|r| TableEntry {
                network: r.network_text,
                netmask: r.netmask_text,
                peer: r.peer.to_string(),
            })
            .collect();
        let local = self.local_address(srcif);
        let reply = Message::table(local, requester.to_string(), entries);
        Ok(self.send(srcif, reply.encode()))
    }

    fn send(&mut self, addr: Ipv4Addr, bytes: Vec<u8>) -> Outcome {
        match self.neighbors.send(&addr, &bytes) {
            Ok(()) => Outcome::Continue,
            // A full socket buffer on the nonblocking link is backpressure,
            // not a broken transport (§5: sends are expected to succeed
            // synchronously, but nothing upstream can wait for write
            // readiness) — drop the message and keep the router running
            // rather than tearing every link down over one slow peer.
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                log::warn!("send to {addr} would block, dropping message");
                Outcome::Continue
            }
            Err(e) => {
                log::error!("send to {addr} failed, shutting down: {e}");
                Outcome::Shutdown
            }
        }
    }

    fn local_address(&self, addr: Ipv4Addr) -> String {
        self.neighbors
            .get(&addr)
            .map(|info| info.local_address.clone())
            .unwrap_or_else(|| ip::local_address_on_link(&addr.to_string()))
    }

    fn relation_of(&self, addr: Ipv4Addr) -> Relation {
        self.neighbors
            .get(&addr)
            .expect("srcif is always a registered, configured neighbor")
            .relation
    }
}
