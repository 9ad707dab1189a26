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

//! The Neighbor Table: each configured neighbor's relationship and transport
//! handle (§4.1). Populated once at startup, never mutated afterward.

use std::collections::HashMap;
use std::net::Ipv4Addr;
use std::path::Path;

use crate::ip;
use crate::transport::NeighborLink;
use crate::types::Relation;

/// Everything the engine knows about one neighbor.
#[derive(Debug)]
pub struct NeighborInfo {
    pub relation: Relation,
    pub link: NeighborLink,
    /// The router's own address on this link (`src` on outgoing messages):
    /// the neighbor address with its trailing `.2` replaced by `.1`.
    pub local_address: String,
}

/// `neighbor address -> (relation, connection)`. Built once from the startup
/// `address-relation` arguments and never mutated again.
#[derive(Debug, Default)]
pub struct NeighborTable {
    neighbors: HashMap<Ipv4Addr, NeighborInfo>,
}

impl NeighborTable {
    /// Open one transport connection per `(address, relation)` pair, under
    /// `socket_dir` (each neighbor's peer socket is expected to already be
    /// bound at `socket_dir/<address>`).
    pub fn connect(entries: &[(Ipv4Addr, Relation)], socket_dir: &Path) -> std::io::Result<Self> {
        let mut neighbors = HashMap::with_capacity(entries.len());
        for (addr, relation) in entries {
            let path = socket_dir.join(addr.to_string());
            let link = NeighborLink::connect(&path)?;
            let local_address = ip::local_address_on_link(&addr.to_string());
            neighbors.insert(
                *addr,
                NeighborInfo {
                    relation: *relation,
                    link,
                    local_address,
                },
            );
        }
        Ok(Self { neighbors })
    }

    pub fn get(&self, addr: &Ipv4Addr) -> Option<&NeighborInfo> {
        self.neighbors.get(addr)
    }

    pub fn get_mut(&mut self, addr: &Ipv4Addr) -> Option<&mut NeighborInfo> {
        self.neighbors.get_mut(addr)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Ipv4Addr, &NeighborInfo)> {
        self.neighbors.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&Ipv4Addr, &mut NeighborInfo)> {
        self.neighbors.iter_mut()
    }

    /// Send a framed message to `addr`'s connection.
    pub fn send(&mut self, addr: &Ipv4Addr, bytes: &[u8]) -> std::io::Result<()> {
        match self.neighbors.get_mut(addr) {
            Some(info) => info.link.send(bytes),
            None => Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("no such neighbor: {addr}"),
            )),
        }
    }

    #[cfg(test)]
    pub fn new_for_test() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn insert_for_test(&mut self, addr: Ipv4Addr, info: NeighborInfo) {
        self.neighbors.insert(addr, info);
    }
}

#[cfg(test)]
impl NeighborInfo {
    pub fn for_test(relation: Relation) -> Self {
        let (link, other) = NeighborLink::test_pair().unwrap();
        // keep the peer end alive for the lifetime of the test by leaking it;
        // tests never exercise send/recv through this helper.
        std::mem::forget(other);
        Self {
            relation,
            link,
            local_address: String::new(),
        }
    }
}
