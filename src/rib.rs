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

//! The Routing Information Base: per-neighbor learned routes, plus the
//! append-only update/revocation logs.

use std::collections::HashMap;
use std::net::Ipv4Addr;

use crate::route::Route;

/// A verbatim copy of an `update` or `revoke` message, kept for the
/// update/revocation logs (§3: "retained so that revocations can be
/// interpreted and, in future extensions, replayed" — never consulted by
/// the Selector or Aggregator).
#[derive(Debug, Clone)]
pub enum LogEntry {
    Update(Route),
    Revoke(Vec<(String, String)>),
}

/// Mapping `neighbor -> ordered sequence of routes`, plus the update and
/// revocation logs. No prefix index: the Selector scans linearly, which is
/// acceptable for the small RIBs this engine deals with (§4.2).
#[derive(Debug, Default)]
pub struct Rib {
    table: HashMap<Ipv4Addr, Vec<Route>>,
    update_log: Vec<(Ipv4Addr, LogEntry)>,
    revoke_log: Vec<(Ipv4Addr, LogEntry)>,
}

impl Rib {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `route` under `neighbor`. No de-duplication: a duplicate
    /// announcement appends a second entry, and coalescing at dump time is
    /// the Aggregator's job, not the RIB's.
    pub fn insert(&mut self, neighbor: Ipv4Addr, route: Route) {
        self.update_log
            .push((neighbor, LogEntry::Update(route.clone())));
        self.table.entry(neighbor).or_default().push(route);
    }

    /// Remove every route under `neighbor` whose `(network, netmask)` exactly
    /// matches one of `prefixes` (compared on the parsed numeric form).
    pub fn withdraw(&mut self, neighbor: Ipv4Addr, prefixes: &[(u32, u32)]) {
        if let Some(routes) = self.table.get_mut(&neighbor) {
            routes.retain(|r| !prefixes.contains(&(r.network, r.netmask)));
        }
    }

    /// Record a `revoke` message in the revocation log, verbatim.
    pub fn log_revoke(&mut self, neighbor: Ipv4Addr, prefixes: Vec<(String, String)>) {
        self.revoke_log
            .push((neighbor, LogEntry::Revoke(prefixes)));
    }

    /// Iterate over every `(neighbor, route)` pair in the whole table.
    pub fn iter(&self) -> impl Iterator<Item = (Ipv4Addr, &Route)> {
        self.table
            .iter()
            .flat_map(|(n, routes)| routes.iter().map(move |r| (*n, r)))
    }

    /// The routes stored under `neighbor`, or an empty slice if none were
    /// ever learned (the RIB behaves like a map with an implicit empty-list
    /// default, §9).
    pub fn routes_of(&self, neighbor: Ipv4Addr) -> &[Route] {
        self.table.get(&neighbor).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn neighbors(&self) -> impl Iterator<Item = Ipv4Addr> + '_ {
        self.table.keys().copied()
    }
}
