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

//! Route aggregation (coalescing) for table dumps (§4.4).
//!
//! A pure function of the RIB: it never mutates the table it reads from. For
//! each neighbor independently, adjacent same-attribute prefixes are merged
//! into a single shorter-mask prefix until a full sweep finds no more merges.

use std::net::Ipv4Addr;

use crate::ip;
use crate::rib::Rib;
use crate::route::Route;

/// One coalesced entry of a table dump.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregatedRoute {
    pub network_text: String,
    pub netmask_text: String,
    pub peer: Ipv4Addr,
}

/// Coalesce every neighbor's routes independently and return the flattened
/// dump output. The RIB is read-only here.
pub fn aggregate(rib: &Rib) -> Vec<AggregatedRoute> {
    let mut neighbors: Vec<Ipv4Addr> = rib.neighbors().collect();
    neighbors.sort();
    neighbors.dedup();

    let mut out = Vec::new();
    for neighbor in neighbors {
        let mut routes: Vec<Route> = rib.routes_of(neighbor).to_vec();
        routes.sort_by_key(|r| (r.network, r.netmask));
        while let Some(merged) = merge_once(&routes) {
            routes = merged;
        }
        out.extend(routes.into_iter().map(|r| AggregatedRoute {
            network_text: r.network_text,
            netmask_text: r.netmask_text,
            peer: neighbor,
        }));
    }
    out
}

/// Scan for the first mergeable adjacent pair and replace it, or `None` if a
/// full sweep finds nothing to merge.
fn merge_once(routes: &[Route]) -> Option<Vec<Route>> {
    for i in 0..routes.len().saturating_sub(1) {
        if let Some(merged) = try_merge(&routes[i], &routes[i + 1]) {
            let mut next = Vec::with_capacity(routes.len() - 1);
            next.extend_from_slice(&routes[..i]);
            next.push(merged);
            next.extend_from_slice(&routes[i + 2..]);
            next.sort_by_key(|r| (r.network, r.netmask));
            return Some(next);
        }
    }
    None
}

/// Are `a` and `b` mergeable (§4.4, tightened per §9.4 / the redesign flag)?
/// They must share a netmask, share every other attribute, and their
/// networks must differ in *exactly* the single bit immediately following
/// that shared mask — i.e. they are the two halves of the same
/// one-bit-shorter block, not merely two prefixes whose top `m-1` bits
/// happen to agree.
fn try_merge(a: &Route, b: &Route) -> Option<Route> {
    if a.netmask != b.netmask || !a.attrs_eq(b) {
        return None;
    }
    let m = a.prefix_len;
    if m == 0 {
        return None;
    }
    let boundary_bit = 1u32 << (32 - m as u32);
    if (a.network ^ b.network) != boundary_bit {
        return None;
    }

    let new_prefix_len = m - 1;
    let new_mask = ip::mask_from_prefix_len(new_prefix_len);
    let new_network = a.network.min(b.network);
    Some(Route {
        network_text: ip::format_addr(new_network),
        netmask_text: ip::format_addr(new_mask),
        network: new_network,
        netmask: new_mask,
        prefix_len: new_prefix_len,
        localpref: a.localpref,
        self_origin: a.self_origin,
        as_path: a.as_path.clone(),
        origin: a.origin,
    })
}
