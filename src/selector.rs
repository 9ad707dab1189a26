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

//! Best-route selection: longest-match lookup, the five-stage tie-break
//! cascade, the relationship filter, and the final longest-prefix pick
//! (§4.3). Pure: never touches the RIB or neighbor table.

use std::net::Ipv4Addr;

use crate::neighbor::NeighborTable;
use crate::rib::Rib;
use crate::route::Route;

/// Find the next-hop neighbor a data packet from `srcif` addressed to
/// `daddr` should be forwarded to, or `None` for *no route*.
///
/// `srcif` is the neighbor the packet arrived from (used only for the
/// relationship filter in stage 7); it does not have to already be a
/// candidate's next hop.
pub fn select(
    rib: &Rib,
    neighbors: &NeighborTable,
    srcif: Ipv4Addr,
    daddr: u32,
) -> Option<Ipv4Addr> {
    // Stage 1: longest-match candidate set (every covering route, not yet
    // narrowed to the most specific one — that happens in stage 8).
    let mut candidates: Vec<(Ipv4Addr, &Route)> = rib
        .iter()
        .filter(|(_, route)| route.contains(daddr))
        .collect();
    if candidates.is_empty() {
        return None;
    }

    // Stage 2: highest local-pref.
    let max_localpref = candidates.iter().map(|(_, r)| r.localpref).max().unwrap();
    candidates.retain(|(_, r)| r.localpref == max_localpref);

    // Stage 3: self-origin preferred, if any candidate claims it.
    if candidates.iter().any(|(_, r)| r.self_origin) {
        candidates.retain(|(_, r)| r.self_origin);
    }

    // Stage 4: shortest AS-path.
    let min_as_path_len = candidates.iter().map(|(_, r)| r.as_path.len()).min().unwrap();
    candidates.retain(|(_, r)| r.as_path.len() == min_as_path_len);

    // Stage 5: lowest origin rank (IGP < EGP < UNK).
    let min_origin_rank = candidates.iter().map(|(_, r)| r.origin.rank()).min().unwrap();
    candidates.retain(|(_, r)| r.origin.rank() == min_origin_rank);

    // Stage 6: order survivors by neighbor IP, ascending. This does not
    // eliminate anything; it fixes the tie-break order for stage 8.
    candidates.sort_by_key(|(n, _)| u32::from(*n));

    // Stage 7: relationship filter, applied *after* tie-breaking (§9.2): a
    // customer source may use any remaining route; anyone else may only use
    // routes whose next hop is a customer.
    let src_is_customer = neighbors
        .get(&srcif)
        .map(|info| info.relation.is_customer())
        .unwrap_or(false);
    if !src_is_customer {
        candidates.retain(|(n, _)| {
            neighbors
                .get(n)
                .map(|info| info.relation.is_customer())
                .unwrap_or(false)
        });
    }
    if candidates.is_empty() {
        return None;
    }

    // Stage 8: longest-prefix-match pick among survivors, ties broken by the
    // stage-6 ordering (stable sort + max_by_key keeps the first maximum).
    candidates
        .iter()
        .enumerate()
        .max_by_key(|(idx, (_, r))| (r.match_score(daddr), std::cmp::Reverse(*idx)))
        .map(|(_, (n, _))| *n)
}
