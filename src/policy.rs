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

//! The Policy Distributor (§4.5): decides which neighbors receive a
//! forwarded update or withdrawal, based on the source's relationship.

use std::net::Ipv4Addr;

use crate::neighbor::NeighborTable;
use crate::types::Relation;

/// The neighbors a message arriving from `source` (with relationship
/// `source_relation`) should be forwarded to.
///
/// - A customer's announcement is re-announced to every other neighbor.
/// - A peer's or provider's announcement is re-announced only to customers.
///
/// This applies identically to `update` and `revoke` traffic (§4.5).
pub fn recipients(
    neighbors: &NeighborTable,
    source: Ipv4Addr,
    source_relation: Relation,
) -> Vec<Ipv4Addr> {
    neighbors
        .iter()
        .filter(|(&addr, info)| addr != source && (source_relation.is_customer() || info.relation.is_customer()))
        .map(|(&addr, _)| addr)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::neighbor::NeighborInfo;

    fn table(entries: &[(&str, Relation)]) -> (NeighborTable, Vec<Ipv4Addr>) {
        let mut t = NeighborTable::new_for_test();
        let mut addrs = Vec::new();
        for (a, rel) in entries {
            let addr: Ipv4Addr = a.parse().unwrap();
            t.insert_for_test(addr, NeighborInfo::for_test(*rel));
            addrs.push(addr);
        }
        (t, addrs)
    }

    #[test]
    fn customer_update_fans_out_to_everyone_else() {
        let (t, addrs) = table(&[
            ("1.1.1.2", Relation::Customer),
            ("2.2.2.2", Relation::Peer),
            ("3.3.3.2", Relation::Provider),
        ]);
        let mut got = recipients(&t, addrs[0], Relation::Customer);
        got.sort();
        let mut want = vec![addrs[1], addrs[2]];
        want.sort();
        assert_eq!(got, want);
    }

    #[test]
    fn peer_update_reaches_only_customers() {
        let (t, addrs) = table(&[
            ("1.1.1.2", Relation::Peer),
            ("2.2.2.2", Relation::Customer),
            ("3.3.3.2", Relation::Provider),
        ]);
        let got = recipients(&t, addrs[0], Relation::Peer);
        assert_eq!(got, vec![addrs[1]]);
    }

    #[test]
    fn provider_update_never_reaches_peers_or_providers() {
        let (t, addrs) = table(&[
            ("1.1.1.2", Relation::Provider),
            ("2.2.2.2", Relation::Peer),
            ("3.3.3.2", Relation::Provider),
            ("4.4.4.2", Relation::Customer),
        ]);
        let got = recipients(&t, addrs[0], Relation::Provider);
        assert_eq!(got, vec![addrs[3]]);
    }
}
