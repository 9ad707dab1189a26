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

//! The learned-route type stored in the RIB.

use crate::ip::{self, IpFieldError};
use crate::types::Origin;

/// A single route as learned from one neighbor, scoped to that neighbor in
/// the [`crate::rib::Rib`]. Text forms of `network`/`netmask` are kept only
/// for echoing back into outgoing messages; everything else works on the
/// parsed `u32` forms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub network_text: String,
    pub netmask_text: String,
    pub network: u32,
    pub netmask: u32,
    pub prefix_len: u8,
    pub localpref: u32,
    pub self_origin: bool,
    pub as_path: Vec<u32>,
    pub origin: Origin,
}

impl Route {
    /// Build a route from the wire fields of an `update` payload, parsing and
    /// validating `network`/`netmask` eagerly (§3 invariant: mask bits must be
    /// a contiguous prefix).
    pub fn from_wire(
        network_text: String,
        netmask_text: String,
        localpref: u32,
        self_origin: bool,
        as_path: Vec<u32>,
        origin: Origin,
    ) -> Result<Self, IpFieldError> {
        let network = ip::parse_addr(&network_text)?;
        let (netmask, prefix_len) = ip::parse_mask(&netmask_text)?;
        Ok(Self {
            network_text,
            netmask_text,
            network,
            netmask,
            prefix_len,
            localpref,
            self_origin,
            as_path,
            origin,
        })
    }

    /// Does `daddr` lie within this route's prefix?
    pub fn contains(&self, daddr: u32) -> bool {
        ip::contains(self.network, self.netmask, daddr)
    }

    /// The reference prefix-match score against `daddr` (§9.1 quirk preserved).
    pub fn match_score(&self, daddr: u32) -> u32 {
        ip::match_score(self.network, self.netmask, daddr)
    }

    /// The attributes the Selector and Aggregator compare for equality, aside
    /// from `network`/`netmask` themselves.
    pub fn attrs_eq(&self, other: &Self) -> bool {
        self.localpref == other.localpref
            && self.self_origin == other.self_origin
            && self.as_path == other.as_path
            && self.origin == other.origin
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn route(network: &str, mask: &str) -> Route {
        Route::from_wire(
            network.to_string(),
            mask.to_string(),
            100,
            false,
            vec![],
            Origin::Igp,
        )
        .unwrap()
    }

    #[test]
    fn rejects_noncontiguous_mask() {
        assert!(Route::from_wire(
            "10.0.0.0".into(),
            "255.0.255.0".into(),
            100,
            false,
            vec![],
            Origin::Igp
        )
        .is_err());
    }

    #[test]
    fn contains_checks_prefix_membership() {
        let r = route("192.168.0.0", "255.255.255.0");
        assert!(r.contains(ip::parse_addr("192.168.0.25").unwrap()));
        assert!(!r.contains(ip::parse_addr("192.168.1.25").unwrap()));
    }
}
