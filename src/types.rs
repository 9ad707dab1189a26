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

//! Small value types shared across the engine: relationships and BGP origin
//! codes. AS numbers are plain `u32`s throughout (§3).

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Commercial relationship to a neighbor, as configured at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Relation {
    Customer,
    Peer,
    Provider,
}

impl Relation {
    /// True for `customer`: the only relation from which updates are accepted
    /// from, and forwarded to, everyone.
    pub fn is_customer(self) -> bool {
        matches!(self, Relation::Customer)
    }
}

impl FromStr for Relation {
    type Err = ParseRelationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cust" => Ok(Relation::Customer),
            "peer" => Ok(Relation::Peer),
            "prov" => Ok(Relation::Provider),
            other => Err(ParseRelationError(other.to_string())),
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Relation::Customer => "cust",
            Relation::Peer => "peer",
            Relation::Provider => "prov",
        })
    }
}

/// Error parsing a `relation` token from an `address-relation` startup argument.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("`{0}` is not a valid relation (expected cust, peer or prov)")]
pub struct ParseRelationError(String);

/// BGP origin code. Preference order is the declaration order: `Igp < Egp < Unk`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Origin {
    #[serde(rename = "IGP")]
    Igp,
    #[serde(rename = "EGP")]
    Egp,
    #[serde(rename = "UNK")]
    Unk,
}

impl Origin {
    /// Lower rank is preferred: `IGP=0 < EGP=1 < UNK=2`.
    pub fn rank(self) -> u8 {
        match self {
            Origin::Igp => 0,
            Origin::Egp => 1,
            Origin::Unk => 2,
        }
    }
}

impl PartialOrd for Origin {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Origin {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank().cmp(&other.rank())
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Origin::Igp => "IGP",
            Origin::Egp => "EGP",
            Origin::Unk => "UNK",
        })
    }
}
