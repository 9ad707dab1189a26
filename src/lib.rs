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

#![deny(missing_debug_implementations)]

//! # asroute
//!
//! A BGP-like inter-domain route exchange and forwarding engine for a
//! single autonomous-system router. It maintains a Routing Information
//! Base, disseminates announcements and withdrawals to neighbor routers
//! under commercial relationship policy (customer / peer / provider),
//! selects a single best route per destination through a deterministic
//! tie-breaking cascade, forwards data packets along that route, and
//! answers forwarding-table dump requests with a coalesced view of the
//! RIB.
//!
//! The engine is entirely in-memory, single-threaded, and cooperative: one
//! [`dispatcher::Dispatcher`] multiplexes every neighbor connection behind
//! a single readiness-polling loop. There is no persistence across
//! restarts and no background activity between `poll` wakeups.
//!
//! ## Module map
//!
//! - [`neighbor`]: the Neighbor Table — each configured neighbor's
//!   relationship and transport handle.
//! - [`rib`]: the Routing Information Base, plus the update/revocation
//!   logs.
//! - [`route`]: the learned-route type stored in the RIB.
//! - [`selector`]: the best-route selection pipeline.
//! - [`aggregator`]: route coalescing for table dumps.
//! - [`policy`]: the Policy Distributor deciding update/withdrawal
//!   fan-out.
//! - [`dispatcher`]: the event loop tying every other module together.
//! - [`message`]: the wire envelope, payload shapes, and JSON codec.
//! - [`transport`]: the per-neighbor connected local socket.
//! - [`ip`]: IPv4 text/numeric conversion and prefix arithmetic.
//! - [`types`]: small shared value types (relation, origin).
//! - [`error`]: the engine's typed error hierarchy.

pub mod aggregator;
pub mod dispatcher;
pub mod error;
pub mod ip;
pub mod message;
pub mod neighbor;
pub mod policy;
pub mod rib;
pub mod route;
pub mod selector;
pub mod transport;
pub mod types;

#[cfg(test)]
mod test;
