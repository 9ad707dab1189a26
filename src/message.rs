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

//! The wire codec: message envelope, per-type payload shapes, and their
//! JSON (de)serialization (§4.8, §6).
//!
//! Decoding is staged: the envelope's `src`/`dst`/`type`/`msg` fields are
//! read first with `msg` left as a raw [`serde_json::Value`], then `msg` is
//! re-parsed into the shape its `type` tag demands. This keeps an unknown
//! `type` and a malformed `msg` as two distinct, clearly attributed decode
//! failures, rather than fighting serde's adjacently-tagged-enum support for
//! a tag that lives beside unrelated sibling fields (`src`, `dst`).

use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::route::Route;
use crate::types::Origin;

/// The `update` payload, exactly as carried on the wire.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UpdatePayload {
    pub network: String,
    pub netmask: String,
    pub localpref: u32,
    #[serde(rename = "selfOrigin")]
    pub self_origin: bool,
    #[serde(rename = "ASPath")]
    pub as_path: Vec<u32>,
    pub origin: Origin,
}

impl UpdatePayload {
    /// Parse and validate this payload into a [`Route`] (§3: mask
    /// contiguity is checked here, at ingress).
    pub fn into_route(self) -> Result<Route, EngineError> {
        Route::from_wire(
            self.network,
            self.netmask,
            self.localpref,
            self.self_origin,
            self.as_path,
            self.origin,
        )
        .map_err(EngineError::from)
    }

    /// Re-derive the wire payload for a learned route, used when forwarding
    /// an update onward (the AS-path append happens in the caller).
    pub fn from_route(route: &Route) -> Self {
        Self {
            network: route.network_text.clone(),
            netmask: route.netmask_text.clone(),
            localpref: route.localpref,
            self_origin: route.self_origin,
            as_path: route.as_path.clone(),
            origin: route.origin,
        }
    }
}

/// One `{network, netmask}` entry of a `revoke` message.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RevokeEntry {
    pub network: String,
    pub netmask: String,
}

/// One `{network, netmask, peer}` entry of a `table` reply.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TableEntry {
    pub network: String,
    pub netmask: String,
    pub peer: String,
}

/// The six message kinds, each carrying its own payload shape (§6).
#[derive(Debug, Clone)]
pub enum Body {
    Data(serde_json::Value),
    Dump,
    Table(Vec<TableEntry>),
    Update(UpdatePayload),
    Revoke(Vec<RevokeEntry>),
    NoRoute,
}

impl Body {
    fn type_tag(&self) -> &'static str {
        match self {
            Body::Data(_) => "data",
            Body::Dump => "dump",
            Body::Table(_) => "table",
            Body::Update(_) => "update",
            Body::Revoke(_) => "revoke",
            Body::NoRoute => "no route",
        }
    }
}

/// A fully decoded message: envelope plus typed payload.
#[derive(Debug, Clone)]
pub struct Message {
    pub src: String,
    pub dst: String,
    pub body: Body,
}

/// The envelope as it appears on the wire, before `msg` is interpreted
/// according to `type`.
#[derive(Debug, Deserialize, Serialize)]
struct RawEnvelope {
    src: String,
    dst: String,
    #[serde(rename = "type")]
    kind: String,
    msg: serde_json::Value,
}

impl Message {
    /// Decode one framed message off the wire. An unknown `type` or a `msg`
    /// shape that doesn't match its `type` are both fatal per §7.
    pub fn decode(bytes: &[u8]) -> Result<Self, EngineError> {
        let raw: RawEnvelope = serde_json::from_slice(bytes)?;
        let body = match raw.kind.as_str() {
            "data" => Body::Data(raw.msg),
            "dump" => Body::Dump,
            "table" => Body::Table(serde_json::from_value(raw.msg)?),
            "update" => Body::Update(serde_json::from_value(raw.msg)?),
            "revoke" => Body::Revoke(serde_json::from_value(raw.msg)?),
            "no route" => Body::NoRoute,
            other => return Err(EngineError::UnknownType(other.to_string())),
        };
        Ok(Message {
            src: raw.src,
            dst: raw.dst,
            body,
        })
    }

    /// Encode this message for the wire.
    pub fn encode(&self) -> Vec<u8> {
        let msg = match &self.body {
            Body::Data(v) => v.clone(),
            Body::Dump => serde_json::json!({}),
            Body::Table(entries) => {
                serde_json::to_value(entries).expect("table entries always serialize")
            }
            Body::Update(u) => serde_json::to_value(u).expect("update payload always serializes"),
            Body::Revoke(entries) => {
                serde_json::to_value(entries).expect("revoke entries always serialize")
            }
            Body::NoRoute => serde_json::json!({}),
        };
        let raw = RawEnvelope {
            src: self.src.clone(),
            dst: self.dst.clone(),
            kind: self.body.type_tag().to_string(),
            msg,
        };
        serde_json::to_vec(&raw).expect("envelope always serializes")
    }

    /// Build a `no route` reply addressed back to the packet's source.
    pub fn no_route(local_address: String, dst: String) -> Self {
        Message {
            src: local_address,
            dst,
            body: Body::NoRoute,
        }
    }

    /// Build a `table` reply for a dump request.
    pub fn table(local_address: String, dst: String, entries: Vec<TableEntry>) -> Self {
        Message {
            src: local_address,
            dst,
            body: Body::Table(entries),
        }
    }
}
