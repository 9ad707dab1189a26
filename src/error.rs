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

//! The engine's typed error hierarchy (§4.11, §7).
//!
//! [`EngineError`] distinguishes the two kinds of trouble that can end the
//! Dispatcher loop's *current* iteration with something other than "handled
//! normally": a decode failure or an unknown message type, both fatal per
//! §7. Transport I/O failure and an empty read are *not* represented here —
//! the Dispatcher treats them as an ordinary shutdown signal, not an error
//! (§6: "process exits 0 in both cases").

use thiserror::Error;

use crate::ip::IpFieldError;

/// A fatal condition raised while decoding or dispatching one message. The
/// Dispatcher propagates this out of its loop; `main` logs it and exits
/// non-zero (§7: "the process aborts").
#[derive(Debug, Error)]
pub enum EngineError {
    /// The payload was not valid JSON, or did not match the shape its
    /// `type` tag demands.
    #[error("failed to decode message: {0}")]
    Decode(#[from] serde_json::Error),

    /// A `network`/`netmask` field in an otherwise well-formed payload was
    /// not valid IPv4 dotted-quad text, or the mask was not a contiguous
    /// prefix.
    #[error("invalid IP field: {0}")]
    IpField(#[from] IpFieldError),

    /// The envelope's `type` tag was not one of the six known message
    /// kinds. The protocol is closed by design (§7).
    #[error("unknown message type `{0}`")]
    UnknownType(String),
}
