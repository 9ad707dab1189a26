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

//! IPv4 text/numeric conversion and the prefix arithmetic shared by the
//! Selector and Aggregator.
//!
//! The wire protocol carries `network` and `netmask` as dotted-quad text;
//! everything past decode works on the `u32` form so the hot paths never
//! touch strings (§9: "stringly-typed IP arithmetic").

use std::net::Ipv4Addr;

use thiserror::Error;

/// Error decoding an IPv4 dotted-quad field from a message payload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IpFieldError {
    #[error("`{0}` is not a valid IPv4 dotted-quad address")]
    Malformed(String),
    #[error("netmask `{0}` is not a left-contiguous run of 1-bits")]
    NonContiguousMask(String),
}

/// Parse a dotted-quad string into its 32-bit big-endian representation.
pub fn parse_addr(s: &str) -> Result<u32, IpFieldError> {
    s.parse::<Ipv4Addr>()
        .map(u32::from)
        .map_err(|_| IpFieldError::Malformed(s.to_string()))
}

/// Render a 32-bit address back into dotted-quad text.
pub fn format_addr(addr: u32) -> String {
    Ipv4Addr::from(addr).to_string()
}

/// Parse a dotted-quad netmask, validating that its bits are a left-contiguous
/// run of 1s, and return `(mask, prefix_len)`.
pub fn parse_mask(s: &str) -> Result<(u32, u8), IpFieldError> {
    let mask = parse_addr(s)?;
    let prefix_len = mask_prefix_len(mask).ok_or_else(|| IpFieldError::NonContiguousMask(s.to_string()))?;
    Ok((mask, prefix_len))
}

/// Return the prefix length of `mask` if it is a contiguous run of leading
/// 1-bits (possibly zero), or `None` otherwise.
fn mask_prefix_len(mask: u32) -> Option<u8> {
    let ones = mask.leading_ones();
    let rebuilt = if ones == 0 { 0 } else { u32::MAX << (32 - ones) };
    (rebuilt == mask).then_some(ones as u8)
}

/// Build a netmask from a prefix length (inverse of [`mask_prefix_len`]).
/// Used by the Aggregator when it shortens a mask by one bit.
pub fn mask_from_prefix_len(len: u8) -> u32 {
    if len == 0 {
        0
    } else {
        u32::MAX << (32 - len)
    }
}

/// By-the-reference router-identity rule: the neighbor's address with the
/// literal trailing `.2` substring replaced by `.1`. This is a textual
/// substitution, not arithmetic, and is only ever applied to addresses that
/// really do end in `.2` (every configured neighbor, by convention).
pub fn local_address_on_link(neighbor: &str) -> String {
    if let Some(stripped) = neighbor.strip_suffix(".2") {
        format!("{stripped}.1")
    } else {
        neighbor.to_string()
    }
}

/// Does `addr` lie within `network/netmask`?
pub fn contains(network: u32, mask: u32, addr: u32) -> bool {
    (network & mask) == (addr & mask)
}

/// The reference prefix-match metric (§9.1): count the leading bits in which
/// `network & mask` agrees with `daddr`, stopping at the first disagreement.
/// This is deliberately *not* the textbook longest-prefix-match score — bits
/// past the mask in `network & mask` are zero, so a `daddr` with a non-zero
/// tail can cut the count short of the mask's own length. Preserved exactly
/// to match reference output.
pub fn match_score(network: u32, mask: u32, daddr: u32) -> u32 {
    let masked = network & mask;
    (masked ^ daddr).leading_zeros()
}
