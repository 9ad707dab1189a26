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

//! `asrouted`: the BGP-like single-AS route exchange and forwarding daemon
//! (§4.9, §6). Parses the ASN and neighbor list, opens one transport per
//! neighbor, and hands control to the Dispatcher.

use std::net::Ipv4Addr;
use std::path::PathBuf;
use std::str::FromStr;

use clap::Parser;

use asroute::dispatcher::Dispatcher;
use asroute::neighbor::NeighborTable;
use asroute::types::Relation;

/// `asrouted <asn> <address-relation>...`
#[derive(Debug, Parser)]
#[command(author, version, about = "A single-AS BGP-like route exchange and forwarding engine")]
struct Cli {
    /// This router's own autonomous-system number.
    asn: u32,

    /// One or more `address-relation` pairs, e.g. `192.168.0.2-cust`.
    #[arg(required = true)]
    neighbors: Vec<String>,

    /// Directory holding each neighbor's bound local socket (named by its
    /// address). Defaults to a fixed path so every router instance agrees
    /// on where to find its peers.
    #[arg(long, default_value = "/tmp/asrouted")]
    socket_dir: PathBuf,
}

/// One `address-relation` startup argument, e.g. `192.168.0.2-cust`.
fn parse_neighbor_arg(arg: &str) -> Result<(Ipv4Addr, Relation), String> {
    let (address, relation) = arg
        .rsplit_once('-')
        .ok_or_else(|| format!("`{arg}` is not of the form address-relation"))?;
    let address = Ipv4Addr::from_str(address).map_err(|e| format!("`{address}`: {e}"))?;
    let relation = Relation::from_str(relation).map_err(|e| e.to_string())?;
    Ok((address, relation))
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let mut entries = Vec::with_capacity(cli.neighbors.len());
    for arg in &cli.neighbors {
        match parse_neighbor_arg(arg) {
            Ok(entry) => entries.push(entry),
            Err(e) => {
                log::error!("invalid neighbor argument: {e}");
                std::process::exit(1);
            }
        }
    }

    log::info!(
        "asrouted starting: asn={} neighbors={}",
        cli.asn,
        entries.len()
    );

    let neighbors = match NeighborTable::connect(&entries, &cli.socket_dir) {
        Ok(t) => t,
        Err(e) => {
            log::error!("failed to connect to neighbors: {e}");
            std::process::exit(1);
        }
    };

    let dispatcher = match Dispatcher::new(cli.asn, neighbors) {
        Ok(d) => d,
        Err(e) => {
            log::error!("failed to set up event loop: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = dispatcher.run() {
        log::error!("{e}");
        std::process::exit(1);
    }
}
