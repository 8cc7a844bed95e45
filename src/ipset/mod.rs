//! Canonical, order-stable sets of IP networks.
//!
//! Every network is masked to its network address before it is stored, so
//! `10.0.0.7/24` and `10.0.0.0/24` collapse to the same entry. Single
//! addresses are widened to a host network (`/32` or `/128`). The first
//! occurrence of a network wins; later duplicates are dropped without
//! reordering what is already in the set.

pub mod loader;

pub use loader::{load_path, load_sources, IpSource};

use ipnetwork::IpNetwork;
use std::collections::HashSet;
use std::net::IpAddr;
use std::str::FromStr;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IpSet {
    networks: Vec<IpNetwork>,
    seen: HashSet<String>,
}

impl IpSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from arbitrary networks, keeping the first occurrence of each.
    pub fn dedupe<I>(networks: I) -> Self
    where
        I: IntoIterator<Item = IpNetwork>,
    {
        let mut set = Self::new();
        set.extend(networks);
        set
    }

    /// Insert a network, returning false when it was already present.
    pub fn insert(&mut self, network: IpNetwork) -> bool {
        let network = canonicalize(network);
        if !self.seen.insert(network.to_string()) {
            return false;
        }
        self.networks.push(network);
        true
    }

    pub fn len(&self) -> usize {
        self.networks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.networks.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &IpNetwork> {
        self.networks.iter()
    }

    /// Canonical string forms in insertion order.
    pub fn to_strings(&self) -> Vec<String> {
        self.networks.iter().map(|n| n.to_string()).collect()
    }
}

impl Extend<IpNetwork> for IpSet {
    fn extend<T: IntoIterator<Item = IpNetwork>>(&mut self, iter: T) {
        for network in iter {
            self.insert(network);
        }
    }
}

impl FromIterator<IpNetwork> for IpSet {
    fn from_iter<T: IntoIterator<Item = IpNetwork>>(iter: T) -> Self {
        Self::dedupe(iter)
    }
}

/// Mask a network down to its network address.
pub fn canonicalize(network: IpNetwork) -> IpNetwork {
    IpNetwork::new(network.network(), network.prefix()).unwrap_or(network)
}

/// Parse an address or CIDR. Bare addresses become host networks.
pub fn parse_network(value: &str) -> Option<IpNetwork> {
    let value = value.trim();
    let network = if value.contains('/') {
        IpNetwork::from_str(value).ok()?
    } else {
        IpNetwork::from(IpAddr::from_str(value).ok()?)
    };
    Some(canonicalize(network))
}
