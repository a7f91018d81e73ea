#[macro_use]
extern crate anyhow;
#[macro_use]
extern crate log;

mod ids;
mod links;
mod lonlat;
mod nodes;
mod time;

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};

pub use ids::{LinkID, NodeID};
pub use links::Link;
pub use lonlat::LonLat;
pub use nodes::Node;
pub use time::{IsoUtc, MalformedTimestamp, TimeFormat, Timestamp};

/// Places and the timed links between them. Everything is loaded up-front; nothing is streamed.
pub struct Network {
    pub nodes: BTreeMap<NodeID, Node>,
    // Keyed by the numeric ID, so iteration order is the rendering order
    pub links: BTreeMap<LinkID, Link>,
}

impl Network {
    pub fn load<R1: std::io::Read, R2: std::io::Read>(
        nodes_reader: R1,
        links_reader: R2,
        time_format: &dyn TimeFormat,
    ) -> Result<Self> {
        let nodes = nodes::load(nodes_reader).context("loading nodes")?;
        let links = links::load(links_reader, time_format).context("loading links")?;
        info!("Loaded {} nodes and {} links", nodes.len(), links.len());
        Ok(Self { nodes, links })
    }

    pub fn load_from_paths<P1: AsRef<Path>, P2: AsRef<Path>>(
        nodes_path: P1,
        links_path: P2,
        time_format: &dyn TimeFormat,
    ) -> Result<Self> {
        // fs_err mentions the path in the error
        let nodes = fs_err::File::open(nodes_path.as_ref())?;
        let links = fs_err::File::open(links_path.as_ref())?;
        Self::load(nodes, links, time_format)
    }

    pub fn empty() -> Self {
        Self {
            nodes: BTreeMap::new(),
            links: BTreeMap::new(),
        }
    }

    pub fn links_in_order(&self) -> impl Iterator<Item = &Link> {
        self.links.values()
    }

    pub fn node(&self, id: &NodeID) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// The earliest departure and latest arrival over all links
    pub fn time_range(&self) -> Option<(Timestamp, Timestamp)> {
        let earliest = self.links.values().map(|link| link.departure).min()?;
        let latest = self.links.values().map(|link| link.arrival).max()?;
        Some((earliest, latest))
    }
}

// Both tables are semicolon-separated with one header row. Columns are matched by position, not
// by header name.
fn semicolon_reader<R: std::io::Read>(reader: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .delimiter(b';')
        .trim(csv::Trim::All)
        .from_reader(reader)
}
