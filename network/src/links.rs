use std::collections::BTreeMap;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::{LinkID, NodeID, TimeFormat, Timestamp};

/// Something travelling from one node to another. Departure is never after arrival.
pub struct Link {
    pub id: LinkID,
    pub origin: NodeID,
    pub destination: NodeID,
    pub departure: Timestamp,
    pub arrival: Timestamp,
}

impl Link {
    /// In seconds
    pub fn duration(&self) -> i64 {
        self.arrival - self.departure
    }
}

pub fn load<R: std::io::Read>(
    reader: R,
    time_format: &dyn TimeFormat,
) -> Result<BTreeMap<LinkID, Link>> {
    let mut links = BTreeMap::new();
    for rec in crate::semicolon_reader(reader).deserialize() {
        let Record(id, origin, destination, raw_departure, raw_arrival) = rec?;
        let departure = time_format
            .to_epoch(&raw_departure)
            .with_context(|| format!("departure of link {id}"))?;
        let arrival = time_format
            .to_epoch(&raw_arrival)
            .with_context(|| format!("arrival of link {id}"))?;
        if departure > arrival {
            bail!("Link {id} departs at {raw_departure}, after it arrives at {raw_arrival}");
        }
        if links.contains_key(&id) {
            bail!("Duplicate link {id}");
        }
        links.insert(
            id,
            Link {
                id,
                origin,
                destination,
                departure,
                arrival,
            },
        );
    }
    Ok(links)
}

// id;origin;destination;departure;arrival
#[derive(Deserialize)]
struct Record(LinkID, NodeID, NodeID, String, String);
