use std::collections::BTreeMap;

use anyhow::Result;
use serde::Deserialize;

use crate::{LonLat, NodeID};

pub struct Node {
    pub id: NodeID,
    pub pos: LonLat,
}

pub fn load<R: std::io::Read>(reader: R) -> Result<BTreeMap<NodeID, Node>> {
    let mut nodes = BTreeMap::new();
    for rec in crate::semicolon_reader(reader).deserialize() {
        let Record(id, longitude, latitude) = rec?;
        if nodes.contains_key(&id) {
            bail!("Duplicate node {id}");
        }
        nodes.insert(
            id.clone(),
            Node {
                id,
                pos: LonLat::new(longitude, latitude),
            },
        );
    }
    Ok(nodes)
}

// id;longitude;latitude
#[derive(Deserialize)]
struct Record(NodeID, f64, f64);
