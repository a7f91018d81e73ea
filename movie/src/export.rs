use std::path::Path;

use anyhow::Result;
use geojson::{Feature, FeatureCollection, GeoJson};
use network::{Network, TimeFormat};

use crate::Movie;

/// The nodes as points and every link as its sampled 3D arc, for inspecting the geometry outside
/// of Google Earth.
pub fn to_geojson(network: &Network, movie: &Movie, time_format: &dyn TimeFormat) -> GeoJson {
    let mut features = Vec::new();

    for node in network.nodes.values() {
        let mut feature = Feature {
            bbox: None,
            geometry: Some(geojson::Geometry::new(geojson::Value::Point(vec![
                node.pos.longitude(),
                node.pos.latitude(),
            ]))),
            id: None,
            properties: None,
            foreign_members: None,
        };
        feature.set_property("type", "node");
        feature.set_property("node_id", node.id.as_str());
        features.push(feature);
    }

    for link in &movie.links {
        let coords = link
            .arc()
            .into_iter()
            .map(|pt| vec![pt.pos.longitude(), pt.pos.latitude(), pt.altitude])
            .collect();
        let mut feature = Feature {
            bbox: None,
            geometry: Some(geojson::Geometry::new(geojson::Value::LineString(coords))),
            id: None,
            properties: None,
            foreign_members: None,
        };
        feature.set_property("type", "link");
        feature.set_property("link_id", link.link.0);
        feature.set_property("departure", time_format.format(link.origin.visible_from));
        feature.set_property("arrival", time_format.format(link.destination.visible_from));
        features.push(feature);
    }

    GeoJson::FeatureCollection(FeatureCollection {
        features,
        bbox: None,
        foreign_members: None,
    })
}

pub fn export_to_geojson<P: AsRef<Path>>(
    path: P,
    network: &Network,
    movie: &Movie,
    time_format: &dyn TimeFormat,
) -> Result<()> {
    let gj = to_geojson(network, movie, time_format);
    fs_err::write(path.as_ref(), serde_json::to_string_pretty(&gj)?)?;
    Ok(())
}
