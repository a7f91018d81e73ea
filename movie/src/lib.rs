//! Turns a network of timed links into an animated KML movie: each link is drawn as a great-circle
//! arc that grows from origin to destination over the link's duration, and nodes light up as
//! things depart and arrive.

#[macro_use]
extern crate log;

mod config;
mod error;
mod export;
pub mod great_circle;
mod kml;
mod timeline;

pub use config::MovieConfig;
pub use error::MovieError;
pub use export::{export_to_geojson, to_geojson};
pub use great_circle::ArcPoint;
pub use kml::{DocumentWriter, KmlDocument, KmlStyles};
pub use timeline::{
    sample_fractions, LinkTimeline, Movie, MovieElement, MovieWindow, StyleRef, TimedGeometry,
    TimedMarker, TimelineParams,
};
