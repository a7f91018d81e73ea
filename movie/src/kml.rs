use std::path::Path;

use anyhow::Result;
use network::{LonLat, TimeFormat, Timestamp};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::great_circle::ArcPoint;
use crate::timeline::{StyleRef, TimedGeometry, TimedMarker};

/// Receives everything to draw, in order.
pub trait DocumentWriter {
    fn add_marker(&mut self, marker: &TimedMarker);
    fn add_line(&mut self, line: &TimedGeometry);
}

/// How nodes and links look. The anchor never has a visible icon.
#[derive(Clone, Debug, PartialEq)]
pub struct KmlStyles {
    pub node_icon_href: String,
    pub node_icon_scale: f64,
    pub link_color: [u8; 3],
    pub link_width: f64,
}

impl KmlStyles {
    /// KML wants aabbggrr
    pub fn link_color_hex(&self) -> String {
        let [r, g, b] = self.link_color;
        format!("ff{b:02x}{g:02x}{r:02x}")
    }
}

/// Builds a KML 2.2 document for Google Earth, with one Placemark per element.
pub struct KmlDocument<'a> {
    styles: KmlStyles,
    time_format: &'a dyn TimeFormat,
    placemarks: Vec<Placemark>,
}

struct Placemark {
    // Points get an empty name, so Google Earth doesn't label them
    empty_name: bool,
    begin: String,
    end: String,
    style: StyleRef,
    geometry: Geometry,
}

enum Geometry {
    Point(String),
    LineString(String),
}

type XmlWriter = Writer<Vec<u8>>;

const KML_NAMESPACE: &str = "http://www.opengis.net/kml/2.2";

impl<'a> KmlDocument<'a> {
    pub fn new(styles: KmlStyles, time_format: &'a dyn TimeFormat) -> Self {
        Self {
            styles,
            time_format,
            placemarks: Vec::new(),
        }
    }

    pub fn num_placemarks(&self) -> usize {
        self.placemarks.len()
    }

    pub fn to_kml_string(&self) -> Result<String> {
        let mut w = Writer::new(Vec::new());
        w.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        w.write_event(Event::Start(
            BytesStart::new("kml").with_attributes([("xmlns", KML_NAMESPACE)]),
        ))?;
        start(&mut w, "Document")?;
        self.write_styles(&mut w)?;
        for placemark in &self.placemarks {
            placemark.write(&mut w)?;
        }
        end(&mut w, "Document")?;
        end(&mut w, "kml")?;
        Ok(String::from_utf8(w.into_inner())?)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fs_err::write(path.as_ref(), self.to_kml_string()?)?;
        Ok(())
    }

    fn write_styles(&self, w: &mut XmlWriter) -> Result<()> {
        start_style(w, StyleRef::Anchor)?;
        start(w, "IconStyle")?;
        start(w, "Icon")?;
        text_element(w, "href", "")?;
        end(w, "Icon")?;
        end(w, "IconStyle")?;
        end(w, "Style")?;

        start_style(w, StyleRef::Node)?;
        start(w, "IconStyle")?;
        text_element(w, "scale", &self.styles.node_icon_scale.to_string())?;
        start(w, "Icon")?;
        text_element(w, "href", &self.styles.node_icon_href)?;
        end(w, "Icon")?;
        end(w, "IconStyle")?;
        end(w, "Style")?;

        start_style(w, StyleRef::Link)?;
        start(w, "LineStyle")?;
        text_element(w, "color", &self.styles.link_color_hex())?;
        text_element(w, "width", &self.styles.link_width.to_string())?;
        end(w, "LineStyle")?;
        end(w, "Style")?;
        Ok(())
    }

    fn placemark(
        &self,
        empty_name: bool,
        begin: Timestamp,
        end: Timestamp,
        style: StyleRef,
        geometry: Geometry,
    ) -> Placemark {
        Placemark {
            empty_name,
            begin: self.time_format.format(begin),
            end: self.time_format.format(end),
            style,
            geometry,
        }
    }
}

impl<'a> DocumentWriter for KmlDocument<'a> {
    fn add_marker(&mut self, marker: &TimedMarker) {
        let placemark = self.placemark(
            true,
            marker.visible_from,
            marker.visible_until,
            marker.style,
            Geometry::Point(lonlat_coords(marker.pos)),
        );
        self.placemarks.push(placemark);
    }

    fn add_line(&mut self, line: &TimedGeometry) {
        let placemark = self.placemark(
            false,
            line.visible_from,
            line.visible_until,
            line.style,
            Geometry::LineString(format!(
                "{} {}",
                arc_coords(line.start),
                arc_coords(line.end)
            )),
        );
        self.placemarks.push(placemark);
    }
}

impl Placemark {
    fn write(&self, w: &mut XmlWriter) -> Result<()> {
        start(w, "Placemark")?;
        if self.empty_name {
            text_element(w, "name", "")?;
        }
        start(w, "TimeSpan")?;
        text_element(w, "begin", &self.begin)?;
        text_element(w, "end", &self.end)?;
        end(w, "TimeSpan")?;
        text_element(w, "styleUrl", &format!("#{}", style_id(self.style)))?;
        match self.geometry {
            Geometry::Point(ref coords) => {
                start(w, "Point")?;
                text_element(w, "coordinates", coords)?;
                end(w, "Point")?;
            }
            Geometry::LineString(ref coords) => {
                start(w, "LineString")?;
                text_element(w, "tessellate", "1")?;
                text_element(w, "altitudeMode", "relativeToGround")?;
                text_element(w, "coordinates", coords)?;
                end(w, "LineString")?;
            }
        }
        end(w, "Placemark")?;
        Ok(())
    }
}

fn start(w: &mut XmlWriter, tag: &str) -> Result<()> {
    w.write_event(Event::Start(BytesStart::new(tag)))?;
    Ok(())
}

fn end(w: &mut XmlWriter, tag: &str) -> Result<()> {
    w.write_event(Event::End(BytesEnd::new(tag)))?;
    Ok(())
}

fn start_style(w: &mut XmlWriter, style: StyleRef) -> Result<()> {
    w.write_event(Event::Start(
        BytesStart::new("Style").with_attributes([("id", style_id(style))]),
    ))?;
    Ok(())
}

/// The text is escaped
fn text_element(w: &mut XmlWriter, tag: &str, text: &str) -> Result<()> {
    start(w, tag)?;
    if !text.is_empty() {
        w.write_event(Event::Text(BytesText::new(text)))?;
    }
    end(w, tag)
}

fn style_id(style: StyleRef) -> &'static str {
    match style {
        StyleRef::Anchor => "anchor",
        StyleRef::Node => "node",
        StyleRef::Link => "link",
    }
}

fn lonlat_coords(pos: LonLat) -> String {
    format!("{},{}", pos.longitude(), pos.latitude())
}

fn arc_coords(pt: ArcPoint) -> String {
    format!("{},{},{}", pt.pos.longitude(), pt.pos.latitude(), pt.altitude)
}
