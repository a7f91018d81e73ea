use network::{Link, LinkID, LonLat, Network, Node, NodeID, Timestamp};

use crate::great_circle::{self, ArcPoint};
use crate::kml::DocumentWriter;
use crate::MovieError;

/// The overall time range the viewer's slider should cover
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MovieWindow {
    pub begin: Timestamp,
    pub end: Timestamp,
}

/// Everything that shapes the timeline. Styling isn't here; see `KmlStyles`.
#[derive(Clone, Debug, PartialEq)]
pub struct TimelineParams {
    pub window: MovieWindow,
    /// Seconds a node stays visible after a link departs from or arrives at it
    pub delay_node: i64,
    /// Seconds each piece of a link stays visible after appearing
    pub delay_link: i64,
    /// Spacing of the fractions used to sample each path. 0.05 gives 20 pieces.
    pub sample_step: f64,
}

/// A century. Anything longer is surely a typo, and keeps time arithmetic far from overflowing.
pub const MAX_DELAY_SECONDS: i64 = 100 * 365 * 24 * 60 * 60;
/// The most pieces a single link can be split into
pub const MAX_PIECES_PER_LINK: f64 = 1_000_000.0;

impl TimelineParams {
    pub fn validate(&self) -> Result<(), MovieError> {
        if !(self.sample_step > 0.0 && self.sample_step <= 1.0) {
            return Err(MovieError::InvalidConfig(format!(
                "sample_step must be in (0, 1], not {}",
                self.sample_step
            )));
        }
        if (1.0 / self.sample_step).ceil() > MAX_PIECES_PER_LINK {
            return Err(MovieError::InvalidConfig(format!(
                "sample_step {} would split each link into more than {} pieces",
                self.sample_step, MAX_PIECES_PER_LINK
            )));
        }
        validate_delays(self.delay_node, self.delay_link)?;
        if self.window.begin > self.window.end {
            return Err(MovieError::InvalidConfig(format!(
                "the movie begins at {}, after it ends at {}",
                self.window.begin, self.window.end
            )));
        }
        Ok(())
    }
}

pub(crate) fn validate_delays(delay_node: i64, delay_link: i64) -> Result<(), MovieError> {
    for (name, delay) in [("delay_node", delay_node), ("delay_link", delay_link)] {
        if !(0..=MAX_DELAY_SECONDS).contains(&delay) {
            return Err(MovieError::InvalidConfig(format!(
                "{name} must be between 0 and {MAX_DELAY_SECONDS} seconds, not {delay}"
            )));
        }
    }
    Ok(())
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StyleRef {
    /// Invisible
    Anchor,
    Node,
    Link,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TimedMarker {
    pub pos: LonLat,
    pub visible_from: Timestamp,
    pub visible_until: Timestamp,
    pub style: StyleRef,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TimedGeometry {
    pub start: ArcPoint,
    pub end: ArcPoint,
    pub visible_from: Timestamp,
    pub visible_until: Timestamp,
    pub style: StyleRef,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MovieElement<'a> {
    Marker(&'a TimedMarker),
    Line(&'a TimedGeometry),
}

/// Everything drawn for one link
pub struct LinkTimeline {
    pub link: LinkID,
    pub origin: TimedMarker,
    pub destination: TimedMarker,
    // Ordered from origin to destination
    pub segments: Vec<TimedGeometry>,
}

impl LinkTimeline {
    pub fn elements(&self) -> impl Iterator<Item = MovieElement<'_>> {
        [
            MovieElement::Marker(&self.origin),
            MovieElement::Marker(&self.destination),
        ]
        .into_iter()
        .chain(self.segments.iter().map(MovieElement::Line))
    }

    /// The full arc, including the ground-level start
    pub fn arc(&self) -> Vec<ArcPoint> {
        let mut pts = Vec::new();
        if let Some(first) = self.segments.first() {
            pts.push(first.start);
        }
        pts.extend(self.segments.iter().map(|segment| segment.end));
        pts
    }
}

/// The fully computed animation. Building it checks everything up-front, so writing it out can't
/// fail halfway.
pub struct Movie {
    pub anchor: TimedMarker,
    // Sorted by link ID
    pub links: Vec<LinkTimeline>,
}

impl Movie {
    pub fn build(network: &Network, params: &TimelineParams) -> Result<Self, MovieError> {
        params.validate()?;

        // Any node works; the anchor is never drawn
        let anchor_node = network.nodes.values().next().ok_or(MovieError::NoNodes)?;
        let anchor = TimedMarker {
            pos: anchor_node.pos,
            visible_from: params.window.begin,
            visible_until: params.window.end,
            style: StyleRef::Anchor,
        };

        let fractions = sample_fractions(params.sample_step);
        let links = network
            .links_in_order()
            .map(|link| link_timeline(network, link, &fractions, params))
            .collect::<Result<Vec<_>, _>>()?;
        debug!(
            "Built {} links, {} pieces each",
            links.len(),
            fractions.len() - 1
        );
        Ok(Self { anchor, links })
    }

    /// In the order they should be written: the anchor, then each link's origin, destination,
    /// and path pieces
    pub fn elements(&self) -> impl Iterator<Item = MovieElement<'_>> {
        std::iter::once(MovieElement::Marker(&self.anchor))
            .chain(self.links.iter().flat_map(|link| link.elements()))
    }

    pub fn write(&self, writer: &mut dyn DocumentWriter) {
        for element in self.elements() {
            match element {
                MovieElement::Marker(marker) => writer.add_marker(marker),
                MovieElement::Line(line) => writer.add_line(line),
            }
        }
    }
}

fn link_timeline(
    network: &Network,
    link: &Link,
    fractions: &[f64],
    params: &TimelineParams,
) -> Result<LinkTimeline, MovieError> {
    let origin = lookup(network, link, &link.origin)?;
    let destination = lookup(network, link, &link.destination)?;
    if great_circle::same_place(origin.pos, destination.pos) {
        warn!(
            "Link {} goes from {} to {}, which are at the same place. It'll be drawn as a point.",
            link.id, origin.id, destination.id
        );
    }

    let duration = link.duration() as f64;
    // Each piece starts where the last ended. The very first starts from the raw origin on the
    // ground.
    let segments = fractions
        .iter()
        .skip(1)
        .scan(ArcPoint::on_ground(origin.pos), |start, &fraction| {
            let end = great_circle::interpolate(origin.pos, destination.pos, fraction);
            let visible_from = link
                .departure
                .offset((fraction * duration).floor() as i64);
            let segment = TimedGeometry {
                start: *start,
                end,
                visible_from,
                visible_until: visible_from.offset(params.delay_link),
                style: StyleRef::Link,
            };
            *start = end;
            Some(segment)
        })
        .collect();

    Ok(LinkTimeline {
        link: link.id,
        origin: node_marker(origin, link.departure, params),
        destination: node_marker(destination, link.arrival, params),
        segments,
    })
}

fn lookup<'a>(network: &'a Network, link: &Link, id: &NodeID) -> Result<&'a Node, MovieError> {
    network.node(id).ok_or_else(|| MovieError::MissingNode {
        link: link.id,
        node: id.clone(),
    })
}

fn node_marker(node: &Node, time: Timestamp, params: &TimelineParams) -> TimedMarker {
    TimedMarker {
        pos: node.pos,
        visible_from: time,
        visible_until: time.offset(params.delay_node),
        style: StyleRef::Node,
    }
}

/// 0, step, 2 * step, ..., always ending with exactly 1.0. Assumes 0 < step <= 1.
pub fn sample_fractions(step: f64) -> Vec<f64> {
    // Multiples of step that land within this of 1.0 are treated as 1.0, so rounding error can't
    // sneak in an extra sliver of a piece
    const EPSILON: f64 = 1e-9;

    let mut fractions = Vec::new();
    let mut i = 0;
    loop {
        // Multiply instead of accumulating, so error doesn't build up
        let fraction = (i as f64) * step;
        if fraction >= 1.0 - EPSILON {
            break;
        }
        fractions.push(fraction);
        i += 1;
    }
    fractions.push(1.0);
    fractions
}

#[cfg(test)]
mod tests {
    use network::{IsoUtc, TimeFormat};

    use super::*;

    fn network(nodes: &str, links: &str) -> Network {
        Network::load(nodes.as_bytes(), links.as_bytes(), &IsoUtc).unwrap()
    }

    fn time(raw: &str) -> Timestamp {
        IsoUtc.to_epoch(raw).unwrap()
    }

    fn params(sample_step: f64) -> TimelineParams {
        TimelineParams {
            window: MovieWindow {
                begin: time("2014-01-01T07:59:00Z"),
                end: time("2014-01-01T08:06:00Z"),
            },
            delay_node: 100,
            delay_link: 100,
            sample_step,
        }
    }

    const TWO_NODES: &str = "id;lon;lat\nA;0;0\nB;10;10\n";
    const ONE_LINK: &str =
        "id;o;d;dep;arr\n1;A;B;2014-01-01T08:00:00Z;2014-01-01T08:05:00Z\n";

    #[test]
    fn fractions() {
        assert_eq!(sample_fractions(0.25), vec![0.0, 0.25, 0.5, 0.75, 1.0]);
        assert_eq!(sample_fractions(1.0), vec![0.0, 1.0]);

        let fractions = sample_fractions(0.05);
        assert_eq!(fractions.len(), 21);
        assert_eq!(fractions[0], 0.0);
        assert_eq!(*fractions.last().unwrap(), 1.0);
        assert!(fractions.windows(2).all(|pair| pair[0] < pair[1]));

        // Doesn't divide evenly; the last piece is shorter
        assert_eq!(sample_fractions(0.3).len(), 5);
        assert_eq!(sample_fractions(0.1).len(), 11);
    }

    #[test]
    fn piece_count_matches_step() {
        let network = network(
            TWO_NODES,
            "id;o;d;dep;arr
1;A;B;2014-01-01T08:00:00Z;2014-01-01T08:05:00Z
2;B;A;2014-01-01T08:00:00Z;2014-01-01T08:00:00Z
3;A;B;2014-01-01T08:00:00Z;2014-01-02T08:00:07Z
",
        );
        for (step, expected) in [(0.05, 20), (0.25, 4), (0.3, 4), (0.1, 10), (1.0, 1)] {
            let movie = Movie::build(&network, &params(step)).unwrap();
            for link in &movie.links {
                assert_eq!(link.segments.len(), expected, "step {step}");
            }
        }
    }

    #[test]
    fn two_node_scenario() {
        let network = network(TWO_NODES, ONE_LINK);
        let movie = Movie::build(&network, &params(0.25)).unwrap();

        assert_eq!(movie.anchor.style, StyleRef::Anchor);
        assert_eq!(movie.anchor.visible_from, time("2014-01-01T07:59:00Z"));
        assert_eq!(movie.anchor.visible_until, time("2014-01-01T08:06:00Z"));

        assert_eq!(movie.links.len(), 1);
        let link = &movie.links[0];

        assert_eq!(link.origin.pos, LonLat::new(0.0, 0.0));
        assert_eq!(link.origin.visible_from, time("2014-01-01T08:00:00Z"));
        assert_eq!(link.origin.visible_until, time("2014-01-01T08:01:40Z"));
        assert_eq!(link.destination.pos, LonLat::new(10.0, 10.0));
        assert_eq!(link.destination.visible_from, time("2014-01-01T08:05:00Z"));
        assert_eq!(link.destination.visible_until, time("2014-01-01T08:06:40Z"));

        assert_eq!(link.segments.len(), 4);
        let starts: Vec<String> = link
            .segments
            .iter()
            .map(|s| IsoUtc.format(s.visible_from))
            .collect();
        assert_eq!(
            starts,
            vec![
                "2014-01-01T08:01:15Z",
                "2014-01-01T08:02:30Z",
                "2014-01-01T08:03:45Z",
                "2014-01-01T08:05:00Z"
            ]
        );
        for segment in &link.segments {
            assert_eq!(segment.visible_until - segment.visible_from, 100);
            assert_eq!(segment.style, StyleRef::Link);
        }

        // The first piece starts exactly at A, on the ground
        assert_eq!(
            link.segments[0].start,
            ArcPoint::on_ground(LonLat::new(0.0, 0.0))
        );
        // Pieces are chained
        for pair in link.segments.windows(2) {
            assert_eq!(pair[0].end, pair[1].start);
        }
        let last = link.segments.last().unwrap().end;
        assert!((last.pos.longitude() - 10.0).abs() < 1e-9);
        assert!((last.pos.latitude() - 10.0).abs() < 1e-9);
        assert!(link.segments[1].end.altitude > link.segments[0].end.altitude);
    }

    #[test]
    fn visibility_follows_the_traveller() {
        let network = network(
            TWO_NODES,
            "id;o;d;dep;arr\n1;A;B;2014-01-01T08:00:00Z;2014-01-01T08:17:13Z\n",
        );
        let movie = Movie::build(&network, &params(0.05)).unwrap();
        let link = &movie.links[0];
        assert!(link
            .segments
            .windows(2)
            .all(|pair| pair[0].visible_from <= pair[1].visible_from));
        assert_eq!(
            link.segments.last().unwrap().visible_from,
            time("2014-01-01T08:17:13Z")
        );
        assert!(link.segments[0].visible_from >= time("2014-01-01T08:00:00Z"));
    }

    #[test]
    fn instantaneous_link_shows_everything_at_once() {
        let network = network(
            TWO_NODES,
            "id;o;d;dep;arr\n1;A;B;2014-01-01T08:00:00Z;2014-01-01T08:00:00Z\n",
        );
        let movie = Movie::build(&network, &params(0.05)).unwrap();
        for segment in &movie.links[0].segments {
            assert_eq!(segment.visible_from, time("2014-01-01T08:00:00Z"));
            assert_eq!(segment.visible_until, time("2014-01-01T08:01:40Z"));
        }
    }

    #[test]
    fn loop_link_stays_on_the_ground() {
        let network = network(
            TWO_NODES,
            "id;o;d;dep;arr\n1;B;B;2014-01-01T08:00:00Z;2014-01-01T08:05:00Z\n",
        );
        let movie = Movie::build(&network, &params(0.25)).unwrap();
        for segment in &movie.links[0].segments {
            assert_eq!(segment.end, ArcPoint::on_ground(LonLat::new(10.0, 10.0)));
        }
    }

    #[test]
    fn element_order() {
        let network = network(
            "id;lon;lat\nA;0;0\nB;10;10\nC;20;0\n",
            "id;o;d;dep;arr
20;B;C;2014-01-01T08:01:00Z;2014-01-01T08:04:00Z
3;A;B;2014-01-01T08:00:00Z;2014-01-01T08:05:00Z
",
        );
        let movie = Movie::build(&network, &params(0.5)).unwrap();
        assert_eq!(
            movie.links.iter().map(|l| l.link).collect::<Vec<_>>(),
            vec![LinkID(3), LinkID(20)]
        );

        let kinds: Vec<&str> = movie
            .elements()
            .map(|e| match e {
                MovieElement::Marker(m) if m.style == StyleRef::Anchor => "anchor",
                MovieElement::Marker(_) => "node",
                MovieElement::Line(_) => "line",
            })
            .collect();
        assert_eq!(
            kinds,
            vec!["anchor", "node", "node", "line", "line", "node", "node", "line", "line"]
        );

        // Every node appearance gets its own marker, even for the same node
        let b = LonLat::new(10.0, 10.0);
        let b_markers = movie
            .elements()
            .filter(|e| match e {
                MovieElement::Marker(m) => m.style == StyleRef::Node && m.pos == b,
                MovieElement::Line(_) => false,
            })
            .count();
        assert_eq!(b_markers, 2);
    }

    #[test]
    fn arc_includes_the_start() {
        let network = network(TWO_NODES, ONE_LINK);
        let movie = Movie::build(&network, &params(0.25)).unwrap();
        let arc = movie.links[0].arc();
        assert_eq!(arc.len(), 5);
        assert_eq!(arc[0], ArcPoint::on_ground(LonLat::new(0.0, 0.0)));
    }

    #[test]
    fn unknown_node_is_fatal() {
        let network = network(
            TWO_NODES,
            "id;o;d;dep;arr
1;A;B;2014-01-01T08:00:00Z;2014-01-01T08:05:00Z
2;A;Z;2014-01-01T08:00:00Z;2014-01-01T08:05:00Z
",
        );
        match Movie::build(&network, &params(0.25)) {
            Err(MovieError::MissingNode { link, node }) => {
                assert_eq!(link, LinkID(2));
                assert_eq!(node, NodeID::new("Z"));
            }
            _ => panic!("expected MissingNode"),
        }
    }

    #[test]
    fn no_nodes_is_fatal() {
        let network = Network::empty();
        assert!(matches!(
            Movie::build(&network, &params(0.25)),
            Err(MovieError::NoNodes)
        ));
    }

    #[test]
    fn bad_params() {
        let network = network(TWO_NODES, ONE_LINK);
        for step in [0.0, -0.1, 1.5, f64::NAN] {
            assert!(matches!(
                Movie::build(&network, &params(step)),
                Err(MovieError::InvalidConfig(_))
            ));
        }

        let mut backwards = params(0.25);
        backwards.window.end = backwards.window.begin.offset(-1);
        assert!(backwards.validate().is_err());

        let mut negative = params(0.25);
        negative.delay_link = -5;
        assert!(negative.validate().is_err());
    }

    #[test]
    fn huge_delays_are_rejected_instead_of_overflowing() {
        let network = network(TWO_NODES, ONE_LINK);
        for (delay_node, delay_link, culprit) in [
            (i64::MAX, 100, "delay_node"),
            (100, i64::MAX, "delay_link"),
            (MAX_DELAY_SECONDS + 1, 0, "delay_node"),
        ] {
            let mut params = params(0.25);
            params.delay_node = delay_node;
            params.delay_link = delay_link;
            match Movie::build(&network, &params) {
                Err(MovieError::InvalidConfig(msg)) => assert!(msg.contains(culprit), "{msg}"),
                _ => panic!("expected InvalidConfig for {delay_node}, {delay_link}"),
            }
        }

        // The limit itself is fine
        let mut params = params(0.25);
        params.delay_node = MAX_DELAY_SECONDS;
        params.delay_link = MAX_DELAY_SECONDS;
        let movie = Movie::build(&network, &params).unwrap();
        assert_eq!(
            movie.links[0].origin.visible_until - movie.links[0].origin.visible_from,
            MAX_DELAY_SECONDS
        );
    }

    #[test]
    fn tiny_steps_are_rejected() {
        let network = network(TWO_NODES, ONE_LINK);
        for step in [1e-300, f64::MIN_POSITIVE, 1e-7] {
            assert!(matches!(
                Movie::build(&network, &params(step)),
                Err(MovieError::InvalidConfig(_))
            ));
        }
        assert!(params(0.001).validate().is_ok());
    }

    #[derive(Default)]
    struct Recorder {
        markers: usize,
        lines: usize,
    }

    impl DocumentWriter for Recorder {
        fn add_marker(&mut self, _: &TimedMarker) {
            self.markers += 1;
        }
        fn add_line(&mut self, _: &TimedGeometry) {
            self.lines += 1;
        }
    }

    #[test]
    fn writes_everything() {
        let network = network(TWO_NODES, ONE_LINK);
        let movie = Movie::build(&network, &params(0.05)).unwrap();
        let mut recorder = Recorder::default();
        movie.write(&mut recorder);
        assert_eq!(recorder.markers, 3);
        assert_eq!(recorder.lines, 20);
    }
}
