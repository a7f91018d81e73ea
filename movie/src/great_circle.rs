use std::f64::consts::PI;

use network::LonLat;

/// Mean radius of the Earth, in meters
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;
/// How high the arc peaks, relative to the length of the path
const HOP_HEIGHT_RATIO: f64 = 0.3;

/// A point along a rendered path. The altitude is cosmetic, in meters above the ground.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ArcPoint {
    pub pos: LonLat,
    pub altitude: f64,
}

impl ArcPoint {
    pub fn on_ground(pos: LonLat) -> Self {
        Self { pos, altitude: 0.0 }
    }
}

/// The great-circle distance between two points, as an angle in radians.
pub fn angular_distance(origin: LonLat, dest: LonLat) -> f64 {
    let (lon1, lat1) = radians(origin);
    let (lon2, lat2) = radians(dest);
    let a = ((lat2 - lat1) / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * ((lon2 - lon1) / 2.0).sin().powi(2);
    // Rounding can push sqrt(a) slightly past 1 for nearly antipodal points
    2.0 * a.sqrt().min(1.0).asin()
}

/// True for points that are the same place on the globe, even if their coordinates differ, like
/// either side of the antimeridian or two longitudes at a pole.
pub fn same_place(a: LonLat, b: LonLat) -> bool {
    // About 6 micrometers
    const EPSILON_RADIANS: f64 = 1e-12;
    angular_distance(a, b) < EPSILON_RADIANS
}

pub fn distance_meters(origin: LonLat, dest: LonLat) -> f64 {
    angular_distance(origin, dest) * EARTH_RADIUS_METERS
}

/// Finds the point `fraction` of the way along the great circle from `origin` to `dest`, lifted
/// into a sinusoidal arc that touches the ground at both ends and peaks halfway. Longer paths arc
/// higher.
///
/// `fraction` isn't clamped, but only [0, 1] is meaningful. When the two points coincide, the
/// result is always `origin` on the ground.
pub fn interpolate(origin: LonLat, dest: LonLat, fraction: f64) -> ArcPoint {
    let d = angular_distance(origin, dest);
    if d == 0.0 {
        return ArcPoint::on_ground(origin);
    }

    // Spherical linear interpolation between the two unit vectors
    let a = ((1.0 - fraction) * d).sin() / d.sin();
    let b = (fraction * d).sin() / d.sin();
    let v1 = to_unit_vector(origin);
    let v2 = to_unit_vector(dest);
    let pos = from_vector([
        a * v1[0] + b * v2[0],
        a * v1[1] + b * v2[1],
        a * v1[2] + b * v2[2],
    ]);

    let altitude = d * EARTH_RADIUS_METERS * HOP_HEIGHT_RATIO * (PI * fraction).sin();
    ArcPoint { pos, altitude }
}

fn radians(pt: LonLat) -> (f64, f64) {
    (pt.longitude().to_radians(), pt.latitude().to_radians())
}

pub(crate) fn to_unit_vector(pt: LonLat) -> [f64; 3] {
    let (lon, lat) = radians(pt);
    [lat.cos() * lon.cos(), lat.cos() * lon.sin(), lat.sin()]
}

fn from_vector(v: [f64; 3]) -> LonLat {
    let lon = v[1].atan2(v[0]);
    let lat = v[2].atan2((v[0] * v[0] + v[1] * v[1]).sqrt());
    LonLat::new(lon.to_degrees(), lat.to_degrees())
}
