//! Fixed projection pair: EPSG:4326 (lon/lat degrees) for transport,
//! EPSG:3857 (spherical web mercator metres) for display.

use crate::geometry::{Coordinate, Geometry};
use kurbo::Point;
use std::f64::consts::PI;

/// Web mercator sphere radius in metres.
pub const RADIUS: f64 = 6_378_137.0;

/// Half the width of the projected world.
pub const HALF_SIZE: f64 = PI * RADIUS;

/// Resolution (metres per pixel) at zoom level 0 for 256 px tiles.
pub const MAX_RESOLUTION: f64 = 2.0 * HALF_SIZE / 256.0;

/// Project a lon/lat coordinate to web mercator.
pub fn from_lon_lat(lon_lat: Coordinate) -> Coordinate {
    let x = RADIUS * lon_lat.x.to_radians();
    let y = RADIUS * (PI / 4.0 + lon_lat.y.to_radians() / 2.0).tan().ln();
    Point::new(x, y.clamp(-HALF_SIZE, HALF_SIZE))
}

/// Unproject a web mercator coordinate to lon/lat.
pub fn to_lon_lat(coordinate: Coordinate) -> Coordinate {
    let lon = (coordinate.x / RADIUS).to_degrees();
    let lat = (2.0 * (coordinate.y / RADIUS).exp().atan() - PI / 2.0).to_degrees();
    Point::new(lon, lat)
}

/// Reproject a geometry from lon/lat to web mercator.
pub fn geometry_from_lon_lat(geometry: &Geometry) -> Geometry {
    geometry.map_coordinates(from_lon_lat)
}

/// Reproject a geometry from web mercator to lon/lat.
pub fn geometry_to_lon_lat(geometry: &Geometry) -> Geometry {
    geometry.map_coordinates(to_lon_lat)
}

/// View resolution for a zoom level.
pub fn resolution_for_zoom(zoom: f64) -> f64 {
    MAX_RESOLUTION / 2f64.powf(zoom)
}

/// Ground resolution (metres per pixel) at `at`, correcting the mercator scale.
pub fn point_resolution(resolution: f64, at: Coordinate) -> f64 {
    resolution / (at.y / RADIUS).cosh()
}
