//! Human-readable measurement strings.

use crate::geometry::{Coordinate, Geometry, GeometryKind};
use crate::measure::MeasureMethod;

/// Lengths above this many metres are shown in kilometres.
pub const LENGTH_KM_THRESHOLD: f64 = 100.0;

/// Areas above this many square metres are shown in square kilometres.
pub const AREA_KM2_THRESHOLD: f64 = 10_000.0;

/// Round to two decimals.
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Format a length in metres: `"55 m"`, `"1.5 km"`.
pub fn format_length(length: f64) -> String {
    if length > LENGTH_KM_THRESHOLD {
        format!("{} km", round2(length / 1000.0))
    } else {
        format!("{} m", round2(length))
    }
}

/// Format an area in square metres: `"2500 m²"`, `"0.05 km²"`.
pub fn format_area(area: f64) -> String {
    if area > AREA_KM2_THRESHOLD {
        format!("{} km²", round2(area / 1_000_000.0))
    } else {
        format!("{} m²", round2(area))
    }
}

/// Format a coordinate as `"x, y"` with a fixed number of decimals.
pub fn format_xy(coordinate: Coordinate, digits: usize) -> String {
    format!("{:.*}, {:.*}", digits, coordinate.x, digits, coordinate.y)
}

/// Live tooltip text and anchor for a geometry. Points have no tooltip.
pub fn measure_label(geometry: &Geometry, method: MeasureMethod) -> Option<(String, Coordinate)> {
    match geometry {
        Geometry::Point(_) => None,
        Geometry::LineString(_) => {
            let anchor = geometry.last_coordinate()?;
            Some((format_length(method.length(geometry)), anchor))
        }
        Geometry::Polygon(_) => {
            let anchor = geometry.interior_point()?;
            Some((format_area(method.area(geometry)), anchor))
        }
        Geometry::Circle { center, .. } => Some((format_area(method.area(geometry)), *center)),
    }
}

/// Derived description stored with a feature.
pub fn describe(geometry: &Geometry, method: MeasureMethod) -> String {
    match geometry {
        Geometry::Point(_) => "Point".to_string(),
        Geometry::LineString(_) => format!("Length: {}", format_length(method.length(geometry))),
        Geometry::Polygon(_) | Geometry::Circle { .. } => {
            format!("Area: {}", format_area(method.area(geometry)))
        }
    }
}

/// Default name given to a newly drawn feature.
pub fn default_name(kind: GeometryKind) -> &'static str {
    match kind {
        GeometryKind::Point => "Point",
        GeometryKind::LineString => "Line",
        GeometryKind::Polygon => "Polygon",
        GeometryKind::Circle => "Circle",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Point;

    #[test]
    fn test_format_length_thresholds() {
        assert_eq!(format_length(55.0), "55 m");
        assert_eq!(format_length(100.0), "100 m");
        assert_eq!(format_length(99.999), "100 m");
        assert_eq!(format_length(12.3456), "12.35 m");
        assert_eq!(format_length(100.5), "0.1 km");
        assert_eq!(format_length(1500.0), "1.5 km");
        assert_eq!(format_length(0.0), "0 m");
    }

    #[test]
    fn test_format_area_thresholds() {
        assert_eq!(format_area(2500.0), "2500 m²");
        assert_eq!(format_area(10_000.0), "10000 m²");
        assert_eq!(format_area(50_000.0), "0.05 km²");
        assert_eq!(format_area(1_234_567.0), "1.23 km²");
    }

    #[test]
    fn test_format_xy() {
        assert_eq!(format_xy(Point::new(37.6173, 55.7558), 7), "37.6173000, 55.7558000");
    }

    #[test]
    fn test_measure_label_anchors() {
        let line = Geometry::LineString(vec![Point::new(0.0, 0.0), Point::new(30.0, 40.0)]);
        let (text, anchor) = measure_label(&line, MeasureMethod::Planar).unwrap();
        assert_eq!(text, "50 m");
        assert_eq!(anchor, Point::new(30.0, 40.0));

        let circle = Geometry::Circle { center: Point::new(5.0, 5.0), radius: 1.0 };
        let (_, anchor) = measure_label(&circle, MeasureMethod::Planar).unwrap();
        assert_eq!(anchor, Point::new(5.0, 5.0));

        assert!(measure_label(&Geometry::Point(Point::ZERO), MeasureMethod::Planar).is_none());
    }

    #[test]
    fn test_describe() {
        let square = Geometry::polygon(vec![
            Point::new(0.0, 0.0),
            Point::new(50.0, 0.0),
            Point::new(50.0, 50.0),
            Point::new(0.0, 50.0),
        ]);
        assert_eq!(describe(&square, MeasureMethod::Planar), "Area: 2500 m²");
        assert_eq!(describe(&Geometry::Point(Point::ZERO), MeasureMethod::Planar), "Point");
    }
}
