//! Well-known-text encoding for point, line and polygon geometries.
//!
//! Circles have no WKT representation and are rejected in both directions.

use crate::geometry::{Coordinate, Geometry};
use kurbo::Point;
use thiserror::Error;

/// WKT errors.
#[derive(Debug, Error, PartialEq)]
pub enum WktError {
    #[error("Geometry kind has no WKT form: {0}")]
    Unsupported(String),
    #[error("Unexpected end of WKT input")]
    UnexpectedEnd,
    #[error("Unexpected character '{found}' at offset {offset}")]
    Unexpected { found: char, offset: usize },
    #[error("Invalid number at offset {0}")]
    InvalidNumber(usize),
    #[error("Empty geometry")]
    Empty,
}

/// Encode a geometry as WKT.
pub fn encode(geometry: &Geometry) -> Result<String, WktError> {
    match geometry {
        Geometry::Point(p) => Ok(format!("POINT({})", coordinate(*p))),
        Geometry::LineString(coords) => Ok(format!("LINESTRING({})", coordinate_list(coords))),
        Geometry::Polygon(rings) => {
            let rings: Vec<String> = rings.iter().map(|ring| format!("({})", coordinate_list(ring))).collect();
            Ok(format!("POLYGON({})", rings.join(",")))
        }
        Geometry::Circle { .. } => Err(WktError::Unsupported("Circle".to_string())),
    }
}

fn coordinate(c: Coordinate) -> String {
    format!("{} {}", c.x, c.y)
}

fn coordinate_list(coords: &[Coordinate]) -> String {
    coords.iter().map(|&c| coordinate(c)).collect::<Vec<_>>().join(",")
}

/// Decode a WKT string.
pub fn decode(input: &str) -> Result<Geometry, WktError> {
    let mut parser = Parser { input, pos: 0 };
    let tag = parser.word();
    let geometry = match tag.to_ascii_uppercase().as_str() {
        "POINT" => {
            parser.expect('(')?;
            let p = parser.coordinate()?;
            parser.expect(')')?;
            Geometry::Point(p)
        }
        "LINESTRING" => Geometry::LineString(parser.coordinate_list()?),
        "POLYGON" => {
            parser.expect('(')?;
            let mut rings = vec![parser.coordinate_list()?];
            while parser.eat(',') {
                rings.push(parser.coordinate_list()?);
            }
            parser.expect(')')?;
            Geometry::Polygon(rings)
        }
        "" => return Err(WktError::Empty),
        other => return Err(WktError::Unsupported(other.to_string())),
    };
    parser.skip_whitespace();
    match parser.peek() {
        None => Ok(geometry),
        Some(found) => Err(WktError::Unexpected { found, offset: parser.pos }),
    }
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if !c.is_whitespace() {
                break;
            }
            self.pos += c.len_utf8();
        }
    }

    fn word(&mut self) -> &'a str {
        self.skip_whitespace();
        let start = self.pos;
        while let Some(c) = self.peek() {
            if !c.is_ascii_alphabetic() {
                break;
            }
            self.pos += 1;
        }
        &self.input[start..self.pos]
    }

    fn eat(&mut self, expected: char) -> bool {
        self.skip_whitespace();
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: char) -> Result<(), WktError> {
        if self.eat(expected) {
            return Ok(());
        }
        match self.peek() {
            Some(found) => Err(WktError::Unexpected { found, offset: self.pos }),
            None => Err(WktError::UnexpectedEnd),
        }
    }

    fn number(&mut self) -> Result<f64, WktError> {
        self.skip_whitespace();
        let start = self.pos;
        while let Some(c) = self.peek() {
            if !(c.is_ascii_digit() || matches!(c, '-' | '+' | '.' | 'e' | 'E')) {
                break;
            }
            self.pos += 1;
        }
        if start == self.pos {
            return match self.peek() {
                Some(_) => Err(WktError::InvalidNumber(start)),
                None => Err(WktError::UnexpectedEnd),
            };
        }
        self.input[start..self.pos]
            .parse()
            .map_err(|_| WktError::InvalidNumber(start))
    }

    fn coordinate(&mut self) -> Result<Coordinate, WktError> {
        let x = self.number()?;
        let y = self.number()?;
        // Z/M ordinates are dropped.
        while matches!(self.peek_non_space(), Some(c) if c.is_ascii_digit() || c == '-' || c == '.') {
            self.number()?;
        }
        Ok(Point::new(x, y))
    }

    fn peek_non_space(&mut self) -> Option<char> {
        self.skip_whitespace();
        self.peek()
    }

    fn coordinate_list(&mut self) -> Result<Vec<Coordinate>, WktError> {
        self.expect('(')?;
        let mut coords = vec![self.coordinate()?];
        while self.eat(',') {
            coords.push(self.coordinate()?);
        }
        self.expect(')')?;
        Ok(coords)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_kinds() {
        assert_eq!(encode(&Geometry::Point(Point::new(1.5, -2.0))).unwrap(), "POINT(1.5 -2)");
        let line = Geometry::LineString(vec![Point::new(0.0, 0.0), Point::new(1.0, 1.0)]);
        assert_eq!(encode(&line).unwrap(), "LINESTRING(0 0,1 1)");
        let polygon = Geometry::polygon(vec![Point::new(0.0, 0.0), Point::new(1.0, 0.0), Point::new(1.0, 1.0)]);
        assert_eq!(encode(&polygon).unwrap(), "POLYGON((0 0,1 0,1 1,0 0))");
    }

    #[test]
    fn test_circle_is_unsupported() {
        let circle = Geometry::Circle { center: Point::ZERO, radius: 1.0 };
        assert!(matches!(encode(&circle), Err(WktError::Unsupported(_))));
        assert!(matches!(decode("CIRCLE(0 0, 1)"), Err(WktError::Unsupported(_))));
    }

    #[test]
    fn test_decode_with_whitespace_and_case() {
        let geometry = decode("  polygon (( 0 0, 4 0 , 4 4, 0 0 ), (1 1, 2 1, 2 2, 1 1))").unwrap();
        let Geometry::Polygon(rings) = geometry else {
            panic!("expected polygon");
        };
        assert_eq!(rings.len(), 2);
        assert_eq!(rings[0][1], Point::new(4.0, 0.0));
    }

    #[test]
    fn test_decode_drops_z() {
        assert!(decode("POINT Z (1 2 3)").is_err());
        assert_eq!(decode("POINT(1 2 3)").unwrap(), Geometry::Point(Point::new(1.0, 2.0)));
    }

    #[test]
    fn test_decode_errors() {
        assert_eq!(decode(""), Err(WktError::Empty));
        assert_eq!(decode("POINT(1"), Err(WktError::UnexpectedEnd));
        assert!(matches!(decode("POINT(a b)"), Err(WktError::InvalidNumber(_))));
        assert!(matches!(decode("POINT(1 2) x"), Err(WktError::Unexpected { found: 'x', .. })));
    }
}
