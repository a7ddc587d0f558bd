//! Core query type definitions.
//!
//! Defines [`Domain`] (term vs. spatial queries), [`Mode`] (one-way vs.
//! bidirectional), [`Point`] and [`Selector`] with their wire parsing, and
//! [`Dissociation`] (the computed result).

use serde::{Deserialize, Serialize};

use crate::query::error::QueryError;

/// Study identifier — the corpus keys studies numerically (PubMed-style ids).
pub type StudyId = i64;

/// Which annotation relation a query runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    /// Textual term annotations.
    Term,
    /// Reported 3-D activation coordinates.
    Spatial,
}

impl Domain {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Term => "term",
            Self::Spatial => "spatial",
        }
    }
}

impl std::fmt::Display for Domain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Domain {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "term" | "terms" => Ok(Self::Term),
            "spatial" | "locations" => Ok(Self::Spatial),
            _ => Err(format!("unknown domain: {s}")),
        }
    }
}

/// Whether to compute one difference or both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// `A \ B` only.
    OneWay,
    /// `A \ B` and `B \ A`, from one resolution of each selector.
    Both,
}

/// A 3-D coordinate in the corpus reference space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Euclidean distance to another point.
    pub fn distance(&self, other: &Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    /// Parse the underscore-joined wire encoding (`"x_y_z"`).
    ///
    /// Rejects inputs that do not split into exactly three finite numeric
    /// components.
    pub fn parse(raw: &str) -> Result<Self, QueryError> {
        let parts: Vec<&str> = raw.split('_').collect();
        if parts.len() != 3 {
            return Err(QueryError::MalformedSelector(format!(
                "expected three underscore-joined coordinates, got {} in {raw:?}",
                parts.len()
            )));
        }
        let mut components = [0.0f64; 3];
        for (slot, part) in components.iter_mut().zip(&parts) {
            let value: f64 = part.parse().map_err(|_| {
                QueryError::MalformedSelector(format!("non-numeric coordinate {part:?} in {raw:?}"))
            })?;
            if !value.is_finite() {
                return Err(QueryError::MalformedSelector(format!(
                    "non-finite coordinate {part:?} in {raw:?}"
                )));
            }
            *slot = value;
        }
        Ok(Point::new(components[0], components[1], components[2]))
    }
}

impl std::fmt::Display for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}_{}_{}", self.x, self.y, self.z)
    }
}

/// A user-supplied predicate identifying a set of studies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum Selector {
    /// Match by annotation term text.
    Term { text: String },
    /// Match by reported coordinate. `radius` overrides the configured
    /// neighborhood radius for this selector when present.
    Point {
        point: Point,
        radius: Option<f64>,
    },
}

impl Selector {
    /// Parse a raw selector string for the given domain.
    ///
    /// Term selectors reject empty or blank text; point selectors use the
    /// `x_y_z` wire encoding. Both fail with [`QueryError::MalformedSelector`]
    /// before any store access.
    pub fn parse(domain: Domain, raw: &str) -> Result<Self, QueryError> {
        match domain {
            Domain::Term => {
                if raw.trim().is_empty() {
                    return Err(QueryError::MalformedSelector("empty term".into()));
                }
                Ok(Selector::Term {
                    text: raw.to_string(),
                })
            }
            Domain::Spatial => Ok(Selector::Point {
                point: Point::parse(raw)?,
                radius: None,
            }),
        }
    }

    /// The domain this selector belongs to.
    pub fn domain(&self) -> Domain {
        match self {
            Selector::Term { .. } => Domain::Term,
            Selector::Point { .. } => Domain::Spatial,
        }
    }
}

impl std::fmt::Display for Selector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Selector::Term { text } => f.write_str(text),
            Selector::Point { point, .. } => point.fmt(f),
        }
    }
}

/// The computed dissociation: sorted, deduplicated study id sequences.
///
/// `forward` is `A \ B`; `reverse` is `B \ A` and present only in
/// [`Mode::Both`]. Both sequences are strictly ascending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dissociation {
    pub forward: Vec<StudyId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reverse: Option<Vec<StudyId>>,
}
