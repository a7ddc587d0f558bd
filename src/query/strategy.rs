//! Matching strategies — pure predicates with no I/O.
//!
//! Earlier revisions of this system hard-coded one comparison rule per
//! deployment; here the rule is a configuration value. Each strategy turns a
//! raw query into a membership condition the resolver executes: a SQL
//! prefilter narrows candidates via the store's indexes, and the pure
//! `matches` predicate is re-applied to every projected row as the final
//! authority, so SQL and Rust semantics cannot drift apart.
//!
//! Case folding is ASCII-only on both sides: SQLite's `LOWER()` folds only
//! ASCII, and the Rust predicates use `eq_ignore_ascii_case` /
//! `to_ascii_lowercase` to match it.

use crate::query::types::Point;

/// Default neighborhood radius in mm for spatial matching.
pub const DEFAULT_RADIUS: f64 = 2.0;

/// Default tolerance for epsilon-exact coordinate comparison. Raw float
/// equality produces false negatives for coordinates that round-trip through
/// text or different storage engines.
pub const DEFAULT_EPSILON: f64 = 1e-6;

/// Comparison rule for term selectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TermMatch {
    /// Byte-for-byte equality.
    Exact,
    /// Equality after ASCII case folding.
    ExactCaseInsensitive,
    /// Stored term contains the query as a substring, case-insensitively.
    Substring,
}

impl TermMatch {
    /// Whether a stored term satisfies the query under this rule.
    pub fn matches(&self, stored: &str, query: &str) -> bool {
        match self {
            Self::Exact => stored == query,
            Self::ExactCaseInsensitive => stored.eq_ignore_ascii_case(query),
            Self::Substring => stored
                .to_ascii_lowercase()
                .contains(&query.to_ascii_lowercase()),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::ExactCaseInsensitive => "exact_ci",
            Self::Substring => "substring",
        }
    }
}

impl std::fmt::Display for TermMatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TermMatch {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "exact" => Ok(Self::Exact),
            "exact_ci" => Ok(Self::ExactCaseInsensitive),
            "substring" => Ok(Self::Substring),
            _ => Err(format!("unknown term match strategy: {s}")),
        }
    }
}

/// Comparison rule for spatial selectors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SpatialMatch {
    /// All three coordinates within `epsilon` of the query point.
    Exact { epsilon: f64 },
    /// Euclidean distance to the query point at most `radius`.
    Radius { radius: f64 },
}

impl SpatialMatch {
    /// Whether a stored coordinate satisfies the query point under this rule.
    pub fn matches(&self, stored: &Point, query: &Point) -> bool {
        match self {
            Self::Exact { epsilon } => {
                (stored.x - query.x).abs() <= *epsilon
                    && (stored.y - query.y).abs() <= *epsilon
                    && (stored.z - query.z).abs() <= *epsilon
            }
            Self::Radius { radius } => stored.distance(query) <= *radius,
        }
    }

    /// Half-width of the axis-aligned bounding box a SQL prefilter can use.
    /// Every point this strategy accepts lies inside the box.
    pub fn bounding_half_width(&self) -> f64 {
        match self {
            Self::Exact { epsilon } => *epsilon,
            Self::Radius { radius } => *radius,
        }
    }
}

impl std::str::FromStr for SpatialMatch {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "exact" => Ok(Self::Exact {
                epsilon: DEFAULT_EPSILON,
            }),
            "radius" => Ok(Self::Radius {
                radius: DEFAULT_RADIUS,
            }),
            _ => Err(format!("unknown spatial match strategy: {s}")),
        }
    }
}

/// The full matching configuration a dissociation request runs under.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchConfig {
    pub term: TermMatch,
    pub spatial: SpatialMatch,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            term: TermMatch::ExactCaseInsensitive,
            spatial: SpatialMatch::Radius {
                radius: DEFAULT_RADIUS,
            },
        }
    }
}
