use serde::{Deserialize, Serialize};

use crate::Bounds;

/// Names one of the three tree attributes carried by every row.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TreeAttr {
    /// The preorder entry boundary
    Left,
    /// The preorder exit boundary
    Right,
    /// The depth from the root
    Level,
}

/// A comparison operator usable in a [`Filter`] condition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cmp {
    /// Strictly less than
    Lt,
    /// Less than or equal
    Le,
    /// Equal
    Eq,
    /// Greater than or equal
    Ge,
    /// Strictly greater than
    Gt,
}

impl Cmp {
    fn evaluate(&self, lhs: i64, rhs: i64) -> bool {
        match self {
            Cmp::Lt => lhs < rhs,
            Cmp::Le => lhs <= rhs,
            Cmp::Eq => lhs == rhs,
            Cmp::Ge => lhs >= rhs,
            Cmp::Gt => lhs > rhs,
        }
    }
}

/// A single attribute comparison within a [`Filter`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    /// The attribute being compared
    pub attr: TreeAttr,
    /// The comparison operator
    pub cmp: Cmp,
    /// The right-hand side of the comparison
    pub value: i64,
}

/// A conjunction of attribute comparisons over a row's [`Bounds`].
///
/// This is pure data: a backend translates it into whatever predicate form
/// its substrate understands (a SQL `WHERE` clause, an index scan, or the
/// plain in-memory evaluation performed by [`Filter::matches`]).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter(Vec<Condition>);

impl Filter {
    /// A [`Filter`] that matches every row.
    pub fn all() -> Self {
        Self::default()
    }

    /// Add a condition; the resulting filter matches only rows satisfying
    /// every condition.
    pub fn with(mut self, attr: TreeAttr, cmp: Cmp, value: i64) -> Self {
        self.0.push(Condition { attr, cmp, value });
        self
    }

    /// The conditions of this filter.
    pub fn conditions(&self) -> &[Condition] {
        &self.0
    }

    /// Evaluate this filter against a row's [`Bounds`].
    pub fn matches(&self, bounds: &Bounds) -> bool {
        self.0
            .iter()
            .all(|condition| condition.cmp.evaluate(bounds.get(condition.attr), condition.value))
    }
}

/// An ordering over rows by one tree attribute.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// The attribute to order by
    pub attr: TreeAttr,
    /// Whether to order from greatest to least
    pub descending: bool,
}

impl Order {
    /// Ascending order by the named attribute.
    pub fn asc(attr: TreeAttr) -> Self {
        Self {
            attr,
            descending: false,
        }
    }

    /// Descending order by the named attribute.
    pub fn desc(attr: TreeAttr) -> Self {
        Self {
            attr,
            descending: true,
        }
    }
}
