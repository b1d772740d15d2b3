use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::TreeAttr;

/// Store-assigned identifier of a persisted row.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct RowId(u64);

impl RowId {
    /// Construct a [`RowId`] from its raw value.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// The raw value of this [`RowId`].
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl Display for RowId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The three integer attributes that encode a row's position in its tree.
///
/// `left` and `right` are the preorder entry and exit boundaries; `level` is
/// the depth from the root of the tree (the root itself is level 1). For any
/// well-formed row `left < right`, and a row is a leaf exactly when
/// `right - left == 1`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bounds {
    /// Preorder entry boundary
    pub left: i64,
    /// Preorder exit boundary
    pub right: i64,
    /// Depth from the root of the tree (root = 1)
    pub level: i64,
}

impl Bounds {
    /// Construct [`Bounds`] from their raw values.
    pub fn new(left: i64, right: i64, level: i64) -> Self {
        Self { left, right, level }
    }

    /// The span of boundary values occupied by this row and all of its
    /// descendants.
    pub fn width(&self) -> i64 {
        self.right - self.left + 1
    }

    /// Whether this row has no descendants.
    pub fn is_leaf(&self) -> bool {
        self.right - self.left == 1
    }

    /// Whether these bounds lie strictly inside `other`, which is the
    /// nested-set encoding of "descendant of".
    pub fn is_inside(&self, other: &Bounds) -> bool {
        self.left > other.left && self.right < other.right
    }

    /// Read the named attribute.
    pub fn get(&self, attr: TreeAttr) -> i64 {
        match attr {
            TreeAttr::Left => self.left,
            TreeAttr::Right => self.right,
            TreeAttr::Level => self.level,
        }
    }

    /// Mutable access to the named attribute.
    pub fn get_mut(&mut self, attr: TreeAttr) -> &mut i64 {
        match attr {
            TreeAttr::Left => &mut self.left,
            TreeAttr::Right => &mut self.right,
            TreeAttr::Level => &mut self.level,
        }
    }
}

/// A persisted row: an opaque payload joined with its tree [`Bounds`] and the
/// store-assigned [`RowId`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRecord<Data> {
    /// The identifier assigned by the store at insertion time
    pub id: RowId,
    /// The tree position of this row
    pub bounds: Bounds,
    /// The row's own payload
    pub data: Data,
}
