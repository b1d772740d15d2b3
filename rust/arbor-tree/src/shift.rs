//! Pure boundary arithmetic for the nested-set encoding.
//!
//! Everything here is side-effect free. The single primitive is "every
//! boundary value at or beyond a pivot key moves by a signed delta"; the
//! types below compute the pivots and deltas for inserting, relocating and
//! removing subtrees. The operation engine applies them to storage and the
//! corrector replays the identical arithmetic against live node handles.

use arbor_store::Bounds;

/// The width of the boundary slot reserved for a freshly inserted node.
pub const SLOT_WIDTH: i64 = 2;

/// Where a node lands relative to a target node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Placement {
    /// First child of the target
    FirstChildOf,
    /// Last child of the target
    LastChildOf,
    /// Previous sibling of the target
    Before,
    /// Next sibling of the target
    After,
}

impl Placement {
    /// The boundary value at which the insertion slot (or move gap) opens.
    pub fn insertion_key(&self, target: &Bounds) -> i64 {
        match self {
            Placement::FirstChildOf => target.left + 1,
            Placement::LastChildOf => target.right,
            Placement::Before => target.left,
            Placement::After => target.right + 1,
        }
    }

    /// How much deeper than the target the placed node sits.
    pub fn level_up(&self) -> i64 {
        match self {
            Placement::FirstChildOf | Placement::LastChildOf => 1,
            Placement::Before | Placement::After => 0,
        }
    }
}

/// The bounds of a fresh root, placed after the last existing root (if any).
pub fn root_bounds(last_root_right: Option<i64>) -> Bounds {
    match last_root_right {
        Some(right) => Bounds::new(right + 1, right + 2, 1),
        None => Bounds::new(1, 2, 1),
    }
}

/// Every parameter of a subtree relocation, fixed up front.
///
/// The relocation proceeds in five steps, all derived from this plan:
///
/// 1. open a gap of [`width`](MovePlan::width) at [`key`](MovePlan::key);
/// 2. if the gap opened at or before the subtree, the subtree itself moved
///    with it - [`left`](MovePlan::left)/[`right`](MovePlan::right) are the
///    working range with that conditional shift already applied;
/// 3. add [`level_delta`](MovePlan::level_delta) to every row within the
///    working range;
/// 4. translate every boundary within the working range by
///    [`translation`](MovePlan::translation), landing the subtree in the gap;
/// 5. close the original hole: shift everything at or beyond
///    [`close_pivot`](MovePlan::close_pivot) back by `width`.
///
/// The ordering is load-bearing; reordering the steps corrupts the encoding.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MovePlan {
    /// The boundary value at which the destination gap opens
    pub key: i64,
    /// The span of the moving subtree, `right - left + 1`
    pub width: i64,
    /// The change in depth for every row of the moving subtree
    pub level_delta: i64,
    /// The subtree's entry boundary after the gap-open shift
    pub left: i64,
    /// The subtree's exit boundary after the gap-open shift
    pub right: i64,
    /// Distance from the working range to the destination gap
    pub translation: i64,
}

impl MovePlan {
    /// Plan the relocation of the subtree at `node` to the slot at `key`,
    /// `level_up` levels below a target currently at `target_level`.
    pub fn new(key: i64, node: &Bounds, target_level: i64, level_up: i64) -> Self {
        let width = node.width();
        let level_delta = target_level - node.level + level_up;

        let (left, right) = if node.left >= key {
            (node.left + width, node.right + width)
        } else {
            (node.left, node.right)
        };

        Self {
            key,
            width,
            level_delta,
            left,
            right,
            translation: key - left,
        }
    }

    /// The pivot at which the vacated hole closes.
    pub fn close_pivot(&self) -> i64 {
        self.right + 1
    }
}

/// The parameters of a subtree removal: the deleted region and the shift
/// that closes the gap it leaves behind.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DeletePlan {
    /// Entry boundary of the removed subtree
    pub left: i64,
    /// Exit boundary of the removed subtree
    pub right: i64,
}

impl DeletePlan {
    /// Plan the removal of the subtree at `node`.
    pub fn new(node: &Bounds) -> Self {
        Self {
            left: node.left,
            right: node.right,
        }
    }

    /// The pivot at which the gap-closing shift applies.
    pub fn close_pivot(&self) -> i64 {
        self.right + 1
    }

    /// The (negative) delta that closes the gap, `-(width)`.
    pub fn close_delta(&self) -> i64 {
        self.left - self.right - 1
    }
}
