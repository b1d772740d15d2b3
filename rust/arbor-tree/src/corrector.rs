use crate::{DeletePlan, MovePlan, NodeState, SLOT_WIDTH};

/// The parameters of a just-committed structural mutation, replayed against
/// live node handles.
///
/// Storage was already renumbered when a [`Correction`] is built; any node
/// object loaded before the mutation now holds stale boundaries. Applying
/// the correction reproduces, field by field and in the same order, the
/// arithmetic the bulk updates performed - so memory converges on storage
/// without a reload. The rule is pure data; it carries no reference to the
/// objects it will be applied to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Correction {
    /// A 2-wide slot was opened at `key` and a row inserted into it
    Inserted {
        /// The boundary value at which the slot opened
        key: i64,
    },
    /// The subtree spanning the given plan's region was removed
    Deleted(DeletePlan),
    /// A subtree was relocated per the given plan
    Moved(MovePlan),
}

impl Correction {
    /// Apply this correction to one live node's state.
    ///
    /// Unpersisted and already-deleted nodes are left untouched. A node can
    /// match several rules (for a move: shifted by the gap opening, then
    /// translated into it, then shifted back as the hole closes); they are
    /// evaluated sequentially against the values the earlier rules produced,
    /// mirroring the persisted update ordering exactly.
    pub(crate) fn apply<Data>(&self, state: &mut NodeState<Data>) {
        if state.id.is_none() || state.deleted {
            return;
        }
        let Some(bounds) = state.bounds.as_mut() else {
            return;
        };

        match *self {
            Correction::Inserted { key } => {
                if bounds.left >= key {
                    bounds.left += SLOT_WIDTH;
                }
                if bounds.right >= key {
                    bounds.right += SLOT_WIDTH;
                }
            }
            Correction::Deleted(plan) => {
                if bounds.left >= plan.left && bounds.right <= plan.right {
                    state.deleted = true;
                    return;
                }
                let pivot = plan.close_pivot();
                let delta = plan.close_delta();
                if bounds.left >= pivot {
                    bounds.left += delta;
                }
                if bounds.right >= pivot {
                    bounds.right += delta;
                }
            }
            Correction::Moved(plan) => {
                let MovePlan {
                    key,
                    width,
                    level_delta,
                    left,
                    right,
                    translation,
                } = plan;

                if bounds.left >= key {
                    bounds.left += width;
                }
                if bounds.right >= key {
                    bounds.right += width;
                }
                if bounds.left >= left && bounds.right <= right {
                    bounds.level += level_delta;
                }
                if bounds.left >= left && bounds.left <= right {
                    bounds.left += translation;
                }
                if bounds.right >= left && bounds.right <= right {
                    bounds.right += translation;
                }
                if bounds.left >= right + 1 {
                    bounds.left -= width;
                }
                if bounds.right >= right + 1 {
                    bounds.right -= width;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use arbor_store::{Bounds, RowId};

    use crate::{Correction, DeletePlan, MovePlan, NodeState};

    fn state(id: u64, left: i64, right: i64, level: i64) -> NodeState<()> {
        NodeState {
            id: Some(RowId::new(id)),
            bounds: Some(Bounds::new(left, right, level)),
            deleted: false,
            data: (),
        }
    }

    fn bounds(state: &NodeState<()>) -> (i64, i64, i64) {
        let bounds = state.bounds.unwrap();
        (bounds.left, bounds.right, bounds.level)
    }

    #[test]
    fn it_widens_ancestors_after_an_insert() {
        // Root (1,4) with child (2,3); a second child lands at key 4.
        let mut root = state(1, 1, 4, 1);
        let mut sibling = state(2, 2, 3, 2);

        let correction = Correction::Inserted { key: 4 };
        correction.apply(&mut root);
        correction.apply(&mut sibling);

        assert_eq!(bounds(&root), (1, 6, 1));
        assert_eq!(bounds(&sibling), (2, 3, 2));
    }

    #[test]
    fn it_skips_new_and_deleted_nodes() {
        let mut fresh = NodeState {
            id: None,
            bounds: None,
            deleted: false,
            data: (),
        };
        let mut gone = state(3, 5, 6, 2);
        gone.deleted = true;

        let correction = Correction::Inserted { key: 1 };
        correction.apply(&mut fresh);
        correction.apply(&mut gone);

        assert!(fresh.bounds.is_none());
        assert_eq!(bounds(&gone), (5, 6, 2));
    }

    #[test]
    fn it_marks_the_removed_region_deleted_and_closes_the_gap() {
        // Root (1,6) with children (2,3) and (4,5); delete the first child.
        let mut root = state(1, 1, 6, 1);
        let mut first = state(2, 2, 3, 2);
        let mut second = state(3, 4, 5, 2);

        let correction = Correction::Deleted(DeletePlan::new(&Bounds::new(2, 3, 2)));
        correction.apply(&mut root);
        correction.apply(&mut first);
        correction.apply(&mut second);

        assert_eq!(bounds(&root), (1, 4, 1));
        assert!(first.deleted);
        assert_eq!(bounds(&first), (2, 3, 2));
        assert_eq!(bounds(&second), (2, 3, 2));
    }

    #[test]
    fn it_replays_a_forward_move() {
        // Root (1,8) with children A (2,3), B (4,5), C (6,7); move A after C
        // (key 8). Every handle, including A's own, converges on storage.
        let plan = MovePlan::new(8, &Bounds::new(2, 3, 2), 1, 1);
        let correction = Correction::Moved(plan);

        let mut root = state(1, 1, 8, 1);
        let mut a = state(2, 2, 3, 2);
        let mut b = state(3, 4, 5, 2);
        let mut c = state(4, 6, 7, 2);

        for state in [&mut root, &mut a, &mut b, &mut c] {
            correction.apply(state);
        }

        assert_eq!(bounds(&root), (1, 8, 1));
        assert_eq!(bounds(&a), (6, 7, 2));
        assert_eq!(bounds(&b), (2, 3, 2));
        assert_eq!(bounds(&c), (4, 5, 2));
    }

    #[test]
    fn it_replays_a_backward_move_with_the_self_shift() {
        // Root (1,8) with children A (2,3), B (4,5), C (6,7); move C before
        // A (key 2). The gap opens behind C, so the plan's working range is
        // self-shifted first.
        let plan = MovePlan::new(2, &Bounds::new(6, 7, 2), 1, 1);
        let correction = Correction::Moved(plan);

        let mut root = state(1, 1, 8, 1);
        let mut a = state(2, 2, 3, 2);
        let mut b = state(3, 4, 5, 2);
        let mut c = state(4, 6, 7, 2);

        for state in [&mut root, &mut a, &mut b, &mut c] {
            correction.apply(state);
        }

        assert_eq!(bounds(&root), (1, 8, 1));
        assert_eq!(bounds(&a), (4, 5, 2));
        assert_eq!(bounds(&b), (6, 7, 2));
        assert_eq!(bounds(&c), (2, 3, 2));
    }

    #[test]
    fn it_reparents_with_a_level_change() {
        // Root (1,8) with children A (2,3), B (4,7), and grandchild B1
        // (5,6); move A as last child of B (key 7, one level down).
        let plan = MovePlan::new(7, &Bounds::new(2, 3, 2), 2, 1);
        let correction = Correction::Moved(plan);

        let mut root = state(1, 1, 8, 1);
        let mut a = state(2, 2, 3, 2);
        let mut b = state(3, 4, 7, 2);
        let mut b1 = state(4, 5, 6, 3);

        for state in [&mut root, &mut a, &mut b, &mut b1] {
            correction.apply(state);
        }

        assert_eq!(bounds(&root), (1, 8, 1));
        assert_eq!(bounds(&b), (2, 7, 2));
        assert_eq!(bounds(&b1), (3, 4, 3));
        assert_eq!(bounds(&a), (5, 6, 3));
    }
}
