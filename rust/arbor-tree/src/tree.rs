use arbor_store::{Bounds, Cmp, Filter, NodeRecord, NodeStore, Order, RowId, TreeAttr};
use tracing::{debug, warn};

use crate::{
    ArborTreeError, Correction, DeletePlan, MovePlan, Node, Placement, Registry, SLOT_WIDTH,
    StructureError, Validate, mutator::shift_boundaries,
};

/// Configuration of a [`Tree`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TreeConfig {
    /// Allow more than one independent tree (a forest) in the same table.
    /// When off, creating a second root is rejected.
    pub many_roots: bool,
}

/// The tree operation engine: orchestrates structural mutations of a
/// nested-set encoded tree over a [`NodeStore`].
///
/// Every structural operation follows the same shape: validate
/// preconditions before anything touches storage, open (or join) a
/// transaction, apply the boundary arithmetic as bulk updates, commit, and
/// finally broadcast the same arithmetic to every live [`Node`] handle this
/// engine has produced - so objects loaded before the mutation do not go
/// stale. Any failure inside the transactional phase rolls the whole
/// operation back and re-raises; live handles are only corrected after a
/// successful commit.
///
/// Handles are produced by [`Tree::create`] and by the query accessors, and
/// are tracked in a [`Registry`] scoped to this engine.
pub struct Tree<Data, Store> {
    store: Store,
    registry: Registry<Data>,
    config: TreeConfig,
}

impl<Data, Store> Tree<Data, Store>
where
    Data: Validate + Clone + Send + Sync + 'static,
    Store: NodeStore<Data>,
{
    /// Create an engine over `store` in single-root mode.
    pub fn new(store: Store) -> Self {
        Self::with_config(store, TreeConfig::default())
    }

    /// Create an engine over `store` with the given configuration.
    pub fn with_config(store: Store, config: TreeConfig) -> Self {
        Self {
            store,
            registry: Registry::default(),
            config,
        }
    }

    /// The configuration of this engine.
    pub fn config(&self) -> &TreeConfig {
        &self.config
    }

    /// The registry of live handles produced by this engine.
    pub fn registry(&self) -> &Registry<Data> {
        &self.registry
    }

    /// The underlying [`NodeStore`].
    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Create a fresh, unpersisted node around `data` and register its
    /// handle. Persist it with [`Tree::save`] or one of the insertion
    /// operations.
    pub fn create(&self, data: Data) -> Node<Data> {
        let node = Node::new(data);
        self.registry.register(node.state());
        node
    }

    /// Persist `node`: a new node becomes a root (see [`TreeConfig`]); an
    /// existing node has its payload updated in place.
    ///
    /// Tree attributes are never written through this path - position is
    /// changed exclusively by the insertion and move operations.
    pub async fn save(&mut self, node: &Node<Data>) -> Result<(), ArborTreeError> {
        if node.is_deleted() {
            return Err(StructureError::NodeDeleted.into());
        }

        let data = node.data();
        data.validate().map_err(ArborTreeError::Validation)?;

        match node.id() {
            None => self.make_root(node, data).await,
            Some(id) => {
                self.store.update_data(id, data).await?;
                Ok(())
            }
        }
    }

    /// Insert `node` as the last child of `target`.
    pub async fn append_to(
        &mut self,
        node: &Node<Data>,
        target: &Node<Data>,
    ) -> Result<(), ArborTreeError> {
        self.insert_node(node, target, Placement::LastChildOf).await
    }

    /// Insert `node` as the first child of `target`.
    pub async fn prepend_to(
        &mut self,
        node: &Node<Data>,
        target: &Node<Data>,
    ) -> Result<(), ArborTreeError> {
        self.insert_node(node, target, Placement::FirstChildOf)
            .await
    }

    /// Insert `node` as the previous sibling of `target`.
    pub async fn insert_before(
        &mut self,
        node: &Node<Data>,
        target: &Node<Data>,
    ) -> Result<(), ArborTreeError> {
        self.insert_node(node, target, Placement::Before).await
    }

    /// Insert `node` as the next sibling of `target`.
    pub async fn insert_after(
        &mut self,
        node: &Node<Data>,
        target: &Node<Data>,
    ) -> Result<(), ArborTreeError> {
        self.insert_node(node, target, Placement::After).await
    }

    /// Relocate `node`'s subtree to be the first child of `target`.
    pub async fn move_as_first(
        &mut self,
        node: &Node<Data>,
        target: &Node<Data>,
    ) -> Result<(), ArborTreeError> {
        self.move_node(node, target, Placement::FirstChildOf).await
    }

    /// Relocate `node`'s subtree to be the last child of `target`.
    pub async fn move_as_last(
        &mut self,
        node: &Node<Data>,
        target: &Node<Data>,
    ) -> Result<(), ArborTreeError> {
        self.move_node(node, target, Placement::LastChildOf).await
    }

    /// Relocate `node`'s subtree to be the previous sibling of `target`.
    pub async fn move_before(
        &mut self,
        node: &Node<Data>,
        target: &Node<Data>,
    ) -> Result<(), ArborTreeError> {
        self.move_node(node, target, Placement::Before).await
    }

    /// Relocate `node`'s subtree to be the next sibling of `target`.
    pub async fn move_after(
        &mut self,
        node: &Node<Data>,
        target: &Node<Data>,
    ) -> Result<(), ArborTreeError> {
        self.move_node(node, target, Placement::After).await
    }

    /// Relocate `node`'s subtree to become a new root, placed after the
    /// last existing root. Requires multi-root mode.
    pub async fn move_as_root(&mut self, node: &Node<Data>) -> Result<(), ArborTreeError> {
        if !self.config.many_roots {
            return Err(StructureError::NotManyRoots.into());
        }
        if node.is_new() {
            return Err(StructureError::NodeIsNew.into());
        }
        if node.is_deleted() {
            return Err(StructureError::NodeDeleted.into());
        }
        if node.is_root() {
            return Err(StructureError::AlreadyRoot.into());
        }

        self.store.begin().await?;

        let last_root = match self
            .store
            .select(&Filter::all(), Some(Order::desc(TreeAttr::Right)))
            .await
        {
            Ok(rows) => rows.into_iter().next(),
            Err(error) => {
                self.abort().await;
                return Err(error.into());
            }
        };

        let Some(record) = last_root else {
            self.abort().await;
            return Err(StructureError::NoRoots.into());
        };

        let target = self.adopt(record);
        let plan = match self.plan_move(node, &target, Placement::After) {
            Ok(plan) => plan,
            Err(error) => {
                self.abort().await;
                return Err(error);
            }
        };

        match self.try_move(&plan).await {
            Ok(()) => {
                self.finish().await?;
                self.registry.correct(&Correction::Moved(plan), None);
                Ok(())
            }
            Err(error) => {
                self.abort().await;
                Err(error)
            }
        }
    }

    /// Remove `node` and all of its descendants, then close the boundary
    /// gap the subtree occupied. Live handles inside the removed region are
    /// marked deleted; handles beyond it are shifted back.
    pub async fn delete(&mut self, node: &Node<Data>) -> Result<(), ArborTreeError> {
        if node.is_new() {
            return Err(StructureError::NodeIsNew.into());
        }
        if node.is_deleted() {
            return Err(StructureError::NodeDeleted.into());
        }
        let id = node.id().ok_or(StructureError::Unpersisted)?;
        let bounds = self.bounds_of(node)?;
        let plan = DeletePlan::new(&bounds);

        debug!(left = bounds.left, right = bounds.right, "deleting subtree");

        self.store.begin().await?;
        match self.try_delete(id, &bounds, &plan).await {
            Ok(()) => {
                self.finish().await?;
                self.registry.correct(&Correction::Deleted(plan), None);
                Ok(())
            }
            Err(error) => {
                self.abort().await;
                Err(error)
            }
        }
    }

    /// The descendants of `node` in preorder, optionally limited to `depth`
    /// generations.
    pub async fn descendants(
        &self,
        node: &Node<Data>,
        depth: Option<i64>,
    ) -> Result<Vec<Node<Data>>, ArborTreeError> {
        let bounds = self.bounds_of(node)?;
        let mut filter = Filter::all()
            .with(TreeAttr::Left, Cmp::Gt, bounds.left)
            .with(TreeAttr::Right, Cmp::Lt, bounds.right);
        if let Some(depth) = depth {
            filter = filter.with(TreeAttr::Level, Cmp::Le, bounds.level + depth);
        }

        let rows = self
            .store
            .select(&filter, Some(Order::asc(TreeAttr::Left)))
            .await?;
        Ok(rows.into_iter().map(|record| self.adopt(record)).collect())
    }

    /// The direct children of `node`, in sibling order.
    pub async fn children(&self, node: &Node<Data>) -> Result<Vec<Node<Data>>, ArborTreeError> {
        self.descendants(node, Some(1)).await
    }

    /// The ancestors of `node` from the root downward, optionally limited
    /// to the nearest `depth` generations.
    pub async fn ancestors(
        &self,
        node: &Node<Data>,
        depth: Option<i64>,
    ) -> Result<Vec<Node<Data>>, ArborTreeError> {
        let bounds = self.bounds_of(node)?;
        let mut filter = Filter::all()
            .with(TreeAttr::Left, Cmp::Lt, bounds.left)
            .with(TreeAttr::Right, Cmp::Gt, bounds.right);
        if let Some(depth) = depth {
            filter = filter.with(TreeAttr::Level, Cmp::Ge, bounds.level - depth);
        }

        let rows = self
            .store
            .select(&filter, Some(Order::asc(TreeAttr::Left)))
            .await?;
        Ok(rows.into_iter().map(|record| self.adopt(record)).collect())
    }

    /// The parent of `node`: the nearest ancestor, i.e. the one with the
    /// smallest exit boundary.
    pub async fn parent(&self, node: &Node<Data>) -> Result<Option<Node<Data>>, ArborTreeError> {
        let bounds = self.bounds_of(node)?;
        let filter = Filter::all()
            .with(TreeAttr::Left, Cmp::Lt, bounds.left)
            .with(TreeAttr::Right, Cmp::Gt, bounds.right);

        let rows = self
            .store
            .select(&filter, Some(Order::asc(TreeAttr::Right)))
            .await?;
        Ok(rows.into_iter().next().map(|record| self.adopt(record)))
    }

    /// The previous sibling of `node`, whose exit boundary abuts this
    /// node's entry boundary.
    pub async fn prev_sibling(
        &self,
        node: &Node<Data>,
    ) -> Result<Option<Node<Data>>, ArborTreeError> {
        let bounds = self.bounds_of(node)?;
        let filter = Filter::all().with(TreeAttr::Right, Cmp::Eq, bounds.left - 1);

        let rows = self.store.select(&filter, None).await?;
        Ok(rows.into_iter().next().map(|record| self.adopt(record)))
    }

    /// The next sibling of `node`, whose entry boundary abuts this node's
    /// exit boundary.
    pub async fn next_sibling(
        &self,
        node: &Node<Data>,
    ) -> Result<Option<Node<Data>>, ArborTreeError> {
        let bounds = self.bounds_of(node)?;
        let filter = Filter::all().with(TreeAttr::Left, Cmp::Eq, bounds.right + 1);

        let rows = self.store.select(&filter, None).await?;
        Ok(rows.into_iter().next().map(|record| self.adopt(record)))
    }

    fn bounds_of(&self, node: &Node<Data>) -> Result<Bounds, ArborTreeError> {
        node.bounds()
            .ok_or_else(|| StructureError::Unpersisted.into())
    }

    /// Wrap a loaded row into a registered live handle.
    fn adopt(&self, record: NodeRecord<Data>) -> Node<Data> {
        let node = Node::new(record.data);
        {
            let mut state = node.state().write();
            state.id = Some(record.id);
            state.bounds = Some(record.bounds);
        }
        self.registry.register(node.state());
        node
    }

    async fn make_root(
        &mut self,
        node: &Node<Data>,
        data: Data,
    ) -> Result<(), ArborTreeError> {
        self.store.begin().await?;
        match self.try_make_root(data).await {
            Ok((id, bounds)) => {
                self.finish().await?;
                let mut state = node.state().write();
                state.id = Some(id);
                state.bounds = Some(bounds);
                // A fresh root lands after every existing boundary; no other
                // row moved, so there is nothing to correct.
                Ok(())
            }
            Err(error) => {
                self.abort().await;
                Err(error)
            }
        }
    }

    async fn try_make_root(&mut self, data: Data) -> Result<(RowId, Bounds), ArborTreeError> {
        let last = self
            .store
            .select(&Filter::all(), Some(Order::desc(TreeAttr::Right)))
            .await?
            .into_iter()
            .next();

        if !self.config.many_roots && last.is_some() {
            return Err(StructureError::RootExists.into());
        }

        let bounds = crate::root_bounds(last.map(|record| record.bounds.right));
        debug!(left = bounds.left, right = bounds.right, "creating root");
        let id = self.store.insert(bounds, data).await?;
        Ok((id, bounds))
    }

    async fn insert_node(
        &mut self,
        node: &Node<Data>,
        target: &Node<Data>,
        placement: Placement,
    ) -> Result<(), ArborTreeError> {
        if !node.is_new() {
            return Err(StructureError::NodeNotNew.into());
        }
        if node.is_deleted() {
            return Err(StructureError::NodeDeleted.into());
        }
        if target.is_deleted() {
            return Err(StructureError::TargetDeleted.into());
        }
        if node.same_node(target) {
            return Err(StructureError::TargetIsSelf.into());
        }
        let target_bounds = self.bounds_of(target)?;

        let data = node.data();
        data.validate().map_err(ArborTreeError::Validation)?;

        let key = placement.insertion_key(&target_bounds);
        let level = target_bounds.level + placement.level_up();
        debug!(key, level, "inserting node");

        self.store.begin().await?;
        match self.try_insert(key, level, data).await {
            Ok(id) => {
                self.finish().await?;
                {
                    let mut state = node.state().write();
                    state.id = Some(id);
                    state.bounds = Some(Bounds::new(key, key + 1, level));
                }
                self.registry
                    .correct(&Correction::Inserted { key }, Some(node.state()));
                Ok(())
            }
            Err(error) => {
                self.abort().await;
                Err(error)
            }
        }
    }

    async fn try_insert(
        &mut self,
        key: i64,
        level: i64,
        data: Data,
    ) -> Result<RowId, ArborTreeError> {
        shift_boundaries(&mut self.store, key, SLOT_WIDTH).await?;
        Ok(self
            .store
            .insert(Bounds::new(key, key + 1, level), data)
            .await?)
    }

    /// Check every relocation precondition and fix the plan's parameters.
    /// Nothing here touches storage.
    fn plan_move(
        &self,
        node: &Node<Data>,
        target: &Node<Data>,
        placement: Placement,
    ) -> Result<MovePlan, ArborTreeError> {
        if node.is_new() {
            return Err(StructureError::NodeIsNew.into());
        }
        if node.is_deleted() {
            return Err(StructureError::NodeDeleted.into());
        }
        if target.is_deleted() {
            return Err(StructureError::TargetDeleted.into());
        }
        if node.same_node(target) {
            return Err(StructureError::TargetIsSelf.into());
        }
        if target.is_descendant_of(node) {
            return Err(StructureError::TargetIsDescendant.into());
        }
        let node_bounds = self.bounds_of(node)?;
        let target_bounds = self.bounds_of(target)?;

        let key = placement.insertion_key(&target_bounds);
        let plan = MovePlan::new(key, &node_bounds, target_bounds.level, placement.level_up());
        debug!(
            key,
            width = plan.width,
            level_delta = plan.level_delta,
            "moving subtree"
        );
        Ok(plan)
    }

    async fn move_node(
        &mut self,
        node: &Node<Data>,
        target: &Node<Data>,
        placement: Placement,
    ) -> Result<(), ArborTreeError> {
        let plan = self.plan_move(node, target, placement)?;

        self.store.begin().await?;
        match self.try_move(&plan).await {
            Ok(()) => {
                self.finish().await?;
                self.registry.correct(&Correction::Moved(plan), None);
                Ok(())
            }
            Err(error) => {
                self.abort().await;
                Err(error)
            }
        }
    }

    async fn try_move(&mut self, plan: &MovePlan) -> Result<(), ArborTreeError> {
        // Open a gap of the subtree's width at the destination.
        shift_boundaries(&mut self.store, plan.key, plan.width).await?;

        // Depth change for every row of the (now possibly self-shifted)
        // subtree.
        self.store
            .shift(
                TreeAttr::Level,
                &Filter::all()
                    .with(TreeAttr::Left, Cmp::Ge, plan.left)
                    .with(TreeAttr::Right, Cmp::Le, plan.right),
                plan.level_delta,
            )
            .await?;

        // Translate the subtree's boundaries into the gap.
        for attr in [TreeAttr::Left, TreeAttr::Right] {
            self.store
                .shift(
                    attr,
                    &Filter::all()
                        .with(attr, Cmp::Ge, plan.left)
                        .with(attr, Cmp::Le, plan.right),
                    plan.translation,
                )
                .await?;
        }

        // Close the hole the subtree vacated.
        shift_boundaries(&mut self.store, plan.close_pivot(), -plan.width).await?;

        Ok(())
    }

    async fn try_delete(
        &mut self,
        id: RowId,
        bounds: &Bounds,
        plan: &DeletePlan,
    ) -> Result<(), ArborTreeError> {
        if bounds.is_leaf() {
            self.store.delete(id).await?;
        } else {
            self.store
                .delete_where(
                    &Filter::all()
                        .with(TreeAttr::Left, Cmp::Ge, bounds.left)
                        .with(TreeAttr::Right, Cmp::Le, bounds.right),
                )
                .await?;
        }

        shift_boundaries(&mut self.store, plan.close_pivot(), plan.close_delta()).await?;
        Ok(())
    }

    /// Commit the current transaction level, rolling back if the commit
    /// itself fails.
    async fn finish(&mut self) -> Result<(), ArborTreeError> {
        if let Err(error) = self.store.commit().await {
            self.abort().await;
            return Err(error.into());
        }
        Ok(())
    }

    async fn abort(&mut self) {
        if let Err(error) = self.store.rollback().await {
            warn!(%error, "rollback failed");
        }
    }
}
