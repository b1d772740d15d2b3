use arbor_store::{ArborStoreError, Cmp, Filter, NodeStore, TreeAttr};

/// Shift every persisted boundary at or beyond `pivot` by `delta`.
///
/// One bulk statement per boundary attribute, scoped by the store to the
/// node type's table. Must run inside the transaction of the structural
/// operation it supports, and exactly once per logical shift - the update is
/// additive and repeating it compounds.
pub async fn shift_boundaries<Data, Store>(
    store: &mut Store,
    pivot: i64,
    delta: i64,
) -> Result<(), ArborStoreError>
where
    Data: Clone + Send + Sync + 'static,
    Store: NodeStore<Data>,
{
    for attr in [TreeAttr::Left, TreeAttr::Right] {
        store
            .shift(attr, &Filter::all().with(attr, Cmp::Ge, pivot), delta)
            .await?;
    }

    Ok(())
}
