#![warn(missing_docs)]

//! This crate contains the row storage interface consumed by the nested-set
//! tree engine in `arbor-tree`, along with an in-memory reference backend.
//!
//! A [`NodeStore`] persists flat rows of tree-encoded records: each row
//! carries a `left`/`right`/`level` triple ([`Bounds`]) next to an opaque
//! payload. The trait is deliberately narrow: range-filtered reads, bulk
//! additive updates, bulk deletes, single-row create/delete and reentrant
//! transactions. Anything richer (query planning, indexing, replication)
//! belongs to a concrete backend.
//!
//! ```rust
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! use arbor_store::{Bounds, Cmp, Filter, MemoryNodeStore, NodeStore, TreeAttr};
//!
//! let mut store = MemoryNodeStore::<String>::default();
//!
//! let root = store.insert(Bounds::new(1, 2, 1), "root".into()).await?;
//!
//! // Open a 2-wide slot at key 2, then insert a child into it.
//! store
//!     .shift(TreeAttr::Right, &Filter::all().with(TreeAttr::Right, Cmp::Ge, 2), 2)
//!     .await?;
//! store.insert(Bounds::new(2, 3, 2), "child".into()).await?;
//!
//! let rows = store.select(&Filter::all(), None).await?;
//! assert_eq!(rows.len(), 2);
//! # let _ = root;
//! # Ok(())
//! # }
//! ```

mod error;
pub use error::*;

mod filter;
pub use filter::*;

mod record;
pub use record::*;

mod store;
pub use store::*;

mod memory;
pub use memory::*;
