#![warn(missing_docs)]

//! This crate maintains hierarchical trees stored in a flat relational
//! table using the nested set encoding (also known as modified preorder
//! tree traversal): every row carries a `left` and `right` preorder
//! boundary and a depth `level`, so ancestor, descendant and sibling
//! queries reduce to integer range comparisons with no recursive joins.
//! The price is that every structural mutation - insert, move, delete -
//! renumbers many rows at once; computing and applying that renumbering,
//! and keeping already-loaded node objects consistent with it, is what
//! this crate does.
//!
//! Rows live behind the [`arbor_store::NodeStore`] collaborator; the
//! [`Tree`] engine turns each structural operation into a handful of bulk
//! boundary shifts inside one transaction, and after commit replays the
//! identical arithmetic against every live [`Node`] handle it has handed
//! out.
//!
//! ```rust
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! use arbor_store::MemoryNodeStore;
//! use arbor_tree::{Tree, Validate};
//!
//! #[derive(Clone)]
//! struct Page {
//!     title: String,
//! }
//!
//! impl Validate for Page {}
//!
//! let mut tree = Tree::new(MemoryNodeStore::<Page>::default());
//!
//! let home = tree.create(Page { title: "home".into() });
//! tree.save(&home).await?;
//!
//! let docs = tree.create(Page { title: "docs".into() });
//! tree.append_to(&docs, &home).await?;
//!
//! // The root handle was widened in memory by the insertion; no reload.
//! assert!(home.is_root());
//! assert!(!home.is_leaf());
//! assert_eq!(tree.parent(&docs).await?.map(|parent| parent.data().title), Some("home".into()));
//! # Ok(())
//! # }
//! ```

mod corrector;
pub use corrector::*;

mod error;
pub use error::*;

mod mutator;

mod node;
pub use node::*;

mod registry;
pub use registry::*;

mod shift;
pub use shift::*;

mod tree;
pub use tree::*;
