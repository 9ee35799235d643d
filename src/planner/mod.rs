//! Relation traversal planner.
//!
//! Turns relation, lookup and rollup columns into correlated subquery
//! skeletons:
//! 1. Alias allocation: one [`AliasCounter`] per compile call
//! 2. Traversal: relation column → [`Traversal`] (join predicates per hop)
//! 3. Rollup: rollup column → aggregate scalar subquery
//!
//! The compilers fill the skeletons with conditions and values.

pub mod alias;
pub mod join;
pub mod rollup;

pub use alias::{AliasCounter, DEFAULT_ALIAS_PREFIX};
pub use join::{plan_traversal, Direction, JoinSkeleton, Traversal};
pub use rollup::build_rollup_expr;
