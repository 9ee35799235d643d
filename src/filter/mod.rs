//! Filter trees, the `where` string DSL and sort specifications.

pub mod sort_spec;
pub mod tree;
pub mod where_dsl;

pub use sort_spec::{parse_sort, SortSpec};
pub use tree::{
    ComparisonOp, ComparisonSubOp, Filter, FilterGroup, FilterLeaf, FilterValue, LogicalOp,
    Number,
};
pub use where_dsl::parse_where;
