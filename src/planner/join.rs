//! Relation traversal planning.
//!
//! A traversal is the skeleton of the correlated subquery that walks one
//! relation column from an outer row to the related rows. Every traversal
//! takes fresh aliases, so the same table can be walked twice in one
//! fragment.

use super::alias::AliasCounter;
use crate::error::{CompileError, CompileResult};
use crate::model::{Column, RelationType};
use crate::resolve::ColumnResolver;
use crate::sql::{count, star, table_col, Expr, ExprExt, Query, TableRef};

/// Which way a traversal walks the foreign key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// From the row holding the foreign key to the row it points at.
    ChildToParent,
    /// From the referenced row to the rows pointing at it.
    ParentToChild,
}

impl Direction {
    /// Direction a relation column walks in.
    pub fn natural(relation_type: &RelationType) -> Option<Direction> {
        match relation_type {
            RelationType::BelongsTo => Some(Direction::ChildToParent),
            RelationType::HasMany | RelationType::ManyToMany => Some(Direction::ParentToChild),
            RelationType::Unsupported(_) => None,
        }
    }
}

/// One aliased table of a traversal and the predicate joining it to the
/// table before it.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinSkeleton {
    pub table: String,
    pub alias: String,
    pub join_predicate: Expr,
}

impl JoinSkeleton {
    pub fn table_ref(&self) -> TableRef {
        TableRef::new(&self.table).with_alias(&self.alias)
    }
}

/// A planned walk across one relation column.
#[derive(Debug, Clone, PartialEq)]
pub struct Traversal {
    pub relation_type: RelationType,
    pub direction: Direction,
    /// Related table id.
    pub related_table_id: String,
    /// Key on the outer row the traversal starts from.
    pub outer_key: Expr,
    /// Key selected by [`Traversal::key_query`]; matches `outer_key`.
    pub inner_key: Expr,
    /// Junction table, many-to-many only.
    pub junction: Option<JoinSkeleton>,
    pub target: JoinSkeleton,
}

impl Traversal {
    /// Alias the related table's columns are qualified with.
    pub fn qualifier(&self) -> &str {
        &self.target.alias
    }

    pub fn multi_valued(&self) -> bool {
        self.relation_type.is_multi_valued()
    }

    fn first(&self) -> &JoinSkeleton {
        self.junction.as_ref().unwrap_or(&self.target)
    }

    fn from_related(&self) -> Query {
        let first = self.first();
        let query = Query::new().from(first.table_ref());
        match &self.junction {
            Some(_) => query.inner_join(self.target.table_ref(), self.target.join_predicate.clone()),
            None => query,
        }
    }

    /// `SELECT select FROM related WHERE <correlated to the outer row>`.
    pub fn correlated_query(&self, select: Vec<Expr>) -> Query {
        self.from_related()
            .select(select)
            .filter(self.first().join_predicate.clone())
    }

    /// `SELECT inner_key FROM related`, for `outer_key IN (...)` membership
    /// tests. Callers add the filter.
    pub fn key_query(&self) -> Query {
        self.from_related().select(vec![self.inner_key.clone()])
    }

    /// `SELECT COUNT(*)` of the related rows. Many-to-many counts junction
    /// rows only.
    pub fn count_query(&self) -> Query {
        let first = self.first();
        Query::new()
            .select(vec![count(star())])
            .from(first.table_ref())
            .filter(first.join_predicate.clone())
    }

    /// Append this traversal to `query` as inner joins, continuing a chain
    /// of hops.
    pub fn append_joins(&self, query: Query) -> Query {
        let query = match &self.junction {
            Some(j) => query.inner_join(j.table_ref(), j.join_predicate.clone()),
            None => query,
        };
        query.inner_join(self.target.table_ref(), self.target.join_predicate.clone())
    }
}

fn column_name<'a>(resolver: &'a dyn ColumnResolver, id: &str) -> CompileResult<&'a str> {
    Ok(resolver.column_by_id(id)?.column_name.as_str())
}

/// Plan the traversal of `relation_column` starting from rows qualified by
/// `outer`.
///
/// Belongs-to and has-many take one alias; many-to-many takes two, the
/// junction's first.
pub fn plan_traversal(
    resolver: &dyn ColumnResolver,
    relation_column: &Column,
    outer: &str,
    aliases: &mut AliasCounter,
) -> CompileResult<Traversal> {
    let relation = resolver.relation(relation_column)?;
    let related = resolver.table(&relation.related_table_id)?;
    let direction = Direction::natural(&relation.relation_type).ok_or_else(|| {
        CompileError::unsupported_relation(&relation_column.title, &relation.relation_type)
    })?;

    let traversal = match &relation.relation_type {
        RelationType::BelongsTo => {
            let fk = column_name(resolver, &relation.child_column_id)?;
            let pk = column_name(resolver, &relation.parent_column_id)?;
            let alias = aliases.next_alias();
            Traversal {
                relation_type: RelationType::BelongsTo,
                direction,
                related_table_id: related.id.clone(),
                outer_key: table_col(outer, fk),
                inner_key: table_col(&alias, pk),
                junction: None,
                target: JoinSkeleton {
                    table: related.table_name.clone(),
                    join_predicate: table_col(&alias, pk).eq(table_col(outer, fk)),
                    alias,
                },
            }
        }
        RelationType::HasMany => {
            let fk = column_name(resolver, &relation.child_column_id)?;
            let pk = column_name(resolver, &relation.parent_column_id)?;
            let alias = aliases.next_alias();
            Traversal {
                relation_type: RelationType::HasMany,
                direction,
                related_table_id: related.id.clone(),
                outer_key: table_col(outer, pk),
                inner_key: table_col(&alias, fk),
                junction: None,
                target: JoinSkeleton {
                    table: related.table_name.clone(),
                    join_predicate: table_col(&alias, fk).eq(table_col(outer, pk)),
                    alias,
                },
            }
        }
        RelationType::ManyToMany => {
            let assoc = relation.association.as_ref().ok_or_else(|| {
                CompileError::InvalidSchema(format!(
                    "many-to-many relation '{}' has no junction table",
                    relation_column.title
                ))
            })?;
            let junction_table = resolver.table(&assoc.table_id)?;
            let owner_pk = column_name(resolver, &relation.child_column_id)?;
            let related_pk = column_name(resolver, &relation.parent_column_id)?;
            let j_owner = column_name(resolver, &assoc.child_column_id)?;
            let j_related = column_name(resolver, &assoc.parent_column_id)?;

            let j_alias = aliases.next_alias();
            let alias = aliases.next_alias();
            Traversal {
                relation_type: RelationType::ManyToMany,
                direction,
                related_table_id: related.id.clone(),
                outer_key: table_col(outer, owner_pk),
                inner_key: table_col(&j_alias, j_owner),
                junction: Some(JoinSkeleton {
                    table: junction_table.table_name.clone(),
                    join_predicate: table_col(&j_alias, j_owner).eq(table_col(outer, owner_pk)),
                    alias: j_alias.clone(),
                }),
                target: JoinSkeleton {
                    table: related.table_name.clone(),
                    join_predicate: table_col(&alias, related_pk).eq(table_col(&j_alias, j_related)),
                    alias,
                },
            }
        }
        RelationType::Unsupported(other) => {
            return Err(CompileError::unsupported_relation(&relation_column.title, other))
        }
    };

    Ok(traversal)
}
