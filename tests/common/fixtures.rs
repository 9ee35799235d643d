//! Shared schemas for integration tests.
//!
//! The shop schema:
//!
//! ```text
//! Orders --bt--> Customers --bt--> Regions --hm--> Sales
//!   |
//!   +--mm (order_tags)--> Tags
//! ```

#![allow(dead_code)]

use virtcol::model::{
    Association, Column, ColumnKind, FormulaOptions, LookupOptions, Relation, RollupFunction,
    RollupOptions, Schema, Table, UiType,
};
use virtcol::sql::Dialect;

fn lookup(id: &str, title: &str, relation: &str, target: &str) -> Column {
    Column::virtual_column(
        id,
        title,
        UiType::Lookup,
        ColumnKind::Lookup(LookupOptions {
            relation_column_id: relation.into(),
            lookup_column_id: target.into(),
        }),
    )
}

fn rollup(id: &str, title: &str, relation: &str, target: &str, function: RollupFunction) -> Column {
    Column::virtual_column(
        id,
        title,
        UiType::Rollup,
        ColumnKind::Rollup(RollupOptions {
            relation_column_id: relation.into(),
            rollup_column_id: target.into(),
            function,
        }),
    )
}

fn formula(id: &str, title: &str, source: &str) -> Column {
    Column::virtual_column(
        id,
        title,
        UiType::Formula,
        ColumnKind::Formula(FormulaOptions::from_text(source)),
    )
}

pub fn shop(dialect: Dialect) -> Schema {
    let regions = Table::new("t_r", "Regions", "regions")
        .with_column(Column::plain("r_id", "Id", "id", UiType::Id).with_primary_key())
        .with_column(
            Column::plain("r_name", "Name", "name", UiType::SingleLineText).with_display_value(),
        )
        .with_column(Column::virtual_column(
            "r_sales",
            "Sales",
            UiType::Links,
            ColumnKind::Relation(Relation::has_many("s_region", "r_id", "t_s")),
        ))
        .with_column(rollup("r_total", "SalesTotal", "r_sales", "s_amount", RollupFunction::Sum))
        .with_column(rollup("r_count", "SalesCount", "r_sales", "s_id", RollupFunction::Count));

    let sales = Table::new("t_s", "Sales", "sales")
        .with_column(Column::plain("s_id", "Id", "id", UiType::Id).with_primary_key())
        .with_column(Column::plain("s_amount", "Amount", "amount", UiType::Decimal))
        .with_column(Column::plain("s_region", "RegionId", "region_id", UiType::ForeignKey));

    let customers = Table::new("t_c", "Customers", "customers")
        .with_column(Column::plain("c_id", "Id", "id", UiType::Id).with_primary_key())
        .with_column(
            Column::plain("c_name", "Name", "name", UiType::SingleLineText).with_display_value(),
        )
        .with_column(Column::plain("c_region", "RegionId", "region_id", UiType::ForeignKey))
        .with_column(Column::virtual_column(
            "c_region_rel",
            "Region",
            UiType::LinkToAnotherRecord,
            ColumnKind::Relation(Relation::belongs_to("c_region", "r_id", "t_r")),
        ))
        .with_column(lookup("c_region_name", "RegionName", "c_region_rel", "r_name"))
        .with_column(lookup("c_region_sales", "RegionSales", "c_region_rel", "r_total"));

    let orders = Table::new("t_o", "Orders", "orders")
        .with_column(Column::plain("o_id", "Id", "id", UiType::Id).with_primary_key())
        .with_column(
            Column::plain("o_title", "Title", "title", UiType::SingleLineText).with_display_value(),
        )
        .with_column(Column::plain("o_qty", "Quantity", "quantity", UiType::Number))
        .with_column(Column::plain("o_price", "Price", "price", UiType::Decimal))
        .with_column(Column::plain("o_status", "Status", "status", UiType::SingleSelect))
        .with_column(Column::plain("o_paid", "Paid", "paid", UiType::Checkbox))
        .with_column(Column::plain("o_created", "Created", "created_at", UiType::Date))
        .with_column(Column::plain("o_customer", "CustomerId", "customer_id", UiType::ForeignKey))
        .with_column(Column::virtual_column(
            "o_customer_rel",
            "Customer",
            UiType::LinkToAnotherRecord,
            ColumnKind::Relation(Relation::belongs_to("o_customer", "c_id", "t_c")),
        ))
        .with_column(Column::virtual_column(
            "o_tags",
            "Tags",
            UiType::Links,
            ColumnKind::Relation(Relation::many_to_many(
                "o_id",
                "tg_id",
                "t_tg",
                Association {
                    table_id: "t_ot".into(),
                    child_column_id: "ot_order".into(),
                    parent_column_id: "ot_tag".into(),
                },
            )),
        ))
        .with_column(lookup("o_customer_name", "CustomerName", "o_customer_rel", "c_name"))
        .with_column(lookup("o_region", "CustomerRegion", "o_customer_rel", "c_region_name"))
        .with_column(lookup("o_region_sales", "CustomerRegionSales", "o_customer_rel", "c_region_sales"))
        .with_column(formula("o_total", "Total", "{Price} * {Quantity}"))
        .with_column(formula("o_label", "Label", "CONCAT({Title}, ' for ', {CustomerName})"));

    let tags = Table::new("t_tg", "Tags", "tags")
        .with_column(Column::plain("tg_id", "Id", "id", UiType::Id).with_primary_key())
        .with_column(Column::plain("tg_label", "Label", "label", UiType::SingleLineText));

    let order_tags = Table::new("t_ot", "OrderTags", "order_tags")
        .with_column(Column::plain("ot_id", "Id", "id", UiType::Id).with_primary_key())
        .with_column(Column::plain("ot_order", "OrderId", "order_id", UiType::ForeignKey))
        .with_column(Column::plain("ot_tag", "TagId", "tag_id", UiType::ForeignKey));

    Schema::new(
        dialect,
        vec![regions, sales, customers, orders, tags, order_tags],
    )
}

/// Tables `n0 .. n{depth}`, each belonging to the next. `Deep` on `n0`
/// looks up `n{depth}`'s name through `depth` hops.
pub fn lookup_chain(dialect: Dialect, depth: usize) -> Schema {
    assert!(depth >= 1);
    let mut tables = Vec::with_capacity(depth + 1);
    for level in 0..=depth {
        let id = format!("n{}", level);
        let mut table = Table::new(&id, &format!("Level{}", level), &format!("level_{}", level))
            .with_column(Column::plain(&format!("{}_id", id), "Id", "id", UiType::Id).with_primary_key())
            .with_column(
                Column::plain(&format!("{}_name", id), "Name", "name", UiType::SingleLineText)
                    .with_display_value(),
            );
        if level < depth {
            let next = format!("n{}", level + 1);
            let target = if level + 1 == depth {
                format!("{}_name", next)
            } else {
                format!("{}_deep", next)
            };
            table = table
                .with_column(Column::plain(
                    &format!("{}_next", id),
                    "NextId",
                    "next_id",
                    UiType::ForeignKey,
                ))
                .with_column(Column::virtual_column(
                    &format!("{}_next_rel", id),
                    "Next",
                    UiType::LinkToAnotherRecord,
                    ColumnKind::Relation(Relation::belongs_to(
                        &format!("{}_next", id),
                        &format!("{}_id", next),
                        &next,
                    )),
                ))
                .with_column(lookup(
                    &format!("{}_deep", id),
                    "Deep",
                    &format!("{}_next_rel", id),
                    &target,
                ));
        }
        tables.push(table);
    }
    Schema::new(dialect, tables)
}

/// Two has-many hops in a row:
///
/// ```text
/// Countries --hm--> Regions --hm--> Sales
/// ```
pub fn geo(dialect: Dialect) -> Schema {
    let countries = Table::new("t_gc", "Countries", "countries")
        .with_column(Column::plain("gc_id", "Id", "id", UiType::Id).with_primary_key())
        .with_column(
            Column::plain("gc_name", "Name", "name", UiType::SingleLineText).with_display_value(),
        )
        .with_column(Column::virtual_column(
            "gc_regions",
            "Regions",
            UiType::Links,
            ColumnKind::Relation(Relation::has_many("gr_country", "gc_id", "t_gr")),
        ))
        .with_column(lookup("gc_amounts", "Amounts", "gc_regions", "gr_amounts"))
        .with_column(lookup("gc_totals", "RegionTotals", "gc_regions", "gr_total"))
        .with_column(lookup("gc_sales", "RegionSales", "gc_regions", "gr_sales"));

    let regions = Table::new("t_gr", "Regions", "regions")
        .with_column(Column::plain("gr_id", "Id", "id", UiType::Id).with_primary_key())
        .with_column(
            Column::plain("gr_name", "Name", "name", UiType::SingleLineText).with_display_value(),
        )
        .with_column(Column::plain("gr_country", "CountryId", "country_id", UiType::ForeignKey))
        .with_column(Column::virtual_column(
            "gr_sales",
            "Sales",
            UiType::Links,
            ColumnKind::Relation(Relation::has_many("gs_region", "gr_id", "t_gs")),
        ))
        .with_column(lookup("gr_amounts", "Amounts", "gr_sales", "gs_amount"))
        .with_column(rollup("gr_total", "Total", "gr_sales", "gs_amount", RollupFunction::Sum));

    let sales = Table::new("t_gs", "Sales", "sales")
        .with_column(Column::plain("gs_id", "Id", "id", UiType::Id).with_primary_key())
        .with_column(Column::plain("gs_code", "Code", "code", UiType::SingleLineText).with_display_value())
        .with_column(Column::plain("gs_amount", "Amount", "amount", UiType::Decimal))
        .with_column(Column::plain("gs_region", "RegionId", "region_id", UiType::ForeignKey));

    Schema::new(dialect, vec![countries, regions, sales])
}
