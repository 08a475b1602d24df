//! PostgreSQL implementations of the repository ports

pub mod access_repo_impl;
pub mod act_repo_impl;
pub mod catalog_repo_impl;
pub mod labeled_repo_impl;
pub mod lot_repo_impl;
pub mod pre_catastral_repo_impl;
pub mod report_repo_impl;

pub use access_repo_impl::PgAccessRepository;
pub use act_repo_impl::PgActRepository;
pub use catalog_repo_impl::PgCatalogRepository;
pub use labeled_repo_impl::PgLabeledRepository;
pub use lot_repo_impl::PgLotRepository;
pub use pre_catastral_repo_impl::PgPreCatastralRepository;
pub use report_repo_impl::PgReportRepository;

use sqlx::{PgPool, Postgres, QueryBuilder, Transaction};

use crate::utils::PageRequest;

/// Read-only snapshot so a page and its total agree.
pub(crate) async fn begin_snapshot(pool: &PgPool) -> Result<Transaction<'static, Postgres>, sqlx::Error> {
    let mut tx = pool.begin().await?;
    sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ READ ONLY")
        .execute(&mut *tx)
        .await?;
    Ok(tx)
}

/// Case-sensitive substring match, skipped for blank values.
pub(crate) fn push_contains(qb: &mut QueryBuilder<'_, Postgres>, column: &str, value: &Option<String>) {
    if let Some(value) = value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
        qb.push(format!(" AND strpos({}, ", column))
            .push_bind(value.to_string())
            .push(") > 0");
    }
}

pub(crate) fn push_equals(qb: &mut QueryBuilder<'_, Postgres>, column: &str, value: Option<i32>) {
    if let Some(value) = value {
        qb.push(format!(" AND {} = ", column)).push_bind(value);
    }
}

pub(crate) fn push_page(qb: &mut QueryBuilder<'_, Postgres>, order_by: &str, page: PageRequest) {
    qb.push(format!(" ORDER BY {} LIMIT ", order_by))
        .push_bind(page.limit)
        .push(" OFFSET ")
        .push_bind(page.offset());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_filters_add_no_predicate() {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT 1 WHERE TRUE");
        push_contains(&mut qb, "a.file_number", &Some("   ".into()));
        push_contains(&mut qb, "a.file_number", &None);
        push_equals(&mut qb, "a.lot_id", None);
        assert_eq!(qb.sql(), "SELECT 1 WHERE TRUE");
    }

    #[test]
    fn filters_and_page_are_bound_in_order() {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT 1 WHERE TRUE");
        push_contains(&mut qb, "a.file_number", &Some("10".into()));
        push_equals(&mut qb, "a.lot_id", Some(3));
        push_page(&mut qb, "a.id DESC", PageRequest { page: 2, limit: 10 });
        assert_eq!(
            qb.sql(),
            "SELECT 1 WHERE TRUE AND strpos(a.file_number, $1) > 0 AND a.lot_id = $2 \
             ORDER BY a.id DESC LIMIT $3 OFFSET $4"
        );
    }
}
