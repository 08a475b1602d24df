use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};

use super::{begin_snapshot, push_contains, push_page};
use crate::database::constraints::db_err;
use crate::domain::{
    Customer, CustomerFilter, CustomerInput, DomainError, MeterFilter, MeterInput,
    MeterRenovation, Technician, TechnicianFilter, TechnicianInput,
};
use crate::repositories::CatalogRepository;
use crate::utils::{PageRequest, Paged};

const CUSTOMER_COLUMNS: &str =
    "SELECT id, inscription, name, address, prior_meter, created_at FROM customers";
const TECHNICIAN_COLUMNS: &str = "SELECT id, dni, name, created_at FROM technicians";
const METER_COLUMNS: &str = r#"
    SELECT m.id, m.serial, m.verification_code,
           EXISTS (
               SELECT 1 FROM acts a WHERE a.meter_id = m.id AND a.deleted_at IS NULL
           ) AS consumed,
           m.created_at
    FROM meter_renovations m
"#;

pub struct PgCatalogRepository {
    pool: PgPool,
}

impl PgCatalogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct CustomerRow {
    id: i32,
    inscription: String,
    name: String,
    address: String,
    prior_meter: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<CustomerRow> for Customer {
    fn from(row: CustomerRow) -> Self {
        Customer {
            id: row.id,
            inscription: row.inscription,
            name: row.name,
            address: row.address,
            prior_meter: row.prior_meter,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct TechnicianRow {
    id: i32,
    dni: String,
    name: String,
    created_at: DateTime<Utc>,
}

impl From<TechnicianRow> for Technician {
    fn from(row: TechnicianRow) -> Self {
        Technician {
            id: row.id,
            dni: row.dni,
            name: row.name,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct MeterRow {
    id: i32,
    serial: String,
    verification_code: Option<String>,
    consumed: bool,
    created_at: DateTime<Utc>,
}

impl From<MeterRow> for MeterRenovation {
    fn from(row: MeterRow) -> Self {
        MeterRenovation {
            id: row.id,
            serial: row.serial,
            verification_code: row.verification_code,
            consumed: row.consumed,
            created_at: row.created_at,
        }
    }
}

fn push_customer_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &CustomerFilter) {
    qb.push(" WHERE TRUE");
    push_contains(qb, "inscription", &filter.inscription);
    push_contains(qb, "name", &filter.name);
}

fn push_technician_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &TechnicianFilter) {
    qb.push(" WHERE deleted_at IS NULL");
    push_contains(qb, "dni", &filter.dni);
    push_contains(qb, "name", &filter.name);
}

fn push_meter_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &MeterFilter) {
    qb.push(" WHERE TRUE");
    push_contains(qb, "m.serial", &filter.serial);
    match filter.available {
        Some(true) => {
            qb.push(" AND NOT EXISTS (SELECT 1 FROM acts a WHERE a.meter_id = m.id AND a.deleted_at IS NULL)");
        }
        Some(false) => {
            qb.push(" AND EXISTS (SELECT 1 FROM acts a WHERE a.meter_id = m.id AND a.deleted_at IS NULL)");
        }
        None => {}
    }
}

#[async_trait]
impl CatalogRepository for PgCatalogRepository {
    async fn list_customers(
        &self,
        filter: &CustomerFilter,
        page: PageRequest,
    ) -> Result<Paged<Customer>, DomainError> {
        let mut tx = begin_snapshot(&self.pool).await.map_err(db_err("listing customers"))?;

        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM customers");
        push_customer_filters(&mut count, filter);
        let total = count
            .build_query_scalar::<i64>()
            .fetch_one(&mut *tx)
            .await
            .map_err(db_err("counting customers"))?;

        let mut select = QueryBuilder::<Postgres>::new(CUSTOMER_COLUMNS);
        push_customer_filters(&mut select, filter);
        push_page(&mut select, "name, id", page);
        let rows = select
            .build_query_as::<CustomerRow>()
            .fetch_all(&mut *tx)
            .await
            .map_err(db_err("listing customers"))?;

        tx.commit().await.map_err(db_err("listing customers"))?;
        Ok(Paged::new(rows.into_iter().map(Customer::from).collect(), total))
    }

    async fn find_customer(&self, id: i32) -> Result<Option<Customer>, DomainError> {
        let sql = format!("{} WHERE id = $1", CUSTOMER_COLUMNS);
        let row: Option<CustomerRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err("finding customer"))?;
        Ok(row.map(Customer::from))
    }

    async fn create_customer(&self, input: &CustomerInput) -> Result<Customer, DomainError> {
        let row: CustomerRow = sqlx::query_as(
            r#"
            INSERT INTO customers (inscription, name, address, prior_meter)
            VALUES ($1, $2, $3, $4)
            RETURNING id, inscription, name, address, prior_meter, created_at
            "#,
        )
        .bind(&input.inscription)
        .bind(&input.name)
        .bind(&input.address)
        .bind(&input.prior_meter)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err("creating customer"))?;
        Ok(row.into())
    }

    async fn update_customer(&self, id: i32, input: &CustomerInput) -> Result<Customer, DomainError> {
        let row: Option<CustomerRow> = sqlx::query_as(
            r#"
            UPDATE customers SET inscription = $1, name = $2, address = $3, prior_meter = $4
            WHERE id = $5
            RETURNING id, inscription, name, address, prior_meter, created_at
            "#,
        )
        .bind(&input.inscription)
        .bind(&input.name)
        .bind(&input.address)
        .bind(&input.prior_meter)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err("updating customer"))?;

        row.map(Customer::from)
            .ok_or_else(|| DomainError::not_found(format!("Cliente {} no encontrado", id)))
    }

    async fn list_technicians(
        &self,
        filter: &TechnicianFilter,
        page: PageRequest,
    ) -> Result<Paged<Technician>, DomainError> {
        let mut tx = begin_snapshot(&self.pool).await.map_err(db_err("listing technicians"))?;

        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM technicians");
        push_technician_filters(&mut count, filter);
        let total = count
            .build_query_scalar::<i64>()
            .fetch_one(&mut *tx)
            .await
            .map_err(db_err("counting technicians"))?;

        let mut select = QueryBuilder::<Postgres>::new(TECHNICIAN_COLUMNS);
        push_technician_filters(&mut select, filter);
        push_page(&mut select, "name, id", page);
        let rows = select
            .build_query_as::<TechnicianRow>()
            .fetch_all(&mut *tx)
            .await
            .map_err(db_err("listing technicians"))?;

        tx.commit().await.map_err(db_err("listing technicians"))?;
        Ok(Paged::new(rows.into_iter().map(Technician::from).collect(), total))
    }

    async fn create_technician(&self, input: &TechnicianInput) -> Result<Technician, DomainError> {
        let row: TechnicianRow = sqlx::query_as(
            "INSERT INTO technicians (dni, name) VALUES ($1, $2) RETURNING id, dni, name, created_at",
        )
        .bind(&input.dni)
        .bind(&input.name)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err("creating technician"))?;
        Ok(row.into())
    }

    async fn update_technician(
        &self,
        id: i32,
        input: &TechnicianInput,
    ) -> Result<Technician, DomainError> {
        let row: Option<TechnicianRow> = sqlx::query_as(
            r#"
            UPDATE technicians SET dni = $1, name = $2
            WHERE id = $3 AND deleted_at IS NULL
            RETURNING id, dni, name, created_at
            "#,
        )
        .bind(&input.dni)
        .bind(&input.name)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err("updating technician"))?;

        row.map(Technician::from)
            .ok_or_else(|| DomainError::not_found(format!("Técnico {} no encontrado", id)))
    }

    async fn delete_technician(&self, id: i32) -> Result<(), DomainError> {
        let result = sqlx::query(
            "UPDATE technicians SET deleted_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(db_err("deleting technician"))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found(format!("Técnico {} no encontrado", id)));
        }
        Ok(())
    }

    async fn list_meters(
        &self,
        filter: &MeterFilter,
        page: PageRequest,
    ) -> Result<Paged<MeterRenovation>, DomainError> {
        let mut tx = begin_snapshot(&self.pool).await.map_err(db_err("listing meters"))?;

        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM meter_renovations m");
        push_meter_filters(&mut count, filter);
        let total = count
            .build_query_scalar::<i64>()
            .fetch_one(&mut *tx)
            .await
            .map_err(db_err("counting meters"))?;

        let mut select = QueryBuilder::<Postgres>::new(METER_COLUMNS);
        push_meter_filters(&mut select, filter);
        push_page(&mut select, "m.serial, m.id", page);
        let rows = select
            .build_query_as::<MeterRow>()
            .fetch_all(&mut *tx)
            .await
            .map_err(db_err("listing meters"))?;

        tx.commit().await.map_err(db_err("listing meters"))?;
        Ok(Paged::new(rows.into_iter().map(MeterRenovation::from).collect(), total))
    }

    async fn create_meter(&self, input: &MeterInput) -> Result<MeterRenovation, DomainError> {
        let row: MeterRow = sqlx::query_as(
            r#"
            INSERT INTO meter_renovations (serial, verification_code)
            VALUES ($1, $2)
            RETURNING id, serial, verification_code, FALSE AS consumed, created_at
            "#,
        )
        .bind(&input.serial)
        .bind(&input.verification_code)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err("creating meter"))?;
        Ok(row.into())
    }

    async fn update_meter(&self, id: i32, input: &MeterInput) -> Result<MeterRenovation, DomainError> {
        let updated: Option<i32> = sqlx::query_scalar(
            "UPDATE meter_renovations SET serial = $1, verification_code = $2 WHERE id = $3 RETURNING id",
        )
        .bind(&input.serial)
        .bind(&input.verification_code)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err("updating meter"))?;

        if updated.is_none() {
            return Err(DomainError::not_found(format!("Medidor {} no encontrado", id)));
        }

        let sql = format!("{} WHERE m.id = $1", METER_COLUMNS);
        let row: MeterRow = sqlx::query_as(&sql)
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(db_err("updating meter"))?;
        Ok(row.into())
    }
}
