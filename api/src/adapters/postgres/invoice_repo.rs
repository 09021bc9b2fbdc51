//! PostgreSQL adapter for InvoiceRepository
//!
//! The chrono increment is a single atomic UPDATE at the database, so
//! concurrent increments serialize on the row and none is lost.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseBackend, DatabaseConnection, DbErr, EntityTrait,
    JoinType, QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set, Statement,
};
use uuid::Uuid;

use crate::domain::entities::{
    CustomerId, Invoice, InvoiceChanges, InvoiceId, NewInvoice, UserId,
};
use crate::domain::ports::{
    InvoiceOrder, InvoiceRepository, InvoiceSortField, SortDirection, INVOICES_PER_PAGE,
};
use crate::entity::{customers, invoices};
use crate::error::DomainError;

use super::user_repo::map_update_err;

/// PostgreSQL implementation of InvoiceRepository
pub struct PostgresInvoiceRepository {
    db: DatabaseConnection,
}

impl PostgresInvoiceRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn sort_column(field: InvoiceSortField) -> invoices::Column {
    match field {
        InvoiceSortField::Amount => invoices::Column::Amount,
        InvoiceSortField::SentAt => invoices::Column::SentAt,
    }
}

fn apply_order(
    query: sea_orm::Select<invoices::Entity>,
    order: InvoiceOrder,
) -> sea_orm::Select<invoices::Entity> {
    let column = sort_column(order.order_by);
    match order.direction {
        SortDirection::Asc => query.order_by_asc(column),
        SortDirection::Desc => query.order_by_desc(column),
    }
}

#[async_trait]
impl InvoiceRepository for PostgresInvoiceRepository {
    async fn find_by_id(&self, id: &InvoiceId) -> Result<Option<Invoice>, DomainError> {
        let result = invoices::Entity::find_by_id(id.0)
            .one(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        result.map(Invoice::try_from).transpose()
    }

    async fn find_by_customer(
        &self,
        customer_id: &CustomerId,
        order: InvoiceOrder,
    ) -> Result<Vec<Invoice>, DomainError> {
        let query = invoices::Entity::find()
            .filter(invoices::Column::CustomerId.eq(customer_id.0));

        let results = apply_order(query, order)
            .all(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        results.into_iter().map(Invoice::try_from).collect()
    }

    async fn find_page_by_owner(
        &self,
        owner: &UserId,
        order: InvoiceOrder,
        page: u64,
    ) -> Result<Vec<Invoice>, DomainError> {
        let query = invoices::Entity::find()
            .join(JoinType::InnerJoin, invoices::Relation::Customers.def())
            .filter(customers::Column::UserId.eq(owner.0));

        let offset = page.saturating_sub(1) * INVOICES_PER_PAGE;
        let results = apply_order(query, order)
            .limit(INVOICES_PER_PAGE)
            .offset(offset)
            .all(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        results.into_iter().map(Invoice::try_from).collect()
    }

    async fn create(&self, invoice: &NewInvoice) -> Result<Invoice, DomainError> {
        let model = invoices::ActiveModel {
            id: Set(Uuid::new_v4()),
            amount: Set(invoice.amount),
            sent_at: Set(invoice.sent_at.fixed_offset()),
            status: Set(invoice.status.to_string()),
            chrono: Set(invoice.chrono),
            customer_id: Set(invoice.customer_id.0),
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Invoice::try_from(result)
    }

    async fn update(
        &self,
        id: &InvoiceId,
        changes: &InvoiceChanges,
    ) -> Result<Invoice, DomainError> {
        let mut model = invoices::ActiveModel {
            id: Set(id.0),
            ..Default::default()
        };

        if let Some(amount) = changes.amount {
            model.amount = Set(amount);
        }
        if let Some(sent_at) = changes.sent_at {
            model.sent_at = Set(sent_at.fixed_offset());
        }
        if let Some(status) = changes.status {
            model.status = Set(status.to_string());
        }
        if let Some(chrono) = changes.chrono {
            model.chrono = Set(chrono);
        }
        if let Some(customer_id) = changes.customer_id {
            model.customer_id = Set(customer_id.0);
        }

        let result = model
            .update(&self.db)
            .await
            .map_err(map_update_err("invoice"))?;

        Invoice::try_from(result)
    }

    async fn delete(&self, id: &InvoiceId) -> Result<(), DomainError> {
        invoices::Entity::delete_by_id(id.0)
            .exec(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(())
    }

    async fn increment_chrono(&self, id: &InvoiceId) -> Result<Option<Invoice>, DomainError> {
        // Single atomic statement: the read-modify-write happens inside the
        // database, and RETURNING hands back exactly the row this update
        // produced (not a later value from a concurrent increment).
        let stmt = Statement::from_sql_and_values(
            DatabaseBackend::Postgres,
            "UPDATE invoices SET chrono = chrono + 1 WHERE id = $1 \
             RETURNING id, amount, sent_at, status, chrono, customer_id",
            [id.0.into()],
        );

        let updated = invoices::Entity::find()
            .from_raw_sql(stmt)
            .one(&self.db)
            .await
            .map_err(classify_increment_err)?;

        updated.map(Invoice::try_from).transpose()
    }
}

/// Failures while acquiring or establishing a connection happen before the
/// UPDATE can reach the server, so the increment is confirmed not applied
/// and safe to retry. Anything after that point (an execution or transport
/// error) may follow a committed statement; the applied state is unknown
/// and re-issuing the UPDATE could count the increment twice.
fn classify_increment_err(e: DbErr) -> DomainError {
    match e {
        DbErr::ConnectionAcquire(source) => DomainError::Unavailable(source.to_string()),
        DbErr::Conn(source) => DomainError::Unavailable(source.to_string()),
        e => DomainError::Database(e.to_string()),
    }
}

/// Convert SeaORM model to domain entity.
///
/// Fallible because the status column is free text at the storage layer; a
/// value outside the enumeration is surfaced as an error instead of being
/// coerced to a default that would skew the unpaid aggregate.
impl TryFrom<invoices::Model> for Invoice {
    type Error = DomainError;

    fn try_from(model: invoices::Model) -> Result<Self, Self::Error> {
        let status = model.status.parse().map_err(|_| {
            DomainError::Database(format!(
                "invalid invoice status '{}' for invoice {}",
                model.status, model.id
            ))
        })?;

        Ok(Invoice {
            id: InvoiceId(model.id),
            amount: model.amount,
            sent_at: model.sent_at.with_timezone(&Utc),
            status,
            chrono: model.chrono,
            customer_id: CustomerId(model.customer_id),
        })
    }
}
