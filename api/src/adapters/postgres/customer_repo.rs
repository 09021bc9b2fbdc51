//! PostgreSQL adapter for CustomerRepository

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use uuid::Uuid;

use crate::domain::entities::{Customer, CustomerChanges, CustomerId, NewCustomer, UserId};
use crate::domain::ports::{CustomerFilter, CustomerRepository, CustomerSortField, SortDirection};
use crate::entity::{customers, invoices};
use crate::error::DomainError;

use super::user_repo::map_update_err;

/// PostgreSQL implementation of CustomerRepository
pub struct PostgresCustomerRepository {
    db: DatabaseConnection,
}

impl PostgresCustomerRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn sort_column(field: CustomerSortField) -> customers::Column {
    match field {
        CustomerSortField::Id => customers::Column::Id,
        CustomerSortField::FirstName => customers::Column::FirstName,
        CustomerSortField::LastName => customers::Column::LastName,
        CustomerSortField::Email => customers::Column::Email,
        CustomerSortField::Company => customers::Column::Company,
    }
}

#[async_trait]
impl CustomerRepository for PostgresCustomerRepository {
    async fn find_by_id(&self, id: &CustomerId) -> Result<Option<Customer>, DomainError> {
        let result = customers::Entity::find_by_id(id.0)
            .one(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(result.map(|m| m.into()))
    }

    async fn find_by_owner(
        &self,
        owner: &UserId,
        filter: &CustomerFilter,
    ) -> Result<Vec<Customer>, DomainError> {
        let mut query =
            customers::Entity::find().filter(customers::Column::UserId.eq(owner.0));

        if let Some(first_name) = &filter.first_name {
            query = query.filter(customers::Column::FirstName.contains(first_name));
        }
        if let Some(last_name) = &filter.last_name {
            query = query.filter(customers::Column::LastName.eq(last_name));
        }
        if let Some(company) = &filter.company {
            query = query.filter(customers::Column::Company.eq(company));
        }

        let column = sort_column(filter.order_by);
        query = match filter.direction {
            SortDirection::Asc => query.order_by_asc(column),
            SortDirection::Desc => query.order_by_desc(column),
        };

        let results = query
            .all(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(results.into_iter().map(|m| m.into()).collect())
    }

    async fn create(&self, customer: &NewCustomer) -> Result<Customer, DomainError> {
        let model = customers::ActiveModel {
            id: Set(Uuid::new_v4()),
            first_name: Set(customer.first_name.clone()),
            last_name: Set(customer.last_name.clone()),
            email: Set(customer.email.clone()),
            company: Set(customer.company.clone()),
            user_id: Set(customer.user_id.0),
            created_at: Set(Utc::now().fixed_offset()),
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(result.into())
    }

    async fn update(
        &self,
        id: &CustomerId,
        changes: &CustomerChanges,
    ) -> Result<Customer, DomainError> {
        let mut model = customers::ActiveModel {
            id: Set(id.0),
            ..Default::default()
        };

        if let Some(first_name) = &changes.first_name {
            model.first_name = Set(first_name.clone());
        }
        if let Some(last_name) = &changes.last_name {
            model.last_name = Set(last_name.clone());
        }
        if let Some(email) = &changes.email {
            model.email = Set(email.clone());
        }
        if let Some(company) = &changes.company {
            model.company = Set(company.clone());
        }

        let result = model
            .update(&self.db)
            .await
            .map_err(map_update_err("customer"))?;

        Ok(result.into())
    }

    async fn delete_with_invoices(&self, id: &CustomerId) -> Result<(), DomainError> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        invoices::Entity::delete_many()
            .filter(invoices::Column::CustomerId.eq(id.0))
            .exec(&txn)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        customers::Entity::delete_by_id(id.0)
            .exec(&txn)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        txn.commit()
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(())
    }
}

/// Convert SeaORM model to domain entity
impl From<customers::Model> for Customer {
    fn from(model: customers::Model) -> Self {
        Customer {
            id: CustomerId(model.id),
            first_name: model.first_name,
            last_name: model.last_name,
            email: model.email,
            company: model.company,
            user_id: UserId(model.user_id),
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}
