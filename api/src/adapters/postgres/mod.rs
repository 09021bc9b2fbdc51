//! PostgreSQL adapters

pub mod customer_repo;
pub mod invoice_repo;
pub mod user_repo;

pub use customer_repo::PostgresCustomerRepository;
pub use invoice_repo::PostgresInvoiceRepository;
pub use user_repo::PostgresUserRepository;
