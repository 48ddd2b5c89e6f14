pub mod tenancy_repo;
pub use tenancy_repo::TenantRepository;
pub mod catalog_repo;
pub use catalog_repo::CatalogRepository;
pub mod appointments_repo;
pub use appointments_repo::AppointmentRepository;
pub mod crm_repo;
pub use crm_repo::CrmRepository;

pub mod store;
pub use store::{BookingStore, PgBookingStore};

#[cfg(test)]
pub mod memory_store;
