pub mod appointments;
pub mod booking;
pub mod catalog;
pub mod crm;
pub mod scheduling;
pub mod tenancy;
