pub mod availability;
pub mod booking_funnel;
pub mod identity_service;
pub mod session_registry;
pub mod slots;
