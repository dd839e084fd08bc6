//! Database repositories module
//!
//! This module contains all repository implementations for data access

pub mod event;
pub mod household;
pub mod public_schedule;
pub mod registration;

// Re-export repositories
pub use event::EventRepository;
pub use household::HouseholdRepository;
pub use public_schedule::PublicScheduleRepository;
pub use registration::RegistrationRepository;
