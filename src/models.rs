pub mod auth;
pub mod commission;
pub mod dashboard;
pub mod demands;
pub mod notes;
