pub mod auth;
pub use auth::AuthService;
pub mod scoring;
pub mod demand_service;
pub use demand_service::DemandService;
pub mod commission_service;
pub use commission_service::CommissionService;
pub mod note_service;
pub use note_service::NoteService;
pub mod dashboard_service;
pub use dashboard_service::DashboardService;
