pub mod user_repo;
pub use user_repo::UserRepository;
pub mod demand_repo;
pub use demand_repo::DemandRepository;
pub mod commission_repo;
pub use commission_repo::CommissionRepository;
pub mod note_repo;
pub use note_repo::NoteRepository;
pub mod dashboard_repo;
pub use dashboard_repo::DashboardRepository;
