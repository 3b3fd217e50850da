pub mod admin_user_repo;
pub mod category_repo;
pub mod event_repo;
pub mod representative_repo;
pub mod signup_repo;

pub use admin_user_repo::AdminUserRepo;
pub use category_repo::CategoryRepo;
pub use event_repo::EventRepo;
pub use representative_repo::RepresentativeRepo;
pub use signup_repo::SignupRepo;
