//! Zero-sized repository structs, one per table, with async query methods
//! taking `&PgPool`.

pub mod check_item_repo;
pub mod check_option_repo;
pub mod controle_repo;
pub mod infraction_repo;
pub mod inspection_repo;
pub mod pv_repo;
pub mod stats_repo;

pub use check_item_repo::CheckItemRepo;
pub use check_option_repo::CheckOptionRepo;
pub use controle_repo::ControleRepo;
pub use infraction_repo::InfractionRepo;
pub use inspection_repo::InspectionRepo;
pub use pv_repo::PvRepo;
pub use stats_repo::StatsRepo;
