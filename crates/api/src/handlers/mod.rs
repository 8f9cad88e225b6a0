pub mod catalog;
pub mod controles;
pub mod inspections;
pub mod pvs;
pub mod sources;
