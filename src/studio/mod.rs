pub mod backend;
pub mod catalog;
pub mod downloads;
pub mod form;
pub mod session;
pub mod state;
pub mod surface;
pub mod types;
