mod admin;
mod companies;
pub mod dto;
mod invoices;
mod reports;
pub mod response;
mod router;
mod sessions;
mod stock;
pub mod validation;

pub use router::{AppState, create_router};
