pub mod dates;
pub mod db;
pub mod routes;
pub mod service;
mod startup;
pub mod templates;
mod utils;

pub use dates::*;
pub use db::*;
pub use routes::*;
pub use service::{ClimateService, ErrorBody, RangeMode};
pub use startup::*;
pub use utils::*;
