pub mod guards;
pub mod router;
pub mod routes;

pub use router::{GantryState, gantry_router};
