mod handlers;
mod params;
pub mod router;
