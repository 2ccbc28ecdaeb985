pub mod api;
pub mod console;
pub mod status;
pub mod store;

mod tests;
