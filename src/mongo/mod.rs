pub mod connection;
pub mod driver;
pub mod fake;
