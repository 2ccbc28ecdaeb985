pub mod admin;
pub mod api;
pub mod client;
pub mod logging;
pub mod mongo;
pub mod settings;
