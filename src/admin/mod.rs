pub mod aggregate;
pub mod model;
pub mod mutation;
pub mod stats;
