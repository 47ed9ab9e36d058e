pub mod athletics;
pub mod clock;
pub mod config;
pub mod error;
pub mod espn;
pub mod matcher;
pub mod model;
pub mod normalize;
pub mod reconcile;
pub mod scheduler;
pub mod store;
pub mod sync;
