pub mod configuration;
pub mod pool;
pub mod product;
pub mod quote;
pub mod rule;
pub mod snapshot;
