pub mod backend;
pub mod circuit_breaker;
pub mod sessions;
