//! Chat task tracking, sessions and the services built on them.

pub mod markdown;
pub mod services;
pub mod sessions;
pub mod tasks;
pub mod traits;
pub mod worker;
