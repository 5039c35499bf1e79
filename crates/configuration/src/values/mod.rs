mod pool_settings;
mod query_defaults;
mod secret;
pub mod uri;

pub use pool_settings::PoolSettings;
pub use query_defaults::QueryDefaults;
pub use secret::Secret;
pub use uri::ConnectionUri;
