// Client-side data synchronization core for a security-event dashboard
pub mod application;
pub mod domain;
pub mod infrastructure;

pub use application::store::{StoreSnapshot, ViewModelStore};
pub use application::sync::DashboardSync;
pub use domain::resource::{Resource, Tab};
pub use infrastructure::config::{load_config, SyncConfig};
