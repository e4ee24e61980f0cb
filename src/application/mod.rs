// Application layer - Pollers, executor, store, and tab activation
pub mod executor;
pub mod gateway;
pub mod poller;
pub mod store;
pub mod sync;
pub mod tabs;
