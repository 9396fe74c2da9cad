//! Clockifyへのtime entryの送信。

mod api;
mod store;
mod sync;

#[cfg(test)]
pub use api::MockClockifyApi;
pub use api::{ClockifyApi, ClockifyClient};
pub use store::ClockifyConfig;
pub use sync::{ClockifySync, SyncReport};
