// Engine: session coordination against the BCI server and the poll loop behind it.

pub mod observers;
pub mod poller;
pub mod session;
pub mod snapshot;
pub mod stats;
