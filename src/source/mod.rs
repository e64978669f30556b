// Transport abstraction: how the coordinator reaches the BCI server.

pub mod http_source;
pub mod traits;
