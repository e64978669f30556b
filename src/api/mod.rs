// Flutter-facing surface: thin wrappers the Dart side calls through flutter_rust_bridge.

pub mod bci_api;
pub mod simple;
