/// Account entity that can be shared between threads.
/// Each account guards its balance with its own lock; transfers lock both
/// accounts in a global order so opposite transfers cannot deadlock.
pub mod account;

/// Concurrent account index, used to resolve ids and list accounts.
pub mod registry;

/// Typed commands built from batch input rows.
pub mod command;

/// Command processor interface, plus implementation on top of [`registry`].
pub mod processor;

/// CSV batch driver. Kept in the library so integration tests can run it.
pub mod bin_utils;
