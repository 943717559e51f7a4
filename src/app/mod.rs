// Application layer: wires configuration to adapters and the reaper.

pub mod bootstrap;

pub use bootstrap::{build_hosting, build_reaper, run_once};
