mod auth;
pub mod client;
mod kyc;
mod ledger;
mod notifications;
mod support;
pub mod types;
mod wallet;

pub use client::*;
pub use types::*;

#[cfg(all(test, not(target_arch = "wasm32")))]
pub mod test_support;
