// --- File: crates/calrelay_calcom/src/lib.rs ---
// Declare modules within this crate
pub mod client;
pub mod doc;
pub mod handlers;
pub mod logic;
#[cfg(test)]
mod logic_proptest;
pub mod routes;
#[cfg(test)]
mod test_support;
