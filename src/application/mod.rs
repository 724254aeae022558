//! Application layer containing the core business logic orchestration.
//!
//! Services here own the cache-aside discipline: reads go through
//! `LookupService`, every mutation invalidates the touched user's cache
//! entry, and the balance column is reachable only through `BalanceService`.

pub mod auth;
pub mod balance;
pub mod lookup;
pub mod users;
