//! ipsift: batch IP geolocation with carrier/region classification,
//! filtering and sessions that survive between runs.

pub mod config;
pub mod filter;
pub mod lookup;
pub mod session;
