//! Claim graph adapters.

mod fixture;
mod in_memory;

pub use fixture::{ClaimFixture, EndpointFixture, EntityFixture, EvidenceFixture, FixtureError, GraphFixture};
pub use in_memory::InMemoryClaimGraph;
