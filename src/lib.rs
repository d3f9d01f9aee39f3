//! Claimgraph Agent - iterative tool orchestration over a biomedical
//! claim graph.
//!
//! A question is answered by looping plan → execute → evaluate until the
//! evaluator judges the gathered evidence sufficient or the iteration
//! budget runs out, then synthesizing a final answer from everything the
//! tools returned.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
