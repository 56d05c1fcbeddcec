//! # Courier Dispatch
//!
//! Order assignment engine for a courier delivery service.
//!
//! Given a courier's regions, working hours and carrying capacity, the engine
//! picks the largest set of unassigned orders the courier can legally carry in
//! one batch and persists the claim atomically, safely alongside concurrent
//! assignments for other couriers.
//!
//! ## Architecture
//!
//! - [`models`]: Couriers, orders, time windows, assignment batches
//! - [`engine`]: Interval matching, availability filtering, knapsack
//!   selection and the per-courier assignment lifecycle
//! - [`db`]: Repository traits, the in-memory repository, configuration
//! - [`services`]: High-level operations used by callers

// Allow large error types - RepositoryError contains rich context for debugging
#![allow(clippy::result_large_err)]

pub mod db;
pub mod engine;
pub mod models;
pub mod services;
