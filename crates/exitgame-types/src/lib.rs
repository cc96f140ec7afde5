//! # exitgame-types
//!
//! Shared types, errors, and configuration for the range **exit game**.
//!
//! This crate is the leaf dependency of the workspace. It defines:
//!
//! - **Identifiers**: [`Address`], [`ExitId`], [`ChallengeId`], [`SnapshotIndex`]
//! - **State model**: [`State`], [`Parameters`], [`StateUpdate`]
//! - **Witnesses**: [`Signature`], [`InclusionWitness`], [`DeprecationWitness`], [`FinalizationWitness`]
//! - **Exit model**: [`Exit`], [`ExitStatus`], [`Challenge`]
//! - **Journal**: [`ExitGameEvent`], [`EventRecord`]
//! - **Configuration**: [`ExitGameConfig`]
//! - **Errors**: [`ExitGameError`] with `EG_ERR_` prefix codes
//! - **Constants**: defaults for dispute windows and addresses

pub mod config;
pub mod constants;
pub mod error;
pub mod event;
pub mod exit;
pub mod ids;
pub mod state;

pub use config::*;
pub use error::*;
pub use event::*;
pub use exit::*;
pub use ids::*;
pub use state::*;

// Constants are accessed via `exitgame_types::constants::FOO`.
