//! # exitgame-chain
//!
//! **Base-ledger collaborators** the exit game is built on. The exit game
//! only talks to them through narrow traits:
//!
//! 1. **[`Ledger`]**: token balances, transfers and spending approvals
//! 2. **[`CommitmentLog`]**: append-only log of operator-committed blocks
//!    with inclusion checks
//! 3. **[`Clock`]**: the monotonically non-decreasing ledger height
//!
//! Each trait ships with an in-memory stand-in ([`InMemoryLedger`],
//! [`CommitmentChain`], [`ManualClock`]) suitable for simulation and tests.
//! The commitment chain stores whole blocks and checks membership by scan;
//! an authenticated structure can replace it behind the same trait.

pub mod clock;
pub mod commitment;
pub mod ledger;

pub use clock::{Clock, ManualClock};
pub use commitment::{Block, CommitmentChain, CommitmentLog};
pub use ledger::{InMemoryLedger, Ledger};
