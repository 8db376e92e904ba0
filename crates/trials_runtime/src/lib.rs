//! Async engine for timed skill challenges.
//!
//! A session runs as a tokio actor that owns its [`trials_core::SessionMachine`].
//! Content layers talk to it through the [`Capabilities`] trait, hosts through
//! a [`SessionHandle`]. The same trait is implemented by [`ManualSession`], a
//! deterministic driver on a virtual clock.
//!
//! # Example
//!
//! ```no_run
//! use trials_core::{PointKind, SessionConfig, Timeline};
//! use trials_runtime::{Capabilities, CycleOutcome, SessionBuilder};
//!
//! # async fn demo() -> Result<(), trials_runtime::EngineError> {
//! let mut handle = SessionBuilder::new(SessionConfig::for_game(Timeline::Past, "forge")).spawn();
//! let caps = handle.caps();
//! handle.start()?;
//! let cycle = handle.next_cycle().await.expect("announced");
//!
//! caps.add_points(100, 10.0, 20.0, PointKind::Perfect);
//! caps.end_game();
//!
//! if let CycleOutcome::Finished(outcome) = cycle.outcome().await {
//!     println!("{}", outcome.score());
//! }
//! handle.close().await
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod actor;
mod capability;
mod clock;
mod error;
mod handle;
mod manual;
mod outcome;

pub use capability::Capabilities;
pub use error::EngineError;
pub use handle::{ChallengeCaps, SessionBuilder, SessionHandle};
pub use manual::ManualSession;
pub use outcome::{CompletionSink, Cycle, CycleOutcome, FnSink};
