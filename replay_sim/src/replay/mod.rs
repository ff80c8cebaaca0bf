//! The replay core: one simulator per instrument, shared handles for
//! cross-thread readers, and a coordinator for multi-instrument lockstep.

pub mod coordinator;
pub mod shared;
pub mod simulator;

pub use coordinator::{LockstepMode, ReplayCoordinator, TickOutcome, TickReport, TickSummary};
pub use shared::{PastWindow, ReplayReader, ReplayWriter, SharedStep};
pub use simulator::{EmptyPastPolicy, ReplaySimulator, ReplaySnapshot, ReplayState, Step};
