mod aggregator;
mod block_state;
mod decision;
mod engine;
mod grace;

pub use aggregator::{CycleOutcome, CycleReport, SkipReason, UsageAggregator};
pub use block_state::{BlockSnapshot, BlockState, BlockStateWriter};
pub use decision::{AllowPattern, DecisionOutcome, DecisionProtocol, ForegroundPolicy};
pub use engine::{BlockingEffectSink, EngineHandle, FocusEngine, LoggingSink};
pub use grace::{EscapeHatch, GraceStore, DEFAULT_GRACE_PERIOD_MINUTES, DEFAULT_SWEEP_INTERVAL};
