pub mod simulator;

pub use simulator::{FailurePolicy, RandomFailure, ScriptedFailure, TransportSimulator};
