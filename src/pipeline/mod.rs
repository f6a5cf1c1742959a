//! Question pipeline and its user-facing outcomes.

pub mod orchestrator;
pub mod response;

pub use orchestrator::Pipeline;
pub use response::{
    Outcome, OutputMode, BLANK_INPUT_MSG, HELP_MSG, SMALLTALK_MSG, UNKNOWN_INTENT_MSG,
    UNSAFE_SQL_MSG,
};
