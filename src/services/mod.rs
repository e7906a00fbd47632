//! Services: matching, correlation, recovery and the timers around them.

pub mod auxiliary;
pub mod command_dispatch;
pub mod correlator;
pub mod cycle_scheduler;
pub mod group_remediation;
pub mod notification_queue;
pub mod recovery_orchestrator;
pub mod response_matcher;
pub mod shutdown;

pub use command_dispatch::CommandDispatch;
pub use correlator::{
    CooldownCorrelator, CooldownProtocol, Correlator, ReplyProtocol, StatusCorrelator,
    StatusProtocol,
};
pub use notification_queue::NotificationQueue;
pub use recovery_orchestrator::RecoveryOrchestrator;
pub use response_matcher::{MatchOutcome, ResponseMatcher};
