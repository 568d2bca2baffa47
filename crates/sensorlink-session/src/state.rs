//! Session lifecycle states.
//!
//! # Valid Transitions
//!
//! - Idle/Failed → Connecting (`start()`)
//! - Connecting → Active (transport opened)
//! - Connecting → Failed (transport open failed)
//! - Connecting/Active → Stopping (`stop()`)
//! - Active/Stopping → Failed (I/O or codec error in the loop)
//! - Stopping → Idle (loop observed the stop and closed the transport)
//!
//! ```
//! use sensorlink_session::SessionState;
//!
//! assert!(SessionState::Idle.can_transition_to(&SessionState::Connecting));
//! assert!(!SessionState::Active.can_transition_to(&SessionState::Connecting));
//! ```

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// No worker running; ready to start.
    Idle,

    /// Worker is opening the transport.
    Connecting,

    /// Transport open; worker is exchanging messages.
    Active,

    /// `stop()` was called; worker exits at its next iteration boundary.
    Stopping,

    /// Worker ended on an error; ready to be restarted.
    Failed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state_str = match self {
            SessionState::Idle => "Idle",
            SessionState::Connecting => "Connecting",
            SessionState::Active => "Active",
            SessionState::Stopping => "Stopping",
            SessionState::Failed => "Failed",
        };
        write!(f, "{}", state_str)
    }
}

impl SessionState {
    /// Check if transition to target state is valid from this state.
    pub fn can_transition_to(&self, target: &SessionState) -> bool {
        matches!(
            (self, target),
            (SessionState::Idle | SessionState::Failed, SessionState::Connecting)
                | (
                    SessionState::Connecting,
                    SessionState::Active | SessionState::Failed | SessionState::Stopping
                )
                | (SessionState::Active, SessionState::Stopping | SessionState::Failed)
                | (SessionState::Stopping, SessionState::Idle | SessionState::Failed)
        )
    }

    /// Whether a worker thread owns the session in this state.
    #[must_use]
    pub fn is_running(&self) -> bool {
        matches!(
            self,
            SessionState::Connecting | SessionState::Active | SessionState::Stopping
        )
    }
}
