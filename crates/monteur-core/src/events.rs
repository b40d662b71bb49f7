//! Supervisor status events for UI surfaces.
//!
//! `StatusEvent` is what the supervisor publishes. `BackendStatus` is the
//! wire shape every UI surface receives:
//!
//! ```json
//! { "ok": false, "status": "timeout", "error": "Backend unavailable (timeout)" }
//! ```

use serde::{Deserialize, Serialize};

/// Phase reported by a status event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusPhase {
    /// A backend process was spawned and readiness polling began.
    Starting,
    /// The backend answered its liveness probe.
    Ready,
    /// The backend did not answer before the readiness deadline.
    Timeout,
    /// The backend exited outside of an explicit stop.
    Crashed,
    /// The backend could not be launched at all.
    LaunchFailed,
}

impl StatusPhase {
    /// Wire name of the phase.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Starting => "starting",
            Self::Ready => "ready",
            Self::Timeout => "timeout",
            Self::Crashed => "crashed",
            Self::LaunchFailed => "launch_failed",
        }
    }
}

impl std::fmt::Display for StatusPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An ephemeral supervisor outcome delivered to UI listeners.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusEvent {
    /// Whether the backend is usable.
    pub ok: bool,
    /// What happened.
    pub phase: StatusPhase,
    /// Human-readable detail, present for failures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// Exit code of a crashed backend, when the OS reported one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
}

impl StatusEvent {
    /// A backend process was spawned.
    pub const fn starting() -> Self {
        Self {
            ok: true,
            phase: StatusPhase::Starting,
            detail: None,
            exit_code: None,
        }
    }

    /// The backend passed its readiness probe.
    pub const fn ready() -> Self {
        Self {
            ok: true,
            phase: StatusPhase::Ready,
            detail: None,
            exit_code: None,
        }
    }

    /// The readiness deadline elapsed.
    pub fn timeout() -> Self {
        Self {
            ok: false,
            phase: StatusPhase::Timeout,
            detail: Some("Backend unavailable (timeout)".to_string()),
            exit_code: None,
        }
    }

    /// The backend exited unexpectedly.
    ///
    /// `signal` is only consulted when no exit code is available.
    pub fn crashed(exit_code: Option<i32>, signal: Option<i32>) -> Self {
        let detail = match (exit_code, signal) {
            (Some(code), _) => format!("Backend exited (code {code})"),
            (None, Some(signal)) => format!("Backend exited (signal {signal})"),
            (None, None) => "Backend exited (code unknown)".to_string(),
        };
        Self {
            ok: false,
            phase: StatusPhase::Crashed,
            detail: Some(detail),
            exit_code,
        }
    }

    /// The backend could not be launched.
    pub fn launch_failed(reason: impl Into<String>) -> Self {
        Self {
            ok: false,
            phase: StatusPhase::LaunchFailed,
            detail: Some(reason.into()),
            exit_code: None,
        }
    }

    /// Convert to the UI wire shape.
    pub fn to_wire(&self) -> BackendStatus {
        BackendStatus::from(self)
    }
}

/// Status notification shape delivered to every UI surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendStatus {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<&StatusEvent> for BackendStatus {
    fn from(event: &StatusEvent) -> Self {
        let status = match event.phase {
            StatusPhase::Ready => "ok",
            phase => phase.as_str(),
        };
        Self {
            ok: event.ok,
            status: Some(status.to_string()),
            error: if event.ok { None } else { event.detail.clone() },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ready_wire_shape() {
        let json = serde_json::to_string(&StatusEvent::ready().to_wire()).unwrap();
        assert_eq!(json, r#"{"ok":true,"status":"ok"}"#);
    }

    #[test]
    fn crash_detail_carries_exit_code() {
        let event = StatusEvent::crashed(Some(3), None);
        assert_eq!(event.detail.as_deref(), Some("Backend exited (code 3)"));
        assert_eq!(event.exit_code, Some(3));

        let wire = event.to_wire();
        assert!(!wire.ok);
        assert_eq!(wire.status.as_deref(), Some("crashed"));
        assert_eq!(wire.error.as_deref(), Some("Backend exited (code 3)"));
    }

    #[test]
    fn crash_by_signal_reports_signal() {
        let event = StatusEvent::crashed(None, Some(9));
        assert_eq!(event.detail.as_deref(), Some("Backend exited (signal 9)"));
        assert_eq!(event.exit_code, None);
    }

    #[test]
    fn event_serialization_uses_snake_case_phase() {
        let json = serde_json::to_string(&StatusEvent::launch_failed("no python")).unwrap();
        assert!(json.contains(r#""phase":"launch_failed""#));
        assert!(json.contains(r#""detail":"no python""#));
        assert!(!json.contains("exitCode"));
    }
}
