//! Audit side channel.
//!
//! Business code invokes [`AuditSink::record`] after each state
//! transition. The call is fire-and-forget: sinks must not block the
//! caller and must not propagate failures.

use serde::Serialize;
use shared_types::UserId;

/// One observed state transition.
#[derive(Clone, Debug, Serialize)]
pub struct AuditEvent {
    /// Acting user, when the transition has one.
    pub actor: Option<UserId>,
    /// Verb, e.g. `settings.update`, `withdrawal.approve`.
    pub action: String,
    /// Affected document, e.g. `users/<id>`.
    pub subject: String,
    pub detail: serde_json::Value,
}

impl AuditEvent {
    pub fn new(
        actor: Option<UserId>,
        action: impl Into<String>,
        subject: impl Into<String>,
        detail: serde_json::Value,
    ) -> Self {
        Self {
            actor,
            action: action.into(),
            subject: subject.into(),
            detail,
        }
    }
}

/// Observer of business state transitions. Infallible by contract.
pub trait AuditSink: Send + Sync {
    fn record(&self, event: AuditEvent);
}

/// Sink that emits audit events as structured log lines.
#[derive(Default)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&self, event: AuditEvent) {
        tracing::info!(
            target: "uplinq::audit",
            actor = ?event.actor,
            action = %event.action,
            subject = %event.subject,
            detail = %event.detail,
            "audit"
        );
    }
}

/// Sink that drops everything. For tests.
#[derive(Default)]
pub struct NullAuditSink;

impl AuditSink for NullAuditSink {
    fn record(&self, _event: AuditEvent) {}
}
