//! Submission outcome surfaced to the caller

use std::collections::BTreeMap;
use std::time::Duration;

/// Field name to human-readable message; never empty when reported
pub type FieldErrors = BTreeMap<String, String>;

/// Why a submission was not accepted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    /// The form's attempt budget for the current window is spent
    RateLimited { retry_after: Duration },
    /// One or more fields broke their schema rules; nothing was sent
    ValidationFailed(FieldErrors),
    /// The POST to the collector failed before a response arrived
    NetworkFailure,
    /// The collector answered with a non-success status.
    ///
    /// Only produced under the verified acknowledgment policy. With the
    /// default optimistic policy a remote rejection is indistinguishable from
    /// success and is reported as [`SubmissionOutcome::Accepted`].
    RemoteRejected { status: u16 },
}

impl RejectReason {
    /// Stable machine-readable label
    pub fn label(&self) -> &'static str {
        match self {
            RejectReason::RateLimited { .. } => "rate_limited",
            RejectReason::ValidationFailed(_) => "validation_failed",
            RejectReason::NetworkFailure => "network_failure",
            RejectReason::RemoteRejected { .. } => "remote_rejected",
        }
    }
}

/// Result of running one submission through the pipeline.
///
/// `Accepted` means the collector was reached without a transport error. It
/// does not prove the collector kept the data: the collector's response is
/// opaque, so a payload it silently discards is still `Accepted`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionOutcome {
    Accepted,
    Rejected(RejectReason),
}

impl SubmissionOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, SubmissionOutcome::Accepted)
    }

    pub fn reason(&self) -> Option<&RejectReason> {
        match self {
            SubmissionOutcome::Accepted => None,
            SubmissionOutcome::Rejected(reason) => Some(reason),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SubmissionOutcome::Accepted => "accepted",
            SubmissionOutcome::Rejected(reason) => reason.label(),
        }
    }

    /// Short headline for the notification shown to the user
    pub fn title(&self) -> &'static str {
        match self {
            SubmissionOutcome::Accepted => "Message sent successfully!",
            SubmissionOutcome::Rejected(RejectReason::RateLimited { .. }) => "Too many attempts",
            SubmissionOutcome::Rejected(RejectReason::ValidationFailed(_)) => {
                "Please check the highlighted fields"
            }
            SubmissionOutcome::Rejected(_) => "Error sending message",
        }
    }

    /// Longer description for the notification shown to the user
    pub fn user_message(&self) -> String {
        match self {
            SubmissionOutcome::Accepted => {
                "Thank you for reaching out. We'll get back to you soon.".to_string()
            }
            SubmissionOutcome::Rejected(RejectReason::RateLimited { retry_after }) => {
                let minutes = retry_after.as_secs().div_ceil(60).max(1);
                let unit = if minutes == 1 { "minute" } else { "minutes" };
                format!("Please wait {} {} before submitting again.", minutes, unit)
            }
            SubmissionOutcome::Rejected(RejectReason::ValidationFailed(errors)) => {
                let count = errors.len();
                let noun = if count == 1 { "field needs" } else { "fields need" };
                format!("{} {} attention before the form can be sent.", count, noun)
            }
            SubmissionOutcome::Rejected(_) => {
                "Please try again later. If the problem persists, contact us directly.".to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limited_message_rounds_up() {
        let outcome = SubmissionOutcome::Rejected(RejectReason::RateLimited {
            retry_after: Duration::from_secs(241),
        });
        assert_eq!(outcome.user_message(), "Please wait 5 minutes before submitting again.");

        let outcome = SubmissionOutcome::Rejected(RejectReason::RateLimited {
            retry_after: Duration::from_millis(500),
        });
        assert_eq!(outcome.user_message(), "Please wait 1 minute before submitting again.");
    }

    #[test]
    fn test_labels() {
        assert_eq!(SubmissionOutcome::Accepted.label(), "accepted");
        assert_eq!(
            SubmissionOutcome::Rejected(RejectReason::NetworkFailure).label(),
            "network_failure"
        );
        assert!(SubmissionOutcome::Accepted.reason().is_none());
    }
}
