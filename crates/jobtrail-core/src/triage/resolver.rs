//! Stage transition resolution.
//!
//! Pure mapping from what an approval asks for (an explicit target, a
//! legacy alias, the message's suggestion, or nothing but the classified
//! type) to the concrete transition to record. Every mapping is an
//! exhaustive match: a new classifier category that reaches this module
//! without a mapping is a compile error, not a silent no-op.

use super::model::{MessageType, StageTarget};
use crate::jobs::{ApplicationStage, StageOutcome};

/// Reason code recorded when a human explicitly picked or confirmed the
/// destination (caller-supplied target, or the message's suggestion).
pub const REASON_MANUAL_LINKED: &str = "post_application_manual_linked";

/// A resolved transition, ready to apply.
///
/// `to_stage = None` means "link only": the message gets tied to the job
/// but no stage event is appended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedTransition {
    /// Stage to move the job to, or `None` for a no-op transition.
    pub to_stage: Option<ApplicationStage>,
    /// Terminal outcome to record with the event.
    pub outcome: Option<StageOutcome>,
    /// Machine-readable reason recorded in the event metadata.
    pub reason_code: &'static str,
}

/// Where the effective target came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetSource {
    /// The caller named a target in the approval request.
    Caller,
    /// The message carried a suggested target from ingestion.
    Suggested,
    /// Derived from the message's classified type.
    Classified,
}

/// Picks the effective target for an approval.
///
/// Order: explicit `stage_target`, else the legacy `to_stage` alias, else
/// the message's persisted suggestion, else a target derived from the
/// classified type.
#[must_use]
pub fn effective_target(
    explicit: Option<StageTarget>,
    legacy: Option<StageTarget>,
    suggested: Option<StageTarget>,
    message_type: MessageType,
) -> (StageTarget, TargetSource) {
    if let Some(target) = explicit.or(legacy) {
        return (target, TargetSource::Caller);
    }
    if let Some(target) = suggested {
        return (target, TargetSource::Suggested);
    }
    (target_for_message_type(message_type), TargetSource::Classified)
}

/// Derives a target from a classified message type.
#[must_use]
pub const fn target_for_message_type(message_type: MessageType) -> StageTarget {
    match message_type {
        MessageType::Confirmation | MessageType::Unknown => StageTarget::NoChange,
        MessageType::Rejection => StageTarget::Rejected,
        MessageType::PhoneScreen => StageTarget::PhoneScreen,
        MessageType::Interview => StageTarget::Interview,
        MessageType::Offer => StageTarget::Offer,
    }
}

/// Maps a target to its concrete transition.
#[must_use]
pub const fn resolve_target(target: StageTarget) -> ResolvedTransition {
    match target {
        StageTarget::NoChange => ResolvedTransition {
            to_stage: None,
            outcome: None,
            reason_code: "post_application_no_change",
        },
        StageTarget::PhoneScreen => ResolvedTransition {
            to_stage: Some(ApplicationStage::PhoneScreen),
            outcome: None,
            reason_code: "post_application_phone_screen",
        },
        StageTarget::Interview => ResolvedTransition {
            to_stage: Some(ApplicationStage::Interview),
            outcome: None,
            reason_code: "post_application_interview",
        },
        StageTarget::Offer => ResolvedTransition {
            to_stage: Some(ApplicationStage::Offer),
            outcome: None,
            reason_code: "post_application_offer",
        },
        StageTarget::Rejected => ResolvedTransition {
            to_stage: Some(ApplicationStage::Closed),
            outcome: Some(StageOutcome::Rejected),
            reason_code: "post_application_rejection",
        },
    }
}

/// Resolves an approval's full argument set to one transition.
///
/// Human-picked and human-confirmed targets record the manual-link reason
/// code; only type-derived targets keep their type-specific code.
#[must_use]
pub fn resolve_decision(
    explicit: Option<StageTarget>,
    legacy: Option<StageTarget>,
    suggested: Option<StageTarget>,
    message_type: MessageType,
) -> ResolvedTransition {
    let (target, source) = effective_target(explicit, legacy, suggested, message_type);
    let mut transition = resolve_target(target);
    if matches!(source, TargetSource::Caller | TargetSource::Suggested) {
        transition.reason_code = REASON_MANUAL_LINKED;
    }
    transition
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Every classifier category must map to a target and every target to
    /// a transition; both mappings are compile-time exhaustive, and this
    /// pins the table itself.
    #[test]
    fn test_every_message_type_resolves() {
        let cases = [
            (MessageType::Confirmation, StageTarget::NoChange),
            (MessageType::Rejection, StageTarget::Rejected),
            (MessageType::PhoneScreen, StageTarget::PhoneScreen),
            (MessageType::Interview, StageTarget::Interview),
            (MessageType::Offer, StageTarget::Offer),
            (MessageType::Unknown, StageTarget::NoChange),
        ];

        for (message_type, expected) in cases {
            assert_eq!(target_for_message_type(message_type), expected);
            // Resolution must succeed for the derived target too.
            let _ = resolve_target(expected);
        }
    }

    #[test]
    fn test_no_change_is_link_only() {
        let transition = resolve_target(StageTarget::NoChange);
        assert_eq!(transition.to_stage, None);
        assert_eq!(transition.outcome, None);
    }

    #[test]
    fn test_rejection_closes_with_outcome() {
        let transition = resolve_target(StageTarget::Rejected);
        assert_eq!(transition.to_stage, Some(ApplicationStage::Closed));
        assert_eq!(transition.outcome, Some(StageOutcome::Rejected));
        assert_eq!(transition.reason_code, "post_application_rejection");
    }

    #[test]
    fn test_effective_target_order() {
        // Explicit beats everything.
        let (target, source) = effective_target(
            Some(StageTarget::Offer),
            Some(StageTarget::Interview),
            Some(StageTarget::PhoneScreen),
            MessageType::Rejection,
        );
        assert_eq!(target, StageTarget::Offer);
        assert_eq!(source, TargetSource::Caller);

        // Legacy alias fills in for a missing explicit target.
        let (target, source) = effective_target(
            None,
            Some(StageTarget::Interview),
            Some(StageTarget::PhoneScreen),
            MessageType::Rejection,
        );
        assert_eq!(target, StageTarget::Interview);
        assert_eq!(source, TargetSource::Caller);

        // Then the message's suggestion.
        let (target, source) = effective_target(
            None,
            None,
            Some(StageTarget::PhoneScreen),
            MessageType::Rejection,
        );
        assert_eq!(target, StageTarget::PhoneScreen);
        assert_eq!(source, TargetSource::Suggested);

        // Finally the classified type.
        let (target, source) = effective_target(None, None, None, MessageType::Rejection);
        assert_eq!(target, StageTarget::Rejected);
        assert_eq!(source, TargetSource::Classified);
    }

    #[test]
    fn test_manual_reason_for_human_picked_targets() {
        let caller = resolve_decision(Some(StageTarget::Interview), None, None, MessageType::Unknown);
        assert_eq!(caller.reason_code, REASON_MANUAL_LINKED);

        let suggested =
            resolve_decision(None, None, Some(StageTarget::Interview), MessageType::Unknown);
        assert_eq!(suggested.reason_code, REASON_MANUAL_LINKED);

        let classified = resolve_decision(None, None, None, MessageType::Interview);
        assert_eq!(classified.reason_code, "post_application_interview");
    }
}
