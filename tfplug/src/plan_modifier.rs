use crate::schema::{PlanModifier, PlanModifierRequest, PlanModifierResponse};
use crate::types::Dynamic;

/// Marks an attribute as requiring replacement when it changes
///
/// Creation (null prior state) and unknown plan values never trigger
/// replacement.
pub struct RequiresReplace;

impl PlanModifier for RequiresReplace {
    fn description(&self) -> String {
        "changing this value forces the resource to be replaced".to_string()
    }

    fn modify(&self, request: PlanModifierRequest) -> PlanModifierResponse {
        let requires_replace = !matches!(
            (&request.state_value, &request.plan_value),
            (Dynamic::Null, _) | (Dynamic::Unknown, _) | (_, Dynamic::Unknown)
        ) && request.state_value != request.plan_value;

        PlanModifierResponse {
            plan_value: request.plan_value,
            requires_replace,
            diagnostics: vec![],
        }
    }
}

/// A plan modifier that uses the current state value when the planned value is unknown
///
/// Useful for computed attributes such as ids that never change once the
/// remote object exists.
pub struct UseStateForUnknown;

impl PlanModifier for UseStateForUnknown {
    fn description(&self) -> String {
        "once set, the value of this attribute in state will not change".to_string()
    }

    fn modify(&self, request: PlanModifierRequest) -> PlanModifierResponse {
        let plan_value = match (&request.plan_value, &request.state_value) {
            (Dynamic::Unknown, Dynamic::Null) => request.plan_value,
            (Dynamic::Unknown, state) => state.clone(),
            _ => request.plan_value,
        };

        PlanModifierResponse {
            plan_value,
            requires_replace: false,
            diagnostics: vec![],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AttributePath;

    fn request(state: Dynamic, plan: Dynamic) -> PlanModifierRequest {
        PlanModifierRequest {
            config_value: plan.clone(),
            state_value: state,
            plan_value: plan,
            path: AttributePath::new("attr"),
        }
    }

    #[test]
    fn requires_replace_when_value_changes() {
        let response = RequiresReplace.modify(request(
            Dynamic::String("reusable".to_string()),
            Dynamic::String("one-off".to_string()),
        ));
        assert!(response.requires_replace);
        assert_eq!(response.plan_value, Dynamic::String("one-off".to_string()));
    }

    #[test]
    fn requires_replace_ignores_unchanged_create_and_unknown() {
        let same = RequiresReplace.modify(request(
            Dynamic::String("key".to_string()),
            Dynamic::String("key".to_string()),
        ));
        assert!(!same.requires_replace);

        let create = RequiresReplace.modify(request(
            Dynamic::Null,
            Dynamic::String("key".to_string()),
        ));
        assert!(!create.requires_replace);

        let unknown = RequiresReplace.modify(request(
            Dynamic::String("key".to_string()),
            Dynamic::Unknown,
        ));
        assert!(!unknown.requires_replace);
    }

    #[test]
    fn use_state_for_unknown_copies_prior_state() {
        let response = UseStateForUnknown.modify(request(
            Dynamic::String("grp-1".to_string()),
            Dynamic::Unknown,
        ));
        assert_eq!(response.plan_value, Dynamic::String("grp-1".to_string()));
        assert!(!response.requires_replace);
    }

    #[test]
    fn use_state_for_unknown_keeps_unknown_on_create() {
        let response = UseStateForUnknown.modify(request(Dynamic::Null, Dynamic::Unknown));
        assert_eq!(response.plan_value, Dynamic::Unknown);
    }

    #[test]
    fn use_state_for_unknown_leaves_known_plan_alone() {
        let response = UseStateForUnknown.modify(request(
            Dynamic::Bool(false),
            Dynamic::Bool(true),
        ));
        assert_eq!(response.plan_value, Dynamic::Bool(true));
    }
}
