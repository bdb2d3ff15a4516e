//! Resource implementations

pub mod group;
pub mod route;
pub mod setup_key;

pub use group::GroupResource;
pub use route::RouteResource;
pub use setup_key::SetupKeyResource;

use tfplug::types::Diagnostic;

use crate::api::ApiError;

/// Diagnostic for a failed call to the `<op>` API
pub(crate) fn api_error_diagnostic(op: &str, err: &ApiError) -> Diagnostic {
    match err {
        ApiError::UnexpectedStatus { status, body } => Diagnostic::error(
            format!(
                "unexpected response from {} API. Got an unexpected response code {}",
                op, status
            ),
            body.clone(),
        ),
        ApiError::Parse(e) => Diagnostic::error(
            format!("failure to decode {} API response", op),
            e.to_string(),
        ),
        ApiError::Request(_) | ApiError::InvalidUrl(_) => {
            Diagnostic::error(format!("failure to invoke {} API", op), err.to_string())
        }
    }
}

pub(crate) fn not_configured() -> Diagnostic {
    Diagnostic::error(
        "Provider not configured",
        "Provider data was not properly configured",
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unexpected_status_keeps_code_and_body() {
        let diag = api_error_diagnostic(
            "get route",
            &ApiError::UnexpectedStatus {
                status: 404,
                body: r#"{"message":"not found"}"#.to_string(),
            },
        );
        assert_eq!(
            diag.summary,
            "unexpected response from get route API. Got an unexpected response code 404"
        );
        assert_eq!(diag.detail, r#"{"message":"not found"}"#);
    }

    #[test]
    fn transport_failures_name_the_operation() {
        let diag = api_error_diagnostic(
            "create group",
            &ApiError::InvalidUrl("not a url".to_string()),
        );
        assert_eq!(diag.summary, "failure to invoke create group API");
        assert!(diag.detail.contains("not a url"));
    }
}
