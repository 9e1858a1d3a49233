use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum::Json;
use serde::Serialize;
use serde_json::json;

/// Outcome of a page handler: a template with its view model, or a redirect.
///
/// Templates live in the front end; this service only names them.
#[derive(Debug)]
pub enum View {
    Render {
        template: &'static str,
        status: StatusCode,
        data: serde_json::Value,
    },
    Redirect(String),
}

impl View {
    pub fn render(template: &'static str, data: impl Serialize) -> Self {
        View::Render {
            template,
            status: StatusCode::OK,
            data: serde_json::to_value(data).unwrap_or(serde_json::Value::Null),
        }
    }

    pub fn redirect(to: impl Into<String>) -> Self {
        View::Redirect(to.into())
    }

    pub fn with_status(self, status: StatusCode) -> Self {
        match self {
            View::Render { template, data, .. } => View::Render {
                template,
                status,
                data,
            },
            other => other,
        }
    }

    /// The "you've already done this" page for one-shot onboarding steps.
    pub fn already_submitted(message: &str, link: &str) -> Self {
        View::render(
            "error-with-link",
            json!({
                "error_message": message,
                "link": {
                    "href": link,
                    "text": "Back to dashboard",
                },
            }),
        )
    }
}

impl IntoResponse for View {
    fn into_response(self) -> Response {
        match self {
            View::Render {
                template,
                status,
                data,
            } => (
                status,
                Json(json!({
                    "template": template,
                    "data": data,
                })),
            )
                .into_response(),
            View::Redirect(to) => Redirect::to(&to).into_response(),
        }
    }
}
