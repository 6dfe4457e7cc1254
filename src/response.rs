use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Success half of the response envelope: `{ "success": true, "message"?, ...payload }`.
///
/// `T` must serialize as a map; its fields are flattened next to `success`.
#[derive(Debug)]
pub struct Envelope<T> {
    status: StatusCode,
    message: Option<&'static str>,
    payload: T,
}

#[derive(Serialize)]
struct Wire<'a, T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'a str>,
    #[serde(flatten)]
    payload: &'a T,
}

impl<T> Envelope<T> {
    pub fn ok(payload: T) -> Self {
        Self {
            status: StatusCode::OK,
            message: None,
            payload,
        }
    }

    pub fn created(payload: T) -> Self {
        Self {
            status: StatusCode::CREATED,
            message: None,
            payload,
        }
    }

    pub fn with_message(mut self, message: &'static str) -> Self {
        self.message = Some(message);
        self
    }
}

impl<T: Serialize> IntoResponse for Envelope<T> {
    fn into_response(self) -> Response {
        let wire = Wire {
            success: true,
            message: self.message,
            payload: &self.payload,
        };
        (self.status, Json(wire)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct TokenBody {
        token: &'static str,
    }

    #[tokio::test]
    async fn flattens_payload_next_to_success_flag() {
        let res = Envelope::created(TokenBody { token: "abc" })
            .with_message("welcome")
            .into_response();
        assert_eq!(res.status(), StatusCode::CREATED);
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "success": true, "message": "welcome", "token": "abc" })
        );
    }

    #[tokio::test]
    async fn omits_message_when_absent() {
        let res = Envelope::ok(TokenBody { token: "t" }).into_response();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert!(json.get("message").is_none());
    }
}
