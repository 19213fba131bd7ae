//! HTTP quiz service backend.
//!
//! Talks to the quiz REST service: `/quizzes`, `/quizzes/{id}`, `/results`,
//! `/my-results`, `/login-cookie` and `/logout`. Authenticated calls carry
//! the access token as the `access_token` cookie.

use async_trait::async_trait;
use reqwest::header::{COOKIE, SET_COOKIE};
use reqwest::{RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::instrument;

use quizlingo_core::error::BackendError;
use quizlingo_core::model::{QuizRecord, QuizSummary, ResultSubmission};
use quizlingo_core::traits::{HistorySource, QuizPublisher, QuizSource, ResultSink};

const DEFAULT_BASE_URL: &str = "https://127.0.0.1:8000";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const TOKEN_COOKIE: &str = "access_token";

/// Remote quiz service.
pub struct HttpBackend {
    base_url: String,
    access_token: Option<String>,
    client: reqwest::Client,
}

impl HttpBackend {
    pub fn new(base_url: &str, access_token: Option<String>) -> anyhow::Result<Self> {
        let base = if base_url.is_empty() {
            DEFAULT_BASE_URL
        } else {
            base_url
        };

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .map_err(|e| anyhow::anyhow!("failed to build HTTP client: {e}"))?;

        Ok(Self {
            base_url: base.trim_end_matches('/').to_string(),
            access_token: access_token.filter(|t| !t.is_empty()),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Exchange credentials for an access token.
    #[instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> anyhow::Result<String> {
        let url = Url::parse_with_params(
            &format!("{}/login-cookie", self.base_url),
            &[("username", username), ("password", password)],
        )?;
        let response = self.send(self.client.post(url)).await.map_err(|e| match e {
            BackendError::ApiError { status: 400, .. } => {
                BackendError::Unauthorized(format!("wrong password for {username}"))
            }
            other => other,
        })?;

        response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .find_map(|cookie| {
                cookie
                    .split(';')
                    .next()
                    .and_then(|pair| pair.trim().strip_prefix("access_token="))
                    .map(str::to_string)
            })
            .ok_or_else(|| {
                BackendError::ApiError {
                    status: 0,
                    message: "login response did not set an access token".into(),
                }
                .into()
            })
    }

    /// Revoke the configured access token on the server.
    #[instrument(skip(self))]
    pub async fn logout(&self) -> anyhow::Result<()> {
        if self.access_token.is_none() {
            return Err(BackendError::Unauthorized("no access token to log out".into()).into());
        }
        let request = self.client.post(format!("{}/logout", self.base_url));
        self.send(self.authorized(request)).await?;
        Ok(())
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.access_token {
            Some(token) => request.header(COOKIE, format!("{TOKEN_COOKIE}={token}")),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, BackendError> {
        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                BackendError::Timeout(DEFAULT_TIMEOUT_SECS)
            } else if e.is_connect() {
                BackendError::NetworkError(format!(
                    "quiz service not reachable at {}",
                    self.base_url
                ))
            } else {
                BackendError::NetworkError(e.to_string())
            }
        })?;

        let status = response.status().as_u16();
        if status < 400 {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ServiceError>(&body)
            .map(|e| e.detail)
            .unwrap_or(body);
        Err(match status {
            401 | 403 => BackendError::Unauthorized(message),
            404 => BackendError::NotFound(message),
            _ => BackendError::ApiError { status, message },
        })
    }

    async fn json<T: DeserializeOwned>(response: Response) -> Result<T, BackendError> {
        response.json().await.map_err(|e| BackendError::ApiError {
            status: 0,
            message: format!("failed to parse response: {e}"),
        })
    }
}

#[derive(Deserialize)]
struct ServiceError {
    detail: String,
}

#[derive(Deserialize)]
struct CreatedResponse {
    id: u64,
}

#[async_trait]
impl QuizSource for HttpBackend {
    fn name(&self) -> &str {
        "http"
    }

    #[instrument(skip(self))]
    async fn list_quizzes(&self) -> anyhow::Result<Vec<QuizSummary>> {
        let request = self.client.get(format!("{}/quizzes", self.base_url));
        let response = self.send(self.authorized(request)).await?;
        Ok(Self::json(response).await?)
    }

    #[instrument(skip(self))]
    async fn fetch_quiz(&self, id: u64) -> anyhow::Result<QuizRecord> {
        let request = self.client.get(format!("{}/quizzes/{id}", self.base_url));
        let response = self.send(self.authorized(request)).await?;
        let mut record: QuizRecord = Self::json(response).await?;
        record.id.get_or_insert(id);
        Ok(record)
    }
}

#[async_trait]
impl QuizPublisher for HttpBackend {
    #[instrument(skip(self, quiz), fields(title = %quiz.title))]
    async fn publish_quiz(&self, quiz: &QuizRecord) -> anyhow::Result<u64> {
        let request = self
            .client
            .post(format!("{}/quizzes", self.base_url))
            .json(quiz);
        let response = self.send(self.authorized(request)).await?;
        let created: CreatedResponse = Self::json(response).await?;
        Ok(created.id)
    }
}

#[async_trait]
impl ResultSink for HttpBackend {
    #[instrument(skip(self, submission), fields(quiz = %submission.quiz_title))]
    async fn submit_result(&self, submission: &ResultSubmission) -> anyhow::Result<()> {
        let request = self
            .client
            .post(format!("{}/results", self.base_url))
            .json(submission);
        self.send(self.authorized(request)).await?;
        Ok(())
    }
}

#[async_trait]
impl HistorySource for HttpBackend {
    #[instrument(skip(self))]
    async fn history(&self) -> anyhow::Result<Vec<ResultSubmission>> {
        let request = self.client.get(format!("{}/my-results", self.base_url));
        let response = self.send(self.authorized(request)).await?;
        Ok(Self::json(response).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn backend(server: &MockServer, token: Option<&str>) -> HttpBackend {
        HttpBackend::new(&server.uri(), token.map(str::to_string)).unwrap()
    }

    #[tokio::test]
    async fn fetch_quiz_fills_in_id() {
        let server = MockServer::start().await;

        let body = serde_json::json!({
            "title": "Kitchen",
            "result_names": ["Spoon", "Fork"],
            "questions": [
                {"text": "Soup?", "options": [
                    {"text": "yes", "result_index": 0},
                    {"text": "no", "result_index": 1}
                ]}
            ],
            "author": "admin"
        });

        Mock::given(method("GET"))
            .and(path("/quizzes/4"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&body))
            .mount(&server)
            .await;

        let record = backend(&server, None).fetch_quiz(4).await.unwrap();
        assert_eq!(record.id, Some(4));
        assert_eq!(record.result_names, vec!["Spoon", "Fork"]);
        assert_eq!(record.questions[0].options.len(), 2);
    }

    #[tokio::test]
    async fn missing_quiz_is_not_found() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/quizzes/9"))
            .respond_with(
                ResponseTemplate::new(404).set_body_json(serde_json::json!({"detail": "Not found"})),
            )
            .mount(&server)
            .await;

        let err = backend(&server, None).fetch_quiz(9).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<BackendError>(),
            Some(BackendError::NotFound(message)) if message == "Not found"
        ));
    }

    #[tokio::test]
    async fn submit_result_sends_cookie_and_body() {
        let server = MockServer::start().await;
        let submission = ResultSubmission {
            quiz_title: "Kitchen".into(),
            result_text: "Spoon".into(),
            date: "19.10.2026".into(),
        };

        Mock::given(method("POST"))
            .and(path("/results"))
            .and(header("cookie", "access_token=tok-123"))
            .and(body_json(serde_json::json!({
                "quiz_title": "Kitchen",
                "result_text": "Spoon",
                "date": "19.10.2026"
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"message": "Saved"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        backend(&server, Some("tok-123"))
            .submit_result(&submission)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn unauthenticated_submit_is_permanent() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/results"))
            .respond_with(
                ResponseTemplate::new(401)
                    .set_body_json(serde_json::json!({"detail": "Auth required"})),
            )
            .mount(&server)
            .await;

        let submission = ResultSubmission {
            quiz_title: "Kitchen".into(),
            result_text: "Fork".into(),
            date: "19.10.2026".into(),
        };
        let err = backend(&server, None)
            .submit_result(&submission)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Auth required"));
        assert!(quizlingo_core::error::is_permanent(&err));
    }

    #[tokio::test]
    async fn server_error_is_transient() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/my-results"))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .mount(&server)
            .await;

        let err = backend(&server, Some("t")).history().await.unwrap_err();
        assert!(err.to_string().contains("HTTP 503"));
        assert!(!quizlingo_core::error::is_permanent(&err));
    }

    #[tokio::test]
    async fn list_and_history() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/quizzes"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"id": 0, "title": "Kitchen", "author": "admin"},
                {"id": 1, "title": "Weather"}
            ])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/my-results"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"quiz_title": "Kitchen", "result_text": "Spoon", "date": "01.10.2026", "username": "admin"}
            ])))
            .mount(&server)
            .await;

        let backend = backend(&server, Some("t"));
        let quizzes = backend.list_quizzes().await.unwrap();
        assert_eq!(quizzes.len(), 2);
        assert_eq!(quizzes[1].author, "Unknown");

        let history = backend.history().await.unwrap();
        assert_eq!(history[0].result_text, "Spoon");
    }

    #[tokio::test]
    async fn publish_returns_new_id() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/quizzes"))
            .and(header("cookie", "access_token=t"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"message": "Created", "id": 7})),
            )
            .mount(&server)
            .await;

        let quiz = QuizRecord {
            id: None,
            title: "New".into(),
            result_names: vec!["A".into(), "B".into()],
            questions: vec![],
            author: None,
        };
        assert_eq!(backend(&server, Some("t")).publish_quiz(&quiz).await.unwrap(), 7);
    }

    #[tokio::test]
    async fn login_extracts_token_cookie() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/login-cookie"))
            .and(query_param("username", "admin"))
            .and(query_param("password", "123"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header(
                        "set-cookie",
                        "access_token=abc.def; HttpOnly; Path=/; SameSite=none; Secure",
                    )
                    .set_body_json(serde_json::json!({"message": "Logged in", "username": "admin"})),
            )
            .mount(&server)
            .await;

        let token = backend(&server, None).login("admin", "123").await.unwrap();
        assert_eq!(token, "abc.def");
    }

    #[tokio::test]
    async fn login_wrong_password() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/login-cookie"))
            .respond_with(
                ResponseTemplate::new(400)
                    .set_body_json(serde_json::json!({"detail": "Wrong password"})),
            )
            .mount(&server)
            .await;

        let err = backend(&server, None).login("admin", "nope").await.unwrap_err();
        assert!(err.to_string().contains("authentication required"));
    }

    #[tokio::test]
    async fn logout_sends_token_cookie() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/logout"))
            .and(header("cookie", "access_token=abc.def"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("set-cookie", "access_token=\"\"; Max-Age=0; Path=/")
                    .set_body_json(serde_json::json!({"message": "Logged out"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        backend(&server, Some("abc.def")).logout().await.unwrap();
    }

    #[tokio::test]
    async fn logout_without_token_is_unauthorized() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/logout"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let err = backend(&server, None).logout().await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<BackendError>(),
            Some(BackendError::Unauthorized(_))
        ));
    }
}
