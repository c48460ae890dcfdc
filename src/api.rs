// src/api.rs

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use url::Url;

use crate::{
    error::AppError,
    models::{
        auth::{JoinForm, LoginForm, LoginResponse, RegisterResponse},
        question::Question,
        session::SessionStatus,
        submission::{SubmitPayload, SubmitResponse},
    },
};

/// The backend as seen by the student client.
#[async_trait]
pub trait ExamApi: Send + Sync {
    /// Authenticates the student and returns the issued student id.
    async fn login(&self, form: &LoginForm) -> Result<String, AppError>;

    /// Registers the student for a session using its one-time code.
    /// Returns the student id for this attempt.
    async fn register_for_session(&self, form: &JoinForm) -> Result<String, AppError>;

    async fn session_status(&self, session_id: &str) -> Result<SessionStatus, AppError>;

    async fn questions(
        &self,
        session_id: &str,
        student_id: &str,
    ) -> Result<Vec<Question>, AppError>;

    async fn submit_answers(&self, payload: &SubmitPayload) -> Result<SubmitResponse, AppError>;
}

#[async_trait]
impl<T: ExamApi + ?Sized> ExamApi for Arc<T> {
    async fn login(&self, form: &LoginForm) -> Result<String, AppError> {
        (**self).login(form).await
    }

    async fn register_for_session(&self, form: &JoinForm) -> Result<String, AppError> {
        (**self).register_for_session(form).await
    }

    async fn session_status(&self, session_id: &str) -> Result<SessionStatus, AppError> {
        (**self).session_status(session_id).await
    }

    async fn questions(
        &self,
        session_id: &str,
        student_id: &str,
    ) -> Result<Vec<Question>, AppError> {
        (**self).questions(session_id, student_id).await
    }

    async fn submit_answers(&self, payload: &SubmitPayload) -> Result<SubmitResponse, AppError> {
        (**self).submit_answers(payload).await
    }
}

/// `ExamApi` over the backend's JSON HTTP endpoints.
#[derive(Debug, Clone)]
pub struct HttpExamApi {
    client: Client,
    base: Url,
}

impl HttpExamApi {
    /// `base_url` is the API root, e.g. `http://localhost:8080/api`.
    pub fn new(base_url: &str) -> Result<Self, AppError> {
        let base = Url::parse(base_url)?;
        if base.cannot_be_a_base() {
            return Err(AppError::Config(format!(
                "'{}' cannot be used as an API base URL",
                base_url
            )));
        }
        Ok(Self {
            client: Client::new(),
            base,
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, AppError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| AppError::Config("API base URL has no path".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn read<T: DeserializeOwned>(response: Response) -> Result<T, AppError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json::<T>().await?);
        }

        let body = response.text().await.unwrap_or_default();
        tracing::warn!("Request rejected with HTTP {}: {}", status.as_u16(), body);
        Err(AppError::Rejected {
            status: status.as_u16(),
            message: server_message(&body),
        })
    }
}

/// Message to show for an error body: a JSON `message` or `error` field,
/// otherwise the body text itself.
fn server_message(body: &str) -> String {
    if let Ok(serde_json::Value::Object(map)) = serde_json::from_str(body) {
        for key in ["message", "error"] {
            if let Some(serde_json::Value::String(msg)) = map.get(key) {
                return msg.clone();
            }
        }
    }
    body.trim().to_string()
}

#[async_trait]
impl ExamApi for HttpExamApi {
    async fn login(&self, form: &LoginForm) -> Result<String, AppError> {
        let url = self.endpoint(&["student", "login"])?;
        let response = self.client.post(url).json(form).send().await?;
        let body: LoginResponse = Self::read(response).await?;
        Ok(body.student_id)
    }

    async fn register_for_session(&self, form: &JoinForm) -> Result<String, AppError> {
        let url = self.endpoint(&["student", "register"])?;
        let response = self.client.post(url).json(form).send().await?;
        let body: RegisterResponse = Self::read(response).await?;
        if let Some(msg) = &body.message {
            tracing::debug!("Register: {}", msg);
        }
        Ok(body.student_id)
    }

    async fn session_status(&self, session_id: &str) -> Result<SessionStatus, AppError> {
        let url = self.endpoint(&["session", session_id, "status"])?;
        let response = self.client.get(url).send().await?;
        Self::read(response).await
    }

    async fn questions(
        &self,
        session_id: &str,
        student_id: &str,
    ) -> Result<Vec<Question>, AppError> {
        let mut url = self.endpoint(&["session", session_id, "questions"])?;
        url.query_pairs_mut().append_pair("studentId", student_id);
        let response = self.client.get(url).send().await?;
        Self::read(response).await
    }

    async fn submit_answers(&self, payload: &SubmitPayload) -> Result<SubmitResponse, AppError> {
        let url = self.endpoint(&["quiz", "submit"])?;
        let response = self.client.post(url).json(payload).send().await?;
        Self::read(response).await
    }
}
