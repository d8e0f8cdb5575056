//! CGI entry point: authorize the trigger request, run the pipeline, answer in plain text.

use crate::{
    config::Config,
    pipeline::{Pipeline, Report},
    secrets::{SecretValue, Secrets},
};
use std::io::Write;

/// The parts of a CGI request the handler looks at.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Request {
    pub method: Option<String>,
    pub secret: Option<String>,
}

impl Request {
    pub fn from_env(config: &Config) -> Self {
        Request {
            method: std::env::var("REQUEST_METHOD").ok(),
            secret: std::env::var(config.secret_variable()).ok(),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Status {
    Ok,
    Unauthorized,
    MethodNotAllowed,
    InternalServerError,
}

impl Status {
    fn header(&self) -> Option<&'static str> {
        match self {
            Status::Ok => None,
            Status::Unauthorized => Some("401 Unauthorized"),
            Status::MethodNotAllowed => Some("405 Method Not Allowed"),
            Status::InternalServerError => Some("500 Internal Server Error"),
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AuthorizationError {
    #[error("Invalid request method.")]
    InvalidMethod(Option<String>),
    #[error("Unauthorized: invalid secret.")]
    InvalidSecret,
}

impl AuthorizationError {
    fn status(&self) -> Status {
        match self {
            AuthorizationError::InvalidMethod(_) => Status::MethodNotAllowed,
            AuthorizationError::InvalidSecret => Status::Unauthorized,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: Status,
    pub body: Vec<String>,
}

impl Response {
    pub fn new(status: Status, body: Vec<String>) -> Self {
        Response { status, body }
    }

    pub fn error(status: Status, message: impl Into<String>) -> Self {
        Response::new(status, vec![message.into()])
    }

    pub fn exit_code(&self) -> i32 {
        match self.status {
            Status::Ok => 0,
            _ => 1,
        }
    }

    pub fn write_to(&self, mut out: impl Write) -> std::io::Result<()> {
        if let Some(status) = self.status.header() {
            writeln!(out, "Status: {}", status)?;
        }
        writeln!(out, "Content-Type: text/plain; charset=utf-8")?;
        writeln!(out)?;
        for line in &self.body {
            writeln!(out, "{}", line)?;
        }
        out.flush()
    }
}

fn authorize(request: &Request, expected: &SecretValue) -> Result<(), AuthorizationError> {
    if request.method.as_deref() != Some("POST") {
        return Err(AuthorizationError::InvalidMethod(request.method.clone()));
    }
    match &request.secret {
        Some(secret) if expected.matches(secret) => Ok(()),
        _ => Err(AuthorizationError::InvalidSecret),
    }
}

/// Handles one trigger request. Nothing is touched unless the request is authorized.
pub async fn handle(config: &Config, secrets: &Secrets, request: &Request) -> Response {
    if request.method.as_deref() != Some("POST") {
        let error = AuthorizationError::InvalidMethod(request.method.clone());
        tracing::warn!(method = ?request.method, "rejected request");
        return Response::error(error.status(), error.to_string());
    }

    let expected = match secrets.get_secret(&config.secret) {
        Ok(value) if !value.0.is_empty() => value,
        Ok(_) => {
            tracing::error!("configured secret is empty, refusing all requests");
            return Response::error(Status::InternalServerError, "Server misconfigured.");
        }
        Err(e) => {
            tracing::error!(
                "failed to get {} secret: {:?}",
                config.secret.label(),
                e
            );
            return Response::error(Status::InternalServerError, "Server misconfigured.");
        }
    };

    if let Err(error) = authorize(request, &expected) {
        tracing::warn!("rejected request: {}", error);
        return Response::error(error.status(), error.to_string());
    }

    let mut report = Report::default();
    let result = Pipeline::new(config).run(&mut report).await;
    let mut body = report.into_lines();
    match result {
        Ok(outcome) => {
            tracing::info!("{}", outcome.summary());
            body.push(outcome.summary().to_owned());
            Response::new(Status::Ok, body)
        }
        Err(e) => {
            let description = e.describe();
            tracing::error!("deployment failed: {}", description);
            body.push(format!("Deployment failed: {}", description));
            Response::new(Status::InternalServerError, body)
        }
    }
}
