use axum::{extract::multipart::MultipartError, http::StatusCode, response::{IntoResponse, Response}};

pub type AppResult<T> = Result<T, AppError>;

/// Anything a handler can fail with. Broken uploads keep the status the
/// multipart parser picked; everything else is our fault.
#[derive(Debug)]
pub struct AppError(pub anyhow::Error);

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self.0.downcast_ref::<MultipartError>() {
            Some(err) => err.status(),
            None => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("request failed: {:#}", self.0);
            return (status, format!("{}\n\n{}", self.0, self.0.backtrace())).into_response();
        }

        tracing::debug!(%status, "rejected request: {:#}", self.0);
        (status, self.0.to_string()).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}
