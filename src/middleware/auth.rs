use axum::{extract::FromRequestParts, http::header};

use crate::error::AppError;

/// Proof that the request carried the shared admin secret as a bearer
/// credential. Comparison is exact string equality against the server-held
/// value; any mismatch rejects before the handler runs.
#[derive(Debug, Clone)]
pub struct AdminAuth;

impl<S> FromRequestParts<S> for AdminAuth
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .ok_or(AppError::Unauthorized)?;

        let auth_str = auth_header.to_str().map_err(|_| AppError::Unauthorized)?;

        if !auth_str.starts_with("Bearer ") {
            return Err(AppError::Unauthorized);
        }
        let token = auth_str.trim_start_matches("Bearer ").trim();

        let secret = std::env::var("ADMIN_PASSWORD")
            .map_err(|_| AppError::Internal(anyhow::anyhow!("ADMIN_PASSWORD is not set")))?;

        if token != secret {
            return Err(AppError::Unauthorized);
        }

        Ok(AdminAuth)
    }
}

#[cfg(test)]
mod tests {
    use axum::extract::FromRequestParts;
    use axum::http::Request;

    use super::*;

    async fn extract(header: Option<&str>) -> Result<AdminAuth, AppError> {
        let mut builder = Request::builder().uri("/api/admin/orders");
        if let Some(value) = header {
            builder = builder.header("authorization", value);
        }
        let request = builder.body(()).unwrap();
        let (mut parts, _) = request.into_parts();
        AdminAuth::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn only_the_exact_bearer_secret_passes() {
        unsafe { std::env::set_var("ADMIN_PASSWORD", "sup3r-secret") };

        assert!(matches!(extract(None).await, Err(AppError::Unauthorized)));
        assert!(matches!(
            extract(Some("Bearer wrong")).await,
            Err(AppError::Unauthorized)
        ));
        assert!(matches!(
            extract(Some("Basic sup3r-secret")).await,
            Err(AppError::Unauthorized)
        ));
        assert!(extract(Some("Bearer sup3r-secret")).await.is_ok());
    }
}
