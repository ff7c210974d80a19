use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::error::AppError;
use crate::AppState;

/// Container for the authenticated user's id stored in request extensions.
#[derive(Clone, Copy, Debug)]
pub struct CurrentUser(pub Uuid);

/// Claims expected inside the JWT issued by the auth provider.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - the user's UUID as a string.
    pub sub: String,
    pub exp: usize,
}

/// Validates a bearer token and returns the user id it was issued for.
pub fn verify_token(token: &str, secret: &str) -> Result<Uuid, AppError> {
    let decoding_key = DecodingKey::from_secret(secret.as_bytes());

    let claims = decode::<Claims>(token, &decoding_key, &Validation::new(Algorithm::HS256))
        .map_err(|e| {
            warn!("Rejected bearer token: {}", e);
            AppError::Unauthorized("로그인이 필요합니다.".to_string())
        })?
        .claims;

    Uuid::parse_str(&claims.sub)
        .map_err(|_| AppError::Unauthorized("로그인이 필요합니다.".to_string()))
}

/// Middleware to validate a Bearer JWT in the `Authorization` header.
///
/// On success the request is forwarded with a `CurrentUser` extension; on
/// failure a `401` is returned.
pub async fn jwt_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .ok_or_else(|| AppError::Unauthorized("로그인이 필요합니다.".to_string()))?;

    let user_id = verify_token(token, &state.config.jwt_secret)?;

    req.extensions_mut().insert(CurrentUser(user_id));

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn token_for(sub: &str, secret: &str) -> String {
        let claims = Claims {
            sub: sub.to_string(),
            exp: (chrono::Utc::now().timestamp() + 3600) as usize,
        };
        encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes())).unwrap()
    }

    #[test]
    fn test_valid_token_yields_user() {
        let user_id = Uuid::new_v4();
        let token = token_for(&user_id.to_string(), "secret");
        assert_eq!(verify_token(&token, "secret").unwrap(), user_id);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = token_for(&Uuid::new_v4().to_string(), "secret");
        assert!(matches!(
            verify_token(&token, "other"),
            Err(AppError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_non_uuid_subject_rejected() {
        let token = token_for("not-a-uuid", "secret");
        assert!(verify_token(&token, "secret").is_err());
    }
}
