// Bearer-token authentication for API endpoints

use actix_web::{
    body::{BoxBody, EitherBody},
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error, HttpMessage, HttpResponse,
};
use futures::future::LocalBoxFuture;
use jsonwebtoken::{
    decode, encode, get_current_timestamp, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use std::future::{ready, Ready};
use std::rc::Rc;
use std::sync::Arc;

pub const ACCESS_TOKEN_TYPE: &str = "access";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    pub sub: String,
    pub iat: u64,
    pub exp: u64,
    pub token_type: String,
}

/// The caller a request was authenticated as.
#[derive(Debug, Clone, PartialEq)]
pub struct Identity {
    pub subject: String,
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("invalid token: {0}")]
    Invalid(#[from] jsonwebtoken::errors::Error),

    #[error("wrong token type: {0}")]
    WrongType(String),
}

/// HS256 keys derived from the shared secret.
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl TokenKeys {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    pub fn issue(&self, subject: &str, ttl_secs: u64) -> Result<String, AuthError> {
        let now = get_current_timestamp();
        let claims = Claims {
            sub: subject.to_string(),
            iat: now,
            exp: now + ttl_secs,
            token_type: ACCESS_TOKEN_TYPE.to_string(),
        };
        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?)
    }

    pub fn verify(&self, token: &str) -> Result<Identity, AuthError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation)?;
        if data.claims.token_type != ACCESS_TOKEN_TYPE {
            return Err(AuthError::WrongType(data.claims.token_type));
        }
        Ok(Identity {
            subject: data.claims.sub,
        })
    }
}

/// Middleware that rejects requests without a valid access token.
pub struct Auth {
    keys: Arc<TokenKeys>,
}

impl Auth {
    pub fn new(keys: Arc<TokenKeys>) -> Self {
        Self { keys }
    }
}

impl<S, B> Transform<S, ServiceRequest> for Auth
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B, BoxBody>>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddleware {
            service: Rc::new(service),
            keys: self.keys.clone(),
        }))
    }
}

pub struct AuthMiddleware<S> {
    service: Rc<S>,
    keys: Arc<TokenKeys>,
}

impl<S, B> Service<ServiceRequest> for AuthMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B, BoxBody>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        // Health check is public
        if req.path() == "/health" {
            let fut = self.service.call(req);
            return Box::pin(async move {
                let res = fut.await?;
                Ok(res.map_into_left_body())
            });
        }

        let token = req
            .headers()
            .get("Authorization")
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
            .map(str::trim);

        match token.map(|t| self.keys.verify(t)) {
            Some(Ok(identity)) => {
                tracing::debug!(subject = %identity.subject, path = req.path(), "authenticated");
                req.extensions_mut().insert(identity);
                let fut = self.service.call(req);
                Box::pin(async move {
                    let res = fut.await?;
                    Ok(res.map_into_left_body())
                })
            }
            rejected => {
                if let Some(Err(e)) = rejected {
                    tracing::warn!(path = req.path(), error = %e, "rejected token");
                }
                Box::pin(async move {
                    let response = HttpResponse::Unauthorized()
                        .json(serde_json::json!({
                            "success": false,
                            "error": "Invalid or missing authentication token"
                        }))
                        .map_into_right_body();
                    Ok(req.into_response(response))
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_then_verify() {
        let keys = TokenKeys::new("secret");
        let token = keys.issue("ops@example.com", 60).unwrap();

        let identity = keys.verify(&token).unwrap();
        assert_eq!(identity.subject, "ops@example.com");
    }

    #[test]
    fn test_other_secret_rejected() {
        let token = TokenKeys::new("secret").issue("ops", 60).unwrap();
        assert!(matches!(
            TokenKeys::new("different").verify(&token),
            Err(AuthError::Invalid(_))
        ));
    }

    #[test]
    fn test_expired_token_rejected() {
        let keys = TokenKeys::new("secret");
        let now = get_current_timestamp();
        let claims = Claims {
            sub: "ops".to_string(),
            iat: now - 7200,
            exp: now - 3600,
            token_type: ACCESS_TOKEN_TYPE.to_string(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &keys.encoding).unwrap();

        assert!(keys.verify(&token).is_err());
    }

    #[test]
    fn test_refresh_token_not_accepted() {
        let keys = TokenKeys::new("secret");
        let now = get_current_timestamp();
        let claims = Claims {
            sub: "ops".to_string(),
            iat: now,
            exp: now + 60,
            token_type: "refresh".to_string(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &keys.encoding).unwrap();

        assert!(matches!(keys.verify(&token), Err(AuthError::WrongType(_))));
    }
}
