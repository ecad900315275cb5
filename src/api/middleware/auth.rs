use crate::api::error::ApiError;
use crate::auth::TokenSigner;
use crate::config::AppConfig;
use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    web, Error,
};
use std::{
    future::{ready, Future, Ready},
    pin::Pin,
    rc::Rc,
};
use tracing::warn;

/// Requires a session token (or configured API key) on `/api/*` when
/// `auth.require_token` is set. Login and signup stay open.
pub struct RequireSession;

impl<S, B> Transform<S, ServiceRequest> for RequireSession
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = RequireSessionMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequireSessionMiddleware {
            service: Rc::new(service),
        }))
    }
}

pub struct RequireSessionMiddleware<S> {
    service: Rc<S>,
}

fn is_public(req: &ServiceRequest) -> bool {
    let path = req.path();
    req.method() == actix_web::http::Method::OPTIONS
        || !path.starts_with("/api/")
        || path == "/api/login"
        || path == "/api/signup"
}

fn bearer_token(req: &ServiceRequest) -> Option<String> {
    if let Some(header_value) = req.headers().get("Authorization") {
        return header_value
            .to_str()
            .ok()
            .and_then(|s| s.strip_prefix("Bearer "))
            .map(|t| t.trim().to_string());
    }
    // Fallback to query param for links opened outside the client (PDF viewer)
    let params = qstring::QString::from(req.query_string());
    params.get("token").map(|t| t.to_string())
}

fn is_authorized(config: &AppConfig, signer: &TokenSigner, token: &str) -> bool {
    config.auth.api_keys.iter().any(|key| key == token) || signer.verify(token).is_ok()
}

impl<S, B> Service<ServiceRequest> for RequireSessionMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let srv = self.service.clone();

        let config = match req.app_data::<web::Data<AppConfig>>() {
            Some(c) => c.clone(),
            None => {
                warn!("AppConfig missing in app_data");
                return Box::pin(async move {
                    Err(ApiError::Internal("Configuration error".to_string()).into())
                });
            }
        };

        if !config.auth.require_token || is_public(&req) {
            return Box::pin(async move { srv.call(req).await });
        }

        let valid = match (req.app_data::<web::Data<TokenSigner>>(), bearer_token(&req)) {
            (Some(signer), Some(token)) => is_authorized(&config, signer, &token),
            _ => false,
        };

        if !valid {
            warn!("Rejected unauthenticated request to {}", req.path());
            return Box::pin(async move { Err(ApiError::Unauthorized.into()) });
        }

        Box::pin(async move { srv.call(req).await })
    }
}
