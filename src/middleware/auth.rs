use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    web, Error, HttpMessage,
};
use futures::future::LocalBoxFuture;
use std::future::{ready, Ready};

use crate::config::Config;
use crate::services::auth_service;
use crate::utils::error::AppError;

/// Gate in front of protected scopes. Verifies the bearer token and parks
/// the decoded claims in the request for `web::ReqData<Claims>` handlers.
///
/// A missing Authorization header is 401; a header that fails verification
/// is 400. The token may come bare or with a `Bearer ` prefix.
pub struct AuthMiddleware;

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService { service }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let secret = match req.app_data::<web::Data<Config>>() {
            Some(config) => config.jwt_secret.clone(),
            None => {
                return Box::pin(async {
                    Err(AppError::Internal("Config not registered".to_string()).into())
                })
            }
        };

        let header_value = match req.headers().get("Authorization") {
            Some(value) => value,
            None => return Box::pin(async { Err(AppError::NoToken.into()) }),
        };

        let header_str = match header_value.to_str() {
            Ok(raw) => raw,
            Err(_) => return Box::pin(async { Err(AppError::InvalidToken.into()) }),
        };

        let token = header_str.strip_prefix("Bearer ").unwrap_or(header_str).trim();

        match auth_service::verify_token(token, &secret) {
            Ok(claims) => {
                req.extensions_mut().insert(claims);

                let fut = self.service.call(req);
                Box::pin(async move {
                    let res = fut.await?;
                    Ok(res)
                })
            }
            Err(_) => Box::pin(async { Err(AppError::InvalidToken.into()) }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::auth_service::Claims;
    use actix_web::body::to_bytes;
    use actix_web::http::StatusCode;
    use actix_web::{test, App, HttpResponse};

    const SECRET: &str = "gate-test-secret";

    fn test_config() -> Config {
        Config {
            host: "127.0.0.1".to_string(),
            port: "0".to_string(),
            database_url: "mongodb://localhost:27017/unused".to_string(),
            jwt_secret: SECRET.to_string(),
        }
    }

    async fn whoami(user: web::ReqData<Claims>) -> HttpResponse {
        HttpResponse::Ok().body(user.sub.clone())
    }

    macro_rules! protected_app {
        () => {
            test::init_service(
                App::new()
                    .app_data(web::Data::new(test_config()))
                    .service(
                        web::scope("/api/trips")
                            .wrap(AuthMiddleware)
                            .route("", web::get().to(whoami)),
                    ),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn missing_header_is_401_no_token() {
        let app = protected_app!();

        let req = test::TestRequest::get().uri("/api/trips").to_request();
        let err = test::try_call_service(&app, req).await.unwrap_err();

        let resp = err.error_response();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let body = to_bytes(resp.into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "No token");
    }

    #[actix_web::test]
    async fn garbage_token_is_400() {
        let app = protected_app!();

        let req = test::TestRequest::get()
            .uri("/api/trips")
            .insert_header(("Authorization", "Bearer garbage"))
            .to_request();
        let err = test::try_call_service(&app, req).await.unwrap_err();

        let resp = err.error_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body = to_bytes(resp.into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "Token is not valid");
    }

    #[actix_web::test]
    async fn token_signed_elsewhere_is_400() {
        let app = protected_app!();

        let token = auth_service::issue_token("u1", "some-other-secret").unwrap();
        let req = test::TestRequest::get()
            .uri("/api/trips")
            .insert_header(("Authorization", token))
            .to_request();
        let err = test::try_call_service(&app, req).await.unwrap_err();

        assert_eq!(
            err.as_response_error().status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[actix_web::test]
    async fn bare_token_passes_and_attaches_identity() {
        let app = protected_app!();

        let token = auth_service::issue_token("64a0c0ffee0123456789abcd", SECRET).unwrap();
        let req = test::TestRequest::get()
            .uri("/api/trips")
            .insert_header(("Authorization", token))
            .to_request();

        let body = test::call_and_read_body(&app, req).await;
        assert_eq!(body, "64a0c0ffee0123456789abcd");
    }

    #[actix_web::test]
    async fn bearer_prefixed_token_also_passes() {
        let app = protected_app!();

        let token = auth_service::issue_token("64a0c0ffee0123456789abcd", SECRET).unwrap();
        let req = test::TestRequest::get()
            .uri("/api/trips")
            .insert_header(("Authorization", format!("Bearer {}", token)))
            .to_request();

        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());
    }
}
