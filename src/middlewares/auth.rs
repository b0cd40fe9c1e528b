use crate::error::AppError;
use crate::utils::JwtService;
use actix_web::http::Method;
use actix_web::{
    Error, HttpMessage,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
};
use futures_util::future::LocalBoxFuture;
use std::future::{Ready, ready};

// Routes reachable without an access token
struct PublicPaths {
    exact_paths: Vec<&'static str>,
    prefix_paths: Vec<&'static str>,
}

impl PublicPaths {
    fn new() -> Self {
        Self {
            exact_paths: vec![
                "/swagger-ui",
                "/api-docs/openapi.json",
                "/api/v1/geocode",
            ],
            prefix_paths: vec![
                "/swagger-ui/",
                "/api-docs/",
                // refresh carries its own token in the body
                "/api/v1/auth/",
                // signed by the provider
                "/webhook/",
                // guarded by the cron secret
                "/api/v1/cron/",
            ],
        }
    }

    fn is_public_path(&self, path: &str) -> bool {
        self.exact_paths.contains(&path)
            || self
                .prefix_paths
                .iter()
                .any(|&prefix| path.starts_with(prefix))
    }
}

pub struct AuthMiddleware {
    jwt_service: JwtService,
}

impl AuthMiddleware {
    pub fn new(jwt_service: JwtService) -> Self {
        Self { jwt_service }
    }
}

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
        ready(Ok(AuthMiddlewareService {
            service,
            jwt_service: self.jwt_service.clone(),
            public_paths: PublicPaths::new(),
        }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: S,
    jwt_service: JwtService,
    public_paths: PublicPaths,
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
        // CORS preflight
        if req.method() == Method::OPTIONS || self.public_paths.is_public_path(req.path()) {
            return Box::pin(self.service.call(req));
        }

        let token = req
            .headers()
            .get("Authorization")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::to_owned);

        let Some(token) = token else {
            let error = AppError::AuthError("Missing access token".to_string());
            return Box::pin(async move { Err(error.into()) });
        };

        let user_id = self
            .jwt_service
            .verify_access_token(&token)
            .ok()
            .and_then(|claims| claims.sub.parse::<i64>().ok());

        match user_id {
            Some(user_id) => {
                req.extensions_mut().insert(user_id);
                Box::pin(self.service.call(req))
            }
            None => {
                let error = AppError::AuthError("Invalid access token".to_string());
                Box::pin(async move { Err(error.into()) })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::current_user_id;
    use actix_web::test::{TestRequest, call_and_read_body, init_service, try_call_service};
    use actix_web::{App, HttpRequest, HttpResponse, web};

    async fn whoami(req: HttpRequest) -> HttpResponse {
        match current_user_id(&req) {
            Ok(id) => HttpResponse::Ok().body(id.to_string()),
            Err(_) => HttpResponse::InternalServerError().finish(),
        }
    }

    #[test]
    fn public_paths() {
        let p = PublicPaths::new();
        assert!(p.is_public_path("/api/v1/auth/login"));
        assert!(p.is_public_path("/api/v1/auth/refresh"));
        assert!(p.is_public_path("/webhook/lemonsqueezy"));
        assert!(p.is_public_path("/api/v1/geocode"));
        assert!(p.is_public_path("/swagger-ui/index.html"));
        assert!(!p.is_public_path("/api/v1/chat"));
        assert!(!p.is_public_path("/api/v1/geocoder"));
    }

    #[actix_web::test]
    async fn bearer_token_sets_user_id() {
        let jwt = JwtService::new("mw-secret", 3600, 7200);
        let access = jwt.generate_access_token(7, "a@example.com").unwrap();
        let refresh = jwt.generate_refresh_token(7, "a@example.com").unwrap();
        let app = init_service(
            App::new()
                .wrap(AuthMiddleware::new(jwt))
                .route("/api/v1/me", web::get().to(whoami)),
        )
        .await;

        let req = TestRequest::get()
            .uri("/api/v1/me")
            .insert_header(("Authorization", format!("Bearer {access}")))
            .to_request();
        let body = call_and_read_body(&app, req).await;
        assert_eq!(body, "7");

        for header in [None, Some(format!("Bearer {refresh}")), Some("Bearer junk".into())] {
            let mut req = TestRequest::get().uri("/api/v1/me");
            if let Some(h) = header {
                req = req.insert_header(("Authorization", h));
            }
            let err = try_call_service(&app, req.to_request()).await.unwrap_err();
            assert_eq!(err.as_response_error().status_code(), 401);
        }
    }
}
