use crate::entities::user_entity as users;
use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::services::SubscriptionService;
use crate::utils::*;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};

#[derive(Clone)]
pub struct AuthService {
    pool: DatabaseConnection,
    jwt_service: JwtService,
    trial_messages: i32,
}

impl AuthService {
    pub fn new(pool: DatabaseConnection, jwt_service: JwtService, trial_messages: i32) -> Self {
        Self {
            pool,
            jwt_service,
            trial_messages,
        }
    }

    pub async fn signup(&self, request: SignupRequest) -> AppResult<AuthResponse> {
        let email = normalize_email(&request.email);
        validate_email(&email)?;
        validate_password(&request.password)?;

        let existing = users::Entity::find()
            .filter(users::Column::Email.eq(email.as_str()))
            .one(&self.pool)
            .await?;
        if existing.is_some() {
            return Err(AppError::ValidationError("Email is already registered".into()));
        }

        let password_hash = hash_password(&request.password)?;

        // user and trial land together or not at all
        let txn = self.pool.begin().await?;
        let now = Utc::now();
        let user = users::ActiveModel {
            email: Set(email),
            password_hash: Set(password_hash),
            created_at: Set(Some(now)),
            updated_at: Set(Some(now)),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        SubscriptionService::create_trial(&txn, user.id, self.trial_messages).await?;
        txn.commit().await?;

        log::info!("New user signed up: {}", user.id);
        self.issue_tokens(user)
    }

    pub async fn login(&self, request: LoginRequest) -> AppResult<AuthResponse> {
        let email = normalize_email(&request.email);
        let user = users::Entity::find()
            .filter(users::Column::Email.eq(email.as_str()))
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::AuthError("Invalid email or password".into()))?;

        if !verify_password(&request.password, &user.password_hash)? {
            return Err(AppError::AuthError("Invalid email or password".into()));
        }
        self.issue_tokens(user)
    }

    pub async fn refresh_token(&self, refresh_token: &str) -> AppResult<AuthResponse> {
        let claims = self.jwt_service.verify_refresh_token(refresh_token)?;
        let user_id: i64 = claims
            .sub
            .parse()
            .map_err(|_| AppError::AuthError("Invalid token".into()))?;

        let user = users::Entity::find_by_id(user_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::AuthError("User no longer exists".into()))?;
        self.issue_tokens(user)
    }

    fn issue_tokens(&self, user: users::Model) -> AppResult<AuthResponse> {
        let access_token = self.jwt_service.generate_access_token(user.id, &user.email)?;
        let refresh_token = self.jwt_service.generate_refresh_token(user.id, &user.email)?;
        Ok(AuthResponse {
            access_token,
            refresh_token,
            expires_in: self.jwt_service.get_access_token_expires_in(),
            user: UserResponse::from(user),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SubscriptionConfig;
    use crate::entities::SubscriptionStatus;
    use crate::test_support::test_db;

    fn service(db: &DatabaseConnection) -> AuthService {
        AuthService::new(db.clone(), JwtService::new("test-secret", 3600, 86400), 20)
    }

    fn signup_req(email: &str) -> SignupRequest {
        SignupRequest {
            email: email.to_string(),
            password: "stargazer9".to_string(),
        }
    }

    #[tokio::test]
    async fn signup_creates_user_and_trial() {
        let db = test_db().await;
        let svc = service(&db);
        let resp = svc.signup(signup_req("  Maya@Example.com ")).await.unwrap();
        assert_eq!(resp.user.email, "maya@example.com");
        assert!(!resp.access_token.is_empty());

        let subs = SubscriptionService::new(db.clone(), SubscriptionConfig::default());
        let s = subs.find(resp.user.id).await.unwrap().unwrap();
        assert_eq!(s.status, SubscriptionStatus::Trial);
        assert_eq!(s.messages_remaining(), Some(20));
    }

    #[tokio::test]
    async fn duplicate_email_and_bad_password() {
        let db = test_db().await;
        let svc = service(&db);
        svc.signup(signup_req("dup@example.com")).await.unwrap();
        assert!(matches!(
            svc.signup(signup_req("DUP@example.com")).await,
            Err(AppError::ValidationError(_))
        ));

        let err = svc
            .login(LoginRequest {
                email: "dup@example.com".into(),
                password: "wrongpass1".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::AuthError(_)));
    }

    #[tokio::test]
    async fn refresh_requires_refresh_token() {
        let db = test_db().await;
        let svc = service(&db);
        let resp = svc.signup(signup_req("r@example.com")).await.unwrap();

        let again = svc.refresh_token(&resp.refresh_token).await.unwrap();
        assert_eq!(again.user.id, resp.user.id);
        assert!(svc.refresh_token(&resp.access_token).await.is_err());
    }
}
