use axum::{
    extract::Extension,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use std::sync::Arc;

use crate::middleware::auth::auth_middleware;
use crate::models::auth::*;
use crate::response::{self, ApiError};
use crate::store::users::NewUser;
use crate::AppState;

const ACCESS_TOKEN_DAYS: i64 = 7;
const REFRESH_TOKEN_DAYS: i64 = 30;
const MIN_PASSWORD_LEN: usize = 8;

pub fn auth_routes() -> Router {
    let public = Router::new()
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login));

    let protected = Router::new()
        .route("/api/auth/profile", get(get_profile).put(update_profile))
        .layer(axum::middleware::from_fn(auth_middleware));

    public.merge(protected)
}

async fn register(
    Extension(state): Extension<Arc<AppState>>,
    axum::Json(payload): axum::Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let mut errors = Vec::new();
    if payload.email.as_deref().unwrap_or("").is_empty() {
        errors.push("Email is required".to_string());
    }
    if payload.username.as_deref().unwrap_or("").is_empty() {
        errors.push("Username is required".to_string());
    }
    match payload.password.as_deref() {
        None | Some("") => errors.push("Password is required".to_string()),
        Some(p) if p.len() < MIN_PASSWORD_LEN => {
            errors.push(format!("Password must be at least {} characters", MIN_PASSWORD_LEN));
        }
        _ => {}
    }
    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    let email = payload.email.unwrap();
    let username = payload.username.unwrap();
    let password = payload.password.unwrap();

    if state.users.email_or_username_taken(&email, &username).await {
        return Err(ApiError::Conflict(
            "User already exists with this email or username".to_string(),
        ));
    }

    let password_hash = hash(&password, DEFAULT_COST).map_err(|e| {
        tracing::error!("Error hashing password: {}", e);
        ApiError::Internal("Registration failed".to_string())
    })?;

    let user = state
        .users
        .insert(NewUser {
            email,
            username,
            first_name: payload.first_name.unwrap_or_default(),
            last_name: payload.last_name.unwrap_or_default(),
            password_hash,
        })
        .await;

    let tokens = issue_tokens(&user)?;
    tracing::info!(user_id = %user.id, "user registered");

    Ok(response::created(
        AuthData {
            user: UserResponse::from(&user),
            tokens,
        },
        "User registered successfully",
    ))
}

async fn login(
    Extension(state): Extension<Arc<AppState>>,
    axum::Json(payload): axum::Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (email, password) = match (payload.email.as_deref(), payload.password.as_deref()) {
        (Some(e), Some(p)) if !e.is_empty() && !p.is_empty() => (e, p),
        _ => {
            return Err(ApiError::BadRequest(
                "Email and password are required".to_string(),
            ))
        }
    };

    let user = state
        .users
        .find_by_email(email)
        .await
        .ok_or_else(|| ApiError::Unauthorized("Invalid credentials".to_string()))?;

    let password_ok = verify(password, &user.password_hash).map_err(|e| {
        tracing::error!("Error verifying password: {}", e);
        ApiError::Internal("Login failed".to_string())
    })?;
    if !password_ok {
        return Err(ApiError::Unauthorized("Invalid credentials".to_string()));
    }

    if !user.is_active {
        return Err(ApiError::Unauthorized("Account is deactivated".to_string()));
    }

    state.users.record_login(&user.id).await;
    let tokens = issue_tokens(&user)?;
    tracing::info!(user_id = %user.id, "user logged in");

    Ok(response::ok(
        AuthData {
            user: UserResponse::from(&user),
            tokens,
        },
        "Login successful",
    ))
}

async fn get_profile(
    Extension(state): Extension<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .users
        .find_by_id(&claims.sub)
        .await
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(response::ok(
        UserResponse::from(&user),
        "Profile retrieved successfully",
    ))
}

async fn update_profile(
    Extension(state): Extension<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    axum::Json(payload): axum::Json<UpdateProfileRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .users
        .update_profile(&claims.sub, payload.first_name, payload.last_name)
        .await
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(response::ok(
        UserResponse::from(&user),
        "Profile updated successfully",
    ))
}

fn jwt_secret() -> String {
    std::env::var("JWT_SECRET").unwrap_or_else(|_| "fallback-secret".to_string())
}

fn issue_tokens(user: &User) -> Result<AuthTokens, ApiError> {
    let secret = jwt_secret();
    let now = Utc::now();

    let access_claims = Claims {
        sub: user.id.clone(),
        email: user.email.clone(),
        username: user.username.clone(),
        exp: (now + Duration::days(ACCESS_TOKEN_DAYS)).timestamp() as usize,
        iat: now.timestamp() as usize,
    };
    let refresh_claims = RefreshClaims {
        sub: user.id.clone(),
        exp: (now + Duration::days(REFRESH_TOKEN_DAYS)).timestamp() as usize,
        iat: now.timestamp() as usize,
    };

    let key = EncodingKey::from_secret(secret.as_ref());
    let access_token = encode(&Header::default(), &access_claims, &key);
    let refresh_token = encode(&Header::default(), &refresh_claims, &key);

    match (access_token, refresh_token) {
        (Ok(access_token), Ok(refresh_token)) => Ok(AuthTokens {
            access_token,
            refresh_token,
        }),
        (Err(e), _) | (_, Err(e)) => {
            tracing::error!("Error generating JWT token: {}", e);
            Err(ApiError::Internal(
                "Failed to generate authentication token".to_string(),
            ))
        }
    }
}

pub fn verify_jwt_token(token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(jwt_secret().as_ref()),
        &Validation::default(),
    )?;

    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn sample_user() -> User {
        User {
            id: "42".to_string(),
            email: "learner@example.com".to_string(),
            username: "learner".to_string(),
            first_name: "Lea".to_string(),
            last_name: "Rner".to_string(),
            password_hash: hash("correct horse", DEFAULT_COST).unwrap(),
            is_active: true,
            is_verified: false,
            subscription_tier: "free".to_string(),
            created_at: Utc::now(),
            last_login_at: None,
        }
    }

    #[test]
    fn issued_access_token_decodes_back_to_user_id() {
        let user = sample_user();
        let tokens = issue_tokens(&user).unwrap();

        let claims = verify_jwt_token(&tokens.access_token).unwrap();
        assert_eq!(claims.sub, "42");
        assert_eq!(claims.email, "learner@example.com");
        assert_eq!(claims.username, "learner");
    }

    #[test]
    fn tampered_token_is_rejected() {
        let user = sample_user();
        let tokens = issue_tokens(&user).unwrap();

        let mut tampered = tokens.access_token;
        tampered.push('x');
        assert!(verify_jwt_token(&tampered).is_err());
    }

    #[test]
    fn wrong_password_fails_verification_every_time() {
        let user = sample_user();
        // No lockout state exists; verification is pure.
        for _ in 0..3 {
            assert!(!verify("wrong password", &user.password_hash).unwrap());
        }
        assert!(verify("correct horse", &user.password_hash).unwrap());
    }

    #[test]
    fn user_response_never_serializes_password() {
        let user = sample_user();
        let json = serde_json::to_string(&UserResponse::from(&user)).unwrap();
        assert!(!json.to_lowercase().contains("password"));
        assert!(json.contains("learner@example.com"));
    }
}
