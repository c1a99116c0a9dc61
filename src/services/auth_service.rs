use crate::config::Config;
use crate::database::MongoDB;
use crate::models::{AuthResponse, LoginRequest, RegisterRequest, User, UserResponse};
use crate::utils::error::AppError;
use crate::utils::validation::{is_valid_email, normalize_email};
use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use mongodb::bson::{doc, oid::ObjectId};
use serde::{Deserialize, Serialize};

/// Tokens expire one hour after issue; clients re-login to refresh.
const TOKEN_TTL_SECS: i64 = 3600;

// JWT Claims
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String, // user id (hex)
    pub iat: usize,  // issued at
    pub exp: usize,  // expiration
}

pub fn hash_password(plain: &str) -> Result<String, AppError> {
    hash(plain, DEFAULT_COST)
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))
}

pub fn verify_password(plain: &str, hashed: &str) -> Result<bool, AppError> {
    verify(plain, hashed)
        .map_err(|e| AppError::Internal(format!("Password verification error: {}", e)))
}

// Generate JWT token
pub fn issue_token(user_id: &str, secret: &str) -> Result<String, AppError> {
    let iat = Utc::now().timestamp();
    let exp = iat + TOKEN_TTL_SECS;

    let claims = Claims {
        sub: user_id.to_string(),
        iat: iat as usize,
        exp: exp as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("Failed to generate token: {}", e)))
}

// Verify JWT token (HS256, expiry checked by default)
pub fn verify_token(token: &str, secret: &str) -> Result<Claims, AppError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::InvalidToken)
}

// User registration
pub async fn register(
    db: &MongoDB,
    config: &Config,
    request: &RegisterRequest,
) -> Result<AuthResponse, AppError> {
    let email = normalize_email(&request.email);
    if !is_valid_email(&email) {
        return Err(AppError::Validation("Invalid Email Format".to_string()));
    }

    let collection = db.collection::<User>("users");

    let existing = collection
        .find_one(doc! { "email": &email })
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

    if existing.is_some() {
        return Err(AppError::Validation("User already exists".to_string()));
    }

    let user = User {
        id: ObjectId::new(),
        username: request.username.clone(),
        email,
        password: hash_password(&request.password)?,
        profile_picture: String::new(),
        created_at: Utc::now().timestamp(),
    };

    collection
        .insert_one(&user)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

    let token = issue_token(&user.id.to_hex(), &config.jwt_secret)?;

    log::info!("✅ User registered: {}", user.email);

    Ok(AuthResponse {
        token,
        user: user.into(),
    })
}

// User login
pub async fn login(
    db: &MongoDB,
    config: &Config,
    request: &LoginRequest,
) -> Result<AuthResponse, AppError> {
    let email = normalize_email(&request.email);
    let collection = db.collection::<User>("users");

    // Unknown email and wrong password fail identically
    let user = collection
        .find_one(doc! { "email": &email })
        .await
        .map_err(|e| AppError::Database(e.to_string()))?
        .ok_or(AppError::InvalidCredentials)?;

    if !verify_password(&request.password, &user.password)? {
        return Err(AppError::InvalidCredentials);
    }

    let token = issue_token(&user.id.to_hex(), &config.jwt_secret)?;

    log::info!("✅ Login successful: {}", user.email);

    Ok(AuthResponse {
        token,
        user: user.into(),
    })
}

// Get current user profile
pub async fn get_current_user(db: &MongoDB, user_id: &str) -> Result<UserResponse, AppError> {
    let object_id = ObjectId::parse_str(user_id)
        .map_err(|_| AppError::Validation("Invalid user id".to_string()))?;

    let collection = db.collection::<User>("users");

    let user = collection
        .find_one(doc! { "_id": object_id })
        .await
        .map_err(|e| AppError::Database(e.to_string()))?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(user.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    const SECRET: &str = "unit-test-secret";

    #[test]
    fn password_hash_verifies_and_wrong_password_does_not() {
        let hashed = hash_password("hunter2").unwrap();
        assert!(verify_password("hunter2", &hashed).unwrap());
        assert!(!verify_password("hunter3", &hashed).unwrap());
    }

    #[test]
    fn same_password_hashes_differently_per_user() {
        let first = hash_password("hunter2").unwrap();
        let second = hash_password("hunter2").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn issued_token_round_trips() {
        let token = issue_token("64a0c0ffee0123456789abcd", SECRET).unwrap();
        let claims = verify_token(&token, SECRET).unwrap();

        assert_eq!(claims.sub, "64a0c0ffee0123456789abcd");
        assert!(claims.exp > claims.iat);
        assert_eq!(claims.exp - claims.iat, TOKEN_TTL_SECS as usize);
    }

    #[test]
    fn token_signed_with_another_secret_is_rejected() {
        let token = issue_token("u1", "some-other-secret").unwrap();
        assert!(matches!(
            verify_token(&token, SECRET),
            Err(AppError::InvalidToken)
        ));
    }

    #[test]
    fn expired_token_is_rejected() {
        // Issued three hours ago, expired two hours ago; well past any leeway
        let iat = (Utc::now() - Duration::hours(3)).timestamp();
        let exp = (Utc::now() - Duration::hours(2)).timestamp();
        let claims = Claims {
            sub: "u1".to_string(),
            iat: iat as usize,
            exp: exp as usize,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();

        assert!(matches!(
            verify_token(&token, SECRET),
            Err(AppError::InvalidToken)
        ));
    }

    #[test]
    fn garbage_tokens_are_rejected() {
        assert!(verify_token("", SECRET).is_err());
        assert!(verify_token("not.a.jwt", SECRET).is_err());
        assert!(verify_token("aaaa.bbbb", SECRET).is_err());
    }

    #[tokio::test]
    #[ignore] // Requires MongoDB to be running
    async fn registration_and_login_flow_against_live_store() {
        dotenv::dotenv().ok();

        let uri = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "mongodb://localhost:27017/tripbudget_test".to_string());
        let db = MongoDB::new(&uri).await.unwrap();

        let config = Config {
            host: "127.0.0.1".to_string(),
            port: "0".to_string(),
            database_url: uri,
            jwt_secret: SECRET.to_string(),
        };

        // Unique address per run so reruns do not trip the duplicate check
        let email = format!("flow-{}@example.com", ObjectId::new().to_hex());

        let request = RegisterRequest {
            username: "flow".to_string(),
            email: email.clone(),
            password: "hunter2".to_string(),
        };

        let registered = register(&db, &config, &request).await.unwrap();
        assert_eq!(registered.user.email, email);

        // Issued token verifies against the same secret
        let claims = verify_token(&registered.token, SECRET).unwrap();
        assert_eq!(claims.sub, registered.user.id);

        // Same email again is refused
        let duplicate = register(&db, &config, &request).await;
        assert!(matches!(duplicate, Err(AppError::Validation(ref msg)) if msg == "User already exists"));

        // Malformed email never reaches the store
        let bad_email = RegisterRequest {
            username: "flow".to_string(),
            email: "not-an-email".to_string(),
            password: "hunter2".to_string(),
        };
        assert!(matches!(
            register(&db, &config, &bad_email).await,
            Err(AppError::Validation(ref msg)) if msg == "Invalid Email Format"
        ));

        // Login with the right password, case-shifted email
        let login_request = LoginRequest {
            email: email.to_uppercase(),
            password: "hunter2".to_string(),
        };
        let logged_in = login(&db, &config, &login_request).await.unwrap();
        assert_eq!(logged_in.user.id, registered.user.id);

        // Wrong password and unknown email fail with the same error
        let wrong_password = LoginRequest {
            email,
            password: "hunter3".to_string(),
        };
        assert!(matches!(
            login(&db, &config, &wrong_password).await,
            Err(AppError::InvalidCredentials)
        ));

        let unknown = LoginRequest {
            email: "nobody@example.com".to_string(),
            password: "hunter2".to_string(),
        };
        assert!(matches!(
            login(&db, &config, &unknown).await,
            Err(AppError::InvalidCredentials)
        ));

        // Profile lookup returns the stored identity without the hash
        let profile = get_current_user(&db, &registered.user.id).await.unwrap();
        assert_eq!(profile.username, "flow");
    }
}
