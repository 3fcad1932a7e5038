//! JWT bearer authentication: the claims extractor and the register and
//! sign-in endpoints.

use axum::{
    Json, RequestPartsExt,
    extract::{FromRef, FromRequestParts, State},
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, TokenData, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

use crate::{
    AppState, Error,
    models::{NewUser, User, UserID},
    response::ErrorBody,
    stores::UserStore,
};

/// How long an issued token stays valid.
const TOKEN_LIFETIME: Duration = Duration::days(30);

/// The contents of a JSON Web Token.
#[derive(Serialize, Deserialize)]
pub struct Claims {
    /// The ID of the authenticated user.
    pub sub: i64,
    /// The expiry time of the token as a unix timestamp.
    pub exp: usize,
    /// The time the token was issued as a unix timestamp.
    pub iat: usize,
}

impl Claims {
    /// The authenticated user's ID.
    pub fn user_id(&self) -> UserID {
        UserID::new(self.sub)
    }
}

impl<S> FromRequestParts<S> for Claims
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) = parts
            .extract::<TypedHeader<Authorization<Bearer>>>()
            .await
            .map_err(|_| AuthError::MissingToken)?;

        let state = AppState::from_ref(state);
        let token_data = decode_jwt(bearer.token(), state.decoding_key())?;

        Ok(token_data.claims)
    }
}

/// The ways authentication can fail.
#[derive(Debug)]
pub enum AuthError {
    /// The email or password did not match a registered user.
    WrongCredentials,
    /// The request body was missing the email or password.
    MissingCredentials,
    /// The request carried no bearer token.
    MissingToken,
    /// The bearer token was malformed, expired, or signed with another key.
    InvalidToken,
    /// Signing the token failed.
    TokenCreation,
    /// An internal error occurred while verifying credentials.
    InternalError,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AuthError::WrongCredentials => {
                (StatusCode::UNAUTHORIZED, "Invalid email or password")
            }
            AuthError::MissingCredentials => {
                (StatusCode::BAD_REQUEST, "Please provide email and password")
            }
            AuthError::MissingToken | AuthError::InvalidToken => {
                (StatusCode::UNAUTHORIZED, "Not authorized")
            }
            AuthError::TokenCreation | AuthError::InternalError => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };

        (status, Json(ErrorBody::new(error_message))).into_response()
    }
}

/// The email and password sent to the register and sign-in endpoints.
#[derive(Debug, Deserialize)]
pub struct Credentials {
    /// The user's email address.
    pub email: Option<String>,
    /// The user's plain-text password.
    pub password: Option<String>,
}

/// A successful register or sign-in response.
#[derive(Debug, Serialize)]
pub struct AuthBody {
    /// Always true.
    pub success: bool,
    /// The signed bearer token.
    pub token: String,
    /// The authenticated user.
    pub user: User,
}

/// Handler for registration requests.
///
/// # Errors
/// Responds 400 if the email or password is missing or malformed, or if the
/// email is already registered.
pub async fn register(
    State(mut state): State<AppState>,
    Json(credentials): Json<Credentials>,
) -> Result<Response, AuthError> {
    let (email, password) = validate_credentials(credentials)?;

    let password_hash = bcrypt::hash(&password, bcrypt::DEFAULT_COST)
        .map_err(|_| AuthError::InternalError)?;

    let user = match state.user_store_mut().create(NewUser {
        email,
        password_hash,
    }) {
        Ok(user) => user,
        Err(error @ Error::DuplicateEmail) => return Ok(error.into_response()),
        Err(error) => {
            tracing::error!("Error creating user: {error}");
            return Err(AuthError::InternalError);
        }
    };

    let token = encode_jwt(user.id, state.encoding_key())?;

    Ok((
        StatusCode::CREATED,
        Json(AuthBody {
            success: true,
            token,
            user,
        }),
    )
        .into_response())
}

/// Handler for sign-in requests.
///
/// # Errors
/// Responds 401 if the email is not registered or the password does not
/// match. Both cases are the same response so that registered emails cannot
/// be probed.
pub async fn sign_in(
    State(state): State<AppState>,
    Json(credentials): Json<Credentials>,
) -> Result<Response, AuthError> {
    let (email, password) = validate_credentials(credentials)?;

    let user = state
        .user_store()
        .get_by_email(&email)
        .map_err(|error| match error {
            Error::NotFound => AuthError::WrongCredentials,
            error => {
                tracing::error!("Error matching user: {error}");
                AuthError::InternalError
            }
        })?;

    let password_is_correct = bcrypt::verify(&password, &user.password_hash).map_err(|error| {
        tracing::error!("Error verifying password: {error}");
        AuthError::InternalError
    })?;

    if !password_is_correct {
        return Err(AuthError::WrongCredentials);
    }

    let token = encode_jwt(user.id, state.encoding_key())?;

    Ok(Json(AuthBody {
        success: true,
        token,
        user,
    })
    .into_response())
}

fn validate_credentials(credentials: Credentials) -> Result<(String, String), AuthError> {
    match (credentials.email, credentials.password) {
        (Some(email), Some(password))
            if email.contains('@') && !password.is_empty() =>
        {
            Ok((email.to_lowercase(), password))
        }
        _ => Err(AuthError::MissingCredentials),
    }
}

fn encode_jwt(user_id: UserID, encoding_key: &EncodingKey) -> Result<String, AuthError> {
    let now = OffsetDateTime::now_utc();
    let claims = Claims {
        sub: user_id.as_i64(),
        exp: (now + TOKEN_LIFETIME).unix_timestamp() as usize,
        iat: now.unix_timestamp() as usize,
    };

    encode(&Header::default(), &claims, encoding_key).map_err(|_| AuthError::TokenCreation)
}

fn decode_jwt(token: &str, decoding_key: &DecodingKey) -> Result<TokenData<Claims>, AuthError> {
    decode(token, decoding_key, &Validation::default()).map_err(|_| AuthError::InvalidToken)
}
