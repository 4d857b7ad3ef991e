use std::convert::Infallible;

use serde::{Deserialize, Serialize};
use warp::{
    hyper::StatusCode,
    path,
    reply::{json, with_status},
    Filter, Rejection, Reply,
};

use crate::{
    error::CredentialError,
    service::{CredentialService, LinkService},
    types::{Credentials, Email, Link, LinkId, NewLink, NewUser, User, UserId, Username},
};

/// All routes: registration and login are open, everything else requires a
/// bearer token.
pub fn build_api_route_filter(
    users: &CredentialService,
    links: &LinkService,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    let register = path!("users" / "register")
        .and(warp::post())
        .and(warp::body::json())
        .and(with_state(users.clone()))
        .and_then(user_register);

    let login = path!("users" / "login")
        .and(warp::post())
        .and(warp::body::json())
        .and(with_state(users.clone()))
        .and_then(user_login);

    let get_user = path!("users" / String)
        .and(warp::get())
        .and(with_auth(users))
        .and(with_state(users.clone()))
        .and_then(user_get);

    let create_link = path!("links")
        .and(warp::post())
        .and(warp::body::json())
        .and(with_auth(users))
        .and(with_state(users.clone()))
        .and(with_state(links.clone()))
        .and_then(link_create);

    let get_link = path!("links" / String)
        .and(warp::get())
        .and(with_auth(users))
        .and(with_state(links.clone()))
        .and_then(link_get);

    register
        .or(login)
        .or(get_user)
        .or(create_link)
        .or(get_link)
}

/// Extracts the id of the authenticated user from an `Authorization: Bearer`
/// header.
pub fn with_auth(
    users: &CredentialService,
) -> impl Filter<Extract = (UserId,), Error = Rejection> + Clone {
    warp::header::optional::<String>("authorization")
        .and(with_state(users.clone()))
        .and_then(user_auth_check)
}

pub async fn handle_rejection(err: Rejection) -> Result<impl Reply, Rejection> {
    if let Some(error) = err.find::<CredentialError>() {
        let status = match error {
            CredentialError::Validation(_) | CredentialError::BadRequest => {
                StatusCode::BAD_REQUEST
            }
            CredentialError::PermissionDenied { .. } => StatusCode::FORBIDDEN,
            CredentialError::ObjectNotFound { .. } => StatusCode::NOT_FOUND,
            CredentialError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = ErrorResponse {
            error: error.to_string(),
        };
        return Ok(with_status(json(&body), status));
    }

    Err(err)
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// A user as shown over HTTP: never includes the password hash.
#[derive(Debug, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: UserId,
    pub username: Username,
    pub email: Email,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
}

#[derive(Debug, Deserialize)]
pub struct LinkQuery {
    pub title: String,
    pub href: String,
}

async fn user_register(input: NewUser, users: CredentialService) -> Result<impl Reply, Rejection> {
    let user = users.create_user(input).await?;

    Ok(json(&UserResponse::from(user)))
}

async fn user_login(input: Credentials, users: CredentialService) -> Result<impl Reply, Rejection> {
    let token = users.login(input).await?;

    Ok(json(&LoginResponse { token: token.value }))
}

async fn user_get(
    id: String,
    _caller: UserId,
    users: CredentialService,
) -> Result<impl Reply, Rejection> {
    let user = users.get_by_id(&UserId(id)).await?;

    Ok(json(&UserResponse::from(user)))
}

async fn link_create(
    input: LinkQuery,
    caller: UserId,
    users: CredentialService,
    links: LinkService,
) -> Result<impl Reply, Rejection> {
    // The token may outlive the account it was issued for.
    if !users.exists(&caller).await {
        return Err(CredentialError::PermissionDenied { source: None }.into());
    }

    let link: Link = links
        .create(NewLink {
            title: input.title,
            href: input.href,
            user: caller,
        })
        .await?;

    Ok(json(&link))
}

async fn link_get(
    id: String,
    _caller: UserId,
    links: LinkService,
) -> Result<impl Reply, Rejection> {
    let link = links.get_by_id(&LinkId(id)).await?;

    Ok(json(&link))
}

// Unwrap the bearer token and validate it
async fn user_auth_check(
    header: Option<String>,
    users: CredentialService,
) -> Result<UserId, Rejection> {
    let token = match header.as_deref().and_then(|h| h.split_once(' ')) {
        Some((scheme, token)) if scheme.eq_ignore_ascii_case("bearer") => token.trim(),
        _ => return Err(CredentialError::PermissionDenied { source: None }.into()),
    };

    Ok(users.authenticate(token)?)
}

// functor that adds a clone of a service into the filter chain
fn with_state<T: Clone + Send + Sync + 'static>(
    state: T,
) -> impl Filter<Extract = (T,), Error = Infallible> + Clone {
    warp::any().map(move || state.clone())
}
