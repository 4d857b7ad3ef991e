use std::{net::SocketAddr, sync::Arc};

use anchorly::{
    build_api_route_filter, handle_rejection, AuthConfig, CredentialService, HashCost,
    InMemoryLinkRepository, InMemoryUserRepository, LinkService, SigningSecret, TokenIssuer,
    UserId,
};
use mockable::DefaultClock;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{json, Value};
use warp::Filter;

fn auth_config(secret: &str) -> AuthConfig {
    let mut config = AuthConfig::new(SigningSecret::new(secret).unwrap());
    config.hash_cost = HashCost {
        mem_cost_kib: 1024,
        time_cost: 1,
    };
    config
}

fn start_server() -> SocketAddr {
    let users = CredentialService::new(
        Arc::new(InMemoryUserRepository::new()),
        &auth_config("this is a really bad secret"),
    );
    let links = LinkService::new(Arc::new(InMemoryLinkRepository::new()));

    let routes = build_api_route_filter(&users, &links).recover(handle_rejection);

    let (addr, server) = warp::serve(routes).bind_ephemeral(([127, 0, 0, 1], 0));
    tokio::spawn(server);
    addr
}

#[derive(Deserialize)]
struct LoginResponse {
    token: String,
}

#[tokio::test]
async fn integration() {
    let base = format!("http://{}", start_server());
    let client = reqwest::Client::new();

    let registered = client
        .post(format!("{base}/users/register"))
        .json(&json!({"username": "Sam I Am", "email": "sam@example.com", "password": "green eggs and ham"}))
        .send()
        .await
        .unwrap();
    assert_eq!(
        registered.status(),
        StatusCode::OK,
        "failed to register user"
    );
    let user: Value = registered.json().await.unwrap();
    assert!(user.get("password").is_none(), "hash leaked over http");
    let user_id = user["id"].as_str().unwrap().to_string();

    let invalid = client
        .post(format!("{base}/users/register"))
        .json(&json!({"username": "Sam", "email": "not-an-email", "password": "x"}))
        .send()
        .await
        .unwrap();
    assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);
    let body: Value = invalid.json().await.unwrap();
    assert_eq!(body["error"], "username is invalid");

    assert_eq!(
        client
            .post(format!("{base}/users/login"))
            .json(&json!({"email": "sam@example.com", "password": "hunter22"}))
            .send()
            .await
            .unwrap()
            .status(),
        StatusCode::FORBIDDEN,
        "attempt to login with an invalid password should have been denied"
    );

    assert_eq!(
        client
            .post(format!("{base}/users/login"))
            .json(&json!({"email": "who@example.com", "password": "green eggs and ham"}))
            .send()
            .await
            .unwrap()
            .status(),
        StatusCode::BAD_REQUEST,
        "login for an unknown email should be a bad request"
    );

    let login_response = client
        .post(format!("{base}/users/login"))
        .json(&json!({"email": "sam@example.com", "password": "green eggs and ham"}))
        .send()
        .await
        .unwrap();
    assert_eq!(
        login_response.status(),
        StatusCode::OK,
        "failed to login as user"
    );
    let auth_token = login_response.json::<LoginResponse>().await.unwrap().token;

    let forged = TokenIssuer::new(
        &auth_config("some other secret"),
        Arc::new(DefaultClock),
    )
    .issue(&UserId(user_id.clone()))
    .unwrap();
    assert_eq!(
        client
            .get(format!("{base}/users/{user_id}"))
            .bearer_auth(forged.value)
            .send()
            .await
            .unwrap()
            .status(),
        StatusCode::FORBIDDEN,
        "a token signed with another secret should have been denied"
    );

    assert_eq!(
        client
            .get(format!("{base}/users/{user_id}"))
            .send()
            .await
            .unwrap()
            .status(),
        StatusCode::FORBIDDEN,
        "a request without an authorization header should have been denied"
    );

    assert_eq!(
        client
            .get(format!("{base}/users/{user_id}"))
            .header("authorization", format!("Basic {auth_token}"))
            .send()
            .await
            .unwrap()
            .status(),
        StatusCode::FORBIDDEN,
        "only bearer tokens are accepted"
    );

    let me = client
        .get(format!("{base}/users/{user_id}"))
        .bearer_auth(&auth_token)
        .send()
        .await
        .unwrap();
    assert_eq!(me.status(), StatusCode::OK);
    let me: Value = me.json().await.unwrap();
    assert_eq!(me["email"], "sam@example.com");

    let link = client
        .post(format!("{base}/links"))
        .bearer_auth(&auth_token)
        .json(&json!({"title": "Rust book", "href": "https://doc.rust-lang.org/book/"}))
        .send()
        .await
        .unwrap();
    assert_eq!(link.status(), StatusCode::OK, "failed to create link");
    let link: Value = link.json().await.unwrap();
    assert_eq!(link["user"], user_id.as_str());
    let link_id = link["id"].as_str().unwrap();

    assert_eq!(
        client
            .post(format!("{base}/links"))
            .bearer_auth(&auth_token)
            .json(&json!({"title": "Rust book", "href": "nowhere"}))
            .send()
            .await
            .unwrap()
            .status(),
        StatusCode::BAD_REQUEST,
        "a link with a bad href should have been refused"
    );

    assert_eq!(
        client
            .get(format!("{base}/links/{link_id}"))
            .bearer_auth(&auth_token)
            .send()
            .await
            .unwrap()
            .status(),
        StatusCode::OK,
        "failed to fetch link"
    );

    assert_eq!(
        client
            .get(format!("{base}/links/does-not-exist"))
            .bearer_auth(&auth_token)
            .send()
            .await
            .unwrap()
            .status(),
        StatusCode::NOT_FOUND
    );
}
