//! In-process fake of the AniTinder backend: REST under `/api/`, chat
//! sockets under `/ws/chat/{room}/`.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use anitinder::clients::ApiClient;
use anitinder::session::{MemoryStorage, SessionContext, SessionStorage, StoredSession};
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Multipart, Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use futures::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

pub const SUBARU: u64 = 3;
pub const REM: u64 = 7;
pub const PASSWORD: &str = "return-by-death";

type Reply = Result<Response, (StatusCode, Json<Value>)>;

fn fail(status: StatusCode, key: &str, message: &str) -> (StatusCode, Json<Value>) {
    (status, Json(json!({ key: message })))
}

/// One multipart field as received by the profile update route.
#[derive(Debug, Clone)]
pub struct Upload {
    pub name: String,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub size: usize,
}

#[derive(Default)]
pub struct Data {
    pub users: Vec<(u64, String)>,
    pub tokens: HashMap<String, u64>,
    pub catalog: Vec<Value>,
    pub quotes: Vec<Value>,
    pub lists: HashMap<u64, Vec<Value>>,
    pub skipped: HashMap<u64, Vec<Value>>,
    pub messages: HashMap<String, Vec<Value>>,
    /// Friend lists by owner; users without an entry have no list yet.
    pub friends: HashMap<u64, Vec<u64>>,
    pub requests: Vec<Value>,
    /// `(follower, followee)`
    pub follows: Vec<(u64, u64)>,
    pub bios: HashMap<u64, String>,
    pub images: HashMap<u64, String>,
    pub uploads: Vec<Upload>,
    /// Bodies posted to the accept/decline routes.
    pub actions: Vec<Value>,
    pub last_search: Option<HashMap<String, String>>,
    /// `(id, low, high)`
    pub conversations: Vec<(u64, u64, u64)>,
    pub next_id: u64,
}

impl Data {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn username(&self, id: u64) -> Option<String> {
        self.users
            .iter()
            .find(|(uid, _)| *uid == id)
            .map(|(_, name)| name.clone())
    }

    fn user_ref(&self, id: u64) -> Value {
        json!({"id": id, "username": self.username(id)})
    }

    fn profile_json(&self, id: u64) -> Option<Value> {
        let username = self.username(id)?;
        Some(json!({
            "id": id + 500,
            "user_id": id,
            "username": username,
            "bio": self.bios.get(&id).cloned().unwrap_or_default(),
            "profile_image": self.images.get(&id),
            "anime_list_public": true
        }))
    }

    fn friend_list(&self, id: u64) -> Option<Value> {
        let friends = self.friends.get(&id)?;
        Some(json!({
            "user": self.username(id),
            "user_id": id,
            "friends": friends.iter().map(|f| self.user_ref(*f)).collect::<Vec<_>>()
        }))
    }

    fn conversation_json(&self, (id, low, high): (u64, u64, u64)) -> Value {
        json!({
            "id": id,
            "participants": [self.username(low), self.username(high)],
            "room_name_1": format!("{low}_{high}"),
            "messages": self.messages.get(&format!("{low}_{high}")).cloned().unwrap_or_default()
        })
    }
}

#[derive(Clone, Default)]
pub struct Backend {
    pub data: Arc<Mutex<Data>>,
    rooms: Arc<Mutex<HashMap<String, broadcast::Sender<String>>>>,
}

impl Backend {
    pub fn seeded() -> Self {
        let backend = Self::default();
        {
            let mut data = backend.data.lock().unwrap();
            data.next_id = 1000;
            data.users = vec![(SUBARU, "subaru".into()), (REM, "rem".into())];
            data.friends = HashMap::from([(SUBARU, Vec::new()), (REM, Vec::new())]);
            data.catalog = (1..=5)
                .map(|i| {
                    json!({
                        "id": i,
                        "title": format!("Anime {i}"),
                        "mal_id": i * 100,
                        "genres": [{"id": i, "name": if i % 2 == 0 { "Drama" } else { "Action" }}],
                        "score": 4.0 + i as f64,
                        "episodes": 12,
                        "year": 2020,
                        "image_url": null,
                        "synopsis": "A story.",
                        "trailer_url": null
                    })
                })
                .collect();
            data.quotes = (1..=6)
                .map(|i| json!({"id": i, "anime": "Re:Zero", "character": "Subaru", "quote": format!("Quote {i}")}))
                .collect();
        }
        backend
    }

    pub fn list_of(&self, user: u64) -> Vec<Value> {
        self.data.lock().unwrap().lists.get(&user).cloned().unwrap_or_default()
    }

    pub fn skipped_of(&self, user: u64) -> Vec<Value> {
        self.data.lock().unwrap().skipped.get(&user).cloned().unwrap_or_default()
    }

    pub fn friends_of(&self, user: u64) -> Vec<u64> {
        self.data.lock().unwrap().friends.get(&user).cloned().unwrap_or_default()
    }

    pub fn issue_token(&self, user: u64) -> String {
        let mut data = self.data.lock().unwrap();
        let token = format!("token-{user}-{}", data.next_id());
        data.tokens.insert(token.clone(), user);
        token
    }

    fn room(&self, name: &str) -> broadcast::Sender<String> {
        self.rooms
            .lock()
            .unwrap()
            .entry(name.to_string())
            .or_insert_with(|| broadcast::channel(64).0)
            .clone()
    }

    /// Token authentication runs before the view, so even the open
    /// credential endpoints refuse an unknown token.
    fn reject_unknown_token(&self, headers: &HeaderMap) -> Result<(), (StatusCode, Json<Value>)> {
        if headers.contains_key("authorization") {
            self.auth(headers)?;
        }
        Ok(())
    }

    fn auth(&self, headers: &HeaderMap) -> Result<u64, (StatusCode, Json<Value>)> {
        let token = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Token "))
            .ok_or_else(|| {
                fail(
                    StatusCode::UNAUTHORIZED,
                    "detail",
                    "Authentication credentials were not provided.",
                )
            })?;
        self.data
            .lock()
            .unwrap()
            .tokens
            .get(token)
            .copied()
            .ok_or_else(|| fail(StatusCode::UNAUTHORIZED, "detail", "Invalid token."))
    }
}

pub fn router(backend: Backend) -> Router {
    let api = Router::new()
        .route("/users/login/", post(login))
        .route("/users/register/", post(register))
        .route("/users/logout/", post(logout))
        .route("/users/me/", get(me))
        .route("/users/all/", get(all_users))
        .route("/users/profile/{id}/", get(profile))
        .route("/users/profile/{id}/update/", put(update_profile))
        .route("/anime/all/", get(catalog))
        .route("/anime/genres/", get(genres))
        .route("/anime/quotes/", get(quotes))
        .route("/anime/search", get(search))
        .route("/users/anime/", get(my_list).post(add_to_list))
        .route("/users/anime/recent/{user}/", get(recent))
        .route("/users/anime/update/{mal_id}/", put(update_status))
        .route("/users/anime/delete/{id}/", delete(delete_entry))
        .route("/users/anime/temp-deleted/", get(my_skipped).post(add_skipped))
        .route("/users/anime/temp-deleted/{id}/", delete(restore_skipped))
        .route("/users/anime/temp-deleted/delete-all/{user}/", delete(clear_skipped))
        .route("/friends/", get(my_friends))
        .route("/friends/{id}/", get(friends_of))
        .route("/friends/requests/", get(incoming_requests))
        .route("/friends/requests/sent/", get(sent_requests))
        .route("/friends/requests/add/{id}/", post(add_request))
        .route("/friends/requests/accept/", post(accept_request))
        .route("/friends/requests/decline/", post(decline_request))
        .route("/friends/requests/cancel/{id}/", post(cancel_request))
        .route("/friends/unfriend/{id}/", post(unfriend))
        .route("/follow/user/{id}/", post(follow))
        .route("/follow/unfollow/{id}/", post(unfollow))
        .route("/follow/followers/{id}/", get(followers))
        .route("/follow/following/{id}/", get(following))
        .route("/chat/", get(conversations))
        .route("/chat/create/", post(create_conversation))
        .route("/chat/messages/{room}/", get(history));

    Router::new()
        .nest("/api", api)
        .route("/ws/chat/{room}/", get(chat_socket))
        .with_state(backend)
}

async fn login(State(b): State<Backend>, headers: HeaderMap, Json(body): Json<Value>) -> Reply {
    b.reject_unknown_token(&headers)?;
    let username = body["username"].as_str().unwrap_or_default();
    let user = b
        .data
        .lock()
        .unwrap()
        .users
        .iter()
        .find(|(_, name)| name == username)
        .map(|(id, _)| *id);
    match user {
        Some(id) if body["password"] == PASSWORD => {
            let token = b.issue_token(id);
            Ok(Json(json!({"token": token, "user_id": id, "username": username})).into_response())
        }
        _ => Err(fail(StatusCode::UNAUTHORIZED, "detail", "Invalid credentials.")),
    }
}

async fn register(State(b): State<Backend>, headers: HeaderMap, Json(body): Json<Value>) -> Reply {
    b.reject_unknown_token(&headers)?;
    let username = body["username"].as_str().unwrap_or_default().to_string();
    let mut data = b.data.lock().unwrap();
    if data.users.iter().any(|(_, name)| *name == username) {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(json!({"username": ["A user with that username already exists."]})),
        ));
    }
    let id = data.next_id();
    data.users.push((id, username.clone()));
    Ok((StatusCode::CREATED, Json(json!({"id": id, "username": username}))).into_response())
}

async fn logout(State(b): State<Backend>, headers: HeaderMap) -> Reply {
    b.auth(&headers)?;
    if let Some(token) = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Token "))
    {
        b.data.lock().unwrap().tokens.remove(token);
    }
    Ok(StatusCode::NO_CONTENT.into_response())
}

async fn me(State(b): State<Backend>, headers: HeaderMap) -> Reply {
    let user = b.auth(&headers)?;
    let username = b.data.lock().unwrap().username(user);
    Ok(Json(json!({"id": user, "username": username})).into_response())
}

async fn profile(State(b): State<Backend>, headers: HeaderMap, Path(id): Path<u64>) -> Reply {
    b.auth(&headers)?;
    let profile = b
        .data
        .lock()
        .unwrap()
        .profile_json(id)
        .ok_or_else(|| fail(StatusCode::NOT_FOUND, "detail", "Not found."))?;
    Ok(Json(profile).into_response())
}

async fn all_users(State(b): State<Backend>, headers: HeaderMap) -> Reply {
    b.auth(&headers)?;
    let data = b.data.lock().unwrap();
    let users: Vec<Value> = data
        .users
        .iter()
        .map(|(id, name)| json!({"id": id + 500, "user_id": id, "username": name, "profile_image": null}))
        .collect();
    Ok(Json(Value::Array(users)).into_response())
}

async fn update_profile(
    State(b): State<Backend>,
    headers: HeaderMap,
    Path(id): Path<u64>,
    mut form: Multipart,
) -> Reply {
    let user = b.auth(&headers)?;
    if user != id {
        return Err(fail(StatusCode::FORBIDDEN, "detail", "Not allowed."));
    }

    let bad = |e: axum::extract::multipart::MultipartError| {
        fail(StatusCode::BAD_REQUEST, "detail", &e.to_string())
    };
    while let Some(field) = form.next_field().await.map_err(bad)? {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await.map_err(bad)?;

        let mut data = b.data.lock().unwrap();
        match name.as_str() {
            "username" => {
                let new_name = String::from_utf8_lossy(&bytes).into_owned();
                if let Some(entry) = data.users.iter_mut().find(|(uid, _)| *uid == id) {
                    entry.1 = new_name;
                }
            }
            "bio" => {
                data.bios.insert(id, String::from_utf8_lossy(&bytes).into_owned());
            }
            "profile_image" => {
                let stored = format!("/media/profile_images/{}", file_name.as_deref().unwrap_or("upload"));
                data.images.insert(id, stored);
            }
            _ => {}
        }
        data.uploads.push(Upload {
            name,
            file_name,
            content_type,
            size: bytes.len(),
        });
    }

    let profile = b.data.lock().unwrap().profile_json(id);
    Ok(Json(profile).into_response())
}

async fn catalog(State(b): State<Backend>, headers: HeaderMap) -> Reply {
    b.auth(&headers)?;
    Ok(Json(Value::Array(b.data.lock().unwrap().catalog.clone())).into_response())
}

async fn genres(State(b): State<Backend>, headers: HeaderMap) -> Reply {
    b.auth(&headers)?;
    Ok(Json(json!([{"id": 1, "name": "Action"}, {"id": 2, "name": "Drama"}])).into_response())
}

async fn search(
    State(b): State<Backend>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Reply {
    b.auth(&headers)?;
    let mut data = b.data.lock().unwrap();
    let needle = params.get("q").cloned().unwrap_or_default().to_lowercase();
    let genre = params.get("genre").cloned();
    let results: Vec<Value> = data
        .catalog
        .iter()
        .filter(|a| {
            a["title"]
                .as_str()
                .is_some_and(|t| t.to_lowercase().contains(&needle))
        })
        .filter(|a| {
            genre.as_ref().is_none_or(|g| {
                a["genres"]
                    .as_array()
                    .is_some_and(|gs| gs.iter().any(|x| x["name"] == g.as_str()))
            })
        })
        .cloned()
        .collect();
    data.last_search = Some(params);
    Ok(Json(Value::Array(results)).into_response())
}

async fn quotes(State(b): State<Backend>, headers: HeaderMap) -> Reply {
    b.auth(&headers)?;
    Ok(Json(Value::Array(b.data.lock().unwrap().quotes.clone())).into_response())
}

async fn my_list(State(b): State<Backend>, headers: HeaderMap) -> Reply {
    let user = b.auth(&headers)?;
    Ok(Json(Value::Array(b.list_of(user))).into_response())
}

async fn recent(State(b): State<Backend>, headers: HeaderMap, Path(user): Path<u64>) -> Reply {
    b.auth(&headers)?;
    Ok(Json(Value::Array(b.list_of(user))).into_response())
}

async fn add_to_list(State(b): State<Backend>, headers: HeaderMap, Json(body): Json<Value>) -> Reply {
    let user = b.auth(&headers)?;
    let mut data = b.data.lock().unwrap();
    let list = data.lists.entry(user).or_default();
    if list.iter().any(|e| e["mal_id"] == body["mal_id"]) {
        return Err(fail(StatusCode::BAD_REQUEST, "error", "Anime already in list"));
    }
    let id = data.next_id();
    let entry = json!({
        "id": id,
        "author": user,
        "title": body["title"],
        "image_url": body["image_url"],
        "mal_id": body["mal_id"],
        "watched": body["watched"],
        "plan_to_watch": body["plan_to_watch"],
        "add_time": chrono::Utc::now().to_rfc3339()
    });
    data.lists.entry(user).or_default().push(entry.clone());
    Ok((StatusCode::CREATED, Json(entry)).into_response())
}

async fn update_status(
    State(b): State<Backend>,
    headers: HeaderMap,
    Path(mal_id): Path<i64>,
    Json(body): Json<Value>,
) -> Reply {
    let user = b.auth(&headers)?;
    let mut data = b.data.lock().unwrap();
    let entry = data
        .lists
        .entry(user)
        .or_default()
        .iter_mut()
        .find(|e| e["mal_id"] == mal_id)
        .ok_or_else(|| fail(StatusCode::NOT_FOUND, "error", "Anime not found"))?;
    entry["watched"] = body["watched"].clone();
    entry["plan_to_watch"] = body["plan_to_watch"].clone();
    Ok(Json(json!({"message": "Anime status updated"})).into_response())
}

async fn delete_entry(State(b): State<Backend>, headers: HeaderMap, Path(id): Path<u64>) -> Reply {
    let user = b.auth(&headers)?;
    let mut data = b.data.lock().unwrap();
    let list = data.lists.entry(user).or_default();
    let before = list.len();
    list.retain(|e| e["id"] != id);
    if list.len() == before {
        return Err(fail(StatusCode::NOT_FOUND, "error", "Anime not found"));
    }
    Ok(StatusCode::NO_CONTENT.into_response())
}

async fn my_skipped(State(b): State<Backend>, headers: HeaderMap) -> Reply {
    let user = b.auth(&headers)?;
    Ok(Json(Value::Array(b.skipped_of(user))).into_response())
}

async fn add_skipped(State(b): State<Backend>, headers: HeaderMap, Json(body): Json<Value>) -> Reply {
    let user = b.auth(&headers)?;
    let mut data = b.data.lock().unwrap();
    let id = data.next_id();
    let record = json!({
        "id": id,
        "title": body["title"],
        "image_url": body["image_url"],
        "mal_id": body["mal_id"],
        "time_deleted": chrono::Utc::now().to_rfc3339()
    });
    data.skipped.entry(user).or_default().push(record.clone());
    Ok((StatusCode::CREATED, Json(record)).into_response())
}

async fn restore_skipped(State(b): State<Backend>, headers: HeaderMap, Path(id): Path<u64>) -> Reply {
    let user = b.auth(&headers)?;
    let mut data = b.data.lock().unwrap();
    let records = data.skipped.entry(user).or_default();
    let before = records.len();
    records.retain(|r| r["id"] != id);
    if records.len() == before {
        return Err(fail(StatusCode::NOT_FOUND, "detail", "Not found."));
    }
    Ok(StatusCode::NO_CONTENT.into_response())
}

async fn clear_skipped(State(b): State<Backend>, headers: HeaderMap, Path(owner): Path<u64>) -> Reply {
    let user = b.auth(&headers)?;
    if user != owner {
        return Err(fail(StatusCode::FORBIDDEN, "detail", "Not allowed."));
    }
    let mut data = b.data.lock().unwrap();
    let records = data.skipped.entry(user).or_default();
    if records.is_empty() {
        return Err(fail(
            StatusCode::NOT_FOUND,
            "detail",
            "No temporarily deleted anime found",
        ));
    }
    records.clear();
    Ok(StatusCode::NO_CONTENT.into_response())
}

async fn my_friends(State(b): State<Backend>, headers: HeaderMap) -> Reply {
    let user = b.auth(&headers)?;
    let list = b.data.lock().unwrap().friend_list(user);
    Ok(Json(Value::Array(list.into_iter().collect())).into_response())
}

async fn friends_of(State(b): State<Backend>, headers: HeaderMap, Path(id): Path<u64>) -> Reply {
    b.auth(&headers)?;
    let list = b
        .data
        .lock()
        .unwrap()
        .friend_list(id)
        .ok_or_else(|| fail(StatusCode::NOT_FOUND, "detail", "Friend list not found"))?;
    Ok(Json(list).into_response())
}

async fn incoming_requests(State(b): State<Backend>, headers: HeaderMap) -> Reply {
    let user = b.auth(&headers)?;
    let requests: Vec<Value> = b
        .data
        .lock()
        .unwrap()
        .requests
        .iter()
        .filter(|r| r["receiver"] == user && r["is_active"] == true)
        .cloned()
        .collect();
    Ok(Json(Value::Array(requests)).into_response())
}

async fn sent_requests(State(b): State<Backend>, headers: HeaderMap) -> Reply {
    let user = b.auth(&headers)?;
    let requests: Vec<Value> = b
        .data
        .lock()
        .unwrap()
        .requests
        .iter()
        .filter(|r| r["sender"] == user && r["is_active"] == true)
        .cloned()
        .collect();
    Ok(Json(Value::Array(requests)).into_response())
}

async fn add_request(State(b): State<Backend>, headers: HeaderMap, Path(receiver): Path<u64>) -> Reply {
    let sender = b.auth(&headers)?;
    let mut data = b.data.lock().unwrap();
    if sender == receiver {
        return Err(fail(
            StatusCode::BAD_REQUEST,
            "error",
            "You cannot send a friend request to yourself",
        ));
    }
    let id = data.next_id();
    let request = json!({
        "id": id,
        "sender": sender,
        "sender_username": data.username(sender),
        "receiver": receiver,
        "receiver_username": data.username(receiver),
        "is_active": true,
        "created_at": chrono::Utc::now().to_rfc3339()
    });
    data.requests.push(request.clone());
    Ok((StatusCode::CREATED, Json(request)).into_response())
}

/// Marks an incoming request inactive and returns its sender.
fn close_request(data: &mut Data, user: u64, body: &Value) -> Result<u64, (StatusCode, Json<Value>)> {
    data.actions.push(body.clone());
    let request = data
        .requests
        .iter_mut()
        .find(|r| r["id"] == body["request_id"] && r["receiver"] == user && r["is_active"] == true)
        .ok_or_else(|| fail(StatusCode::NOT_FOUND, "error", "Friend request not found"))?;
    request["is_active"] = json!(false);
    Ok(request["sender"].as_u64().unwrap())
}

async fn accept_request(State(b): State<Backend>, headers: HeaderMap, Json(body): Json<Value>) -> Reply {
    let user = b.auth(&headers)?;
    let mut data = b.data.lock().unwrap();
    let sender = close_request(&mut data, user, &body)?;
    data.friends.entry(user).or_default().push(sender);
    data.friends.entry(sender).or_default().push(user);
    Ok(Json(json!({"message": "Friend request accepted"})).into_response())
}

async fn decline_request(State(b): State<Backend>, headers: HeaderMap, Json(body): Json<Value>) -> Reply {
    let user = b.auth(&headers)?;
    let mut data = b.data.lock().unwrap();
    close_request(&mut data, user, &body)?;
    Ok(Json(json!({"message": "Friend request declined"})).into_response())
}

async fn cancel_request(State(b): State<Backend>, headers: HeaderMap, Path(id): Path<u64>) -> Reply {
    let user = b.auth(&headers)?;
    let mut data = b.data.lock().unwrap();
    let request = data
        .requests
        .iter_mut()
        .find(|r| r["id"] == id && r["sender"] == user && r["is_active"] == true)
        .ok_or_else(|| fail(StatusCode::NOT_FOUND, "error", "Friend request not found"))?;
    request["is_active"] = json!(false);
    Ok(Json(json!({"message": "Friend request cancelled"})).into_response())
}

async fn unfriend(State(b): State<Backend>, headers: HeaderMap, Path(other): Path<u64>) -> Reply {
    let user = b.auth(&headers)?;
    let mut data = b.data.lock().unwrap();
    if let Some(list) = data.friends.get_mut(&user) {
        list.retain(|f| *f != other);
    }
    if let Some(list) = data.friends.get_mut(&other) {
        list.retain(|f| *f != user);
    }
    Ok(Json(json!({"message": "Friend removed"})).into_response())
}

async fn follow(State(b): State<Backend>, headers: HeaderMap, Path(id): Path<u64>) -> Reply {
    let user = b.auth(&headers)?;
    let mut data = b.data.lock().unwrap();
    if !data.follows.contains(&(user, id)) {
        data.follows.push((user, id));
    }
    Ok(Json(json!({"message": "Followed"})).into_response())
}

async fn unfollow(State(b): State<Backend>, headers: HeaderMap, Path(id): Path<u64>) -> Reply {
    let user = b.auth(&headers)?;
    b.data.lock().unwrap().follows.retain(|link| *link != (user, id));
    Ok(Json(json!({"message": "Unfollowed"})).into_response())
}

async fn followers(State(b): State<Backend>, headers: HeaderMap, Path(id): Path<u64>) -> Reply {
    b.auth(&headers)?;
    let data = b.data.lock().unwrap();
    let users: Vec<Value> = data
        .follows
        .iter()
        .filter(|(_, followee)| *followee == id)
        .map(|(follower, _)| data.user_ref(*follower))
        .collect();
    Ok(Json(json!({"username": data.username(id), "user_id": id, "followers": users})).into_response())
}

async fn following(State(b): State<Backend>, headers: HeaderMap, Path(id): Path<u64>) -> Reply {
    b.auth(&headers)?;
    let data = b.data.lock().unwrap();
    let users: Vec<Value> = data
        .follows
        .iter()
        .filter(|(follower, _)| *follower == id)
        .map(|(_, followee)| data.user_ref(*followee))
        .collect();
    Ok(Json(json!({"username": data.username(id), "user_id": id, "following": users})).into_response())
}

async fn conversations(State(b): State<Backend>, headers: HeaderMap) -> Reply {
    let user = b.auth(&headers)?;
    let data = b.data.lock().unwrap();
    let list: Vec<Value> = data
        .conversations
        .iter()
        .filter(|(_, low, high)| *low == user || *high == user)
        .map(|c| data.conversation_json(*c))
        .collect();
    Ok(Json(Value::Array(list)).into_response())
}

async fn create_conversation(State(b): State<Backend>, headers: HeaderMap, Json(body): Json<Value>) -> Reply {
    let user = b.auth(&headers)?;
    let other = body["participant_id"]
        .as_u64()
        .ok_or_else(|| fail(StatusCode::BAD_REQUEST, "participant_id", "This field is required."))?;
    let (low, high) = (user.min(other), user.max(other));
    let mut data = b.data.lock().unwrap();
    let existing = data
        .conversations
        .iter()
        .find(|(_, l, h)| *l == low && *h == high)
        .copied();
    let conversation = match existing {
        Some(c) => c,
        None => {
            let c = (data.next_id(), low, high);
            data.conversations.push(c);
            c
        }
    };
    Ok(Json(data.conversation_json(conversation)).into_response())
}

async fn history(State(b): State<Backend>, headers: HeaderMap, Path(room): Path<String>) -> Reply {
    b.auth(&headers)?;
    let messages = b
        .data
        .lock()
        .unwrap()
        .messages
        .get(&room)
        .cloned()
        .unwrap_or_default();
    Ok(Json(Value::Array(messages)).into_response())
}

async fn chat_socket(
    ws: WebSocketUpgrade,
    Path(room): Path<String>,
    State(b): State<Backend>,
) -> Response {
    ws.on_upgrade(move |socket| relay(socket, room, b))
}

/// Rebroadcasts `{content, sender, receiver}` frames to the whole room as
/// `{message, sender, receiver, timestamp}` and records them in history.
async fn relay(socket: WebSocket, room: String, b: Backend) {
    let tx = b.room(&room);
    let mut rx = tx.subscribe();
    let (mut sink, mut stream) = socket.split();

    let forward = tokio::spawn(async move {
        while let Ok(frame) = rx.recv().await {
            if sink.send(Message::Text(frame.into())).await.is_err() {
                break;
            }
        }
    });

    while let Some(Ok(message)) = stream.next().await {
        let Message::Text(text) = message else {
            continue;
        };
        let Ok(incoming) = serde_json::from_str::<Value>(text.as_str()) else {
            continue;
        };
        let timestamp = chrono::Utc::now().to_rfc3339();
        {
            let mut data = b.data.lock().unwrap();
            let id = data.next_id();
            let sender_username = incoming["sender"].as_u64().and_then(|s| data.username(s));
            data.messages.entry(room.clone()).or_default().push(json!({
                "id": id,
                "sender": incoming["sender"],
                "sender_username": sender_username,
                "receiver": incoming["receiver"],
                "content": incoming["content"],
                "timestamp": timestamp
            }));
        }
        let outgoing = json!({
            "message": incoming["content"],
            "sender": incoming["sender"],
            "receiver": incoming["receiver"],
            "timestamp": timestamp
        });
        let _ = tx.send(outgoing.to_string());
    }

    forward.abort();
}

pub struct TestServer {
    pub addr: SocketAddr,
    pub backend: Backend,
    handle: JoinHandle<()>,
}

impl TestServer {
    pub async fn start() -> Self {
        let backend = Backend::seeded();
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = router(backend.clone());
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        Self {
            addr,
            backend,
            handle,
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}/api/", self.addr)
    }

    pub fn ws_url(&self) -> String {
        format!("ws://{}/ws/", self.addr)
    }

    /// A client over fresh in-memory storage, plus that storage.
    pub fn client(&self) -> (ApiClient, Arc<MemoryStorage>) {
        self.client_with(StoredSession::default())
    }

    pub fn client_with(&self, stored: StoredSession) -> (ApiClient, Arc<MemoryStorage>) {
        let storage = Arc::new(MemoryStorage::with_session(stored));
        let context = SessionContext::new(storage.clone() as Arc<dyn SessionStorage>);
        let api = ApiClient::with_client(reqwest::Client::new(), &self.base_url(), context).unwrap();
        (api, storage)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
