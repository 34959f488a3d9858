use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::Form;
use axum::Json;
use axum::Router;
use serde::Deserialize;
use tracing::{debug, error, info};

use super::pages::{
    render_home_page, render_post_form_page, render_post_page, render_profile_page,
    render_users_page, PostFormParams, PostPageParams, ProfilePageParams,
};
use super::views::{generate_view_id, lock_view, SharedView, ViewKey};
use super::AppState;
use crate::auth::{cookie_value, MaybeUser, RequireUser};
use crate::comments::{
    self, build_forest, generate_diagram, CommentError, CommentStore, CommentTreeView,
    Completion, ComposeTarget, DiagramPost, Submission,
};
use crate::constants::{MAX_DISPLAY_NAME_CHARS, MAX_POST_CHARS, MAX_TITLE_CHARS, VIEW_COOKIE};
use crate::db::{self, Comment, NewPost, Post};

/// Create the router with all routes.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(home))
        .route("/healthz", get(health))
        .route("/posts", post(create_post))
        .route("/posts/new", get(new_post_form))
        .route("/posts/:id", get(show_post))
        .route("/posts/:id/edit", get(edit_post_form).post(update_post))
        .route("/posts/:id/delete", post(delete_post))
        .route("/posts/:id/diagram.mmd", get(diagram))
        .route("/posts/:id/comments", post(post_comment))
        .route("/posts/:id/comments/collapse", post(collapse_all))
        .route("/posts/:id/comments/:cid/toggle", post(toggle_comment))
        .route("/posts/:id/comments/:cid/reply/start", post(start_reply))
        .route("/posts/:id/comments/:cid/reply/cancel", post(cancel_reply))
        .route("/posts/:id/comments/:cid/reply", post(submit_reply))
        .route("/posts/:id/comments/:cid/edit/start", post(start_edit))
        .route("/posts/:id/comments/:cid/edit/cancel", post(cancel_edit))
        .route("/posts/:id/comments/:cid/edit", post(update_comment))
        .route("/posts/:id/comments/:cid/delete", post(delete_comment))
        .route("/users", get(users_directory))
        .route("/users/:id", get(profile))
        .route("/account/name", post(update_display_name))
        .route("/api/posts/:id/comments", get(api_comments))
        .route("/api/posts/:id/comments/count", get(api_comment_count))
}

// ========== Shared helpers ==========

fn db_error(context: &str, e: &anyhow::Error) -> Response {
    error!("{context}: {e:#}");
    (StatusCode::INTERNAL_SERVER_ERROR, "Database error").into_response()
}

fn comment_error(post_id: i64, e: &CommentError) -> Response {
    if let CommentError::Store(inner) = e {
        error!(post_id, "Comment store failure: {inner:#}");
    }
    (e.status_code(), e.user_message()).into_response()
}

async fn find_post(state: &AppState, post_id: i64) -> Result<Post, Response> {
    match db::get_post(state.db.pool(), post_id).await {
        Ok(Some(post)) => Ok(post),
        Ok(None) => Err((StatusCode::NOT_FOUND, "Post not found").into_response()),
        Err(e) => Err(db_error("Failed to fetch post", &e)),
    }
}

/// The caller's live view of one post.
struct OpenView {
    view: SharedView,
    view_id: String,
    new_cookie: bool,
}

fn is_valid_view_id(id: &str) -> bool {
    !id.is_empty() && id.len() <= 64 && id.chars().all(|c| c.is_ascii_alphanumeric())
}

/// Find or create the caller's view of a post.
///
/// `fresh` replaces the view's comments when given; otherwise comments are
/// only fetched for a view that does not exist yet.
async fn open_view(
    state: &AppState,
    headers: &HeaderMap,
    post_id: i64,
    post_author_id: i64,
    viewer: Option<i64>,
    fresh: Option<Vec<Comment>>,
) -> Result<OpenView, Response> {
    let (view_id, new_cookie) = match cookie_value(headers, VIEW_COOKIE) {
        Some(id) if is_valid_view_id(id) => (id.to_string(), false),
        _ => (generate_view_id(), true),
    };
    let key = ViewKey::new(view_id.clone(), post_id);

    let view = if let Some(view) = state.views.get(&key) {
        {
            let mut guard = lock_view(&view);
            guard.set_viewer(viewer);
            if let Some(comments) = fresh {
                guard.refresh(comments);
            }
        }
        view
    } else {
        let comments = match fresh {
            Some(comments) => comments,
            None => match state.db.list_comments(post_id).await {
                Ok(comments) => comments,
                Err(e) => return Err(comment_error(post_id, &e)),
            },
        };
        let view = state.views.get_or_insert_with(key, || {
            CommentTreeView::new(
                post_id,
                post_author_id,
                viewer,
                comments,
                CommentTreeView::next_epoch(),
            )
        });
        lock_view(&view).set_viewer(viewer);
        view
    };

    Ok(OpenView {
        view,
        view_id,
        new_cookie,
    })
}

fn with_view_cookie(mut response: Response, open: &OpenView) -> Response {
    if open.new_cookie {
        let cookie = format!(
            "{VIEW_COOKIE}={}; Path=/; HttpOnly; SameSite=Lax",
            open.view_id
        );
        if let Ok(value) = HeaderValue::from_str(&cookie) {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
    }
    response
}

fn back_to_post(post_id: i64, anchor: Option<i64>) -> Redirect {
    match anchor {
        Some(comment_id) => Redirect::to(&format!("/posts/{post_id}#c{comment_id}")),
        None => Redirect::to(&format!("/posts/{post_id}#comments")),
    }
}

/// Apply one interaction to the caller's view and redirect back to the post.
///
/// When `act` yields a submission it is executed against the store with the
/// view unlocked, then its result is fed back into the view.
async fn interact<F>(
    state: &AppState,
    headers: &HeaderMap,
    post_id: i64,
    viewer: Option<i64>,
    anchor: Option<i64>,
    act: F,
) -> Response
where
    F: FnOnce(&mut CommentTreeView) -> Option<Submission> + Send,
{
    let post = match find_post(state, post_id).await {
        Ok(post) => post,
        Err(response) => return response,
    };
    let open = match open_view(state, headers, post.id, post.author_id, viewer, None).await {
        Ok(open) => open,
        Err(response) => return response,
    };

    let submission = {
        let mut view = lock_view(&open.view);
        act(&mut view)
    };

    if let Some(submission) = submission {
        let result = comments::execute(&state.db, viewer, &submission.action).await;
        match &result {
            Err(CommentError::Store(e)) => {
                error!(post_id, "Comment mutation failed: {e:#}");
            }
            Err(e) => debug!(post_id, "Comment mutation rejected: {e}"),
            Ok(_) => {}
        }
        let completion = lock_view(&open.view).complete(submission.ticket, result);
        if completion == Completion::Stale {
            debug!(post_id, "Mutation finished after its view was discarded");
        }
    }

    with_view_cookie(back_to_post(post.id, anchor).into_response(), &open)
}

// ========== Posts ==========

async fn home(State(state): State<AppState>, MaybeUser(user): MaybeUser) -> Response {
    let posts = match db::list_posts(state.db.pool(), 50).await {
        Ok(posts) => posts,
        Err(e) => return db_error("Failed to list posts", &e),
    };

    Html(render_home_page(&posts, user.as_ref(), &state.config.site_name).into_string())
        .into_response()
}

async fn health(State(state): State<AppState>) -> Response {
    match state.db.ping().await {
        Ok(()) => "OK".into_response(),
        Err(e) => {
            error!("Health check failed: {e:#}");
            (StatusCode::SERVICE_UNAVAILABLE, "Database unavailable").into_response()
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct PostInput {
    title: String,
    content: String,
}

/// Trim and bound post input.
fn validate_post_input(input: &PostInput) -> Result<(&str, &str), String> {
    let title = input.title.trim();
    let content = input.content.trim();
    if title.is_empty() {
        return Err("Title cannot be empty".to_string());
    }
    if title.chars().count() > MAX_TITLE_CHARS {
        return Err(format!("Title must be at most {MAX_TITLE_CHARS} characters"));
    }
    if content.is_empty() {
        return Err("Post cannot be empty".to_string());
    }
    if content.chars().count() > MAX_POST_CHARS {
        return Err(format!("Post must be at most {MAX_POST_CHARS} characters"));
    }
    Ok((title, content))
}

async fn new_post_form(State(state): State<AppState>, RequireUser(user): RequireUser) -> Response {
    let page = render_post_form_page(&PostFormParams {
        post_id: None,
        title: "",
        content: "",
        error: None,
        user: &user,
        site_name: &state.config.site_name,
    });
    Html(page.into_string()).into_response()
}

async fn create_post(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Form(input): Form<PostInput>,
) -> Response {
    let (title, content) = match validate_post_input(&input) {
        Ok(valid) => valid,
        Err(message) => {
            let page = render_post_form_page(&PostFormParams {
                post_id: None,
                title: &input.title,
                content: &input.content,
                error: Some(message.as_str()),
                user: &user,
                site_name: &state.config.site_name,
            });
            return (StatusCode::UNPROCESSABLE_ENTITY, Html(page.into_string())).into_response();
        }
    };

    let new_post = NewPost {
        author_id: user.id,
        title: title.to_string(),
        content: content.to_string(),
    };
    match db::insert_post(state.db.pool(), &new_post).await {
        Ok(id) => {
            info!(post_id = id, user_id = user.id, "Post created");
            Redirect::to(&format!("/posts/{id}")).into_response()
        }
        Err(e) => db_error("Failed to create post", &e),
    }
}

async fn show_post(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    headers: HeaderMap,
    MaybeUser(user): MaybeUser,
) -> Response {
    let post = match db::get_post_with_author(state.db.pool(), id).await {
        Ok(Some(post)) => post,
        Ok(None) => return (StatusCode::NOT_FOUND, "Post not found").into_response(),
        Err(e) => return db_error("Failed to fetch post", &e),
    };
    let comments = match state.db.list_comments(id).await {
        Ok(comments) => comments,
        Err(e) => return comment_error(id, &e),
    };

    let viewer = user.as_ref().map(|u| u.id);
    let open = match open_view(&state, &headers, id, post.author_id, viewer, Some(comments)).await
    {
        Ok(open) => open,
        Err(response) => return response,
    };

    let page = {
        let mut view = lock_view(&open.view);
        let notices = view.take_notices();
        render_post_page(&PostPageParams {
            post: &post,
            view: &*view,
            notices: &notices,
            user: user.as_ref(),
            site_name: &state.config.site_name,
        })
    };

    with_view_cookie(Html(page.into_string()).into_response(), &open)
}

/// Fetch a post the user wrote, answering 404 for anyone else.
async fn own_post(state: &AppState, post_id: i64, user_id: i64) -> Result<Post, Response> {
    let post = find_post(state, post_id).await?;
    if post.author_id == user_id {
        Ok(post)
    } else {
        Err((StatusCode::NOT_FOUND, "Post not found").into_response())
    }
}

async fn edit_post_form(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    RequireUser(user): RequireUser,
) -> Response {
    let post = match own_post(&state, id, user.id).await {
        Ok(post) => post,
        Err(response) => return response,
    };
    let page = render_post_form_page(&PostFormParams {
        post_id: Some(post.id),
        title: &post.title,
        content: &post.content,
        error: None,
        user: &user,
        site_name: &state.config.site_name,
    });
    Html(page.into_string()).into_response()
}

async fn update_post(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    RequireUser(user): RequireUser,
    Form(input): Form<PostInput>,
) -> Response {
    if let Err(response) = own_post(&state, id, user.id).await {
        return response;
    }
    let (title, content) = match validate_post_input(&input) {
        Ok(valid) => valid,
        Err(message) => {
            let page = render_post_form_page(&PostFormParams {
                post_id: Some(id),
                title: &input.title,
                content: &input.content,
                error: Some(message.as_str()),
                user: &user,
                site_name: &state.config.site_name,
            });
            return (StatusCode::UNPROCESSABLE_ENTITY, Html(page.into_string())).into_response();
        }
    };

    match db::update_post(state.db.pool(), id, title, content).await {
        Ok(()) => {
            info!(post_id = id, user_id = user.id, "Post updated");
            Redirect::to(&format!("/posts/{id}")).into_response()
        }
        Err(e) => db_error("Failed to update post", &e),
    }
}

async fn delete_post(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    RequireUser(user): RequireUser,
) -> Response {
    if let Err(response) = own_post(&state, id, user.id).await {
        return response;
    }
    match db::delete_post(state.db.pool(), id).await {
        Ok(_) => {
            let dropped = state.views.remove_post(id);
            info!(post_id = id, user_id = user.id, dropped_views = dropped, "Post deleted");
            Redirect::to("/").into_response()
        }
        Err(e) => db_error("Failed to delete post", &e),
    }
}

async fn diagram(State(state): State<AppState>, Path(id): Path<i64>) -> Response {
    let post = match db::get_post_with_author(state.db.pool(), id).await {
        Ok(Some(post)) => post,
        Ok(None) => return (StatusCode::NOT_FOUND, "Post not found").into_response(),
        Err(e) => return db_error("Failed to fetch post", &e),
    };
    let comments = match state.db.list_comments(id).await {
        Ok(comments) => comments,
        Err(e) => return comment_error(id, &e),
    };

    let body = generate_diagram(
        &DiagramPost {
            title: &post.title,
            author_name: &post.author_name,
        },
        &comments,
    );
    (
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        body,
    )
        .into_response()
}

// ========== Comments ==========

#[derive(Debug, Deserialize)]
pub struct CommentInput {
    #[serde(default)]
    content: String,
}

async fn post_comment(
    State(state): State<AppState>,
    Path(post_id): Path<i64>,
    headers: HeaderMap,
    user: MaybeUser,
    Form(input): Form<CommentInput>,
) -> Response {
    interact(&state, &headers, post_id, user.id(), None, |view| {
        view.set_draft(ComposeTarget::Post, input.content)
            .and_then(|()| view.submit(ComposeTarget::Post))
            .ok()
    })
    .await
}

async fn collapse_all(
    State(state): State<AppState>,
    Path(post_id): Path<i64>,
    headers: HeaderMap,
    user: MaybeUser,
) -> Response {
    interact(&state, &headers, post_id, user.id(), None, |view| {
        view.collapse_all();
        None
    })
    .await
}

async fn toggle_comment(
    State(state): State<AppState>,
    Path((post_id, comment_id)): Path<(i64, i64)>,
    headers: HeaderMap,
    user: MaybeUser,
) -> Response {
    interact(&state, &headers, post_id, user.id(), Some(comment_id), |view| {
        view.toggle(comment_id);
        None
    })
    .await
}

async fn start_reply(
    State(state): State<AppState>,
    Path((post_id, comment_id)): Path<(i64, i64)>,
    headers: HeaderMap,
    user: MaybeUser,
) -> Response {
    interact(&state, &headers, post_id, user.id(), Some(comment_id), |view| {
        let _ = view.start_reply(comment_id);
        None
    })
    .await
}

async fn cancel_reply(
    State(state): State<AppState>,
    Path((post_id, comment_id)): Path<(i64, i64)>,
    headers: HeaderMap,
    user: MaybeUser,
) -> Response {
    interact(&state, &headers, post_id, user.id(), Some(comment_id), |view| {
        let _ = view.cancel(ComposeTarget::Reply(comment_id));
        None
    })
    .await
}

async fn submit_reply(
    State(state): State<AppState>,
    Path((post_id, comment_id)): Path<(i64, i64)>,
    headers: HeaderMap,
    user: MaybeUser,
    Form(input): Form<CommentInput>,
) -> Response {
    let target = ComposeTarget::Reply(comment_id);
    interact(&state, &headers, post_id, user.id(), Some(comment_id), |view| {
        view.set_draft(target, input.content)
            .and_then(|()| view.submit(target))
            .ok()
    })
    .await
}

async fn start_edit(
    State(state): State<AppState>,
    Path((post_id, comment_id)): Path<(i64, i64)>,
    headers: HeaderMap,
    user: MaybeUser,
) -> Response {
    interact(&state, &headers, post_id, user.id(), Some(comment_id), |view| {
        let _ = view.start_edit(comment_id);
        None
    })
    .await
}

async fn cancel_edit(
    State(state): State<AppState>,
    Path((post_id, comment_id)): Path<(i64, i64)>,
    headers: HeaderMap,
    user: MaybeUser,
) -> Response {
    interact(&state, &headers, post_id, user.id(), Some(comment_id), |view| {
        let _ = view.cancel(ComposeTarget::Edit(comment_id));
        None
    })
    .await
}

async fn update_comment(
    State(state): State<AppState>,
    Path((post_id, comment_id)): Path<(i64, i64)>,
    headers: HeaderMap,
    user: MaybeUser,
    Form(input): Form<CommentInput>,
) -> Response {
    let target = ComposeTarget::Edit(comment_id);
    interact(&state, &headers, post_id, user.id(), Some(comment_id), |view| {
        view.set_draft(target, input.content)
            .and_then(|()| view.submit(target))
            .ok()
    })
    .await
}

async fn delete_comment(
    State(state): State<AppState>,
    Path((post_id, comment_id)): Path<(i64, i64)>,
    headers: HeaderMap,
    user: MaybeUser,
) -> Response {
    interact(&state, &headers, post_id, user.id(), None, |view| {
        view.request_delete(comment_id).ok()
    })
    .await
}

// ========== Users ==========

#[derive(Debug, Deserialize)]
pub struct ProfileParams {
    updated: Option<bool>,
}

async fn users_directory(State(state): State<AppState>, MaybeUser(user): MaybeUser) -> Response {
    let people = match db::list_users(state.db.pool()).await {
        Ok(people) => people,
        Err(e) => return db_error("Failed to list users", &e),
    };

    Html(render_users_page(&people, user.as_ref(), &state.config.site_name).into_string())
        .into_response()
}

async fn profile(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(params): Query<ProfileParams>,
    MaybeUser(user): MaybeUser,
) -> Response {
    let profile = match db::get_user_by_id(state.db.pool(), id).await {
        Ok(Some(profile)) => profile,
        Ok(None) => return (StatusCode::NOT_FOUND, "User not found").into_response(),
        Err(e) => return db_error("Failed to fetch user", &e),
    };
    let posts = match db::list_posts_by_author(state.db.pool(), id).await {
        Ok(posts) => posts,
        Err(e) => return db_error("Failed to list posts by author", &e),
    };

    let message = params.updated.unwrap_or(false).then_some("Display name updated");
    let page = render_profile_page(&ProfilePageParams {
        profile: &profile,
        posts: &posts,
        user: user.as_ref(),
        message,
        site_name: &state.config.site_name,
    });
    Html(page.into_string()).into_response()
}

#[derive(Debug, Deserialize)]
pub struct DisplayNameInput {
    #[serde(default)]
    display_name: String,
}

async fn update_display_name(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Form(input): Form<DisplayNameInput>,
) -> Response {
    let name = input.display_name.trim();
    if name.chars().count() > MAX_DISPLAY_NAME_CHARS {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            format!("Display name must be at most {MAX_DISPLAY_NAME_CHARS} characters"),
        )
            .into_response();
    }

    match db::update_user_display_name(state.db.pool(), user.id, name).await {
        Ok(()) => {
            info!(user_id = user.id, "Display name updated");
            Redirect::to(&format!("/users/{}?updated=true", user.id)).into_response()
        }
        Err(e) => db_error("Failed to update display name", &e),
    }
}

// ========== API Routes ==========

async fn api_comments(State(state): State<AppState>, Path(id): Path<i64>) -> Response {
    if let Err(response) = find_post(&state, id).await {
        return response;
    }
    match state.db.list_comments(id).await {
        Ok(comments) => Json(build_forest(&comments)).into_response(),
        Err(e) => comment_error(id, &e),
    }
}

async fn api_comment_count(State(state): State<AppState>, Path(id): Path<i64>) -> Response {
    if let Err(response) = find_post(&state, id).await {
        return response;
    }
    match state.db.count_comments(id).await {
        Ok(count) => Json(serde_json::json!({ "post_id": id, "count": count })).into_response(),
        Err(e) => comment_error(id, &e),
    }
}
