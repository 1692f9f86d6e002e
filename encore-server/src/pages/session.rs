use axum::{
    extract::{Query, State},
    response::{IntoResponse, Response},
    Form, Router,
};
use axum_extra::{
    extract::SignedCookieJar,
    routing::{RouterExt, TypedPath},
};
use encore_core::{
    app::PageTitle,
    error::EncoreResult,
    request_helper::{HtmlResponse, RedirectResponse},
    session::{Session, SessionMode, Unauthenticated},
    state::{EncoreRequestState, EncoreState},
};
use maud::{html, Markup};
use serde::Deserialize;

use crate::pages::{albums::PathAlbums, common::frontmatter, PathIndex};

pub fn session_pages(r: Router<EncoreState>) -> Router<EncoreState> {
    r.typed_get(new_session)
        .typed_post(post_new_session)
        .typed_post(post_destroy_session)
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/sessions/login")]
pub struct PathSessionsLogin {}

#[derive(Deserialize, Debug, Default)]
pub struct LoginQuery {
    next: Option<String>,
}

/// Only local paths, so the login form cannot be used to bounce users elsewhere.
///
/// Browsers read `\` like `/` and drop tabs and newlines from URLs, so
/// `/\host` or `/<tab>/host` would leave the site as well.
fn safe_next(next: Option<&str>) -> String {
    match next {
        Some(next)
            if next.starts_with('/')
                && !next.starts_with("//")
                && !next.chars().any(|c| c == '\\' || c.is_control()) =>
        {
            next.to_string()
        }
        _ => PathAlbums {}.to_uri().to_string(),
    }
}

fn login_form<T: SessionMode>(
    rstate: &EncoreRequestState<T>,
    next: &str,
    error: Option<&str>,
) -> Markup {
    let body = html! {
        h1 { "Sign in" }
        @if let Some(error) = error {
            p.flash.flash--error { (error) }
        }
        form action=(PathSessionsLogin {}.to_uri().to_string()) method="POST" {
            (frontmatter::csrf_input_tag(rstate))
            input type="hidden" name="next" value=(next);

            .field {
                input.input #user_username name="username" type="text" required="true" placeholder="Username" autofocus="true";
            }

            .field {
                input.input #user_password name="password" type="password" required="true" placeholder="Password";
            }

            .actions {
                button.button type="submit" { "Sign in" }
            }
        }
    };
    frontmatter::app(rstate, Some(PageTitle::from("Sign in")), body)
}

#[instrument(skip(rstate))]
pub async fn new_session(
    _: PathSessionsLogin,
    rstate: EncoreRequestState<Unauthenticated>,
    Query(query): Query<LoginQuery>,
) -> EncoreResult<HtmlResponse> {
    Ok(login_form(&rstate, &safe_next(query.next.as_deref()), None).into())
}

#[derive(Deserialize, securefmt::Debug)]
pub struct NewSession {
    username: String,
    #[sensitive]
    password: String,
    next: Option<String>,
}

#[instrument(skip(state, rstate, jar))]
pub async fn post_new_session(
    _: PathSessionsLogin,
    State(state): State<EncoreState>,
    rstate: EncoreRequestState<Unauthenticated>,
    jar: SignedCookieJar,
    Form(login_data): Form<NewSession>,
) -> EncoreResult<Response> {
    trace!("requesting new session, verifying user");
    let next = safe_next(login_data.next.as_deref());
    let user = state.store().user_by_name(&login_data.username).await?;
    let user = match user {
        Some(user) if user.verify_password(&login_data.password)? => Some(user),
        Some(_) => {
            debug!("password disagree");
            None
        }
        None => {
            debug!("user not found");
            None
        }
    };
    let user = match user {
        Some(user) => user,
        None => {
            let page = login_form(&rstate, &next, Some("User or password incorrect"));
            return Ok(HtmlResponse::from(page).into_response());
        }
    };
    debug!("Creating new session for {}", user.displayname());
    let jar = Session::login(jar, &state.config().session_cookie, &user);
    Ok((jar, RedirectResponse::to(&next)).into_response())
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/sessions/logout")]
pub struct PathSessionLogout {}

#[instrument(skip(state, jar))]
pub async fn post_destroy_session(
    _: PathSessionLogout,
    State(state): State<EncoreState>,
    jar: SignedCookieJar,
) -> EncoreResult<Response> {
    let jar = Session::logout(jar, &state.config().session_cookie);
    Ok((jar, RedirectResponse::to(&PathIndex {}.to_uri().to_string())).into_response())
}
