use axum_extra::routing::TypedPath;
use encore_core::{app::PageTitle, session::SessionMode, state::EncoreRequestState};
use maud::{html, Markup, DOCTYPE};

use crate::pages::{
    albums::PathAlbums,
    session::{PathSessionLogout, PathSessionsLogin},
    PathIndex,
};

const FONT_AWESOME: &str =
    "https://cdnjs.cloudflare.com/ajax/libs/font-awesome/6.4.2/css/all.min.css";

pub fn csrf_meta_tag<T: SessionMode>(rstate: &EncoreRequestState<T>) -> Markup {
    let csrf = rstate.csrf_token().authenticity_token();
    html! {
        meta content=(csrf) csrf-param="_csrf_token" name="csrf-token";
    }
}

pub fn csrf_input_tag<T: SessionMode>(rstate: &EncoreRequestState<T>) -> Markup {
    let csrf = rstate.csrf_token().authenticity_token();
    html! {
        input type="hidden" name="_csrf_token" value=(csrf);
    }
}

pub fn header<T: SessionMode>(rstate: &EncoreRequestState<T>) -> Markup {
    html! {
        header.header {
            a.header__title href=(PathIndex {}.to_uri().to_string()) { "Encore" }
            nav.header__nav {
                @if let Some(user) = rstate.current_user() {
                    a href=(PathAlbums {}.to_uri().to_string()) { "Albums" }
                    span.header__user { (user.displayname()) }
                    form.header__logout action=(PathSessionLogout {}.to_uri().to_string()) method="POST" {
                        (csrf_input_tag(rstate))
                        button.button type="submit" { "Sign out" }
                    }
                } @else {
                    a href=(PathSessionsLogin {}.to_uri().to_string()) { "Sign in" }
                }
            }
        }
    }
}

/// The page frame every HTML page is rendered into
pub fn app<T: SessionMode>(
    rstate: &EncoreRequestState<T>,
    title: Option<PageTitle>,
    body: Markup,
) -> Markup {
    let title = match title {
        Some(title) => format!("{} - Encore", title.as_str()),
        None => "Encore".to_string(),
    };
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { (title) }
                (csrf_meta_tag(rstate))
                link rel="stylesheet" href=(FONT_AWESOME);
            }
            body {
                (header(rstate))
                main.layout {
                    (body)
                }
            }
        }
    }
}
