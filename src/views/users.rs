use std::collections::HashSet;

use super::{escape, message_list};
use crate::db::models::{MessageWithAuthor, User, UserStats};

pub fn anon_home() -> String {
    r#"<div class="home-hero">
  <h1>What's Happening?</h1>
  <h4>New to Warbler?</h4>
  <a href="/signup" class="btn btn-primary">Sign up now</a>
</div>"#
        .to_string()
}

pub fn home(
    user: &User,
    stats: UserStats,
    timeline: &[MessageWithAuthor],
    liked: &HashSet<i64>,
) -> String {
    format!(
        r#"<div class="row">
  <aside class="user-aside">
    <a href="/users/{id}"><img src="{image}" alt="" id="profile-avatar"></a>
    <p>@{username}</p>
    <ul class="user-stats">
      <li><a href="/users/{id}">Messages {messages}</a></li>
      <li><a href="/users/{id}/following">Following {following}</a></li>
      <li><a href="/users/{id}/followers">Followers {followers}</a></li>
    </ul>
  </aside>
  <div class="timeline">{feed}</div>
</div>"#,
        id = user.id,
        image = escape(user.image_url()),
        username = escape(&user.username),
        messages = stats.messages,
        following = stats.following,
        followers = stats.followers,
        feed = message_list(timeline, Some(user), liked),
    )
}

/// Follow or unfollow button, shown only to other logged-in users.
fn follow_button(user: &User, viewer: Option<&User>, viewer_follows: &HashSet<i64>) -> String {
    match viewer {
        Some(viewer) if viewer.id != user.id => {
            if viewer_follows.contains(&user.id) {
                format!(
                    r#"<form method="POST" action="/users/stop-following/{}"><button class="btn btn-primary btn-sm">Unfollow</button></form>"#,
                    user.id
                )
            } else {
                format!(
                    r#"<form method="POST" action="/users/follow/{}"><button class="btn btn-outline-primary btn-sm">Follow</button></form>"#,
                    user.id
                )
            }
        }
        _ => String::new(),
    }
}

pub fn user_cards(users: &[User], viewer: Option<&User>, viewer_follows: &HashSet<i64>) -> String {
    if users.is_empty() {
        return r#"<h3 class="empty">Sorry, no users found</h3>"#.to_string();
    }

    let cards: String = users
        .iter()
        .map(|user| {
            format!(
                r#"<div class="card user-card">
  <a href="/users/{id}"><img src="{image}" alt="Image for {username}" class="card-image"></a>
  <a href="/users/{id}" class="card-link"><p>@{username}</p></a>
  {follow}
  <p class="card-bio">{bio}</p>
</div>
"#,
                id = user.id,
                image = escape(user.image_url()),
                username = escape(&user.username),
                follow = follow_button(user, viewer, viewer_follows),
                bio = escape(user.bio.as_deref().unwrap_or_default()),
            )
        })
        .collect();

    format!(r#"<div class="user-cards">{cards}</div>"#)
}

pub fn index(users: &[User], viewer: Option<&User>, viewer_follows: &HashSet<i64>) -> String {
    user_cards(users, viewer, viewer_follows)
}

fn profile_header(
    user: &User,
    stats: UserStats,
    viewer: Option<&User>,
    viewer_follows: &HashSet<i64>,
) -> String {
    format!(
        r#"<div id="warbler-hero" style="background-image: url('{header}')"></div>
<img src="{image}" alt="Image for {username}" id="profile-avatar">
<div class="profile-header">
  <h4 id="sidebar-username">@{username}</h4>
  <p>{bio}</p>
  <p class="user-location">{location}</p>
  <ul class="user-stats">
    <li><a href="/users/{id}">Messages {messages}</a></li>
    <li><a href="/users/{id}/following">Following {following}</a></li>
    <li><a href="/users/{id}/followers">Followers {followers}</a></li>
    <li><a href="/users/{id}/likes">Likes {likes}</a></li>
  </ul>
  {follow}
</div>
"#,
        header = escape(user.header_image_url()),
        image = escape(user.image_url()),
        username = escape(&user.username),
        bio = escape(user.bio.as_deref().unwrap_or_default()),
        location = escape(user.location.as_deref().unwrap_or_default()),
        id = user.id,
        messages = stats.messages,
        following = stats.following,
        followers = stats.followers,
        likes = stats.likes,
        follow = follow_button(user, viewer, viewer_follows),
    )
}

pub fn profile(
    user: &User,
    stats: UserStats,
    messages: &[MessageWithAuthor],
    viewer: Option<&User>,
    viewer_follows: &HashSet<i64>,
    liked: &HashSet<i64>,
) -> String {
    format!(
        "{}{}",
        profile_header(user, stats, viewer, viewer_follows),
        message_list(messages, viewer, liked),
    )
}

/// Profile header over a grid of users (following or followers).
pub fn relations(
    user: &User,
    stats: UserStats,
    listed: &[User],
    viewer: Option<&User>,
    viewer_follows: &HashSet<i64>,
) -> String {
    format!(
        "{}{}",
        profile_header(user, stats, viewer, viewer_follows),
        user_cards(listed, viewer, viewer_follows),
    )
}
