//! HTML rendering. Every function returns a complete fragment or page as a
//! `String`; user supplied text always goes through [`escape`].

pub mod auth;
pub mod messages;
pub mod users;

use std::collections::HashSet;
use std::fmt::Write;

use crate::api::session::Flash;
use crate::db::models::{MessageWithAuthor, User};

pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

/// Field name and message pairs for a rejected form.
pub type FieldErrors = Vec<(&'static str, &'static str)>;

pub fn field_error(errors: &FieldErrors, field: &str) -> String {
    errors
        .iter()
        .filter(|(name, _)| *name == field)
        .map(|(_, message)| format!(r#"<span class="text-danger">{}</span>"#, escape(message)))
        .collect()
}

pub fn format_date(timestamp: i64) -> String {
    chrono::DateTime::from_timestamp(timestamp, 0)
        .map(|dt| dt.format("%d %B %Y").to_string())
        .unwrap_or_default()
}

/// Wraps a page body with the navbar and any pending flash messages.
pub fn layout(title: &str, current_user: Option<&User>, flashes: &[Flash], body: &str) -> String {
    let mut html = String::new();
    let _ = write!(
        html,
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>{title} | Warbler</title>
  <link rel="stylesheet" href="/static/stylesheets/style.css">
</head>
<body>
<nav class="navbar">
  <a href="/" class="navbar-brand">Warbler</a>
  <form action="/users" class="navbar-form"><input name="q" placeholder="Search Warbler"></form>
  <ul class="nav">
"#,
        title = escape(title),
    );

    match current_user {
        Some(user) => {
            let _ = write!(
                html,
                r#"    <li><a href="/users/{id}"><img src="{image}" alt="{name}">@{name}</a></li>
    <li><a href="/messages/new">New Message</a></li>
    <li><a href="/logout">Log out</a></li>
"#,
                id = user.id,
                image = escape(user.image_url()),
                name = escape(&user.username),
            );
        }
        None => {
            html.push_str(
                r#"    <li><a href="/signup">Sign up</a></li>
    <li><a href="/login">Log in</a></li>
"#,
            );
        }
    }

    html.push_str("  </ul>\n</nav>\n<div class=\"container\">\n");
    for flash in flashes {
        let _ = writeln!(
            html,
            r#"<div class="alert alert-{}">{}</div>"#,
            escape(&flash.category),
            escape(&flash.message),
        );
    }
    html.push_str(body);
    html.push_str("\n</div>\n</body>\n</html>\n");
    html
}

pub fn error_page(code: &str, detail: &str) -> String {
    layout(
        code,
        None,
        &[],
        &format!(
            r#"<div class="error"><h1>{}</h1><p>{}</p><a href="/">Go home</a></div>"#,
            escape(code),
            escape(detail),
        ),
    )
}

/// One entry of a message feed. `viewer` decides whether the like button shows.
pub fn message_item(
    message: &MessageWithAuthor,
    viewer: Option<&User>,
    liked: &HashSet<i64>,
) -> String {
    let like_button = match viewer {
        Some(viewer) if viewer.id != message.user_id => {
            let (class, label) = if liked.contains(&message.id) {
                ("btn-primary", "Unlike")
            } else {
                ("btn-secondary", "Like")
            };
            format!(
                r#"<form method="POST" action="/users/add_like/{id}" class="messages-like"><button class="btn btn-sm {class}">{label}</button></form>"#,
                id = message.id,
            )
        }
        _ => String::new(),
    };

    format!(
        r#"<li class="list-group-item">
  <a href="/messages/{id}" class="message-link"></a>
  <a href="/users/{user_id}"><img src="{image}" alt="" class="timeline-image"></a>
  <div class="message-area">
    <a href="/users/{user_id}">@{username}</a>
    <span class="text-muted">{date}</span>
    <p>{text}</p>
  </div>
  {like_button}
</li>
"#,
        id = message.id,
        user_id = message.user_id,
        image = escape(message.image_url()),
        username = escape(&message.username),
        date = format_date(message.created_at),
        text = escape(&message.text),
    )
}

pub fn message_list(
    messages: &[MessageWithAuthor],
    viewer: Option<&User>,
    liked: &HashSet<i64>,
) -> String {
    if messages.is_empty() {
        return r#"<p class="empty">No messages yet.</p>"#.to_string();
    }

    let items: String = messages
        .iter()
        .map(|m| message_item(m, viewer, liked))
        .collect();
    format!(r#"<ul class="list-group" id="messages">{items}</ul>"#)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(text: &str) -> MessageWithAuthor {
        MessageWithAuthor {
            id: 1,
            user_id: 2,
            text: text.to_string(),
            created_at: 0,
            username: "bob".to_string(),
            image_url: None,
        }
    }

    #[test]
    fn test_escape() {
        assert_eq!(
            escape(r#"<script>alert("x & 'y'")</script>"#),
            "&lt;script&gt;alert(&quot;x &amp; &#x27;y&#x27;&quot;)&lt;/script&gt;"
        );
        assert_eq!(escape("plain"), "plain");
    }

    #[test]
    fn test_format_date() {
        assert_eq!(format_date(0), "01 January 1970");
    }

    #[test]
    fn test_layout_renders_flashes_escaped() {
        let html = layout("Home", None, &[Flash::danger("<b>no</b>")], "<p>body</p>");
        assert!(html.contains(r#"<div class="alert alert-danger">&lt;b&gt;no&lt;/b&gt;</div>"#));
        assert!(html.contains("<p>body</p>"));
        assert!(html.contains("Sign up"));
    }

    #[test]
    fn test_message_item_escapes_text() {
        let html = message_item(&message("<i>hi</i>"), None, &HashSet::new());
        assert!(html.contains("&lt;i&gt;hi&lt;/i&gt;"));
        assert!(!html.contains("add_like"));
    }

    #[test]
    fn test_empty_message_list() {
        assert!(message_list(&[], None, &HashSet::new()).contains("No messages yet."));
    }
}
