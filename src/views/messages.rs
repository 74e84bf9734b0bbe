use super::{FieldErrors, escape, field_error, format_date};
use crate::db::models::{MessageWithAuthor, User};

pub fn new_form(text: &str, errors: &FieldErrors) -> String {
    format!(
        r#"<div class="message-form">
  <form method="POST" action="/messages/new">
    <textarea name="text" placeholder="What's happening?" rows="3">{text}</textarea>
    {text_error}
    <button class="btn btn-outline-success btn-block">Add my message!</button>
  </form>
</div>"#,
        text = escape(text),
        text_error = field_error(errors, "text"),
    )
}

pub fn show(message: &MessageWithAuthor, viewer: Option<&User>) -> String {
    let delete_button = match viewer {
        Some(viewer) if viewer.id == message.user_id => format!(
            r#"<form method="POST" action="/messages/{}/delete"><button class="btn btn-outline-danger">Delete</button></form>"#,
            message.id
        ),
        _ => String::new(),
    };

    format!(
        r#"<div class="message-detail">
  <a href="/users/{user_id}"><img src="{image}" alt="" class="timeline-image"></a>
  <a href="/users/{user_id}">@{username}</a>
  <span class="text-muted">{date}</span>
  <p class="single-message">{text}</p>
  {delete_button}
</div>"#,
        user_id = message.user_id,
        image = escape(message.image_url()),
        username = escape(&message.username),
        date = format_date(message.created_at),
        text = escape(&message.text),
    )
}
