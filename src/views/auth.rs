use super::{FieldErrors, escape, field_error};

pub fn signup_form(username: &str, email: &str, image_url: &str, errors: &FieldErrors) -> String {
    format!(
        r#"<div class="auth-form">
  <h2 class="join-message">Join Warbler today.</h2>
  <form method="POST" action="/signup" id="user_form">
    <input name="username" placeholder="Username" value="{username}">
    {username_error}
    <input name="email" type="email" placeholder="E-mail" value="{email}">
    {email_error}
    <input name="password" type="password" placeholder="Password">
    {password_error}
    <input name="image_url" placeholder="(Optional) Image URL" value="{image_url}">
    <button class="btn btn-primary btn-lg btn-block">Sign me up!</button>
  </form>
</div>"#,
        username = escape(username),
        email = escape(email),
        image_url = escape(image_url),
        username_error = field_error(errors, "username"),
        email_error = field_error(errors, "email"),
        password_error = field_error(errors, "password"),
    )
}

pub fn login_form(username: &str, errors: &FieldErrors) -> String {
    format!(
        r#"<div class="auth-form">
  <h2 class="join-message">Welcome back.</h2>
  <form method="POST" action="/login" id="user_form">
    <input name="username" placeholder="Username" value="{username}">
    {username_error}
    <input name="password" type="password" placeholder="Password">
    {password_error}
    <button class="btn btn-primary btn-block btn-lg">Log in</button>
  </form>
</div>"#,
        username = escape(username),
        username_error = field_error(errors, "username"),
        password_error = field_error(errors, "password"),
    )
}
