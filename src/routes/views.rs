//! HTML rendering for the sign-in, sign-up and dashboard pages.
//!
//! Templates live in `templates/` and use `{{NAME}}` placeholders, filled in
//! a single pass. Every user-supplied value is escaped before substitution.

use crate::services::credentials::{Field, FieldError};
use crate::services::session::SessionUser;

const SIGN_IN_TEMPLATE: &str = include_str!("../../templates/sign_in.html");
const SIGN_UP_TEMPLATE: &str = include_str!("../../templates/sign_up.html");
const DASHBOARD_TEMPLATE: &str = include_str!("../../templates/dashboard.html");
pub const AUTH_CSS: &str = include_str!("../../templates/auth.css");

const GOOGLE_BUTTON: &str = r#"<a class="oauth" href="/auth/google">Sign in with Google</a>"#;

/// Previously entered values plus whatever went wrong with them.
/// The password is never echoed back.
#[derive(Debug, Default)]
pub struct FormView<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub field_errors: &'a [FieldError],
    pub form_error: Option<&'a str>,
}

impl FormView<'_> {
    fn field_error(&self, field: Field) -> String {
        self.field_errors
            .iter()
            .find(|e| e.field == field)
            .map(|e| format!(r#"<p class="field-error" data-field="{}">{}</p>"#, field.as_str(), escape_html(e.message)))
            .unwrap_or_default()
    }

    fn form_error(&self) -> String {
        self.form_error
            .map(|msg| format!(r#"<p class="form-error" role="alert">{}</p>"#, escape_html(msg)))
            .unwrap_or_default()
    }
}

#[must_use]
pub fn render_sign_in(form: &FormView<'_>, google_enabled: bool) -> String {
    let email = escape_html(form.email);
    let email_error = form.field_error(Field::Email);
    let password_error = form.field_error(Field::Password);
    let form_error = form.form_error();
    fill(
        SIGN_IN_TEMPLATE,
        &[
            ("EMAIL", email.as_str()),
            ("EMAIL_ERROR", email_error.as_str()),
            ("PASSWORD_ERROR", password_error.as_str()),
            ("FORM_ERROR", form_error.as_str()),
            ("GOOGLE_BUTTON", if google_enabled { GOOGLE_BUTTON } else { "" }),
        ],
    )
}

#[must_use]
pub fn render_sign_up(form: &FormView<'_>) -> String {
    let name = escape_html(form.name);
    let email = escape_html(form.email);
    let name_error = form.field_error(Field::Name);
    let email_error = form.field_error(Field::Email);
    let password_error = form.field_error(Field::Password);
    let form_error = form.form_error();
    fill(
        SIGN_UP_TEMPLATE,
        &[
            ("NAME", name.as_str()),
            ("EMAIL", email.as_str()),
            ("NAME_ERROR", name_error.as_str()),
            ("EMAIL_ERROR", email_error.as_str()),
            ("PASSWORD_ERROR", password_error.as_str()),
            ("FORM_ERROR", form_error.as_str()),
        ],
    )
}

#[must_use]
pub fn render_dashboard(user: &SessionUser) -> String {
    let name = escape_html(&user.name);
    let email = escape_html(&user.email);
    fill(DASHBOARD_TEMPLATE, &[("NAME", name.as_str()), ("EMAIL", email.as_str())])
}

/// Substitute `{{KEY}}` placeholders in one left-to-right pass. Inserted
/// values are never rescanned, so a value that itself looks like a
/// placeholder stays literal. Unknown placeholders are kept as-is.
fn fill(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find("}}") else {
            out.push_str(&rest[start..]);
            return out;
        };
        let key = &after[..end];
        match vars.iter().find(|(k, _)| *k == key) {
            Some((_, value)) => out.push_str(value),
            None => out.push_str(&rest[start..start + 2 + end + 2]),
        }
        rest = &after[end + 2..];
    }
    out.push_str(rest);
    out
}

#[must_use]
pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
