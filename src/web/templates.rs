use askama::Template;

/// Body of a redirect answered to `GET`/`HEAD` requests.
#[derive(Template)]
#[template(path = "redirect.html")]
pub struct RedirectTemplate<'a> {
    pub target: &'a str,
}
