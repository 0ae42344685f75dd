//! HTML pages

use std::fmt::Write;

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};

/// Bytes that cannot appear raw in a single path segment
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Escape text for use in HTML element content and quoted attributes
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Absolute URL path of a document, escaped for an attribute value
fn document_href(name: &str) -> String {
    escape_html(&format!("/{}", utf8_percent_encode(name, PATH_SEGMENT)))
}

fn layout(title: &str, message: Option<&str>, body: &str) -> String {
    let message = message
        .map(|m| format!("<p class=\"message\">{}</p>\n", escape_html(m)))
        .unwrap_or_default();

    format!(
        "<!doctype html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{}</title>\n</head>\n<body>\n{}{}</body>\n</html>\n",
        escape_html(title),
        message,
        body
    )
}

/// Document listing with per-document actions
pub fn index(names: &[String], user: Option<&str>, message: Option<&str>) -> String {
    let mut body = String::from("<ul>\n");
    for name in names {
        let href = document_href(name);
        let name = escape_html(name);
        // Writing to a String cannot fail
        let _ = writeln!(
            body,
            "<li><a href=\"{href}\">{name}</a> <a href=\"{href}/edit\">edit</a>\
             <form method=\"post\" action=\"{href}/delete\" class=\"inline\">\
             <button type=\"submit\">delete</button></form></li>"
        );
    }
    body.push_str("</ul>\n<p><a href=\"/new\">New Document</a></p>\n");

    match user {
        Some(user) => {
            let _ = writeln!(
                body,
                "<form method=\"post\" action=\"/users/signout\">\
                 <p>Signed in as {}.</p><button type=\"submit\">Sign Out</button></form>",
                escape_html(user)
            );
        }
        None => body.push_str("<p><a href=\"/users/signin\">Sign In</a></p>\n"),
    }

    layout("Documents", message, &body)
}

pub fn sign_in(username: &str, message: Option<&str>) -> String {
    let body = format!(
        "<form method=\"post\" action=\"/users/signin\">\n\
         <label for=\"username\">Username</label>\n\
         <input name=\"username\" id=\"username\" value=\"{}\">\n\
         <label for=\"password\">Password</label>\n\
         <input name=\"password\" id=\"password\" type=\"password\">\n\
         <button type=\"submit\">Sign In</button>\n</form>\n",
        escape_html(username)
    );
    layout("Sign In", message, &body)
}

pub fn new_document(filename: &str, content: &str, message: Option<&str>) -> String {
    let body = format!(
        "<form method=\"post\" action=\"/create\">\n\
         <label for=\"filename\">Add a new document:</label>\n\
         <input name=\"filename\" id=\"filename\" value=\"{}\">\n\
         <label for=\"content\">Initial content (optional)</label>\n\
         <textarea name=\"content\" id=\"content\" rows=\"10\" cols=\"80\">{}</textarea>\n\
         <button type=\"submit\">Create</button>\n</form>\n",
        escape_html(filename),
        escape_html(content)
    );
    layout("New Document", message, &body)
}

pub fn edit_document(filename: &str, content: &str) -> String {
    let escaped = escape_html(filename);
    let href = document_href(filename);
    let body = format!(
        "<p>Edit content of {escaped}:</p>\n\
         <form method=\"post\" action=\"{href}\">\n\
         <textarea name=\"content\" rows=\"20\" cols=\"80\">{}</textarea>\n\
         <button type=\"submit\">Save Changes</button>\n</form>\n",
        escape_html(content)
    );
    layout(&format!("Edit {filename}"), None, &body)
}
