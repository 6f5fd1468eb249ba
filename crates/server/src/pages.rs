//! Server-rendered HTML for the gallery and detail pages.

use crate::flash::Flash;
use galleria_core::{GalleryEntry, ImageDetail};
use std::fmt::Write;

const STYLES: &str = r#"
body { font-family: system-ui, sans-serif; margin: 2rem auto; max-width: 960px; color: #222; }
h1 { margin-bottom: 1rem; }
.flash { padding: .6rem 1rem; margin-bottom: .5rem; border-radius: 4px; }
.flash.info { background: #e6f4ea; }
.flash.warning { background: #fff4e5; }
.flash.error { background: #fdecea; }
.upload { margin: 1.5rem 0; }
.gallery { display: grid; grid-template-columns: repeat(auto-fill, minmax(200px, 1fr)); gap: 1rem; }
.tile { border: 1px solid #ddd; border-radius: 6px; overflow: hidden; text-decoration: none; color: inherit; }
.tile img { width: 100%; height: 180px; object-fit: cover; display: block; }
.tile span { display: block; padding: .5rem; font-weight: 600; }
.detail img { max-width: 100%; }
.empty { color: #777; }
"#;

pub fn escape_html(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Percent-encode a blob key for use as a single path segment
pub fn encode_segment(key: &str) -> String {
    urlencoding::encode(key).into_owned()
}

fn layout(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
         <title>{}</title>\n<style>{}</style>\n</head>\n<body>\n{}</body>\n</html>\n",
        escape_html(title),
        STYLES,
        body
    )
}

pub fn render_gallery(entries: &[GalleryEntry], messages: &[Flash]) -> String {
    let mut body = String::from("<h1>Photo Gallery</h1>\n");

    for message in messages {
        let _ = writeln!(
            body,
            "<div class=\"flash {}\">{}</div>",
            message.level.as_str(),
            escape_html(&message.text)
        );
    }

    body.push_str(
        "<form class=\"upload\" action=\"/upload\" method=\"post\" enctype=\"multipart/form-data\">\n\
         <input type=\"file\" name=\"file\" accept=\".png,.jpg,.jpeg,.gif\">\n\
         <button type=\"submit\">Upload</button>\n</form>\n",
    );

    if entries.is_empty() {
        body.push_str("<p class=\"empty\">No images yet.</p>\n");
    } else {
        body.push_str("<div class=\"gallery\">\n");
        for entry in entries {
            let segment = encode_segment(&entry.filename);
            let _ = writeln!(
                body,
                "<a class=\"tile\" href=\"/view/{segment}\" title=\"{description}\">\
                 <img src=\"/image/{segment}\" alt=\"{title}\" loading=\"lazy\"><span>{title}</span></a>",
                segment = segment,
                title = escape_html(&entry.title),
                description = escape_html(&entry.description),
            );
        }
        body.push_str("</div>\n");
    }

    layout("Photo Gallery", &body)
}

pub fn render_detail(detail: &ImageDetail) -> String {
    let segment = encode_segment(&detail.filename);
    let body = format!(
        "<p><a href=\"/\">&larr; Back to gallery</a></p>\n\
         <div class=\"detail\">\n<h1>{title}</h1>\n\
         <img src=\"/image/{segment}\" alt=\"{title}\">\n\
         <p>{description}</p>\n\
         <p><a href=\"/image/{segment}\" download=\"{filename}\">Download {filename}</a> \
         &middot; <a href=\"/api/description/{segment}\">JSON</a></p>\n</div>\n",
        title = escape_html(&detail.title),
        description = escape_html(&detail.description),
        filename = escape_html(&detail.filename),
        segment = segment,
    );

    layout(&detail.title, &body)
}
