//! Dashboard page rendering
//!
//! Either half of the page can be degraded independently: a failed host-info
//! read replaces the summary with the error, a failed capture replaces the
//! screenshots. The page itself always renders.

use crate::capture::ScreenshotSet;
use crate::control::handler::ACTION_PATH;
use crate::error::AgentError;
use crate::host::ClientInfo;
use std::fmt::Write;

const STYLE: &str = "body{font-family:sans-serif;margin:1.5em;background:#f4f4f4}\
pre{background:#fff;padding:1em;border-radius:4px}\
.degraded{color:#a33}\
.actions form{display:inline-block;margin-right:.5em}\
.screens img{max-width:100%;display:block;margin:1em 0;border:1px solid #ccc}";

/// Render the full dashboard page
pub fn render(
    info: Result<&ClientInfo, &AgentError>,
    screenshots: Result<&ScreenshotSet, &AgentError>,
) -> String {
    let title = match info {
        Ok(info) => format!("Remote management - {}", escape_html(&info.hostname)),
        Err(_) => "Remote management".to_string(),
    };

    let mut page = String::with_capacity(4096);
    let _ = write!(
        page,
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
         <title>{}</title>\n<style>{}</style>\n</head>\n<body>\n<h1>{}</h1>\n",
        title, STYLE, title
    );

    match info {
        Ok(info) => {
            let _ = writeln!(
                page,
                "<section class=\"info\"><pre>{}</pre></section>",
                escape_html(&info.summary())
            );
        }
        Err(e) => {
            let _ = writeln!(
                page,
                "<section class=\"info degraded\"><p>{}</p></section>",
                escape_html(&e.to_string())
            );
        }
    }

    let _ = writeln!(
        page,
        "<section class=\"actions\">\
         <form method=\"post\" action=\"{path}\"><input type=\"hidden\" name=\"t\" value=\"0\"><button type=\"submit\">Reboot</button></form>\
         <form method=\"post\" action=\"{path}\"><input type=\"hidden\" name=\"t\" value=\"1\"><button type=\"submit\">Shut down</button></form>\
         </section>",
        path = ACTION_PATH
    );

    page.push_str("<section class=\"screens\">\n");
    match screenshots {
        Ok(set) if set.is_empty() => {
            page.push_str("<p>No active displays</p>\n");
        }
        Ok(set) => {
            for (index, encoded) in set.iter().enumerate() {
                let _ = writeln!(
                    page,
                    "<img src=\"data:image/png;base64,{}\" alt=\"Display {}\">",
                    encoded,
                    index + 1
                );
            }
        }
        Err(e) => {
            let _ = writeln!(
                page,
                "<p class=\"degraded\">Screenshots unavailable: {}</p>",
                escape_html(&e.to_string())
            );
        }
    }
    page.push_str("</section>\n</body>\n</html>\n");

    page
}

/// Escape text for inclusion in HTML content or attribute values
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
