use html_escape::{encode_double_quoted_attribute, encode_text};

use crate::domain::{FormattedMessage, Span};

fn is_web_url(url: &str) -> bool {
    let lower = url.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

impl FormattedMessage {
    /// Render as an HTML fragment: one paragraph followed by an image
    /// gallery. All text and attribute values are escaped, and only
    /// http(s) URLs become `href`/`src` targets.
    pub fn to_html(&self) -> String {
        let mut html = String::from("<p>");

        for span in &self.spans {
            match span {
                Span::Text { value } => {
                    html.push_str(&encode_text(value).replace('\n', "<br>"));
                }
                Span::Link { url } if is_web_url(url) => {
                    html.push_str(&format!(
                        "<a href=\"{}\">{}</a>",
                        encode_double_quoted_attribute(url),
                        encode_text(url)
                    ));
                }
                Span::Link { url } => html.push_str(&encode_text(url)),
                Span::Mention {
                    nick,
                    url: Some(url),
                } if is_web_url(url) => {
                    html.push_str(&format!(
                        "<a class=\"mention\" href=\"{}\">@{}</a>",
                        encode_double_quoted_attribute(url),
                        encode_text(nick)
                    ));
                }
                Span::Mention { nick, .. } => {
                    html.push_str(&format!(
                        "<span class=\"mention\">@{}</span>",
                        encode_text(nick)
                    ));
                }
            }
        }

        html.push_str("</p>");

        let images: Vec<&String> = self.images.iter().filter(|url| is_web_url(url)).collect();
        if !images.is_empty() {
            html.push_str("<div class=\"gallery\">");
            for url in images {
                html.push_str(&format!(
                    "<img src=\"{}\" alt=\"\">",
                    encode_double_quoted_attribute(url)
                ));
            }
            html.push_str("</div>");
        }

        html
    }

    /// Render as plain text, mentions shown as `@nick`.
    pub fn to_plain_text(&self) -> String {
        let mut out = String::new();
        for span in &self.spans {
            match span {
                Span::Text { value } => out.push_str(value),
                Span::Link { url } => out.push_str(url),
                Span::Mention { nick, .. } => {
                    out.push('@');
                    out.push_str(nick);
                }
            }
        }
        out
    }
}
