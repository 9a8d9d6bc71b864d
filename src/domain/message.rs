use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Span {
    Text { value: String },
    Link { url: String },
    Mention { nick: String, url: Option<String> },
}

impl Span {
    pub fn text(value: impl Into<String>) -> Self {
        Span::Text { value: value.into() }
    }

    pub fn link(url: impl Into<String>) -> Self {
        Span::Link { url: url.into() }
    }
}

/// Render-ready form of one message body. Derived on demand, never stored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormattedMessage {
    pub spans: Vec<Span>,
    /// Image links, in order of appearance, for a trailing gallery.
    pub images: Vec<String>,
}

impl FormattedMessage {
    pub fn links(&self) -> impl Iterator<Item = &str> {
        self.spans.iter().filter_map(|span| match span {
            Span::Link { url } => Some(url.as_str()),
            _ => None,
        })
    }

    pub fn mentions(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.spans.iter().filter_map(|span| match span {
            Span::Mention { nick, url } => Some((nick.as_str(), url.as_deref())),
            _ => None,
        })
    }
}
