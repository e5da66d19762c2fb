use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

static TOKEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[@#]\w+").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentKind {
    Text,
    Mention,
    Hashtag,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Segment {
    pub kind: SegmentKind,
    pub text: String,
}

impl Segment {
    fn new(kind: SegmentKind, text: &str) -> Self {
        Self { kind, text: text.to_owned() }
    }
}

fn is_word(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Splits post content into plain runs and `@mention` / `#hashtag` tokens.
/// Joining the segment texts gives back the input unchanged.
pub fn highlight(content: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut last = 0;

    for token in TOKEN.find_iter(content) {
        // `bob@example.com` and `C#` are not tags
        if content[..token.start()].chars().next_back().is_some_and(is_word) {
            continue;
        }

        if token.start() > last {
            segments.push(Segment::new(SegmentKind::Text, &content[last..token.start()]));
        }

        let kind = if token.as_str().starts_with('@') {
            SegmentKind::Mention
        } else {
            SegmentKind::Hashtag
        };
        segments.push(Segment::new(kind, token.as_str()));
        last = token.end();
    }

    if last < content.len() {
        segments.push(Segment::new(SegmentKind::Text, &content[last..]));
    }

    segments
}
