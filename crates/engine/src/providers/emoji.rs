use crate::traits::EmojiConverter;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static SHORTCODE: Lazy<Regex> = Lazy::new(|| Regex::new(r":([a-z0-9_+\-]+):").unwrap());

const TABLE: &[(&str, &str)] = &[
    ("smile", "😄"),
    ("laughing", "😆"),
    ("blush", "😊"),
    ("wink", "😉"),
    ("heart", "❤️"),
    ("broken_heart", "💔"),
    ("+1", "👍"),
    ("thumbsup", "👍"),
    ("-1", "👎"),
    ("thumbsdown", "👎"),
    ("clap", "👏"),
    ("pray", "🙏"),
    ("fire", "🔥"),
    ("tada", "🎉"),
    ("rocket", "🚀"),
    ("eyes", "👀"),
    ("thinking", "🤔"),
    ("cry", "😢"),
    ("joy", "😂"),
    ("sweat_smile", "😅"),
    ("sunglasses", "😎"),
    ("crab", "🦀"),
    ("coffee", "☕"),
    ("star", "⭐"),
    ("warning", "⚠️"),
];

/// `:shortcode:` to unicode; unknown shortcodes stay as written.
#[derive(Debug, Clone, Copy, Default)]
pub struct Shortcodes;

impl EmojiConverter for Shortcodes {
    fn convert(&self, text: &str) -> String {
        if !text.contains(':') {
            return text.to_string();
        }
        SHORTCODE
            .replace_all(text, |caps: &Captures| {
                TABLE
                    .iter()
                    .find(|(code, _)| *code == &caps[1])
                    .map(|(_, emoji)| emoji.to_string())
                    .unwrap_or_else(|| caps[0].to_string())
            })
            .into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_known_shortcodes_only() {
        assert_eq!(Shortcodes.convert("ship it :rocket: :+1:"), "ship it 🚀 👍");
        assert_eq!(Shortcodes.convert("time 10:30:00 :nope:"), "time 10:30:00 :nope:");
        assert_eq!(Shortcodes.convert("plain"), "plain");
    }
}
