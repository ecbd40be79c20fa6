//! Canonical emoji identity.
//!
//! Reaction events and bind-time administrator input must agree on one
//! string key per emoji. Unicode emoji are keyed by their glyph; custom
//! emoji by the `<a:name:id>` / `<:name:id>` mention form. Administrator
//! input is normalized through [`EmojiRef::parse`] at bind time so both
//! sides derive the key the same way.

/// An emoji as seen on the wire: either a unicode glyph or a guild
/// custom emoji.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmojiRef {
    pub custom: bool,
    pub animated: bool,
    pub name: String,
    pub id: Option<u64>,
}

impl EmojiRef {
    pub fn unicode(glyph: impl Into<String>) -> Self {
        Self {
            custom: false,
            animated: false,
            name: glyph.into(),
            id: None,
        }
    }

    pub fn custom(name: impl Into<String>, id: u64, animated: bool) -> Self {
        Self {
            custom: true,
            animated,
            name: name.into(),
            id: Some(id),
        }
    }

    /// Parse administrator-typed emoji text.
    ///
    /// Recognizes the custom-emoji mention forms `<:name:id>` and
    /// `<a:name:id>`; anything else is treated as a unicode glyph and
    /// kept verbatim (minus surrounding whitespace).
    pub fn parse(text: &str) -> Self {
        let text = text.trim();
        if let Some(inner) = text.strip_prefix('<').and_then(|s| s.strip_suffix('>')) {
            let (animated, rest) = match inner.strip_prefix("a:") {
                Some(rest) => (true, Some(rest)),
                None => (false, inner.strip_prefix(':')),
            };
            if let Some(rest) = rest {
                if let Some((name, id_str)) = rest.rsplit_once(':') {
                    if let Ok(id) = id_str.parse::<u64>() {
                        if !name.is_empty() {
                            return Self::custom(name, id, animated);
                        }
                    }
                }
            }
        }
        Self::unicode(text)
    }

    /// The stable string key used for table lookups and persistence.
    pub fn canonical_key(&self) -> String {
        match self.id {
            Some(id) if self.custom => {
                let prefix = if self.animated { "a" } else { "" };
                format!("<{prefix}:{}:{id}>", self.name)
            }
            _ => self.name.clone(),
        }
    }
}

impl std::fmt::Display for EmojiRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.canonical_key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unicode_glyph_is_its_own_key() {
        let e = EmojiRef::parse("🎮");
        assert!(!e.custom);
        assert_eq!(e.canonical_key(), "🎮");
    }

    #[test]
    fn test_unicode_trims_whitespace() {
        assert_eq!(EmojiRef::parse("  🎨 ").canonical_key(), "🎨");
    }

    #[test]
    fn test_custom_mention_form() {
        let e = EmojiRef::parse("<:wave:123456789>");
        assert!(e.custom);
        assert!(!e.animated);
        assert_eq!(e.name, "wave");
        assert_eq!(e.id, Some(123456789));
        assert_eq!(e.canonical_key(), "<:wave:123456789>");
    }

    #[test]
    fn test_animated_custom_mention_form() {
        let e = EmojiRef::parse("<a:party:42>");
        assert!(e.animated);
        assert_eq!(e.canonical_key(), "<a:party:42>");
    }

    #[test]
    fn test_event_and_bind_keys_agree() {
        // The key derived from a reaction event payload must equal the
        // key derived from the typed mention at bind time.
        let typed = EmojiRef::parse("<a:blob:999>");
        let event = EmojiRef::custom("blob", 999, true);
        assert_eq!(typed.canonical_key(), event.canonical_key());
    }

    #[test]
    fn test_malformed_custom_falls_back_to_unicode() {
        for bad in ["<:noid:>", "<::123>", "<:wave:notanumber>", "<wave>"] {
            let e = EmojiRef::parse(bad);
            assert!(!e.custom, "{bad} should not parse as custom");
            assert_eq!(e.canonical_key(), bad);
        }
    }
}
