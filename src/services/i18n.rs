//! Request locale and the handful of server-side strings that get localized
//! (push notification bodies for media messages).

/// Supported locales
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Locale {
    #[default]
    En,
    Ko,
}

/// Translatable strings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKey {
    Photo,
    File,
}

impl Locale {
    /// Parse a single language tag such as `ko`, `ko-KR` or `en_US`
    pub fn parse(tag: &str) -> Option<Self> {
        let primary = tag
            .trim()
            .split(['-', '_'])
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();

        match primary.as_str() {
            "en" => Some(Locale::En),
            "ko" => Some(Locale::Ko),
            _ => None,
        }
    }

    /// Pick the first supported language from an `Accept-Language` header,
    /// honoring q-values
    pub fn from_accept_language(header: &str) -> Option<Self> {
        let mut candidates: Vec<(f32, &str)> = header
            .split(',')
            .filter_map(|part| {
                let mut pieces = part.split(';');
                let tag = pieces.next()?.trim();
                if tag.is_empty() {
                    return None;
                }
                let quality = pieces
                    .find_map(|p| p.trim().strip_prefix("q="))
                    .and_then(|q| q.parse::<f32>().ok())
                    .unwrap_or(1.0);
                Some((quality, tag))
            })
            .collect();

        // stable sort keeps header order among equal weights
        candidates.sort_by(|a, b| b.0.total_cmp(&a.0));

        candidates
            .into_iter()
            .filter(|(q, _)| *q > 0.0)
            .find_map(|(_, tag)| Locale::parse(tag))
    }

    pub fn translate(self, key: MessageKey) -> &'static str {
        match (self, key) {
            (Locale::En, MessageKey::Photo) => "Sent a photo",
            (Locale::En, MessageKey::File) => "Sent a file",
            (Locale::Ko, MessageKey::Photo) => "사진을 보냈습니다",
            (Locale::Ko, MessageKey::File) => "파일을 보냈습니다",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tags() {
        assert_eq!(Locale::parse("ko-KR"), Some(Locale::Ko));
        assert_eq!(Locale::parse("en_US"), Some(Locale::En));
        assert_eq!(Locale::parse("fr"), None);
    }

    #[test]
    fn test_accept_language_respects_quality() {
        assert_eq!(
            Locale::from_accept_language("fr-FR, en;q=0.5, ko;q=0.8"),
            Some(Locale::Ko)
        );
        assert_eq!(Locale::from_accept_language("en-US,en;q=0.9"), Some(Locale::En));
        assert_eq!(Locale::from_accept_language("ko;q=0, de"), None);
        assert_eq!(Locale::from_accept_language(""), None);
    }

    #[test]
    fn test_translate_media_placeholders() {
        assert_eq!(Locale::En.translate(MessageKey::Photo), "Sent a photo");
        assert_eq!(Locale::Ko.translate(MessageKey::File), "파일을 보냈습니다");
    }
}
