const BEARER_PREFIX: &str = "bearer ";

pub(crate) trait StripPrefixIgnoreAsciiCase {
    fn strip_prefix_ignore_ascii_case<'a>(&'a self, prefix: &str) -> Option<&'a str>;
}

impl StripPrefixIgnoreAsciiCase for str {
    fn strip_prefix_ignore_ascii_case<'a>(&'a self, prefix: &str) -> Option<&'a str> {
        // `get` rather than indexing: the header may hold multi-byte characters.
        let my_prefix = self.get(..prefix.len())?;

        if my_prefix.eq_ignore_ascii_case(prefix) {
            Some(&self[prefix.len()..])
        } else {
            None
        }
    }
}

/// Pull the token out of an `Authorization: Bearer <token>` header value.
pub(crate) fn bearer_token(header: Option<&str>) -> Option<&str> {
    header?.strip_prefix_ignore_ascii_case(BEARER_PREFIX)
}
