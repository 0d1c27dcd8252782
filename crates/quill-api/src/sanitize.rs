/// Escape user-supplied text before it is persisted. Applied to post
/// titles/content, comment text, message text, bios, report reasons, search
/// queries, and every notification body.
pub fn sanitize(raw: &str) -> String {
    html_escape::encode_safe(raw).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_markup() {
        assert_eq!(
            sanitize("<script>alert(1)</script>"),
            "&lt;script&gt;alert(1)&lt;/script&gt;"
        );
    }

    #[test]
    fn plain_text_unchanged() {
        assert_eq!(sanitize("hello world"), "hello world");
    }
}
