/// Sanitizes user-supplied markup before it is stored.
///
/// Whitelist-based: safe tags like <b> or <p> survive, <script>, <iframe> and
/// event-handler attributes are stripped. Surrounding whitespace is trimmed so
/// that a body made only of blanks or stripped tags ends up empty.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input).trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_scripts_and_keeps_text() {
        assert_eq!(clean_html("hi<script>alert(1)</script>"), "hi");
        assert_eq!(clean_html("  <b>bold</b> "), "<b>bold</b>");
        assert_eq!(clean_html("<script>x</script>"), "");
    }
}
