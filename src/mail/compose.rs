use base64::{
    engine::general_purpose::{STANDARD, URL_SAFE},
    Engine,
};

const LINE_WIDTH: usize = 76;

/// Builds a single-part `text/plain` message and encodes it for the Gmail
/// `messages.send` `raw` field.
///
/// ASCII bodies go out as 7bit; anything else is UTF-8 in base64.
pub fn encode_plain_message(from: &str, to: &str, subject: &str, body: &str) -> String {
    URL_SAFE.encode(render_plain_message(from, to, subject, body))
}

/// RFC 822 rendering with CRLF line endings.
pub fn render_plain_message(from: &str, to: &str, subject: &str, body: &str) -> String {
    let (charset, encoding, content) = if body.is_ascii() {
        ("us-ascii", "7bit", crlf(body))
    } else {
        ("utf-8", "base64", wrap(&STANDARD.encode(body)))
    };

    let mut message = String::new();
    message.push_str(&format!("Content-Type: text/plain; charset=\"{charset}\"\r\n"));
    message.push_str("MIME-Version: 1.0\r\n");
    message.push_str(&format!("Content-Transfer-Encoding: {encoding}\r\n"));
    message.push_str(&format!("to: {}\r\n", single_line(to)));
    message.push_str(&format!("from: {}\r\n", single_line(from)));
    message.push_str(&format!("subject: {}\r\n", single_line(subject)));
    message.push_str("\r\n");
    message.push_str(&content);
    message
}

fn single_line(value: &str) -> String {
    value.replace(['\r', '\n'], " ")
}

fn crlf(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\n', "\r\n")
}

fn wrap(encoded: &str) -> String {
    encoded
        .as_bytes()
        .chunks(LINE_WIDTH)
        .map(|chunk| String::from_utf8_lossy(chunk).into_owned())
        .collect::<Vec<_>>()
        .join("\r\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_summary_is_sent_as_7bit_text() {
        let rendered = render_plain_message("me", "grocer@example.com", "Grocery Budget Update", "Line one\nLine two\n");

        assert!(rendered.starts_with("Content-Type: text/plain; charset=\"us-ascii\"\r\n"));
        assert!(rendered.contains("to: grocer@example.com\r\n"));
        assert!(rendered.contains("subject: Grocery Budget Update\r\n\r\nLine one\r\nLine two\r\n"));
    }

    #[test]
    fn non_ascii_body_is_base64_encoded() {
        let rendered = render_plain_message("me", "a@example.com", "Budget", "Café total: $4.00");

        assert!(rendered.contains("charset=\"utf-8\""));
        assert!(rendered.contains("Content-Transfer-Encoding: base64"));
        assert!(!rendered.contains("Café"));
    }

    #[test]
    fn header_injection_is_flattened() {
        let rendered = render_plain_message("me", "a@example.com\r\nBcc: x@example.com", "s", "b");
        assert!(rendered.contains("to: a@example.com  Bcc: x@example.com\r\n"));
    }

    #[test]
    fn raw_field_decodes_back_to_the_message() {
        let raw = encode_plain_message("me", "a@example.com", "s", "body");
        let decoded = URL_SAFE.decode(raw).unwrap();
        assert_eq!(
            String::from_utf8(decoded).unwrap(),
            render_plain_message("me", "a@example.com", "s", "body")
        );
    }
}
