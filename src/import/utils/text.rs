use encoding_rs::Encoding;

use crate::error::DecodeError;

pub fn encoding_for_label(label: &str) -> Result<&'static Encoding, DecodeError> {
    Encoding::for_label(label.trim().as_bytes())
        .ok_or_else(|| DecodeError::UnknownEncoding(label.to_string()))
}

/// Decodes raw bytes with the given encoding, dropping a leading byte order mark.
/// A byte sequence that is invalid in the encoding fails the whole decoding.
pub fn decode_text(input: &[u8], encoding: &'static Encoding) -> Result<String, DecodeError> {
    let (content, used_encoding, had_errors) = encoding.decode(input);
    if had_errors {
        let line = content
            .find(char::REPLACEMENT_CHARACTER)
            .map(|index| content[..index].matches('\n').count() + 1)
            .unwrap_or_default();
        return Err(DecodeError::InvalidEncoding {
            encoding: used_encoding.name(),
            line,
        });
    }
    Ok(maybe_remove_byte_order_mark(content.into_owned()))
}

fn maybe_remove_byte_order_mark(mut content: String) -> String {
    if content.starts_with('\u{FEFF}') {
        content.remove(0);
    }
    content
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utf8_with_bom() {
        let encoding = encoding_for_label("utf-8").unwrap();
        assert_eq!("Vente", decode_text(b"\xEF\xBB\xBFVente", encoding).unwrap());
    }

    #[test]
    fn latin9() {
        let encoding = encoding_for_label("iso-8859-15").unwrap();
        assert_eq!(
            "Salaire brut \u{e9}t\u{e9} \u{20ac}",
            decode_text(b"Salaire brut \xE9t\xE9 \xA4", encoding).unwrap()
        );
    }

    #[test]
    fn invalid_bytes_are_rejected() {
        let encoding = encoding_for_label("utf-8").unwrap();
        let err = decode_text(b"Vente\nVente \xE9t\xE9", encoding).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::InvalidEncoding { encoding: "UTF-8", line: 2 }
        ));
        assert_eq!("Line 2: byte sequence invalid in UTF-8", err.to_string());
    }

    #[test]
    fn unknown_label() {
        assert!(matches!(
            encoding_for_label("klingon"),
            Err(DecodeError::UnknownEncoding(label)) if label == "klingon"
        ));
    }
}
