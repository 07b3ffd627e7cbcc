//! The XML `Name` production and qualified-name validation.
//!
//! <https://www.w3.org/TR/xml/#NT-Name>

use crate::error::DomError;
use crate::namespace::{XML_NAMESPACE, XMLNS_NAMESPACE};

/// `NameStartChar` from XML 1.0 (fifth edition).
pub fn is_name_start_char(c: char) -> bool {
    matches!(c,
        ':' | 'A'..='Z' | '_' | 'a'..='z'
        | '\u{C0}'..='\u{D6}'
        | '\u{D8}'..='\u{F6}'
        | '\u{F8}'..='\u{2FF}'
        | '\u{370}'..='\u{37D}'
        | '\u{37F}'..='\u{1FFF}'
        | '\u{200C}'..='\u{200D}'
        | '\u{2070}'..='\u{218F}'
        | '\u{2C00}'..='\u{2FEF}'
        | '\u{3001}'..='\u{D7FF}'
        | '\u{F900}'..='\u{FDCF}'
        | '\u{FDF0}'..='\u{FFFD}'
        | '\u{10000}'..='\u{EFFFF}')
}

/// `NameChar` from XML 1.0 (fifth edition).
pub fn is_name_char(c: char) -> bool {
    is_name_start_char(c)
        || matches!(c,
            '-' | '.' | '0'..='9'
            | '\u{B7}'
            | '\u{300}'..='\u{36F}'
            | '\u{203F}'..='\u{2040}')
}

/// Whether `name` matches the `Name` production.
pub fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if is_name_start_char(first) => chars.all(is_name_char),
        _ => false,
    }
}

/// Validate a qualified name and split it into `(prefix, local)`.
///
/// Used by element creation, where a bad name is an invalid-character error
/// and a prefix/namespace mismatch is a namespace error.
pub(crate) fn validate_and_extract<'a>(
    namespace: Option<&str>,
    qualified: &'a str,
) -> Result<(Option<&'a str>, &'a str), DomError> {
    if !is_valid_name(qualified) || qualified.starts_with(':') || qualified.ends_with(':') {
        return Err(DomError::InvalidCharacter {
            value: qualified.to_string(),
        });
    }

    let (prefix, local) = match qualified.split_once(':') {
        Some((prefix, local)) => {
            if local.contains(':') {
                return Err(DomError::InvalidCharacter {
                    value: qualified.to_string(),
                });
            }
            (Some(prefix), local)
        }
        None => (None, qualified),
    };

    let namespace = namespace.filter(|ns| !ns.is_empty());
    let mismatch = (prefix.is_some() && namespace.is_none())
        || (prefix == Some("xml") && namespace != Some(XML_NAMESPACE))
        || ((qualified == "xmlns" || prefix == Some("xmlns")) && namespace != Some(XMLNS_NAMESPACE))
        || (namespace == Some(XMLNS_NAMESPACE) && qualified != "xmlns" && prefix != Some("xmlns"));
    if mismatch {
        return Err(DomError::Namespace {
            name: qualified.to_string(),
            namespace: namespace.unwrap_or_default().to_string(),
        });
    }

    Ok((prefix, local))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_names() {
        assert!(is_valid_name("div"));
        assert!(is_valid_name("data-foo"));
        assert!(is_valid_name("_x.y"));
        assert!(is_valid_name("xlink:href"));
        assert!(is_valid_name("\u{e9}l\u{e8}ve"));
    }

    #[test]
    fn test_invalid_names() {
        assert!(!is_valid_name(""));
        assert!(!is_valid_name("1abc"));
        assert!(!is_valid_name("-abc"));
        assert!(!is_valid_name("a b"));
        assert!(!is_valid_name("a=b"));
        assert!(!is_valid_name("a\"b"));
    }

    #[test]
    fn test_validate_and_extract() {
        assert_eq!(
            validate_and_extract(Some("http://www.w3.org/2000/svg"), "svg:rect"),
            Ok((Some("svg"), "rect"))
        );
        assert_eq!(validate_and_extract(None, "div"), Ok((None, "div")));
        assert!(matches!(
            validate_and_extract(None, "svg:rect"),
            Err(DomError::Namespace { .. })
        ));
        assert!(matches!(
            validate_and_extract(None, "a:b:c"),
            Err(DomError::InvalidCharacter { .. })
        ));
        assert!(matches!(
            validate_and_extract(Some(XMLNS_NAMESPACE), "foo"),
            Err(DomError::Namespace { .. })
        ));
        assert_eq!(
            validate_and_extract(Some(XMLNS_NAMESPACE), "xmlns:foo"),
            Ok((Some("xmlns"), "foo"))
        );
    }
}
