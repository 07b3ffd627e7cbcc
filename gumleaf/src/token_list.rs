//! Space-separated token sets and the live `classList` view.

use crate::document::Document;
use crate::error::DomError;
use indextree::NodeId;
use smallvec::SmallVec;

/// An ordered set of tokens parsed from an attribute value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenList {
    tokens: SmallVec<[String; 4]>,
}

impl TokenList {
    /// Split on ASCII whitespace, dropping duplicates but keeping first order.
    pub fn parse(value: &str) -> Self {
        let mut list = Self::default();
        for token in value.split_ascii_whitespace() {
            list.insert(token);
        }
        list
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn item(&self, index: usize) -> Option<&str> {
        self.tokens.get(index).map(String::as_str)
    }

    pub fn contains(&self, token: &str) -> bool {
        self.tokens.iter().any(|t| t == token)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.tokens.iter().map(String::as_str)
    }

    /// The ordered-set serialization: tokens joined by single spaces.
    pub fn serialize(&self) -> String {
        self.tokens.join(" ")
    }

    fn validate(token: &str) -> Result<(), DomError> {
        if token.is_empty() {
            return Err(DomError::syntax(token));
        }
        if token.bytes().any(|b| b.is_ascii_whitespace()) {
            return Err(DomError::InvalidCharacter {
                value: token.to_string(),
            });
        }
        Ok(())
    }

    fn insert(&mut self, token: &str) -> bool {
        if self.contains(token) {
            return false;
        }
        self.tokens.push(token.to_string());
        true
    }

    fn remove(&mut self, token: &str) -> bool {
        let before = self.tokens.len();
        self.tokens.retain(|t| t != token);
        self.tokens.len() != before
    }

    fn replace(&mut self, old: &str, new: &str) -> bool {
        let Some(index) = self.tokens.iter().position(|t| t == old) else {
            return false;
        };
        if self.contains(new) {
            self.tokens[index] = new.to_string();
            // drop the later duplicate, whichever side of `index` it is on
            let mut seen = false;
            self.tokens.retain(|t| {
                if t != new {
                    return true;
                }
                let keep = !seen;
                seen = true;
                keep
            });
        } else {
            self.tokens[index] = new.to_string();
        }
        true
    }
}

/// Live view over an element's `class` attribute.
///
/// Obtained from [`Document::class_list`]. Reading goes through the element's
/// cached token set; every change is written back to the attribute on the
/// suppressed tier, so the cache is not re-parsed and attribute observers do
/// not fire, while a mutation record is still queued.
pub struct ClassList<'d> {
    doc: &'d mut Document,
    element: NodeId,
}

impl<'d> ClassList<'d> {
    pub(crate) fn new(doc: &'d mut Document, element: NodeId) -> Self {
        Self { doc, element }
    }

    fn tokens(&self) -> Option<&TokenList> {
        self.doc.class_tokens(self.element)
    }

    pub fn len(&self) -> usize {
        self.tokens().map_or(0, TokenList::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn item(&self, index: usize) -> Option<&str> {
        self.tokens()?.item(index)
    }

    pub fn contains(&self, token: &str) -> bool {
        self.tokens().is_some_and(|list| list.contains(token))
    }

    /// Current tokens, in order.
    pub fn to_vec(&self) -> Vec<String> {
        self.tokens()
            .map(|list| list.iter().map(str::to_string).collect())
            .unwrap_or_default()
    }

    /// Serialized token set.
    pub fn value(&self) -> String {
        self.tokens().map(TokenList::serialize).unwrap_or_default()
    }

    /// Apply `edit` to the cached set, then write it back if it reports a change.
    fn update(&mut self, edit: impl FnOnce(&mut TokenList) -> bool) -> bool {
        let Some(list) = self.doc.class_tokens_mut(self.element) else {
            return false;
        };
        let changed = edit(list);
        self.doc.write_back_class(self.element);
        changed
    }

    pub fn add(&mut self, tokens: &[&str]) -> Result<(), DomError> {
        for token in tokens {
            TokenList::validate(token)?;
        }
        self.update(|list| {
            for token in tokens {
                list.insert(token);
            }
            true
        });
        Ok(())
    }

    pub fn remove(&mut self, tokens: &[&str]) -> Result<(), DomError> {
        for token in tokens {
            TokenList::validate(token)?;
        }
        self.update(|list| {
            for token in tokens {
                list.remove(token);
            }
            true
        });
        Ok(())
    }

    /// Flip `token`, or force it on/off. Returns whether it is present after.
    pub fn toggle(&mut self, token: &str, force: Option<bool>) -> Result<bool, DomError> {
        TokenList::validate(token)?;
        let present = self.contains(token);
        match (present, force) {
            (true, Some(true)) => Ok(true),
            (false, Some(false)) => Ok(false),
            (true, _) => {
                self.update(|list| list.remove(token));
                Ok(false)
            }
            (false, _) => {
                self.update(|list| list.insert(token));
                Ok(true)
            }
        }
    }

    /// Replace `old` with `new` in place. Returns whether `old` was present.
    pub fn replace(&mut self, old: &str, new: &str) -> Result<bool, DomError> {
        TokenList::validate(old)?;
        TokenList::validate(new)?;
        if !self.contains(old) {
            return Ok(false);
        }
        Ok(self.update(|list| list.replace(old, new)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_dedupes_in_order() {
        let list = TokenList::parse("  b a\tb\nc  a ");
        assert_eq!(list.iter().collect::<Vec<_>>(), ["b", "a", "c"]);
        assert_eq!(list.serialize(), "b a c");
    }

    #[test]
    fn test_replace_with_existing_token() {
        let mut list = TokenList::parse("a b c");
        assert!(list.replace("c", "a"));
        assert_eq!(list.serialize(), "a b");

        let mut list = TokenList::parse("a b c");
        assert!(list.replace("a", "c"));
        assert_eq!(list.serialize(), "c b");

        assert!(!list.replace("zzz", "q"));
    }

    #[test]
    fn test_validate() {
        assert!(matches!(TokenList::validate(""), Err(DomError::Syntax { .. })));
        assert!(matches!(
            TokenList::validate("a b"),
            Err(DomError::InvalidCharacter { .. })
        ));
        assert!(TokenList::validate("ok").is_ok());
    }
}
