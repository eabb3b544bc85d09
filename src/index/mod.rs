// src/index/mod.rs

use ahash::AHashMap;
use log::{debug, warn};
use thiserror::Error;

use crate::types::{Offset, Token};
pub use crate::config::subsystems::index::DuplicatePolicy;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IndexError {
    #[error("two tokens start at offset {start}")]
    DuplicateStart { start: Offset },
}

/// Tokens of one document keyed by start offset.
///
/// Built once per document and only read afterwards, so it can be shared by
/// reference across every enrichment worker.
#[derive(Debug, Clone, Default)]
pub struct TokenIndex {
    tokens: AHashMap<Offset, Token>,
    overwritten: usize,
}

impl TokenIndex {
    /// Builds the index, keeping the last token seen for a repeated start offset.
    pub fn build<I>(tokens: I) -> Self
    where
        I: IntoIterator<Item = Token>,
    {
        let tokens = tokens.into_iter();
        let mut map = AHashMap::with_capacity(tokens.size_hint().0);
        let mut overwritten = 0;

        for token in tokens {
            let start = token.start;
            if let Some(previous) = map.insert(start, token) {
                overwritten += 1;
                warn!("Token index: token {:?} at offset {} replaced by a later token", previous.text, start);
            }
        }

        debug!("Built token index with {} tokens ({} overwritten)", map.len(), overwritten);

        Self { tokens: map, overwritten }
    }

    /// Builds the index, failing on the first repeated start offset.
    pub fn build_strict<I>(tokens: I) -> Result<Self, IndexError>
    where
        I: IntoIterator<Item = Token>,
    {
        let tokens = tokens.into_iter();
        let mut map = AHashMap::with_capacity(tokens.size_hint().0);

        for token in tokens {
            let start = token.start;
            if map.insert(start, token).is_some() {
                return Err(IndexError::DuplicateStart { start });
            }
        }

        debug!("Built strict token index with {} tokens", map.len());

        Ok(Self { tokens: map, overwritten: 0 })
    }

    /// Builds the index with the given duplicate-start policy.
    pub fn build_with_policy<I>(tokens: I, policy: DuplicatePolicy) -> Result<Self, IndexError>
    where
        I: IntoIterator<Item = Token>,
    {
        match policy {
            DuplicatePolicy::LastWins => Ok(Self::build(tokens)),
            DuplicatePolicy::Reject => Self::build_strict(tokens),
        }
    }

    pub fn get(&self, start: Offset) -> Option<&Token> {
        self.tokens.get(&start)
    }

    pub fn contains(&self, start: Offset) -> bool {
        self.tokens.contains_key(&start)
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Number of tokens dropped because a later token shared their start offset.
    pub fn overwritten(&self) -> usize {
        self.overwritten
    }
}

impl FromIterator<Token> for TokenIndex {
    fn from_iter<I: IntoIterator<Item = Token>>(iter: I) -> Self {
        Self::build(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens() -> Vec<Token> {
        vec![
            Token::new(0, 4, "Homo"),
            Token::new(5, 12, "sapiens"),
            Token::without_text(12, 13),
        ]
    }

    #[test]
    fn indexes_every_token_by_start() {
        let index = TokenIndex::build(tokens());
        assert_eq!(index.len(), 3);
        assert_eq!(index.get(5).and_then(|t| t.text.as_deref()), Some("sapiens"));
        assert!(index.contains(12));
        assert!(!index.contains(4));
        assert_eq!(index.overwritten(), 0);
    }

    #[test]
    fn duplicate_start_keeps_last_token() {
        let mut input = tokens();
        input.push(Token::new(5, 9, "sapi"));

        let index = TokenIndex::build(input);
        assert_eq!(index.len(), 3);
        assert_eq!(index.overwritten(), 1);
        assert_eq!(index.get(5).and_then(|t| t.text.as_deref()), Some("sapi"));
    }

    #[test]
    fn strict_build_rejects_duplicate_start() {
        let mut input = tokens();
        input.push(Token::new(0, 2, "Ho"));

        let err = TokenIndex::build_strict(input).unwrap_err();
        assert_eq!(err, IndexError::DuplicateStart { start: 0 });
    }

    #[test]
    fn policy_selects_builder() {
        let mut input = tokens();
        input.push(Token::new(0, 2, "Ho"));

        assert!(TokenIndex::build_with_policy(input.clone(), DuplicatePolicy::LastWins).is_ok());
        assert!(TokenIndex::build_with_policy(input, DuplicatePolicy::Reject).is_err());
    }

    #[test]
    fn empty_input_builds_empty_index() {
        let index: TokenIndex = Vec::<Token>::new().into_iter().collect();
        assert!(index.is_empty());
    }
}
