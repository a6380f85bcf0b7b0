//! Boundary-aware symbol and declaration matching.

use super::MatchRegion;
use super::lexical::{is_inside, masked_regions};
use crate::error::Result;
use regex::Regex;
use std::ops::Range;

/// Returns true for characters that may appear inside an identifier.
pub fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$'
}

/// Returns true if `name` is a non-empty identifier not starting with a digit.
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if is_ident_char(first) && !first.is_ascii_digit() => {
            chars.all(is_ident_char)
        }
        _ => false,
    }
}

/// Finds whole-symbol occurrences of an identifier.
///
/// An occurrence only counts when the characters on either side are not
/// identifier characters, so `COLLECTION_NAME` never matches inside
/// `COLLECTION_NAMES` or `MY_COLLECTION_NAME`. Occurrences inside comments
/// and string literals are ignored unless [`SymbolMatcher::include_literals`]
/// is set.
#[derive(Debug, Clone)]
pub struct SymbolMatcher {
    symbol: String,
    skip_literals: bool,
}

impl SymbolMatcher {
    /// Creates a matcher for the given symbol.
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            skip_literals: true,
        }
    }

    /// Also matches occurrences inside comments and string literals.
    pub fn include_literals(mut self) -> Self {
        self.skip_literals = false;
        self
    }

    /// Finds every occurrence of the symbol.
    pub fn find_all(&self, source: &str) -> Vec<MatchRegion> {
        if self.symbol.is_empty() {
            return Vec::new();
        }

        let masked = if self.skip_literals {
            masked_regions(source)
        } else {
            Vec::new()
        };

        source
            .match_indices(self.symbol.as_str())
            .map(|(start, _)| MatchRegion::new(start, start + self.symbol.len()))
            .filter(|region| is_bounded(source, region) && !is_inside(&masked, region.start))
            .collect()
    }

    /// Finds the first occurrence of the symbol.
    pub fn find_first(&self, source: &str) -> Option<MatchRegion> {
        self.find_all(source).into_iter().next()
    }

    /// Returns true if the symbol occurs at all.
    pub fn is_present(&self, source: &str) -> bool {
        self.find_first(source).is_some()
    }
}

fn is_bounded(source: &str, region: &MatchRegion) -> bool {
    let before = source[..region.start].chars().next_back();
    let after = source[region.end..].chars().next();
    !before.is_some_and(is_ident_char) && !after.is_some_and(is_ident_char)
}

/// A declaration statement found by [`DefinitionMatcher`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefinitionSite {
    /// From the start of the line through the terminating `;`, or through the
    /// end of the line when there is none.
    pub statement: MatchRegion,
    /// Leading whitespace of the line.
    pub indent: String,
    /// Line ending to emit when more code follows the statement on its line.
    /// The statement region then also covers the blanks before that code.
    pub split: Option<&'static str>,
}

/// Finds declaration statements of the form `[export] const|let|var NAME = ...`
/// that start a line.
#[derive(Debug, Clone)]
pub struct DefinitionMatcher {
    pattern: Regex,
    skip_literals: bool,
}

impl DefinitionMatcher {
    /// Creates a matcher for declarations of `symbol`.
    pub fn new(symbol: &str) -> Result<Self> {
        let pattern = Regex::new(&format!(
            r"(?m)^([ \t]*)((?:export[ \t]+)?(?:const|let|var)[ \t]+{}[ \t]*=)",
            regex::escape(symbol)
        ))?;
        Ok(Self {
            pattern,
            skip_literals: true,
        })
    }

    /// Also matches declarations inside comments and string literals.
    pub fn include_literals(mut self) -> Self {
        self.skip_literals = false;
        self
    }

    /// Finds every definition statement.
    pub fn find_all(&self, source: &str) -> Vec<DefinitionSite> {
        // Statement ends are always found outside literals.
        let masked = masked_regions(source);

        self.pattern
            .captures_iter(source)
            .filter_map(|caps| {
                let whole = caps.get(0)?;
                let indent = caps.get(1)?;
                let decl = caps.get(2)?;
                if self.skip_literals && is_inside(&masked, decl.start()) {
                    return None;
                }
                let (end, split) = statement_end(source, &masked, whole.end());
                Some(DefinitionSite {
                    statement: MatchRegion::new(whole.start(), end),
                    indent: indent.as_str().to_string(),
                    split,
                })
            })
            .collect()
    }

    /// Returns true if any definition exists.
    pub fn is_present(&self, source: &str) -> bool {
        !self.find_all(source).is_empty()
    }
}

fn statement_end(
    source: &str,
    masked: &[Range<usize>],
    from: usize,
) -> (usize, Option<&'static str>) {
    let bytes = source.as_bytes();
    let mut i = from;

    while i < bytes.len() {
        if is_inside(masked, i) {
            i += 1;
            continue;
        }
        match bytes[i] {
            b'\n' if i > from && bytes[i - 1] == b'\r' => return (i - 1, None),
            b'\n' => return (i, None),
            b';' => break,
            _ => i += 1,
        }
    }
    if i >= bytes.len() {
        return (bytes.len(), None);
    }

    let end = i + 1;
    let rest = source[end..].len() - source[end..].trim_start_matches([' ', '\t']).len();
    let next = end + rest;
    match bytes.get(next) {
        None | Some(b'\r') | Some(b'\n') => (end, None),
        Some(_) => {
            let crlf = source[next..]
                .find('\n')
                .is_some_and(|n| n > 0 && bytes[next + n - 1] == b'\r');
            (next, Some(if crlf { "\r\n" } else { "\n" }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_rules() {
        assert!(is_identifier("COLLECTION_NAME"));
        assert!(is_identifier("$store"));
        assert!(!is_identifier("9lives"));
        assert!(!is_identifier("a-b"));
        assert!(!is_identifier(""));
    }

    #[test]
    fn test_symbol_respects_boundaries() {
        let source = "COLLECTION_NAME; COLLECTION_NAMES; MY_COLLECTION_NAME; (COLLECTION_NAME)";
        let matches = SymbolMatcher::new("COLLECTION_NAME").find_all(source);

        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].start, 0);
        assert_eq!(matches[1].text(source), "COLLECTION_NAME");
        assert_eq!(matches[1].start, source.rfind("COLLECTION_NAME").unwrap());
    }

    #[test]
    fn test_dollar_is_part_of_identifier() {
        let source = "$NAME NAME";
        let matches = SymbolMatcher::new("NAME").find_all(source);
        assert_eq!(matches, vec![MatchRegion::new(6, 10)]);
    }

    #[test]
    fn test_symbol_skips_comments_and_strings() {
        let source = "// NAME here\nlog('NAME'); use(NAME);";
        let matcher = SymbolMatcher::new("NAME");

        let matches = matcher.find_all(source);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].start, source.rfind("NAME").unwrap());

        let everything = matcher.include_literals().find_all(source);
        assert_eq!(everything.len(), 3);
    }

    #[test]
    fn test_symbol_in_template_hole() {
        let source = "const p = `${NAME}/docs`;";
        assert!(SymbolMatcher::new("NAME").is_present(source));
    }

    #[test]
    fn test_definition_line() {
        let source = "import x from 'y';\n  const COLLECTION_NAME = 'notices';\nuse(COLLECTION_NAME);\n";
        let matcher = DefinitionMatcher::new("COLLECTION_NAME").unwrap();

        let sites = matcher.find_all(source);
        assert_eq!(sites.len(), 1);
        assert_eq!(
            sites[0].statement.text(source),
            "  const COLLECTION_NAME = 'notices';"
        );
        assert_eq!(sites[0].indent, "  ");
        assert_eq!(sites[0].split, None);
    }

    #[test]
    fn test_definition_variants() {
        let matcher = DefinitionMatcher::new("NAME").unwrap();
        assert!(matcher.is_present("export const NAME = 'a';"));
        assert!(matcher.is_present("let NAME='a'"));
        assert!(!matcher.is_present("const NAMES = 'a';"));
        assert!(!matcher.is_present("NAME = 'a';"));
        assert!(!matcher.is_present("// const NAME = 'a';"));
    }

    #[test]
    fn test_definition_with_crlf() {
        let source = "const NAME = 'a';\r\nuse(NAME);\r\n";
        let sites = DefinitionMatcher::new("NAME").unwrap().find_all(source);
        assert_eq!(sites.len(), 1);
        assert_eq!(sites[0].statement.text(source), "const NAME = 'a';");
    }

    #[test]
    fn test_definition_stops_at_semicolon() {
        let source = "const NAME = 'a;b'; const PAGE_SIZE = 20;\nuse(NAME);\n";
        let sites = DefinitionMatcher::new("NAME").unwrap().find_all(source);

        assert_eq!(sites.len(), 1);
        assert_eq!(sites[0].statement.text(source), "const NAME = 'a;b'; ");
        assert_eq!(sites[0].split, Some("\n"));
    }

    #[test]
    fn test_definition_without_semicolon_runs_to_line_end() {
        let source = "let NAME = compute()\nuse(NAME);";
        let sites = DefinitionMatcher::new("NAME").unwrap().find_all(source);
        assert_eq!(sites[0].statement.text(source), "let NAME = compute()");
        assert_eq!(sites[0].split, None);
    }

    #[test]
    fn test_definition_with_trailing_comment_keeps_it_aside() {
        let source = "const NAME = 'a'; // the name\r\nuse(NAME);\r\n";
        let sites = DefinitionMatcher::new("NAME").unwrap().find_all(source);
        assert_eq!(sites[0].statement.text(source), "const NAME = 'a'; ");
        assert_eq!(sites[0].split, Some("\r\n"));
    }
}
