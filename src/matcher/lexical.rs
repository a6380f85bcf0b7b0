//! Lexical masking of comments and string literals.
//!
//! The scan understands C-family surface syntax: `//` line comments, `/* */`
//! block comments, single and double quoted strings with backslash escapes,
//! and template literals whose text is masked while `${...}` holes stay
//! visible. It is not a tokenizer; regex literals are not recognized.

use std::ops::Range;

/// Returns the byte ranges of comments and string literals in `source`.
///
/// Ranges are sorted and never overlap.
pub fn masked_regions(source: &str) -> Vec<Range<usize>> {
    let bytes = source.as_bytes();
    let mut regions = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'/' if bytes.get(i + 1) == Some(&b'/') => {
                let end = source[i..].find('\n').map_or(bytes.len(), |n| i + n);
                regions.push(i..end);
                i = end;
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                let end = source[i + 2..]
                    .find("*/")
                    .map_or(bytes.len(), |n| i + 2 + n + 2);
                regions.push(i..end);
                i = end;
            }
            quote @ (b'\'' | b'"') => {
                let end = scan_quoted(bytes, i, quote);
                regions.push(i..end);
                i = end;
            }
            b'`' => {
                i = scan_template(bytes, i, &mut regions);
            }
            _ => i += 1,
        }
    }

    regions
}

/// Returns true if `pos` lies strictly inside one of `regions`.
///
/// A position equal to a region's start is the delimiter itself and does not
/// count as inside.
pub fn is_inside(regions: &[Range<usize>], pos: usize) -> bool {
    let idx = regions.partition_point(|r| r.end <= pos);
    regions
        .get(idx)
        .is_some_and(|r| r.start < pos && pos < r.end)
}

// Unterminated strings stop at the end of the line.
fn scan_quoted(bytes: &[u8], start: usize, quote: u8) -> usize {
    let mut i = start + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'\n' => return i,
            c if c == quote => return i + 1,
            _ => i += 1,
        }
    }
    bytes.len()
}

fn scan_template(bytes: &[u8], start: usize, regions: &mut Vec<Range<usize>>) -> usize {
    let mut text_start = start;
    let mut i = start + 1;

    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'`' => {
                regions.push(text_start..i + 1);
                return i + 1;
            }
            b'$' if bytes.get(i + 1) == Some(&b'{') => {
                regions.push(text_start..i);
                let mut depth = 0usize;
                while i < bytes.len() {
                    match bytes[i] {
                        b'{' => depth += 1,
                        b'}' => {
                            depth -= 1;
                            if depth == 0 {
                                break;
                            }
                        }
                        _ => {}
                    }
                    i += 1;
                }
                if i >= bytes.len() {
                    return bytes.len();
                }
                // The closing brace delimits the next text run.
                text_start = i;
                i += 1;
            }
            _ => i += 1,
        }
    }

    regions.push(text_start..bytes.len());
    bytes.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn masked_text(source: &str) -> Vec<&str> {
        masked_regions(source)
            .into_iter()
            .map(|r| &source[r])
            .collect()
    }

    #[test]
    fn test_line_and_block_comments() {
        let source = "a // one\nb /* two\nthree */ c";
        assert_eq!(masked_text(source), vec!["// one", "/* two\nthree */"]);
    }

    #[test]
    fn test_string_literals_with_escapes() {
        let source = r#"x = 'it\'s'; y = "a \"b\"";"#;
        assert_eq!(masked_text(source), vec![r"'it\'s'", r#""a \"b\"""#]);
    }

    #[test]
    fn test_unterminated_string_stops_at_newline() {
        let source = "x = 'open\ny = NAME";
        let regions = masked_regions(source);
        assert_eq!(regions, vec![4..9]);
    }

    #[test]
    fn test_template_holes_stay_visible() {
        let source = "`users/${NAME}/items`";
        let texts = masked_text(source);
        assert_eq!(texts, vec!["`users/", "}/items`"]);
        let hole = source.find("NAME").unwrap();
        assert!(!is_inside(&masked_regions(source), hole));
    }

    #[test]
    fn test_text_right_after_hole_is_masked() {
        let source = "log(`${id}NAME`);";
        let regions = masked_regions(source);
        assert!(is_inside(&regions, source.find("NAME").unwrap()));
        assert!(!is_inside(&regions, source.find("id").unwrap()));
    }

    #[test]
    fn test_adjacent_holes() {
        let source = "`${a}${NAME}`";
        let regions = masked_regions(source);
        assert!(!is_inside(&regions, source.find("NAME").unwrap()));
    }

    #[test]
    fn test_is_inside_excludes_region_start() {
        let regions = vec![2..6, 10..12];
        assert!(!is_inside(&regions, 2));
        assert!(is_inside(&regions, 3));
        assert!(!is_inside(&regions, 6));
        assert!(is_inside(&regions, 11));
        assert!(!is_inside(&regions, 20));
    }
}
