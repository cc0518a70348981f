//! Comma splitting for the loosely quoted CSV exports the portal reads.

/// Splits a line on commas that sit outside double quotes.
///
/// A comma splits the line iff the number of `"` characters after it on the
/// line is even. Quotes are kept in the returned fields; see [`clean_field`].
pub fn split_quoted(line: &str) -> Vec<&str> {
    let total_quotes = line.bytes().filter(|b| *b == b'"').count();
    let mut quotes_seen = 0;
    let mut fields = Vec::new();
    let mut start = 0;
    for (idx, byte) in line.bytes().enumerate() {
        match byte {
            b'"' => quotes_seen += 1,
            b',' if (total_quotes - quotes_seen) % 2 == 0 => {
                fields.push(&line[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
    }
    fields.push(&line[start..]);
    fields
}

/// Trims whitespace, then removes one leading and one trailing `"`.
pub fn clean_field(field: &str) -> &str {
    let trimmed = field.trim();
    let trimmed = trimmed.strip_prefix('"').unwrap_or(trimmed);
    trimmed.strip_suffix('"').unwrap_or(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_commas_split() {
        assert_eq!(split_quoted("a,b,c"), vec!["a", "b", "c"]);
    }

    #[test]
    fn quoted_commas_do_not_split() {
        assert_eq!(
            split_quoted(r#"1,"https://x/y?a=1,2","Doe, Jane.pdf""#),
            vec!["1", r#""https://x/y?a=1,2""#, r#""Doe, Jane.pdf""#]
        );
    }

    #[test]
    fn empty_line_is_one_empty_field() {
        assert_eq!(split_quoted(""), vec![""]);
    }

    #[test]
    fn clean_field_strips_one_quote_pair() {
        assert_eq!(clean_field(r#"  "value"  "#), "value");
        assert_eq!(clean_field(r#""""#), "");
        assert_eq!(clean_field("bare"), "bare");
    }
}
