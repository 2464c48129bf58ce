#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Quote {
    None,
    Single,
    Double,
}

/// Tokenizes shell input into a vector of strings.
///
/// Outside quotes a backslash copies the next character verbatim; at end of
/// line it is kept as a literal backslash. Single
/// quotes are opaque. Inside double quotes a backslash only escapes `"`, `\`
/// and `$`; before anything else it is kept. An unterminated quote is closed
/// implicitly at end of line.
pub fn tokenize(input: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut quote = Quote::None;
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        match quote {
            Quote::Single => {
                if c == '\'' {
                    quote = Quote::None;
                } else {
                    current.push(c);
                }
            }
            Quote::Double => match c {
                '"' => quote = Quote::None,
                '\\' => match chars.peek() {
                    Some(&next) if matches!(next, '"' | '\\' | '$') => {
                        chars.next();
                        current.push(next);
                    }
                    _ => current.push(c),
                },
                _ => current.push(c),
            },
            Quote::None => match c {
                '\'' => quote = Quote::Single,
                '"' => quote = Quote::Double,
                '\\' => match chars.next() {
                    Some(next) => current.push(next),
                    None => current.push(c),
                },
                ' ' | '\t' => {
                    if !current.is_empty() {
                        tokens.push(std::mem::take(&mut current));
                    }
                }
                _ => current.push(c),
            },
        }
    }

    if !current.is_empty() {
        tokens.push(current);
    }

    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_command() {
        assert_eq!(tokenize("echo hello"), vec!["echo", "hello"]);
        assert_eq!(tokenize("ls -la /tmp"), vec!["ls", "-la", "/tmp"]);
    }

    #[test]
    fn test_empty_and_blank() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("   ").is_empty());
        assert!(tokenize(" \t ").is_empty());
    }

    #[test]
    fn test_whitespace_runs() {
        assert_eq!(tokenize("  echo \t a   b  "), vec!["echo", "a", "b"]);
    }

    #[test]
    fn test_single_quotes() {
        assert_eq!(tokenize("echo 'a b' c"), vec!["echo", "a b", "c"]);
        assert_eq!(tokenize(r"echo 'a\nb'"), vec!["echo", r"a\nb"]);
        assert_eq!(tokenize(r#"echo 'say "hi"'"#), vec!["echo", r#"say "hi""#]);
    }

    #[test]
    fn test_double_quotes() {
        assert_eq!(tokenize("echo \"hello world\""), vec!["echo", "hello world"]);
        assert_eq!(tokenize(r#"echo "it's""#), vec!["echo", "it's"]);
    }

    #[test]
    fn test_double_quote_escapes() {
        assert_eq!(tokenize(r#"echo "a\"b""#), vec!["echo", r#"a"b"#]);
        assert_eq!(tokenize(r#"echo "a\\b""#), vec!["echo", r"a\b"]);
        assert_eq!(tokenize(r#"echo "\$HOME""#), vec!["echo", "$HOME"]);
        assert_eq!(tokenize(r#"echo "a\nb""#), vec!["echo", r"a\nb"]);
    }

    #[test]
    fn test_unquoted_backslash() {
        assert_eq!(tokenize(r"echo a\ b"), vec!["echo", "a b"]);
        assert_eq!(tokenize(r"echo \'x\'"), vec!["echo", "'x'"]);
        assert_eq!(tokenize(r"echo a\nb"), vec!["echo", "anb"]);
        assert_eq!(tokenize(r"echo a\\b"), vec!["echo", r"a\b"]);
        assert_eq!(tokenize(r"echo trailing\"), vec!["echo", r"trailing\"]);
        assert_eq!(tokenize(r"echo \"), vec!["echo", r"\"]);
    }

    #[test]
    fn test_adjacent_quoted_parts_join() {
        assert_eq!(tokenize(r#"echo 'a'"b"c"#), vec!["echo", "abc"]);
        assert_eq!(tokenize("echo ''"), vec!["echo"]);
    }

    #[test]
    fn test_unterminated_quote() {
        assert_eq!(tokenize("echo 'abc"), vec!["echo", "abc"]);
        assert_eq!(tokenize("echo \"a b"), vec!["echo", "a b"]);
    }

    #[test]
    fn test_redirection_tokens_pass_through() {
        assert_eq!(tokenize("echo hi > file.txt"), vec!["echo", "hi", ">", "file.txt"]);
        assert_eq!(tokenize("ls 2>> err | wc"), vec!["ls", "2>>", "err", "|", "wc"]);
    }
}
