//! Command-line argument parsing.
//!
//! # Grammar
//!
//! A raw command line is split into tokens:
//!
//! - whitespace outside double quotes separates tokens
//! - double quotes group, and are removed
//! - `\"` is a literal quote
//!
//! Each token of the form `--key=value` maps `key` to `value`, split at the
//! first `=` so values may contain `=`. A bare `--flag` maps to the empty
//! string. Any other token (the executable path, positional arguments) is
//! ignored. A repeated key keeps its last value.

// ============================================================================
// Imports
// ============================================================================

use std::sync::LazyLock;

use regex::Regex;
use rustc_hash::FxHashMap;

// ============================================================================
// Constants
// ============================================================================

/// Matches `--key` or `--key=value`.
static OPTION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^--([^=\s]+)(?:=(.*))?$").expect("option pattern is valid")
});

// ============================================================================
// CommandLineArgs
// ============================================================================

/// Options parsed from a process command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandLineArgs {
    options: FxHashMap<String, String>,
}

impl CommandLineArgs {
    /// Parses a raw command line string.
    #[must_use]
    pub fn parse(command_line: &str) -> Self {
        Self::from_tokens(tokenize(command_line))
    }

    /// Builds from already-split arguments (argv).
    #[must_use]
    pub fn from_tokens<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut options = FxHashMap::default();

        for token in tokens {
            if let Some(captures) = OPTION_PATTERN.captures(token.as_ref()) {
                let key = captures[1].to_string();
                let value = captures
                    .get(2)
                    .map(|m| m.as_str().to_string())
                    .unwrap_or_default();
                options.insert(key, value);
            }
        }

        Self { options }
    }

    /// Returns the value of `key`.
    #[inline]
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.options.get(key).map(String::as_str)
    }

    /// Returns `true` if `key` was present.
    #[inline]
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.options.contains_key(key)
    }

    /// Returns the number of parsed options.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.options.len()
    }

    /// Returns `true` if no option was parsed.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }
}

// ============================================================================
// Tokenizer
// ============================================================================

/// Splits a raw command line into tokens.
#[must_use]
pub fn tokenize(command_line: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut has_token = false;
    let mut chars = command_line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\\' if chars.peek() == Some(&'"') => {
                chars.next();
                current.push('"');
                has_token = true;
            }
            '"' => {
                in_quotes = !in_quotes;
                has_token = true;
            }
            c if c.is_whitespace() && !in_quotes => {
                if has_token {
                    tokens.push(std::mem::take(&mut current));
                    has_token = false;
                }
            }
            c => {
                current.push(c);
                has_token = true;
            }
        }
    }

    if has_token {
        tokens.push(current);
    }

    tokens
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#""C:/Riot Games/League of Legends/LeagueClientUx.exe" "--riotclient-auth-token=abc" "--app-port=51234" "--remoting-auth-token=Zx-9_q=" "--region=EUW" "--locale=en_GB" "--no-rads" "--install-directory=C:/Riot Games/League of Legends""#;

    #[test]
    fn test_parse_client_command_line() {
        let args = CommandLineArgs::parse(SAMPLE);
        assert_eq!(args.get("app-port"), Some("51234"));
        assert_eq!(args.get("region"), Some("EUW"));
        assert_eq!(args.get("locale"), Some("en_GB"));
        assert_eq!(args.get("remoting-auth-token"), Some("Zx-9_q="));
        assert_eq!(args.get("no-rads"), Some(""));
        assert_eq!(
            args.get("install-directory"),
            Some("C:/Riot Games/League of Legends")
        );
        assert!(!args.contains("C:/Riot Games/League of Legends/LeagueClientUx.exe"));
    }

    #[test]
    fn test_value_keeps_embedded_equals() {
        let args = CommandLineArgs::parse("app --token=a=b==");
        assert_eq!(args.get("token"), Some("a=b=="));
    }

    #[test]
    fn test_unquoted_tokens() {
        let args = CommandLineArgs::parse("LeagueClientUx --app-port=1 --region=NA1");
        assert_eq!(args.len(), 2);
        assert_eq!(args.get("region"), Some("NA1"));
    }

    #[test]
    fn test_escaped_quote() {
        let tokens = tokenize(r#"--label="say \"hi\"" next"#);
        assert_eq!(tokens, vec![r#"--label=say "hi""#.to_string(), "next".to_string()]);
    }

    #[test]
    fn test_empty_quoted_token() {
        let tokens = tokenize(r#"a "" b"#);
        assert_eq!(tokens, vec!["a", "", "b"]);
    }

    #[test]
    fn test_last_duplicate_wins() {
        let args = CommandLineArgs::parse("--region=NA1 --region=EUW");
        assert_eq!(args.get("region"), Some("EUW"));
    }

    #[test]
    fn test_from_argv_does_not_retokenize() {
        let argv = ["/opt/client/LeagueClientUx.exe", "--install-directory=/a b/c"];
        let args = CommandLineArgs::from_tokens(argv);
        assert_eq!(args.get("install-directory"), Some("/a b/c"));
    }

    #[test]
    fn test_single_dash_and_positional_ignored() {
        let args = CommandLineArgs::parse("-v positional --=x");
        assert!(args.is_empty());
    }
}
