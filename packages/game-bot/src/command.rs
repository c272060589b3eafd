//! Free-text command extraction.
//!
//! A body is scanned line by line. Every line holding the keyword as a
//! whitespace-separated token overrides earlier matches, so the last
//! occurrence in a message wins.

use regex::Regex;

use crate::models::PlayerName;

const PUNCTUATION: &str = r"[.,;:!?)*]";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    Signup,
    Vote,
    Target,
    Kill,
    Table,
    Confirm,
}

impl Keyword {
    pub fn token(&self) -> &'static str {
        match self {
            Keyword::Signup => "!signup",
            Keyword::Vote => "!vote",
            Keyword::Target => "!target",
            Keyword::Kill => "!kill",
            Keyword::Table => "!table",
            Keyword::Confirm => "confirm",
        }
    }
}

/// キーワードの出現と、その直後のトークン(あれば)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub keyword: Keyword,
    pub argument: Option<PlayerName>,
}

/// `body` 中の `keyword` を探す。見つからなければ `None`。
pub fn scan(body: &str, keyword: Keyword) -> Option<Invocation> {
    let re = command_regex(keyword);

    body.lines()
        .flat_map(|line| re.captures_iter(line))
        .last()
        .map(|captures| Invocation {
            keyword,
            argument: captures
                .name("target")
                .map(|target| PlayerName::new(target.as_str()))
                .filter(|name| !name.is_empty()),
        })
}

/// Convenience for commands that need a target.
pub fn scan_target(body: &str, keyword: Keyword) -> Option<Option<PlayerName>> {
    scan(body, keyword).map(|invocation| invocation.argument)
}

pub fn contains(body: &str, keyword: Keyword) -> bool {
    scan(body, keyword).is_some()
}

/// キーワードは空白区切りのトークンとして現れ、末尾の句読点は無視する。
/// 直後のトークンが引数。
fn command_regex(keyword: Keyword) -> Regex {
    Regex::new(&format!(
        r"(?i)(?:^|\s){kw}{punct}*(?:\s+(?<target>\S*[^\s.,;:!?)*])?{punct}*|\s*$)",
        kw = regex::escape(keyword.token()),
        punct = PUNCTUATION,
    ))
    .expect("Valid command regex")
}
