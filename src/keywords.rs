use anyhow::Result;
use std::collections::HashMap;
use std::fs;

use crate::scanner::token::TokenKind;

/// Loads the keyword table, optionally remapped from a JSON file of
/// `{"canonical": "surface word"}` pairs. Unknown canonical names are ignored.
pub fn load_keywords(path: Option<&str>) -> Result<HashMap<String, TokenKind>> {
    let map: HashMap<String, String> = match path {
        Some(p) => {
            let contents = fs::read_to_string(p)?;
            serde_json::from_str(&contents)?
        }
        None => default_keywords(),
    };

    let mut keywords = HashMap::new();
    for (key, value) in map {
        if let Some(kind) = str_to_token_kind(&key) {
            keywords.insert(value, kind);
        }
    }

    Ok(keywords)
}

fn default_keywords() -> HashMap<String, String> {
    HashMap::from([
        ("if".into(), "if".into()),
        ("else".into(), "else".into()),
        ("loop".into(), "loop".into()),
        ("for".into(), "for".into()),
        ("fn".into(), "fn".into()),
        ("do".into(), "do".into()),
        ("end".into(), "end".into()),
        ("true".into(), "true".into()),
        ("false".into(), "false".into()),
    ])
}

fn str_to_token_kind(s: &str) -> Option<TokenKind> {
    match s {
        "if" => Some(TokenKind::If),
        "else" => Some(TokenKind::Else),
        "loop" => Some(TokenKind::Loop),
        "for" => Some(TokenKind::For),
        "fn" => Some(TokenKind::Fn),
        "do" => Some(TokenKind::Do),
        "end" => Some(TokenKind::End),
        "true" => Some(TokenKind::Bool(true)),
        "false" => Some(TokenKind::Bool(false)),
        _ => None,
    }
}
