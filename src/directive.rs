//! Directive block parser
//!
//! Parses the block-structured text configuration:
//!
//! ```text
//! allow_countries AU US CA
//! deny_ips 203.0.113.0/24
//! block_by_default true
//! ```
//!
//! List directives are sticky: every following value token is appended to
//! the directive's list, across line breaks, until the next directive name
//! appears. `block_by_default` is one-shot: it consumes exactly one token
//! and reverts to no active directive.

use thiserror::Error;

use crate::rules::FilterConfig;

/// Errors raised while parsing a directive block
#[derive(Error, Debug, PartialEq, Eq)]
pub enum DirectiveError {
    #[error("unexpected config parameter {0}")]
    UnexpectedParameter(String),
}

/// Active directive while scanning the token stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Directive {
    None,
    AllowCountries,
    DenyCountries,
    BlockByDefault,
    AllowIps,
    DenyIps,
}

impl Directive {
    /// Recognize a directive name. Case-sensitive, exact match.
    fn from_token(token: &str) -> Option<Self> {
        match token {
            "allow_countries" => Some(Self::AllowCountries),
            "deny_countries" => Some(Self::DenyCountries),
            "block_by_default" => Some(Self::BlockByDefault),
            "allow_ips" => Some(Self::AllowIps),
            "deny_ips" => Some(Self::DenyIps),
            _ => None,
        }
    }
}

impl FilterConfig {
    /// Parse one configuration block given as text.
    ///
    /// Tokens are separated by whitespace; line structure carries no meaning
    /// beyond token order.
    pub fn from_block(block: &str) -> Result<Self, DirectiveError> {
        Self::from_tokens(block.split_whitespace())
    }

    /// Parse one configuration block given as an ordered token stream.
    ///
    /// A token that is not a recognized directive name is a value for the
    /// most recently seen directive; a value with no active directive is a
    /// syntax error.
    pub fn from_tokens<'a, I>(tokens: I) -> Result<Self, DirectiveError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut config = FilterConfig::default();
        let mut current = Directive::None;

        for token in tokens {
            if let Some(directive) = Directive::from_token(token) {
                current = directive;
                continue;
            }

            match current {
                Directive::AllowCountries => push(&mut config.allow_countries, token),
                Directive::DenyCountries => push(&mut config.deny_countries, token),
                Directive::AllowIps => push(&mut config.allow_ips, token),
                Directive::DenyIps => push(&mut config.deny_ips, token),
                Directive::BlockByDefault => {
                    // Only the literal token "true" sets the flag; any
                    // other token is consumed without effect.
                    if token == "true" {
                        config.block_by_default = Some(true);
                    }
                    current = Directive::None;
                }
                Directive::None => {
                    return Err(DirectiveError::UnexpectedParameter(token.to_string()));
                }
            }
        }

        Ok(config)
    }
}

fn push(list: &mut Option<Vec<String>>, value: &str) {
    list.get_or_insert_with(Vec::new).push(value.to_string());
}
