//! Split RQL text into tokens.

use super::error::SyntaxError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    LParen,
    RParen,
    Comma,
    Ampersand,
    Pipe,
    Equals,
    /// Raw, still percent-encoded text.
    Word(String),
    /// A quoted string, taken literally.
    Quoted(String),
}

/// A token and the byte offset where it starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Spanned {
    pub token: Token,
    pub position: usize,
}

fn is_delimiter(c: char) -> bool {
    matches!(c, '(' | ')' | ',' | '&' | '|' | '=')
}

pub fn tokenize(input: &str) -> Result<Vec<Spanned>, SyntaxError> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some(&(position, c)) = chars.peek() {
        let token = match c {
            c if c.is_whitespace() => {
                chars.next();
                continue;
            }
            '(' => Token::LParen,
            ')' => Token::RParen,
            ',' => Token::Comma,
            '&' => Token::Ampersand,
            '|' => Token::Pipe,
            '=' => Token::Equals,
            '\'' | '"' => {
                chars.next();
                let mut text = String::new();
                loop {
                    match chars.next() {
                        Some((_, end)) if end == c => break,
                        Some((_, other)) => text.push(other),
                        None => {
                            return Err(SyntaxError::new(position, "unterminated string"));
                        }
                    }
                }
                tokens.push(Spanned {
                    token: Token::Quoted(text),
                    position,
                });
                continue;
            }
            _ => {
                let mut word = String::new();
                while let Some(&(_, c)) = chars.peek() {
                    if is_delimiter(c) {
                        break;
                    }
                    word.push(c);
                    chars.next();
                }
                tokens.push(Spanned {
                    token: Token::Word(word.trim_end().to_string()),
                    position,
                });
                continue;
            }
        };
        chars.next();
        tokens.push(Spanned { token, position });
    }

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<Token> {
        tokenize(input)
            .unwrap()
            .into_iter()
            .map(|spanned| spanned.token)
            .collect()
    }

    #[test]
    fn call_with_tuple() {
        assert_eq!(
            kinds("in(state,(FL,TX))"),
            vec![
                Token::Word("in".to_string()),
                Token::LParen,
                Token::Word("state".to_string()),
                Token::Comma,
                Token::LParen,
                Token::Word("FL".to_string()),
                Token::Comma,
                Token::Word("TX".to_string()),
                Token::RParen,
                Token::RParen,
            ]
        );
    }

    #[test]
    fn words_keep_percent_escapes() {
        assert_eq!(
            kinds("email=a%40b.com&one()"),
            vec![
                Token::Word("email".to_string()),
                Token::Equals,
                Token::Word("a%40b.com".to_string()),
                Token::Ampersand,
                Token::Word("one".to_string()),
                Token::LParen,
                Token::RParen,
            ]
        );
    }

    #[test]
    fn quoted_strings() {
        assert_eq!(
            kinds("eq(name,'a, b')"),
            vec![
                Token::Word("eq".to_string()),
                Token::LParen,
                Token::Word("name".to_string()),
                Token::Comma,
                Token::Quoted("a, b".to_string()),
                Token::RParen,
            ]
        );
    }

    #[test]
    fn unterminated_string_is_an_error() {
        assert_eq!(
            tokenize("eq(name,'abc)"),
            Err(SyntaxError::new(8, "unterminated string"))
        );
    }
}
