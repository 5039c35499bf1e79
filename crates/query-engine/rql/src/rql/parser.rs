//! A recursive descent parser for RQL.
//!
//! ```text
//! query      := or
//! or         := and ('|' and)*
//! and        := term (('&' | ',') term)*
//! term       := '(' or ')' | call | comparison
//! comparison := word '=' arg | word '=' word '=' arg
//! call       := word '(' [arg (',' arg)*] ')'
//! arg        := call | '(' [arg (',' arg)*] ')' | sign arg | quoted | word
//! ```

use percent_encoding::percent_decode_str;

use super::error::SyntaxError;
use super::lexer::{tokenize, Spanned, Token};
use super::node::{Node, Sign, Value};
use super::values;

/// Parse RQL text into an expression tree. Blank input has no tree.
pub fn parse(input: &str) -> Result<Option<Node>, SyntaxError> {
    let tokens = tokenize(input)?;
    if tokens.is_empty() {
        return Ok(None);
    }
    let mut parser = Parser {
        tokens,
        current: 0,
        end: input.len(),
        depth: 0,
    };
    let node = parser.parse_or()?;
    match parser.peek() {
        None => Ok(Some(node)),
        Some(token) => Err(parser.error(format!("unexpected {}", describe(token)))),
    }
}

fn describe(token: &Token) -> String {
    match token {
        Token::LParen => "'('".to_string(),
        Token::RParen => "')'".to_string(),
        Token::Comma => "','".to_string(),
        Token::Ampersand => "'&'".to_string(),
        Token::Pipe => "'|'".to_string(),
        Token::Equals => "'='".to_string(),
        Token::Word(word) => format!("'{word}'"),
        Token::Quoted(text) => format!("string '{text}'"),
    }
}

fn decode(raw: &str) -> String {
    percent_decode_str(raw).decode_utf8_lossy().into_owned()
}

/// How deeply calls, tuples and groups may nest.
const MAX_DEPTH: usize = 256;

struct Parser {
    tokens: Vec<Spanned>,
    current: usize,
    end: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.peek_nth(0)
    }

    fn peek_nth(&self, n: usize) -> Option<&Token> {
        self.tokens.get(self.current + n).map(|spanned| &spanned.token)
    }

    fn position(&self) -> usize {
        self.tokens
            .get(self.current)
            .map_or(self.end, |spanned| spanned.position)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.current).map(|spanned| spanned.token.clone());
        if token.is_some() {
            self.current += 1;
        }
        token
    }

    fn check(&self, expected: &Token) -> bool {
        self.peek() == Some(expected)
    }

    fn expect(&mut self, expected: &Token) -> Result<(), SyntaxError> {
        if self.check(expected) {
            self.current += 1;
            Ok(())
        } else {
            let found = self
                .peek()
                .map_or_else(|| "end of input".to_string(), describe);
            Err(self.error(format!("expected {}, found {found}", describe(expected))))
        }
    }

    fn error(&self, message: impl Into<String>) -> SyntaxError {
        SyntaxError::new(self.position(), message)
    }

    /// Run `parse` one nesting level deeper.
    fn nested<T>(
        &mut self,
        parse: impl FnOnce(&mut Self) -> Result<T, SyntaxError>,
    ) -> Result<T, SyntaxError> {
        if self.depth >= MAX_DEPTH {
            return Err(self.error("expression is nested too deeply"));
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    fn parse_or(&mut self) -> Result<Node, SyntaxError> {
        let mut terms = vec![self.parse_and()?];
        while self.check(&Token::Pipe) {
            self.advance();
            terms.push(self.parse_and()?);
        }
        Ok(combine("or", terms))
    }

    fn parse_and(&mut self) -> Result<Node, SyntaxError> {
        let mut terms = vec![self.parse_term()?];
        while matches!(self.peek(), Some(Token::Ampersand | Token::Comma)) {
            self.advance();
            terms.push(self.parse_term()?);
        }
        Ok(combine("and", terms))
    }

    fn parse_term(&mut self) -> Result<Node, SyntaxError> {
        match (self.peek(), self.peek_nth(1)) {
            (Some(Token::LParen), _) => self.nested(|parser| {
                parser.advance();
                let node = parser.parse_or()?;
                parser.expect(&Token::RParen)?;
                Ok(node)
            }),
            (Some(Token::Word(_)), Some(Token::LParen)) => self.parse_call(),
            (Some(Token::Word(_)), Some(Token::Equals)) => self.parse_comparison(),
            (Some(token), _) => {
                let message = format!("expected a query term, found {}", describe(token));
                Err(self.error(message))
            }
            (None, _) => Err(self.error("expected a query term, found end of input")),
        }
    }

    /// `name=value` or `name=op=value`.
    fn parse_comparison(&mut self) -> Result<Node, SyntaxError> {
        let Some(Token::Word(attribute)) = self.advance() else {
            return Err(self.error("expected an attribute name"));
        };
        self.expect(&Token::Equals)?;

        let operator = match (self.peek(), self.peek_nth(1)) {
            (Some(Token::Word(operator)), Some(Token::Equals)) => {
                let operator = decode(operator);
                self.current += 2;
                operator
            }
            _ => "eq".to_string(),
        };

        let value = self.parse_arg()?;
        Ok(Node::call(operator, vec![Node::string(decode(&attribute)), value]))
    }

    fn parse_call(&mut self) -> Result<Node, SyntaxError> {
        let Some(Token::Word(name)) = self.advance() else {
            return Err(self.error("expected an operator name"));
        };
        let args = self.parse_args()?;
        Ok(Node::call(decode(&name), args))
    }

    /// A parenthesised, comma separated argument list.
    fn parse_args(&mut self) -> Result<Vec<Node>, SyntaxError> {
        self.nested(Self::parse_arg_list)
    }

    fn parse_arg_list(&mut self) -> Result<Vec<Node>, SyntaxError> {
        self.expect(&Token::LParen)?;
        let mut args = vec![];
        if self.check(&Token::RParen) {
            self.advance();
            return Ok(args);
        }
        loop {
            args.push(self.parse_arg()?);
            match self.advance() {
                Some(Token::Comma) => {}
                Some(Token::RParen) => return Ok(args),
                Some(token) => {
                    self.current -= 1;
                    let message = format!("expected ',' or ')', found {}", describe(&token));
                    return Err(self.error(message));
                }
                None => return Err(self.error("expected ',' or ')', found end of input")),
            }
        }
    }

    fn parse_arg(&mut self) -> Result<Node, SyntaxError> {
        match (self.peek().cloned(), self.peek_nth(1)) {
            (Some(Token::LParen), _) => Ok(Node::Tuple(self.parse_args()?)),
            (Some(Token::Word(sign)), Some(Token::LParen)) if sign == "-" || sign == "+" => {
                self.advance();
                let inner = Node::Tuple(self.parse_args()?);
                Ok(Node::Signed(to_sign(&sign), Box::new(inner)))
            }
            (Some(Token::Word(_)), Some(Token::LParen)) => self.parse_call(),
            (Some(Token::Quoted(text)), _) => {
                self.advance();
                Ok(Node::Value(Value::String(text)))
            }
            (Some(Token::Word(raw)), _) => {
                let position = self.position();
                self.advance();
                word_to_node(&raw).map_err(|message| SyntaxError::new(position, message))
            }
            // an empty argument slot
            (Some(Token::Comma | Token::RParen | Token::Ampersand | Token::Pipe) | None, _) => {
                Ok(Node::string(""))
            }
            (Some(token), _) => {
                let message = format!("expected a value, found {}", describe(&token));
                Err(self.error(message))
            }
        }
    }
}

fn to_sign(text: &str) -> Sign {
    if text.starts_with('-') {
        Sign::Minus
    } else {
        Sign::Plus
    }
}

/// A bare word is a sort key when it carries a sign that is not part of a number.
fn word_to_node(raw: &str) -> Result<Node, String> {
    if let Some(rest) = raw.strip_prefix(['-', '+']) {
        if !rest.is_empty() && values::parse_number(raw).is_none() {
            let inner = values::convert(&decode(rest))?;
            return Ok(Node::Signed(to_sign(raw), Box::new(Node::Value(inner))));
        }
    }
    values::convert(&decode(raw)).map(Node::Value)
}

fn combine(name: &str, mut terms: Vec<Node>) -> Node {
    if terms.len() == 1 {
        terms.remove(0)
    } else {
        Node::call(name, terms)
    }
}
