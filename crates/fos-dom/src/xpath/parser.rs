//! XPath lexer and recursive-descent parser

use super::XPathError;

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Slash,
    DoubleSlash,
    LBracket,
    RBracket,
    LParen,
    RParen,
    At,
    Comma,
    Dot,
    DotDot,
    Pipe,
    ColonColon,
    /// `*` as a name test
    Star,
    Name(String),
    Literal(String),
    Number(f64),
    Op(BinaryOp),
    Minus,
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Or,
    And,
    Eq,
    Neq,
    Lt,
    Le,
    Gt,
    Ge,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

/// Location step axis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Child,
    Descendant,
    DescendantOrSelf,
    SelfAxis,
    Parent,
    Ancestor,
    AncestorOrSelf,
    FollowingSibling,
    PrecedingSibling,
    Following,
    Preceding,
    Attribute,
}

impl Axis {
    fn parse(name: &str) -> Option<Self> {
        Some(match name {
            "child" => Self::Child,
            "descendant" => Self::Descendant,
            "descendant-or-self" => Self::DescendantOrSelf,
            "self" => Self::SelfAxis,
            "parent" => Self::Parent,
            "ancestor" => Self::Ancestor,
            "ancestor-or-self" => Self::AncestorOrSelf,
            "following-sibling" => Self::FollowingSibling,
            "preceding-sibling" => Self::PrecedingSibling,
            "following" => Self::Following,
            "preceding" => Self::Preceding,
            "attribute" => Self::Attribute,
            _ => return None,
        })
    }

    /// Reverse axes number their proximity positions backwards
    pub fn is_reverse(self) -> bool {
        matches!(
            self,
            Self::Parent | Self::Ancestor | Self::AncestorOrSelf | Self::PrecedingSibling | Self::Preceding
        )
    }
}

/// Node test of a step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeTest {
    Name(String),
    Wildcard,
    Text,
    Comment,
    AnyNode,
}

/// A single location step
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub axis: Axis,
    pub test: NodeTest,
    pub predicates: Vec<Expr>,
}

impl Step {
    fn descendant_or_self() -> Self {
        Self {
            axis: Axis::DescendantOrSelf,
            test: NodeTest::AnyNode,
            predicates: Vec::new(),
        }
    }
}

/// Parsed expression tree
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    Negate(Box<Expr>),
    Union(Box<Expr>, Box<Expr>),
    Path { absolute: bool, steps: Vec<Step> },
    Filter {
        primary: Box<Expr>,
        predicates: Vec<Expr>,
        steps: Vec<Step>,
    },
    Literal(String),
    Number(f64),
    Function(String, Vec<Expr>),
}

/// Deepest expression tree the parser builds. Parentheses, predicates,
/// function arguments, unary minus and each chained operator add a level.
const MAX_NESTING: usize = 256;

/// Parse an expression string
pub fn parse(input: &str) -> Result<Expr, XPathError> {
    let tokens = tokenize(input)?;
    if tokens.is_empty() {
        return Err(XPathError::Syntax {
            position: 0,
            message: "empty expression".into(),
        });
    }
    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
    };
    let expr = parser.parse_or()?;
    if parser.pos < parser.tokens.len() {
        return Err(parser.error("unexpected token"));
    }
    Ok(expr)
}

fn tokenize(input: &str) -> Result<Vec<Token>, XPathError> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens: Vec<Token> = Vec::new();
    let mut i = 0;

    // An operator may follow only an operand-ending token
    let operand_ended = |tokens: &[Token]| {
        matches!(
            tokens.last(),
            Some(
                Token::Name(_)
                    | Token::Literal(_)
                    | Token::Number(_)
                    | Token::RParen
                    | Token::RBracket
                    | Token::Star
                    | Token::Dot
                    | Token::DotDot
            )
        )
    };

    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();
        match c {
            ' ' | '\t' | '\n' | '\r' => {
                i += 1;
            }
            '/' => {
                if next == Some('/') {
                    tokens.push(Token::DoubleSlash);
                    i += 2;
                } else {
                    tokens.push(Token::Slash);
                    i += 1;
                }
            }
            '[' => {
                tokens.push(Token::LBracket);
                i += 1;
            }
            ']' => {
                tokens.push(Token::RBracket);
                i += 1;
            }
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            '@' => {
                tokens.push(Token::At);
                i += 1;
            }
            ',' => {
                tokens.push(Token::Comma);
                i += 1;
            }
            '|' => {
                tokens.push(Token::Pipe);
                i += 1;
            }
            '+' => {
                tokens.push(Token::Op(BinaryOp::Add));
                i += 1;
            }
            '-' => {
                tokens.push(Token::Minus);
                i += 1;
            }
            '=' => {
                tokens.push(Token::Op(BinaryOp::Eq));
                i += 1;
            }
            '!' if next == Some('=') => {
                tokens.push(Token::Op(BinaryOp::Neq));
                i += 2;
            }
            '<' | '>' => {
                let op = match (c, next == Some('=')) {
                    ('<', true) => BinaryOp::Le,
                    ('<', false) => BinaryOp::Lt,
                    (_, true) => BinaryOp::Ge,
                    (_, false) => BinaryOp::Gt,
                };
                tokens.push(Token::Op(op));
                i += if next == Some('=') { 2 } else { 1 };
            }
            ':' if next == Some(':') => {
                tokens.push(Token::ColonColon);
                i += 2;
            }
            '*' => {
                if operand_ended(&tokens) {
                    tokens.push(Token::Op(BinaryOp::Mul));
                } else {
                    tokens.push(Token::Star);
                }
                i += 1;
            }
            '"' | '\'' => {
                let close = chars[i + 1..]
                    .iter()
                    .position(|&ch| ch == c)
                    .ok_or(XPathError::Syntax {
                        position: i,
                        message: "unterminated string literal".into(),
                    })?;
                tokens.push(Token::Literal(chars[i + 1..i + 1 + close].iter().collect()));
                i += close + 2;
            }
            '.' if next == Some('.') => {
                tokens.push(Token::DotDot);
                i += 2;
            }
            '.' if !next.is_some_and(|n| n.is_ascii_digit()) => {
                tokens.push(Token::Dot);
                i += 1;
            }
            c if c.is_ascii_digit() || c == '.' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                let text: String = chars[start..i].iter().collect();
                let value = text.parse::<f64>().map_err(|_| XPathError::Syntax {
                    position: start,
                    message: format!("invalid number '{text}'"),
                })?;
                tokens.push(Token::Number(value));
            }
            c if c.is_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len() {
                    let ch = chars[i];
                    let is_name = ch.is_alphanumeric() || matches!(ch, '_' | '-' | '.');
                    // A single ':' is a namespace prefix separator; '::' is an axis
                    let is_prefix = ch == ':'
                        && chars.get(i + 1).is_some_and(|n| n.is_alphabetic() || *n == '*');
                    if !(is_name || is_prefix) {
                        break;
                    }
                    i += 1;
                }
                let name: String = chars[start..i].iter().collect();
                let op = match name.as_str() {
                    "and" => Some(BinaryOp::And),
                    "or" => Some(BinaryOp::Or),
                    "div" => Some(BinaryOp::Div),
                    "mod" => Some(BinaryOp::Mod),
                    _ => None,
                };
                match op {
                    Some(op) if operand_ended(&tokens) => tokens.push(Token::Op(op)),
                    _ => tokens.push(Token::Name(name)),
                }
            }
            other => {
                return Err(XPathError::Syntax {
                    position: i,
                    message: format!("unexpected character '{other}'"),
                });
            }
        }
    }
    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_at(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.pos + offset)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.peek() == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: &Token, what: &str) -> Result<(), XPathError> {
        if self.eat(token) {
            Ok(())
        } else {
            Err(self.error(&format!("expected {what}")))
        }
    }

    fn error(&self, message: &str) -> XPathError {
        XPathError::Syntax {
            position: self.pos,
            message: message.to_string(),
        }
    }

    fn descend(&mut self) -> Result<(), XPathError> {
        self.depth += 1;
        if self.depth > MAX_NESTING {
            return Err(self.error("expression nested too deeply"));
        }
        Ok(())
    }

    fn eat_op(&mut self, ops: &[BinaryOp]) -> Option<BinaryOp> {
        match self.peek() {
            Some(Token::Op(op)) if ops.contains(op) => {
                let op = *op;
                self.pos += 1;
                Some(op)
            }
            _ => None,
        }
    }

    fn binary_level(
        &mut self,
        ops: &[BinaryOp],
        next: fn(&mut Self) -> Result<Expr, XPathError>,
    ) -> Result<Expr, XPathError> {
        let mut left = next(self)?;
        let mut chained = 0;
        while let Some(op) = self.eat_op(ops) {
            self.descend()?;
            chained += 1;
            let right = next(self)?;
            left = Expr::Binary(op, Box::new(left), Box::new(right));
        }
        self.depth -= chained;
        Ok(left)
    }

    fn parse_or(&mut self) -> Result<Expr, XPathError> {
        self.descend()?;
        let expr = self.binary_level(&[BinaryOp::Or], Self::parse_and)?;
        self.depth -= 1;
        Ok(expr)
    }

    fn parse_and(&mut self) -> Result<Expr, XPathError> {
        self.binary_level(&[BinaryOp::And], Self::parse_equality)
    }

    fn parse_equality(&mut self) -> Result<Expr, XPathError> {
        self.binary_level(&[BinaryOp::Eq, BinaryOp::Neq], Self::parse_relational)
    }

    fn parse_relational(&mut self) -> Result<Expr, XPathError> {
        self.binary_level(
            &[BinaryOp::Lt, BinaryOp::Le, BinaryOp::Gt, BinaryOp::Ge],
            Self::parse_additive,
        )
    }

    fn parse_additive(&mut self) -> Result<Expr, XPathError> {
        let mut left = self.parse_multiplicative()?;
        let mut chained = 0;
        loop {
            let op = if self.eat(&Token::Minus) {
                BinaryOp::Sub
            } else if let Some(op) = self.eat_op(&[BinaryOp::Add]) {
                op
            } else {
                break;
            };
            self.descend()?;
            chained += 1;
            let right = self.parse_multiplicative()?;
            left = Expr::Binary(op, Box::new(left), Box::new(right));
        }
        self.depth -= chained;
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, XPathError> {
        self.binary_level(
            &[BinaryOp::Mul, BinaryOp::Div, BinaryOp::Mod],
            Self::parse_unary,
        )
    }

    fn parse_unary(&mut self) -> Result<Expr, XPathError> {
        if self.eat(&Token::Minus) {
            self.descend()?;
            let operand = self.parse_unary()?;
            self.depth -= 1;
            return Ok(Expr::Negate(Box::new(operand)));
        }
        self.parse_union()
    }

    fn parse_union(&mut self) -> Result<Expr, XPathError> {
        let mut left = self.parse_path()?;
        let mut chained = 0;
        while self.eat(&Token::Pipe) {
            self.descend()?;
            chained += 1;
            let right = self.parse_path()?;
            left = Expr::Union(Box::new(left), Box::new(right));
        }
        self.depth -= chained;
        Ok(left)
    }

    fn starts_primary(&self) -> bool {
        match self.peek() {
            Some(Token::LParen | Token::Literal(_) | Token::Number(_)) => true,
            Some(Token::Name(name)) => {
                self.peek_at(1) == Some(&Token::LParen)
                    && !matches!(name.as_str(), "text" | "node" | "comment" | "processing-instruction")
            }
            _ => false,
        }
    }

    fn parse_path(&mut self) -> Result<Expr, XPathError> {
        if self.starts_primary() {
            let primary = self.parse_primary()?;
            let predicates = self.parse_predicates()?;
            let mut steps = Vec::new();
            loop {
                if self.eat(&Token::Slash) {
                    steps.push(self.parse_step()?);
                } else if self.eat(&Token::DoubleSlash) {
                    steps.push(Step::descendant_or_self());
                    steps.push(self.parse_step()?);
                } else {
                    break;
                }
            }
            if predicates.is_empty() && steps.is_empty() {
                return Ok(primary);
            }
            return Ok(Expr::Filter {
                primary: Box::new(primary),
                predicates,
                steps,
            });
        }
        self.parse_location_path()
    }

    fn parse_location_path(&mut self) -> Result<Expr, XPathError> {
        let mut steps = Vec::new();
        let absolute = match self.peek() {
            Some(Token::Slash) => {
                self.pos += 1;
                if !self.starts_step() {
                    return Ok(Expr::Path { absolute: true, steps });
                }
                true
            }
            Some(Token::DoubleSlash) => {
                self.pos += 1;
                steps.push(Step::descendant_or_self());
                true
            }
            _ => false,
        };

        steps.push(self.parse_step()?);
        loop {
            if self.eat(&Token::Slash) {
                steps.push(self.parse_step()?);
            } else if self.eat(&Token::DoubleSlash) {
                steps.push(Step::descendant_or_self());
                steps.push(self.parse_step()?);
            } else {
                break;
            }
        }
        Ok(Expr::Path { absolute, steps })
    }

    fn starts_step(&self) -> bool {
        matches!(
            self.peek(),
            Some(Token::Name(_) | Token::Star | Token::At | Token::Dot | Token::DotDot)
        )
    }

    fn parse_step(&mut self) -> Result<Step, XPathError> {
        if self.eat(&Token::Dot) {
            return Ok(Step {
                axis: Axis::SelfAxis,
                test: NodeTest::AnyNode,
                predicates: self.parse_predicates()?,
            });
        }
        if self.eat(&Token::DotDot) {
            return Ok(Step {
                axis: Axis::Parent,
                test: NodeTest::AnyNode,
                predicates: self.parse_predicates()?,
            });
        }

        let axis = if self.eat(&Token::At) {
            Axis::Attribute
        } else if let (Some(Token::Name(name)), Some(Token::ColonColon)) = (self.peek(), self.peek_at(1)) {
            let axis = Axis::parse(name).ok_or_else(|| self.error(&format!("unknown axis '{name}'")))?;
            self.pos += 2;
            axis
        } else {
            Axis::Child
        };

        let test = match self.advance() {
            Some(Token::Star) => NodeTest::Wildcard,
            Some(Token::Name(name)) => {
                if self.peek() == Some(&Token::LParen) {
                    self.pos += 1;
                    self.expect(&Token::RParen, "')'")?;
                    match name.as_str() {
                        "text" => NodeTest::Text,
                        "node" => NodeTest::AnyNode,
                        "comment" => NodeTest::Comment,
                        _ => return Err(self.error(&format!("unsupported node test '{name}()'"))),
                    }
                } else {
                    NodeTest::Name(name)
                }
            }
            _ => {
                self.pos = self.pos.saturating_sub(1);
                return Err(self.error("expected a node test"));
            }
        };

        Ok(Step {
            axis,
            test,
            predicates: self.parse_predicates()?,
        })
    }

    fn parse_predicates(&mut self) -> Result<Vec<Expr>, XPathError> {
        let mut predicates = Vec::new();
        while self.eat(&Token::LBracket) {
            predicates.push(self.parse_or()?);
            self.expect(&Token::RBracket, "']'")?;
        }
        Ok(predicates)
    }

    fn parse_primary(&mut self) -> Result<Expr, XPathError> {
        match self.advance() {
            Some(Token::LParen) => {
                let expr = self.parse_or()?;
                self.expect(&Token::RParen, "')'")?;
                Ok(expr)
            }
            Some(Token::Literal(s)) => Ok(Expr::Literal(s)),
            Some(Token::Number(n)) => Ok(Expr::Number(n)),
            Some(Token::Name(name)) => {
                self.expect(&Token::LParen, "'('")?;
                let mut args = Vec::new();
                if !self.eat(&Token::RParen) {
                    loop {
                        args.push(self.parse_or()?);
                        if self.eat(&Token::Comma) {
                            continue;
                        }
                        self.expect(&Token::RParen, "')'")?;
                        break;
                    }
                }
                Ok(Expr::Function(name, args))
            }
            _ => Err(self.error("expected an expression")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_descendant_shorthand() {
        let expr = parse("//p").unwrap();
        let Expr::Path { absolute, steps } = expr else {
            panic!("expected path");
        };
        assert!(absolute);
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0].axis, Axis::DescendantOrSelf);
        assert_eq!(steps[1].test, NodeTest::Name("p".into()));
    }

    #[test]
    fn test_parse_predicate_and_function() {
        let expr = parse("//div[@class='x' and contains(., 'y')][2]").unwrap();
        let Expr::Path { steps, .. } = expr else {
            panic!("expected path");
        };
        assert_eq!(steps[1].predicates.len(), 2);
    }

    #[test]
    fn test_star_disambiguation() {
        assert!(parse("//*").is_ok());
        assert!(matches!(parse("2 * 3").unwrap(), Expr::Binary(BinaryOp::Mul, _, _)));
    }

    #[test]
    fn test_syntax_errors() {
        assert!(parse("//p[").is_err());
        assert!(parse("").is_err());
        assert!(parse("//p[@id='x]").is_err());
        assert!(parse("bogus::p").is_err());
        assert!(parse("//p)").is_err());
    }

    #[test]
    fn test_nesting_limit() {
        let nested = |n: usize| format!("{}//p{}", "(".repeat(n), ")".repeat(n));
        assert!(parse(&nested(100)).is_ok());
        let err = parse(&nested(5000)).unwrap_err();
        assert!(matches!(err, XPathError::Syntax { ref message, .. } if message.contains("nested too deeply")));

        assert!(parse(&format!("{}1", "-".repeat(5000))).is_err());
        assert!(parse(&format!("//p{}", "[1]".repeat(5000))).is_ok());
        assert!(parse(&format!("{}1{}", "//p[".repeat(5000), "]".repeat(5000))).is_err());
        assert!(parse(&format!("1{}", "+1".repeat(5000))).is_err());
        assert!(parse(&format!("//p{}", "|//p".repeat(50))).is_ok());
    }
}
