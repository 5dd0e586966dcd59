//! Context-driven tokenizer for path segments and query option values
//!
//! The caller asks for the token it expects next (`next(TokenKind::Open)`);
//! the tokenizer tries exactly that token at the current position and
//! advances only on a match. Which tokens are legal depends on where the
//! parser is, and the same text can lex differently in different places
//! (`eq` is an operator after an operand and an identifier elsewhere), so the
//! grammar drives the lexer rather than the other way round.
//!
//! Every token is a small winnow parser over the remaining input.

use octofhir_odata_diagnostics::{ErrorCode, ODataError, Span};
use octofhir_odata_types::EdmPrimitiveTypeKind;
use winnow::ascii::{Caseless, digit1};
use winnow::combinator::{alt, eof, not, opt, repeat};
use winnow::error::{ContextError, ErrMode};
use winnow::prelude::*;
use winnow::token::{none_of, one_of, take_while};

pub(crate) type Input<'a> = &'a str;
pub(crate) type PResult<O> = ModalResult<O>;

/// Which part of the URI is being lexed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LexMode {
    /// A resource path segment: no whitespace, no operators
    Path,
    /// A query option value: whitespace around operators and punctuation
    Query,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Open,
    Close,
    Comma,
    Semi,
    Slash,
    Equals,
    Colon,
    Star,

    Count,
    Ref,
    Value,
    It,
    Root,
    Levels,
    Max,
    /// `$name` of a system query option nested in `$expand`
    SystemQueryOption,

    ODataIdentifier,
    QualifiedName,
    /// `Namespace.*` selecting every operation of a schema
    NamespaceStar,
    ParameterAlias,

    Null,
    Boolean,
    String,
    Integer,
    Decimal,
    Double,
    Date,
    DateTimeOffset,
    TimeOfDay,
    Guid,
    Duration,
    Binary,
    Geography,
    Geometry,
    Enum,
    /// JSON array or object used as a complex or collection parameter value
    Json,

    Or,
    And,
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
    Has,
    In,
    Add,
    Sub,
    Mul,
    Div,
    DivBy,
    Mod,
    Not,
    Minus,
    Asc,
    Desc,

    End,
}

impl TokenKind {
    /// Literal kinds in the order they must be tried
    ///
    /// Longer forms that share a prefix with shorter ones come first
    /// (`2020-01-01T00:00Z` before `2020-01-01`, `1.5e3` before `1.5`).
    pub const LITERALS: [Self; 15] = [
        Self::Null,
        Self::Boolean,
        Self::Guid,
        Self::DateTimeOffset,
        Self::Date,
        Self::TimeOfDay,
        Self::Double,
        Self::Decimal,
        Self::Integer,
        Self::String,
        Self::Duration,
        Self::Binary,
        Self::Geography,
        Self::Geometry,
        Self::Enum,
    ];

    const fn query_only(&self) -> bool {
        matches!(
            self,
            Self::It
                | Self::Root
                | Self::Or
                | Self::And
                | Self::Eq
                | Self::Ne
                | Self::Gt
                | Self::Ge
                | Self::Lt
                | Self::Le
                | Self::Has
                | Self::In
                | Self::Add
                | Self::Sub
                | Self::Mul
                | Self::Div
                | Self::DivBy
                | Self::Mod
                | Self::Not
                | Self::Minus
                | Self::Asc
                | Self::Desc
                | Self::Levels
                | Self::Max
                | Self::SystemQueryOption
        )
    }

    /// Primitive kind a literal token denotes; integers are typed by value
    pub fn literal_kind(&self) -> Option<EdmPrimitiveTypeKind> {
        use EdmPrimitiveTypeKind as K;
        Some(match self {
            Self::Boolean => K::Boolean,
            Self::String => K::String,
            Self::Decimal => K::Decimal,
            Self::Double => K::Double,
            Self::Date => K::Date,
            Self::DateTimeOffset => K::DateTimeOffset,
            Self::TimeOfDay => K::TimeOfDay,
            Self::Guid => K::Guid,
            Self::Duration => K::Duration,
            Self::Binary => K::Binary,
            Self::Geography => K::Geography,
            Self::Geometry => K::Geometry,
            _ => return None,
        })
    }
}

/// Tokenizer over one path segment or one query option value
#[derive(Debug, Clone)]
pub struct Tokenizer<'a> {
    input: &'a str,
    pos: usize,
    mode: LexMode,
    token: Span,
}

impl<'a> Tokenizer<'a> {
    pub fn new(input: &'a str, mode: LexMode) -> Self {
        Self {
            input,
            pos: 0,
            mode,
            token: Span::point(0),
        }
    }

    pub fn mode(&self) -> LexMode {
        self.mode
    }

    pub fn input(&self) -> &'a str {
        self.input
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn rest(&self) -> &'a str {
        self.input.get(self.pos..).unwrap_or("")
    }

    pub fn save(&self) -> (usize, Span) {
        (self.pos, self.token)
    }

    pub fn restore(&mut self, state: (usize, Span)) {
        self.pos = state.0;
        self.token = state.1;
    }

    /// Try to read a token of `kind`, advancing past it on success
    pub fn next(&mut self, kind: TokenKind) -> bool {
        if self.mode == LexMode::Path && kind.query_only() {
            return false;
        }
        let rest = self.rest();
        let mut remaining = rest;
        if lex(kind, self.mode, &mut remaining).is_err() {
            return false;
        }
        let consumed = &rest[..rest.len() - remaining.len()];
        let leading = consumed.len() - consumed.trim_start_matches([' ', '\t']).len();
        let text = consumed.trim_matches([' ', '\t']);
        let start = self.pos + leading;
        self.token = Span::new(start, start + text.len());
        self.pos += consumed.len();
        true
    }

    /// Check for a token without consuming it
    pub fn peek(&mut self, kind: TokenKind) -> bool {
        let state = self.save();
        let found = self.next(kind);
        self.restore(state);
        found
    }

    /// Read any primitive literal, returning which kind matched
    pub fn next_literal(&mut self) -> Option<TokenKind> {
        TokenKind::LITERALS.into_iter().find(|kind| self.next(*kind))
    }

    /// Text of the last token read
    pub fn text(&self) -> &'a str {
        self.token.slice(self.input)
    }

    /// Span of the last token read
    pub fn span(&self) -> Span {
        self.token
    }

    /// Consume text up to the next `;` or unbalanced `)` at nesting level zero
    ///
    /// Used for values that have no grammar of their own here, such as
    /// `$search` inside `$expand`. Quoted strings are skipped as a whole.
    pub fn next_raw(&mut self) -> &'a str {
        let rest = self.rest();
        let mut depth = 0usize;
        let mut quoted = false;
        let mut end = rest.len();
        for (i, c) in rest.char_indices() {
            match c {
                '\'' | '"' => quoted = !quoted,
                '(' if !quoted => depth += 1,
                ')' if !quoted && depth == 0 => {
                    end = i;
                    break;
                }
                ')' if !quoted => depth -= 1,
                ';' if !quoted && depth == 0 => {
                    end = i;
                    break;
                }
                _ => {}
            }
        }
        self.token = Span::new(self.pos, self.pos + end);
        self.pos += end;
        self.text()
    }

    /// Syntax error at the current position
    pub fn error(&self, code: ErrorCode, message: impl Into<String>) -> ODataError {
        let end = self.input.len().min(self.pos + self.rest().chars().next().map_or(0, char::len_utf8));
        ODataError::syntax_at(code, message, self.input, Span::new(self.pos, end))
    }

    /// Semantic error attributed to `span`
    pub fn semantic_error(&self, code: ErrorCode, message: impl Into<String>, span: Span) -> ODataError {
        ODataError::semantic_at(code, message, self.input, span)
    }
}

fn lex(kind: TokenKind, mode: LexMode, input: &mut Input<'_>) -> PResult<()> {
    let query = mode == LexMode::Query;
    match kind {
        TokenKind::Open => punct(input, "(", query, true),
        TokenKind::Close => punct(input, ")", query, false),
        TokenKind::Comma => punct(input, ",", query, true),
        TokenKind::Semi => punct(input, ";", query, true),
        TokenKind::Colon => punct(input, ":", query, true),
        TokenKind::Equals => punct(input, "=", query, true),
        TokenKind::Slash => lit("/").void().parse_next(input),
        TokenKind::Star => lit("*").void().parse_next(input),

        TokenKind::Count => keyword("$count").void().parse_next(input),
        TokenKind::Ref => keyword("$ref").void().parse_next(input),
        TokenKind::Value => keyword("$value").void().parse_next(input),
        TokenKind::It => keyword("$it").void().parse_next(input),
        TokenKind::Root => keyword("$root").void().parse_next(input),
        TokenKind::Levels => keyword("$levels").void().parse_next(input),
        TokenKind::Max => keyword("max").void().parse_next(input),
        TokenKind::SystemQueryOption => ("$", identifier).void().parse_next(input),

        TokenKind::ODataIdentifier => (identifier, not(".")).void().parse_next(input),
        TokenKind::QualifiedName => qualified_name.void().parse_next(input),
        TokenKind::NamespaceStar => (
            identifier,
            repeat::<_, _, (), _, _>(0.., (".", identifier)),
            ".*",
        )
            .void()
            .parse_next(input),
        TokenKind::ParameterAlias => ("@", identifier).void().parse_next(input),

        TokenKind::Null => keyword("null").void().parse_next(input),
        TokenKind::Boolean => alt((keyword(Caseless("true")), keyword(Caseless("false"))))
            .void()
            .parse_next(input),
        TokenKind::String => quoted.void().parse_next(input),
        TokenKind::Integer => (sign, digit1, not(one_of(['.', 'e', 'E', ':', '-'])))
            .void()
            .parse_next(input),
        TokenKind::Decimal => (sign, digit1, ".", digit1, not(one_of(['e', 'E'])))
            .void()
            .parse_next(input),
        TokenKind::Double => double.void().parse_next(input),
        TokenKind::Date => (date, not(one_of(['T', 't']))).void().parse_next(input),
        TokenKind::DateTimeOffset => (date, one_of(['T', 't']), time_of_day, offset)
            .void()
            .parse_next(input),
        TokenKind::TimeOfDay => time_of_day.void().parse_next(input),
        TokenKind::Guid => guid.void().parse_next(input),
        TokenKind::Duration => prefixed(input, "duration"),
        TokenKind::Binary => prefixed(input, "binary"),
        TokenKind::Geography => prefixed(input, "geography"),
        TokenKind::Geometry => prefixed(input, "geometry"),
        TokenKind::Enum => (qualified_name, quoted).void().parse_next(input),
        TokenKind::Json => json(input),

        TokenKind::Or => binary_operator(input, "or"),
        TokenKind::And => binary_operator(input, "and"),
        TokenKind::Eq => binary_operator(input, "eq"),
        TokenKind::Ne => binary_operator(input, "ne"),
        TokenKind::Gt => binary_operator(input, "gt"),
        TokenKind::Ge => binary_operator(input, "ge"),
        TokenKind::Lt => binary_operator(input, "lt"),
        TokenKind::Le => binary_operator(input, "le"),
        TokenKind::Has => binary_operator(input, "has"),
        TokenKind::In => binary_operator(input, "in"),
        TokenKind::Add => binary_operator(input, "add"),
        TokenKind::Sub => binary_operator(input, "sub"),
        TokenKind::Mul => binary_operator(input, "mul"),
        TokenKind::Div => binary_operator(input, "div"),
        TokenKind::DivBy => binary_operator(input, "divby"),
        TokenKind::Mod => binary_operator(input, "mod"),
        TokenKind::Not => (keyword("not"), ws1).void().parse_next(input),
        TokenKind::Minus => (lit("-"), not(digit1), ws).void().parse_next(input),
        TokenKind::Asc => (ws1, keyword("asc")).void().parse_next(input),
        TokenKind::Desc => (ws1, keyword("desc")).void().parse_next(input),

        TokenKind::End if query => (ws, eof).void().parse_next(input),
        TokenKind::End => eof.void().parse_next(input),
    }
}

fn lit<'a>(text: &'static str) -> impl Parser<Input<'a>, &'a str, ErrMode<ContextError>> {
    text
}

/// Optional whitespace
fn ws(input: &mut Input<'_>) -> PResult<()> {
    take_while(0.., [' ', '\t']).void().parse_next(input)
}

fn ws1(input: &mut Input<'_>) -> PResult<()> {
    take_while(1.., [' ', '\t']).void().parse_next(input)
}

fn is_identifier_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// A word that does not run on into a longer identifier
fn keyword<'a, P>(word: P) -> impl Parser<Input<'a>, &'a str, ErrMode<ContextError>>
where
    P: Parser<Input<'a>, &'a str, ErrMode<ContextError>>,
{
    (word, not(one_of(is_identifier_char))).map(|(w, ())| w)
}

fn punct(input: &mut Input<'_>, text: &'static str, query: bool, trailing: bool) -> PResult<()> {
    if !query {
        return lit(text).void().parse_next(input);
    }
    (ws, lit(text)).void().parse_next(input)?;
    if trailing {
        ws.parse_next(input)?;
    }
    Ok(())
}

fn binary_operator(input: &mut Input<'_>, word: &'static str) -> PResult<()> {
    (ws1, keyword(word), ws1).void().parse_next(input)
}

fn identifier<'a>(input: &mut Input<'a>) -> PResult<&'a str> {
    (
        one_of(|c: char| c.is_alphabetic() || c == '_'),
        take_while(0..=127, is_identifier_char),
    )
        .take()
        .parse_next(input)
}

fn qualified_name<'a>(input: &mut Input<'a>) -> PResult<&'a str> {
    (identifier, repeat::<_, _, (), _, _>(1.., (".", identifier)))
        .take()
        .parse_next(input)
}

fn quoted<'a>(input: &mut Input<'a>) -> PResult<&'a str> {
    (
        "'",
        repeat::<_, _, (), _, _>(0.., alt(("''".void(), none_of('\'').void()))),
        "'",
    )
        .take()
        .parse_next(input)
}

fn prefixed(input: &mut Input<'_>, prefix: &'static str) -> PResult<()> {
    (Caseless(prefix), quoted).void().parse_next(input)
}

fn sign(input: &mut Input<'_>) -> PResult<()> {
    opt(one_of(['+', '-'])).void().parse_next(input)
}

fn double(input: &mut Input<'_>) -> PResult<()> {
    alt((
        keyword("NaN").void(),
        keyword("-INF").void(),
        keyword("INF").void(),
        (
            sign,
            digit1,
            opt((".", digit1)),
            one_of(['e', 'E']),
            sign,
            digit1,
        )
            .void(),
    ))
    .parse_next(input)
}

fn digits<'a>(count: usize) -> impl Parser<Input<'a>, &'a str, ErrMode<ContextError>> {
    take_while(count, |c: char| c.is_ascii_digit())
}

fn date(input: &mut Input<'_>) -> PResult<()> {
    (
        opt("-"),
        take_while(4.., |c: char| c.is_ascii_digit()),
        "-",
        digits(2),
        "-",
        digits(2),
    )
        .void()
        .parse_next(input)
}

fn time_of_day(input: &mut Input<'_>) -> PResult<()> {
    (digits(2), ":", digits(2), opt((":", digits(2), opt((".", digit1)))))
        .void()
        .parse_next(input)
}

fn offset(input: &mut Input<'_>) -> PResult<()> {
    alt((
        one_of(['Z', 'z']).void(),
        (one_of(['+', '-']), digits(2), ":", digits(2)).void(),
    ))
    .parse_next(input)
}

fn guid(input: &mut Input<'_>) -> PResult<()> {
    let hex = |count: usize| take_while(count, |c: char| c.is_ascii_hexdigit());
    (
        hex(8),
        "-",
        hex(4),
        "-",
        hex(4),
        "-",
        hex(4),
        "-",
        hex(12),
        not(one_of(is_identifier_char)),
    )
        .void()
        .parse_next(input)
}

/// A balanced JSON array or object; content is validated by the consumer
fn json(input: &mut Input<'_>) -> PResult<()> {
    let text = *input;
    let (open, close) = match text.chars().next() {
        Some('[') => ('[', ']'),
        Some('{') => ('{', '}'),
        _ => return Err(ErrMode::Backtrack(ContextError::new())),
    };
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (i, c) in text.char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            c if c == open => depth += 1,
            c if c == close => {
                depth -= 1;
                if depth == 0 {
                    *input = &text[i + c.len_utf8()..];
                    return Ok(());
                }
            }
            _ => {}
        }
    }
    Err(ErrMode::Backtrack(ContextError::new()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn literal_of(text: &str) -> Option<(TokenKind, String)> {
        let mut tokenizer = Tokenizer::new(text, LexMode::Query);
        let kind = tokenizer.next_literal()?;
        Some((kind, tokenizer.text().to_string()))
    }

    #[rstest]
    #[case("null", TokenKind::Null)]
    #[case("true", TokenKind::Boolean)]
    #[case("FALSE", TokenKind::Boolean)]
    #[case("42", TokenKind::Integer)]
    #[case("-32768", TokenKind::Integer)]
    #[case("1.5", TokenKind::Decimal)]
    #[case("1.5e3", TokenKind::Double)]
    #[case("-INF", TokenKind::Double)]
    #[case("NaN", TokenKind::Double)]
    #[case("2012-12-03", TokenKind::Date)]
    #[case("2012-12-03T07:16:23Z", TokenKind::DateTimeOffset)]
    #[case("2012-12-03T07:16:23.5+01:00", TokenKind::DateTimeOffset)]
    #[case("07:59:59.999", TokenKind::TimeOfDay)]
    #[case("01234567-89ab-cdef-0123-456789abcdef", TokenKind::Guid)]
    #[case("'it''s'", TokenKind::String)]
    #[case("duration'P1DT2H'", TokenKind::Duration)]
    #[case("binary'AQID'", TokenKind::Binary)]
    #[case("geography'SRID=4326;Point(1 2)'", TokenKind::Geography)]
    #[case("ns.ENString'String1,String2'", TokenKind::Enum)]
    fn test_literal_kinds(#[case] text: &str, #[case] expected: TokenKind) {
        assert_eq!(literal_of(text), Some((expected, text.to_string())));
    }

    #[test]
    fn test_unterminated_string_is_not_a_literal() {
        assert_eq!(literal_of("'abc"), None);
    }

    #[test]
    fn test_operators_need_whitespace() {
        let mut tokenizer = Tokenizer::new("PropertyInt16 eq 1", LexMode::Query);
        assert!(tokenizer.next(TokenKind::ODataIdentifier));
        assert!(!tokenizer.peek(TokenKind::Ne));
        assert!(tokenizer.next(TokenKind::Eq));
        assert_eq!(tokenizer.text(), "eq");
        assert_eq!(tokenizer.span(), Span::new(14, 16));
        assert!(tokenizer.next(TokenKind::Integer));
        assert!(tokenizer.next(TokenKind::End));

        let mut glued = Tokenizer::new("equals", LexMode::Query);
        assert!(!glued.next(TokenKind::Eq));
        assert!(glued.next(TokenKind::ODataIdentifier));
    }

    #[test]
    fn test_path_mode_rejects_operators_and_whitespace() {
        let mut tokenizer = Tokenizer::new("ES( 1)", LexMode::Path);
        assert!(!tokenizer.next(TokenKind::It));
        assert!(tokenizer.next(TokenKind::ODataIdentifier));
        assert!(tokenizer.next(TokenKind::Open));
        assert!(tokenizer.next_literal().is_none());
    }

    #[test]
    fn test_identifier_versus_qualified_name() {
        let mut tokenizer = Tokenizer::new("ns.ETBase/Prop", LexMode::Path);
        assert!(!tokenizer.peek(TokenKind::ODataIdentifier));
        assert!(tokenizer.next(TokenKind::QualifiedName));
        assert_eq!(tokenizer.text(), "ns.ETBase");
        assert!(tokenizer.next(TokenKind::Slash));
        assert!(tokenizer.next(TokenKind::ODataIdentifier));
        assert!(tokenizer.next(TokenKind::End));
    }

    #[test]
    fn test_namespace_star() {
        let mut tokenizer = Tokenizer::new("olingo.odata.test1.*", LexMode::Query);
        assert!(tokenizer.next(TokenKind::NamespaceStar));
        assert_eq!(tokenizer.text(), "olingo.odata.test1.*");
        assert!(tokenizer.next(TokenKind::End));
    }

    #[test]
    fn test_raw_value_stops_at_option_separator() {
        let mut tokenizer = Tokenizer::new("blue (green;red);$top=1)", LexMode::Query);
        assert_eq!(tokenizer.next_raw(), "blue (green;red)");
        assert!(tokenizer.next(TokenKind::Semi));
    }

    #[test]
    fn test_json_value() {
        let mut tokenizer = Tokenizer::new(r#"[{"a":"]"},2])"#, LexMode::Path);
        assert!(tokenizer.next(TokenKind::Json));
        assert_eq!(tokenizer.text(), r#"[{"a":"]"},2]"#);
        assert!(tokenizer.next(TokenKind::Close));
    }
}
