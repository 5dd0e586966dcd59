//! Common expression parser for `$filter`, `$orderby` and lambda predicates
//!
//! Precedence climbing over the query-mode tokenizer, lowest first:
//!
//! | Level | Operators                        |
//! |-------|----------------------------------|
//! | 1     | `or`                             |
//! | 2     | `and`                            |
//! | 3     | `eq`, `ne`                       |
//! | 4     | `gt`, `ge`, `lt`, `le`           |
//! | 5     | `add`, `sub`                     |
//! | 6     | `mul`, `div`, `divby`, `mod`     |
//! | 7     | unary `-`, `not`                 |
//! | 8     | `has`, `in` after a primary      |
//!
//! Every node is typed against the EDM as soon as it is built, so a type
//! error is reported at the operator or member that caused it.

use crate::context::ParseContext;
use crate::lexer::{LexMode, TokenKind, Tokenizer};
use crate::member::{
    apply_type_cast, attach_keys, bound_function, cast_target, check_cast, member_segment,
    operation_result, qualified, unknown_type,
};
use crate::methods::check_call;
use crate::typing::{binary_type, unary_type};
use log::trace;
use octofhir_odata_ast::{
    AliasValue, BinaryOperator, Expression, ExpressionKind, FunctionParameter, Lambda, Literal,
    MethodKind, UnaryOperator, UriResource, UriResourceKind,
};
use octofhir_odata_diagnostics::{
    ODATA0003, ODATA0005, ODATA0006, ODATA0007, ODATA0016, ODATA0019, ODATA0100, ODATA0101,
    ODATA0103, ODATA0106, ODATA0109, ODATA0113, ODATA0114, ODATA0116, ODATA0117, ODATA0118,
    ODATA0119, ODATA0120, ODATA0127, ODataError, Result, Span,
};
use octofhir_odata_edm::{EdmOperation, EdmType};
use octofhir_odata_types::{EdmPrimitiveTypeKind, Facets, FullQualifiedName};
use std::sync::Arc;

const LEVEL_OPERATORS: [&[(TokenKind, BinaryOperator)]; 6] = [
    &[(TokenKind::Or, BinaryOperator::Or)],
    &[(TokenKind::And, BinaryOperator::And)],
    &[(TokenKind::Eq, BinaryOperator::Eq), (TokenKind::Ne, BinaryOperator::Ne)],
    &[
        (TokenKind::Gt, BinaryOperator::Gt),
        (TokenKind::Ge, BinaryOperator::Ge),
        (TokenKind::Lt, BinaryOperator::Lt),
        (TokenKind::Le, BinaryOperator::Le),
    ],
    &[(TokenKind::Add, BinaryOperator::Add), (TokenKind::Sub, BinaryOperator::Sub)],
    &[
        (TokenKind::Mul, BinaryOperator::Mul),
        (TokenKind::Div, BinaryOperator::Div),
        (TokenKind::DivBy, BinaryOperator::DivBy),
        (TokenKind::Mod, BinaryOperator::Mod),
    ],
];

/// Lambda variable in scope
#[derive(Debug, Clone)]
struct Variable {
    name: String,
    type_: Option<EdmType>,
}

/// How a member path starts
enum Start {
    It,
    Root,
    Identifier,
    Qualified,
}

pub(crate) struct ExpressionParser<'c, 'e> {
    ctx: &'c ParseContext<'e>,
    /// Element type `$it` refers to
    it: Option<EdmType>,
    variables: Vec<Variable>,
    depth: u32,
}

impl<'c, 'e> ExpressionParser<'c, 'e> {
    pub(crate) fn new(ctx: &'c ParseContext<'e>, it: Option<EdmType>) -> Self {
        Self {
            ctx,
            it,
            variables: Vec::new(),
            depth: 0,
        }
    }

    /// Parse a whole query option value as one expression
    pub(crate) fn parse_all(&mut self, text: &str) -> Result<Expression> {
        let mut tok = Tokenizer::new(text, LexMode::Query);
        let expression = self.parse(&mut tok)?;
        if !tok.next(TokenKind::End) {
            return Err(tok.error(
                ODATA0019,
                format!("Unexpected '{}' after the expression", tok.rest().trim_start()),
            ));
        }
        Ok(expression)
    }

    /// Parse a Boolean expression such as a `$filter` value
    pub(crate) fn parse_predicate(&mut self, tok: &mut Tokenizer<'_>) -> Result<Expression> {
        let expression = self.parse(tok)?;
        require_predicate(tok, &expression)?;
        Ok(expression)
    }

    pub(crate) fn parse(&mut self, tok: &mut Tokenizer<'_>) -> Result<Expression> {
        self.parse_level(tok, 0)
    }

    fn parse_level(&mut self, tok: &mut Tokenizer<'_>, level: usize) -> Result<Expression> {
        let Some(operators) = LEVEL_OPERATORS.get(level) else {
            return self.parse_unary(tok);
        };
        let mut left = self.parse_level(tok, level + 1)?;
        'operators: loop {
            for (token, operator) in operators.iter().copied() {
                if !tok.next(token) {
                    continue;
                }
                let operator_span = tok.span();
                let right = self.parse_level(tok, level + 1)?;
                left = binary(tok, operator, operator_span, left, right)?;
                continue 'operators;
            }
            return Ok(left);
        }
    }

    /// A primary operand, optionally followed by `has` or `in`
    fn parse_postfix(&mut self, tok: &mut Tokenizer<'_>) -> Result<Expression> {
        let left = self.parse_primary(tok)?;
        let operator = if tok.next(TokenKind::Has) {
            BinaryOperator::Has
        } else if tok.next(TokenKind::In) {
            BinaryOperator::In
        } else {
            return Ok(left);
        };
        let operator_span = tok.span();
        let right = if operator == BinaryOperator::In {
            self.parse_in_operand(tok)?
        } else {
            self.parse_primary(tok)?
        };
        binary(tok, operator, operator_span, left, right)
    }

    /// Right side of `in`: a parenthesised list or a collection-valued operand
    fn parse_in_operand(&mut self, tok: &mut Tokenizer<'_>) -> Result<Expression> {
        if !tok.next(TokenKind::Open) {
            return self.parse_primary(tok);
        }
        let start = tok.span();
        let mut items = vec![self.parse(tok)?];
        while tok.next(TokenKind::Comma) {
            items.push(self.parse(tok)?);
        }
        if !tok.next(TokenKind::Close) {
            return Err(tok.error(ODATA0006, "Expected ')' to close the list"));
        }
        let span = start.merge(tok.span());
        let item_type = items.iter().find_map(|i| i.type_.clone());
        Ok(Expression::new(ExpressionKind::List(items), item_type, true, span))
    }

    fn parse_unary(&mut self, tok: &mut Tokenizer<'_>) -> Result<Expression> {
        self.depth += 1;
        if self.depth > self.ctx.options.max_expression_depth {
            return Err(tok.error(
                ODATA0016,
                format!(
                    "Expression nesting exceeds {} levels",
                    self.ctx.options.max_expression_depth
                ),
            ));
        }
        let result = self.parse_unary_inner(tok);
        self.depth -= 1;
        result
    }

    fn parse_unary_inner(&mut self, tok: &mut Tokenizer<'_>) -> Result<Expression> {
        let operator = if tok.next(TokenKind::Minus) {
            UnaryOperator::Minus
        } else if tok.next(TokenKind::Not) {
            UnaryOperator::Not
        } else {
            return self.parse_postfix(tok);
        };
        let start = tok.span();
        let operand = self.parse_unary(tok)?;
        let ty = unary_type(operator, &operand).map_err(|e| e.at(tok, start))?;
        let span = start.merge(operand.span);
        Ok(Expression::new(
            ExpressionKind::Unary {
                operator,
                operand: Box::new(operand),
            },
            ty,
            false,
            span,
        ))
    }

    fn parse_primary(&mut self, tok: &mut Tokenizer<'_>) -> Result<Expression> {
        if tok.next(TokenKind::Open) {
            let start = tok.span();
            let mut inner = self.parse(tok)?;
            if !tok.next(TokenKind::Close) {
                return Err(tok.error(ODATA0006, "Expected ')'"));
            }
            inner.span = start.merge(tok.span());
            return Ok(inner);
        }
        if tok.next(TokenKind::ParameterAlias) {
            return self.alias_reference(tok);
        }
        if tok.next(TokenKind::It) {
            return self.parse_member(tok, Start::It);
        }
        if tok.next(TokenKind::Root) {
            return self.parse_member(tok, Start::Root);
        }
        if let Some(kind) = tok.next_literal() {
            return self.literal(tok, kind);
        }
        if tok.next(TokenKind::Json) {
            let text = tok.text();
            return Ok(Expression::new(
                ExpressionKind::Literal(Literal::new(text, None)),
                None,
                false,
                tok.span(),
            ));
        }
        if tok.next(TokenKind::QualifiedName) {
            if let Some(method) = MethodKind::from_name(tok.text()).filter(|_| tok.peek(TokenKind::Open)) {
                return self.parse_method(tok, method);
            }
            return self.parse_member(tok, Start::Qualified);
        }
        if tok.next(TokenKind::ODataIdentifier) {
            if let Some(method) = MethodKind::from_name(tok.text()).filter(|_| tok.peek(TokenKind::Open)) {
                return self.parse_method(tok, method);
            }
            return self.parse_member(tok, Start::Identifier);
        }
        if tok.rest().trim_start().starts_with('\'') {
            return Err(tok.error(ODATA0005, "Unterminated string literal"));
        }
        if tok.peek(TokenKind::End) {
            return Err(tok.error(ODATA0007, "Expected an expression, found the end of input"));
        }
        Err(tok.error(
            ODATA0007,
            format!("Expected an expression at '{}'", tok.rest().trim_start()),
        ))
    }

    fn literal(&self, tok: &Tokenizer<'_>, kind: TokenKind) -> Result<Expression> {
        if kind == TokenKind::Enum {
            return self.enum_literal(tok);
        }
        let text = tok.text();
        let span = tok.span();
        let invalid = |reason: String| {
            tok.semantic_error(ODATA0119, format!("Invalid literal '{text}': {reason}"), span)
        };
        let (value, ty) = match kind {
            TokenKind::Null => (None, None),
            TokenKind::Integer => match text.parse::<i64>() {
                Ok(number) => {
                    let kind = EdmPrimitiveTypeKind::narrowest_integral(number);
                    (kind.integral_value(number), Some(kind))
                }
                Err(_) => {
                    let value = EdmPrimitiveTypeKind::Decimal
                        .parse_literal(text, &Facets::default())
                        .map_err(|e| invalid(e.to_string()))?;
                    (Some(value), Some(EdmPrimitiveTypeKind::Decimal))
                }
            },
            other => {
                let Some(primitive) = other.literal_kind() else {
                    return Err(invalid("unknown literal".to_string()));
                };
                let value = primitive
                    .parse_literal(text, &Facets::default())
                    .map_err(|e| invalid(e.to_string()))?;
                (Some(value), Some(primitive))
            }
        };
        Ok(Expression::new(
            ExpressionKind::Literal(Literal::new(text, value)),
            ty.map(EdmType::Primitive),
            false,
            span,
        ))
    }

    fn enum_literal(&self, tok: &Tokenizer<'_>) -> Result<Expression> {
        let text = tok.text();
        let span = tok.span();
        let quote = text.find('\'').unwrap_or(text.len());
        let (name, quoted) = text.split_at(quote);
        let fqn = FullQualifiedName::parse(name)
            .ok_or_else(|| unknown_type(tok, name, span))?;
        let fqn = self.ctx.edm.resolve_alias(&fqn)?;
        let Some(enum_type) = self.ctx.edm.enum_type(&fqn)? else {
            return Err(unknown_type(tok, name, span));
        };
        let members = quoted.trim_matches('\'');
        enum_type.value_of_string(members).map_err(|e| {
            tok.semantic_error(ODATA0119, format!("Invalid enum literal '{text}': {e}"), span)
        })?;
        let values = members.split(',').map(|m| m.trim().to_string()).collect();
        Ok(Expression::new(
            ExpressionKind::Enum {
                enum_type: Arc::clone(&enum_type),
                values,
            },
            Some(EdmType::Enum(enum_type)),
            false,
            span,
        ))
    }

    fn alias_reference(&mut self, tok: &mut Tokenizer<'_>) -> Result<Expression> {
        let name = tok.text()[1..].to_string();
        let span = tok.span();
        let resolved = self.resolve_alias(&name, tok.input(), span)?;
        let (ty, collection) = resolved
            .as_ref()
            .map_or((None, false), |e| (e.type_.clone(), e.is_collection));
        Ok(Expression::new(ExpressionKind::Alias(name), ty, collection, span))
    }

    /// Parse the value of `@name` once and record it in the alias table
    pub(crate) fn resolve_alias(
        &mut self,
        name: &str,
        source: &str,
        span: Span,
    ) -> Result<Option<Expression>> {
        let text = {
            let aliases = self.ctx.aliases.borrow();
            match aliases.get(name) {
                Some(AliasValue {
                    expression: Some(expression),
                    ..
                }) => return Ok(Some(expression.clone())),
                Some(value) => Some(value.text.clone()),
                None => None,
            }
        };
        let Some(text) = text else {
            if self.ctx.options.allow_undefined_aliases {
                trace!("alias @{name} has no value");
                return Ok(None);
            }
            return Err(ODataError::semantic_at(
                ODATA0120,
                format!("Alias '@{name}' has no value"),
                source,
                span,
            ));
        };
        if self.ctx.resolving.borrow().iter().any(|n| n == name) {
            return Err(ODataError::semantic_at(
                ODATA0120,
                format!("Alias '@{name}' refers to itself"),
                source,
                span,
            ));
        }
        self.ctx.resolving.borrow_mut().push(name.to_string());
        let mut parser = ExpressionParser::new(self.ctx, self.it.clone());
        let parsed = parser.parse_all(&text);
        self.ctx.resolving.borrow_mut().pop();
        let expression = parsed?;
        trace!("alias @{name} resolved");
        if let Some(value) = self.ctx.aliases.borrow_mut().get_mut(name) {
            value.expression = Some(expression.clone());
        }
        Ok(Some(expression))
    }

    fn parse_method(&mut self, tok: &mut Tokenizer<'_>, method: MethodKind) -> Result<Expression> {
        let start = tok.span();
        tok.next(TokenKind::Open);
        let mut arguments = Vec::new();
        if !tok.next(TokenKind::Close) {
            loop {
                let argument = match method {
                    MethodKind::Cast | MethodKind::IsOf => self.type_argument(tok)?,
                    _ => None,
                };
                let argument = match argument {
                    Some(argument) => argument,
                    None => self.parse(tok)?,
                };
                arguments.push(argument);
                if !tok.next(TokenKind::Comma) {
                    break;
                }
            }
            if !tok.next(TokenKind::Close) {
                return Err(tok.error(
                    ODATA0006,
                    format!("Expected ')' to close the arguments of '{method}'"),
                ));
            }
        }
        let span = start.merge(tok.span());
        let (ty, collection) = match method {
            MethodKind::Cast | MethodKind::IsOf => self.check_type_function(tok, method, &arguments, span)?,
            _ => (
                Some(check_call(method, &arguments)
                    .map_err(|(code, message)| tok.semantic_error(code, message, span))?),
                false,
            ),
        };
        trace!("method {method} with {} argument(s)", arguments.len());
        Ok(Expression::new(
            ExpressionKind::MethodCall { method, arguments },
            ty,
            collection,
            span,
        ))
    }

    /// A qualified type name closing the argument list of `cast` or `isof`
    fn type_argument(&mut self, tok: &mut Tokenizer<'_>) -> Result<Option<Expression>> {
        let state = tok.save();
        if !(tok.next(TokenKind::QualifiedName) && tok.peek(TokenKind::Close)) {
            tok.restore(state);
            return Ok(None);
        }
        let span = tok.span();
        let name = qualified(self.ctx.edm, tok)?;
        let Some(ty) = self.ctx.edm.resolve_type(&name)? else {
            return Err(unknown_type(tok, tok.text(), span));
        };
        Ok(Some(Expression::new(
            ExpressionKind::TypeLiteral(ty.clone()),
            Some(ty),
            false,
            span,
        )))
    }

    fn check_type_function(
        &self,
        tok: &Tokenizer<'_>,
        method: MethodKind,
        arguments: &[Expression],
        span: Span,
    ) -> Result<(Option<EdmType>, bool)> {
        let (value, target) = match arguments {
            [target] => (None, target),
            [value, target] => (Some(value), target),
            _ => {
                return Err(tok.semantic_error(
                    ODATA0114,
                    format!("'{method}' takes 1 or 2 argument(s), found {}", arguments.len()),
                    span,
                ));
            }
        };
        let ExpressionKind::TypeLiteral(target_type) = &target.kind else {
            return Err(tok.semantic_error(
                ODATA0114,
                format!("The last argument of '{method}' must be a type name"),
                target.span,
            ));
        };
        let source = match value {
            Some(value) => value.type_.clone(),
            None => self.it.clone(),
        };
        if let Some(source) = &source {
            if !castable(source, target_type)? {
                return Err(tok.semantic_error(
                    ODATA0113,
                    format!("Cannot cast '{source}' to '{target_type}'"),
                    span,
                ));
            }
        }
        Ok(match method {
            MethodKind::IsOf => (Some(EdmType::Primitive(EdmPrimitiveTypeKind::Boolean)), false),
            _ => (
                Some(target_type.clone()),
                value.is_some_and(|v| v.is_collection),
            ),
        })
    }

    fn parse_member(&mut self, tok: &mut Tokenizer<'_>, start: Start) -> Result<Expression> {
        let first_span = tok.span();
        let mut path: Vec<UriResource> = Vec::new();
        match start {
            Start::It => {
                path.push(UriResource::new(UriResourceKind::It, self.it.clone(), false));
            }
            Start::Root => self.root_segment(tok, &mut path)?,
            Start::Identifier => self.first_identifier(tok, &mut path)?,
            Start::Qualified => {
                let it = UriResource::new(UriResourceKind::It, self.it.clone(), false);
                self.qualified_step(tok, &mut path, &it)?;
            }
        }

        loop {
            attach_keys(self.ctx, tok, &mut path)?;
            if matches!(
                path.last().map(|s| &s.kind),
                Some(UriResourceKind::Count | UriResourceKind::LambdaAny(_) | UriResourceKind::LambdaAll(_))
            ) {
                break;
            }
            if !tok.next(TokenKind::Slash) {
                break;
            }
            let Some(previous) = path.last().cloned() else {
                break;
            };
            if tok.next(TokenKind::Count) {
                if !previous.is_collection {
                    return Err(tok.semantic_error(ODATA0109, "$count requires a collection", tok.span()));
                }
                path.push(UriResource::new(
                    UriResourceKind::Count,
                    Some(EdmType::Primitive(EdmPrimitiveTypeKind::Int64)),
                    false,
                ));
                continue;
            }
            if tok.next(TokenKind::QualifiedName) {
                self.qualified_step(tok, &mut path, &previous)?;
                continue;
            }
            if !tok.next(TokenKind::ODataIdentifier) {
                return Err(tok.error(ODATA0003, "Expected a property name after '/'"));
            }
            let name = tok.text();
            if (name == "any" || name == "all") && tok.peek(TokenKind::Open) {
                let segment = self.parse_lambda(tok, &previous, name == "any")?;
                path.push(segment);
                continue;
            }
            self.property_step(tok, &mut path, &previous)?;
        }

        let (ty, collection) = path
            .last()
            .map_or((None, false), |last| (last.type_.clone(), last.is_collection));
        let span = first_span.merge(tok.span());
        Ok(Expression::new(ExpressionKind::Member(path), ty, collection, span))
    }

    fn root_segment(&mut self, tok: &mut Tokenizer<'_>, path: &mut Vec<UriResource>) -> Result<()> {
        path.push(UriResource::new(UriResourceKind::Root, None, false));
        if !(tok.next(TokenKind::Slash) && tok.next(TokenKind::ODataIdentifier)) {
            return Err(tok.error(ODATA0003, "Expected an entity set or singleton after $root/"));
        }
        let name = tok.text();
        let span = tok.span();
        let container = self.ctx.container()?;
        if let Some(entity_set) = container.entity_set(name)? {
            let entity = entity_set.entity_type()?;
            path.push(UriResource::new(
                UriResourceKind::EntitySet(entity_set),
                Some(EdmType::Entity(entity)),
                true,
            ));
            return Ok(());
        }
        if let Some(singleton) = container.singleton(name)? {
            let entity = singleton.entity_type()?;
            path.push(UriResource::new(
                UriResourceKind::Singleton(singleton),
                Some(EdmType::Entity(entity)),
                false,
            ));
            return Ok(());
        }
        Err(tok.semantic_error(
            ODATA0100,
            format!("'{name}' is not an entity set or singleton"),
            span,
        ))
    }

    fn first_identifier(&mut self, tok: &mut Tokenizer<'_>, path: &mut Vec<UriResource>) -> Result<()> {
        let name = tok.text();
        if let Some(variable) = self.variables.iter().rev().find(|v| v.name == name) {
            path.push(UriResource::new(
                UriResourceKind::LambdaVariable(variable.name.clone()),
                variable.type_.clone(),
                false,
            ));
            return Ok(());
        }
        if self.ctx.crossjoin.iter().any(|set| set == name) {
            if let Some(entity_set) = self.ctx.container()?.entity_set(name)? {
                let entity = entity_set.entity_type()?;
                path.push(UriResource::new(
                    UriResourceKind::EntitySet(entity_set),
                    Some(EdmType::Entity(entity)),
                    false,
                ));
                return Ok(());
            }
        }
        let it = UriResource::new(UriResourceKind::It, self.it.clone(), false);
        self.property_step(tok, path, &it)
    }

    fn property_step(
        &mut self,
        tok: &mut Tokenizer<'_>,
        path: &mut Vec<UriResource>,
        previous: &UriResource,
    ) -> Result<()> {
        let name = tok.text();
        let span = tok.span();
        let Some(owner) = previous.structured_type() else {
            let owner = previous
                .type_
                .as_ref()
                .map_or_else(|| "an untyped value".to_string(), |t| format!("'{t}'"));
            return Err(tok.semantic_error(
                ODATA0101,
                format!("Property '{name}' does not exist in {owner}"),
                span,
            ));
        };
        if previous.is_collection {
            return Err(tok.semantic_error(
                ODATA0127,
                format!("Cannot access '{name}' on a collection of '{}'", owner.name()),
                span,
            ));
        }
        match member_segment(owner, name)? {
            Some(segment) => {
                path.push(segment);
                Ok(())
            }
            None => Err(tok.semantic_error(
                ODATA0101,
                format!("Property '{name}' does not exist in '{}'", owner.name()),
                span,
            )),
        }
    }

    /// A type cast or bound function call applied to `previous`
    fn qualified_step(
        &mut self,
        tok: &mut Tokenizer<'_>,
        path: &mut Vec<UriResource>,
        previous: &UriResource,
    ) -> Result<()> {
        let text = tok.text();
        let span = tok.span();
        let name = qualified(self.ctx.edm, tok)?;

        if let Some(current) = previous.structured_type() {
            if let Some(cast) = cast_target(self.ctx.edm, current, &name)? {
                if path.is_empty() {
                    check_cast(tok, current, &cast, span)?;
                    let collection = previous.is_collection;
                    path.push(UriResource::new(
                        UriResourceKind::TypeCast(Arc::clone(&cast)),
                        Some(EdmType::structured(cast)),
                        collection,
                    ));
                    return Ok(());
                }
                return apply_type_cast(tok, path, cast, span);
            }
            if self.ctx.edm.resolve_type(&name)?.is_some() {
                return Err(tok.semantic_error(
                    ODATA0106,
                    format!("Cannot cast '{}' to '{text}'", current.name()),
                    span,
                ));
            }
        }

        let Some(binding) = previous.type_.clone() else {
            return Err(unknown_type(tok, text, span));
        };
        if !tok.next(TokenKind::Open) {
            return Err(unknown_type(tok, text, span));
        }
        let arguments = self.function_arguments(tok)?;
        let names: Vec<&str> = arguments.iter().map(|p| p.name.as_str()).collect();
        let Some(function) =
            bound_function(self.ctx.edm, &name, &binding, previous.is_collection, Some(&names))?
        else {
            return Err(tok.semantic_error(
                ODATA0103,
                format!("No function '{text}({})' is bound to '{binding}'", names.join(",")),
                span,
            ));
        };
        for argument in &arguments {
            self.check_argument(tok, &function, argument)?;
        }
        let (ty, collection) = operation_result(&function)?;
        if path.is_empty() {
            path.push(UriResource::new(UriResourceKind::It, self.it.clone(), false));
        }
        path.push(UriResource::new(
            UriResourceKind::BoundFunction {
                function,
                parameters: arguments,
            },
            ty,
            collection,
        ));
        Ok(())
    }

    /// `Name=expression` pairs; the opening parenthesis is consumed
    fn function_arguments(&mut self, tok: &mut Tokenizer<'_>) -> Result<Vec<FunctionParameter>> {
        let mut arguments: Vec<FunctionParameter> = Vec::new();
        if tok.next(TokenKind::Close) {
            return Ok(arguments);
        }
        loop {
            if !tok.next(TokenKind::ODataIdentifier) {
                return Err(tok.error(ODATA0003, "Expected a parameter name"));
            }
            let name = tok.text().to_string();
            if !tok.next(TokenKind::Equals) {
                return Err(tok.error(ODATA0003, format!("Expected '=' after parameter '{name}'")));
            }
            let value = self.parse(tok)?;
            let alias = match &value.kind {
                ExpressionKind::Alias(alias) => Some(alias.clone()),
                _ => None,
            };
            arguments.push(FunctionParameter {
                name,
                text: value.span.slice(tok.input()).to_string(),
                alias,
                expression: Some(value),
            });
            if !tok.next(TokenKind::Comma) {
                break;
            }
        }
        if !tok.next(TokenKind::Close) {
            return Err(tok.error(ODATA0006, "Expected ')' to close the parameter list"));
        }
        Ok(arguments)
    }

    fn check_argument(
        &self,
        tok: &Tokenizer<'_>,
        function: &EdmOperation,
        argument: &FunctionParameter,
    ) -> Result<()> {
        let (Some(declared), Some(value)) = (function.parameter(&argument.name), &argument.expression) else {
            return Ok(());
        };
        let Some(value_type) = &value.type_ else {
            return Ok(());
        };
        let expected = declared.type_()?;
        if !assignable(value_type, &expected)? || value.is_collection != declared.is_collection() {
            return Err(tok.semantic_error(
                ODATA0119,
                format!(
                    "Parameter '{}' expects '{expected}', found '{value_type}'",
                    argument.name
                ),
                value.span,
            ));
        }
        Ok(())
    }

    fn parse_lambda(
        &mut self,
        tok: &mut Tokenizer<'_>,
        previous: &UriResource,
        any: bool,
    ) -> Result<UriResource> {
        let keyword = if any { "any" } else { "all" };
        let span = tok.span();
        if !previous.is_collection {
            return Err(tok.semantic_error(
                ODATA0116,
                format!("'{keyword}' requires a collection"),
                span,
            ));
        }
        tok.next(TokenKind::Open);
        let boolean = Some(EdmType::Primitive(EdmPrimitiveTypeKind::Boolean));

        if tok.next(TokenKind::Close) {
            if !any {
                return Err(tok.error(ODATA0007, "'all' requires a lambda predicate"));
            }
            let lambda = Lambda {
                variable: None,
                predicate: None,
            };
            return Ok(UriResource::new(UriResourceKind::LambdaAny(lambda), boolean, false));
        }

        if !tok.next(TokenKind::ODataIdentifier) {
            return Err(tok.error(ODATA0003, "Expected a lambda variable name"));
        }
        let variable = tok.text().to_string();
        let variable_span = tok.span();
        if self.variables.iter().any(|v| v.name == variable) {
            return Err(tok.semantic_error(
                ODATA0117,
                format!("Lambda variable '{variable}' is already defined"),
                variable_span,
            ));
        }
        if !tok.next(TokenKind::Colon) {
            return Err(tok.error(ODATA0003, "Expected ':' after the lambda variable"));
        }
        self.variables.push(Variable {
            name: variable.clone(),
            type_: previous.type_.clone(),
        });
        let predicate = self.parse(tok);
        self.variables.pop();
        let predicate = predicate?;
        if !is_boolean(&predicate) {
            return Err(tok.semantic_error(
                ODATA0118,
                format!("The '{keyword}' predicate must be Boolean"),
                predicate.span,
            ));
        }
        if !tok.next(TokenKind::Close) {
            return Err(tok.error(ODATA0006, format!("Expected ')' to close '{keyword}'")));
        }
        trace!("lambda {keyword} over {variable}");
        let lambda = Lambda {
            variable: Some(variable),
            predicate: Some(Box::new(predicate)),
        };
        let kind = if any {
            UriResourceKind::LambdaAny(lambda)
        } else {
            UriResourceKind::LambdaAll(lambda)
        };
        Ok(UriResource::new(kind, boolean, false))
    }
}

fn is_boolean(expression: &Expression) -> bool {
    !expression.is_collection
        && expression
            .type_
            .as_ref()
            .is_none_or(|t| t.primitive_kind() == Some(EdmPrimitiveTypeKind::Boolean))
}

/// Type a binary node and merge its span
fn binary(
    tok: &Tokenizer<'_>,
    operator: BinaryOperator,
    operator_span: Span,
    mut left: Expression,
    mut right: Expression,
) -> Result<Expression> {
    let ty = binary_type(operator, &mut left, &mut right).map_err(|e| e.at(tok, operator_span))?;
    let span = left.span.merge(right.span);
    Ok(Expression::new(
        ExpressionKind::Binary {
            operator,
            left: Box::new(left),
            right: Box::new(right),
        },
        ty,
        false,
        span,
    ))
}

pub(crate) fn require_predicate(tok: &Tokenizer<'_>, expression: &Expression) -> Result<()> {
    if !is_boolean(expression) {
        let found = expression
            .type_
            .as_ref()
            .map_or_else(|| "an untyped value".to_string(), ToString::to_string);
        return Err(tok.semantic_error(
            ODATA0118,
            format!("Expected a Boolean expression, found {found}"),
            expression.span,
        ));
    }
    Ok(())
}

/// Whether a value of `source` can be passed where `target` is declared
fn assignable(source: &EdmType, target: &EdmType) -> Result<bool> {
    Ok(match (source, target) {
        (EdmType::Complex(a) | EdmType::Entity(a), EdmType::Complex(b) | EdmType::Entity(b)) => {
            a.compatible_to(Some(b))?
        }
        (EdmType::Enum(a), EdmType::Enum(b)) => a.name() == b.name(),
        _ => match (source.primitive_kind(), target.primitive_kind()) {
            (Some(a), Some(b)) => a.is_compatible_with(b),
            _ => false,
        },
    })
}

/// Whether a value of `source` can be cast to `target`
///
/// Structured types cast along their inheritance chain in either direction;
/// primitives cast to any primitive, enums to and from strings.
fn castable(source: &EdmType, target: &EdmType) -> Result<bool> {
    Ok(match (source, target) {
        (EdmType::Complex(a) | EdmType::Entity(a), EdmType::Complex(b) | EdmType::Entity(b)) => {
            a.kind() == b.kind() && (b.compatible_to(Some(a))? || a.compatible_to(Some(b))?)
        }
        (EdmType::Enum(a), EdmType::Enum(b)) => a.name() == b.name(),
        (EdmType::Enum(_), t) | (t, EdmType::Enum(_)) => {
            t.primitive_kind() == Some(EdmPrimitiveTypeKind::String)
        }
        (a, b) => a.is_primitive() && b.is_primitive(),
    })
}
