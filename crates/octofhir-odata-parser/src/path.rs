//! Resource path resolution
//!
//! Each decoded segment gets its own path-mode tokenizer. The first segment
//! is looked up in the entity container; every later segment is resolved
//! against the type the previous one yields.

use crate::context::ParseContext;
use crate::expression::ExpressionParser;
use crate::lexer::{LexMode, TokenKind, Tokenizer};
use crate::member::{
    apply_type_cast, attach_keys, bound_action, bound_function, cast_target, member_segment,
    operation_result, qualified, unknown_type,
};
use log::trace;
use octofhir_odata_ast::{
    Expression, ExpressionKind, FunctionParameter, Literal, UriResource, UriResourceKind,
};
use octofhir_odata_diagnostics::{
    ODATA0001, ODATA0003, ODATA0006, ODATA0010, ODATA0017, ODATA0018, ODATA0100, ODATA0101,
    ODATA0103, ODATA0105, ODATA0106, ODATA0108, ODATA0109, ODATA0110, ODATA0111, ODATA0119,
    ODATA0123, ODATA0127, ODataError, Result, Span,
};
use octofhir_odata_edm::{EdmOperation, EdmType};
use octofhir_odata_types::EdmPrimitiveTypeKind;

pub(crate) struct ResourcePathParser<'c, 'e> {
    ctx: &'c ParseContext<'e>,
}

impl<'c, 'e> ResourcePathParser<'c, 'e> {
    pub(crate) fn new(ctx: &'c ParseContext<'e>) -> Self {
        Self { ctx }
    }

    /// Resolve decoded segments into a resource path
    pub(crate) fn parse(&self, segments: &[String]) -> Result<Vec<UriResource>> {
        let mut path = Vec::with_capacity(segments.len());
        for segment in segments {
            let mut tok = Tokenizer::new(segment, LexMode::Path);
            match path.last() {
                None => self.first_segment(&mut tok, &mut path)?,
                Some(previous) => {
                    check_continuable(&tok, previous)?;
                    self.next_segment(&mut tok, &mut path)?;
                }
            }
            if !tok.next(TokenKind::End) {
                return Err(tok.error(
                    ODATA0001,
                    format!("Unexpected '{}' in segment '{segment}'", tok.rest()),
                ));
            }
            if let Some(last) = path.last() {
                trace!(
                    "segment {segment} -> {:?} ({})",
                    last.segment_kind(),
                    last.type_.as_ref().map_or_else(|| "untyped".to_string(), ToString::to_string)
                );
            }
        }
        Ok(path)
    }

    fn first_segment(&self, tok: &mut Tokenizer<'_>, path: &mut Vec<UriResource>) -> Result<()> {
        if tok.rest().starts_with('$') {
            return Err(tok.error(
                ODATA0018,
                format!("'{}' cannot start a resource path", tok.rest()),
            ));
        }
        if !tok.next(TokenKind::ODataIdentifier) {
            return Err(tok.error(
                ODATA0003,
                "Expected an entity set, singleton or operation import name",
            ));
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
            return attach_keys(self.ctx, tok, path);
        }

        if let Some(singleton) = container.singleton(name)? {
            if tok.peek(TokenKind::Open) {
                return Err(tok.semantic_error(
                    ODATA0105,
                    format!("Singleton '{name}' cannot take a key predicate"),
                    span,
                ));
            }
            let entity = singleton.entity_type()?;
            path.push(UriResource::new(
                UriResourceKind::Singleton(singleton),
                Some(EdmType::Entity(entity)),
                false,
            ));
            return Ok(());
        }

        if let Some(import) = container.action_import(name)? {
            let action = import.unbound_action()?.ok_or_else(|| {
                tok.semantic_error(
                    ODATA0103,
                    format!("Action '{}' of import '{name}' does not exist", import.operation_name()),
                    span,
                )
            })?;
            if tok.next(TokenKind::Open) && !tok.next(TokenKind::Close) {
                return Err(tok.error(ODATA0006, "Action imports take no inline parameters"));
            }
            let (ty, collection) = operation_result(&action)?;
            path.push(UriResource::new(
                UriResourceKind::ActionImport { import, action },
                ty,
                collection,
            ));
            return Ok(());
        }

        if let Some(import) = container.function_import(name)? {
            if !tok.next(TokenKind::Open) {
                return Err(tok.error(
                    ODATA0006,
                    format!("Function import '{name}' requires a parameter list"),
                ));
            }
            let raw = parse_raw_parameters(tok)?;
            let names: Vec<&str> = raw.iter().map(|p| p.name.as_str()).collect();
            let function = import.unbound_function(Some(&names))?.ok_or_else(|| {
                tok.semantic_error(
                    ODATA0103,
                    format!(
                        "Function import '{name}' has no overload with parameters ({})",
                        names.join(",")
                    ),
                    span,
                )
            })?;
            let parameters = self.typed_parameters(tok, &function, raw)?;
            let (ty, collection) = operation_result(&function)?;
            path.push(UriResource::new(
                UriResourceKind::FunctionImport {
                    import,
                    function,
                    parameters,
                },
                ty,
                collection,
            ));
            return attach_keys(self.ctx, tok, path);
        }

        Err(tok.semantic_error(
            ODATA0100,
            format!("'{name}' is not an entity set, singleton or operation import"),
            span,
        ))
    }

    fn next_segment(&self, tok: &mut Tokenizer<'_>, path: &mut Vec<UriResource>) -> Result<()> {
        let Some(previous) = path.last() else {
            return Ok(());
        };
        let Some(previous_type) = previous.type_.clone() else {
            return Err(tok.semantic_error(
                ODATA0108,
                format!("'{}' yields no value to continue from", previous.segment_name()),
                tok.span(),
            ));
        };
        let previous_collection = previous.is_collection;

        if tok.next(TokenKind::Count) {
            if !previous_collection {
                return Err(tok.semantic_error(
                    ODATA0109,
                    "$count requires a collection",
                    tok.span(),
                ));
            }
            path.push(UriResource::new(
                UriResourceKind::Count,
                Some(EdmType::Primitive(EdmPrimitiveTypeKind::Int64)),
                false,
            ));
            return Ok(());
        }
        if tok.next(TokenKind::Ref) {
            if previous.structured_type().is_none_or(|t| !t.is_entity()) {
                return Err(tok.semantic_error(ODATA0110, "$ref requires entities", tok.span()));
            }
            path.push(UriResource::new(
                UriResourceKind::Ref,
                Some(previous_type),
                previous_collection,
            ));
            return Ok(());
        }
        if tok.next(TokenKind::Value) {
            let ty = match previous.structured_type() {
                _ if previous_collection => None,
                Some(entity) if entity.is_entity() && entity.has_stream()? => {
                    Some(EdmType::Primitive(EdmPrimitiveTypeKind::Stream))
                }
                Some(_) => None,
                None if previous_type.is_primitive() || previous_type.as_enum().is_some() => {
                    Some(previous_type)
                }
                None => None,
            };
            let Some(ty) = ty else {
                return Err(tok.semantic_error(
                    ODATA0111,
                    "$value requires a single primitive value or a media entity",
                    tok.span(),
                ));
            };
            path.push(UriResource::new(UriResourceKind::Value, Some(ty), false));
            return Ok(());
        }
        if tok.rest().starts_with('$') {
            return Err(tok.error(
                ODATA0018,
                format!("'{}' is not a known path segment", tok.rest()),
            ));
        }

        if tok.next(TokenKind::QualifiedName) {
            return self.qualified_segment(tok, path, previous_type, previous_collection);
        }
        if !tok.next(TokenKind::ODataIdentifier) {
            return Err(tok.error(ODATA0003, format!("'{}' is not a valid segment", tok.rest())));
        }
        let name = tok.text();
        let span = tok.span();
        let Some(owner) = previous.structured_type().cloned() else {
            return Err(tok.semantic_error(
                ODATA0101,
                format!("'{previous_type}' has no property '{name}'"),
                span,
            ));
        };
        if previous_collection {
            return Err(tok.semantic_error(
                ODATA0127,
                format!("Cannot access '{name}' on a collection of '{}'", owner.name()),
                span,
            ));
        }
        let Some(segment) = member_segment(&owner, name)? else {
            return Err(tok.semantic_error(
                ODATA0101,
                format!("Property '{name}' does not exist in '{}'", owner.name()),
                span,
            ));
        };
        let navigation = matches!(segment.kind, UriResourceKind::NavigationProperty(_));
        if tok.peek(TokenKind::Open) && !(navigation && segment.is_collection) {
            return Err(tok.semantic_error(
                ODATA0105,
                format!("'{name}' is not a collection of entities and takes no key"),
                span,
            ));
        }
        path.push(segment);
        attach_keys(self.ctx, tok, path)
    }

    fn qualified_segment(
        &self,
        tok: &mut Tokenizer<'_>,
        path: &mut Vec<UriResource>,
        binding: EdmType,
        is_collection: bool,
    ) -> Result<()> {
        let span = tok.span();
        let text = tok.text();
        let name = qualified(self.ctx.edm, tok)?;

        if let Some(current) = binding.as_structured() {
            if let Some(cast) = cast_target(self.ctx.edm, current, &name)? {
                apply_type_cast(tok, path, cast, span)?;
                return attach_keys(self.ctx, tok, path);
            }
            if let Some(other) = self.ctx.edm.resolve_type(&name)? {
                return Err(tok.semantic_error(
                    ODATA0106,
                    format!("Cannot cast '{current}' to '{other}'", current = current.name()),
                    span,
                ));
            }
        }

        if tok.next(TokenKind::Open) {
            let raw = parse_raw_parameters(tok)?;
            let names: Vec<&str> = raw.iter().map(|p| p.name.as_str()).collect();
            let function = bound_function(self.ctx.edm, &name, &binding, is_collection, Some(&names))?
                .ok_or_else(|| {
                    tok.semantic_error(
                        ODATA0103,
                        format!(
                            "No function '{text}({})' is bound to '{binding}'{}",
                            names.join(","),
                            if is_collection { " collections" } else { "" }
                        ),
                        span,
                    )
                })?;
            let parameters = self.typed_parameters(tok, &function, raw)?;
            let (ty, collection) = operation_result(&function)?;
            path.push(UriResource::new(
                UriResourceKind::BoundFunction {
                    function,
                    parameters,
                },
                ty,
                collection,
            ));
            return attach_keys(self.ctx, tok, path);
        }

        match bound_action(self.ctx.edm, &name, &binding, is_collection)? {
            Some(action) => {
                let (ty, collection) = operation_result(&action)?;
                path.push(UriResource::new(UriResourceKind::BoundAction(action), ty, collection));
                Ok(())
            }
            None => Err(unknown_type(tok, text, span)),
        }
    }

    /// Check literal parameter values against the declared parameter types
    fn typed_parameters(
        &self,
        tok: &Tokenizer<'_>,
        function: &EdmOperation,
        raw: Vec<FunctionParameter>,
    ) -> Result<Vec<FunctionParameter>> {
        raw.into_iter()
            .map(|mut parameter| {
                if let Some(alias) = &parameter.alias {
                    let mut resolver = ExpressionParser::new(self.ctx, None);
                    parameter.expression = resolver.resolve_alias(alias, tok.input(), tok.span())?;
                    return Ok(parameter);
                }
                let Some(declared) = function.parameter(&parameter.name) else {
                    return Ok(parameter);
                };
                let ty = declared.type_()?;
                if parameter.text == "null" {
                    parameter.expression = Some(Expression::new(
                        ExpressionKind::Literal(Literal::null()),
                        None,
                        false,
                        tok.span(),
                    ));
                    return Ok(parameter);
                }
                let Some(kind) = ty.primitive_kind().filter(|_| !declared.is_collection()) else {
                    return Ok(parameter);
                };
                let value = kind.parse_literal(&parameter.text, declared.facets()).map_err(|e| {
                    tok.semantic_error(
                        ODATA0119,
                        format!("Invalid value for parameter '{}': {e}", parameter.name),
                        tok.span(),
                    )
                })?;
                parameter.expression = Some(Expression::new(
                    ExpressionKind::Literal(Literal::new(parameter.text.clone(), Some(value))),
                    Some(ty),
                    false,
                    tok.span(),
                ));
                Ok(parameter)
            })
            .collect()
    }
}

/// Segments after a terminal one are rejected, as is anything composed
/// onto a non-composable function
fn check_continuable(tok: &Tokenizer<'_>, previous: &UriResource) -> Result<()> {
    let terminal = matches!(
        previous.kind,
        UriResourceKind::Count
            | UriResourceKind::Ref
            | UriResourceKind::Value
            | UriResourceKind::BoundAction(_)
            | UriResourceKind::ActionImport { .. }
    );
    if terminal {
        return Err(ODataError::syntax_at(
            ODATA0017,
            format!("'{}' must be the last path segment", previous.segment_name()),
            tok.input(),
            Span::new(0, tok.input().len()),
        ));
    }
    let function = match &previous.kind {
        UriResourceKind::BoundFunction { function, .. }
        | UriResourceKind::FunctionImport { function, .. } => Some(function),
        _ => None,
    };
    if let Some(function) = function.filter(|f| !f.is_composable()) {
        return Err(tok.semantic_error(
            ODATA0123,
            format!("Function '{}' is not composable", function.name()),
            Span::new(0, tok.input().len()),
        ));
    }
    Ok(())
}

/// `Name=value` pairs of a path-mode parameter list; the opening
/// parenthesis is consumed
pub(crate) fn parse_raw_parameters(tok: &mut Tokenizer<'_>) -> Result<Vec<FunctionParameter>> {
    let mut parameters: Vec<FunctionParameter> = Vec::new();
    if tok.next(TokenKind::Close) {
        return Ok(parameters);
    }
    loop {
        if !tok.next(TokenKind::ODataIdentifier) {
            return Err(tok.error(ODATA0003, "Expected a parameter name"));
        }
        let name = tok.text().to_string();
        if parameters.iter().any(|p| p.name == name) {
            return Err(tok.error(ODATA0010, format!("Parameter '{name}' given twice")));
        }
        if !tok.next(TokenKind::Equals) {
            return Err(tok.error(ODATA0010, format!("Expected '=' after parameter '{name}'")));
        }
        let parameter = if tok.next(TokenKind::ParameterAlias) {
            FunctionParameter {
                name,
                text: String::new(),
                alias: Some(tok.text()[1..].to_string()),
                expression: None,
            }
        } else if tok.next(TokenKind::Json) || tok.next_literal().is_some() {
            FunctionParameter {
                name,
                text: tok.text().to_string(),
                alias: None,
                expression: None,
            }
        } else {
            return Err(tok.error(ODATA0010, format!("Expected a value for parameter '{name}'")));
        };
        parameters.push(parameter);
        if !tok.next(TokenKind::Comma) {
            break;
        }
    }
    if !tok.next(TokenKind::Close) {
        return Err(tok.error(ODATA0006, "Expected ')' to close the parameter list"));
    }
    Ok(parameters)
}
