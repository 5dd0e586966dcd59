//! System query option values: `$filter`, `$orderby`, `$select`,
//! `$expand` with nested options, and the scalar options

use crate::context::ParseContext;
use crate::expression::ExpressionParser;
use crate::lexer::{LexMode, TokenKind, Tokenizer};
use crate::member::{
    apply_type_cast, bound_action, bound_function, cast_target, check_cast, member_segment,
    operation_result, qualified, unknown_type,
};
use crate::typing::sortable;
use log::trace;
use octofhir_odata_ast::{
    ExpandItem, Levels, OrderByItem, QueryOptions, SelectItem, SystemQueryOptionKind as Q,
    UriResource, UriResourceKind,
};
use octofhir_odata_diagnostics::{
    ODATA0003, ODATA0006, ODATA0008, ODATA0009, ODATA0013, ODATA0019, ODATA0101, ODATA0103,
    ODATA0121, ODATA0122, ODATA0125, Result,
};
use octofhir_odata_edm::{EdmStructuredType, EdmType};
use std::sync::Arc;

/// What the options of one request or expand item apply to
#[derive(Debug, Clone, Default)]
pub(crate) struct OptionTarget {
    /// Element type `$it` refers to
    pub(crate) it: Option<EdmType>,
}

impl OptionTarget {
    pub(crate) fn new(it: Option<EdmType>) -> Self {
        Self { it }
    }

    fn structured(&self) -> Option<&Arc<EdmStructuredType>> {
        self.it.as_ref().and_then(EdmType::as_structured)
    }
}

const REF_OPTIONS: [Q; 6] = [Q::Filter, Q::Search, Q::OrderBy, Q::Skip, Q::Top, Q::Count];
const COUNT_OPTIONS: [Q; 2] = [Q::Filter, Q::Search];

pub(crate) struct QueryOptionParser<'c, 'e> {
    ctx: &'c ParseContext<'e>,
}

impl<'c, 'e> QueryOptionParser<'c, 'e> {
    pub(crate) fn new(ctx: &'c ParseContext<'e>) -> Self {
        Self { ctx }
    }

    /// Apply one top-level system query option to `options`
    pub(crate) fn apply(
        &self,
        options: &mut QueryOptions,
        kind: Q,
        value: &str,
        target: &OptionTarget,
    ) -> Result<()> {
        trace!("query option {kind}={value}");
        let mut tok = Tokenizer::new(value, LexMode::Query);
        match kind {
            Q::Filter => {
                let mut parser = ExpressionParser::new(self.ctx, target.it.clone());
                options.filter = Some(parser.parse_predicate(&mut tok)?);
            }
            Q::OrderBy => options.order_by = self.order_by(&mut tok, target)?,
            Q::Select => {
                let ty = self.require_structured(&tok, kind, target)?;
                options.select = self.select_list(&mut tok, &ty)?;
            }
            Q::Expand => {
                let ty = self.require_structured(&tok, kind, target)?;
                options.expand = self.expand_list(&mut tok, &ty)?;
            }
            Q::Top => options.top = Some(unsigned(&tok, kind, value)?),
            Q::Skip => options.skip = Some(unsigned(&tok, kind, value)?),
            Q::Count => options.count = Some(boolean(&tok, kind, value)?),
            Q::Format => options.format = Some(media_format(&tok, value)?),
            Q::SkipToken => options.skip_token = Some(value.to_string()),
            Q::DeltaToken => options.delta_token = Some(value.to_string()),
            Q::Search => options.search = Some(non_empty(&tok, kind, value)?),
            Q::Id => options.id = Some(non_empty(&tok, kind, value)?),
            Q::Levels => {
                return Err(tok.semantic_error(
                    ODATA0121,
                    "$levels is only allowed inside $expand",
                    tok.span(),
                ));
            }
        }
        if matches!(kind, Q::Filter | Q::OrderBy | Q::Select | Q::Expand) && !tok.next(TokenKind::End) {
            return Err(tok.error(
                ODATA0019,
                format!("Unexpected '{}' in {kind}", tok.rest().trim_start()),
            ));
        }
        Ok(())
    }

    fn require_structured(
        &self,
        tok: &Tokenizer<'_>,
        kind: Q,
        target: &OptionTarget,
    ) -> Result<Arc<EdmStructuredType>> {
        target.structured().cloned().ok_or_else(|| {
            tok.semantic_error(
                ODATA0121,
                format!("{kind} requires a structured resource"),
                tok.span(),
            )
        })
    }

    fn order_by(&self, tok: &mut Tokenizer<'_>, target: &OptionTarget) -> Result<Vec<OrderByItem>> {
        let mut items = Vec::new();
        loop {
            let mut parser = ExpressionParser::new(self.ctx, target.it.clone());
            let expression = parser.parse(tok)?;
            if !sortable(&expression) {
                let found = expression
                    .type_
                    .as_ref()
                    .map_or_else(|| "untyped".to_string(), ToString::to_string);
                return Err(tok.semantic_error(
                    ODATA0125,
                    format!("Cannot order by a value of type {found}"),
                    expression.span,
                ));
            }
            let descending = tok.next(TokenKind::Desc);
            if !descending {
                tok.next(TokenKind::Asc);
            }
            items.push(OrderByItem {
                expression,
                descending,
            });
            if !tok.next(TokenKind::Comma) {
                return Ok(items);
            }
        }
    }

    fn select_list(&self, tok: &mut Tokenizer<'_>, ty: &Arc<EdmStructuredType>) -> Result<Vec<SelectItem>> {
        let mut items = vec![self.select_item(tok, ty)?];
        while tok.next(TokenKind::Comma) {
            items.push(self.select_item(tok, ty)?);
        }
        Ok(items)
    }

    fn select_item(&self, tok: &mut Tokenizer<'_>, ty: &Arc<EdmStructuredType>) -> Result<SelectItem> {
        let mut item = SelectItem::default();
        if tok.next(TokenKind::Star) {
            item.star = true;
            return Ok(item);
        }
        if tok.next(TokenKind::NamespaceStar) {
            let namespace = tok.text().trim_end_matches(".*").to_string();
            item.all_operations_in_schema = Some(namespace);
            return Ok(item);
        }

        let mut current = Arc::clone(ty);
        if tok.next(TokenKind::QualifiedName) {
            let span = tok.span();
            let name = qualified(self.ctx.edm, tok)?;
            if let Some(cast) = cast_target(self.ctx.edm, ty, &name)? {
                check_cast(tok, ty, &cast, span)?;
                item.starting_type = Some(Arc::clone(&cast));
                current = cast;
                if !tok.next(TokenKind::Slash) {
                    return Err(tok.error(ODATA0003, "Expected '/' and a property after the type cast"));
                }
            } else {
                let binding = EdmType::structured(Arc::clone(ty));
                let action = bound_action(self.ctx.edm, &name, &binding, false)?;
                let operation = match action {
                    Some(action) => Some(UriResourceKind::BoundAction(action)),
                    None => bound_function(self.ctx.edm, &name, &binding, false, None)?.map(|function| {
                        UriResourceKind::BoundFunction {
                            function,
                            parameters: Vec::new(),
                        }
                    }),
                };
                let Some(kind) = operation else {
                    return Err(tok.semantic_error(
                        ODATA0103,
                        format!("No operation '{}' is bound to '{}'", tok.text(), ty.name()),
                        span,
                    ));
                };
                let (result, collection) = match &kind {
                    UriResourceKind::BoundAction(op) | UriResourceKind::BoundFunction { function: op, .. } => {
                        operation_result(op)?
                    }
                    _ => (None, false),
                };
                item.path.push(UriResource::new(kind, result, collection));
                return Ok(item);
            }
        }

        loop {
            if !tok.next(TokenKind::ODataIdentifier) {
                return Err(tok.error(ODATA0003, "Expected a property name in $select"));
            }
            let name = tok.text();
            let span = tok.span();
            let Some(segment) = member_segment(&current, name)? else {
                return Err(tok.semantic_error(
                    ODATA0101,
                    format!("Property '{name}' does not exist in '{}'", current.name()),
                    span,
                ));
            };
            let complex = segment.structured_type().filter(|t| !t.is_entity()).cloned();
            item.path.push(segment);
            let Some(complex) = complex else {
                break;
            };
            if !tok.next(TokenKind::Slash) {
                break;
            }
            current = complex;
            if tok.next(TokenKind::QualifiedName) {
                let cast_span = tok.span();
                let name = qualified(self.ctx.edm, tok)?;
                let Some(cast) = cast_target(self.ctx.edm, &current, &name)? else {
                    return Err(unknown_type(tok, tok.text(), cast_span));
                };
                apply_type_cast(tok, &mut item.path, Arc::clone(&cast), cast_span)?;
                current = cast;
                if !tok.next(TokenKind::Slash) {
                    break;
                }
            }
        }
        Ok(item)
    }

    fn expand_list(&self, tok: &mut Tokenizer<'_>, ty: &Arc<EdmStructuredType>) -> Result<Vec<ExpandItem>> {
        let mut items = vec![self.expand_item(tok, ty)?];
        while tok.next(TokenKind::Comma) {
            items.push(self.expand_item(tok, ty)?);
        }
        Ok(items)
    }

    fn expand_item(&self, tok: &mut Tokenizer<'_>, ty: &Arc<EdmStructuredType>) -> Result<ExpandItem> {
        let mut item = ExpandItem::default();
        if tok.next(TokenKind::Star) {
            item.star = true;
            if tok.next(TokenKind::Slash) {
                if !tok.next(TokenKind::Ref) {
                    return Err(tok.error(ODATA0003, "Only '$ref' may follow '*' in $expand"));
                }
                item.is_ref = true;
            } else if tok.next(TokenKind::Open) {
                item.options = self.nested_options(tok, None, &[Q::Levels])?;
            }
            return Ok(item);
        }

        let mut current = Arc::clone(ty);
        if tok.next(TokenKind::QualifiedName) {
            let span = tok.span();
            let name = qualified(self.ctx.edm, tok)?;
            let Some(cast) = cast_target(self.ctx.edm, ty, &name)? else {
                return Err(unknown_type(tok, tok.text(), span));
            };
            check_cast(tok, ty, &cast, span)?;
            item.path.push(UriResource::new(
                UriResourceKind::TypeCast(Arc::clone(&cast)),
                Some(EdmType::structured(Arc::clone(&cast))),
                false,
            ));
            current = cast;
            if !tok.next(TokenKind::Slash) {
                return Err(tok.error(ODATA0003, "Expected '/' after the type cast in $expand"));
            }
        }

        let target = loop {
            if !tok.next(TokenKind::ODataIdentifier) {
                return Err(tok.error(ODATA0003, "Expected a navigation property in $expand"));
            }
            let name = tok.text();
            let span = tok.span();
            let Some(segment) = member_segment(&current, name)? else {
                return Err(tok.semantic_error(
                    ODATA0101,
                    format!("Property '{name}' does not exist in '{}'", current.name()),
                    span,
                ));
            };
            match &segment.kind {
                UriResourceKind::NavigationProperty(_) => {
                    let target = segment.structured_type().cloned();
                    item.path.push(segment);
                    break target;
                }
                UriResourceKind::ComplexProperty(_) => {
                    let Some(complex) = segment.structured_type().cloned() else {
                        break None;
                    };
                    item.path.push(segment);
                    if !tok.next(TokenKind::Slash) {
                        return Err(tok.error(
                            ODATA0003,
                            format!("'{name}' is not a navigation property; expected '/'"),
                        ));
                    }
                    current = complex;
                }
                _ => {
                    return Err(tok.semantic_error(
                        ODATA0101,
                        format!("'{name}' is not a navigation property of '{}'", current.name()),
                        span,
                    ));
                }
            }
        };
        let Some(mut target) = target else {
            return Err(tok.error(ODATA0003, "Expected a navigation property in $expand"));
        };

        if tok.next(TokenKind::Slash) {
            if tok.next(TokenKind::QualifiedName) {
                let span = tok.span();
                let name = qualified(self.ctx.edm, tok)?;
                let Some(cast) = cast_target(self.ctx.edm, &target, &name)? else {
                    return Err(unknown_type(tok, tok.text(), span));
                };
                apply_type_cast(tok, &mut item.path, Arc::clone(&cast), span)?;
                item.type_filter = Some(Arc::clone(&cast));
                target = cast;
                if tok.next(TokenKind::Slash) {
                    self.expand_suffix(tok, &mut item)?;
                }
            } else {
                self.expand_suffix(tok, &mut item)?;
            }
        }

        if tok.next(TokenKind::Open) {
            let allowed: &[Q] = if item.is_ref {
                &REF_OPTIONS
            } else if item.is_count {
                &COUNT_OPTIONS
            } else {
                &Q::ALL
            };
            item.options = self.nested_options(tok, Some(&target), allowed)?;
        }
        Ok(item)
    }

    fn expand_suffix(&self, tok: &mut Tokenizer<'_>, item: &mut ExpandItem) -> Result<()> {
        if tok.next(TokenKind::Ref) {
            item.is_ref = true;
        } else if tok.next(TokenKind::Count) {
            item.is_count = true;
        } else {
            return Err(tok.error(ODATA0003, "Expected '$ref', '$count' or a type cast"));
        }
        Ok(())
    }

    /// Options inside the parentheses of an expand item; the opening
    /// parenthesis is consumed
    fn nested_options(
        &self,
        tok: &mut Tokenizer<'_>,
        target: Option<&Arc<EdmStructuredType>>,
        allowed: &[Q],
    ) -> Result<QueryOptions> {
        let mut options = QueryOptions::default();
        let mut seen: Vec<Q> = Vec::new();
        let it = target.map(|t| EdmType::structured(Arc::clone(t)));
        loop {
            if !tok.next(TokenKind::SystemQueryOption) {
                return Err(tok.error(ODATA0008, "Expected a system query option inside $expand"));
            }
            let name = tok.text();
            let span = tok.span();
            let Some(kind) = Q::from_name(name) else {
                return Err(tok.error(ODATA0008, format!("Unknown system query option '{name}'")));
            };
            if !kind.allowed_in_expand() || !allowed.contains(&kind) {
                return Err(tok.semantic_error(
                    ODATA0121,
                    format!("{kind} is not allowed here"),
                    span,
                ));
            }
            if seen.contains(&kind) {
                return Err(tok.error(ODATA0009, format!("{kind} given twice")));
            }
            seen.push(kind);
            if !tok.next(TokenKind::Equals) {
                return Err(tok.error(ODATA0013, format!("Expected '=' after {kind}")));
            }
            self.nested_value(tok, &mut options, kind, it.as_ref())?;
            if !tok.next(TokenKind::Semi) {
                break;
            }
        }
        if !tok.next(TokenKind::Close) {
            return Err(tok.error(ODATA0006, "Expected ')' to close the expand options"));
        }
        Ok(options)
    }

    fn nested_value(
        &self,
        tok: &mut Tokenizer<'_>,
        options: &mut QueryOptions,
        kind: Q,
        it: Option<&EdmType>,
    ) -> Result<()> {
        let target = OptionTarget::new(it.cloned());
        match kind {
            Q::Filter => {
                let mut parser = ExpressionParser::new(self.ctx, target.it.clone());
                options.filter = Some(parser.parse_predicate(tok)?);
            }
            Q::OrderBy => options.order_by = self.order_by(tok, &target)?,
            Q::Select => {
                let ty = self.require_structured(tok, kind, &target)?;
                options.select = self.select_list(tok, &ty)?;
            }
            Q::Expand => {
                let ty = self.require_structured(tok, kind, &target)?;
                options.expand = self.expand_list(tok, &ty)?;
            }
            Q::Top | Q::Skip => {
                if !tok.next(TokenKind::Integer) {
                    return Err(tok.error(ODATA0013, format!("{kind} expects a non-negative integer")));
                }
                let value = unsigned(tok, kind, tok.text())?;
                if kind == Q::Top {
                    options.top = Some(value);
                } else {
                    options.skip = Some(value);
                }
            }
            Q::Count => {
                if !tok.next(TokenKind::Boolean) {
                    return Err(tok.error(ODATA0013, "$count expects true or false"));
                }
                options.count = Some(boolean(tok, kind, tok.text())?);
            }
            Q::Levels => {
                let levels = if tok.next(TokenKind::Max) {
                    Levels::Max
                } else if tok.next(TokenKind::Integer) {
                    let value = tok.text().parse::<u32>().map_err(|_| {
                        tok.error(ODATA0013, "$levels expects a positive integer or max")
                    })?;
                    if let Some(max) = self.ctx.options.max_expand_levels.filter(|max| value > *max) {
                        return Err(tok.semantic_error(
                            ODATA0122,
                            format!("$levels={value} exceeds the allowed maximum of {max}"),
                            tok.span(),
                        ));
                    }
                    Levels::Value(value)
                } else {
                    return Err(tok.error(ODATA0013, "$levels expects a positive integer or max"));
                };
                options.levels = Some(levels);
            }
            Q::Search => {
                let value = tok.next_raw().trim();
                options.search = Some(non_empty(tok, kind, value)?);
            }
            Q::Format | Q::SkipToken | Q::DeltaToken | Q::Id => {
                return Err(tok.semantic_error(
                    ODATA0121,
                    format!("{kind} is not allowed inside $expand"),
                    tok.span(),
                ));
            }
        }
        Ok(())
    }
}

fn unsigned(tok: &Tokenizer<'_>, kind: Q, value: &str) -> Result<u64> {
    value.trim().parse::<u64>().map_err(|_| {
        tok.error(
            ODATA0013,
            format!("{kind} expects a non-negative integer, found '{value}'"),
        )
    })
}

fn boolean(tok: &Tokenizer<'_>, kind: Q, value: &str) -> Result<bool> {
    match value.trim() {
        v if v.eq_ignore_ascii_case("true") => Ok(true),
        v if v.eq_ignore_ascii_case("false") => Ok(false),
        _ => Err(tok.error(ODATA0013, format!("{kind} expects true or false, found '{value}'"))),
    }
}

fn media_format(tok: &Tokenizer<'_>, value: &str) -> Result<String> {
    let value = value.trim();
    let known = ["json", "xml", "atom"].contains(&value)
        || value
            .split_once('/')
            .is_some_and(|(kind, subtype)| !kind.is_empty() && !subtype.is_empty());
    if !known {
        return Err(tok.error(
            ODATA0013,
            format!("'{value}' is not json, xml, atom or a media type"),
        ));
    }
    Ok(value.to_string())
}

fn non_empty(tok: &Tokenizer<'_>, kind: Q, value: &str) -> Result<String> {
    if value.trim().is_empty() {
        return Err(tok.error(ODATA0013, format!("{kind} requires a value")));
    }
    Ok(value.to_string())
}
