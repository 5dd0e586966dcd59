//! Resolution steps shared by resource paths, member expressions,
//! `$select` and `$expand`

use crate::context::ParseContext;
use crate::lexer::{TokenKind, Tokenizer};
use log::trace;
use octofhir_odata_ast::{KeyPredicate, UriResource, UriResourceKind};
use octofhir_odata_diagnostics::{
    ODATA0006, ODATA0010, ODATA0102, ODATA0104, ODATA0106, ODATA0107, ODATA0120, ODATA0124,
    ODataError, Result, Span,
};
use octofhir_odata_edm::{
    Edm, EdmKeyPropertyRef, EdmNavigationProperty, EdmOperation, EdmStructuredType, EdmType,
};
use octofhir_odata_types::FullQualifiedName;
use smallvec::SmallVec;
use std::sync::Arc;

pub(crate) type Keys = SmallVec<[KeyPredicate; 2]>;

/// Property or navigation property `name` of `owner` as a segment
pub(crate) fn member_segment(owner: &EdmStructuredType, name: &str) -> Result<Option<UriResource>> {
    if let Some(property) = owner.property(name)? {
        let ty = property.type_()?;
        let collection = property.is_collection();
        let kind = if ty.is_structured() {
            UriResourceKind::ComplexProperty(property)
        } else {
            UriResourceKind::PrimitiveProperty(property)
        };
        return Ok(Some(UriResource::new(kind, Some(ty), collection)));
    }
    if let Some(navigation) = owner.navigation_property(name)? {
        let target = navigation.target_type()?;
        let collection = navigation.is_collection();
        return Ok(Some(UriResource::new(
            UriResourceKind::NavigationProperty(navigation),
            Some(EdmType::Entity(target)),
            collection,
        )));
    }
    Ok(None)
}

/// Qualified name with any schema alias replaced by its namespace
pub(crate) fn qualified(edm: &Edm, tok: &Tokenizer<'_>) -> Result<FullQualifiedName> {
    let text = tok.text();
    let name = FullQualifiedName::parse(text).ok_or_else(|| {
        tok.semantic_error(ODATA0102, format!("'{text}' is not a qualified name"), tok.span())
    })?;
    edm.resolve_alias(&name)
}

/// Structured type named `name` of the same kind as `current`
pub(crate) fn cast_target(
    edm: &Edm,
    current: &EdmStructuredType,
    name: &FullQualifiedName,
) -> Result<Option<Arc<EdmStructuredType>>> {
    if current.is_entity() {
        edm.entity_type(name)
    } else {
        edm.complex_type(name)
    }
}

/// Fold a type cast into the last segment of `path`
pub(crate) fn apply_type_cast(
    tok: &Tokenizer<'_>,
    path: &mut [UriResource],
    cast: Arc<EdmStructuredType>,
    span: Span,
) -> Result<()> {
    let Some(last) = path.last_mut() else {
        return Ok(());
    };
    let Some(current) = last.structured_type().cloned() else {
        return Err(tok.semantic_error(
            ODATA0106,
            format!("Cannot cast a non-structured value to '{}'", cast.name()),
            span,
        ));
    };
    if last.type_filter.is_some() || matches!(last.kind, UriResourceKind::TypeCast(_)) {
        return Err(tok.semantic_error(
            ODATA0107,
            format!("'{}' already carries a type cast", last.segment_name()),
            span,
        ));
    }
    check_cast(tok, &current, &cast, span)?;
    trace!("type cast {} -> {}", current.name(), cast.name());
    last.type_ = Some(EdmType::structured(Arc::clone(&cast)));
    last.type_filter = Some(cast);
    Ok(())
}

/// `cast` must derive from `current`
pub(crate) fn check_cast(
    tok: &Tokenizer<'_>,
    current: &EdmStructuredType,
    cast: &EdmStructuredType,
    span: Span,
) -> Result<()> {
    if cast.kind() != current.kind() || !cast.compatible_to(Some(current))? {
        return Err(tok.semantic_error(
            ODATA0106,
            format!("Type '{}' is not derived from '{}'", cast.name(), current.name()),
            span,
        ));
    }
    Ok(())
}

/// Bound action named `name` for a binding type or, failing that, one of its bases
pub(crate) fn bound_action(
    edm: &Edm,
    name: &FullQualifiedName,
    binding: &EdmType,
    is_collection: bool,
) -> Result<Option<Arc<EdmOperation>>> {
    for_binding_types(binding, |type_name| edm.bound_action(name, type_name, is_collection))
}

/// Bound function overload for a binding type or, failing that, one of its bases
pub(crate) fn bound_function(
    edm: &Edm,
    name: &FullQualifiedName,
    binding: &EdmType,
    is_collection: bool,
    parameter_names: Option<&[&str]>,
) -> Result<Option<Arc<EdmOperation>>> {
    for_binding_types(binding, |type_name| {
        edm.bound_function(name, type_name, is_collection, parameter_names)
    })
}

fn for_binding_types<F>(binding: &EdmType, mut probe: F) -> Result<Option<Arc<EdmOperation>>>
where
    F: FnMut(&FullQualifiedName) -> Result<Option<Arc<EdmOperation>>>,
{
    if let Some(found) = probe(&binding.full_qualified_name())? {
        return Ok(Some(found));
    }
    let Some(structured) = binding.as_structured() else {
        return Ok(None);
    };
    let mut next = structured.base_type()?;
    while let Some(base) = next {
        if let Some(found) = probe(base.name())? {
            return Ok(Some(found));
        }
        next = base.base_type()?;
    }
    Ok(None)
}

/// Result type and collection flag of an operation call
pub(crate) fn operation_result(operation: &EdmOperation) -> Result<(Option<EdmType>, bool)> {
    match operation.return_type() {
        Some(returns) => Ok((Some(returns.type_()?), returns.is_collection())),
        None => Ok((None, false)),
    }
}

/// Navigation that led to a key predicate, for referential constraint lookup
pub(crate) struct KeySource<'p> {
    pub(crate) navigation: &'p EdmNavigationProperty,
    pub(crate) parent_keys: &'p [KeyPredicate],
}

/// Parse the inside of a key predicate; the opening parenthesis is consumed
///
/// A single remaining key may be written positionally. Keys fixed by a
/// referential constraint of the partner navigation are taken from the
/// parent segment and need not be repeated.
pub(crate) fn parse_key_predicate(
    ctx: &ParseContext<'_>,
    tok: &mut Tokenizer<'_>,
    entity: &EdmStructuredType,
    source: Option<KeySource<'_>>,
) -> Result<Keys> {
    let start = tok.span();
    let refs = entity.key_property_refs()?;
    let mut keys = Keys::new();

    if let Some(source) = source {
        if let Some(partner) = source.navigation.partner()? {
            for key in refs {
                if let Some(referenced) = partner.referenced_property_name(key.name()) {
                    let text = source
                        .parent_keys
                        .iter()
                        .find(|k| k.name == referenced)
                        .map(|k| k.text.clone())
                        .unwrap_or_default();
                    keys.push(KeyPredicate::new(key.name(), text).with_referenced_property(referenced));
                }
            }
        }
    }
    let remaining: Vec<&Arc<EdmKeyPropertyRef>> = refs
        .iter()
        .filter(|r| !keys.iter().any(|k| k.name == r.name()))
        .collect();

    if tok.next(TokenKind::Close) {
        if remaining.is_empty() && !keys.is_empty() {
            return Ok(keys);
        }
        return Err(tok.semantic_error(
            ODATA0104,
            format!("'{}' expects {} key value(s), found none", entity.name(), remaining.len()),
            start.merge(tok.span()),
        ));
    }

    let state = tok.save();
    let named = tok.next(TokenKind::ODataIdentifier) && tok.next(TokenKind::Equals);
    tok.restore(state);

    if !named {
        let [only] = remaining.as_slice() else {
            return Err(tok.semantic_error(
                ODATA0104,
                format!("'{}' has {} key properties; name each of them", entity.name(), remaining.len()),
                start,
            ));
        };
        keys.push(key_value(ctx, tok, only)?);
    } else {
        loop {
            if !tok.next(TokenKind::ODataIdentifier) {
                return Err(tok.error(ODATA0010, "Expected a key property name"));
            }
            let name = tok.text();
            let span = tok.span();
            if keys.iter().any(|k| k.name == name) {
                return Err(tok.error(ODATA0010, format!("Key property '{name}' given twice")));
            }
            let Some(key) = remaining.iter().find(|r| r.name() == name) else {
                return Err(tok.semantic_error(
                    ODATA0104,
                    format!("'{name}' is not a key property of '{}'", entity.name()),
                    span,
                ));
            };
            if !tok.next(TokenKind::Equals) {
                return Err(tok.error(ODATA0010, "Expected '=' after key property name"));
            }
            keys.push(key_value(ctx, tok, key)?);
            if !tok.next(TokenKind::Comma) {
                break;
            }
        }
    }

    if !tok.next(TokenKind::Close) {
        return Err(tok.error(ODATA0006, "Expected ')' to close the key predicate"));
    }
    if keys.len() != refs.len() {
        return Err(tok.semantic_error(
            ODATA0104,
            format!("'{}' expects {} key value(s), found {}", entity.name(), refs.len(), keys.len()),
            start.merge(tok.span()),
        ));
    }
    trace!("key predicate of {}: {} value(s)", entity.name(), keys.len());
    Ok(keys)
}

fn key_value(
    ctx: &ParseContext<'_>,
    tok: &mut Tokenizer<'_>,
    key: &EdmKeyPropertyRef,
) -> Result<KeyPredicate> {
    if tok.next(TokenKind::ParameterAlias) {
        let alias = &tok.text()[1..];
        if !ctx.has_alias(alias) && !ctx.options.allow_undefined_aliases {
            return Err(tok.semantic_error(
                ODATA0120,
                format!("Alias '@{alias}' has no value"),
                tok.span(),
            ));
        }
        return Ok(KeyPredicate::new(key.name(), tok.text()).with_alias(alias));
    }
    let Some(kind) = tok.next_literal() else {
        return Err(tok.error(ODATA0010, format!("Expected a value for key '{}'", key.name())));
    };
    let text = tok.text();
    check_key_literal(ctx.edm, tok, key, kind, text)?;
    Ok(KeyPredicate::new(key.name(), text))
}

fn check_key_literal(
    edm: &Edm,
    tok: &Tokenizer<'_>,
    key: &EdmKeyPropertyRef,
    kind: TokenKind,
    text: &str,
) -> Result<()> {
    let property = key.property();
    let invalid = |reason: String| {
        tok.semantic_error(
            ODATA0124,
            format!("'{text}' is not a valid value for key '{}': {reason}", key.name()),
            tok.span(),
        )
    };
    if kind == TokenKind::Null {
        return Err(invalid("keys cannot be null".to_string()));
    }
    match property.type_()? {
        EdmType::Enum(enum_type) => {
            let members = match kind {
                TokenKind::String => &text[1..text.len() - 1],
                TokenKind::Enum => {
                    let (name, quoted) = text.split_at(text.find('\'').unwrap_or(text.len()));
                    let name = FullQualifiedName::parse(name)
                        .map(|name| edm.resolve_alias(&name))
                        .transpose()?;
                    if name.as_ref() != Some(enum_type.name()) {
                        return Err(invalid(format!("expected a member of '{}'", enum_type.name())));
                    }
                    quoted.trim_matches('\'')
                }
                _ => return Err(invalid(format!("expected a member of '{}'", enum_type.name()))),
            };
            enum_type
                .value_of_string(members)
                .map_err(|e| invalid(e.to_string()))?;
        }
        ty => {
            let Some(primitive) = ty.primitive_kind() else {
                return Err(invalid(format!("'{ty}' cannot be a key")));
            };
            primitive
                .parse_literal(text, property.facets())
                .map_err(|e| invalid(e.to_string()))?;
        }
    }
    Ok(())
}

/// Key predicate following a collection-valued segment, if one is written
///
/// The key folds into the segment unless it already carries a type filter,
/// in which case it becomes a segment of its own.
pub(crate) fn attach_keys(
    ctx: &ParseContext<'_>,
    tok: &mut Tokenizer<'_>,
    path: &mut Vec<UriResource>,
) -> Result<()> {
    let Some((last, parents)) = path.split_last() else {
        return Ok(());
    };
    if !last.is_collection || !tok.peek(TokenKind::Open) {
        return Ok(());
    }
    let Some(entity) = last.structured_type().filter(|t| t.is_entity()).cloned() else {
        return Ok(());
    };
    let navigation = match &last.kind {
        UriResourceKind::NavigationProperty(nav) => Some(Arc::clone(nav)),
        _ => None,
    };
    let parent_keys = nearest_keys(parents).to_vec();
    tok.next(TokenKind::Open);
    let source = navigation.as_deref().map(|navigation| KeySource {
        navigation,
        parent_keys: &parent_keys,
    });
    let keys = parse_key_predicate(ctx, tok, &entity, source)?;

    let folds = last.type_filter.is_none();
    if folds {
        if let Some(last) = path.last_mut() {
            last.keys = keys;
            last.is_collection = false;
        }
    } else {
        let mut segment = UriResource::new(
            UriResourceKind::KeyPredicate,
            Some(EdmType::Entity(entity)),
            false,
        );
        segment.keys = keys;
        path.push(segment);
    }
    Ok(())
}

/// Keys of the closest segment that has any
fn nearest_keys(path: &[UriResource]) -> &[KeyPredicate] {
    path.iter()
        .rev()
        .find(|s| !s.keys.is_empty())
        .map_or(&[][..], |s| s.keys.as_slice())
}

/// Error for a name that resolves to nothing
pub(crate) fn unknown_type(tok: &Tokenizer<'_>, name: &str, span: Span) -> ODataError {
    tok.semantic_error(ODATA0102, format!("Type '{name}' does not exist"), span)
}
