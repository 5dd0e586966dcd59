//! Entry point: splits a request URI, decodes it and drives the resolvers

use crate::context::ParseContext;
use crate::expression::{ExpressionParser, require_predicate};
use crate::lexer::{LexMode, TokenKind, Tokenizer};
use crate::path::ResourcePathParser;
use crate::query::{OptionTarget, QueryOptionParser};
use crate::ParserOptions;
use indexmap::IndexMap;
use log::{debug, trace};
use octofhir_odata_ast::{
    AliasValue, Expression, SystemQueryOptionKind as Q, UriInfo, UriInfoKind, UriResource,
    UriResourceKind,
};
use octofhir_odata_diagnostics::{
    ODATA0009, ODATA0003, ODATA0006, ODATA0008, ODATA0011, ODATA0012, ODATA0013, ODATA0014,
    ODATA0015, ODATA0017, ODATA0019, ODATA0100, ODATA0102, ODATA0121, ODataError, Result, Span,
};
use octofhir_odata_edm::{Edm, EdmType};
use octofhir_odata_types::FullQualifiedName;
use percent_encoding::percent_decode_str;

/// Resolves request URIs against one service model
///
/// ```ignore
/// let parser = UriParser::new(edm);
/// let info = parser.parse("ESAllPrim(1)/PropertyString", None)?;
/// ```
#[derive(Debug, Clone)]
pub struct UriParser {
    edm: Edm,
    options: ParserOptions,
}

/// Query string split into its three kinds of parameters, decoded
#[derive(Debug, Default)]
struct RawQuery {
    system: Vec<(Q, String)>,
    aliases: IndexMap<String, AliasValue>,
    custom: IndexMap<String, String>,
}

impl UriParser {
    pub fn new(edm: Edm) -> Self {
        Self::with_options(edm, ParserOptions::default())
    }

    pub fn with_options(edm: Edm, options: ParserOptions) -> Self {
        Self { edm, options }
    }

    pub fn edm(&self) -> &Edm {
        &self.edm
    }

    pub fn options(&self) -> &ParserOptions {
        &self.options
    }

    /// Parse a full relative URI such as `ESAllPrim(1)?$select=PropertyString`
    pub fn parse_uri(&self, uri: &str) -> Result<UriInfo> {
        let uri = uri.split_once('#').map_or(uri, |(before, _)| before);
        match uri.split_once('?') {
            Some((path, query)) => self.parse(path, Some(query)),
            None => self.parse(uri, None),
        }
    }

    /// Parse a resource path relative to the service root and an optional
    /// query string without the leading `?`
    pub fn parse(&self, path: &str, query: Option<&str>) -> Result<UriInfo> {
        let raw = split_query(query.unwrap_or_default())?;
        let mut ctx = ParseContext::new(&self.edm, &self.options);
        *ctx.aliases.borrow_mut() = raw.aliases;

        let segments = split_path(path)?;
        let mut info = self.resource(&mut ctx, &segments, &raw.system)?;

        let target = option_target(&info);
        let allowed = allowed_options(info.kind);
        {
            let parser = QueryOptionParser::new(&ctx);
            for (kind, value) in &raw.system {
                if !allowed.contains(kind) {
                    return Err(ODataError::semantic(
                        ODATA0121,
                        format!("{kind} is not allowed for a {:?} request", info.kind),
                    ));
                }
                parser
                    .apply(&mut info.query, *kind, value, &target)
                    .map_err(|e| e.locate(value, Span::new(0, value.len())))?;
            }
        }
        info.query.custom = raw.custom;
        info.aliases = ctx.into_aliases();
        debug!(
            "parsed '{path}' as {:?} with {} segment(s)",
            info.kind,
            info.resource_path.len()
        );
        Ok(info)
    }

    /// Parse a standalone `$filter` value with `$it` bound to `it`
    pub fn parse_filter(&self, it: Option<EdmType>, filter: &str) -> Result<Expression> {
        let ctx = ParseContext::new(&self.edm, &self.options);
        let mut tok = Tokenizer::new(filter, LexMode::Query);
        let mut parser = ExpressionParser::new(&ctx, it);
        let expression = parser.parse(&mut tok)?;
        if !tok.next(TokenKind::End) {
            return Err(tok.error(
                ODATA0019,
                format!("Unexpected '{}' after the expression", tok.rest().trim_start()),
            ));
        }
        require_predicate(&tok, &expression)?;
        Ok(expression)
    }

    /// Parse any common expression with `$it` bound to `it`
    pub fn parse_expression(&self, it: Option<EdmType>, text: &str) -> Result<Expression> {
        let ctx = ParseContext::new(&self.edm, &self.options);
        ExpressionParser::new(&ctx, it).parse_all(text)
    }

    fn resource(
        &self,
        ctx: &mut ParseContext<'_>,
        segments: &[String],
        system: &[(Q, String)],
    ) -> Result<UriInfo> {
        let Some(first) = segments.first() else {
            return Ok(UriInfo::new(UriInfoKind::Service));
        };
        let standalone = |kind: UriInfoKind| {
            if segments.len() > 1 {
                return Err(ODataError::syntax(
                    ODATA0017,
                    format!("'{first}' must be the only path segment"),
                    segments.join("/"),
                ));
            }
            Ok(UriInfo::new(kind))
        };
        match first.as_str() {
            "$metadata" => return standalone(UriInfoKind::Metadata),
            "$batch" => return standalone(UriInfoKind::Batch),
            "$all" => return standalone(UriInfoKind::All),
            "$entity" => return self.entity(ctx, segments, system),
            _ => {}
        }
        if let Some(rest) = first.strip_prefix("$crossjoin") {
            if segments.len() > 1 {
                return Err(ODataError::syntax(
                    ODATA0017,
                    "$crossjoin must be the only path segment",
                    segments.join("/"),
                ));
            }
            let names = crossjoin_names(ctx, rest)?;
            ctx.crossjoin.clone_from(&names);
            let mut info = UriInfo::new(UriInfoKind::CrossJoin);
            info.entity_set_names = names;
            return Ok(info);
        }

        let mut info = UriInfo::new(UriInfoKind::Resource);
        info.resource_path = ResourcePathParser::new(ctx).parse(segments)?;
        Ok(info)
    }

    fn entity(
        &self,
        ctx: &ParseContext<'_>,
        segments: &[String],
        system: &[(Q, String)],
    ) -> Result<UriInfo> {
        if !system.iter().any(|(kind, _)| *kind == Q::Id) {
            return Err(ODataError::syntax(
                ODATA0013,
                "$entity requires a $id query option",
                segments.join("/"),
            ));
        }
        let mut info = UriInfo::new(UriInfoKind::Entity);
        match segments {
            [_] => {}
            [_, cast] => {
                let entity = match FullQualifiedName::parse(cast) {
                    Some(name) => ctx.edm.entity_type(&name)?,
                    None => None,
                };
                let Some(entity) = entity else {
                    return Err(ODataError::semantic_at(
                        ODATA0102,
                        format!("'{cast}' is not an entity type"),
                        cast,
                        Span::new(0, cast.len()),
                    ));
                };
                info.entity_type_cast = Some(entity);
            }
            _ => {
                return Err(ODataError::syntax(
                    ODATA0017,
                    "$entity takes at most a type cast segment",
                    segments.join("/"),
                ));
            }
        }
        Ok(info)
    }
}

fn crossjoin_names(ctx: &ParseContext<'_>, rest: &str) -> Result<Vec<String>> {
    let mut tok = Tokenizer::new(rest, LexMode::Path);
    if !tok.next(TokenKind::Open) {
        return Err(tok.error(ODATA0006, "Expected '(' after $crossjoin"));
    }
    let mut names = Vec::new();
    if tok.next(TokenKind::Close) {
        return Err(tok.error(ODATA0012, "$crossjoin needs at least one entity set"));
    }
    let container = ctx.container()?;
    loop {
        if !tok.next(TokenKind::ODataIdentifier) {
            return Err(tok.error(ODATA0003, "Expected an entity set name in $crossjoin"));
        }
        let name = tok.text();
        if container.entity_set(name)?.is_none() {
            return Err(tok.semantic_error(
                ODATA0100,
                format!("'{name}' is not an entity set"),
                tok.span(),
            ));
        }
        names.push(name.to_string());
        if !tok.next(TokenKind::Comma) {
            break;
        }
    }
    if !(tok.next(TokenKind::Close) && tok.next(TokenKind::End)) {
        return Err(tok.error(ODATA0006, "Expected ')' to close $crossjoin"));
    }
    trace!("crossjoin over {}", names.join(","));
    Ok(names)
}

/// The element `$it` stands for in the options of `info`
fn option_target(info: &UriInfo) -> OptionTarget {
    match info.kind {
        UriInfoKind::Entity => {
            OptionTarget::new(info.entity_type_cast.clone().map(EdmType::structured))
        }
        UriInfoKind::Resource => {
            let addressed = info
                .resource_path
                .iter()
                .rev()
                .find(|s| !matches!(s.kind, UriResourceKind::Count | UriResourceKind::Ref));
            OptionTarget::new(addressed.and_then(element_type))
        }
        _ => OptionTarget::default(),
    }
}

fn element_type(segment: &UriResource) -> Option<EdmType> {
    segment
        .structured_type()
        .cloned()
        .map(EdmType::structured)
        .or_else(|| segment.type_.clone())
}

fn allowed_options(kind: UriInfoKind) -> &'static [Q] {
    match kind {
        UriInfoKind::Service | UriInfoKind::Metadata => &[Q::Format],
        UriInfoKind::Batch => &[],
        UriInfoKind::Entity => &[Q::Id, Q::Select, Q::Expand, Q::Format],
        UriInfoKind::CrossJoin | UriInfoKind::All => &[
            Q::Filter,
            Q::OrderBy,
            Q::Top,
            Q::Skip,
            Q::Count,
            Q::Format,
            Q::SkipToken,
            Q::Search,
        ],
        UriInfoKind::Resource => &Q::ALL,
    }
}

/// Split a resource path on `/` and decode each segment
///
/// A leading and a single trailing `/` are ignored; an empty segment
/// anywhere else is an error.
fn split_path(path: &str) -> Result<Vec<String>> {
    let path = path.strip_prefix('/').unwrap_or(path);
    let path = path.strip_suffix('/').unwrap_or(path);
    if path.is_empty() {
        return Ok(Vec::new());
    }
    path.split('/')
        .map(|segment| {
            if segment.is_empty() {
                return Err(ODataError::syntax(
                    ODATA0011,
                    "Empty path segment",
                    path.to_string(),
                ));
            }
            decode(segment)
        })
        .collect()
}

fn split_query(query: &str) -> Result<RawQuery> {
    let mut raw = RawQuery::default();
    for part in query.split('&').filter(|p| !p.is_empty()) {
        let (name, value) = part.split_once('=').unwrap_or((part, ""));
        let name = decode(name)?;
        let value = decode(value)?;
        if let Some(alias) = name.strip_prefix('@') {
            if raw.aliases.contains_key(alias) {
                return Err(ODataError::syntax(
                    ODATA0015,
                    format!("Alias '@{alias}' is defined twice"),
                    query.to_string(),
                ));
            }
            raw.aliases.insert(
                alias.to_string(),
                AliasValue {
                    text: value,
                    expression: None,
                },
            );
        } else if name.starts_with('$') {
            let Some(kind) = Q::from_name(&name) else {
                return Err(ODataError::syntax(
                    ODATA0008,
                    format!("Unknown system query option '{name}'"),
                    query.to_string(),
                ));
            };
            if raw.system.iter().any(|(seen, _)| *seen == kind) {
                return Err(ODataError::syntax(
                    ODATA0009,
                    format!("{kind} given more than once"),
                    query.to_string(),
                ));
            }
            raw.system.push((kind, value));
        } else {
            raw.custom.insert(name, value);
        }
    }
    Ok(raw)
}

/// Percent-decode one segment or query component
fn decode(text: &str) -> Result<String> {
    let bytes = text.as_bytes();
    let malformed = bytes.iter().enumerate().any(|(i, b)| {
        *b == b'%'
            && !bytes
                .get(i + 1..i + 3)
                .is_some_and(|hex| hex.iter().all(u8::is_ascii_hexdigit))
    });
    if malformed {
        return Err(ODataError::syntax(
            ODATA0014,
            format!("Malformed percent-encoding in '{text}'"),
            text.to_string(),
        ));
    }
    percent_decode_str(text)
        .decode_utf8()
        .map(|decoded| decoded.into_owned())
        .map_err(|e| {
            ODataError::syntax(
                ODATA0014,
                format!("Percent-encoded text is not UTF-8: {e}"),
                text.to_string(),
            )
        })
}
