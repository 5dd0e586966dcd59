//! Signatures of the canonical functions
//!
//! `cast` and `isof` take a type name and are checked by the expression
//! parser itself; every other method is described by [`signature`].

use octofhir_odata_ast::{Expression, MethodKind};
use octofhir_odata_diagnostics::{ErrorCode, ODATA0114, ODATA0115};
use octofhir_odata_edm::EdmType;
use octofhir_odata_types::EdmPrimitiveTypeKind as K;

/// Accepted kinds for one parameter
#[derive(Debug, Clone, Copy)]
enum Param {
    Of(&'static [K]),
    /// Any collection of primitives
    Collection,
}

#[derive(Debug, Clone, Copy)]
enum Returns {
    Fixed(K),
    /// The kind the first argument was accepted as
    FirstArgument,
}

#[derive(Debug, Clone, Copy)]
struct Signature {
    params: &'static [Param],
    /// Trailing parameters that may be left out
    optional: usize,
    returns: Returns,
}

const STRING: Param = Param::Of(&[K::String]);
const INT32: Param = Param::Of(&[K::Int32]);
const DATE: Param = Param::Of(&[K::Date, K::DateTimeOffset]);
const TIME: Param = Param::Of(&[K::TimeOfDay, K::DateTimeOffset]);
const DATE_TIME_OFFSET: Param = Param::Of(&[K::DateTimeOffset]);
const ROUNDABLE: Param = Param::Of(&[K::Decimal, K::Double, K::Single]);
const GEO: Param = Param::Of(&[K::Geography, K::Geometry]);

const fn sig(params: &'static [Param], returns: Returns) -> Signature {
    Signature {
        params,
        optional: 0,
        returns,
    }
}

fn signature(method: MethodKind) -> Option<Signature> {
    use Returns::{FirstArgument, Fixed};
    Some(match method {
        MethodKind::Contains | MethodKind::StartsWith | MethodKind::EndsWith => {
            sig(&[STRING, STRING], Fixed(K::Boolean))
        }
        MethodKind::MatchesPattern => sig(&[STRING, STRING], Fixed(K::Boolean)),
        MethodKind::Length => sig(&[STRING], Fixed(K::Int32)),
        MethodKind::IndexOf => sig(&[STRING, STRING], Fixed(K::Int32)),
        MethodKind::Substring => Signature {
            params: &[STRING, INT32, INT32],
            optional: 1,
            returns: Fixed(K::String),
        },
        MethodKind::ToLower | MethodKind::ToUpper | MethodKind::Trim => {
            sig(&[STRING], Fixed(K::String))
        }
        MethodKind::Concat => sig(&[STRING, STRING], Fixed(K::String)),
        MethodKind::Year | MethodKind::Month | MethodKind::Day => sig(&[DATE], Fixed(K::Int32)),
        MethodKind::Hour | MethodKind::Minute | MethodKind::Second => sig(&[TIME], Fixed(K::Int32)),
        MethodKind::FractionalSeconds => sig(&[TIME], Fixed(K::Decimal)),
        MethodKind::TotalSeconds => sig(&[Param::Of(&[K::Duration])], Fixed(K::Decimal)),
        MethodKind::Date => sig(&[DATE_TIME_OFFSET], Fixed(K::Date)),
        MethodKind::Time => sig(&[DATE_TIME_OFFSET], Fixed(K::TimeOfDay)),
        MethodKind::TotalOffsetMinutes => sig(&[DATE_TIME_OFFSET], Fixed(K::Int32)),
        MethodKind::MinDateTime | MethodKind::MaxDateTime | MethodKind::Now => {
            sig(&[], Fixed(K::DateTimeOffset))
        }
        MethodKind::Round | MethodKind::Floor | MethodKind::Ceiling => {
            sig(&[ROUNDABLE], FirstArgument)
        }
        MethodKind::GeoDistance => sig(&[GEO, GEO], Fixed(K::Double)),
        MethodKind::GeoLength => sig(&[GEO], Fixed(K::Double)),
        MethodKind::GeoIntersects => sig(&[GEO, GEO], Fixed(K::Boolean)),
        MethodKind::HasSubset | MethodKind::HasSubsequence => {
            sig(&[Param::Collection, Param::Collection], Fixed(K::Boolean))
        }
        MethodKind::Cast | MethodKind::IsOf => return None,
    })
}

/// Check arguments of a canonical function and compute its result kind
///
/// `null` arguments are accepted for any parameter.
pub(crate) fn check_call(
    method: MethodKind,
    arguments: &[Expression],
) -> std::result::Result<EdmType, (ErrorCode, String)> {
    let Some(signature) = signature(method) else {
        return Err((ODATA0115, format!("'{method}' is not a plain function")));
    };
    let max = signature.params.len();
    let min = max - signature.optional;
    if arguments.len() < min || arguments.len() > max {
        let expected = if min == max {
            min.to_string()
        } else {
            format!("{min} to {max}")
        };
        return Err((
            ODATA0114,
            format!("'{method}' takes {expected} argument(s), found {}", arguments.len()),
        ));
    }

    let mut first = None;
    for (position, (param, argument)) in signature.params.iter().zip(arguments).enumerate() {
        let accepted = accept(*param, argument).ok_or_else(|| {
            (
                ODATA0115,
                format!(
                    "Argument {} of '{method}' cannot be {}",
                    position + 1,
                    describe(argument)
                ),
            )
        })?;
        if position == 0 {
            first = accepted;
        }
    }

    let kind = match signature.returns {
        Returns::Fixed(kind) => kind,
        Returns::FirstArgument => first.unwrap_or(K::Decimal),
    };
    Ok(EdmType::Primitive(kind))
}

/// The parameter kind `argument` is accepted as; `Some(None)` for nulls
/// and collections
fn accept(param: Param, argument: &Expression) -> Option<Option<K>> {
    if argument.is_null() {
        return Some(None);
    }
    let kind = argument.type_.as_ref().and_then(EdmType::primitive_kind);
    match param {
        Param::Collection => argument.is_collection.then_some(None),
        Param::Of(_) if argument.is_collection => None,
        Param::Of(kinds) => {
            let kind = kind?;
            kinds
                .iter()
                .copied()
                .find(|k| *k == kind)
                .or_else(|| kinds.iter().copied().find(|k| kind.is_compatible_with(*k)))
                .map(Some)
        }
    }
}

fn describe(argument: &Expression) -> String {
    let name = argument
        .type_
        .as_ref()
        .map_or_else(|| "untyped".to_string(), ToString::to_string);
    if argument.is_collection {
        format!("a collection of {name}")
    } else {
        format!("of type {name}")
    }
}
