//! Operand typing for unary and binary operators

use crate::lexer::Tokenizer;
use octofhir_odata_ast::{BinaryOperator, Expression, ExpressionKind, UnaryOperator};
use octofhir_odata_diagnostics::{ErrorCode, ODATA0112, ODATA0118, ODATA0126, ODataError, Span};
use octofhir_odata_edm::{EdmEnumType, EdmStructuredType, EdmType};
use octofhir_odata_types::{ArithmeticOperator, EdmPrimitiveTypeKind as K, Facets};
use std::sync::Arc;

/// Why an operator application could not be typed
#[derive(Debug)]
pub(crate) enum TypingError {
    /// The operand types do not fit the operator
    Mismatch(ErrorCode, String),
    /// The model failed while the operands were inspected
    Model(ODataError),
}

impl TypingError {
    /// Attach a mismatch to the operator's place in the source
    pub(crate) fn at(self, tok: &Tokenizer<'_>, span: Span) -> ODataError {
        match self {
            Self::Mismatch(code, message) => tok.semantic_error(code, message, span),
            Self::Model(error) => error,
        }
    }
}

impl From<ODataError> for TypingError {
    fn from(error: ODataError) -> Self {
        Self::Model(error)
    }
}

pub(crate) type TypingResult<T> = std::result::Result<T, TypingError>;

/// What an operand is, as far as operators care
enum Operand<'a> {
    Null,
    Primitive(K),
    Enum(&'a Arc<EdmEnumType>),
    Structured(&'a Arc<EdmStructuredType>),
}

fn operand(expression: &Expression) -> Operand<'_> {
    match &expression.type_ {
        None => Operand::Null,
        Some(EdmType::Enum(e)) => Operand::Enum(e),
        Some(EdmType::Complex(t) | EdmType::Entity(t)) => Operand::Structured(t),
        Some(ty) => ty.primitive_kind().map_or(Operand::Null, Operand::Primitive),
    }
}

fn type_name(expression: &Expression) -> String {
    expression
        .type_
        .as_ref()
        .map_or_else(|| "null".to_string(), ToString::to_string)
}

fn boolean() -> Option<EdmType> {
    Some(EdmType::Primitive(K::Boolean))
}

/// Retype an integer literal to `target` when the value fits
///
/// `PropertyInt64 eq 1` compares two Int64 values rather than an Int64
/// with an SByte.
fn adapt_integer_literal(literal: &mut Expression, target: K) {
    if !target.is_numeric() {
        return;
    }
    let ExpressionKind::Literal(value) = &mut literal.kind else {
        return;
    };
    let Some(number) = value.value.as_ref().and_then(|v| v.as_i64()) else {
        return;
    };
    if !target.can_hold(number) {
        return;
    }
    let Ok(retyped) = target.value_of_string(&number.to_string(), &Facets::default()) else {
        return;
    };
    value.value = Some(retyped);
    literal.type_ = Some(EdmType::Primitive(target));
}

fn is_integer_literal(expression: &Expression) -> bool {
    expression
        .as_literal()
        .and_then(|l| l.value.as_ref())
        .is_some_and(|v| v.kind().is_integral())
}

/// Retype whichever side is an integer literal to the other side's kind
pub(crate) fn align_literals(left: &mut Expression, right: &mut Expression) {
    let left_kind = left.type_.as_ref().and_then(EdmType::primitive_kind);
    let right_kind = right.type_.as_ref().and_then(EdmType::primitive_kind);
    match (is_integer_literal(left), is_integer_literal(right)) {
        (true, false) => {
            if let Some(kind) = right_kind {
                adapt_integer_literal(left, kind);
            }
        }
        (false, true) => {
            if let Some(kind) = left_kind {
                adapt_integer_literal(right, kind);
            }
        }
        _ => {}
    }
}

/// Whether values of the two operands can be compared for equality
fn comparable(left: &Expression, right: &Expression) -> Result<bool, ODataError> {
    Ok(match (operand(left), operand(right)) {
        (Operand::Null, _) | (_, Operand::Null) => true,
        (Operand::Primitive(a), Operand::Primitive(b)) => a == b || a.common_kind(b).is_some(),
        (Operand::Enum(a), Operand::Enum(b)) => a.name() == b.name(),
        (Operand::Structured(a), Operand::Structured(b)) => {
            a.compatible_to(Some(b))? || b.compatible_to(Some(a))?
        }
        _ => false,
    })
}

fn orderable(expression: &Expression) -> bool {
    match operand(expression) {
        Operand::Null | Operand::Enum(_) => true,
        Operand::Primitive(kind) => kind.is_orderable(),
        Operand::Structured(_) => false,
    }
}

fn arithmetic(operator: BinaryOperator) -> Option<ArithmeticOperator> {
    Some(match operator {
        BinaryOperator::Add => ArithmeticOperator::Add,
        BinaryOperator::Sub => ArithmeticOperator::Sub,
        BinaryOperator::Mul => ArithmeticOperator::Mul,
        BinaryOperator::Div => ArithmeticOperator::Div,
        BinaryOperator::DivBy => ArithmeticOperator::DivBy,
        BinaryOperator::Mod => ArithmeticOperator::Mod,
        _ => return None,
    })
}

fn require_single(operator: &str, expression: &Expression) -> TypingResult<()> {
    if expression.is_collection {
        return Err(TypingError::Mismatch(
            ODATA0126,
            format!("Operator '{operator}' cannot take a collection of {}", type_name(expression)),
        ));
    }
    Ok(())
}

fn mismatch(operator: BinaryOperator, left: &Expression, right: &Expression) -> TypingError {
    TypingError::Mismatch(
        ODATA0112,
        format!(
            "Operator '{operator}' is not defined for {} and {}",
            type_name(left),
            type_name(right)
        ),
    )
}

fn require_boolean(operator: &str, expression: &Expression) -> TypingResult<()> {
    match operand(expression) {
        Operand::Null | Operand::Primitive(K::Boolean) => Ok(()),
        _ => Err(TypingError::Mismatch(
            ODATA0118,
            format!("Operator '{operator}' needs a Boolean operand, found {}", type_name(expression)),
        )),
    }
}

/// Result type of `left operator right`; integer literals may be retyped
pub(crate) fn binary_type(
    operator: BinaryOperator,
    left: &mut Expression,
    right: &mut Expression,
) -> TypingResult<Option<EdmType>> {
    let keyword = operator.keyword();
    require_single(keyword, left)?;
    if operator != BinaryOperator::In {
        require_single(keyword, right)?;
    }
    if operator.is_logical() {
        require_boolean(keyword, left)?;
        require_boolean(keyword, right)?;
        return Ok(boolean());
    }

    align_literals(left, right);

    if operator.is_equality() {
        if !comparable(left, right)? {
            return Err(mismatch(operator, left, right));
        }
        return Ok(boolean());
    }
    match operator {
        BinaryOperator::Has => {
            let flags = match operand(left) {
                Operand::Enum(e) if e.is_flags() => Some(e),
                _ => None,
            };
            let same_enum = match (&flags, &right.kind) {
                (Some(e), ExpressionKind::Enum { enum_type, .. }) => enum_type.name() == e.name(),
                (Some(_), ExpressionKind::Alias(_)) => true,
                _ => false,
            };
            if !same_enum {
                return Err(mismatch(operator, left, right));
            }
            return Ok(boolean());
        }
        BinaryOperator::In => {
            let fits = match &right.kind {
                ExpressionKind::List(items) => {
                    let mut fits = true;
                    for item in items {
                        fits &= comparable(left, item)?;
                    }
                    fits
                }
                _ if right.is_collection => comparable(left, right)?,
                _ => false,
            };
            if !fits {
                return Err(mismatch(operator, left, right));
            }
            return Ok(boolean());
        }
        _ => {}
    }
    if operator.is_relational() {
        if !(orderable(left) && orderable(right) && comparable(left, right)?) {
            return Err(mismatch(operator, left, right));
        }
        return Ok(boolean());
    }

    let Some(arithmetic) = arithmetic(operator) else {
        return Err(mismatch(operator, left, right));
    };
    match (operand(left), operand(right)) {
        (Operand::Null, Operand::Null) => Ok(None),
        (Operand::Null, Operand::Primitive(kind)) | (Operand::Primitive(kind), Operand::Null) => {
            if kind.is_numeric() || kind.is_temporal() {
                Ok(Some(EdmType::Primitive(kind)))
            } else {
                Err(mismatch(operator, left, right))
            }
        }
        (Operand::Primitive(a), Operand::Primitive(b)) => K::arithmetic_result(arithmetic, a, b)
            .map(|kind| Some(EdmType::Primitive(kind)))
            .ok_or_else(|| mismatch(operator, left, right)),
        _ => Err(mismatch(operator, left, right)),
    }
}

/// Result type of a unary operator applied to `operand`
pub(crate) fn unary_type(
    operator: UnaryOperator,
    expression: &Expression,
) -> TypingResult<Option<EdmType>> {
    let keyword = operator.keyword();
    require_single(keyword, expression)?;
    match operator {
        UnaryOperator::Not => {
            require_boolean(keyword, expression)?;
            Ok(boolean())
        }
        UnaryOperator::Minus => match operand(expression) {
            Operand::Null => Ok(None),
            Operand::Primitive(kind) if kind.is_numeric() || kind == K::Duration => {
                Ok(expression.type_.clone())
            }
            _ => Err(TypingError::Mismatch(
                ODATA0112,
                format!("Operator '-' is not defined for {}", type_name(expression)),
            )),
        },
    }
}

/// Whether `expression` may appear as an `$orderby` key
pub(crate) fn sortable(expression: &Expression) -> bool {
    !expression.is_collection
        && match operand(expression) {
            Operand::Null | Operand::Enum(_) => true,
            Operand::Primitive(kind) => kind.is_orderable(),
            Operand::Structured(_) => false,
        }
}

#[cfg(test)]
mod tests {
    use super::*;
    use octofhir_odata_ast::Literal;
    use octofhir_odata_diagnostics::{ODATA0300, Span};
    use octofhir_odata_edm::Edm;
    use octofhir_odata_model::{CsdlEntityType, CsdlSchema, InMemoryProvider};
    use octofhir_odata_types::{FullQualifiedName, PrimitiveValue};
    use pretty_assertions::assert_eq;

    fn literal(text: &str, value: PrimitiveValue) -> Expression {
        let kind = value.kind();
        Expression::new(
            ExpressionKind::Literal(Literal::new(text, Some(value))),
            Some(EdmType::Primitive(kind)),
            false,
            Span::point(0),
        )
    }

    fn typed(kind: K) -> Expression {
        of_type(EdmType::Primitive(kind))
    }

    fn of_type(ty: EdmType) -> Expression {
        Expression::new(
            ExpressionKind::Alias("p".to_string()),
            Some(ty),
            false,
            Span::point(0),
        )
    }

    fn mismatch_of<T: std::fmt::Debug>(result: TypingResult<T>) -> (ErrorCode, String) {
        match result {
            Err(TypingError::Mismatch(code, message)) => (code, message),
            other => panic!("expected a type mismatch, found {other:?}"),
        }
    }

    #[test]
    fn test_integer_literal_takes_the_other_kind() {
        let mut left = typed(K::Int64);
        let mut right = literal("1", PrimitiveValue::SByte(1));
        let result = binary_type(BinaryOperator::Eq, &mut left, &mut right).unwrap();
        assert_eq!(result, Some(EdmType::Primitive(K::Boolean)));
        assert_eq!(right.type_, Some(EdmType::Primitive(K::Int64)));
        assert_eq!(right.as_literal().and_then(|l| l.value.clone()), Some(PrimitiveValue::Int64(1)));
    }

    #[test]
    fn test_literal_too_large_keeps_its_kind() {
        let mut left = typed(K::Byte);
        let mut right = literal("300", PrimitiveValue::Int16(300));
        let result = binary_type(BinaryOperator::Add, &mut left, &mut right).unwrap();
        assert_eq!(result, Some(EdmType::Primitive(K::Int16)));
        assert_eq!(right.type_, Some(EdmType::Primitive(K::Int16)));
    }

    #[test]
    fn test_logical_operands_must_be_boolean() {
        let mut left = typed(K::Boolean);
        let mut right = typed(K::String);
        let (code, message) = mismatch_of(binary_type(BinaryOperator::And, &mut left, &mut right));
        assert_eq!(code, ODATA0118);
        assert_eq!(message, "Operator 'and' needs a Boolean operand, found Edm.String");
    }

    #[test]
    fn test_comparison_mismatch() {
        let mut left = typed(K::String);
        let mut right = typed(K::Int32);
        let (code, _) = mismatch_of(binary_type(BinaryOperator::Gt, &mut left, &mut right));
        assert_eq!(code, ODATA0112);
    }

    #[test]
    fn test_date_arithmetic() {
        let mut left = typed(K::DateTimeOffset);
        let mut right = typed(K::Duration);
        assert_eq!(
            binary_type(BinaryOperator::Sub, &mut left, &mut right).unwrap(),
            Some(EdmType::Primitive(K::DateTimeOffset))
        );
    }

    #[test]
    fn test_collections_are_rejected() {
        let mut left = typed(K::Int32);
        left.is_collection = true;
        let mut right = typed(K::Int32);
        let (code, _) = mismatch_of(binary_type(BinaryOperator::Eq, &mut left, &mut right));
        assert_eq!(code, ODATA0126);
    }

    #[test]
    fn test_base_type_cycle_is_not_a_mismatch() {
        let fqn = |name: &str| FullQualifiedName::parse(name).unwrap();
        let schema = CsdlSchema::new("ns").with_entity_types(vec![
            CsdlEntityType::new("ETCycleA").with_base_type(fqn("ns.ETCycleB")),
            CsdlEntityType::new("ETCycleB").with_base_type(fqn("ns.ETCycleA")),
        ]);
        let edm = Edm::new(InMemoryProvider::new(vec![schema]));
        let a = edm.entity_type(&fqn("ns.ETCycleA")).unwrap().unwrap();
        let b = edm.entity_type(&fqn("ns.ETCycleB")).unwrap().unwrap();

        let mut left = of_type(EdmType::Entity(a));
        let mut right = of_type(EdmType::Entity(b));
        match binary_type(BinaryOperator::Eq, &mut left, &mut right) {
            Err(TypingError::Model(error)) => assert_eq!(error.code(), ODATA0300),
            other => panic!("expected the cycle error, found {other:?}"),
        }
    }

    #[test]
    fn test_minus() {
        assert_eq!(
            unary_type(UnaryOperator::Minus, &typed(K::Duration)).unwrap(),
            Some(EdmType::Primitive(K::Duration))
        );
        assert!(unary_type(UnaryOperator::Minus, &typed(K::String)).is_err());
        assert!(unary_type(UnaryOperator::Not, &typed(K::Int32)).is_err());
    }
}
