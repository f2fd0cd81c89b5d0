use proptest::prelude::*;
use test_case::test_case;
use vaforge::veriloga::func::{analysis, ternary, transition};
use vaforge::veriloga::BinaryOp;
use vaforge::veriloga::literal::format_real;
use vaforge::{Bool, BuildError, Integer, Real, SimType, Value, ValueKind};

#[test_case(BinaryOp::Add, "( a )+( b )")]
#[test_case(BinaryOp::Sub, "( a )-( b )")]
#[test_case(BinaryOp::Mul, "( a )*( b )")]
#[test_case(BinaryOp::Div, "( a )/( b )")]
#[test_case(BinaryOp::Lt, "( a )<( b )")]
#[test_case(BinaryOp::Ge, "( a )>=( b )")]
#[test_case(BinaryOp::Ne, "( a )!=( b )")]
fn test_real_binary_rendering(op: BinaryOp, expected: &str) {
    let a = Value::from(Real::raw("a"));
    let b = Value::from(Real::raw("b"));
    assert_eq!(a.apply(op, &b).unwrap().text(), expected);
}

#[test_case(BinaryOp::Rem, "( n )%( m )")]
#[test_case(BinaryOp::Shl, "( n )<<( m )")]
#[test_case(BinaryOp::BitXor, "( n )^( m )")]
#[test_case(BinaryOp::Pow, "_rtoi(pow(n, m))")]
fn test_integer_binary_rendering(op: BinaryOp, expected: &str) {
    let n = Value::from(Integer::raw("n"));
    let m = Value::from(Integer::raw("m"));
    let result = n.apply(op, &m).unwrap();
    assert_eq!(result.text(), expected);
    assert_eq!(result.kind(), ValueKind::Integer);
}

#[test_case(BinaryOp::Rem; "rem")]
#[test_case(BinaryOp::Shl; "shift")]
#[test_case(BinaryOp::And; "logical and")]
fn test_operator_not_defined_for_reals(op: BinaryOp) {
    let a = Value::from(Real::raw("a"));
    assert!(matches!(
        a.apply(op, &a),
        Err(BuildError::TypeMismatch { .. })
    ));
}

#[test]
fn test_mixed_kinds_are_rejected() {
    let a = Value::from(1.0);
    let n = Value::from(1);
    match a.apply(BinaryOp::Add, &n) {
        Err(BuildError::TypeMismatch {
            expected, found, ..
        }) => {
            assert_eq!(expected, ValueKind::Real);
            assert_eq!(found, ValueKind::Integer);
        }
        other => panic!("expected a type mismatch, got {other:?}"),
    }
}

#[test]
fn test_host_operands_coerce() {
    assert_eq!((2.0 * Real::raw("x")).text(), "( 2.000000e+00 )*( x )");
    assert_eq!((Real::raw("x") - 1).text(), "( x )-( 1.000000e+00 )");
    assert_eq!((1 << Integer::raw("k")).text(), "( 1 )<<( k )");
}

#[test]
fn test_host_comparison_is_reflected() {
    let x = Real::raw("x");
    assert_eq!(Real::from(0.5).lt(&x).text(), "( x )>( 5.000000e-01 )");
    assert_eq!(x.lt(0.5).text(), "( x )<( 5.000000e-01 )");
}

#[test]
fn test_bool_constants_fold() {
    let b = Bool::raw("b");
    assert_eq!((&b & true).text(), "b");
    assert_eq!((&b & false).text(), "0");
    assert_eq!((&b | true).text(), "1");
    assert_eq!((&b ^ true).text(), "!( b )");
    assert_eq!((Bool::raw("p") | Bool::raw("q")).text(), "( p )||( q )");
}

#[test]
fn test_conversions() {
    assert_eq!(Real::from_bool(Bool::raw("b")).text(), "b ? ( 1.0 ) : ( 0.0 )");
    assert_eq!(Integer::from_bool(Bool::raw("b")).text(), "b ? ( 1 ) : ( 0 )");
    let rounded = Integer::from_real(Real::raw("r"));
    assert_eq!(rounded.text(), "_rtoi(r)");
    assert!(rounded.uses_rtoi());
    assert_eq!(Real::from_integer(Integer::raw("n")).text(), "n");
    assert_eq!(Bool::from_integer(Integer::raw("n")).text(), "( n )!=( 0 )");
}

#[test]
fn test_rtoi_propagates_through_operators() {
    let rounded = Integer::from_real(Real::raw("r"));
    let sum = Real::from_integer(rounded + 1) * 2.0;
    assert!(sum.uses_rtoi());
    assert!(!(Real::raw("r") * 2.0).uses_rtoi());
}

#[test]
fn test_functions() {
    assert_eq!(
        transition(Real::raw("v"), 0.0, 1e-9, 2e-9).text(),
        "transition(v, 0.000000e+00, 1.000000e-09, 2.000000e-09)"
    );
    assert_eq!(
        ternary(Bool::raw("c"), 1.0, Real::raw("y")).text(),
        "c ? ( 1.000000e+00 ) : ( y )"
    );
    assert_eq!(
        analysis(&[SimType::Dc, SimType::Tran]).text(),
        "analysis(\"dc\", \"tran\")"
    );
}

#[test]
fn test_integer_literal_range() {
    assert!(Integer::try_from(i64::from(i32::MAX)).is_ok());
    assert!(matches!(
        Integer::try_from(i64::from(i32::MAX) + 1),
        Err(BuildError::OutOfRange { .. })
    ));
    assert!(Integer::try_from(u64::MAX).is_err());
}

fn is_balanced(text: &str) -> bool {
    let mut depth = 0i32;
    for ch in text.chars() {
        match ch {
            '(' => depth += 1,
            ')' => depth -= 1,
            _ => {}
        }
        if depth < 0 {
            return false;
        }
    }
    depth == 0
}

fn real_tree() -> impl Strategy<Value = Real> {
    let leaf = prop_oneof![
        "[a-z]{1,4}".prop_map(Real::raw),
        (-1e6f64..1e6).prop_map(Real::from),
    ];
    leaf.prop_recursive(4, 32, 2, |inner| {
        (inner.clone(), inner, 0..4u8).prop_map(|(a, b, op)| match op {
            0 => a + b,
            1 => a - b,
            2 => a * b,
            _ => a / b,
        })
    })
}

proptest! {
    #[test]
    fn test_rendered_parens_balance(expr in real_tree()) {
        prop_assert!(is_balanced(expr.text()), "unbalanced: {}", expr.text());
    }

    #[test]
    fn test_real_literal_shape(x in proptest::num::f64::NORMAL) {
        let text = format_real(x);
        let (mantissa, exponent) = text.split_once('e').unwrap();
        let (_, fraction) = mantissa.split_once('.').unwrap();
        prop_assert_eq!(fraction.len(), 6);
        prop_assert!(exponent.starts_with('+') || exponent.starts_with('-'));
        prop_assert!(exponent.len() >= 3);
        prop_assert!(text.parse::<f64>().is_ok());
    }

    #[test]
    fn test_integer_literal_is_decimal(n in any::<i32>()) {
        let literal = Integer::from(n);
        prop_assert_eq!(literal.text(), n.to_string());
    }
}
