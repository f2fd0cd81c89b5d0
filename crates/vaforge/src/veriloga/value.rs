//! Typed expression values: [`Real`], [`Integer`], [`Bool`] and the dynamic
//! [`Value`].
//!
//! Every value carries its rendered Verilog-A text. Composite expressions wrap
//! each operand in `( )`, so precedence never depends on the operator table.
//! Mixing kinds is a compile error for the typed wrappers and a
//! [`BuildError::TypeMismatch`] for [`Value`]; the explicit coercions
//! (`Real::from_integer`, `Integer::from_real`, ...) are the only bridges.

use std::fmt;

use crate::error::{BuildError, Result};

use super::literal::{format_bool, format_integer, format_real};
use super::var::{BoolVar, IntegerVar, RealVar, Variable};

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Const {
    Real(f64),
    Integer(i64),
    Bool(bool),
}

/// Rendered expression text plus the bookkeeping the module emitter needs.
#[derive(Debug, Clone)]
pub struct Expr {
    pub(crate) text: String,
    /// Set when the text references the `_rtoi` helper function.
    pub(crate) rtoi: bool,
    pub(crate) constant: Option<Const>,
}

impl Expr {
    pub(crate) fn raw(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            rtoi: false,
            constant: None,
        }
    }

    pub(crate) fn constant(value: Const) -> Self {
        let text = match value {
            Const::Real(x) => format_real(x),
            Const::Integer(n) => format_integer(n),
            Const::Bool(b) => format_bool(b).to_string(),
        };
        Self {
            text,
            rtoi: false,
            constant: Some(value),
        }
    }

    pub(crate) fn binary(lhs: &Expr, op: &str, rhs: &Expr) -> Self {
        Self {
            text: format!("( {} ){op}( {} )", lhs.text, rhs.text),
            rtoi: lhs.rtoi || rhs.rtoi,
            constant: None,
        }
    }

    pub(crate) fn unary(op: &str, operand: &Expr) -> Self {
        Self {
            text: format!("{op}( {} )", operand.text),
            rtoi: operand.rtoi,
            constant: None,
        }
    }

    /// Function-call form `name(a, b, ...)`.
    pub(crate) fn call(name: &str, args: &[&Expr]) -> Self {
        let text = args.iter().map(|arg| arg.text.as_str()).collect::<Vec<_>>();
        Self {
            text: format!("{name}({})", text.join(", ")),
            rtoi: args.iter().any(|arg| arg.rtoi),
            constant: None,
        }
    }

    pub(crate) fn with_rtoi(mut self) -> Self {
        self.rtoi = true;
        self
    }

    pub(crate) fn is_constant(&self) -> bool {
        self.constant.is_some()
    }

    /// The text, wrapped in `( )` unless every operator outside parentheses
    /// is one of `allowed`. Constants are never wrapped.
    pub(crate) fn grouped_unless(&self, allowed: &str) -> String {
        if self.is_constant() || top_level_operators(&self.text).all(|op| allowed.contains(op)) {
            self.text.clone()
        } else {
            format!("( {} )", self.text)
        }
    }
}

/// Operators binding tighter than `?:`, safe in a ternary condition.
const CONDITION_OPS: &str = "<>=!&|^~+-*/%";

/// Operator characters outside any parentheses, brackets or string literal.
fn top_level_operators(text: &str) -> impl Iterator<Item = char> + '_ {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut prev = None;
    text.chars().filter(move |&ch| {
        let escaped = prev == Some('\\');
        prev = Some(ch);
        match ch {
            '"' if !escaped => {
                in_string = !in_string;
                false
            }
            _ if in_string => false,
            '(' | '[' => {
                depth += 1;
                false
            }
            ')' | ']' => {
                depth = depth.saturating_sub(1);
                false
            }
            _ => depth == 0 && "?:<>=!&|^~+-*/%".contains(ch),
        }
    })
}

/// The three value kinds of the DSL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Real,
    Integer,
    Bool,
}

impl ValueKind {
    /// Verilog-A declaration keyword; bools are stored as integers.
    pub fn declaration(self) -> &'static str {
        match self {
            ValueKind::Real => "real",
            ValueKind::Integer | ValueKind::Bool => "integer",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Real => "real",
            ValueKind::Integer => "integer",
            ValueKind::Bool => "bool",
        };
        write!(f, "{name}")
    }
}

/// Binary operators accepted by [`Value::apply`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Pow,
    Shl,
    Shr,
    BitAnd,
    BitOr,
    BitXor,
    And,
    Or,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
}

impl BinaryOp {
    fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::Pow => "**",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
            BinaryOp::BitAnd => "&",
            BinaryOp::BitOr => "|",
            BinaryOp::BitXor => "^",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
        }
    }

    /// Operator to use when the operands are swapped.
    fn mirrored(self) -> Self {
        match self {
            BinaryOp::Lt => BinaryOp::Gt,
            BinaryOp::Le => BinaryOp::Ge,
            BinaryOp::Gt => BinaryOp::Lt,
            BinaryOp::Ge => BinaryOp::Le,
            other => other,
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// Comparison with a host constant on the left is reflected so that the
/// non-constant operand is rendered first.
fn compare(lhs: &Expr, op: BinaryOp, rhs: &Expr) -> Bool {
    if lhs.is_constant() && !rhs.is_constant() {
        Bool(Expr::binary(rhs, op.mirrored().symbol(), lhs))
    } else {
        Bool(Expr::binary(lhs, op.symbol(), rhs))
    }
}

pub(crate) mod sealed {
    pub trait Sealed {
        fn expr(&self) -> &super::Expr;
        fn from_expr(expr: super::Expr) -> Self;
    }
}

/// Implemented by [`Real`], [`Integer`] and [`Bool`].
pub trait Scalar: sealed::Sealed + Clone + fmt::Display + Into<Value> {
    const KIND: ValueKind;
    type Var: Variable<Value = Self>;
}

/// Host values and DSL values that name a scalar kind, used by
/// [`crate::Module::var`] to pick the variable type from the initial value.
pub trait IntoScalar {
    type Scalar: Scalar;
    fn into_scalar(self) -> Self::Scalar;
}

#[derive(Debug, Clone)]
pub struct Real(pub(crate) Expr);

#[derive(Debug, Clone)]
pub struct Integer(pub(crate) Expr);

#[derive(Debug, Clone)]
pub struct Bool(pub(crate) Expr);

macro_rules! scalar_common {
    ($ty:ident, $kind:ident, $var:ident) => {
        impl $ty {
            /// Trusted Verilog-A text, inserted as-is.
            pub fn raw(text: impl Into<String>) -> Self {
                $ty(Expr::raw(text))
            }

            pub fn text(&self) -> &str {
                &self.0.text
            }

            pub fn uses_rtoi(&self) -> bool {
                self.0.rtoi
            }

            pub fn is_constant(&self) -> bool {
                self.0.is_constant()
            }

            pub fn eq(&self, rhs: impl Into<$ty>) -> Bool {
                compare(&self.0, BinaryOp::Eq, &rhs.into().0)
            }

            pub fn ne(&self, rhs: impl Into<$ty>) -> Bool {
                compare(&self.0, BinaryOp::Ne, &rhs.into().0)
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0.text)
            }
        }

        impl From<&$ty> for $ty {
            fn from(value: &$ty) -> Self {
                value.clone()
            }
        }

        impl From<&str> for $ty {
            fn from(text: &str) -> Self {
                $ty::raw(text)
            }
        }

        impl From<String> for $ty {
            fn from(text: String) -> Self {
                $ty::raw(text)
            }
        }

        impl From<$ty> for Value {
            fn from(value: $ty) -> Self {
                Value::$kind(value)
            }
        }

        impl From<&$ty> for Value {
            fn from(value: &$ty) -> Self {
                Value::$kind(value.clone())
            }
        }

        impl sealed::Sealed for $ty {
            fn expr(&self) -> &Expr {
                &self.0
            }

            fn from_expr(expr: Expr) -> Self {
                $ty(expr)
            }
        }

        impl Scalar for $ty {
            const KIND: ValueKind = ValueKind::$kind;
            type Var = $var;
        }

        impl IntoScalar for $ty {
            type Scalar = $ty;
            fn into_scalar(self) -> $ty {
                self
            }
        }

        impl IntoScalar for &$ty {
            type Scalar = $ty;
            fn into_scalar(self) -> $ty {
                self.clone()
            }
        }
    };
}

scalar_common!(Real, Real, RealVar);
scalar_common!(Integer, Integer, IntegerVar);
scalar_common!(Bool, Bool, BoolVar);

macro_rules! ordering {
    ($ty:ident) => {
        impl $ty {
            pub fn lt(&self, rhs: impl Into<$ty>) -> Bool {
                compare(&self.0, BinaryOp::Lt, &rhs.into().0)
            }

            pub fn le(&self, rhs: impl Into<$ty>) -> Bool {
                compare(&self.0, BinaryOp::Le, &rhs.into().0)
            }

            pub fn gt(&self, rhs: impl Into<$ty>) -> Bool {
                compare(&self.0, BinaryOp::Gt, &rhs.into().0)
            }

            pub fn ge(&self, rhs: impl Into<$ty>) -> Bool {
                compare(&self.0, BinaryOp::Ge, &rhs.into().0)
            }

            pub fn abs(&self) -> $ty {
                $ty(Expr::call("abs", &[&self.0]))
            }
        }

        impl std::ops::Neg for $ty {
            type Output = $ty;
            fn neg(self) -> $ty {
                $ty(Expr::unary("-", &self.0))
            }
        }

        impl std::ops::Neg for &$ty {
            type Output = $ty;
            fn neg(self) -> $ty {
                $ty(Expr::unary("-", &self.0))
            }
        }
    };
}

ordering!(Real);
ordering!(Integer);

macro_rules! binary_ops {
    ($ty:ident: $($trait:ident::$method:ident => $op:literal),* $(,)?) => {$(
        impl<R: Into<$ty>> std::ops::$trait<R> for $ty {
            type Output = $ty;
            fn $method(self, rhs: R) -> $ty {
                $ty(Expr::binary(&self.0, $op, &rhs.into().0))
            }
        }

        impl<R: Into<$ty>> std::ops::$trait<R> for &$ty {
            type Output = $ty;
            fn $method(self, rhs: R) -> $ty {
                $ty(Expr::binary(&self.0, $op, &rhs.into().0))
            }
        }
    )*};
}

macro_rules! host_lhs_ops {
    ($host:ty => $ty:ident: $($trait:ident::$method:ident => $op:literal),* $(,)?) => {$(
        impl std::ops::$trait<$ty> for $host {
            type Output = $ty;
            fn $method(self, rhs: $ty) -> $ty {
                $ty(Expr::binary(&$ty::from(self).0, $op, &rhs.0))
            }
        }

        impl std::ops::$trait<&$ty> for $host {
            type Output = $ty;
            fn $method(self, rhs: &$ty) -> $ty {
                $ty(Expr::binary(&$ty::from(self).0, $op, &rhs.0))
            }
        }
    )*};
}

binary_ops!(Real: Add::add => "+", Sub::sub => "-", Mul::mul => "*", Div::div => "/");
host_lhs_ops!(f64 => Real: Add::add => "+", Sub::sub => "-", Mul::mul => "*", Div::div => "/");
host_lhs_ops!(i32 => Real: Add::add => "+", Sub::sub => "-", Mul::mul => "*", Div::div => "/");

binary_ops!(Integer:
    Add::add => "+",
    Sub::sub => "-",
    Mul::mul => "*",
    Div::div => "/",
    Rem::rem => "%",
    Shl::shl => "<<",
    Shr::shr => ">>",
    BitAnd::bitand => "&",
    BitOr::bitor => "|",
    BitXor::bitxor => "^",
);
host_lhs_ops!(i32 => Integer:
    Add::add => "+",
    Sub::sub => "-",
    Mul::mul => "*",
    Div::div => "/",
    Rem::rem => "%",
    Shl::shl => "<<",
    Shr::shr => ">>",
    BitAnd::bitand => "&",
    BitOr::bitor => "|",
    BitXor::bitxor => "^",
);

impl Real {
    /// `pow(self, exponent)`.
    pub fn pow(&self, exponent: impl Into<Real>) -> Real {
        Real(Expr::call("pow", &[&self.0, &exponent.into().0]))
    }

    /// Integer to real is a textual passthrough.
    pub fn from_integer(value: impl Into<Integer>) -> Real {
        let value = value.into().0;
        Real(Expr {
            constant: match value.constant {
                Some(Const::Integer(n)) => Some(Const::Real(n as f64)),
                _ => None,
            },
            ..value
        })
    }

    pub fn from_bool(value: impl Into<Bool>) -> Real {
        let value = value.into().0;
        Real(Expr {
            text: format!("{} ? ( 1.0 ) : ( 0.0 )", value.grouped_unless(CONDITION_OPS)),
            rtoi: value.rtoi,
            constant: None,
        })
    }

    /// Coerces any value to a real.
    pub fn cast(value: impl Into<Value>) -> Real {
        match value.into() {
            Value::Real(x) => x,
            Value::Integer(n) => Real::from_integer(n),
            Value::Bool(b) => Real::from_bool(b),
        }
    }

    /// Host value of a literal, if this is one.
    pub(crate) fn as_f64(&self) -> Option<f64> {
        match self.0.constant {
            Some(Const::Real(x)) => Some(x),
            Some(Const::Integer(n)) => Some(n as f64),
            _ => None,
        }
    }
}

impl From<f64> for Real {
    fn from(value: f64) -> Self {
        Real(Expr::constant(Const::Real(value)))
    }
}

impl From<f32> for Real {
    fn from(value: f32) -> Self {
        Real::from(f64::from(value))
    }
}

impl From<i32> for Real {
    fn from(value: i32) -> Self {
        Real::from(f64::from(value))
    }
}

impl IntoScalar for f64 {
    type Scalar = Real;
    fn into_scalar(self) -> Real {
        Real::from(self)
    }
}

impl Integer {
    /// Integer power, rounded back through `_rtoi`.
    pub fn pow(&self, exponent: impl Into<Integer>) -> Integer {
        let call = Expr::call("pow", &[&self.0, &exponent.into().0]);
        Integer(Expr::call("_rtoi", &[&call]).with_rtoi())
    }

    /// Rounds to the nearest integer through the emitted `_rtoi` helper.
    pub fn from_real(value: impl Into<Real>) -> Integer {
        Integer(Expr::call("_rtoi", &[&value.into().0]).with_rtoi())
    }

    pub fn from_bool(value: impl Into<Bool>) -> Integer {
        let value = value.into().0;
        Integer(Expr {
            text: format!("{} ? ( 1 ) : ( 0 )", value.grouped_unless(CONDITION_OPS)),
            rtoi: value.rtoi,
            constant: None,
        })
    }

    pub fn cast(value: impl Into<Value>) -> Integer {
        match value.into() {
            Value::Real(x) => Integer::from_real(x),
            Value::Integer(n) => n,
            Value::Bool(b) => Integer::from_bool(b),
        }
    }

    pub(crate) fn index(value: usize) -> Integer {
        Integer(Expr::constant(Const::Integer(
            i64::try_from(value).unwrap_or(i64::MAX),
        )))
    }
}

impl From<i32> for Integer {
    fn from(value: i32) -> Self {
        Integer(Expr::constant(Const::Integer(i64::from(value))))
    }
}

impl TryFrom<i64> for Integer {
    type Error = BuildError;

    fn try_from(value: i64) -> Result<Self> {
        i32::try_from(value).map(Integer::from).map_err(|_| {
            BuildError::out_of_range(
                "integer literal",
                format!("{value} does not fit in a 32-bit Verilog-A integer"),
            )
        })
    }
}

impl TryFrom<u64> for Integer {
    type Error = BuildError;

    fn try_from(value: u64) -> Result<Self> {
        let signed = i64::try_from(value).map_err(|_| {
            BuildError::out_of_range(
                "integer literal",
                format!("{value} does not fit in a 32-bit Verilog-A integer"),
            )
        })?;
        Integer::try_from(signed)
    }
}

impl IntoScalar for i32 {
    type Scalar = Integer;
    fn into_scalar(self) -> Integer {
        Integer::from(self)
    }
}

impl std::ops::Not for Integer {
    type Output = Integer;
    fn not(self) -> Integer {
        Integer(Expr::unary("~", &self.0))
    }
}

impl std::ops::Not for &Integer {
    type Output = Integer;
    fn not(self) -> Integer {
        Integer(Expr::unary("~", &self.0))
    }
}

impl Bool {
    fn as_const(&self) -> Option<bool> {
        match self.0.constant {
            Some(Const::Bool(b)) => Some(b),
            _ => None,
        }
    }

    fn logic_and(lhs: &Bool, rhs: &Bool) -> Bool {
        match (lhs.as_const(), rhs.as_const()) {
            (Some(false), _) | (_, Some(false)) => Bool::from(false),
            (Some(true), _) => rhs.clone(),
            (_, Some(true)) => lhs.clone(),
            _ => Bool(Expr::binary(&lhs.0, "&&", &rhs.0)),
        }
    }

    fn logic_or(lhs: &Bool, rhs: &Bool) -> Bool {
        match (lhs.as_const(), rhs.as_const()) {
            (Some(true), _) | (_, Some(true)) => Bool::from(true),
            (Some(false), _) => rhs.clone(),
            (_, Some(false)) => lhs.clone(),
            _ => Bool(Expr::binary(&lhs.0, "||", &rhs.0)),
        }
    }

    fn logic_xor(lhs: &Bool, rhs: &Bool) -> Bool {
        match (lhs.as_const(), rhs.as_const()) {
            (Some(a), Some(b)) => Bool::from(a ^ b),
            (Some(c), None) => if c { rhs.negated() } else { rhs.clone() },
            (None, Some(c)) => if c { lhs.negated() } else { lhs.clone() },
            (None, None) => Bool(Expr::binary(&lhs.0, "^", &rhs.0)),
        }
    }

    fn negated(&self) -> Bool {
        match self.as_const() {
            Some(b) => Bool::from(!b),
            None => Bool(Expr::unary("!", &self.0)),
        }
    }

    /// `self ? ( then ) : ( otherwise )`.
    pub fn select<T: Scalar>(&self, then: impl Into<T>, otherwise: impl Into<T>) -> T {
        let (then, otherwise) = (then.into(), otherwise.into());
        T::from_expr(Expr {
            text: format!(
                "{} ? ( {} ) : ( {} )",
                self.0.grouped_unless(CONDITION_OPS),
                then.expr().text,
                otherwise.expr().text
            ),
            rtoi: self.0.rtoi || then.expr().rtoi || otherwise.expr().rtoi,
            constant: None,
        })
    }

    pub fn from_real(value: impl Into<Real>) -> Bool {
        compare(&value.into().0, BinaryOp::Ne, &Real::from(0.0).0)
    }

    pub fn from_integer(value: impl Into<Integer>) -> Bool {
        compare(&value.into().0, BinaryOp::Ne, &Integer::from(0).0)
    }

    pub fn cast(value: impl Into<Value>) -> Bool {
        match value.into() {
            Value::Real(x) => Bool::from_real(x),
            Value::Integer(n) => Bool::from_integer(n),
            Value::Bool(b) => b,
        }
    }
}

impl From<bool> for Bool {
    fn from(value: bool) -> Self {
        Bool(Expr::constant(Const::Bool(value)))
    }
}

impl IntoScalar for bool {
    type Scalar = Bool;
    fn into_scalar(self) -> Bool {
        Bool::from(self)
    }
}

macro_rules! bool_ops {
    ($($trait:ident::$method:ident => $logic:ident),* $(,)?) => {$(
        impl<R: Into<Bool>> std::ops::$trait<R> for Bool {
            type Output = Bool;
            fn $method(self, rhs: R) -> Bool {
                Bool::$logic(&self, &rhs.into())
            }
        }

        impl<R: Into<Bool>> std::ops::$trait<R> for &Bool {
            type Output = Bool;
            fn $method(self, rhs: R) -> Bool {
                Bool::$logic(self, &rhs.into())
            }
        }

        impl std::ops::$trait<Bool> for bool {
            type Output = Bool;
            fn $method(self, rhs: Bool) -> Bool {
                Bool::$logic(&Bool::from(self), &rhs)
            }
        }
    )*};
}

bool_ops!(
    BitAnd::bitand => logic_and,
    BitOr::bitor => logic_or,
    BitXor::bitxor => logic_xor,
);

impl std::ops::Not for Bool {
    type Output = Bool;
    fn not(self) -> Bool {
        self.negated()
    }
}

impl std::ops::Not for &Bool {
    type Output = Bool;
    fn not(self) -> Bool {
        self.negated()
    }
}

/// A value whose kind is only known at run time.
#[derive(Debug, Clone)]
pub enum Value {
    Real(Real),
    Integer(Integer),
    Bool(Bool),
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Real(_) => ValueKind::Real,
            Value::Integer(_) => ValueKind::Integer,
            Value::Bool(_) => ValueKind::Bool,
        }
    }

    pub(crate) fn expr(&self) -> &Expr {
        match self {
            Value::Real(x) => &x.0,
            Value::Integer(n) => &n.0,
            Value::Bool(b) => &b.0,
        }
    }

    pub fn text(&self) -> &str {
        &self.expr().text
    }

    pub fn uses_rtoi(&self) -> bool {
        self.expr().rtoi
    }

    pub fn as_real(&self) -> Result<&Real> {
        match self {
            Value::Real(x) => Ok(x),
            other => Err(BuildError::mismatch("real value", ValueKind::Real, other.kind())),
        }
    }

    pub fn as_integer(&self) -> Result<&Integer> {
        match self {
            Value::Integer(n) => Ok(n),
            other => Err(BuildError::mismatch(
                "integer value",
                ValueKind::Integer,
                other.kind(),
            )),
        }
    }

    pub fn as_bool(&self) -> Result<&Bool> {
        match self {
            Value::Bool(b) => Ok(b),
            other => Err(BuildError::mismatch("bool value", ValueKind::Bool, other.kind())),
        }
    }

    /// Applies a binary operator; both operands must be of the same kind and
    /// the operator must be defined for that kind.
    pub fn apply(&self, op: BinaryOp, rhs: &Value) -> Result<Value> {
        let context = || format!("{} {op} {}", self.kind(), rhs.kind());
        match (self, rhs) {
            (Value::Real(a), Value::Real(b)) => match op {
                BinaryOp::Add => Ok(Value::Real(a + b)),
                BinaryOp::Sub => Ok(Value::Real(a - b)),
                BinaryOp::Mul => Ok(Value::Real(a * b)),
                BinaryOp::Div => Ok(Value::Real(a / b)),
                BinaryOp::Pow => Ok(Value::Real(a.pow(b))),
                BinaryOp::Lt => Ok(Value::Bool(a.lt(b))),
                BinaryOp::Le => Ok(Value::Bool(a.le(b))),
                BinaryOp::Gt => Ok(Value::Bool(a.gt(b))),
                BinaryOp::Ge => Ok(Value::Bool(a.ge(b))),
                BinaryOp::Eq => Ok(Value::Bool(a.eq(b))),
                BinaryOp::Ne => Ok(Value::Bool(a.ne(b))),
                BinaryOp::And | BinaryOp::Or => {
                    Err(BuildError::mismatch(context(), ValueKind::Bool, ValueKind::Real))
                }
                _ => Err(BuildError::mismatch(context(), ValueKind::Integer, ValueKind::Real)),
            },
            (Value::Integer(a), Value::Integer(b)) => match op {
                BinaryOp::Add => Ok(Value::Integer(a + b)),
                BinaryOp::Sub => Ok(Value::Integer(a - b)),
                BinaryOp::Mul => Ok(Value::Integer(a * b)),
                BinaryOp::Div => Ok(Value::Integer(a / b)),
                BinaryOp::Rem => Ok(Value::Integer(a % b)),
                BinaryOp::Pow => Ok(Value::Integer(a.pow(b))),
                BinaryOp::Shl => Ok(Value::Integer(a << b)),
                BinaryOp::Shr => Ok(Value::Integer(a >> b)),
                BinaryOp::BitAnd => Ok(Value::Integer(a & b)),
                BinaryOp::BitOr => Ok(Value::Integer(a | b)),
                BinaryOp::BitXor => Ok(Value::Integer(a ^ b)),
                BinaryOp::Lt => Ok(Value::Bool(a.lt(b))),
                BinaryOp::Le => Ok(Value::Bool(a.le(b))),
                BinaryOp::Gt => Ok(Value::Bool(a.gt(b))),
                BinaryOp::Ge => Ok(Value::Bool(a.ge(b))),
                BinaryOp::Eq => Ok(Value::Bool(a.eq(b))),
                BinaryOp::Ne => Ok(Value::Bool(a.ne(b))),
                BinaryOp::And | BinaryOp::Or => Err(BuildError::mismatch(
                    context(),
                    ValueKind::Bool,
                    ValueKind::Integer,
                )),
            },
            (Value::Bool(a), Value::Bool(b)) => match op {
                BinaryOp::And | BinaryOp::BitAnd => Ok(Value::Bool(a & b)),
                BinaryOp::Or | BinaryOp::BitOr => Ok(Value::Bool(a | b)),
                BinaryOp::BitXor => Ok(Value::Bool(a ^ b)),
                BinaryOp::Eq => Ok(Value::Bool(a.eq(b))),
                BinaryOp::Ne => Ok(Value::Bool(a.ne(b))),
                _ => Err(BuildError::mismatch(context(), ValueKind::Integer, ValueKind::Bool)),
            },
            (lhs, rhs) => Err(BuildError::mismatch(context(), lhs.kind(), rhs.kind())),
        }
    }

    /// Unary minus, defined for reals and integers.
    pub fn negate(&self) -> Result<Value> {
        match self {
            Value::Real(x) => Ok(Value::Real(-x)),
            Value::Integer(n) => Ok(Value::Integer(-n)),
            Value::Bool(_) => Err(BuildError::mismatch(
                "unary -",
                ValueKind::Integer,
                ValueKind::Bool,
            )),
        }
    }

    /// Logical not for bools, bitwise not for integers.
    pub fn invert(&self) -> Result<Value> {
        match self {
            Value::Bool(b) => Ok(Value::Bool(!b)),
            Value::Integer(n) => Ok(Value::Integer(!n)),
            Value::Real(_) => Err(BuildError::mismatch(
                "unary !",
                ValueKind::Bool,
                ValueKind::Real,
            )),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text())
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Real(Real::from(value))
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Integer(Integer::from(value))
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(Bool::from(value))
    }
}
