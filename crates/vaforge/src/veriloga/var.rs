//! Declared variables. A variable is a value whose text is its own name, plus
//! an `assign` that produces the assignment statement.

use std::fmt;
use std::ops::Deref;

use crate::error::{BuildError, Result};

use super::stmt::Statement;
use super::value::{Bool, Expr, Integer, IntoScalar, Real, Scalar, Value, ValueKind};

/// Implemented by [`RealVar`], [`IntegerVar`] and [`BoolVar`].
pub trait Variable: Clone {
    type Value: Scalar;

    fn name(&self) -> &str;

    fn value(&self) -> Self::Value;

    fn assign(&self, rhs: impl Into<Self::Value>) -> Statement;

    #[doc(hidden)]
    fn with_name(name: String) -> Self;
}

macro_rules! variable {
    ($(#[$meta:meta])* $var:ident, $ty:ident, $kind:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone)]
        pub struct $var {
            name: String,
            value: $ty,
        }

        impl $var {
            pub fn name(&self) -> &str {
                &self.name
            }

            pub fn value(&self) -> $ty {
                self.value.clone()
            }

            /// `name = rhs;`
            pub fn assign(&self, rhs: impl Into<$ty>) -> Statement {
                Statement::assignment(&self.name, &rhs.into().0)
            }
        }

        impl Deref for $var {
            type Target = $ty;

            fn deref(&self) -> &$ty {
                &self.value
            }
        }

        impl fmt::Display for $var {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.name)
            }
        }

        impl From<&$var> for $ty {
            fn from(var: &$var) -> Self {
                var.value.clone()
            }
        }

        impl From<$var> for $ty {
            fn from(var: $var) -> Self {
                var.value
            }
        }

        impl From<&$var> for Value {
            fn from(var: &$var) -> Self {
                Value::$kind(var.value.clone())
            }
        }

        impl From<$var> for Var {
            fn from(var: $var) -> Self {
                Var::$kind(var)
            }
        }

        impl IntoScalar for &$var {
            type Scalar = $ty;
            fn into_scalar(self) -> $ty {
                self.value.clone()
            }
        }

        impl Variable for $var {
            type Value = $ty;

            fn name(&self) -> &str {
                &self.name
            }

            fn value(&self) -> $ty {
                self.value.clone()
            }

            fn assign(&self, rhs: impl Into<Self::Value>) -> Statement {
                Statement::assignment(&self.name, &rhs.into().0)
            }

            fn with_name(name: String) -> Self {
                let value = $ty(Expr::raw(name.clone()));
                Self { name, value }
            }
        }
    };
}

variable!(RealVar, Real, Real);
variable!(IntegerVar, Integer, Integer);
variable!(
    /// Declared as `integer`; holds 0 or 1.
    BoolVar,
    Bool,
    Bool
);

impl IntegerVar {
    /// `name = name + 1;`
    pub fn inc(&self) -> Statement {
        Statement::assignment(&self.name, &Expr::raw(format!("{} + 1", self.name)))
    }

    /// `name = name - 1;`
    pub fn dec(&self) -> Statement {
        Statement::assignment(&self.name, &Expr::raw(format!("{} - 1", self.name)))
    }
}

impl BoolVar {
    /// `name = !name;`
    pub fn toggle(&self) -> Statement {
        Statement::assignment(&self.name, &Expr::raw(format!("!{}", self.name)))
    }
}

/// A variable whose kind is only known at run time.
#[derive(Debug, Clone)]
pub enum Var {
    Real(RealVar),
    Integer(IntegerVar),
    Bool(BoolVar),
}

impl Var {
    pub fn kind(&self) -> ValueKind {
        match self {
            Var::Real(_) => ValueKind::Real,
            Var::Integer(_) => ValueKind::Integer,
            Var::Bool(_) => ValueKind::Bool,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Var::Real(v) => v.name(),
            Var::Integer(v) => v.name(),
            Var::Bool(v) => v.name(),
        }
    }

    pub fn value(&self) -> Value {
        match self {
            Var::Real(v) => Value::Real(v.value()),
            Var::Integer(v) => Value::Integer(v.value()),
            Var::Bool(v) => Value::Bool(v.value()),
        }
    }

    /// Assignment with a kind check; mixing kinds needs an explicit cast.
    pub fn assign(&self, rhs: impl Into<Value>) -> Result<Statement> {
        let rhs = rhs.into();
        if rhs.kind() != self.kind() {
            return Err(BuildError::mismatch(
                format!("assignment to `{}`", self.name()),
                self.kind(),
                rhs.kind(),
            ));
        }
        Ok(Statement::assignment(self.name(), rhs.expr()))
    }

    pub fn as_real(&self) -> Result<&RealVar> {
        match self {
            Var::Real(v) => Ok(v),
            other => Err(BuildError::mismatch(other.name(), ValueKind::Real, other.kind())),
        }
    }

    pub fn as_integer(&self) -> Result<&IntegerVar> {
        match self {
            Var::Integer(v) => Ok(v),
            other => Err(BuildError::mismatch(
                other.name(),
                ValueKind::Integer,
                other.kind(),
            )),
        }
    }

    pub fn as_bool(&self) -> Result<&BoolVar> {
        match self {
            Var::Bool(v) => Ok(v),
            other => Err(BuildError::mismatch(other.name(), ValueKind::Bool, other.kind())),
        }
    }
}
