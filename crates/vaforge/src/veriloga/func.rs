//! Analog operators, math functions and environment parameters.

use super::event::SimType;
use super::value::{Bool, Expr, Real};

fn call(name: &str, args: &[Real]) -> Real {
    let args = args.iter().map(|arg| &arg.0).collect::<Vec<_>>();
    Real(Expr::call(name, &args))
}

/// `transition(value, delay, rise, fall)`.
pub fn transition(
    value: impl Into<Real>,
    delay: impl Into<Real>,
    rise: impl Into<Real>,
    fall: impl Into<Real>,
) -> Real {
    call(
        "transition",
        &[value.into(), delay.into(), rise.into(), fall.into()],
    )
}

/// `slew(value, max_rise, max_fall)`.
pub fn slew(value: impl Into<Real>, max_rise: impl Into<Real>, max_fall: impl Into<Real>) -> Real {
    call("slew", &[value.into(), max_rise.into(), max_fall.into()])
}

pub fn ddt(value: impl Into<Real>) -> Real {
    call("ddt", &[value.into()])
}

pub fn idt(value: impl Into<Real>) -> Real {
    call("idt", &[value.into()])
}

/// `idt(value, ic)` with an initial condition.
pub fn idt_ic(value: impl Into<Real>, initial: impl Into<Real>) -> Real {
    call("idt", &[value.into(), initial.into()])
}

macro_rules! unary_math {
    ($($name:ident),* $(,)?) => {$(
        #[doc = concat!("`", stringify!($name), "(x)`.")]
        pub fn $name(x: impl Into<Real>) -> Real {
            call(stringify!($name), &[x.into()])
        }
    )*};
}

unary_math!(exp, ln, log, sqrt, sin, cos, tan, tanh, floor, ceil, limexp, abs);

pub fn pow(base: impl Into<Real>, exponent: impl Into<Real>) -> Real {
    call("pow", &[base.into(), exponent.into()])
}

pub fn min(a: impl Into<Real>, b: impl Into<Real>) -> Real {
    call("min", &[a.into(), b.into()])
}

pub fn max(a: impl Into<Real>, b: impl Into<Real>) -> Real {
    call("max", &[a.into(), b.into()])
}

/// `$abstime`, the current simulation time.
pub fn abstime() -> Real {
    Real::raw("$abstime")
}

pub fn temperature() -> Real {
    Real::raw("$temperature")
}

/// Thermal voltage at the circuit temperature.
pub fn vt() -> Real {
    Real::raw("$vt")
}

/// `analysis("static", ...)`, true while one of the listed analyses runs.
pub fn analysis(types: &[SimType]) -> Bool {
    Bool::raw(format!("analysis({})", SimType::argument_list(types)))
}

/// `cond ? ( a ) : ( b )` over reals.
pub fn ternary(cond: impl Into<Bool>, a: impl Into<Real>, b: impl Into<Real>) -> Real {
    let cond: Bool = cond.into();
    cond.select(a, b)
}
