//! Analog events usable in `@( ... )` blocks and as sequencer wait targets.

use std::fmt;
use std::str::FromStr;

use crate::error::{BuildError, Result};

use super::value::Real;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Edge {
    Rising,
    Falling,
    Both,
}

impl Edge {
    /// Direction argument of `cross`.
    pub fn code(self) -> i32 {
        match self {
            Edge::Rising => 1,
            Edge::Falling => -1,
            Edge::Both => 0,
        }
    }
}

impl FromStr for Edge {
    type Err = BuildError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "rising" => Ok(Edge::Rising),
            "falling" => Ok(Edge::Falling),
            "both" => Ok(Edge::Both),
            _ => Err(BuildError::InvalidEnum {
                kind: "edge",
                value: s.to_string(),
                allowed: "rising, falling, both".to_string(),
            }),
        }
    }
}

/// Analysis names accepted by `initial_step`, `final_step` and `analysis`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SimType {
    Ac,
    Dc,
    Ic,
    Static,
    Tran,
    Pac,
    Pnoise,
    Pss,
    Pxf,
    Sp,
    Tdr,
    Xf,
}

impl SimType {
    const ALL: [SimType; 12] = [
        SimType::Ac,
        SimType::Dc,
        SimType::Ic,
        SimType::Static,
        SimType::Tran,
        SimType::Pac,
        SimType::Pnoise,
        SimType::Pss,
        SimType::Pxf,
        SimType::Sp,
        SimType::Tdr,
        SimType::Xf,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SimType::Ac => "ac",
            SimType::Dc => "dc",
            SimType::Ic => "ic",
            SimType::Static => "static",
            SimType::Tran => "tran",
            SimType::Pac => "pac",
            SimType::Pnoise => "pnoise",
            SimType::Pss => "pss",
            SimType::Pxf => "pxf",
            SimType::Sp => "sp",
            SimType::Tdr => "tdr",
            SimType::Xf => "xf",
        }
    }

    /// `"tran", "dc"` as written inside the call parentheses.
    pub(crate) fn argument_list(types: &[SimType]) -> String {
        types
            .iter()
            .map(|t| format!("\"{}\"", t.as_str()))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl FromStr for SimType {
    type Err = BuildError;

    fn from_str(s: &str) -> Result<Self> {
        SimType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| BuildError::InvalidEnum {
                kind: "analysis type",
                value: s.to_string(),
                allowed: SimType::ALL.map(SimType::as_str).join(", "),
            })
    }
}

impl fmt::Display for SimType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct Crossing {
    expr: Real,
    threshold: Real,
    edge: Edge,
    time_tol: Option<Real>,
    exp_tol: Option<Real>,
}

impl Crossing {
    /// `expr - threshold`, grouping operands that bind looser than `-`.
    fn difference(&self) -> String {
        format!(
            "{} - {}",
            self.expr.0.grouped_unless("+-*/%"),
            self.threshold.0.grouped_unless("*/%")
        )
    }
}

#[derive(Debug, Clone)]
pub struct Timer {
    start: Real,
    period: Option<Real>,
    time_tol: Option<Real>,
}

#[derive(Debug, Clone)]
pub enum Event {
    Cross(Box<Crossing>),
    /// Rendered like a crossing, but also fires at the first time step when
    /// the expression is already above the threshold.
    Above(Box<Crossing>),
    Timer(Box<Timer>),
    InitialStep(Vec<SimType>),
    FinalStep(Vec<SimType>),
    Or(Box<Event>, Box<Event>),
}

impl Event {
    /// `cross(expr - threshold, edge)`.
    pub fn cross(expr: impl Into<Real>, threshold: impl Into<Real>, edge: Edge) -> Event {
        Event::Cross(Box::new(Crossing {
            expr: expr.into(),
            threshold: threshold.into(),
            edge,
            time_tol: None,
            exp_tol: None,
        }))
    }

    /// `above(expr - threshold)`.
    pub fn above(expr: impl Into<Real>, threshold: impl Into<Real>) -> Event {
        Event::Above(Box::new(Crossing {
            expr: expr.into(),
            threshold: threshold.into(),
            edge: Edge::Both,
            time_tol: None,
            exp_tol: None,
        }))
    }

    /// One-shot `timer(start)`.
    pub fn timer(start: impl Into<Real>) -> Event {
        Event::Timer(Box::new(Timer {
            start: start.into(),
            period: None,
            time_tol: None,
        }))
    }

    /// Periodic `timer(start, period)`.
    pub fn periodic(start: impl Into<Real>, period: impl Into<Real>) -> Event {
        Event::Timer(Box::new(Timer {
            start: start.into(),
            period: Some(period.into()),
            time_tol: None,
        }))
    }

    pub fn initial_step(types: &[SimType]) -> Event {
        Event::InitialStep(types.to_vec())
    }

    pub fn final_step(types: &[SimType]) -> Event {
        Event::FinalStep(types.to_vec())
    }

    /// Like [`Event::cross`] with the edge given by name and up to two
    /// positional tolerances (time, then expression).
    pub fn cross_with(
        expr: impl Into<Real>,
        threshold: impl Into<Real>,
        edge: &str,
        tolerances: &[Real],
    ) -> Result<Event> {
        let mut builder = CrossBuilder::new(expr, threshold, edge.parse()?);
        match tolerances {
            [] => {}
            [tt] => builder = builder.time_tol(tt),
            [tt, et] => builder = builder.time_tol(tt).exp_tol(et),
            _ => {
                return Err(BuildError::out_of_range(
                    "cross tolerances",
                    format!("expected at most 2, got {}", tolerances.len()),
                ));
            }
        }
        builder.build()
    }

    /// Analysis-name form of [`Event::initial_step`].
    pub fn initial_step_named(types: &[&str]) -> Result<Event> {
        Ok(Event::InitialStep(parse_sim_types(types)?))
    }

    pub fn final_step_named(types: &[&str]) -> Result<Event> {
        Ok(Event::FinalStep(parse_sim_types(types)?))
    }

    /// Disjunction, rendered with ` or `.
    pub fn or(self, other: Event) -> Event {
        Event::Or(Box::new(self), Box::new(other))
    }

    pub fn uses_rtoi(&self) -> bool {
        match self {
            Event::Cross(c) | Event::Above(c) => {
                c.expr.uses_rtoi()
                    || c.threshold.uses_rtoi()
                    || c.time_tol.as_ref().is_some_and(Real::uses_rtoi)
                    || c.exp_tol.as_ref().is_some_and(Real::uses_rtoi)
            }
            Event::Timer(t) => {
                t.start.uses_rtoi()
                    || t.period.as_ref().is_some_and(Real::uses_rtoi)
                    || t.time_tol.as_ref().is_some_and(Real::uses_rtoi)
            }
            Event::InitialStep(_) | Event::FinalStep(_) => false,
            Event::Or(a, b) => a.uses_rtoi() || b.uses_rtoi(),
        }
    }
}

fn parse_sim_types(types: &[&str]) -> Result<Vec<SimType>> {
    types.iter().map(|t| t.parse()).collect()
}

impl std::ops::BitOr for Event {
    type Output = Event;
    fn bitor(self, rhs: Event) -> Event {
        self.or(rhs)
    }
}

fn write_tolerances(f: &mut fmt::Formatter<'_>, tolerances: &[&Option<Real>]) -> fmt::Result {
    for tol in tolerances.iter().map_while(|t| t.as_ref()) {
        write!(f, ", {tol}")?;
    }
    Ok(())
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::Cross(c) => {
                write!(f, "cross({}, {}", c.difference(), c.edge.code())?;
                write_tolerances(f, &[&c.time_tol, &c.exp_tol])?;
                write!(f, ")")
            }
            Event::Above(c) => {
                write!(f, "above({}", c.difference())?;
                write_tolerances(f, &[&c.time_tol, &c.exp_tol])?;
                write!(f, ")")
            }
            Event::Timer(t) => {
                write!(f, "timer({}", t.start)?;
                write_tolerances(f, &[&t.period, &t.time_tol])?;
                write!(f, ")")
            }
            Event::InitialStep(types) if types.is_empty() => write!(f, "initial_step"),
            Event::InitialStep(types) => {
                write!(f, "initial_step({})", SimType::argument_list(types))
            }
            Event::FinalStep(types) if types.is_empty() => write!(f, "final_step"),
            Event::FinalStep(types) => write!(f, "final_step({})", SimType::argument_list(types)),
            Event::Or(a, b) => write!(f, "{a} or {b}"),
        }
    }
}

/// Crossing event with optional tolerances. An expression tolerance is only
/// meaningful after a time tolerance, so `build` rejects it on its own.
#[derive(Debug, Clone)]
pub struct CrossBuilder {
    crossing: Crossing,
    above: bool,
}

impl CrossBuilder {
    pub fn new(expr: impl Into<Real>, threshold: impl Into<Real>, edge: Edge) -> Self {
        Self {
            crossing: Crossing {
                expr: expr.into(),
                threshold: threshold.into(),
                edge,
                time_tol: None,
                exp_tol: None,
            },
            above: false,
        }
    }

    /// Builds an `above` event instead of `cross`; the edge is ignored.
    pub fn above(mut self) -> Self {
        self.above = true;
        self
    }

    pub fn time_tol(mut self, tol: impl Into<Real>) -> Self {
        self.crossing.time_tol = Some(tol.into());
        self
    }

    pub fn exp_tol(mut self, tol: impl Into<Real>) -> Self {
        self.crossing.exp_tol = Some(tol.into());
        self
    }

    pub fn build(self) -> Result<Event> {
        let constructor = if self.above { "above" } else { "cross" };
        if self.crossing.exp_tol.is_some() && self.crossing.time_tol.is_none() {
            return Err(BuildError::MissingParameter {
                constructor,
                detail: "expression tolerance given without a time tolerance".to_string(),
            });
        }
        let crossing = Box::new(self.crossing);
        Ok(if self.above {
            Event::Above(crossing)
        } else {
            Event::Cross(crossing)
        })
    }
}

/// Timer event with optional period and time tolerance.
#[derive(Debug, Clone)]
pub struct TimerBuilder {
    timer: Timer,
}

impl TimerBuilder {
    pub fn new(start: impl Into<Real>) -> Self {
        Self {
            timer: Timer {
                start: start.into(),
                period: None,
                time_tol: None,
            },
        }
    }

    pub fn period(mut self, period: impl Into<Real>) -> Self {
        self.timer.period = Some(period.into());
        self
    }

    pub fn time_tol(mut self, tol: impl Into<Real>) -> Self {
        self.timer.time_tol = Some(tol.into());
        self
    }

    pub fn build(self) -> Result<Event> {
        if self.timer.time_tol.is_some() && self.timer.period.is_none() {
            return Err(BuildError::MissingParameter {
                constructor: "timer",
                detail: "time tolerance given without a period".to_string(),
            });
        }
        Ok(Event::Timer(Box::new(self.timer)))
    }
}
