//! Electrical nets, buses and branch access functions.

use std::fmt;
use std::str::FromStr;

use crate::error::{BuildError, Result};

use super::stmt::Statement;
use super::value::{Expr, Real};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Input,
    Output,
    Inout,
    /// Declared with a discipline but not listed as a port.
    Internal,
}

impl Direction {
    /// Port declaration keyword, `None` for internal nets.
    pub fn keyword(self) -> Option<&'static str> {
        match self {
            Direction::Input => Some("input"),
            Direction::Output => Some("output"),
            Direction::Inout => Some("inout"),
            Direction::Internal => None,
        }
    }

    pub fn is_port(self) -> bool {
        self != Direction::Internal
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.keyword().unwrap_or("internal"))
    }
}

impl FromStr for Direction {
    type Err = BuildError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "input" => Ok(Direction::Input),
            "output" => Ok(Direction::Output),
            "inout" => Ok(Direction::Inout),
            "internal" => Ok(Direction::Internal),
            _ => Err(BuildError::InvalidEnum {
                kind: "direction",
                value: s.to_string(),
                allowed: "input, output, inout, internal".to_string(),
            }),
        }
    }
}

/// Handle to one scalar net or one bus bit.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Net {
    name: String,
}

impl Net {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Name as written in access functions, e.g. `d[3]`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name usable as an identifier prefix: `d[3]` becomes `d_$3$`.
    pub fn ident(&self) -> String {
        self.name.replace('[', "_$").replace(']', "$")
    }

    /// `V(net)`.
    pub fn v(&self) -> Real {
        Branch::potential(self).value()
    }

    /// `I(net)`.
    pub fn i(&self) -> Real {
        Branch::flow(self).value()
    }
}

impl fmt::Display for Net {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bus {
    name: String,
    bits: Vec<Net>,
}

impl Bus {
    pub(crate) fn new(name: &str, width: usize) -> Self {
        let bits = (0..width).map(|i| Net::new(format!("{name}[{i}]"))).collect();
        Self {
            name: name.to_string(),
            bits,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn width(&self) -> usize {
        self.bits.len()
    }

    pub fn bits(&self) -> &[Net] {
        &self.bits
    }

    pub fn bit(&self, index: usize) -> Result<&Net> {
        self.bits.get(index).ok_or_else(|| {
            BuildError::out_of_range(
                "bus index",
                format!("{}[{index}] on a {}-bit bus", self.name, self.width()),
            )
        })
    }

    /// Inclusive slice `[hi:lo]`: ascending indices when `hi >= lo`,
    /// descending from `lo` down to `hi` otherwise.
    pub fn slice(&self, hi: usize, lo: usize) -> Result<Vec<Net>> {
        self.slice_step(hi, lo, 1)
    }

    pub fn slice_step(&self, hi: usize, lo: usize, step: usize) -> Result<Vec<Net>> {
        if step == 0 {
            return Err(BuildError::out_of_range("bus slice step", "step must be positive"));
        }
        self.bit(hi)?;
        self.bit(lo)?;
        let indices: Vec<usize> = if hi >= lo {
            (lo..=hi).step_by(step).collect()
        } else {
            (hi..=lo).rev().step_by(step).collect()
        };
        Ok(indices.into_iter().map(|i| self.bits[i].clone()).collect())
    }
}

/// Result of declaring a net of arbitrary width.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Nets {
    Scalar(Net),
    Bus(Bus),
}

impl Nets {
    pub fn as_net(&self) -> Option<&Net> {
        match self {
            Nets::Scalar(net) => Some(net),
            Nets::Bus(_) => None,
        }
    }

    pub fn as_bus(&self) -> Option<&Bus> {
        match self {
            Nets::Scalar(_) => None,
            Nets::Bus(bus) => Some(bus),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nature {
    /// `V(...)`
    Potential,
    /// `I(...)`
    Flow,
}

/// A branch between a net and ground, or between two nets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Branch {
    nature: Nature,
    pos: Net,
    neg: Option<Net>,
}

impl Branch {
    pub fn potential(pos: &Net) -> Self {
        Self {
            nature: Nature::Potential,
            pos: pos.clone(),
            neg: None,
        }
    }

    pub fn flow(pos: &Net) -> Self {
        Self {
            nature: Nature::Flow,
            pos: pos.clone(),
            neg: None,
        }
    }

    pub fn potential_between(pos: &Net, neg: &Net) -> Self {
        Self {
            nature: Nature::Potential,
            pos: pos.clone(),
            neg: Some(neg.clone()),
        }
    }

    pub fn flow_between(pos: &Net, neg: &Net) -> Self {
        Self {
            nature: Nature::Flow,
            pos: pos.clone(),
            neg: Some(neg.clone()),
        }
    }

    pub fn nature(&self) -> Nature {
        self.nature
    }

    /// The access function as a real value, e.g. `V(a,b)`.
    pub fn value(&self) -> Real {
        Real(Expr::raw(self.to_string()))
    }

    /// `V(a) <+ rhs;`
    pub fn contribute(&self, rhs: impl Into<Real>) -> Statement {
        let rhs = rhs.into();
        Statement::command_with_rtoi(format!("{self} <+ {rhs}"), rhs.uses_rtoi())
    }
}

impl fmt::Display for Branch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let access = match self.nature {
            Nature::Potential => "V",
            Nature::Flow => "I",
        };
        match &self.neg {
            Some(neg) => write!(f, "{access}({},{})", self.pos, neg),
            None => write!(f, "{access}({})", self.pos),
        }
    }
}
