//! Low-level Verilog-A layer: values, declarations, events, statements and
//! the module assembler.

mod emit;
mod event;
pub mod func;
pub mod literal;
mod module;
pub mod name;
mod net;
mod stmt;
pub mod task;
mod value;
mod var;

pub use event::{CrossBuilder, Crossing, Edge, Event, SimType, Timer, TimerBuilder};
pub use module::{Module, NetDecl};
pub use net::{Branch, Bus, Direction, Nature, Net, Nets};
pub use stmt::{Block, Case, CaseArm, CaseLabel, Command, If, Loop, Mark, Statement, WaitEvent};
pub use value::{BinaryOp, Bool, Integer, IntoScalar, Real, Scalar, Value, ValueKind};
pub use var::{BoolVar, IntegerVar, RealVar, Var, Variable};

pub(crate) use module::PrologueItem;
