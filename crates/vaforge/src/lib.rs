//! Embedded DSL for generating Verilog-A stimulus modules.
//!
//! The [`veriloga`] layer mirrors Verilog-A expressions, events and statements
//! one-to-one and assembles them into a [`Module`]. The [`hilevel`] layer adds
//! stimulus devices (sources, SMUs, digital pins, switches, clocks, markers) and
//! a sequencer that compiles timed scripts into a state machine.

mod error;
pub mod hilevel;
pub mod options;
pub mod veriloga;

pub(crate) use fxhash::FxHashSet as HashSet;

pub use error::{BuildError, Result};
pub use hilevel::{
    Clock, CompiledSequence, DigIn, DigInBus, DigInOut, DigInOutBus, DigOut, DigOutBus, Idc,
    Marker, Smu, StateId, Sw, Vdc,
};
pub use options::{DeviceDefaults, HeaderStamp, ModuleOptions, OptionsError};
pub use veriloga::{
    Bool, Branch, Bus, Case, Direction, Edge, Event, If, Integer, IntoScalar, Module, Net, Nets,
    Real, Scalar, SimType, Statement, Value, ValueKind, Var, Variable,
};
pub use veriloga::{BoolVar, IntegerVar, RealVar};
