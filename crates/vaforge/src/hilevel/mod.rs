//! High-level stimulus devices and the sequence compiler.
//!
//! Devices install their declarations and contributions on a [`Module`] when
//! constructed; their operations only return statements, to be placed into a
//! sequence (see [`Module::seq`]).
//!
//! [`Module`]: crate::Module
//! [`Module::seq`]: crate::Module::seq

mod clock;
mod digital;
mod marker;
mod sequence;
mod smu;
mod source;
mod switch;

pub use clock::Clock;
pub use digital::{BusWord, DigIn, DigInBus, DigInOut, DigInOutBus, DigOut, DigOutBus};
pub use marker::Marker;
pub use sequence::{CompiledSequence, StateId, StateMachineBuilder};
pub use smu::Smu;
pub use source::{Idc, Vdc};
pub use switch::Sw;

use crate::veriloga::Net;

/// Name of a device-owned variable: the pin identifier followed by `_$suffix$`.
pub(crate) fn device_var(pin: &Net, suffix: &str) -> String {
    format!("{}_${suffix}$", pin.ident())
}
