//! Ideal DC voltage and current sources with programmable edges.

use log::debug;

use crate::Result;
use crate::veriloga::func::transition;
use crate::veriloga::{Branch, Module, Net, Real, RealVar, Statement};

use super::device_var;

#[derive(Debug, Clone)]
struct Source {
    pin: Net,
    value: RealVar,
    rise: RealVar,
    fall: RealVar,
}

impl Source {
    fn install(module: &mut Module, pin: &Net, branch: Branch, kind: &str) -> Result<Self> {
        let defaults = module.options().devices.clone();
        let value = module.var_named(&device_var(pin, "value"), 0.0)?;
        let rise = module.var_named(&device_var(pin, "rise"), defaults.rise_time)?;
        let fall = module.var_named(&device_var(pin, "fall"), defaults.fall_time)?;
        module.add_epilogue(branch.contribute(transition(&value, 0.0, &rise, &fall)))?;
        debug!("Installed {kind} on `{pin}` in `{}`", module.name());
        Ok(Self {
            pin: pin.clone(),
            value,
            rise,
            fall,
        })
    }

    fn set_rise_fall(&self, rise: impl Into<Real>, fall: impl Into<Real>) -> Statement {
        Statement::list([self.rise.assign(rise), self.fall.assign(fall)])
    }
}

/// Voltage source: `V(pin) <+ transition(value, 0, rise, fall)`.
#[derive(Debug, Clone)]
pub struct Vdc(Source);

impl Vdc {
    pub fn new(module: &mut Module, pin: &Net) -> Result<Self> {
        Source::install(module, pin, Branch::potential(pin), "Vdc").map(Vdc)
    }

    pub fn pin(&self) -> &Net {
        &self.0.pin
    }

    /// Sets the output voltage.
    pub fn apply_v(&self, volts: impl Into<Real>) -> Statement {
        self.0.value.assign(volts)
    }

    /// Sets the edge times used by every later change of the output.
    pub fn set_rise_fall(&self, rise: impl Into<Real>, fall: impl Into<Real>) -> Statement {
        self.0.set_rise_fall(rise, fall)
    }
}

/// Current source: `I(pin) <+ transition(value, 0, rise, fall)`.
#[derive(Debug, Clone)]
pub struct Idc(Source);

impl Idc {
    pub fn new(module: &mut Module, pin: &Net) -> Result<Self> {
        Source::install(module, pin, Branch::flow(pin), "Idc").map(Idc)
    }

    pub fn pin(&self) -> &Net {
        &self.0.pin
    }

    pub fn apply_i(&self, amps: impl Into<Real>) -> Statement {
        self.0.value.assign(amps)
    }

    pub fn set_rise_fall(&self, rise: impl Into<Real>, fall: impl Into<Real>) -> Statement {
        self.0.set_rise_fall(rise, fall)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::veriloga::Direction;

    #[test]
    fn test_vdc_declares_and_contributes() {
        let mut m = Module::new("m").unwrap();
        let pin = m.net("pin3", Direction::Output).unwrap();
        let vdc = Vdc::new(&mut m, &pin).unwrap();
        assert_eq!(vdc.apply_v(2).render(0), "pin3_$value$ = 2.000000e+00;\n");
        assert_eq!(
            vdc.set_rise_fall(30e-6, 30e-6).render(0),
            "pin3_$rise$ = 3.000000e-05;\npin3_$fall$ = 3.000000e-05;\n"
        );
        assert_eq!(
            m.epilogue[0].render(0),
            "V(pin3) <+ transition(pin3_$value$, 0.000000e+00, pin3_$rise$, pin3_$fall$);\n"
        );
    }

    #[test]
    fn test_idc_on_bus_bit() {
        let mut m = Module::new("m").unwrap();
        let bus = m.bus("d", 2, Direction::Output).unwrap();
        let idc = Idc::new(&mut m, bus.bit(1).unwrap()).unwrap();
        assert_eq!(idc.apply_i(1e-3).render(0), "d_$1$_$value$ = 1.000000e-03;\n");
        assert!(m.epilogue[0].render(0).starts_with("I(d[1]) <+ transition("));
    }

    #[test]
    fn test_second_source_on_same_pin_fails() {
        let mut m = Module::new("m").unwrap();
        let pin = m.net("p", Direction::Output).unwrap();
        Vdc::new(&mut m, &pin).unwrap();
        assert!(Vdc::new(&mut m, &pin).is_err());
        assert!(m.is_poisoned());
    }
}
