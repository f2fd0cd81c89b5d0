//! Two-terminal switch with a programmable conductance.

use log::debug;

use crate::Result;
use crate::veriloga::func::transition;
use crate::veriloga::{Branch, Module, Net, Real, RealVar, Statement};

/// `I(a,b) <+ V(a,b) * transition(cond, 0, rise, fall)`.
#[derive(Debug, Clone)]
pub struct Sw {
    a: Net,
    b: Net,
    cond: RealVar,
    rise: RealVar,
    fall: RealVar,
}

impl Sw {
    pub fn new(module: &mut Module, a: &Net, b: &Net) -> Result<Self> {
        let defaults = module.options().devices.clone();
        let base = format!("{}_{}", a.ident(), b.ident());
        let cond = module.var_named(&format!("{base}_$cond$"), 0.0)?;
        let rise = module.var_named(&format!("{base}_$rise$"), defaults.rise_time)?;
        let fall = module.var_named(&format!("{base}_$fall$"), defaults.fall_time)?;
        let across = Branch::potential_between(a, b).value();
        module.add_epilogue(
            Branch::flow_between(a, b).contribute(across * transition(&cond, 0.0, &rise, &fall)),
        )?;
        debug!("Installed Sw between `{a}` and `{b}` in `{}`", module.name());
        Ok(Self {
            a: a.clone(),
            b: b.clone(),
            cond,
            rise,
            fall,
        })
    }

    pub fn terminals(&self) -> (&Net, &Net) {
        (&self.a, &self.b)
    }

    /// Sets the conductance in siemens; 0 opens the switch.
    pub fn set_cond(&self, siemens: impl Into<Real>) -> Statement {
        self.cond.assign(siemens)
    }

    pub fn set_rise_fall(&self, rise: impl Into<Real>, fall: impl Into<Real>) -> Statement {
        Statement::list([self.rise.assign(rise), self.fall.assign(fall)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::veriloga::Direction;

    #[test]
    fn test_switch_between_bus_bits() {
        let mut m = Module::new("m").unwrap();
        let a = m.net("a", Direction::Inout).unwrap();
        let bus = m.bus("b", 2, Direction::Inout).unwrap();
        let sw = Sw::new(&mut m, &a, bus.bit(1).unwrap()).unwrap();
        assert_eq!(sw.set_cond(1e-3).render(0), "a_b_$1$_$cond$ = 1.000000e-03;\n");
        assert_eq!(
            m.epilogue[0].render(0),
            "I(a,b[1]) <+ ( V(a,b[1]) )*( transition(a_b_$1$_$cond$, 0.000000e+00, a_b_$1$_$rise$, a_b_$1$_$fall$) );\n"
        );
    }

    #[test]
    fn test_rise_fall_order() {
        let mut m = Module::new("m").unwrap();
        let a = m.net("a", Direction::Inout).unwrap();
        let b = m.net("b", Direction::Inout).unwrap();
        let sw = Sw::new(&mut m, &a, &b).unwrap();
        assert_eq!(
            sw.set_rise_fall(1e-6, 2e-6).render(1),
            "    a_b_$rise$ = 1.000000e-06;\n    a_b_$fall$ = 2.000000e-06;\n"
        );
    }
}
