//! Source-measure unit: a pin that forces voltage, current or resistance.
//!
//! All three modes drive the same contribution. A `tanh` regulator pulls the
//! pin current between `minCur` and `maxCur` depending on how far the pin sits
//! from `volt`; a resistive leak and a small capacitor keep the solution
//! well-conditioned. Each mode is a choice of those parameters:
//!
//! | mode     | volt  | maxCur       | minCur        | res              |
//! |----------|-------|--------------|---------------|------------------|
//! | force V  | v     | \|lim\|      | -\|lim\|      | 1e4/(\|lim\|+1e-9) |
//! | force I  | lim   | (i+\|i\|)/2  | (i-\|i\|)/2   | 1e4/(\|i\|+1e-9)   |
//! | force R  | 0     | 0            | 0             | r                |

use log::debug;

use crate::Result;
use crate::veriloga::func::{ddt, tanh, transition};
use crate::veriloga::{Branch, Module, Net, Real, RealVar, Statement};

use super::device_var;

#[derive(Debug, Clone)]
pub struct Smu {
    pin: Net,
    volt: RealVar,
    max_cur: RealVar,
    min_cur: RealVar,
    res: RealVar,
    v_delay: RealVar,
    i_delay: RealVar,
    r_delay: RealVar,
    rise_fall: RealVar,
}

impl Smu {
    pub fn new(module: &mut Module, pin: &Net) -> Result<Self> {
        let defaults = module.options().devices.clone();
        let mut var = |suffix: &str, init: f64| module.var_named(&device_var(pin, suffix), init);
        let smu = Self {
            pin: pin.clone(),
            volt: var("volt", 0.0)?,
            max_cur: var("maxCur", 0.0)?,
            min_cur: var("minCur", 0.0)?,
            // high impedance until a mode is applied
            res: var("res", 1e9)?,
            v_delay: var("vDelay", 0.0)?,
            i_delay: var("iDelay", 0.0)?,
            r_delay: var("rDelay", 0.0)?,
            rise_fall: var("riseFall", defaults.rise_time)?,
        };

        let edge = || smu.rise_fall.value();
        let volt = transition(&smu.volt, &smu.v_delay, edge(), edge());
        let max_cur = transition(&smu.max_cur, &smu.i_delay, edge(), edge());
        let min_cur = transition(&smu.min_cur, &smu.i_delay, edge(), edge());
        let res = transition(&smu.res, &smu.r_delay, edge(), edge());
        let v = pin.v();
        let flow = Branch::flow(pin);

        let regulator = tanh(defaults.smu_gain * (v.clone() - volt)) * 0.5 * (&max_cur - &min_cur)
            + 0.5 * (max_cur + min_cur);
        module.add_epilogue(flow.contribute(regulator))?;
        module.add_epilogue(flow.contribute(v.clone() / res))?;
        module.add_epilogue(flow.contribute(ddt(v) * defaults.smu_capacitance))?;
        debug!("Installed Smu on `{pin}` in `{}`", module.name());
        Ok(smu)
    }

    pub fn pin(&self) -> &Net {
        &self.pin
    }

    /// Forces `volts`, limiting the current to `±i_limit`.
    pub fn apply_v(&self, volts: impl Into<Real>, i_limit: impl Into<Real>) -> Statement {
        let limit = i_limit.into().abs();
        Statement::list([
            self.volt.assign(volts),
            self.max_cur.assign(&limit),
            self.min_cur.assign(-&limit),
            self.res.assign(1e4 / (limit + 1e-9)),
            self.v_delay.assign(0.0),
            self.i_delay.assign(1e-6),
            self.r_delay.assign(1e-6),
        ])
    }

    /// Forces `amps`, limiting the voltage to `v_limit`.
    pub fn apply_i(&self, amps: impl Into<Real>, v_limit: impl Into<Real>) -> Statement {
        let amps = amps.into();
        let magnitude = amps.abs();
        Statement::list([
            self.volt.assign(v_limit),
            self.max_cur.assign(0.5 * (&amps + &magnitude)),
            self.min_cur.assign(0.5 * (&amps - &magnitude)),
            self.res.assign(1e4 / (magnitude + 1e-9)),
            self.v_delay.assign(1e-6),
            self.i_delay.assign(0.0),
            self.r_delay.assign(0.0),
        ])
    }

    /// Turns the pin into a resistor to ground.
    pub fn apply_r(&self, ohms: impl Into<Real>) -> Statement {
        Statement::list([
            self.volt.assign(0.0),
            self.max_cur.assign(0.0),
            self.min_cur.assign(0.0),
            self.res.assign(ohms),
            self.v_delay.assign(1e-6),
        ])
    }

    pub fn set_rise_fall(&self, edge: impl Into<Real>) -> Statement {
        self.rise_fall.assign(edge)
    }

    pub fn measure_v(&self) -> Real {
        self.pin.v()
    }

    pub fn measure_i(&self) -> Real {
        self.pin.i()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::veriloga::Direction;

    fn smu() -> (Module, Smu) {
        let mut m = Module::new("m").unwrap();
        let pin = m.net("s", Direction::Inout).unwrap();
        let smu = Smu::new(&mut m, &pin).unwrap();
        (m, smu)
    }

    #[test]
    fn test_smu_installs_three_contributions() {
        let (m, _) = smu();
        assert_eq!(m.epilogue.len(), 3);
        let regulator = m.epilogue[0].render(0);
        assert!(regulator.starts_with("I(s) <+ ( ( ( tanh(( 5.000000e+01 )*( ( V(s) )-( transition(s_$volt$, s_$vDelay$, s_$riseFall$, s_$riseFall$) ) ))"));
        assert_eq!(
            m.epilogue[1].render(0),
            "I(s) <+ ( V(s) )/( transition(s_$res$, s_$rDelay$, s_$riseFall$, s_$riseFall$) );\n"
        );
        assert_eq!(
            m.epilogue[2].render(0),
            "I(s) <+ ( ddt(V(s)) )*( 1.000000e-12 );\n"
        );
    }

    #[test]
    fn test_apply_v() {
        let (_, smu) = smu();
        insta::assert_snapshot!(smu.apply_v(1.2, 1e-3).render(0), @r"
        s_$volt$ = 1.200000e+00;
        s_$maxCur$ = abs(1.000000e-03);
        s_$minCur$ = -( abs(1.000000e-03) );
        s_$res$ = ( 1.000000e+04 )/( ( abs(1.000000e-03) )+( 1.000000e-09 ) );
        s_$vDelay$ = 0.000000e+00;
        s_$iDelay$ = 1.000000e-06;
        s_$rDelay$ = 1.000000e-06;
        ");
    }

    #[test]
    fn test_apply_i_and_r() {
        let (_, smu) = smu();
        let text = smu.apply_i(Real::raw("i"), 3.3).render(0);
        assert!(text.contains("s_$maxCur$ = ( 5.000000e-01 )*( ( i )+( abs(i) ) );"));
        assert!(text.contains("s_$minCur$ = ( 5.000000e-01 )*( ( i )-( abs(i) ) );"));
        assert!(text.contains("s_$volt$ = 3.300000e+00;"));
        let text = smu.apply_r(1e3).render(0);
        assert!(text.contains("s_$res$ = 1.000000e+03;"));
        assert_eq!(text.lines().count(), 5);
    }
}
