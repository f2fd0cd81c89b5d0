//! Free-running clock on a digital output.

use log::debug;

use crate::Result;
use crate::veriloga::func::abstime;
use crate::veriloga::{BoolVar, Event, If, Module, Net, Real, RealVar, Statement};

use super::device_var;
use super::digital::DigOut;

/// Toggles its pin every half period while switched on.
///
/// The clock is driven from the prologue by a timer on its own `time`
/// variable. Switching it off lets the current high phase finish, so the pin
/// always settles low.
#[derive(Debug, Clone)]
pub struct Clock {
    driver: DigOut,
    is_on: BoolVar,
    half_period: RealVar,
    time: RealVar,
}

impl Clock {
    pub fn new(module: &mut Module, pin: &Net, domain: &Net) -> Result<Self> {
        let driver = DigOut::new(module, pin, domain)?;
        let out = module.var_named(&device_var(pin, "out"), false)?;
        let is_on = module.var_named(&device_var(pin, "isOn"), false)?;
        let half_period = module.var_named(&device_var(pin, "halfPeriod"), 0.5e-6)?;
        // far beyond any practical run until `on` schedules the first edge
        let time = module.var_named(&device_var(pin, "time"), 1e9)?;

        let reschedule = If::new(
            &*is_on | &*out,
            [time.assign(abstime() + &*half_period)],
        )?;
        module.add_prologue(Statement::wait_event(
            Event::timer(&time),
            [out.toggle(), driver.write(&out), reschedule.into()],
        )?)?;
        debug!("Installed Clock on `{pin}` in `{}`", module.name());
        Ok(Self {
            driver,
            is_on,
            half_period,
            time,
        })
    }

    pub fn pin(&self) -> &Net {
        self.driver.pin()
    }

    /// Starts toggling at `frequency` hertz from the next nanosecond.
    pub fn on(&self, frequency: impl Into<Real>) -> Statement {
        let frequency: Real = frequency.into();
        Statement::list([
            self.half_period.assign(0.5 / frequency),
            self.is_on.assign(true),
            self.time.assign(abstime() + 1e-9),
        ])
    }

    pub fn off(&self) -> Statement {
        self.is_on.assign(false)
    }

    pub fn set_rise_fall(&self, rise: impl Into<Real>, fall: impl Into<Real>) -> Statement {
        self.driver.set_rise_fall(rise, fall)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::veriloga::Direction;

    #[test]
    fn test_clock_prologue() {
        let mut m = Module::new("m").unwrap();
        let vdd = m.net("vdd", Direction::Input).unwrap();
        let clk = m.net("clk", Direction::Output).unwrap();
        Clock::new(&mut m, &clk, &vdd).unwrap();
        let mut text = String::new();
        m.prologue[0].render_into(0, &mut text);
        insta::assert_snapshot!(text, @r"
        @( timer(clk_$time$) ) begin
            clk_$out$ = !clk_$out$;
            clk_$value$ = clk_$out$;
            if( ( clk_$isOn$ )||( clk_$out$ ) )
                clk_$time$ = ( $abstime )+( clk_$halfPeriod$ );
        end
        ");
    }

    #[test]
    fn test_on_off() {
        let mut m = Module::new("m").unwrap();
        let vdd = m.net("vdd", Direction::Input).unwrap();
        let clk = m.net("clk", Direction::Output).unwrap();
        let clock = Clock::new(&mut m, &clk, &vdd).unwrap();
        insta::assert_snapshot!(clock.on(1e6).render(0), @r"
        clk_$halfPeriod$ = ( 5.000000e-01 )/( 1.000000e+06 );
        clk_$isOn$ = 1;
        clk_$time$ = ( $abstime )+( 1.000000e-09 );
        ");
        assert_eq!(clock.off().render(0), "clk_$isOn$ = 0;\n");
    }
}
