//! Digital pins referenced to a supply net (the *domain*).
//!
//! Outputs drive `V(domain)` or 0 through a series resistance, inputs load the
//! pin with a small capacitance and compare against half the domain voltage.
//! The bus variants apply the same per bit, bit 0 being the least significant.

use log::debug;

use crate::Result;
use crate::error::BuildError;
use crate::veriloga::func::{ddt, transition};
use crate::veriloga::{
    Bool, BoolVar, Branch, Bus, Direction, Edge, Event, Integer, Module, Net, Real, RealVar,
    Statement,
};

use super::device_var;

/// Widest bus an integer expression can be written to or read from.
const MAX_WORD_BITS: usize = 32;

/// Programmable edge times shared by the output-capable pins.
#[derive(Debug, Clone)]
struct Edges {
    rise: RealVar,
    fall: RealVar,
}

impl Edges {
    fn install(module: &mut Module, pin: &Net) -> Result<Self> {
        let defaults = module.options().devices.clone();
        Ok(Self {
            rise: module.var_named(&device_var(pin, "rise"), defaults.rise_time)?,
            fall: module.var_named(&device_var(pin, "fall"), defaults.fall_time)?,
        })
    }

    /// `transition(level ? 1 : 0, 0, rise, fall)`.
    fn smooth(&self, level: &BoolVar) -> Real {
        transition(Real::from_bool(level), 0.0, &self.rise, &self.fall)
    }

    fn set(&self, rise: impl Into<Real>, fall: impl Into<Real>) -> Statement {
        Statement::list([self.rise.assign(rise), self.fall.assign(fall)])
    }
}

fn install_input(module: &mut Module, pin: &Net) -> Result<()> {
    let capacitance = module.options().devices.input_capacitance;
    module.add_epilogue(Branch::flow(pin).contribute(ddt(pin.v()) * capacitance))
}

fn threshold(domain: &Net) -> Real {
    domain.v() / 2.0
}

/// Digital output pin.
#[derive(Debug, Clone)]
pub struct DigOut {
    pin: Net,
    domain: Net,
    value: BoolVar,
    edges: Edges,
}

impl DigOut {
    pub fn new(module: &mut Module, pin: &Net, domain: &Net) -> Result<Self> {
        let value = module.var_named(&device_var(pin, "value"), false)?;
        let edges = Edges::install(module, pin)?;
        let resistance = module.options().devices.series_resistance;
        let drive = Branch::potential(pin);
        module.add_epilogue(drive.contribute(domain.v() * edges.smooth(&value)))?;
        module.add_epilogue(drive.contribute(pin.i() * resistance))?;
        debug!("Installed DigOut on `{pin}` in `{}`", module.name());
        Ok(Self {
            pin: pin.clone(),
            domain: domain.clone(),
            value,
            edges,
        })
    }

    pub fn pin(&self) -> &Net {
        &self.pin
    }

    pub fn domain(&self) -> &Net {
        &self.domain
    }

    pub fn write(&self, level: impl Into<Bool>) -> Statement {
        self.value.assign(level)
    }

    pub fn set_rise_fall(&self, rise: impl Into<Real>, fall: impl Into<Real>) -> Statement {
        self.edges.set(rise, fall)
    }
}

/// Digital input pin.
#[derive(Debug, Clone)]
pub struct DigIn {
    pin: Net,
    domain: Net,
}

impl DigIn {
    pub fn new(module: &mut Module, pin: &Net, domain: &Net) -> Result<Self> {
        install_input(module, pin)?;
        debug!("Installed DigIn on `{pin}` in `{}`", module.name());
        Ok(Self {
            pin: pin.clone(),
            domain: domain.clone(),
        })
    }

    pub fn pin(&self) -> &Net {
        &self.pin
    }

    /// `V(pin) > V(domain)/2`.
    pub fn read(&self) -> Bool {
        self.pin.v().gt(threshold(&self.domain))
    }

    /// Event on the pin crossing half the domain voltage.
    pub fn edge(&self, edge: Edge) -> Event {
        Event::cross(self.pin.v(), threshold(&self.domain), edge)
    }
}

/// Bidirectional pin. The driver sits on an internal auxiliary net and is
/// connected to the pin through a conductance switched by `enable`.
#[derive(Debug, Clone)]
pub struct DigInOut {
    pin: Net,
    domain: Net,
    value: BoolVar,
    enable: BoolVar,
    edges: Edges,
}

impl DigInOut {
    pub fn new(module: &mut Module, pin: &Net, domain: &Net) -> Result<Self> {
        let aux = module.net(&device_var(pin, "aux"), Direction::Internal)?;
        let value = module.var_named(&device_var(pin, "value"), false)?;
        let enable = module.var_named(&device_var(pin, "enable"), false)?;
        let edges = Edges::install(module, pin)?;
        let resistance = module.options().devices.series_resistance;

        module.add_epilogue(Branch::potential(&aux).contribute(domain.v() * edges.smooth(&value)))?;
        let link = Branch::flow_between(pin, &aux);
        let across = Branch::potential_between(pin, &aux).value();
        module.add_epilogue(link.contribute(across * edges.smooth(&enable) / resistance))?;
        install_input(module, pin)?;
        debug!("Installed DigInOut on `{pin}` in `{}`", module.name());
        Ok(Self {
            pin: pin.clone(),
            domain: domain.clone(),
            value,
            enable,
            edges,
        })
    }

    pub fn pin(&self) -> &Net {
        &self.pin
    }

    /// Enables the driver and sets its level.
    pub fn write(&self, level: impl Into<Bool>) -> Statement {
        Statement::list([self.enable.assign(true), self.value.assign(level)])
    }

    /// Disables the driver, leaving the pin to other devices.
    pub fn release(&self) -> Statement {
        self.enable.assign(false)
    }

    pub fn read(&self) -> Bool {
        self.pin.v().gt(threshold(&self.domain))
    }

    pub fn edge(&self, edge: Edge) -> Event {
        Event::cross(self.pin.v(), threshold(&self.domain), edge)
    }

    pub fn set_rise_fall(&self, rise: impl Into<Real>, fall: impl Into<Real>) -> Statement {
        self.edges.set(rise, fall)
    }
}

/// A word to put on a bus: a host constant or an integer expression.
#[derive(Debug, Clone)]
pub enum BusWord {
    Host(u64),
    /// Unsuffixed host literal; rejected when negative.
    Signed(i64),
    Expr(Integer),
}

impl From<i32> for BusWord {
    fn from(value: i32) -> Self {
        BusWord::Signed(i64::from(value))
    }
}

impl From<u64> for BusWord {
    fn from(value: u64) -> Self {
        BusWord::Host(value)
    }
}

impl From<u32> for BusWord {
    fn from(value: u32) -> Self {
        BusWord::Host(u64::from(value))
    }
}

impl From<Integer> for BusWord {
    fn from(value: Integer) -> Self {
        BusWord::Expr(value)
    }
}

impl From<&Integer> for BusWord {
    fn from(value: &Integer) -> Self {
        BusWord::Expr(value.clone())
    }
}

/// Per-bit levels of `word` for a bus of `width` bits.
fn split_word(width: usize, word: BusWord) -> Result<Vec<Bool>> {
    match word {
        BusWord::Signed(value) => match u64::try_from(value) {
            Ok(value) => split_word(width, BusWord::Host(value)),
            Err(_) => Err(BuildError::out_of_range(
                "bus word",
                format!("{value} is negative"),
            )),
        },
        BusWord::Host(value) => Ok((0..width)
            .map(|i| {
                let shift = u32::try_from(i).unwrap_or(u32::MAX);
                Bool::from(value.checked_shr(shift).unwrap_or(0) & 1 == 1)
            })
            .collect()),
        BusWord::Expr(expr) => {
            if width > MAX_WORD_BITS {
                return Err(BuildError::structural(
                    "bus write",
                    format!(
                        "cannot write an integer expression to a {width}-bit bus (max {MAX_WORD_BITS})"
                    ),
                ));
            }
            Ok((0..width)
                .map(|i| Bool::from_integer((&expr >> Integer::index(i)) & 1))
                .collect())
        }
    }
}

/// Reassembles an integer from per-bit levels, LSB first.
fn join_bits(bits: Vec<Bool>, signed: bool) -> Result<Integer> {
    let width = bits.len();
    let limit = if signed { MAX_WORD_BITS - 1 } else { MAX_WORD_BITS };
    if width > limit {
        let kind = if signed { "signed" } else { "unsigned" };
        return Err(BuildError::out_of_range(
            "bus read",
            format!("{width}-bit {kind} read exceeds {limit} bits"),
        ));
    }
    bits.into_iter()
        .enumerate()
        .map(|(i, bit)| {
            let term = Integer::from_bool(bit);
            let term = if i == 0 { term } else { term << Integer::index(i) };
            if signed && i + 1 == width { -term } else { term }
        })
        .reduce(|acc, term| acc + term)
        .ok_or_else(|| BuildError::out_of_range("bus read", "bus has no bits"))
}

#[derive(Debug, Clone)]
pub struct DigOutBus {
    bus: Bus,
    bits: Vec<DigOut>,
}

impl DigOutBus {
    pub fn new(module: &mut Module, bus: &Bus, domain: &Net) -> Result<Self> {
        let bits = bus
            .bits()
            .iter()
            .map(|bit| DigOut::new(module, bit, domain))
            .collect::<Result<_>>()?;
        Ok(Self {
            bus: bus.clone(),
            bits,
        })
    }

    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    pub fn bits(&self) -> &[DigOut] {
        &self.bits
    }

    /// Sets bit `i` to `(word >> i) & 1`.
    pub fn write(&self, word: impl Into<BusWord>) -> Result<Statement> {
        let levels = split_word(self.bits.len(), word.into())?;
        Ok(Statement::list(
            self.bits.iter().zip(levels).map(|(bit, level)| bit.write(level)),
        ))
    }

    pub fn set_rise_fall(&self, rise: impl Into<Real>, fall: impl Into<Real>) -> Statement {
        let (rise, fall) = (rise.into(), fall.into());
        Statement::list(self.bits.iter().map(|bit| bit.set_rise_fall(&rise, &fall)))
    }
}

#[derive(Debug, Clone)]
pub struct DigInBus {
    bus: Bus,
    bits: Vec<DigIn>,
}

impl DigInBus {
    pub fn new(module: &mut Module, bus: &Bus, domain: &Net) -> Result<Self> {
        let bits = bus
            .bits()
            .iter()
            .map(|bit| DigIn::new(module, bit, domain))
            .collect::<Result<_>>()?;
        Ok(Self {
            bus: bus.clone(),
            bits,
        })
    }

    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    pub fn bits(&self) -> &[DigIn] {
        &self.bits
    }

    /// Integer value of the bus; `signed` reads the MSB as `-2^(w-1)`.
    pub fn read(&self, signed: bool) -> Result<Integer> {
        join_bits(self.bits.iter().map(DigIn::read).collect(), signed)
    }
}

#[derive(Debug, Clone)]
pub struct DigInOutBus {
    bus: Bus,
    bits: Vec<DigInOut>,
}

impl DigInOutBus {
    pub fn new(module: &mut Module, bus: &Bus, domain: &Net) -> Result<Self> {
        let bits = bus
            .bits()
            .iter()
            .map(|bit| DigInOut::new(module, bit, domain))
            .collect::<Result<_>>()?;
        Ok(Self {
            bus: bus.clone(),
            bits,
        })
    }

    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    pub fn bits(&self) -> &[DigInOut] {
        &self.bits
    }

    pub fn write(&self, word: impl Into<BusWord>) -> Result<Statement> {
        let levels = split_word(self.bits.len(), word.into())?;
        Ok(Statement::list(
            self.bits.iter().zip(levels).map(|(bit, level)| bit.write(level)),
        ))
    }

    pub fn release(&self) -> Statement {
        Statement::list(self.bits.iter().map(DigInOut::release))
    }

    pub fn read(&self, signed: bool) -> Result<Integer> {
        join_bits(self.bits.iter().map(DigInOut::read).collect(), signed)
    }

    pub fn set_rise_fall(&self, rise: impl Into<Real>, fall: impl Into<Real>) -> Statement {
        let (rise, fall) = (rise.into(), fall.into());
        Statement::list(self.bits.iter().map(|bit| bit.set_rise_fall(&rise, &fall)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn module() -> (Module, Net) {
        let mut m = Module::new("m").unwrap();
        let vdd = m.net("vdd", Direction::Input).unwrap();
        (m, vdd)
    }

    #[test]
    fn test_dig_out_contributions() {
        let (mut m, vdd) = module();
        let pin = m.net("q", Direction::Output).unwrap();
        let out = DigOut::new(&mut m, &pin, &vdd).unwrap();
        assert_eq!(out.write(true).render(0), "q_$value$ = 1;\n");
        assert_eq!(
            m.epilogue[0].render(0),
            "V(q) <+ ( V(vdd) )*( transition(q_$value$ ? ( 1.0 ) : ( 0.0 ), 0.000000e+00, q_$rise$, q_$fall$) );\n"
        );
        assert_eq!(m.epilogue[1].render(0), "V(q) <+ ( I(q) )*( 1.000000e+02 );\n");
    }

    #[test]
    fn test_dig_in_read_and_edge() {
        let (mut m, vdd) = module();
        let pin = m.net("a", Direction::Input).unwrap();
        let input = DigIn::new(&mut m, &pin, &vdd).unwrap();
        assert_eq!(
            input.read().to_string(),
            "( V(a) )>( ( V(vdd) )/( 2.000000e+00 ) )"
        );
        assert_eq!(
            input.edge(Edge::Rising).to_string(),
            "cross(V(a) - ( V(vdd) )/( 2.000000e+00 ), 1)"
        );
        assert_eq!(
            m.epilogue[0].render(0),
            "I(a) <+ ( ddt(V(a)) )*( 1.000000e-14 );\n"
        );
    }

    #[test]
    fn test_dig_inout_uses_aux_net() {
        let (mut m, vdd) = module();
        let pin = m.net("io", Direction::Inout).unwrap();
        let io = DigInOut::new(&mut m, &pin, &vdd).unwrap();
        assert!(m.nets().iter().any(|n| n.name() == "io_$aux$"));
        assert_eq!(m.epilogue.len(), 3);
        assert!(m.epilogue[1].render(0).starts_with("I(io,io_$aux$) <+ ( ( V(io,io_$aux$) )*"));
        assert_eq!(io.write(false).render(0), "io_$enable$ = 1;\nio_$value$ = 0;\n");
        assert_eq!(io.release().render(0), "io_$enable$ = 0;\n");
    }

    #[test]
    fn test_bus_write_host_word() {
        let (mut m, vdd) = module();
        let bus = m.bus("d", 4, Direction::Output).unwrap();
        let out = DigOutBus::new(&mut m, &bus, &vdd).unwrap();
        insta::assert_snapshot!(out.write(0b0101_u32).unwrap().render(0), @r"
        d_$0$_$value$ = 1;
        d_$1$_$value$ = 0;
        d_$2$_$value$ = 1;
        d_$3$_$value$ = 0;
        ");
    }

    #[test]
    fn test_bus_write_unsuffixed_literal() {
        let (mut m, vdd) = module();
        let bus = m.bus("d", 4, Direction::Output).unwrap();
        let out = DigOutBus::new(&mut m, &bus, &vdd).unwrap();
        assert_eq!(
            out.write(5).unwrap().render(0),
            out.write(0b0101_u32).unwrap().render(0)
        );
        assert!(matches!(out.write(-1), Err(BuildError::OutOfRange { .. })));
    }

    #[test]
    fn test_bus_write_expression() {
        let (mut m, vdd) = module();
        let bus = m.bus("d", 2, Direction::Output).unwrap();
        let out = DigOutBus::new(&mut m, &bus, &vdd).unwrap();
        let text = out.write(Integer::raw("w")).unwrap().render(0);
        assert_eq!(
            text.lines().nth(1),
            Some("d_$1$_$value$ = ( ( ( w )>>( 1 ) )&( 1 ) )!=( 0 );")
        );
    }

    #[test]
    fn test_wide_bus_rejects_expression_write() {
        let (mut m, vdd) = module();
        let bus = m.bus("d", 33, Direction::Output).unwrap();
        let out = DigOutBus::new(&mut m, &bus, &vdd).unwrap();
        assert!(out.write(1_u64 << 40).is_ok());
        assert!(matches!(
            out.write(Integer::raw("w")),
            Err(BuildError::StructuralViolation { .. })
        ));
    }

    #[test]
    fn test_bus_read_limits() {
        let (mut m, vdd) = module();
        let bus = m.bus("d", 32, Direction::Input).unwrap();
        let input = DigInBus::new(&mut m, &bus, &vdd).unwrap();
        assert!(input.read(false).is_ok());
        assert!(matches!(
            input.read(true),
            Err(BuildError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_signed_read_negates_msb() {
        let (mut m, vdd) = module();
        let bus = m.bus("d", 2, Direction::Input).unwrap();
        let input = DigInBus::new(&mut m, &bus, &vdd).unwrap();
        let bit = |i: usize| format!("( V(d[{i}]) )>( ( V(vdd) )/( 2.000000e+00 ) )");
        assert_eq!(
            input.read(true).unwrap().to_string(),
            format!(
                "( {} ? ( 1 ) : ( 0 ) )+( -( ( {} ? ( 1 ) : ( 0 ) )<<( 1 ) ) )",
                bit(0),
                bit(1)
            )
        );
    }
}
