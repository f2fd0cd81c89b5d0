//! Bundled stimulus benches and the files written for each of them.

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};
use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use vaforge::veriloga::task::strobe;
use vaforge::{
    Bool, Clock, DigIn, DigOut, DigOutBus, Direction, Edge, Event, If, Marker, Module,
    ModuleOptions, Real, Smu, Statement, Value, Vdc,
};

/// A generated module together with the markers installed on it.
pub struct Generated {
    pub module: Module,
    pub markers: Vec<Marker>,
}

pub struct Bench {
    pub name: &'static str,
    pub description: &'static str,
    build: fn(&ModuleOptions) -> vaforge::Result<Generated>,
}

impl Bench {
    pub fn build(&self, options: &ModuleOptions) -> vaforge::Result<Generated> {
        debug!("Building bench `{}`", self.name);
        (self.build)(options)
    }
}

pub const BENCHES: &[Bench] = &[
    Bench {
        name: "vdc_step",
        description: "Voltage source with programmed edges stepping to 2 V",
        build: vdc_step,
    },
    Bench {
        name: "shared_event",
        description: "Two sequences resuming on the same crossing event",
        build: shared_event,
    },
    Bench {
        name: "smu_sweep",
        description: "SMU voltage sweep with current readout and markers",
        build: smu_sweep,
    },
    Bench {
        name: "spi_write",
        description: "Serial write with clock, address bus and readback check",
        build: spi_write,
    },
];

pub fn find(name: &str) -> Option<&'static Bench> {
    BENCHES.iter().find(|bench| bench.name == name)
}

fn vdc_step(options: &ModuleOptions) -> vaforge::Result<Generated> {
    let mut m = Module::with_options("vdc_step", options.clone())?;
    let pin = m.net("pin3", Direction::Output)?;
    let vdc = Vdc::new(&mut m, &pin)?;
    m.seq(true, [vdc.set_rise_fall(30e-6, 30e-6), vdc.apply_v(2)])?;
    Ok(Generated {
        module: m,
        markers: Vec::new(),
    })
}

fn shared_event(options: &ModuleOptions) -> vaforge::Result<Generated> {
    let mut m = Module::with_options("shared_event", options.clone())?;
    let pin = m.net("pin7", Direction::Input)?;
    let out = m.net("out", Direction::Output)?;
    let vdc = Vdc::new(&mut m, &out)?;
    let crossing = || Event::cross(pin.v(), 0.5, Edge::Both);
    m.seq(
        true,
        [
            Statement::wait_signal(crossing()),
            vdc.apply_v(1.0),
        ],
    )?;
    m.seq(
        true,
        [
            Statement::wait_us(10.0),
            Statement::wait_signal(crossing()),
            strobe("second crossing at %g", &[Value::from(vaforge::veriloga::func::abstime())]),
        ],
    )?;
    Ok(Generated {
        module: m,
        markers: Vec::new(),
    })
}

fn smu_sweep(options: &ModuleOptions) -> vaforge::Result<Generated> {
    let mut m = Module::with_options("smu_sweep", options.clone())?;
    let pin = m.net("dut", Direction::Inout)?;
    let smu = Smu::new(&mut m, &pin)?;
    let mut marker = m.marker("sweep")?;
    let step = m.var_named("step", 0)?;

    let volts = Real::from_integer(&*step) * 0.25;
    let sweep = Statement::repeat(
        8,
        [
            smu.apply_v(volts, 1e-3),
            Statement::wait_us(20.0),
            strobe(
                "step=%d v=%g i=%g",
                &[Value::from(&*step), smu.measure_v().into(), smu.measure_i().into()],
            ),
            step.inc(),
        ],
    )?;
    let script = [
        smu.set_rise_fall(1e-6),
        marker.mark("SWEEP_START"),
        sweep,
        marker.mark("SWEEP_END"),
        smu.apply_i(-10e-6, 3.3),
        Statement::wait_us(50.0),
        smu.apply_r(1e6),
    ];
    m.seq(true, script)?;
    Ok(Generated {
        module: m,
        markers: vec![marker],
    })
}

fn spi_write(options: &ModuleOptions) -> vaforge::Result<Generated> {
    let mut m = Module::with_options("spi_write", options.clone())?;
    let vdd = m.net("vdd", Direction::Input)?;
    let cs_pin = m.net("cs", Direction::Output)?;
    let sck_pin = m.net("sck", Direction::Output)?;
    let mosi_pin = m.net("mosi", Direction::Output)?;
    let miso_pin = m.net("miso", Direction::Input)?;
    let addr = m.bus("addr", 4, Direction::Output)?;

    let cs = DigOut::new(&mut m, &cs_pin, &vdd)?;
    let clock = Clock::new(&mut m, &sck_pin, &vdd)?;
    let mosi = DigOut::new(&mut m, &mosi_pin, &vdd)?;
    let miso = DigIn::new(&mut m, &miso_pin, &vdd)?;
    let addr_out = DigOutBus::new(&mut m, &addr, &vdd)?;
    let mut marker = m.marker("spi")?;

    let word = m.var_named("word", 0xA5)?;
    let bit = m.var_named("bit", 7)?;
    let errors = m.var_named("errors", 0)?;

    let expected = Bool::from_integer((&*word >> &*bit) & 1);
    let shift = Statement::while_loop(
        bit.ge(0),
        [
            mosi.write(expected.clone()),
            Statement::wait_us(0.5),
            If::new(miso.read() ^ expected, [errors.inc()])?.into(),
            bit.dec(),
            Statement::wait_us(0.5),
        ],
    )?;
    let script = [
        cs.write(true),
        addr_out.write(0b1010_u32)?,
        clock.on(1e6),
        Statement::wait_us(1.0),
        cs.write(false),
        marker.mark("FRAME_START"),
        shift,
        clock.off(),
        cs.write(true),
        marker.mark("FRAME_END"),
        strobe("spi errors=%d", &[Value::from(&*errors)]),
    ];
    m.seq(true, script)?;
    Ok(Generated {
        module: m,
        markers: vec![marker],
    })
}

#[derive(Debug, Serialize)]
pub struct PortSummary {
    pub name: String,
    pub direction: String,
    pub width: usize,
}

#[derive(Debug, Serialize)]
pub struct ModuleSummary {
    pub bench: String,
    pub module: String,
    pub ports: Vec<PortSummary>,
    pub sequences: usize,
    pub markers: Vec<String>,
    pub files: Vec<PathBuf>,
}

/// Writes `<module>.va` and, when the module has markers, the maestro CSV and
/// OCEAN side files.
pub fn write_outputs(bench: &str, generated: &Generated, out_dir: &Path) -> Result<ModuleSummary> {
    let module = &generated.module;
    let text = module.emit().into_diagnostic()?;
    fs::create_dir_all(out_dir).into_diagnostic()?;

    let va_path = out_dir.join(format!("{}.va", module.name()));
    fs::write(&va_path, text).into_diagnostic()?;
    let mut files = vec![va_path];

    if !generated.markers.is_empty() {
        let csv: Vec<String> = generated.markers.iter().flat_map(Marker::maestro_csv).collect();
        let ocn: Vec<String> = generated.markers.iter().flat_map(Marker::ocean_script).collect();
        let csv_path = out_dir.join(format!("{}_markers.csv", module.name()));
        let ocn_path = out_dir.join(format!("{}_markers.ocn", module.name()));
        fs::write(&csv_path, csv.join("\n") + "\n").into_diagnostic()?;
        fs::write(&ocn_path, ocn.join("\n") + "\n").into_diagnostic()?;
        files.push(csv_path);
        files.push(ocn_path);
    }

    for file in &files {
        info!("Wrote {}", file.display());
    }

    Ok(ModuleSummary {
        bench: bench.to_string(),
        module: module.name().to_string(),
        ports: module
            .ports()
            .map(|port| PortSummary {
                name: port.name().to_string(),
                direction: port.direction().to_string(),
                width: port.width(),
            })
            .collect(),
        sequences: module.sequence_count(),
        markers: module.markers().to_vec(),
        files,
    })
}
