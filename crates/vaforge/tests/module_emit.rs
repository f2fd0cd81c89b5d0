use vaforge::veriloga::func::{floor, transition};
use vaforge::veriloga::task::strobe;
use vaforge::{Direction, Integer, Module, ModuleOptions, Real, Statement, Value};

fn module(name: &str) -> Module {
    Module::with_options(name, ModuleOptions::reproducible("2026-01-01 00:00:00")).unwrap()
}

/// Emitted text from the first include onwards, skipping the version banner.
fn after_header(text: &str) -> &str {
    &text[text.find("`include").unwrap()..]
}

#[test]
fn test_header_stamp() {
    let text = module("m").emit().unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], format!("/*{}*/", "-".repeat(74)));
    assert!(lines[1].starts_with("/* Verilog-A module `m` generated by vaforge "));
    assert!(lines[1].ends_with(" */"));
    assert_eq!(lines[1].len(), 78);
    assert!(lines[2].starts_with("/* 2026-01-01 00:00:00 "));
    assert_eq!(lines[3], lines[0]);
}

#[test]
fn test_var_module_layout() {
    let mut m = module("m");
    m.var(9);
    insta::assert_snapshot!(after_header(&m.emit().unwrap()), @r#"
    `include "constants.vams"
    `include "disciplines.vams"

    /*--------------------------- Module declaration ---------------------------*/
    module m();

    /*--------------------------------- Ports ----------------------------------*/

    /*------------------------------ Disciplines -------------------------------*/

    /*------------------------------- Variables --------------------------------*/
    integer _$1;

    /*------------------------------ Analog block ------------------------------*/
    analog begin
        if( analysis("static") )
            _$1 = 9;
        @( initial_step("tran") )
            _$1 = 9;
    end
    endmodule
    "#);
}

#[test]
fn test_ports_parameters_and_sections() {
    let mut m = module("dut");
    let vdd = m.net("vdd", Direction::Input).unwrap();
    let d = m.bus("d", 4, Direction::Output).unwrap();
    m.net("mid", Direction::Internal).unwrap();
    let gain: Real = m.parameter("gain", 2.0).unwrap();
    let steps: Integer = m.parameter("steps", 10).unwrap();
    let x = m.var_named("x", 0.0).unwrap();

    m.add_prologue(x.assign(&gain * vdd.v())).unwrap();
    m.add_body(strobe("steps=%d", &[Value::from(&steps)])).unwrap();
    m.add_epilogue(vaforge::Branch::potential(d.bit(0).unwrap()).contribute(&*x))
        .unwrap();

    insta::assert_snapshot!(after_header(&m.emit().unwrap()), @r#"
    `include "constants.vams"
    `include "disciplines.vams"

    /*--------------------------- Module declaration ---------------------------*/
    module dut(vdd,
               d);

    /*--------------------------------- Ports ----------------------------------*/
    input vdd;
    output [3:0] d;

    /*------------------------------ Disciplines -------------------------------*/
    electrical vdd;
    electrical [3:0] d;
    electrical mid;

    /*------------------------------- Parameters -------------------------------*/
    parameter real gain = 2.000000e+00;
    parameter integer steps = 10;

    /*------------------------------- Variables --------------------------------*/
    real x;

    /*------------------------------ Analog block ------------------------------*/
    analog begin
        if( analysis("static") )
            x = 0.000000e+00;
        @( initial_step("tran") )
            x = 0.000000e+00;
        x = ( gain )*( V(vdd) );
        $strobe("steps=%d", steps);
        V(d[0]) <+ x;
    end
    endmodule
    "#);
}

#[test]
fn test_rtoi_helper_only_when_used() {
    let mut m = module("m");
    let n = m.var(0);
    m.add_body(n.assign(Integer::from_real(Real::raw("V(a)")))).unwrap();
    let text = m.emit().unwrap();
    assert!(text.contains(
        "/*--------------------------- Build-in functions ---------------------------*/
analog function integer _rtoi;
input in; real in;
begin _rtoi = floor(in + 0.5); end
endfunction
"
    ));

    let mut plain = module("m");
    let r = plain.var(0.0);
    plain.add_body(r.assign(floor(Real::raw("V(a)")))).unwrap();
    assert!(!plain.emit().unwrap().contains("_rtoi"));
}

#[test]
fn test_rtoi_detected_in_dc_init() {
    let mut m = module("m");
    m.var(Integer::from_real(2.6));
    assert!(m.emit().unwrap().contains("analog function integer _rtoi;"));
}

#[test]
fn test_emission_is_idempotent() {
    let mut m = Module::new("m").unwrap();
    let a = m.net("a", Direction::Output).unwrap();
    let v = m.var(1.0);
    m.add_epilogue(vaforge::Branch::potential(&a).contribute(transition(&v, 0.0, 1e-9, 1e-9)))
        .unwrap();
    assert_eq!(m.emit().unwrap(), m.emit().unwrap());
}

#[test]
fn test_ports_follow_registration_order() {
    let mut m = module("m");
    for (name, dir) in [
        ("z", Direction::Output),
        ("a", Direction::Input),
        ("k", Direction::Inout),
    ] {
        m.net(name, dir).unwrap();
    }
    let text = m.emit().unwrap();
    assert!(text.contains("module m(z,\n         a,\n         k);"));
    let ports = text.find("input a;").unwrap();
    assert!(text.find("output z;").unwrap() < ports);
    assert!(ports < text.find("inout k;").unwrap());
    assert!(text.find("electrical z;").unwrap() < text.find("electrical a;").unwrap());
}

#[test]
fn test_long_lines_are_soft_wrapped() {
    let mut m = module("m");
    let x = m.var_named("x", 0.0).unwrap();
    let terms = (0..8)
        .map(|i| Real::raw(format!("V(node{i})")))
        .map(|v| vaforge::veriloga::func::max(v, 0.0));
    let sum = terms.reduce(|acc, t| acc + t).unwrap();
    m.add_body(x.assign(sum)).unwrap();
    let text = m.emit().unwrap();
    let body: Vec<&str> = text
        .lines()
        .skip_while(|l| !l.starts_with("    x = ("))
        .take_while(|l| !l.starts_with("end"))
        .collect();
    assert!(body.len() > 1, "expected a wrapped assignment");
    assert!(body[0].ends_with("),"));
    assert!(body[1].starts_with("        "));
}

#[test]
fn test_wrap_column_is_configurable() {
    let options = ModuleOptions {
        wrap_column: 1000,
        ..ModuleOptions::reproducible("fixed")
    };
    let mut m = Module::with_options("m", options).unwrap();
    let x = m.var_named("x", 0.0).unwrap();
    let sum = (0..8)
        .map(|i| vaforge::veriloga::func::max(Real::raw(format!("V(n{i})")), 0.0))
        .reduce(|acc, t| acc + t)
        .unwrap();
    m.add_body(x.assign(sum)).unwrap();
    let text = m.emit().unwrap();
    let line = text.lines().find(|l| l.starts_with("    x = (")).unwrap();
    assert!(line.ends_with(");"), "assignment should stay on one line");
}

#[test]
fn test_raw_statements_pass_through() {
    let mut m = module("m");
    m.add_body(Statement::raw("$bound_step(1n)")).unwrap();
    assert!(m.emit().unwrap().contains("    $bound_step(1n);\n"));
}
