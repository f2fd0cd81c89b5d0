//! System tasks (`$strobe`, `$fopen`, `$finish`, ...).

use super::literal::quote;
use super::stmt::Statement;
use super::value::{Expr, Integer, Real, Value};

fn task_call(name: &str, format: &str, args: &[Value]) -> Statement {
    let mut parts = vec![quote(format)];
    parts.extend(args.iter().map(|arg| arg.text().to_string()));
    let rtoi = args.iter().any(Value::uses_rtoi);
    Statement::command_with_rtoi(format!("{name}({})", parts.join(", ")), rtoi)
}

/// `$strobe("format", args...)`.
pub fn strobe(format: &str, args: &[Value]) -> Statement {
    task_call("$strobe", format, args)
}

pub fn display(format: &str, args: &[Value]) -> Statement {
    task_call("$display", format, args)
}

pub fn write(format: &str, args: &[Value]) -> Statement {
    task_call("$write", format, args)
}

fn file_task(name: &str, fd: &Integer, format: &str, args: &[Value]) -> Statement {
    let mut parts = vec![fd.text().to_string(), quote(format)];
    parts.extend(args.iter().map(|arg| arg.text().to_string()));
    let rtoi = fd.uses_rtoi() || args.iter().any(Value::uses_rtoi);
    Statement::command_with_rtoi(format!("{name}({})", parts.join(", ")), rtoi)
}

/// `$fstrobe(fd, "format", args...)`.
pub fn fstrobe(fd: &Integer, format: &str, args: &[Value]) -> Statement {
    file_task("$fstrobe", fd, format, args)
}

pub fn fdisplay(fd: &Integer, format: &str, args: &[Value]) -> Statement {
    file_task("$fdisplay", fd, format, args)
}

pub fn fwrite(fd: &Integer, format: &str, args: &[Value]) -> Statement {
    file_task("$fwrite", fd, format, args)
}

/// `$fopen("path")` as an integer file descriptor; assign it to a variable.
pub fn fopen(path: &str) -> Integer {
    Integer(Expr::raw(format!("$fopen({})", quote(path))))
}

/// `$fopen("path", "mode")`.
pub fn fopen_mode(path: &str, mode: &str) -> Integer {
    Integer(Expr::raw(format!("$fopen({}, {})", quote(path), quote(mode))))
}

pub fn fclose(fd: &Integer) -> Statement {
    Statement::command_with_rtoi(format!("$fclose({fd})"), fd.uses_rtoi())
}

pub fn finish() -> Statement {
    Statement::raw("$finish")
}

pub fn stop() -> Statement {
    Statement::raw("$stop")
}

/// `$discontinuity(order)`.
pub fn discontinuity(order: i32) -> Statement {
    Statement::raw(format!("$discontinuity({order})"))
}

/// `$bound_step(step)`, limiting the simulator time step.
pub fn bound_step(step: impl Into<Real>) -> Statement {
    let step = step.into();
    Statement::command_with_rtoi(format!("$bound_step({step})"), step.uses_rtoi())
}
