//! Text emission for [`Module`].

use itertools::Itertools;
use log::{info, trace};

use crate::error::{BuildError, Result};

use super::event::{Event, SimType};
use super::func::analysis;
use super::module::{Module, PrologueItem};
use super::stmt::{Statement, render_block};

const BANNER_WIDTH: usize = 78;
const CONTINUATION: &str = "    ";

const RTOI_FUNCTION: &str = "analog function integer _rtoi;
input in; real in;
begin _rtoi = floor(in + 0.5); end
endfunction
";

/// `/* ----- Title ----- */`, centred.
fn banner(title: &str) -> String {
    let inner = format!(" {title} ");
    format!("/*{inner:-^width$}*/\n", width = BANNER_WIDTH - 4)
}

fn boxed_line(text: &str) -> String {
    format!("/* {text:<width$} */\n", width = BANNER_WIDTH - 6)
}

/// Inserts a line break after `),` once the line has reached `column`.
/// Breaks never happen inside string literals.
fn soft_wrap(line: &str, column: usize) -> String {
    if line.chars().count() <= column {
        return line.to_string();
    }
    let leading = line.len() - line.trim_start().len();
    let continuation = format!("{}{CONTINUATION}", &line[..leading]);
    let mut out = String::with_capacity(line.len() + 16);
    let mut width = 0;
    let mut prev = None;
    let mut in_string = false;
    let mut wrapped = false;
    let mut chars = line.chars().peekable();
    while let Some(ch) = chars.next() {
        out.push(ch);
        width += 1;
        if ch == '"' && prev != Some('\\') {
            in_string = !in_string;
        }
        if ch == ',' && prev == Some(')') && !in_string && width >= column {
            while chars.peek() == Some(&' ') {
                chars.next();
            }
            if chars.peek().is_none() {
                break;
            }
            out.push('\n');
            out.push_str(&continuation);
            width = continuation.len();
            wrapped = true;
        }
        prev = Some(ch);
    }
    if !wrapped && line.chars().count() > column {
        trace!("No break point in {}-column line", line.chars().count());
    }
    out
}

impl PrologueItem {
    pub(crate) fn uses_rtoi(&self) -> bool {
        match self {
            PrologueItem::Statement(stmt) => stmt.uses_rtoi(),
            PrologueItem::SharedEvent { event, clauses, .. } => {
                event.uses_rtoi() || clauses.iter().any(Statement::uses_rtoi)
            }
        }
    }

    pub(crate) fn render_into(&self, depth: usize, out: &mut String) {
        match self {
            PrologueItem::Statement(stmt) => stmt.render_into(depth, out),
            PrologueItem::SharedEvent { event, clauses, .. } => {
                render_block(&format!("@( {event} )"), clauses, depth, false, out)
            }
        }
    }
}

impl Module {
    fn uses_rtoi(&self) -> bool {
        self.dc_init.iter().any(Statement::uses_rtoi)
            || self.prologue.iter().any(PrologueItem::uses_rtoi)
            || self.body.iter().any(Statement::uses_rtoi)
            || self.epilogue.iter().any(Statement::uses_rtoi)
    }

    /// Renders the complete module text.
    ///
    /// Emission does not modify the module, so repeated calls return the same
    /// text. A module whose construction failed returns
    /// [`BuildError::Poisoned`].
    pub fn emit(&self) -> Result<String> {
        if let Some(cause) = &self.poison {
            return Err(BuildError::Poisoned {
                module: self.name.clone(),
                cause: Box::new(cause.clone()),
            });
        }

        let mut out = String::new();
        self.emit_header(&mut out);
        self.emit_declaration(&mut out);
        self.emit_ports(&mut out);
        self.emit_disciplines(&mut out);
        if self.uses_rtoi() {
            out.push('\n');
            out.push_str(&banner("Build-in functions"));
            out.push_str(RTOI_FUNCTION);
        }
        self.emit_parameters(&mut out);
        self.emit_variables(&mut out);
        self.emit_analog(&mut out);

        let column = self.options.wrap_column;
        let text = out.lines().map(|line| soft_wrap(line, column)).join("\n") + "\n";
        info!("Emitted module `{}` ({} bytes)", self.name, text.len());
        Ok(text)
    }

    fn emit_header(&self, out: &mut String) {
        let rule = format!("/*{}*/\n", "-".repeat(BANNER_WIDTH - 4));
        out.push_str(&rule);
        out.push_str(&boxed_line(&format!(
            "Verilog-A module `{}` generated by vaforge {}",
            self.name,
            env!("CARGO_PKG_VERSION")
        )));
        out.push_str(&boxed_line(&self.stamp));
        out.push_str(&rule);
        out.push_str("`include \"constants.vams\"\n");
        out.push_str("`include \"disciplines.vams\"\n");
    }

    fn emit_declaration(&self, out: &mut String) {
        out.push('\n');
        out.push_str(&banner("Module declaration"));
        let head = format!("module {}(", self.name);
        let align = " ".repeat(head.len());
        let ports: Vec<&str> = self.ports().map(|p| p.name()).collect();
        if ports.is_empty() {
            out.push_str(&format!("{head});\n"));
            return;
        }
        let body = ports.iter().join(&format!(",\n{align}"));
        out.push_str(&format!("{head}{body});\n"));
    }

    fn emit_ports(&self, out: &mut String) {
        out.push('\n');
        out.push_str(&banner("Ports"));
        for port in self.ports() {
            if let Some(keyword) = port.direction().keyword() {
                out.push_str(&format!("{keyword} {}{};\n", port.range(), port.name()));
            }
        }
    }

    fn emit_disciplines(&self, out: &mut String) {
        out.push('\n');
        out.push_str(&banner("Disciplines"));
        for net in &self.nets {
            out.push_str(&format!("electrical {}{};\n", net.range(), net.name()));
        }
    }

    fn emit_parameters(&self, out: &mut String) {
        if self.parameters.is_empty() {
            return;
        }
        out.push('\n');
        out.push_str(&banner("Parameters"));
        for p in &self.parameters {
            out.push_str(&format!(
                "parameter {} {} = {};\n",
                p.kind.declaration(),
                p.name,
                p.default
            ));
        }
    }

    fn emit_variables(&self, out: &mut String) {
        if self.variables.is_empty() {
            return;
        }
        out.push('\n');
        out.push_str(&banner("Variables"));
        for v in &self.variables {
            out.push_str(&format!("{} {};\n", v.kind.declaration(), v.name));
        }
    }

    fn emit_analog(&self, out: &mut String) {
        out.push('\n');
        out.push_str(&banner("Analog block"));
        out.push_str("analog begin\n");
        if !self.dc_init.is_empty() {
            let static_header = format!("if( {} )", analysis(&[SimType::Static]));
            render_block(&static_header, &self.dc_init, 1, false, out);
            let tran_header = format!("@( {} )", Event::initial_step(&[SimType::Tran]));
            render_block(&tran_header, &self.dc_init, 1, false, out);
        }
        for item in &self.prologue {
            item.render_into(1, out);
        }
        for stmt in self.body.iter().chain(&self.epilogue) {
            stmt.render_into(1, out);
        }
        out.push_str("end\nendmodule\n");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_banner_is_centred() {
        let line = banner("Ports");
        assert_eq!(line.trim_end().len(), BANNER_WIDTH);
        assert!(line.starts_with("/*---"));
        assert!(line.contains(" Ports "));
    }

    #[test]
    fn test_soft_wrap_after_closing_paren_comma() {
        let line = format!("    x = f({}), g(b), h(c);", "a".repeat(80));
        let wrapped = soft_wrap(&line, 80);
        let lines: Vec<&str> = wrapped.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("),"));
        assert_eq!(lines[1], "        g(b), h(c);");
    }

    #[test]
    fn test_soft_wrap_leaves_short_lines() {
        assert_eq!(soft_wrap("a(b), c(d);", 80), "a(b), c(d);");
    }

    #[test]
    fn test_soft_wrap_ignores_strings() {
        let line = format!("$strobe(\"{}), x\");", "a".repeat(90));
        assert_eq!(soft_wrap(&line, 80), line);
    }
}
