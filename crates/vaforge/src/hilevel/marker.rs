//! Timing markers: a dedicated output port toggled from inside sequences, plus
//! the measurement expressions that locate each toggle in a transient result.

use log::debug;

use crate::Result;
use crate::veriloga::func::transition;
use crate::veriloga::{BoolVar, Branch, Direction, Module, Net, Real, Statement};

const MARK_EDGE: f64 = 1e-10;

/// Output port `MARK_<tag>` that flips level on every [`Marker::mark`].
#[derive(Debug, Clone)]
pub struct Marker {
    tag: String,
    port: Net,
    state: BoolVar,
    labels: Vec<String>,
}

impl Module {
    /// Installs a marker. The tag becomes part of the port name and of the
    /// exported measurement names.
    pub fn marker(&mut self, tag: &str) -> Result<Marker> {
        let port = self.net(&format!("MARK_{tag}"), Direction::Output)?;
        let state = self.var_named(&format!("_$markSt_{tag}"), false)?;
        let level = transition(Real::from_bool(&state), 0.0, MARK_EDGE, MARK_EDGE);
        self.add_epilogue(Branch::potential(&port).contribute(level))?;
        self.markers.push(tag.to_string());
        debug!("Installed marker `{tag}` in `{}`", self.name());
        Ok(Marker {
            tag: tag.to_string(),
            port,
            state,
            labels: Vec::new(),
        })
    }
}

impl Marker {
    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn port(&self) -> &Net {
        &self.port
    }

    /// Labels in the order they were marked.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Toggles the marker port. Only valid inside a sequence.
    pub fn mark(&mut self, label: &str) -> Statement {
        self.labels.push(label.to_string());
        Statement::mark(self.state.name(), label)
    }

    /// Ocean expression for the `n`-th toggle, counting from 1.
    fn cross_expr(&self, n: usize) -> String {
        format!(
            "cross(getData(\"/{}\" ?result \"tran\") 0.5 {n} \"either\" nil nil)",
            self.port
        )
    }

    /// One maestro output definition per recorded label.
    pub fn maestro_csv(&self) -> Vec<String> {
        self.labels
            .iter()
            .enumerate()
            .map(|(i, label)| {
                format!(
                    "{tag},{tag}_{label},expr,{},t,,",
                    self.cross_expr(i + 1),
                    tag = self.tag
                )
            })
            .collect()
    }

    /// One OCEAN `axlAddOutputExpr` call per recorded label.
    pub fn ocean_script(&self) -> Vec<String> {
        self.labels
            .iter()
            .enumerate()
            .map(|(i, label)| {
                let expr = self.cross_expr(i + 1).replace('"', "\\\"");
                format!(
                    "axlAddOutputExpr(session \"{tag}\" \"{tag}_{label}\" ?expr \"{expr}\" ?plot t)",
                    tag = self.tag
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marker_port_and_epilogue() {
        let mut m = Module::new("m").unwrap();
        let mut marker = m.marker("seq1").unwrap();
        assert_eq!(m.markers(), ["seq1"]);
        assert_eq!(m.ports().next().map(|p| p.name()), Some("MARK_seq1"));
        assert_eq!(
            m.epilogue[0].render(0),
            "V(MARK_seq1) <+ transition(_$markSt_seq1 ? ( 1.0 ) : ( 0.0 ), 0.000000e+00, 1.000000e-10, 1.000000e-10);\n"
        );
        let mark = marker.mark("END_SMU_TEST");
        assert_eq!(mark.render(0), "_$markSt_seq1 = !_$markSt_seq1;\n");
        assert_eq!(marker.labels(), ["END_SMU_TEST"]);
    }

    #[test]
    fn test_side_file_lines() {
        let mut m = Module::new("m").unwrap();
        let mut marker = m.marker("t").unwrap();
        marker.mark("A");
        marker.mark("B");
        assert_eq!(
            marker.maestro_csv()[1],
            "t,t_B,expr,cross(getData(\"/MARK_t\" ?result \"tran\") 0.5 2 \"either\" nil nil),t,,"
        );
        assert_eq!(
            marker.ocean_script()[0],
            "axlAddOutputExpr(session \"t\" \"t_A\" ?expr \"cross(getData(\\\"/MARK_t\\\" ?result \\\"tran\\\") 0.5 1 \\\"either\\\" nil nil)\" ?plot t)"
        );
    }

    #[test]
    fn test_mark_outside_sequence_rejected() {
        let mut m = Module::new("m").unwrap();
        let mut marker = m.marker("x").unwrap();
        assert!(m.add_body(marker.mark("oops")).is_err());
        assert!(m.is_poisoned());
    }
}
