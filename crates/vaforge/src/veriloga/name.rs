//! Identifier validation and per-module name allocation.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::HashSet;
use crate::error::{BuildError, Result};

static IDENTIFIER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[_A-Za-z][_A-Za-z$0-9]*$").unwrap());

const RESERVED: &[&str] = &[
    "analog", "begin", "case", "default", "discipline", "electrical", "else", "end", "endcase",
    "endfunction", "endmodule", "for", "function", "if", "inout", "input", "integer", "module",
    "output", "parameter", "real", "repeat", "while",
];

/// Checks a user-supplied identifier without claiming it.
pub fn validate(name: &str) -> Result<()> {
    if !IDENTIFIER.is_match(name) {
        return Err(BuildError::InvalidName {
            name: name.to_string(),
            reason: "must match [_A-Za-z][_A-Za-z$0-9]*",
        });
    }
    if RESERVED.contains(&name) {
        return Err(BuildError::InvalidName {
            name: name.to_string(),
            reason: "is a Verilog-A keyword",
        });
    }
    Ok(())
}

/// Every net, parameter and variable of one module shares this namespace.
#[derive(Debug, Default, Clone)]
pub(crate) struct Namespace {
    taken: HashSet<String>,
    counter: usize,
}

impl Namespace {
    pub(crate) fn claim(&mut self, name: &str) -> Result<String> {
        validate(name)?;
        if !self.taken.insert(name.to_string()) {
            return Err(BuildError::InvalidName {
                name: name.to_string(),
                reason: "is already declared in this module",
            });
        }
        Ok(name.to_string())
    }

    /// Next anonymous name `_$1`, `_$2`, ... skipping names already taken.
    pub(crate) fn fresh(&mut self) -> String {
        loop {
            self.counter += 1;
            let name = format!("_${}", self.counter);
            if self.taken.insert(name.clone()) {
                return name;
            }
        }
    }
}
