//! The module builder: declarations plus the three analog command lists.

use log::debug;

use crate::error::{BuildError, Result};
use crate::options::ModuleOptions;

use super::event::Event;
use super::name::{Namespace, validate};
use super::net::{Bus, Direction, Net, Nets};
use super::stmt::Statement;
use super::value::sealed::Sealed;
use super::value::{Expr, IntoScalar, Scalar, Value, ValueKind};
use super::var::{Var, Variable};

/// One declared net or bus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetDecl {
    name: String,
    width: usize,
    direction: Direction,
}

impl NetDecl {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// `[w-1:0]` for buses, empty for scalars.
    pub(crate) fn range(&self) -> String {
        if self.width > 1 {
            format!("[{}:0] ", self.width - 1)
        } else {
            String::new()
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct ParameterDecl {
    pub(crate) name: String,
    pub(crate) kind: ValueKind,
    pub(crate) default: String,
}

#[derive(Debug, Clone)]
pub(crate) struct VariableDecl {
    pub(crate) name: String,
    pub(crate) kind: ValueKind,
}

#[derive(Debug, Clone)]
pub(crate) enum PrologueItem {
    Statement(Statement),
    /// `@( event )` block shared by every sequence waiting on the same event;
    /// clauses are appended as further sequences register.
    SharedEvent {
        event: Event,
        key: String,
        sequences: Vec<usize>,
        clauses: Vec<Statement>,
    },
}

/// One-shot builder for a Verilog-A module.
///
/// Declarations are validated as they are registered. The first failing call
/// poisons the module, after which [`Module::emit`] refuses to produce text.
#[derive(Debug, Clone)]
pub struct Module {
    pub(crate) name: String,
    pub(crate) options: ModuleOptions,
    pub(crate) stamp: String,
    namespace: Namespace,
    pub(crate) nets: Vec<NetDecl>,
    pub(crate) parameters: Vec<ParameterDecl>,
    pub(crate) variables: Vec<VariableDecl>,
    pub(crate) dc_init: Vec<Statement>,
    pub(crate) prologue: Vec<PrologueItem>,
    pub(crate) body: Vec<Statement>,
    pub(crate) epilogue: Vec<Statement>,
    pub(crate) sequences: usize,
    pub(crate) markers: Vec<String>,
    pub(crate) poison: Option<BuildError>,
}

impl Module {
    pub fn new(name: &str) -> Result<Self> {
        Self::with_options(name, ModuleOptions::default())
    }

    pub fn with_options(name: &str, options: ModuleOptions) -> Result<Self> {
        validate(name)?;
        debug!("Creating module `{name}`");
        Ok(Self {
            name: name.to_string(),
            stamp: options.header.resolve(),
            options,
            namespace: Namespace::default(),
            nets: Vec::new(),
            parameters: Vec::new(),
            variables: Vec::new(),
            dc_init: Vec::new(),
            prologue: Vec::new(),
            body: Vec::new(),
            epilogue: Vec::new(),
            sequences: 0,
            markers: Vec::new(),
            poison: None,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn options(&self) -> &ModuleOptions {
        &self.options
    }

    /// Nets in registration order, ports and internal nets alike.
    pub fn nets(&self) -> &[NetDecl] {
        &self.nets
    }

    pub fn ports(&self) -> impl Iterator<Item = &NetDecl> {
        self.nets.iter().filter(|n| n.direction.is_port())
    }

    /// Names and kinds of the declared variables.
    pub fn variables(&self) -> impl Iterator<Item = (&str, ValueKind)> {
        self.variables.iter().map(|v| (v.name.as_str(), v.kind))
    }

    /// Number of sequences compiled into this module.
    pub fn sequence_count(&self) -> usize {
        self.sequences
    }

    /// Tags of the markers installed on this module.
    pub fn markers(&self) -> &[String] {
        &self.markers
    }

    pub fn is_poisoned(&self) -> bool {
        self.poison.is_some()
    }

    /// Remembers the first failure so that emission can refuse later.
    pub(crate) fn record<T>(&mut self, result: Result<T>) -> Result<T> {
        if let Err(err) = &result {
            if self.poison.is_none() {
                debug!("Module `{}` poisoned: {err}", self.name);
                self.poison = Some(err.clone());
            }
        }
        result
    }

    /// Declares an electrical net. Width 1 yields a scalar net, wider ones a
    /// bus with bits `name[0]..name[width-1]`.
    pub fn electrical(&mut self, name: &str, width: usize, direction: Direction) -> Result<Nets> {
        let result = self.declare_net(name, width, direction);
        self.record(result)
    }

    pub fn net(&mut self, name: &str, direction: Direction) -> Result<Net> {
        let result = self
            .declare_net(name, 1, direction)
            .map(|_| Net::new(name.to_string()));
        self.record(result)
    }

    /// Declares a bus; unlike [`Module::electrical`], width 1 still yields a bus.
    pub fn bus(&mut self, name: &str, width: usize, direction: Direction) -> Result<Bus> {
        let result = self
            .declare_net(name, width, direction)
            .map(|_| Bus::new(name, width));
        self.record(result)
    }

    fn declare_net(&mut self, name: &str, width: usize, direction: Direction) -> Result<Nets> {
        if width == 0 {
            return Err(BuildError::out_of_range(
                "net width",
                format!("`{name}` must be at least 1 bit wide"),
            ));
        }
        let name = self.namespace.claim(name)?;
        debug!("Declared {direction} net `{name}` (width {width}) in `{}`", self.name);
        self.nets.push(NetDecl {
            name: name.clone(),
            width,
            direction,
        });
        Ok(if width == 1 {
            Nets::Scalar(Net::new(name))
        } else {
            Nets::Bus(Bus::new(&name, width))
        })
    }

    /// `parameter <type> name = default;`. The returned value refers to the
    /// parameter by name.
    pub fn parameter<V: IntoScalar>(&mut self, name: &str, default: V) -> Result<V::Scalar> {
        let default = default.into_scalar();
        let result = self.namespace.claim(name).map(|name| {
            debug!("Declared parameter `{name}` in `{}`", self.name);
            self.parameters.push(ParameterDecl {
                name: name.clone(),
                kind: <V::Scalar as Scalar>::KIND,
                default: default.expr().text.clone(),
            });
            V::Scalar::from_expr(Expr::raw(name))
        });
        self.record(result)
    }

    /// Anonymous variable named `_$<n>`, initialised to `init` in both
    /// DC-init blocks.
    pub fn var<V: IntoScalar>(&mut self, init: V) -> <V::Scalar as Scalar>::Var {
        let name = self.namespace.fresh();
        self.declare_var(name, init.into_scalar())
    }

    pub fn var_named<V: IntoScalar>(
        &mut self,
        name: &str,
        init: V,
    ) -> Result<<V::Scalar as Scalar>::Var> {
        let result = self.namespace.claim(name);
        let name = self.record(result)?;
        Ok(self.declare_var(name, init.into_scalar()))
    }

    /// Variable whose kind follows a dynamic initial value.
    pub fn var_value(&mut self, init: impl Into<Value>) -> Var {
        let name = self.namespace.fresh();
        self.declare_value_var(name, init.into())
    }

    pub fn var_value_named(&mut self, name: &str, init: impl Into<Value>) -> Result<Var> {
        let result = self.namespace.claim(name);
        let name = self.record(result)?;
        Ok(self.declare_value_var(name, init.into()))
    }

    fn declare_value_var(&mut self, name: String, init: Value) -> Var {
        match init {
            Value::Real(x) => Var::Real(self.declare_var(name, x)),
            Value::Integer(n) => Var::Integer(self.declare_var(name, n)),
            Value::Bool(b) => Var::Bool(self.declare_var(name, b)),
        }
    }

    fn declare_var<T: Scalar>(&mut self, name: String, init: T) -> T::Var {
        debug!("Declared {} variable `{name}` in `{}`", T::KIND, self.name);
        self.variables.push(VariableDecl {
            name: name.clone(),
            kind: T::KIND,
        });
        self.dc_init.push(Statement::assignment(&name, init.expr()));
        T::Var::with_name(name)
    }

    fn check_section(section: &'static str, stmt: &Statement) -> Result<()> {
        if stmt.contains_sequencer_only() {
            return Err(BuildError::structural(
                section,
                "wait and mark statements are only allowed inside a sequence",
            ));
        }
        Ok(())
    }

    pub fn add_prologue(&mut self, stmt: impl Into<Statement>) -> Result<()> {
        let stmt = stmt.into();
        let result = Self::check_section("prologue", &stmt);
        self.record(result)?;
        self.prologue.push(PrologueItem::Statement(stmt));
        Ok(())
    }

    pub fn add_body(&mut self, stmt: impl Into<Statement>) -> Result<()> {
        let stmt = stmt.into();
        let result = Self::check_section("body", &stmt);
        self.record(result)?;
        self.body.push(stmt);
        Ok(())
    }

    pub fn add_epilogue(&mut self, stmt: impl Into<Statement>) -> Result<()> {
        let stmt = stmt.into();
        let result = Self::check_section("epilogue", &stmt);
        self.record(result)?;
        self.epilogue.push(stmt);
        Ok(())
    }
}
