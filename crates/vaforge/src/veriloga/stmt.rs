//! Statement tree and its indented rendering.
//!
//! Blocks follow one rule everywhere: no children renders `header;`, one child
//! renders the header alone on its line with the child indented below it, and
//! two or more children are wrapped in `begin` / `end`.
//!
//! The sequencer-only statements ([`Statement::WaitUs`], [`Statement::WaitSignal`]
//! and [`Statement::Mark`]) may appear inside `if` and loop statements, which the
//! sequencer compiles into states. Everything else rejects them.

use crate::error::{BuildError, Result};

use super::event::Event;
use super::value::{Bool, Expr, Integer, Real, Value};

const INDENT: &str = "    ";

fn indent(depth: usize) -> String {
    INDENT.repeat(depth)
}

/// A single line of Verilog-A, rendered with a trailing `;`.
#[derive(Debug, Clone)]
pub struct Command {
    text: String,
    rtoi: bool,
}

impl Command {
    pub fn text(&self) -> &str {
        &self.text
    }
}

#[derive(Debug, Clone)]
pub struct Block {
    header: String,
    rtoi: bool,
    children: Vec<Statement>,
}

#[derive(Debug, Clone)]
pub struct WaitEvent {
    event: Event,
    children: Vec<Statement>,
}

#[derive(Debug, Clone)]
pub struct If {
    cond: Bool,
    then_branch: Vec<Statement>,
    else_branch: Vec<Statement>,
}

#[derive(Debug, Clone)]
pub enum CaseLabel {
    Value(Value),
    Default,
}

#[derive(Debug, Clone)]
pub struct CaseArm {
    label: CaseLabel,
    body: Vec<Statement>,
}

#[derive(Debug, Clone)]
pub struct Case {
    scrutinee: Value,
    arms: Vec<CaseArm>,
}

#[derive(Debug, Clone)]
pub enum Loop {
    Repeat {
        count: Integer,
        body: Vec<Statement>,
    },
    While {
        cond: Bool,
        body: Vec<Statement>,
    },
    For {
        init: Command,
        cond: Bool,
        step: Command,
        body: Vec<Statement>,
    },
}

/// Toggle of a marker variable, recorded with a label.
#[derive(Debug, Clone)]
pub struct Mark {
    pub(crate) toggle: Command,
    pub(crate) label: String,
}

impl Mark {
    pub fn label(&self) -> &str {
        &self.label
    }
}

#[derive(Debug, Clone)]
pub enum Statement {
    Command(Command),
    /// Flat sequence of statements, spliced into whatever contains it.
    List(Vec<Statement>),
    Block(Block),
    WaitEvent(Box<WaitEvent>),
    If(Box<If>),
    Case(Case),
    Loop(Box<Loop>),
    /// Sequencer delay in microseconds.
    WaitUs(Real),
    /// Sequencer wait on an analog event.
    WaitSignal(Box<Event>),
    Mark(Mark),
}

/// Splices nested lists into one flat vector.
fn flatten(items: impl IntoIterator<Item = Statement>) -> Vec<Statement> {
    let mut out = Vec::new();
    for item in items {
        match item {
            Statement::List(inner) => out.extend(flatten(inner)),
            other => out.push(other),
        }
    }
    out
}

/// Rejects nested event blocks; when `allow_sequencer` is false, also rejects
/// sequencer-only statements.
fn check_children(
    context: &'static str,
    children: &[Statement],
    allow_sequencer: bool,
) -> Result<()> {
    for child in children {
        if child.contains_wait_event() {
            return Err(BuildError::structural(
                context,
                "event blocks `@( ... )` cannot be nested inside other statements",
            ));
        }
        if !allow_sequencer && child.contains_sequencer_only() {
            return Err(BuildError::structural(
                context,
                "wait and mark statements are only allowed in sequences, if and loops",
            ));
        }
    }
    Ok(())
}

impl Statement {
    /// Trusted Verilog-A text, rendered as `text;`.
    pub fn raw(text: impl Into<String>) -> Statement {
        Statement::Command(Command {
            text: text.into(),
            rtoi: false,
        })
    }

    pub(crate) fn command_with_rtoi(text: impl Into<String>, rtoi: bool) -> Statement {
        Statement::Command(Command {
            text: text.into(),
            rtoi,
        })
    }

    pub(crate) fn assignment(target: &str, rhs: &Expr) -> Statement {
        Statement::command_with_rtoi(format!("{target} = {}", rhs.text), rhs.rtoi)
    }

    pub fn list(items: impl IntoIterator<Item = Statement>) -> Statement {
        Statement::List(flatten(items))
    }

    /// A generic block statement `header [begin ... end]`.
    pub fn block(
        header: impl Into<String>,
        children: impl IntoIterator<Item = Statement>,
    ) -> Result<Statement> {
        let children = flatten(children);
        check_children("block", &children, false)?;
        Ok(Statement::Block(Block {
            header: header.into(),
            rtoi: false,
            children,
        }))
    }

    /// `@( event ) ...`; only valid at the top level of a module section.
    pub fn wait_event(
        event: Event,
        children: impl IntoIterator<Item = Statement>,
    ) -> Result<Statement> {
        let children = flatten(children);
        check_children("event block", &children, false)?;
        Ok(Statement::WaitEvent(Box::new(WaitEvent { event, children })))
    }

    pub fn repeat(
        count: impl Into<Integer>,
        body: impl IntoIterator<Item = Statement>,
    ) -> Result<Statement> {
        let body = flatten(body);
        check_children("repeat", &body, true)?;
        Ok(Statement::Loop(Box::new(Loop::Repeat {
            count: count.into(),
            body,
        })))
    }

    pub fn while_loop(
        cond: impl Into<Bool>,
        body: impl IntoIterator<Item = Statement>,
    ) -> Result<Statement> {
        let body = flatten(body);
        check_children("while", &body, true)?;
        Ok(Statement::Loop(Box::new(Loop::While {
            cond: cond.into(),
            body,
        })))
    }

    /// `for( init; cond; step )`; `init` and `step` must be single commands.
    pub fn for_loop(
        init: Statement,
        cond: impl Into<Bool>,
        step: Statement,
        body: impl IntoIterator<Item = Statement>,
    ) -> Result<Statement> {
        let (Statement::Command(init), Statement::Command(step)) = (init, step) else {
            return Err(BuildError::structural(
                "for",
                "initialiser and step must be single assignments",
            ));
        };
        let body = flatten(body);
        check_children("for", &body, true)?;
        Ok(Statement::Loop(Box::new(Loop::For {
            init,
            cond: cond.into(),
            step,
            body,
        })))
    }

    /// Sequencer delay of `delay` microseconds.
    pub fn wait_us(delay: impl Into<Real>) -> Statement {
        Statement::WaitUs(delay.into())
    }

    /// Sequencer wait until `event` fires.
    pub fn wait_signal(event: Event) -> Statement {
        Statement::WaitSignal(Box::new(event))
    }

    /// Toggle of the marker variable `var`, tagged with `label`.
    pub(crate) fn mark(var: &str, label: impl Into<String>) -> Statement {
        Statement::Mark(Mark {
            toggle: Command {
                text: format!("{var} = !{var}"),
                rtoi: false,
            },
            label: label.into(),
        })
    }

    /// True for an empty list.
    pub fn is_empty(&self) -> bool {
        matches!(self, Statement::List(items) if items.iter().all(Statement::is_empty))
    }

    pub fn uses_rtoi(&self) -> bool {
        fn any(items: &[Statement]) -> bool {
            items.iter().any(Statement::uses_rtoi)
        }
        match self {
            Statement::Command(c) => c.rtoi,
            Statement::List(items) => any(items),
            Statement::Block(b) => b.rtoi || any(&b.children),
            Statement::WaitEvent(w) => w.event.uses_rtoi() || any(&w.children),
            Statement::If(i) => {
                i.cond.uses_rtoi() || any(&i.then_branch) || any(&i.else_branch)
            }
            Statement::Case(c) => {
                c.scrutinee.uses_rtoi()
                    || c.arms.iter().any(|arm| {
                        matches!(&arm.label, CaseLabel::Value(v) if v.uses_rtoi())
                            || any(&arm.body)
                    })
            }
            Statement::Loop(l) => match l.as_ref() {
                Loop::Repeat { count, body } => count.uses_rtoi() || any(body),
                Loop::While { cond, body } => cond.uses_rtoi() || any(body),
                Loop::For {
                    init,
                    cond,
                    step,
                    body,
                } => init.rtoi || cond.uses_rtoi() || step.rtoi || any(body),
            },
            Statement::WaitUs(delay) => delay.uses_rtoi(),
            Statement::WaitSignal(event) => event.uses_rtoi(),
            Statement::Mark(_) => false,
        }
    }

    pub(crate) fn contains_wait_event(&self) -> bool {
        match self {
            Statement::WaitEvent(_) => true,
            _ => self.children().any(Statement::contains_wait_event),
        }
    }

    pub(crate) fn contains_sequencer_only(&self) -> bool {
        match self {
            Statement::WaitUs(_) | Statement::WaitSignal(_) | Statement::Mark(_) => true,
            _ => self.children().any(Statement::contains_sequencer_only),
        }
    }

    pub(crate) fn contains_case(&self) -> bool {
        match self {
            Statement::Case(_) => true,
            _ => self.children().any(Statement::contains_case),
        }
    }

    fn children(&self) -> Box<dyn Iterator<Item = &Statement> + '_> {
        match self {
            Statement::List(items) => Box::new(items.iter()),
            Statement::Block(b) => Box::new(b.children.iter()),
            Statement::WaitEvent(w) => Box::new(w.children.iter()),
            Statement::If(i) => Box::new(i.then_branch.iter().chain(i.else_branch.iter())),
            Statement::Case(c) => Box::new(c.arms.iter().flat_map(|arm| arm.body.iter())),
            Statement::Loop(l) => match l.as_ref() {
                Loop::Repeat { body, .. } | Loop::While { body, .. } | Loop::For { body, .. } => {
                    Box::new(body.iter())
                }
            },
            _ => Box::new(std::iter::empty()),
        }
    }

    /// Renders the statement at `depth` levels of indentation.
    pub fn render(&self, depth: usize) -> String {
        let mut out = String::new();
        self.render_into(depth, &mut out);
        out
    }

    pub(crate) fn render_into(&self, depth: usize, out: &mut String) {
        let pad = indent(depth);
        match self {
            Statement::Command(c) => out.push_str(&format!("{pad}{};\n", c.text)),
            Statement::List(items) => {
                for item in items {
                    item.render_into(depth, out);
                }
            }
            Statement::Block(b) => render_block(&b.header, &b.children, depth, false, out),
            Statement::WaitEvent(w) => {
                render_block(&format!("@( {} )", w.event), &w.children, depth, false, out)
            }
            Statement::If(i) => i.render_into(depth, out),
            Statement::Case(c) => c.render_into(depth, out),
            Statement::Loop(l) => l.render_into(depth, out),
            Statement::WaitUs(delay) => out.push_str(&format!("{pad}// wait {delay} us\n")),
            Statement::WaitSignal(event) => out.push_str(&format!("{pad}// wait for {event}\n")),
            Statement::Mark(m) => out.push_str(&format!("{pad}{};\n", m.toggle.text)),
        }
    }
}

/// Renders `header` with `children` following the block rules. `force_begin`
/// wraps even a single child in `begin` / `end`.
pub(crate) fn render_block(
    header: &str,
    children: &[Statement],
    depth: usize,
    force_begin: bool,
    out: &mut String,
) {
    let pad = indent(depth);
    let children: Vec<&Statement> = children.iter().filter(|c| !c.is_empty()).collect();
    match children.as_slice() {
        [] => out.push_str(&format!("{pad}{header};\n")),
        [child] if !force_begin => {
            out.push_str(&format!("{pad}{header}\n"));
            child.render_into(depth + 1, out);
        }
        _ => {
            out.push_str(&format!("{pad}{header} begin\n"));
            for child in children {
                child.render_into(depth + 1, out);
            }
            out.push_str(&format!("{pad}end\n"));
        }
    }
}

impl If {
    pub fn new(cond: impl Into<Bool>, then: impl IntoIterator<Item = Statement>) -> Result<If> {
        let then_branch = flatten(then);
        check_children("if", &then_branch, true)?;
        Ok(If {
            cond: cond.into(),
            then_branch,
            else_branch: Vec::new(),
        })
    }

    /// Attaches the `else` branch.
    pub fn otherwise(mut self, body: impl IntoIterator<Item = Statement>) -> Result<If> {
        let else_branch = flatten(body);
        check_children("else", &else_branch, true)?;
        self.else_branch = else_branch;
        Ok(self)
    }

    pub(crate) fn parts(self) -> (Bool, Vec<Statement>, Vec<Statement>) {
        (self.cond, self.then_branch, self.else_branch)
    }

    fn render_into(&self, depth: usize, out: &mut String) {
        let has_else = self.else_branch.iter().any(|s| !s.is_empty());
        // A lone nested statement in the then branch could capture our `else`.
        let force_begin = has_else
            && matches!(
                self.then_branch.as_slice(),
                [only] if !matches!(only, Statement::Command(_) | Statement::Mark(_))
            );
        render_block(
            &format!("if( {} )", self.cond),
            &self.then_branch,
            depth,
            force_begin,
            out,
        );
        if has_else {
            render_block("else", &self.else_branch, depth, false, out);
        }
    }
}

impl From<If> for Statement {
    fn from(stmt: If) -> Self {
        Statement::If(Box::new(stmt))
    }
}

impl Case {
    pub fn new(scrutinee: impl Into<Value>) -> Case {
        Case {
            scrutinee: scrutinee.into(),
            arms: Vec::new(),
        }
    }

    /// Adds an arm; the label must have the scrutinee's kind.
    pub fn arm(
        mut self,
        label: impl Into<Value>,
        body: impl IntoIterator<Item = Statement>,
    ) -> Result<Case> {
        let label = label.into();
        if label.kind() != self.scrutinee.kind() {
            return Err(BuildError::mismatch(
                "case label",
                self.scrutinee.kind(),
                label.kind(),
            ));
        }
        let body = flatten(body);
        check_children("case", &body, false)?;
        self.arms.push(CaseArm {
            label: CaseLabel::Value(label),
            body,
        });
        Ok(self)
    }

    pub fn default_arm(mut self, body: impl IntoIterator<Item = Statement>) -> Result<Case> {
        if self
            .arms
            .iter()
            .any(|arm| matches!(arm.label, CaseLabel::Default))
        {
            return Err(BuildError::structural("case", "duplicate default arm"));
        }
        let body = flatten(body);
        check_children("case", &body, false)?;
        self.arms.push(CaseArm {
            label: CaseLabel::Default,
            body,
        });
        Ok(self)
    }

    /// Integer-labelled case whose arms were already validated.
    pub(crate) fn from_states(
        scrutinee: Integer,
        arms: impl IntoIterator<Item = (usize, Vec<Statement>)>,
    ) -> Case {
        Case {
            scrutinee: Value::Integer(scrutinee),
            arms: arms
                .into_iter()
                .map(|(state, body)| CaseArm {
                    label: CaseLabel::Value(Value::Integer(Integer::index(state))),
                    body: flatten(body),
                })
                .collect(),
        }
    }

    fn render_into(&self, depth: usize, out: &mut String) {
        let pad = indent(depth);
        out.push_str(&format!("{pad}case( {} )\n", self.scrutinee));
        for arm in &self.arms {
            let label = match &arm.label {
                CaseLabel::Value(v) => format!("{v}:"),
                CaseLabel::Default => "default:".to_string(),
            };
            render_block(&label, &arm.body, depth + 1, false, out);
        }
        out.push_str(&format!("{pad}endcase\n"));
    }
}

impl From<Case> for Statement {
    fn from(stmt: Case) -> Self {
        Statement::Case(stmt)
    }
}

impl Loop {
    fn render_into(&self, depth: usize, out: &mut String) {
        let (header, body) = match self {
            Loop::Repeat { count, body } => (format!("repeat( {count} )"), body),
            Loop::While { cond, body } => (format!("while( {cond} )"), body),
            Loop::For {
                init,
                cond,
                step,
                body,
            } => (
                format!("for( {}; {cond}; {} )", init.text, step.text),
                body,
            ),
        };
        render_block(&header, body, depth, false, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cmd(text: &str) -> Statement {
        Statement::raw(text)
    }

    #[test]
    fn test_block_rules() {
        let empty = Statement::block("if( x )", []).unwrap();
        assert_eq!(empty.render(0), "if( x );\n");

        let single = Statement::block("if( x )", [cmd("a = 1")]).unwrap();
        assert_eq!(single.render(1), "    if( x )\n        a = 1;\n");

        let multi = Statement::block("if( x )", [cmd("a = 1"), cmd("b = 2")]).unwrap();
        assert_eq!(
            multi.render(0),
            "if( x ) begin\n    a = 1;\n    b = 2;\nend\n"
        );
    }

    #[test]
    fn test_lists_are_spliced() {
        let nested = Statement::list([cmd("a"), Statement::list([cmd("b"), cmd("c")])]);
        let block = Statement::block("h", [nested]).unwrap();
        assert_eq!(block.render(0), "h begin\n    a;\n    b;\n    c;\nend\n");
        assert!(Statement::list([Statement::list([])]).is_empty());
    }

    #[test]
    fn test_if_else() {
        let stmt: Statement = If::new(Bool::raw("c"), [cmd("a")])
            .unwrap()
            .otherwise([cmd("b"), cmd("d")])
            .unwrap()
            .into();
        assert_eq!(
            stmt.render(0),
            "if( c )\n    a;\nelse begin\n    b;\n    d;\nend\n"
        );
    }

    #[test]
    fn test_nested_if_gets_begin_end_before_else() {
        let inner: Statement = If::new(Bool::raw("x"), [cmd("a")]).unwrap().into();
        let outer: Statement = If::new(Bool::raw("y"), [inner])
            .unwrap()
            .otherwise([cmd("b")])
            .unwrap()
            .into();
        assert_eq!(
            outer.render(0),
            "if( y ) begin\n    if( x )\n        a;\nend\nelse\n    b;\n"
        );
    }

    #[test]
    fn test_case_rendering() {
        let stmt: Statement = Case::new(Integer::raw("s"))
            .arm(0, [cmd("a")])
            .unwrap()
            .arm(1, [cmd("b"), cmd("c")])
            .unwrap()
            .default_arm([])
            .unwrap()
            .into();
        assert_eq!(
            stmt.render(0),
            "case( s )\n    0:\n        a;\n    1: begin\n        b;\n        c;\n    end\n    default:;\nendcase\n"
        );
    }

    #[test]
    fn test_case_label_kind_checked() {
        let err = Case::new(Integer::raw("s")).arm(1.0, []).unwrap_err();
        assert!(matches!(err, BuildError::TypeMismatch { .. }));
        let err = Case::new(Integer::raw("s"))
            .default_arm([])
            .unwrap()
            .default_arm([])
            .unwrap_err();
        assert!(matches!(err, BuildError::StructuralViolation { .. }));
    }

    #[test]
    fn test_loops() {
        let rep = Statement::repeat(3, [cmd("a")]).unwrap();
        assert_eq!(rep.render(0), "repeat( 3 )\n    a;\n");
        let wh = Statement::while_loop(Bool::raw("go"), [cmd("a"), cmd("b")]).unwrap();
        assert_eq!(wh.render(0), "while( go ) begin\n    a;\n    b;\nend\n");
        let fr = Statement::for_loop(cmd("i = 0"), Bool::raw("( i )<( 4 )"), cmd("i = i + 1"), [
            cmd("a"),
        ])
        .unwrap();
        assert_eq!(fr.render(0), "for( i = 0; ( i )<( 4 ); i = i + 1 )\n    a;\n");
    }

    #[test]
    fn test_for_requires_commands() {
        let err = Statement::for_loop(Statement::list([]), Bool::from(true), cmd("i = 1"), [])
            .unwrap_err();
        assert!(matches!(err, BuildError::StructuralViolation { context: "for", .. }));
    }

    #[test]
    fn test_nested_wait_event_rejected() {
        let inner = Statement::wait_event(Event::timer(1.0), [cmd("a")]).unwrap();
        let err = If::new(Bool::raw("c"), [inner]).unwrap_err();
        assert!(matches!(err, BuildError::StructuralViolation { .. }));
    }

    #[test]
    fn test_sequencer_statements_placement() {
        assert!(If::new(Bool::raw("c"), [Statement::wait_us(1.0)]).is_ok());
        assert!(Statement::repeat(2, [Statement::wait_us(1.0)]).is_ok());
        assert!(Statement::block("h", [Statement::wait_us(1.0)]).is_err());
        assert!(
            Case::new(Integer::raw("s"))
                .arm(0, [Statement::wait_signal(Event::timer(1.0))])
                .is_err()
        );
        assert!(Statement::wait_event(Event::timer(1.0), [Statement::wait_us(1.0)]).is_err());
    }

    #[test]
    fn test_rtoi_detection() {
        let n = Integer::from_real(Real::raw("x"));
        let stmt = Statement::repeat(n, [cmd("a")]).unwrap();
        assert!(stmt.uses_rtoi());
        assert!(!cmd("a").uses_rtoi());
    }
}
