//! The sequence compiler.
//!
//! A sequence is a script of statements interleaved with waits, loops and
//! conditionals. It is compiled into a state machine running inside the
//! analog block:
//!
//! ```text
//! if( guard )
//!     while( runSt_k ) begin
//!         runSt_k = 0;
//!         case( state_k )
//!             0: ...
//!             N: $finish;
//!         endcase
//!     end
//! ```
//!
//! Every state ends by choosing its successor. A state that ends in a wait
//! leaves `runSt_k` cleared and returns control to the simulator; the timer
//! driver or a shared event block sets it again. All other states set
//! `runSt_k = 1`, so the `while` advances through them within the same time
//! step.

use std::collections::BTreeMap;
use std::fmt;
use std::mem;

use log::{debug, trace};

use crate::Result;
use crate::error::BuildError;
use crate::veriloga::func::abstime;
use crate::veriloga::task::finish;
use crate::veriloga::{
    Bool, BoolVar, Case, Event, If, Integer, IntegerVar, Loop, Module, PrologueItem, Real, RealVar,
    Statement, TimerBuilder,
};

/// Index of one state of a sequence's state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StateId(usize);

impl StateId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Allocates states and collects the statements of each sealed state.
#[derive(Debug)]
pub struct StateMachineBuilder {
    arms: BTreeMap<StateId, Vec<Statement>>,
    next: usize,
}

impl StateMachineBuilder {
    /// A builder whose state 0 is allocated and not yet sealed.
    pub fn new() -> Self {
        Self {
            arms: BTreeMap::new(),
            next: 1,
        }
    }

    pub fn entry(&self) -> StateId {
        StateId(0)
    }

    pub fn new_state(&mut self) -> StateId {
        let id = StateId(self.next);
        self.next += 1;
        id
    }

    /// Number of states allocated so far.
    pub fn state_count(&self) -> usize {
        self.next
    }

    /// Fixes the statements of `state`. Each state is sealed exactly once.
    pub fn seal_arm(&mut self, state: StateId, body: Vec<Statement>) -> Result<()> {
        if state.0 >= self.next {
            return Err(BuildError::structural(
                "sequence",
                format!("state {state} was never allocated"),
            ));
        }
        if self.arms.contains_key(&state) {
            return Err(BuildError::structural(
                "sequence",
                format!("state {state} sealed twice"),
            ));
        }
        trace!("Sealed state {state} ({} statements)", body.len());
        self.arms.insert(state, body);
        Ok(())
    }

    /// The `case( state )` statement over every state; all of them must be sealed.
    pub fn build(self, scrutinee: Integer) -> Result<Case> {
        if let Some(missing) = (0..self.next).map(StateId).find(|s| !self.arms.contains_key(s)) {
            return Err(BuildError::structural(
                "sequence",
                format!("state {missing} was allocated but never sealed"),
            ));
        }
        Ok(Case::from_states(
            scrutinee,
            self.arms.into_iter().map(|(state, body)| (state.0, body)),
        ))
    }
}

impl Default for StateMachineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Summary of a compiled sequence.
#[derive(Debug, Clone)]
pub struct CompiledSequence {
    index: usize,
    states: usize,
    finish: StateId,
    state: IntegerVar,
    run: BoolVar,
}

impl CompiledSequence {
    /// One-based index of the sequence within its module.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn state_count(&self) -> usize {
        self.states
    }

    /// The state that executes `$finish`.
    pub fn finish_state(&self) -> StateId {
        self.finish
    }

    pub fn state_var(&self) -> &IntegerVar {
        &self.state
    }

    pub fn run_var(&self) -> &BoolVar {
        &self.run
    }
}

#[derive(Debug, Clone)]
struct SequenceVars {
    time: RealVar,
    state: IntegerVar,
    run: BoolVar,
    event_id: IntegerVar,
}

impl SequenceVars {
    fn goto(&self, target: StateId) -> Statement {
        self.state.assign(Integer::index(target.0))
    }

    /// Tail of a state that continues in the same time step.
    fn jump(&self, target: StateId) -> [Statement; 2] {
        [self.run.assign(true), self.goto(target)]
    }
}

struct Compiler<'m> {
    module: &'m mut Module,
    index: usize,
    vars: SequenceVars,
    machine: StateMachineBuilder,
    current: StateId,
    acc: Vec<Statement>,
}

impl Compiler<'_> {
    /// Seals the current state with the accumulated statements plus `tail`.
    fn seal(&mut self, tail: impl IntoIterator<Item = Statement>) -> Result<()> {
        let mut body = mem::take(&mut self.acc);
        body.extend(tail);
        self.machine.seal_arm(self.current, body)
    }

    fn compile_all(&mut self, items: Vec<Statement>) -> Result<()> {
        items.into_iter().try_for_each(|item| self.compile(item))
    }

    fn compile(&mut self, item: Statement) -> Result<()> {
        match item {
            Statement::List(items) => self.compile_all(items),
            Statement::WaitUs(delay) => self.wait_us(delay),
            Statement::WaitSignal(event) => self.wait_signal(*event),
            Statement::Loop(body) => self.compile_loop(*body),
            Statement::If(stmt) => self.compile_if(*stmt),
            Statement::Mark(mark) => {
                trace!("Mark `{}` in sequence {}", mark.label(), self.index);
                self.acc.push(Statement::Command(mark.toggle));
                Ok(())
            }
            stmt if stmt.contains_case() => Err(BuildError::structural(
                "sequence",
                "case statements cannot be used in a sequence, use if chains instead",
            )),
            Statement::WaitEvent(_) => Err(BuildError::structural(
                "sequence",
                "event blocks cannot be used in a sequence, use a signal wait instead",
            )),
            other => {
                self.acc.push(other);
                Ok(())
            }
        }
    }

    fn wait_us(&mut self, delay: Real) -> Result<()> {
        let seconds = match delay.as_f64() {
            Some(us) => Real::from(1e-6 * us),
            None => 1e-6 * delay,
        };
        let next = self.machine.new_state();
        self.seal([
            self.vars.event_id.assign(0),
            self.vars.goto(next),
            self.vars.time.assign(abstime() + seconds),
        ])?;
        self.current = next;
        Ok(())
    }

    fn wait_signal(&mut self, event: Event) -> Result<()> {
        let id = self.module.register_signal(self.index, &self.vars, event)?;
        let next = self.machine.new_state();
        self.seal([self.vars.event_id.assign(Integer::index(id)), self.vars.goto(next)])?;
        self.current = next;
        Ok(())
    }

    /// Loops compile to a test state, the body states and a tail that jumps
    /// back to the test.
    fn compile_loop(&mut self, stmt: Loop) -> Result<()> {
        let (prepare, cond, step, body) = match stmt {
            Loop::Repeat { count, body } => {
                let counter = self.module.var(0);
                let cond = counter.lt(count);
                (Some(counter.assign(0)), cond, Some(counter.inc()), body)
            }
            Loop::While { cond, body } => (None, cond, None, body),
            Loop::For {
                init,
                cond,
                step,
                body,
            } => (
                Some(Statement::Command(init)),
                cond,
                Some(Statement::Command(step)),
                body,
            ),
        };

        let test = self.machine.new_state();
        self.acc.extend(prepare);
        self.seal(self.vars.jump(test))?;

        let entry = self.machine.new_state();
        self.current = entry;
        self.compile_all(body)?;
        self.acc.extend(step);
        self.seal(self.vars.jump(test))?;

        let exit = self.machine.new_state();
        let branch = If::new(cond, [self.vars.goto(entry)])?.otherwise([self.vars.goto(exit)])?;
        self.machine
            .seal_arm(test, vec![self.vars.run.assign(true), branch.into()])?;
        self.current = exit;
        Ok(())
    }

    /// Both branches get their own states and meet again in a join state.
    fn compile_if(&mut self, stmt: If) -> Result<()> {
        let (cond, then_branch, else_branch) = stmt.parts();
        let head = self.current;
        let head_acc = mem::take(&mut self.acc);

        let then_entry = self.machine.new_state();
        self.current = then_entry;
        self.compile_all(then_branch)?;
        let mut tails = vec![(self.current, mem::take(&mut self.acc))];

        let mut else_entry = None;
        if !else_branch.is_empty() {
            let entry = self.machine.new_state();
            else_entry = Some(entry);
            self.current = entry;
            self.compile_all(else_branch)?;
            tails.push((self.current, mem::take(&mut self.acc)));
        }

        let join = self.machine.new_state();
        for (state, mut body) in tails {
            body.extend(self.vars.jump(join));
            self.machine.seal_arm(state, body)?;
        }

        let otherwise = else_entry.unwrap_or(join);
        let branch =
            If::new(cond, [self.vars.goto(then_entry)])?.otherwise([self.vars.goto(otherwise)])?;
        let mut body = head_acc;
        body.extend([self.vars.run.assign(true), branch.into()]);
        self.machine.seal_arm(head, body)?;
        self.current = join;
        Ok(())
    }

    /// Ends the script with the `$finish` state.
    fn finish(mut self) -> Result<(StateMachineBuilder, SequenceVars, StateId)> {
        let finish_state = if self.acc.is_empty() {
            self.seal([finish()])?;
            self.current
        } else {
            let fin = self.machine.new_state();
            self.seal(self.vars.jump(fin))?;
            self.machine.seal_arm(fin, vec![finish()])?;
            fin
        };
        Ok((self.machine, self.vars, finish_state))
    }
}

impl Module {
    /// Compiles `items` into a state machine that runs while `guard` holds.
    ///
    /// Besides plain statements, `items` may contain [`Statement::wait_us`],
    /// [`Statement::wait_signal`], marker toggles, loops and `if` statements,
    /// nested freely. The sequence starts at time 0 and ends with `$finish`.
    pub fn seq(
        &mut self,
        guard: impl Into<Bool>,
        items: impl IntoIterator<Item = Statement>,
    ) -> Result<CompiledSequence> {
        let result = self.compile_sequence(guard.into(), items.into_iter().collect());
        self.record(result)
    }

    fn compile_sequence(&mut self, guard: Bool, items: Vec<Statement>) -> Result<CompiledSequence> {
        let index = self.sequences + 1;
        let vars = SequenceVars {
            time: self.var_named(&format!("_$evntTime_{index}"), 0.0)?,
            state: self.var_named(&format!("_$state_{index}"), 0)?,
            run: self.var_named(&format!("_$runSt_{index}"), false)?,
            event_id: self.var_named(&format!("_$eventId_{index}"), 0)?,
        };
        self.sequences = index;
        debug!("Compiling sequence {index} of `{}`", self.name);

        let timer = match self.options.timer_tolerance {
            Some(tol) => TimerBuilder::new(&vars.time).period(0.0).time_tol(tol).build()?,
            None => Event::timer(&vars.time),
        };
        let resume = If::new(vars.event_id.eq(0), [vars.run.assign(true)])?;
        let driver = Statement::wait_event(timer, [resume.into()])?;
        self.prologue.push(PrologueItem::Statement(driver));

        let mut compiler = Compiler {
            module: self,
            index,
            vars,
            machine: StateMachineBuilder::new(),
            current: StateId(0),
            acc: Vec::new(),
        };
        compiler.compile_all(items)?;
        let (machine, vars, finish_state) = compiler.finish()?;
        let states = machine.state_count();
        let case = machine.build(vars.state.value())?;

        let running = Statement::while_loop(&vars.run, [vars.run.assign(false), case.into()])?;
        self.add_body(If::new(guard, [running])?)?;
        debug!("Sequence {index} of `{}` has {states} states", self.name);
        Ok(CompiledSequence {
            index,
            states,
            finish: finish_state,
            state: vars.state,
            run: vars.run,
        })
    }

    /// Returns the module-wide id of `event`, installing or extending its
    /// shared `@( event )` block so that it resumes sequence `index`.
    fn register_signal(&mut self, index: usize, vars: &SequenceVars, event: Event) -> Result<usize> {
        let key = event.to_string();
        let mut ordinal = 0;
        for item in &mut self.prologue {
            let PrologueItem::SharedEvent {
                key: existing,
                sequences,
                clauses,
                ..
            } = item
            else {
                continue;
            };
            ordinal += 1;
            if *existing != key {
                continue;
            }
            if !sequences.contains(&index) {
                let clause = If::new(
                    vars.event_id.eq(Integer::index(ordinal)),
                    [vars.run.assign(true)],
                )?;
                clauses.push(clause.into());
                sequences.push(index);
                trace!("Sequence {index} joined signal {ordinal} `{key}`");
            }
            return Ok(ordinal);
        }

        let id = ordinal + 1;
        let clause = If::new(vars.event_id.eq(Integer::index(id)), [vars.run.assign(true)])?;
        trace!("Sequence {index} registered signal {id} `{key}`");
        self.prologue.push(PrologueItem::SharedEvent {
            event,
            key,
            sequences: vec![index],
            clauses: vec![clause.into()],
        });
        Ok(id)
    }
}
