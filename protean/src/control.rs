//! Loops. Every loop consumes `Break` and `Continue` raised by its own
//! body; `Return` and errors pass through untouched.

use std::{cmp::Ordering, rc::Rc};

use crate::{
    EvalResult, ForLoop, ForeachLoop, Interpreter, ListRef, Locals, Node,
    RuntimeError, Unwind, Value, number,
};

/// What a loop does after one pass of its body.
enum Step {
    Proceed,
    Exit(Value),
}

impl Interpreter {
    /// Run `body` once. `last` tracks the most recent completed value.
    fn run_loop_body(
        &mut self,
        body: &Node,
        scope: &Rc<Locals>,
        last: &mut Value,
    ) -> Result<Step, Unwind> {
        match self.eval(body, scope) {
            Ok(value) => {
                *last = value;
                Ok(Step::Proceed)
            }
            Err(Unwind::Continue) => {
                log::trace!("continue");
                Ok(Step::Proceed)
            }
            Err(Unwind::Break(value)) => {
                log::trace!("break");
                Ok(Step::Exit(value.unwrap_or_else(|| last.clone())))
            }
            Err(other) => Err(other),
        }
    }

    pub(crate) fn eval_while(
        &mut self,
        condition: &Node,
        body: &Node,
        scope: &Rc<Locals>,
    ) -> EvalResult {
        let mut last = Value::Nil;
        while self.eval(condition, scope)?.is_truthy() {
            if let Step::Exit(value) = self.run_loop_body(body, scope, &mut last)? {
                return Ok(value);
            }
        }
        Ok(last)
    }

    /// `for(counter, start, end, step?, body)`, bounds inclusive.
    ///
    /// Bounds and step are evaluated once. The direction is fixed up front:
    /// a step pointing the other way, or a zero step, runs nothing.
    pub(crate) fn eval_for(
        &mut self,
        header: &ForLoop,
        scope: &Rc<Locals>,
    ) -> EvalResult {
        let start = self.eval(&header.start, scope)?;
        let end = self.eval(&header.end, scope)?;
        let step = match &header.step {
            Some(step) => self.eval(step, scope)?,
            None => Value::Integer(1),
        };
        for bound in [&start, &end, &step] {
            if !bound.is_number() {
                return Err(RuntimeError::type_error("Number", bound).into());
            }
        }

        let ascending = matches!(
            number::compare(&end, &start)?,
            Some(Ordering::Greater | Ordering::Equal)
        );
        let step_direction = number::compare(&step, &Value::Integer(0))?;
        let runs = match step_direction {
            Some(Ordering::Greater) => ascending,
            Some(Ordering::Less) => !ascending,
            _ => false,
        };
        log::trace!(
            "for `{}`: ascending {ascending}, runs {runs}",
            header.counter
        );

        self.define_variable(scope, &header.counter, start)?;
        let mut last = Value::Nil;
        if !runs {
            return Ok(last);
        }

        loop {
            let counter = self.counter_value(scope, &header.counter);
            let ordering = number::compare(&counter, &end)?;
            let within = if ascending {
                matches!(ordering, Some(Ordering::Less | Ordering::Equal))
            } else {
                matches!(ordering, Some(Ordering::Greater | Ordering::Equal))
            };
            if !within {
                break;
            }

            if let Step::Exit(value) =
                self.run_loop_body(&header.body, scope, &mut last)?
            {
                return Ok(value);
            }

            // continue lands here too
            let counter = self.counter_value(scope, &header.counter);
            let next = number::add(&counter, &step)?;
            self.update_variable(scope, &header.counter, next)?;
        }
        Ok(last)
    }

    fn counter_value(&self, scope: &Locals, name: &str) -> Value {
        self.read_variable(scope, name).unwrap_or(Value::Nil)
    }

    /// `foreach([index,] element, body)` over a Sequence, List or Map.
    pub(crate) fn eval_foreach(
        &mut self,
        header: &ForeachLoop,
        scope: &Rc<Locals>,
    ) -> EvalResult {
        let receiver = self.eval(&header.receiver, scope)?;
        let items = IterationSequence::new(&receiver)?;

        let mut last = Value::Nil;
        for (index, element) in items.enumerate() {
            if let Some(name) = &header.index {
                self.define_variable(scope, name, Value::Integer(index as i64))?;
            }
            self.define_variable(scope, &header.element, element)?;

            if let Step::Exit(value) =
                self.run_loop_body(&header.body, scope, &mut last)?
            {
                return Ok(value);
            }
        }
        Ok(last)
    }
}

/// Elements of an iterable value.
///
/// Lists are read by position on every step, so the body may append to the
/// list it walks. Maps iterate over a snapshot of their entries.
enum IterationSequence {
    Characters { text: Rc<str>, position: usize },
    List { items: ListRef, position: usize },
    Entries(std::vec::IntoIter<(Rc<str>, Value)>),
}

impl IterationSequence {
    fn new(value: &Value) -> Result<Self, RuntimeError> {
        match value {
            Value::String(text) => Ok(Self::Characters {
                text: text.clone(),
                position: 0,
            }),
            Value::List(items) => Ok(Self::List {
                items: items.clone(),
                position: 0,
            }),
            Value::Map(map) => {
                let entries: Vec<_> = map
                    .borrow()
                    .iter()
                    .map(|(key, value)| (key.clone(), value.clone()))
                    .collect();
                Ok(Self::Entries(entries.into_iter()))
            }
            other => Err(RuntimeError::type_error("Sequence, List or Map", other)),
        }
    }
}

impl Iterator for IterationSequence {
    type Item = Value;

    fn next(&mut self) -> Option<Value> {
        match self {
            Self::Characters { text, position } => {
                let ch = text[*position..].chars().next()?;
                *position += ch.len_utf8();
                Some(Value::Integer(ch as i64))
            }
            Self::List { items, position } => {
                let item = items.borrow().get(*position).cloned()?;
                *position += 1;
                Some(item)
            }
            Self::Entries(entries) => {
                let (key, value) = entries.next()?;
                Some(Value::new_list(vec![Value::String(key), value]))
            }
        }
    }
}
