use std::rc::Rc;

use smallvec::SmallVec;

use crate::{
    AssignKind, Block, Code, ErrorReport, EvalResult, Frame, FrameKind,
    Function, FunctionBody, Invokable, Locals, LookupResult, Message, Method,
    Node, ObjectRef, PrimitiveContext, RuntimeError, Unwind, UpdateResult,
    VM, VMCreateInfo, Value, create_call, create_locals, format, lookup_slot,
    lookup_value, update_slot,
};

/// Evaluated arguments, receiver or call context first.
pub type ArgumentVector = SmallVec<[Value; 4]>;

pub struct Interpreter {
    pub vm: VM,
    module: Rc<Locals>,
    depth: usize,
}

impl Interpreter {
    pub fn new(info: VMCreateInfo) -> Self {
        let vm = VM::new(info);
        let module =
            create_locals(Value::Object(vm.lobby.clone()), Frame::module());
        Self {
            vm,
            module,
            depth: 0,
        }
    }

    /// Top-level scope: `self` is the lobby.
    pub fn module_locals(&self) -> Rc<Locals> {
        self.module.clone()
    }

    /// Evaluate a whole program at module scope.
    pub fn run(&mut self, node: &Node) -> Result<Value, ErrorReport> {
        let scope = self.module.clone();
        let result = self.eval(node, &scope);
        finish(result)
    }

    /// Send `name` to `receiver` with already evaluated arguments.
    pub fn perform(
        &mut self,
        receiver: Value,
        name: &str,
        arguments: Vec<Value>,
    ) -> Result<Value, ErrorReport> {
        let message = Rc::new(Message::new(name, Vec::new()));
        let scope = self.module.clone();

        let result = match lookup_value(&self.vm.specials, &receiver, name) {
            LookupResult::None => {
                Err(RuntimeError::undefined(&message.name, None).into())
            }
            LookupResult::Found { holder, value } => match value.as_invokable()
            {
                None => Ok(value),
                Some(invokable) => self.invoke(
                    &scope,
                    &invokable,
                    receiver,
                    Value::Object(holder),
                    &message,
                    arguments.into_iter().collect(),
                ),
            },
        };
        finish(result)
    }

    pub fn display(&self, value: &Value) -> String {
        format::display_value(value, self.vm.number_format)
    }

    pub fn eval(&mut self, node: &Node, scope: &Rc<Locals>) -> EvalResult {
        match node {
            Node::Nil => Ok(Value::Nil),
            Node::True => Ok(Value::True),
            Node::False => Ok(Value::False),
            Node::Integer(i) => Ok(Value::Integer(*i)),
            Node::Float(f) => Ok(Value::Float(*f)),
            Node::String(text) => Ok(Value::String(text.clone())),
            Node::SelfRef => Ok(scope.self_value.clone()),
            Node::ThisCall => Ok(match scope.frame.context() {
                Value::Call(call) => Value::Call(call.clone()),
                _ => Value::Nil,
            }),
            Node::ThisLocals => Ok(Value::Locals(scope.clone())),
            Node::Send {
                receiver: Some(receiver),
                message,
            } => {
                let target = self.eval(receiver, scope)?;
                self.send(scope, target, message)
            }
            Node::Send {
                receiver: None,
                message,
            } => self.send_implicit(scope, message),
            Node::Assign {
                receiver,
                name,
                value,
                kind,
            } => self.eval_assign(scope, receiver.as_deref(), name, value, *kind),
            Node::Sequence(nodes) => {
                let mut last = Value::Nil;
                for node in nodes {
                    last = self.eval(node, scope)?;
                }
                Ok(last)
            }
            Node::BlockLiteral(code) => Ok(Value::Block(Rc::new(Block::new(
                code.clone(),
                scope.clone(),
            )))),
            Node::MethodLiteral(code) => {
                let outer = match scope.frame.kind() {
                    FrameKind::Module => None,
                    FrameKind::Activation => Some(scope.frame.clone()),
                };
                Ok(Value::Method(Rc::new(Method::new(code.clone(), outer))))
            }
            Node::FunctionLiteral(code) => Ok(Value::Function(Rc::new(
                Function::from_code("anonymous", code.clone()),
            ))),
            Node::If {
                condition,
                then,
                otherwise,
            } => {
                if self.eval(condition, scope)?.is_truthy() {
                    self.eval(then, scope)
                } else if let Some(otherwise) = otherwise {
                    self.eval(otherwise, scope)
                } else {
                    Ok(Value::Nil)
                }
            }
            Node::While { condition, body } => {
                self.eval_while(condition, body, scope)
            }
            Node::For(header) => self.eval_for(header, scope),
            Node::Foreach(header) => self.eval_foreach(header, scope),
            Node::Break(value) => {
                let value = match value {
                    Some(node) => Some(self.eval(node, scope)?),
                    None => None,
                };
                Err(Unwind::Break(value))
            }
            Node::Continue => Err(Unwind::Continue),
            Node::Return(value) => {
                let value = match value {
                    Some(node) => self.eval(node, scope)?,
                    None => Value::Nil,
                };
                Err(Unwind::Return(value))
            }
            Node::Try {
                body,
                error_name,
                handler,
            } => self.eval_try(body, error_name, handler, scope),
        }
    }

    /// Resolve `message` on `receiver` and activate what was found.
    pub fn send(
        &mut self,
        scope: &Rc<Locals>,
        receiver: Value,
        message: &Rc<Message>,
    ) -> EvalResult {
        log::trace!(
            target: "protean::send",
            "{} {}",
            receiver.type_name(),
            message.name
        );

        let start = self.vm.effective_prototype(&receiver);
        match lookup_slot(&start, &message.name) {
            LookupResult::None => {
                log::debug!("`{}` not understood", message.name);
                Err(RuntimeError::undefined(&message.name, message.location)
                    .into())
            }
            LookupResult::Found { holder, value } => self.activate(
                scope,
                receiver,
                value,
                Value::Object(holder),
                message,
            ),
        }
    }

    fn send_implicit(
        &mut self,
        scope: &Rc<Locals>,
        message: &Rc<Message>,
    ) -> EvalResult {
        if let Some(value) = scope.frame.lookup(&message.name) {
            return self.activate(
                scope,
                scope.self_value.clone(),
                value,
                Value::Locals(scope.clone()),
                message,
            );
        }
        self.send(scope, scope.self_value.clone(), message)
    }

    /// Classify a resolved slot value. Plain data is the result as is;
    /// invokables get their arguments evaluated and run.
    pub fn activate(
        &mut self,
        scope: &Rc<Locals>,
        receiver: Value,
        value: Value,
        slot_context: Value,
        message: &Rc<Message>,
    ) -> EvalResult {
        let Some(invokable) = value.as_invokable() else {
            return Ok(value);
        };
        let arguments = self.marshal_arguments(scope, &invokable, message)?;
        self.invoke(scope, &invokable, receiver, slot_context, message, arguments)
    }

    /// Evaluate argument expressions left to right in the caller's scope.
    fn marshal_arguments(
        &mut self,
        scope: &Rc<Locals>,
        invokable: &Invokable,
        message: &Message,
    ) -> Result<ArgumentVector, Unwind> {
        check_argument_count(invokable, &message.name, message.argument_count())?;

        let mut arguments = ArgumentVector::with_capacity(message.argument_count());
        for expression in &message.arguments {
            arguments.push(self.eval(expression, scope)?);
        }
        Ok(arguments)
    }

    /// Run `invokable` with evaluated arguments (receiver not included).
    pub fn invoke(
        &mut self,
        scope: &Rc<Locals>,
        invokable: &Invokable,
        receiver: Value,
        slot_context: Value,
        message: &Rc<Message>,
        arguments: ArgumentVector,
    ) -> EvalResult {
        check_argument_count(invokable, &message.name, arguments.len())?;
        if self.depth >= self.vm.max_depth {
            return Err(RuntimeError::StackOverflow {
                limit: self.vm.max_depth,
            }
            .into());
        }

        log::trace!(
            target: "protean::activate",
            "{} `{}` depth {}",
            invokable.kind_name(),
            message.name,
            self.depth
        );

        let receiver_type = receiver.type_name();
        self.depth += 1;
        let result = match invokable {
            Invokable::Function(function) => {
                self.invoke_function(scope, function, receiver, message, arguments)
            }
            Invokable::Block(block) => {
                self.invoke_block(block, receiver, slot_context, message, arguments)
            }
            Invokable::Method(method) => self.invoke_method(
                scope,
                method,
                receiver,
                slot_context,
                message,
                arguments,
            ),
        };
        self.depth -= 1;

        result.map_err(|unwind| match unwind {
            Unwind::Error(mut report) => {
                report.push_frame(describe_frame(receiver_type, message));
                Unwind::Error(report)
            }
            other => other,
        })
    }

    fn invoke_function(
        &mut self,
        scope: &Rc<Locals>,
        function: &Rc<Function>,
        receiver: Value,
        message: &Rc<Message>,
        arguments: ArgumentVector,
    ) -> EvalResult {
        let vector = argument_vector(
            receiver.clone(),
            function.arity,
            function.variadic,
            arguments,
        );

        match &function.body {
            FunctionBody::Primitive(ptr) => {
                let mut ctx = PrimitiveContext {
                    interpreter: self,
                    scope,
                    arguments: &vector,
                    message,
                };
                ptr(&mut ctx)
            }
            FunctionBody::Code(code) => {
                // The receiver is only argument 0; self stays the module's.
                let frame = Frame::activation(vector[0].clone(), None);
                let locals = create_locals(self.module.self_value.clone(), frame);
                self.run_body(code, locals, &vector)
            }
        }
    }

    fn invoke_block(
        &mut self,
        block: &Rc<Block>,
        receiver: Value,
        slot_context: Value,
        message: &Rc<Message>,
        arguments: ArgumentVector,
    ) -> EvalResult {
        // Anchored to the defining scope, never to the receiver.
        let context = if block.code.uses_call_context {
            Value::Call(create_call(
                block.sender.clone(),
                Value::Locals(block.sender.clone()),
                message.clone(),
                slot_context,
                Invokable::Block(block.clone()),
                self.vm.coroutine.clone(),
            ))
        } else {
            receiver
        };

        let vector =
            argument_vector(context, block.code.arity(), false, arguments);
        let frame =
            Frame::activation(vector[0].clone(), Some(block.sender.frame.clone()));
        let locals = create_locals(block.sender.self_value.clone(), frame);
        self.run_body(&block.code, locals, &vector)
    }

    fn invoke_method(
        &mut self,
        scope: &Rc<Locals>,
        method: &Rc<Method>,
        receiver: Value,
        slot_context: Value,
        message: &Rc<Message>,
        arguments: ArgumentVector,
    ) -> EvalResult {
        let sender = create_locals(receiver.clone(), scope.frame.clone());
        let context = if method.code.uses_call_context {
            Value::Call(create_call(
                sender,
                receiver.clone(),
                message.clone(),
                slot_context,
                Invokable::Method(method.clone()),
                self.vm.coroutine.clone(),
            ))
        } else {
            receiver.clone()
        };

        let vector =
            argument_vector(context, method.code.arity(), false, arguments);
        let frame =
            Frame::activation(vector[0].clone(), method.outer_context.clone());
        let locals = create_locals(receiver, frame);
        self.run_body(&method.code, locals, &vector)
    }

    /// Bind parameters and evaluate a body up to its activation boundary.
    fn run_body(
        &mut self,
        code: &Code,
        locals: Rc<Locals>,
        vector: &[Value],
    ) -> EvalResult {
        for (parameter, value) in code.parameters.iter().zip(&vector[1..]) {
            locals.frame.define(parameter.clone(), value.clone());
        }

        match self.eval(&code.body, &locals) {
            Err(Unwind::Return(value)) => Ok(value),
            Err(signal @ (Unwind::Break(_) | Unwind::Continue)) => {
                Err(RuntimeError::LoopSignalOutsideLoop {
                    signal: signal.signal_name(),
                }
                .into())
            }
            other => other,
        }
    }

    fn eval_assign(
        &mut self,
        scope: &Rc<Locals>,
        receiver: Option<&Node>,
        name: &Rc<str>,
        value: &Node,
        kind: AssignKind,
    ) -> EvalResult {
        let Some(target) = receiver else {
            let value = self.eval(value, scope)?;
            match kind {
                AssignKind::Define => {
                    self.define_variable(scope, name, value.clone())?
                }
                AssignKind::Update => {
                    self.update_variable(scope, name, value.clone())?
                }
            }
            return Ok(value);
        };

        let target = self.eval(target, scope)?;
        let value = self.eval(value, scope)?;
        match (kind, &target) {
            (AssignKind::Define, Value::Object(object)) => {
                object.put(name.clone(), value.clone());
            }
            (AssignKind::Define, Value::Locals(locals)) => {
                self.define_variable(locals, name, value.clone())?;
            }
            (AssignKind::Define, other) => {
                return Err(RuntimeError::type_error("Object", other).into());
            }
            (AssignKind::Update, Value::Locals(locals)) => {
                self.update_variable(locals, name, value.clone())?;
            }
            (AssignKind::Update, _) => {
                let result =
                    update_slot(&self.vm.specials, &target, name, value.clone());
                if let UpdateResult::NotFound = result {
                    return Err(RuntimeError::undefined(name, None).into());
                }
            }
        }
        Ok(value)
    }

    /// `name := value` in `scope`: a frame variable, or a slot on self at
    /// module scope.
    pub(crate) fn define_variable(
        &self,
        scope: &Locals,
        name: &Rc<str>,
        value: Value,
    ) -> Result<(), RuntimeError> {
        if !scope.is_module() {
            scope.frame.define(name.clone(), value);
            return Ok(());
        }
        match &scope.self_value {
            Value::Object(object) => {
                object.put(name.clone(), value);
                Ok(())
            }
            other => Err(RuntimeError::type_error("Object", other)),
        }
    }

    /// `name = value` in `scope`: frames first, then the chain of self.
    pub(crate) fn update_variable(
        &self,
        scope: &Locals,
        name: &Rc<str>,
        value: Value,
    ) -> Result<(), RuntimeError> {
        if scope.frame.update(name, value.clone()) {
            return Ok(());
        }
        match update_slot(&self.vm.specials, &scope.self_value, name, value) {
            UpdateResult::Updated(_) => Ok(()),
            UpdateResult::NotFound => Err(RuntimeError::undefined(name, None)),
        }
    }

    /// Read without activating: frames first, then the chain of self.
    pub(crate) fn read_variable(&self, scope: &Locals, name: &str) -> Option<Value> {
        scope.frame.lookup(name).or_else(|| {
            lookup_value(&self.vm.specials, &scope.self_value, name).value()
        })
    }

    fn eval_try(
        &mut self,
        body: &Node,
        error_name: &Rc<str>,
        handler: &Node,
        scope: &Rc<Locals>,
    ) -> EvalResult {
        match self.eval(body, scope) {
            Err(Unwind::Error(report)) => {
                log::debug!("caught {}", report.error.kind_name());
                let exception = self.exception_value(&report);
                self.define_variable(scope, error_name, exception)?;
                self.eval(handler, scope)
            }
            other => other,
        }
    }

    /// The object a handler sees for `report`.
    pub fn exception_value(&self, report: &ErrorReport) -> Value {
        if let RuntimeError::Exception { value, .. } = &report.error {
            return value.clone();
        }
        let exception = ObjectRef::clone_of(&self.vm.specials.exception);
        exception.put("name", Value::string(report.error.kind_name()));
        exception.put("message", Value::string(&report.error.to_string()));
        exception.put(
            "backtrace",
            Value::new_list(
                report.backtrace.iter().map(|e| Value::string(e)).collect(),
            ),
        );
        Value::Object(exception)
    }
}

fn finish(result: EvalResult) -> Result<Value, ErrorReport> {
    match result {
        Ok(value) | Err(Unwind::Return(value)) => Ok(value),
        Err(Unwind::Error(report)) => {
            log::warn!("uncaught error: {}", report.error);
            Err(*report)
        }
        Err(signal @ (Unwind::Break(_) | Unwind::Continue)) => {
            Err(ErrorReport::new(RuntimeError::LoopSignalOutsideLoop {
                signal: signal.signal_name(),
            }))
        }
    }
}

/// Excess arguments are rejected before any of them is evaluated.
fn check_argument_count(
    invokable: &Invokable,
    name: &Rc<str>,
    supplied: usize,
) -> Result<(), RuntimeError> {
    if !invokable.is_variadic() && supplied > invokable.arity() {
        return Err(RuntimeError::TooManyArguments {
            name: name.clone(),
            expected: invokable.arity(),
            given: supplied,
        });
    }
    Ok(())
}

/// `[context, arg0, ...]` padded with nil up to the declared arity.
fn argument_vector(
    context: Value,
    arity: usize,
    variadic: bool,
    arguments: ArgumentVector,
) -> ArgumentVector {
    let supplied = arguments.len();
    let size = if variadic { arity.max(supplied) } else { arity };

    let mut vector = ArgumentVector::with_capacity(size + 1);
    vector.push(context);
    vector.extend(arguments);
    vector.extend(std::iter::repeat_n(Value::Nil, size.saturating_sub(supplied)));
    vector
}

fn describe_frame(receiver_type: &str, message: &Message) -> String {
    match message.location {
        Some(location) => {
            format!("{receiver_type} {} ({location})", message.name)
        }
        None => format!("{receiver_type} {}", message.name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn interpreter() -> Interpreter {
        Interpreter::new(VMCreateInfo::default())
    }

    fn int(value: i64) -> Node {
        Node::Integer(value)
    }

    fn clone_of(name: &str) -> Node {
        Node::send(Node::ident(name), "clone", vec![])
    }

    fn lobby_slot(vm: &Interpreter, name: &str) -> Value {
        vm.vm.lobby.get_slot(name).unwrap_or(Value::Nil)
    }

    // ── Dispatch ──

    #[test]
    fn undefined_name_on_fresh_clone() {
        let mut vm = interpreter();
        let message = Message::new("frobnicate", vec![])
            .with_location(crate::Location::new(3, 7));
        let program = Node::sent_with(message, Some(clone_of("Object")));

        let report = vm.run(&program).unwrap_err();
        match &report.error {
            RuntimeError::UndefinedName { name, location } => {
                assert_eq!(&**name, "frobnicate");
                assert_eq!(*location, Some(crate::Location::new(3, 7)));
            }
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn data_slots_are_read_without_evaluating_arguments() {
        let mut vm = interpreter();
        let program = Node::seq(vec![
            Node::define("o", clone_of("Object")),
            Node::define_on(Node::ident("o"), "x", int(1)),
            // the argument would fail if it were evaluated
            Node::send(Node::ident("o"), "x", vec![Node::ident("missing")]),
        ]);
        assert!(matches!(vm.run(&program), Ok(Value::Integer(1))));
    }

    #[test]
    fn methods_rebind_self_blocks_do_not() {
        let mut vm = interpreter();
        let program = Node::seq(vec![
            Node::define("a", clone_of("Object")),
            Node::define("b", clone_of("Object")),
            Node::define_on(Node::ident("a"), "who", Node::method(&[], Node::SelfRef)),
            Node::define_on(
                Node::ident("a"),
                "makeBlock",
                Node::method(&[], Node::block(&[], Node::SelfRef)),
            ),
            Node::define_on(
                Node::ident("b"),
                "who",
                Node::send(Node::ident("a"), "getSlot", vec![Node::string("who")]),
            ),
            Node::define_on(
                Node::ident("b"),
                "blk",
                Node::send(Node::ident("a"), "makeBlock", vec![]),
            ),
            Node::call(
                "list",
                vec![
                    Node::send(Node::ident("a"), "who", vec![]),
                    Node::send(Node::ident("b"), "who", vec![]),
                    Node::send(Node::ident("b"), "blk", vec![]),
                ],
            ),
        ]);

        let Ok(Value::List(items)) = vm.run(&program) else {
            panic!("expected a list");
        };
        let a = lobby_slot(&vm, "a");
        let b = lobby_slot(&vm, "b");
        let items = items.borrow();
        assert!(items[0].equals(&a));
        assert!(items[1].equals(&b));
        // the block answers the scope it was created in
        assert!(items[2].equals(&a));
    }

    #[test]
    fn block_self_is_the_same_from_every_receiver() {
        let mut vm = interpreter();
        let program = Node::seq(vec![
            Node::define("a", clone_of("Object")),
            Node::define("b", clone_of("Object")),
            Node::define("c", clone_of("Object")),
            Node::define_on(
                Node::ident("a"),
                "makeBlock",
                Node::method(&[], Node::block(&[], Node::SelfRef)),
            ),
            Node::define("shared", Node::send(Node::ident("a"), "makeBlock", vec![])),
            Node::define_on(
                Node::ident("b"),
                "blk",
                Node::send(Node::ThisLocals, "getSlot", vec![Node::string("shared")]),
            ),
            Node::define_on(
                Node::ident("c"),
                "blk",
                Node::send(Node::ThisLocals, "getSlot", vec![Node::string("shared")]),
            ),
            Node::call(
                "list",
                vec![
                    Node::send(Node::ident("b"), "blk", vec![]),
                    Node::send(Node::ident("c"), "blk", vec![]),
                    Node::send(Node::ident("b"), "blk", vec![]),
                ],
            ),
        ]);

        let Ok(Value::List(items)) = vm.run(&program) else {
            panic!("expected a list");
        };
        let a = lobby_slot(&vm, "a");
        let items = items.borrow();
        assert_eq!(items.len(), 3);
        assert!(items.iter().all(|item| item.equals(&a)));
    }

    #[test]
    fn functions_do_not_rebind_self() {
        let mut vm = interpreter();
        let program = Node::seq(vec![
            Node::define("a", clone_of("Object")),
            Node::define("b", clone_of("Object")),
            Node::define_on(
                Node::ident("a"),
                "f",
                Node::function(&[], Node::SelfRef),
            ),
            Node::define_on(
                Node::ident("b"),
                "f",
                Node::send(Node::ident("a"), "getSlot", vec![Node::string("f")]),
            ),
            Node::call(
                "list",
                vec![
                    Node::send(Node::ident("a"), "f", vec![]),
                    Node::send(Node::ident("b"), "f", vec![]),
                ],
            ),
        ]);

        let Ok(Value::List(items)) = vm.run(&program) else {
            panic!("expected a list");
        };
        let lobby = Value::Object(vm.vm.lobby.clone());
        let a = lobby_slot(&vm, "a");
        let b = lobby_slot(&vm, "b");
        let items = items.borrow();
        assert!(items[0].equals(&lobby));
        assert!(items[1].equals(&lobby));
        assert!(!items[0].equals(&a));
        assert!(!items[1].equals(&b));
    }

    #[test]
    fn block_call_context_is_anchored_to_definition() {
        let mut vm = interpreter();
        let block = Node::block(&[], Node::send(Node::ThisCall, "target", vec![]));
        let program = Node::seq(vec![
            Node::define("o", clone_of("Object")),
            Node::define_on(Node::ident("o"), "blk", block),
            Node::send(Node::ident("o"), "blk", vec![]),
        ]);
        // defined at module scope, so the target is the module Locals
        assert!(matches!(vm.run(&program), Ok(Value::Locals(_))));
    }

    #[test]
    fn excess_arguments_fail_before_evaluation() {
        let mut vm = interpreter();
        let program = Node::seq(vec![
            Node::define("hits", int(0)),
            Node::define("o", clone_of("Object")),
            Node::define_on(Node::ident("o"), "one", Node::method(&["x"], Node::ident("x"))),
            Node::send(
                Node::ident("o"),
                "one",
                vec![
                    int(1),
                    Node::update("hits", Node::send(Node::ident("hits"), "+", vec![int(1)])),
                ],
            ),
        ]);
        let report = vm.run(&program).unwrap_err();
        assert!(matches!(
            report.error,
            RuntimeError::TooManyArguments { expected: 1, given: 2, .. }
        ));
        assert!(matches!(lobby_slot(&vm, "hits"), Value::Integer(0)));
    }

    #[test]
    fn missing_arguments_are_nil() {
        let mut vm = interpreter();
        let program = Node::seq(vec![
            Node::define("o", clone_of("Object")),
            Node::define_on(
                Node::ident("o"),
                "pair",
                Node::method(&["x", "y"], Node::send(Node::ident("y"), "isNil", vec![])),
            ),
            Node::send(Node::ident("o"), "pair", vec![int(1)]),
        ]);
        assert!(matches!(vm.run(&program), Ok(Value::True)));
    }

    #[test]
    fn functions_see_receiver_but_no_call() {
        let mut vm = interpreter();
        let function = Node::function(&["x"], Node::seq(vec![Node::ThisCall]));
        let program = Node::seq(vec![
            Node::define("o", clone_of("Object")),
            Node::define_on(Node::ident("o"), "f", function),
            Node::send(Node::ident("o"), "f", vec![int(1)]),
        ]);
        assert!(matches!(vm.run(&program), Ok(Value::Nil)));
    }

    #[test]
    fn return_ends_the_activation() {
        let mut vm = interpreter();
        let body = Node::seq(vec![
            Node::if_else(
                Node::send(Node::ident("x"), ">", vec![int(0)]),
                Node::return_with(Some(Node::string("positive"))),
                None,
            ),
            Node::string("other"),
        ]);
        let program = Node::seq(vec![
            Node::define("o", clone_of("Object")),
            Node::define_on(Node::ident("o"), "sign", Node::method(&["x"], body)),
            Node::send(Node::ident("o"), "sign", vec![int(5)]),
        ]);
        let Ok(Value::String(text)) = vm.run(&program) else {
            panic!("expected a string");
        };
        assert_eq!(&*text, "positive");
    }

    #[test]
    fn break_cannot_cross_an_activation() {
        let mut vm = interpreter();
        let program = Node::seq(vec![
            Node::define("o", clone_of("Object")),
            Node::define_on(Node::ident("o"), "leak", Node::method(&[], Node::break_with(None))),
            Node::for_loop("i", int(1), int(3), None, Node::send(Node::ident("o"), "leak", vec![])),
        ]);
        let report = vm.run(&program).unwrap_err();
        assert!(matches!(
            report.error,
            RuntimeError::LoopSignalOutsideLoop { signal: "break" }
        ));
    }

    #[test]
    fn deep_recursion_overflows() {
        let mut vm = Interpreter::new(VMCreateInfo {
            max_depth: 64,
            ..Default::default()
        });
        let program = Node::seq(vec![
            Node::define("o", clone_of("Object")),
            Node::define_on(
                Node::ident("o"),
                "loop",
                Node::method(&[], Node::send(Node::SelfRef, "loop", vec![])),
            ),
            Node::send(Node::ident("o"), "loop", vec![]),
        ]);
        let report = vm.run(&program).unwrap_err();
        assert!(matches!(report.error, RuntimeError::StackOverflow { limit: 64 }));
        assert_eq!(report.backtrace.len(), 64);
    }

    #[test]
    fn backtrace_names_each_activation() {
        let mut vm = interpreter();
        let program = Node::seq(vec![
            Node::define("o", clone_of("Object")),
            Node::define_on(
                Node::ident("o"),
                "inner",
                Node::method(&[], Node::send(int(1), "/", vec![int(0)])),
            ),
            Node::define_on(
                Node::ident("o"),
                "outer",
                Node::method(&[], Node::send(Node::SelfRef, "inner", vec![])),
            ),
            Node::send(Node::ident("o"), "outer", vec![]),
        ]);
        let report = vm.run(&program).unwrap_err();
        assert_eq!(
            report.backtrace,
            vec!["Number /", "Object inner", "Object outer"]
        );
    }

    // ── Assignment ──

    #[test]
    fn update_writes_where_defined_define_shadows() {
        let mut vm = interpreter();
        let program = Node::seq(vec![
            Node::define("p", clone_of("Object")),
            Node::define_on(Node::ident("p"), "x", int(1)),
            Node::define("o", clone_of("p")),
            Node::update_on(Node::ident("o"), "x", int(2)),
            Node::define("q", clone_of("p")),
            Node::define_on(Node::ident("q"), "x", int(3)),
        ]);
        vm.run(&program).unwrap();

        let (Value::Object(p), Value::Object(o), Value::Object(q)) =
            (lobby_slot(&vm, "p"), lobby_slot(&vm, "o"), lobby_slot(&vm, "q"))
        else {
            panic!("objects are defined on the lobby");
        };
        assert!(matches!(p.get_slot("x"), Some(Value::Integer(2))));
        assert!(!o.has_slot("x"));
        assert!(matches!(q.get_slot("x"), Some(Value::Integer(3))));
        assert!(matches!(p.get_slot("x"), Some(Value::Integer(2))));
    }

    #[test]
    fn update_of_unknown_name_fails() {
        let mut vm = interpreter();
        let report = vm.run(&Node::update("nowhere", int(1))).unwrap_err();
        assert!(matches!(report.error, RuntimeError::UndefinedName { .. }));
    }

    #[test]
    fn locals_stay_in_their_activation() {
        let mut vm = interpreter();
        let program = Node::seq(vec![
            Node::define("o", clone_of("Object")),
            Node::define_on(
                Node::ident("o"),
                "scratch",
                Node::method(&[], Node::define("temp", int(9))),
            ),
            Node::send(Node::ident("o"), "scratch", vec![]),
        ]);
        vm.run(&program).unwrap();
        let Value::Object(o) = lobby_slot(&vm, "o") else {
            panic!("o is an object");
        };
        assert!(!o.has_slot("temp"));
        assert!(!vm.vm.lobby.has_slot("temp"));
    }

    #[test]
    fn nested_method_reads_outer_variables() {
        let mut vm = interpreter();
        let inner = Node::method(&[], Node::ident("base"));
        let outer = Node::method(
            &[],
            Node::seq(vec![
                Node::define("base", int(41)),
                Node::define_on(Node::SelfRef, "inner", inner),
                Node::send(Node::send(Node::SelfRef, "inner", vec![]), "+", vec![int(1)]),
            ]),
        );
        let program = Node::seq(vec![
            Node::define("o", clone_of("Object")),
            Node::define_on(Node::ident("o"), "outer", outer),
            Node::send(Node::ident("o"), "outer", vec![]),
        ]);
        assert!(matches!(vm.run(&program), Ok(Value::Integer(42))));
    }

    #[test]
    fn perform_from_the_host() {
        let mut vm = interpreter();
        let result = vm.perform(Value::Integer(6), "*", vec![Value::Integer(7)]);
        assert!(matches!(result, Ok(Value::Integer(42))));
        assert!(vm.perform(Value::Nil, "nothing", vec![]).is_err());
    }
}
