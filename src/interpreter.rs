//! Tree-walking evaluator.
//!
//! Owns the global frame, the current-frame pointer, and the resolution
//! side table filled in by the resolver. `run` is the front-to-back
//! pipeline (scan, parse, resolve, execute) used by the driver, the REPL
//! and the integration tests.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use log::{debug, info};

use crate::environment::Environment;
use crate::error::{LoxError, Result};
use crate::expr::{Expr, ExprId};
use crate::parser::Parser;
use crate::resolver::Resolver;
use crate::scanner::Scanner;
use crate::stmt::Stmt;
use crate::token::{Token, TokenType};
use crate::value::{LoxFunction, Value};

/// Outcome of executing one statement: fall through to the next, or carry a
/// `return` value up to the enclosing call. Kept apart from the error
/// channel so a return can never surface as a user-visible error.
#[derive(Debug)]
pub enum Flow {
    Normal,
    Return { value: Value, line: usize },
}

pub struct Interpreter {
    globals: Rc<RefCell<Environment>>,
    environment: Rc<RefCell<Environment>>,
    locals: HashMap<ExprId, usize>,
    next_expr_id: usize,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    pub fn new() -> Self {
        let globals = Rc::new(RefCell::new(Environment::new()));

        globals.borrow_mut().define(
            "clock",
            Value::NativeFunction {
                name: "clock",
                arity: 0,
                func: clock_native,
            },
        );

        Interpreter {
            environment: globals.clone(),
            globals,
            locals: HashMap::new(),
            next_expr_id: 0,
        }
    }

    /// Run a whole source text through the pipeline. All lex and parse
    /// diagnostics are returned together; resolution diagnostics likewise;
    /// a runtime error aborts the program and is returned alone. Globals
    /// and the resolution table survive the call, so a prompt session can
    /// keep feeding lines to one interpreter.
    pub fn run(&mut self, source: &str) -> std::result::Result<(), Vec<LoxError>> {
        let mut diagnostics: Vec<LoxError> = Vec::new();
        let mut tokens: Vec<Token> = Vec::new();

        for item in Scanner::new(source) {
            match item {
                Ok(token) => tokens.push(token),
                Err(e) => diagnostics.push(e),
            }
        }

        let mut parser = Parser::new(tokens, self.next_expr_id);
        let statements: Vec<Stmt> = parser.parse();

        self.next_expr_id = parser.next_expr_id();
        diagnostics.extend(parser.take_errors());

        if !diagnostics.is_empty() {
            return Err(diagnostics);
        }

        let mut resolver = Resolver::new(self);
        resolver.resolve(&statements);

        let resolve_errors = resolver.take_errors();

        if !resolve_errors.is_empty() {
            return Err(resolve_errors);
        }

        self.interpret(&statements).map_err(|e| vec![e])
    }

    /// Execute an already-resolved program. The first runtime error aborts.
    pub fn interpret(&mut self, statements: &[Stmt]) -> Result<()> {
        info!("Interpreting {} statement(s)", statements.len());

        for stmt in statements {
            match self.execute(stmt)? {
                Flow::Normal => {}

                // The resolver rejects top-level `return`; a signal that
                // still escapes has no call site to consume it.
                Flow::Return { line, .. } => {
                    return Err(LoxError::runtime(
                        line,
                        "Can't return from top-level code.",
                    ));
                }
            }
        }

        Ok(())
    }

    /// Global binding by name, for drivers and tests.
    pub fn get_global(&self, name: &str) -> Option<Value> {
        self.globals.borrow().try_get_here(name)
    }

    /// Resolver callback: this expression node resolves `depth` frames up.
    pub(crate) fn note_local(&mut self, id: ExprId, depth: usize) {
        self.locals.insert(id, depth);
    }

    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------

    fn execute(&mut self, stmt: &Stmt) -> Result<Flow> {
        match stmt {
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;

                Ok(Flow::Normal)
            }

            Stmt::Print(expr) => {
                let value: Value = self.evaluate(expr)?;

                println!("{}", value);

                Ok(Flow::Normal)
            }

            Stmt::Var { name, initializer } => {
                let value: Value = match initializer {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };

                self.environment.borrow_mut().define(&name.lexeme, value);

                Ok(Flow::Normal)
            }

            Stmt::Block(statements) => {
                let child = Environment::with_enclosing(self.environment.clone());

                self.execute_block(statements, Rc::new(RefCell::new(child)))
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    self.execute(then_branch)
                } else if let Some(else_branch) = else_branch {
                    self.execute(else_branch)
                } else {
                    Ok(Flow::Normal)
                }
            }

            Stmt::While { condition, body } => {
                while self.evaluate(condition)?.is_truthy() {
                    if let flow @ Flow::Return { .. } = self.execute(body)? {
                        return Ok(flow);
                    }
                }

                Ok(Flow::Normal)
            }

            Stmt::Function(decl) => {
                let function = LoxFunction {
                    declaration: decl.clone(),
                    closure: self.environment.clone(),
                };

                self.environment
                    .borrow_mut()
                    .define(&decl.name.lexeme, Value::Function(Rc::new(function)));

                Ok(Flow::Normal)
            }

            Stmt::Return { keyword, value } => {
                let value: Value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };

                Ok(Flow::Return {
                    value,
                    line: keyword.line,
                })
            }
        }
    }

    /// Execute statements in the given frame, restoring the previous
    /// current-frame pointer on every exit path.
    fn execute_block(
        &mut self,
        statements: &[Stmt],
        environment: Rc<RefCell<Environment>>,
    ) -> Result<Flow> {
        let previous: Rc<RefCell<Environment>> =
            std::mem::replace(&mut self.environment, environment);

        let mut flow = Flow::Normal;

        for stmt in statements {
            match self.execute(stmt) {
                Ok(Flow::Normal) => {}

                Ok(f @ Flow::Return { .. }) => {
                    flow = f;
                    break;
                }

                Err(e) => {
                    self.environment = previous;
                    return Err(e);
                }
            }
        }

        self.environment = previous;

        Ok(flow)
    }

    // ------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------

    pub fn evaluate(&mut self, expr: &Expr) -> Result<Value> {
        match expr {
            Expr::Literal(value) => Ok(value.clone()),

            Expr::Grouping(inner) => self.evaluate(inner),

            Expr::Unary { operator, right } => self.evaluate_unary(operator, right),

            Expr::Binary {
                left,
                operator,
                right,
            } => self.evaluate_binary(left, operator, right),

            Expr::Logical {
                left,
                operator,
                right,
            } => {
                let left_val: Value = self.evaluate(left)?;

                // Short-circuit: hand back the controlling operand itself,
                // not a coerced boolean.
                if operator.token_type == TokenType::OR {
                    if left_val.is_truthy() {
                        return Ok(left_val);
                    }
                } else if !left_val.is_truthy() {
                    return Ok(left_val);
                }

                self.evaluate(right)
            }

            Expr::Variable { id, name } => self.look_up_variable(*id, name),

            Expr::Assign { id, name, value } => {
                let value: Value = self.evaluate(value)?;

                match self.locals.get(id) {
                    Some(&depth) => {
                        self.environment
                            .borrow_mut()
                            .assign_at(depth, &name.lexeme, value.clone());
                    }

                    None => {
                        self.globals.borrow_mut().assign(name, value.clone())?;
                    }
                }

                Ok(value)
            }

            Expr::Call {
                callee,
                paren,
                arguments,
            } => self.evaluate_call(callee, paren, arguments),
        }
    }

    fn look_up_variable(&self, id: ExprId, name: &Token) -> Result<Value> {
        match self.locals.get(&id) {
            Some(&depth) => Ok(self.environment.borrow().get_at(depth, &name.lexeme)),

            None => self.globals.borrow().get(name),
        }
    }

    fn evaluate_unary(&mut self, operator: &Token, right: &Expr) -> Result<Value> {
        let value: Value = self.evaluate(right)?;

        match operator.token_type {
            TokenType::MINUS => match value {
                Value::Number(n) => Ok(Value::Number(-n)),

                _ => Err(LoxError::runtime(
                    operator.line,
                    "Operand must be a number.",
                )),
            },

            TokenType::BANG => Ok(Value::Bool(!value.is_truthy())),

            _ => Err(LoxError::runtime(operator.line, "Invalid unary operator.")),
        }
    }

    fn evaluate_binary(&mut self, left: &Expr, operator: &Token, right: &Expr) -> Result<Value> {
        let left_val: Value = self.evaluate(left)?;
        let right_val: Value = self.evaluate(right)?;

        match operator.token_type {
            TokenType::PLUS => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),

                // One string operand stringifies the other.
                (Value::String(a), b) => Ok(Value::String(format!("{}{}", a, b))),

                (a, Value::String(b)) => Ok(Value::String(format!("{}{}", a, b))),

                _ => Err(LoxError::runtime(
                    operator.line,
                    "Operands must be two numbers or two strings.",
                )),
            },

            TokenType::MINUS => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a - b)),

                _ => Err(LoxError::runtime(
                    operator.line,
                    "Operands must be numbers.",
                )),
            },

            TokenType::STAR => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a * b)),

                _ => Err(LoxError::runtime(
                    operator.line,
                    "Operands must be numbers.",
                )),
            },

            TokenType::SLASH => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => {
                    if b == 0.0 {
                        Err(LoxError::runtime(
                            operator.line,
                            "Divisor must be different from 0",
                        ))
                    } else {
                        Ok(Value::Number(a / b))
                    }
                }

                _ => Err(LoxError::runtime(
                    operator.line,
                    "Operands must be numbers.",
                )),
            },

            TokenType::GREATER => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Bool(a > b)),

                _ => Err(LoxError::runtime(
                    operator.line,
                    "Operands must be numbers.",
                )),
            },

            TokenType::GREATER_EQUAL => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Bool(a >= b)),

                _ => Err(LoxError::runtime(
                    operator.line,
                    "Operands must be numbers.",
                )),
            },

            TokenType::LESS => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Bool(a < b)),

                _ => Err(LoxError::runtime(
                    operator.line,
                    "Operands must be numbers.",
                )),
            },

            TokenType::LESS_EQUAL => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Bool(a <= b)),

                _ => Err(LoxError::runtime(
                    operator.line,
                    "Operands must be numbers.",
                )),
            },

            TokenType::EQUAL_EQUAL => Ok(Value::Bool(left_val == right_val)),

            TokenType::BANG_EQUAL => Ok(Value::Bool(left_val != right_val)),

            _ => Err(LoxError::runtime(
                operator.line,
                "Invalid binary operator.",
            )),
        }
    }

    fn evaluate_call(&mut self, callee: &Expr, paren: &Token, arguments: &[Expr]) -> Result<Value> {
        let callee_val: Value = self.evaluate(callee)?;

        let mut args: Vec<Value> = Vec::with_capacity(arguments.len());

        for arg in arguments {
            args.push(self.evaluate(arg)?);
        }

        match callee_val {
            Value::NativeFunction { name, arity, func } => {
                if args.len() != arity {
                    return Err(LoxError::runtime(
                        paren.line,
                        format!("Expected {} arguments but got {}.", arity, args.len()),
                    ));
                }

                debug!("Calling native fn '{}'", name);

                func(self, &args)
            }

            Value::Function(function) => {
                if args.len() != function.arity() {
                    return Err(LoxError::runtime(
                        paren.line,
                        format!(
                            "Expected {} arguments but got {}.",
                            function.arity(),
                            args.len()
                        ),
                    ));
                }

                debug!("Calling fn '{}'", function.declaration.name.lexeme);

                self.call_function(&function, args)
            }

            _ => Err(LoxError::runtime(
                paren.line,
                "Can only call functions and classes.",
            )),
        }
    }

    /// Invoke a user function: a fresh frame hangs off the captured closure
    /// frame (not the caller's frame), parameters bind in order, and a
    /// return signal from the body becomes the call's result.
    fn call_function(&mut self, function: &LoxFunction, args: Vec<Value>) -> Result<Value> {
        let mut frame = Environment::with_enclosing(function.closure.clone());

        for (param, arg) in function.declaration.params.iter().zip(args) {
            frame.define(&param.lexeme, arg);
        }

        let flow = self.execute_block(&function.declaration.body, Rc::new(RefCell::new(frame)))?;

        match flow {
            Flow::Return { value, .. } => Ok(value),
            Flow::Normal => Ok(Value::Nil),
        }
    }
}

/// The single built-in: wall-clock seconds since the Unix epoch.
fn clock_native(_interpreter: &mut Interpreter, _args: &[Value]) -> Result<Value> {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_secs_f64();

    Ok(Value::Number(timestamp))
}
