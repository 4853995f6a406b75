//! Dispatch loop for bytecode execution
//!
//! Script calls recurse through [`Dispatcher::call`]; one dispatcher lives
//! for one top-level invocation and carries its instruction budget.

use std::rc::Rc;

use thorn_bytecode::{Constant, Instruction, Opcode, Prototype, CODE_START, FIELDS_PER_FLUSH};
use thorn_types::{Closure, Namespace, Table, TableRef, ThornError, ThornResult, Value};
use tracing::{trace, warn};

use crate::call;
use crate::call_frame::CallFrame;
use crate::limits::Limits;
use crate::operators::{self, Arith, Compare};
use crate::stack::Stack;

/// Executes script functions against a pair of namespaces
#[derive(Debug)]
pub struct Dispatcher<'a> {
    env: &'a Namespace,
    globals: &'a mut Namespace,
    limits: Limits,
    instructions: u64,
}

impl<'a> Dispatcher<'a> {
    /// Create a dispatcher with a fresh instruction budget
    pub fn new(env: &'a Namespace, globals: &'a mut Namespace, limits: Limits) -> Self {
        Self {
            env,
            globals,
            limits,
            instructions: 0,
        }
    }

    /// Instructions dispatched so far
    pub fn instructions(&self) -> u64 {
        self.instructions
    }

    /// Call `callee` from a frame at `depth` (0 for the host).
    ///
    /// Script functions run at `depth + 1`; host functions are invoked
    /// directly and do not count towards the depth limit.
    pub fn call(&mut self, callee: &Value, args: Vec<Value>, depth: usize) -> ThornResult<Value> {
        match callee {
            Value::NativeFunction(native) => native.call(&args),
            Value::Closure(closure) => self.run(closure.clone(), args, depth + 1),
            other => Err(ThornError::type_error(format!(
                "attempt to call a {} value",
                other.type_name()
            ))),
        }
    }

    fn run(&mut self, closure: Rc<Closure>, args: Vec<Value>, depth: usize) -> ThornResult<Value> {
        if depth > self.limits.max_call_depth {
            warn!(depth, max = self.limits.max_call_depth, "call depth limit exceeded");
            return Err(ThornError::limits(format!(
                "max call depth of {} exceeded",
                self.limits.max_call_depth
            )));
        }

        let proto = closure.proto.clone();
        trace!(depth, source = %proto.source, line = proto.line_defined, "enter function");
        let args = call::adjust_args(proto.param_shape()?, args);
        let capacity = proto.stack_size()? + args.len();

        let mut frame = CallFrame::new(closure, capacity, CODE_START, depth);
        for arg in args {
            frame.stack.push(arg)?;
        }
        self.execute(&proto, &mut frame)
            .map_err(|e| e.with_frame(frame.stack_frame()))
    }

    fn tick(&mut self) -> ThornResult<()> {
        self.instructions += 1;
        if self.instructions > self.limits.max_instructions {
            warn!(max = self.limits.max_instructions, "instruction limit exceeded");
            return Err(ThornError::limits(format!(
                "max instructions of {} exceeded",
                self.limits.max_instructions
            )));
        }
        Ok(())
    }

    fn execute(&mut self, proto: &Prototype, frame: &mut CallFrame) -> ThornResult<Value> {
        let code = proto.code.as_slice();
        while frame.pc < code.len() {
            let inst = Instruction::decode(code, frame.pc)?;
            frame.current = inst.offset;
            frame.pc = inst.next;
            self.tick()?;

            let stack = &mut frame.stack;
            match inst.opcode {
                Opcode::EndCode => return Ok(Value::Nil),
                Opcode::RetCode => return call::return_values(stack, inst.arg1),
                Opcode::Call => {
                    let (callee, args) = call::take_call(stack, inst.arg2)?;
                    let result = self.call(&callee, args, frame.depth)?;
                    call::push_results(&mut frame.stack, result, inst.arg1)?;
                }
                Opcode::TailCall => {
                    let (callee, args) = call::take_call(stack, inst.arg2)?;
                    return self.call(&callee, args, frame.depth);
                }
                Opcode::PushNil => {
                    for _ in 0..=inst.arg1 {
                        stack.push(Value::Nil)?;
                    }
                }
                Opcode::Pop => stack.discard(inst.arg1)?,
                Opcode::PushNumber => stack.push(Value::Number(inst.arg1 as f64))?,
                Opcode::PushNumberNeg => stack.push(Value::Number(-(inst.arg1 as f64)))?,
                Opcode::PushConstant => stack.push(constant_value(proto, inst.arg1)?)?,
                Opcode::PushUpValue => {
                    let value = frame.closure.upvalues.get(inst.arg1).cloned().ok_or_else(|| {
                        ThornError::vm_fault(format!("upvalue {} out of range", inst.arg1))
                    })?;
                    stack.push(value)?;
                }
                Opcode::PushLocal => {
                    let value = stack.get(inst.arg1)?.clone();
                    stack.push(value)?;
                }
                Opcode::GetGlobal => {
                    let name = string_constant(proto, inst.arg1)?;
                    stack.push(lookup_global(self.env, self.globals, name))?;
                }
                Opcode::GetTable => {
                    let key = stack.pop()?.first();
                    let target = stack.pop()?.first();
                    stack.push(index(&target, &key)?)?;
                }
                Opcode::GetDotted => {
                    let name = string_constant(proto, inst.arg1)?;
                    let target = stack.pop()?.first();
                    stack.push(field(&target, name)?)?;
                }
                Opcode::PushSelf => {
                    let name = string_constant(proto, inst.arg1)?;
                    let receiver = stack.pop()?.first();
                    let method = field(&receiver, name)?;
                    stack.push(method)?;
                    stack.push(receiver)?;
                }
                Opcode::CreateArray => stack.push(Value::table(Table::new()))?,
                Opcode::SetLocal => {
                    let value = stack.pop()?.first();
                    stack.set(inst.arg1, value)?;
                }
                Opcode::SetGlobal => {
                    let name = string_constant(proto, inst.arg1)?;
                    let value = stack.pop()?.first();
                    self.globals.insert(name.to_string(), value);
                }
                Opcode::SetTablePop => {
                    let value = stack.pop()?;
                    let key = stack.pop()?.first();
                    let target = stack.pop()?.first();
                    store(&target, &key, value)?;
                }
                Opcode::SetTable => {
                    let at = inst
                        .arg1
                        .checked_add(3)
                        .and_then(|depth| stack.len().checked_sub(depth))
                        .ok_or_else(|| {
                            ThornError::vm_fault(format!("SETTABLE {} below stack base", inst.arg1))
                        })?;
                    let target = stack.get(at)?.clone().first();
                    let key = stack.get(at + 1)?.clone().first();
                    let value = stack.pop()?;
                    store(&target, &key, value)?;
                }
                Opcode::SetList => {
                    let values = call::flatten(stack.pop_n(inst.arg2)?);
                    let table = constructor_target(stack, "SETLIST")?;
                    let offset = inst.arg1.checked_mul(FIELDS_PER_FLUSH).ok_or_else(|| {
                        ThornError::vm_fault(format!("SETLIST flush {} out of range", inst.arg1))
                    })?;
                    table.borrow_mut().set_array(offset, values);
                }
                Opcode::SetMap => {
                    let count = inst
                        .arg1
                        .checked_add(1)
                        .and_then(|pairs| pairs.checked_mul(2))
                        .ok_or_else(|| {
                            ThornError::vm_fault(format!("SETMAP {} out of range", inst.arg1))
                        })?;
                    let entries: Vec<Value> = stack
                        .pop_n(count)?
                        .into_iter()
                        .map(Value::first)
                        .collect();
                    let table = constructor_target(stack, "SETMAP")?;
                    fill_constructor(&table, &entries)?;
                }
                Opcode::NeqOp => binary(stack, |a, b| Ok(operators::equals(a, b, true)))?,
                Opcode::EqOp => binary(stack, |a, b| Ok(operators::equals(a, b, false)))?,
                Opcode::LtOp => binary(stack, |a, b| operators::compare(Compare::Lt, a, b))?,
                Opcode::LeOp => binary(stack, |a, b| operators::compare(Compare::Le, a, b))?,
                Opcode::GtOp => binary(stack, |a, b| operators::compare(Compare::Gt, a, b))?,
                Opcode::GeOp => binary(stack, |a, b| operators::compare(Compare::Ge, a, b))?,
                Opcode::AddOp => binary(stack, |a, b| operators::arith(Arith::Add, a, b))?,
                Opcode::SubOp => binary(stack, |a, b| operators::arith(Arith::Sub, a, b))?,
                Opcode::MultOp => binary(stack, |a, b| operators::arith(Arith::Mul, a, b))?,
                Opcode::DivOp => binary(stack, |a, b| operators::arith(Arith::Div, a, b))?,
                Opcode::PowOp => binary(stack, |a, b| operators::arith(Arith::Pow, a, b))?,
                Opcode::ConcOp => binary(stack, |a, b| Ok(operators::concat(a, b)))?,
                Opcode::MinusOp => {
                    let operand = stack.pop()?.first();
                    stack.push(operators::negate(&operand)?)?;
                }
                Opcode::NotOp => {
                    let operand = stack.pop()?.first();
                    stack.push(operators::not(&operand))?;
                }
                Opcode::OntJmp => {
                    if stack.peek()?.clone().first().is_truthy() {
                        frame.pc = jump_target(&inst, code.len())?;
                    } else {
                        stack.pop()?;
                    }
                }
                Opcode::OnfJmp => {
                    if stack.peek()?.clone().first().is_nil() {
                        frame.pc = jump_target(&inst, code.len())?;
                    } else {
                        stack.pop()?;
                    }
                }
                Opcode::Jmp => frame.pc = jump_target(&inst, code.len())?,
                Opcode::IffJmp | Opcode::IffUpJmp => {
                    if stack.pop()?.first().is_nil() {
                        frame.pc = jump_target(&inst, code.len())?;
                    }
                }
                Opcode::IftUpJmp => {
                    if stack.pop()?.first().is_truthy() {
                        frame.pc = jump_target(&inst, code.len())?;
                    }
                }
                Opcode::Closure => {
                    let upvalues = stack
                        .pop_n(inst.arg2)?
                        .into_iter()
                        .map(Value::first)
                        .collect();
                    let nested = constant(proto, inst.arg1)?
                        .as_prototype()
                        .cloned()
                        .ok_or_else(|| {
                            ThornError::vm_fault(format!("constant {} is not a function", inst.arg1))
                        })?;
                    stack.push(Value::Closure(Rc::new(Closure::new(nested, upvalues))))?;
                }
                Opcode::SetLine => frame.line = u32::try_from(inst.arg1).unwrap_or(u32::MAX),
                Opcode::LongArg | Opcode::CheckStack => {}
            }
        }
        Ok(Value::Nil)
    }
}

/// Read a global: `env` first, then `globals`, Nil when absent in both
pub fn lookup_global(env: &Namespace, globals: &Namespace, name: &str) -> Value {
    env.get(name)
        .or_else(|| globals.get(name))
        .cloned()
        .unwrap_or_default()
}

fn binary(
    stack: &mut Stack,
    op: impl FnOnce(&Value, &Value) -> ThornResult<Value>,
) -> ThornResult<()> {
    let b = stack.pop()?.first();
    let a = stack.pop()?.first();
    stack.push(op(&a, &b)?)
}

fn jump_target(inst: &Instruction, code_len: usize) -> ThornResult<usize> {
    match inst.jump_target() {
        Some(target) if target >= CODE_START as isize && target as usize <= code_len => {
            Ok(target as usize)
        }
        _ => Err(ThornError::vm_fault(format!(
            "jump at offset {} lands outside the code",
            inst.offset
        ))),
    }
}

fn constant(proto: &Prototype, index: usize) -> ThornResult<&Constant> {
    proto.constant(index).ok_or_else(|| {
        ThornError::vm_fault(format!(
            "constant {} out of range ({} constants)",
            index,
            proto.constants.len()
        ))
    })
}

fn string_constant(proto: &Prototype, index: usize) -> ThornResult<&str> {
    constant(proto, index)?
        .as_str()
        .map(|s| &**s)
        .ok_or_else(|| ThornError::vm_fault(format!("constant {} is not a string", index)))
}

fn constant_value(proto: &Prototype, index: usize) -> ThornResult<Value> {
    Ok(match constant(proto, index)? {
        Constant::Number(n) => Value::Number(*n),
        Constant::String(s) => Value::String(s.clone()),
        Constant::Prototype(p) => Value::Closure(Rc::new(Closure::main(p.clone()))),
    })
}

fn not_indexable(target: &Value) -> ThornError {
    ThornError::type_error(format!("attempt to index a {} value", target.type_name()))
}

fn index(target: &Value, key: &Value) -> ThornResult<Value> {
    match target {
        Value::Table(t) => t.borrow().get(key),
        other => Err(not_indexable(other)),
    }
}

fn field(target: &Value, name: &str) -> ThornResult<Value> {
    match target {
        Value::Table(t) => Ok(t.borrow().get_field(name)),
        other => Err(not_indexable(other)),
    }
}

fn store(target: &Value, key: &Value, value: Value) -> ThornResult<()> {
    match target {
        Value::Table(t) => t.borrow_mut().set(key, value.first()),
        other => Err(not_indexable(other)),
    }
}

fn constructor_target(stack: &Stack, op: &str) -> ThornResult<TableRef> {
    match stack.peek()? {
        Value::Table(t) => Ok(t.clone()),
        other => Err(ThornError::vm_fault(format!(
            "{} expects a table on the stack, found {}",
            op,
            other.type_name()
        ))),
    }
}

/// Install constructor key/value pairs; the first key decides between
/// array and map representation for the whole run
fn fill_constructor(table: &TableRef, entries: &[Value]) -> ThornResult<()> {
    let array_mode = matches!(entries.first(), Some(Value::Number(_)));
    let mut table = table.borrow_mut();
    for pair in entries.chunks_exact(2) {
        if let [key, value] = pair {
            match (array_mode, key) {
                (true, Value::Number(_)) | (false, Value::String(_)) => {
                    table.set(key, value.clone())?
                }
                _ => {
                    return Err(ThornError::type_error(format!(
                        "table constructor mixes key kinds ({} key in {} constructor)",
                        key.type_name(),
                        if array_mode { "array" } else { "map" }
                    )))
                }
            }
        }
    }
    Ok(())
}
