//! Unit tests for the Thorn standard library as installed into a namespace

use std::cell::RefCell;
use std::rc::Rc;

use thorn_builtins::{install, LibraryState};
use thorn_types::{ErrorKind, Namespace, ThornResult, Value};

struct Harness {
    env: Namespace,
    state: Rc<LibraryState>,
    output: Rc<RefCell<String>>,
}

impl Harness {
    fn new() -> Self {
        let output = Rc::new(RefCell::new(String::new()));
        let sink = output.clone();
        let state = Rc::new(LibraryState::new());
        state.set_writer(Rc::new(move |text: &str| sink.borrow_mut().push_str(text)));
        let mut env = Namespace::new();
        install(&mut env, &state);
        Self { env, state, output }
    }

    fn call(&self, name: &str, args: &[Value]) -> ThornResult<Value> {
        match self.env.get(name) {
            Some(Value::NativeFunction(f)) => f.call(args),
            other => panic!("{} is not a builtin: {:?}", name, other),
        }
    }
}

// ============================================================================
// Installation
// ============================================================================

#[test]
fn test_every_library_function_installed() {
    let h = Harness::new();
    for name in [
        "tostring", "tonumber", "type", "print", "write", "abs", "ceil", "floor", "sqrt", "sin",
        "cos", "tan", "min", "max", "mod", "random", "randomseed", "strlen", "strsub",
        "strlower", "strupper", "strrep", "strfind", "format", "getn", "tinsert", "tremove",
        "clock", "date",
    ] {
        assert!(h.env.get(name).is_some_and(Value::is_callable), "{}", name);
    }
    assert_eq!(h.env.get("PI"), Some(&Value::Number(std::f64::consts::PI)));
}

#[test]
fn test_install_does_not_touch_rng() {
    let h = Harness::new();
    assert!(!h.state.rng_initialized());
}

// ============================================================================
// Output
// ============================================================================

#[test]
fn test_print_goes_to_writer() {
    let h = Harness::new();
    h.call("print", &[Value::from("a"), Value::from(1.0)]).unwrap();
    h.call("write", &[Value::from("b"), Value::from("c")]).unwrap();
    assert_eq!(*h.output.borrow(), "a\t1\nbc");
}

#[test]
fn test_separate_states_are_isolated() {
    let a = Harness::new();
    let b = Harness::new();
    a.call("print", &[Value::from("only a")]).unwrap();
    assert_eq!(*a.output.borrow(), "only a\n");
    assert!(b.output.borrow().is_empty());
}

// ============================================================================
// Seeded randomness
// ============================================================================

#[test]
fn test_randomseed_repeats_sequence() {
    let h = Harness::new();
    let draw = |h: &Harness| -> Vec<Value> {
        (0..5)
            .map(|_| h.call("random", &[Value::from(100.0)]).unwrap())
            .collect()
    };
    h.call("randomseed", &[Value::from(42.0)]).unwrap();
    let first = draw(&h);
    h.call("randomseed", &[Value::from(42.0)]).unwrap();
    assert_eq!(first, draw(&h));
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn test_bad_argument_is_type_error() {
    let h = Harness::new();
    let err = h.call("sqrt", &[Value::from("four")]).unwrap_err();
    assert_eq!(err.kind, ErrorKind::TypeError);
    assert_eq!(
        err.message,
        "bad argument #1 to 'sqrt' (number expected, got string)"
    );
}

#[test]
fn test_type_names() {
    let h = Harness::new();
    let print = h.env.get("print").cloned().unwrap();
    assert_eq!(h.call("type", &[print]).unwrap(), Value::from("function"));
    assert_eq!(h.call("type", &[]).unwrap(), Value::from("nil"));
    assert_eq!(
        h.call("tostring", &[Value::from(3.0)]).unwrap(),
        Value::from("3")
    );
}

#[test]
fn test_format_through_namespace() {
    let h = Harness::new();
    let result = h
        .call("format", &[Value::from("%5.1f|%-3s|"), Value::from(2.26), Value::from("x")])
        .unwrap();
    assert_eq!(result, Value::from("  2.3|x  |"));
}

// ============================================================================
// Oversized requests
// ============================================================================

#[test]
fn test_strrep_huge_count_is_type_error() {
    let h = Harness::new();
    for count in [1e10, 1e19] {
        let err = h
            .call("strrep", &[Value::from("ab"), Value::from(count)])
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::TypeError);
        assert!(err.message.contains("'strrep'"));
    }
}

#[test]
fn test_format_huge_width_or_precision_is_type_error() {
    let h = Harness::new();
    for template in ["%.70000f", "%70000d", "%1000s", "%.500g"] {
        let err = h
            .call("format", &[Value::from(template), Value::from(1.0)])
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::TypeError, "{}", template);
    }
}

#[test]
fn test_tinsert_on_sparse_table_keeps_border() {
    let h = Harness::new();
    let t = Value::table(thorn_types::Table::new());
    let table = t.as_table().unwrap().clone();
    table
        .borrow_mut()
        .set(&Value::from(16_777_216.0), Value::from("far"))
        .unwrap();
    h.call("tinsert", &[t.clone(), Value::from("first")]).unwrap();
    assert_eq!(h.call("getn", &[t.clone()]).unwrap(), Value::from(1.0));
    assert_eq!(
        table.borrow().get(&Value::from(16_777_216.0)).unwrap(),
        Value::from("far")
    );
}
