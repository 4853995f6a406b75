//! Script tables.
//!
//! A table has an array segment addressed by integral keys `1..=n`, a
//! numeric segment for every other number key (sparse, zero, negative and
//! fractional) and a map segment addressed by strings. The array segment
//! only grows a few slots past its current length per write, so a single
//! sparse store never allocates more than its own entry. Both keyed
//! segments keep insertion order so iteration and dumps are deterministic.

use std::rc::Rc;

use indexmap::IndexMap;

use crate::number::format_number;
use crate::{ThornError, ThornResult, Value};

/// Largest integral key stored in the array segment
pub const MAX_ARRAY_INDEX: usize = 1 << 24;

/// How far past the current border a write may extend the array segment
pub const ARRAY_PART_THRESHOLD: usize = 5;

/// A Thorn table.
///
/// # Examples
///
/// ```
/// use thorn_types::{Table, Value};
///
/// let mut t = Table::new();
/// t.set(&Value::from(1.0), Value::from("a")).unwrap();
/// t.set(&Value::from("name"), Value::from("x")).unwrap();
///
/// assert_eq!(t.len(), 1);
/// assert_eq!(t.get_field("name"), Value::from("x"));
/// assert_eq!(t.dump(true), "{\n  1 = \"a\",\n  name = \"x\"\n}");
/// ```
#[derive(Debug, Clone, Default)]
pub struct Table {
    array: Vec<Value>,
    numbers: IndexMap<u64, Value>,
    map: IndexMap<Rc<str>, Value>,
}

enum Key<'a> {
    Index(usize),
    Number(f64),
    Field(&'a str),
}

impl Table {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an array-backed table from a list of values
    pub fn from_values(values: Vec<Value>) -> Self {
        let mut table = Self::new();
        table.array = values.into_iter().map(Value::first).collect();
        table.trim();
        table
    }

    fn classify<'a>(key: &'a Value) -> ThornResult<Option<Key<'a>>> {
        match key {
            Value::String(s) => Ok(Some(Key::Field(s))),
            Value::Number(n) if n.is_nan() => Ok(None),
            Value::Number(n) => Ok(Some(match array_index(*n) {
                Some(i) => Key::Index(i),
                None => Key::Number(*n),
            })),
            Value::Nil => Ok(None),
            Value::Tuple(values) => match values.first() {
                Some(first) => Self::classify(first),
                None => Ok(None),
            },
            other => Err(ThornError::type_error(format!(
                "invalid table key of type {}",
                other.type_name()
            ))),
        }
    }

    /// Read `t[key]`.
    ///
    /// Nil and NaN keys read as Nil; keys other than numbers and strings
    /// are a type error.
    pub fn get(&self, key: &Value) -> ThornResult<Value> {
        Ok(match Self::classify(key)? {
            Some(Key::Index(i)) => self.get_index(i),
            Some(Key::Number(n)) => self
                .numbers
                .get(&number_key(n))
                .cloned()
                .unwrap_or_default(),
            Some(Key::Field(name)) => self.get_field(name),
            None => Value::Nil,
        })
    }

    /// Write `t[key] = value`; writing Nil removes the entry
    pub fn set(&mut self, key: &Value, value: Value) -> ThornResult<()> {
        match Self::classify(key)? {
            Some(Key::Index(i)) => self.set_index(i, value),
            Some(Key::Number(n)) => self.set_number(n, value),
            Some(Key::Field(name)) => self.set_field(name, value),
            None => {
                return Err(ThornError::type_error(format!(
                    "invalid table index {}",
                    key
                )))
            }
        }
        Ok(())
    }

    /// Read integral key `index`
    pub fn get_index(&self, index: usize) -> Value {
        match index.checked_sub(1) {
            Some(i) if i < self.array.len() => self.array[i].clone(),
            _ => self
                .numbers
                .get(&number_key(index as f64))
                .cloned()
                .unwrap_or_default(),
        }
    }

    /// Write integral key `index`.
    ///
    /// Keys within [`ARRAY_PART_THRESHOLD`] of the border extend the array
    /// segment; anything further out lands in the numeric segment.
    pub fn set_index(&mut self, index: usize, value: Value) {
        let value = value.first();
        let border = self.array.len();
        let in_array = index >= 1
            && index <= MAX_ARRAY_INDEX
            && index <= border + ARRAY_PART_THRESHOLD;
        if !in_array {
            self.set_number(index as f64, value);
            return;
        }
        if value.is_nil() {
            if index <= border {
                self.array[index - 1] = Value::Nil;
                self.trim();
            } else {
                self.numbers.shift_remove(&number_key(index as f64));
            }
            return;
        }
        if index > border {
            for gap in border + 1..index {
                let moved = self.numbers.shift_remove(&number_key(gap as f64));
                self.array.push(moved.unwrap_or_default());
            }
            self.numbers.shift_remove(&number_key(index as f64));
            self.array.push(value);
            self.absorb();
        } else {
            self.array[index - 1] = value;
        }
    }

    fn set_number(&mut self, n: f64, value: Value) {
        let key = number_key(n);
        let value = value.first();
        if value.is_nil() {
            self.numbers.shift_remove(&key);
        } else if let Some(slot) = self.numbers.get_mut(&key) {
            *slot = value;
        } else {
            self.numbers.insert(key, value);
        }
    }

    /// Pull entries that now continue the array segment out of the
    /// numeric segment.
    fn absorb(&mut self) {
        while self.array.len() < MAX_ARRAY_INDEX {
            let next = number_key((self.array.len() + 1) as f64);
            match self.numbers.shift_remove(&next) {
                Some(value) => self.array.push(value),
                None => break,
            }
        }
    }

    /// Read a string-keyed field
    pub fn get_field(&self, name: &str) -> Value {
        self.map.get(name).cloned().unwrap_or_default()
    }

    /// Write a string-keyed field; Nil removes it
    pub fn set_field(&mut self, name: &str, value: Value) {
        let value = value.first();
        if value.is_nil() {
            self.map.shift_remove(name);
        } else if let Some(slot) = self.map.get_mut(name) {
            *slot = value;
        } else {
            self.map.insert(Rc::from(name), value);
        }
    }

    /// Border of the array segment (highest index holding a value)
    pub fn len(&self) -> usize {
        self.array.len()
    }

    /// Whether every segment is empty
    pub fn is_empty(&self) -> bool {
        self.array.is_empty() && self.numbers.is_empty() && self.map.is_empty()
    }

    /// Number of string-keyed entries
    pub fn field_count(&self) -> usize {
        self.map.len()
    }

    /// Append after the current border
    pub fn append(&mut self, value: Value) {
        self.set_index(self.array.len() + 1, value)
    }

    /// Insert at `index`, shifting later elements up
    pub fn insert_index(&mut self, index: usize, value: Value) -> ThornResult<()> {
        if index == 0 || index > self.array.len() + 1 {
            return Err(ThornError::type_error(format!(
                "position {} out of bounds",
                index
            )));
        }
        if self.array.len() >= MAX_ARRAY_INDEX {
            return Err(ThornError::type_error("table array segment is full"));
        }
        self.array.insert(index - 1, value.first());
        self.numbers.shift_remove(&number_key(self.array.len() as f64));
        self.trim();
        self.absorb();
        Ok(())
    }

    /// Remove and return element `index`, shifting later elements down
    pub fn remove_index(&mut self, index: usize) -> Value {
        if index == 0 || index > self.array.len() {
            return Value::Nil;
        }
        let removed = self.array.remove(index - 1);
        self.trim();
        removed
    }

    /// Bulk-install list items at `offset + 1 ..`.
    ///
    /// Used by list-literal construction, one flush at a time.
    pub fn set_array(&mut self, offset: usize, values: Vec<Value>) {
        for (i, value) in values.into_iter().enumerate() {
            self.set_index(offset.saturating_add(1 + i), value);
        }
    }

    /// Bulk-install string-keyed entries
    pub fn set_map<I>(&mut self, entries: I)
    where
        I: IntoIterator<Item = (Rc<str>, Value)>,
    {
        for (key, value) in entries {
            self.set_field(&key, value);
        }
    }

    /// Key/value pairs: array segment ascending, then other numeric keys
    /// and then fields, each in insertion order
    pub fn pairs(&self) -> impl Iterator<Item = (Value, Value)> + '_ {
        let array = self
            .array
            .iter()
            .enumerate()
            .filter(|(_, v)| !v.is_nil())
            .map(|(i, v)| (Value::Number((i + 1) as f64), v.clone()));
        let numbers = self
            .numbers
            .iter()
            .map(|(k, v)| (Value::Number(f64::from_bits(*k)), v.clone()));
        let map = self
            .map
            .iter()
            .map(|(k, v)| (Value::String(k.clone()), v.clone()));
        array.chain(numbers).chain(map)
    }

    /// Non-nil values in iteration order
    pub fn values(&self) -> impl Iterator<Item = &Value> + '_ {
        self.array
            .iter()
            .filter(|v| !v.is_nil())
            .chain(self.numbers.values())
            .chain(self.map.values())
    }

    fn trim(&mut self) {
        while matches!(self.array.last(), Some(Value::Nil)) {
            self.array.pop();
        }
    }

    fn is_sequence(&self) -> bool {
        self.numbers.is_empty() && self.map.is_empty()
    }

    /// Textual dump.
    ///
    /// A table holding only a sequence prints as `{ a, b }` when
    /// `single_line` is set; otherwise entries go one per line as
    /// `key = value` with two-space indentation. Strings are quoted and
    /// escaped, functions print as `FUNCTION`.
    pub fn dump(&self, single_line: bool) -> String {
        let mut out = String::new();
        let mut visiting = Vec::new();
        self.dump_into(&mut out, single_line, 0, true, &mut visiting);
        out
    }

    fn dump_into(
        &self,
        out: &mut String,
        single_line: bool,
        tabs: usize,
        first_tab: bool,
        visiting: &mut Vec<*const Table>,
    ) {
        visiting.push(self as *const Table);
        indent(out, if first_tab { tabs } else { 0 });
        if self.is_sequence() && single_line {
            out.push_str("{ ");
            for (i, value) in self.values().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                dump_value(out, value, tabs + 1, first_tab, visiting);
            }
            out.push_str(" }");
        } else if self.is_sequence() {
            out.push_str("{\n");
            for (i, value) in self.values().enumerate() {
                if i > 0 {
                    out.push_str(",\n");
                }
                indent(out, tabs + 1);
                dump_value(out, value, tabs + 1, true, visiting);
            }
            out.push('\n');
            indent(out, tabs);
            out.push('}');
        } else {
            out.push_str("{\n");
            for (i, (key, value)) in self.pairs().enumerate() {
                if i > 0 {
                    out.push_str(",\n");
                }
                indent(out, tabs + 1);
                out.push_str(&key.to_string());
                out.push_str(" = ");
                dump_value(out, &value, tabs + 1, false, visiting);
            }
            out.push('\n');
            indent(out, tabs);
            out.push('}');
        }
        visiting.pop();
    }
}

fn array_index(n: f64) -> Option<usize> {
    if n.fract() == 0.0 && n >= 1.0 && n <= MAX_ARRAY_INDEX as f64 {
        Some(n as usize)
    } else {
        None
    }
}

fn number_key(n: f64) -> u64 {
    // -0.0 and 0.0 are the same key
    if n == 0.0 {
        0
    } else {
        n.to_bits()
    }
}

fn indent(out: &mut String, tabs: usize) {
    for _ in 0..tabs {
        out.push_str("  ");
    }
}

fn dump_value(
    out: &mut String,
    value: &Value,
    tabs: usize,
    first_tab: bool,
    visiting: &mut Vec<*const Table>,
) {
    match value {
        Value::Nil => out.push_str("nil"),
        Value::Number(n) => out.push_str(&format_number(*n)),
        Value::String(s) => {
            let quoted = serde_json::to_string(&**s).unwrap_or_else(|_| format!("{:?}", s));
            out.push_str(&quoted);
        }
        Value::Table(t) => {
            let table = t.borrow();
            if visiting.contains(&(&*table as *const Table)) {
                out.push_str("{ ... }");
            } else {
                table.dump_into(out, true, tabs, first_tab, visiting);
            }
        }
        Value::Closure(_) | Value::NativeFunction(_) => out.push_str("FUNCTION"),
        Value::Tuple(values) => match values.first() {
            Some(v) => dump_value(out, v, tabs, first_tab, visiting),
            None => out.push_str("nil"),
        },
    }
}
