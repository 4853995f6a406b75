//! Table library: `getn`, `tinsert`, `tremove`

use thorn_types::{Namespace, Table, ThornResult, Value};

use crate::args::{arg, check_position, check_table, register};

/// List helpers over the array segment.
///
/// A numeric field `n` overrides the computed length and is kept in step
/// by `tinsert` and `tremove`.
pub struct TableLib;

impl TableLib {
    /// Length of `table`: its `n` field when numeric, else the array length
    pub fn length(table: &Table) -> usize {
        match table.get_field("n") {
            Value::Number(n) if n >= 0.0 => n as usize,
            _ => table.len(),
        }
    }

    fn bump_n(table: &mut Table, delta: f64) {
        if let Value::Number(n) = table.get_field("n") {
            table.set_field("n", Value::Number(n + delta));
        }
    }

    /// getn(t)
    pub fn getn(args: &[Value]) -> ThornResult<Value> {
        let t = check_table(args, 0, "getn")?;
        let len = Self::length(&t.borrow());
        Ok(Value::Number(len as f64))
    }

    /// tinsert(t, v) appends; tinsert(t, pos, v) inserts at `pos`
    pub fn tinsert(args: &[Value]) -> ThornResult<Value> {
        let t = check_table(args, 0, "tinsert")?;
        let mut table = t.borrow_mut();
        let len = Self::length(&table);
        if args.len() <= 2 {
            table.set_index(len + 1, arg(args, 1).clone());
        } else {
            let pos = check_position(args, 1, "tinsert")?;
            let pos = usize::try_from(pos).unwrap_or(0);
            table.insert_index(pos, arg(args, 2).clone())?;
        }
        Self::bump_n(&mut table, 1.0);
        Ok(Value::Nil)
    }

    /// tremove(t [, pos]) removes and returns element `pos` (default last)
    pub fn tremove(args: &[Value]) -> ThornResult<Value> {
        let t = check_table(args, 0, "tremove")?;
        let mut table = t.borrow_mut();
        let len = Self::length(&table);
        if len == 0 {
            return Ok(Value::Nil);
        }
        let pos = if arg(args, 1).is_nil() {
            len
        } else {
            usize::try_from(check_position(args, 1, "tremove")?).unwrap_or(0)
        };
        if pos == 0 || pos > len {
            return Ok(Value::Nil);
        }
        let removed = table.remove_index(pos);
        Self::bump_n(&mut table, -1.0);
        Ok(removed)
    }

    /// Install into `env`
    pub fn install(env: &mut Namespace) {
        register(env, "getn", Self::getn);
        register(env, "tinsert", Self::tinsert);
        register(env, "tremove", Self::tremove);
    }
}
