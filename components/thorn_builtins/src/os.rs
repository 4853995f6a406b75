//! OS library: `clock`, `date`

use std::rc::Rc;

use chrono::format::{Item, StrftimeItems};
use chrono::Local;
use thorn_types::{Namespace, ThornResult, Value};

use crate::args::{arg, bad_argument, check_string, register};
use crate::state::LibraryState;

/// Time queries
pub struct OsLib;

impl OsLib {
    /// date([fmt]), strftime-style, `%c` by default
    pub fn date(args: &[Value]) -> ThornResult<Value> {
        let pattern = if arg(args, 0).is_nil() {
            "%c".to_string()
        } else {
            check_string(args, 0, "date")?
        };
        let items: Vec<Item<'_>> = StrftimeItems::new(&pattern).collect();
        if items.iter().any(|item| matches!(item, Item::Error)) {
            return Err(bad_argument(0, "date", "invalid conversion specifier"));
        }
        let text = Local::now().format_with_items(items.into_iter()).to_string();
        Ok(Value::from(text))
    }

    /// Install into `env`
    pub fn install(env: &mut Namespace, state: &Rc<LibraryState>) {
        let clock = state.clone();
        register(env, "clock", move |_| Ok(Value::Number(clock.elapsed())));
        register(env, "date", Self::date);
    }
}
