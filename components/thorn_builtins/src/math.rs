//! Math library
//!
//! Trigonometric functions take and return degrees.

use std::rc::Rc;

use rand::Rng;
use thorn_types::{Namespace, ThornResult, Value};

use crate::args::{bad_argument, check_number, register};
use crate::state::LibraryState;

/// Numeric functions
pub struct MathLib;

impl MathLib {
    /// abs(x)
    pub fn abs(x: f64) -> f64 {
        x.abs()
    }

    /// ceil(x)
    pub fn ceil(x: f64) -> f64 {
        x.ceil()
    }

    /// floor(x)
    pub fn floor(x: f64) -> f64 {
        x.floor()
    }

    /// sqrt(x)
    pub fn sqrt(x: f64) -> f64 {
        x.sqrt()
    }

    /// sin(x), x in degrees
    pub fn sin(x: f64) -> f64 {
        x.to_radians().sin()
    }

    /// cos(x), x in degrees
    pub fn cos(x: f64) -> f64 {
        x.to_radians().cos()
    }

    /// tan(x), x in degrees
    pub fn tan(x: f64) -> f64 {
        x.to_radians().tan()
    }

    /// mod(a, b), truncating remainder
    pub fn fmod(a: f64, b: f64) -> f64 {
        a % b
    }

    /// min(x, ...)
    pub fn min(args: &[Value]) -> ThornResult<Value> {
        Self::fold(args, "min", f64::min)
    }

    /// max(x, ...)
    pub fn max(args: &[Value]) -> ThornResult<Value> {
        Self::fold(args, "max", f64::max)
    }

    fn fold(args: &[Value], name: &str, pick: fn(f64, f64) -> f64) -> ThornResult<Value> {
        let mut acc = check_number(args, 0, name)?;
        for i in 1..args.len() {
            acc = pick(acc, check_number(args, i, name)?);
        }
        Ok(Value::Number(acc))
    }

    /// random() in [0,1), random(m) in 1..=m, random(m, n) in m..=n
    pub fn random(state: &LibraryState, args: &[Value]) -> ThornResult<Value> {
        let (low, high) = match args.len() {
            0 => return Ok(Value::Number(state.with_rng(|rng| rng.gen::<f64>()))),
            1 => (1.0, check_number(args, 0, "random")?.floor()),
            _ => (
                check_number(args, 0, "random")?.floor(),
                check_number(args, 1, "random")?.floor(),
            ),
        };
        if low.is_nan() || high.is_nan() || low > high {
            return Err(bad_argument(args.len() - 1, "random", "interval is empty"));
        }
        let (low, high) = (low as i64, high as i64);
        Ok(Value::Number(state.with_rng(|rng| rng.gen_range(low..=high)) as f64))
    }

    /// randomseed(n)
    pub fn randomseed(state: &LibraryState, args: &[Value]) -> ThornResult<Value> {
        let seed = check_number(args, 0, "randomseed")?;
        state.seed(seed as i64 as u64);
        Ok(Value::Nil)
    }

    /// Install into `env`
    pub fn install(env: &mut Namespace, state: &Rc<LibraryState>) {
        let unary: [(&str, fn(f64) -> f64); 7] = [
            ("abs", Self::abs),
            ("ceil", Self::ceil),
            ("floor", Self::floor),
            ("sqrt", Self::sqrt),
            ("sin", Self::sin),
            ("cos", Self::cos),
            ("tan", Self::tan),
        ];
        for (name, f) in unary {
            register(env, name, move |args| {
                Ok(Value::Number(f(check_number(args, 0, name)?)))
            });
        }
        register(env, "mod", |args| {
            let a = check_number(args, 0, "mod")?;
            let b = check_number(args, 1, "mod")?;
            Ok(Value::Number(Self::fmod(a, b)))
        });
        register(env, "min", Self::min);
        register(env, "max", Self::max);

        let rng = state.clone();
        register(env, "random", move |args| Self::random(&rng, args));
        let rng = state.clone();
        register(env, "randomseed", move |args| Self::randomseed(&rng, args));

        env.insert("PI".to_string(), Value::Number(std::f64::consts::PI));
    }
}
