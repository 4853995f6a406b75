//! Per-runtime library state
//!
//! Everything the builtins remember between calls lives here, owned by one
//! runtime, so independent runtimes never observe each other.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Instant;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::trace;

/// Destination for text written by `print` and `write`
pub trait OutputWriter {
    /// Write a chunk of output
    fn write(&self, text: &str);
}

impl<F: Fn(&str)> OutputWriter for F {
    fn write(&self, text: &str) {
        self(text)
    }
}

/// State shared by all library functions of one runtime
pub struct LibraryState {
    writer: RefCell<Rc<dyn OutputWriter>>,
    // Seeded on first use by `random` unless `randomseed` ran first
    rng: RefCell<Option<StdRng>>,
    clock_origin: Instant,
}

impl LibraryState {
    /// Create state writing to stdout
    pub fn new() -> Self {
        let stdout: Rc<dyn OutputWriter> = Rc::new(|text: &str| print!("{}", text));
        Self {
            writer: RefCell::new(stdout),
            rng: RefCell::new(None),
            clock_origin: Instant::now(),
        }
    }

    /// Replace the output writer
    pub fn set_writer(&self, writer: Rc<dyn OutputWriter>) {
        *self.writer.borrow_mut() = writer;
    }

    /// Send text to the current writer
    pub fn write(&self, text: &str) {
        trace!(len = text.len(), "script output");
        let writer = self.writer.borrow().clone();
        writer.write(text);
    }

    /// Run `f` with the generator, seeding it from entropy on first use
    pub fn with_rng<R>(&self, f: impl FnOnce(&mut StdRng) -> R) -> R {
        let mut slot = self.rng.borrow_mut();
        let rng = slot.get_or_insert_with(StdRng::from_entropy);
        f(rng)
    }

    /// Reseed the generator deterministically
    pub fn seed(&self, seed: u64) {
        *self.rng.borrow_mut() = Some(StdRng::seed_from_u64(seed));
    }

    /// Whether the generator has been created yet
    pub fn rng_initialized(&self) -> bool {
        self.rng.borrow().is_some()
    }

    /// Seconds since this state was created
    pub fn elapsed(&self) -> f64 {
        self.clock_origin.elapsed().as_secs_f64()
    }
}

impl Default for LibraryState {
    fn default() -> Self {
        Self::new()
    }
}
