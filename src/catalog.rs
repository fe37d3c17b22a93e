//! The built-in exercise set.
//!
//! Six classic intercept-theorem tasks. Each marks one or two segments on
//! ray B as unknown; the values are chosen so the proportions come out even.

use crate::task::{SegmentSlot, TaskSpec, DEFAULT_UNIT};

const RAY_LENGTH: f64 = 15.0;

struct Entry {
    angles: (f64, f64),
    fractions: (f64, f64),
    za: Value,
    ab: Value,
    za_prime: Value,
    ab_prime: Value,
}

#[derive(Clone, Copy)]
enum Value {
    Known(f64),
    Unknown(char),
}

use Value::{Known, Unknown};

const ENTRIES: [Entry; 6] = [
    Entry {
        angles: (60.0, 25.0),
        fractions: (0.35, 0.70),
        za: Known(15.0),
        ab: Known(20.0),
        za_prime: Known(12.0),
        ab_prime: Unknown('x'),
    },
    Entry {
        angles: (55.0, 30.0),
        fractions: (0.33, 0.67),
        za: Known(18.0),
        ab: Known(24.0),
        za_prime: Unknown('y'),
        ab_prime: Known(32.0),
    },
    Entry {
        angles: (65.0, 20.0),
        fractions: (0.30, 0.65),
        za: Known(12.0),
        ab: Known(28.0),
        za_prime: Known(10.0),
        ab_prime: Unknown('x'),
    },
    Entry {
        angles: (50.0, 35.0),
        fractions: (0.40, 0.75),
        za: Known(20.0),
        ab: Known(25.0),
        za_prime: Known(16.0),
        ab_prime: Unknown('x'),
    },
    Entry {
        angles: (58.0, 28.0),
        fractions: (0.25, 0.60),
        za: Known(10.0),
        ab: Known(30.0),
        za_prime: Unknown('y'),
        ab_prime: Known(36.0),
    },
    Entry {
        angles: (62.0, 22.0),
        fractions: (0.35, 0.70),
        za: Known(21.0),
        ab: Known(21.0),
        za_prime: Unknown('y'),
        ab_prime: Unknown('x'),
    },
];

fn with_value(spec: TaskSpec, slot: SegmentSlot, value: Value) -> TaskSpec {
    match value {
        Known(v) => spec.known(slot, v, DEFAULT_UNIT),
        Unknown(symbol) => spec.unknown(slot, symbol),
    }
}

/// All built-in tasks, in order
pub fn tasks() -> Vec<TaskSpec> {
    ENTRIES
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            let number = i + 1;
            let spec = TaskSpec::new(
                entry.angles.0,
                entry.angles.1,
                RAY_LENGTH,
                entry.fractions.0,
                entry.fractions.1,
            )
            .named(format!("aufgabe{number}"))
            .titled(format!("Strahlensätze Aufgabe {number}"));
            let spec = with_value(spec, SegmentSlot::ApexFirstA, entry.za);
            let spec = with_value(spec, SegmentSlot::FirstSecondA, entry.ab);
            let spec = with_value(spec, SegmentSlot::ApexFirstB, entry.za_prime);
            with_value(spec, SegmentSlot::FirstSecondB, entry.ab_prime)
        })
        .collect()
}
