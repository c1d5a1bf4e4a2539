//! Stable textual rendering of call arguments and results
//!
//! Rendered text is what lands in the inputs/outputs logs, so it must not change
//! between runs: strings are quoted with Rust escapes, numbers use `Display`,
//! byte strings render as `b"..."` with ASCII escapes.

use crate::value::{Key, Value};

/// Types that can be written to a call log
pub trait Record {
    /// Stable textual form
    fn record(&self) -> String;
}

/// Render a list of already-recorded arguments as a tuple: `()`, `(a,)`, `(a, b)`
pub fn render_args(parts: &[String]) -> String {
    match parts {
        [] => "()".to_string(),
        [one] => format!("({},)", one),
        many => format!("({})", many.join(", ")),
    }
}

impl Record for str {
    fn record(&self) -> String {
        format!("{:?}", self)
    }
}

impl Record for String {
    fn record(&self) -> String {
        self.as_str().record()
    }
}

impl Record for [u8] {
    fn record(&self) -> String {
        format!("b\"{}\"", self.escape_ascii())
    }
}

impl Record for Vec<u8> {
    fn record(&self) -> String {
        self.as_slice().record()
    }
}

impl Record for Value {
    fn record(&self) -> String {
        match self {
            Value::Text(s) => s.record(),
            Value::Bytes(b) => b.record(),
            Value::Int(i) => i.record(),
            Value::Float(f) => f.record(),
        }
    }
}

impl Record for Key {
    fn record(&self) -> String {
        self.to_string()
    }
}

impl<T: Record + ?Sized> Record for &T {
    fn record(&self) -> String {
        (**self).record()
    }
}

impl<T: Record> Record for Option<T> {
    fn record(&self) -> String {
        match self {
            Some(v) => v.record(),
            None => "None".to_string(),
        }
    }
}

macro_rules! record_display {
    ($($t:ty),*) => {
        $(impl Record for $t {
            fn record(&self) -> String {
                self.to_string()
            }
        })*
    };
}

record_display!(bool, char, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64);

impl Record for () {
    fn record(&self) -> String {
        render_args(&[])
    }
}

macro_rules! record_tuple {
    ($($name:ident),+) => {
        impl<$($name: Record),+> Record for ($($name,)+) {
            #[allow(non_snake_case)]
            fn record(&self) -> String {
                let ($($name,)+) = self;
                render_args(&[$($name.record()),+])
            }
        }
    };
}

record_tuple!(A);
record_tuple!(A, B);
record_tuple!(A, B, C);
record_tuple!(A, B, C, D);
record_tuple!(A, B, C, D, E);
