use lasso::{Spur, ThreadedRodeo};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::LazyLock;
use std::sync::atomic::{AtomicU64, Ordering};

/// Global string interner shared by page and widget ids.
static INTERNER: LazyLock<ThreadedRodeo> = LazyLock::new(ThreadedRodeo::default);

static COUNTER: AtomicU64 = AtomicU64::new(0);

/// Produce a fresh `{prefix}_{n}` string that has never been interned.
///
/// Ids loaded from a saved project are interned on deserialization, so
/// skipping already-known strings keeps generated ids unique within the
/// process even after a load.
fn fresh_key(prefix: &str) -> Spur {
    loop {
        let n = COUNTER.fetch_add(1, Ordering::Relaxed);
        let candidate = format!("{prefix}_{n}");
        if INTERNER.get(&candidate).is_none() {
            return INTERNER.get_or_intern(candidate);
        }
    }
}

macro_rules! interned_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(Spur);

        impl $name {
            /// Intern a string as an id, or return the existing one.
            pub fn intern(s: &str) -> Self {
                Self(INTERNER.get_or_intern(s))
            }

            /// Resolve back to a string slice.
            pub fn as_str(&self) -> &'static str {
                INTERNER.resolve(&self.0)
            }

            /// Generate an id that is unique within this process.
            pub fn generate() -> Self {
                Self(fresh_key($prefix))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.as_str())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                Ok(Self::intern(&s))
            }
        }
    };
}

interned_id!(
    /// Identity of a page. 4 bytes, `Copy`, O(1) equality.
    PageId,
    "page"
);

interned_id!(
    /// Identity of a widget; doubles as the external tag on canvas objects.
    WidgetId,
    "widget"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_roundtrip() {
        let a = WidgetId::intern("title_box");
        let b = WidgetId::intern("title_box");
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "title_box");
    }

    #[test]
    fn generated_ids_are_unique() {
        let a = PageId::generate();
        let b = PageId::generate();
        assert_ne!(a, b);
        assert!(a.as_str().starts_with("page_"));
    }

    #[test]
    fn generated_ids_skip_loaded_ones() {
        // Simulate a loaded project that already uses the next counter values.
        let next = COUNTER.load(Ordering::Relaxed);
        for n in next..next + 3 {
            WidgetId::intern(&format!("widget_{n}"));
        }
        let fresh = WidgetId::generate();
        let n: u64 = fresh.as_str()["widget_".len()..].parse().unwrap();
        assert!(n >= next + 3);
    }
}
