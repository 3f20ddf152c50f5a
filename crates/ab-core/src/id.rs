use lasso::{Spur, ThreadedRodeo};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;
use std::sync::atomic::{AtomicU64, Ordering};

/// Global interner for entity ids shared by artboards, widgets and components.
static INTERNER: LazyLock<ThreadedRodeo> = LazyLock::new(ThreadedRodeo::default);

/// Suffix source for generated ids.
static NEXT_SUFFIX: AtomicU64 = AtomicU64::new(0);

/// Stable identity of an entity on the canvas.
///
/// Interned, so it is `Copy` and compares in O(1). Siblings passed to the
/// alignment and collision queries are tagged with it. On the wire it is the
/// plain name string.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct EntityId(Spur);

impl EntityId {
    /// Intern `s`, returning the existing id if it was seen before.
    pub fn intern(s: &str) -> Self {
        EntityId(INTERNER.get_or_intern(s))
    }

    pub fn as_str(&self) -> &str {
        INTERNER.resolve(&self.0)
    }

    /// Whether `name` has been interned, by the host or by a generator.
    pub fn is_taken(name: &str) -> bool {
        INTERNER.contains(name)
    }

    /// Generate a fresh id with a kind prefix (`artboard_3`, `component_12`),
    /// skipping names the host already registered.
    pub fn with_prefix(prefix: &str) -> Self {
        loop {
            let name = format!("{prefix}_{}", NEXT_SUFFIX.fetch_add(1, Ordering::Relaxed));
            if !Self::is_taken(&name) {
                return Self::intern(&name);
            }
        }
    }
}

impl From<String> for EntityId {
    fn from(name: String) -> Self {
        Self::intern(&name)
    }
}

impl From<EntityId> for String {
    fn from(id: EntityId) -> Self {
        id.as_str().to_owned()
    }
}

/// Debug names the type so ids stand out inside larger `{:?}` dumps.
impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("EntityId").field(&self.as_str()).finish()
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}
