//! Sources of row identities for the compiled form.

use std::sync::atomic::{AtomicU64, Ordering};

use uuid::Uuid;

/// Hands out ids that are unique for as long as the source lives. Shared
/// across threads, so implementations must be safe for concurrent use.
pub trait IdSource: Send + Sync {
    fn next_id(&self) -> String;
}

/// Time-ordered UUIDv7 ids. The default.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidV7Ids;

impl IdSource for UuidV7Ids {
    fn next_id(&self) -> String {
        Uuid::now_v7().to_string()
    }
}

/// Random UUIDv4 ids.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidV4Ids;

impl IdSource for UuidV4Ids {
    fn next_id(&self) -> String {
        Uuid::new_v4().to_string()
    }
}

/// `id-1`, `id-2`, ... Deterministic; meant for tests and fixtures.
#[derive(Debug, Default)]
pub struct SequentialIds {
    next: AtomicU64,
}

impl SequentialIds {
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdSource for SequentialIds {
    fn next_id(&self) -> String {
        let n = self.next.fetch_add(1, Ordering::Relaxed) + 1;
        format!("id-{n}")
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::thread;

    use super::*;

    #[test]
    fn sequential_ids_count_up() {
        let ids = SequentialIds::new();
        assert_eq!(ids.next_id(), "id-1");
        assert_eq!(ids.next_id(), "id-2");
    }

    #[test]
    fn uuid_ids_are_distinct() {
        let a = UuidV7Ids.next_id();
        let b = UuidV7Ids.next_id();
        assert_ne!(a, b);
        assert_eq!(Uuid::parse_str(&a).unwrap().get_version_num(), 7);
        assert_eq!(Uuid::parse_str(&UuidV4Ids.next_id()).unwrap().get_version_num(), 4);
    }

    #[test]
    fn shared_source_is_unique_across_threads() {
        let ids = Arc::new(SequentialIds::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let ids = Arc::clone(&ids);
                thread::spawn(move || (0..100).map(|_| ids.next_id()).collect::<Vec<_>>())
            })
            .collect();
        let all: HashSet<String> = handles.into_iter().flat_map(|h| h.join().unwrap()).collect();
        assert_eq!(all.len(), 400);
    }
}
