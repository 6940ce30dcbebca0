//! Built-in legacy route table.
//!
//! Three buckets, merged in order: routes published by the core module under
//! `old/v1`, routes published by the social module under `old-social/v1`, and
//! routes that already moved into the canonical namespace but were renamed.
//! Canonical paths are relative; they are qualified with whatever canonical
//! namespace is configured.

/// One static migration entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MigrationEntry {
    /// `None` means the canonical namespace itself.
    pub legacy_namespace: Option<&'static str>,
    pub legacy_path: &'static str,
    pub canonical_path: &'static str,
}

const fn entry(
    legacy_namespace: Option<&'static str>,
    legacy_path: &'static str,
    canonical_path: &'static str,
) -> MigrationEntry {
    MigrationEntry {
        legacy_namespace,
        legacy_path,
        canonical_path,
    }
}

pub const CORE_MODULE: &[MigrationEntry] = &[
    entry(Some("old/v1"), "events", "events"),
    entry(Some("old/v1"), "events/{id}", "events/{id}"),
    entry(Some("old/v1"), "events/{id}/rsvps", "events/{id}/rsvps"),
    entry(Some("old/v1"), "communities", "communities"),
    entry(Some("old/v1"), "communities/{id}", "communities/{id}"),
    entry(Some("old/v1"), "communities/{id}/members", "communities/{id}/members"),
    entry(Some("old/v1"), "conversations", "conversations"),
    entry(Some("old/v1"), "conversations/{id}", "conversations/{id}"),
    entry(Some("old/v1"), "conversations/{id}/replies", "conversations/{id}/replies"),
];

pub const SECONDARY_MODULE: &[MigrationEntry] = &[
    entry(Some("old-social/v1"), "feed", "social/feed"),
    entry(Some("old-social/v1"), "follows", "social/follows"),
    entry(Some("old-social/v1"), "follows/{user_id}", "social/follows/{user_id}"),
    entry(Some("old-social/v1"), "reports", "moderation/reports"),
    entry(Some("old-social/v1"), "reports/{id}", "moderation/reports/{id}"),
];

pub const UNIFIED: &[MigrationEntry] = &[
    entry(None, "event-list", "events"),
    entry(None, "event/{id}", "events/{id}"),
    entry(None, "community/{id}", "communities/{id}"),
];

/// All buckets in merge order.
pub fn builtin() -> impl Iterator<Item = &'static MigrationEntry> {
    CORE_MODULE
        .iter()
        .chain(SECONDARY_MODULE.iter())
        .chain(UNIFIED.iter())
}
