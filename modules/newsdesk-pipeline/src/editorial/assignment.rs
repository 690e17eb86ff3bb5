use chrono::{DateTime, Duration, Utc};
use newsdesk_common::{Article, Editor, SlaPolicy};
use uuid::Uuid;

use crate::store::WorkloadDelta;

/// Pick the reviewer for an article in `category`.
///
/// A still-active `preferred` editor keeps the article (re-review after a
/// redraft). Otherwise active specialists win over general editors, and the
/// lowest open workload wins inside the chosen pool.
pub fn select_editor<'a>(
    editors: &'a [Editor],
    category: &str,
    preferred: Option<Uuid>,
) -> Option<&'a Editor> {
    if let Some(id) = preferred {
        if let Some(editor) = editors.iter().find(|e| e.id == id && e.active) {
            return Some(editor);
        }
    }

    let specialists: Vec<&Editor> = editors
        .iter()
        .filter(|e| e.active && e.specializes_in(category))
        .collect();
    let pool = if specialists.is_empty() {
        editors.iter().filter(|e| e.active && e.general).collect()
    } else {
        specialists
    };

    pool.into_iter().min_by(|a, b| {
        a.open_workload
            .cmp(&b.open_workload)
            .then_with(|| a.name.cmp(&b.name))
            .then_with(|| a.id.cmp(&b.id))
    })
}

pub fn review_deadline(sla: &SlaPolicy, category: &str, now: DateTime<Utc>) -> DateTime<Utc> {
    now + Duration::hours(sla.hours_for(category))
}

/// Workload counter changes implied by moving from `before` to `after`.
pub fn workload_changes(before: &Article, after: &Article) -> Vec<WorkloadDelta> {
    let held_before = before
        .assigned_editor
        .filter(|_| before.status.counts_toward_workload());
    let held_after = after
        .assigned_editor
        .filter(|_| after.status.counts_toward_workload());

    if held_before == held_after {
        return Vec::new();
    }

    let mut out = Vec::new();
    if let Some(editor_id) = held_before {
        out.push(WorkloadDelta { editor_id, delta: -1 });
    }
    if let Some(editor_id) = held_after {
        out.push(WorkloadDelta { editor_id, delta: 1 });
    }
    out
}
