//! Range-batch engine.
//!
//! # Responsibility
//! - Locate and process maximal contiguous runs in ordered sequences.
//! - Insert pre-sorted batches with one bulk insert per insertion point.
//!
//! # Invariants
//! - Every algorithm is O(n + m) and never revisits an index.
//! - No element is dropped or duplicated across runs.
//! - Callers pre-sort `incoming`/`events` by the destination's order.

use std::cell::Cell;
use std::ops::Range;

/// Verdict of a run predicate for one element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMatch {
    /// Element belongs to the current run.
    Match,
    /// Element ends (or precedes) a run.
    Skip,
    /// No further matches exist; stop scanning.
    Stop,
}

/// Finds the first maximal run of matching elements at or after `start`.
///
/// The predicate is called at most once per element, front to back. Returns
/// `len..len` when nothing matched before the end or a `Stop`.
pub fn find_run<T, P>(seq: &[T], start: usize, mut predicate: P) -> Range<usize>
where
    P: FnMut(&T) -> RunMatch,
{
    let len = seq.len();
    let mut i = start;
    while i < len {
        match predicate(&seq[i]) {
            RunMatch::Match => {
                let mut j = i + 1;
                while j < len && predicate(&seq[j]) == RunMatch::Match {
                    j += 1;
                }
                return i..j;
            }
            RunMatch::Skip => i += 1,
            RunMatch::Stop => break,
        }
    }
    len..len
}

/// Calls `action` once per maximal run of matching elements.
///
/// `action` may mutate the sequence and returns the change in length it
/// caused (negative for removals). Scanning resumes after the run, skipping
/// the element that ended it, since that one already tested negative.
pub fn process_runs<T, P, A>(seq: &mut Vec<T>, mut predicate: P, mut action: A)
where
    P: FnMut(&T) -> RunMatch,
    A: FnMut(&mut Vec<T>, Range<usize>) -> isize,
{
    let mut start = 0usize;
    loop {
        let run = find_run(seq.as_slice(), start, &mut predicate);
        if run.start >= seq.len() {
            break;
        }
        let end = run.end;
        let delta = action(seq, run);
        let resumed = end as isize + delta;
        start = resumed.max(0) as usize + 1;
    }
}

/// Lock-step variant of [`process_runs`] against an aligned event list.
///
/// Every element of `events` must match some element of `seq`, in the same
/// order. Contiguous matches are grouped; `action` receives the sequence, the
/// run in `seq` and the slice of events matched by that run.
pub fn zip_process_runs<T, E, M, A>(seq: &mut Vec<T>, events: &[E], mut matches: M, mut action: A)
where
    M: FnMut(&T, &E) -> bool,
    A: FnMut(&mut Vec<T>, Range<usize>, &[E]) -> isize,
{
    let consumed = Cell::new(0usize);
    let mut run_first_event = 0usize;
    process_runs(
        seq,
        |element| {
            let next = consumed.get();
            if next >= events.len() {
                return RunMatch::Stop;
            }
            if !matches(element, &events[next]) {
                return RunMatch::Skip;
            }
            consumed.set(next + 1);
            RunMatch::Match
        },
        |seq, run| {
            let matched = &events[run_first_event..consumed.get()];
            run_first_event = consumed.get();
            action(seq, run, matched)
        },
    );
}

/// Inserts pre-sorted `incoming` into sorted `dest` in batches.
///
/// `before(new, existing)` answers "insert `new` in front of `existing`".
/// `insert(dest, index, batch)` performs one bulk insert of a contiguous
/// slice of `incoming` at `index` and must grow `dest` by `batch.len()`.
pub fn insert_batches<T, U, B, I>(dest: &mut Vec<T>, incoming: &[U], mut before: B, mut insert: I)
where
    B: FnMut(&U, &T) -> bool,
    I: FnMut(&mut Vec<T>, usize, &[U]),
{
    let mut idx = 0usize;
    let mut i = 0usize;
    while i < incoming.len() {
        while idx < dest.len() && !before(&incoming[i], &dest[idx]) {
            idx += 1;
        }

        let j = if idx == dest.len() {
            incoming.len()
        } else {
            let mut j = i + 1;
            while j < incoming.len() && before(&incoming[j], &dest[idx]) {
                j += 1;
            }
            j
        };

        insert(dest, idx, &incoming[i..j]);

        // The element we compared against now sits after the batch and is
        // known not to follow any later incoming element.
        idx += j - i + 1;
        i = j;
    }
}

/// Contiguous runs of `true` in a change mask.
pub fn changed_runs(mask: &[bool]) -> Vec<Range<usize>> {
    let mut runs = Vec::new();
    let mut start = 0usize;
    loop {
        let run = find_run(mask, start, |changed| {
            if *changed {
                RunMatch::Match
            } else {
                RunMatch::Skip
            }
        });
        if run.start >= mask.len() {
            break;
        }
        start = run.end + 1;
        runs.push(run);
    }
    runs
}

/// Partitions `items` into consecutive batches sharing one key.
///
/// Items are stably sorted by key first, so the order inside a batch is the
/// input order.
pub fn group_by<T, K, F>(items: &[T], mut key: F) -> Vec<(K, Vec<T>)>
where
    T: Clone,
    K: Ord + Clone,
    F: FnMut(&T) -> K,
{
    let mut keyed: Vec<(K, T)> = items
        .iter()
        .map(|item| (key(item), item.clone()))
        .collect();
    keyed.sort_by(|a, b| a.0.cmp(&b.0));

    let mut groups: Vec<(K, Vec<T>)> = Vec::new();
    for (k, item) in keyed {
        match groups.last_mut() {
            Some((last, batch)) if *last == k => batch.push(item),
            _ => groups.push((k, vec![item])),
        }
    }
    groups
}
