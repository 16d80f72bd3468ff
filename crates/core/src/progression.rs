//! Module progression state machine.
//!
//! Everything here is pure: callers load stored progress, hand it in, and
//! persist whatever comes back.

use crate::model::{Module, ModuleDraft, ModuleStatus};

//
// ─── RECONCILIATION ────────────────────────────────────────────────────────────
//

/// Decision between previously stored progress and a fresh start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconciliation {
    /// Stored progress matches the course shape and wins over any draft status.
    UseStored(Vec<Module>),
    /// Nothing usable was stored; initialize from the drafts.
    UseFresh,
}

/// Decide whether stored progress can be adopted for the given drafts.
///
/// Stored progress is trusted verbatim when its length equals the number of
/// drafts. Any other case, including a missing snapshot, starts fresh.
#[must_use]
pub fn reconcile(stored: Option<Vec<Module>>, drafts: &[ModuleDraft]) -> Reconciliation {
    match stored {
        Some(modules) if modules.len() == drafts.len() => Reconciliation::UseStored(modules),
        _ => Reconciliation::UseFresh,
    }
}

/// Build the starting status list for a course.
///
/// A status supplied by the course source is honored unless it is
/// `Completed`. Modules without one start as `Current` (first) or `Locked`.
/// Afterwards exactly one module is `Current`: the first one that claims it,
/// or the first module if none does.
#[must_use]
pub fn fresh_modules(drafts: &[ModuleDraft]) -> Vec<Module> {
    let mut modules: Vec<Module> = drafts
        .iter()
        .enumerate()
        .map(|(index, draft)| {
            let status = match draft.status {
                Some(ModuleStatus::Completed) | None => {
                    if index == 0 {
                        ModuleStatus::Current
                    } else {
                        ModuleStatus::Locked
                    }
                }
                Some(status) => status,
            };
            draft.clone().into_module(status)
        })
        .collect();

    let mut seen_current = false;
    for module in &mut modules {
        if module.status == ModuleStatus::Current {
            if seen_current {
                module.status = ModuleStatus::Locked;
            }
            seen_current = true;
        }
    }
    if !seen_current {
        if let Some(first) = modules.first_mut() {
            first.status = ModuleStatus::Current;
        }
    }

    modules
}

/// Reconcile and fall back to a fresh start when stored progress is unusable.
///
/// # Examples
///
/// ```
/// # use pathway_core::model::{ModuleDraft, ModuleStatus};
/// # use pathway_core::progression::initialize;
/// let drafts = vec![
///     ModuleDraft::new(1, "Intro", "Week 1"),
///     ModuleDraft::new(2, "Core", "Week 2"),
/// ];
/// let modules = initialize(&drafts, None);
/// assert_eq!(modules[0].status, ModuleStatus::Current);
/// assert_eq!(modules[1].status, ModuleStatus::Locked);
/// ```
#[must_use]
pub fn initialize(drafts: &[ModuleDraft], stored: Option<Vec<Module>>) -> Vec<Module> {
    match reconcile(stored, drafts) {
        Reconciliation::UseStored(modules) => modules,
        Reconciliation::UseFresh => fresh_modules(drafts),
    }
}

/// True when the live list no longer matches the course shape.
#[must_use]
pub fn needs_resync(live: &[Module], drafts: &[ModuleDraft]) -> bool {
    live.len() != drafts.len()
}

/// Discard live progress and start the new module list from scratch.
///
/// Completion progress is not carried over.
#[must_use]
pub fn resynchronize(drafts: &[ModuleDraft]) -> Vec<Module> {
    fresh_modules(drafts)
}

//
// ─── TRANSITIONS ───────────────────────────────────────────────────────────────
//

/// Why a completion request left the list untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    OutOfRange { index: usize, len: usize },
    Locked,
    AlreadyCompleted,
}

/// Result of a completion request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Advanced {
        completed: usize,
        unlocked: Option<usize>,
    },
    Ignored(IgnoreReason),
}

impl Transition {
    #[must_use]
    pub fn is_advanced(&self) -> bool {
        matches!(self, Self::Advanced { .. })
    }
}

/// Mark the `Current` module at `index` as completed and unlock the next one.
///
/// Requests against a locked, completed, or missing module are ignored.
pub fn complete_module(modules: &mut [Module], index: usize) -> Transition {
    let len = modules.len();
    let Some(module) = modules.get_mut(index) else {
        return Transition::Ignored(IgnoreReason::OutOfRange { index, len });
    };

    match module.status {
        ModuleStatus::Locked => return Transition::Ignored(IgnoreReason::Locked),
        ModuleStatus::Completed => return Transition::Ignored(IgnoreReason::AlreadyCompleted),
        ModuleStatus::Current => module.status = ModuleStatus::Completed,
    }

    let unlocked = match modules.get_mut(index + 1) {
        Some(next) if next.status == ModuleStatus::Locked => {
            next.status = ModuleStatus::Current;
            Some(index + 1)
        }
        _ => None,
    };

    Transition::Advanced {
        completed: index,
        unlocked,
    }
}

//
// ─── SUMMARY ───────────────────────────────────────────────────────────────────
//

/// Read-only overview of a status list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathSummary {
    pub total: usize,
    pub completed: usize,
    pub current: Option<usize>,
}

impl PathSummary {
    #[must_use]
    pub fn of(modules: &[Module]) -> Self {
        Self {
            total: modules.len(),
            completed: modules
                .iter()
                .filter(|m| m.status == ModuleStatus::Completed)
                .count(),
            current: modules
                .iter()
                .position(|m| m.status == ModuleStatus::Current),
        }
    }

    /// All modules completed. An empty course is never finished.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.total > 0 && self.completed == self.total
    }

    /// Whole-number completion percentage.
    #[must_use]
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 0;
        }
        let pct = self.completed * 100 / self.total;
        u8::try_from(pct).unwrap_or(100)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
