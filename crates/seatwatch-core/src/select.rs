use crate::locator::{self, FieldSelector};
use crate::matcher;
use crate::probe::{Probe, SelectOption};
use std::time::Duration;

/// Input to one cascading selection: where to look and what to pick.
#[derive(Debug, Clone)]
pub struct SelectionTarget {
    pub field: FieldSelector,
    pub desired_label: String,
}

impl SelectionTarget {
    pub fn new(field: FieldSelector, desired_label: impl Into<String>) -> Self {
        Self {
            field,
            desired_label: desired_label.into(),
        }
    }
}

/// Outcome of driving one dropdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectOutcome {
    /// The value was applied and the control still reports the desired
    /// selection.
    Confirmed,
    /// The page reacted, likely with a reload, before the selection could be
    /// read back. Counts as success only after the caller settles and
    /// re-confirms the control state.
    LikelyNavigated,
    /// No control ever offered a matching option.
    NotFound,
}

/// Drives one dependent dropdown to a desired value.
///
/// Works through the field's locator chain with bounded retries and an
/// increasing backoff between attempts; the last chain entry is expected to
/// be the full-page scan. Settling after the page's reaction is the caller's
/// job: this component cannot know whether a given field triggers a full
/// reload or a targeted refresh.
pub struct CascadingSelector {
    max_attempts: usize,
    backoff: Duration,
}

impl CascadingSelector {
    pub fn new(max_attempts: usize, backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }

    pub async fn select<P: Probe>(&self, probe: &P, target: &SelectionTarget) -> SelectOutcome {
        for attempt in 1..=self.max_attempts {
            if let Some(outcome) = self.try_once(probe, target).await {
                return outcome;
            }
            if attempt < self.max_attempts {
                let backoff = self.backoff * attempt as u32;
                tracing::debug!(
                    "No match for '{}' in {} (attempt {}/{}), backing off {:?}",
                    target.desired_label,
                    target.field.name,
                    attempt,
                    self.max_attempts,
                    backoff
                );
                probe.pause(backoff).await;
            }
        }

        tracing::warn!(
            "Giving up on {}: no option matched '{}' after {} attempts",
            target.field.name,
            target.desired_label,
            self.max_attempts
        );
        SelectOutcome::NotFound
    }

    /// One pass over the locator chain. `None` means nothing matched and the
    /// attempt should be retried after a backoff.
    async fn try_once<P: Probe>(
        &self,
        probe: &P,
        target: &SelectionTarget,
    ) -> Option<SelectOutcome> {
        for loc in &target.field.locators {
            let candidates = locator::resolve(probe, loc).await;
            for handle in &candidates {
                let options = match probe.read_options(handle).await {
                    Ok(options) => options,
                    Err(e) => {
                        tracing::debug!("Candidate in {} unreadable: {}", target.field.name, e);
                        continue;
                    }
                };
                if options.is_empty() {
                    continue;
                }

                let Some(chosen) = matcher::best_match(&options, &target.desired_label) else {
                    if loc.is_scan() {
                        let labels: Vec<&str> = options.iter().map(|o| o.label.as_str()).collect();
                        tracing::warn!(
                            "Scanned select had no match for '{}' in {}; options: {:?}",
                            target.desired_label,
                            target.field.name,
                            labels
                        );
                    }
                    continue;
                };
                let chosen = chosen.clone();

                if let Some(outcome) = self.apply(probe, handle, &chosen, &target.field.name).await
                {
                    return Some(outcome);
                }
            }
        }
        None
    }

    /// Apply a matched option to a control. `None` means this candidate
    /// failed without deciding the selection (value not applied, or the
    /// control no longer reports the chosen label).
    async fn apply<P: Probe>(
        &self,
        probe: &P,
        handle: &P::Handle,
        chosen: &SelectOption,
        field: &str,
    ) -> Option<SelectOutcome> {
        tracing::info!("Selecting '{}' in {}", chosen.label, field);

        if let Err(e) = probe.set_value(handle, &chosen.value).await {
            tracing::debug!("Value not applied in {}: {}", field, e);
            return None;
        }

        // A page that reloads on change destroys the script context before
        // the dispatch returns; that reaction is the expected success signal.
        if let Err(e) = probe.dispatch_event(handle, "change").await {
            tracing::info!(
                "Change dispatch failed in {} (page likely reloading): {}",
                field,
                e
            );
            return Some(SelectOutcome::LikelyNavigated);
        }

        match probe.selected_label(handle).await {
            Ok(Some(label)) if same_label(&label, &chosen.label) => {
                Some(SelectOutcome::Confirmed)
            }
            Ok(label) => {
                tracing::debug!(
                    "{} reports {:?} after selecting '{}'",
                    field,
                    label,
                    chosen.label
                );
                None
            }
            Err(e) => {
                tracing::info!(
                    "Read-back failed in {} (page likely reloading): {}",
                    field,
                    e
                );
                Some(SelectOutcome::LikelyNavigated)
            }
        }
    }
}

fn same_label(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}
