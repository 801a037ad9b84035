use crate::probe::SelectOption;

/// Find the option best matching a desired visible label.
///
/// Both sides are normalized (trimmed, lowercased). The first pass returns
/// the first option whose label contains the desired text as a substring;
/// only when no label contains it does a second pass look for exact equality
/// after normalization. When several labels contain the desired text, the
/// FIRST in list order wins. That tie-break is deliberate and part of the
/// contract: callers rely on it being deterministic for a given option list,
/// and option lists on the target form are ordered stably by the server.
pub fn best_match<'a>(options: &'a [SelectOption], desired: &str) -> Option<&'a SelectOption> {
    let desired = normalize(desired);
    if desired.is_empty() {
        return None;
    }

    if let Some(option) = options.iter().find(|o| normalize(&o.label).contains(&desired)) {
        return Some(option);
    }

    options.iter().find(|o| normalize(&o.label) == desired)
}

fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}
