use blender_core::{BackendFailure, BackendOutcome, BackendSlot, BackendsConfig, ErrorTag, PARTIAL_FAILURE, SOURCES_TOKEN};

const SLOTS: [BackendSlot; 2] = [BackendSlot::Primary, BackendSlot::Secondary];

fn outcome<'a>(slot: BackendSlot, primary: &'a BackendOutcome, secondary: &'a BackendOutcome) -> &'a BackendOutcome {
    match slot {
        BackendSlot::Primary => primary,
        BackendSlot::Secondary => secondary,
    }
}

/// User-facing warnings for a blend.
///
/// Errors reported by a successful backend are kept, labelled with that
/// backend and de-duplicated. A partial-failure tag naming the affected
/// backends is added when exactly one backend failed and the other answered,
/// or when both answered with errors. Nothing is tagged when both failed.
pub fn collect_errors(
    primary: &BackendOutcome,
    secondary: &BackendOutcome,
    backends: &BackendsConfig,
) -> Vec<ErrorTag> {
    let mut tags: Vec<ErrorTag> = Vec::new();
    for slot in SLOTS {
        let Some(result) = outcome(slot, primary, secondary).result() else {
            continue;
        };
        let label = backends.info(slot).display_name();
        for message in &result.errors {
            let tag = ErrorTag::new(message.as_str()).with_details(label);
            if !tags.contains(&tag) {
                tags.push(tag);
            }
        }
    }

    let failed: Vec<BackendSlot> = SLOTS
        .into_iter()
        .filter(|slot| outcome(*slot, primary, secondary).is_failed())
        .collect();
    let with_errors: Vec<BackendSlot> = SLOTS
        .into_iter()
        .filter(|slot| outcome(*slot, primary, secondary).result().is_some_and(|r| !r.errors.is_empty()))
        .collect();

    let affected = match (failed.as_slice(), primary.result().is_some() || secondary.result().is_some()) {
        ([single], true) => vec![*single],
        ([], _) if with_errors.len() == 2 => with_errors,
        _ => Vec::new(),
    };
    if !affected.is_empty() {
        let sources = affected
            .iter()
            .map(|slot| backends.info(*slot).display_name())
            .collect::<Vec<_>>()
            .join(", ");
        tags.push(ErrorTag::new(PARTIAL_FAILURE).with_token(SOURCES_TOKEN, sources));
    }
    tags
}

/// Typed record of every backend call that failed outright.
pub fn collect_failures(primary: &BackendOutcome, secondary: &BackendOutcome) -> Vec<BackendFailure> {
    SLOTS
        .into_iter()
        .filter_map(|slot| {
            outcome(slot, primary, secondary)
                .error()
                .map(|error| BackendFailure { backend: slot, error: error.clone() })
        })
        .collect()
}
