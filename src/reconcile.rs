use crate::domain::{DetectionResult, LifeEvent};

/// Narrows the event list for display once a bank-statement detection is known.
///
/// Without a detection the list is returned as-is. With one, at most a single
/// event of the detected type survives:
/// - an event of that type whose detailed explanation contains the detection
///   reasoning wins outright and is the only event returned;
/// - otherwise every other-typed event is kept and the most recent
///   auto-detected event of the detected type is appended. Equal dates keep
///   the earliest one in list order.
///
/// Borrows only; the underlying list is never modified.
pub fn reconcile_events<'a>(
    events: &'a [LifeEvent],
    detection: Option<&DetectionResult>,
) -> Vec<&'a LifeEvent> {
    let Some(detection) = detection else {
        return events.iter().collect();
    };
    let detected = &detection.event_type;

    let authoritative = events.iter().find(|ev| {
        &ev.event_type == detected
            && ev
                .detailed_explanation
                .as_deref()
                .is_some_and(|text| text.contains(detection.reasoning.as_str()))
    });
    if let Some(ev) = authoritative {
        return vec![ev];
    }

    let latest = events
        .iter()
        .filter(|ev| &ev.event_type == detected && !ev.is_manually_added)
        .fold(None::<&LifeEvent>, |best, ev| match best {
            Some(b) if b.detected_date >= ev.detected_date => Some(b),
            _ => Some(ev),
        });

    events
        .iter()
        .filter(|ev| &ev.event_type != detected)
        .chain(latest)
        .collect()
}
