use crate::models::FacilityRecord;

/// Format a facility's postal address as display lines
///
/// Street lines come first, each only when present and non-empty, followed by
/// a single "city, state" line when either part is present.
pub fn format_address(record: &FacilityRecord) -> Vec<String> {
    let mut lines: Vec<String> = [&record.address1, &record.address2, &record.address3]
        .into_iter()
        .filter_map(present)
        .map(str::to_string)
        .collect();

    let city_state: Vec<&str> = [&record.city, &record.state]
        .into_iter()
        .filter_map(present)
        .collect();

    if !city_state.is_empty() {
        lines.push(city_state.join(", "));
    }

    lines
}

fn present(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|s| !s.is_empty())
}
