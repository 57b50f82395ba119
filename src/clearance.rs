use crate::models::{ClearanceRecord, ClearanceStatus, Department};

/// Reduces department decisions on one request to an overall status.
///
/// Any rejection wins; otherwise the request is approved only when every
/// record is approved. No records means nothing has been decided yet.
pub fn aggregate<'a, I>(records: I) -> ClearanceStatus
where
    I: IntoIterator<Item = &'a ClearanceRecord>,
{
    let mut seen_any = false;
    let mut all_approved = true;

    for record in records {
        seen_any = true;
        match record.status {
            ClearanceStatus::Rejected => return ClearanceStatus::Rejected,
            ClearanceStatus::Approved => {}
            ClearanceStatus::Pending => all_approved = false,
        }
    }

    if seen_any && all_approved {
        ClearanceStatus::Approved
    } else {
        ClearanceStatus::Pending
    }
}

/// Like [`aggregate`], but a required department that has not responded
/// at all keeps the request pending.
pub fn aggregate_required(records: &[ClearanceRecord], required: &[Department]) -> ClearanceStatus {
    match aggregate(records) {
        ClearanceStatus::Approved if !missing_departments(records, required).is_empty() => {
            ClearanceStatus::Pending
        }
        status => status,
    }
}

fn missing_departments(records: &[ClearanceRecord], required: &[Department]) -> Vec<Department> {
    required
        .iter()
        .copied()
        .filter(|department| !records.iter().any(|r| r.department == *department))
        .collect()
}

/// Required departments that have not yet approved, either because their
/// record is pending or rejected or because they have no record.
pub fn outstanding_departments(
    records: &[ClearanceRecord],
    required: &[Department],
) -> Vec<(Department, ClearanceStatus)> {
    required
        .iter()
        .copied()
        .filter_map(|department| {
            let status = aggregate(records.iter().filter(|r| r.department == department));
            (status != ClearanceStatus::Approved).then_some((department, status))
        })
        .collect()
}
