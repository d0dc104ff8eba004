// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[yare::parameterized(
    pending   = { JobStatus::Pending,   false },
    running   = { JobStatus::Running,   false },
    succeeded = { JobStatus::Succeeded, true },
    failed    = { JobStatus::Failed,    true },
    cancelled = { JobStatus::Cancelled, true },
)]
fn terminal_job_statuses(status: JobStatus, expected: bool) {
    assert_eq!(status.is_terminal(), expected);
}

#[test]
fn info_maps_serialize_as_plain_objects() {
    let dialog = DialogInfo::new().with("threshold", 2.5).with("basin", "Elkhorn");
    assert_eq!(dialog.get("basin"), Some(&Value::from("Elkhorn")));
    assert_eq!(
        serde_json::to_value(&dialog).unwrap(),
        serde_json::json!({ "basin": "Elkhorn", "threshold": 2.5 })
    );
}
