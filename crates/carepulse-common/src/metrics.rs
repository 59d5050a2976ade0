//! Well-known metric names published by the dashboard's metrics source.
//!
//! Rules may reference any string key; these constants only cover the
//! metrics the default rule set watches.

/// Average emergency department wait time, in minutes.
pub const AVG_WAIT_TIME: &str = "avgWaitTime";

/// Inpatient bed utilization, in percent.
pub const BED_UTILIZATION: &str = "bedUtilization";

/// Clinical staff currently on duty.
pub const STAFF_ON_DUTY: &str = "staffOnDuty";

/// Emergency room occupancy, in percent.
pub const ER_OCCUPANCY: &str = "erOccupancy";

/// Patient satisfaction score, 0-100.
pub const PATIENT_SATISFACTION: &str = "patientSatisfaction";

pub const ALL: &[&str] = &[
    AVG_WAIT_TIME,
    BED_UTILIZATION,
    STAFF_ON_DUTY,
    ER_OCCUPANCY,
    PATIENT_SATISFACTION,
];
