pub mod checklist;
pub mod collaborators;
pub mod completion;
pub mod config;
pub mod conformance;
pub mod holdpoint;
pub mod lot;
pub mod snapshot;

pub use checklist::{ChecklistItem, ChecklistTemplate, PointType, ResponsibleParty, EVIDENCE_TEST};
pub use collaborators::{
    NcrRecord, NcrStatus, Notification, NotificationType, TestOutcome, TestResultRecord,
    TestVerification,
};
pub use completion::{Completion, CompletionOutcome, CompletionStatus, VerifyDecision};
pub use config::{LookAhead, ProjectConfig, WorkingHoursConfig};
pub use conformance::{ConformanceReport, ItpProgress, Prerequisite};
pub use holdpoint::{
    digest_secret, generate_secret, AlertSeverity, HoldPoint, HoldPointStatus, ReleaseChannel,
    ReleaseForm, ReleaseTokenRecord,
};
pub use lot::{Lot, LotStatus, WorkInstance};
pub use snapshot::ChecklistSnapshot;
