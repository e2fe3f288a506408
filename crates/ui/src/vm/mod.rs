mod edit_vm;
mod exam_vm;
mod menu_vm;
mod progress_vm;
mod review_vm;
pub mod time_fmt;

pub use edit_vm::{EditOptionVm, EditVm};
pub use exam_vm::{ExamOptionVm, ExamVm, NavCellVm, ScoreVm};
pub use menu_vm::{MenuEntryVm, map_menu};
pub use progress_vm::{
    AttemptRowVm, ChartPointVm, ChartVm, DashboardVm, map_attempt_rows,
};
pub use review_vm::{ReviewItemVm, ReviewOptionVm, ReviewVm, Verdict, map_review_items};
