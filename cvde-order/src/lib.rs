pub mod draft;
pub mod export;
pub mod history;
pub mod models;
pub mod selection;

pub use draft::{OrderDraft, OrderValidationError, VetSnapshot};
pub use history::{HistoryFilter, HistoryRange, HistoryRow, HistorySummary};
pub use models::{ExamOrder, NewOrder, NeuterStatus, OrderEdit, OrderStatus, ReactiveStatus};
pub use selection::{build_selection, parse_selected_exams, SelectedExam, Selection};
