pub mod exam;
pub mod price;

pub use exam::{CatalogError, ExamCatalogItem, ExamDetailsUpdate, NewExam};
pub use price::{cents_from_input, validate_price_update};
