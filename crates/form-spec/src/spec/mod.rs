pub mod catalog;
pub mod question;

pub use catalog::{CatalogDocument, CatalogError, QuestionCatalog, catalog_schema};
pub use question::{
    ChoiceOption, DEFAULT_ACCEPTED_FORMATS, DEFAULT_MAX_SIZE_MB, InputType, InputValidation,
    Question, QuestionKind,
};
