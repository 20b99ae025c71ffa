pub mod table_finder;
pub mod row_generator;
pub mod table_remover;
pub mod variable_replacer;
pub mod template_generator;

pub use table_finder::{find_table, is_this_table, tables};
pub use row_generator::{expand_rows, resolve_row_count, template_row, TEMPLATE_ROW_INDEX};
pub use table_remover::{remove_table, remove_table_by_id};
pub use variable_replacer::substitute;
pub use template_generator::{
    generate_document, RunReport, RunState, TableOutcome, TableReport, TemplateError,
    TemplateGenerator, TemplateResult,
};
