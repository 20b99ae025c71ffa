pub mod conf;
pub mod variables;

pub use conf::{Conf, ConfError, DEFAULT_MAX_ROWS};
pub use variables::{
    table_id_of, VariableMapping, VariablesFileError, DEFAULT_TABLE_PREFIX,
};
