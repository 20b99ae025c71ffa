pub mod placeholder;

pub use placeholder::{
    replace_placeholders, suffix_placeholders, PLACEHOLDER_REGEX,
};
