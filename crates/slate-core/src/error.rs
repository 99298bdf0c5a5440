use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    #[error("prop `{key}` holds a value that is not a `{expected}`")]
    PropType { key: String, expected: &'static str },
    #[error("slice `{key}` is registered with a different state type")]
    SliceType { key: String },
}
