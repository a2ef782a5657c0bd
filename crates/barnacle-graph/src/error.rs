#[derive(Debug, Clone, thiserror::Error)]
pub enum GraphError {
    #[error("duplicate document id: {id}")]
    DuplicateDocument { id: String },
}

pub type Result<T> = std::result::Result<T, GraphError>;
