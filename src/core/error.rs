use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("invalid argument: {reason}")]
    InvalidArgument { reason: &'static str },

    #[error("numeric overflow in {context}")]
    Overflow { context: &'static str },
}

impl Error {
    pub(crate) fn invalid(reason: &'static str) -> Self {
        Error::InvalidArgument { reason }
    }

    pub(crate) fn overflow(context: &'static str) -> Self {
        Error::Overflow { context }
    }

    pub fn reason(&self) -> String {
        match self {
            Error::InvalidArgument { reason } => (*reason).to_string(),
            Error::Overflow { .. } => self.to_string(),
        }
    }
}
