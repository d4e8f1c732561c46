use thiserror::Error;

/// A speculative value applied before the server confirms a mutation.
#[derive(Clone, PartialEq, Debug)]
pub enum Optimistic<T> {
    /// Waiting for the server. `previous` is restored on rollback.
    Pending { speculative: T, previous: T },
    /// The server answered with its own value.
    Confirmed(T),
    /// The mutation failed and the previous value is back in place.
    RolledBack(T),
}

#[derive(Error, Clone, Copy, PartialEq, Eq, Debug)]
pub enum OptimisticError {
    #[error("Optimistic value is already settled")]
    AlreadySettled,
}

impl<T> Optimistic<T> {
    pub fn pending(previous: T, speculative: T) -> Self {
        Self::Pending {
            speculative,
            previous,
        }
    }

    /// The value that should currently be shown.
    pub fn value(&self) -> &T {
        match self {
            Self::Pending { speculative, .. } => speculative,
            Self::Confirmed(value) | Self::RolledBack(value) => value,
        }
    }

    pub fn into_value(self) -> T {
        match self {
            Self::Pending { speculative, .. } => speculative,
            Self::Confirmed(value) | Self::RolledBack(value) => value,
        }
    }

    pub fn is_settled(&self) -> bool {
        !matches!(self, Self::Pending { .. })
    }

    /// Settle with the value the server answered with.
    pub fn confirm(self, server_value: T) -> Result<Self, OptimisticError> {
        match self {
            Self::Pending { .. } => Ok(Self::Confirmed(server_value)),
            _ => Err(OptimisticError::AlreadySettled),
        }
    }

    /// Settle by going back to the value from before the mutation.
    pub fn roll_back(self) -> Result<Self, OptimisticError> {
        match self {
            Self::Pending { previous, .. } => Ok(Self::RolledBack(previous)),
            _ => Err(OptimisticError::AlreadySettled),
        }
    }
}
