use std::sync::Arc;

/// Lifecycle of one cached query as seen by subscribers.
#[derive(Debug)]
pub enum QueryState<V, E> {
    /// Never fetched.
    Uninitialized,
    /// A fetch is in flight; `previous` is the last good value, if any.
    Loading { previous: Option<Arc<V>> },
    Success(Arc<V>),
    Failed(E),
}

impl<V, E> QueryState<V, E> {
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading { .. })
    }

    /// True once a fetch has completed, successfully or not.
    pub fn is_settled(&self) -> bool {
        matches!(self, Self::Success(_) | Self::Failed(_))
    }

    /// Best data available: the current value, or the previous one while loading.
    pub fn data(&self) -> Option<&Arc<V>> {
        match self {
            Self::Success(v) => Some(v),
            Self::Loading { previous } => previous.as_ref(),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&E> {
        match self {
            Self::Failed(e) => Some(e),
            _ => None,
        }
    }
}

impl<V, E: Clone> Clone for QueryState<V, E> {
    fn clone(&self) -> Self {
        match self {
            Self::Uninitialized => Self::Uninitialized,
            Self::Loading { previous } => Self::Loading {
                previous: previous.clone(),
            },
            Self::Success(v) => Self::Success(Arc::clone(v)),
            Self::Failed(e) => Self::Failed(e.clone()),
        }
    }
}
