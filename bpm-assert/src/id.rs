use std::{fmt, hash::Hash, sync::Arc};

macro_rules! entity_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Ord, PartialOrd)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        pub struct $name(Arc<str>);

        impl $name {
            pub fn new(id: &str) -> Self {
                Self(Arc::from(id))
            }

            #[inline]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl PartialEq for $name {
            fn eq(&self, other: &Self) -> bool {
                Arc::ptr_eq(&self.0, &other.0) || self.0 == other.0
            }
        }

        impl Eq for $name {}

        impl Hash for $name {
            fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
                self.0.hash(state);
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self::new(s)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(Arc::from(s))
            }
        }
    };
}

entity_id!(
    /// Identifier of a running (or ended) process instance.
    ///
    /// Cheap to clone. Equality has a fast path for ids sharing the same
    /// allocation and falls back to string comparison.
    ProcessInstanceId
);

entity_id!(
    /// Identifier of a deployed process definition version, e.g. `invoice:2:<uuid>`.
    ProcessDefinitionId
);

entity_id!(
    /// Identifier of a user task.
    TaskId
);

entity_id!(
    /// Identifier of an executable job.
    JobId
);

entity_id!(
    /// Identifier of an event subscription.
    SubscriptionId
);

/// Random ids for entities the in-memory engine creates.
#[cfg(feature = "memory-engine")]
macro_rules! generated_id {
    ($($name:ident),+) => {
        $(
            impl $name {
                pub(crate) fn generate() -> Self {
                    Self(Arc::from(uuid::Uuid::new_v4().to_string()))
                }
            }
        )+
    };
}

#[cfg(feature = "memory-engine")]
generated_id!(ProcessInstanceId, TaskId, JobId, SubscriptionId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_compare_by_value() {
        let a = ProcessInstanceId::new("pi-1");
        let b = ProcessInstanceId::from(String::from("pi-1"));
        assert_eq!(a, b);
        assert_ne!(a, ProcessInstanceId::new("pi-2"));
    }

    #[cfg(feature = "memory-engine")]
    #[test]
    fn generated_ids_are_unique() {
        assert_ne!(TaskId::generate(), TaskId::generate());
    }

    #[test]
    fn display_shows_raw_id() {
        assert_eq!(JobId::new("job-7").to_string(), "job-7");
    }
}
