//! The contract a record type implements to get generated CRUD endpoints.

use crate::naming::pluralize;
use serde::{de::DeserializeOwned, Serialize};

/// A document kind stored in its own collection.
///
/// The identifier field (named by [`Model::ID_FIELD`]) should be an `Option<DocumentId>` that is
/// skipped when `None`, and the other fields should carry `#[serde(default)]` so a PUT body
/// omitting them resets them to their zero value:
///
/// ```ignore
/// #[derive(Serialize, Deserialize, Default)]
/// #[serde(default)]
/// struct Todo {
///     #[serde(skip_serializing_if = "Option::is_none")]
///     id: Option<DocumentId>,
///     title: String,
///     completed: bool,
/// }
///
/// impl Model for Todo {
///     const NAME: &'static str = "models.Todo";
/// }
/// ```
pub trait Model: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Type name the collection is derived from, e.g. `"models.Todo"` -> `todos`.
    const NAME: &'static str;

    /// Field holding the external identifier in the serialized form.
    const ID_FIELD: &'static str = "id";

    /// Collection backing this model. Override to pick an explicit name.
    fn collection() -> String {
        pluralize(Self::NAME)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::Model;
    use crate::id::DocumentId;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    pub struct Todo {
        #[serde(skip_serializing_if = "Option::is_none")]
        pub id: Option<DocumentId>,
        pub title: String,
        pub completed: bool,
    }

    impl Model for Todo {
        const NAME: &'static str = "models.Todo";
    }

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    pub struct Parcel {
        #[serde(rename = "_key", skip_serializing_if = "Option::is_none")]
        pub key: Option<DocumentId>,
        pub label: String,
    }

    impl Model for Parcel {
        const NAME: &'static str = "main.Box";
        const ID_FIELD: &'static str = "_key";
    }
}

#[cfg(test)]
mod tests {
    use super::testing::{Parcel, Todo};
    use super::Model;

    #[test]
    fn collection_from_name() {
        assert_eq!(Todo::collection(), "todos");
        assert_eq!(Parcel::collection(), "boxes");
    }
}
