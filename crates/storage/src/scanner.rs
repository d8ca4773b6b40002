//! Discovery of the persisted attributes of a container type

use crate::field::{join_path, FieldOptions, StorageField};
use crate::value::StorageValue;
use std::sync::Arc;
use tracing::{error, warn};

/// A type whose attributes are persisted by a
/// [`StorageContainer`](crate::StorageContainer).
///
/// `describe` registers every persisted attribute, and every nested
/// container whose attributes are stored below a sub path.
///
/// ```
/// use bedrock_storage::{FieldOptions, FieldScanner, StorageData};
///
/// #[derive(Default)]
/// struct Net {
///     retries: i32,
/// }
///
/// impl StorageData for Net {
///     fn describe(fields: &mut FieldScanner<Self>) {
///         fields.field("retries", |n| &n.retries, |n| &mut n.retries, FieldOptions::new());
///     }
/// }
///
/// #[derive(Default)]
/// struct Settings {
///     motd: String,
///     net: Net,
/// }
///
/// impl StorageData for Settings {
///     fn describe(fields: &mut FieldScanner<Self>) {
///         fields
///             .field("motd", |s| &s.motd, |s| &mut s.motd, FieldOptions::new())
///             .additional("net", |s| &s.net, |s| &mut s.net);
///     }
/// }
///
/// let paths: Vec<String> = bedrock_storage::scan::<Settings>()
///     .iter()
///     .map(|field| field.path().to_string())
///     .collect();
/// assert_eq!(paths, ["motd", "net.retries"]);
/// ```
pub trait StorageData: Sized + 'static {
    fn describe(fields: &mut FieldScanner<Self>);
}

/// Collects the field descriptors of a container type.
pub struct FieldScanner<C> {
    sub_path: String,
    fields: Vec<StorageField<C>>,
}

impl<C: 'static> FieldScanner<C> {
    pub fn new() -> Self {
        Self::with_sub_path(String::new())
    }

    fn with_sub_path(sub_path: String) -> Self {
        Self {
            sub_path,
            fields: Vec::new(),
        }
    }

    /// Path every field of this scanner is stored below.
    pub fn sub_path(&self) -> &str {
        &self.sub_path
    }

    /// Registers attribute `name`. A field whose path cannot be resolved is
    /// logged and left out.
    pub fn field<F, G, M>(&mut self, name: &str, get: G, get_mut: M, options: FieldOptions) -> &mut Self
    where
        F: StorageValue,
        G: Fn(&C) -> &F + Send + Sync + 'static,
        M: Fn(&mut C) -> &mut F + Send + Sync + 'static,
    {
        match StorageField::new(name, &self.sub_path, get, get_mut, options) {
            Ok(field) => self.push(field),
            Err(e) => error!(field = name, error = %e, "Could not register storage field"),
        }
        self
    }

    /// Registers the fields of nested container `E` below `sub_path`.
    pub fn additional<E, G, M>(&mut self, sub_path: &str, get: G, get_mut: M) -> &mut Self
    where
        E: StorageData,
        G: Fn(&C) -> &E + Send + Sync + 'static,
        M: Fn(&mut C) -> &mut E + Send + Sync + 'static,
    {
        let mut nested = FieldScanner::<E>::with_sub_path(join_path(&self.sub_path, sub_path));
        E::describe(&mut nested);

        let get: Arc<dyn Fn(&C) -> &E + Send + Sync> = Arc::new(get);
        let get_mut: Arc<dyn Fn(&mut C) -> &mut E + Send + Sync> = Arc::new(get_mut);
        for field in nested.fields {
            self.push(field.project(Arc::clone(&get), Arc::clone(&get_mut)));
        }
        self
    }

    fn push(&mut self, field: StorageField<C>) {
        if let Some(index) = self.fields.iter().position(|known| known.path() == field.path()) {
            warn!(
                path = field.path(),
                replaced = self.fields[index].name(),
                by = field.name(),
                "Duplicate storage path, the later field is used"
            );
            self.fields[index] = field;
        } else {
            self.fields.push(field);
        }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn finish(self) -> Vec<StorageField<C>> {
        self.fields
    }
}

impl<C: 'static> Default for FieldScanner<C> {
    fn default() -> Self {
        Self::new()
    }
}

/// Field descriptors of `C`, in registration order.
pub fn scan<C: StorageData>() -> Vec<StorageField<C>> {
    let mut scanner = FieldScanner::new();
    C::describe(&mut scanner);
    scanner.finish()
}
